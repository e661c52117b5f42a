//! SQL rendering utilities
//!
//! Provides injection validation, literal serialization, operator extraction,
//! condition trees and table alias handling.

pub mod condition;
pub mod operator;
pub mod sanitize;
pub mod table;
pub mod value;

pub use condition::{Condition, Predicate, RenderContext, and, or, render_entry};
pub use operator::{Comparison, extract};
pub use sanitize::{FORBIDDEN_KEYWORDS, FORBIDDEN_TOKENS, validate};
pub use table::{initials_alias, split_table_alias};
pub use value::{to_sql_array, to_sql_value};
