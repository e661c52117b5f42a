//! # fluent-select
//!
//! A fluent builder for PostgreSQL SELECT statements.
//!
//! Queries are assembled through chained calls and rendered to SQL text on
//! demand. Values are inlined as escaped literals, and every identifier or
//! clause fragment passed in is checked against a denylist of statement
//! terminators, comment tokens and SQL keywords.
//!
//! ## Features
//!
//! - **Fluent API**: `select`, `from`, `join`, `where_`, `group_by`, `having`,
//!   `order_by`, `limit`, `offset`, `with` and friends, each consuming and
//!   returning the query
//! - **Boolean Trees**: nested AND/OR groups with [`and`] and [`or`]
//! - **Typed Values**: numbers, strings, decimals, UUIDs, dates and timestamps,
//!   arrays, and [`raw`] SQL
//! - **Subqueries**: in FROM, JOIN, WITH and `IN (...)`
//! - **Execution**: an async [`Executor`] registered once with [`runtime::init`],
//!   or passed per call with [`Query::run_with`]; [`PgExecutor`] runs on sqlx
//!
//! ## Quick Start
//!
//! ```rust
//! use fluent_select::{Fields, Operator, Order, Query, or};
//!
//! let sql = Query::new()
//!     .select(["users.id", "count(p.*) AS open_posts"])?
//!     .from("users")?
//!     .left_join(
//!         "posts",
//!         Fields::new()
//!             .with("user_id", "users.id")
//!             .with("closed_at", or(["IS NULL", "> NOW()"])),
//!     )?
//!     .where_(("users.karma", Operator::Gte, 10))?
//!     .group_by("users.id")?
//!     .order_by("open_posts", Order::Desc)?
//!     .limit(20)?
//!     .build()?;
//!
//! assert_eq!(
//!     sql,
//!     "SELECT users.id,\n  count(p.*) AS open_posts\n\
//!      FROM users\n\
//!      LEFT JOIN posts AS p ON p.user_id = users.id AND (p.closed_at IS NULL OR p.closed_at > NOW())\n\
//!      WHERE users.karma >= 10\n\
//!      GROUP BY users.id\n\
//!      ORDER BY open_posts DESC\n\
//!      LIMIT 20"
//! );
//! # Ok::<(), fluent_select::QueryError>(())
//! ```
//!
//! ## Running Queries
//!
//! ```rust,no_run
//! use fluent_select::{PgExecutor, Query, QueryConfig, runtime};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let executor = PgExecutor::connect("postgres://localhost/mydb").await?;
//!     runtime::init(QueryConfig::builder().executor(executor).build());
//!
//!     let rows = Query::new().from("users")?.limit(10)?.run().await?;
//!     println!("{} users", rows.len());
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod executor;
pub mod filter;
pub mod join;
pub mod query;
pub mod runtime;
pub mod sql;
pub mod types;

// Re-export main types for convenience
pub use config::{AliasStrategy, QueryConfig, QueryConfigBuilder};
pub use error::{QueryError, Result};
pub use executor::{Executor, FnExecutor, PgExecutor, PgTransaction, Row, TransactionHandle};
pub use filter::{InList, WhereArgs};
pub use join::{Join, JoinKind, JoinOn};
pub use query::{Clause, DEFAULT_SUBQUERY_ALIAS, Query, QueryParts, Source};
pub use types::{FieldValue, Fields, IntoList, Operator, Order, RawValue, Value, raw};

// Re-export SQL utilities for advanced users
pub use sql::condition::{Condition, Predicate, RenderContext, and, or, render_entry};
pub use sql::operator::{Comparison, extract};
pub use sql::sanitize::validate;
pub use sql::table::{initials_alias, split_table_alias};
pub use sql::value::{to_sql_array, to_sql_value};
