//! Operator Extractor
//!
//! Splits an optional leading comparison operator off a value, so that field
//! maps accept both `{ upvotes: 100 }` and `{ upvotes: ">100" }`.

use std::sync::OnceLock;

use regex::Regex;

use crate::error::{QueryError, Result};
use crate::types::{Operator, Value};

fn operator_regex() -> &'static Regex {
    static OPERATOR_RE: OnceLock<Regex> = OnceLock::new();
    // longest tokens first so `>=` is never read as `>`
    OPERATOR_RE.get_or_init(|| {
        Regex::new(r"\s*(>=|<=|!=|>|<|=)\s*").expect("invalid built-in operator regex")
    })
}

/// Result of splitting a value into operator and operand
#[derive(Debug, Clone, PartialEq)]
pub enum Comparison<'a> {
    /// `NULL` value, compared with `IS NULL` and no operand
    IsNull,
    /// No operator in the value; equality against the value itself
    Implicit(&'a Value),
    /// Operator found at the start of a string; the operand is the remaining text
    Explicit(Operator, &'a str),
}

impl Comparison<'_> {
    pub fn operator(&self) -> &'static str {
        match self {
            Comparison::IsNull => "IS NULL",
            Comparison::Implicit(_) => "=",
            Comparison::Explicit(op, _) => op.as_sql(),
        }
    }
}

/// Extract the comparison operator from a value
///
/// # Example
/// ```
/// use fluent_select::{Comparison, Operator, Value, extract};
///
/// assert_eq!(extract(&Value::Null).unwrap(), Comparison::IsNull);
/// assert_eq!(extract(&Value::from(3)).unwrap().operator(), "=");
/// let value = Value::from(">3");
/// assert_eq!(extract(&value).unwrap(), Comparison::Explicit(Operator::Gt, "3"));
/// assert!(extract(&Value::from("a > 3 < 5")).is_err());
/// ```
pub fn extract(value: &Value) -> Result<Comparison<'_>> {
    let text = match value {
        Value::Null => return Ok(Comparison::IsNull),
        Value::Text(text) => text,
        other => return Ok(Comparison::Implicit(other)),
    };

    let mut matches = operator_regex().captures_iter(text);
    let Some(first) = matches.next() else {
        return Ok(Comparison::Implicit(value));
    };
    if matches.next().is_some() {
        return Err(malformed(text));
    }

    let whole = first.get(0).ok_or_else(|| malformed(text))?;
    let operand = &text[whole.end()..];
    if whole.start() != 0 || operand.is_empty() {
        return Err(malformed(text));
    }

    let operator = first[1].parse::<Operator>()?;
    Ok(Comparison::Explicit(operator, operand))
}

fn malformed(text: &str) -> QueryError {
    QueryError::malformed(format!(
        "Failed to get operator and value from expression '{}'",
        text
    ))
}
