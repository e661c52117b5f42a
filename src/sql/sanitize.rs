//! SQL Injection Guard
//!
//! Rejects free-text identifiers and clause fragments containing statement
//! terminators, comment markers or statement-level keywords.

use std::sync::OnceLock;

use regex::Regex;

use crate::error::{QueryError, Result};

/// Statement terminators and comment openers rejected anywhere in the input
pub const FORBIDDEN_TOKENS: &[&str] = &[";", "#", "--", "/*"];

/// Keywords rejected when they appear as whole words (case-insensitive)
pub const FORBIDDEN_KEYWORDS: &[&str] = &[
    "alter",
    "and",
    "ascii",
    "char",
    "create",
    "delete",
    "drop",
    "group by",
    "having",
    "insert",
    "or",
    "order by",
    "rename",
    "replace",
    "select",
    "truncate",
    "union",
    "update",
    "where",
];

fn keyword_regex() -> &'static Regex {
    static KEYWORD_RE: OnceLock<Regex> = OnceLock::new();
    KEYWORD_RE.get_or_init(|| {
        let alternation = FORBIDDEN_KEYWORDS
            .iter()
            .map(|keyword| regex::escape(keyword))
            .collect::<Vec<_>>()
            .join("|");
        Regex::new(&format!(r"(?i)\b(?:{})\b", alternation)).expect("invalid built-in keyword regex")
    })
}

/// Validate a string against SQL injection exploits
///
/// Returns the input unchanged so calls can be chained into rendering.
///
/// # Example
/// ```
/// use fluent_select::validate;
///
/// assert_eq!(validate("users.id").unwrap(), "users.id");
/// assert!(validate("1; DROP TABLE users").is_err());
/// assert!(validate("name OR 1=1").is_err());
/// ```
pub fn validate(input: &str) -> Result<&str> {
    if FORBIDDEN_TOKENS.iter().any(|token| input.contains(token)) {
        return Err(QueryError::injection_risk(input));
    }
    if keyword_regex().is_match(input) {
        return Err(QueryError::injection_risk(input));
    }
    Ok(input)
}

/// Validate every string in a list, returning owned copies
pub(crate) fn validate_all(inputs: Vec<String>) -> Result<Vec<String>> {
    for input in &inputs {
        validate(input)?;
    }
    Ok(inputs)
}
