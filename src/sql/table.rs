//! Table name and alias handling

use std::sync::OnceLock;

use regex::Regex;

use crate::error::{QueryError, Result};
use crate::sql::sanitize::validate;

fn table_regex() -> &'static Regex {
    static TABLE_RE: OnceLock<Regex> = OnceLock::new();
    TABLE_RE.get_or_init(|| {
        Regex::new(r"(?i)^\s*(\S+)(?:\s+(?:as\s+)?(\S+))?\s*$").expect("invalid built-in table regex")
    })
}

/// Split a table string into its name and optional alias
///
/// Accepts `name`, `name alias` and `name AS alias` (any case). The input is
/// validated first.
///
/// # Example
/// ```
/// use fluent_select::split_table_alias;
///
/// assert_eq!(split_table_alias("users as u").unwrap(), ("users".to_string(), Some("u".to_string())));
/// assert_eq!(split_table_alias("images im").unwrap(), ("images".to_string(), Some("im".to_string())));
/// assert_eq!(split_table_alias("documents").unwrap(), ("documents".to_string(), None));
/// ```
pub fn split_table_alias(table: &str) -> Result<(String, Option<String>)> {
    validate(table)?;
    let captures = table_regex().captures(table).ok_or_else(|| {
        QueryError::malformed(format!("Expected 'table [AS alias]', got '{}'", table))
    })?;
    let name = captures[1].to_string();
    let alias = captures.get(2).map(|m| m.as_str().to_string());
    if alias.as_deref().is_some_and(|alias| alias.eq_ignore_ascii_case("as")) {
        return Err(QueryError::malformed(format!(
            "Expected an alias after 'AS' in '{}'",
            table
        )));
    }
    Ok((name, alias))
}

/// Default alias strategy: the first letter of each underscore-separated word
///
/// Schema qualifiers are ignored, so `public.translations_tags` becomes `tt`.
/// Names without usable initials (`_`, `"Users"`) are used whole.
pub fn initials_alias(table: &str) -> String {
    let name = table.rsplit('.').next().unwrap_or(table);
    let initials: String = name
        .split('_')
        .filter_map(|word| word.chars().next())
        .collect();
    if initials.is_empty() || !initials.chars().all(char::is_alphanumeric) {
        return name.to_string();
    }
    initials
}
