//! Value Serializer
//!
//! Converts [`Value`]s into the literal text Postgres expects in a value position.

use chrono::{SecondsFormat, Timelike};

use crate::error::{QueryError, Result};
use crate::sql::sanitize::validate;
use crate::types::Value;

/// Represent a value as a SQL literal
///
/// - `Null` → empty string
/// - booleans and numbers → unquoted
/// - strings → validated, quotes doubled, single-quoted
/// - dates and timestamps → ISO-8601, single-quoted
/// - raw values → verbatim
/// - arrays → `(a, b, c)`, with `NULL` elements spelled out
///
/// # Example
/// ```
/// use fluent_select::{Value, to_sql_value};
///
/// assert_eq!(to_sql_value(&Value::from("abc")).unwrap(), "'abc'");
/// assert_eq!(to_sql_value(&Value::from(vec![1, 2])).unwrap(), "(1, 2)");
/// ```
pub fn to_sql_value(value: &Value) -> Result<String> {
    match value {
        Value::Null => Ok(String::new()),
        Value::Bool(b) => Ok(b.to_string()),
        Value::Int(i) => Ok(i.to_string()),
        Value::Float(f) => {
            if !f.is_finite() {
                return Err(QueryError::unsupported_type(format!("non-finite number {}", f)));
            }
            Ok(f.to_string())
        }
        Value::Decimal(d) => Ok(d.to_string()),
        Value::Text(s) => {
            validate(s)?;
            Ok(format!("'{}'", s.replace('\'', "''")))
        }
        Value::Uuid(u) => Ok(format!("'{}'", u.hyphenated())),
        Value::Date(d) => Ok(format!("'{}'", d.format("%Y-%m-%d"))),
        Value::DateTime(dt) => {
            let fraction = match fraction_precision(dt.nanosecond()) {
                SecondsFormat::Millis => "%.3f",
                SecondsFormat::Micros => "%.6f",
                _ => "%.9f",
            };
            Ok(format!("'{}'", dt.format(&format!("%Y-%m-%dT%H:%M:%S{}", fraction))))
        }
        Value::Timestamp(ts) => Ok(format!(
            "'{}'",
            ts.to_rfc3339_opts(fraction_precision(ts.nanosecond()), true)
        )),
        Value::TimestampTz(ts) => Ok(format!(
            "'{}'",
            ts.to_rfc3339_opts(fraction_precision(ts.nanosecond()), false)
        )),
        Value::Raw(raw) => Ok(raw.as_str().to_string()),
        Value::Array(items) => Ok(format!("({})", serialize_items(items)?)),
    }
}

/// Millisecond fractions unless that would drop digits
fn fraction_precision(nanos: u32) -> SecondsFormat {
    if nanos % 1_000_000 == 0 {
        SecondsFormat::Millis
    } else if nanos % 1_000 == 0 {
        SecondsFormat::Micros
    } else {
        SecondsFormat::Nanos
    }
}

/// Represent a list of values as a native Postgres array literal
///
/// # Example
/// ```
/// use fluent_select::{Value, to_sql_array};
///
/// let values = [Value::from(1), Value::from(2), Value::from(3)];
/// assert_eq!(to_sql_array(&values).unwrap(), "ARRAY[1, 2, 3]");
/// ```
pub fn to_sql_array(items: &[Value]) -> Result<String> {
    Ok(format!("ARRAY[{}]", serialize_items(items)?))
}

fn serialize_items(items: &[Value]) -> Result<String> {
    check_homogeneous(items)?;
    Ok(items
        .iter()
        .map(|item| match item {
            Value::Null => Ok("NULL".to_string()),
            other => to_sql_value(other),
        })
        .collect::<Result<Vec<_>>>()?
        .join(", "))
}

/// Arrays may mix NULLs with one other element type
fn check_homogeneous(items: &[Value]) -> Result<()> {
    let mut kinds = items.iter().filter(|v| !v.is_null()).map(Value::type_name);
    if let Some(first) = kinds.next() {
        if let Some(other) = kinds.find(|kind| *kind != first) {
            return Err(QueryError::unsupported_type(format!(
                "array mixing {} and {}",
                first, other
            )));
        }
    }
    Ok(())
}
