//! Condition rendering for WHERE, HAVING and JOIN ... ON predicates
//!
//! Provides the recursive AND/OR expression tree and the entry renderer that
//! turns a single `field → value` pair into a predicate.

use crate::error::{QueryError, Result};
use crate::sql::operator::{Comparison, extract};
use crate::sql::sanitize::validate;
use crate::sql::value::to_sql_value;
use crate::types::{FieldValue, Fields, RawValue, Value};

/// One member of an AND/OR group
#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    /// Free-text predicate, validated before rendering
    Clause(String),
    /// Field map, one predicate per entry, AND'ed together
    Fields(Fields),
    /// Nested group, rendered in its own parentheses
    Group(Condition),
    /// Verbatim SQL
    Raw(RawValue),
}

impl From<&str> for Predicate {
    fn from(s: &str) -> Self {
        Predicate::Clause(s.to_string())
    }
}

impl From<String> for Predicate {
    fn from(s: String) -> Self {
        Predicate::Clause(s)
    }
}

impl From<Fields> for Predicate {
    fn from(fields: Fields) -> Self {
        Predicate::Fields(fields)
    }
}

impl From<Condition> for Predicate {
    fn from(condition: Condition) -> Self {
        Predicate::Group(condition)
    }
}

impl From<RawValue> for Predicate {
    fn from(raw: RawValue) -> Self {
        Predicate::Raw(raw)
    }
}

/// A boolean group of predicates
#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    And(Vec<Predicate>),
    Or(Vec<Predicate>),
}

/// Build an AND group
pub fn and<I, P>(predicates: I) -> Condition
where
    I: IntoIterator<Item = P>,
    P: Into<Predicate>,
{
    Condition::And(predicates.into_iter().map(Into::into).collect())
}

/// Build an OR group
///
/// # Example
/// ```
/// use fluent_select::{Predicate, and, or};
///
/// let condition = or([
///     Predicate::from("content = ''"),
///     and(["content IS NULL", "user_id IS NULL"]).into(),
/// ]);
/// assert_eq!(
///     condition.to_sql().unwrap(),
///     "(content = '' OR (content IS NULL AND user_id IS NULL))"
/// );
/// ```
pub fn or<I, P>(predicates: I) -> Condition
where
    I: IntoIterator<Item = P>,
    P: Into<Predicate>,
{
    Condition::Or(predicates.into_iter().map(Into::into).collect())
}

/// How values inside a predicate are written out
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderContext<'a> {
    /// Quote and escape values (`true`) or write them as column references (`false`)
    pub transform: bool,
    /// Table alias prefixed to field names
    pub alias: Option<&'a str>,
}

impl<'a> RenderContext<'a> {
    /// Values are literals, fields are unqualified
    pub fn literal() -> Self {
        Self {
            transform: true,
            alias: None,
        }
    }

    /// Values are column references, fields are qualified with `alias`
    pub fn column_reference(alias: Option<&'a str>) -> Self {
        Self {
            transform: false,
            alias,
        }
    }
}

impl Condition {
    pub fn predicates(&self) -> &[Predicate] {
        match self {
            Condition::And(predicates) | Condition::Or(predicates) => predicates,
        }
    }

    fn keyword(&self) -> &'static str {
        match self {
            Condition::And(_) => "AND",
            Condition::Or(_) => "OR",
        }
    }

    /// Render the group with literal values and no alias
    pub fn to_sql(&self) -> Result<String> {
        self.render(RenderContext::literal())
    }

    /// Render the group, wrapped in one pair of parentheses
    pub fn render(&self, ctx: RenderContext<'_>) -> Result<String> {
        let parts = self
            .predicates()
            .iter()
            .map(|predicate| match predicate {
                Predicate::Clause(clause) => validate(clause).map(str::to_string),
                Predicate::Raw(raw) => Ok(raw.as_str().to_string()),
                Predicate::Group(group) => group.render(ctx),
                Predicate::Fields(fields) => render_fields(fields, ctx),
            })
            .collect::<Result<Vec<_>>>()?;

        if parts.is_empty() {
            return Err(QueryError::malformed(format!(
                "{} group requires at least one condition",
                self.keyword()
            )));
        }

        let separator = format!(" {} ", self.keyword());
        Ok(format!("({})", parts.join(&separator)))
    }

    /// Prepare the group for inline rendering under `column`.
    ///
    /// Returns a copy in which every top-level clause is completed with the
    /// column, so `IS NULL` becomes `p.closed_at IS NULL`. Nested groups and
    /// other predicates are left as they are.
    pub fn inline_for(&self, column: &str) -> Condition {
        let predicates = self
            .predicates()
            .iter()
            .map(|predicate| match predicate {
                Predicate::Clause(clause) => Predicate::Clause(format!("{} {}", column, clause)),
                other => other.clone(),
            })
            .collect();
        match self {
            Condition::And(_) => Condition::And(predicates),
            Condition::Or(_) => Condition::Or(predicates),
        }
    }
}

fn render_fields(fields: &Fields, ctx: RenderContext<'_>) -> Result<String> {
    if fields.is_empty() {
        return Err(QueryError::malformed("field map requires at least one entry"));
    }
    let entries = fields
        .iter()
        .map(|(field, value)| render_entry(field, value, ctx))
        .collect::<Result<Vec<_>>>()?;
    Ok(format!("({})", entries.join(" AND ")))
}

/// Render one `field → value` entry as a predicate
///
/// Values are always serialized first, which checks their type and validates
/// strings. A leading operator inside a string value (`">100"`) is used as the
/// comparison, and the rest of the string is written out as-is. Without an
/// operator, the serialized literal is used when `ctx.transform` is set; otherwise
/// the value is written unquoted, as a column reference.
pub fn render_entry(field: &str, value: &FieldValue, ctx: RenderContext<'_>) -> Result<String> {
    validate(field)?;
    let column = match ctx.alias {
        Some(alias) => format!("{}.{}", alias, field),
        None => field.to_string(),
    };

    let value = match value {
        FieldValue::Condition(condition) => return condition.inline_for(&column).render(ctx),
        FieldValue::Value(value) => value,
    };

    let literal = to_sql_value(value)?;
    let comparison = extract(value)?;
    let operand = match &comparison {
        Comparison::IsNull => String::new(),
        Comparison::Implicit(_) if ctx.transform => literal,
        Comparison::Implicit(value) => column_reference(value)?,
        Comparison::Explicit(_, operand) => operand.to_string(),
    };

    let parts = [column.as_str(), comparison.operator(), operand.as_str()];
    Ok(parts
        .iter()
        .filter(|part| !part.is_empty())
        .copied()
        .collect::<Vec<_>>()
        .join(" "))
}

fn column_reference(value: &Value) -> Result<String> {
    match value {
        Value::Bool(b) => Ok(b.to_string()),
        Value::Int(i) => Ok(i.to_string()),
        Value::Float(f) => Ok(f.to_string()),
        Value::Decimal(d) => Ok(d.to_string()),
        Value::Text(s) => Ok(s.clone()),
        Value::Raw(raw) => Ok(raw.as_str().to_string()),
        other => Err(QueryError::unsupported_type(other.type_name())),
    }
}
