//! JOIN clauses
//!
//! A [`Join`] is a value of its own so that rarely used options (`LATERAL`,
//! explicit alias) do not need a method per combination. The common cases are
//! covered by the `*_join` methods on [`Query`].

use crate::error::{QueryError, Result};
use crate::query::{Query, Source};
use crate::sql::condition::{RenderContext, render_entry};
use crate::sql::sanitize::validate;
use crate::sql::table::split_table_alias;
use crate::types::{FieldValue, Fields, IntoList};

/// Join type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum JoinKind {
    Inner,
    Left,
    Right,
    /// `FULL OUTER JOIN`
    Full,
}

impl JoinKind {
    pub fn as_sql(&self) -> &'static str {
        match self {
            JoinKind::Inner => "INNER JOIN",
            JoinKind::Left => "LEFT JOIN",
            JoinKind::Right => "RIGHT JOIN",
            JoinKind::Full => "FULL OUTER JOIN",
        }
    }
}

/// On-conditions of a join
#[derive(Debug, Clone, PartialEq)]
pub enum JoinOn {
    /// Complete predicates such as `p.user_id = users.id`, validated
    Clauses(Vec<String>),
    /// Columns of the joined table mapped to what they must equal.
    ///
    /// Values are written as column references, and field names are qualified
    /// with the joined table's alias.
    Fields(Fields),
}

impl From<&str> for JoinOn {
    fn from(clause: &str) -> Self {
        JoinOn::Clauses(vec![clause.to_string()])
    }
}

impl From<String> for JoinOn {
    fn from(clause: String) -> Self {
        JoinOn::Clauses(vec![clause])
    }
}

impl From<Vec<&str>> for JoinOn {
    fn from(clauses: Vec<&str>) -> Self {
        JoinOn::Clauses(clauses.into_list())
    }
}

impl From<Vec<String>> for JoinOn {
    fn from(clauses: Vec<String>) -> Self {
        JoinOn::Clauses(clauses)
    }
}

impl<const N: usize> From<[&str; N]> for JoinOn {
    fn from(clauses: [&str; N]) -> Self {
        JoinOn::Clauses(clauses.into_list())
    }
}

impl From<Fields> for JoinOn {
    fn from(fields: Fields) -> Self {
        JoinOn::Fields(fields)
    }
}

impl<K: Into<String>, V: Into<FieldValue>, const N: usize> From<[(K, V); N]> for JoinOn {
    fn from(entries: [(K, V); N]) -> Self {
        JoinOn::Fields(entries.into())
    }
}

impl JoinOn {
    fn render(&self, alias: Option<&str>) -> Result<String> {
        let parts = match self {
            JoinOn::Clauses(clauses) => clauses
                .iter()
                .map(|clause| validate(clause).map(str::to_string))
                .collect::<Result<Vec<_>>>()?,
            JoinOn::Fields(fields) => {
                let ctx = RenderContext::column_reference(alias);
                fields
                    .iter()
                    .map(|(field, value)| render_entry(field, value, ctx))
                    .collect::<Result<Vec<_>>>()?
            }
        };
        if parts.is_empty() {
            return Err(QueryError::malformed("join requires at least one on-condition"));
        }
        Ok(parts.join(" AND "))
    }
}

/// A join clause under construction
///
/// # Example
/// ```
/// use fluent_select::{Join, Query};
///
/// let sql = Query::new()
///     .from("users")?
///     .join(Join::left("posts", [("user_id", "users.id")]).alias("p2")?)?
///     .build()?;
/// assert_eq!(sql, "SELECT *\nFROM users\nLEFT JOIN posts AS p2 ON p2.user_id = users.id");
/// # Ok::<(), fluent_select::QueryError>(())
/// ```
#[derive(Debug, Clone)]
pub struct Join {
    kind: JoinKind,
    source: Source,
    alias: Option<String>,
    lateral: bool,
    on: JoinOn,
}

impl Join {
    pub fn new(kind: JoinKind, source: impl Into<Source>, on: impl Into<JoinOn>) -> Self {
        Self {
            kind,
            source: source.into(),
            alias: None,
            lateral: false,
            on: on.into(),
        }
    }

    pub fn inner(source: impl Into<Source>, on: impl Into<JoinOn>) -> Self {
        Self::new(JoinKind::Inner, source, on)
    }

    pub fn left(source: impl Into<Source>, on: impl Into<JoinOn>) -> Self {
        Self::new(JoinKind::Left, source, on)
    }

    pub fn right(source: impl Into<Source>, on: impl Into<JoinOn>) -> Self {
        Self::new(JoinKind::Right, source, on)
    }

    pub fn full(source: impl Into<Source>, on: impl Into<JoinOn>) -> Self {
        Self::new(JoinKind::Full, source, on)
    }

    /// Alias for the joined table, overriding any alias in the table string
    pub fn alias(mut self, alias: &str) -> Result<Self> {
        self.alias = Some(validate(alias)?.to_string());
        Ok(self)
    }

    /// Join laterally, so the target may refer to earlier tables
    pub fn lateral(mut self) -> Self {
        self.lateral = true;
        self
    }

    pub fn kind(&self) -> JoinKind {
        self.kind
    }

    /// Render the complete clause
    ///
    /// Tables joined without an alias get one from the runtime's alias strategy.
    pub fn render(self) -> Result<String> {
        let (target, alias) = self.source.resolve(self.alias.as_deref(), true)?;
        let on = self.on.render(alias.as_deref())?;
        let lateral = if self.lateral { "LATERAL " } else { "" };
        Ok(format!("{} {}{} ON {}", self.kind.as_sql(), lateral, target, on))
    }
}

impl Query {
    /// Add a join
    pub fn join(mut self, join: Join) -> Result<Self> {
        self.joins.push(join.render()?);
        Ok(self)
    }

    pub fn inner_join(self, source: impl Into<Source>, on: impl Into<JoinOn>) -> Result<Self> {
        self.join(Join::inner(source, on))
    }

    pub fn left_join(self, source: impl Into<Source>, on: impl Into<JoinOn>) -> Result<Self> {
        self.join(Join::left(source, on))
    }

    pub fn right_join(self, source: impl Into<Source>, on: impl Into<JoinOn>) -> Result<Self> {
        self.join(Join::right(source, on))
    }

    /// Add a `FULL OUTER JOIN`
    pub fn outer_join(self, source: impl Into<Source>, on: impl Into<JoinOn>) -> Result<Self> {
        self.join(Join::full(source, on))
    }

    /// Keep only rows that have no match in `table`
    ///
    /// Left joins `table` as `exclude_<table>` and requires the first field of
    /// `on` to be NULL on the joined side. `table` must be a bare name.
    pub fn exclude_join(self, target: &str, on: impl Into<Fields>) -> Result<Self> {
        let (table, inline_alias) = split_table_alias(target)?;
        if inline_alias.is_some() {
            return Err(QueryError::malformed(format!(
                "exclude join takes a bare table name, got '{}'",
                target
            )));
        }
        let on = on.into();
        let column = on
            .first_field()
            .ok_or_else(|| QueryError::malformed("exclude join requires at least one field"))?
            .to_string();
        let alias = format!("exclude_{}", table.replace('.', "_"));
        let query = self.join(Join::left(table.as_str(), on).alias(&alias)?)?;
        Ok(query.where_raw(format!("{}.{} IS NULL", alias, column)))
    }

    /// Add one or more complete join clauses
    ///
    /// **Warning**: the clauses are not validated.
    pub fn join_raw(mut self, clauses: impl IntoList) -> Self {
        self.joins.extend(clauses.into_list());
        self
    }
}
