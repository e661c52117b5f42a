//! WHERE conditions
//!
//! Every method adds one or more predicates; the predicates of a query are
//! AND'ed together when it is built.

use crate::error::{QueryError, Result};
use crate::query::Query;
use crate::sql::condition::{Condition, RenderContext, render_entry};
use crate::sql::sanitize::validate;
use crate::sql::value::{to_sql_array, to_sql_value};
use crate::types::{FieldValue, Fields, IntoList, Operator, RawValue, Value};

/// Arguments accepted by [`Query::where_`]
#[derive(Debug, Clone, PartialEq)]
pub enum WhereArgs {
    /// One predicate per entry; string values may carry a leading operator
    Fields(Fields),
    /// A complete AND/OR group
    Condition(Condition),
    /// `field = value`, or `field IS NULL` for a null value
    FieldValue(String, Value),
    /// `field op value`; the value must not be null
    FieldOpValue(String, Operator, Value),
}

impl From<Fields> for WhereArgs {
    fn from(fields: Fields) -> Self {
        WhereArgs::Fields(fields)
    }
}

impl<K: Into<String>, V: Into<FieldValue>, const N: usize> From<[(K, V); N]> for WhereArgs {
    fn from(entries: [(K, V); N]) -> Self {
        WhereArgs::Fields(entries.into())
    }
}

impl From<Condition> for WhereArgs {
    fn from(condition: Condition) -> Self {
        WhereArgs::Condition(condition)
    }
}

impl<V: Into<Value>> From<(&str, V)> for WhereArgs {
    fn from((field, value): (&str, V)) -> Self {
        WhereArgs::FieldValue(field.to_string(), value.into())
    }
}

impl<V: Into<Value>> From<(String, V)> for WhereArgs {
    fn from((field, value): (String, V)) -> Self {
        WhereArgs::FieldValue(field, value.into())
    }
}

impl<V: Into<Value>> From<(&str, Operator, V)> for WhereArgs {
    fn from((field, op, value): (&str, Operator, V)) -> Self {
        WhereArgs::FieldOpValue(field.to_string(), op, value.into())
    }
}

impl<V: Into<Value>> From<(String, Operator, V)> for WhereArgs {
    fn from((field, op, value): (String, Operator, V)) -> Self {
        WhereArgs::FieldOpValue(field, op, value.into())
    }
}

impl WhereArgs {
    fn render(self) -> Result<Vec<String>> {
        match self {
            WhereArgs::Fields(fields) => fields
                .iter()
                .map(|(field, value)| render_entry(field, value, RenderContext::literal()))
                .collect(),
            WhereArgs::Condition(condition) => Ok(vec![condition.to_sql()?]),
            WhereArgs::FieldValue(field, value) => {
                validate(&field)?;
                let predicate = if value.is_null() {
                    format!("{} IS NULL", field)
                } else {
                    format!("{} = {}", field, to_sql_value(&value)?)
                };
                Ok(vec![predicate])
            }
            WhereArgs::FieldOpValue(field, op, value) => {
                if value.is_null() {
                    return Err(QueryError::null_comparison(field));
                }
                validate(&field)?;
                Ok(vec![format!("{} {} {}", field, op.as_sql(), to_sql_value(&value)?)])
            }
        }
    }
}

/// Right-hand side of `IN` / `NOT IN`
#[derive(Debug, Clone)]
pub enum InList {
    Values(Vec<Value>),
    Query(Box<Query>),
    Raw(RawValue),
}

impl<T: Into<Value>> From<Vec<T>> for InList {
    fn from(values: Vec<T>) -> Self {
        InList::Values(values.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<Value>, const N: usize> From<[T; N]> for InList {
    fn from(values: [T; N]) -> Self {
        InList::Values(values.into_iter().map(Into::into).collect())
    }
}

impl From<Query> for InList {
    fn from(query: Query) -> Self {
        InList::Query(Box::new(query))
    }
}

impl From<RawValue> for InList {
    fn from(raw: RawValue) -> Self {
        InList::Raw(raw)
    }
}

impl InList {
    fn render(self) -> Result<String> {
        match self {
            InList::Values(values) if values.is_empty() => {
                Err(QueryError::malformed("IN list requires at least one value"))
            }
            InList::Values(values) => to_sql_value(&Value::Array(values)),
            InList::Query(query) => Ok(format!("(\n{}\n)", query.build()?)),
            InList::Raw(raw) => Ok(raw.to_string()),
        }
    }
}

impl Query {
    /// Add one or more where conditions
    ///
    /// # Errors
    /// - `NullComparison` for an explicit operator with a null value
    /// - `InjectionRisk` if a field or string value fails validation
    ///
    /// # Example
    /// ```
    /// use fluent_select::{Fields, Query, Value};
    ///
    /// let sql = Query::new()
    ///     .from("comments")?
    ///     .where_(Fields::new().with("post_id", 1).with("user_id", 1))?
    ///     .where_(("deleted_at", Value::Null))?
    ///     .build()?;
    /// assert_eq!(
    ///     sql,
    ///     "SELECT *\nFROM comments\nWHERE post_id = 1\n  AND user_id = 1\n  AND deleted_at IS NULL"
    /// );
    /// # Ok::<(), fluent_select::QueryError>(())
    /// ```
    pub fn where_(mut self, args: impl Into<WhereArgs>) -> Result<Self> {
        self.wheres.extend(args.into().render()?);
        Ok(self)
    }

    /// Add `field BETWEEN min AND max`
    pub fn where_between(
        mut self,
        field: &str,
        min: impl Into<Value>,
        max: impl Into<Value>,
    ) -> Result<Self> {
        validate(field)?;
        let (min, max) = (min.into(), max.into());
        if min.is_null() || max.is_null() {
            return Err(QueryError::null_comparison(field));
        }
        self.wheres.push(format!(
            "{} BETWEEN {} AND {}",
            field,
            to_sql_value(&min)?,
            to_sql_value(&max)?
        ));
        Ok(self)
    }

    /// Add `field IN (...)`
    pub fn where_in(self, field: &str, list: impl Into<InList>) -> Result<Self> {
        self.push_in(field, "IN", list.into())
    }

    /// Add `field NOT IN (...)`
    pub fn where_not_in(self, field: &str, list: impl Into<InList>) -> Result<Self> {
        self.push_in(field, "NOT IN", list.into())
    }

    /// Add one `IN` condition per `(field, list)` pair
    pub fn where_in_each<I, K, L>(self, lists: I) -> Result<Self>
    where
        I: IntoIterator<Item = (K, L)>,
        K: AsRef<str>,
        L: Into<InList>,
    {
        lists
            .into_iter()
            .try_fold(self, |query, (field, list)| query.where_in(field.as_ref(), list))
    }

    /// Add one `NOT IN` condition per `(field, list)` pair
    pub fn where_not_in_each<I, K, L>(self, lists: I) -> Result<Self>
    where
        I: IntoIterator<Item = (K, L)>,
        K: AsRef<str>,
        L: Into<InList>,
    {
        lists
            .into_iter()
            .try_fold(self, |query, (field, list)| query.where_not_in(field.as_ref(), list))
    }

    fn push_in(mut self, field: &str, keyword: &str, list: InList) -> Result<Self> {
        validate(field)?;
        let list = list.render()?;
        self.wheres.push(format!("{} {} {}", field, keyword, list));
        Ok(self)
    }

    /// Add `field IS NULL` for one or more fields
    pub fn where_null(mut self, fields: impl IntoList) -> Result<Self> {
        for field in fields.into_list() {
            self.wheres.push(format!("{} IS NULL", validate(&field)?));
        }
        Ok(self)
    }

    /// Add `field IS NOT NULL` for one or more fields
    pub fn where_not_null(mut self, fields: impl IntoList) -> Result<Self> {
        for field in fields.into_list() {
            self.wheres.push(format!("{} IS NOT NULL", validate(&field)?));
        }
        Ok(self)
    }

    /// Add one or more where conditions as written
    ///
    /// **Warning**: the clauses are not validated.
    pub fn where_raw(mut self, clauses: impl IntoList) -> Self {
        self.wheres.extend(clauses.into_list());
        self
    }

    /// Add `field > value`, treating a NULL field as infinitely early
    ///
    /// With `null_matches`, a NULL field counts as infinitely late instead, so
    /// the row matches.
    pub fn where_after(self, field: &str, value: impl Into<Value>, null_matches: bool) -> Result<Self> {
        let fallback = if null_matches { "+infinity" } else { "-infinity" };
        self.push_coalesced(field, fallback, ">", value.into())
    }

    /// Add `field < value`, treating a NULL field as infinitely late
    ///
    /// With `null_matches`, a NULL field counts as infinitely early instead, so
    /// the row matches.
    pub fn where_before(self, field: &str, value: impl Into<Value>, null_matches: bool) -> Result<Self> {
        let fallback = if null_matches { "-infinity" } else { "+infinity" };
        self.push_coalesced(field, fallback, "<", value.into())
    }

    fn push_coalesced(mut self, field: &str, fallback: &str, op: &str, value: Value) -> Result<Self> {
        validate(field)?;
        if value.is_null() {
            return Err(QueryError::null_comparison(field));
        }
        self.wheres.push(format!(
            "COALESCE({}, '{}'::TIMESTAMP) {} {}",
            field,
            fallback,
            op,
            to_sql_value(&value)?
        ));
        Ok(self)
    }

    /// Add `field @> ARRAY[...]`: the array column contains every value
    pub fn where_contains<I, T>(self, field: &str, values: I) -> Result<Self>
    where
        I: IntoIterator<Item = T>,
        T: Into<Value>,
    {
        self.push_array(field, "@>", values.into_iter().map(Into::into).collect())
    }

    /// Add `field <@ ARRAY[...]`: every element of the array column is one of the values
    pub fn where_contained_in<I, T>(self, field: &str, values: I) -> Result<Self>
    where
        I: IntoIterator<Item = T>,
        T: Into<Value>,
    {
        self.push_array(field, "<@", values.into_iter().map(Into::into).collect())
    }

    fn push_array(mut self, field: &str, op: &str, values: Vec<Value>) -> Result<Self> {
        validate(field)?;
        if values.is_empty() {
            return Err(QueryError::malformed(format!(
                "array comparison on '{}' requires at least one value",
                field
            )));
        }
        self.wheres.push(format!("{} {} {}", field, op, to_sql_array(&values)?));
        Ok(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sql::condition::{and, or};
    use crate::types::raw;
    use chrono::{TimeZone, Utc};

    fn from(table: &str) -> Query {
        Query::new().from(table).unwrap()
    }

    // =========================================================================
    // where_()
    // =========================================================================

    #[test]
    fn test_where_field_value() {
        let sql = from("comments").where_(("post_id", 1)).unwrap().build().unwrap();
        assert_eq!(sql, "SELECT *\nFROM comments\nWHERE post_id = 1");
    }

    #[test]
    fn test_where_field_null() {
        let sql = from("users").where_(("content", Value::Null)).unwrap().build().unwrap();
        assert_eq!(sql, "SELECT *\nFROM users\nWHERE content IS NULL");

        let sql = from("users").where_(("content", None::<i64>)).unwrap().build().unwrap();
        assert_eq!(sql, "SELECT *\nFROM users\nWHERE content IS NULL");
    }

    #[test]
    fn test_where_field_value_is_not_parsed_for_operators() {
        let sql = from("users").where_(("name", ">3")).unwrap().build().unwrap();
        assert_eq!(sql, "SELECT *\nFROM users\nWHERE name = '>3'");
    }

    #[test]
    fn test_where_field_operator_value() {
        let sql = from("posts")
            .where_(("downvotes", Operator::Gt, 10))
            .unwrap()
            .build()
            .unwrap();
        assert_eq!(sql, "SELECT *\nFROM posts\nWHERE downvotes > 10");
    }

    #[test]
    fn test_where_operator_with_null_rejected() {
        let err = from("posts")
            .where_(("content", Operator::Eq, Value::Null))
            .unwrap_err();
        assert!(matches!(err, QueryError::NullComparison(ref field) if field == "content"));
        assert!(err.to_string().contains("comparison with null"));
    }

    #[test]
    fn test_where_fields() {
        let sql = from("comments")
            .where_([("post_id", 1), ("user_id", 1)])
            .unwrap()
            .build()
            .unwrap();
        assert_eq!(sql, "SELECT *\nFROM comments\nWHERE post_id = 1\n  AND user_id = 1");
    }

    #[test]
    fn test_where_fields_with_operator_strings() {
        let fields = Fields::new()
            .with("upvotes", ">= 100")
            .with("title", "Hello")
            .with("deleted_at", Value::Null);
        let sql = from("posts").where_(fields).unwrap().build().unwrap();
        assert_eq!(
            sql,
            "SELECT *\nFROM posts\nWHERE upvotes >= 100\n  AND title = 'Hello'\n  AND deleted_at IS NULL"
        );
    }

    #[test]
    fn test_where_fields_with_inline_condition() {
        let fields = Fields::new().with("closed_at", or(["IS NULL", "> NOW()"]));
        let sql = from("posts").where_(fields).unwrap().build().unwrap();
        assert_eq!(
            sql,
            "SELECT *\nFROM posts\nWHERE (closed_at IS NULL OR closed_at > NOW())"
        );
    }

    #[test]
    fn test_where_condition() {
        let condition = or([
            crate::Predicate::from("content = ''"),
            and(["content IS NULL", "user_id IS NULL"]).into(),
        ]);
        let sql = from("comments").where_(condition).unwrap().build().unwrap();
        assert_eq!(
            sql,
            "SELECT *\nFROM comments\nWHERE (content = '' OR (content IS NULL AND user_id IS NULL))"
        );
    }

    #[test]
    fn test_where_escapes_quotes() {
        let sql = from("users").where_(("name", "O'Brien")).unwrap().build().unwrap();
        assert_eq!(sql, "SELECT *\nFROM users\nWHERE name = 'O''Brien'");
    }

    #[test]
    fn test_where_rejects_injection() {
        assert!(matches!(
            from("users").where_(("name", "x' OR 1 = 1")),
            Err(QueryError::InjectionRisk(_))
        ));
        assert!(matches!(
            from("users").where_(("id; DROP TABLE users", 1)),
            Err(QueryError::InjectionRisk(_))
        ));
    }

    #[test]
    fn test_where_fields_malformed_operator() {
        let err = from("posts").where_([("upvotes", "> 3 < 5")]).unwrap_err();
        assert!(matches!(err, QueryError::MalformedExpression(_)));
    }

    // =========================================================================
    // where_between()
    // =========================================================================

    #[test]
    fn test_where_between_numbers() {
        let sql = from("comments").where_between("upvotes", 0, 10).unwrap().build().unwrap();
        assert_eq!(sql, "SELECT *\nFROM comments\nWHERE upvotes BETWEEN 0 AND 10");
    }

    #[test]
    fn test_where_between_timestamps() {
        let min = Utc.with_ymd_and_hms(2023, 1, 1, 0, 0, 0).unwrap();
        let max = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let sql = from("posts").where_between("created_at", min, max).unwrap().build().unwrap();
        assert_eq!(
            sql,
            "SELECT *\nFROM posts\nWHERE created_at BETWEEN '2023-01-01T00:00:00.000Z' AND '2024-01-01T00:00:00.000Z'"
        );
    }

    #[test]
    fn test_where_between_null_rejected() {
        let err = from("comments").where_between("upvotes", Value::Null, 10).unwrap_err();
        assert!(matches!(err, QueryError::NullComparison(_)));
    }

    // =========================================================================
    // where_in() / where_not_in()
    // =========================================================================

    #[test]
    fn test_where_in_values() {
        let sql = from("users").where_in("id", [1, 2]).unwrap().build().unwrap();
        assert_eq!(sql, "SELECT *\nFROM users\nWHERE id IN (1, 2)");

        let sql = from("users").where_not_in("id", vec![1, 2]).unwrap().build().unwrap();
        assert_eq!(sql, "SELECT *\nFROM users\nWHERE id NOT IN (1, 2)");
    }

    #[test]
    fn test_where_in_strings() {
        let sql = from("users").where_in("role", ["admin", "editor"]).unwrap().build().unwrap();
        assert_eq!(sql, "SELECT *\nFROM users\nWHERE role IN ('admin', 'editor')");
    }

    #[test]
    fn test_where_in_subquery() {
        let subquery = from("posts")
            .select("user_id")
            .unwrap()
            .where_(("downvotes", Operator::Gt, 10))
            .unwrap();
        let sql = from("users").where_in("id", subquery.clone()).unwrap().build().unwrap();
        assert_eq!(
            sql,
            "SELECT *\nFROM users\nWHERE id IN (\nSELECT user_id\nFROM posts\nWHERE downvotes > 10\n)"
        );

        let sql = from("users").where_not_in("id", subquery).unwrap().build().unwrap();
        assert_eq!(
            sql,
            "SELECT *\nFROM users\nWHERE id NOT IN (\nSELECT user_id\nFROM posts\nWHERE downvotes > 10\n)"
        );
    }

    #[test]
    fn test_where_in_raw() {
        let sql = from("users")
            .where_in("id", raw("(SELECT user_id FROM admins)"))
            .unwrap()
            .build()
            .unwrap();
        assert_eq!(sql, "SELECT *\nFROM users\nWHERE id IN (SELECT user_id FROM admins)");
    }

    #[test]
    fn test_where_in_empty_rejected() {
        let err = from("users").where_in("id", Vec::<i64>::new()).unwrap_err();
        assert!(matches!(err, QueryError::MalformedExpression(_)));
    }

    #[test]
    fn test_where_in_mixed_types_rejected() {
        let list = InList::Values(vec![Value::Int(1), Value::Text("a".into())]);
        let err = from("users").where_in("id", list).unwrap_err();
        assert!(matches!(err, QueryError::UnsupportedType(_)));
    }

    #[test]
    fn test_where_in_each() {
        let sql = from("posts")
            .where_in_each([("user_id", vec![1, 2]), ("status_id", vec![3])])
            .unwrap()
            .where_not_in_each([("id", vec![7])])
            .unwrap()
            .build()
            .unwrap();
        assert_eq!(
            sql,
            "SELECT *\nFROM posts\nWHERE user_id IN (1, 2)\n  AND status_id IN (3)\n  AND id NOT IN (7)"
        );
    }

    // =========================================================================
    // where_null() / where_not_null() / where_raw()
    // =========================================================================

    #[test]
    fn test_where_null() {
        let sql = from("posts").where_null("content").unwrap().build().unwrap();
        assert_eq!(sql, "SELECT *\nFROM posts\nWHERE content IS NULL");

        let sql = from("posts")
            .where_null(["created_at", "updated_at"])
            .unwrap()
            .build()
            .unwrap();
        assert_eq!(
            sql,
            "SELECT *\nFROM posts\nWHERE created_at IS NULL\n  AND updated_at IS NULL"
        );
    }

    #[test]
    fn test_where_not_null() {
        let sql = from("posts").where_not_null("content").unwrap().build().unwrap();
        assert_eq!(sql, "SELECT *\nFROM posts\nWHERE content IS NOT NULL");
    }

    #[test]
    fn test_where_raw_is_not_validated() {
        let sql = from("posts")
            .where_raw(["upvotes > 10 OR downvotes > 10"])
            .build()
            .unwrap();
        assert_eq!(sql, "SELECT *\nFROM posts\nWHERE upvotes > 10 OR downvotes > 10");
    }

    // =========================================================================
    // where_after() / where_before()
    // =========================================================================

    #[test]
    fn test_where_after() {
        let sql = from("users")
            .where_after("verified_at", raw("NOW()"), false)
            .unwrap()
            .build()
            .unwrap();
        assert_eq!(
            sql,
            "SELECT *\nFROM users\nWHERE COALESCE(verified_at, '-infinity'::TIMESTAMP) > NOW()"
        );

        let sql = from("users")
            .where_after("expiration", raw("NOW()"), true)
            .unwrap()
            .build()
            .unwrap();
        assert_eq!(
            sql,
            "SELECT *\nFROM users\nWHERE COALESCE(expiration, '+infinity'::TIMESTAMP) > NOW()"
        );
    }

    #[test]
    fn test_where_before() {
        let sql = from("users")
            .where_before("verified_at", raw("NOW()"), false)
            .unwrap()
            .build()
            .unwrap();
        assert_eq!(
            sql,
            "SELECT *\nFROM users\nWHERE COALESCE(verified_at, '+infinity'::TIMESTAMP) < NOW()"
        );

        let sql = from("users")
            .where_before("migration", raw("NOW()"), true)
            .unwrap()
            .build()
            .unwrap();
        assert_eq!(
            sql,
            "SELECT *\nFROM users\nWHERE COALESCE(migration, '-infinity'::TIMESTAMP) < NOW()"
        );
    }

    // =========================================================================
    // where_contains() / where_contained_in()
    // =========================================================================

    #[test]
    fn test_where_contains() {
        let sql = from("users").where_contains("tag_ids", [1, 2, 3]).unwrap().build().unwrap();
        assert_eq!(sql, "SELECT *\nFROM users\nWHERE tag_ids @> ARRAY[1, 2, 3]");
    }

    #[test]
    fn test_where_contained_in() {
        let sql = from("users")
            .where_contained_in("tag_ids", vec![1, 2, 3])
            .unwrap()
            .build()
            .unwrap();
        assert_eq!(sql, "SELECT *\nFROM users\nWHERE tag_ids <@ ARRAY[1, 2, 3]");
    }

    #[test]
    fn test_where_contains_empty_rejected() {
        let err = from("users").where_contains("tag_ids", Vec::<i64>::new()).unwrap_err();
        assert!(matches!(err, QueryError::MalformedExpression(_)));
    }
}
