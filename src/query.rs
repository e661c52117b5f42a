//! Query - fluent SELECT statement builder
//!
//! Every fluent method consumes the query and returns it again, so chains read
//! top to bottom and fallible steps use `?`:
//!
//! ```
//! use fluent_select::{Order, Query};
//!
//! let sql = Query::new()
//!     .select(["post_id", "count(*)"])?
//!     .from("comments")?
//!     .group_by("post_id")?
//!     .having("count(*) >= 10")?
//!     .order_by("post_id", Order::Asc)?
//!     .build()?;
//! assert_eq!(
//!     sql,
//!     "SELECT post_id,\n  count(*)\nFROM comments\nGROUP BY post_id\nHAVING count(*) >= 10\nORDER BY post_id ASC"
//! );
//! # Ok::<(), fluent_select::QueryError>(())
//! ```

use serde::de::DeserializeOwned;

use crate::error::{QueryError, Result};
use crate::executor::{Executor, Row, TransactionHandle};
use crate::filter::WhereArgs;
use crate::runtime;
use crate::sql::sanitize::{validate, validate_all};
use crate::sql::table::split_table_alias;
use crate::types::{IntoList, Order, RawValue};

/// Alias used when a query is embedded without one
pub const DEFAULT_SUBQUERY_ALIAS: &str = "sub";

/// Named parts of a query, for [`Query::clear`] and [`Query::clone_excluding`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Clause {
    With,
    Select,
    From,
    Alias,
    Join,
    Where,
    GroupBy,
    Having,
    OrderBy,
    Limit,
    Offset,
    Transaction,
}

/// Something a query can select from or join against
#[derive(Debug, Clone)]
pub enum Source {
    /// Table name, optionally followed by `[AS] alias`
    Table(String),
    /// Subquery, embedded in parentheses
    Query(Box<Query>),
    /// Verbatim expression such as a set-returning function call
    Raw(RawValue),
}

impl From<&str> for Source {
    fn from(table: &str) -> Self {
        Source::Table(table.to_string())
    }
}

impl From<String> for Source {
    fn from(table: String) -> Self {
        Source::Table(table)
    }
}

impl From<Query> for Source {
    fn from(query: Query) -> Self {
        Source::Query(Box::new(query))
    }
}

impl From<RawValue> for Source {
    fn from(raw: RawValue) -> Self {
        Source::Raw(raw)
    }
}

impl Source {
    /// Render as `target [AS alias]`, returning the alias in effect
    ///
    /// An explicit `alias` wins over one written in a table string. With
    /// `infer_alias`, tables without any alias get one from the runtime's alias
    /// strategy.
    pub(crate) fn resolve(
        self,
        alias: Option<&str>,
        infer_alias: bool,
    ) -> Result<(String, Option<String>)> {
        let explicit = alias.map(validate).transpose()?.map(str::to_string);
        match self {
            Source::Table(table) => {
                let (name, parsed) = split_table_alias(&table)?;
                let alias = explicit
                    .or(parsed)
                    .or_else(|| infer_alias.then(|| runtime::make_alias(&name)));
                let target = match &alias {
                    Some(alias) => format!("{} AS {}", name, alias),
                    None => name,
                };
                Ok((target, alias))
            }
            Source::Query(query) => {
                let alias = explicit.unwrap_or_else(|| query.alias.clone());
                let target = format!("(\n{}\n) AS {}", query.build()?, alias);
                Ok((target, Some(alias)))
            }
            Source::Raw(raw) => {
                let target = match &explicit {
                    Some(alias) => format!("{} AS {}", raw, alias),
                    None => raw.to_string(),
                };
                Ok((target, explicit))
            }
        }
    }
}

/// Construction record for building a query in one step
#[derive(Debug, Default)]
pub struct QueryParts {
    pub select: Vec<String>,
    pub from: Option<Source>,
    pub alias: Option<String>,
    /// Complete join clauses, added like [`Query::join_raw`]
    pub joins: Vec<String>,
    pub wheres: Vec<WhereArgs>,
    pub group_by: Vec<String>,
    pub having: Vec<String>,
    /// Complete `ORDER BY` items, validated
    pub order_by: Vec<String>,
    pub limit: Option<u64>,
    pub offset: Option<u64>,
    pub transaction: Option<TransactionHandle>,
}

/// A SELECT statement under construction
#[derive(Debug, Clone)]
pub struct Query {
    pub(crate) withs: Vec<String>,
    pub(crate) selects: Vec<String>,
    pub(crate) from: Option<String>,
    pub(crate) alias: String,
    pub(crate) joins: Vec<String>,
    pub(crate) wheres: Vec<String>,
    pub(crate) groups: Vec<String>,
    pub(crate) havings: Vec<String>,
    pub(crate) orders: Vec<String>,
    pub(crate) limit: Option<u64>,
    pub(crate) offset: Option<u64>,
    pub(crate) transaction: Option<TransactionHandle>,
}

impl Default for Query {
    fn default() -> Self {
        Self {
            withs: Vec::new(),
            selects: Vec::new(),
            from: None,
            alias: DEFAULT_SUBQUERY_ALIAS.to_string(),
            joins: Vec::new(),
            wheres: Vec::new(),
            groups: Vec::new(),
            havings: Vec::new(),
            orders: Vec::new(),
            limit: None,
            offset: None,
            transaction: None,
        }
    }
}

impl TryFrom<QueryParts> for Query {
    type Error = QueryError;

    fn try_from(parts: QueryParts) -> Result<Self> {
        let mut query = Query::new().select(parts.select)?;
        if let Some(alias) = parts.alias {
            query = query.alias(&alias)?;
        }
        if let Some(from) = parts.from {
            query = query.from(from)?;
        }
        query = query.join_raw(parts.joins);
        for args in parts.wheres {
            query = query.where_(args)?;
        }
        query = query.group_by(parts.group_by)?.having(parts.having)?;
        query.orders = validate_all(parts.order_by)?;
        if let Some(limit) = parts.limit {
            query = query.limit(limit)?;
        }
        if let Some(offset) = parts.offset {
            query = query.offset(offset)?;
        }
        if let Some(transaction) = parts.transaction {
            query = query.transaction(transaction)?;
        }
        Ok(query)
    }
}

impl Query {
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate a string against SQL injection exploits
    pub fn validate(input: &str) -> Result<&str> {
        validate(input)
    }

    /// Wrap a value so that it is written into the statement verbatim
    ///
    /// **Warning**: raw values are not validated.
    pub fn raw(value: impl ToString) -> RawValue {
        crate::types::raw(value)
    }

    // =========================================================================
    // WITH / SELECT / FROM
    // =========================================================================

    /// Add a common table expression named after the subquery's alias
    pub fn with(self, query: Query) -> Result<Self> {
        let alias = query.alias.clone();
        self.push_with(&alias, &query.build()?)
    }

    /// Add a common table expression under `alias`
    pub fn with_as(self, query: Query, alias: &str) -> Result<Self> {
        validate(alias)?;
        self.push_with(alias, &query.build()?)
    }

    /// Add a common table expression from SQL text
    ///
    /// **Warning**: the SQL is not validated; only the alias is.
    pub fn with_raw(self, sql: &str, alias: &str) -> Result<Self> {
        validate(alias)?;
        self.push_with(alias, sql)
    }

    fn push_with(mut self, alias: &str, sql: &str) -> Result<Self> {
        self.withs.push(format!("{} AS (\n{}\n)", alias, sql));
        Ok(self)
    }

    /// Add one or more fields to the select list
    pub fn select(mut self, fields: impl IntoList) -> Result<Self> {
        self.selects.extend(validate_all(fields.into_list())?);
        Ok(self)
    }

    /// Set the table or subquery to select from
    ///
    /// # Errors
    /// `AlreadySet` if the query already has one.
    pub fn from(self, source: impl Into<Source>) -> Result<Self> {
        self.set_from(source.into(), None)
    }

    /// Set the table or subquery to select from, under `alias`
    pub fn from_as(self, source: impl Into<Source>, alias: &str) -> Result<Self> {
        self.set_from(source.into(), Some(alias))
    }

    fn set_from(mut self, source: Source, alias: Option<&str>) -> Result<Self> {
        if self.from.is_some() {
            return Err(QueryError::AlreadySet("from"));
        }
        let (target, _) = source.resolve(alias, false)?;
        self.from = Some(target);
        Ok(self)
    }

    /// Set the alias used when this query is embedded as a subquery
    pub fn alias(mut self, alias: &str) -> Result<Self> {
        self.alias = validate(alias)?.to_string();
        Ok(self)
    }

    /// The alias used when this query is embedded as a subquery
    pub fn subquery_alias(&self) -> &str {
        &self.alias
    }

    // =========================================================================
    // GROUP BY / HAVING / ORDER BY
    // =========================================================================

    /// Add one or more columns to the group by clause
    pub fn group_by(mut self, fields: impl IntoList) -> Result<Self> {
        self.groups.extend(validate_all(fields.into_list())?);
        Ok(self)
    }

    /// Add one or more conditions to the having clause
    pub fn having(mut self, conditions: impl IntoList) -> Result<Self> {
        self.havings.extend(validate_all(conditions.into_list())?);
        Ok(self)
    }

    /// Add a column to the order by clause
    pub fn order_by(mut self, column: &str, order: impl Into<Option<Order>>) -> Result<Self> {
        validate(column)?;
        let item = match order.into() {
            Some(order) => format!("{} {}", column, order.as_sql()),
            None => column.to_string(),
        };
        self.orders.push(item);
        Ok(self)
    }

    /// Add an order by item without validating it
    ///
    /// **Warning**: the clause is not validated.
    pub fn order_by_raw(mut self, clause: impl Into<String>) -> Self {
        self.orders.push(clause.into());
        self
    }

    // =========================================================================
    // LIMIT / OFFSET / transaction
    // =========================================================================

    /// Set the limit
    ///
    /// # Errors
    /// `AlreadySet` if the limit has already been set.
    pub fn limit(mut self, limit: u64) -> Result<Self> {
        if self.limit.is_some() {
            return Err(QueryError::AlreadySet("limit"));
        }
        self.limit = Some(limit);
        Ok(self)
    }

    /// Set the offset
    ///
    /// # Errors
    /// `AlreadySet` if the offset has already been set.
    pub fn offset(mut self, offset: u64) -> Result<Self> {
        if self.offset.is_some() {
            return Err(QueryError::AlreadySet("offset"));
        }
        self.offset = Some(offset);
        Ok(self)
    }

    /// Set limit and offset for 1-based page `page`
    ///
    /// # Errors
    /// `MalformedExpression` if the offset does not fit in a `u64`.
    pub fn for_page(self, page: u64, page_size: u64) -> Result<Self> {
        let query = if page > 1 {
            let offset = (page - 1).checked_mul(page_size).ok_or_else(|| {
                QueryError::malformed(format!("page {} of size {} is out of range", page, page_size))
            })?;
            self.offset(offset)?
        } else {
            self
        };
        query.limit(page_size)
    }

    /// Attach a transaction for the executor to run in
    ///
    /// # Errors
    /// `AlreadySet` if the query already carries a transaction.
    pub fn transaction(mut self, transaction: TransactionHandle) -> Result<Self> {
        if self.transaction.is_some() {
            return Err(QueryError::AlreadySet("transaction"));
        }
        self.transaction = Some(transaction);
        Ok(self)
    }

    pub fn transaction_handle(&self) -> Option<&TransactionHandle> {
        self.transaction.as_ref()
    }

    // =========================================================================
    // Copying
    // =========================================================================

    /// Reset clauses to their empty value
    pub fn clear(mut self, clauses: &[Clause]) -> Self {
        for clause in clauses {
            match clause {
                Clause::With => self.withs.clear(),
                Clause::Select => self.selects.clear(),
                Clause::From => self.from = None,
                Clause::Alias => self.alias = DEFAULT_SUBQUERY_ALIAS.to_string(),
                Clause::Join => self.joins.clear(),
                Clause::Where => self.wheres.clear(),
                Clause::GroupBy => self.groups.clear(),
                Clause::Having => self.havings.clear(),
                Clause::OrderBy => self.orders.clear(),
                Clause::Limit => self.limit = None,
                Clause::Offset => self.offset = None,
                Clause::Transaction => self.transaction = None,
            }
        }
        self
    }

    /// Copy the query without the given clauses
    pub fn clone_excluding(&self, clauses: &[Clause]) -> Query {
        self.clone().clear(clauses)
    }

    // =========================================================================
    // Building and running
    // =========================================================================

    /// Assemble the statement
    ///
    /// # Errors
    /// - `MissingFromClause` if no table was set
    /// - `MissingGroupBy` if there are having conditions but no group by
    pub fn build(&self) -> Result<String> {
        let from = self.from.as_deref().ok_or(QueryError::MissingFromClause)?;
        if !self.havings.is_empty() && self.groups.is_empty() {
            return Err(QueryError::MissingGroupBy);
        }

        let select = if self.selects.is_empty() {
            "*".to_string()
        } else {
            self.selects.join(",\n  ")
        };

        let clauses = [
            clause("WITH", &self.withs, ",\n"),
            Some(format!("SELECT {}", select)),
            Some(format!("FROM {}", from)),
            (!self.joins.is_empty()).then(|| self.joins.join("\n")),
            clause("WHERE", &self.wheres, "\n  AND "),
            clause("GROUP BY", &self.groups, ",\n  "),
            clause("HAVING", &self.havings, "\n  AND "),
            clause("ORDER BY", &self.orders, ",\n  "),
            self.limit.map(|limit| format!("LIMIT {}", limit)),
            self.offset.map(|offset| format!("OFFSET {}", offset)),
        ];

        let sql = clauses.into_iter().flatten().collect::<Vec<_>>().join("\n");
        tracing::trace!(target: "fluent_select::sql", sql = %sql, "built query");
        Ok(sql)
    }

    /// Build and run the query on the process-wide executor
    ///
    /// # Errors
    /// `NotInitialized` if no executor has been registered with
    /// [`runtime::init`](crate::runtime::init); otherwise build errors and
    /// executor errors unchanged.
    pub async fn run(&self) -> Result<Vec<Row>> {
        let executor = runtime::executor().ok_or(QueryError::NotInitialized)?;
        self.run_with(executor.as_ref()).await
    }

    /// Build and run the query on `executor`
    pub async fn run_with(&self, executor: &dyn Executor) -> Result<Vec<Row>> {
        let sql = self.build()?;
        tracing::debug!(
            target: "fluent_select::sql",
            sql = %sql,
            transaction = self.transaction.is_some(),
            "running query"
        );
        executor
            .execute(&sql, self.transaction.as_ref())
            .await
            .inspect_err(|err| {
                tracing::warn!(target: "fluent_select::sql", error = %err, "query execution failed")
            })
    }

    /// Build and run the query, deserializing each row into `T`
    pub async fn run_as<T: DeserializeOwned>(&self) -> Result<Vec<T>> {
        self.run()
            .await?
            .into_iter()
            .map(|row| serde_json::from_value(row).map_err(QueryError::from))
            .collect()
    }
}

/// `KEYWORD part<sep>part...`, or nothing for an empty clause
fn clause(keyword: &str, parts: &[String], separator: &str) -> Option<String> {
    (!parts.is_empty()).then(|| format!("{} {}", keyword, parts.join(separator)))
}
