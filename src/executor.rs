//! Query execution
//!
//! The builder never talks to a database itself. A built statement is handed to
//! an [`Executor`], either passed explicitly to [`Query::run_with`] or
//! registered process-wide through [`runtime::init`](crate::runtime::init).
//!
//! [`Query::run_with`]: crate::Query::run_with

use std::any::Any;
use std::fmt;
use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use sqlx::PgPool;
use tokio::sync::Mutex;

use crate::error::{QueryError, Result};

/// A single result row, as a JSON object keyed by column name
pub type Row = serde_json::Value;

/// Runs built SQL and resolves to its rows
#[async_trait]
pub trait Executor: Send + Sync {
    /// Execute `sql`, inside `transaction` when the query carries one
    async fn execute(&self, sql: &str, transaction: Option<&TransactionHandle>) -> Result<Vec<Row>>;
}

/// Opaque transaction object carried by a query and handed to its executor
#[derive(Clone)]
pub struct TransactionHandle(Arc<dyn Any + Send + Sync>);

impl TransactionHandle {
    pub fn new<T: Any + Send + Sync>(transaction: T) -> Self {
        Self(Arc::new(transaction))
    }

    /// Borrow the wrapped transaction if it has type `T`
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.0.downcast_ref::<T>()
    }
}

impl fmt::Debug for TransactionHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("TransactionHandle(..)")
    }
}

// ============================================================================
// Callback executor
// ============================================================================

/// Executor backed by an async callback receiving the SQL text
///
/// # Example
/// ```
/// use fluent_select::{FnExecutor, Query};
///
/// # tokio_test_block(async {
/// let executor = FnExecutor::new(|sql: String| async move {
///     Ok::<_, fluent_select::QueryError>(vec![serde_json::json!({ "sql": sql })])
/// });
/// let rows = Query::new().from("users")?.run_with(&executor).await?;
/// assert_eq!(rows[0]["sql"], "SELECT *\nFROM users");
/// # Ok::<(), fluent_select::QueryError>(())
/// # }).unwrap();
/// # fn tokio_test_block<F: std::future::Future>(f: F) -> F::Output {
/// #     tokio::runtime::Builder::new_current_thread().build().unwrap().block_on(f)
/// # }
/// ```
pub struct FnExecutor<F> {
    callback: F,
}

impl<F, Fut> FnExecutor<F>
where
    F: Fn(String) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Vec<Row>>> + Send + 'static,
{
    pub fn new(callback: F) -> Self {
        Self { callback }
    }
}

#[async_trait]
impl<F, Fut> Executor for FnExecutor<F>
where
    F: Fn(String) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Vec<Row>>> + Send + 'static,
{
    async fn execute(&self, sql: &str, _transaction: Option<&TransactionHandle>) -> Result<Vec<Row>> {
        (self.callback)(sql.to_string()).await
    }
}

// ============================================================================
// PostgreSQL executor
// ============================================================================

/// Shared Postgres transaction; `None` once committed or rolled back
pub type PgTransaction = Arc<Mutex<Option<sqlx::Transaction<'static, sqlx::Postgres>>>>;

/// Executor running statements on a sqlx Postgres pool
///
/// Each row comes back as `to_jsonb(row)`, so column names become object keys.
#[derive(Debug, Clone)]
pub struct PgExecutor {
    pool: PgPool,
}

impl PgExecutor {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Connect a new pool
    pub async fn connect(database_url: &str) -> Result<Self> {
        let pool = PgPool::connect(database_url).await?;
        Ok(Self { pool })
    }

    /// Get a reference to the connection pool
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Begin a transaction that queries can carry via [`Query::transaction`]
    ///
    /// [`Query::transaction`]: crate::Query::transaction
    pub async fn begin(&self) -> Result<TransactionHandle> {
        let transaction = self.pool.begin().await?;
        let shared: PgTransaction = Arc::new(Mutex::new(Some(transaction)));
        Ok(TransactionHandle::new(shared))
    }

    pub async fn commit(handle: &TransactionHandle) -> Result<()> {
        Self::take(handle).await?.commit().await?;
        Ok(())
    }

    pub async fn rollback(handle: &TransactionHandle) -> Result<()> {
        Self::take(handle).await?.rollback().await?;
        Ok(())
    }

    async fn take(
        handle: &TransactionHandle,
    ) -> Result<sqlx::Transaction<'static, sqlx::Postgres>> {
        let shared = Self::shared(handle)?;
        let mut guard = shared.lock().await;
        guard
            .take()
            .ok_or_else(|| QueryError::execution("transaction already finished"))
    }

    fn shared(handle: &TransactionHandle) -> Result<&PgTransaction> {
        handle
            .downcast_ref::<PgTransaction>()
            .ok_or_else(|| QueryError::execution("transaction handle is not a Postgres transaction"))
    }
}

fn rows_as_json(sql: &str) -> String {
    format!("SELECT to_jsonb(fluent_row) FROM (\n{}\n) AS fluent_row", sql)
}

#[async_trait]
impl Executor for PgExecutor {
    async fn execute(&self, sql: &str, transaction: Option<&TransactionHandle>) -> Result<Vec<Row>> {
        let wrapped = rows_as_json(sql);
        let query = sqlx::query_scalar::<_, serde_json::Value>(&wrapped);

        let rows = match transaction {
            Some(handle) => {
                let shared = Self::shared(handle)?;
                let mut guard = shared.lock().await;
                let transaction = guard
                    .as_mut()
                    .ok_or_else(|| QueryError::execution("transaction already finished"))?;
                query.fetch_all(&mut **transaction).await?
            }
            None => query.fetch_all(&self.pool).await?,
        };

        Ok(rows)
    }
}
