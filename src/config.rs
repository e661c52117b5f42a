//! Configuration for query execution
//!
//! Provides a builder pattern for the settings installed process-wide with
//! [`runtime::init`](crate::runtime::init).

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use crate::error::Result;
use crate::executor::{Executor, FnExecutor, Row};
use crate::sql::table::initials_alias;

/// Derives an alias from a table name
pub type AliasStrategy = Arc<dyn Fn(&str) -> String + Send + Sync>;

/// Query runtime configuration
#[derive(Clone)]
pub struct QueryConfig {
    /// Executor used by `Query::run` (none: running fails with `NotInitialized`)
    pub executor: Option<Arc<dyn Executor>>,
    /// Alias inference for joined tables without an alias (default: initials)
    pub alias_strategy: AliasStrategy,
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            executor: None,
            alias_strategy: Arc::new(initials_alias),
        }
    }
}

impl fmt::Debug for QueryConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QueryConfig")
            .field("executor", &self.executor.as_ref().map(|_| ".."))
            .field("alias_strategy", &"..")
            .finish()
    }
}

impl QueryConfig {
    /// Create a new configuration builder
    pub fn builder() -> QueryConfigBuilder {
        QueryConfigBuilder::new()
    }

    /// Alias for `table` according to the configured strategy
    pub fn alias_for(&self, table: &str) -> String {
        (self.alias_strategy)(table)
    }
}

/// Builder for QueryConfig
#[derive(Default)]
pub struct QueryConfigBuilder {
    config: QueryConfig,
}

impl fmt::Debug for QueryConfigBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QueryConfigBuilder")
            .field("config", &self.config)
            .finish()
    }
}

impl QueryConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the executor
    pub fn executor(mut self, executor: impl Executor + 'static) -> Self {
        self.config.executor = Some(Arc::new(executor));
        self
    }

    /// Set an executor that is already shared elsewhere
    pub fn shared_executor(mut self, executor: Arc<dyn Executor>) -> Self {
        self.config.executor = Some(executor);
        self
    }

    /// Set the executor from an async callback receiving the SQL text
    pub fn run<F, Fut>(self, callback: F) -> Self
    where
        F: Fn(String) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Vec<Row>>> + Send + 'static,
    {
        self.executor(FnExecutor::new(callback))
    }

    /// Set the alias strategy (default: first letter of each underscore-separated word)
    pub fn alias_strategy(mut self, strategy: impl Fn(&str) -> String + Send + Sync + 'static) -> Self {
        self.config.alias_strategy = Arc::new(strategy);
        self
    }

    /// Build the configuration
    pub fn build(self) -> QueryConfig {
        self.config
    }
}
