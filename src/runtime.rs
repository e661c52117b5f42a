//! Process-wide query runtime
//!
//! Holds the [`QueryConfig`] used by [`Query::run`](crate::Query::run) and by
//! join alias inference. Re-initializing replaces the configuration for every
//! query in the process.

use std::sync::{Arc, LazyLock, PoisonError, RwLock};

use crate::config::QueryConfig;
use crate::executor::Executor;

static RUNTIME: LazyLock<RwLock<QueryConfig>> = LazyLock::new(|| RwLock::new(QueryConfig::default()));

/// Install `config` process-wide
///
/// # Example
/// ```
/// use fluent_select::{QueryConfig, QueryError, runtime};
///
/// runtime::init(
///     QueryConfig::builder()
///         .run(|_sql| async { Ok::<_, QueryError>(Vec::new()) })
///         .build(),
/// );
/// assert!(runtime::is_initialized());
/// runtime::reset();
/// assert!(!runtime::is_initialized());
/// ```
pub fn init(config: QueryConfig) {
    tracing::debug!(
        target: "fluent_select::runtime",
        executor = config.executor.is_some(),
        "query runtime initialized"
    );
    let mut runtime = RUNTIME.write().unwrap_or_else(PoisonError::into_inner);
    *runtime = config;
}

/// Restore the default configuration (no executor, initials alias strategy)
pub fn reset() {
    tracing::debug!(target: "fluent_select::runtime", "query runtime reset");
    let mut runtime = RUNTIME.write().unwrap_or_else(PoisonError::into_inner);
    *runtime = QueryConfig::default();
}

/// Whether an executor is registered
pub fn is_initialized() -> bool {
    executor().is_some()
}

/// The registered executor, if any
pub fn executor() -> Option<Arc<dyn Executor>> {
    RUNTIME
        .read()
        .unwrap_or_else(PoisonError::into_inner)
        .executor
        .clone()
}

/// Alias for `table` according to the registered alias strategy
pub fn make_alias(table: &str) -> String {
    let strategy = RUNTIME
        .read()
        .unwrap_or_else(PoisonError::into_inner)
        .alias_strategy
        .clone();
    strategy(table)
}
