//! Error types for query construction and execution

use thiserror::Error;

/// Errors that can occur while building or running a query
#[derive(Debug, Error)]
pub enum QueryError {
    #[error("Potential SQL injection vulnerability: {0}")]
    InjectionRisk(String),

    #[error("Unexpected type: {0}")]
    UnsupportedType(String),

    #[error("Malformed expression: {0}")]
    MalformedExpression(String),

    #[error("Query already has '{0}'")]
    AlreadySet(&'static str),

    #[error("Cannot build query missing 'from'")]
    MissingFromClause,

    #[error("Cannot build query with 'having', but missing 'group by'")]
    MissingGroupBy,

    #[error(
        "Attempted comparison with null on '{0}'. This is often an error; use where_null or where_raw instead"
    )]
    NullComparison(String),

    #[error("Cannot run without initializing the query runtime")]
    NotInitialized,

    #[error("SQL error: {0}")]
    Sql(#[from] sqlx::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Execution error: {0}")]
    Execution(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl QueryError {
    pub fn injection_risk(input: impl Into<String>) -> Self {
        Self::InjectionRisk(input.into())
    }

    pub fn unsupported_type(type_name: impl Into<String>) -> Self {
        Self::UnsupportedType(type_name.into())
    }

    pub fn malformed(msg: impl Into<String>) -> Self {
        Self::MalformedExpression(msg.into())
    }

    pub fn null_comparison(field: impl Into<String>) -> Self {
        Self::NullComparison(field.into())
    }

    /// Wrap an error raised by an executor callback
    pub fn execution(err: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> Self {
        Self::Execution(err.into())
    }
}

pub type Result<T> = std::result::Result<T, QueryError>;
