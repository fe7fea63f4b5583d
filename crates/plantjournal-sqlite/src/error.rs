//! Error types for the plant journal store

use plantjournal_query::QueryError;
use thiserror::Error;

/// Plant journal store error type
#[derive(Error, Debug)]
pub enum StoreError {
    /// Bad, missing or mistyped input; raised before any statement runs
    #[error("Validation error: {0}")]
    Validation(String),

    /// A submitted foreign key does not resolve to an existing row
    #[error("{reference} does not reference an existing {target}")]
    Reference {
        reference: String,
        target: &'static str,
    },

    /// Any other storage failure
    #[error("SQLite error: {0}")]
    Backend(#[from] rusqlite::Error),

    /// Database connection error
    #[error("Connection error: {0}")]
    Connection(String),

    /// Schema/migration error
    #[error("Schema error: {0}")]
    Schema(String),

    /// Configuration could not be read or parsed
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Blocking task failed to complete
    #[error("Task error: {0}")]
    Task(String),
}

/// Result type for store operations
pub type StoreResult<T> = Result<T, StoreError>;

impl StoreError {
    pub(crate) fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }

    pub fn is_reference(&self) -> bool {
        matches!(self, Self::Reference { .. })
    }
}

impl From<QueryError> for StoreError {
    fn from(err: QueryError) -> Self {
        Self::Validation(err.to_string())
    }
}

/// True when the error is SQLite rejecting a foreign key
pub(crate) fn is_foreign_key_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(e, _)
            if e.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_FOREIGNKEY
    )
}
