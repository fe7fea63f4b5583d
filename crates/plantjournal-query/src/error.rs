//! Error types for criteria compilation

use thiserror::Error;

/// Errors raised while turning a filter object into SQL.
///
/// All of them describe bad caller input; none are raised after a statement
/// has been sent to the backend.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum QueryError {
    /// The `where` value is not an object
    #[error("Invalid filter: {0}")]
    InvalidFilter(String),

    /// Attribute alias not known to the entity being queried
    #[error("Unknown attribute '{alias}'")]
    UnknownAlias { alias: String },

    /// `$op` key that is not part of the operator set
    #[error("Unknown operator '{operator}' on attribute '{alias}'")]
    UnknownOperator { alias: String, operator: String },

    /// Operand has the wrong shape for its operator or attribute
    #[error("Invalid operand for {operator} on attribute '{alias}': {reason}")]
    InvalidOperand {
        alias: String,
        operator: String,
        reason: String,
    },

    /// Dotted JSON path that cannot be expressed
    #[error("Invalid JSON path on attribute '{alias}': {reason}")]
    InvalidPath { alias: String, reason: String },
}

/// Result type for criteria compilation
pub type QueryResult<T> = Result<T, QueryError>;
