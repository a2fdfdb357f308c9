//! Common error types for the diagnostic engine

use thiserror::Error;

/// Result type for engine operations
pub type EngineResult<T> = Result<T, EngineError>;

/// Errors that can occur in the diagnostic engine
#[derive(Debug, Error)]
pub enum EngineError {
    /// Session has not been started (or was already torn down)
    #[error("Session not found: {0}")]
    SessionNotFound(String),

    /// Reference data names a parameter the catalog does not know
    #[error("Unknown parameter '{pid}' referenced by {referrer}")]
    UnknownParameter { pid: String, referrer: String },

    /// Two rules share the same id
    #[error("Duplicate rule id: {0}")]
    DuplicateRuleId(String),

    /// Two correlations share the same id
    #[error("Duplicate correlation id: {0}")]
    DuplicateCorrelationId(String),

    /// Two parameter definitions share the same pid
    #[error("Duplicate parameter: {0}")]
    DuplicateParameter(String),

    /// A rule fails structural validation
    #[error("Invalid rule '{id}': {reason}")]
    InvalidRule { id: String, reason: String },

    /// A correlation fails structural validation
    #[error("Invalid correlation '{id}': {reason}")]
    InvalidCorrelation { id: String, reason: String },

    /// A rule with custom logic has no registered predicate
    #[error("No predicate registered for custom rule '{0}'")]
    MissingPredicate(String),
}
