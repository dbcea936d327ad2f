//! Error types for the school evaluation service
//!
//! This module provides structured error definitions using thiserror; anyhow
//! is accepted at the binary edge and folded into [`EvalError::Other`].

use thiserror::Error;

/// Main error type for school evaluation operations
#[derive(Error, Debug)]
pub enum EvalError {
    /// Database operation failed
    #[error("Database error: {0}")]
    Database(String),

    /// Schema migration failed
    #[error("Migration error: {0}")]
    Migration(String),

    /// LLM gateway request failed
    #[error("LLM API error: {0}")]
    LlmApi(String),

    /// Invalid identifier format
    #[error("Invalid id: {0}")]
    InvalidId(#[from] uuid::Error),

    /// Requested row does not exist
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    /// Request input failed validation
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Credential or session rejected
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Password hashing or verification failed
    #[error("Credential error: {0}")]
    Credential(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// HTTP request error
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Generic error with context
    #[error("{0}")]
    Other(String),
}

impl EvalError {
    /// Shorthand for a missing row
    pub fn not_found(entity: &'static str, id: impl ToString) -> Self {
        EvalError::NotFound {
            entity,
            id: id.to_string(),
        }
    }
}

/// Result type alias for school evaluation operations
pub type Result<T> = std::result::Result<T, EvalError>;

impl From<libsql::Error> for EvalError {
    fn from(err: libsql::Error) -> Self {
        EvalError::Database(err.to_string())
    }
}

impl From<bcrypt::BcryptError> for EvalError {
    fn from(err: bcrypt::BcryptError) -> Self {
        EvalError::Credential(err.to_string())
    }
}

/// Convert anyhow::Error to EvalError
impl From<anyhow::Error> for EvalError {
    fn from(err: anyhow::Error) -> Self {
        EvalError::Other(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = EvalError::not_found("project", "abc");
        assert_eq!(err.to_string(), "project not found: abc");
    }

    #[test]
    fn test_error_conversion() {
        let uuid_err = uuid::Uuid::parse_str("invalid");
        assert!(uuid_err.is_err());

        let eval_err: EvalError = uuid_err.unwrap_err().into();
        assert!(matches!(eval_err, EvalError::InvalidId(_)));
    }
}
