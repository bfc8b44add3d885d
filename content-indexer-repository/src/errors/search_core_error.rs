//! Search core error types.
//!
//! This module defines the unified error type for all operations against a
//! search core, from configuration problems through transport failures to
//! requests the engine rejected.

use content_indexer_shared::ModelError;
use thiserror::Error;

/// Unified errors from search core operations.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum SearchCoreError {
    /// The connection configuration is malformed or incomplete.
    #[error("Invalid connection config: {0}")]
    InvalidConnectionConfig(String),

    /// The engine could not be reached.
    #[error("Connection error: {0}")]
    ConnectionError(String),

    /// The engine answered with a non-success status.
    #[error("{operation} rejected with status {status}: {message}")]
    Rejected {
        operation: String,
        status: u16,
        message: String,
    },

    /// Failed to parse a response from the engine.
    #[error("Parse error: {0}")]
    ParseError(String),

    /// A document could not be serialized for submission.
    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl SearchCoreError {
    /// Create an invalid connection config error.
    pub fn invalid_connection_config(msg: impl Into<String>) -> Self {
        Self::InvalidConnectionConfig(msg.into())
    }

    /// Create a connection error.
    pub fn connection(msg: impl Into<String>) -> Self {
        Self::ConnectionError(msg.into())
    }

    /// Create a rejection error for a non-success response.
    pub fn rejected(operation: impl Into<String>, status: u16, message: impl Into<String>) -> Self {
        Self::Rejected {
            operation: operation.into(),
            status,
            message: message.into(),
        }
    }

    /// Create a parse error.
    pub fn parse(msg: impl Into<String>) -> Self {
        Self::ParseError(msg.into())
    }

    /// Create a serialization error.
    pub fn serialization(msg: impl Into<String>) -> Self {
        Self::SerializationError(msg.into())
    }

    /// HTTP status attached to the error, if the engine answered at all.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Rejected { status, .. } => Some(*status),
            _ => None,
        }
    }
}

impl From<ModelError> for SearchCoreError {
    fn from(err: ModelError) -> Self {
        match err {
            ModelError::InvalidConnectionConfig(msg) => Self::InvalidConnectionConfig(msg),
            other => Self::InvalidConnectionConfig(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejected_display_and_status() {
        let err = SearchCoreError::rejected("index", 400, "mapper_parsing_exception");
        assert_eq!(
            err.to_string(),
            "index rejected with status 400: mapper_parsing_exception"
        );
        assert_eq!(err.status(), Some(400));
        assert_eq!(SearchCoreError::connection("refused").status(), None);
    }

    #[test]
    fn test_from_model_error() {
        let err: SearchCoreError = ModelError::invalid_connection_config("host is required").into();
        assert_eq!(
            err,
            SearchCoreError::InvalidConnectionConfig("host is required".to_string())
        );
    }
}
