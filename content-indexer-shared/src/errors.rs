//! Error types for the shared data model.

use thiserror::Error;

/// Errors raised while validating or loading model configuration.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ModelError {
    /// A connection configuration is malformed or incomplete.
    #[error("Invalid connection config: {0}")]
    InvalidConnectionConfig(String),

    /// A field mapping tried to write a protected document field.
    #[error("Must not overwrite protected field '{0}'")]
    InvalidFieldName(String),

    /// A field mapping definition could not be understood.
    #[error("Invalid field mapping: {0}")]
    InvalidFieldMapping(String),
}

impl ModelError {
    /// Create an invalid connection config error.
    pub fn invalid_connection_config(msg: impl Into<String>) -> Self {
        Self::InvalidConnectionConfig(msg.into())
    }

    /// Create an invalid field mapping error.
    pub fn invalid_field_mapping(msg: impl Into<String>) -> Self {
        Self::InvalidFieldMapping(msg.into())
    }
}
