//! Error types for the content indexer.

use content_indexer_repository::SearchCoreError;
use content_indexer_shared::{LanguageId, ModelError};
use thiserror::Error;

/// Errors that can occur while resolving, building or submitting documents.
///
/// "This language does not apply" is not an error: the resolver and the
/// indexer express it with [`ConnectionLookup::Skipped`](crate::language::ConnectionLookup)
/// and [`LanguageOutcome::Skipped`](crate::orchestrator::LanguageOutcome).
#[derive(Error, Debug, Clone, PartialEq)]
pub enum IndexerError {
    /// Malformed or incomplete connection configuration.
    #[error("Invalid connection config: {0}")]
    InvalidConnectionConfig(String),

    /// No connection configuration exists for a (root, language) pair.
    #[error("No connection found for root {root_id} and language {language}")]
    NoConnectionFound { root_id: u64, language: LanguageId },

    /// A site could not be resolved.
    #[error("Failed to initialize site {root_id}: {reason}")]
    SiteInitialization { root_id: u64, reason: String },

    /// Hiding the default translation leaves the site without a language.
    #[error("Site {root_id} hides its default translation but configures no other language")]
    NoUsableLanguage { root_id: u64 },

    /// The search engine rejected a submission.
    #[error("Indexing failed with status {status}: {message}")]
    Indexing { status: u16, message: String },

    /// A field mapping tried to set a protected document field.
    #[error("Must not overwrite field '{0}'")]
    InvalidFieldName(String),

    /// A field mapping definition could not be understood.
    #[error("Invalid field mapping: {0}")]
    InvalidFieldMapping(String),

    /// The search engine could not be reached or answered garbage.
    #[error("Search core error: {0}")]
    Engine(SearchCoreError),

    /// An external collaborator (repository, configuration, queue, renderer) failed.
    #[error("Collaborator error: {0}")]
    Collaborator(String),
}

impl IndexerError {
    /// Create a site initialization error.
    pub fn site_initialization(root_id: u64, reason: impl Into<String>) -> Self {
        Self::SiteInitialization {
            root_id,
            reason: reason.into(),
        }
    }

    /// Create an indexing error from an engine status and message.
    pub fn indexing(status: u16, message: impl Into<String>) -> Self {
        Self::Indexing {
            status,
            message: message.into(),
        }
    }

    /// Create a collaborator error.
    pub fn collaborator(msg: impl Into<String>) -> Self {
        Self::Collaborator(msg.into())
    }
}

impl From<SearchCoreError> for IndexerError {
    fn from(err: SearchCoreError) -> Self {
        match err {
            SearchCoreError::InvalidConnectionConfig(msg) => Self::InvalidConnectionConfig(msg),
            SearchCoreError::Rejected {
                status, message, ..
            } => Self::Indexing { status, message },
            other => Self::Engine(other),
        }
    }
}

impl From<ModelError> for IndexerError {
    fn from(err: ModelError) -> Self {
        match err {
            ModelError::InvalidConnectionConfig(msg) => Self::InvalidConnectionConfig(msg),
            ModelError::InvalidFieldName(name) => Self::InvalidFieldName(name),
            ModelError::InvalidFieldMapping(msg) => Self::InvalidFieldMapping(msg),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejection_becomes_indexing_error() {
        let err: IndexerError =
            SearchCoreError::rejected("index", 400, "unknown field 'foo'").into();
        assert_eq!(err, IndexerError::indexing(400, "unknown field 'foo'"));
        assert_eq!(
            err.to_string(),
            "Indexing failed with status 400: unknown field 'foo'"
        );
    }

    #[test]
    fn test_transport_error_is_engine_error() {
        let err: IndexerError = SearchCoreError::connection("connection refused").into();
        assert!(matches!(err, IndexerError::Engine(_)));
    }

    #[test]
    fn test_model_errors_keep_their_kind() {
        let err: IndexerError = ModelError::InvalidFieldName("type".to_string()).into();
        assert_eq!(err, IndexerError::InvalidFieldName("type".to_string()));

        let err: IndexerError = ModelError::invalid_connection_config("host is required").into();
        assert!(matches!(err, IndexerError::InvalidConnectionConfig(_)));
    }
}
