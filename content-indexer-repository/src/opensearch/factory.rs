use std::sync::Arc;

use content_indexer_shared::ConnectionConfig;

use crate::connection::CoreConnection;
use crate::errors::SearchCoreError;
use crate::interfaces::ConnectionFactory;
use crate::opensearch::OpenSearchCore;

/// Builds OpenSearch-backed connections for the registry.
#[derive(Debug, Default, Clone, Copy)]
pub struct OpenSearchConnectionFactory;

impl OpenSearchConnectionFactory {
    pub fn new() -> Self {
        Self
    }
}

impl ConnectionFactory for OpenSearchConnectionFactory {
    fn create(&self, config: &ConnectionConfig) -> Result<CoreConnection, SearchCoreError> {
        let core = Arc::new(OpenSearchCore::new(config)?);
        Ok(CoreConnection::from_backend(config.clone(), core))
    }
}
