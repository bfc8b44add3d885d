//! Factory trait used by the registry to build connections.

use content_indexer_shared::ConnectionConfig;

use crate::connection::CoreConnection;
use crate::errors::SearchCoreError;

/// Builds a [`CoreConnection`] for a validated, normalized configuration.
///
/// Implementations must not perform network I/O: connections connect lazily
/// on first use.
pub trait ConnectionFactory: Send + Sync {
    fn create(&self, config: &ConnectionConfig) -> Result<CoreConnection, SearchCoreError>;
}
