//! Runtime handle bound to one search core.

use std::fmt;
use std::sync::Arc;

use content_indexer_shared::ConnectionConfig;

use crate::interfaces::{CoreAdmin, CoreReader, CoreWriter};

/// A connection to one search-engine core.
///
/// Connections are owned by the [`ConnectionRegistry`](crate::ConnectionRegistry)
/// and shared as `Arc<CoreConnection>`; they are never created per request.
pub struct CoreConnection {
    config: ConnectionConfig,
    identity_hash: String,
    reader: Arc<dyn CoreReader>,
    writer: Arc<dyn CoreWriter>,
    admin: Arc<dyn CoreAdmin>,
}

impl CoreConnection {
    /// Create a connection from separate capability implementations.
    pub fn new(
        config: ConnectionConfig,
        reader: Arc<dyn CoreReader>,
        writer: Arc<dyn CoreWriter>,
        admin: Arc<dyn CoreAdmin>,
    ) -> Self {
        let config = config.normalized();
        Self {
            identity_hash: config.identity_hash(),
            config,
            reader,
            writer,
            admin,
        }
    }

    /// Create a connection whose three capabilities share one backend.
    pub fn from_backend<B>(config: ConnectionConfig, backend: Arc<B>) -> Self
    where
        B: CoreReader + CoreWriter + CoreAdmin + 'static,
    {
        Self::new(config, backend.clone(), backend.clone(), backend)
    }

    /// The normalized configuration this connection was built from.
    pub fn config(&self) -> &ConnectionConfig {
        &self.config
    }

    pub fn identity_hash(&self) -> &str {
        &self.identity_hash
    }

    pub fn core_name(&self) -> &str {
        &self.config.core
    }

    pub fn read(&self) -> &dyn CoreReader {
        self.reader.as_ref()
    }

    pub fn write(&self) -> &dyn CoreWriter {
        self.writer.as_ref()
    }

    pub fn admin(&self) -> &dyn CoreAdmin {
        self.admin.as_ref()
    }
}

impl fmt::Debug for CoreConnection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CoreConnection")
            .field("url", &self.config.base_url())
            .field("core", &self.config.core)
            .field("identity_hash", &self.identity_hash)
            .finish()
    }
}
