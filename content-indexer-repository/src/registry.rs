//! Process-wide registry of search core connections.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use content_indexer_shared::ConnectionConfig;
use tracing::{debug, warn};

use crate::connection::CoreConnection;
use crate::errors::SearchCoreError;
use crate::interfaces::ConnectionFactory;

/// Resolves and memoizes connections by configuration identity.
///
/// Two configurations with the same [`ConnectionConfig::identity_hash`] always
/// resolve to the same `Arc<CoreConnection>` for the lifetime of the registry,
/// so admin operations see a single authoritative handle per core. The
/// registry is injected where needed; there is no global instance.
pub struct ConnectionRegistry {
    factory: Arc<dyn ConnectionFactory>,
    connections: RwLock<HashMap<String, Arc<CoreConnection>>>,
}

impl ConnectionRegistry {
    /// Create an empty registry building connections with `factory`.
    pub fn new(factory: Arc<dyn ConnectionFactory>) -> Self {
        Self {
            factory,
            connections: RwLock::new(HashMap::new()),
        }
    }

    /// Get the connection for a configuration, creating it on first use.
    ///
    /// # Returns
    ///
    /// * `Ok(Arc<CoreConnection>)` - The cached or newly built connection
    /// * `Err(SearchCoreError::InvalidConnectionConfig)` - If the configuration
    ///   is malformed; nothing is cached in that case
    pub fn get(&self, config: &ConnectionConfig) -> Result<Arc<CoreConnection>, SearchCoreError> {
        config.validate()?;
        let hash = config.identity_hash();

        if let Some(existing) = self
            .connections
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&hash)
        {
            return Ok(Arc::clone(existing));
        }

        let mut connections = self
            .connections
            .write()
            .unwrap_or_else(PoisonError::into_inner);

        // Another worker may have won the race between the two locks.
        if let Some(existing) = connections.get(&hash) {
            return Ok(Arc::clone(existing));
        }

        let connection = Arc::new(self.factory.create(&config.normalized())?);
        debug!(
            url = %config.base_url(),
            core = %connection.core_name(),
            identity_hash = %hash,
            "Registered search core connection"
        );
        connections.insert(hash, Arc::clone(&connection));
        Ok(connection)
    }

    /// Whether a connection for this configuration has been built.
    pub fn contains(&self, config: &ConnectionConfig) -> bool {
        self.connections
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(&config.identity_hash())
    }

    /// Snapshot of all live connections, ordered by core name.
    pub fn connections(&self) -> Vec<Arc<CoreConnection>> {
        let mut all: Vec<_> = self
            .connections
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .cloned()
            .collect();
        all.sort_by(|a, b| a.core_name().cmp(b.core_name()));
        all
    }

    pub fn len(&self) -> usize {
        self.connections
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Ping every live connection.
    ///
    /// Returns `(core name, reachable)` pairs; transport errors count as
    /// unreachable and are logged.
    pub async fn ping_all(&self) -> Vec<(String, bool)> {
        let mut results = Vec::new();
        for connection in self.connections() {
            let reachable = match connection.read().ping().await {
                Ok(reachable) => reachable,
                Err(e) => {
                    warn!(core = %connection.core_name(), error = %e, "Ping failed");
                    false
                }
            };
            results.push((connection.core_name().to_string(), reachable));
        }
        results
    }
}
