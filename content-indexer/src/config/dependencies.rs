//! Dependency initialization and wiring for the content indexer.

use std::env;
use std::path::PathBuf;
use std::sync::Arc;

use content_indexer_repository::{ConnectionFactory, ConnectionRegistry, OpenSearchConnectionFactory};
use tracing::{info, warn};

use crate::interfaces::{ConfigurationTree, ContentRepository, IndexQueue};
use crate::language::LanguageFallbackResolver;
use crate::loader::DocumentLoader;
use crate::orchestrator::Indexer;
use crate::processor::{DocumentBuilder, DocumentSourceRegistry, FieldResolver, RecordDocumentSource};
use crate::site::{SiteDirectory, SiteResolutionMode};
use crate::snapshot::{ContentSnapshot, SnapshotRenderer};
use crate::ServiceError;

/// Default number of queue items indexed per run.
const DEFAULT_INDEX_BATCH_SIZE: usize = 50;

/// Settings read from the environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    /// Content snapshot to index.
    pub snapshot_path: PathBuf,
    pub resolution_mode: SiteResolutionMode,
    /// Queue items indexed per run.
    pub batch_size: usize,
}

impl Settings {
    pub fn new(snapshot_path: impl Into<PathBuf>) -> Self {
        Self {
            snapshot_path: snapshot_path.into(),
            resolution_mode: SiteResolutionMode::default(),
            batch_size: DEFAULT_INDEX_BATCH_SIZE,
        }
    }

    /// Read settings from environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `CONTENT_SNAPSHOT_PATH`: JSON content snapshot to index (required)
    /// - `SITE_RESOLUTION_MODE`: "strict" or "lenient" (default: lenient)
    /// - `INDEX_BATCH_SIZE`: Queue items indexed per run (default: 50)
    pub fn from_env() -> Result<Self, ServiceError> {
        let snapshot_path = env::var("CONTENT_SNAPSHOT_PATH")
            .map_err(|_| ServiceError::config("CONTENT_SNAPSHOT_PATH must be set"))?;

        let resolution_mode = match env::var("SITE_RESOLUTION_MODE") {
            Ok(name) => SiteResolutionMode::from_name(&name).unwrap_or_else(|| {
                warn!(mode = %name, "Invalid SITE_RESOLUTION_MODE, defaulting to 'lenient'");
                SiteResolutionMode::Lenient
            }),
            Err(_) => SiteResolutionMode::default(),
        };

        let batch_size = env::var("INDEX_BATCH_SIZE")
            .ok()
            .and_then(|s| s.parse::<usize>().ok())
            .filter(|size| *size > 0)
            .unwrap_or(DEFAULT_INDEX_BATCH_SIZE);

        Ok(Self {
            snapshot_path: PathBuf::from(snapshot_path),
            resolution_mode,
            batch_size,
        })
    }
}

/// Container for all initialized dependencies.
pub struct Dependencies {
    /// The configured indexer ready to process the queue.
    pub indexer: Indexer,
    /// Connections shared by every site and language.
    pub registry: Arc<ConnectionRegistry>,
    pub snapshot: Arc<ContentSnapshot>,
    pub settings: Settings,
}

impl Dependencies {
    /// Initialize all dependencies from environment variables, indexing into
    /// OpenSearch.
    ///
    /// # Returns
    ///
    /// * `Ok(Dependencies)` - Initialized dependencies
    /// * `Err(ServiceError)` - If the settings or the snapshot are invalid
    pub fn new() -> Result<Self, ServiceError> {
        let settings = Settings::from_env()?;

        info!(
            snapshot_path = %settings.snapshot_path.display(),
            resolution_mode = ?settings.resolution_mode,
            batch_size = settings.batch_size,
            "Initializing dependencies"
        );

        let snapshot = Arc::new(ContentSnapshot::from_path(&settings.snapshot_path)?);
        Self::from_snapshot(snapshot, Arc::new(OpenSearchConnectionFactory::new()), settings)
    }

    /// Wire the indexer around a loaded snapshot and a connection factory.
    pub fn from_snapshot(
        snapshot: Arc<ContentSnapshot>,
        factory: Arc<dyn ConnectionFactory>,
        settings: Settings,
    ) -> Result<Self, ServiceError> {
        let repository: Arc<dyn ContentRepository> = snapshot.clone();
        let configuration: Arc<dyn ConfigurationTree> = snapshot.clone();
        let queue: Arc<dyn IndexQueue> = snapshot.clone();

        let registry = Arc::new(ConnectionRegistry::new(factory));
        let sites = Arc::new(
            SiteDirectory::new(repository.clone(), configuration.clone())
                .with_mode(settings.resolution_mode),
        );
        let resolver = LanguageFallbackResolver::new(repository.clone(), registry.clone());
        let sources = DocumentSourceRegistry::new(Arc::new(RecordDocumentSource::new(
            repository,
            configuration,
        )));
        let renderer = Arc::new(SnapshotRenderer::new(snapshot.clone())?);
        let builder = DocumentBuilder::new(FieldResolver::new(renderer));

        let indexer = Indexer::new(sites, resolver, sources, builder, DocumentLoader::new(), queue);

        Ok(Self {
            indexer,
            registry,
            snapshot,
            settings,
        })
    }

    /// Open the connections of every available site and ping them.
    ///
    /// Returns the cores that did not answer. Malformed connection
    /// configurations are logged and left out.
    pub async fn check_connections(&self) -> Result<Vec<String>, ServiceError> {
        let sites = self.indexer.sites().available_sites().await?;
        for site in &sites {
            for language in site.languages() {
                let Some(config) = &language.connection else {
                    continue;
                };
                if let Err(e) = self.registry.get(config) {
                    warn!(
                        root_id = site.root_id,
                        language = language.id,
                        error = %e,
                        "Invalid connection configuration"
                    );
                }
            }
        }

        let unreachable: Vec<String> = self
            .registry
            .ping_all()
            .await
            .into_iter()
            .filter(|(_, reachable)| !reachable)
            .map(|(core, _)| core)
            .collect();

        for connection in self.registry.connections() {
            if unreachable.iter().any(|core| core == connection.core_name()) {
                continue;
            }
            match connection.admin().info().await {
                Ok(core_info) => info!(
                    core = %connection.core_name(),
                    engine_version = ?core_info.engine_version,
                    cluster_name = ?core_info.cluster_name,
                    "Search core ready"
                ),
                Err(e) => warn!(core = %connection.core_name(), error = %e, "Failed to read core info"),
            }
        }

        info!(
            sites = sites.len(),
            connections = self.registry.len(),
            unreachable = unreachable.len(),
            "Checked search core connections"
        );
        Ok(unreachable)
    }
}
