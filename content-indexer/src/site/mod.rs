//! Site directory: enumerates sites and caches them per resolution cycle.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, PoisonError, RwLock};

use content_indexer_shared::{Record, Site};
use tracing::{debug, instrument, warn};

use crate::errors::IndexerError;
use crate::interfaces::{ConfigurationTree, ContentRepository};

/// Root record field holding the localization flags.
pub const LOCALIZATION_FIELD: &str = "l18n_cfg";

/// Flag bit asking to hide the default translation.
const HIDE_DEFAULT_TRANSLATION: i64 = 1;

/// How site enumeration treats sites that fail to resolve.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SiteResolutionMode {
    /// Skip failing sites with a warning.
    #[default]
    Lenient,
    /// Fail the whole enumeration on the first failing site.
    Strict,
}

impl SiteResolutionMode {
    /// Parse a mode name; unknown names yield `None`.
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_lowercase().as_str() {
            "strict" => Some(Self::Strict),
            "lenient" => Some(Self::Lenient),
            _ => None,
        }
    }
}

/// Whether a root record asks to hide the default translation.
pub fn hides_default_translation(root_record: &Record) -> bool {
    root_record
        .get_i64(LOCALIZATION_FIELD)
        .is_some_and(|flags| flags & HIDE_DEFAULT_TRANSLATION != 0)
}

/// Resolves sites from the content repository and the configuration tree.
///
/// Resolved sites are cached by root id until [`begin_cycle`](Self::begin_cycle)
/// starts a new resolution cycle.
pub struct SiteDirectory {
    repository: Arc<dyn ContentRepository>,
    configuration: Arc<dyn ConfigurationTree>,
    mode: SiteResolutionMode,
    cache: RwLock<HashMap<u64, Arc<Site>>>,
}

impl SiteDirectory {
    pub fn new(
        repository: Arc<dyn ContentRepository>,
        configuration: Arc<dyn ConfigurationTree>,
    ) -> Self {
        Self {
            repository,
            configuration,
            mode: SiteResolutionMode::default(),
            cache: RwLock::new(HashMap::new()),
        }
    }

    pub fn with_mode(mut self, mode: SiteResolutionMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn mode(&self) -> SiteResolutionMode {
        self.mode
    }

    /// Drop every cached site.
    pub fn begin_cycle(&self) {
        self.cache
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
        debug!("Started new site resolution cycle");
    }

    /// All sites with at least one enabled connection, ordered by root id.
    ///
    /// # Returns
    ///
    /// * `Ok(Vec<Arc<Site>>)` - The enabled sites
    /// * `Err(IndexerError::SiteInitialization)` - A site failed to resolve in
    ///   strict mode
    #[instrument(skip(self), fields(mode = ?self.mode))]
    pub async fn available_sites(&self) -> Result<Vec<Arc<Site>>, IndexerError> {
        let mut roots = self.repository.site_roots().await?;
        roots.sort_unstable();
        roots.dedup();

        let mut sites = Vec::with_capacity(roots.len());
        for root_id in roots {
            match self.site_for_root(root_id).await {
                Ok(Some(site)) if site.is_enabled() => sites.push(site),
                Ok(Some(_)) => {
                    debug!(root_id, "Site has no enabled connection, skipping");
                }
                Ok(None) => {
                    debug!(root_id, "Root has no site configuration, skipping");
                }
                Err(e) => match self.mode {
                    SiteResolutionMode::Strict => {
                        return Err(match e {
                            IndexerError::SiteInitialization { .. } => e,
                            other => IndexerError::site_initialization(root_id, other.to_string()),
                        });
                    }
                    SiteResolutionMode::Lenient => {
                        warn!(root_id, error = %e, "Failed to resolve site, skipping");
                    }
                },
            }
        }

        Ok(sites)
    }

    /// Site whose root page is `root_id`.
    ///
    /// `Ok(None)` when the page does not exist or has no site configuration.
    pub async fn site_for_root(&self, root_id: u64) -> Result<Option<Arc<Site>>, IndexerError> {
        if let Some(site) = self.cached(root_id) {
            return Ok(Some(site));
        }

        let Some(root_record) = self
            .repository
            .record("pages", root_id)
            .await
            .map_err(|e| IndexerError::site_initialization(root_id, e.to_string()))?
        else {
            return Ok(None);
        };

        let Some(configuration) = self
            .configuration
            .site_configuration(root_id)
            .await
            .map_err(|e| IndexerError::site_initialization(root_id, e.to_string()))?
        else {
            return Ok(None);
        };

        if !configuration
            .languages
            .iter()
            .any(|l| l.id == configuration.default_language)
        {
            return Err(IndexerError::site_initialization(
                root_id,
                format!(
                    "default language {} is not configured",
                    configuration.default_language
                ),
            ));
        }

        let mut site = Site::new(root_id, configuration.identifier, configuration.languages)
            .with_hide_default_translation(hides_default_translation(&root_record));
        site.default_language = configuration.default_language;

        let site = Arc::new(site);
        debug!(
            root_id,
            identifier = %site.identifier,
            languages = ?site.available_language_ids(),
            enabled = site.is_enabled(),
            "Resolved site"
        );

        Ok(Some(
            self.cache
                .write()
                .unwrap_or_else(PoisonError::into_inner)
                .entry(root_id)
                .or_insert(site)
                .clone(),
        ))
    }

    /// Site owning a page, found by walking the page's rootline.
    pub async fn site_for_content_id(
        &self,
        page_id: u64,
    ) -> Result<Option<Arc<Site>>, IndexerError> {
        let rootline = self.repository.rootline(page_id).await?;
        if rootline.is_empty() {
            return Ok(None);
        }

        let roots: HashSet<u64> = self.repository.site_roots().await?.into_iter().collect();
        match rootline.into_iter().find(|id| roots.contains(id)) {
            Some(root_id) => self.site_for_root(root_id).await,
            None => Ok(None),
        }
    }

    fn cached(&self, root_id: u64) -> Option<Arc<Site>> {
        self.cache
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&root_id)
            .cloned()
    }
}
