use async_trait::async_trait;
use content_indexer_shared::{FieldMappingSpec, LanguageId, SiteLanguage, DEFAULT_LANGUAGE};

use crate::errors::IndexerError;

/// Site-level configuration as declared in the configuration tree.
#[derive(Debug, Clone, PartialEq)]
pub struct SiteConfiguration {
    pub identifier: String,
    pub default_language: LanguageId,
    /// Every configured language, each with its fallback rules and optional
    /// connection configuration.
    pub languages: Vec<SiteLanguage>,
}

impl SiteConfiguration {
    pub fn new(identifier: impl Into<String>, languages: Vec<SiteLanguage>) -> Self {
        Self {
            identifier: identifier.into(),
            default_language: DEFAULT_LANGUAGE,
            languages,
        }
    }
}

/// Parsed configuration tree of the host platform.
#[async_trait]
pub trait ConfigurationTree: Send + Sync {
    /// Languages and connections configured for a site root.
    ///
    /// Returns `Ok(None)` when the root has no site configuration at all.
    async fn site_configuration(
        &self,
        root_id: u64,
    ) -> Result<Option<SiteConfiguration>, IndexerError>;

    /// Field mapping of an indexing configuration within a site.
    ///
    /// A missing mapping is an empty spec: documents then carry only the base
    /// fields.
    async fn field_mapping(
        &self,
        root_id: u64,
        indexing_configuration: &str,
    ) -> Result<FieldMappingSpec, IndexerError>;
}
