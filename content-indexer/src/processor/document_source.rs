//! Per-type sources of records and field mappings.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use content_indexer_shared::types::record::ALL_LANGUAGES;
use content_indexer_shared::{FallbackType, FieldMappingSpec, Item, Record, Site};
use tracing::debug;

use crate::errors::IndexerError;
use crate::interfaces::{ConfigurationTree, ContentRepository};
use crate::language::LanguagePlan;

/// Supplies what the indexer needs to build documents for one item type.
#[async_trait]
pub trait DocumentSource: Send + Sync {
    /// Record view of an item for one language plan.
    ///
    /// `Ok(None)` means the item has no content for that language; the
    /// language is then skipped, which is not an error.
    async fn to_record(
        &self,
        item: &Item,
        site: &Site,
        plan: &LanguagePlan,
    ) -> Result<Option<Record>, IndexerError>;

    /// Field mapping applied to the item's records.
    async fn field_spec(&self, item: &Item) -> Result<FieldMappingSpec, IndexerError>;
}

/// Default source: records from the content repository, overlaid per language,
/// mapped by the item's indexing configuration.
pub struct RecordDocumentSource {
    repository: Arc<dyn ContentRepository>,
    configuration: Arc<dyn ConfigurationTree>,
}

impl RecordDocumentSource {
    pub fn new(
        repository: Arc<dyn ContentRepository>,
        configuration: Arc<dyn ConfigurationTree>,
    ) -> Self {
        Self {
            repository,
            configuration,
        }
    }
}

#[async_trait]
impl DocumentSource for RecordDocumentSource {
    async fn to_record(
        &self,
        item: &Item,
        site: &Site,
        plan: &LanguagePlan,
    ) -> Result<Option<Record>, IndexerError> {
        let base = match &item.record {
            Some(record) => record.clone(),
            None => match self
                .repository
                .record(&item.item_type, item.record_uid)
                .await?
            {
                Some(record) => record,
                None => {
                    debug!(item_type = %item.item_type, uid = item.record_uid, "Record is gone");
                    return Ok(None);
                }
            },
        };

        let record = if plan.content == site.default_language {
            base
        } else {
            let overlay = self
                .repository
                .record_overlay(&item.item_type, item.record_uid, plan.content)
                .await?;
            match overlay {
                Some(overlay) => base.overlaid_with(&overlay),
                None => {
                    let fallback_type = site
                        .language(plan.target)
                        .map(|l| l.fallback_type)
                        .unwrap_or_default();
                    if fallback_type == FallbackType::Strict {
                        debug!(language = plan.target, "No record overlay in strict language");
                        return Ok(None);
                    }
                    base
                }
            }
        };

        // A record pinned to another translation never belongs to this
        // document. Independent languages also refuse default-language records.
        match record.language() {
            Some(language) if language != ALL_LANGUAGES && language != i64::from(plan.content) => {
                let foreign_translation = language > 0 && language != i64::from(plan.target);
                if foreign_translation || site.is_independent(plan.target) {
                    debug!(
                        record_language = language,
                        target = plan.target,
                        content = plan.content,
                        "Record language does not match"
                    );
                    Ok(None)
                } else {
                    Ok(Some(record))
                }
            }
            _ => Ok(Some(record)),
        }
    }

    async fn field_spec(&self, item: &Item) -> Result<FieldMappingSpec, IndexerError> {
        self.configuration
            .field_mapping(item.root_id, item.indexing_configuration_name())
            .await
    }
}

/// Selects the [`DocumentSource`] for an item type.
pub struct DocumentSourceRegistry {
    sources: HashMap<String, Arc<dyn DocumentSource>>,
    default_source: Arc<dyn DocumentSource>,
}

impl DocumentSourceRegistry {
    /// Creates a registry answering every type with `default_source` until
    /// specific sources are registered.
    pub fn new(default_source: Arc<dyn DocumentSource>) -> Self {
        Self {
            sources: HashMap::new(),
            default_source,
        }
    }

    /// Registers a source for one item type.
    pub fn register_source(&mut self, item_type: impl Into<String>, source: Arc<dyn DocumentSource>) {
        self.sources.insert(item_type.into(), source);
    }

    pub fn source_for(&self, item_type: &str) -> Arc<dyn DocumentSource> {
        self.sources
            .get(item_type)
            .cloned()
            .unwrap_or_else(|| Arc::clone(&self.default_source))
    }
}
