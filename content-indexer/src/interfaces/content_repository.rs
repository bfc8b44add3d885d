use async_trait::async_trait;
use content_indexer_shared::{LanguageId, Record};

use crate::errors::IndexerError;

/// Read access to the host platform's content.
#[async_trait]
pub trait ContentRepository: Send + Sync {
    /// Raw record of the given type, in its default language.
    ///
    /// # Returns
    ///
    /// * `Ok(Some(Record))` - The record exists
    /// * `Ok(None)` - The record is gone or hidden
    /// * `Err(IndexerError)` - The repository failed
    async fn record(&self, item_type: &str, uid: u64) -> Result<Option<Record>, IndexerError>;

    /// Translation overlay of a record for one language, if one exists.
    async fn record_overlay(
        &self,
        item_type: &str,
        uid: u64,
        language: LanguageId,
    ) -> Result<Option<Record>, IndexerError>;

    /// Languages into which a page has been translated.
    async fn page_translation_languages(&self, page_id: u64) -> Result<Vec<LanguageId>, IndexerError>;

    /// Page ids from `page_id` up to the top of the tree, `page_id` first.
    ///
    /// Unknown pages yield an empty rootline.
    async fn rootline(&self, page_id: u64) -> Result<Vec<u64>, IndexerError>;

    /// Ids of all pages flagged as site roots.
    async fn site_roots(&self) -> Result<Vec<u64>, IndexerError>;
}
