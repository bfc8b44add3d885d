use async_trait::async_trait;
use content_indexer_shared::{FieldMapping, LanguageId, Record};

use crate::errors::IndexerError;

/// What a renderer knows about the document being built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderContext {
    pub root_id: u64,
    pub item_type: String,
    pub record_uid: u64,
    /// Language the document is built for.
    pub language: LanguageId,
    /// Language whose content fills the document. Differs from `language`
    /// for fallback documents.
    pub content_language: LanguageId,
}

/// Host platform renderer evaluating computed and relation field values.
#[async_trait]
pub trait ContentRenderer: Send + Sync {
    /// Render the value of a computed or relation mapping against a record.
    ///
    /// List-producing kinds return their items as a serialized JSON array.
    /// `Ok(None)` means the mapping yields nothing for this record.
    async fn render(
        &self,
        mapping: &FieldMapping,
        record: &Record,
        context: &RenderContext,
    ) -> Result<Option<String>, IndexerError>;
}

/// Decides whether a rendered value is a serialized list.
///
/// Registered for computed kinds the indexer does not know to produce lists.
pub trait SerializedValueDetector: Send + Sync {
    fn is_serialized(&self, mapping: &FieldMapping, rendered: &str) -> bool;
}
