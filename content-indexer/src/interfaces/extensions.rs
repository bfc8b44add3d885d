use async_trait::async_trait;
use content_indexer_shared::{Document, Item, LanguageId};

use crate::errors::IndexerError;

/// Contributes supplementary documents for an item.
///
/// Supplementary documents are appended after the base document; they are
/// never merged into it.
#[async_trait]
pub trait DocumentContributor: Send + Sync {
    async fn documents(
        &self,
        item: &Item,
        language: LanguageId,
        base: &Document,
    ) -> Result<Vec<Document>, IndexerError>;
}

/// Rewrites the complete document list of an item before submission.
#[async_trait]
pub trait DocumentsModifier: Send + Sync {
    async fn modify(
        &self,
        item: &Item,
        language: LanguageId,
        documents: Vec<Document>,
    ) -> Result<Vec<Document>, IndexerError>;
}
