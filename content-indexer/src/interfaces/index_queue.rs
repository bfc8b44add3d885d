use async_trait::async_trait;
use content_indexer_shared::Item;

use crate::errors::IndexerError;

/// External queue supplying items and persisting per-item verdicts.
///
/// Retry scheduling belongs to the queue; the indexer makes exactly one
/// attempt per item per call.
#[async_trait]
pub trait IndexQueue: Send + Sync {
    /// Up to `limit` items waiting to be indexed, oldest change first.
    async fn pending_items(&self, limit: usize) -> Result<Vec<Item>, IndexerError>;

    /// Persist a successful attempt. The item carries its indexing timestamp.
    async fn mark_indexed(&self, item: &Item) -> Result<(), IndexerError>;

    /// Persist a failed attempt. The item carries the error text and timestamp.
    async fn mark_failed(&self, item: &Item) -> Result<(), IndexerError>;
}
