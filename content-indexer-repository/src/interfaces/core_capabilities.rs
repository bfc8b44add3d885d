//! Capability traits of a search core connection.
//!
//! Implementations must be safe for concurrent use: the registry hands the
//! same connection to every worker that resolves the same configuration.

use async_trait::async_trait;
use content_indexer_shared::Document;
use serde_json::Value;

use crate::errors::SearchCoreError;
use crate::types::{CoreInfo, DeleteQuery, WriteSummary};

/// Read endpoint of a core.
#[async_trait]
pub trait CoreReader: Send + Sync {
    /// Check whether the engine answers.
    ///
    /// # Returns
    ///
    /// * `Ok(true)` - The engine answered with a success status
    /// * `Ok(false)` - The engine answered with an error status
    /// * `Err(SearchCoreError)` - The engine could not be reached
    async fn ping(&self) -> Result<bool, SearchCoreError>;

    /// Number of documents currently held by the core.
    async fn document_count(&self) -> Result<u64, SearchCoreError>;
}

/// Write endpoint of a core.
#[async_trait]
pub trait CoreWriter: Send + Sync {
    /// Submit documents, replacing any document with the same id.
    ///
    /// Documents are submitted in order and submission stops at the first
    /// rejection, which is returned as [`SearchCoreError::Rejected`] carrying
    /// the engine's status and message.
    async fn add_documents(&self, documents: &[Document]) -> Result<WriteSummary, SearchCoreError>;

    /// Delete every document matching the query, returning how many went away.
    async fn delete_by_query(&self, query: &DeleteQuery) -> Result<u64, SearchCoreError>;
}

/// Admin endpoint of a core.
#[async_trait]
pub trait CoreAdmin: Send + Sync {
    /// Engine version and cluster metadata.
    async fn info(&self) -> Result<CoreInfo, SearchCoreError>;

    /// Field schema of the core as reported by the engine.
    async fn schema(&self) -> Result<Value, SearchCoreError>;

    /// Make recent writes visible to readers.
    async fn reload(&self) -> Result<(), SearchCoreError>;

    /// Whether the core exists on the engine.
    async fn core_exists(&self) -> Result<bool, SearchCoreError>;
}
