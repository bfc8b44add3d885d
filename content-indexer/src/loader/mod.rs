//! Loader module for the content indexer.
//!
//! Submits built documents to a search core and removes documents of deleted
//! records.

use content_indexer_repository::{CoreConnection, DeleteQuery, WriteSummary};
use content_indexer_shared::Document;
use tracing::{debug, error, instrument};

use crate::errors::IndexerError;

/// Configuration for the document loader.
#[derive(Debug, Clone)]
pub struct LoaderConfig {
    /// Number of documents sent per request.
    pub batch_size: usize,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self { batch_size: 100 }
    }
}

/// Writes documents to the core of a resolved connection.
#[derive(Debug, Clone, Default)]
pub struct DocumentLoader {
    config: LoaderConfig,
}

impl DocumentLoader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a loader with a custom configuration.
    ///
    /// A batch size of zero is treated as one.
    pub fn with_config(config: LoaderConfig) -> Self {
        Self {
            config: LoaderConfig {
                batch_size: config.batch_size.max(1),
            },
        }
    }

    pub fn batch_size(&self) -> usize {
        self.config.batch_size
    }

    /// Submit documents to a core in batches.
    ///
    /// Stops at the first rejected batch. Documents accepted before the
    /// rejection stay in the core; the whole submission still counts as
    /// failed.
    ///
    /// # Returns
    ///
    /// * `Ok(WriteSummary)` - Every document was accepted
    /// * `Err(IndexerError::Indexing)` - The engine rejected a batch
    /// * `Err(IndexerError::Engine)` - The engine could not be reached
    #[instrument(skip(self, connection, documents), fields(core = %connection.core_name(), count = documents.len()))]
    pub async fn submit(
        &self,
        connection: &CoreConnection,
        documents: &[Document],
    ) -> Result<WriteSummary, IndexerError> {
        let mut summary = WriteSummary::default();

        for batch in documents.chunks(self.config.batch_size) {
            match connection.write().add_documents(batch).await {
                Ok(written) => {
                    summary.accepted += written.accepted;
                    summary.document_ids.extend(written.document_ids);
                }
                Err(e) => {
                    error!(
                        error = %e,
                        accepted = summary.accepted,
                        batch = batch.len(),
                        "Failed to submit documents"
                    );
                    return Err(e.into());
                }
            }
        }

        debug!(accepted = summary.accepted, "Documents submitted");
        Ok(summary)
    }

    /// Delete the documents matched by `query` from a core.
    #[instrument(skip(self, connection), fields(core = %connection.core_name()))]
    pub async fn remove(
        &self,
        connection: &CoreConnection,
        query: &DeleteQuery,
    ) -> Result<u64, IndexerError> {
        let deleted = connection.write().delete_by_query(query).await?;
        debug!(deleted, "Documents removed");
        Ok(deleted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use content_indexer_repository::{
        CoreAdmin, CoreInfo, CoreReader, CoreWriter, SearchCoreError,
    };
    use content_indexer_shared::ConnectionConfig;
    use serde_json::Value;
    use std::sync::{Arc, Mutex};

    /// Mock core recording every batch and rejecting documents with a marker id.
    struct MockCore {
        batches: Mutex<Vec<Vec<String>>>,
        deletes: Mutex<Vec<DeleteQuery>>,
    }

    impl MockCore {
        fn new() -> Self {
            Self {
                batches: Mutex::new(Vec::new()),
                deletes: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl CoreReader for MockCore {
        async fn ping(&self) -> Result<bool, SearchCoreError> {
            Ok(true)
        }

        async fn document_count(&self) -> Result<u64, SearchCoreError> {
            Ok(0)
        }
    }

    #[async_trait]
    impl CoreWriter for MockCore {
        async fn add_documents(
            &self,
            documents: &[Document],
        ) -> Result<WriteSummary, SearchCoreError> {
            let ids: Vec<String> = documents
                .iter()
                .map(|d| d.id().unwrap_or_default().to_string())
                .collect();
            self.batches.lock().unwrap().push(ids.clone());

            if ids.iter().any(|id| id == "bad") {
                return Err(SearchCoreError::rejected("index", 400, "unknown field 'foo'"));
            }
            Ok(WriteSummary {
                accepted: ids.len(),
                document_ids: ids,
            })
        }

        async fn delete_by_query(&self, query: &DeleteQuery) -> Result<u64, SearchCoreError> {
            self.deletes.lock().unwrap().push(query.clone());
            Ok(2)
        }
    }

    #[async_trait]
    impl CoreAdmin for MockCore {
        async fn info(&self) -> Result<CoreInfo, SearchCoreError> {
            Ok(CoreInfo::default())
        }

        async fn schema(&self) -> Result<Value, SearchCoreError> {
            Ok(Value::Null)
        }

        async fn reload(&self) -> Result<(), SearchCoreError> {
            Ok(())
        }

        async fn core_exists(&self) -> Result<bool, SearchCoreError> {
            Ok(true)
        }
    }

    fn document(id: &str) -> Document {
        let mut document = Document::new();
        document.set_field("id", id);
        document
    }

    fn connection(core: Arc<MockCore>) -> CoreConnection {
        CoreConnection::from_backend(ConnectionConfig::new("localhost", 9200, "core_en"), core)
    }

    #[tokio::test]
    async fn test_submit_in_batches() {
        let core = Arc::new(MockCore::new());
        let connection = connection(core.clone());
        let loader = DocumentLoader::with_config(LoaderConfig { batch_size: 2 });

        let documents: Vec<_> = ["a", "b", "c"].iter().map(|id| document(id)).collect();
        let summary = loader.submit(&connection, &documents).await.unwrap();

        assert_eq!(summary.accepted, 3);
        assert_eq!(summary.document_ids, vec!["a", "b", "c"]);
        assert_eq!(
            *core.batches.lock().unwrap(),
            vec![vec!["a".to_string(), "b".to_string()], vec!["c".to_string()]]
        );
    }

    #[tokio::test]
    async fn test_rejection_stops_submission() {
        let core = Arc::new(MockCore::new());
        let connection = connection(core.clone());
        let loader = DocumentLoader::with_config(LoaderConfig { batch_size: 1 });

        let documents = vec![document("a"), document("bad"), document("c")];
        let result = loader.submit(&connection, &documents).await;

        assert_eq!(
            result,
            Err(IndexerError::indexing(400, "unknown field 'foo'"))
        );
        assert_eq!(core.batches.lock().unwrap().len(), 2);
    }

    #[test]
    fn test_zero_batch_size_is_clamped() {
        let loader = DocumentLoader::with_config(LoaderConfig { batch_size: 0 });
        assert_eq!(loader.batch_size(), 1);
    }

    #[tokio::test]
    async fn test_remove_forwards_query() {
        let core = Arc::new(MockCore::new());
        let connection = connection(core.clone());
        let query = DeleteQuery::for_record("hash", "pages", 3);

        let deleted = DocumentLoader::new().remove(&connection, &query).await.unwrap();

        assert_eq!(deleted, 2);
        assert_eq!(*core.deletes.lock().unwrap(), vec![query]);
    }
}
