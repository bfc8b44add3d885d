//! OpenSearch core implementation.
//!
//! This module provides the concrete implementation of the core capability
//! traits using the OpenSearch Rust crate. One [`OpenSearchCore`] talks to a
//! single index on a single node.

use std::time::Duration;

use async_trait::async_trait;
use content_indexer_shared::{ConnectionConfig, Credentials, Document};
use opensearch::{
    auth::Credentials as TransportCredentials,
    http::response::Response,
    http::transport::{SingleNodeConnectionPool, TransportBuilder},
    indices::{IndicesExistsParts, IndicesGetMappingParts, IndicesRefreshParts},
    CountParts, DeleteByQueryParts, IndexParts, OpenSearch,
};
use serde_json::{json, Value};
use tracing::{debug, error, info};
use url::Url;

use crate::errors::SearchCoreError;
use crate::interfaces::{CoreAdmin, CoreReader, CoreWriter};
use crate::types::{CoreInfo, DeleteQuery, WriteSummary};
use crate::utils;

/// OpenSearch-backed core.
///
/// # Example
///
/// ```ignore
/// use content_indexer_shared::ConnectionConfig;
/// use content_indexer_repository::{CoreWriter, OpenSearchCore};
///
/// let config = ConnectionConfig::new("localhost", 9200, "site_en");
/// let core = OpenSearchCore::new(&config)?;
/// core.add_documents(&documents).await?;
/// ```
pub struct OpenSearchCore {
    client: OpenSearch,
    core: String,
}

impl OpenSearchCore {
    /// Create a core client for the given configuration.
    ///
    /// No request is sent; the transport connects on first use.
    ///
    /// # Returns
    ///
    /// * `Ok(OpenSearchCore)` - A new client bound to `config.core`
    /// * `Err(SearchCoreError)` - If the configuration or transport is invalid
    pub fn new(config: &ConnectionConfig) -> Result<Self, SearchCoreError> {
        config.validate()?;
        let config = config.normalized();

        let parsed_url = Url::parse(&config.base_url())
            .map_err(|e| SearchCoreError::invalid_connection_config(e.to_string()))?;

        let conn_pool = SingleNodeConnectionPool::new(parsed_url);
        let mut builder = TransportBuilder::new(conn_pool).disable_proxy();
        if let Some(credentials) = &config.credentials {
            builder = builder.auth(Self::transport_credentials(credentials));
        }
        if let Some(timeout_secs) = config.timeout_secs {
            builder = builder.timeout(Duration::from_secs(timeout_secs));
        }
        let transport = builder
            .build()
            .map_err(|e| SearchCoreError::connection(e.to_string()))?;

        info!(
            url = %config.base_url(),
            core = %config.core,
            "Created OpenSearch core client"
        );

        Ok(Self {
            client: OpenSearch::new(transport),
            core: config.core,
        })
    }

    /// Index (core) name this client is bound to.
    pub fn core(&self) -> &str {
        &self.core
    }

    fn transport_credentials(credentials: &Credentials) -> TransportCredentials {
        match credentials {
            Credentials::Basic { username, password } => {
                TransportCredentials::Basic(username.clone(), password.clone())
            }
            Credentials::ApiKey { id, key } => {
                TransportCredentials::ApiKey(id.clone(), key.clone())
            }
        }
    }

    /// Request body deleting everything matched by `query`.
    fn delete_by_query_body(query: &DeleteQuery) -> Value {
        json!({
            "query": {
                "bool": {
                    "filter": query.term_filters()
                }
            }
        })
    }

    /// Turn a non-success response into a rejection carrying the engine's message.
    async fn reject(operation: &str, response: Response) -> SearchCoreError {
        let status = response.status_code().as_u16();
        let body = response.text().await.unwrap_or_default();
        error!(operation, status, body = %body, "Search core rejected request");
        SearchCoreError::rejected(operation, status, utils::extract_error_message(&body))
    }

    async fn json_body(response: Response) -> Result<Value, SearchCoreError> {
        response
            .json::<Value>()
            .await
            .map_err(|e| SearchCoreError::parse(e.to_string()))
    }
}

#[async_trait]
impl CoreReader for OpenSearchCore {
    async fn ping(&self) -> Result<bool, SearchCoreError> {
        let response = self
            .client
            .ping()
            .send()
            .await
            .map_err(|e| SearchCoreError::connection(e.to_string()))?;

        Ok(response.status_code().is_success())
    }

    async fn document_count(&self) -> Result<u64, SearchCoreError> {
        let response = self
            .client
            .count(CountParts::Index(&[self.core.as_str()]))
            .send()
            .await
            .map_err(|e| SearchCoreError::connection(e.to_string()))?;

        if !response.status_code().is_success() {
            return Err(Self::reject("count", response).await);
        }

        let body = Self::json_body(response).await?;
        body.get("count")
            .and_then(Value::as_u64)
            .ok_or_else(|| SearchCoreError::parse("count response has no 'count'"))
    }
}

#[async_trait]
impl CoreWriter for OpenSearchCore {
    /// Index documents one by one under their `id` field.
    ///
    /// Stops at the first rejected document; documents indexed before it stay
    /// in the core.
    async fn add_documents(&self, documents: &[Document]) -> Result<WriteSummary, SearchCoreError> {
        let mut summary = WriteSummary::default();

        for document in documents {
            let doc_id = document
                .id()
                .ok_or_else(|| SearchCoreError::serialization("document has no 'id' field"))?
                .to_string();

            let response = self
                .client
                .index(IndexParts::IndexId(&self.core, &doc_id))
                .body(document.to_json())
                .send()
                .await
                .map_err(|e| SearchCoreError::connection(e.to_string()))?;

            if !response.status_code().is_success() {
                return Err(Self::reject("index", response).await);
            }

            debug!(core = %self.core, doc_id = %doc_id, "Document indexed");
            summary.accepted += 1;
            summary.document_ids.push(doc_id);
        }

        Ok(summary)
    }

    async fn delete_by_query(&self, query: &DeleteQuery) -> Result<u64, SearchCoreError> {
        if query.is_empty() {
            return Err(SearchCoreError::rejected(
                "delete_by_query",
                400,
                "refusing to delete with an empty query",
            ));
        }

        let response = self
            .client
            .delete_by_query(DeleteByQueryParts::Index(&[self.core.as_str()]))
            .body(Self::delete_by_query_body(query))
            .send()
            .await
            .map_err(|e| SearchCoreError::connection(e.to_string()))?;

        // A missing index holds no documents to delete.
        if response.status_code().as_u16() == 404 {
            return Ok(0);
        }
        if !response.status_code().is_success() {
            return Err(Self::reject("delete_by_query", response).await);
        }

        let body = Self::json_body(response).await?;
        let deleted = body.get("deleted").and_then(Value::as_u64).unwrap_or(0);
        debug!(core = %self.core, deleted, "Documents deleted by query");
        Ok(deleted)
    }
}

#[async_trait]
impl CoreAdmin for OpenSearchCore {
    async fn info(&self) -> Result<CoreInfo, SearchCoreError> {
        let response = self
            .client
            .info()
            .send()
            .await
            .map_err(|e| SearchCoreError::connection(e.to_string()))?;

        if !response.status_code().is_success() {
            return Err(Self::reject("info", response).await);
        }

        let body = Self::json_body(response).await?;
        Ok(CoreInfo {
            core: self.core.clone(),
            engine_version: body
                .pointer("/version/number")
                .and_then(Value::as_str)
                .map(str::to_string),
            cluster_name: body
                .get("cluster_name")
                .and_then(Value::as_str)
                .map(str::to_string),
        })
    }

    async fn schema(&self) -> Result<Value, SearchCoreError> {
        let response = self
            .client
            .indices()
            .get_mapping(IndicesGetMappingParts::Index(&[self.core.as_str()]))
            .send()
            .await
            .map_err(|e| SearchCoreError::connection(e.to_string()))?;

        if !response.status_code().is_success() {
            return Err(Self::reject("get_mapping", response).await);
        }

        let body = Self::json_body(response).await?;
        Ok(body
            .get(&self.core)
            .and_then(|index| index.get("mappings"))
            .cloned()
            .unwrap_or(body))
    }

    async fn reload(&self) -> Result<(), SearchCoreError> {
        let response = self
            .client
            .indices()
            .refresh(IndicesRefreshParts::Index(&[self.core.as_str()]))
            .send()
            .await
            .map_err(|e| SearchCoreError::connection(e.to_string()))?;

        if !response.status_code().is_success() {
            return Err(Self::reject("refresh", response).await);
        }
        Ok(())
    }

    async fn core_exists(&self) -> Result<bool, SearchCoreError> {
        let response = self
            .client
            .indices()
            .exists(IndicesExistsParts::Index(&[self.core.as_str()]))
            .send()
            .await
            .map_err(|e| SearchCoreError::connection(e.to_string()))?;

        match response.status_code().as_u16() {
            404 => Ok(false),
            status if (200..300).contains(&status) => Ok(true),
            _ => Err(Self::reject("exists", response).await),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_does_not_touch_network() {
        let config = ConnectionConfig::new("search.internal", 9201, " site_de ")
            .with_scheme("HTTPS")
            .with_credentials(Credentials::Basic {
                username: "indexer".to_string(),
                password: "secret".to_string(),
            })
            .with_timeout_secs(5);

        let core = OpenSearchCore::new(&config).unwrap();
        assert_eq!(core.core(), "site_de");
    }

    #[test]
    fn test_new_rejects_invalid_config() {
        let config = ConnectionConfig::new("localhost", 9200, "");
        assert!(matches!(
            OpenSearchCore::new(&config),
            Err(SearchCoreError::InvalidConnectionConfig(_))
        ));
    }

    #[test]
    fn test_delete_by_query_body() {
        let query = DeleteQuery::for_record("hash", "pages", 3);
        let body = OpenSearchCore::delete_by_query_body(&query);

        assert_eq!(
            body,
            json!({
                "query": {
                    "bool": {
                        "filter": [
                            { "term": { "siteHash": "hash" } },
                            { "term": { "type": "pages" } },
                            { "term": { "uid": 3 } }
                        ]
                    }
                }
            })
        );
    }

    #[tokio::test]
    async fn test_empty_delete_query_is_refused() {
        let core = OpenSearchCore::new(&ConnectionConfig::new("localhost", 9200, "core")).unwrap();
        let result = core.delete_by_query(&DeleteQuery::default()).await;
        assert_eq!(result.unwrap_err().status(), Some(400));
    }
}
