//! Request and response types for search core operations.

use content_indexer_shared::LanguageId;
use serde_json::{json, Value};

/// Outcome of submitting a batch of documents to one core.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WriteSummary {
    /// Number of documents the engine accepted.
    pub accepted: usize,
    /// Ids of the accepted documents, in submission order.
    pub document_ids: Vec<String>,
}

/// Engine and core metadata reported by the admin endpoint.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CoreInfo {
    pub core: String,
    pub engine_version: Option<String>,
    pub cluster_name: Option<String>,
}

/// Selects documents to delete from a core.
///
/// Every set criterion must match; an empty query matches nothing and is
/// refused by writers to avoid wiping a core by accident.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeleteQuery {
    pub site_hash: Option<String>,
    pub item_type: Option<String>,
    pub uid: Option<u64>,
    pub language: Option<LanguageId>,
}

impl DeleteQuery {
    /// Query for all documents of one record within one site.
    pub fn for_record(site_hash: impl Into<String>, item_type: impl Into<String>, uid: u64) -> Self {
        Self {
            site_hash: Some(site_hash.into()),
            item_type: Some(item_type.into()),
            uid: Some(uid),
            language: None,
        }
    }

    pub fn with_language(mut self, language: LanguageId) -> Self {
        self.language = Some(language);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.site_hash.is_none()
            && self.item_type.is_none()
            && self.uid.is_none()
            && self.language.is_none()
    }

    /// Term filters for every set criterion, keyed by document field name.
    pub fn term_filters(&self) -> Vec<Value> {
        let mut filters = Vec::new();
        if let Some(site_hash) = &self.site_hash {
            filters.push(json!({ "term": { "siteHash": site_hash } }));
        }
        if let Some(item_type) = &self.item_type {
            filters.push(json!({ "term": { "type": item_type } }));
        }
        if let Some(uid) = self.uid {
            filters.push(json!({ "term": { "uid": uid } }));
        }
        if let Some(language) = self.language {
            filters.push(json!({ "term": { "language": language } }));
        }
        filters
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_term_filters_for_record() {
        let query = DeleteQuery::for_record("abc", "tt_content", 7).with_language(1);
        let filters = query.term_filters();

        assert_eq!(filters.len(), 4);
        assert_eq!(filters[0], json!({ "term": { "siteHash": "abc" } }));
        assert_eq!(filters[1], json!({ "term": { "type": "tt_content" } }));
        assert_eq!(filters[2], json!({ "term": { "uid": 7 } }));
        assert_eq!(filters[3], json!({ "term": { "language": 1 } }));
    }

    #[test]
    fn test_empty_query() {
        assert!(DeleteQuery::default().is_empty());
        assert!(DeleteQuery::default().term_filters().is_empty());
        assert!(!DeleteQuery::for_record("abc", "pages", 1).is_empty());
    }
}
