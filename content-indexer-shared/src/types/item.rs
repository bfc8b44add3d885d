//! Queue items: units of content scheduled for indexing.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::record::Record;

/// Persistent state of a queue item.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemState {
    /// Waiting to be indexed.
    #[default]
    Pending,
    /// Last attempt indexed every applicable language.
    Indexed,
    /// Last attempt failed; the error text explains why.
    Blocked,
}

/// One unit of content queued for indexing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    /// Queue entry id.
    pub uid: u64,
    /// Content type (table name) of the record.
    pub item_type: String,
    pub record_uid: u64,
    /// Root page of the site the item belongs to.
    pub root_id: u64,
    /// Page whose translations decide which languages apply.
    #[serde(default)]
    pub page_id: u64,
    #[serde(default)]
    pub indexing_configuration: Option<String>,
    /// Unix timestamp of the last content change.
    #[serde(default)]
    pub changed: i64,
    #[serde(default)]
    pub state: ItemState,
    #[serde(default)]
    pub indexed_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub error: Option<String>,
    /// Raw record payload, when the queue already carries it.
    #[serde(default)]
    pub record: Option<Record>,
}

impl Item {
    /// Create a pending item.
    pub fn new(uid: u64, item_type: impl Into<String>, record_uid: u64, root_id: u64) -> Self {
        Self {
            uid,
            item_type: item_type.into(),
            record_uid,
            root_id,
            page_id: 0,
            indexing_configuration: None,
            changed: 0,
            state: ItemState::Pending,
            indexed_at: None,
            error: None,
            record: None,
        }
    }

    pub fn with_page_id(mut self, page_id: u64) -> Self {
        self.page_id = page_id;
        self
    }

    pub fn with_indexing_configuration(mut self, name: impl Into<String>) -> Self {
        self.indexing_configuration = Some(name.into());
        self
    }

    pub fn with_record(mut self, record: Record) -> Self {
        self.record = Some(record);
        self
    }

    /// Name of the indexing configuration, defaulting to the item type.
    pub fn indexing_configuration_name(&self) -> &str {
        self.indexing_configuration
            .as_deref()
            .unwrap_or(&self.item_type)
    }

    /// Page whose translation overlays decide language applicability.
    ///
    /// Pages are their own translation anchor; other records fall back to the
    /// site root when the queue did not record their page.
    pub fn translation_page_id(&self) -> u64 {
        if self.page_id != 0 {
            self.page_id
        } else if self.item_type == "pages" {
            self.record_uid
        } else {
            self.root_id
        }
    }

    /// Record a successful attempt.
    pub fn mark_indexed(&mut self, at: DateTime<Utc>) {
        self.state = ItemState::Indexed;
        self.indexed_at = Some(at);
        self.error = None;
    }

    /// Record a failed attempt.
    pub fn mark_blocked(&mut self, error: impl Into<String>, at: DateTime<Utc>) {
        self.state = ItemState::Blocked;
        self.indexed_at = Some(at);
        self.error = Some(error.into());
    }

    pub fn has_errors(&self) -> bool {
        self.state == ItemState::Blocked
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_transitions() {
        let mut item = Item::new(1, "tt_content", 42, 1);
        assert_eq!(item.state, ItemState::Pending);

        let now = Utc::now();
        item.mark_blocked("engine down", now);
        assert!(item.has_errors());
        assert_eq!(item.error.as_deref(), Some("engine down"));

        item.mark_indexed(now);
        assert_eq!(item.state, ItemState::Indexed);
        assert!(item.error.is_none());
        assert_eq!(item.indexed_at, Some(now));
    }

    #[test]
    fn test_indexing_configuration_defaults_to_type() {
        let item = Item::new(1, "tx_news", 3, 1);
        assert_eq!(item.indexing_configuration_name(), "tx_news");

        let item = item.with_indexing_configuration("news");
        assert_eq!(item.indexing_configuration_name(), "news");
    }

    #[test]
    fn test_deserialize_minimal() {
        let item: Item = serde_json::from_str(
            r#"{"uid": 5, "item_type": "pages", "record_uid": 9, "root_id": 1}"#,
        )
        .unwrap();
        assert_eq!(item.state, ItemState::Pending);
        assert_eq!(item.page_id, 0);
        assert_eq!(item.translation_page_id(), 9);
        assert!(item.record.is_none());
    }

    #[test]
    fn test_new_page_item_resolves_its_own_translations() {
        let built = Item::new(5, "pages", 9, 1);
        let parsed: Item = serde_json::from_str(
            r#"{"uid": 5, "item_type": "pages", "record_uid": 9, "root_id": 1}"#,
        )
        .unwrap();

        assert_eq!(built.translation_page_id(), 9);
        assert_eq!(built.translation_page_id(), parsed.translation_page_id());
        assert_eq!(Item::new(6, "tt_content", 42, 1).translation_page_id(), 1);
    }
}
