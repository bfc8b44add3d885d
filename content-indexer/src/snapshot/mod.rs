//! Snapshot-backed collaborators.
//!
//! A [`ContentSnapshot`] is a JSON export of a site's content, configuration
//! and pending queue. It implements every host platform interface the indexer
//! needs, so an exported site can be indexed without the platform itself.
//!
//! ```json
//! {
//!   "sites": [{
//!     "root_id": 1,
//!     "identifier": "main",
//!     "languages": [
//!       { "id": 0, "connection": { "host": "localhost", "core": "main_en" } },
//!       { "id": 1, "fallback_chain": [0], "connection": { "host": "localhost", "core": "main_de" } }
//!     ],
//!     "indexing": { "pages": { "title": "title", "content": "SOLR_CONTENT", "content.": { "field": "bodytext" } } }
//!   }],
//!   "records": { "pages": { "1": { "fields": { "pid": 0, "is_siteroot": 1, "title": "Home" }, "overlays": { "1": { "title": "Start" } } } } },
//!   "queue": [{ "uid": 1, "item_type": "pages", "record_uid": 1, "root_id": 1 }]
//! }
//! ```

mod renderer;

pub use renderer::SnapshotRenderer;

use std::collections::{BTreeMap, HashSet};
use std::path::Path;
use std::sync::{Mutex, PoisonError};

use async_trait::async_trait;
use content_indexer_shared::types::record::LANGUAGE_FIELD;
use content_indexer_shared::{
    FieldMappingSpec, Item, ItemState, LanguageId, Record, SiteLanguage, DEFAULT_LANGUAGE,
};
use serde::Deserialize;
use serde_json::{Map, Value};
use tracing::{debug, info};

use crate::errors::IndexerError;
use crate::interfaces::{ConfigurationTree, ContentRepository, IndexQueue, SiteConfiguration};

/// Table holding the page tree.
pub const PAGES_TABLE: &str = "pages";

/// Page flag marking a site root.
const SITE_ROOT_FIELD: &str = "is_siteroot";

/// Upper bound on rootline depth, guarding against cyclic `pid` chains.
const MAX_ROOTLINE_DEPTH: usize = 99;

#[derive(Debug, Deserialize)]
struct SnapshotData {
    #[serde(default)]
    sites: Vec<SnapshotSite>,
    #[serde(default)]
    records: BTreeMap<String, BTreeMap<u64, SnapshotRecord>>,
    #[serde(default)]
    queue: Vec<Item>,
}

#[derive(Debug, Clone, Deserialize)]
struct SnapshotSite {
    root_id: u64,
    identifier: String,
    #[serde(default)]
    default_language: Option<LanguageId>,
    #[serde(default)]
    languages: Vec<SiteLanguage>,
    /// Flat field mapping per indexing configuration name.
    #[serde(default)]
    indexing: BTreeMap<String, Map<String, Value>>,
}

#[derive(Debug, Clone, Deserialize)]
struct SnapshotRecord {
    #[serde(default)]
    fields: Record,
    #[serde(default)]
    overlays: BTreeMap<LanguageId, Record>,
}

/// Exported content, configuration and queue of one or more sites.
#[derive(Debug)]
pub struct ContentSnapshot {
    sites: BTreeMap<u64, SnapshotSite>,
    records: BTreeMap<String, BTreeMap<u64, SnapshotRecord>>,
    queue: Mutex<Vec<Item>>,
}

impl ContentSnapshot {
    /// Parse a snapshot from its JSON text.
    pub fn from_json(json: &str) -> Result<Self, IndexerError> {
        let data: SnapshotData = serde_json::from_str(json)
            .map_err(|e| IndexerError::collaborator(format!("Invalid content snapshot: {}", e)))?;

        let snapshot = Self {
            sites: data
                .sites
                .into_iter()
                .map(|site| (site.root_id, site))
                .collect(),
            records: data.records,
            queue: Mutex::new(data.queue),
        };
        info!(
            sites = snapshot.sites.len(),
            tables = snapshot.records.len(),
            queued = snapshot.queue_len(),
            "Loaded content snapshot"
        );
        Ok(snapshot)
    }

    /// Read and parse a snapshot file.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, IndexerError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|e| {
            IndexerError::collaborator(format!("Failed to read {}: {}", path.display(), e))
        })?;
        Self::from_json(&json)
    }

    /// Copy of every queue item in its current state.
    pub fn queue_items(&self) -> Vec<Item> {
        self.queue
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn queue_len(&self) -> usize {
        self.queue.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    /// Add an item to the queue, replacing a queued item with the same uid.
    pub fn enqueue(&self, item: Item) {
        let mut queue = self.queue.lock().unwrap_or_else(PoisonError::into_inner);
        queue.retain(|queued| queued.uid != item.uid);
        queue.push(item);
    }

    /// Visible record of a table, ignoring deleted and hidden ones.
    pub fn lookup(&self, table: &str, uid: u64) -> Option<&Record> {
        let entry = self.records.get(table)?.get(&uid)?;
        let flagged = |name: &str| entry.fields.get_i64(name).is_some_and(|v| v != 0);
        if flagged("deleted") || flagged("hidden") {
            return None;
        }
        Some(&entry.fields)
    }

    /// Overlay of a record for one language, carrying its language id.
    pub fn lookup_overlay(&self, table: &str, uid: u64, language: LanguageId) -> Option<Record> {
        self.lookup(table, uid)?;
        let overlay = self.records.get(table)?.get(&uid)?.overlays.get(&language)?;
        if overlay.contains(LANGUAGE_FIELD) {
            Some(overlay.clone())
        } else {
            Some(overlay.with_virtual_field(LANGUAGE_FIELD, i64::from(language)))
        }
    }

    fn store(&self, item: &Item) {
        let mut queue = self.queue.lock().unwrap_or_else(PoisonError::into_inner);
        match queue.iter_mut().find(|queued| queued.uid == item.uid) {
            Some(queued) => *queued = item.clone(),
            None => queue.push(item.clone()),
        }
    }
}

#[async_trait]
impl ContentRepository for ContentSnapshot {
    async fn record(&self, item_type: &str, uid: u64) -> Result<Option<Record>, IndexerError> {
        Ok(self.lookup(item_type, uid).cloned())
    }

    async fn record_overlay(
        &self,
        item_type: &str,
        uid: u64,
        language: LanguageId,
    ) -> Result<Option<Record>, IndexerError> {
        Ok(self.lookup_overlay(item_type, uid, language))
    }

    async fn page_translation_languages(&self, page_id: u64) -> Result<Vec<LanguageId>, IndexerError> {
        if self.lookup(PAGES_TABLE, page_id).is_none() {
            return Ok(Vec::new());
        }
        Ok(self
            .records
            .get(PAGES_TABLE)
            .and_then(|pages| pages.get(&page_id))
            .map(|page| {
                page.overlays
                    .keys()
                    .copied()
                    .filter(|language| *language != DEFAULT_LANGUAGE)
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn rootline(&self, page_id: u64) -> Result<Vec<u64>, IndexerError> {
        let mut rootline = Vec::new();
        let mut visited = HashSet::new();
        let mut current = page_id;

        while let Some(page) = self.lookup(PAGES_TABLE, current) {
            if !visited.insert(current) || rootline.len() >= MAX_ROOTLINE_DEPTH {
                debug!(page_id, "Rootline loops, stopping");
                break;
            }
            rootline.push(current);
            match page.get_i64("pid") {
                Some(pid) if pid > 0 => current = pid as u64,
                _ => break,
            }
        }

        Ok(rootline)
    }

    async fn site_roots(&self) -> Result<Vec<u64>, IndexerError> {
        let Some(pages) = self.records.get(PAGES_TABLE) else {
            return Ok(Vec::new());
        };
        Ok(pages
            .keys()
            .copied()
            .filter(|uid| {
                self.lookup(PAGES_TABLE, *uid)
                    .and_then(|page| page.get_i64(SITE_ROOT_FIELD))
                    .is_some_and(|flag| flag != 0)
            })
            .collect())
    }
}

#[async_trait]
impl ConfigurationTree for ContentSnapshot {
    async fn site_configuration(
        &self,
        root_id: u64,
    ) -> Result<Option<SiteConfiguration>, IndexerError> {
        Ok(self.sites.get(&root_id).map(|site| {
            let mut configuration =
                SiteConfiguration::new(site.identifier.clone(), site.languages.clone());
            if let Some(default_language) = site.default_language {
                configuration.default_language = default_language;
            }
            configuration
        }))
    }

    async fn field_mapping(
        &self,
        root_id: u64,
        indexing_configuration: &str,
    ) -> Result<FieldMappingSpec, IndexerError> {
        match self
            .sites
            .get(&root_id)
            .and_then(|site| site.indexing.get(indexing_configuration))
        {
            Some(config) => Ok(FieldMappingSpec::from_config(config)?),
            None => {
                debug!(root_id, indexing_configuration, "No field mapping configured");
                Ok(FieldMappingSpec::new())
            }
        }
    }
}

#[async_trait]
impl IndexQueue for ContentSnapshot {
    async fn pending_items(&self, limit: usize) -> Result<Vec<Item>, IndexerError> {
        let queue = self.queue.lock().unwrap_or_else(PoisonError::into_inner);
        let mut pending: Vec<Item> = queue
            .iter()
            .filter(|item| item.state == ItemState::Pending)
            .cloned()
            .collect();
        pending.sort_by_key(|item| (item.changed, item.uid));
        pending.truncate(limit);
        Ok(pending)
    }

    async fn mark_indexed(&self, item: &Item) -> Result<(), IndexerError> {
        self.store(item);
        Ok(())
    }

    async fn mark_failed(&self, item: &Item) -> Result<(), IndexerError> {
        self.store(item);
        Ok(())
    }
}
