//! Integration tests for the content indexer.
//!
//! These tests wire the real indexer around a `ContentSnapshot` fixture and
//! replace the search engine with recording cores.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use content_indexer::errors::IndexerError;
use content_indexer::language::LanguageFallbackResolver;
use content_indexer::site::{SiteDirectory, SiteResolutionMode};
use content_indexer::snapshot::ContentSnapshot;
use content_indexer::{Dependencies, LanguageOutcome, Settings};
use content_indexer_repository::{
    ConnectionFactory, ConnectionRegistry, CoreAdmin, CoreConnection, CoreInfo, CoreReader,
    CoreWriter, DeleteQuery, SearchCoreError, WriteSummary,
};
use content_indexer_shared::{ConnectionConfig, Document, FieldValue, Item, ItemState};
use serde_json::{json, Value};

// What the recording cores hold. Documents are stored by core and id, the
// way the engine indexes them, so a resubmitted id replaces the old copy.
#[derive(Default)]
struct EngineLog {
    submitted: Mutex<Vec<(String, Document)>>,
    deleted: Mutex<Vec<(String, DeleteQuery)>>,
}

impl EngineLog {
    fn documents_in(&self, core: &str) -> Vec<Document> {
        self.submitted
            .lock()
            .unwrap()
            .iter()
            .filter(|(c, _)| c == core)
            .map(|(_, d)| d.clone())
            .collect()
    }

    fn submitted_count(&self) -> usize {
        self.submitted.lock().unwrap().len()
    }
}

// Mock core that records submissions and can reject everything.
struct RecordingCore {
    core: String,
    log: Arc<EngineLog>,
    reject: bool,
}

#[async_trait]
impl CoreReader for RecordingCore {
    async fn ping(&self) -> Result<bool, SearchCoreError> {
        Ok(!self.reject)
    }

    async fn document_count(&self) -> Result<u64, SearchCoreError> {
        Ok(self.log.documents_in(&self.core).len() as u64)
    }
}

#[async_trait]
impl CoreWriter for RecordingCore {
    async fn add_documents(&self, documents: &[Document]) -> Result<WriteSummary, SearchCoreError> {
        if self.reject {
            return Err(SearchCoreError::rejected(
                "index",
                400,
                "ERROR: [doc=main] unknown field 'foo'",
            ));
        }
        let mut submitted = self.log.submitted.lock().unwrap();
        for document in documents {
            let existing = submitted
                .iter()
                .position(|(core, stored)| *core == self.core && stored.id() == document.id());
            match existing {
                Some(index) => submitted[index].1 = document.clone(),
                None => submitted.push((self.core.clone(), document.clone())),
            }
        }
        Ok(WriteSummary {
            accepted: documents.len(),
            document_ids: documents
                .iter()
                .filter_map(|d| d.id().map(str::to_string))
                .collect(),
        })
    }

    async fn delete_by_query(&self, query: &DeleteQuery) -> Result<u64, SearchCoreError> {
        self.log
            .deleted
            .lock()
            .unwrap()
            .push((self.core.clone(), query.clone()));
        Ok(1)
    }
}

#[async_trait]
impl CoreAdmin for RecordingCore {
    async fn info(&self) -> Result<CoreInfo, SearchCoreError> {
        Ok(CoreInfo {
            core: self.core.clone(),
            ..CoreInfo::default()
        })
    }

    async fn schema(&self) -> Result<Value, SearchCoreError> {
        Ok(json!({}))
    }

    async fn reload(&self) -> Result<(), SearchCoreError> {
        Ok(())
    }

    async fn core_exists(&self) -> Result<bool, SearchCoreError> {
        Ok(true)
    }
}

struct RecordingFactory {
    log: Arc<EngineLog>,
    rejecting_cores: Vec<String>,
    created: AtomicUsize,
}

impl RecordingFactory {
    fn new() -> Self {
        Self {
            log: Arc::new(EngineLog::default()),
            rejecting_cores: Vec::new(),
            created: AtomicUsize::new(0),
        }
    }

    fn rejecting(core: &str) -> Self {
        Self {
            rejecting_cores: vec![core.to_string()],
            ..Self::new()
        }
    }
}

impl ConnectionFactory for RecordingFactory {
    fn create(&self, config: &ConnectionConfig) -> Result<CoreConnection, SearchCoreError> {
        self.created.fetch_add(1, Ordering::SeqCst);
        let core = RecordingCore {
            core: config.core.clone(),
            log: Arc::clone(&self.log),
            reject: self.rejecting_cores.contains(&config.core),
        };
        Ok(CoreConnection::from_backend(config.clone(), Arc::new(core)))
    }
}

fn connection(core: &str) -> Value {
    json!({ "host": "localhost", "port": 9200, "core": core })
}

fn content_mapping() -> Value {
    json!({
        "tt_content": {
            "title": "header",
            "content": "SOLR_CONTENT",
            "content.": { "field": "bodytext" },
            "abstract": "__solr_content"
        }
    })
}

/// Site 1 with English (0) and German (1, falling back to English).
fn en_de_site() -> Value {
    json!({
        "root_id": 1,
        "identifier": "main",
        "languages": [
            { "id": 0, "title": "English", "connection": connection("main_en") },
            { "id": 1, "title": "Deutsch", "fallback_chain": [0], "connection": connection("main_de") }
        ],
        "indexing": content_mapping()
    })
}

/// Root page 1 translated into `translations`, content element 42 on it.
fn records(translations: &[u32], root_flags: i64) -> Value {
    let page_overlays: serde_json::Map<String, Value> = translations
        .iter()
        .map(|l| (l.to_string(), json!({ "title": format!("Home {}", l) })))
        .collect();
    let content_overlays: serde_json::Map<String, Value> = translations
        .iter()
        .map(|l| {
            (
                l.to_string(),
                json!({ "header": format!("Welcome {}", l), "bodytext": format!("<p>Hello {}</p>", l) }),
            )
        })
        .collect();

    json!({
        "pages": {
            "1": {
                "fields": { "uid": 1, "pid": 0, "is_siteroot": 1, "title": "Home", "l18n_cfg": root_flags },
                "overlays": page_overlays
            }
        },
        "tt_content": {
            "42": {
                "fields": {
                    "uid": 42, "pid": 1, "sys_language_uid": 0,
                    "header": "Welcome", "bodytext": "<p>Hello <b>world</b></p>",
                    "crdate": 1700000000, "tstamp": 1700000060
                },
                "overlays": content_overlays
            }
        }
    })
}

fn snapshot(sites: Value, records: Value, queue: Value) -> Arc<ContentSnapshot> {
    let json = json!({ "sites": sites, "records": records, "queue": queue });
    Arc::new(ContentSnapshot::from_json(&json.to_string()).unwrap())
}

fn content_item(uid: u64) -> Item {
    Item::new(uid, "tt_content", 42, 1).with_page_id(1)
}

fn dependencies(snapshot: Arc<ContentSnapshot>, factory: Arc<RecordingFactory>) -> Dependencies {
    Dependencies::from_snapshot(snapshot, factory, Settings::new("snapshot.json")).unwrap()
}

fn resolver_parts(
    snapshot: Arc<ContentSnapshot>,
    factory: Arc<RecordingFactory>,
) -> (SiteDirectory, LanguageFallbackResolver) {
    let registry = Arc::new(ConnectionRegistry::new(factory));
    (
        SiteDirectory::new(snapshot.clone(), snapshot.clone()),
        LanguageFallbackResolver::new(snapshot, registry),
    )
}

#[tokio::test]
async fn test_untranslated_german_falls_back_to_english_core() {
    let snapshot = snapshot(json!([en_de_site()]), records(&[], 0), json!([]));
    let factory = Arc::new(RecordingFactory::new());

    let (sites, resolver) = resolver_parts(snapshot.clone(), factory.clone());
    let site = sites.site_for_root(1).await.unwrap().unwrap();
    let connections = resolver
        .connections_for_item(&site, &content_item(1))
        .await
        .unwrap();

    assert_eq!(connections.keys().copied().collect::<Vec<_>>(), vec![0, 1]);
    assert_eq!(connections[&0].connection.core_name(), "main_en");
    assert_eq!(connections[&1].connection.core_name(), "main_en");
    assert!(Arc::ptr_eq(&connections[&0].connection, &connections[&1].connection));

    let deps = dependencies(snapshot, factory.clone());
    let report = deps.indexer.try_index_item(&content_item(1)).await.unwrap();
    assert_eq!(report.documents(), 2);

    // Both languages share the English core and keep separate documents.
    let english_core = factory.log.documents_in("main_en");
    assert_eq!(english_core.len(), 2);
    assert_ne!(english_core[0].id(), english_core[1].id());
    assert!(factory.log.documents_in("main_de").is_empty());

    let english = &english_core[0];
    assert_eq!(english.get("language"), Some(&FieldValue::Int(0)));
    assert_eq!(english.get("title"), Some(&FieldValue::from("Welcome")));
    assert_eq!(english.get("content"), Some(&FieldValue::from("Hello world")));
    assert_eq!(english.get("abstract"), Some(&FieldValue::from("Hello world")));

    let mut german = english_core[1].clone();
    assert_eq!(german.get("language"), Some(&FieldValue::Int(1)));
    german.set_field("id", english.id().unwrap());
    german.set_field("language", 0_i64);
    assert_eq!(&german, english);
}

#[tokio::test]
async fn test_reindexing_replaces_documents_by_id() {
    let snapshot = snapshot(json!([en_de_site()]), records(&[], 0), json!([]));
    let factory = Arc::new(RecordingFactory::new());
    let deps = dependencies(snapshot, factory.clone());

    deps.indexer.try_index_item(&content_item(1)).await.unwrap();
    deps.indexer.try_index_item(&content_item(1)).await.unwrap();

    let english_core = factory.log.documents_in("main_en");
    assert_eq!(english_core.len(), 2);
    let languages: Vec<_> = english_core.iter().map(|d| d.get("language").cloned()).collect();
    assert_eq!(
        languages,
        vec![Some(FieldValue::Int(0)), Some(FieldValue::Int(1))]
    );
}

#[tokio::test]
async fn test_translated_german_uses_german_core_and_overlay() {
    let snapshot = snapshot(json!([en_de_site()]), records(&[1], 0), json!([]));
    let factory = Arc::new(RecordingFactory::new());
    let deps = dependencies(snapshot, factory.clone());

    deps.indexer.try_index_item(&content_item(1)).await.unwrap();

    let german = factory.log.documents_in("main_de");
    assert_eq!(german.len(), 1);
    assert_eq!(german[0].get("language"), Some(&FieldValue::Int(1)));
    assert_eq!(german[0].get("title"), Some(&FieldValue::from("Welcome 1")));
    assert_eq!(german[0].get("content"), Some(&FieldValue::from("Hello 1")));
    assert_eq!(factory.log.documents_in("main_en").len(), 1);
}

#[tokio::test]
async fn test_connection_resolution_is_deterministic() {
    let snapshot = snapshot(json!([en_de_site()]), records(&[1], 0), json!([]));
    let factory = Arc::new(RecordingFactory::new());
    let (sites, resolver) = resolver_parts(snapshot, factory.clone());
    let site = sites.site_for_root(1).await.unwrap().unwrap();

    let first = resolver
        .connections_for_item(&site, &content_item(1))
        .await
        .unwrap();
    let second = resolver
        .connections_for_item(&site, &content_item(1))
        .await
        .unwrap();

    assert_eq!(
        first.keys().collect::<Vec<_>>(),
        second.keys().collect::<Vec<_>>()
    );
    for (language, resolved) in &first {
        assert_eq!(resolved.plan, second[language].plan);
        assert!(Arc::ptr_eq(&resolved.connection, &second[language].connection));
    }
    assert_eq!(factory.created.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_hidden_default_translation_is_never_indexed() {
    let site = json!({
        "root_id": 1,
        "identifier": "main",
        "languages": [
            { "id": 0, "connection": connection("main_en") },
            { "id": 2, "connection": connection("main_fr") },
            { "id": 5, "connection": connection("main_es") }
        ],
        "indexing": content_mapping()
    });
    let snapshot = snapshot(json!([site]), records(&[2, 5], 1), json!([]));
    let factory = Arc::new(RecordingFactory::new());

    let (sites, resolver) = resolver_parts(snapshot.clone(), factory.clone());
    let site = sites.site_for_root(1).await.unwrap().unwrap();
    let connections = resolver
        .connections_for_item(&site, &content_item(1))
        .await
        .unwrap();

    assert!(!connections.contains_key(&0));
    assert_eq!(connections.keys().copied().collect::<Vec<_>>(), vec![2, 5]);

    let deps = dependencies(snapshot, factory.clone());
    let report = deps.indexer.try_index_item(&content_item(1)).await.unwrap();
    assert!(!report.outcomes.contains_key(&0));
    assert!(factory.log.documents_in("main_en").is_empty());
    assert_eq!(factory.log.documents_in("main_fr").len(), 1);
    assert_eq!(factory.log.documents_in("main_es").len(), 1);
}

#[tokio::test]
async fn test_one_failing_language_fails_the_item() {
    let snapshot = snapshot(json!([en_de_site()]), records(&[1], 0), json!([]));
    let factory = Arc::new(RecordingFactory::rejecting("main_de"));
    let deps = dependencies(snapshot, factory.clone());

    let result = deps.indexer.try_index_item(&content_item(1)).await;
    match result {
        Err(IndexerError::Indexing { status, message }) => {
            assert_eq!(status, 400);
            assert!(message.contains("unknown field 'foo'"));
        }
        other => panic!("expected indexing error, got {:?}", other),
    }
    // English was submitted before German failed.
    assert_eq!(factory.log.documents_in("main_en").len(), 1);

    let mut item = content_item(1);
    assert!(!deps.indexer.index_item(&mut item).await);
    assert_eq!(item.state, ItemState::Blocked);
    assert!(item.has_errors());
    assert!(item.error.as_deref().unwrap().contains("status 400"));
}

#[tokio::test]
async fn test_language_without_content_is_skipped_not_failed() {
    let site = json!({
        "root_id": 1,
        "identifier": "main",
        "languages": [
            { "id": 0, "connection": connection("main_en") },
            { "id": 3, "fallback_type": "strict", "connection": connection("main_nl") }
        ],
        "indexing": content_mapping()
    });
    // The page is translated into Dutch, the content element is not.
    let mut records = records(&[], 0);
    records["pages"]["1"]["overlays"] = json!({ "3": { "title": "Thuis" } });
    let snapshot = snapshot(json!([site]), records, json!([]));
    let factory = Arc::new(RecordingFactory::new());
    let deps = dependencies(snapshot, factory.clone());

    let mut item = content_item(1);
    let report = deps.indexer.try_index_item(&item).await.unwrap();

    assert_eq!(report.outcomes[&0], LanguageOutcome::Indexed { documents: 1 });
    assert_eq!(report.outcomes[&3], LanguageOutcome::Skipped);
    assert!(factory.log.documents_in("main_nl").is_empty());

    assert!(deps.indexer.index_item(&mut item).await);
    assert_eq!(item.state, ItemState::Indexed);
    assert!(item.error.is_none());
}

#[tokio::test]
async fn test_independent_language_gets_no_fallback_document() {
    let site = json!({
        "root_id": 1,
        "identifier": "main",
        "languages": [
            { "id": 0, "connection": connection("main_en") },
            { "id": 4, "fallback_type": "free", "fallback_chain": [0], "connection": connection("main_jp") }
        ],
        "indexing": content_mapping()
    });
    let snapshot = snapshot(json!([site]), records(&[], 0), json!([]));
    let factory = Arc::new(RecordingFactory::new());
    let deps = dependencies(snapshot, factory.clone());

    let report = deps.indexer.try_index_item(&content_item(1)).await.unwrap();

    assert_eq!(report.outcomes.keys().copied().collect::<Vec<_>>(), vec![0]);
    assert_eq!(factory.log.submitted_count(), 1);
}

#[tokio::test]
async fn test_mapping_the_type_field_builds_nothing() {
    let mut site = en_de_site();
    site["indexing"]["tt_content"]["type"] = json!("CType");
    let snapshot = snapshot(json!([site]), records(&[1], 0), json!([]));
    let factory = Arc::new(RecordingFactory::new());
    let deps = dependencies(snapshot, factory.clone());

    let result = deps.indexer.try_index_item(&content_item(1)).await;

    assert_eq!(result, Err(IndexerError::InvalidFieldName("type".to_string())));
    assert_eq!(factory.log.submitted_count(), 0);
}

#[tokio::test]
async fn test_missing_default_connection_is_fatal() {
    let site = json!({
        "root_id": 1,
        "identifier": "main",
        "languages": [
            { "id": 0 },
            { "id": 1, "connection": connection("main_de") }
        ],
        "indexing": content_mapping()
    });
    let snapshot = snapshot(json!([site]), records(&[1], 0), json!([]));
    let factory = Arc::new(RecordingFactory::new());
    let deps = dependencies(snapshot, factory.clone());

    let result = deps.indexer.try_index_item(&content_item(1)).await;

    assert_eq!(
        result,
        Err(IndexerError::NoConnectionFound {
            root_id: 1,
            language: 0
        })
    );
    assert_eq!(factory.log.submitted_count(), 0);
}

#[tokio::test]
async fn test_remove_item_clears_each_core_once() {
    let site = json!({
        "root_id": 1,
        "identifier": "main",
        "languages": [
            { "id": 0, "connection": connection("main_en") },
            { "id": 1, "connection": connection("main_de") },
            { "id": 2, "connection": connection("main_en") }
        ],
        "indexing": content_mapping()
    });
    let snapshot = snapshot(json!([site]), records(&[], 0), json!([]));
    let factory = Arc::new(RecordingFactory::new());
    let deps = dependencies(snapshot, factory.clone());

    let deleted = deps.indexer.remove_item(&content_item(1)).await.unwrap();

    assert_eq!(deleted, 2);
    let deletes = factory.log.deleted.lock().unwrap();
    let cores: Vec<&str> = deletes.iter().map(|(core, _)| core.as_str()).collect();
    assert_eq!(cores, vec!["main_en", "main_de"]);
    assert_eq!(deletes[0].1.item_type.as_deref(), Some("tt_content"));
    assert_eq!(deletes[0].1.uid, Some(42));
}

#[tokio::test]
async fn test_process_queue_reports_verdicts() {
    let queue = json!([
        { "uid": 1, "item_type": "tt_content", "record_uid": 42, "root_id": 1, "page_id": 1, "changed": 10 },
        { "uid": 2, "item_type": "tt_content", "record_uid": 42, "root_id": 99, "changed": 20 }
    ]);
    let snapshot = snapshot(json!([en_de_site()]), records(&[], 0), queue);
    let factory = Arc::new(RecordingFactory::new());
    let deps = dependencies(snapshot.clone(), factory.clone());

    let summary = deps.indexer.process_queue(10).await.unwrap();

    assert_eq!(summary.processed, 2);
    assert_eq!(summary.indexed, 1);
    assert_eq!(summary.failed, 1);

    let states: BTreeMap<u64, (ItemState, Option<String>)> = snapshot
        .queue_items()
        .into_iter()
        .map(|item| (item.uid, (item.state, item.error)))
        .collect();
    assert_eq!(states[&1].0, ItemState::Indexed);
    assert_eq!(states[&2].0, ItemState::Blocked);
    assert!(states[&2].1.as_deref().unwrap().contains("site 99"));

    // Nothing is pending any more.
    let again = deps.indexer.process_queue(10).await.unwrap();
    assert_eq!(again.processed, 0);
}

#[tokio::test]
async fn test_strict_site_enumeration_fails_on_broken_site() {
    let broken = json!({
        "root_id": 1,
        "identifier": "main",
        "default_language": 7,
        "languages": [{ "id": 0, "connection": connection("main_en") }]
    });
    let snapshot = snapshot(json!([broken]), records(&[], 0), json!([]));

    let lenient = SiteDirectory::new(snapshot.clone(), snapshot.clone());
    assert!(lenient.available_sites().await.unwrap().is_empty());

    let strict = SiteDirectory::new(snapshot.clone(), snapshot).with_mode(SiteResolutionMode::Strict);
    assert!(matches!(
        strict.available_sites().await,
        Err(IndexerError::SiteInitialization { root_id: 1, .. })
    ));
}

#[tokio::test]
async fn test_check_connections_reports_unreachable_cores() {
    let snapshot = snapshot(json!([en_de_site()]), records(&[], 0), json!([]));
    let factory = Arc::new(RecordingFactory::rejecting("main_de"));
    let deps = dependencies(snapshot, factory);

    let unreachable = deps.check_connections().await.unwrap();

    assert_eq!(unreachable, vec!["main_de".to_string()]);
    assert_eq!(deps.registry.len(), 2);
}
