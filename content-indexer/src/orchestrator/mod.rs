//! Orchestrator module for the content indexer.
//!
//! Drives one indexing attempt per queue item: resolve the item's site and
//! connections, build documents per language, submit them, and aggregate a
//! single verdict.

use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;

use chrono::Utc;
use content_indexer_repository::DeleteQuery;
use content_indexer_shared::{Item, LanguageId, Site};
use tracing::{debug, error, info, instrument, warn};

use crate::errors::IndexerError;
use crate::interfaces::IndexQueue;
use crate::language::{ConnectionLookup, LanguageFallbackResolver};
use crate::loader::DocumentLoader;
use crate::processor::{DocumentBuilder, DocumentSourceRegistry};
use crate::site::SiteDirectory;

/// What happened to one language of an item.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LanguageOutcome {
    /// Documents were accepted by the language's core.
    Indexed { documents: usize },
    /// The language had nothing to index. Counts as success.
    Skipped,
}

/// Per-language outcomes of a successful attempt.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IndexReport {
    pub outcomes: BTreeMap<LanguageId, LanguageOutcome>,
}

impl IndexReport {
    /// Total number of documents submitted across languages.
    pub fn documents(&self) -> usize {
        self.outcomes
            .values()
            .map(|outcome| match outcome {
                LanguageOutcome::Indexed { documents } => *documents,
                LanguageOutcome::Skipped => 0,
            })
            .sum()
    }

    pub fn skipped(&self) -> Vec<LanguageId> {
        self.outcomes
            .iter()
            .filter(|(_, outcome)| **outcome == LanguageOutcome::Skipped)
            .map(|(language, _)| *language)
            .collect()
    }
}

/// Counters of one queue run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct QueueRunSummary {
    pub processed: usize,
    pub indexed: usize,
    pub failed: usize,
}

/// Indexes queue items into their sites' search cores.
pub struct Indexer {
    sites: Arc<SiteDirectory>,
    resolver: LanguageFallbackResolver,
    sources: DocumentSourceRegistry,
    builder: DocumentBuilder,
    loader: DocumentLoader,
    queue: Arc<dyn IndexQueue>,
}

impl Indexer {
    pub fn new(
        sites: Arc<SiteDirectory>,
        resolver: LanguageFallbackResolver,
        sources: DocumentSourceRegistry,
        builder: DocumentBuilder,
        loader: DocumentLoader,
        queue: Arc<dyn IndexQueue>,
    ) -> Self {
        Self {
            sites,
            resolver,
            sources,
            builder,
            loader,
            queue,
        }
    }

    pub fn sites(&self) -> &SiteDirectory {
        &self.sites
    }

    /// Make one indexing attempt for an item.
    ///
    /// Languages are processed in ascending order. The first error aborts
    /// the attempt; languages already submitted keep their documents.
    ///
    /// # Returns
    ///
    /// * `Ok(IndexReport)` - Every applicable language was indexed or skipped
    /// * `Err(IndexerError)` - The item could not be resolved, built or
    ///   submitted
    #[instrument(skip(self, item), fields(item_uid = item.uid, item_type = %item.item_type, record_uid = item.record_uid, root_id = item.root_id))]
    pub async fn try_index_item(&self, item: &Item) -> Result<IndexReport, IndexerError> {
        let site = self.resolve_site(item.root_id).await?;
        let connections = self.resolver.connections_for_item(&site, item).await?;

        let source = self.sources.source_for(&item.item_type);
        let spec = source.field_spec(item).await?;
        spec.validate()?;

        let indexed_at = Utc::now();
        let mut report = IndexReport::default();

        for (language, resolved) in connections {
            let outcome = match source.to_record(item, &site, &resolved.plan).await? {
                None => LanguageOutcome::Skipped,
                Some(record) => {
                    let documents = self
                        .builder
                        .build(&site, item, &resolved.plan, &record, &spec, indexed_at)
                        .await?;
                    if documents.is_empty() {
                        LanguageOutcome::Skipped
                    } else {
                        let summary = self.loader.submit(&resolved.connection, &documents).await?;
                        LanguageOutcome::Indexed {
                            documents: summary.accepted,
                        }
                    }
                }
            };

            debug!(
                language,
                content_language = resolved.plan.content,
                core = %resolved.connection.core_name(),
                outcome = ?outcome,
                "Language processed"
            );
            report.outcomes.insert(language, outcome);
        }

        Ok(report)
    }

    /// Index an item and record the verdict on it.
    ///
    /// Returns `true` when every applicable language was indexed or skipped.
    pub async fn index_item(&self, item: &mut Item) -> bool {
        match self.try_index_item(item).await {
            Ok(report) => {
                item.mark_indexed(Utc::now());
                info!(
                    item_uid = item.uid,
                    item_type = %item.item_type,
                    record_uid = item.record_uid,
                    documents = report.documents(),
                    skipped = ?report.skipped(),
                    "Item indexed"
                );
                true
            }
            Err(e) => {
                item.mark_blocked(e.to_string(), Utc::now());
                error!(
                    item_uid = item.uid,
                    item_type = %item.item_type,
                    record_uid = item.record_uid,
                    error = %e,
                    "Failed to index item"
                );
                false
            }
        }
    }

    /// Delete an item's documents from every core of its site.
    ///
    /// Cores shared by several languages are cleared once. Languages with a
    /// missing or malformed connection are left out.
    #[instrument(skip(self, item), fields(item_type = %item.item_type, record_uid = item.record_uid, root_id = item.root_id))]
    pub async fn remove_item(&self, item: &Item) -> Result<u64, IndexerError> {
        let site = self.resolve_site(item.root_id).await?;
        let query = DeleteQuery::for_record(&site.site_hash, &item.item_type, item.record_uid);

        let mut seen = HashSet::new();
        let mut deleted = 0;
        for language in site.available_language_ids() {
            let connection = match self.resolver.lookup(&site, language) {
                Ok(ConnectionLookup::Found(connection)) => connection,
                Ok(ConnectionLookup::Skipped) => continue,
                Err(e) => {
                    warn!(language, error = %e, "Ignoring language with invalid connection");
                    continue;
                }
            };
            if seen.insert(connection.identity_hash().to_string()) {
                deleted += self.loader.remove(&connection, &query).await?;
            }
        }

        info!(deleted, "Item removed");
        Ok(deleted)
    }

    /// Index up to `limit` pending items and report each verdict to the queue.
    ///
    /// Starts a new site resolution cycle first, so configuration changes
    /// between runs are picked up.
    #[instrument(skip(self))]
    pub async fn process_queue(&self, limit: usize) -> Result<QueueRunSummary, IndexerError> {
        self.sites.begin_cycle();

        let items = self.queue.pending_items(limit).await?;
        let mut summary = QueueRunSummary::default();

        for mut item in items {
            summary.processed += 1;
            if self.index_item(&mut item).await {
                summary.indexed += 1;
                self.queue.mark_indexed(&item).await?;
            } else {
                summary.failed += 1;
                self.queue.mark_failed(&item).await?;
            }
        }

        info!(
            processed = summary.processed,
            indexed = summary.indexed,
            failed = summary.failed,
            "Queue run finished"
        );
        Ok(summary)
    }

    async fn resolve_site(&self, root_id: u64) -> Result<Arc<Site>, IndexerError> {
        self.sites
            .site_for_root(root_id)
            .await?
            .ok_or_else(|| IndexerError::site_initialization(root_id, "no site configured for root"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_report_counts_documents_and_skips() {
        let mut report = IndexReport::default();
        report
            .outcomes
            .insert(0, LanguageOutcome::Indexed { documents: 2 });
        report.outcomes.insert(1, LanguageOutcome::Skipped);
        report
            .outcomes
            .insert(3, LanguageOutcome::Indexed { documents: 1 });

        assert_eq!(report.documents(), 3);
        assert_eq!(report.skipped(), vec![1]);
    }

    #[test]
    fn test_empty_report() {
        let report = IndexReport::default();
        assert_eq!(report.documents(), 0);
        assert!(report.skipped().is_empty());
    }
}
