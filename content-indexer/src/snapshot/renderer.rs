//! Renderer for computed fields backed by a content snapshot.

use std::sync::Arc;

use async_trait::async_trait;
use content_indexer_shared::{ComputedKind, FieldMapping, FieldSource, Record, RelationDescriptor};
use regex::Regex;
use serde_json::{Map, Value};
use tracing::warn;

use crate::errors::IndexerError;
use crate::interfaces::{ContentRenderer, RenderContext};
use crate::snapshot::ContentSnapshot;

/// Field read by `SOLR_CONTENT` and `SOLR_MULTIVALUE` when none is configured.
const DEFAULT_CONTENT_FIELD: &str = "bodytext";

/// Label column of related records when none is configured.
const DEFAULT_LABEL_FIELD: &str = "title";

/// Evaluates `SOLR_CONTENT`, `SOLR_MULTIVALUE`, `SOLR_RELATION` and `TEXT`.
pub struct SnapshotRenderer {
    snapshot: Arc<ContentSnapshot>,
    tags: Regex,
    whitespace: Regex,
}

impl SnapshotRenderer {
    pub fn new(snapshot: Arc<ContentSnapshot>) -> Result<Self, IndexerError> {
        let compile = |pattern: &str| {
            Regex::new(pattern).map_err(|e| {
                IndexerError::collaborator(format!("Invalid pattern '{}': {}", pattern, e))
            })
        };
        Ok(Self {
            snapshot,
            tags: compile(r"<[^>]*>")?,
            whitespace: compile(r"\s+")?,
        })
    }

    /// Strip markup and collapse whitespace.
    pub fn clean_content(&self, html: &str) -> String {
        let text = self.tags.replace_all(html, " ");
        let text = text
            .replace("&nbsp;", " ")
            .replace("&lt;", "<")
            .replace("&gt;", ">")
            .replace("&quot;", "\"")
            .replace("&#039;", "'")
            .replace("&amp;", "&");
        self.whitespace.replace_all(&text, " ").trim().to_string()
    }

    fn content(&self, config: &Map<String, Value>, record: &Record) -> Option<String> {
        let field = config_str(config, "field").unwrap_or(DEFAULT_CONTENT_FIELD);
        let content = self.clean_content(&record.get_string(field)?);
        (!content.is_empty()).then_some(content)
    }

    fn multivalue(config: &Map<String, Value>, record: &Record) -> Option<String> {
        let field = config_str(config, "field").unwrap_or(DEFAULT_CONTENT_FIELD);
        let separator = config_str(config, "separator").unwrap_or(",");
        let values: Vec<&str> = match record.get(field)? {
            Value::Array(items) => items.iter().filter_map(Value::as_str).collect(),
            Value::String(raw) => raw
                .split(separator)
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .collect(),
            _ => return None,
        };
        serde_json::to_string(&values).ok()
    }

    fn text(config: &Map<String, Value>, record: &Record) -> Option<String> {
        config_str(config, "field")
            .and_then(|field| record.get_string(field))
            .or_else(|| config_str(config, "value").map(str::to_string))
    }

    fn relation(
        &self,
        relation: &RelationDescriptor,
        record: &Record,
        context: &RenderContext,
    ) -> Option<String> {
        let raw = record.get_string(&relation.local_field)?;
        let references = raw.split(',').map(str::trim).filter(|v| !v.is_empty());

        let labels: Vec<String> = match &relation.foreign_table {
            Some(table) => {
                let label_field = relation
                    .foreign_label_field
                    .as_deref()
                    .unwrap_or(DEFAULT_LABEL_FIELD);
                references
                    .filter_map(|reference| reference.parse::<u64>().ok())
                    .filter_map(|uid| {
                        let base = self.snapshot.lookup(table, uid)?;
                        let overlay = self
                            .snapshot
                            .lookup_overlay(table, uid, context.content_language);
                        let related = match overlay {
                            Some(overlay) => base.overlaid_with(&overlay),
                            None => base.clone(),
                        };
                        related.get_string(label_field)
                    })
                    .collect()
            }
            None => references.map(str::to_string).collect(),
        };

        if labels.is_empty() {
            None
        } else if relation.multi_value {
            serde_json::to_string(&labels).ok()
        } else {
            Some(labels.join(", "))
        }
    }
}

#[async_trait]
impl ContentRenderer for SnapshotRenderer {
    async fn render(
        &self,
        mapping: &FieldMapping,
        record: &Record,
        context: &RenderContext,
    ) -> Result<Option<String>, IndexerError> {
        let rendered = match &mapping.source {
            FieldSource::Literal { path } => record.get_string(path),
            FieldSource::Relation(relation) => self.relation(relation, record, context),
            FieldSource::Computed { kind, config } => match kind {
                ComputedKind::Content => self.content(config, record),
                ComputedKind::Multivalue => Self::multivalue(config, record),
                ComputedKind::Text => Self::text(config, record),
                ComputedKind::Relation => {
                    warn!(field = %mapping.name, "Relation mapping without descriptor");
                    None
                }
                ComputedKind::Other(name) => {
                    warn!(field = %mapping.name, kind = %name, "Unsupported content object");
                    None
                }
            },
        };
        Ok(rendered)
    }
}

fn config_str<'a>(config: &'a Map<String, Value>, key: &str) -> Option<&'a str> {
    config.get(key).and_then(Value::as_str)
}
