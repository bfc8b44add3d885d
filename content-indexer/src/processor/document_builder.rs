//! Document assembly.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use content_indexer_shared::types::document::{
    FIELD_ACCESS, FIELD_CHANGED, FIELD_CONTENT, FIELD_CREATED, FIELD_ID, FIELD_INDEXED_AT,
    FIELD_LANGUAGE, FIELD_PID, FIELD_SITE, FIELD_SITE_HASH, FIELD_TYPE, FIELD_UID,
};
use content_indexer_shared::{
    Document, FieldMappingSpec, FieldValue, Item, LanguageId, Record, Site,
};
use tracing::{debug, instrument};

use crate::errors::IndexerError;
use crate::interfaces::{DocumentContributor, DocumentsModifier, RenderContext};
use crate::language::LanguagePlan;
use crate::processor::{iso_date, FieldResolver};

/// Virtual record field carrying the document's resolved full-text content.
pub const CONTENT_VIRTUAL_FIELD: &str = "__solr_content";

/// Builds the documents of one item in one language.
pub struct DocumentBuilder {
    field_resolver: FieldResolver,
    contributors: Vec<Arc<dyn DocumentContributor>>,
    modifiers: Vec<Arc<dyn DocumentsModifier>>,
}

impl DocumentBuilder {
    pub fn new(field_resolver: FieldResolver) -> Self {
        Self {
            field_resolver,
            contributors: Vec::new(),
            modifiers: Vec::new(),
        }
    }

    pub fn with_contributor(mut self, contributor: Arc<dyn DocumentContributor>) -> Self {
        self.contributors.push(contributor);
        self
    }

    pub fn with_modifier(mut self, modifier: Arc<dyn DocumentsModifier>) -> Self {
        self.modifiers.push(modifier);
        self
    }

    /// Id of an item's document in one language:
    /// `{site_hash}/{type}/{uid}/{language}`.
    ///
    /// Languages sharing a core keep separate documents.
    pub fn document_id(site: &Site, item: &Item, language: LanguageId) -> String {
        format!(
            "{}/{}/{}/{}",
            site.site_hash, item.item_type, item.record_uid, language
        )
    }

    /// Identity, access and timestamp fields every document carries.
    pub fn base_document(
        site: &Site,
        item: &Item,
        plan: &LanguagePlan,
        record: &Record,
        indexed_at: DateTime<Utc>,
    ) -> Document {
        let mut document = Document::new();
        document.set_field(FIELD_ID, Self::document_id(site, item, plan.target));
        document.set_field(FIELD_SITE, site.identifier.as_str());
        document.set_field(FIELD_SITE_HASH, site.site_hash.as_str());
        document.set_field(FIELD_TYPE, item.item_type.as_str());
        document.set_field(FIELD_UID, item.record_uid);
        document.set_field(
            FIELD_PID,
            record
                .get_i64("pid")
                .unwrap_or_else(|| i64::try_from(item.page_id).unwrap_or_default()),
        );
        document.set_field(FIELD_LANGUAGE, i64::from(plan.target));
        document.set_field(FIELD_ACCESS, access_rootline(record));

        if let Some(created) = record.get_i64("crdate").and_then(iso_date) {
            document.set_field(FIELD_CREATED, created);
        }
        let changed = record.get_i64("tstamp").unwrap_or(item.changed);
        if changed > 0 {
            if let Some(changed) = iso_date(changed) {
                document.set_field(FIELD_CHANGED, changed);
            }
        }
        document.set_field(
            FIELD_INDEXED_AT,
            iso_date(indexed_at.timestamp()).unwrap_or_default(),
        );

        document
    }

    /// Build every document for `record` in the language described by `plan`.
    ///
    /// The base document comes first, followed by contributed documents; the
    /// registered modifiers then see the whole list.
    ///
    /// # Returns
    ///
    /// * `Ok(Vec<Document>)` - The documents to submit, possibly empty
    /// * `Err(IndexerError::InvalidFieldName)` - The mapping targets `type`
    #[instrument(skip_all, fields(item_type = %item.item_type, uid = item.record_uid, language = plan.target))]
    pub async fn build(
        &self,
        site: &Site,
        item: &Item,
        plan: &LanguagePlan,
        record: &Record,
        spec: &FieldMappingSpec,
        indexed_at: DateTime<Utc>,
    ) -> Result<Vec<Document>, IndexerError> {
        spec.validate()?;

        let context = RenderContext {
            root_id: site.root_id,
            item_type: item.item_type.clone(),
            record_uid: item.record_uid,
            language: plan.target,
            content_language: plan.content,
        };
        let mut document = Self::base_document(site, item, plan, record, indexed_at);

        let mut record_view = record.clone();
        if let Some(mapping) = spec.get(FIELD_CONTENT) {
            if let Some(content) = self
                .field_resolver
                .resolve_field(mapping, record, &context)
                .await?
            {
                if let FieldValue::String(text) = &content {
                    record_view = record.with_virtual_field(CONTENT_VIRTUAL_FIELD, text.as_str());
                }
                document.set_field(FIELD_CONTENT, content);
            }
        }

        for mapping in spec.iter().filter(|m| m.name != FIELD_CONTENT) {
            if let Some(value) = self
                .field_resolver
                .resolve_field(mapping, &record_view, &context)
                .await?
            {
                document.set_field(mapping.name.clone(), value);
            }
        }

        let mut documents = vec![document];
        for contributor in &self.contributors {
            let extra = contributor
                .documents(item, plan.target, &documents[0])
                .await?;
            documents.extend(extra);
        }
        for modifier in &self.modifiers {
            documents = modifier.modify(item, plan.target, documents).await?;
        }

        debug!(documents = documents.len(), "Built documents");
        Ok(documents)
    }
}

/// Access field of a record: `r:0` when public, else `r:` and its groups.
fn access_rootline(record: &Record) -> String {
    let groups: Vec<String> = record
        .get_string("fe_group")
        .unwrap_or_default()
        .split(',')
        .map(str::trim)
        .filter(|g| !g.is_empty() && *g != "0")
        .map(str::to_string)
        .collect();

    if groups.is_empty() {
        "r:0".to_string()
    } else {
        format!("r:{}", groups.join(","))
    }
}
