//! # Content Indexer Shared
//!
//! This crate defines shared data structures and types used across the content
//! indexer ecosystem: sites and their languages, connection configurations,
//! queue items, raw content records, field mappings and the documents that are
//! submitted to the search engine.

pub mod errors;
pub mod types;

pub use errors::ModelError;
pub use types::connection_config::{ConnectionConfig, Credentials};
pub use types::document::{Document, FieldValue};
pub use types::field_mapping::{
    ComputedKind, FieldMapping, FieldMappingSpec, FieldSource, FieldType, ProcessingInstruction,
    RelationDescriptor,
};
pub use types::item::{Item, ItemState};
pub use types::record::Record;
pub use types::site::{FallbackType, Site, SiteLanguage};
pub use types::{LanguageId, DEFAULT_LANGUAGE};
