//! Processor module: turns queue items into search documents.
//!
//! - [`FieldResolver`] evaluates a field mapping against a record
//! - [`DocumentBuilder`] assembles base documents and supplementary documents
//! - [`DocumentSource`] supplies the record and field mapping for an item type

mod document_builder;
mod document_source;
mod field_resolver;

pub use document_builder::{DocumentBuilder, CONTENT_VIRTUAL_FIELD};
pub use document_source::{DocumentSource, DocumentSourceRegistry, RecordDocumentSource};
pub use field_resolver::{coerce, FieldResolver};

use chrono::{DateTime, SecondsFormat, Utc};

/// Format a Unix timestamp as an ISO-8601 UTC date, e.g. `2024-03-01T12:00:00Z`.
pub(crate) fn iso_date(timestamp: i64) -> Option<String> {
    DateTime::<Utc>::from_timestamp(timestamp, 0)
        .map(|date| date.to_rfc3339_opts(SecondsFormat::Secs, true))
}
