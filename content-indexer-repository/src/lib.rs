//! # Content Indexer Repository
//!
//! This crate provides the search-engine side of the content indexer: the
//! read, write and admin capability traits of a core connection, the
//! process-wide [`ConnectionRegistry`] that hands out one connection per
//! configuration hash, and a concrete implementation for OpenSearch.

pub mod connection;
pub mod errors;
pub mod interfaces;
pub mod opensearch;
pub mod registry;
pub mod types;
pub mod utils;

pub use connection::CoreConnection;
pub use errors::SearchCoreError;
pub use interfaces::{ConnectionFactory, CoreAdmin, CoreReader, CoreWriter};
pub use opensearch::{OpenSearchConnectionFactory, OpenSearchCore};
pub use registry::ConnectionRegistry;
pub use types::{CoreInfo, DeleteQuery, WriteSummary};
pub use utils::extract_error_message;
