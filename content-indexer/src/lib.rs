//! # Content Indexer
//!
//! Keeps the search cores of a multi-site, multi-language CMS in sync with its
//! content.
//!
//! ## Architecture
//!
//! The indexer handles one queue item at a time:
//!
//! 1. **Sites**: Resolve the item's site, languages and connection settings
//! 2. **Languages**: Decide which languages apply and which core each goes to
//! 3. **Processor**: Build the documents of each applicable language
//! 4. **Loader**: Submit the documents to the language's core
//! 5. **Orchestrator**: Aggregate one verdict per item and report it to the queue
//!
//! ## Modules
//!
//! - [`config`]: Settings and dependency wiring
//! - [`interfaces`]: Host platform collaborators (content, configuration, queue, rendering)
//! - [`site`]: Site enumeration and caching
//! - [`language`]: Language fallback and connection resolution
//! - [`processor`]: Field resolution and document building
//! - [`loader`]: Document submission and removal
//! - [`orchestrator`]: The per-item indexing state machine
//! - [`snapshot`]: Collaborators backed by a JSON content export
//! - [`errors`]: Error types for the indexer

pub mod config;
pub mod errors;
pub mod interfaces;
pub mod language;
pub mod loader;
pub mod orchestrator;
pub mod processor;
pub mod site;
pub mod snapshot;

pub use config::{Dependencies, Settings};
pub use errors::IndexerError;
pub use orchestrator::{IndexReport, Indexer, LanguageOutcome, QueueRunSummary};

use thiserror::Error;

/// Errors that can occur during start-up or a queue run of the binary.
#[derive(Error, Debug)]
pub enum ServiceError {
    /// Configuration error.
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Indexer error.
    #[error("Indexer error: {0}")]
    IndexerError(#[from] IndexerError),
}

impl ServiceError {
    /// Create a configuration error.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::ConfigError(msg.into())
    }
}
