//! Error types for the content indexer repository.
//!
//! This module provides a unified error type for all search core operations.

mod search_core_error;

pub use search_core_error::SearchCoreError;
