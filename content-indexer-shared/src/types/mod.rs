//! This module defines the core data structures and types used across the
//! content indexer.

pub mod connection_config;
pub mod document;
pub mod field_mapping;
pub mod item;
pub mod record;
pub mod site;

/// Numeric identifier of a configured site language.
pub type LanguageId = u32;

/// The language every site starts out with.
pub const DEFAULT_LANGUAGE: LanguageId = 0;
