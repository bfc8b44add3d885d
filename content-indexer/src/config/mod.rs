//! Configuration module for the content indexer.
//! Reads settings from the environment and wires the indexer's dependencies.
mod dependencies;

pub use dependencies::{Dependencies, Settings};
