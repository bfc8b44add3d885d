//! Interfaces of the external collaborators the indexer depends on.
//!
//! The indexer never talks to the host platform directly: content, site
//! configuration, the queue and the rendering of computed values all come
//! through these traits.

mod configuration_tree;
mod content_repository;
mod extensions;
mod index_queue;
mod rendering;

pub use configuration_tree::{ConfigurationTree, SiteConfiguration};
pub use content_repository::ContentRepository;
pub use extensions::{DocumentContributor, DocumentsModifier};
pub use index_queue::IndexQueue;
pub use rendering::{ContentRenderer, RenderContext, SerializedValueDetector};
