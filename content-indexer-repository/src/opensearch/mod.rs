//! OpenSearch implementation of the search core capabilities.
//!
//! One [`OpenSearchCore`] is bound to one index; the
//! [`OpenSearchConnectionFactory`] builds them for the connection registry.

mod factory;
mod provider;

pub use factory::OpenSearchConnectionFactory;
pub use provider::OpenSearchCore;
