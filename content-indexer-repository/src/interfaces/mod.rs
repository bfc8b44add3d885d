//! Interface definitions for search core connections.
//!
//! A connection exposes three capabilities (read, write, admin) as separate
//! traits so callers only depend on what they use, and a factory trait lets
//! the registry build connections without knowing the backend.

mod connection_factory;
mod core_capabilities;

pub use connection_factory::ConnectionFactory;
pub use core_capabilities::{CoreAdmin, CoreReader, CoreWriter};
