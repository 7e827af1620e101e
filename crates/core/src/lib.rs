//! Site registry: domain-to-root-document records and their cached lookups.
//!
//! This crate provides:
//! - The `Site` record and its creation rules
//! - Lookups by id, root id and domain through a request-scoped cache,
//!   a shared SQLite-backed cache and a persistence port
//! - Per-request context carrying the current site
//! - Unified error types
//! - Configuration structures

pub mod cache;
pub mod config;
pub mod context;
pub mod error;
pub mod ports;
pub mod registry;
pub mod site;

#[cfg(test)]
mod testing;

pub use cache::CacheDb;
pub use config::RegistryConfig;
pub use context::{RequestContext, RuntimeCache};
pub use error::Error;
pub use ports::{Document, DocumentSource, ExternalCache, SiteRecord, SiteStore};
pub use registry::{CachePolicy, Lookup, SiteRef, SiteRegistry};
pub use site::{Site, SiteData};
