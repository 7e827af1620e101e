//! SQLite-backed shared cache for site lookups.
//!
//! This module provides the external tier of the lookup cache using SQLite
//! with async access via tokio-rusqlite. It supports:
//!
//! - Whole-entry writes with optional TTL and an eviction priority
//! - Tag-based bulk invalidation
//! - Automatic schema migrations
//! - WAL mode for concurrent access across processes

pub mod connection;
pub mod entries;
pub mod hash;
pub mod migrations;

pub use crate::Error;

pub use connection::CacheDb;
pub use hash::{site_domain_key, site_id_key};
