//! Collaborator interfaces consumed by the registry.
//!
//! Persistence and the document tree live outside this crate; the shared
//! lookup cache has a SQLite adapter in [`crate::cache`].

use std::collections::BTreeMap;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::Error;

/// Raw site fields as returned by the persistence layer.
///
/// `domains` and `localized_error_documents` may arrive as structured values
/// or in their serialized text form; hydration decodes the latter.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SiteRecord {
    pub id: i64,
    pub domains: FieldValue<Vec<String>>,
    pub root_id: i64,
    pub root_path: Option<String>,
    pub main_domain: String,
    pub error_document: String,
    pub localized_error_documents: FieldValue<BTreeMap<String, String>>,
    pub redirect_to_main_domain: bool,
    pub creation_date: Option<i64>,
    pub modification_date: Option<i64>,
}

/// A field that is either already structured or still in serialized text form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue<T> {
    Value(T),
    Serialized(String),
}

impl<T: Default> Default for FieldValue<T> {
    fn default() -> Self {
        FieldValue::Value(T::default())
    }
}

/// A content node as seen by the site model: its id and resolved path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    pub id: i64,
    pub real_full_path: String,
}

/// Persistence lookups for sites. `Ok(None)` is a miss, `Err` a backend failure.
#[async_trait]
pub trait SiteStore: Send + Sync {
    async fn find_by_id(&self, id: i64) -> Result<Option<SiteRecord>, Error>;

    async fn find_by_root_id(&self, root_id: i64) -> Result<Option<SiteRecord>, Error>;

    async fn find_by_domain(&self, domain: &str) -> Result<Option<SiteRecord>, Error>;
}

/// Page lookups in the document tree.
#[async_trait]
pub trait DocumentSource: Send + Sync {
    /// Resolve a page by id. `Ok(None)` when no such page exists.
    async fn find_page(&self, id: i64) -> Result<Option<Document>, Error>;
}

/// Options attached to a write into the shared cache.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SaveOptions {
    /// Labels for bulk invalidation.
    pub tags: Vec<String>,
    /// `None` keeps the entry until invalidated or evicted.
    pub ttl: Option<Duration>,
    /// Eviction weight; lower priorities are evicted first.
    pub priority: i64,
}

/// Shared key-value cache with tag-based invalidation.
///
/// Values are opaque strings; entries are written whole and the last
/// writer wins.
#[async_trait]
pub trait ExternalCache: Send + Sync {
    /// Load a live entry. Expired entries read as a miss.
    async fn load(&self, key: &str) -> Result<Option<String>, Error>;

    /// Store `value` under `key`, replacing any previous entry and its tags.
    async fn save(&self, key: &str, value: &str, opts: &SaveOptions) -> Result<(), Error>;

    /// Remove every entry carrying `tag`. Returns the number removed.
    async fn clear_tag(&self, tag: &str) -> Result<u64, Error>;

    /// Evict entries until at most `max_entries` remain, lowest priority first.
    /// Returns the number removed.
    async fn trim(&self, max_entries: usize) -> Result<u64, Error>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_value_accepts_both_forms() {
        let structured: FieldValue<Vec<String>> = serde_json::from_str(r#"["a.com","b.com"]"#).unwrap();
        assert_eq!(structured, FieldValue::Value(vec!["a.com".to_string(), "b.com".to_string()]));

        let text: FieldValue<Vec<String>> = serde_json::from_str(r#""[\"a.com\"]""#).unwrap();
        assert_eq!(text, FieldValue::Serialized(r#"["a.com"]"#.to_string()));
    }

    #[test]
    fn test_record_default() {
        let record = SiteRecord::default();
        assert_eq!(record.domains, FieldValue::Value(Vec::new()));
        assert!(!record.redirect_to_main_domain);
        assert!(record.creation_date.is_none());
    }
}
