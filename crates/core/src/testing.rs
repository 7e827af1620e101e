//! In-memory collaborators for unit tests.

use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;

use crate::Error;
use crate::ports::{Document, DocumentSource, ExternalCache, FieldValue, SaveOptions, SiteRecord, SiteStore};

/// Document source backed by a fixed page list, counting lookups.
#[derive(Debug, Default)]
pub(crate) struct FakeDocuments {
    pages: Vec<Document>,
    fail: bool,
    calls: AtomicUsize,
}

impl FakeDocuments {
    pub(crate) fn with(pages: Vec<Document>) -> Self {
        Self { pages, ..Default::default() }
    }

    pub(crate) fn failing() -> Self {
        Self { fail: true, ..Default::default() }
    }

    pub(crate) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl DocumentSource for FakeDocuments {
    async fn find_page(&self, id: i64) -> Result<Option<Document>, Error> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(Error::Document("document tree unavailable".to_string()));
        }
        Ok(self.pages.iter().find(|page| page.id == id).cloned())
    }
}

/// Site store backed by a record list, counting lookups.
#[derive(Debug, Default)]
pub(crate) struct FakeStore {
    records: Vec<SiteRecord>,
    fail: bool,
    calls: AtomicUsize,
}

impl FakeStore {
    pub(crate) fn with(records: Vec<SiteRecord>) -> Self {
        Self { records, ..Default::default() }
    }

    pub(crate) fn failing() -> Self {
        Self { fail: true, ..Default::default() }
    }

    pub(crate) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn find(&self, matches: impl Fn(&SiteRecord) -> bool) -> Result<Option<SiteRecord>, Error> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(Error::Store("connection refused".to_string()));
        }
        Ok(self.records.iter().find(|record| matches(record)).cloned())
    }
}

#[async_trait]
impl SiteStore for FakeStore {
    async fn find_by_id(&self, id: i64) -> Result<Option<SiteRecord>, Error> {
        self.find(|record| record.id == id)
    }

    async fn find_by_root_id(&self, root_id: i64) -> Result<Option<SiteRecord>, Error> {
        self.find(|record| record.root_id == root_id)
    }

    async fn find_by_domain(&self, domain: &str) -> Result<Option<SiteRecord>, Error> {
        self.find(|record| match &record.domains {
            FieldValue::Value(domains) => domains.iter().any(|d| d == domain),
            FieldValue::Serialized(_) => false,
        })
    }
}

/// Shared cache whose every operation fails.
#[derive(Debug, Default)]
pub(crate) struct BrokenCache;

#[async_trait]
impl ExternalCache for BrokenCache {
    async fn load(&self, _key: &str) -> Result<Option<String>, Error> {
        Err(Error::Database(tokio_rusqlite::Error::ConnectionClosed))
    }

    async fn save(&self, _key: &str, _value: &str, _opts: &SaveOptions) -> Result<(), Error> {
        Err(Error::Database(tokio_rusqlite::Error::ConnectionClosed))
    }

    async fn clear_tag(&self, _tag: &str) -> Result<u64, Error> {
        Err(Error::Database(tokio_rusqlite::Error::ConnectionClosed))
    }

    async fn trim(&self, _max_entries: usize) -> Result<u64, Error> {
        Err(Error::Database(tokio_rusqlite::Error::ConnectionClosed))
    }
}

pub(crate) fn record(id: i64, domains: &[&str], root_id: i64) -> SiteRecord {
    SiteRecord {
        id,
        domains: FieldValue::Value(domains.iter().map(|d| d.to_string()).collect()),
        root_id,
        main_domain: domains.first().map(|d| d.to_string()).unwrap_or_default(),
        ..Default::default()
    }
}
