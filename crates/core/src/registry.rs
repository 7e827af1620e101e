//! Site lookups by id, root id and domain.
//!
//! Id and domain lookups go through three tiers: the request-scoped cache in
//! [`RequestContext`], the shared [`ExternalCache`], then the [`SiteStore`].
//! Misses are cached too, as [`Lookup::NotFound`], so a domain that matches
//! no site does not cost a persistence round-trip on every request.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, error, warn};

use crate::Error;
use crate::cache::{CacheDb, site_domain_key, site_id_key};
use crate::config::RegistryConfig;
use crate::context::RequestContext;
use crate::ports::{DocumentSource, ExternalCache, SaveOptions, SiteRecord, SiteStore};
use crate::site::{Site, SiteData};

/// Tag carried by every cached site lookup; cleared by [`SiteRegistry::clear_dependent_cache`].
pub const SITE_TAG: &str = "site";
/// Tag shared with other system-level cache entries.
pub const SYSTEM_TAG: &str = "system";

/// Outcome of a lookup as stored in the shared cache.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", content = "site", rename_all = "snake_case")]
pub enum Lookup {
    Found(Site),
    NotFound,
}

impl Lookup {
    /// The found site, or `None` for a cached miss.
    pub fn into_site(self) -> Option<Site> {
        match self {
            Lookup::Found(site) => Some(site),
            Lookup::NotFound => None,
        }
    }
}

/// How a site is referenced by callers.
#[derive(Debug, Clone, PartialEq)]
pub enum SiteRef {
    Id(i64),
    Domain(String),
    Resolved(Site),
}

impl SiteRef {
    /// Numeric text is an id, anything else a domain.
    pub fn parse(text: &str) -> Self {
        match text.trim().parse::<i64>() {
            Ok(id) => SiteRef::Id(id),
            Err(_) => SiteRef::Domain(text.to_string()),
        }
    }
}

impl From<i64> for SiteRef {
    fn from(id: i64) -> Self {
        SiteRef::Id(id)
    }
}

impl From<&str> for SiteRef {
    fn from(domain: &str) -> Self {
        SiteRef::Domain(domain.to_string())
    }
}

impl From<String> for SiteRef {
    fn from(domain: String) -> Self {
        SiteRef::Domain(domain)
    }
}

impl From<Site> for SiteRef {
    fn from(site: Site) -> Self {
        SiteRef::Resolved(site)
    }
}

/// TTL, eviction priority and capacity for shared cache writes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CachePolicy {
    pub found_ttl: Option<Duration>,
    pub not_found_ttl: Option<Duration>,
    pub found_priority: i64,
    pub not_found_priority: i64,
    /// Shared cache is trimmed to this many entries after every write.
    pub max_entries: Option<usize>,
}

impl CachePolicy {
    /// Policy matching the cache settings of `config`.
    pub fn from_config(config: &RegistryConfig) -> Self {
        Self {
            found_ttl: config.found_ttl(),
            not_found_ttl: config.not_found_ttl(),
            found_priority: config.found_priority,
            not_found_priority: config.not_found_priority,
            max_entries: config.max_cache_entries,
        }
    }

    fn save_options(&self, lookup: &Lookup) -> SaveOptions {
        let (ttl, priority) = match lookup {
            Lookup::Found(_) => (self.found_ttl, self.found_priority),
            Lookup::NotFound => (self.not_found_ttl, self.not_found_priority),
        };
        SaveOptions { tags: vec![SYSTEM_TAG.to_string(), SITE_TAG.to_string()], ttl, priority }
    }
}

impl Default for CachePolicy {
    fn default() -> Self {
        Self::from_config(&RegistryConfig::default())
    }
}

/// Resolves sites through the request, shared and persistence tiers.
#[derive(Clone)]
pub struct SiteRegistry {
    store: Arc<dyn SiteStore>,
    documents: Arc<dyn DocumentSource>,
    cache: Arc<dyn ExternalCache>,
    policy: CachePolicy,
}

impl std::fmt::Debug for SiteRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SiteRegistry").field("policy", &self.policy).finish_non_exhaustive()
    }
}

impl SiteRegistry {
    /// Registry with the default cache policy.
    pub fn new(store: Arc<dyn SiteStore>, documents: Arc<dyn DocumentSource>, cache: Arc<dyn ExternalCache>) -> Self {
        Self { store, documents, cache, policy: CachePolicy::default() }
    }

    /// Replace the cache policy.
    pub fn with_policy(mut self, policy: CachePolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Open the SQLite shared cache named by `config` and build a registry on it.
    ///
    /// Expired entries are purged and `max_cache_entries` is enforced at open,
    /// then again after every shared cache write.
    ///
    /// # Errors
    ///
    /// Returns an error if the cache database cannot be opened or migrated.
    pub async fn open(
        config: &RegistryConfig, store: Arc<dyn SiteStore>, documents: Arc<dyn DocumentSource>,
    ) -> Result<Self, Error> {
        let cache = CacheDb::open(&config.cache_db_path).await?;
        let expired = cache.purge_expired().await?;
        let evicted = match config.max_cache_entries {
            Some(max_entries) => cache.evict_to_capacity(max_entries).await?,
            None => 0,
        };
        debug!(path = %config.cache_db_path.display(), expired, evicted, "Opened site lookup cache");

        Ok(Self::new(store, documents, Arc::new(cache)).with_policy(CachePolicy::from_config(config)))
    }

    /// The active cache policy.
    pub fn policy(&self) -> &CachePolicy {
        &self.policy
    }

    /// Look up a site by id.
    ///
    /// # Errors
    ///
    /// Propagates store and document source failures. A missing site is `Ok(None)`.
    pub async fn get_by_id(&self, ctx: &mut RequestContext, id: i64) -> Result<Option<Site>, Error> {
        self.cached_lookup(ctx, site_id_key(id), self.store.find_by_id(id)).await
    }

    /// Look up a site by the id of its root document. Not cached.
    ///
    /// # Errors
    ///
    /// Propagates store and document source failures. A missing site is `Ok(None)`.
    pub async fn get_by_root_id(&self, root_id: i64) -> Result<Option<Site>, Error> {
        match self.store.find_by_root_id(root_id).await? {
            Some(record) => Ok(Some(self.hydrate(record).await?)),
            None => Ok(None),
        }
    }

    /// Look up a site by one of its domains.
    ///
    /// Called for every routed request, so results are cached like
    /// [`get_by_id`](Self::get_by_id) under a key derived from the exact domain string.
    ///
    /// # Errors
    ///
    /// Propagates store and document source failures. A missing site is `Ok(None)`.
    pub async fn get_by_domain(&self, ctx: &mut RequestContext, domain: &str) -> Result<Option<Site>, Error> {
        self.cached_lookup(ctx, site_domain_key(domain), self.store.find_by_domain(domain)).await
    }

    /// Dispatch on the reference kind. A resolved site is returned unchanged.
    ///
    /// # Errors
    ///
    /// Same as the underlying lookup.
    pub async fn get_by(&self, ctx: &mut RequestContext, site: SiteRef) -> Result<Option<Site>, Error> {
        match site {
            SiteRef::Id(id) => self.get_by_id(ctx, id).await,
            SiteRef::Domain(domain) => self.get_by_domain(ctx, &domain).await,
            SiteRef::Resolved(site) => Ok(Some(site)),
        }
    }

    /// Validate `data` and build a new, unsaved site.
    ///
    /// # Errors
    ///
    /// See [`Site::create`].
    pub async fn create(&self, data: SiteData) -> Result<Site, Error> {
        Site::create(data, self.documents.as_ref()).await
    }

    /// Drop every shared cache entry tagged `site`. Failures are logged, not returned.
    pub async fn clear_dependent_cache(&self) {
        match self.cache.clear_tag(SITE_TAG).await {
            Ok(cleared) => debug!(cleared, "Cleared site lookup cache"),
            Err(e) => error!(error = %e, tag = SITE_TAG, "Failed to clear site lookup cache"),
        }
    }

    async fn hydrate(&self, record: SiteRecord) -> Result<Site, Error> {
        Site::from_record(record, self.documents.as_ref()).await
    }

    async fn cached_lookup(
        &self, ctx: &mut RequestContext, key: String,
        fetch: impl Future<Output = Result<Option<SiteRecord>, Error>>,
    ) -> Result<Option<Site>, Error> {
        if ctx.runtime().is_registered(&key) {
            debug!(key = %key, "Site lookup served from request cache");
            return Ok(ctx.runtime().get(&key).cloned());
        }

        let lookup = match self.load_shared(&key).await {
            Some(lookup) => {
                debug!(key = %key, "Site lookup served from shared cache");
                lookup
            }
            None => {
                let lookup = match fetch.await? {
                    Some(record) => Lookup::Found(self.hydrate(record).await?),
                    None => Lookup::NotFound,
                };
                debug!(key = %key, found = matches!(lookup, Lookup::Found(_)), "Site lookup served from store");
                self.save_shared(&key, &lookup).await;
                lookup
            }
        };

        let site = lookup.into_site();
        ctx.runtime_mut().set(key, site.clone());
        Ok(site)
    }

    async fn load_shared(&self, key: &str) -> Option<Lookup> {
        let raw = match self.cache.load(key).await {
            Ok(raw) => raw?,
            Err(e) => {
                warn!(key = %key, error = %e, "Shared cache read failed; falling back to store");
                return None;
            }
        };
        match serde_json::from_str(&raw) {
            Ok(lookup) => Some(lookup),
            Err(e) => {
                warn!(key = %key, error = %e, "Discarding undecodable shared cache entry");
                None
            }
        }
    }

    async fn save_shared(&self, key: &str, lookup: &Lookup) {
        let value = match serde_json::to_string(lookup) {
            Ok(value) => value,
            Err(e) => {
                warn!(key = %key, error = %e, "Failed to encode site lookup for shared cache");
                return;
            }
        };
        if let Err(e) = self.cache.save(key, &value, &self.policy.save_options(lookup)).await {
            warn!(key = %key, error = %e, "Shared cache write failed");
            return;
        }
        if let Some(max_entries) = self.policy.max_entries {
            match self.cache.trim(max_entries).await {
                Ok(0) => {}
                Ok(evicted) => debug!(evicted, max_entries, "Trimmed shared cache"),
                Err(e) => warn!(error = %e, max_entries, "Shared cache trim failed"),
            }
        }
    }
}
