//! Per-request state: the request-scoped lookup cache and the current site.
//!
//! A `RequestContext` is created by the request-handling layer, threaded
//! through lookups as `&mut`, and dropped with the request. Nothing in it is
//! shared between requests.

use std::collections::HashMap;

use crate::Error;
use crate::site::Site;

/// Request-scoped cache of normalized lookup results.
///
/// A registered key holding `None` records a miss, so repeated lookups in the
/// same request skip the shared cache and persistence entirely.
#[derive(Debug, Clone, Default)]
pub struct RuntimeCache {
    entries: HashMap<String, Option<Site>>,
}

impl RuntimeCache {
    /// Whether a result, found or not, is stored under `key`.
    pub fn is_registered(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// The stored result, or `None` if the key is unregistered or holds a miss.
    pub fn get(&self, key: &str) -> Option<&Site> {
        self.entries.get(key).and_then(Option::as_ref)
    }

    /// Store a normalized result under `key`.
    pub fn set(&mut self, key: impl Into<String>, site: Option<Site>) {
        self.entries.insert(key.into(), site);
    }

    /// Number of stored results.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when nothing has been looked up in this request.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Site context bound to one request.
#[derive(Debug, Clone, Default)]
pub struct RequestContext {
    runtime: RuntimeCache,
    current_site: Option<Site>,
}

impl RequestContext {
    /// Context for a request outside any site.
    pub fn new() -> Self {
        Self::default()
    }

    /// The request-scoped lookup cache.
    pub fn runtime(&self) -> &RuntimeCache {
        &self.runtime
    }

    /// Mutable access to the request-scoped lookup cache.
    pub fn runtime_mut(&mut self) -> &mut RuntimeCache {
        &mut self.runtime
    }

    /// True once a current site has been registered for this request.
    pub fn is_site_request(&self) -> bool {
        self.current_site.is_some()
    }

    /// The registered current site.
    ///
    /// # Errors
    ///
    /// Returns `Error::NoCurrentSite` when called outside a site context.
    pub fn current_site(&self) -> Result<&Site, Error> {
        self.current_site.as_ref().ok_or(Error::NoCurrentSite)
    }

    /// Register the current site, replacing any previous one.
    pub fn set_current_site(&mut self, site: Site) {
        tracing::debug!(site_id = ?site.id(), "Registered current site");
        self.current_site = Some(site);
    }
}
