//! Registry configuration with layered loading.
//!
//! This module provides configuration management using figment for layered
//! configuration loading from multiple sources:
//!
//! 1. Environment variables (SITE_REGISTRY_*)
//! 2. TOML config file (if SITE_REGISTRY_CONFIG_FILE set)
//! 3. Built-in defaults

use std::path::PathBuf;
use std::time::Duration;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};

mod validation;

pub use validation::ConfigError;

/// Priority given to site lookups in the shared cache unless configured otherwise.
pub const DEFAULT_LOOKUP_PRIORITY: i64 = 999;

/// Registry configuration with layered loading.
///
/// Loading precedence (highest wins):
/// 1. Environment variables (SITE_REGISTRY_*)
/// 2. TOML config file (if SITE_REGISTRY_CONFIG_FILE set)
/// 3. Built-in defaults
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegistryConfig {
    /// Path to the SQLite database backing the shared lookup cache.
    ///
    /// Set via SITE_REGISTRY_CACHE_DB_PATH environment variable.
    #[serde(default = "default_cache_db_path")]
    pub cache_db_path: PathBuf,

    /// Lifetime of cached sites in seconds. `None` keeps them until invalidated.
    ///
    /// Set via SITE_REGISTRY_FOUND_TTL_SECS environment variable.
    #[serde(default)]
    pub found_ttl_secs: Option<u64>,

    /// Lifetime of cached misses in seconds. `None` keeps them until invalidated.
    ///
    /// Set via SITE_REGISTRY_NOT_FOUND_TTL_SECS environment variable.
    #[serde(default)]
    pub not_found_ttl_secs: Option<u64>,

    /// Eviction priority of cached sites (higher survives longer).
    ///
    /// Set via SITE_REGISTRY_FOUND_PRIORITY environment variable.
    #[serde(default = "default_priority")]
    pub found_priority: i64,

    /// Eviction priority of cached misses (higher survives longer).
    ///
    /// Set via SITE_REGISTRY_NOT_FOUND_PRIORITY environment variable.
    #[serde(default = "default_priority")]
    pub not_found_priority: i64,

    /// Upper bound on shared cache entries, enforced by `CacheDb::evict_to_capacity`.
    ///
    /// Set via SITE_REGISTRY_MAX_CACHE_ENTRIES environment variable.
    #[serde(default)]
    pub max_cache_entries: Option<usize>,
}

fn default_cache_db_path() -> PathBuf {
    PathBuf::from("./site-registry-cache.sqlite")
}

fn default_priority() -> i64 {
    DEFAULT_LOOKUP_PRIORITY
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            cache_db_path: default_cache_db_path(),
            found_ttl_secs: None,
            not_found_ttl_secs: None,
            found_priority: default_priority(),
            not_found_priority: default_priority(),
            max_cache_entries: None,
        }
    }
}

impl RegistryConfig {
    /// TTL for cached sites, if any.
    pub fn found_ttl(&self) -> Option<Duration> {
        self.found_ttl_secs.map(Duration::from_secs)
    }

    /// TTL for cached misses, if any.
    pub fn not_found_ttl(&self) -> Option<Duration> {
        self.not_found_ttl_secs.map(Duration::from_secs)
    }

    /// Load configuration from all sources with layered precedence.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if:
    /// - Configuration file cannot be read
    /// - Environment variables cannot be parsed
    /// - Validation fails after loading
    pub fn load() -> Result<Self, ConfigError> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        if let Ok(config_path) = std::env::var("SITE_REGISTRY_CONFIG_FILE") {
            figment = figment.merge(Toml::file(&config_path));
        }

        figment = figment.merge(
            Env::prefixed("SITE_REGISTRY_")
                .ignore(&["config_file"])
                .map(|key| key.as_str().to_lowercase().into())
                .split("__"),
        );

        let config: Self = figment.extract().map_err(|e| ConfigError::LoadFailed(e.to_string()))?;

        config.validate()?;

        Ok(config)
    }
}
