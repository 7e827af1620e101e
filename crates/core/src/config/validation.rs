//! Configuration validation rules.
//!
//! This module provides validation logic for `RegistryConfig` values
//! after they have been loaded from environment, files, or defaults.

use crate::config::RegistryConfig;
use thiserror::Error;

/// Highest accepted cache priority.
const MAX_PRIORITY: i64 = 1000;

/// Configuration validation errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    LoadFailed(String),

    #[error("invalid configuration: {field} - {reason}")]
    Invalid { field: String, reason: String },
}

fn check_priority(field: &str, value: i64) -> Result<(), ConfigError> {
    if !(0..=MAX_PRIORITY).contains(&value) {
        return Err(ConfigError::Invalid { field: field.into(), reason: format!("must be within 0..={MAX_PRIORITY}") });
    }
    Ok(())
}

fn check_ttl(field: &str, value: Option<u64>) -> Result<(), ConfigError> {
    if value == Some(0) {
        return Err(ConfigError::Invalid { field: field.into(), reason: "must be greater than 0 when set".into() });
    }
    Ok(())
}

impl RegistryConfig {
    /// Validate configuration values after loading.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` if:
    /// - `cache_db_path` is empty
    /// - a TTL is set to 0
    /// - a priority is outside 0..=1000
    /// - `max_cache_entries` is set to 0
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.cache_db_path.as_os_str().is_empty() {
            return Err(ConfigError::Invalid { field: "cache_db_path".into(), reason: "must not be empty".into() });
        }

        check_ttl("found_ttl_secs", self.found_ttl_secs)?;
        check_ttl("not_found_ttl_secs", self.not_found_ttl_secs)?;
        check_priority("found_priority", self.found_priority)?;
        check_priority("not_found_priority", self.not_found_priority)?;

        if self.max_cache_entries == Some(0) {
            return Err(ConfigError::Invalid {
                field: "max_cache_entries".into(),
                reason: "must be greater than 0 when set".into(),
            });
        }

        if self.not_found_priority > self.found_priority {
            tracing::warn!(
                found_priority = self.found_priority,
                not_found_priority = self.not_found_priority,
                "Cached misses outrank cached sites; misses will be evicted last"
            );
        }

        Ok(())
    }
}
