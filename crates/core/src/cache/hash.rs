//! Cache key generation for site lookups.

use sha2::{Digest, Sha256};

/// Cache key for a lookup by site id.
pub fn site_id_key(id: i64) -> String {
    format!("site_id_{id}")
}

/// Cache key for a lookup by domain.
///
/// The domain is hashed as given: equal strings share a key, any change of
/// case or content yields a different one.
pub fn site_domain_key(domain: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(domain.as_bytes());
    format!("site_domain_{}", hex::encode(hasher.finalize()))
}
