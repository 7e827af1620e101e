//! Cache entry operations: load, save, tag invalidation and eviction.

use super::connection::CacheDb;
use crate::Error;
use crate::ports::{ExternalCache, SaveOptions};
use async_trait::async_trait;
use chrono::{SecondsFormat, Utc};
use tokio_rusqlite::{params, rusqlite};

/// Fixed-width UTC timestamp so stored values compare lexically.
fn timestamp(at: chrono::DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}

impl CacheDb {
    /// Get a live entry by key.
    ///
    /// Returns None if the key doesn't exist or has expired.
    pub async fn get_entry(&self, key: &str) -> Result<Option<String>, Error> {
        let key = key.to_string();
        let now = timestamp(Utc::now());
        self.conn
            .call(move |conn| -> Result<Option<String>, Error> {
                let result = conn.query_row(
                    "SELECT value FROM cache_entries
                     WHERE key = ?1 AND (expires_at IS NULL OR expires_at > ?2)",
                    params![key, now],
                    |row| row.get(0),
                );

                match result {
                    Ok(value) => Ok(Some(value)),
                    Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                    Err(e) => Err(e.into()),
                }
            })
            .await
            .map_err(Error::from)
    }

    /// Insert or replace an entry together with its tags.
    pub async fn put_entry(&self, key: &str, value: &str, opts: &SaveOptions) -> Result<(), Error> {
        let key = key.to_string();
        let value = value.to_string();
        let tags = opts.tags.clone();
        let priority = opts.priority;

        let stored = Utc::now();
        let expires_at = opts
            .ttl
            .map(|ttl| chrono::Duration::from_std(ttl).unwrap_or(chrono::Duration::MAX))
            .and_then(|ttl| stored.checked_add_signed(ttl))
            .map(timestamp);
        let stored_at = timestamp(stored);

        self.conn
            .call(move |conn| -> Result<(), Error> {
                let tx = conn.transaction()?;
                tx.execute(
                    "INSERT INTO cache_entries (key, value, priority, stored_at, expires_at)
                    VALUES (?1, ?2, ?3, ?4, ?5)
                    ON CONFLICT(key) DO UPDATE SET
                        value = excluded.value,
                        priority = excluded.priority,
                        stored_at = excluded.stored_at,
                        expires_at = excluded.expires_at",
                    params![key, value, priority, stored_at, expires_at],
                )?;
                tx.execute("DELETE FROM cache_tags WHERE key = ?1", params![key])?;
                for tag in &tags {
                    tx.execute(
                        "INSERT OR IGNORE INTO cache_tags (key, tag) VALUES (?1, ?2)",
                        params![key, tag],
                    )?;
                }
                tx.commit()?;
                Ok(())
            })
            .await
            .map_err(Error::from)
    }

    /// Delete all entries carrying `tag`.
    ///
    /// Returns the number of deleted entries.
    pub async fn purge_tag(&self, tag: &str) -> Result<u64, Error> {
        let tag = tag.to_string();
        self.conn
            .call(move |conn| -> Result<u64, Error> {
                let count = conn.execute(
                    "DELETE FROM cache_entries WHERE key IN (SELECT key FROM cache_tags WHERE tag = ?1)",
                    params![tag],
                )?;
                Ok(count as u64)
            })
            .await
            .map_err(Error::from)
    }

    /// Delete expired entries.
    ///
    /// Returns the number of deleted entries.
    pub async fn purge_expired(&self) -> Result<u64, Error> {
        let now = timestamp(Utc::now());
        self.conn
            .call(move |conn| -> Result<u64, Error> {
                let count = conn.execute(
                    "DELETE FROM cache_entries WHERE expires_at IS NOT NULL AND expires_at <= ?1",
                    params![now],
                )?;
                Ok(count as u64)
            })
            .await
            .map_err(Error::from)
    }

    /// Evict lowest-priority, then oldest, entries until count <= max_entries.
    ///
    /// Returns the number of deleted entries.
    pub async fn evict_to_capacity(&self, max_entries: usize) -> Result<u64, Error> {
        let max = i64::try_from(max_entries).unwrap_or(i64::MAX);
        self.conn
            .call(move |conn| -> Result<u64, Error> {
                let count: i64 = conn.query_row("SELECT COUNT(*) FROM cache_entries", [], |row| row.get(0))?;
                if count <= max {
                    return Ok(0);
                }

                let to_delete = count - max;
                let deleted = conn.execute(
                    "DELETE FROM cache_entries WHERE key IN (
                    SELECT key FROM cache_entries ORDER BY priority ASC, stored_at ASC LIMIT ?1
                )",
                    params![to_delete],
                )?;
                Ok(deleted as u64)
            })
            .await
            .map_err(Error::from)
    }
}

#[async_trait]
impl ExternalCache for CacheDb {
    async fn load(&self, key: &str) -> Result<Option<String>, Error> {
        self.get_entry(key).await
    }

    async fn save(&self, key: &str, value: &str, opts: &SaveOptions) -> Result<(), Error> {
        self.put_entry(key, value, opts).await
    }

    async fn clear_tag(&self, tag: &str) -> Result<u64, Error> {
        self.purge_tag(tag).await
    }

    async fn trim(&self, max_entries: usize) -> Result<u64, Error> {
        self.evict_to_capacity(max_entries).await
    }
}
