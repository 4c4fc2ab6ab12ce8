//! Two-tier TTL cache for expensive catalog reads.
//!
//! Lookups hit an in-memory `moka` cache first and fall back to one JSON file
//! per key on disk, so aggregated data survives restarts. Every entry carries
//! its own TTL and an optional version tag; an entry that has expired or was
//! written under another version is evicted when read and reported as a miss.
//! There is no background sweep.
//!
//! Disk writes are best-effort: failures are logged and the request goes on
//! with the in-memory copy. Concurrent writers to one key race and the last
//! write wins.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use moka::future::Cache;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::config::CacheConfig;

/// A stored value with its validity metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheEntry {
    pub value: serde_json::Value,
    pub stored_at: DateTime<Utc>,
    pub ttl_ms: u64,
    #[serde(default)]
    pub version: Option<String>,
}

impl CacheEntry {
    /// Valid when `now - stored_at <= ttl` and, if a version was requested,
    /// the stored version matches it.
    #[must_use]
    pub fn is_valid_at(&self, now: DateTime<Utc>, version: Option<&str>) -> bool {
        let age_ms = now.signed_duration_since(self.stored_at).num_milliseconds();
        let fresh = u64::try_from(age_ms).map_or(true, |age| age <= self.ttl_ms);
        let version_matches = version.is_none_or(|v| self.version.as_deref() == Some(v));
        fresh && version_matches
    }
}

/// Memory + disk cache keyed by string.
#[derive(Clone)]
pub struct TwoTierCache {
    inner: Arc<TwoTierCacheInner>,
}

struct TwoTierCacheInner {
    memory: Cache<String, CacheEntry>,
    dir: Option<PathBuf>,
}

impl TwoTierCache {
    /// Create a cache. `dir = None` keeps it memory-only.
    #[must_use]
    pub fn new(capacity: u64, dir: Option<PathBuf>) -> Self {
        Self {
            inner: Arc::new(TwoTierCacheInner {
                memory: Cache::builder().max_capacity(capacity).build(),
                dir,
            }),
        }
    }

    /// Create a cache from configuration.
    #[must_use]
    pub fn from_config(config: &CacheConfig) -> Self {
        Self::new(config.capacity, config.dir.clone())
    }

    /// Look up `key`, optionally requiring a version tag.
    ///
    /// Returns `None` on a miss, an expired or mismatched entry, or a value
    /// that no longer decodes as `T`.
    pub async fn get<T: DeserializeOwned>(&self, key: &str, version: Option<&str>) -> Option<T> {
        let now = Utc::now();

        if let Some(entry) = self.inner.memory.get(key).await {
            if entry.is_valid_at(now, version)
                && let Ok(value) = serde_json::from_value(entry.value)
            {
                debug!(key, "Memory cache hit");
                return Some(value);
            }
            self.inner.memory.invalidate(key).await;
        }

        let path = self.entry_path(key)?;
        let entry = read_entry(&path).await?;

        if !entry.is_valid_at(now, version) {
            debug!(key, "Evicting stale disk cache entry");
            remove_file(&path).await;
            return None;
        }

        let Ok(value) = serde_json::from_value(entry.value.clone()) else {
            remove_file(&path).await;
            return None;
        };

        debug!(key, "Disk cache hit");
        self.inner.memory.insert(key.to_string(), entry).await;
        Some(value)
    }

    /// Store `value` under `key` in both tiers.
    ///
    /// Never fails: serialisation and disk errors are logged.
    pub async fn set<T: Serialize + Sync>(
        &self,
        key: &str,
        value: &T,
        ttl: Duration,
        version: Option<&str>,
    ) {
        let value = match serde_json::to_value(value) {
            Ok(value) => value,
            Err(e) => {
                warn!(key, error = %e, "Failed to serialise cache value");
                return;
            }
        };

        let entry = CacheEntry {
            value,
            stored_at: Utc::now(),
            ttl_ms: u64::try_from(ttl.as_millis()).unwrap_or(u64::MAX),
            version: version.map(str::to_string),
        };

        self.inner
            .memory
            .insert(key.to_string(), entry.clone())
            .await;

        if let Some(path) = self.entry_path(key)
            && let Err(e) = write_entry(&path, &entry).await
        {
            warn!(key, path = %path.display(), error = %e, "Failed to write disk cache entry");
        }
    }

    /// Remove `key` from both tiers.
    pub async fn invalidate(&self, key: &str) {
        self.inner.memory.invalidate(key).await;
        if let Some(path) = self.entry_path(key) {
            remove_file(&path).await;
        }
    }

    fn entry_path(&self, key: &str) -> Option<PathBuf> {
        self.inner
            .dir
            .as_ref()
            .map(|dir| dir.join(format!("entry-{}.json", urlencoding::encode(key))))
    }
}

async fn read_entry(path: &Path) -> Option<CacheEntry> {
    let bytes = match tokio::fs::read(path).await {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return None,
        Err(e) => {
            warn!(path = %path.display(), error = %e, "Failed to read disk cache entry");
            return None;
        }
    };

    match serde_json::from_slice(&bytes) {
        Ok(entry) => Some(entry),
        Err(e) => {
            warn!(path = %path.display(), error = %e, "Discarding corrupt disk cache entry");
            remove_file(path).await;
            None
        }
    }
}

async fn write_entry(path: &Path, entry: &CacheEntry) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }
    let bytes = serde_json::to_vec(entry)?;
    let tmp = path.with_extension(format!("{}.tmp", uuid::Uuid::new_v4().simple()));
    tokio::fs::write(&tmp, bytes).await?;
    if let Err(e) = tokio::fs::rename(&tmp, path).await {
        remove_file(&tmp).await;
        return Err(e);
    }
    Ok(())
}

async fn remove_file(path: &Path) {
    if let Err(e) = tokio::fs::remove_file(path).await
        && e.kind() != std::io::ErrorKind::NotFound
    {
        warn!(path = %path.display(), error = %e, "Failed to remove disk cache entry");
    }
}
