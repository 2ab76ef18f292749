//! Persistent TTL cache for provider responses
//!
//! Entries are `postcard`-encoded next to their expiry timestamp in a single
//! `fjall` keyspace. Reads and writes run on the blocking pool.

use anyhow::{Result, anyhow};
use fjall::Keyspace;
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use std::fmt::Debug;
use std::path::Path;
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tokio::task;

#[derive(Serialize, Deserialize)]
struct StoredEntry<T> {
    value: T,
    expires_at: u64, // Unix timestamp (seconds)
}

pub struct PersistentCache {
    store: Keyspace,
    ttl: Duration,
}

fn get_from_store(store: Keyspace, key: Vec<u8>) -> Result<Option<Vec<u8>>> {
    Ok(store.get(key)?.map(|v| v.to_vec()))
}

fn now_secs() -> Result<u64> {
    Ok(SystemTime::now().duration_since(UNIX_EPOCH)?.as_secs())
}

impl PersistentCache {
    /// Opens (or creates) the cache database at `path`
    pub fn open(path: impl AsRef<Path>, ttl: Duration) -> Result<Self> {
        let db = fjall::Database::builder(&path)
            .open()
            .map_err(|e| anyhow!("Failed to open cache database: {e}"))?;
        let items = db.keyspace("responses", fjall::KeyspaceCreateOptions::default)?;
        Ok(PersistentCache { store: items, ttl })
    }

    /// Default TTL applied by [`PersistentCache::put`]
    #[must_use]
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Stores a value with the cache's default TTL.
    pub async fn put<T: Serialize + Send + Debug + 'static>(&self, key: &str, value: T) -> Result<()> {
        self.put_with_ttl(key, value, self.ttl).await
    }

    /// Stores a serializable value with an explicit time-to-live.
    #[tracing::instrument(name = "put_cache", level = "debug", skip(self, value))]
    pub async fn put_with_ttl<T: Serialize + Send + Debug + 'static>(
        &self,
        key: &str,
        value: T,
        ttl: Duration,
    ) -> Result<()> {
        let store = self.store.clone();
        let key = key.as_bytes().to_vec();
        let expires_at = SystemTime::now()
            .checked_add(ttl)
            .ok_or(anyhow!("TTL overflow"))?
            .duration_since(UNIX_EPOCH)?
            .as_secs();
        let entry = StoredEntry { value, expires_at };
        let bytes = postcard::to_stdvec(&entry)?;

        task::spawn_blocking(move || store.insert(key, bytes)).await??;
        Ok(())
    }

    /// Retrieves a value if it exists and has not expired.
    /// Returns `None` for cache misses or expired entries.
    #[tracing::instrument(name = "query_cache", level = "debug", skip(self))]
    pub async fn get<T: DeserializeOwned + Send + 'static>(&self, key: &str) -> Result<Option<T>> {
        let store = self.store.clone();
        let key_bytes = key.as_bytes().to_vec();

        let maybe_bytes: Option<Vec<u8>> =
            task::spawn_blocking(move || get_from_store(store, key_bytes)).await??;

        let Some(bytes) = maybe_bytes else {
            tracing::debug!("Key not found");
            return Ok(None);
        };

        let entry: StoredEntry<T> = match postcard::from_bytes(&bytes) {
            Ok(entry) => entry,
            Err(e) => {
                // Layout changed between versions; treat as a miss
                tracing::warn!("Dropping undecodable cache entry: {e}");
                self.remove(key).await?;
                return Ok(None);
            }
        };

        if now_secs()? < entry.expires_at {
            tracing::debug!("Key found and still fresh");
            Ok(Some(entry.value))
        } else {
            tracing::debug!("Key found but expired");
            self.remove(key).await?;
            Ok(None)
        }
    }

    /// Manually removes a key from the cache.
    pub async fn remove(&self, key: &str) -> Result<()> {
        let key = key.as_bytes().to_vec();
        let store = self.store.clone();
        task::spawn_blocking(move || store.remove(key)).await??;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_put_then_get() {
        let dir = tempfile::tempdir().unwrap();
        let cache = PersistentCache::open(dir.path(), Duration::from_secs(60)).unwrap();

        cache.put("directions:a:b", vec![1u32, 2, 3]).await.unwrap();
        let value: Option<Vec<u32>> = cache.get("directions:a:b").await.unwrap();
        assert_eq!(value, Some(vec![1, 2, 3]));
    }

    #[tokio::test]
    async fn test_missing_key() {
        let dir = tempfile::tempdir().unwrap();
        let cache = PersistentCache::open(dir.path(), Duration::from_secs(60)).unwrap();

        let value: Option<String> = cache.get("nope").await.unwrap();
        assert!(value.is_none());
    }

    #[tokio::test]
    async fn test_expired_entry_is_a_miss() {
        let dir = tempfile::tempdir().unwrap();
        let cache = PersistentCache::open(dir.path(), Duration::from_secs(60)).unwrap();

        cache
            .put_with_ttl("stale", "old".to_string(), Duration::ZERO)
            .await
            .unwrap();
        let value: Option<String> = cache.get("stale").await.unwrap();
        assert!(value.is_none());
    }

    #[tokio::test]
    async fn test_remove() {
        let dir = tempfile::tempdir().unwrap();
        let cache = PersistentCache::open(dir.path(), Duration::from_secs(60)).unwrap();

        cache.put("k", 7u8).await.unwrap();
        cache.remove("k").await.unwrap();
        let value: Option<u8> = cache.get("k").await.unwrap();
        assert!(value.is_none());
    }
}
