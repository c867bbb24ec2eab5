//! In-process cache with per-entry TTL using moka

use std::time::{Duration, Instant};

use async_trait::async_trait;
use moka::future::Cache;
use moka::Expiry;

use super::cache_traits::{CacheBackend, CacheError};
use crate::constants::LOCAL_CACHE_CAPACITY;

#[derive(Clone, Debug)]
struct LocalEntry {
    value: String,
    ttl: Duration,
}

/// Expires every entry after the TTL it was written with.
struct EntryTtl;

impl Expiry<String, LocalEntry> for EntryTtl {
    fn expire_after_create(
        &self,
        _key: &String,
        value: &LocalEntry,
        _created_at: Instant,
    ) -> Option<Duration> {
        Some(value.ttl)
    }

    fn expire_after_update(
        &self,
        _key: &String,
        value: &LocalEntry,
        _updated_at: Instant,
        _duration_until_expiry: Option<Duration>,
    ) -> Option<Duration> {
        Some(value.ttl)
    }
}

/// Process-local cache. Never fails; used standalone or as the fallback
/// tier of [`super::ResilientCache`].
#[derive(Clone)]
pub struct LocalCache {
    entries: Cache<String, LocalEntry>,
}

impl LocalCache {
    pub fn new() -> Self {
        Self::with_capacity(LOCAL_CACHE_CAPACITY)
    }

    pub fn with_capacity(max_capacity: u64) -> Self {
        Self {
            entries: Cache::builder()
                .max_capacity(max_capacity)
                .expire_after(EntryTtl)
                .build(),
        }
    }

    /// Approximate number of live entries.
    pub fn entry_count(&self) -> u64 {
        self.entries.entry_count()
    }

    pub fn clear(&self) {
        self.entries.invalidate_all();
    }
}

impl Default for LocalCache {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CacheBackend for LocalCache {
    fn name(&self) -> &'static str {
        "local"
    }

    async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        Ok(self.entries.get(key).await.map(|entry| entry.value))
    }

    async fn set(&self, key: &str, value: String, ttl: Duration) -> Result<(), CacheError> {
        self.entries
            .insert(key.to_string(), LocalEntry { value, ttl })
            .await;
        Ok(())
    }

    async fn delete(&self, keys: &[String]) -> Result<(), CacheError> {
        for key in keys {
            self.entries.invalidate(key).await;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_set_get_delete() {
        let cache = LocalCache::new();
        cache
            .set("a", "1".to_string(), Duration::from_secs(60))
            .await
            .unwrap();
        assert_eq!(cache.get("a").await.unwrap(), Some("1".to_string()));

        cache.delete(&["a".to_string()]).await.unwrap();
        assert_eq!(cache.get("a").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_entries_expire_after_their_own_ttl() {
        let cache = LocalCache::new();
        cache
            .set("short", "s".to_string(), Duration::from_millis(50))
            .await
            .unwrap();
        cache
            .set("long", "l".to_string(), Duration::from_secs(60))
            .await
            .unwrap();

        tokio::time::sleep(Duration::from_millis(150)).await;

        assert_eq!(cache.get("short").await.unwrap(), None);
        assert_eq!(cache.get("long").await.unwrap(), Some("l".to_string()));
    }

    #[tokio::test]
    async fn test_overwrite_resets_ttl() {
        let cache = LocalCache::new();
        cache
            .set("k", "old".to_string(), Duration::from_millis(50))
            .await
            .unwrap();
        cache
            .set("k", "new".to_string(), Duration::from_secs(60))
            .await
            .unwrap();

        tokio::time::sleep(Duration::from_millis(150)).await;
        assert_eq!(cache.get("k").await.unwrap(), Some("new".to_string()));
    }
}
