//! Redis implementation of the CollabHub cache backend.
//!
//! Keys are namespaced with a prefix so several deployments can share one
//! Redis instance. Every Redis error is reported as
//! [`CacheError::Unavailable`]; the resilient cache in `collabhub-core`
//! decides whether to fall back.

use std::time::Duration;

use async_trait::async_trait;
use log::{debug, info};
use redis::aio::ConnectionManager;
use redis::AsyncCommands;

use collabhub_core::cache::{CacheBackend, CacheError};

pub const DEFAULT_KEY_PREFIX: &str = "collabhub:";

const BACKEND: &str = "redis";

fn unavailable(err: redis::RedisError) -> CacheError {
    CacheError::Unavailable {
        backend: BACKEND,
        reason: err.to_string(),
    }
}

/// Cache backend over a multiplexed, auto-reconnecting Redis connection.
#[derive(Clone)]
pub struct RedisCache {
    manager: ConnectionManager,
    prefix: String,
}

impl RedisCache {
    /// Opens a connection to `url` (for example `redis://localhost:6379`).
    pub async fn connect(url: &str) -> Result<Self, CacheError> {
        Self::connect_with_prefix(url, DEFAULT_KEY_PREFIX).await
    }

    pub async fn connect_with_prefix(url: &str, prefix: &str) -> Result<Self, CacheError> {
        let client = redis::Client::open(url).map_err(unavailable)?;
        let manager = ConnectionManager::new(client).await.map_err(unavailable)?;
        info!("Connected to Redis cache at {}", redact(url));
        Ok(Self {
            manager,
            prefix: prefix.to_string(),
        })
    }

    fn key(&self, key: &str) -> String {
        format!("{}{}", self.prefix, key)
    }
}

/// Strips credentials from a Redis URL before logging it.
fn redact(url: &str) -> String {
    match (url.find("://"), url.rfind('@')) {
        (Some(scheme_end), Some(at)) if at > scheme_end => {
            format!("{}://***{}", &url[..scheme_end], &url[at..])
        }
        _ => url.to_string(),
    }
}

#[async_trait]
impl CacheBackend for RedisCache {
    fn name(&self) -> &'static str {
        BACKEND
    }

    async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        let mut conn = self.manager.clone();
        conn.get(self.key(key)).await.map_err(unavailable)
    }

    async fn set(&self, key: &str, value: String, ttl: Duration) -> Result<(), CacheError> {
        let mut conn = self.manager.clone();
        // SET EX rejects 0.
        let seconds = ttl.as_secs().max(1);
        conn.set_ex::<_, _, ()>(self.key(key), value, seconds)
            .await
            .map_err(unavailable)
    }

    async fn delete(&self, keys: &[String]) -> Result<(), CacheError> {
        if keys.is_empty() {
            return Ok(());
        }
        let prefixed: Vec<String> = keys.iter().map(|k| self.key(k)).collect();
        let mut conn = self.manager.clone();
        let removed: usize = conn.del(&prefixed).await.map_err(unavailable)?;
        debug!("Deleted {} of {} cache keys", removed, prefixed.len());
        Ok(())
    }
}
