use std::time::Duration;

use async_trait::async_trait;
use log::warn;
use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;

/// Errors raised by a cache backend.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CacheError {
    #[error("Cache backend '{backend}' is unavailable: {reason}")]
    Unavailable {
        backend: &'static str,
        reason: String,
    },

    #[error("Cache backend '{backend}' timed out during {operation}")]
    Timeout {
        backend: &'static str,
        operation: &'static str,
    },

    #[error("Cache value could not be encoded: {0}")]
    Serialization(String),
}

/// A string key/value store with per-entry TTL.
///
/// Values are opaque strings so the same contract can be served by the
/// in-process cache and by a network cache.
#[async_trait]
pub trait CacheBackend: Send + Sync {
    /// Short backend name used in logs and health reports.
    fn name(&self) -> &'static str;

    async fn get(&self, key: &str) -> Result<Option<String>, CacheError>;

    async fn set(&self, key: &str, value: String, ttl: Duration) -> Result<(), CacheError>;

    async fn delete(&self, keys: &[String]) -> Result<(), CacheError>;
}

/// Reads and decodes a JSON value. Backend errors and undecodable payloads
/// are logged and reported as a miss.
pub async fn get_json<T: DeserializeOwned>(cache: &dyn CacheBackend, key: &str) -> Option<T> {
    let raw = match cache.get(key).await {
        Ok(Some(raw)) => raw,
        Ok(None) => return None,
        Err(e) => {
            warn!("Cache read for '{}' failed on {}: {}", key, cache.name(), e);
            return None;
        }
    };
    match serde_json::from_str(&raw) {
        Ok(value) => Some(value),
        Err(e) => {
            warn!("Discarding undecodable cache entry '{}': {}", key, e);
            None
        }
    }
}

/// Encodes and stores a JSON value. Failures are logged and swallowed.
pub async fn set_json<T: Serialize>(cache: &dyn CacheBackend, key: &str, value: &T, ttl: Duration) {
    let raw = match serde_json::to_string(value) {
        Ok(raw) => raw,
        Err(e) => {
            warn!("Failed to encode cache entry '{}': {}", key, e);
            return;
        }
    };
    if let Err(e) = cache.set(key, raw, ttl).await {
        warn!("Cache write for '{}' failed on {}: {}", key, cache.name(), e);
    }
}

/// Deletes keys, logging and swallowing failures.
pub async fn delete_keys(cache: &dyn CacheBackend, keys: &[String]) {
    if keys.is_empty() {
        return;
    }
    if let Err(e) = cache.delete(keys).await {
        warn!("Cache delete of {:?} failed on {}: {}", keys, cache.name(), e);
    }
}
