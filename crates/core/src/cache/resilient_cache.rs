use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use async_trait::async_trait;
use log::{debug, warn};
use serde::Serialize;

use super::cache_traits::{CacheBackend, CacheError};
use super::circuit_breaker::{CircuitBreaker, CircuitBreakerConfig, CircuitState};
use super::local_cache::LocalCache;
use crate::constants::CACHE_OP_TIMEOUT;

#[derive(Clone, Debug)]
pub struct ResilientCacheConfig {
    /// Upper bound on a single distributed-cache operation.
    pub op_timeout: Duration,
    pub breaker: CircuitBreakerConfig,
}

impl Default for ResilientCacheConfig {
    fn default() -> Self {
        Self {
            op_timeout: CACHE_OP_TIMEOUT,
            breaker: CircuitBreakerConfig::default(),
        }
    }
}

/// Snapshot of the cache tiers for health reporting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheStatus {
    pub backend: &'static str,
    pub degraded: bool,
}

/// Cache that prefers a distributed backend and degrades to the in-process
/// cache whenever that backend errors, times out, or its circuit is open.
///
/// Backend failures are logged and never returned to callers. Deletes are
/// applied to both tiers so entries written during an outage do not survive
/// an invalidation. A delete the primary tier missed is retried before the
/// next operation that reaches it, so entries cached there before the outage
/// are not served again once it recovers.
pub struct ResilientCache {
    primary: Option<Arc<dyn CacheBackend>>,
    local: LocalCache,
    breaker: CircuitBreaker,
    op_timeout: Duration,
    last_op_failed: AtomicBool,
    pending_deletes: Mutex<HashSet<String>>,
}

impl ResilientCache {
    pub fn new(
        primary: Option<Arc<dyn CacheBackend>>,
        local: LocalCache,
        config: ResilientCacheConfig,
    ) -> Self {
        let name = primary.as_ref().map(|p| p.name()).unwrap_or("local");
        Self {
            primary,
            local,
            breaker: CircuitBreaker::new(name, config.breaker),
            op_timeout: config.op_timeout,
            last_op_failed: AtomicBool::new(false),
            pending_deletes: Mutex::new(HashSet::new()),
        }
    }

    /// Cache with no distributed tier.
    pub fn local_only(local: LocalCache) -> Self {
        Self::new(None, local, ResilientCacheConfig::default())
    }

    pub fn status(&self) -> CacheStatus {
        match &self.primary {
            Some(primary) => CacheStatus {
                backend: primary.name(),
                degraded: self.last_op_failed.load(Ordering::Relaxed)
                    || self.breaker.state() != CircuitState::Closed,
            },
            None => CacheStatus {
                backend: self.local.name(),
                degraded: false,
            },
        }
    }

    fn pending(&self) -> MutexGuard<'_, HashSet<String>> {
        self.pending_deletes
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Number of keys still waiting to be deleted from the primary tier.
    pub fn pending_delete_count(&self) -> usize {
        self.pending().len()
    }

    /// Replays deletes the primary tier missed. Keys stay queued on failure.
    async fn flush_pending_deletes(&self) {
        let keys: Vec<String> = {
            let mut pending = self.pending();
            if pending.is_empty() {
                return;
            }
            pending.drain().collect()
        };
        let owned = keys.clone();
        if self
            .try_primary("delete", |p| async move { p.delete(&owned).await })
            .await
            .is_some()
        {
            debug!("Replayed {} missed cache deletes", keys.len());
        } else {
            self.pending().extend(keys);
        }
    }

    /// Runs `op` against the primary tier when its circuit allows it.
    /// Returns `None` when the caller should fall back to the local tier.
    async fn try_primary<T, F, Fut>(&self, operation: &'static str, op: F) -> Option<T>
    where
        F: FnOnce(Arc<dyn CacheBackend>) -> Fut,
        Fut: std::future::Future<Output = Result<T, CacheError>>,
    {
        let primary = self.primary.clone()?;
        if !self.breaker.is_allowed() {
            return None;
        }
        let name = primary.name();
        match tokio::time::timeout(self.op_timeout, op(primary)).await {
            Ok(Ok(value)) => {
                self.breaker.record_success();
                self.last_op_failed.store(false, Ordering::Relaxed);
                Some(value)
            }
            Ok(Err(e)) => {
                warn!(
                    "Cache backend '{}' failed during {}, using local cache: {}",
                    name, operation, e
                );
                self.breaker.record_failure();
                self.last_op_failed.store(true, Ordering::Relaxed);
                None
            }
            Err(_) => {
                warn!(
                    "Cache backend '{}' timed out after {:?} during {}, using local cache",
                    name, self.op_timeout, operation
                );
                self.breaker.record_failure();
                self.last_op_failed.store(true, Ordering::Relaxed);
                None
            }
        }
    }
}

#[async_trait]
impl CacheBackend for ResilientCache {
    fn name(&self) -> &'static str {
        "resilient"
    }

    async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        self.flush_pending_deletes().await;
        let owned = key.to_string();
        if let Some(hit) = self
            .try_primary("get", |p| async move { p.get(&owned).await })
            .await
        {
            return Ok(hit);
        }
        self.local.get(key).await
    }

    async fn set(&self, key: &str, value: String, ttl: Duration) -> Result<(), CacheError> {
        self.flush_pending_deletes().await;
        let owned = key.to_string();
        let payload = value.clone();
        if self
            .try_primary("set", |p| async move { p.set(&owned, payload, ttl).await })
            .await
            .is_some()
        {
            return Ok(());
        }
        self.local.set(key, value, ttl).await
    }

    async fn delete(&self, keys: &[String]) -> Result<(), CacheError> {
        self.flush_pending_deletes().await;
        let owned = keys.to_vec();
        let reached = self
            .try_primary("delete", |p| async move { p.delete(&owned).await })
            .await
            .is_some();
        if !reached && self.primary.is_some() {
            self.pending().extend(keys.iter().cloned());
        }
        self.local.delete(keys).await
    }
}
