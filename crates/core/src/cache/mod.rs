//! Cache layer shared by the feed and recommendation services.

mod cache_traits;
mod circuit_breaker;
mod local_cache;
mod resilient_cache;

pub use cache_traits::{delete_keys, get_json, set_json, CacheBackend, CacheError};
pub use circuit_breaker::{CircuitBreaker, CircuitBreakerConfig, CircuitState};
pub use local_cache::LocalCache;
pub use resilient_cache::{CacheStatus, ResilientCache, ResilientCacheConfig};
