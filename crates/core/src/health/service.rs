//! Health service and the built-in cache probe.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use log::warn;

use super::model::{CheckResult, CheckStatus, HealthReport};
use super::traits::{HealthProbe, HealthServiceTrait};
use crate::cache::{CacheBackend, ResilientCache};
use crate::errors::{Error, Result};

const PROBE_KEY: &str = "health:probe";
const PROBE_TTL: Duration = Duration::from_secs(10);

/// Runs every registered probe and aggregates the result.
pub struct HealthService {
    probes: Vec<Arc<dyn HealthProbe>>,
}

impl HealthService {
    pub fn new(probes: Vec<Arc<dyn HealthProbe>>) -> Self {
        Self { probes }
    }
}

#[async_trait]
impl HealthServiceTrait for HealthService {
    async fn run_checks(&self) -> HealthReport {
        let mut checks = Vec::with_capacity(self.probes.len());
        for probe in &self.probes {
            let result = match probe.check().await {
                Ok(detail) => CheckResult {
                    name: probe.name().to_string(),
                    status: CheckStatus::Healthy,
                    detail,
                },
                Err(e) => {
                    warn!("Health probe '{}' failed: {}", probe.name(), e);
                    CheckResult {
                        name: probe.name().to_string(),
                        status: CheckStatus::Unhealthy,
                        detail: Some(e.to_string()),
                    }
                }
            };
            checks.push(result);
        }
        HealthReport::from_checks(checks)
    }
}

/// Writes and reads back a probe key, and reports the cache as unhealthy
/// while it is serving from the local fallback.
pub struct CacheProbe {
    cache: Arc<ResilientCache>,
}

impl CacheProbe {
    pub fn new(cache: Arc<ResilientCache>) -> Self {
        Self { cache }
    }
}

#[async_trait]
impl HealthProbe for CacheProbe {
    fn name(&self) -> &'static str {
        "cache"
    }

    async fn check(&self) -> Result<Option<String>> {
        self.cache
            .set(PROBE_KEY, "ok".to_string(), PROBE_TTL)
            .await?;
        let value = self.cache.get(PROBE_KEY).await?;
        if value.as_deref() != Some("ok") {
            return Err(Error::Unexpected("cache probe read back a different value".to_string()));
        }

        let status = self.cache.status();
        if status.degraded {
            return Err(Error::Unexpected(format!(
                "backend '{}' unreachable, serving from local cache",
                status.backend
            )));
        }
        Ok(Some(format!("backend: {}", status.backend)))
    }
}
