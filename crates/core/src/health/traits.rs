//! Health check traits.

use async_trait::async_trait;

use super::model::HealthReport;
use crate::errors::Result;

/// A dependency the service needs in order to work.
#[async_trait]
pub trait HealthProbe: Send + Sync {
    fn name(&self) -> &'static str;

    /// Returns an optional detail string when healthy, an error otherwise.
    async fn check(&self) -> Result<Option<String>>;
}

#[async_trait]
pub trait HealthServiceTrait: Send + Sync {
    async fn run_checks(&self) -> HealthReport;
}
