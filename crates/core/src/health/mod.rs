//! Health module - dependency probes for the readiness endpoint.

mod model;
mod service;
mod traits;

pub use model::{CheckResult, CheckStatus, HealthReport, OverallStatus};
pub use service::{CacheProbe, HealthService};
pub use traits::{HealthProbe, HealthServiceTrait};
