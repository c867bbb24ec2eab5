//! Database readiness probe.

mod probe;

pub use probe::SqliteHealthProbe;
