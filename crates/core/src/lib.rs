//! CollabHub Core - activity log, feeds, recommendations and background tasks.
//!
//! This crate is storage-agnostic. It defines the repository and provider
//! traits implemented by `collabhub-storage-sqlite`, the cache contract
//! implemented by `collabhub-cache-redis`, and the services built on them.

pub mod actions;
pub mod activities;
pub mod cache;
pub mod constants;
pub mod directory;
pub mod errors;
pub mod feeds;
pub mod health;
pub mod recommendations;
pub mod tasks;

#[cfg(test)]
pub(crate) mod testing;

// Re-export error types
pub use errors::Error;
pub use errors::Result;
