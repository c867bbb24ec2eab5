//! SQLite storage implementation for CollabHub.
//!
//! This crate provides all database-related functionality using Diesel ORM with SQLite.
//! It implements the repository and provider traits defined in `collabhub-core`:
//! - Database connection pooling and the single-writer actor
//! - Diesel migrations
//! - The append-only activity store and feed cursor state
//! - Read-only views of users, startups, opportunities and interactions
//!
//! # Architecture
//!
//! ```text
//!        core (activity, feeds, recommendations)
//!                  │
//!                  ▼
//!          storage-sqlite (this crate)
//!                  │
//!                  ▼
//!              SQLite DB
//! ```

pub mod db;
pub mod errors;
pub mod schema;
pub mod utils;

// Repository implementations
pub mod activities;
pub mod directory;
pub mod feeds;
pub mod health;

// Re-export database utilities
pub use db::{
    create_pool, get_connection, init, run_migrations, spawn_writer, DbConnection, DbPool,
    WriteHandle,
};

// Re-export storage errors and conversion helpers
pub use errors::{IntoCore, StorageError};

// Re-export from collabhub-core for convenience
pub use collabhub_core::errors::{DatabaseError, Error, Result};
