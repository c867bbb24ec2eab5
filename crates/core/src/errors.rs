//! Core error types for CollabHub.
//!
//! This module defines storage-agnostic error types. Diesel and Redis errors
//! are converted into these types by the storage and cache crates.

use thiserror::Error;

use crate::cache::CacheError;
use crate::tasks::TaskQueueError;

/// Type alias for Result using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Root error type for the activity and intelligence layer.
///
/// Only `Validation` is meant to reach API callers as a client error. Every
/// other variant is an infrastructure failure that the services either
/// swallow (cache, compute) or propagate to the task worker.
#[derive(Error, Debug)]
pub enum Error {
    #[error("Database operation failed: {0}")]
    Database(#[from] DatabaseError),

    #[error("Input validation failed: {0}")]
    Validation(#[from] ValidationError),

    #[error("Cache operation failed: {0}")]
    Cache(#[from] CacheError),

    #[error("Task queue error: {0}")]
    TaskQueue(#[from] TaskQueueError),

    #[error("Computation failed: {0}")]
    Compute(String),

    #[error("Notification delivery failed: {0}")]
    Notification(String),

    #[error("Unexpected error: {0}")]
    Unexpected(String),
}

/// Database-agnostic error type for storage operations.
#[derive(Error, Debug)]
pub enum DatabaseError {
    #[error("Failed to connect to database: {0}")]
    ConnectionFailed(String),

    #[error("Failed to create database pool: {0}")]
    PoolCreationFailed(String),

    #[error("Database query failed: {0}")]
    QueryFailed(String),

    #[error("Record not found: {0}")]
    NotFound(String),

    #[error("Unique constraint violation: {0}")]
    UniqueViolation(String),

    #[error("Transaction failed: {0}")]
    TransactionFailed(String),

    #[error("Database migration failed: {0}")]
    MigrationFailed(String),

    #[error("Internal database error: {0}")]
    Internal(String),
}

/// Validation errors for caller input.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Unknown action type '{0}'")]
    InvalidActionType(String),

    #[error("Unknown subject kind '{0}'")]
    InvalidSubjectKind(String),

    #[error("Unknown recommendation type '{0}'")]
    UnknownRecommendationKind(String),

    #[error("Unknown user role '{0}'")]
    UnknownRole(String),

    #[error("page_size must be between 1 and {max}, got {value}")]
    InvalidPageSize { value: usize, max: usize },

    #[error("page must be 1 or greater, got {0}")]
    InvalidPage(usize),

    #[error("limit must be between 1 and {max}, got {value}")]
    InvalidLimit { value: usize, max: usize },

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Required field '{0}' is missing")]
    MissingField(String),
}

impl Error {
    /// True when the error was caused by caller input rather than infrastructure.
    pub fn is_validation(&self) -> bool {
        matches!(self, Error::Validation(_))
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Unexpected(format!("Serialization failed: {}", err))
    }
}

impl From<chrono::ParseError> for Error {
    fn from(err: chrono::ParseError) -> Self {
        Error::Validation(ValidationError::InvalidInput(err.to_string()))
    }
}

impl From<Error> for String {
    fn from(err: Error) -> Self {
        err.to_string()
    }
}
