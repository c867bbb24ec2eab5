//! Storage-specific error types for SQLite operations.
//!
//! Diesel and r2d2 errors are wrapped here and converted to the
//! database-agnostic errors of `collabhub_core` at the crate boundary.

use collabhub_core::errors::{DatabaseError, Error};
use diesel::result::{DatabaseErrorKind, Error as DieselError};
use thiserror::Error;

/// Storage-specific errors that wrap Diesel and r2d2 types.
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Database connection failed: {0}")]
    ConnectionFailed(#[from] diesel::ConnectionError),

    #[error("Connection pool error: {0}")]
    PoolError(#[from] r2d2::Error),

    #[error("Query execution failed: {0}")]
    QueryFailed(#[from] DieselError),

    #[error("Migration failed: {0}")]
    MigrationFailed(String),

    #[error("Corrupt row: {0}")]
    CorruptRow(String),

    #[error("Writer unavailable: {0}")]
    WriterUnavailable(String),

    #[error("Core error: {0}")]
    CoreError(String),
}

/// Used by the write actor, whose jobs return core errors.
impl From<Error> for StorageError {
    fn from(err: Error) -> Self {
        StorageError::CoreError(err.to_string())
    }
}

impl From<StorageError> for Error {
    fn from(err: StorageError) -> Self {
        let db_err = match err {
            StorageError::ConnectionFailed(e) => DatabaseError::ConnectionFailed(e.to_string()),
            StorageError::PoolError(e) => DatabaseError::PoolCreationFailed(e.to_string()),
            StorageError::QueryFailed(DieselError::NotFound) => {
                DatabaseError::NotFound("Record not found".to_string())
            }
            StorageError::QueryFailed(DieselError::DatabaseError(
                DatabaseErrorKind::UniqueViolation,
                info,
            )) => DatabaseError::UniqueViolation(info.message().to_string()),
            StorageError::QueryFailed(DieselError::RollbackTransaction) => {
                DatabaseError::TransactionFailed("transaction rolled back".to_string())
            }
            StorageError::QueryFailed(e) => DatabaseError::QueryFailed(e.to_string()),
            StorageError::MigrationFailed(e) => DatabaseError::MigrationFailed(e),
            StorageError::CorruptRow(e) => DatabaseError::Internal(e),
            StorageError::WriterUnavailable(e) => DatabaseError::TransactionFailed(e),
            StorageError::CoreError(e) => DatabaseError::Internal(e),
        };
        Error::Database(db_err)
    }
}

/// Extension trait for converting Diesel and r2d2 results to core results.
///
/// `From<DieselError> for Error` is not possible because of orphan rules,
/// so conversions go through [`StorageError`].
pub trait IntoCore<T> {
    fn into_core(self) -> collabhub_core::Result<T>;
}

impl<T> IntoCore<T> for std::result::Result<T, DieselError> {
    fn into_core(self) -> collabhub_core::Result<T> {
        self.map_err(|e| StorageError::from(e).into())
    }
}

impl<T> IntoCore<T> for std::result::Result<T, r2d2::Error> {
    fn into_core(self) -> collabhub_core::Result<T> {
        self.map_err(|e| StorageError::from(e).into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_maps_to_database_not_found() {
        let err: Error = StorageError::QueryFailed(DieselError::NotFound).into();
        assert!(matches!(err, Error::Database(DatabaseError::NotFound(_))));
    }

    #[test]
    fn test_corrupt_row_is_internal() {
        let err: Error = StorageError::CorruptRow("bad action".to_string()).into();
        assert!(matches!(err, Error::Database(DatabaseError::Internal(_))));
    }
}
