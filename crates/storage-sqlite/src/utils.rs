//! Helpers shared by the SQLite repositories.

use chrono::{DateTime, Utc};

use crate::errors::StorageError;

/// Maximum number of bound parameters used for an `IN (...)` list.
///
/// SQLite's default limit is 999 (SQLITE_MAX_VARIABLE_NUMBER).
pub const SQLITE_MAX_PARAMS_CHUNK: usize = 500;

/// Splits `items` into slices small enough for an `IN (...)` clause.
pub fn chunk_for_sqlite<T>(items: &[T]) -> impl Iterator<Item = &[T]> {
    items.chunks(SQLITE_MAX_PARAMS_CHUNK)
}

/// Fixed-width UTC format. Lexical order of stored values equals time order.
const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.6fZ";

pub fn format_timestamp(ts: DateTime<Utc>) -> String {
    ts.format(TIMESTAMP_FORMAT).to_string()
}

pub fn parse_timestamp(value: &str) -> Result<DateTime<Utc>, StorageError> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| StorageError::CorruptRow(format!("bad timestamp '{}': {}", value, e)))
}

/// Splits a comma-separated tag column. Blank entries are dropped.
pub fn split_tags(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}
