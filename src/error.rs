//! Application error type.

use thiserror::Error;

use crate::domain::keyspace::DecodeError;

/// Errors surfaced by key allocation and the persistence gateway.
#[derive(Debug, Error)]
pub enum AppError {
    /// A caller-supplied key is not valid base62.
    #[error("invalid short key: {0}")]
    InvalidKey(#[from] DecodeError),

    /// Every position in the keyspace is allocated.
    #[error("keyspace exhausted: all {capacity} positions are allocated")]
    KeyspaceExhausted { capacity: u32 },

    /// The datastore already holds this key. Usually a concurrent allocation
    /// won the race; the whole allocate-then-insert sequence should be retried.
    #[error("short key {key:?} is already allocated")]
    UniqueConstraintViolation { key: String },

    #[error("short key {key:?} not found")]
    NotFound { key: String },

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl AppError {
    pub fn not_found(key: impl Into<String>) -> Self {
        Self::NotFound { key: key.into() }
    }

    pub fn conflict(key: impl Into<String>) -> Self {
        Self::UniqueConstraintViolation { key: key.into() }
    }

    /// Returns true for errors that a fresh allocate-then-insert may resolve.
    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::UniqueConstraintViolation { .. })
    }
}

/// Maps an insert error for `key`, turning unique violations into
/// [`AppError::UniqueConstraintViolation`].
pub fn map_sqlx_error(e: sqlx::Error, key: &str) -> AppError {
    if let Some(db) = e.as_database_error()
        && db.is_unique_violation()
    {
        return AppError::conflict(key);
    }

    AppError::Database(e)
}
