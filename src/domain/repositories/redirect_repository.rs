//! Repository trait for redirect storage.

use crate::domain::entities::{NewRedirect, Redirect};
use crate::error::AppError;
use async_trait::async_trait;

/// Persistence gateway for short key mappings.
///
/// The backing store must enforce uniqueness of `key`; key allocation relies
/// on it to detect concurrent writers.
///
/// # Implementations
///
/// - [`crate::infrastructure::persistence::PgRedirectRepository`] - PostgreSQL implementation
/// - [`crate::infrastructure::persistence::InMemoryRedirectRepository`] - In-process map
/// - Test mocks available with `cfg(test)`
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RedirectRepository: Send + Sync {
    /// Returns every stored key whose length is at most `max_len` characters.
    ///
    /// Order is unspecified.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Database`] on database errors.
    async fn keys_with_length_at_most(&self, max_len: usize) -> Result<Vec<String>, AppError>;

    /// Stores a new redirect.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::UniqueConstraintViolation`] if the key already exists.
    /// Returns [`AppError::Database`] on database errors.
    async fn insert(&self, new_redirect: NewRedirect) -> Result<Redirect, AppError>;

    /// Finds a redirect by its short key.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Database`] on database errors.
    async fn find_by_key(&self, key: &str) -> Result<Option<Redirect>, AppError>;

    /// Deletes a redirect, freeing its key.
    ///
    /// Returns `Ok(true)` if a row was removed, `Ok(false)` if the key was unknown.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Database`] on database errors.
    async fn delete(&self, key: &str) -> Result<bool, AppError>;
}
