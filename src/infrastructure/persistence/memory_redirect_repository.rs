//! In-memory implementation of the redirect repository.

use async_trait::async_trait;
use chrono::Utc;
use std::collections::BTreeMap;
use tokio::sync::RwLock;

use crate::domain::entities::{NewRedirect, Redirect};
use crate::domain::repositories::RedirectRepository;
use crate::error::AppError;

#[derive(Default)]
struct Inner {
    next_id: i64,
    by_key: BTreeMap<String, Redirect>,
}

/// Redirect repository backed by a process-local map.
///
/// Enforces key uniqueness the same way the PostgreSQL constraint does, which
/// makes it suitable for exercising allocation end to end without a database.
#[derive(Default)]
pub struct InMemoryRedirectRepository {
    inner: RwLock<Inner>,
}

impl InMemoryRedirectRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores `key` without going through allocation.
    ///
    /// Used to seed legacy or hand-picked keys, including malformed ones.
    pub async fn seed(&self, key: &str, target: &str) -> Result<Redirect, AppError> {
        self.insert(NewRedirect::new(key, target)).await
    }

    pub async fn len(&self) -> usize {
        self.inner.read().await.by_key.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.inner.read().await.by_key.is_empty()
    }
}

#[async_trait]
impl RedirectRepository for InMemoryRedirectRepository {
    async fn keys_with_length_at_most(&self, max_len: usize) -> Result<Vec<String>, AppError> {
        let inner = self.inner.read().await;

        Ok(inner
            .by_key
            .keys()
            .filter(|key| key.chars().count() <= max_len)
            .cloned()
            .collect())
    }

    async fn insert(&self, new_redirect: NewRedirect) -> Result<Redirect, AppError> {
        let mut inner = self.inner.write().await;

        if inner.by_key.contains_key(&new_redirect.key) {
            return Err(AppError::conflict(new_redirect.key));
        }

        inner.next_id += 1;
        let redirect = Redirect::new(
            inner.next_id,
            new_redirect.key,
            new_redirect.target,
            Utc::now(),
        );
        inner
            .by_key
            .insert(redirect.key.clone(), redirect.clone());

        Ok(redirect)
    }

    async fn find_by_key(&self, key: &str) -> Result<Option<Redirect>, AppError> {
        Ok(self.inner.read().await.by_key.get(key).cloned())
    }

    async fn delete(&self, key: &str) -> Result<bool, AppError> {
        Ok(self.inner.write().await.by_key.remove(key).is_some())
    }
}
