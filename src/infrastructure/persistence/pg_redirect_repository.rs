//! PostgreSQL implementation of the redirect repository.

use async_trait::async_trait;
use sqlx::PgPool;
use std::sync::Arc;

use crate::domain::entities::{NewRedirect, Redirect};
use crate::domain::repositories::RedirectRepository;
use crate::error::{AppError, map_sqlx_error};

/// PostgreSQL repository for redirect storage.
///
/// Relies on the `redirects_key_key` unique constraint to reject duplicate keys.
pub struct PgRedirectRepository {
    pool: Arc<PgPool>,
}

impl PgRedirectRepository {
    /// Creates a new repository with a database connection pool.
    pub fn new(pool: Arc<PgPool>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RedirectRepository for PgRedirectRepository {
    async fn keys_with_length_at_most(&self, max_len: usize) -> Result<Vec<String>, AppError> {
        let max_len = i32::try_from(max_len).unwrap_or(i32::MAX);

        let keys = sqlx::query_scalar::<_, String>(
            "SELECT key FROM redirects WHERE char_length(key) <= $1",
        )
        .bind(max_len)
        .fetch_all(self.pool.as_ref())
        .await?;

        Ok(keys)
    }

    async fn insert(&self, new_redirect: NewRedirect) -> Result<Redirect, AppError> {
        sqlx::query_as::<_, Redirect>(
            r#"
            INSERT INTO redirects (key, target)
            VALUES ($1, $2)
            RETURNING id, key, target, created_at
            "#,
        )
        .bind(&new_redirect.key)
        .bind(&new_redirect.target)
        .fetch_one(self.pool.as_ref())
        .await
        .map_err(|e| map_sqlx_error(e, &new_redirect.key))
    }

    async fn find_by_key(&self, key: &str) -> Result<Option<Redirect>, AppError> {
        let redirect = sqlx::query_as::<_, Redirect>(
            "SELECT id, key, target, created_at FROM redirects WHERE key = $1",
        )
        .bind(key)
        .fetch_optional(self.pool.as_ref())
        .await?;

        Ok(redirect)
    }

    async fn delete(&self, key: &str) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM redirects WHERE key = $1")
            .bind(key)
            .execute(self.pool.as_ref())
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
