#![allow(dead_code)]

use reurl::application::services::{KeyService, KeyServiceOptions};
use reurl::config::IndexMode;
use reurl::domain::keyspace::Keyspace;
use reurl::infrastructure::persistence::{InMemoryRedirectRepository, PgRedirectRepository};
use sqlx::PgPool;
use std::sync::Arc;
use std::time::Duration;

pub fn options(index_mode: IndexMode) -> KeyServiceOptions {
    KeyServiceOptions {
        index_mode,
        max_retries: 5,
        retry_base_ms: 1,
        index_refresh_after: 100,
        index_max_age: Duration::from_secs(60),
    }
}

pub fn create_memory_service(
    keyspace: Keyspace,
    index_mode: IndexMode,
) -> (
    Arc<InMemoryRedirectRepository>,
    KeyService<InMemoryRedirectRepository>,
) {
    let repo = Arc::new(InMemoryRedirectRepository::new());
    let service = KeyService::new(repo.clone(), keyspace, options(index_mode));
    (repo, service)
}

/// Builds a service on an existing in-memory store, so several services can
/// act as independent writers.
pub fn create_service_on(
    repo: Arc<InMemoryRedirectRepository>,
    keyspace: Keyspace,
    options: KeyServiceOptions,
) -> KeyService<InMemoryRedirectRepository> {
    KeyService::new(repo, keyspace, options)
}

pub fn create_pg_service(pool: PgPool) -> KeyService<PgRedirectRepository> {
    let repo = Arc::new(PgRedirectRepository::new(Arc::new(pool)));
    KeyService::new(repo, Keyspace::default(), options(IndexMode::Rescan))
}

pub async fn create_test_redirect(pool: &PgPool, key: &str, target: &str) {
    sqlx::query("INSERT INTO redirects (key, target) VALUES ($1, $2)")
        .bind(key)
        .bind(target)
        .execute(pool)
        .await
        .unwrap();
}
