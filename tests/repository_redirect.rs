//! PostgreSQL integration tests. `#[sqlx::test]` creates a fresh database
//! per test from `DATABASE_URL` and applies `migrations/`.

mod common;

use reurl::domain::entities::NewRedirect;
use reurl::domain::repositories::RedirectRepository;
use reurl::error::AppError;
use reurl::infrastructure::persistence::PgRedirectRepository;
use sqlx::PgPool;
use std::sync::Arc;

#[sqlx::test]
async fn test_insert_redirect(pool: PgPool) {
    let repo = PgRedirectRepository::new(Arc::new(pool));

    let result = repo
        .insert(NewRedirect::new("1A", "https://example.com"))
        .await;

    assert!(result.is_ok());
    let redirect = result.unwrap();
    assert_eq!(redirect.key, "1A");
    assert_eq!(redirect.target, "https://example.com");
}

#[sqlx::test]
async fn test_insert_duplicate_key(pool: PgPool) {
    common::create_test_redirect(&pool, "1A", "https://a.example").await;
    let repo = PgRedirectRepository::new(Arc::new(pool));

    let result = repo
        .insert(NewRedirect::new("1A", "https://b.example"))
        .await;

    match result {
        Err(AppError::UniqueConstraintViolation { key }) => assert_eq!(key, "1A"),
        other => panic!("expected a unique violation, got {other:?}"),
    }
}

#[sqlx::test]
async fn test_keys_with_length_at_most(pool: PgPool) {
    for key in ["0", "zz", "zzz", "1000"] {
        common::create_test_redirect(&pool, key, "https://example.com").await;
    }
    let repo = PgRedirectRepository::new(Arc::new(pool));

    let mut keys = repo.keys_with_length_at_most(3).await.unwrap();
    keys.sort();

    assert_eq!(keys, vec!["0", "zz", "zzz"]);
}

#[sqlx::test]
async fn test_find_and_delete(pool: PgPool) {
    common::create_test_redirect(&pool, "xyz", "https://example.com").await;
    let repo = PgRedirectRepository::new(Arc::new(pool));

    let found = repo.find_by_key("xyz").await.unwrap();
    assert_eq!(found.unwrap().target, "https://example.com");

    assert!(repo.delete("xyz").await.unwrap());
    assert!(!repo.delete("xyz").await.unwrap());
    assert!(repo.find_by_key("xyz").await.unwrap().is_none());
}

#[sqlx::test]
async fn test_service_round_trip(pool: PgPool) {
    common::create_test_redirect(&pool, "0", "https://a.example").await;
    common::create_test_redirect(&pool, "2", "https://c.example").await;
    let service = common::create_pg_service(pool);

    let redirect = service.register("https://b.example").await.unwrap();
    assert_eq!(redirect.key, "1");

    let redirect = service.register("https://d.example").await.unwrap();
    assert_eq!(redirect.key, "3");

    let stats = service.stats().await.unwrap();
    assert_eq!(stats.occupied, 4);
    assert_eq!(stats.next_key.as_deref(), Some("4"));
}

#[sqlx::test]
async fn test_service_retries_past_conflicting_row(pool: PgPool) {
    common::create_test_redirect(&pool, "0", "https://a.example").await;
    let repo = PgRedirectRepository::new(Arc::new(pool.clone()));

    // A second writer took "0" after the first scan; the insert must be
    // reported as a conflict rather than a generic database error.
    let conflict = repo
        .insert(NewRedirect::new("0", "https://b.example"))
        .await
        .unwrap_err();
    assert!(conflict.is_conflict());

    let service = common::create_pg_service(pool);
    assert_eq!(service.register("https://b.example").await.unwrap().key, "1");
}
