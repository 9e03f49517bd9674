//! Repository implementations.
//!
//! # Repositories
//!
//! - [`PgRedirectRepository`] - PostgreSQL storage through SQLx
//! - [`InMemoryRedirectRepository`] - Process-local map for tests and experiments

pub mod memory_redirect_repository;
pub mod pg_redirect_repository;

pub use memory_redirect_repository::InMemoryRedirectRepository;
pub use pg_redirect_repository::PgRedirectRepository;
