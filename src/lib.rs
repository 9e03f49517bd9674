//! # reurl
//!
//! Short-link key allocation over a bounded base62 keyspace.
//!
//! Short keys are base62 strings (`0-9A-Za-z`) of at most K characters
//! (K = 3 by default, 238,328 keys). A new key is the lowest keyspace
//! position not taken by a stored key, so keys stay as short as possible.
//!
//! ## Architecture
//!
//! - **Domain Layer** ([`domain`]) - Base62 codec, exclusion index, allocator, repository traits
//! - **Application Layer** ([`application`]) - Allocate-then-insert orchestration with retry
//! - **Infrastructure Layer** ([`infrastructure`]) - PostgreSQL and in-memory repositories
//!
//! ## Concurrency
//!
//! Two writers may pick the same key. The datastore's unique constraint
//! rejects the second insert and [`application::services::KeyService`]
//! retries the whole sequence.
//!
//! ## Configuration
//!
//! Loaded from environment variables via [`config::Config`].

pub mod application;
pub mod config;
pub mod domain;
pub mod error;
pub mod infrastructure;
pub mod telemetry;

pub use error::AppError;

/// Commonly used types for external consumers.
pub mod prelude {
    pub use crate::application::services::{KeyService, KeyServiceOptions, KeyspaceStats};
    pub use crate::config::IndexMode;
    pub use crate::domain::entities::{NewRedirect, Redirect};
    pub use crate::domain::keyspace::{ExclusionIndex, KeyAllocator, Keyspace, ShortKey};
    pub use crate::domain::repositories::RedirectRepository;
    pub use crate::error::AppError;
}
