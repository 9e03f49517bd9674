//! Domain layer: keyspace logic, entities, and repository contracts.
//!
//! # Architecture
//!
//! - [`keyspace`] - Base62 codec, exclusion index, and key allocator
//! - [`entities`] - Stored redirect records
//! - [`repositories`] - Persistence gateway traits
//!
//! The domain layer has no dependencies on infrastructure. Keyspace code is
//! pure and synchronous; only the repository traits are async.
//!
//! # Allocation Flow
//!
//! 1. Stored keys are read through [`repositories::RedirectRepository`]
//! 2. [`keyspace::ExclusionIndex`] decodes them into occupied positions
//! 3. [`keyspace::KeyAllocator`] picks the lowest free position
//! 4. The encoded key is inserted, relying on the store's uniqueness check

pub mod entities;
pub mod keyspace;
pub mod repositories;
