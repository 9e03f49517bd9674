//! Application layer services.
//!
//! Services coordinate repository calls with the pure keyspace logic in
//! [`crate::domain::keyspace`].
//!
//! # Available Services
//!
//! - [`services::key_service::KeyService`] - Short key allocation, lookup, and release

pub mod services;
