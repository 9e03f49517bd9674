//! Business logic services for the application layer.

pub mod key_service;

pub use key_service::{KeyService, KeyServiceOptions, KeyspaceStats};
