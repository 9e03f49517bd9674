//! Infrastructure layer for external integrations.
//!
//! This layer implements interfaces defined by the domain layer.
//!
//! # Modules
//!
//! - [`database`] - PostgreSQL pool setup and migrations
//! - [`persistence`] - Repository implementations (PostgreSQL and in-memory)

pub mod database;
pub mod persistence;
