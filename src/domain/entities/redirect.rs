//! Redirect entity mapping a short key to its target.

use chrono::{DateTime, Utc};
use serde::Serialize;

/// A stored short key and the target it redirects to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct Redirect {
    pub id: i64,
    pub key: String,
    pub target: String,
    pub created_at: DateTime<Utc>,
}

impl Redirect {
    /// Creates a new Redirect instance.
    pub fn new(id: i64, key: String, target: String, created_at: DateTime<Utc>) -> Self {
        Self {
            id,
            key,
            target,
            created_at,
        }
    }
}

/// Input data for storing a new redirect.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewRedirect {
    pub key: String,
    pub target: String,
}

impl NewRedirect {
    pub fn new(key: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            target: target.into(),
        }
    }
}
