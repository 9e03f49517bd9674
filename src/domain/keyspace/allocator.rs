//! Lowest-free-position key allocator.

use tracing::debug;

use super::{ExclusionIndex, Keyspace, ShortKey};
use crate::error::AppError;

/// Picks the next short key from a [`Keyspace`].
///
/// Allocation is an ascending scan: the lowest position not present in the
/// exclusion index wins. Order is deterministic and therefore guessable;
/// short keys are identifiers, not secrets.
#[derive(Debug, Clone, Copy, Default)]
pub struct KeyAllocator {
    keyspace: Keyspace,
}

impl KeyAllocator {
    pub fn new(keyspace: Keyspace) -> Self {
        Self { keyspace }
    }

    pub fn keyspace(&self) -> &Keyspace {
        &self.keyspace
    }

    /// Returns the key for the lowest position absent from `index`.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::KeyspaceExhausted`] when every position is occupied.
    pub fn next_free(&self, index: &ExclusionIndex) -> Result<ShortKey, AppError> {
        let capacity = self.keyspace.capacity();

        let position = index
            .first_free(capacity)
            .ok_or(AppError::KeyspaceExhausted { capacity })?;

        let key = ShortKey::from_position(position);
        debug!(key = %key, position, occupied = index.len(), "Selected free short key");

        Ok(key)
    }
}
