//! Bounded base62 keyspace and short key allocation.
//!
//! # Components
//!
//! - [`codec`] - Base62 encoding and decoding
//! - [`exclusion`] - Set of positions already taken by stored keys
//! - [`allocator`] - Lowest-free-position search
//!
//! A [`Keyspace`] covers every position representable with at most
//! `max_key_len` base62 digits, i.e. `[0, 62^max_key_len)`. Positions are
//! stored as `u32`, which caps `max_key_len` at [`MAX_KEY_LEN`].

pub mod allocator;
pub mod codec;
pub mod exclusion;

pub use allocator::KeyAllocator;
pub use codec::DecodeError;
pub use exclusion::ExclusionIndex;

use std::fmt;
use thiserror::Error;

/// Largest supported key length (62^5 fits in `u32`, 62^6 does not).
pub const MAX_KEY_LEN: usize = 5;

/// Key length used when nothing else is configured.
pub const DEFAULT_KEY_LEN: usize = 3;

/// Errors raised when constructing a [`Keyspace`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum KeyspaceError {
    #[error("key length must be between 1 and {max}, got {0}", max = MAX_KEY_LEN)]
    UnsupportedLength(usize),

    #[error("capacity {capacity} is out of range for keys of at most {max_key_len} characters")]
    UnsupportedCapacity { capacity: u32, max_key_len: usize },
}

/// The range of positions short keys are allocated from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Keyspace {
    max_key_len: usize,
    capacity: u32,
}

impl Keyspace {
    /// Creates the full keyspace for keys of at most `max_key_len` characters.
    ///
    /// # Errors
    ///
    /// Returns [`KeyspaceError::UnsupportedLength`] unless
    /// `1 <= max_key_len <= MAX_KEY_LEN`.
    pub fn new(max_key_len: usize) -> Result<Self, KeyspaceError> {
        if !(1..=MAX_KEY_LEN).contains(&max_key_len) {
            return Err(KeyspaceError::UnsupportedLength(max_key_len));
        }

        Ok(Self {
            max_key_len,
            capacity: 62u32.pow(max_key_len as u32),
        })
    }

    /// Creates a keyspace truncated to the first `capacity` positions.
    ///
    /// Keys still use the shortest length able to represent `capacity - 1`.
    /// Mostly useful for exercising exhaustion without 62^K entries.
    ///
    /// # Errors
    ///
    /// Returns [`KeyspaceError::UnsupportedCapacity`] if `capacity` is zero or
    /// larger than 62^[`MAX_KEY_LEN`].
    pub fn with_capacity(capacity: u32) -> Result<Self, KeyspaceError> {
        if capacity == 0 {
            return Err(KeyspaceError::UnsupportedCapacity {
                capacity,
                max_key_len: 0,
            });
        }

        let max_key_len = codec::encode(u64::from(capacity - 1)).len();
        let full = Self::new(max_key_len).map_err(|_| KeyspaceError::UnsupportedCapacity {
            capacity,
            max_key_len,
        })?;

        Ok(Self { capacity, ..full })
    }

    /// Maximum number of characters in a key of this keyspace.
    pub fn max_key_len(&self) -> usize {
        self.max_key_len
    }

    /// Number of positions in the keyspace.
    pub fn capacity(&self) -> u32 {
        self.capacity
    }

    /// Returns true if `position` lies inside the keyspace.
    pub fn contains(&self, position: u64) -> bool {
        position < u64::from(self.capacity)
    }

    /// Decodes `key` into a position of this keyspace.
    ///
    /// Returns `Ok(None)` for well-formed keys that are too long or decode
    /// past the end of the keyspace.
    ///
    /// # Errors
    ///
    /// Propagates [`DecodeError`] for malformed keys.
    pub fn position_of(&self, key: &str) -> Result<Option<u32>, DecodeError> {
        if key.len() > self.max_key_len {
            codec::validate(key)?;
            return Ok(None);
        }

        let value = codec::decode(key)?;
        Ok(self.contains(value).then_some(value as u32))
    }
}

impl Default for Keyspace {
    fn default() -> Self {
        Self {
            max_key_len: DEFAULT_KEY_LEN,
            capacity: 62u32.pow(DEFAULT_KEY_LEN as u32),
        }
    }
}

/// An allocated short key together with its keyspace position.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ShortKey {
    key: String,
    position: u32,
}

impl ShortKey {
    /// Builds the key for `position`.
    pub fn from_position(position: u32) -> Self {
        Self {
            key: codec::encode(u64::from(position)),
            position,
        }
    }

    pub fn as_str(&self) -> &str {
        &self.key
    }

    pub fn position(&self) -> u32 {
        self.position
    }

    pub fn into_string(self) -> String {
        self.key
    }
}

impl fmt::Display for ShortKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.key)
    }
}

impl AsRef<str> for ShortKey {
    fn as_ref(&self) -> &str {
        &self.key
    }
}
