//! Short key registration and lookup service.

use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::Serialize;
use tokio::sync::Mutex;
use tokio_retry::RetryIf;
use tokio_retry::strategy::{ExponentialBackoff, jitter};
use tracing::{debug, info, warn};

use crate::config::{Config, IndexMode};
use crate::domain::entities::{NewRedirect, Redirect};
use crate::domain::keyspace::{ExclusionIndex, KeyAllocator, Keyspace, ShortKey, codec};
use crate::domain::repositories::RedirectRepository;
use crate::error::AppError;

/// Upper bound for a single backoff delay between conflicting attempts.
const MAX_RETRY_DELAY: Duration = Duration::from_millis(500);

/// Tuning for [`KeyService`].
#[derive(Debug, Clone, Copy)]
pub struct KeyServiceOptions {
    pub index_mode: IndexMode,
    /// Retries after a unique violation, on top of the first attempt.
    pub max_retries: usize,
    pub retry_base_ms: u64,
    /// Allocations a warm index may serve before it is rebuilt.
    pub index_refresh_after: u32,
    /// Age after which a warm index is rebuilt.
    pub index_max_age: Duration,
}

impl Default for KeyServiceOptions {
    fn default() -> Self {
        Self {
            index_mode: IndexMode::Rescan,
            max_retries: 5,
            retry_base_ms: 10,
            index_refresh_after: 100,
            index_max_age: Duration::from_secs(30),
        }
    }
}

impl From<&Config> for KeyServiceOptions {
    fn from(config: &Config) -> Self {
        Self {
            index_mode: config.index_mode,
            max_retries: config.allocation_max_retries,
            retry_base_ms: config.allocation_retry_base_ms,
            index_refresh_after: config.index_refresh_after,
            index_max_age: Duration::from_secs(config.index_max_age_secs),
        }
    }
}

/// Occupancy summary of the keyspace.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct KeyspaceStats {
    pub max_key_len: usize,
    pub capacity: u32,
    pub occupied: u64,
    pub free: u64,
    pub fill_ratio: f64,
    /// Stored keys skipped because they are not valid base62.
    pub integrity_faults: usize,
    /// Key the next registration would receive, if any is left.
    pub next_key: Option<String>,
}

/// An exclusion index kept between calls in [`IndexMode::Incremental`].
#[derive(Debug)]
struct WarmIndex {
    index: ExclusionIndex,
    built_at: Instant,
    served: u32,
}

impl WarmIndex {
    fn new(index: ExclusionIndex) -> Self {
        Self {
            index,
            built_at: Instant::now(),
            served: 0,
        }
    }

    /// Deletions made by other writers are only seen after a rebuild, so the
    /// index is trusted for a bounded number of allocations and time.
    fn is_fresh(&self, options: &KeyServiceOptions) -> bool {
        self.served < options.index_refresh_after
            && self.built_at.elapsed() < options.index_max_age
    }
}

/// Service allocating short keys and persisting their redirects.
///
/// Registration reads the stored keys, builds an [`ExclusionIndex`], picks the
/// lowest free position and inserts it. A unique violation on insert means a
/// concurrent writer took the same key, so the whole sequence is retried with
/// jittered exponential backoff.
///
/// With [`IndexMode::Incremental`] the index is kept between calls and
/// updated in place; it is dropped after a conflict so the next attempt
/// rescans the datastore. Keys freed by other writers become visible once
/// the warm index is rebuilt, which happens after
/// [`KeyServiceOptions::index_refresh_after`] allocations or
/// [`KeyServiceOptions::index_max_age`], whichever comes first.
pub struct KeyService<R: RedirectRepository> {
    repository: Arc<R>,
    allocator: KeyAllocator,
    options: KeyServiceOptions,
    warm_index: Mutex<Option<WarmIndex>>,
}

impl<R: RedirectRepository> KeyService<R> {
    /// Creates a new key service.
    pub fn new(repository: Arc<R>, keyspace: Keyspace, options: KeyServiceOptions) -> Self {
        Self {
            repository,
            allocator: KeyAllocator::new(keyspace),
            options,
            warm_index: Mutex::new(None),
        }
    }

    pub fn keyspace(&self) -> &Keyspace {
        self.allocator.keyspace()
    }

    /// Builds a fresh exclusion index from the datastore.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Database`] if stored keys cannot be read.
    pub async fn load_index(&self) -> Result<ExclusionIndex, AppError> {
        let keys = self
            .repository
            .keys_with_length_at_most(self.keyspace().max_key_len())
            .await?;

        Ok(ExclusionIndex::build(self.keyspace(), keys))
    }

    /// Returns the key the next registration would receive, without storing it.
    ///
    /// In incremental mode the answer comes from the warm index, so it agrees
    /// with the next [`register`](Self::register) call of this service.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::KeyspaceExhausted`] if no position is free.
    /// Returns [`AppError::Database`] on database errors.
    pub async fn allocate(&self) -> Result<ShortKey, AppError> {
        match self.options.index_mode {
            IndexMode::Rescan => {
                let index = self.load_index().await?;
                self.allocator.next_free(&index)
            }
            IndexMode::Incremental => {
                let mut slot = self.warm_index.lock().await;
                let (mut warm, reused) = self.checkout_warm(slot.take()).await?;

                let next = match self.allocator.next_free(&warm.index) {
                    Err(AppError::KeyspaceExhausted { .. }) if reused => {
                        warm = WarmIndex::new(self.load_index().await?);
                        self.allocator.next_free(&warm.index)
                    }
                    result => result,
                };

                *slot = Some(warm);
                next
            }
        }
    }

    /// Allocates a key for `target` and stores the redirect.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::UniqueConstraintViolation`] if every attempt lost a
    /// race with a concurrent writer.
    /// Returns [`AppError::KeyspaceExhausted`] if no position is free.
    /// Returns [`AppError::Database`] on database errors.
    pub async fn register(&self, target: &str) -> Result<Redirect, AppError> {
        let strategy = ExponentialBackoff::from_millis(2)
            .factor(self.options.retry_base_ms)
            .max_delay(MAX_RETRY_DELAY)
            .map(jitter)
            .take(self.options.max_retries);

        RetryIf::start(
            strategy,
            || self.try_register(target),
            AppError::is_conflict,
        )
        .await
    }

    /// Looks up the redirect stored under `key`.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::InvalidKey`] if `key` is not base62.
    /// Returns [`AppError::NotFound`] if nothing is stored under `key`.
    pub async fn resolve(&self, key: &str) -> Result<Redirect, AppError> {
        codec::decode(key)?;

        self.repository
            .find_by_key(key)
            .await?
            .ok_or_else(|| AppError::not_found(key))
    }

    /// Deletes the redirect stored under `key`, returning its position to the
    /// pool of free keys.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::InvalidKey`] if `key` is not base62.
    /// Returns [`AppError::NotFound`] if nothing is stored under `key`.
    pub async fn release(&self, key: &str) -> Result<(), AppError> {
        // Non-canonical spellings such as "01" share a position with "1"
        // and must not free it.
        let position = self
            .keyspace()
            .position_of(key)?
            .filter(|&position| codec::encode(u64::from(position)) == key);

        if !self.repository.delete(key).await? {
            return Err(AppError::not_found(key));
        }

        if let Some(position) = position {
            let mut slot = self.warm_index.lock().await;
            if let Some(warm) = slot.as_mut() {
                warm.index.remove(position);
            }
        }

        info!(key, "Short key released");
        Ok(())
    }

    /// Summarises keyspace occupancy from a fresh scan.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Database`] on database errors.
    pub async fn stats(&self) -> Result<KeyspaceStats, AppError> {
        let index = self.load_index().await?;
        let capacity = self.keyspace().capacity();
        let occupied = index.len();

        metrics::gauge!("keyspace_occupied_positions").set(occupied as f64);

        Ok(KeyspaceStats {
            max_key_len: self.keyspace().max_key_len(),
            capacity,
            occupied,
            free: u64::from(capacity).saturating_sub(occupied),
            fill_ratio: occupied as f64 / f64::from(capacity),
            integrity_faults: index.integrity_faults(),
            next_key: self.allocator.next_free(&index).ok().map(ShortKey::into_string),
        })
    }

    /// One allocate-then-insert attempt.
    async fn try_register(&self, target: &str) -> Result<Redirect, AppError> {
        match self.options.index_mode {
            IndexMode::Rescan => {
                let mut index = self.load_index().await?;
                self.insert_next(&mut index, target).await
            }
            IndexMode::Incremental => {
                let mut slot = self.warm_index.lock().await;
                let (mut warm, reused) = self.checkout_warm(slot.take()).await?;

                let attempt = self.insert_next(&mut warm.index, target).await;
                let redirect = match attempt {
                    // Another process may have freed keys since the index was built.
                    Err(AppError::KeyspaceExhausted { .. }) if reused => {
                        debug!("Warm index reports exhaustion, rescanning");
                        warm = WarmIndex::new(self.load_index().await?);
                        self.insert_next(&mut warm.index, target).await?
                    }
                    result => result?,
                };

                warm.served += 1;
                *slot = Some(warm);
                Ok(redirect)
            }
        }
    }

    /// Reuses `current` while it is fresh, otherwise rebuilds it from the
    /// datastore. The flag is true when the index was reused.
    async fn checkout_warm(
        &self,
        current: Option<WarmIndex>,
    ) -> Result<(WarmIndex, bool), AppError> {
        match current {
            Some(warm) if warm.is_fresh(&self.options) => Ok((warm, true)),
            stale => {
                if let Some(warm) = stale {
                    debug!(served = warm.served, "Warm index expired, rescanning");
                }
                Ok((WarmIndex::new(self.load_index().await?), false))
            }
        }
    }

    /// Picks the lowest free key in `index`, stores it, and records it in the
    /// index on success.
    async fn insert_next(
        &self,
        index: &mut ExclusionIndex,
        target: &str,
    ) -> Result<Redirect, AppError> {
        let key = self.allocator.next_free(index)?;

        match self
            .repository
            .insert(NewRedirect::new(key.as_str(), target))
            .await
        {
            Ok(redirect) => {
                index.insert(key.position());
                metrics::counter!("short_keys_allocated_total").increment(1);
                info!(key = %key, position = key.position(), "Short key allocated");
                Ok(redirect)
            }
            Err(e) => {
                if e.is_conflict() {
                    metrics::counter!("short_key_conflicts_total").increment(1);
                    warn!(key = %key, "Short key taken by a concurrent writer");
                }
                Err(e)
            }
        }
    }
}
