//! Exclusion index: positions already occupied by stored keys.

use roaring::RoaringBitmap;
use tracing::{debug, warn};

use super::Keyspace;

/// Set of occupied keyspace positions.
///
/// Backed by a [`RoaringBitmap`], so a sparsely filled keyspace stays small
/// and ascending iteration is cheap.
#[derive(Debug, Clone, Default)]
pub struct ExclusionIndex {
    occupied: RoaringBitmap,
    integrity_faults: usize,
}

impl ExclusionIndex {
    /// Creates an empty index.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds the index from stored keys.
    ///
    /// Keys that fail to decode are data-integrity faults: each is logged and
    /// skipped so that one corrupt row cannot block allocation. Well-formed
    /// keys outside `keyspace` are ignored.
    pub fn build<I, S>(keyspace: &Keyspace, keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut index = Self::new();

        for key in keys {
            let key = key.as_ref();
            match keyspace.position_of(key) {
                Ok(Some(position)) => {
                    index.occupied.insert(position);
                }
                Ok(None) => {
                    debug!(key, "Stored key lies outside the keyspace, ignoring");
                }
                Err(e) => {
                    index.integrity_faults += 1;
                    metrics::counter!("short_key_integrity_faults_total").increment(1);
                    warn!(
                        key,
                        error = %e,
                        fault = "data_integrity",
                        "Stored short key failed to decode, excluding it from the index"
                    );
                }
            }
        }

        debug!(
            occupied = index.occupied.len(),
            faults = index.integrity_faults,
            "Exclusion index built"
        );

        index
    }

    /// Marks `position` as occupied. Returns false if it already was.
    pub fn insert(&mut self, position: u32) -> bool {
        self.occupied.insert(position)
    }

    /// Frees `position`. Returns false if it was not occupied.
    pub fn remove(&mut self, position: u32) -> bool {
        self.occupied.remove(position)
    }

    pub fn contains(&self, position: u32) -> bool {
        self.occupied.contains(position)
    }

    /// Number of occupied positions.
    pub fn len(&self) -> u64 {
        self.occupied.len()
    }

    pub fn is_empty(&self) -> bool {
        self.occupied.is_empty()
    }

    /// Number of stored keys skipped because they failed to decode.
    pub fn integrity_faults(&self) -> usize {
        self.integrity_faults
    }

    /// Returns the lowest position in `[0, capacity)` not in the index.
    ///
    /// Walks occupied positions in ascending order and stops at the first
    /// gap, so the cost is bounded by the number of occupied positions below
    /// the answer.
    pub fn first_free(&self, capacity: u32) -> Option<u32> {
        let mut expected: u32 = 0;

        for position in self.occupied.iter() {
            if expected >= capacity || position != expected {
                break;
            }
            expected += 1;
        }

        (expected < capacity).then_some(expected)
    }
}

impl FromIterator<u32> for ExclusionIndex {
    fn from_iter<T: IntoIterator<Item = u32>>(iter: T) -> Self {
        Self {
            occupied: iter.into_iter().collect(),
            integrity_faults: 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_decodes_stored_keys() {
        let keyspace = Keyspace::default();
        let index = ExclusionIndex::build(&keyspace, ["0", "1", "10", "zzz"]);

        assert_eq!(index.len(), 4);
        assert!(index.contains(0));
        assert!(index.contains(1));
        assert!(index.contains(62));
        assert!(index.contains(238_327));
        assert!(!index.contains(2));
        assert_eq!(index.integrity_faults(), 0);
    }

    #[test]
    fn test_build_skips_malformed_keys() {
        let keyspace = Keyspace::default();
        let index = ExclusionIndex::build(&keyspace, ["0", "a-b", "", "1"]);

        assert_eq!(index.len(), 2);
        assert_eq!(index.integrity_faults(), 2);
    }

    #[test]
    fn test_build_ignores_keys_outside_keyspace() {
        let keyspace = Keyspace::with_capacity(4).unwrap();
        let index = ExclusionIndex::build(&keyspace, ["0", "5", "10"]);

        assert_eq!(index.len(), 1);
        assert!(index.contains(0));
        assert_eq!(index.integrity_faults(), 0);
    }

    #[test]
    fn test_build_ignores_overlong_keys_that_overflow() {
        let keyspace = Keyspace::default();
        let index = ExclusionIndex::build(&keyspace, ["00", "zzzzzzzzzzzzzzzz"]);

        assert_eq!(index.len(), 1);
        assert!(index.contains(0));
        assert_eq!(index.integrity_faults(), 0);
    }

    #[test]
    fn test_build_collapses_duplicates() {
        let keyspace = Keyspace::default();
        let index = ExclusionIndex::build(&keyspace, vec!["A".to_string(), "A".to_string()]);
        assert_eq!(index.len(), 1);
    }

    #[test]
    fn test_first_free_on_empty_index() {
        assert_eq!(ExclusionIndex::new().first_free(10), Some(0));
    }

    #[test]
    fn test_first_free_finds_gap() {
        let index: ExclusionIndex = [0, 1, 2, 4, 5].into_iter().collect();
        assert_eq!(index.first_free(10), Some(3));
    }

    #[test]
    fn test_first_free_after_contiguous_prefix() {
        let index: ExclusionIndex = (0..3).collect();
        assert_eq!(index.first_free(4), Some(3));
        assert_eq!(index.first_free(3), None);
    }

    #[test]
    fn test_insert_and_remove() {
        let mut index: ExclusionIndex = (0..3).collect();

        assert!(index.insert(3));
        assert!(!index.insert(3));
        assert_eq!(index.first_free(10), Some(4));

        assert!(index.remove(1));
        assert!(!index.remove(1));
        assert_eq!(index.first_free(10), Some(1));
    }
}
