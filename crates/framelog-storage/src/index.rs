//! Ordered index from record key to log offset.
//!
//! The [`OrderedIndex`] maps a logical record number to the byte offset of
//! the record in the data log, enabling O(log n) random access to any record
//! without scanning the log.
//!
//! The index lives in memory. It is persisted as a whole by the
//! [`SnapshotStore`](crate::SnapshotStore) once building is complete and
//! reloaded as a whole for querying; it is never patched on disk.

use std::collections::BTreeMap;

use framelog_types::{IndexEntry, Offset, RecordKey};

/// Maps record key → byte offset, ordered by key.
///
/// # Invariants
///
/// - Keys are unique; inserting an existing key replaces its offset
/// - [`ascend`](Self::ascend) yields keys in strictly increasing order
/// - `len()` equals the number of distinct keys ever inserted
#[derive(Default, Debug, Clone, PartialEq, Eq)]
pub struct OrderedIndex {
    entries: BTreeMap<RecordKey, Offset>,
}

impl OrderedIndex {
    /// Creates an empty index.
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts `key → offset`, replacing any previous offset for `key`.
    ///
    /// Returns the replaced offset, if there was one. O(log n).
    pub fn insert_or_replace(&mut self, key: RecordKey, offset: Offset) -> Option<Offset> {
        debug_assert!(offset.as_i64() >= 0, "offset {offset} must not be negative");

        let prev_len = self.entries.len();
        let replaced = self.entries.insert(key, offset);

        // Postcondition: length grows by one unless the key already existed
        debug_assert_eq!(
            self.entries.len(),
            prev_len + usize::from(replaced.is_none())
        );
        replaced
    }

    /// Looks up the offset for `key`.
    ///
    /// Returns `None` if the key was never inserted. An absent key is a normal
    /// result here; callers decide whether it is an error.
    #[must_use]
    pub fn get(&self, key: RecordKey) -> Option<Offset> {
        self.entries.get(&key).copied()
    }

    /// Iterates all entries in strictly increasing key order.
    ///
    /// The iterator is lazy and borrows the index; calling `ascend` again
    /// restarts from the smallest key.
    pub fn ascend(&self) -> impl Iterator<Item = IndexEntry> + '_ {
        self.entries
            .iter()
            .map(|(&key, &offset)| IndexEntry::new(key, offset))
    }

    /// Returns the number of indexed keys.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if the index contains no keys.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns the smallest key, if any.
    #[must_use]
    pub fn first_key(&self) -> Option<RecordKey> {
        self.entries.keys().next().copied()
    }

    /// Returns the largest key, if any.
    #[must_use]
    pub fn last_key(&self) -> Option<RecordKey> {
        self.entries.keys().next_back().copied()
    }
}

impl FromIterator<IndexEntry> for OrderedIndex {
    /// Builds an index by inserting entries in iteration order; later
    /// duplicates replace earlier ones.
    fn from_iter<I: IntoIterator<Item = IndexEntry>>(iter: I) -> Self {
        let mut index = OrderedIndex::new();
        for entry in iter {
            index.insert_or_replace(entry.key, entry.offset);
        }
        index
    }
}
