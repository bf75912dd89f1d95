//! Range index storage
//!
//! A sorted `Vec` of `(key, id)` entries. Positions are found by binary
//! search; insertion and removal shift the tail (O(n)), which keeps scans
//! cache-friendly and the structure simple.
//!
//! # Ordering
//!
//! Entries are ordered by key under the index [`Comparator`] (element-wise
//! for composite keys, shorter first on a shared prefix), then by id so that
//! equal keys still have a deterministic total order.

use std::cmp::Ordering;
use trellis_core::{Comparator, KeyValue, RecordId};

/// Inclusivity of the bounds of a range query
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RangeOptions {
    /// Include entries equal to the lower bound (default: true)
    pub inclusive_min: bool,
    /// Include entries equal to the upper bound (default: true)
    pub inclusive_max: bool,
}

impl RangeOptions {
    /// Both bounds included
    pub fn inclusive() -> Self {
        Self {
            inclusive_min: true,
            inclusive_max: true,
        }
    }

    /// Both bounds excluded
    pub fn exclusive() -> Self {
        Self {
            inclusive_min: false,
            inclusive_max: false,
        }
    }
}

impl Default for RangeOptions {
    fn default() -> Self {
        Self::inclusive()
    }
}

/// Sorted array of `(key, id)` entries
#[derive(Debug, Default)]
pub struct OrderedIndex {
    entries: Vec<(KeyValue, RecordId)>,
    comparator: Comparator,
}

impl OrderedIndex {
    /// Create a new empty index ordered by `comparator`
    pub fn new(comparator: Comparator) -> Self {
        Self {
            entries: Vec::new(),
            comparator,
        }
    }

    /// The scalar comparator of this index
    pub fn comparator(&self) -> &Comparator {
        &self.comparator
    }

    /// Total order over entries: key first, id as tie-break
    fn entry_order(&self, a: (&KeyValue, &RecordId), b: (&KeyValue, &RecordId)) -> Ordering {
        self.comparator
            .compare_keys(a.0, b.0)
            .then_with(|| a.1.cmp(b.1))
    }

    /// Position of the first entry whose key is not less than `key`
    fn lower_bound(&self, key: &KeyValue) -> usize {
        self.entries
            .partition_point(|(k, _)| self.comparator.compare_keys(k, key) == Ordering::Less)
    }

    /// Insert an entry at its sorted position
    pub fn insert(&mut self, key: KeyValue, id: RecordId) {
        let pos = self
            .entries
            .partition_point(|(k, i)| self.entry_order((k, i), (&key, &id)) == Ordering::Less);
        self.entries.insert(pos, (key, id));
    }

    /// Remove the entry for `id` stored under `key`
    ///
    /// Searches the run of entries with an equal key first; if the id is not
    /// there, falls back to a full scan. Returns whether an entry was removed.
    pub fn remove(&mut self, key: &KeyValue, id: &RecordId) -> bool {
        let mut pos = self.lower_bound(key);
        while pos < self.entries.len() {
            let (k, i) = &self.entries[pos];
            if self.comparator.compare_keys(k, key) != Ordering::Equal {
                break;
            }
            if i == id {
                self.entries.remove(pos);
                return true;
            }
            pos += 1;
        }

        match self.entries.iter().position(|(_, i)| i == id) {
            Some(pos) => {
                tracing::warn!(
                    target: "trellis::storage",
                    id = %id,
                    key = %key,
                    "Range entry missing from its key run, removed via linear scan"
                );
                self.entries.remove(pos);
                true
            }
            None => false,
        }
    }

    /// Ids whose keys lie between `min` and `max`, in index order
    ///
    /// Bounds are compared with the same rules as storage ordering.
    pub fn between(&self, min: &KeyValue, max: &KeyValue, options: RangeOptions) -> Vec<&RecordId> {
        let mut result = Vec::new();
        for (key, id) in &self.entries[self.lower_bound(min)..] {
            match self.comparator.compare_keys(key, max) {
                Ordering::Greater => break,
                Ordering::Equal if !options.inclusive_max => break,
                _ => {}
            }
            match self.comparator.compare_keys(key, min) {
                Ordering::Greater => result.push(id),
                Ordering::Equal if options.inclusive_min => result.push(id),
                _ => {}
            }
        }
        result
    }

    /// All entries in index order
    pub fn iter(&self) -> impl Iterator<Item = (&KeyValue, &RecordId)> {
        self.entries.iter().map(|(k, i)| (k, i))
    }

    /// Check that every adjacent pair is strictly increasing
    pub fn is_sorted(&self) -> bool {
        self.entries.windows(2).all(|pair| {
            self.entry_order((&pair[0].0, &pair[0].1), (&pair[1].0, &pair[1].1))
                == Ordering::Less
        })
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if the index is empty
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
