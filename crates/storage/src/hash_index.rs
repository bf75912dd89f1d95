//! Equality index storage
//!
//! Maps the canonical form of a key to the record ids holding it:
//! - unique: canonical key → exactly one id
//! - non-unique: canonical key → set of ids
//!
//! Canonicalization ([`KeyValue::canonical`]) is the only place key equality
//! is decided for this storage.

use rustc_hash::FxHashMap;
use std::collections::BTreeSet;
use trellis_core::{KeyValue, RecordId};

/// A unique index already maps the key to a different id
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UniqueConflict {
    /// Canonical form of the conflicting key
    pub key: String,
    /// Id currently holding the key
    pub existing: RecordId,
}

#[derive(Debug)]
enum Slots {
    Unique(FxHashMap<String, RecordId>),
    Multi(FxHashMap<String, BTreeSet<RecordId>>),
}

/// Equality index: canonical key → id(s)
///
/// Empty id sets are removed so the map never accumulates dead keys.
#[derive(Debug)]
pub struct HashIndex {
    slots: Slots,
}

impl HashIndex {
    /// Create a new empty index
    pub fn new(unique: bool) -> Self {
        let slots = if unique {
            Slots::Unique(FxHashMap::default())
        } else {
            Slots::Multi(FxHashMap::default())
        };
        Self { slots }
    }

    /// Whether each key maps to at most one id
    pub fn is_unique(&self) -> bool {
        matches!(self.slots, Slots::Unique(_))
    }

    /// Check whether `id` could be added under `key` without a conflict
    ///
    /// Never fails for non-unique indexes. Re-adding the id that already
    /// holds the key is not a conflict.
    pub fn check(&self, key: &KeyValue, id: &RecordId) -> Result<(), UniqueConflict> {
        if let Slots::Unique(map) = &self.slots {
            let canonical = key.canonical();
            if let Some(existing) = map.get(&canonical) {
                if existing != id {
                    return Err(UniqueConflict {
                        key: canonical,
                        existing: existing.clone(),
                    });
                }
            }
        }
        Ok(())
    }

    /// Add `id` under `key`
    ///
    /// On conflict the index is left unchanged.
    pub fn insert(&mut self, key: &KeyValue, id: RecordId) -> Result<(), UniqueConflict> {
        let canonical = key.canonical();
        match &mut self.slots {
            Slots::Unique(map) => {
                if let Some(existing) = map.get(&canonical) {
                    if *existing != id {
                        return Err(UniqueConflict {
                            key: canonical,
                            existing: existing.clone(),
                        });
                    }
                }
                map.insert(canonical, id);
            }
            Slots::Multi(map) => {
                map.entry(canonical).or_default().insert(id);
            }
        }
        Ok(())
    }

    /// Remove `id` from `key`
    ///
    /// A unique mapping is only deleted if it points at `id`. Returns whether
    /// anything was removed.
    pub fn remove(&mut self, key: &KeyValue, id: &RecordId) -> bool {
        let canonical = key.canonical();
        match &mut self.slots {
            Slots::Unique(map) => {
                if map.get(&canonical) == Some(id) {
                    map.remove(&canonical);
                    true
                } else {
                    false
                }
            }
            Slots::Multi(map) => {
                let Some(ids) = map.get_mut(&canonical) else {
                    return false;
                };
                let removed = ids.remove(id);
                if ids.is_empty() {
                    map.remove(&canonical);
                }
                removed
            }
        }
    }

    /// First id stored under `key` (smallest id for non-unique indexes)
    pub fn first(&self, key: &KeyValue) -> Option<&RecordId> {
        let canonical = key.canonical();
        match &self.slots {
            Slots::Unique(map) => map.get(&canonical),
            Slots::Multi(map) => map.get(&canonical).and_then(|ids| ids.iter().next()),
        }
    }

    /// All ids stored under `key`, in id order
    pub fn get(&self, key: &KeyValue) -> Vec<&RecordId> {
        let canonical = key.canonical();
        match &self.slots {
            Slots::Unique(map) => map.get(&canonical).into_iter().collect(),
            Slots::Multi(map) => map
                .get(&canonical)
                .map(|ids| ids.iter().collect())
                .unwrap_or_default(),
        }
    }

    /// Number of ids stored under `key`
    pub fn count(&self, key: &KeyValue) -> usize {
        let canonical = key.canonical();
        match &self.slots {
            Slots::Unique(map) => usize::from(map.contains_key(&canonical)),
            Slots::Multi(map) => map.get(&canonical).map_or(0, BTreeSet::len),
        }
    }

    /// Number of distinct keys
    pub fn key_count(&self) -> usize {
        match &self.slots {
            Slots::Unique(map) => map.len(),
            Slots::Multi(map) => map.len(),
        }
    }

    /// Total number of (key, id) entries
    pub fn len(&self) -> usize {
        match &self.slots {
            Slots::Unique(map) => map.len(),
            Slots::Multi(map) => map.values().map(BTreeSet::len).sum(),
        }
    }

    /// Check if the index is empty
    pub fn is_empty(&self) -> bool {
        self.key_count() == 0
    }
}
