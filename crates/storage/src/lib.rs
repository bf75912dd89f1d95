//! Index storages for Trellis collections
//!
//! Three storages, each knowing only keys and record ids:
//! - HashIndex: canonical key → id (unique) or id set, for equality lookup
//! - OrderedIndex: sorted `(key, id)` array, for range queries
//! - PrefixTrie: character trie of id sets, for prefix queries
//!
//! Storages never see records or index names; the engine resolves keys and
//! maps storage conflicts to collection errors.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod hash_index;
pub mod ordered_index;
pub mod prefix_trie;

pub use hash_index::{HashIndex, UniqueConflict};
pub use ordered_index::{OrderedIndex, RangeOptions};
pub use prefix_trie::PrefixTrie;
