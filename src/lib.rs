//! TrellisDB - indexed in-process document collections
//!
//! A [`Collection`] stores JSON object records keyed by a primary-key field
//! and keeps any number of secondary indexes consistent with them:
//! - equality indexes (`get_one`, `get_all`, `count`), optionally unique
//! - range indexes (`between`, `ordered`) with custom scalar comparators
//! - prefix indexes (`starts_with`) over a character trie
//!
//! Collections serialize to JSON, can be rebuilt from that payload, and keep
//! a stack of snapshots for whole-state rollback.
//!
//! # Quick Start
//!
//! ```
//! use serde_json::json;
//! use trellisdb::{Collection, IndexDefinition, Record};
//!
//! let mut people = Collection::default();
//! people.define_index(IndexDefinition::prefix("byName", "name"))?;
//!
//! for (id, name) in [(1, "firat"), (2, "fidan"), (3, "faruk")] {
//!     people.insert(Record::from_json(json!({"id": id, "name": name}))?)?;
//! }
//! assert_eq!(people.starts_with("byName", "fi")?.len(), 2);
//!
//! people.snapshot()?;
//! people.remove(&1.into());
//! people.rollback()?;
//! assert_eq!(people.len(), 3);
//! # Ok::<(), trellisdb::Error>(())
//! ```

pub use trellis_engine::*;
