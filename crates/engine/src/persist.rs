//! JSON persistence, snapshots and rollback
//!
//! ## Payload format
//!
//! ```text
//! {
//!   "primaryKey": "id",
//!   "indexDefs": [
//!     {"name": "byEmail", "kind": "eq", "unique": true, "keySpec": {"t": "str", "v": "email"}},
//!     {"name": "byCityAge", "kind": "range", "unique": false, "keySpec": {"t": "arr", "v": ["city", "age"]}}
//!   ],
//!   "items": [{"id": 1, ...}, ...]
//! }
//! ```
//!
//! ## Design Notes
//!
//! 1. **Rebuilt, not copied**: restoring replays every descriptor through
//!    `define_index` and re-inserts every item in payload order. Index
//!    storages are never persisted.
//!
//! 2. **Comparators and extractors**: neither can be written out. A plain
//!    restore uses the natural comparator and fails with
//!    `NonSerializableKeySpec` on an extractor placeholder. Rollback instead
//!    re-attaches the live index's comparator and extractor when name and
//!    kind still match.

use crate::collection::Collection;
use crate::index::{Index, IndexDefinition, IndexKind};
use serde::{Deserialize, Serialize};
use trellis_core::{Comparator, KeySpecEncoding, Record, Result};

/// Persisted form of an index definition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexDescriptor {
    /// Index name
    pub name: String,
    /// Index kind (`"eq"`, `"range"` or `"prefix"`)
    pub kind: String,
    /// Uniqueness flag as defined
    pub unique: bool,
    /// Encoded key spec
    pub key_spec: KeySpecEncoding,
}

impl From<&Index> for IndexDescriptor {
    fn from(index: &Index) -> Self {
        let definition = index.definition();
        Self {
            name: definition.name().to_string(),
            kind: definition.kind().as_str().to_string(),
            unique: definition.is_unique(),
            key_spec: definition.key_spec().encode(),
        }
    }
}

/// Persisted form of a collection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CollectionDump {
    /// Primary-key field name
    pub primary_key: String,
    /// Index descriptors, in definition order
    pub index_defs: Vec<IndexDescriptor>,
    /// Records, in insertion order
    pub items: Vec<Record>,
}

impl Collection {
    /// Capture the primary key, index descriptors and records
    pub fn to_dump(&self) -> CollectionDump {
        CollectionDump {
            primary_key: self.primary_key().to_string(),
            index_defs: self.indexes().map(IndexDescriptor::from).collect(),
            items: self.iter().map(|(_, record)| record.clone()).collect(),
        }
    }

    /// Rebuild a collection from a dump
    ///
    /// # Errors
    ///
    /// - `InvalidIndexKind` for an unknown descriptor kind
    /// - `NonSerializableKeySpec` for an extractor placeholder
    /// - any error raised by re-defining an index or re-inserting a record
    pub fn from_dump(dump: CollectionDump) -> Result<Self> {
        restore(dump, &[])
    }

    /// Serialize to JSON text
    ///
    /// Extractor key specs are written as a `{"t": "fn"}` placeholder, so the
    /// payload of a collection using them cannot be deserialized.
    pub fn serialize(&self) -> Result<String> {
        Ok(serde_json::to_string(&self.to_dump())?)
    }

    /// Rebuild a collection from JSON text produced by [`Collection::serialize`]
    pub fn deserialize(payload: &str) -> Result<Self> {
        let dump: CollectionDump = serde_json::from_str(payload)?;
        Self::from_dump(dump)
    }

    /// Serialize the current state and push it onto the snapshot stack
    ///
    /// Returns the serialized payload.
    pub fn snapshot(&mut self) -> Result<String> {
        let payload = self.serialize()?;
        self.snapshots.push(payload.clone());
        tracing::debug!(
            target: "trellis::snapshot",
            records = self.len(),
            depth = self.snapshots.len(),
            "Pushed snapshot"
        );
        Ok(payload)
    }

    /// Replace the whole state with the most recent snapshot
    ///
    /// Returns `false` if there is no snapshot. On error the snapshot stays
    /// on the stack and the collection is unchanged.
    pub fn rollback(&mut self) -> Result<bool> {
        let Some(payload) = self.snapshots.peek() else {
            return Ok(false);
        };
        let dump: CollectionDump = serde_json::from_str(payload)?;
        let restored = restore(dump, &self.indexes().collect::<Vec<_>>())?;

        self.snapshots.pop();
        self.replace_state(restored);
        tracing::debug!(
            target: "trellis::snapshot",
            records = self.len(),
            depth = self.snapshots.len(),
            "Rolled back to snapshot"
        );
        Ok(true)
    }

    /// Number of snapshots on the stack
    pub fn snapshot_depth(&self) -> usize {
        self.snapshots.len()
    }

    /// Drop every snapshot
    pub fn clear_snapshots(&mut self) {
        self.snapshots.clear();
    }
}

/// Rebuild a collection, borrowing comparators and extractors from `live`
fn restore(dump: CollectionDump, live: &[&Index]) -> Result<Collection> {
    let mut collection = Collection::new(dump.primary_key);

    for descriptor in &dump.index_defs {
        let kind: IndexKind = descriptor.kind.parse()?;
        let previous = live
            .iter()
            .map(|index| index.definition())
            .find(|definition| definition.name() == descriptor.name && definition.kind() == kind);

        let key_spec = match (&descriptor.key_spec, previous) {
            (KeySpecEncoding::Fn, Some(definition)) if !definition.key_spec().is_serializable() => {
                definition.key_spec().clone()
            }
            (encoding, _) => encoding.decode(&descriptor.name)?,
        };
        let comparator = previous
            .map(|definition| definition.comparator().clone())
            .unwrap_or_else(Comparator::natural);

        collection.define_index(
            IndexDefinition::new(descriptor.name.as_str(), key_spec, kind)
                .unique(descriptor.unique)
                .with_comparator(comparator),
        )?;
    }

    for item in dump.items {
        collection.insert(item)?;
    }

    tracing::info!(
        target: "trellis::persist",
        primary_key = collection.primary_key(),
        indexes = dump.index_defs.len(),
        records = collection.len(),
        "Restored collection"
    );
    Ok(collection)
}
