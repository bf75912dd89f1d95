//! Indexed collection
//!
//! A [`Collection`] owns the primary record store and every index defined on
//! it. Each mutation is routed through all indexes so they always reflect
//! exactly the stored records; each query is answered by the storage of the
//! named index alone.
//!
//! # Mutation protocol
//!
//! 1. Resolve the record id and check primary-key constraints
//! 2. Validate every unique equality index against the prospective keys
//! 3. Remove the old entries (update only), keyed by the stored record
//! 4. Add the new entries and install the record
//!
//! A mutation rejected at step 1 or 2 leaves the collection unchanged.

use crate::index::{Index, IndexDefinition, IndexKind, IndexStorage};
use crate::snapshot::SnapshotStack;
use rustc_hash::FxHashMap;
use std::collections::BTreeMap;
use trellis_core::{Error, KeyValue, Record, RecordId, Result};
use trellis_storage::{HashIndex, OrderedIndex, PrefixTrie, RangeOptions};

/// Primary-key field used by [`Collection::default`]
pub const DEFAULT_PRIMARY_KEY: &str = "id";

/// Uniquely-keyed records plus their secondary indexes
///
/// Records are kept in insertion order; an update keeps the record's
/// position.
///
/// # Example
///
/// ```
/// use serde_json::json;
/// use trellis_engine::{Collection, IndexDefinition, RangeOptions, Record};
///
/// let mut users = Collection::new("id");
/// users
///     .define_index(IndexDefinition::equality("byEmail", "email").unique(true))?
///     .define_index(IndexDefinition::range("byAge", "age"))?;
///
/// users.insert(Record::from_json(json!({"id": 1, "email": "a@x.com", "age": 24}))?)?;
/// users.insert(Record::from_json(json!({"id": 2, "email": "b@x.com", "age": 31}))?)?;
///
/// let found = users.get_one("byEmail", "b@x.com")?.unwrap();
/// assert_eq!(found["age"], json!(31));
///
/// let adults = users.between("byAge", 25, 35, RangeOptions::default())?;
/// assert_eq!(adults.len(), 1);
/// # Ok::<(), trellis_engine::Error>(())
/// ```
#[derive(Debug)]
pub struct Collection {
    primary_key: String,
    records: BTreeMap<u64, (RecordId, Record)>,
    positions: FxHashMap<RecordId, u64>,
    next_seq: u64,
    indexes: Vec<Index>,
    pub(crate) snapshots: SnapshotStack,
}

impl Default for Collection {
    fn default() -> Self {
        Self::new(DEFAULT_PRIMARY_KEY)
    }
}

impl Collection {
    /// Create an empty collection keyed by the `primary_key` field
    pub fn new(primary_key: impl Into<String>) -> Self {
        Self {
            primary_key: primary_key.into(),
            records: BTreeMap::new(),
            positions: FxHashMap::default(),
            next_seq: 0,
            indexes: Vec::new(),
            snapshots: SnapshotStack::default(),
        }
    }

    /// Cap the snapshot stack at `max` entries
    pub fn with_max_snapshots(mut self, max: usize) -> Self {
        self.snapshots.set_max_depth(Some(max));
        self
    }

    /// Name of the primary-key field
    pub fn primary_key(&self) -> &str {
        &self.primary_key
    }

    /// Number of records
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Check if the collection holds no records
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Get a record by id
    pub fn get(&self, id: &RecordId) -> Option<&Record> {
        let seq = self.positions.get(id)?;
        self.records.get(seq).map(|(_, record)| record)
    }

    /// Check if a record with this id exists
    pub fn contains(&self, id: &RecordId) -> bool {
        self.positions.contains_key(id)
    }

    /// Records with their ids, in insertion order
    pub fn iter(&self) -> impl Iterator<Item = (&RecordId, &Record)> {
        self.records.values().map(|(id, record)| (id, record))
    }

    /// Ids in insertion order
    pub fn ids(&self) -> impl Iterator<Item = &RecordId> {
        self.records.values().map(|(id, _)| id)
    }

    /// Every record, in insertion order
    pub fn all(&self) -> Vec<&Record> {
        self.records.values().map(|(_, record)| record).collect()
    }

    // ========================================================================
    // Indexes
    // ========================================================================

    /// Define a new index and back-fill it from the existing records
    ///
    /// The index is built detached and only attached once every record has
    /// been indexed, so a failed back-fill leaves the collection without it.
    ///
    /// # Errors
    ///
    /// - `DuplicateIndexName` if an index with this name exists
    /// - `UniqueConstraintViolation` if existing records collide on a unique
    ///   equality index
    pub fn define_index(&mut self, definition: IndexDefinition) -> Result<&mut Self> {
        if self.has_index(definition.name()) {
            return Err(Error::DuplicateIndexName {
                name: definition.name().to_string(),
            });
        }

        let mut index = Index::new(definition);
        for (id, record) in self.records.values() {
            index.add(record, id)?;
        }

        tracing::debug!(
            target: "trellis::collection",
            index = index.name(),
            kind = %index.kind(),
            backfilled = self.records.len(),
            "Defined index"
        );
        self.indexes.push(index);
        Ok(self)
    }

    /// Check if an index with this name is defined
    pub fn has_index(&self, name: &str) -> bool {
        self.indexes.iter().any(|index| index.name() == name)
    }

    /// Get an index by name
    pub fn index(&self, name: &str) -> Option<&Index> {
        self.indexes.iter().find(|index| index.name() == name)
    }

    /// Defined indexes, in definition order
    pub fn indexes(&self) -> impl Iterator<Item = &Index> {
        self.indexes.iter()
    }

    /// Names of the defined indexes, in definition order
    pub fn index_names(&self) -> Vec<&str> {
        self.indexes.iter().map(Index::name).collect()
    }

    // ========================================================================
    // Mutations
    // ========================================================================

    /// Insert a new record
    ///
    /// # Errors
    ///
    /// - `MissingPrimaryKey` if the primary-key field is absent or null
    /// - `DuplicatePrimaryKey` if a record with this id exists
    /// - `UniqueConstraintViolation` if a unique index already holds the key
    pub fn insert(&mut self, record: Record) -> Result<RecordId> {
        let id = self.record_id(&record)?;
        if self.positions.contains_key(&id) {
            return Err(Error::DuplicatePrimaryKey { id });
        }
        self.check_unique(&record, &id)?;
        add_entries(&mut self.indexes, &record, &id)?;

        let seq = self.next_seq;
        self.next_seq += 1;
        self.positions.insert(id.clone(), seq);
        self.records.insert(seq, (id.clone(), record));
        Ok(id)
    }

    /// Insert the record, or merge it onto the existing record with its id
    pub fn upsert(&mut self, record: Record) -> Result<RecordId> {
        let id = self.record_id(&record)?;
        if self.positions.contains_key(&id) {
            self.update(&id, record)?;
            Ok(id)
        } else {
            self.insert(record)
        }
    }

    /// Merge `patch` onto the record with this id
    ///
    /// Fields present in the patch override, all others are kept. The
    /// primary-key field is forced back to `id`.
    ///
    /// # Errors
    ///
    /// - `ItemNotFound` if no record has this id
    /// - `UniqueConstraintViolation` if a unique index already holds the new
    ///   key for another record
    pub fn update(&mut self, id: &RecordId, patch: Record) -> Result<&Record> {
        let seq = self.position(id)?;
        let mut next = match self.records.get(&seq) {
            Some((_, stored)) => stored.clone(),
            None => return Err(Error::ItemNotFound { id: id.clone() }),
        };
        next.merge(patch);
        self.install(seq, id, next)
    }

    /// Replace the record with this id wholesale
    ///
    /// The primary-key field of `record` is forced back to `id`.
    pub fn replace(&mut self, id: &RecordId, record: Record) -> Result<&Record> {
        let seq = self.position(id)?;
        self.install(seq, id, record)
    }

    /// Remove the record with this id
    ///
    /// Returns `false` if no such record exists.
    pub fn remove(&mut self, id: &RecordId) -> bool {
        let Some(seq) = self.positions.remove(id) else {
            return false;
        };
        if let Some((_, record)) = self.records.remove(&seq) {
            for index in &mut self.indexes {
                index.remove(&record, id);
            }
        }
        true
    }

    /// Remove every record, keeping the index definitions
    pub fn clear(&mut self) {
        let ids: Vec<RecordId> = self.ids().cloned().collect();
        for id in &ids {
            self.remove(id);
        }
    }

    fn record_id(&self, record: &Record) -> Result<RecordId> {
        record
            .get(&self.primary_key)
            .and_then(RecordId::from_json)
            .ok_or_else(|| Error::MissingPrimaryKey {
                field: self.primary_key.clone(),
            })
    }

    fn position(&self, id: &RecordId) -> Result<u64> {
        self.positions
            .get(id)
            .copied()
            .ok_or_else(|| Error::ItemNotFound { id: id.clone() })
    }

    fn check_unique(&self, record: &Record, id: &RecordId) -> Result<()> {
        self.indexes
            .iter()
            .try_for_each(|index| index.check(record, id))
    }

    /// Swap the record at `seq` for `record`, moving its index entries
    fn install(&mut self, seq: u64, id: &RecordId, mut record: Record) -> Result<&Record> {
        record.insert(self.primary_key.clone(), id.to_json());
        self.check_unique(&record, id)?;

        let Some((_, stored)) = self.records.get_mut(&seq) else {
            return Err(Error::ItemNotFound { id: id.clone() });
        };
        for index in &mut self.indexes {
            index.remove(stored, id);
        }
        if let Err(e) = add_entries(&mut self.indexes, &record, id) {
            // Put the stored record's entries back. They were indexed a moment
            // ago and `check_unique` passed, so re-adding cannot conflict.
            for index in &mut self.indexes {
                let restored = index.add(stored, id);
                debug_assert!(restored.is_ok(), "re-adding stored entries failed");
            }
            return Err(e);
        }
        *stored = record;
        Ok(&*stored)
    }

    /// Swap in the state of `other`, keeping this collection's snapshots
    pub(crate) fn replace_state(&mut self, other: Collection) {
        self.primary_key = other.primary_key;
        self.records = other.records;
        self.positions = other.positions;
        self.next_seq = other.next_seq;
        self.indexes = other.indexes;
    }

    // ========================================================================
    // Queries
    // ========================================================================

    /// First record whose key equals `value` on an equality index
    ///
    /// For non-unique indexes the record with the smallest id is returned.
    pub fn get_one(&self, index: &str, value: impl Into<KeyValue>) -> Result<Option<&Record>> {
        let storage = self.equality_storage(index)?;
        Ok(storage.first(&value.into()).and_then(|id| self.get(id)))
    }

    /// Every record whose key equals `value` on an equality index, in id order
    pub fn get_all(&self, index: &str, value: impl Into<KeyValue>) -> Result<Vec<&Record>> {
        let storage = self.equality_storage(index)?;
        Ok(self.resolve(storage.get(&value.into())))
    }

    /// Number of records whose key equals `value` on an equality index
    pub fn count(&self, index: &str, value: impl Into<KeyValue>) -> Result<usize> {
        Ok(self.equality_storage(index)?.count(&value.into()))
    }

    /// Records whose key lies between `min` and `max` on a range index
    ///
    /// Results come in index order.
    pub fn between(
        &self,
        index: &str,
        min: impl Into<KeyValue>,
        max: impl Into<KeyValue>,
        options: RangeOptions,
    ) -> Result<Vec<&Record>> {
        let storage = self.range_storage(index)?;
        Ok(self.resolve(storage.between(&min.into(), &max.into(), options)))
    }

    /// Every record in the order of a range index
    pub fn ordered(&self, index: &str) -> Result<Vec<&Record>> {
        let storage = self.range_storage(index)?;
        Ok(storage.iter().filter_map(|(_, id)| self.get(id)).collect())
    }

    /// Records whose key text starts with `prefix` on a prefix index
    pub fn starts_with(&self, index: &str, prefix: &str) -> Result<Vec<&Record>> {
        let storage = self.prefix_storage(index)?;
        Ok(self.resolve(storage.starts_with(prefix)))
    }

    fn resolve(&self, ids: Vec<&RecordId>) -> Vec<&Record> {
        ids.into_iter().filter_map(|id| self.get(id)).collect()
    }

    fn lookup(&self, name: &str) -> Result<&Index> {
        self.index(name).ok_or_else(|| Error::IndexNotFound {
            name: name.to_string(),
        })
    }

    fn equality_storage(&self, name: &str) -> Result<&HashIndex> {
        let index = self.lookup(name)?;
        match index.storage() {
            IndexStorage::Equality(storage) => Ok(storage),
            _ => Err(kind_mismatch(index, IndexKind::Eq)),
        }
    }

    fn range_storage(&self, name: &str) -> Result<&OrderedIndex> {
        let index = self.lookup(name)?;
        match index.storage() {
            IndexStorage::Range(storage) => Ok(storage),
            _ => Err(kind_mismatch(index, IndexKind::Range)),
        }
    }

    fn prefix_storage(&self, name: &str) -> Result<&PrefixTrie> {
        let index = self.lookup(name)?;
        match index.storage() {
            IndexStorage::Prefix(storage) => Ok(storage),
            _ => Err(kind_mismatch(index, IndexKind::Prefix)),
        }
    }
}

/// Add the entries of `record` to every index, undoing them all on failure
fn add_entries(indexes: &mut [Index], record: &Record, id: &RecordId) -> Result<()> {
    let mut added = 0;
    let result = indexes.iter_mut().try_for_each(|index| {
        index.add(record, id)?;
        added += 1;
        Ok(())
    });
    if result.is_err() {
        for index in &mut indexes[..added] {
            index.remove(record, id);
        }
    }
    result
}

fn kind_mismatch(index: &Index, expected: IndexKind) -> Error {
    Error::IndexKindMismatch {
        name: index.name().to_string(),
        expected: expected.as_str(),
        actual: index.kind().as_str(),
    }
}
