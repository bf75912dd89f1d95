//! Index definitions and their storages
//!
//! An [`IndexDefinition`] binds a name, a key spec, a kind, a uniqueness flag
//! and a comparator. An [`Index`] pairs a definition with exactly one storage
//! matching its kind, chosen when the index is defined and fixed thereafter.

use std::fmt;
use std::str::FromStr;
use trellis_core::{Comparator, Error, KeySpec, Record, RecordId, Result};
use trellis_storage::{HashIndex, OrderedIndex, PrefixTrie, UniqueConflict};

/// Kind of an index, selecting its storage and the queries it answers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IndexKind {
    /// Equality lookup (`get_one`, `get_all`)
    Eq,
    /// Ordered range queries (`between`)
    Range,
    /// String prefix queries (`starts_with`)
    Prefix,
}

impl IndexKind {
    /// Wire name of the kind
    pub fn as_str(&self) -> &'static str {
        match self {
            IndexKind::Eq => "eq",
            IndexKind::Range => "range",
            IndexKind::Prefix => "prefix",
        }
    }
}

impl FromStr for IndexKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "eq" => Ok(IndexKind::Eq),
            "range" => Ok(IndexKind::Range),
            "prefix" => Ok(IndexKind::Prefix),
            other => Err(Error::InvalidIndexKind {
                kind: other.to_string(),
            }),
        }
    }
}

impl fmt::Display for IndexKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Definition of a secondary index
///
/// # Example
///
/// ```
/// use trellis_engine::{IndexDefinition, IndexKind};
///
/// let by_email = IndexDefinition::equality("byEmail", "email").unique(true);
/// assert_eq!(by_email.kind(), IndexKind::Eq);
///
/// let by_city_age = IndexDefinition::range("byCityAge", ["city", "age"]);
/// assert!(!by_city_age.is_unique());
/// ```
#[derive(Debug, Clone)]
pub struct IndexDefinition {
    name: String,
    key_spec: KeySpec,
    kind: IndexKind,
    unique: bool,
    comparator: Comparator,
}

impl IndexDefinition {
    /// Create a definition of the given kind
    pub fn new(name: impl Into<String>, key_spec: impl Into<KeySpec>, kind: IndexKind) -> Self {
        Self {
            name: name.into(),
            key_spec: key_spec.into(),
            kind,
            unique: false,
            comparator: Comparator::natural(),
        }
    }

    /// Create a definition from a kind name
    ///
    /// # Errors
    ///
    /// Returns `InvalidIndexKind` unless `kind` is `"eq"`, `"range"` or `"prefix"`.
    pub fn with_kind(
        name: impl Into<String>,
        key_spec: impl Into<KeySpec>,
        kind: &str,
    ) -> Result<Self> {
        Ok(Self::new(name, key_spec, kind.parse()?))
    }

    /// Equality index
    pub fn equality(name: impl Into<String>, key_spec: impl Into<KeySpec>) -> Self {
        Self::new(name, key_spec, IndexKind::Eq)
    }

    /// Range index
    pub fn range(name: impl Into<String>, key_spec: impl Into<KeySpec>) -> Self {
        Self::new(name, key_spec, IndexKind::Range)
    }

    /// Prefix index
    pub fn prefix(name: impl Into<String>, key_spec: impl Into<KeySpec>) -> Self {
        Self::new(name, key_spec, IndexKind::Prefix)
    }

    /// Set the uniqueness flag (only enforced by equality indexes)
    pub fn unique(mut self, unique: bool) -> Self {
        self.unique = unique;
        self
    }

    /// Order keys with a custom scalar comparator (used by range indexes)
    pub fn with_comparator(mut self, comparator: Comparator) -> Self {
        self.comparator = comparator;
        self
    }

    /// Index name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Key extraction rule
    pub fn key_spec(&self) -> &KeySpec {
        &self.key_spec
    }

    /// Index kind
    pub fn kind(&self) -> IndexKind {
        self.kind
    }

    /// Uniqueness flag as defined
    pub fn is_unique(&self) -> bool {
        self.unique
    }

    /// Scalar comparator
    pub fn comparator(&self) -> &Comparator {
        &self.comparator
    }
}

/// Storage of an index, one variant per kind
#[derive(Debug)]
pub enum IndexStorage {
    /// Canonical key → id(s)
    Equality(HashIndex),
    /// Sorted `(key, id)` entries
    Range(OrderedIndex),
    /// Character trie of id sets
    Prefix(PrefixTrie),
}

impl IndexStorage {
    /// Kind this storage serves
    pub fn kind(&self) -> IndexKind {
        match self {
            IndexStorage::Equality(_) => IndexKind::Eq,
            IndexStorage::Range(_) => IndexKind::Range,
            IndexStorage::Prefix(_) => IndexKind::Prefix,
        }
    }
}

/// A defined index: its definition plus its storage
#[derive(Debug)]
pub struct Index {
    definition: IndexDefinition,
    storage: IndexStorage,
}

impl Index {
    /// Create an index with empty storage matching the definition's kind
    pub(crate) fn new(definition: IndexDefinition) -> Self {
        let storage = match definition.kind {
            IndexKind::Eq => IndexStorage::Equality(HashIndex::new(definition.unique)),
            IndexKind::Range => {
                IndexStorage::Range(OrderedIndex::new(definition.comparator.clone()))
            }
            IndexKind::Prefix => {
                if definition.unique {
                    tracing::debug!(
                        target: "trellis::index",
                        index = %definition.name,
                        "Unique flag has no effect on prefix indexes"
                    );
                }
                IndexStorage::Prefix(PrefixTrie::new())
            }
        };
        Self {
            definition,
            storage,
        }
    }

    /// Index definition
    pub fn definition(&self) -> &IndexDefinition {
        &self.definition
    }

    /// Index name
    pub fn name(&self) -> &str {
        &self.definition.name
    }

    /// Index kind
    pub fn kind(&self) -> IndexKind {
        self.definition.kind
    }

    /// Underlying storage
    pub fn storage(&self) -> &IndexStorage {
        &self.storage
    }

    /// Number of entries held by the storage
    pub fn len(&self) -> usize {
        match &self.storage {
            IndexStorage::Equality(h) => h.len(),
            IndexStorage::Range(o) => o.len(),
            IndexStorage::Prefix(p) => p.len(),
        }
    }

    /// Check if the storage holds no entries
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Fail if adding `record` would violate this index's uniqueness
    pub(crate) fn check(&self, record: &Record, id: &RecordId) -> Result<()> {
        match &self.storage {
            IndexStorage::Equality(h) if h.is_unique() => {
                let key = self.definition.key_spec.resolve(record);
                h.check(&key, id).map_err(|c| self.violation(c))
            }
            _ => Ok(()),
        }
    }

    /// Add the entry of `record`
    pub(crate) fn add(&mut self, record: &Record, id: &RecordId) -> Result<()> {
        let key = self.definition.key_spec.resolve(record);
        match &mut self.storage {
            IndexStorage::Equality(h) => {
                if let Err(conflict) = h.insert(&key, id.clone()) {
                    return Err(self.violation(conflict));
                }
            }
            IndexStorage::Range(o) => o.insert(key, id.clone()),
            IndexStorage::Prefix(p) => p.insert(&key.prefix_text(), id.clone()),
        }
        Ok(())
    }

    /// Remove the entry of `record`, keyed by the record as stored
    pub(crate) fn remove(&mut self, record: &Record, id: &RecordId) {
        let key = self.definition.key_spec.resolve(record);
        match &mut self.storage {
            IndexStorage::Equality(h) => {
                h.remove(&key, id);
            }
            IndexStorage::Range(o) => {
                o.remove(&key, id);
            }
            IndexStorage::Prefix(p) => {
                p.remove(&key.prefix_text(), id);
            }
        }
    }

    fn violation(&self, conflict: UniqueConflict) -> Error {
        Error::UniqueConstraintViolation {
            index: self.definition.name.clone(),
            key: conflict.key,
            existing: conflict.existing,
        }
    }
}
