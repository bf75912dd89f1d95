//! Error types for Trellis collections
//!
//! Every failure in the system is local and synchronous: it is raised to the
//! caller of the operation that detected it and never retried internally.
//! We use `thiserror` for automatic `Display` and `Error` trait implementations.

use crate::value::RecordId;
use std::io;
use thiserror::Error;

/// Result type alias for collection operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for collections and their indexes
#[derive(Debug, Error)]
pub enum Error {
    /// An index with this name is already defined on the collection
    #[error("Duplicate index name: {name}")]
    DuplicateIndexName {
        /// Index name
        name: String,
    },

    /// Index kind is not one of `eq`, `range`, `prefix`
    #[error("Invalid index kind: {kind} (expected \"eq\", \"range\" or \"prefix\")")]
    InvalidIndexKind {
        /// The rejected kind string
        kind: String,
    },

    /// Record has no value (or a null value) under the primary-key field
    #[error("Missing primary key: field '{field}' is absent or null")]
    MissingPrimaryKey {
        /// Primary-key field name
        field: String,
    },

    /// A record with this id already exists
    #[error("Duplicate primary key: {id}")]
    DuplicatePrimaryKey {
        /// The conflicting id
        id: RecordId,
    },

    /// No record with this id exists
    #[error("Item not found: {id}")]
    ItemNotFound {
        /// The requested id
        id: RecordId,
    },

    /// Query against an index name that is not defined
    #[error("Index not found: {name}")]
    IndexNotFound {
        /// Index name
        name: String,
    },

    /// Query operation does not match the kind of the named index
    #[error("Index '{name}' is a {actual} index, operation requires {expected}")]
    IndexKindMismatch {
        /// Index name
        name: String,
        /// Kind the operation requires
        expected: &'static str,
        /// Kind the index was defined with
        actual: &'static str,
    },

    /// A unique equality index already maps this key to another record
    #[error("Unique constraint violation on index '{index}': key {key} already maps to {existing}")]
    UniqueConstraintViolation {
        /// Index name
        index: String,
        /// Canonical form of the conflicting key
        key: String,
        /// Id currently holding the key
        existing: RecordId,
    },

    /// A key spec backed by an extractor function cannot be decoded
    #[error("Key spec of index '{index}' is an extractor function and cannot be serialized")]
    NonSerializableKeySpec {
        /// Index name
        index: String,
    },

    /// Record is not a JSON object
    #[error("Invalid record: expected a JSON object, got {found}")]
    InvalidRecord {
        /// JSON type that was supplied instead
        found: &'static str,
    },

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    SerializationError(String),

    /// Configuration could not be parsed or is inconsistent
    #[error("Config error: {0}")]
    ConfigError(String),

    /// I/O error (config file reading)
    #[error("I/O error: {0}")]
    IoError(#[from] io::Error),
}

impl Error {
    /// Check if this error reports a missing record or index
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Error::ItemNotFound { .. } | Error::IndexNotFound { .. }
        )
    }

    /// Check if this error reports a violated uniqueness constraint
    /// (primary key or unique index)
    pub fn is_constraint_violation(&self) -> bool {
        matches!(
            self,
            Error::DuplicatePrimaryKey { .. } | Error::UniqueConstraintViolation { .. }
        )
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::SerializationError(e.to_string())
    }
}
