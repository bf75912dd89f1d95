//! Indexed collection engine for Trellis
//!
//! This crate orchestrates the lower layers:
//! - Collection: primary record store plus every index defined on it
//! - IndexDefinition / Index: name, key spec, kind and the matching storage
//! - Persistence: JSON payloads, snapshot stack and rollback
//! - CollectionConfig: TOML-defined primary key, snapshot cap and indexes
//! - SharedCollection: one read-write lock around a whole collection
//!
//! The engine is the only component that knows about:
//! - Record ids and primary-key constraints
//! - Cross-index consistency under insert/update/remove
//! - Mapping storage conflicts to index-level errors

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod collection;
pub mod config;
pub mod index;
pub mod persist;
pub mod shared;
pub mod snapshot;

pub use collection::{Collection, DEFAULT_PRIMARY_KEY};
pub use config::{CollectionConfig, IndexConfig, CONFIG_FILE_NAME};
pub use index::{Index, IndexDefinition, IndexKind, IndexStorage};
pub use persist::{CollectionDump, IndexDescriptor};
pub use shared::SharedCollection;
pub use snapshot::SnapshotStack;

pub use trellis_core::{
    natural_order, Comparator, Error, FieldPath, KeySpec, KeySpecEncoding, KeyValue, Record,
    RecordId, Result, Scalar,
};
pub use trellis_storage::RangeOptions;
