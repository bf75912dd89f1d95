//! Core types for Trellis collections
//!
//! This crate defines the foundational types used throughout the system:
//! - Scalar / KeyValue: closed value model for index keys
//! - RecordId: non-null record identifier
//! - Record / FieldPath: JSON object records and nested field access
//! - KeySpec: field, composite or extractor key rules, plus their encoding
//! - Comparator: scalar ordering for range indexes
//! - Error: error taxonomy shared by every layer

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod compare;
pub mod error;
pub mod key_spec;
pub mod record;
pub mod value;

pub use compare::{CompareFn, Comparator};
pub use error::{Error, Result};
pub use key_spec::{ExtractFn, KeySpec, KeySpecEncoding};
pub use record::{json_type_name, FieldPath, Fields, Record};
pub use value::{natural_order, KeyValue, RecordId, Scalar};
