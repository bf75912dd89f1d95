//! Key specs: how an index derives its key from a record
//!
//! A [`KeySpec`] is resolved once per record into a [`KeyValue`]. Field and
//! composite specs round-trip through [`KeySpecEncoding`]; extractor specs
//! encode as `{"t": "fn"}` and refuse to decode.

use crate::error::{Error, Result};
use crate::record::{FieldPath, Record};
use crate::value::{KeyValue, Scalar};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Signature of a key extractor function
pub type ExtractFn = dyn Fn(&Record) -> KeyValue + Send + Sync;

/// Key extraction rule of an index
#[derive(Clone)]
pub enum KeySpec {
    /// Single field, dot paths allowed
    Field(FieldPath),
    /// Ordered list of fields forming a composite key
    Composite(Vec<FieldPath>),
    /// Arbitrary function of the record; cannot be serialized
    Extractor(Arc<ExtractFn>),
}

impl KeySpec {
    /// Key on a single field
    pub fn field(path: impl Into<FieldPath>) -> Self {
        KeySpec::Field(path.into())
    }

    /// Key on an ordered list of fields
    pub fn composite<I, P>(paths: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<FieldPath>,
    {
        KeySpec::Composite(paths.into_iter().map(Into::into).collect())
    }

    /// Key computed by a function
    pub fn extractor<F>(f: F) -> Self
    where
        F: Fn(&Record) -> KeyValue + Send + Sync + 'static,
    {
        KeySpec::Extractor(Arc::new(f))
    }

    /// Resolve the key of a record
    ///
    /// Missing fields resolve to null. A single field holding an array
    /// resolves to a composite key of the array elements.
    pub fn resolve(&self, record: &Record) -> KeyValue {
        match self {
            KeySpec::Field(path) => record
                .get_path(path)
                .map_or(KeyValue::Scalar(Scalar::Null), KeyValue::from_json),
            KeySpec::Composite(paths) => KeyValue::Composite(
                paths
                    .iter()
                    .map(|p| record.get_path(p).map_or(Scalar::Null, Scalar::from_json))
                    .collect(),
            ),
            KeySpec::Extractor(f) => f(record),
        }
    }

    /// Check if this key spec survives serialization
    pub fn is_serializable(&self) -> bool {
        !matches!(self, KeySpec::Extractor(_))
    }

    /// Encode for a persisted payload
    pub fn encode(&self) -> KeySpecEncoding {
        match self {
            KeySpec::Field(path) => KeySpecEncoding::Str(path.to_path_string()),
            KeySpec::Composite(paths) => {
                KeySpecEncoding::Arr(paths.iter().map(FieldPath::to_path_string).collect())
            }
            KeySpec::Extractor(_) => KeySpecEncoding::Fn,
        }
    }
}

impl fmt::Debug for KeySpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeySpec::Field(path) => write!(f, "Field({})", path),
            KeySpec::Composite(paths) => f.debug_tuple("Composite").field(paths).finish(),
            KeySpec::Extractor(_) => write!(f, "Extractor(<fn>)"),
        }
    }
}

impl From<&str> for KeySpec {
    fn from(path: &str) -> Self {
        KeySpec::field(path)
    }
}

impl From<String> for KeySpec {
    fn from(path: String) -> Self {
        KeySpec::field(path)
    }
}

impl From<Vec<&str>> for KeySpec {
    fn from(paths: Vec<&str>) -> Self {
        KeySpec::composite(paths)
    }
}

impl From<Vec<String>> for KeySpec {
    fn from(paths: Vec<String>) -> Self {
        KeySpec::composite(paths)
    }
}

impl<const N: usize> From<[&str; N]> for KeySpec {
    fn from(paths: [&str; N]) -> Self {
        KeySpec::composite(paths)
    }
}

/// Persisted form of a key spec
///
/// Serializes as `{"t": "str", "v": "a.b"}`, `{"t": "arr", "v": ["a", "b"]}`
/// or `{"t": "fn"}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "t", content = "v")]
pub enum KeySpecEncoding {
    /// Single field path
    #[serde(rename = "str")]
    Str(String),
    /// Composite field paths
    #[serde(rename = "arr")]
    Arr(Vec<String>),
    /// Extractor function placeholder
    #[serde(rename = "fn")]
    Fn,
}

impl KeySpecEncoding {
    /// Rebuild the key spec of index `index`
    ///
    /// # Errors
    ///
    /// Returns `NonSerializableKeySpec` for the extractor placeholder.
    pub fn decode(&self, index: &str) -> Result<KeySpec> {
        match self {
            KeySpecEncoding::Str(path) => Ok(KeySpec::field(path.as_str())),
            KeySpecEncoding::Arr(paths) => Ok(KeySpec::composite(paths)),
            KeySpecEncoding::Fn => Err(Error::NonSerializableKeySpec {
                index: index.to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(value: serde_json::Value) -> Record {
        Record::from_json(value).unwrap()
    }

    #[test]
    fn test_resolve_field() {
        let spec = KeySpec::field("email");
        let r = record(json!({"id": 1, "email": "a@x.com"}));
        assert_eq!(spec.resolve(&r), KeyValue::from("a@x.com"));
    }

    #[test]
    fn test_resolve_missing_field_is_null() {
        let spec = KeySpec::field("email");
        let r = record(json!({"id": 1}));
        assert_eq!(spec.resolve(&r), KeyValue::Scalar(Scalar::Null));
    }

    #[test]
    fn test_resolve_nested_field() {
        let spec = KeySpec::field("address.city");
        let r = record(json!({"id": 1, "address": {"city": "Izmir"}}));
        assert_eq!(spec.resolve(&r), KeyValue::from("Izmir"));
    }

    #[test]
    fn test_resolve_composite() {
        let spec = KeySpec::from(["city", "age"]);
        let r = record(json!({"id": 1, "city": "Ankara", "age": 28}));
        assert_eq!(spec.resolve(&r), KeyValue::from(json!(["Ankara", 28])));
    }

    #[test]
    fn test_resolve_composite_missing_element() {
        let spec = KeySpec::from(["city", "age"]);
        let r = record(json!({"id": 1, "city": "Ankara"}));
        assert_eq!(spec.resolve(&r), KeyValue::from(json!(["Ankara", null])));
    }

    #[test]
    fn test_resolve_extractor() {
        let spec = KeySpec::extractor(|r| {
            let name = r.get("name").and_then(|v| v.as_str()).unwrap_or_default();
            KeyValue::from(name.to_lowercase())
        });
        let r = record(json!({"id": 1, "name": "FIRAT"}));
        assert_eq!(spec.resolve(&r), KeyValue::from("firat"));
        assert!(!spec.is_serializable());
    }

    #[test]
    fn test_encoding_wire_format() {
        let str_enc = KeySpec::field("a.b").encode();
        assert_eq!(
            serde_json::to_value(&str_enc).unwrap(),
            json!({"t": "str", "v": "a.b"})
        );
        let arr_enc = KeySpec::from(["city", "age"]).encode();
        assert_eq!(
            serde_json::to_value(&arr_enc).unwrap(),
            json!({"t": "arr", "v": ["city", "age"]})
        );
        let fn_enc = KeySpec::extractor(|_| KeyValue::from(0)).encode();
        assert_eq!(serde_json::to_value(&fn_enc).unwrap(), json!({"t": "fn"}));
    }

    #[test]
    fn test_decode_round_trip() {
        let enc: KeySpecEncoding = serde_json::from_value(json!({"t": "arr", "v": ["a", "b.c"]})).unwrap();
        let spec = enc.decode("idx").unwrap();
        assert_eq!(spec.encode(), enc);
    }

    #[test]
    fn test_decode_fn_fails() {
        let enc: KeySpecEncoding = serde_json::from_value(json!({"t": "fn"})).unwrap();
        let err = enc.decode("byLower").unwrap_err();
        assert!(matches!(err, Error::NonSerializableKeySpec { index } if index == "byLower"));
    }
}
