//! Records and field paths
//!
//! - Record: a JSON object stored in a collection
//! - FieldPath: dot-separated path into nested objects (e.g. `address.city`)

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Deref, DerefMut};
use std::str::FromStr;

/// JSON object type backing a record
pub type Fields = serde_json::Map<String, serde_json::Value>;

/// A record stored in a collection
///
/// Newtype around a JSON object providing:
/// - Direct access to the underlying map via Deref/DerefMut
/// - Nested lookup by [`FieldPath`]
/// - Shallow patch merging
///
/// # Examples
///
/// ```
/// use serde_json::json;
/// use trellis_core::Record;
///
/// let record = Record::from_json(json!({"id": 1, "address": {"city": "Ankara"}})).unwrap();
/// assert_eq!(record.get_path(&"address.city".into()), Some(&json!("Ankara")));
///
/// // Only objects are records
/// assert!(Record::from_json(json!([1, 2])).is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Record(Fields);

impl Record {
    /// Create an empty record
    pub fn new() -> Self {
        Record(Fields::new())
    }

    /// Create from a JSON value, which must be an object
    pub fn from_json(value: serde_json::Value) -> Result<Self> {
        match value {
            serde_json::Value::Object(map) => Ok(Record(map)),
            other => Err(Error::InvalidRecord {
                found: json_type_name(&other),
            }),
        }
    }

    /// Convert into a JSON value
    pub fn into_json(self) -> serde_json::Value {
        serde_json::Value::Object(self.0)
    }

    /// Get the underlying object
    pub fn fields(&self) -> &Fields {
        &self.0
    }

    /// Look up a value by nested path
    ///
    /// Returns `None` if any segment is missing or walks into a non-object.
    pub fn get_path(&self, path: &FieldPath) -> Option<&serde_json::Value> {
        let (first, rest) = path.segments.split_first()?;
        let mut current = self.0.get(first)?;
        for segment in rest {
            current = current.as_object()?.get(segment)?;
        }
        Some(current)
    }

    /// Merge a patch onto this record
    ///
    /// Fields present in `patch` override; all other fields are kept. The
    /// merge is shallow: a nested object in the patch replaces the whole
    /// nested object.
    pub fn merge(&mut self, patch: Record) {
        for (field, value) in patch.0 {
            self.0.insert(field, value);
        }
    }
}

impl Deref for Record {
    type Target = Fields;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl DerefMut for Record {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.0
    }
}

impl TryFrom<serde_json::Value> for Record {
    type Error = Error;

    fn try_from(value: serde_json::Value) -> Result<Self> {
        Record::from_json(value)
    }
}

impl From<Fields> for Record {
    fn from(map: Fields) -> Self {
        Record(map)
    }
}

impl From<Record> for serde_json::Value {
    fn from(record: Record) -> Self {
        record.into_json()
    }
}

impl FromStr for Record {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let value: serde_json::Value = serde_json::from_str(s)?;
        Record::from_json(value)
    }
}

impl fmt::Display for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", serde_json::Value::Object(self.0.clone()))
    }
}

/// JSON type name for diagnostics
pub fn json_type_name(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "boolean",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "array",
        serde_json::Value::Object(_) => "object",
    }
}

// =============================================================================
// FieldPath
// =============================================================================

/// A dot-separated path into nested record objects
///
/// `"a.b"` reads field `b` of the object stored under field `a`. A path
/// without dots names a top-level field. Any character other than `.` is
/// part of a field name.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FieldPath {
    segments: Vec<String>,
}

impl FieldPath {
    /// Parse a path from its dotted form
    pub fn parse(path: &str) -> Self {
        FieldPath {
            segments: path.split('.').map(str::to_string).collect(),
        }
    }

    /// Get the path segments
    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// Get the number of segments in the path
    pub fn len(&self) -> usize {
        self.segments.len()
    }

    /// A parsed path always has at least one segment
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Dotted string form, as originally written
    pub fn to_path_string(&self) -> String {
        self.segments.join(".")
    }
}

impl From<&str> for FieldPath {
    fn from(path: &str) -> Self {
        FieldPath::parse(path)
    }
}

impl From<String> for FieldPath {
    fn from(path: String) -> Self {
        FieldPath::parse(&path)
    }
}

impl From<&String> for FieldPath {
    fn from(path: &String) -> Self {
        FieldPath::parse(path)
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_path_string())
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
    fn test_from_json_requires_object() {
        assert!(Record::from_json(json!({"id": 1})).is_ok());
        let err = Record::from_json(json!("text")).unwrap_err();
        assert!(matches!(err, Error::InvalidRecord { found: "string" }));
    }

    #[test]
    fn test_get_path_top_level() {
        let r = record(json!({"name": "firat"}));
        assert_eq!(r.get_path(&"name".into()), Some(&json!("firat")));
        assert_eq!(r.get_path(&"missing".into()), None);
    }

    #[test]
    fn test_get_path_nested() {
        let r = record(json!({"a": {"b": {"c": 3}}, "x": 5}));
        assert_eq!(r.get_path(&"a.b.c".into()), Some(&json!(3)));
        assert_eq!(r.get_path(&"a.b".into()), Some(&json!({"c": 3})));
        assert_eq!(r.get_path(&"x.y".into()), None);
        assert_eq!(r.get_path(&"a.z.c".into()), None);
    }

    #[test]
    fn test_merge_is_shallow() {
        let mut r = record(json!({"id": 3, "age": 29, "meta": {"a": 1, "b": 2}}));
        r.merge(record(json!({"age": 33, "meta": {"a": 9}})));
        assert_eq!(r.into_json(), json!({"id": 3, "age": 33, "meta": {"a": 9}}));
    }

    #[test]
    fn test_parse_from_str() {
        let r: Record = r#"{"id": "x", "n": 1}"#.parse().unwrap();
        assert_eq!(r.get("n"), Some(&json!(1)));
        assert!("[1]".parse::<Record>().is_err());
        assert!(matches!(
            "{oops".parse::<Record>(),
            Err(Error::SerializationError(_))
        ));
    }

    #[test]
    fn test_field_path_round_trip() {
        let path = FieldPath::parse("address.city");
        assert_eq!(path.len(), 2);
        assert_eq!(path.segments(), ["address", "city"]);
        assert_eq!(path.to_string(), "address.city");
    }
}
