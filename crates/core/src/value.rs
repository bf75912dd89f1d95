//! Key value model for Trellis indexes
//!
//! This module defines:
//! - Scalar: closed set of values an index key element can take
//! - KeyValue: a resolved index key, either one scalar or a composite sequence
//! - RecordId: non-null scalar identifying a record within a collection
//!
//! ## Type Rules
//!
//! - `Int(1) != Float(1.0)`: different types are never equal, so they never
//!   share a canonical key in an equality index
//! - Integers above `i64::MAX` are held exactly as `UInt`; JSON integers
//!   never fall back to a lossy `Float`
//! - Range ordering is numeric and exact across `Int`, `UInt` and `Float`;
//!   the natural order treats `Int(1)` and `Float(1.0)` as equal, the total
//!   `Ord` breaks the tie with `Int` first, then `UInt`, then `Float`
//! - Cross-type order: `Bool < number < String < Structured < Null`
//! - Objects and nested arrays become `Structured`, held as key-sorted JSON
//!   text so field insertion order never affects equality

use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};

/// A single key element
///
/// Every JSON value maps onto exactly one scalar via [`Scalar::from_json`].
#[derive(Debug, Clone)]
pub enum Scalar {
    /// Null or missing value
    Null,
    /// Boolean value
    Bool(bool),
    /// 64-bit signed integer
    Int(i64),
    /// Unsigned integer above `i64::MAX`
    UInt(u64),
    /// 64-bit floating point
    Float(f64),
    /// UTF-8 string
    String(String),
    /// Object or array, as canonical key-sorted JSON text
    Structured(String),
}

impl Scalar {
    /// Convert a JSON value into a scalar
    pub fn from_json(value: &serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => Scalar::Null,
            serde_json::Value::Bool(b) => Scalar::Bool(*b),
            serde_json::Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Scalar::Int(i)
                } else if let Some(u) = n.as_u64() {
                    Scalar::UInt(u)
                } else {
                    Scalar::Float(n.as_f64().unwrap_or(f64::NAN))
                }
            }
            serde_json::Value::String(s) => Scalar::String(s.clone()),
            serde_json::Value::Array(_) | serde_json::Value::Object(_) => {
                let mut text = String::new();
                write_canonical_json(value, &mut text);
                Scalar::Structured(text)
            }
        }
    }

    /// Convert back into a JSON value
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Scalar::Null => serde_json::Value::Null,
            Scalar::Bool(b) => serde_json::Value::Bool(*b),
            Scalar::Int(i) => serde_json::Value::from(*i),
            Scalar::UInt(u) => serde_json::Value::from(*u),
            Scalar::Float(f) => serde_json::Number::from_f64(*f)
                .map_or(serde_json::Value::Null, serde_json::Value::Number),
            Scalar::String(s) => serde_json::Value::String(s.clone()),
            Scalar::Structured(text) => serde_json::from_str(text)
                .unwrap_or_else(|_| serde_json::Value::String(text.clone())),
        }
    }

    /// Get the type name as a string
    pub fn type_name(&self) -> &'static str {
        match self {
            Scalar::Null => "Null",
            Scalar::Bool(_) => "Bool",
            Scalar::Int(_) => "Int",
            Scalar::UInt(_) => "UInt",
            Scalar::Float(_) => "Float",
            Scalar::String(_) => "String",
            Scalar::Structured(_) => "Structured",
        }
    }

    /// Check if this is a null value
    pub fn is_null(&self) -> bool {
        matches!(self, Scalar::Null)
    }

    /// Get as &str if this is a String value
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Scalar::String(s) => Some(s),
            _ => None,
        }
    }

    /// Plain text form used by prefix indexes
    ///
    /// Null renders as the empty string, strings render unquoted.
    pub fn to_text(&self) -> String {
        match self {
            Scalar::Null => String::new(),
            Scalar::Bool(b) => b.to_string(),
            Scalar::Int(i) => i.to_string(),
            Scalar::UInt(u) => u.to_string(),
            Scalar::Float(f) => normalize_float(*f).to_string(),
            Scalar::String(s) => s.clone(),
            Scalar::Structured(text) => text.clone(),
        }
    }

    /// Append the canonical encoding of this scalar to `out`
    ///
    /// Each encoding is self-delimiting (type tag plus length prefix for
    /// variable-width text), so concatenations stay unambiguous.
    pub fn write_canonical(&self, out: &mut String) {
        match self {
            Scalar::Null => out.push('z'),
            Scalar::Bool(b) => {
                out.push_str(if *b { "b:1" } else { "b:0" });
            }
            Scalar::Int(i) => {
                out.push_str("i:");
                out.push_str(&i.to_string());
            }
            Scalar::UInt(u) => {
                out.push_str("u:");
                out.push_str(&u.to_string());
            }
            Scalar::Float(f) => {
                out.push_str("f:");
                out.push_str(&normalize_float(*f).to_string());
            }
            Scalar::String(s) => {
                out.push('s');
                out.push_str(&s.len().to_string());
                out.push(':');
                out.push_str(s);
            }
            Scalar::Structured(text) => {
                out.push('j');
                out.push_str(&text.len().to_string());
                out.push(':');
                out.push_str(text);
            }
        }
    }

    fn number_rank(&self) -> u8 {
        match self {
            Scalar::Int(_) => 0,
            Scalar::UInt(_) => 1,
            Scalar::Float(_) => 2,
            _ => 0,
        }
    }

    fn type_rank(&self) -> u8 {
        match self {
            Scalar::Bool(_) => 0,
            Scalar::Int(_) | Scalar::UInt(_) | Scalar::Float(_) => 1,
            Scalar::String(_) => 2,
            Scalar::Structured(_) => 3,
            Scalar::Null => 4,
        }
    }
}

/// Natural ordering of scalars, the default index comparator
///
/// Numbers compare numerically regardless of `Int`/`Float` representation;
/// null sorts after every non-null value; equal values compare `Equal`.
pub fn natural_order(a: &Scalar, b: &Scalar) -> Ordering {
    match (a, b) {
        (Scalar::Bool(x), Scalar::Bool(y)) => x.cmp(y),
        (Scalar::Int(x), Scalar::Int(y)) => x.cmp(y),
        (Scalar::UInt(x), Scalar::UInt(y)) => x.cmp(y),
        (Scalar::Int(x), Scalar::UInt(y)) => i128::from(*x).cmp(&i128::from(*y)),
        (Scalar::UInt(x), Scalar::Int(y)) => i128::from(*x).cmp(&i128::from(*y)),
        (Scalar::Float(x), Scalar::Float(y)) => normalize_float(*x).total_cmp(&normalize_float(*y)),
        (Scalar::Int(x), Scalar::Float(y)) => cmp_int_float(i128::from(*x), *y),
        (Scalar::Float(x), Scalar::Int(y)) => cmp_int_float(i128::from(*y), *x).reverse(),
        (Scalar::UInt(x), Scalar::Float(y)) => cmp_int_float(i128::from(*x), *y),
        (Scalar::Float(x), Scalar::UInt(y)) => cmp_int_float(i128::from(*y), *x).reverse(),
        (Scalar::String(x), Scalar::String(y)) => x.cmp(y),
        (Scalar::Structured(x), Scalar::Structured(y)) => x.cmp(y),
        _ => a.type_rank().cmp(&b.type_rank()),
    }
}

/// Exact comparison of an `i64` or `u64` integer with a float
fn cmp_int_float(i: i128, f: f64) -> Ordering {
    // 2^64, the first float above every u64
    const TWO_POW_64: f64 = 18_446_744_073_709_551_616.0;
    // -2^63, the smallest i64
    const MIN_I64: f64 = -9_223_372_036_854_775_808.0;

    if f.is_nan() || f >= TWO_POW_64 {
        return Ordering::Less;
    }
    if f < MIN_I64 {
        return Ordering::Greater;
    }
    let whole = f.trunc();
    match i.cmp(&(whole as i128)) {
        Ordering::Equal => 0.0f64.partial_cmp(&(f - whole)).unwrap_or(Ordering::Equal),
        other => other,
    }
}

/// Collapse `-0.0` onto `0.0` and every NaN payload onto one NaN
fn normalize_float(f: f64) -> f64 {
    if f == 0.0 {
        0.0
    } else if f.is_nan() {
        f64::NAN
    } else {
        f
    }
}

impl PartialEq for Scalar {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Scalar {}

impl PartialOrd for Scalar {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Scalar {
    /// Natural order, with `Int`, then `UInt`, then `Float` when numerically
    /// equal
    fn cmp(&self, other: &Self) -> Ordering {
        natural_order(self, other).then_with(|| self.number_rank().cmp(&other.number_rank()))
    }
}

impl Hash for Scalar {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            Scalar::Null => {}
            Scalar::Bool(b) => b.hash(state),
            Scalar::Int(i) => i.hash(state),
            Scalar::UInt(u) => u.hash(state),
            Scalar::Float(f) => normalize_float(*f).to_bits().hash(state),
            Scalar::String(s) | Scalar::Structured(s) => s.hash(state),
        }
    }
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scalar::Null => write!(f, "null"),
            Scalar::String(s) => write!(f, "{:?}", s),
            other => write!(f, "{}", other.to_text()),
        }
    }
}

impl From<bool> for Scalar {
    fn from(v: bool) -> Self {
        Scalar::Bool(v)
    }
}

impl From<i64> for Scalar {
    fn from(v: i64) -> Self {
        Scalar::Int(v)
    }
}

impl From<u64> for Scalar {
    /// Values that fit `i64` become `Int`
    fn from(v: u64) -> Self {
        i64::try_from(v).map_or(Scalar::UInt(v), Scalar::Int)
    }
}

impl From<i32> for Scalar {
    fn from(v: i32) -> Self {
        Scalar::Int(v.into())
    }
}

impl From<f64> for Scalar {
    fn from(v: f64) -> Self {
        Scalar::Float(v)
    }
}

impl From<&str> for Scalar {
    fn from(v: &str) -> Self {
        Scalar::String(v.to_string())
    }
}

impl From<String> for Scalar {
    fn from(v: String) -> Self {
        Scalar::String(v)
    }
}

impl From<&serde_json::Value> for Scalar {
    fn from(v: &serde_json::Value) -> Self {
        Scalar::from_json(v)
    }
}

// =============================================================================
// KeyValue
// =============================================================================

/// A resolved index key
///
/// A key spec resolves every record to one `KeyValue`. Composite keys compare
/// element-wise, with the shorter key first when all shared elements are equal.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum KeyValue {
    /// Single-field key
    Scalar(Scalar),
    /// Ordered sequence of field values
    Composite(Vec<Scalar>),
}

impl KeyValue {
    /// Build a composite key
    pub fn composite<I, S>(elements: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<Scalar>,
    {
        KeyValue::Composite(elements.into_iter().map(Into::into).collect())
    }

    /// Convert a JSON value into a key
    ///
    /// Arrays become composite keys of their elements; everything else is a
    /// single scalar.
    pub fn from_json(value: &serde_json::Value) -> Self {
        match value {
            serde_json::Value::Array(items) => {
                KeyValue::Composite(items.iter().map(Scalar::from_json).collect())
            }
            other => KeyValue::Scalar(Scalar::from_json(other)),
        }
    }

    /// Key elements; a scalar key is a one-element slice
    pub fn elements(&self) -> &[Scalar] {
        match self {
            KeyValue::Scalar(s) => std::slice::from_ref(s),
            KeyValue::Composite(items) => items,
        }
    }

    /// Check if this is a composite key
    pub fn is_composite(&self) -> bool {
        matches!(self, KeyValue::Composite(_))
    }

    /// Canonical text used for equality-index lookup
    ///
    /// Two keys share a canonical form iff they are equal element-wise and
    /// type-equal. A scalar and a one-element composite never collide.
    pub fn canonical(&self) -> String {
        let mut out = String::new();
        match self {
            KeyValue::Scalar(s) => s.write_canonical(&mut out),
            KeyValue::Composite(items) => {
                out.push('[');
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        out.push(',');
                    }
                    item.write_canonical(&mut out);
                }
                out.push(']');
            }
        }
        out
    }

    /// String walked by prefix indexes
    ///
    /// Composite keys join their element texts with a single space.
    pub fn prefix_text(&self) -> String {
        match self {
            KeyValue::Scalar(s) => s.to_text(),
            KeyValue::Composite(items) => items
                .iter()
                .map(Scalar::to_text)
                .collect::<Vec<_>>()
                .join(" "),
        }
    }
}

impl fmt::Display for KeyValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeyValue::Scalar(s) => write!(f, "{}", s),
            KeyValue::Composite(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                write!(f, "]")
            }
        }
    }
}

impl From<Scalar> for KeyValue {
    fn from(v: Scalar) -> Self {
        KeyValue::Scalar(v)
    }
}

impl From<Vec<Scalar>> for KeyValue {
    fn from(v: Vec<Scalar>) -> Self {
        KeyValue::Composite(v)
    }
}

impl From<serde_json::Value> for KeyValue {
    fn from(v: serde_json::Value) -> Self {
        KeyValue::from_json(&v)
    }
}

impl From<&serde_json::Value> for KeyValue {
    fn from(v: &serde_json::Value) -> Self {
        KeyValue::from_json(v)
    }
}

impl From<&str> for KeyValue {
    fn from(v: &str) -> Self {
        KeyValue::Scalar(v.into())
    }
}

impl From<String> for KeyValue {
    fn from(v: String) -> Self {
        KeyValue::Scalar(v.into())
    }
}

impl From<i64> for KeyValue {
    fn from(v: i64) -> Self {
        KeyValue::Scalar(v.into())
    }
}

impl From<u64> for KeyValue {
    fn from(v: u64) -> Self {
        KeyValue::Scalar(v.into())
    }
}

impl From<i32> for KeyValue {
    fn from(v: i32) -> Self {
        KeyValue::Scalar(v.into())
    }
}

impl From<f64> for KeyValue {
    fn from(v: f64) -> Self {
        KeyValue::Scalar(v.into())
    }
}

impl From<bool> for KeyValue {
    fn from(v: bool) -> Self {
        KeyValue::Scalar(v.into())
    }
}

// =============================================================================
// RecordId
// =============================================================================

/// Identifier of a record: the non-null value under the primary-key field
///
/// Ids compare by strict equality, so `1` and `"1"` are different records.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RecordId(Scalar);

impl RecordId {
    /// Build an id from a scalar; `None` if the scalar is null
    pub fn new(scalar: Scalar) -> Option<Self> {
        if scalar.is_null() {
            None
        } else {
            Some(RecordId(scalar))
        }
    }

    /// Build an id from a JSON value; `None` if the value is null
    pub fn from_json(value: &serde_json::Value) -> Option<Self> {
        Self::new(Scalar::from_json(value))
    }

    /// Underlying scalar
    pub fn as_scalar(&self) -> &Scalar {
        &self.0
    }

    /// JSON form of the id
    pub fn to_json(&self) -> serde_json::Value {
        self.0.to_json()
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for RecordId {
    fn from(v: i64) -> Self {
        RecordId(Scalar::Int(v))
    }
}

impl From<u64> for RecordId {
    fn from(v: u64) -> Self {
        RecordId(v.into())
    }
}

impl From<i32> for RecordId {
    fn from(v: i32) -> Self {
        RecordId(Scalar::Int(v.into()))
    }
}

impl From<&str> for RecordId {
    fn from(v: &str) -> Self {
        RecordId(Scalar::String(v.to_string()))
    }
}

impl From<String> for RecordId {
    fn from(v: String) -> Self {
        RecordId(Scalar::String(v))
    }
}

/// Write `value` as JSON text with object keys sorted
fn write_canonical_json(value: &serde_json::Value, out: &mut String) {
    match value {
        serde_json::Value::Object(map) => {
            let mut keys: Vec<&String> = map.keys().collect();
            keys.sort();
            out.push('{');
            for (i, key) in keys.into_iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                out.push_str(&serde_json::Value::String(key.clone()).to_string());
                out.push(':');
                if let Some(v) = map.get(key) {
                    write_canonical_json(v, out);
                }
            }
            out.push('}');
        }
        serde_json::Value::Array(items) => {
            out.push('[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                write_canonical_json(item, out);
            }
            out.push(']');
        }
        other => out.push_str(&other.to_string()),
    }
}
