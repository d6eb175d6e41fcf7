//! Tagged document values.
//!
//! A [`Value`] is the logical content of a document: nested mappings with
//! string keys, ordered sequences, and scalars. Mappings are stored in a
//! `BTreeMap`, so two documents built with fields in different orders are
//! equal values and canonicalize to the same bytes.

use serde::ser::{SerializeMap, SerializeSeq};
use serde::{Serialize, Serializer};
use std::collections::BTreeMap;

use crate::error::CanonicalizationError;

/// A document number.
///
/// Floats are only constructible through [`Number::from_f64`], which
/// rejects NaN and the infinities.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Number {
    /// Signed integer.
    Int(i64),
    /// Unsigned integer above `i64::MAX`.
    UInt(u64),
    /// Finite floating point number.
    Float(f64),
}

impl Number {
    /// Create a float number, rejecting non-finite input.
    pub fn from_f64(f: f64) -> Option<Self> {
        f.is_finite().then_some(Number::Float(f))
    }
}

impl From<i64> for Number {
    fn from(n: i64) -> Self {
        Number::Int(n)
    }
}

impl From<u64> for Number {
    fn from(n: u64) -> Self {
        match i64::try_from(n) {
            Ok(i) => Number::Int(i),
            Err(_) => Number::UInt(n),
        }
    }
}

/// A document value.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    Number(Number),
    String(String),
    Sequence(Vec<Value>),
    Mapping(BTreeMap<String, Value>),
}

impl Value {
    /// Build a value from any serializable type.
    ///
    /// Fails when the type serializes a map with non-string keys.
    pub fn from_serialize<T: Serialize + ?Sized>(
        value: &T,
    ) -> Result<Self, CanonicalizationError> {
        let json = serde_json::to_value(value).map_err(|e| CanonicalizationError::UnsupportedValue {
            path: "$".into(),
            reason: e.to_string(),
        })?;
        Ok(Self::from(json))
    }

    /// Parse a value from JSON text.
    pub fn from_json_str(s: &str) -> Result<Self, CanonicalizationError> {
        let json: serde_json::Value = serde_json::from_str(s)
            .map_err(|e| CanonicalizationError::Serialization(e.to_string()))?;
        Ok(Self::from(json))
    }

    /// Create a float value, rejecting NaN and infinities.
    pub fn float(f: f64) -> Result<Self, CanonicalizationError> {
        Number::from_f64(f)
            .map(Value::Number)
            .ok_or_else(|| CanonicalizationError::NonFiniteNumber(f.to_string()))
    }

    /// Look up a key if this is a mapping.
    pub fn get(&self, key: &str) -> Option<&Value> {
        match self {
            Value::Mapping(map) => map.get(key),
            _ => None,
        }
    }

    /// Remove a key if this is a mapping, returning the removed value.
    pub fn remove(&mut self, key: &str) -> Option<Value> {
        match self {
            Value::Mapping(map) => map.remove(key),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }
}

impl From<serde_json::Value> for Value {
    fn from(json: serde_json::Value) -> Self {
        match json {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(b),
            serde_json::Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Value::Number(Number::Int(i))
                } else if let Some(u) = n.as_u64() {
                    Value::Number(Number::UInt(u))
                } else {
                    // serde_json never holds a non-finite float
                    Value::Number(Number::Float(n.as_f64().unwrap_or_default()))
                }
            }
            serde_json::Value::String(s) => Value::String(s),
            serde_json::Value::Array(items) => {
                Value::Sequence(items.into_iter().map(Value::from).collect())
            }
            serde_json::Value::Object(map) => Value::Mapping(
                map.into_iter().map(|(k, v)| (k, Value::from(v))).collect(),
            ),
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Number(Number::Int(n))
    }
}

impl From<u64> for Value {
    fn from(n: u64) -> Self {
        Value::Number(Number::from(n))
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_owned())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl<V: Into<Value>> From<Vec<V>> for Value {
    fn from(items: Vec<V>) -> Self {
        Value::Sequence(items.into_iter().map(Into::into).collect())
    }
}

impl<V: Into<Value>> FromIterator<(String, V)> for Value {
    fn from_iter<I: IntoIterator<Item = (String, V)>>(iter: I) -> Self {
        Value::Mapping(iter.into_iter().map(|(k, v)| (k, v.into())).collect())
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Value::Null => serializer.serialize_unit(),
            Value::Bool(b) => serializer.serialize_bool(*b),
            Value::Number(Number::Int(i)) => serializer.serialize_i64(*i),
            Value::Number(Number::UInt(u)) => serializer.serialize_u64(*u),
            Value::Number(Number::Float(f)) => serializer.serialize_f64(*f),
            Value::String(s) => serializer.serialize_str(s),
            Value::Sequence(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
            Value::Mapping(entries) => {
                let mut map = serializer.serialize_map(Some(entries.len()))?;
                for (k, v) in entries {
                    map.serialize_entry(k, v)?;
                }
                map.end()
            }
        }
    }
}
