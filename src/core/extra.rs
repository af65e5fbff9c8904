//! Bound extra fields attached to log records
//!
//! This module provides:
//! - `FieldValue`: typed value for a structured field
//! - `Extra`: the open string-keyed map carried by every record

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Value type for structured logging fields
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    List(Vec<FieldValue>),
    Map(BTreeMap<String, FieldValue>),
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::String(s) => write!(f, "{}", s),
            FieldValue::Int(i) => write!(f, "{}", i),
            FieldValue::Float(fl) => write!(f, "{}", fl),
            FieldValue::Bool(b) => write!(f, "{}", b),
            FieldValue::Null => write!(f, "null"),
            FieldValue::List(_) | FieldValue::Map(_) => {
                let mut lossy = Vec::new();
                write!(f, "{}", self.to_json_lossy("", &mut lossy))
            }
        }
    }
}

impl FieldValue {
    /// Python-style truthiness, used by the `disable_*` flags
    pub fn is_truthy(&self) -> bool {
        match self {
            FieldValue::Null => false,
            FieldValue::Bool(b) => *b,
            FieldValue::Int(i) => *i != 0,
            FieldValue::Float(f) => *f != 0.0,
            FieldValue::String(s) => !s.is_empty(),
            FieldValue::List(items) => !items.is_empty(),
            FieldValue::Map(map) => !map.is_empty(),
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            FieldValue::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&BTreeMap<String, FieldValue>> {
        match self {
            FieldValue::Map(map) => Some(map),
            _ => None,
        }
    }

    /// Convert to `serde_json::Value`
    ///
    /// Non-finite floats have no JSON form; they become `null` and their
    /// field path is pushed to `lossy`.
    pub fn to_json_lossy(&self, path: &str, lossy: &mut Vec<String>) -> serde_json::Value {
        match self {
            FieldValue::String(s) => serde_json::Value::String(s.clone()),
            FieldValue::Int(i) => serde_json::Value::Number((*i).into()),
            FieldValue::Float(f) => match serde_json::Number::from_f64(*f) {
                Some(n) => serde_json::Value::Number(n),
                None => {
                    lossy.push(path.to_string());
                    serde_json::Value::Null
                }
            },
            FieldValue::Bool(b) => serde_json::Value::Bool(*b),
            FieldValue::Null => serde_json::Value::Null,
            FieldValue::List(items) => serde_json::Value::Array(
                items
                    .iter()
                    .enumerate()
                    .map(|(i, v)| v.to_json_lossy(&format!("{}[{}]", path, i), lossy))
                    .collect(),
            ),
            FieldValue::Map(map) => serde_json::Value::Object(
                map.iter()
                    .map(|(k, v)| {
                        let child = if path.is_empty() {
                            k.clone()
                        } else {
                            format!("{}.{}", path, k)
                        };
                        (k.clone(), v.to_json_lossy(&child, lossy))
                    })
                    .collect(),
            ),
        }
    }
}

impl From<String> for FieldValue {
    fn from(s: String) -> Self {
        FieldValue::String(s)
    }
}

impl From<&str> for FieldValue {
    fn from(s: &str) -> Self {
        FieldValue::String(s.to_string())
    }
}

impl From<i64> for FieldValue {
    fn from(i: i64) -> Self {
        FieldValue::Int(i)
    }
}

impl From<i32> for FieldValue {
    fn from(i: i32) -> Self {
        FieldValue::Int(i64::from(i))
    }
}

impl From<u16> for FieldValue {
    fn from(i: u16) -> Self {
        FieldValue::Int(i64::from(i))
    }
}

impl From<u32> for FieldValue {
    fn from(i: u32) -> Self {
        FieldValue::Int(i64::from(i))
    }
}

impl From<u64> for FieldValue {
    fn from(i: u64) -> Self {
        i64::try_from(i)
            .map(FieldValue::Int)
            .unwrap_or(FieldValue::Float(i as f64))
    }
}

impl From<usize> for FieldValue {
    fn from(i: usize) -> Self {
        FieldValue::from(i as u64)
    }
}

impl From<f64> for FieldValue {
    fn from(f: f64) -> Self {
        FieldValue::Float(f)
    }
}

impl From<bool> for FieldValue {
    fn from(b: bool) -> Self {
        FieldValue::Bool(b)
    }
}

impl<T: Into<FieldValue>> From<Option<T>> for FieldValue {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(FieldValue::Null)
    }
}

impl<T: Into<FieldValue>> From<Vec<T>> for FieldValue {
    fn from(items: Vec<T>) -> Self {
        FieldValue::List(items.into_iter().map(Into::into).collect())
    }
}

impl From<Extra> for FieldValue {
    fn from(extra: Extra) -> Self {
        FieldValue::Map(extra.fields)
    }
}

impl From<serde_json::Value> for FieldValue {
    fn from(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => FieldValue::Null,
            serde_json::Value::Bool(b) => FieldValue::Bool(b),
            serde_json::Value::Number(n) => match n.as_i64() {
                Some(i) => FieldValue::Int(i),
                None => FieldValue::Float(n.as_f64().unwrap_or(f64::NAN)),
            },
            serde_json::Value::String(s) => FieldValue::String(s),
            serde_json::Value::Array(items) => {
                FieldValue::List(items.into_iter().map(FieldValue::from).collect())
            }
            serde_json::Value::Object(map) => FieldValue::Map(
                map.into_iter()
                    .map(|(k, v)| (k, FieldValue::from(v)))
                    .collect(),
            ),
        }
    }
}

/// Extra fields bound to a record
///
/// Keys are unique; iteration order is by key so formatted output is
/// stable.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Extra {
    fields: BTreeMap<String, FieldValue>,
}

impl Extra {
    pub fn new() -> Self {
        Self {
            fields: BTreeMap::new(),
        }
    }

    /// Add a field (builder form)
    pub fn with_field<K, V>(mut self, key: K, value: V) -> Self
    where
        K: Into<String>,
        V: Into<FieldValue>,
    {
        self.fields.insert(key.into(), value.into());
        self
    }

    pub fn insert<K, V>(&mut self, key: K, value: V)
    where
        K: Into<String>,
        V: Into<FieldValue>,
    {
        self.fields.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&FieldValue> {
        self.fields.get(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.fields.contains_key(key)
    }

    /// True when the field exists and is truthy
    pub fn flag(&self, key: &str) -> bool {
        self.fields.get(key).is_some_and(FieldValue::is_truthy)
    }

    pub fn fields(&self) -> &BTreeMap<String, FieldValue> {
        &self.fields
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &FieldValue)> {
        self.fields.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Merge `other` into a copy of `self`; keys from `other` win
    pub fn merged(&self, other: &Extra) -> Extra {
        let mut fields = self.fields.clone();
        for (key, value) in &other.fields {
            fields.insert(key.clone(), value.clone());
        }
        Extra { fields }
    }

    /// Format fields as key=value pairs
    pub fn format_fields(&self) -> String {
        self.fields
            .iter()
            .map(|(k, v)| format!("{}={}", k, v))
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// JSON object of all fields, tracking values that had to be nulled
    pub fn to_json_lossy(&self, lossy: &mut Vec<String>) -> serde_json::Value {
        serde_json::Value::Object(
            self.fields
                .iter()
                .map(|(k, v)| (k.clone(), v.to_json_lossy(k, lossy)))
                .collect(),
        )
    }
}

impl fmt::Display for Extra {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.format_fields())
    }
}

impl<K: Into<String>, V: Into<FieldValue>> FromIterator<(K, V)> for Extra {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Extra {
            fields: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extra_creation() {
        let extra = Extra::new();
        assert!(extra.is_empty());
    }

    #[test]
    fn test_extra_with_fields() {
        let extra = Extra::new()
            .with_field("user_id", 123)
            .with_field("username", "john_doe")
            .with_field("active", true);

        assert_eq!(extra.len(), 3);
        assert_eq!(extra.get("username").and_then(FieldValue::as_str), Some("john_doe"));
    }

    #[test]
    fn test_extra_format_is_sorted() {
        let extra = Extra::new()
            .with_field("key2", 42)
            .with_field("key1", "value1");

        assert_eq!(extra.format_fields(), "key1=value1 key2=42");
    }

    #[test]
    fn test_flag_truthiness() {
        let extra = Extra::new()
            .with_field("disable_std", true)
            .with_field("disable_file", false)
            .with_field("disable_all", 0)
            .with_field("disable_file_json", "yes")
            .with_field("disable_file_err", "");

        assert!(extra.flag("disable_std"));
        assert!(!extra.flag("disable_file"));
        assert!(!extra.flag("disable_all"));
        assert!(extra.flag("disable_file_json"));
        assert!(!extra.flag("disable_file_err"));
        assert!(!extra.flag("missing"));
    }

    #[test]
    fn test_merged_prefers_other() {
        let bound = Extra::new().with_field("key", "bound").with_field("service", "api");
        let call = Extra::new().with_field("key", "call");

        let merged = bound.merged(&call);
        assert_eq!(merged.get("key").and_then(FieldValue::as_str), Some("call"));
        assert_eq!(merged.len(), 2);
        // originals untouched
        assert_eq!(bound.get("key").and_then(FieldValue::as_str), Some("bound"));
    }

    #[test]
    fn test_non_finite_float_is_nulled_and_reported() {
        let extra = Extra::new()
            .with_field("ratio", f64::NAN)
            .with_field(
                "nested",
                FieldValue::Map(BTreeMap::from([("inf".to_string(), FieldValue::Float(f64::INFINITY))])),
            )
            .with_field("ok", 1.5);

        let mut lossy = Vec::new();
        let json = extra.to_json_lossy(&mut lossy);

        assert_eq!(json["ratio"], serde_json::Value::Null);
        assert_eq!(json["nested"]["inf"], serde_json::Value::Null);
        assert_eq!(json["ok"], 1.5);
        assert_eq!(lossy, vec!["nested.inf".to_string(), "ratio".to_string()]);
    }

    #[test]
    fn test_from_json_value() {
        let value = serde_json::json!({"a": [1, "x", null], "b": {"c": true}});
        let field = FieldValue::from(value);
        let map = field.as_map().unwrap();
        assert_eq!(
            map["a"],
            FieldValue::List(vec![
                FieldValue::Int(1),
                FieldValue::String("x".into()),
                FieldValue::Null
            ])
        );
    }
}
