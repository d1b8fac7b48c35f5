//! Untyped attribute tree.
//!
//! Persisted state is a flat attribute tree that mirrors the resource schema.
//! Upgrade steps rewrite it without knowing the typed record, so the tree
//! keeps unknown as its own variant instead of folding it into null.

use crate::attr::{is_unknown_marker, unknown_marker};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::BTreeMap;

/// A node of an untyped state tree.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Dynamic {
    /// Value to be computed during apply.
    Unknown,
    #[default]
    Null,
    Bool(bool),
    Number(serde_json::Number),
    String(String),
    List(Vec<Dynamic>),
    Object(BTreeMap<String, Dynamic>),
}

impl Dynamic {
    /// Creates an empty object node.
    #[must_use]
    pub fn object() -> Self {
        Dynamic::Object(BTreeMap::new())
    }

    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, Dynamic::Null)
    }

    #[must_use]
    pub fn is_unknown(&self) -> bool {
        matches!(self, Dynamic::Unknown)
    }

    #[must_use]
    pub fn as_object(&self) -> Option<&BTreeMap<String, Dynamic>> {
        match self {
            Dynamic::Object(map) => Some(map),
            _ => None,
        }
    }

    pub fn as_object_mut(&mut self) -> Option<&mut BTreeMap<String, Dynamic>> {
        match self {
            Dynamic::Object(map) => Some(map),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_list(&self) -> Option<&[Dynamic]> {
        match self {
            Dynamic::List(items) => Some(items),
            _ => None,
        }
    }

    /// Looks up a field of an object node.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Dynamic> {
        self.as_object().and_then(|m| m.get(key))
    }

    pub fn get_mut(&mut self, key: &str) -> Option<&mut Dynamic> {
        self.as_object_mut().and_then(|m| m.get_mut(key))
    }

    /// Sets a field on an object node. Returns false if this is not an object.
    pub fn insert(&mut self, key: impl Into<String>, value: Dynamic) -> bool {
        match self.as_object_mut() {
            Some(map) => {
                map.insert(key.into(), value);
                true
            }
            None => false,
        }
    }

    /// Removes a field from an object node.
    pub fn remove(&mut self, key: &str) -> Option<Dynamic> {
        self.as_object_mut().and_then(|m| m.remove(key))
    }

    /// Returns true if the tree contains an unknown anywhere.
    #[must_use]
    pub fn contains_unknown(&self) -> bool {
        match self {
            Dynamic::Unknown => true,
            Dynamic::List(items) => items.iter().any(Dynamic::contains_unknown),
            Dynamic::Object(map) => map.values().any(Dynamic::contains_unknown),
            _ => false,
        }
    }
}

impl From<serde_json::Value> for Dynamic {
    fn from(value: serde_json::Value) -> Self {
        use serde_json::Value;
        if is_unknown_marker(&value) {
            return Dynamic::Unknown;
        }
        match value {
            Value::Null => Dynamic::Null,
            Value::Bool(b) => Dynamic::Bool(b),
            Value::Number(n) => Dynamic::Number(n),
            Value::String(s) => Dynamic::String(s),
            Value::Array(items) => Dynamic::List(items.into_iter().map(Dynamic::from).collect()),
            Value::Object(map) => {
                Dynamic::Object(map.into_iter().map(|(k, v)| (k, Dynamic::from(v))).collect())
            }
        }
    }
}

impl From<Dynamic> for serde_json::Value {
    fn from(value: Dynamic) -> Self {
        use serde_json::Value;
        match value {
            Dynamic::Unknown => unknown_marker(),
            Dynamic::Null => Value::Null,
            Dynamic::Bool(b) => Value::Bool(b),
            Dynamic::Number(n) => Value::Number(n),
            Dynamic::String(s) => Value::String(s),
            Dynamic::List(items) => Value::Array(items.into_iter().map(Value::from).collect()),
            Dynamic::Object(map) => {
                Value::Object(map.into_iter().map(|(k, v)| (k, Value::from(v))).collect())
            }
        }
    }
}

impl From<bool> for Dynamic {
    fn from(value: bool) -> Self {
        Dynamic::Bool(value)
    }
}

impl From<i64> for Dynamic {
    fn from(value: i64) -> Self {
        Dynamic::Number(value.into())
    }
}

impl From<&str> for Dynamic {
    fn from(value: &str) -> Self {
        Dynamic::String(value.to_string())
    }
}

impl Serialize for Dynamic {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serde_json::Value::from(self.clone()).serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Dynamic {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        serde_json::Value::deserialize(deserializer).map(Dynamic::from)
    }
}
