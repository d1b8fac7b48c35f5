//! Tri-state attribute values.
//!
//! Every user-facing scalar in the configured and stored representations is
//! one of three things: a known value, an explicit null, or a value that is
//! unknown until apply time. Unknown is a plan-time state and must survive
//! into diffing, so it is a variant of its own rather than a sentinel.

use serde::de::{DeserializeOwned, Error as _};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Key of the JSON object used to persist an unknown value.
pub const UNKNOWN_MARKER: &str = "$unknown";

/// A tri-state attribute value.
///
/// Equality is tag-first: two nulls are equal, two unknowns are equal, and
/// null, unknown and known values never compare equal to each other.
/// Use [`Attr::loosely_eq`] when an unknown should match anything.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Attr<T> {
    /// A concrete value.
    Known(T),
    /// Explicitly absent.
    Null,
    /// To be computed during apply.
    Unknown,
}

impl<T> Default for Attr<T> {
    fn default() -> Self {
        Attr::Null
    }
}

impl<T> Attr<T> {
    /// Wraps a known value.
    #[must_use]
    pub const fn known(value: T) -> Self {
        Attr::Known(value)
    }

    /// Returns true if this holds a concrete value.
    #[must_use]
    pub const fn is_known(&self) -> bool {
        matches!(self, Attr::Known(_))
    }

    /// Returns true if this is an explicit null.
    #[must_use]
    pub const fn is_null(&self) -> bool {
        matches!(self, Attr::Null)
    }

    /// Returns true if this is unknown.
    #[must_use]
    pub const fn is_unknown(&self) -> bool {
        matches!(self, Attr::Unknown)
    }

    /// Returns a reference to the known value, if any.
    #[must_use]
    pub const fn as_known(&self) -> Option<&T> {
        match self {
            Attr::Known(v) => Some(v),
            _ => None,
        }
    }

    /// Converts `&Attr<T>` into `Attr<&T>`.
    #[must_use]
    pub const fn as_ref(&self) -> Attr<&T> {
        match self {
            Attr::Known(v) => Attr::Known(v),
            Attr::Null => Attr::Null,
            Attr::Unknown => Attr::Unknown,
        }
    }

    /// Collapses null and unknown into `None`.
    #[must_use]
    pub fn into_option(self) -> Option<T> {
        match self {
            Attr::Known(v) => Some(v),
            _ => None,
        }
    }

    /// Maps the known value, keeping null and unknown as they are.
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Attr<U> {
        match self {
            Attr::Known(v) => Attr::Known(f(v)),
            Attr::Null => Attr::Null,
            Attr::Unknown => Attr::Unknown,
        }
    }

    /// Returns the known value or `default` for null and unknown.
    pub fn known_or(self, default: T) -> T {
        match self {
            Attr::Known(v) => v,
            _ => default,
        }
    }

    /// Equality that lets an unknown on either side match any value.
    #[must_use]
    pub fn loosely_eq(&self, other: &Self) -> bool
    where
        T: PartialEq,
    {
        match (self, other) {
            (Attr::Unknown, _) | (_, Attr::Unknown) => true,
            (a, b) => a == b,
        }
    }
}

impl<T: Copy> Attr<T> {
    /// Copies the known value out, or returns `default` for null and unknown.
    #[must_use]
    pub fn get_or(&self, default: T) -> T {
        match self {
            Attr::Known(v) => *v,
            _ => default,
        }
    }
}

impl<T: Clone> Attr<T> {
    /// Clones the known value out, collapsing null and unknown into `None`.
    #[must_use]
    pub fn to_option(&self) -> Option<T> {
        self.as_known().cloned()
    }
}

impl Attr<String> {
    /// Borrows a known string value.
    #[must_use]
    pub fn as_deref(&self) -> Option<&str> {
        self.as_known().map(String::as_str)
    }
}

impl<T> From<Option<T>> for Attr<T> {
    fn from(value: Option<T>) -> Self {
        match value {
            Some(v) => Attr::Known(v),
            None => Attr::Null,
        }
    }
}

impl From<&str> for Attr<String> {
    fn from(value: &str) -> Self {
        Attr::Known(value.to_string())
    }
}

/// Builds the JSON value used to persist an unknown.
#[must_use]
pub fn unknown_marker() -> serde_json::Value {
    let mut map = serde_json::Map::new();
    map.insert(UNKNOWN_MARKER.to_string(), serde_json::Value::Bool(true));
    serde_json::Value::Object(map)
}

/// Returns true if `value` is the persisted form of an unknown.
#[must_use]
pub fn is_unknown_marker(value: &serde_json::Value) -> bool {
    match value {
        serde_json::Value::Object(map) => {
            map.len() == 1 && map.get(UNKNOWN_MARKER) == Some(&serde_json::Value::Bool(true))
        }
        _ => false,
    }
}

impl<T: Serialize> Serialize for Attr<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Attr::Known(v) => v.serialize(serializer),
            Attr::Null => serializer.serialize_none(),
            Attr::Unknown => {
                let mut map = serializer.serialize_map(Some(1))?;
                map.serialize_entry(UNKNOWN_MARKER, &true)?;
                map.end()
            }
        }
    }
}

impl<'de, T: DeserializeOwned> Deserialize<'de> for Attr<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = serde_json::Value::deserialize(deserializer)?;
        if raw.is_null() {
            return Ok(Attr::Null);
        }
        if is_unknown_marker(&raw) {
            return Ok(Attr::Unknown);
        }
        T::deserialize(raw).map(Attr::Known).map_err(D::Error::custom)
    }
}
