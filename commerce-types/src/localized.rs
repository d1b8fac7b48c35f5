//! Localized strings.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A mapping from locale key to text.
///
/// Backed by an ordered map so that equality is by key set and per-key value,
/// independent of the order in which the remote service returned the entries.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LocalizedString(BTreeMap<String, String>);

impl LocalizedString {
    /// Creates an empty localized string.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a translation, builder style.
    #[must_use]
    pub fn with(mut self, locale: impl Into<String>, value: impl Into<String>) -> Self {
        self.0.insert(locale.into(), value.into());
        self
    }

    /// Sets the translation for a locale, returning the previous one.
    pub fn insert(&mut self, locale: impl Into<String>, value: impl Into<String>) -> Option<String> {
        self.0.insert(locale.into(), value.into())
    }

    /// Returns the translation for a locale.
    #[must_use]
    pub fn get(&self, locale: &str) -> Option<&str> {
        self.0.get(locale).map(String::as_str)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterates over `(locale, text)` pairs in locale order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Checks every locale key against `^[a-z]{2}(-[A-Z]{2})?$`.
    pub fn validate(&self) -> Result<()> {
        match self.0.keys().find(|k| !is_valid_locale(k)) {
            Some(bad) => Err(Error::InvalidLocale(bad.clone())),
            None => Ok(()),
        }
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for LocalizedString {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

impl From<BTreeMap<String, String>> for LocalizedString {
    fn from(map: BTreeMap<String, String>) -> Self {
        Self(map)
    }
}

/// Returns true if `locale` matches `^[a-z]{2}(-[A-Z]{2})?$`.
#[must_use]
pub fn is_valid_locale(locale: &str) -> bool {
    let bytes = locale.as_bytes();
    match bytes.len() {
        2 => bytes.iter().all(u8::is_ascii_lowercase),
        5 => {
            bytes[..2].iter().all(u8::is_ascii_lowercase)
                && bytes[2] == b'-'
                && bytes[3..].iter().all(u8::is_ascii_uppercase)
        }
        _ => false,
    }
}
