//! Helpers shared by the entity modules.

use crate::{ModelError, ModelResult};
use commerce_types::{Attr, LocalizedString};
use std::collections::HashSet;

/// True when `desired` is concrete and differs from `current`.
///
/// A desired unknown never emits an action; it is resolved by the remote.
pub(crate) fn changed<T: PartialEq>(current: &Attr<T>, desired: &Attr<T>) -> bool {
    !desired.is_unknown() && current != desired
}

/// Fails with `ImmutableFieldChanged` if a field differs.
pub(crate) fn ensure_unchanged<T: PartialEq>(field: &str, current: &T, desired: &T) -> ModelResult<()> {
    if current == desired {
        Ok(())
    } else {
        Err(ModelError::immutable(field))
    }
}

/// Version an update is pinned to.
pub(crate) fn pinned_version(version: &Attr<i64>) -> ModelResult<i64> {
    version
        .as_known()
        .copied()
        .ok_or_else(|| ModelError::Internal("stored record has no version".into()))
}

pub(crate) fn validate_localized(path: &str, value: &LocalizedString) -> ModelResult<()> {
    value
        .validate()
        .map_err(|e| ModelError::invalid_input(path, e.to_string()))
}

pub(crate) fn validate_localized_opt(path: &str, value: Option<&LocalizedString>) -> ModelResult<()> {
    value.map_or(Ok(()), |v| validate_localized(path, v))
}

/// Rejects the first key that appears twice.
pub(crate) fn ensure_unique_keys<'a>(
    path: &str,
    what: &str,
    keys: impl IntoIterator<Item = &'a str>,
) -> ModelResult<()> {
    let mut seen = HashSet::new();
    for key in keys {
        if !seen.insert(key) {
            return Err(ModelError::invalid_input(
                path,
                format!("duplicate {what} '{key}'"),
            ));
        }
    }
    Ok(())
}

/// Action buckets in the order the remote must receive them.
///
/// Later actions may refer to state left by earlier ones: a default pointer
/// can only be set once its address was added, and an element can only be
/// removed once nothing points at it any more.
#[derive(Debug)]
pub(crate) struct Phases<A> {
    /// Scalar and localized field changes.
    pub scalars: Vec<A>,
    /// Collection membership additions.
    pub additions: Vec<A>,
    /// Mutations of elements present on both sides.
    pub mutations: Vec<A>,
    /// Default-pointer repointing.
    pub defaults: Vec<A>,
    /// Reference-list additions and removals.
    pub references: Vec<A>,
    /// Master-element pivot.
    pub pivot: Vec<A>,
    /// Collection membership removals.
    pub removals: Vec<A>,
    /// Custom-field changes.
    pub custom: Vec<A>,
    /// Actions that must see every other change, e.g. publish.
    pub trailing: Vec<A>,
}

impl<A> Default for Phases<A> {
    fn default() -> Self {
        Self {
            scalars: Vec::new(),
            additions: Vec::new(),
            mutations: Vec::new(),
            defaults: Vec::new(),
            references: Vec::new(),
            pivot: Vec::new(),
            removals: Vec::new(),
            custom: Vec::new(),
            trailing: Vec::new(),
        }
    }
}

impl<A> Phases<A> {
    pub fn is_empty(&self) -> bool {
        self.scalars.is_empty()
            && self.additions.is_empty()
            && self.mutations.is_empty()
            && self.defaults.is_empty()
            && self.references.is_empty()
            && self.pivot.is_empty()
            && self.removals.is_empty()
            && self.custom.is_empty()
            && self.trailing.is_empty()
    }

    pub fn into_actions(self) -> Vec<A> {
        let mut out = self.scalars;
        out.extend(self.additions);
        out.extend(self.mutations);
        out.extend(self.defaults);
        out.extend(self.references);
        out.extend(self.pivot);
        out.extend(self.removals);
        out.extend(self.custom);
        out.extend(self.trailing);
        out
    }
}
