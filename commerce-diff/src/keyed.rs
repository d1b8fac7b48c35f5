//! Keyed-collection diff.
//!
//! Element identity is carried by a secondary key rather than by position,
//! so reordering a collection never shows up as a change.

use std::collections::HashMap;

/// An element with a stable identity key.
pub trait Keyed {
    fn key(&self) -> &str;
}

impl Keyed for String {
    fn key(&self) -> &str {
        self
    }
}

impl Keyed for &str {
    fn key(&self) -> &str {
        self
    }
}

/// An element present on both sides with at least one differing field.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Modified<'a, T> {
    pub current: &'a T,
    pub desired: &'a T,
}

/// Result of [`diff_keyed`].
#[derive(Debug, Clone, PartialEq)]
pub struct KeyedDiff<'a, T> {
    /// In desired, not in current. Desired order.
    pub added: Vec<&'a T>,
    /// In both, differing. Desired order.
    pub modified: Vec<Modified<'a, T>>,
    /// In current, not in desired. Current order.
    pub removed: Vec<&'a T>,
}

impl<'a, T: Keyed> KeyedDiff<'a, T> {
    /// Returns true if the two sides are equivalent.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.modified.is_empty() && self.removed.is_empty()
    }

    /// Reorders every class lexicographically by key.
    ///
    /// For inputs whose order carries no meaning (e.g. collected from a map).
    #[must_use]
    pub fn sorted_by_key(mut self) -> Self {
        self.added.sort_by(|a, b| a.key().cmp(b.key()));
        self.modified.sort_by(|a, b| a.desired.key().cmp(b.desired.key()));
        self.removed.sort_by(|a, b| a.key().cmp(b.key()));
        self
    }
}

/// Diffs two keyed sequences using `PartialEq` to detect modification.
pub fn diff_keyed<'a, T: Keyed + PartialEq>(current: &'a [T], desired: &'a [T]) -> KeyedDiff<'a, T> {
    diff_keyed_with(current, desired, |a, b| a == b)
}

/// Diffs two keyed sequences with a caller-supplied equivalence.
///
/// When a key repeats within one side only its first occurrence takes part.
pub fn diff_keyed_with<'a, T, F>(current: &'a [T], desired: &'a [T], same: F) -> KeyedDiff<'a, T>
where
    T: Keyed,
    F: Fn(&T, &T) -> bool,
{
    let current_index = first_by_key(current);
    let desired_index = first_by_key(desired);

    let mut added = Vec::new();
    let mut modified = Vec::new();
    for (pos, item) in desired.iter().enumerate() {
        if desired_index.get(item.key()) != Some(&pos) {
            continue;
        }
        match current_index.get(item.key()) {
            None => added.push(item),
            Some(&cur) => {
                if !same(&current[cur], item) {
                    modified.push(Modified {
                        current: &current[cur],
                        desired: item,
                    });
                }
            }
        }
    }

    let removed = current
        .iter()
        .enumerate()
        .filter(|(pos, item)| {
            current_index.get(item.key()) == Some(pos) && !desired_index.contains_key(item.key())
        })
        .map(|(_, item)| item)
        .collect();

    KeyedDiff {
        added,
        modified,
        removed,
    }
}

fn first_by_key<T: Keyed>(items: &[T]) -> HashMap<&str, usize> {
    let mut index = HashMap::with_capacity(items.len());
    for (pos, item) in items.iter().enumerate() {
        index.entry(item.key()).or_insert(pos);
    }
    index
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duplicate_keys_use_first_occurrence() {
        let current = vec!["a".to_string(), "a".to_string()];
        let desired = vec!["b".to_string(), "b".to_string()];
        let diff = diff_keyed(&current, &desired);
        assert_eq!(diff.added.len(), 1);
        assert_eq!(diff.removed.len(), 1);
    }
}
