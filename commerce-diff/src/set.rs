//! String-set diff.

use std::collections::HashSet;

/// Result of [`diff_sets`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SetDiff<'a> {
    /// Desired members missing from current, in desired order.
    pub added: Vec<&'a str>,
    /// Current members missing from desired, in current order.
    pub removed: Vec<&'a str>,
}

impl SetDiff<'_> {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty()
    }
}

/// Diffs two collections treated as sets. Duplicates are reported once.
pub fn diff_sets<'a, S: AsRef<str>>(current: &'a [S], desired: &'a [S]) -> SetDiff<'a> {
    let cur: HashSet<&str> = current.iter().map(AsRef::as_ref).collect();
    let des: HashSet<&str> = desired.iter().map(AsRef::as_ref).collect();

    let mut seen = HashSet::new();
    let added = desired
        .iter()
        .map(AsRef::as_ref)
        .filter(|m| !cur.contains(m) && seen.insert(*m))
        .collect();

    let mut seen = HashSet::new();
    let removed = current
        .iter()
        .map(AsRef::as_ref)
        .filter(|m| !des.contains(m) && seen.insert(*m))
        .collect();

    SetDiff { added, removed }
}

/// Returns true if both collections hold the same members, ignoring order.
pub fn same_members<S: AsRef<str>>(a: &[S], b: &[S]) -> bool {
    diff_sets(a, b).is_empty()
}
