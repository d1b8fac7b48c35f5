//! Client-side resort of remote collections.
//!
//! The remote service may return collections in arbitrary order. Storing them
//! in that order would make every plan show a reorder, so after each write or
//! read the collection is put back into the configured order.

use crate::Keyed;
use std::collections::HashMap;

/// Orders `actual` by position in `plan`.
///
/// Elements the plan does not mention keep their relative order and go last.
pub fn sort_by_plan<'p, T, I>(plan: I, mut actual: Vec<T>) -> Vec<T>
where
    T: Keyed,
    I: IntoIterator<Item = &'p str>,
{
    let positions = positions(plan);
    // stable: unplanned elements share usize::MAX and keep their order
    actual.sort_by_key(|item| positions.get(item.key()).copied().unwrap_or(usize::MAX));
    actual
}

/// Orders `actual` by position in `plan` and drops what the plan does not mention.
///
/// The result is always a subsequence of the plan.
pub fn retain_in_plan_order<'p, T, I>(plan: I, actual: Vec<T>) -> Vec<T>
where
    T: Keyed,
    I: IntoIterator<Item = &'p str>,
{
    let positions = positions(plan);
    let mut kept: Vec<(usize, T)> = actual
        .into_iter()
        .filter_map(|item| positions.get(item.key()).map(|&pos| (pos, item)))
        .collect();
    kept.sort_by_key(|(pos, _)| *pos);
    kept.dedup_by_key(|(pos, _)| *pos);
    kept.into_iter().map(|(_, item)| item).collect()
}

fn positions<'p>(plan: impl IntoIterator<Item = &'p str>) -> HashMap<&'p str, usize> {
    let mut map = HashMap::new();
    for (pos, key) in plan.into_iter().enumerate() {
        map.entry(key).or_insert(pos);
    }
    map
}
