//! Tree rewrites shared by upgrade steps.
//!
//! Nested blocks moved between a single object and a list holding at most
//! one object as the schema evolved. Both directions are total on the
//! shapes they are meant for and leave an already-converted field alone, so
//! a step can be replayed on a partially upgraded tree.

use crate::{StateError, StateResult};
use commerce_types::Dynamic;

fn fields_mut<'a>(tree: &'a mut Dynamic, field: &str) -> StateResult<&'a mut std::collections::BTreeMap<String, Dynamic>> {
    tree.as_object_mut()
        .ok_or_else(|| StateError::malformed(field, "state root is not an object"))
}

/// Turns `[x]` into `x` and `[]` into null.
pub fn collapse_list(tree: &mut Dynamic, field: &str) -> StateResult<()> {
    let fields = fields_mut(tree, field)?;
    let Some(value) = fields.get_mut(field) else {
        return Ok(());
    };
    let collapsed = match std::mem::take(value) {
        Dynamic::List(items) if items.len() > 1 => {
            let count = items.len();
            *value = Dynamic::List(items);
            return Err(StateError::malformed(
                field,
                format!("expected at most one element, found {count}"),
            ));
        }
        Dynamic::List(items) => items.into_iter().next().unwrap_or(Dynamic::Null),
        other @ (Dynamic::Object(_) | Dynamic::Null | Dynamic::Unknown) => other,
        other => {
            *value = other;
            return Err(StateError::malformed(field, "expected a list or an object"));
        }
    };
    *value = collapsed;
    Ok(())
}

/// Turns `x` into `[x]` and null into `[]`.
pub fn expand_object(tree: &mut Dynamic, field: &str) -> StateResult<()> {
    let fields = fields_mut(tree, field)?;
    let value = fields.entry(field.to_string()).or_insert(Dynamic::Null);
    let expanded = match std::mem::take(value) {
        Dynamic::Null => Dynamic::List(Vec::new()),
        object @ Dynamic::Object(_) => Dynamic::List(vec![object]),
        other @ (Dynamic::List(_) | Dynamic::Unknown) => other,
        other => {
            *value = other;
            return Err(StateError::malformed(field, "expected an object or null"));
        }
    };
    *value = expanded;
    Ok(())
}

/// Adds `field` as unknown unless the tree already has a value for it.
pub fn introduce_unknown(tree: &mut Dynamic, field: &str) -> StateResult<()> {
    fields_mut(tree, field)?
        .entry(field.to_string())
        .or_insert(Dynamic::Unknown);
    Ok(())
}

/// Drops `field` when it holds null, so that the record's default applies.
pub fn drop_null(tree: &mut Dynamic, field: &str) -> StateResult<()> {
    let fields = fields_mut(tree, field)?;
    if fields.get(field).is_some_and(Dynamic::is_null) {
        fields.remove(field);
    }
    Ok(())
}
