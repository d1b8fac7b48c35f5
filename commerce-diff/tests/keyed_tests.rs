use commerce_diff::{diff_keyed, diff_keyed_with, diff_sets, same_members, Keyed};
use pretty_assertions::assert_eq;

#[derive(Debug, Clone, PartialEq)]
struct Addr {
    key: String,
    city: String,
}

impl Keyed for Addr {
    fn key(&self) -> &str {
        &self.key
    }
}

fn addr(key: &str, city: &str) -> Addr {
    Addr {
        key: key.into(),
        city: city.into(),
    }
}

fn keys<'a>(items: &[&'a Addr]) -> Vec<&'a str> {
    items.iter().map(|a| a.key.as_str()).collect()
}

// ── Keyed diff ───────────────────────────────────────────────────

#[test]
fn identical_sequences_produce_empty_diff() {
    let items = vec![addr("a", "Berlin"), addr("b", "Paris")];
    assert!(diff_keyed(&items, &items).is_empty());
}

#[test]
fn reordering_is_not_a_change() {
    let current = vec![addr("a", "Berlin"), addr("b", "Paris")];
    let desired = vec![addr("b", "Paris"), addr("a", "Berlin")];
    assert!(diff_keyed(&current, &desired).is_empty());
}

#[test]
fn classifies_added_modified_removed() {
    let current = vec![addr("a", "Berlin"), addr("b", "Paris"), addr("c", "Rome")];
    let desired = vec![addr("d", "Oslo"), addr("b", "Lyon"), addr("a", "Berlin")];

    let diff = diff_keyed(&current, &desired);

    assert_eq!(keys(&diff.added), vec!["d"]);
    assert_eq!(keys(&diff.removed), vec!["c"]);
    assert_eq!(diff.modified.len(), 1);
    assert_eq!(diff.modified[0].current.city, "Paris");
    assert_eq!(diff.modified[0].desired.city, "Lyon");
}

#[test]
fn added_follows_desired_order_removed_follows_current_order() {
    let current = vec![addr("z", "1"), addr("y", "2"), addr("x", "3")];
    let desired = vec![addr("c", "1"), addr("a", "2"), addr("b", "3")];

    let diff = diff_keyed(&current, &desired);

    assert_eq!(keys(&diff.added), vec!["c", "a", "b"]);
    assert_eq!(keys(&diff.removed), vec!["z", "y", "x"]);
}

#[test]
fn sorted_by_key_orders_every_class() {
    let current = vec![addr("z", "1"), addr("y", "2"), addr("m", "old"), addr("k", "old")];
    let desired = vec![addr("c", "1"), addr("a", "2"), addr("m", "new"), addr("k", "new")];

    let diff = diff_keyed(&current, &desired).sorted_by_key();

    assert_eq!(keys(&diff.added), vec!["a", "c"]);
    assert_eq!(keys(&diff.removed), vec!["y", "z"]);
    let modified: Vec<&str> = diff.modified.iter().map(|m| m.desired.key.as_str()).collect();
    assert_eq!(modified, vec!["k", "m"]);
}

#[test]
fn custom_equivalence_ignores_fields() {
    let current = vec![addr("a", "Berlin")];
    let desired = vec![addr("a", "BERLIN")];

    let diff = diff_keyed_with(&current, &desired, |a, b| {
        a.city.eq_ignore_ascii_case(&b.city)
    });
    assert!(diff.is_empty());
}

#[test]
fn empty_current_adds_everything() {
    let desired = vec![addr("a", "x"), addr("b", "y")];
    let diff = diff_keyed(&[], &desired);
    assert_eq!(keys(&diff.added), vec!["a", "b"]);
    assert!(diff.removed.is_empty());
}

#[test]
fn empty_desired_removes_everything() {
    let current = vec![addr("a", "x"), addr("b", "y")];
    let diff = diff_keyed(&current, &[]);
    assert_eq!(keys(&diff.removed), vec!["a", "b"]);
    assert!(diff.added.is_empty());
}

#[test]
fn string_elements_are_their_own_key() {
    let current = vec!["a".to_string(), "b".to_string()];
    let desired = vec!["b".to_string(), "c".to_string()];
    let diff = diff_keyed(&current, &desired);
    assert_eq!(diff.added, vec![&"c".to_string()]);
    assert_eq!(diff.removed, vec![&"a".to_string()]);
}

// ── Set diff ─────────────────────────────────────────────────────

#[test]
fn set_diff_reports_members_once() {
    let current = vec!["view", "view", "edit"];
    let desired = vec!["edit", "admin", "admin"];

    let diff = diff_sets(&current, &desired);

    assert_eq!(diff.added, vec!["admin"]);
    assert_eq!(diff.removed, vec!["view"]);
}

#[test]
fn same_members_ignores_order_and_duplicates() {
    assert!(same_members(&["a", "b"], &["b", "a", "a"]));
    assert!(!same_members(&["a", "b"], &["a"]));
    assert!(same_members::<&str>(&[], &[]));
}
