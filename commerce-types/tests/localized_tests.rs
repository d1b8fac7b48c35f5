use commerce_types::{is_valid_locale, Error, LocalizedString};
use pretty_assertions::assert_eq;
use proptest::prelude::*;

// ── Locale validation ────────────────────────────────────────────

#[test]
fn accepts_language_and_region_forms() {
    assert!(is_valid_locale("en"));
    assert!(is_valid_locale("de-DE"));
    assert!(is_valid_locale("pt-BR"));
}

#[test]
fn rejects_malformed_locales() {
    for bad in ["", "e", "EN", "en-us", "en_US", "eng", "en-USA", "de-De", "1a"] {
        assert!(!is_valid_locale(bad), "{bad} should be rejected");
    }
}

#[test]
fn validate_reports_offending_key() {
    let ls = LocalizedString::new().with("en", "Hi").with("en_GB", "Hi");
    match ls.validate() {
        Err(Error::InvalidLocale(key)) => assert_eq!(key, "en_GB"),
        other => panic!("expected InvalidLocale, got {other:?}"),
    }
}

// ── Equality ─────────────────────────────────────────────────────

#[test]
fn equality_ignores_insertion_order() {
    let a = LocalizedString::new().with("en", "Shoe").with("de", "Schuh");
    let b = LocalizedString::new().with("de", "Schuh").with("en", "Shoe");
    assert_eq!(a, b);
}

#[test]
fn equality_is_per_key() {
    let a = LocalizedString::new().with("en", "Shoe");
    let b = LocalizedString::new().with("en", "Shoe").with("de", "Schuh");
    assert_ne!(a, b);
    assert_ne!(a, LocalizedString::new().with("en", "Boot"));
}

#[test]
fn serializes_as_plain_object() {
    let ls: LocalizedString = [("en", "Shoe"), ("de", "Schuh")].into_iter().collect();
    let json = serde_json::to_value(&ls).unwrap();
    assert_eq!(json, serde_json::json!({"de": "Schuh", "en": "Shoe"}));
}

proptest! {
    #[test]
    fn equality_is_order_independent(entries in prop::collection::btree_map("[a-z]{2}", "[a-zA-Z ]{0,12}", 0..6)) {
        let forward: LocalizedString = entries.iter().map(|(k, v)| (k.clone(), v.clone())).collect();
        let backward: LocalizedString = entries.iter().rev().map(|(k, v)| (k.clone(), v.clone())).collect();
        prop_assert_eq!(forward.clone(), backward);
        prop_assert!(forward.validate().is_ok());
    }
}
