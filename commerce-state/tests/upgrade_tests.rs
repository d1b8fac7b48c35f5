use commerce_model::{ProjectSettings, Resource, Subscription, TaxCategory};
use commerce_state::{pipeline_for, upgrade, PersistedState, StateError};
use commerce_types::{Attr, Dynamic};
use pretty_assertions::assert_eq;
use serde_json::json;

fn state(version: u64, value: serde_json::Value) -> PersistedState {
    PersistedState::new(version, Dynamic::from(value))
}

fn project_v0() -> PersistedState {
    state(
        0,
        json!({
            "id": "acme",
            "version": 7,
            "name": "Acme",
            "countries": ["DE", "NL"],
            "carts": {
                "country_tax_rate_fallback_enabled": false,
                "delete_days_after_last_modification": 10
            },
            "messages": {"enabled": true, "delete_days_after_creation": 15}
        }),
    )
}

// ── Project settings ─────────────────────────────────────────────

#[test]
fn project_v0_blocks_become_lists_of_one() {
    let pipeline = pipeline_for(ProjectSettings::TYPE_NAME).unwrap();
    let upgraded = pipeline.upgrade_to(project_v0(), 1).unwrap();

    assert_eq!(upgraded.schema_version, 1);
    assert_eq!(
        upgraded.attributes.get("carts"),
        Some(&Dynamic::from(json!([{
            "country_tax_rate_fallback_enabled": false,
            "delete_days_after_last_modification": 10
        }])))
    );
    assert_eq!(upgraded.attributes.get("shopping_lists"), Some(&Dynamic::List(Vec::new())));
    assert_eq!(
        upgraded.attributes.get("enable_search_index_products"),
        Some(&Dynamic::Unknown)
    );
    assert_eq!(
        upgraded.attributes.get("enable_search_index_orders"),
        Some(&Dynamic::Unknown)
    );
}

#[test]
fn project_v0_upgrades_to_current_record() {
    let upgraded = upgrade(ProjectSettings::TYPE_NAME, project_v0()).unwrap();
    assert_eq!(upgraded.schema_version, ProjectSettings::SCHEMA_VERSION);

    let record: ProjectSettings = upgraded.to_record().unwrap();
    assert_eq!(record.name, Attr::known("Acme".to_string()));
    assert_eq!(record.countries, Some(vec!["DE".to_string(), "NL".to_string()]));
    let carts = record.carts.unwrap();
    assert_eq!(carts.country_tax_rate_fallback_enabled, Attr::known(false));
    assert_eq!(carts.delete_days_after_last_modification, Attr::known(10));
    assert!(record.messages.unwrap().enabled);
    assert!(record.shopping_lists.is_none());
    assert!(record.enable_search_index_products.is_unknown());
}

#[test]
fn project_v1_empty_lists_collapse_to_none() {
    let v1 = state(
        1,
        json!({
            "id": "acme",
            "version": 3,
            "carts": [],
            "messages": [],
            "shipping_rate_input_type": [{"type": "CartScore"}],
            "enable_search_index_products": true
        }),
    );
    let record: ProjectSettings = upgrade(ProjectSettings::TYPE_NAME, v1).unwrap().to_record().unwrap();
    assert!(record.carts.is_none());
    assert!(record.messages.is_none());
    assert!(record.shipping_rate_input_type.is_some());
    assert_eq!(record.enable_search_index_products, Attr::known(true));
}

#[test]
fn current_state_passes_through() {
    let current = PersistedState::from_record(&ProjectSettings::default()).unwrap();
    assert_eq!(current.schema_version, 2);
    assert_eq!(upgrade(ProjectSettings::TYPE_NAME, current.clone()).unwrap(), current);
}

// ── Subscriptions ────────────────────────────────────────────────

#[test]
fn subscription_v0_lists_collapse() {
    let v0 = state(
        0,
        json!({
            "id": "sub-1",
            "version": 2,
            "destination": [{
                "type": "GoogleCloudPubSub",
                "project_id": "acme",
                "topic": "orders"
            }],
            "format": [],
            "changes": ["product"]
        }),
    );
    let record: Subscription = upgrade(Subscription::TYPE_NAME, v0).unwrap().to_record().unwrap();
    assert_eq!(
        record.destination,
        commerce_model::Destination::GoogleCloudPubSub {
            project_id: "acme".into(),
            topic: "orders".into()
        }
    );
    assert_eq!(record.format, commerce_model::Format::Platform);
    assert_eq!(record.changes, vec!["product".to_string()]);
}

#[test]
fn subscription_without_destination_is_malformed() {
    let v0 = state(0, json!({"id": "sub-1", "version": 2, "destination": []}));
    let err = upgrade(Subscription::TYPE_NAME, v0).unwrap_err();
    assert!(matches!(err, StateError::Malformed { ref path, .. } if path == "destination"));
}

// ── Errors ───────────────────────────────────────────────────────

#[test]
fn newer_schema_is_rejected() {
    let err = upgrade(TaxCategory::TYPE_NAME, state(1, json!({}))).unwrap_err();
    assert!(matches!(err, StateError::UnsupportedVersion { found: 1, current: 0, .. }));
}

#[test]
fn unknown_kind_is_rejected() {
    let err = upgrade("commerce_cart", state(0, json!({}))).unwrap_err();
    assert!(matches!(err, StateError::UnknownKind(ref kind) if kind == "commerce_cart"));
}

#[test]
fn every_kind_has_a_complete_pipeline() {
    for pipeline in commerce_state::pipelines() {
        let upgraded = pipeline.upgrade(PersistedState::default()).unwrap();
        assert_eq!(upgraded.schema_version, pipeline.current_version(), "{}", pipeline.kind());
    }
}
