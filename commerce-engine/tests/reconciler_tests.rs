use commerce_client::CommerceApi;
use commerce_engine::{CancellationToken, EngineConfig, EngineError, MemoryApi, Reconciler};
use commerce_model::{
    Address, AssociateRole, Company, CustomFieldType, CustomFields, Destination,
    ExternalOAuth, MessageSubscription, Product, ProjectRemote, ProjectSettings, Resource, State,
    StateTransitions, StateType, Subscription, TypeDefinition, Variant,
};
use commerce_types::{Attr, LocalizedString};
use pretty_assertions::assert_eq;
use serde_json::json;
use std::sync::Arc;

fn setup() -> (Arc<MemoryApi>, Reconciler) {
    let api = Arc::new(MemoryApi::new());
    let reconciler = Reconciler::new(api.clone(), EngineConfig::default());
    (api, reconciler)
}

fn en(text: &str) -> LocalizedString {
    LocalizedString::new().with("en", text)
}

fn company_with_addresses(default_shipping: &str) -> Company {
    let mut company = Company::new("acme", "Acme");
    company.unit.addresses = vec![
        Address::new("a", "DE").with_city("Berlin"),
        Address::new("b", "DE").with_city("Hamburg"),
    ];
    company.unit.shipping_address_keys = vec!["a".into(), "b".into()];
    company.unit.default_shipping_address_key = default_shipping.into();
    company
}

fn sqs(secret: &str) -> Destination {
    Destination::Sqs {
        queue_url: "https://sqs.eu-west-1.amazonaws.com/1/orders".into(),
        region: "eu-west-1".into(),
        access_key: Some("AKIA".into()),
        access_secret: Some(secret.into()),
        authentication_mode: Default::default(),
    }
}

fn order_subscription(secret: &str) -> Subscription {
    let mut sub = Subscription::new(sqs(secret));
    sub.messages = vec![MessageSubscription {
        resource_type_id: "order".into(),
        types: vec!["OrderCreated".into()],
    }];
    sub
}

fn path_of<R: Resource>(record: &R) -> String {
    R::resource_path(record.id().unwrap())
}

// ── Scenarios ────────────────────────────────────────────────────

#[tokio::test]
async fn permission_superset_is_stored_in_plan_order() {
    let (api, reconciler) = setup();
    let cancel = CancellationToken::new();
    let stored = reconciler
        .create(
            &AssociateRole::new("buyer").with_permissions([
                "CreateMyCarts",
                "DeleteMyCarts",
                "UpdateMyCarts",
                "ViewMyCarts",
            ]),
            &cancel,
        )
        .await
        .unwrap();

    let planned_permissions = [
        "AddChildUnits",
        "UpdateBusinessUnitDetails",
        "UpdateAssociates",
        "CreateMyCarts",
        "DeleteMyCarts",
        "UpdateMyCarts",
        "ViewMyCarts",
    ];
    let planned = reconciler
        .plan(
            AssociateRole::new("buyer").with_permissions(planned_permissions),
            Some(&stored),
        )
        .unwrap();
    let updated = reconciler.update(&stored, &planned, &cancel).await.unwrap();

    assert_eq!(updated.permissions, planned.permissions);
    assert_eq!(updated.version(), Some(2));
    let remote = api.object(&path_of(&stored)).await.unwrap();
    assert_eq!(remote["permissions"], json!(planned_permissions));
}

#[tokio::test]
async fn company_rename_round_trips() {
    let (_, reconciler) = setup();
    let cancel = CancellationToken::new();
    let stored = reconciler.create(&Company::new("acme", "Acme"), &cancel).await.unwrap();

    let mut desired = stored.clone();
    desired.unit.name = "Acme 2".into();
    let updated = reconciler.update(&stored, &desired, &cancel).await.unwrap();

    assert_eq!(updated.unit.name, "Acme 2");
    assert_eq!(updated.version(), Some(2));
    assert_eq!(updated.id(), stored.id());
}

#[tokio::test]
async fn added_address_is_stored() {
    let (_, reconciler) = setup();
    let cancel = CancellationToken::new();
    let stored = reconciler.create(&Company::new("acme", "Acme"), &cancel).await.unwrap();

    let mut desired = stored.clone();
    desired.unit.addresses = vec![Address::new("ny", "US").with_city("New York")];
    let updated = reconciler.update(&stored, &desired, &cancel).await.unwrap();

    assert_eq!(updated.unit.addresses, desired.unit.addresses);
}

#[tokio::test]
async fn default_shipping_swap_and_rejection() {
    let (api, reconciler) = setup();
    let cancel = CancellationToken::new();
    let stored = reconciler.create(&company_with_addresses("a"), &cancel).await.unwrap();

    let desired = reconciler.plan(company_with_addresses("b"), Some(&stored)).unwrap();
    let updated = reconciler.update(&stored, &desired, &cancel).await.unwrap();
    assert_eq!(updated.unit.default_shipping_address_key.as_deref(), Some("b"));

    let before = api.request_count();
    let mut invalid = company_with_addresses("b");
    invalid.unit.shipping_address_keys = vec!["a".into()];
    let invalid = reconciler.plan(invalid, Some(&updated));
    let err = match invalid {
        Ok(planned) => reconciler.update(&updated, &planned, &cancel).await.unwrap_err(),
        Err(err) => err,
    };
    assert!(matches!(err, EngineError::InvalidInput { .. }), "{err:?}");
    assert_eq!(err.attribute_path(), Some("default_shipping_address_key"));
    assert_eq!(api.request_count(), before);
}

#[tokio::test]
async fn master_variant_swap_removes_former_master() {
    let (_, reconciler) = setup();
    let cancel = CancellationToken::new();
    let mut product = Product::new("pt-1", en("Shirt"), en("shirt"), Variant::new("1001"));
    product.variants = vec![Variant::new("1002")];
    let stored = reconciler.create(&product, &cancel).await.unwrap();

    let desired = Product::new("pt-1", en("Shirt"), en("shirt"), Variant::new("1002"));
    let planned = reconciler.plan(desired, Some(&stored)).unwrap();
    assert_eq!(planned.master_variant.id, stored.variants[0].id);

    let updated = reconciler.update(&stored, &planned, &cancel).await.unwrap();
    assert_eq!(updated.master_variant.sku, "1002");
    assert!(updated.variants.is_empty());
}

// ── Read, import & delete ────────────────────────────────────────

#[tokio::test]
async fn read_drops_objects_deleted_out_of_band() {
    let (api, reconciler) = setup();
    let cancel = CancellationToken::new();
    let stored = reconciler
        .create(&State::new("open", StateType::OrderState), &cancel)
        .await
        .unwrap();

    let refreshed = reconciler.read(&stored, &cancel).await.unwrap();
    assert_eq!(refreshed.as_ref(), Some(&stored));

    api.delete(&path_of(&stored), 1).await.unwrap();
    assert_eq!(reconciler.read(&stored, &cancel).await.unwrap(), None);
}

#[tokio::test]
async fn delete_of_missing_object_succeeds() {
    let (api, reconciler) = setup();
    let cancel = CancellationToken::new();
    let stored = reconciler.create(&Company::new("acme", "Acme"), &cancel).await.unwrap();

    reconciler.delete(&stored, &cancel).await.unwrap();
    assert_eq!(api.object(&path_of(&stored)).await, None);
    reconciler.delete(&stored, &cancel).await.unwrap();
}

#[tokio::test]
async fn import_reads_existing_object() {
    let (_, reconciler) = setup();
    let cancel = CancellationToken::new();
    let stored = reconciler
        .create(&AssociateRole::new("buyer").with_permissions(["ViewMyCarts"]), &cancel)
        .await
        .unwrap();

    let imported: AssociateRole = reconciler.import(stored.id().unwrap(), &cancel).await.unwrap();
    assert_eq!(imported, stored);

    let missing = reconciler.import::<AssociateRole>("nope", &cancel).await.unwrap_err();
    assert!(missing.is_not_found());
}

// ── Locked kinds ─────────────────────────────────────────────────

#[tokio::test]
async fn state_update_survives_transition_writes() {
    let (api, reconciler) = setup();
    let cancel = CancellationToken::new();
    let open = reconciler
        .create(&State::new("open", StateType::OrderState), &cancel)
        .await
        .unwrap();
    let shipped = reconciler
        .create(&State::new("shipped", StateType::OrderState), &cancel)
        .await
        .unwrap();
    let shipped_id = shipped.id().unwrap();

    let transitions = reconciler
        .attach(&StateTransitions::new(open.id().unwrap(), [shipped_id]), &cancel)
        .await
        .unwrap();
    assert_eq!(transitions.version(), Some(2));
    assert_eq!(transitions.to, vec![shipped_id.to_string()]);

    // `open` is still stored at version 1.
    let mut renamed = open.clone();
    renamed.name = Some(en("Open"));
    let updated = reconciler.update(&open, &renamed, &cancel).await.unwrap();
    assert_eq!(updated.version(), Some(3));
    assert_eq!(updated.name, Some(en("Open")));

    let remote = api.object(&path_of(&open)).await.unwrap();
    assert_eq!(remote["transitions"][0]["id"], shipped_id);

    reconciler.detach(&transitions, &cancel).await.unwrap();
    let remote = api.object(&path_of(&open)).await.unwrap();
    assert_eq!(remote.get("transitions"), None);
    assert_eq!(remote["version"], 4);

    reconciler.delete(&open, &cancel).await.unwrap();
    assert_eq!(api.object(&path_of(&open)).await, None);
}

#[tokio::test]
async fn concurrent_state_writes_are_serialized() {
    let (api, reconciler) = setup();
    let cancel = CancellationToken::new();
    let open = reconciler
        .create(&State::new("open", StateType::OrderState), &cancel)
        .await
        .unwrap();
    let target = reconciler
        .create(&State::new("done", StateType::OrderState), &cancel)
        .await
        .unwrap();

    let mut renamed = open.clone();
    renamed.name = Some(en("Open"));
    let transitions = StateTransitions::new(open.id().unwrap(), [target.id().unwrap()]);

    let (updated, attached) = tokio::join!(
        reconciler.update(&open, &renamed, &cancel),
        reconciler.attach(&transitions, &cancel),
    );
    updated.unwrap();
    attached.unwrap();

    let remote = api.object(&path_of(&open)).await.unwrap();
    assert_eq!(remote["version"], 3);
}

// ── Write-only values ────────────────────────────────────────────

#[tokio::test]
async fn masked_secrets_keep_configured_values() {
    let (api, reconciler) = setup();
    let cancel = CancellationToken::new();
    let planned = order_subscription("s3cr3t");
    let stored = reconciler.create(&planned, &cancel).await.unwrap();
    assert_eq!(stored.destination, sqs("s3cr3t"));

    let refreshed = reconciler.read(&stored, &cancel).await.unwrap().unwrap();
    assert_eq!(refreshed.destination, sqs("s3cr3t"));

    let before = api.request_count();
    let unchanged = reconciler.update(&refreshed, &planned, &cancel).await.unwrap();
    assert_eq!(unchanged.version(), Some(1));
    // Only the read-back, no write.
    assert_eq!(api.request_count(), before + 1);

    let rotated = order_subscription("n3w");
    let updated = reconciler.update(&refreshed, &rotated, &cancel).await.unwrap();
    assert_eq!(updated.destination, sqs("n3w"));
    assert_eq!(updated.version(), Some(2));
}

// ── Version conflicts ────────────────────────────────────────────

#[tokio::test(start_paused = true)]
async fn stale_update_is_rebuilt_from_a_fresh_read() {
    let (api, reconciler) = setup();
    let cancel = CancellationToken::new();
    let stored = reconciler
        .create(&AssociateRole::new("buyer").with_permissions(["ViewMyCarts"]), &cancel)
        .await
        .unwrap();
    let path = path_of(&stored);
    api.apply_out_of_band(&path, json!([{"action": "setName", "name": "Elsewhere"}]))
        .await
        .unwrap();

    let mut planned = stored.clone();
    planned.name = Attr::known("Buyer".to_string());
    let before = api.request_count();
    let updated = reconciler.update(&stored, &planned, &cancel).await.unwrap();

    assert_eq!(updated.version(), Some(3));
    assert_eq!(updated.name, planned.name);
    assert_eq!(updated.permissions, vec!["ViewMyCarts"]);
    // Rejected write, fresh read, rebuilt write.
    assert_eq!(api.request_count(), before + 3);
    assert_eq!(api.object(&path).await.unwrap()["name"], "Buyer");
}

#[tokio::test(start_paused = true)]
async fn stale_update_already_matching_remote_sends_nothing_more() {
    let (api, reconciler) = setup();
    let cancel = CancellationToken::new();
    let stored = reconciler.create(&AssociateRole::new("buyer"), &cancel).await.unwrap();
    let path = path_of(&stored);
    api.apply_out_of_band(&path, json!([{"action": "setName", "name": "Buyer"}]))
        .await
        .unwrap();

    let mut planned = stored.clone();
    planned.name = Attr::known("Buyer".to_string());
    let before = api.request_count();
    let updated = reconciler.update(&stored, &planned, &cancel).await.unwrap();

    assert_eq!(updated.version(), Some(2));
    assert_eq!(api.request_count(), before + 2);
}

#[tokio::test(start_paused = true)]
async fn stale_delete_uses_current_version() {
    let (api, reconciler) = setup();
    let cancel = CancellationToken::new();
    let stored = reconciler.create(&AssociateRole::new("buyer"), &cancel).await.unwrap();
    let path = path_of(&stored);
    api.apply_out_of_band(&path, json!([{"action": "setName", "name": "Elsewhere"}]))
        .await
        .unwrap();

    let before = api.request_count();
    reconciler.delete(&stored, &cancel).await.unwrap();
    assert!(api.object(&path).await.is_none());
    assert_eq!(api.request_count(), before + 3);
}

// ── Attached kinds ───────────────────────────────────────────────

#[tokio::test]
async fn project_settings_attach_and_detach() {
    let api = Arc::new(
        MemoryApi::new()
            .with_project(ProjectRemote::new("acme", "Acme"))
            .await
            .unwrap(),
    );
    let reconciler = Reconciler::new(api.clone(), EngineConfig::default());
    let cancel = CancellationToken::new();

    let planned = ProjectSettings {
        name: Attr::known("Acme Shop".to_string()),
        countries: Some(vec!["DE".into(), "NL".into()]),
        ..Default::default()
    };
    let stored = reconciler.attach(&planned, &cancel).await.unwrap();
    assert_eq!(stored.identity.id.as_deref(), Some("acme"));
    assert_eq!(stored.version(), Some(2));
    assert_eq!(stored.name, planned.name);
    assert_eq!(stored.countries, planned.countries);
    assert_eq!(stored.messages, None);

    let before = api.request_count();
    reconciler.detach(&stored, &cancel).await.unwrap();
    assert_eq!(api.request_count(), before);
    assert_eq!(api.object("").await.unwrap()["name"], "Acme Shop");
}

#[tokio::test]
async fn reattach_with_unchanged_oauth_header_writes_nothing() {
    let api = Arc::new(
        MemoryApi::new()
            .with_project(ProjectRemote::new("acme", "Acme"))
            .await
            .unwrap(),
    );
    let reconciler = Reconciler::new(api.clone(), EngineConfig::default());
    let cancel = CancellationToken::new();

    let planned = ProjectSettings {
        external_oauth: Some(ExternalOAuth {
            url: "https://auth.example.com/introspect".into(),
            authorization_header: "Bearer s3cr3t".into(),
        }),
        ..Default::default()
    };
    let stored = reconciler.attach(&planned, &cancel).await.unwrap();
    assert_eq!(stored.version(), Some(2));
    assert_eq!(stored.external_oauth, planned.external_oauth);

    // The remote returns the header masked; a second attach must not rewrite it.
    let before = api.request_count();
    let again = reconciler.attach(&planned, &cancel).await.unwrap();
    assert_eq!(again.version(), Some(2));
    assert_eq!(again.external_oauth, planned.external_oauth);
    assert_eq!(api.request_count(), before + 1);
}

// ── Custom fields ────────────────────────────────────────────────

#[tokio::test]
async fn custom_fields_are_encoded_with_fetched_types() {
    let api = Arc::new(
        MemoryApi::new()
            .with_type(TypeDefinition::new("type-a", "role-extras").with_field("priority", CustomFieldType::Number))
            .await
            .unwrap(),
    );
    let reconciler = Reconciler::new(api.clone(), EngineConfig::default());
    let cancel = CancellationToken::new();

    let role = AssociateRole {
        custom: Some(CustomFields::new("type-a").with("priority", "3")),
        ..AssociateRole::new("buyer")
    };
    let stored = reconciler.create(&role, &cancel).await.unwrap();
    assert_eq!(stored.custom, role.custom);

    let dangling = AssociateRole {
        custom: Some(CustomFields::new("type-missing").with("priority", "3")),
        ..AssociateRole::new("seller")
    };
    let err = reconciler.create(&dangling, &cancel).await.unwrap_err();
    assert!(matches!(err, EngineError::InvalidInput { .. }), "{err:?}");
    assert_eq!(err.attribute_path(), Some("custom.type_id"));
}
