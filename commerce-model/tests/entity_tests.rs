mod common;

use common::{create, en, reconcile};
use commerce_model::{
    ActionContext, AssociateRole, AssociateRoleAction, AttributeGroup, AttributeGroupAction,
    CustomFieldType, CustomFields, Destination, Division, Format, Identity, MessageSubscription,
    ModelError, Price, Product, ProductAction, ProductSelection, ProductSelectionAction,
    ProjectRemote, ProjectSettings, RemoteModel, Resource, SelectionMode, SetCustomField,
    SetCustomType, State, StateAction, StateRole, StateTransitions, StateType, StoreMode,
    Subscription, SubscriptionAction, TaxCategory, TaxCategoryAction, TaxRate, TypeDefinition,
    Variant, MASKED,
};
use commerce_types::{Attr, Money, ResourceIdentifier};
use pretty_assertions::assert_eq;
use serde_json::json;

fn types() -> ActionContext {
    ActionContext::new()
        .with_type(
            TypeDefinition::new("type-a", "role-extras")
                .with_field("note", CustomFieldType::String)
                .with_field("priority", CustomFieldType::Number),
        )
        .with_type(TypeDefinition::new("type-b", "role-flags").with_field("vip", CustomFieldType::Boolean))
}

fn role_with(custom: CustomFields) -> AssociateRole {
    AssociateRole {
        custom: Some(custom),
        ..AssociateRole::new("buyer")
    }
}

fn shirt() -> Product {
    let mut product = Product::new("pt", en("Shirt"), en("shirt"), Variant::new("s1"));
    product
        .variants
        .push(Variant::new("s2").with_price(Price::new("eur", Money::new("EUR", 1000))));
    product
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

// ── Idempotence ──────────────────────────────────────────────────

#[test]
fn unchanged_records_produce_no_actions() {
    let ctx = types();

    let role = role_with(CustomFields::new("type-a").with("note", "hi")).with_permissions(["ViewMyCarts"]);
    let (stored, _) = create(&role, &ctx);
    assert!(stored.update_actions(&stored, &ctx).unwrap().is_empty());

    let mut division = Division::new("east", "East", "acme");
    division.unit.stores = vec!["berlin".into()];
    let (stored, _) = create(&division, &ctx);
    assert!(stored.update_actions(&stored, &ctx).unwrap().is_empty());

    let product = shirt();
    let (stored, _) = create(&product, &ctx);
    assert!(stored.update_actions(&stored, &ctx).unwrap().is_empty());

    let (stored, _) = create(&State::new("open", StateType::OrderState), &ctx);
    assert!(stored.update_actions(&stored, &ctx).unwrap().is_empty());

    let (stored, _) = create(&order_subscription("s3cr3t"), &ctx);
    assert!(stored.update_actions(&stored, &ctx).unwrap().is_empty());

    let tax = TaxCategory::new("Standard").with_rate(TaxRate::new("de", "DE VAT", 0.19, "DE"));
    let (stored, _) = create(&tax, &ctx);
    assert!(stored.update_actions(&stored, &ctx).unwrap().is_empty());

    let group = AttributeGroup {
        identity: Identity::default(),
        key: Attr::known("fabric".to_string()),
        name: en("Fabric"),
        description: Some(en("Material details")),
        attributes: vec!["cotton".into(), "weave".into()],
    };
    let (stored, _) = create(&group, &ctx);
    assert!(stored.update_actions(&stored, &ctx).unwrap().is_empty());

    let mut selection = ProductSelection::new(en("Summer"));
    selection.key = Attr::known("summer".to_string());
    let (stored, _) = create(&selection, &ctx);
    assert!(stored.update_actions(&stored, &ctx).unwrap().is_empty());

    let (stored, _) = create(&commerce_model::Company::new("acme", "Acme"), &ctx);
    assert!(stored.update_actions(&stored, &ctx).unwrap().is_empty());

    let settings = ProjectSettings::from_remote(&ProjectRemote::new("shop", "Shop")).unwrap();
    assert!(settings.update_actions(&settings, &ctx).unwrap().is_empty());

    let (_, state_remote) = create(&State::new("open", StateType::OrderState), &ctx);
    let current = StateTransitions::from_remote(&state_remote).unwrap();
    let desired = StateTransitions {
        identity: current.identity.clone(),
        ..StateTransitions::new("id-1", ["state-2"])
    };
    let (_, stored, _) = reconcile(&current, &state_remote, &desired, &ctx);
    assert!(stored.update_actions(&stored, &ctx).unwrap().is_empty());
}

// ── Immutable fields ─────────────────────────────────────────────

#[test]
fn associate_role_key_is_immutable() {
    let (stored, _) = create(&AssociateRole::new("buyer"), &ActionContext::new());
    let mut desired = stored.clone();
    desired.key = "admin".into();
    let err = stored.update_actions(&desired, &ActionContext::new()).unwrap_err();
    assert!(matches!(err, ModelError::ImmutableFieldChanged { ref field } if field == "key"));
}

#[test]
fn product_selection_mode_is_immutable() {
    let (stored, _) = create(&ProductSelection::new(en("Summer")), &ActionContext::new());
    let mut desired = stored.clone();
    desired.mode = SelectionMode::IndividualExclusion;
    let err = stored.update_actions(&desired, &ActionContext::new()).unwrap_err();
    assert_eq!(err.attribute_path(), Some("mode"));
}

#[test]
fn subscription_format_is_immutable() {
    let (stored, _) = create(&order_subscription("x"), &ActionContext::new());
    let mut desired = stored.clone();
    desired.format = Format::CloudEvents {
        cloud_events_version: "1.0".into(),
    };
    let err = stored.update_actions(&desired, &ActionContext::new()).unwrap_err();
    assert_eq!(err.attribute_path(), Some("format"));
}

#[test]
fn company_read_as_division_is_an_internal_error() {
    let (_, remote) = create(&commerce_model::Company::new("acme", "Acme"), &ActionContext::new());
    let err = Division::from_remote(&remote).unwrap_err();
    assert!(matches!(err, ModelError::Internal(_)), "{err:?}");
}

// ── Validation ───────────────────────────────────────────────────

#[test]
fn unknown_permission_is_rejected() {
    let role = AssociateRole::new("buyer").with_permissions(["FlyToTheMoon"]);
    let err = role.validate().unwrap_err();
    assert_eq!(err.attribute_path(), Some("permissions"));
}

#[test]
fn duplicate_skus_are_rejected_including_master() {
    let mut product = Product::new("pt", en("Shirt"), en("shirt"), Variant::new("s1"));
    product.variants.push(Variant::new("s1"));
    let err = product.validate().unwrap_err();
    assert!(matches!(err, ModelError::InvalidInput { ref path, .. } if path == "variants"));
}

#[test]
fn duplicate_price_keys_are_rejected() {
    let variant = Variant::new("s1")
        .with_price(Price::new("eur", Money::new("EUR", 100)))
        .with_price(Price::new("eur", Money::new("EUR", 200)));
    let product = Product::new("pt", en("Shirt"), en("shirt"), variant);
    assert!(product.validate().is_err());
}

#[test]
fn bad_locale_is_rejected() {
    let product = Product::new("pt", en("Shirt"), en("shirt").with("english", "x"), Variant::new("s1"));
    let err = product.validate().unwrap_err();
    assert_eq!(err.attribute_path(), Some("slug"));
}

#[test]
fn division_from_parent_store_mode_rejects_stores() {
    let mut division = Division::new("east", "East", "acme");
    division.store_mode = Attr::known(StoreMode::FromParent);
    division.unit.stores = vec!["berlin".into()];
    assert!(division.validate().is_err());
}

#[test]
fn tax_rate_amount_must_be_a_fraction() {
    let tax = TaxCategory::new("Standard").with_rate(TaxRate::new("de", "DE VAT", 19.0, "DE"));
    let err = tax.validate().unwrap_err();
    assert_eq!(err.attribute_path(), Some("rates[de].amount"));
}

// ── Custom fields ────────────────────────────────────────────────

#[test]
fn custom_type_change_emits_one_set_type() {
    let ctx = types();
    let role = role_with(CustomFields::new("type-a").with("note", "hi"));
    let (stored, remote) = create(&role, &ctx);

    let mut desired = stored.clone();
    desired.custom = Some(CustomFields::new("type-b").with("vip", "true"));
    let (actions, read, _) = reconcile(&stored, &remote, &desired, &ctx);

    assert_eq!(actions.len(), 1);
    assert!(matches!(&actions[0], AssociateRoleAction::SetCustomType(_)));
    assert!(!actions.iter().any(|a| matches!(a, AssociateRoleAction::SetCustomField(_))));
    assert_eq!(
        serde_json::to_value(&actions[0]).unwrap(),
        json!({
            "action": "setCustomType",
            "type": {"typeId": "type", "id": "type-b"},
            "fields": {"vip": true}
        })
    );
    assert_eq!(read.custom, desired.custom);
}

#[test]
fn custom_field_delta_sets_and_clears_fields() {
    let ctx = types();
    let role = role_with(CustomFields::new("type-a").with("note", "hi"));
    let (stored, remote) = create(&role, &ctx);

    let mut desired = stored.clone();
    desired.custom = Some(CustomFields::new("type-a").with("priority", "3"));
    let (actions, read, _) = reconcile(&stored, &remote, &desired, &ctx);

    assert_eq!(
        actions,
        vec![
            AssociateRoleAction::SetCustomField(SetCustomField {
                name: "priority".into(),
                value: Some(json!(3)),
            }),
            AssociateRoleAction::SetCustomField(SetCustomField {
                name: "note".into(),
                value: None,
            }),
        ]
    );
    assert_eq!(read.custom, desired.custom);
}

#[test]
fn removed_custom_block_clears_type() {
    let ctx = types();
    let role = role_with(CustomFields::new("type-a"));
    let (stored, remote) = create(&role, &ctx);
    let mut desired = stored.clone();
    desired.custom = None;

    let (actions, read, _) = reconcile(&stored, &remote, &desired, &ctx);
    assert_eq!(
        actions,
        vec![AssociateRoleAction::SetCustomType(SetCustomType {
            type_ref: None,
            fields: None
        })]
    );
    assert_eq!(read.custom, None);
}

#[test]
fn mistyped_custom_value_is_an_encode_failure() {
    let role = role_with(CustomFields::new("type-a").with("priority", "high"));
    let err = commerce_model::Creatable::draft(&role, &types()).unwrap_err();
    assert!(matches!(err, ModelError::EncodeFailure { ref field, .. } if field == "priority"));
}

#[test]
fn missing_type_definition_is_an_invalid_reference() {
    let role = role_with(CustomFields::new("type-z"));
    let err = commerce_model::Creatable::draft(&role, &types()).unwrap_err();
    assert!(matches!(err, ModelError::InvalidReference { .. }), "{err:?}");
}

// ── Attribute groups and product selections ──────────────────────

#[test]
fn attribute_group_membership_uses_add_and_remove() {
    let group = AttributeGroup {
        identity: Identity::default(),
        key: Attr::known("care".to_string()),
        name: en("Care"),
        description: None,
        attributes: vec!["washing".into(), "drying".into()],
    };
    let (stored, remote) = create(&group, &ActionContext::new());
    let mut desired = stored.clone();
    desired.attributes = vec!["drying".into(), "ironing".into()];
    desired.key = Attr::known("care-2".to_string());

    let (actions, read, _) = reconcile(&stored, &remote, &desired, &ActionContext::new());
    assert_eq!(
        actions,
        vec![
            AttributeGroupAction::SetKey {
                key: Some("care-2".into())
            },
            AttributeGroupAction::AddAttribute {
                attribute: commerce_model::AttributeReference { key: "ironing".into() }
            },
            AttributeGroupAction::RemoveAttribute {
                attribute: commerce_model::AttributeReference { key: "washing".into() }
            },
        ]
    );
    assert_eq!(read.attributes, desired.attributes);
}

#[test]
fn product_selection_rename_and_key() {
    let (stored, remote) = create(&ProductSelection::new(en("Summer")), &ActionContext::new());
    let mut desired = stored.clone();
    desired.name = en("Winter");
    desired.key = Attr::known("winter".to_string());

    let (actions, read, _) = reconcile(&stored, &remote, &desired, &ActionContext::new());
    assert_eq!(
        actions,
        vec![
            ProductSelectionAction::SetKey {
                key: Some("winter".into())
            },
            ProductSelectionAction::ChangeName { name: en("Winter") },
        ]
    );
    assert_eq!(read.key, desired.key);
    assert_eq!(read.name, desired.name);
    assert_eq!(read.identity.version.as_known(), Some(&2));
}

// ── Products ─────────────────────────────────────────────────────

#[test]
fn product_changes_follow_phase_order_and_publish_last() {
    let ctx = ActionContext::new();
    let product = shirt();
    let (stored, remote) = create(&product, &ctx);

    let mut desired = stored.clone();
    desired.name = en("T-Shirt");
    desired.publish = true;
    desired.categories = vec!["cat-1".into()];
    desired.variants[0].prices[0].value = Money::new("EUR", 1200);
    desired.variants.push(Variant::new("s3").with_attribute("size", "42"));

    let (actions, read, _) = reconcile(&stored, &remote, &desired, &ctx);
    let price_id = stored.variants[0].prices[0].id.to_option().unwrap();
    assert_eq!(actions[0], ProductAction::ChangeName { name: en("T-Shirt") });
    assert!(matches!(&actions[1], ProductAction::AddVariant { sku: Some(s), .. } if s == "s3"));
    assert!(matches!(&actions[2], ProductAction::ChangePrice { price_id: p, .. } if *p == price_id));
    assert!(matches!(&actions[3], ProductAction::AddToCategory { .. }));
    assert_eq!(actions.last(), Some(&ProductAction::Publish));
    assert_eq!(actions.len(), 5);

    assert!(read.publish);
    assert_eq!(read.variants.len(), 2);
    assert_eq!(read.variants[1].attributes[0].value, "42");
    assert_eq!(read.variants[0].prices[0].value, Money::new("EUR", 1200));
}

#[test]
fn product_plan_carries_ids_by_sku_and_price_key() {
    let ctx = ActionContext::new();
    let product = shirt();
    let (stored, _) = create(&product, &ctx);

    let mut plan = product.clone();
    plan.variants[0] = plan.variants[0]
        .clone()
        .with_price(Price::new("usd", Money::new("USD", 1100)));
    plan.variants.push(Variant::new("s3").with_price(Price::new("eur", Money::new("EUR", 5))));
    plan.modify_plan(Some(&stored));

    assert_eq!(plan.identity, stored.identity);
    assert_eq!(plan.master_variant.id, stored.master_variant.id);
    assert_eq!(plan.variants[0].id, stored.variants[0].id);
    assert_eq!(plan.variants[0].prices[0].id, stored.variants[0].prices[0].id);
    assert!(plan.variants[0].prices[1].id.is_unknown());
    assert!(plan.variants[1].id.is_unknown());
    assert!(plan.variants[1].prices[0].id.is_unknown());

    let mut fresh = product.clone();
    fresh.modify_plan(None);
    assert!(fresh.identity.id.is_unknown());
    assert!(fresh.master_variant.id.is_unknown());
}

#[test]
fn removing_a_product_state_is_rejected() {
    let mut product = Product::new("pt", en("Shirt"), en("shirt"), Variant::new("s1"));
    product.state_id = Attr::known("state-1".to_string());
    let (stored, _) = create(&product, &ActionContext::new());
    let mut desired = stored.clone();
    desired.state_id = Attr::Null;
    let err = stored.update_actions(&desired, &ActionContext::new()).unwrap_err();
    assert_eq!(err.attribute_path(), Some("state_id"));
}

// ── States ───────────────────────────────────────────────────────

#[test]
fn state_initial_false_is_stored_as_null_when_unconfigured() {
    let ctx = ActionContext::new();
    let (stored, remote) = create(&State::new("open", StateType::OrderState), &ctx);
    assert!(!remote.initial);
    assert!(stored.initial.is_null());

    let mut explicit = stored.clone();
    explicit.initial = Attr::known(false);
    assert!(stored.update_actions(&explicit, &ctx).unwrap().is_empty());

    explicit.initial = Attr::known(true);
    assert_eq!(
        stored.update_actions(&explicit, &ctx).unwrap().actions,
        vec![StateAction::ChangeInitial { initial: true }]
    );
}

#[test]
fn state_type_roles_and_key_have_dedicated_actions() {
    let ctx = ActionContext::new();
    let (stored, remote) = create(&State::new("open", StateType::OrderState), &ctx);
    let mut desired = stored.clone();
    desired.key = "opened".into();
    desired.state_type = StateType::PaymentState;
    desired.roles = vec![StateRole::Return];

    let (actions, read, _) = reconcile(&stored, &remote, &desired, &ctx);
    assert_eq!(
        actions,
        vec![
            StateAction::ChangeKey { key: "opened".into() },
            StateAction::ChangeType {
                state_type: StateType::PaymentState
            },
            StateAction::SetRoles {
                roles: vec![StateRole::Return]
            },
        ]
    );
    assert_eq!(
        serde_json::to_value(&actions[1]).unwrap(),
        json!({"action": "changeType", "type": "PaymentState"})
    );
    assert_eq!(read.roles, vec![StateRole::Return]);
}

#[test]
fn transitions_are_written_on_the_state_and_detached_with_none() {
    let ctx = ActionContext::new();
    let (_, state_remote) = create(&State::new("open", StateType::OrderState), &ctx);

    let current = StateTransitions::from_remote(&state_remote).unwrap();
    assert!(current.to.is_empty());
    let mut desired = StateTransitions::new("id-1", ["state-2", "state-3"]);
    desired.identity = current.identity.clone();

    let (actions, read, next) = reconcile(&current, &state_remote, &desired, &ctx);
    assert_eq!(
        actions,
        vec![StateAction::SetTransitions {
            transitions: Some(vec![
                ResourceIdentifier::by_id("state", "state-2"),
                ResourceIdentifier::by_id("state", "state-3"),
            ])
        }]
    );
    assert_eq!(read.to, desired.to);

    let state = State::from_remote(&next).unwrap();
    assert_eq!(state.identity.version.as_known(), Some(&2));

    let mut detached = next.clone();
    for action in commerce_model::Attached::detach_actions(&read) {
        detached.apply_action(&action).unwrap();
    }
    assert_eq!(detached.transitions, None);
}

#[test]
fn transitions_source_is_immutable() {
    let mut current = StateTransitions::new("state-1", ["state-2"]);
    current.identity = Identity::new("state-1", 4);
    let desired = StateTransitions::new("state-9", ["state-2"]);
    let err = current.update_actions(&desired, &ActionContext::new()).unwrap_err();
    assert_eq!(err.attribute_path(), Some("from"));
}

// ── Subscriptions ────────────────────────────────────────────────

#[test]
fn masked_destination_secret_is_carried_over() {
    let ctx = ActionContext::new();
    let configured = order_subscription("s3cr3t");
    let (prior, mut remote) = create(&configured, &ctx);
    remote.mask_secrets();

    let mut read = Subscription::from_remote(&remote).unwrap();
    assert!(matches!(&read.destination, Destination::Sqs { access_secret: Some(s), .. } if s == MASKED));
    read.align_with_plan(&prior);
    read.carry_secrets(&prior);
    assert_eq!(read, prior);
    assert!(prior.update_actions(&read, &ctx).unwrap().is_empty());
}

#[test]
fn changed_secret_sends_new_destination() {
    let ctx = ActionContext::new();
    let (stored, remote) = create(&order_subscription("old"), &ctx);
    let mut desired = stored.clone();
    desired.destination = sqs("new");
    desired.changes = vec!["product".into()];

    let (actions, _, _) = reconcile(&stored, &remote, &desired, &ctx);
    assert_eq!(actions.len(), 2);
    assert!(matches!(&actions[0], SubscriptionAction::ChangeDestination { .. }));
    assert!(matches!(&actions[1], SubscriptionAction::SetChanges { changes } if changes.len() == 1));
}

#[test]
fn subscription_needs_messages_or_changes() {
    let err = Subscription::new(sqs("x")).validate().unwrap_err();
    assert_eq!(err.attribute_path(), Some("messages"));
}

// ── Tax categories ───────────────────────────────────────────────

#[test]
fn tax_rates_are_added_replaced_and_removed_by_key() {
    let ctx = ActionContext::new();
    let tax = TaxCategory::new("Standard")
        .with_rate(TaxRate::new("de", "DE VAT", 0.19, "DE"))
        .with_rate(TaxRate::new("fr", "FR VAT", 0.20, "FR"));
    let (stored, remote) = create(&tax, &ctx);

    let mut desired = tax.clone();
    desired.rates = vec![
        TaxRate::new("de", "DE VAT", 0.07, "DE"),
        TaxRate::new("at", "AT VAT", 0.20, "AT"),
    ];
    desired.modify_plan(Some(&stored));
    assert!(desired.rates[0].id.is_unknown());
    assert!(desired.rates[1].id.is_unknown());

    let (actions, read, _) = reconcile(&stored, &remote, &desired, &ctx);
    let de_id = stored.rates[0].id.to_option().unwrap();
    let fr_id = stored.rates[1].id.to_option().unwrap();
    assert!(matches!(&actions[0], TaxCategoryAction::AddTaxRate { tax_rate } if tax_rate.key.as_deref() == Some("at")));
    assert!(matches!(&actions[1], TaxCategoryAction::ReplaceTaxRate { tax_rate_id, .. } if *tax_rate_id == de_id));
    assert_eq!(actions[2], TaxCategoryAction::RemoveTaxRate { tax_rate_id: fr_id });

    let keys: Vec<_> = read.rates.iter().map(|r| r.key.as_str()).collect();
    assert_eq!(keys, vec!["de", "at"]);
    assert!(read.rates[0].id.is_known());
    assert_ne!(read.rates[0].id, stored.rates[0].id);
}

#[test]
fn unchanged_tax_rate_keeps_its_id_in_plan() {
    let tax = TaxCategory::new("Standard").with_rate(TaxRate::new("de", "DE VAT", 0.19, "DE"));
    let (stored, _) = create(&tax, &ActionContext::new());
    let mut plan = tax.clone();
    plan.modify_plan(Some(&stored));
    assert_eq!(plan.rates[0].id, stored.rates[0].id);
}
