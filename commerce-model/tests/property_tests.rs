//! Property-based tests for reconciliation.
//!
//! - Round-trip: reading back a freshly created record yields the record
//! - Convergence: applying the planned actions yields the desired record
//! - Resort: stored permissions follow plan order
//! - Ordering: pivots and repointing precede the removals they enable

mod common;

use common::{create, en, reconcile, with_identity_of};
use commerce_model::{
    ActionContext, Address, AssociateRole, AttributeGroup, BusinessUnitAction, Company, Destination,
    Division, Identity, MessageSubscription, Product, ProductAction, ProductSelection, Resource,
    State, StateRole, StateType, Subscription, TaxCategory, TaxRate, Variant, PERMISSIONS,
};
use commerce_types::Attr;
use proptest::prelude::*;
use proptest::sample::{select, subsequence};

const ADDRESS_KEYS: [&str; 4] = ["a", "b", "c", "d"];
const SKUS: [&str; 5] = ["1001", "1002", "1003", "1004", "1005"];
const STORES: [&str; 3] = ["berlin", "munich", "hamburg"];
const ATTRIBUTES: [&str; 4] = ["cotton", "weave", "color", "size"];
const RATE_KEYS: [&str; 3] = ["de", "fr", "at"];
const RESOURCE_TYPES: [&str; 3] = ["order", "customer", "product"];
const MESSAGE_TYPES: [&str; 2] = ["Created", "Deleted"];
const CHANGE_TYPES: [&str; 2] = ["cart", "payment"];

fn strings(values: &[&str]) -> Vec<String> {
    values.iter().map(|v| v.to_string()).collect()
}

fn key() -> impl Strategy<Value = Attr<String>> {
    prop_oneof![Just(Attr::Null), select(strings(&["k1", "k2"])).prop_map(Attr::known)]
}

fn localized() -> impl Strategy<Value = commerce_types::LocalizedString> {
    select(vec!["Open", "Closed", "Summer"]).prop_map(en)
}

/// Address keys, shipping keys drawn from them, and an optional default drawn from those.
fn address_layout() -> impl Strategy<Value = (Vec<String>, Vec<String>, Option<String>, bool)> {
    let keys: Vec<String> = ADDRESS_KEYS.iter().map(|k| k.to_string()).collect();
    subsequence(keys, 0..=ADDRESS_KEYS.len()).prop_flat_map(|keys| {
        let len = keys.len();
        (Just(keys.clone()), subsequence(keys, 0..=len), any::<bool>()).prop_flat_map(
            |(keys, shipping, coastal)| {
                let defaults: Vec<Option<String>> = std::iter::once(None)
                    .chain(shipping.iter().cloned().map(Some))
                    .collect();
                (Just(keys), Just(shipping), select(defaults), Just(coastal))
            },
        )
    })
}

fn company((keys, shipping, default, coastal): (Vec<String>, Vec<String>, Option<String>, bool)) -> Company {
    let mut company = Company::new("acme", "Acme");
    company.unit.addresses = keys
        .iter()
        .map(|k| Address::new(k.as_str(), "DE").with_city(if coastal { "Kiel" } else { "Kassel" }))
        .collect();
    company.unit.shipping_address_keys = shipping;
    company.unit.default_shipping_address_key = default.into();
    company
}

/// A master SKU and distinct variant SKUs.
fn sku_layout() -> impl Strategy<Value = (String, Vec<String>)> {
    let skus: Vec<String> = SKUS.iter().map(|s| s.to_string()).collect();
    select(skus.clone()).prop_flat_map(move |master| {
        let rest: Vec<String> = skus.iter().filter(|s| **s != master).cloned().collect();
        let len = rest.len();
        (Just(master), subsequence(rest, 0..=len))
    })
}

fn product(master: &str, variants: &[String]) -> Product {
    let mut product = Product::new("pt", en("Shirt"), en("shirt"), Variant::new(master));
    product.variants = variants.iter().map(|s| Variant::new(s.as_str())).collect();
    product
}

/// Current layout, plus a desired layout whose master already exists.
fn product_change() -> impl Strategy<Value = ((String, Vec<String>), (String, Vec<String>))> {
    sku_layout().prop_flat_map(|(master, variants)| {
        let existing: Vec<String> = std::iter::once(master.clone()).chain(variants.clone()).collect();
        let skus: Vec<String> = SKUS.iter().map(|s| s.to_string()).collect();
        (Just((master, variants)), select(existing)).prop_flat_map(move |(current, new_master)| {
            let rest: Vec<String> = skus.iter().filter(|s| **s != new_master).cloned().collect();
            let len = rest.len();
            (Just(current), Just(new_master), subsequence(rest, 0..=len))
                .prop_map(|(current, master, variants)| (current, (master, variants)))
        })
    })
}

fn permissions() -> impl Strategy<Value = Vec<String>> {
    let all: Vec<String> = PERMISSIONS.iter().map(|p| p.to_string()).collect();
    subsequence(all, 0..=12).prop_shuffle()
}

fn stores() -> impl Strategy<Value = Vec<String>> {
    subsequence(strings(&STORES), 0..=STORES.len()).prop_shuffle()
}

fn division((layout, stores): ((Vec<String>, Vec<String>, Option<String>, bool), Vec<String>)) -> Division {
    let mut division = Division::new("east", "East", "acme");
    division.unit = company(layout).unit;
    division.unit.key = "east".into();
    division.unit.name = "East".into();
    division.unit.stores = stores;
    division
}

fn state() -> impl Strategy<Value = State> {
    let types = vec![StateType::OrderState, StateType::PaymentState, StateType::ReviewState];
    let roles = vec![StateRole::ReviewIncludedInStatistics, StateRole::Return];
    let initial = prop_oneof![Just(Attr::Null), any::<bool>().prop_map(Attr::known)];
    (
        select(types),
        proptest::option::of(localized()),
        proptest::option::of(localized()),
        initial,
        subsequence(roles, 0..=2).prop_shuffle(),
    )
        .prop_map(|(state_type, name, description, initial, roles)| State {
            name,
            description,
            initial,
            roles,
            ..State::new("open", state_type)
        })
}

fn attribute_group() -> impl Strategy<Value = AttributeGroup> {
    (
        key(),
        localized(),
        proptest::option::of(localized()),
        subsequence(strings(&ATTRIBUTES), 0..=ATTRIBUTES.len()).prop_shuffle(),
    )
        .prop_map(|(key, name, description, attributes)| AttributeGroup {
            identity: Identity::default(),
            key,
            name,
            description,
            attributes,
        })
}

fn product_selection() -> impl Strategy<Value = ProductSelection> {
    (key(), localized()).prop_map(|(key, name)| ProductSelection {
        key,
        ..ProductSelection::new(name)
    })
}

fn tax_category() -> impl Strategy<Value = TaxCategory> {
    let amounts = vec![0.0, 0.07, 0.19, 1.0];
    subsequence(strings(&RATE_KEYS), 0..=RATE_KEYS.len())
        .prop_flat_map(move |keys| {
            let len = keys.len();
            (
                Just(keys),
                prop::collection::vec(select(amounts.clone()), len),
                select(vec!["Standard", "Reduced"]),
            )
        })
        .prop_map(|(keys, amounts, name)| {
            keys.iter().zip(amounts).fold(TaxCategory::new(name), |category, (key, amount)| {
                category.with_rate(TaxRate::new(key.as_str(), format!("{key} VAT"), amount, key.to_uppercase()))
            })
        })
}

fn same_rates(left: &TaxCategory, right: &TaxCategory) -> bool {
    left.rates.len() == right.rates.len()
        && left.rates.iter().zip(&right.rates).all(|(l, r)| l.same_content(r))
}

fn subscription() -> impl Strategy<Value = Subscription> {
    let messages = subsequence(strings(&RESOURCE_TYPES), 0..=RESOURCE_TYPES.len()).prop_flat_map(|ids| {
        let len = ids.len();
        (
            Just(ids),
            prop::collection::vec(subsequence(strings(&MESSAGE_TYPES), 0..=MESSAGE_TYPES.len()), len),
        )
            .prop_map(|(ids, types)| {
                ids.into_iter()
                    .zip(types)
                    .map(|(resource_type_id, types)| MessageSubscription { resource_type_id, types })
                    .collect::<Vec<_>>()
            })
    });
    let changes = subsequence(strings(&CHANGE_TYPES), 0..=CHANGE_TYPES.len()).prop_shuffle();
    (messages, changes, select(vec!["first", "second"]))
        .prop_filter("needs a message or change subscription", |(m, c, _)| !m.is_empty() || !c.is_empty())
        .prop_map(|(messages, changes, secret)| Subscription {
            messages,
            changes,
            ..Subscription::new(Destination::Sqs {
                queue_url: "https://sqs.eu-west-1.amazonaws.com/1/events".into(),
                region: "eu-west-1".into(),
                access_key: Some("AKIA".into()),
                access_secret: Some(secret.into()),
                authentication_mode: Default::default(),
            })
        })
}

fn position<A>(actions: &[A], pred: impl Fn(&A) -> bool) -> Option<usize> {
    actions.iter().position(pred)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn created_company_reads_back_unchanged(layout in address_layout()) {
        let record = company(layout);
        let (stored, _) = create(&record, &ActionContext::new());
        let mut expected = record.clone();
        expected.unit.identity = stored.unit.identity.clone();
        expected.unit.status = stored.unit.status.clone();
        prop_assert_eq!(stored, expected);
    }

    #[test]
    fn created_role_reads_back_unchanged(perms in permissions()) {
        let record = AssociateRole::new("buyer").with_permissions(perms);
        let (stored, _) = create(&record, &ActionContext::new());
        prop_assert_eq!(&stored.permissions, &record.permissions);
        prop_assert_eq!(&stored.key, &record.key);
        prop_assert!(stored.update_actions(&stored, &ActionContext::new()).unwrap().is_empty());
    }

    #[test]
    fn company_converges_to_desired(current in address_layout(), desired in address_layout()) {
        let ctx = ActionContext::new();
        let (stored, remote) = create(&company(current), &ctx);
        let desired = with_identity_of(company(desired), &stored);

        let (actions, read, _) = reconcile(&stored, &remote, &desired, &ctx);
        prop_assert_eq!(&read.unit.addresses, &desired.unit.addresses);
        prop_assert_eq!(&read.unit.shipping_address_keys, &desired.unit.shipping_address_keys);
        prop_assert_eq!(&read.unit.default_shipping_address_key, &desired.unit.default_shipping_address_key);
        prop_assert!(read.update_actions(&desired, &ctx).unwrap().is_empty(), "{:?}", actions);
    }

    #[test]
    fn address_removal_follows_default_repointing(current in address_layout(), desired in address_layout()) {
        let ctx = ActionContext::new();
        let (stored, _) = create(&company(current), &ctx);
        let desired = with_identity_of(company(desired), &stored);
        let actions = stored.update_actions(&desired, &ctx).unwrap().actions;

        if let Some(old_default) = stored.unit.default_shipping_address_key.as_known() {
            let removal = position(&actions, |a| matches!(
                a,
                BusinessUnitAction::RemoveAddress { address_key } if address_key == old_default
            ));
            if let Some(removal) = removal {
                let repoint = position(&actions, |a| matches!(a, BusinessUnitAction::SetDefaultShippingAddress { .. }));
                prop_assert!(matches!(repoint, Some(r) if r < removal), "{:?}", actions);
            }
        }
    }

    #[test]
    fn product_converges_to_desired(((cm, cv), (dm, dv)) in product_change()) {
        let ctx = ActionContext::new();
        let (stored, remote) = create(&product(&cm, &cv), &ctx);
        let desired = with_identity_of(product(&dm, &dv), &stored);

        let (_, read, _) = reconcile(&stored, &remote, &desired, &ctx);
        let skus = |p: &Product| p.variants.iter().map(|v| v.sku.clone()).collect::<Vec<_>>();
        prop_assert_eq!(&read.master_variant.sku, &dm);
        prop_assert_eq!(skus(&read), dv);
    }

    #[test]
    fn variant_removal_follows_master_pivot(((cm, cv), (dm, dv)) in product_change()) {
        let ctx = ActionContext::new();
        let (stored, _) = create(&product(&cm, &cv), &ctx);
        let desired = with_identity_of(product(&dm, &dv), &stored);
        let actions = stored.update_actions(&desired, &ctx).unwrap().actions;

        let pivot = position(&actions, |a| matches!(a, ProductAction::ChangeMasterVariant { .. }));
        let first_removal = position(&actions, |a| matches!(a, ProductAction::RemoveVariant { .. }));
        if let (Some(pivot), Some(removal)) = (pivot, first_removal) {
            prop_assert!(pivot < removal, "{:?}", actions);
        }
        prop_assert_eq!(pivot.is_some(), cm != dm);
    }

    #[test]
    fn permissions_follow_plan_order(plan in permissions(), keep in prop::collection::vec(any::<bool>(), 12), seed in any::<u64>()) {
        // Server returns a permutation of a subset of the plan.
        let mut returned: Vec<String> = plan
            .iter()
            .zip(keep.iter().chain(std::iter::repeat(&true)))
            .filter(|(_, k)| **k)
            .map(|(p, _)| p.clone())
            .collect();
        if !returned.is_empty() {
            let len = returned.len();
            returned.rotate_left((seed as usize) % len);
        }

        let planned = AssociateRole::new("buyer").with_permissions(plan.clone());
        let mut stored = AssociateRole::new("buyer").with_permissions(returned.clone());
        stored.align_with_plan(&planned);

        let expected: Vec<String> = plan.iter().filter(|p| returned.contains(p)).cloned().collect();
        prop_assert_eq!(stored.permissions, expected);
    }

    #[test]
    fn created_division_reads_back_unchanged(layout in address_layout(), stores in stores()) {
        let record = division((layout, stores));
        let (stored, _) = create(&record, &ActionContext::new());
        let expected = with_identity_of(record, &stored);
        prop_assert_eq!(&stored.unit.stores, &expected.unit.stores);
        prop_assert_eq!(&stored.unit.addresses, &expected.unit.addresses);
        prop_assert_eq!(&stored.store_mode, &expected.store_mode);
        prop_assert!(stored.update_actions(&expected, &ActionContext::new()).unwrap().is_empty());
    }

    #[test]
    fn division_converges_to_desired(
        current in (address_layout(), stores()),
        desired in (address_layout(), stores()),
    ) {
        let ctx = ActionContext::new();
        let (stored, remote) = create(&division(current), &ctx);
        let desired = with_identity_of(division(desired), &stored);

        let (actions, read, _) = reconcile(&stored, &remote, &desired, &ctx);
        prop_assert_eq!(&read.unit.stores, &desired.unit.stores);
        prop_assert_eq!(&read.unit.addresses, &desired.unit.addresses);
        prop_assert_eq!(&read.unit.default_shipping_address_key, &desired.unit.default_shipping_address_key);
        prop_assert!(read.update_actions(&desired, &ctx).unwrap().is_empty(), "{:?}", actions);
    }

    #[test]
    fn created_state_reads_back_unchanged(record in state()) {
        let (stored, _) = create(&record, &ActionContext::new());
        prop_assert_eq!(&stored, &with_identity_of(record, &stored));
    }

    #[test]
    fn state_converges_to_desired(current in state(), desired in state()) {
        let ctx = ActionContext::new();
        let (stored, remote) = create(&current, &ctx);
        let desired = with_identity_of(desired, &stored);

        let (actions, read, _) = reconcile(&stored, &remote, &desired, &ctx);
        let mut expected = desired.clone();
        expected.identity = read.identity.clone();
        prop_assert_eq!(&read, &expected, "{:?}", actions);
        prop_assert!(read.update_actions(&desired, &ctx).unwrap().is_empty());
    }

    #[test]
    fn created_attribute_group_reads_back_unchanged(record in attribute_group()) {
        let (stored, _) = create(&record, &ActionContext::new());
        prop_assert_eq!(&stored, &with_identity_of(record, &stored));
    }

    #[test]
    fn attribute_group_converges_to_desired(current in attribute_group(), desired in attribute_group()) {
        let ctx = ActionContext::new();
        let (stored, remote) = create(&current, &ctx);
        let desired = with_identity_of(desired, &stored);

        let (actions, read, _) = reconcile(&stored, &remote, &desired, &ctx);
        let mut expected = desired.clone();
        expected.identity = read.identity.clone();
        prop_assert_eq!(&read, &expected, "{:?}", actions);
    }

    #[test]
    fn created_product_selection_reads_back_unchanged(record in product_selection()) {
        let (stored, _) = create(&record, &ActionContext::new());
        prop_assert_eq!(&stored, &with_identity_of(record, &stored));
    }

    #[test]
    fn product_selection_converges_to_desired(current in product_selection(), desired in product_selection()) {
        let ctx = ActionContext::new();
        let (stored, remote) = create(&current, &ctx);
        let desired = with_identity_of(desired, &stored);

        let (actions, read, _) = reconcile(&stored, &remote, &desired, &ctx);
        let mut expected = desired.clone();
        expected.identity = read.identity.clone();
        prop_assert_eq!(&read, &expected, "{:?}", actions);
    }

    #[test]
    fn created_tax_category_reads_back_unchanged(record in tax_category()) {
        let (stored, _) = create(&record, &ActionContext::new());
        prop_assert!(same_rates(&stored, &record), "{:?}", stored.rates);
        prop_assert!(stored.rates.iter().all(|r| r.id.as_known().is_some()));
        prop_assert_eq!(&stored.name, &record.name);
    }

    #[test]
    fn tax_category_converges_to_desired(current in tax_category(), desired in tax_category()) {
        let ctx = ActionContext::new();
        let (stored, remote) = create(&current, &ctx);
        let desired = with_identity_of(desired, &stored);

        let (actions, read, _) = reconcile(&stored, &remote, &desired, &ctx);
        prop_assert!(same_rates(&read, &desired), "{:?}", actions);
        prop_assert_eq!(&read.name, &desired.name);
        prop_assert!(read.update_actions(&desired, &ctx).unwrap().is_empty());
    }

    #[test]
    fn created_subscription_reads_back_unchanged(record in subscription()) {
        let (stored, _) = create(&record, &ActionContext::new());
        prop_assert_eq!(&stored, &with_identity_of(record, &stored));
    }

    #[test]
    fn subscription_converges_to_desired(current in subscription(), desired in subscription()) {
        let ctx = ActionContext::new();
        let (stored, remote) = create(&current, &ctx);
        let desired = with_identity_of(desired, &stored);

        let (actions, read, _) = reconcile(&stored, &remote, &desired, &ctx);
        let mut expected = desired.clone();
        expected.identity = read.identity.clone();
        prop_assert_eq!(&read, &expected, "{:?}", actions);
        prop_assert!(read.update_actions(&desired, &ctx).unwrap().is_empty());
    }
}
