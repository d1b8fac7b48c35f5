//! Business units.
//!
//! The remote models a business unit as a discriminated union on `unitType`:
//! a top-level `Company` or a `Division` below a parent unit. Each is its
//! own resource kind here; both share [`UnitFields`] and one action set.
//!
//! Addresses are identified by key. The draft refers to addresses by their
//! index in the submitted list, so keys are resolved to indices when the
//! draft is built; updates address them by key only.

use crate::custom_fields::{
    apply_custom_action, custom_field_actions, custom_type_ids, draft_custom, materialize_custom,
};
use crate::support::{changed, ensure_unchanged, ensure_unique_keys, pinned_version, Phases};
use crate::{
    ActionContext, Address, Creatable, CustomFieldAction, CustomFields, CustomFieldsDraft,
    Identity, Materialize, ModelError, ModelResult, RemoteAddress, RemoteCustomFields,
    RemoteModel, RemoteObject, Resource, SetCustomField, SetCustomType, UpdatePlan,
};
use commerce_diff::{diff_keyed, diff_sets, sort_by_plan, Keyed};
use commerce_types::{Attr, KeyReference, Reference, ResourceIdentifier};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

// ── Enumerations ─────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum BusinessUnitStatus {
    #[default]
    Active,
    Inactive,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum StoreMode {
    #[default]
    Explicit,
    FromParent,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum AssociateMode {
    #[default]
    Explicit,
    ExplicitAndFromParent,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ApprovalRuleMode {
    #[default]
    Explicit,
    ExplicitAndFromParent,
}

// ── Records ──────────────────────────────────────────────────────

/// A customer and the roles they hold in the unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Associate {
    pub customer_id: String,
    #[serde(default)]
    pub role_keys: Vec<String>,
}

impl Keyed for Associate {
    fn key(&self) -> &str {
        &self.customer_id
    }
}

/// Fields shared by companies and divisions.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UnitFields {
    #[serde(flatten)]
    pub identity: Identity,
    pub key: String,
    pub name: String,
    #[serde(default)]
    pub contact_email: Attr<String>,
    #[serde(default)]
    pub status: Attr<BusinessUnitStatus>,
    #[serde(default)]
    pub stores: Vec<String>,
    #[serde(default)]
    pub addresses: Vec<Address>,
    #[serde(default)]
    pub shipping_address_keys: Vec<String>,
    #[serde(default)]
    pub billing_address_keys: Vec<String>,
    #[serde(default)]
    pub default_shipping_address_key: Attr<String>,
    #[serde(default)]
    pub default_billing_address_key: Attr<String>,
    #[serde(default)]
    pub associates: Vec<Associate>,
    #[serde(default)]
    pub custom: Option<CustomFields>,
}

impl UnitFields {
    pub fn new(key: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            name: name.into(),
            ..Self::default()
        }
    }

    fn address_index(&self) -> HashMap<&str, usize> {
        self.addresses
            .iter()
            .enumerate()
            .map(|(i, a)| (a.key.as_str(), i))
            .collect()
    }
}

/// A top-level business unit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Company {
    #[serde(flatten)]
    pub unit: UnitFields,
}

impl Company {
    pub fn new(key: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            unit: UnitFields::new(key, name),
        }
    }
}

/// A business unit below a parent unit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Division {
    #[serde(flatten)]
    pub unit: UnitFields,
    pub parent_unit_key: String,
    #[serde(default)]
    pub store_mode: Attr<StoreMode>,
    #[serde(default)]
    pub associate_mode: Attr<AssociateMode>,
    #[serde(default)]
    pub approval_rule_mode: Attr<ApprovalRuleMode>,
}

impl Division {
    pub fn new(
        key: impl Into<String>,
        name: impl Into<String>,
        parent_unit_key: impl Into<String>,
    ) -> Self {
        Self {
            unit: UnitFields::new(key, name),
            parent_unit_key: parent_unit_key.into(),
            store_mode: Attr::Null,
            associate_mode: Attr::Null,
            approval_rule_mode: Attr::Null,
        }
    }
}

// ── Remote shapes ────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoleAssignment {
    pub associate_role: KeyReference,
    #[serde(default = "default_inheritance")]
    pub inheritance: String,
}

fn default_inheritance() -> String {
    "Enabled".to_string()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteAssociate {
    pub customer: Reference,
    #[serde(default)]
    pub associate_role_assignments: Vec<RoleAssignment>,
}

impl RemoteAssociate {
    fn from_record(associate: &Associate) -> Self {
        Self {
            customer: Reference::new("customer", &associate.customer_id),
            associate_role_assignments: associate
                .role_keys
                .iter()
                .map(|key| RoleAssignment {
                    associate_role: KeyReference::new("associate-role", key),
                    inheritance: default_inheritance(),
                })
                .collect(),
        }
    }

    fn to_record(&self) -> Associate {
        Associate {
            customer_id: self.customer.id.clone(),
            role_keys: self
                .associate_role_assignments
                .iter()
                .map(|a| a.associate_role.key.clone())
                .collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnitRemote {
    pub id: String,
    pub version: i64,
    pub key: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contact_email: Option<String>,
    #[serde(default)]
    pub status: BusinessUnitStatus,
    #[serde(default)]
    pub store_mode: StoreMode,
    #[serde(default)]
    pub stores: Vec<KeyReference>,
    #[serde(default)]
    pub addresses: Vec<RemoteAddress>,
    #[serde(default)]
    pub shipping_address_ids: Vec<String>,
    #[serde(default)]
    pub billing_address_ids: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_shipping_address_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_billing_address_id: Option<String>,
    #[serde(default)]
    pub associates: Vec<RemoteAssociate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom: Option<RemoteCustomFields>,
}

impl UnitRemote {
    fn address_id(&self, key: &str) -> ModelResult<String> {
        self.addresses
            .iter()
            .find(|a| a.key.as_deref() == Some(key))
            .and_then(|a| a.id.clone())
            .ok_or_else(|| {
                ModelError::invalid_reference("addresses", format!("no address with key '{key}'"))
            })
    }

    fn next_address_id(&self) -> String {
        format!("addr-{}-{}", self.version, self.addresses.len())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DivisionRemote {
    #[serde(flatten)]
    pub unit: UnitRemote,
    pub parent_unit: KeyReference,
    #[serde(default)]
    pub associate_mode: AssociateMode,
    #[serde(default)]
    pub approval_rule_mode: ApprovalRuleMode,
}

/// A business unit as returned by the commerce API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "unitType")]
pub enum BusinessUnitRemote {
    Company(UnitRemote),
    Division(DivisionRemote),
}

impl BusinessUnitRemote {
    #[must_use]
    pub fn unit(&self) -> &UnitRemote {
        match self {
            BusinessUnitRemote::Company(u) => u,
            BusinessUnitRemote::Division(d) => &d.unit,
        }
    }

    fn unit_mut(&mut self) -> &mut UnitRemote {
        match self {
            BusinessUnitRemote::Company(u) => u,
            BusinessUnitRemote::Division(d) => &mut d.unit,
        }
    }

    fn unit_type(&self) -> &'static str {
        match self {
            BusinessUnitRemote::Company(_) => "Company",
            BusinessUnitRemote::Division(_) => "Division",
        }
    }

    fn division_mut(&mut self, action: &str) -> ModelResult<&mut DivisionRemote> {
        match self {
            BusinessUnitRemote::Division(d) => Ok(d),
            BusinessUnitRemote::Company(_) => Err(ModelError::invalid_input(
                "unit_type",
                format!("{action} is only valid on a division"),
            )),
        }
    }
}

// ── Drafts ───────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnitDraft {
    pub key: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contact_email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<BusinessUnitStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub store_mode: Option<StoreMode>,
    #[serde(default)]
    pub stores: Vec<ResourceIdentifier>,
    #[serde(default)]
    pub addresses: Vec<RemoteAddress>,
    #[serde(default)]
    pub shipping_addresses: Vec<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_shipping_address: Option<usize>,
    #[serde(default)]
    pub billing_addresses: Vec<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_billing_address: Option<usize>,
    #[serde(default)]
    pub associates: Vec<RemoteAssociate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom: Option<CustomFieldsDraft>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DivisionDraft {
    #[serde(flatten)]
    pub unit: UnitDraft,
    pub parent_unit: ResourceIdentifier,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub associate_mode: Option<AssociateMode>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub approval_rule_mode: Option<ApprovalRuleMode>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "unitType")]
pub enum BusinessUnitDraft {
    Company(UnitDraft),
    Division(DivisionDraft),
}

// ── Actions ──────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "camelCase")]
pub enum BusinessUnitAction {
    ChangeName {
        name: String,
    },
    #[serde(rename_all = "camelCase")]
    SetContactEmail {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        contact_email: Option<String>,
    },
    ChangeStatus {
        status: BusinessUnitStatus,
    },
    #[serde(rename_all = "camelCase")]
    ChangeParentUnit {
        parent_unit: ResourceIdentifier,
    },
    #[serde(rename_all = "camelCase")]
    SetStoreMode {
        store_mode: StoreMode,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        stores: Option<Vec<ResourceIdentifier>>,
    },
    #[serde(rename_all = "camelCase")]
    ChangeAssociateMode {
        associate_mode: AssociateMode,
    },
    #[serde(rename_all = "camelCase")]
    ChangeApprovalRuleMode {
        approval_rule_mode: ApprovalRuleMode,
    },
    SetAssociates {
        associates: Vec<RemoteAssociate>,
    },
    AddAddress {
        address: RemoteAddress,
    },
    #[serde(rename_all = "camelCase")]
    ChangeAddress {
        address_key: String,
        address: RemoteAddress,
    },
    #[serde(rename_all = "camelCase")]
    SetDefaultShippingAddress {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        address_key: Option<String>,
    },
    #[serde(rename_all = "camelCase")]
    SetDefaultBillingAddress {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        address_key: Option<String>,
    },
    #[serde(rename_all = "camelCase")]
    AddShippingAddressId {
        address_key: String,
    },
    #[serde(rename_all = "camelCase")]
    RemoveShippingAddressId {
        address_key: String,
    },
    #[serde(rename_all = "camelCase")]
    AddBillingAddressId {
        address_key: String,
    },
    #[serde(rename_all = "camelCase")]
    RemoveBillingAddressId {
        address_key: String,
    },
    AddStore {
        store: ResourceIdentifier,
    },
    RemoveStore {
        store: ResourceIdentifier,
    },
    #[serde(rename_all = "camelCase")]
    RemoveAddress {
        address_key: String,
    },
    SetCustomType(SetCustomType),
    SetCustomField(SetCustomField),
}

impl From<CustomFieldAction> for BusinessUnitAction {
    fn from(action: CustomFieldAction) -> Self {
        match action {
            CustomFieldAction::SetCustomType(a) => BusinessUnitAction::SetCustomType(a),
            CustomFieldAction::SetCustomField(a) => BusinessUnitAction::SetCustomField(a),
        }
    }
}

fn store_identifier(key: &str) -> ResourceIdentifier {
    ResourceIdentifier::by_key("store", key)
}

// ── Shared logic ─────────────────────────────────────────────────

fn unit_from_remote(remote: &UnitRemote) -> UnitFields {
    let keys_by_id: HashMap<&str, &str> = remote
        .addresses
        .iter()
        .filter_map(|a| Some((a.id.as_deref()?, a.key.as_deref()?)))
        .collect();
    let to_keys = |ids: &[String]| -> Vec<String> {
        ids.iter()
            .filter_map(|id| keys_by_id.get(id.as_str()).map(|k| k.to_string()))
            .collect()
    };
    let to_key = |id: &Option<String>| -> Attr<String> {
        id.as_deref()
            .and_then(|id| keys_by_id.get(id))
            .map(|k| k.to_string())
            .into()
    };

    let mut addresses: Vec<Address> = remote.addresses.iter().map(Address::from_remote).collect();
    addresses.sort_by(|a, b| a.key.cmp(&b.key));

    UnitFields {
        identity: Identity::new(&remote.id, remote.version),
        key: remote.key.clone(),
        name: remote.name.clone(),
        contact_email: remote.contact_email.clone().into(),
        status: Attr::known(remote.status),
        stores: remote.stores.iter().map(|s| s.key.clone()).collect(),
        addresses,
        shipping_address_keys: to_keys(&remote.shipping_address_ids),
        billing_address_keys: to_keys(&remote.billing_address_ids),
        default_shipping_address_key: to_key(&remote.default_shipping_address_id),
        default_billing_address_key: to_key(&remote.default_billing_address_id),
        associates: remote.associates.iter().map(RemoteAssociate::to_record).collect(),
        custom: remote.custom.as_ref().map(CustomFields::from_remote),
    }
}

fn validate_default(
    unit: &UnitFields,
    path: &str,
    default: &Attr<String>,
    list_path: &str,
    list: &[String],
) -> ModelResult<()> {
    let Some(key) = default.as_deref() else {
        return Ok(());
    };
    if !unit.addresses.iter().any(|a| a.key == key) {
        return Err(ModelError::invalid_reference(
            path,
            format!("address '{key}' is not in addresses"),
        ));
    }
    if !list.iter().any(|k| k == key) {
        return Err(ModelError::invalid_input(
            path,
            format!("address '{key}' is not in {list_path}"),
        ));
    }
    Ok(())
}

fn validate_unit(unit: &UnitFields) -> ModelResult<()> {
    if unit.key.is_empty() {
        return Err(ModelError::invalid_input("key", "must not be empty"));
    }
    if unit.name.is_empty() {
        return Err(ModelError::invalid_input("name", "must not be empty"));
    }
    if let Some(email) = unit.contact_email.as_deref() {
        if !email.contains('@') {
            return Err(ModelError::invalid_input(
                "contact_email",
                format!("'{email}' is not an email address"),
            ));
        }
    }
    if unit.addresses.iter().any(|a| a.key.is_empty()) {
        return Err(ModelError::invalid_input("addresses", "every address needs a key"));
    }
    ensure_unique_keys("addresses", "address key", unit.addresses.iter().map(|a| a.key.as_str()))?;
    ensure_unique_keys("stores", "store", unit.stores.iter().map(String::as_str))?;
    ensure_unique_keys(
        "associates",
        "associate",
        unit.associates.iter().map(|a| a.customer_id.as_str()),
    )?;

    let index = unit.address_index();
    for (path, keys) in [
        ("shipping_address_keys", &unit.shipping_address_keys),
        ("billing_address_keys", &unit.billing_address_keys),
    ] {
        ensure_unique_keys(path, "address key", keys.iter().map(String::as_str))?;
        if let Some(missing) = keys.iter().find(|k| !index.contains_key(k.as_str())) {
            return Err(ModelError::invalid_reference(
                path,
                format!("address '{missing}' is not in addresses"),
            ));
        }
    }

    validate_default(
        unit,
        "default_shipping_address_key",
        &unit.default_shipping_address_key,
        "shipping_address_keys",
        &unit.shipping_address_keys,
    )?;
    validate_default(
        unit,
        "default_billing_address_key",
        &unit.default_billing_address_key,
        "billing_address_keys",
        &unit.billing_address_keys,
    )
}

fn unit_draft(unit: &UnitFields, store_mode: Option<StoreMode>, ctx: &ActionContext) -> ModelResult<UnitDraft> {
    validate_unit(unit)?;
    let index = unit.address_index();
    let resolve = |path: &str, key: &str| -> ModelResult<usize> {
        index.get(key).copied().ok_or_else(|| {
            ModelError::invalid_reference(path, format!("address '{key}' is not in addresses"))
        })
    };
    let resolve_all = |path: &str, keys: &[String]| -> ModelResult<Vec<usize>> {
        keys.iter().map(|k| resolve(path, k)).collect()
    };

    Ok(UnitDraft {
        key: unit.key.clone(),
        name: unit.name.clone(),
        contact_email: unit.contact_email.to_option(),
        status: unit.status.to_option(),
        store_mode,
        stores: unit.stores.iter().map(|k| store_identifier(k)).collect(),
        addresses: unit.addresses.iter().map(Address::to_remote).collect(),
        shipping_addresses: resolve_all("shipping_address_keys", &unit.shipping_address_keys)?,
        default_shipping_address: unit
            .default_shipping_address_key
            .as_deref()
            .map(|k| resolve("default_shipping_address_key", k))
            .transpose()?,
        billing_addresses: resolve_all("billing_address_keys", &unit.billing_address_keys)?,
        default_billing_address: unit
            .default_billing_address_key
            .as_deref()
            .map(|k| resolve("default_billing_address_key", k))
            .transpose()?,
        associates: unit.associates.iter().map(RemoteAssociate::from_record).collect(),
        custom: draft_custom(unit.custom.as_ref(), ctx)?,
    })
}

/// Diffs the fields shared by companies and divisions into `phases`.
///
/// Store membership is skipped when `stores_managed` is false, i.e. when a
/// store-mode change already carries the store list.
fn unit_actions(
    current: &UnitFields,
    desired: &UnitFields,
    stores_managed: bool,
    ctx: &ActionContext,
    phases: &mut Phases<BusinessUnitAction>,
) -> ModelResult<()> {
    ensure_unchanged("key", &current.key, &desired.key)?;
    validate_unit(desired)?;

    if current.name != desired.name {
        phases.scalars.push(BusinessUnitAction::ChangeName {
            name: desired.name.clone(),
        });
    }
    if changed(&current.contact_email, &desired.contact_email) {
        phases.scalars.push(BusinessUnitAction::SetContactEmail {
            contact_email: desired.contact_email.to_option(),
        });
    }
    if let Attr::Known(status) = desired.status {
        if current.status.get_or(BusinessUnitStatus::Active) != status {
            phases.scalars.push(BusinessUnitAction::ChangeStatus { status });
        }
    }
    if !diff_keyed(&current.associates, &desired.associates).is_empty() {
        phases.scalars.push(BusinessUnitAction::SetAssociates {
            associates: desired.associates.iter().map(RemoteAssociate::from_record).collect(),
        });
    }

    let addresses = diff_keyed(&current.addresses, &desired.addresses);
    for added in &addresses.added {
        phases.additions.push(BusinessUnitAction::AddAddress {
            address: added.to_remote(),
        });
    }
    for m in &addresses.modified {
        phases.mutations.push(BusinessUnitAction::ChangeAddress {
            address_key: m.desired.key.clone(),
            address: m.desired.to_remote(),
        });
    }

    let shipping_default_changed =
        changed(&current.default_shipping_address_key, &desired.default_shipping_address_key);
    if shipping_default_changed {
        phases.defaults.push(BusinessUnitAction::SetDefaultShippingAddress {
            address_key: desired.default_shipping_address_key.to_option(),
        });
    }
    let billing_default_changed =
        changed(&current.default_billing_address_key, &desired.default_billing_address_key);
    if billing_default_changed {
        phases.defaults.push(BusinessUnitAction::SetDefaultBillingAddress {
            address_key: desired.default_billing_address_key.to_option(),
        });
    }

    // Setting a default also lists the address; skip the redundant add.
    let new_shipping_default = desired
        .default_shipping_address_key
        .as_deref()
        .filter(|_| shipping_default_changed);
    let shipping = diff_sets(&current.shipping_address_keys, &desired.shipping_address_keys);
    for key in shipping.added {
        if Some(key) != new_shipping_default {
            phases.references.push(BusinessUnitAction::AddShippingAddressId {
                address_key: key.to_string(),
            });
        }
    }
    for key in shipping.removed {
        phases.references.push(BusinessUnitAction::RemoveShippingAddressId {
            address_key: key.to_string(),
        });
    }

    let new_billing_default = desired
        .default_billing_address_key
        .as_deref()
        .filter(|_| billing_default_changed);
    let billing = diff_sets(&current.billing_address_keys, &desired.billing_address_keys);
    for key in billing.added {
        if Some(key) != new_billing_default {
            phases.references.push(BusinessUnitAction::AddBillingAddressId {
                address_key: key.to_string(),
            });
        }
    }
    for key in billing.removed {
        phases.references.push(BusinessUnitAction::RemoveBillingAddressId {
            address_key: key.to_string(),
        });
    }

    if stores_managed {
        let stores = diff_sets(&current.stores, &desired.stores);
        for key in stores.added {
            phases.references.push(BusinessUnitAction::AddStore {
                store: store_identifier(key),
            });
        }
        for key in stores.removed {
            phases.references.push(BusinessUnitAction::RemoveStore {
                store: store_identifier(key),
            });
        }
    }

    for removed in &addresses.removed {
        phases.removals.push(BusinessUnitAction::RemoveAddress {
            address_key: removed.key.clone(),
        });
    }

    phases.custom.extend(
        custom_field_actions(current.custom.as_ref(), desired.custom.as_ref(), ctx)?
            .into_iter()
            .map(BusinessUnitAction::from),
    );
    Ok(())
}

fn align_unit(unit: &mut UnitFields, plan: &UnitFields) {
    let addresses = std::mem::take(&mut unit.addresses);
    unit.addresses = sort_by_plan(plan.addresses.iter().map(|a| a.key.as_str()), addresses);
    let shipping = std::mem::take(&mut unit.shipping_address_keys);
    unit.shipping_address_keys =
        sort_by_plan(plan.shipping_address_keys.iter().map(String::as_str), shipping);
    let billing = std::mem::take(&mut unit.billing_address_keys);
    unit.billing_address_keys =
        sort_by_plan(plan.billing_address_keys.iter().map(String::as_str), billing);
    let stores = std::mem::take(&mut unit.stores);
    unit.stores = sort_by_plan(plan.stores.iter().map(String::as_str), stores);
    let associates = std::mem::take(&mut unit.associates);
    unit.associates = sort_by_plan(plan.associates.iter().map(|a| a.customer_id.as_str()), associates);
    if plan.status.is_null() && unit.status == Attr::known(BusinessUnitStatus::Active) {
        unit.status = Attr::Null;
    }
}

// ── Company ──────────────────────────────────────────────────────

impl Resource for Company {
    const TYPE_NAME: &'static str = "commerce_business_unit_company";
    const ENDPOINT: &'static str = "business-units";

    type Remote = BusinessUnitRemote;
    type Action = BusinessUnitAction;

    fn identity(&self) -> &Identity {
        &self.unit.identity
    }

    fn identity_mut(&mut self) -> &mut Identity {
        &mut self.unit.identity
    }

    fn from_remote(remote: &BusinessUnitRemote) -> ModelResult<Self> {
        match remote {
            BusinessUnitRemote::Company(unit) => Ok(Self {
                unit: unit_from_remote(unit),
            }),
            other => Err(ModelError::Internal(format!(
                "business unit '{}' is a {}, expected a Company",
                other.unit().key,
                other.unit_type()
            ))),
        }
    }

    fn update_actions(
        &self,
        desired: &Self,
        ctx: &ActionContext,
    ) -> ModelResult<UpdatePlan<BusinessUnitAction>> {
        let mut phases = Phases::default();
        unit_actions(&self.unit, &desired.unit, true, ctx, &mut phases)?;
        Ok(UpdatePlan::new(
            pinned_version(&self.unit.identity.version)?,
            phases.into_actions(),
        ))
    }

    fn validate(&self) -> ModelResult<()> {
        validate_unit(&self.unit)
    }

    fn custom_type_ids(&self) -> Vec<String> {
        custom_type_ids(self.unit.custom.as_ref())
    }

    fn align_with_plan(&mut self, plan: &Self) {
        align_unit(&mut self.unit, &plan.unit);
    }
}

impl Creatable for Company {
    type Draft = BusinessUnitDraft;

    fn draft(&self, ctx: &ActionContext) -> ModelResult<BusinessUnitDraft> {
        Ok(BusinessUnitDraft::Company(unit_draft(
            &self.unit,
            Some(StoreMode::Explicit),
            ctx,
        )?))
    }
}

// ── Division ─────────────────────────────────────────────────────

impl Resource for Division {
    const TYPE_NAME: &'static str = "commerce_business_unit_division";
    const ENDPOINT: &'static str = "business-units";

    type Remote = BusinessUnitRemote;
    type Action = BusinessUnitAction;

    fn identity(&self) -> &Identity {
        &self.unit.identity
    }

    fn identity_mut(&mut self) -> &mut Identity {
        &mut self.unit.identity
    }

    fn from_remote(remote: &BusinessUnitRemote) -> ModelResult<Self> {
        match remote {
            BusinessUnitRemote::Division(d) => Ok(Self {
                unit: unit_from_remote(&d.unit),
                parent_unit_key: d.parent_unit.key.clone(),
                store_mode: Attr::known(d.unit.store_mode),
                associate_mode: Attr::known(d.associate_mode),
                approval_rule_mode: Attr::known(d.approval_rule_mode),
            }),
            other => Err(ModelError::Internal(format!(
                "business unit '{}' is a {}, expected a Division",
                other.unit().key,
                other.unit_type()
            ))),
        }
    }

    fn update_actions(
        &self,
        desired: &Self,
        ctx: &ActionContext,
    ) -> ModelResult<UpdatePlan<BusinessUnitAction>> {
        desired.validate()?;
        let mut phases = Phases::default();

        if self.parent_unit_key != desired.parent_unit_key {
            phases.scalars.push(BusinessUnitAction::ChangeParentUnit {
                parent_unit: ResourceIdentifier::by_key("business-unit", &desired.parent_unit_key),
            });
        }
        let store_mode_changed = match desired.store_mode {
            Attr::Known(mode) => self.store_mode.get_or(StoreMode::Explicit) != mode,
            _ => false,
        };
        if store_mode_changed {
            let store_mode = desired.store_mode.get_or(StoreMode::Explicit);
            let stores = (store_mode == StoreMode::Explicit).then(|| {
                desired.unit.stores.iter().map(|k| store_identifier(k)).collect()
            });
            phases.scalars.push(BusinessUnitAction::SetStoreMode { store_mode, stores });
        }
        if let Attr::Known(mode) = desired.associate_mode {
            if self.associate_mode.get_or(AssociateMode::Explicit) != mode {
                phases.scalars.push(BusinessUnitAction::ChangeAssociateMode {
                    associate_mode: mode,
                });
            }
        }
        if let Attr::Known(mode) = desired.approval_rule_mode {
            if self.approval_rule_mode.get_or(ApprovalRuleMode::Explicit) != mode {
                phases.scalars.push(BusinessUnitAction::ChangeApprovalRuleMode {
                    approval_rule_mode: mode,
                });
            }
        }

        unit_actions(&self.unit, &desired.unit, !store_mode_changed, ctx, &mut phases)?;
        Ok(UpdatePlan::new(
            pinned_version(&self.unit.identity.version)?,
            phases.into_actions(),
        ))
    }

    fn validate(&self) -> ModelResult<()> {
        validate_unit(&self.unit)?;
        if self.parent_unit_key.is_empty() {
            return Err(ModelError::invalid_input("parent_unit_key", "must not be empty"));
        }
        if self.parent_unit_key == self.unit.key {
            return Err(ModelError::invalid_reference(
                "parent_unit_key",
                "a division cannot be its own parent",
            ));
        }
        if self.store_mode == Attr::known(StoreMode::FromParent) && !self.unit.stores.is_empty() {
            return Err(ModelError::invalid_input(
                "stores",
                "stores must be empty when store_mode is FromParent",
            ));
        }
        Ok(())
    }

    fn custom_type_ids(&self) -> Vec<String> {
        custom_type_ids(self.unit.custom.as_ref())
    }

    fn align_with_plan(&mut self, plan: &Self) {
        align_unit(&mut self.unit, &plan.unit);
        if plan.store_mode.is_null() && self.store_mode == Attr::known(StoreMode::Explicit) {
            self.store_mode = Attr::Null;
        }
        if plan.associate_mode.is_null()
            && self.associate_mode == Attr::known(AssociateMode::Explicit)
        {
            self.associate_mode = Attr::Null;
        }
        if plan.approval_rule_mode.is_null()
            && self.approval_rule_mode == Attr::known(ApprovalRuleMode::Explicit)
        {
            self.approval_rule_mode = Attr::Null;
        }
    }
}

impl Creatable for Division {
    type Draft = BusinessUnitDraft;

    fn draft(&self, ctx: &ActionContext) -> ModelResult<BusinessUnitDraft> {
        self.validate()?;
        Ok(BusinessUnitDraft::Division(DivisionDraft {
            unit: unit_draft(&self.unit, self.store_mode.to_option(), ctx)?,
            parent_unit: ResourceIdentifier::by_key("business-unit", &self.parent_unit_key),
            associate_mode: self.associate_mode.to_option(),
            approval_rule_mode: self.approval_rule_mode.to_option(),
        }))
    }
}

// ── Server semantics ─────────────────────────────────────────────

impl RemoteObject for BusinessUnitRemote {
    fn id(&self) -> &str {
        &self.unit().id
    }

    fn version(&self) -> i64 {
        self.unit().version
    }

    fn set_version(&mut self, version: i64) {
        self.unit_mut().version = version;
    }
}

fn key_of(ident: &ResourceIdentifier) -> ModelResult<KeyReference> {
    match (&ident.type_id, &ident.key) {
        (Some(type_id), Some(key)) => Ok(KeyReference::new(type_id.clone(), key.clone())),
        _ => Err(ModelError::invalid_input(
            "stores",
            format!("identifier {ident:?} has no key"),
        )),
    }
}

fn add_unique(list: &mut Vec<String>, id: String) {
    if !list.contains(&id) {
        list.push(id);
    }
}

fn apply_unit_action(unit: &mut UnitRemote, action: &BusinessUnitAction) -> ModelResult<()> {
    match action {
        BusinessUnitAction::ChangeName { name } => unit.name = name.clone(),
        BusinessUnitAction::SetContactEmail { contact_email } => {
            unit.contact_email = contact_email.clone();
        }
        BusinessUnitAction::ChangeStatus { status } => unit.status = *status,
        BusinessUnitAction::SetAssociates { associates } => unit.associates = associates.clone(),
        BusinessUnitAction::AddAddress { address } => {
            if let Some(key) = &address.key {
                if unit.addresses.iter().any(|a| a.key.as_ref() == Some(key)) {
                    return Err(ModelError::invalid_input(
                        "addresses",
                        format!("address key '{key}' already exists"),
                    ));
                }
            }
            let mut address = address.clone();
            address.id = Some(unit.next_address_id());
            unit.addresses.push(address);
        }
        BusinessUnitAction::ChangeAddress {
            address_key,
            address,
        } => {
            let slot = unit
                .addresses
                .iter_mut()
                .find(|a| a.key.as_deref() == Some(address_key.as_str()))
                .ok_or_else(|| {
                    ModelError::invalid_reference(
                        "addresses",
                        format!("no address with key '{address_key}'"),
                    )
                })?;
            let id = slot.id.clone();
            *slot = address.clone();
            slot.id = id;
        }
        BusinessUnitAction::RemoveAddress { address_key } => {
            let id = unit.address_id(address_key)?;
            unit.addresses.retain(|a| a.id.as_deref() != Some(id.as_str()));
            unit.shipping_address_ids.retain(|i| *i != id);
            unit.billing_address_ids.retain(|i| *i != id);
            if unit.default_shipping_address_id.as_deref() == Some(id.as_str()) {
                unit.default_shipping_address_id = None;
            }
            if unit.default_billing_address_id.as_deref() == Some(id.as_str()) {
                unit.default_billing_address_id = None;
            }
        }
        BusinessUnitAction::SetDefaultShippingAddress { address_key } => {
            unit.default_shipping_address_id = match address_key {
                Some(key) => {
                    let id = unit.address_id(key)?;
                    add_unique(&mut unit.shipping_address_ids, id.clone());
                    Some(id)
                }
                None => None,
            };
        }
        BusinessUnitAction::SetDefaultBillingAddress { address_key } => {
            unit.default_billing_address_id = match address_key {
                Some(key) => {
                    let id = unit.address_id(key)?;
                    add_unique(&mut unit.billing_address_ids, id.clone());
                    Some(id)
                }
                None => None,
            };
        }
        BusinessUnitAction::AddShippingAddressId { address_key } => {
            let id = unit.address_id(address_key)?;
            add_unique(&mut unit.shipping_address_ids, id);
        }
        BusinessUnitAction::RemoveShippingAddressId { address_key } => {
            let id = unit.address_id(address_key)?;
            unit.shipping_address_ids.retain(|i| *i != id);
            if unit.default_shipping_address_id.as_deref() == Some(id.as_str()) {
                unit.default_shipping_address_id = None;
            }
        }
        BusinessUnitAction::AddBillingAddressId { address_key } => {
            let id = unit.address_id(address_key)?;
            add_unique(&mut unit.billing_address_ids, id);
        }
        BusinessUnitAction::RemoveBillingAddressId { address_key } => {
            let id = unit.address_id(address_key)?;
            unit.billing_address_ids.retain(|i| *i != id);
            if unit.default_billing_address_id.as_deref() == Some(id.as_str()) {
                unit.default_billing_address_id = None;
            }
        }
        BusinessUnitAction::AddStore { store } => {
            let store = key_of(store)?;
            if !unit.stores.contains(&store) {
                unit.stores.push(store);
            }
        }
        BusinessUnitAction::RemoveStore { store } => {
            let store = key_of(store)?;
            unit.stores.retain(|s| *s != store);
        }
        BusinessUnitAction::SetStoreMode { store_mode, stores } => {
            unit.store_mode = *store_mode;
            unit.stores = stores
                .iter()
                .flatten()
                .map(key_of)
                .collect::<ModelResult<Vec<_>>>()?;
        }
        BusinessUnitAction::SetCustomType(a) => {
            apply_custom_action(&mut unit.custom, &CustomFieldAction::SetCustomType(a.clone()))?;
        }
        BusinessUnitAction::SetCustomField(a) => {
            apply_custom_action(&mut unit.custom, &CustomFieldAction::SetCustomField(a.clone()))?;
        }
        BusinessUnitAction::ChangeParentUnit { .. }
        | BusinessUnitAction::ChangeAssociateMode { .. }
        | BusinessUnitAction::ChangeApprovalRuleMode { .. } => {
            return Err(ModelError::Internal(format!(
                "division action {action:?} reached the shared handler"
            )));
        }
    }
    Ok(())
}

impl RemoteModel for BusinessUnitRemote {
    type Action = BusinessUnitAction;

    fn apply_action(&mut self, action: &BusinessUnitAction) -> ModelResult<()> {
        match action {
            BusinessUnitAction::ChangeParentUnit { parent_unit } => {
                self.division_mut("changeParentUnit")?.parent_unit = key_of(parent_unit)?;
            }
            BusinessUnitAction::ChangeAssociateMode { associate_mode } => {
                self.division_mut("changeAssociateMode")?.associate_mode = *associate_mode;
            }
            BusinessUnitAction::ChangeApprovalRuleMode { approval_rule_mode } => {
                self.division_mut("changeApprovalRuleMode")?.approval_rule_mode =
                    *approval_rule_mode;
            }
            other => apply_unit_action(self.unit_mut(), other)?,
        }
        Ok(())
    }
}

fn materialize_unit(draft: UnitDraft, id: String) -> ModelResult<UnitRemote> {
    let addresses: Vec<RemoteAddress> = draft
        .addresses
        .into_iter()
        .enumerate()
        .map(|(i, mut a)| {
            a.id = Some(format!("addr-1-{i}"));
            a
        })
        .collect();
    let id_at = |i: usize| -> ModelResult<String> {
        addresses
            .get(i)
            .and_then(|a| a.id.clone())
            .ok_or_else(|| ModelError::invalid_reference("addresses", format!("no address at index {i}")))
    };
    let shipping_address_ids = draft
        .shipping_addresses
        .iter()
        .map(|&i| id_at(i))
        .collect::<ModelResult<Vec<_>>>()?;
    let billing_address_ids = draft
        .billing_addresses
        .iter()
        .map(|&i| id_at(i))
        .collect::<ModelResult<Vec<_>>>()?;
    let default_shipping_address_id = draft.default_shipping_address.map(id_at).transpose()?;
    let default_billing_address_id = draft.default_billing_address.map(id_at).transpose()?;
    let stores = draft
        .stores
        .iter()
        .map(key_of)
        .collect::<ModelResult<Vec<_>>>()?;

    Ok(UnitRemote {
        id,
        version: 1,
        key: draft.key,
        name: draft.name,
        contact_email: draft.contact_email,
        status: draft.status.unwrap_or_default(),
        store_mode: draft.store_mode.unwrap_or_default(),
        stores,
        addresses,
        shipping_address_ids,
        billing_address_ids,
        default_shipping_address_id,
        default_billing_address_id,
        associates: draft.associates,
        custom: materialize_custom(draft.custom)?,
    })
}

impl Materialize for BusinessUnitRemote {
    type Draft = BusinessUnitDraft;

    fn materialize(draft: BusinessUnitDraft, id: String) -> ModelResult<Self> {
        Ok(match draft {
            BusinessUnitDraft::Company(unit) => BusinessUnitRemote::Company(materialize_unit(unit, id)?),
            BusinessUnitDraft::Division(d) => BusinessUnitRemote::Division(DivisionRemote {
                unit: materialize_unit(d.unit, id)?,
                parent_unit: key_of(&d.parent_unit)?,
                associate_mode: d.associate_mode.unwrap_or_default(),
                approval_rule_mode: d.approval_rule_mode.unwrap_or_default(),
            }),
        })
    }
}
