//! Associate roles.
//!
//! A role is a named set of permissions that business-unit associates are
//! granted. The remote returns permissions in arbitrary order, so the stored
//! list is put back into the planned order after every write and read.

use crate::custom_fields::{
    apply_custom_action, custom_field_actions, custom_type_ids, draft_custom, materialize_custom,
};
use crate::support::{changed, ensure_unchanged, ensure_unique_keys, pinned_version};
use crate::{
    ActionContext, Creatable, CustomFieldAction, CustomFields, CustomFieldsDraft, Identity,
    Materialize, ModelError, ModelResult, RemoteCustomFields, RemoteModel, RemoteObject, Resource,
    SetCustomField, SetCustomType, UpdatePlan,
};
use commerce_diff::{retain_in_plan_order, same_members};
use commerce_types::Attr;
use serde::{Deserialize, Serialize};

/// Every permission the remote accepts on an associate role.
pub const PERMISSIONS: &[&str] = &[
    "AddChildUnits",
    "UpdateAssociates",
    "UpdateBusinessUnitDetails",
    "UpdateParentUnit",
    "CreateMyCarts",
    "CreateOthersCarts",
    "DeleteMyCarts",
    "DeleteOthersCarts",
    "UpdateMyCarts",
    "UpdateOthersCarts",
    "ViewMyCarts",
    "ViewOthersCarts",
    "CreateMyOrdersFromMyCarts",
    "CreateMyOrdersFromMyQuotes",
    "CreateOrdersFromOthersCarts",
    "CreateOrdersFromOthersQuotes",
    "UpdateMyOrders",
    "UpdateOthersOrders",
    "ViewMyOrders",
    "ViewOthersOrders",
    "CreateMyQuoteRequestsFromMyCarts",
    "CreateQuoteRequestsFromOthersCarts",
    "UpdateMyQuoteRequests",
    "UpdateOthersQuoteRequests",
    "ViewMyQuoteRequests",
    "ViewOthersQuoteRequests",
    "AcceptMyQuotes",
    "AcceptOthersQuotes",
    "DeclineMyQuotes",
    "DeclineOthersQuotes",
    "ReassignMyQuotes",
    "ReassignOthersQuotes",
    "RenegotiateMyQuotes",
    "RenegotiateOthersQuotes",
    "ViewMyQuotes",
    "ViewOthersQuotes",
    "CreateApprovalRules",
    "UpdateApprovalRules",
    "UpdateApprovalFlows",
    "ViewMyShoppingLists",
    "ViewOthersShoppingLists",
    "CreateMyShoppingLists",
    "CreateOthersShoppingLists",
    "UpdateMyShoppingLists",
    "UpdateOthersShoppingLists",
    "DeleteMyShoppingLists",
    "DeleteOthersShoppingLists",
];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssociateRole {
    #[serde(flatten)]
    pub identity: Identity,
    pub key: String,
    #[serde(default)]
    pub buyer_assignable: Attr<bool>,
    #[serde(default)]
    pub name: Attr<String>,
    #[serde(default)]
    pub permissions: Vec<String>,
    #[serde(default)]
    pub custom: Option<CustomFields>,
}

impl AssociateRole {
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            identity: Identity::default(),
            key: key.into(),
            buyer_assignable: Attr::Null,
            name: Attr::Null,
            permissions: Vec::new(),
            custom: None,
        }
    }

    #[must_use]
    pub fn with_permissions<I, S>(mut self, permissions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.permissions = permissions.into_iter().map(Into::into).collect();
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssociateRoleRemote {
    pub id: String,
    pub version: i64,
    pub key: String,
    pub buyer_assignable: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default)]
    pub permissions: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom: Option<RemoteCustomFields>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssociateRoleDraft {
    pub key: String,
    pub buyer_assignable: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default)]
    pub permissions: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom: Option<CustomFieldsDraft>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "camelCase")]
pub enum AssociateRoleAction {
    #[serde(rename_all = "camelCase")]
    ChangeBuyerAssignable { buyer_assignable: bool },
    SetName {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        name: Option<String>,
    },
    SetPermissions { permissions: Vec<String> },
    SetCustomType(SetCustomType),
    SetCustomField(SetCustomField),
}

impl From<CustomFieldAction> for AssociateRoleAction {
    fn from(action: CustomFieldAction) -> Self {
        match action {
            CustomFieldAction::SetCustomType(a) => AssociateRoleAction::SetCustomType(a),
            CustomFieldAction::SetCustomField(a) => AssociateRoleAction::SetCustomField(a),
        }
    }
}

impl Resource for AssociateRole {
    const TYPE_NAME: &'static str = "commerce_associate_role";
    const ENDPOINT: &'static str = "associate-roles";

    type Remote = AssociateRoleRemote;
    type Action = AssociateRoleAction;

    fn identity(&self) -> &Identity {
        &self.identity
    }

    fn identity_mut(&mut self) -> &mut Identity {
        &mut self.identity
    }

    fn from_remote(remote: &AssociateRoleRemote) -> ModelResult<Self> {
        Ok(Self {
            identity: Identity::new(&remote.id, remote.version),
            key: remote.key.clone(),
            buyer_assignable: Attr::known(remote.buyer_assignable),
            name: remote.name.clone().into(),
            permissions: remote.permissions.clone(),
            custom: remote.custom.as_ref().map(CustomFields::from_remote),
        })
    }

    fn update_actions(
        &self,
        desired: &Self,
        ctx: &ActionContext,
    ) -> ModelResult<UpdatePlan<AssociateRoleAction>> {
        ensure_unchanged("key", &self.key, &desired.key)?;
        desired.validate()?;

        let mut actions = Vec::new();
        let buyer_assignable = desired.buyer_assignable.get_or(false);
        if !desired.buyer_assignable.is_unknown()
            && self.buyer_assignable.get_or(false) != buyer_assignable
        {
            actions.push(AssociateRoleAction::ChangeBuyerAssignable { buyer_assignable });
        }
        if changed(&self.name, &desired.name) {
            actions.push(AssociateRoleAction::SetName {
                name: desired.name.to_option(),
            });
        }
        if !same_members(&self.permissions, &desired.permissions) {
            actions.push(AssociateRoleAction::SetPermissions {
                permissions: desired.permissions.clone(),
            });
        }
        actions.extend(
            custom_field_actions(self.custom.as_ref(), desired.custom.as_ref(), ctx)?
                .into_iter()
                .map(AssociateRoleAction::from),
        );

        Ok(UpdatePlan::new(pinned_version(&self.identity.version)?, actions))
    }

    fn validate(&self) -> ModelResult<()> {
        if let Some(bad) = self.permissions.iter().find(|p| !PERMISSIONS.contains(&p.as_str())) {
            return Err(ModelError::invalid_input(
                "permissions",
                format!("unknown permission '{bad}'"),
            ));
        }
        ensure_unique_keys("permissions", "permission", self.permissions.iter().map(String::as_str))
    }

    fn custom_type_ids(&self) -> Vec<String> {
        custom_type_ids(self.custom.as_ref())
    }

    fn align_with_plan(&mut self, plan: &Self) {
        let actual = std::mem::take(&mut self.permissions);
        self.permissions = retain_in_plan_order(plan.permissions.iter().map(String::as_str), actual);
    }
}

impl Creatable for AssociateRole {
    type Draft = AssociateRoleDraft;

    fn draft(&self, ctx: &ActionContext) -> ModelResult<AssociateRoleDraft> {
        self.validate()?;
        Ok(AssociateRoleDraft {
            key: self.key.clone(),
            buyer_assignable: self.buyer_assignable.get_or(false),
            name: self.name.to_option(),
            permissions: self.permissions.clone(),
            custom: draft_custom(self.custom.as_ref(), ctx)?,
        })
    }
}

impl RemoteObject for AssociateRoleRemote {
    fn id(&self) -> &str {
        &self.id
    }

    fn version(&self) -> i64 {
        self.version
    }

    fn set_version(&mut self, version: i64) {
        self.version = version;
    }
}

impl RemoteModel for AssociateRoleRemote {
    type Action = AssociateRoleAction;

    fn apply_action(&mut self, action: &AssociateRoleAction) -> ModelResult<()> {
        match action {
            AssociateRoleAction::ChangeBuyerAssignable { buyer_assignable } => {
                self.buyer_assignable = *buyer_assignable;
            }
            AssociateRoleAction::SetName { name } => self.name = name.clone(),
            AssociateRoleAction::SetPermissions { permissions } => {
                self.permissions = permissions.clone();
            }
            AssociateRoleAction::SetCustomType(a) => {
                apply_custom_action(&mut self.custom, &CustomFieldAction::SetCustomType(a.clone()))?;
            }
            AssociateRoleAction::SetCustomField(a) => {
                apply_custom_action(&mut self.custom, &CustomFieldAction::SetCustomField(a.clone()))?;
            }
        }
        Ok(())
    }
}

impl Materialize for AssociateRoleRemote {
    type Draft = AssociateRoleDraft;

    fn materialize(draft: AssociateRoleDraft, id: String) -> ModelResult<Self> {
        Ok(Self {
            id,
            version: 1,
            key: draft.key,
            buyer_assignable: draft.buyer_assignable,
            name: draft.name,
            permissions: draft.permissions,
            custom: materialize_custom(draft.custom)?,
        })
    }
}
