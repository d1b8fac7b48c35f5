//! Product selections.

use crate::custom_fields::{
    apply_custom_action, custom_field_actions, custom_type_ids, draft_custom, materialize_custom,
};
use crate::support::{changed, ensure_unchanged, pinned_version, validate_localized};
use crate::{
    ActionContext, Creatable, CustomFieldAction, CustomFields, CustomFieldsDraft, Identity,
    Materialize, ModelResult, RemoteCustomFields, RemoteModel, RemoteObject, Resource,
    SetCustomField, SetCustomType, UpdatePlan,
};
use commerce_types::{Attr, LocalizedString};
use serde::{Deserialize, Serialize};

/// Whether listed products are included or excluded.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum SelectionMode {
    #[default]
    Individual,
    IndividualExclusion,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductSelection {
    #[serde(flatten)]
    pub identity: Identity,
    #[serde(default)]
    pub key: Attr<String>,
    pub name: LocalizedString,
    #[serde(default)]
    pub mode: SelectionMode,
    #[serde(default)]
    pub custom: Option<CustomFields>,
}

impl ProductSelection {
    pub fn new(name: LocalizedString) -> Self {
        Self {
            identity: Identity::default(),
            key: Attr::Null,
            name,
            mode: SelectionMode::default(),
            custom: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductSelectionRemote {
    pub id: String,
    pub version: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
    pub name: LocalizedString,
    pub mode: SelectionMode,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom: Option<RemoteCustomFields>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductSelectionDraft {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
    pub name: LocalizedString,
    pub mode: SelectionMode,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom: Option<CustomFieldsDraft>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "camelCase")]
pub enum ProductSelectionAction {
    SetKey {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        key: Option<String>,
    },
    ChangeName {
        name: LocalizedString,
    },
    SetCustomType(SetCustomType),
    SetCustomField(SetCustomField),
}

impl From<CustomFieldAction> for ProductSelectionAction {
    fn from(action: CustomFieldAction) -> Self {
        match action {
            CustomFieldAction::SetCustomType(a) => ProductSelectionAction::SetCustomType(a),
            CustomFieldAction::SetCustomField(a) => ProductSelectionAction::SetCustomField(a),
        }
    }
}

impl Resource for ProductSelection {
    const TYPE_NAME: &'static str = "commerce_product_selection";
    const ENDPOINT: &'static str = "product-selections";

    type Remote = ProductSelectionRemote;
    type Action = ProductSelectionAction;

    fn identity(&self) -> &Identity {
        &self.identity
    }

    fn identity_mut(&mut self) -> &mut Identity {
        &mut self.identity
    }

    fn from_remote(remote: &ProductSelectionRemote) -> ModelResult<Self> {
        Ok(Self {
            identity: Identity::new(&remote.id, remote.version),
            key: remote.key.clone().into(),
            name: remote.name.clone(),
            mode: remote.mode,
            custom: remote.custom.as_ref().map(CustomFields::from_remote),
        })
    }

    fn update_actions(
        &self,
        desired: &Self,
        ctx: &ActionContext,
    ) -> ModelResult<UpdatePlan<ProductSelectionAction>> {
        ensure_unchanged("mode", &self.mode, &desired.mode)?;
        desired.validate()?;

        let mut actions = Vec::new();
        if changed(&self.key, &desired.key) {
            actions.push(ProductSelectionAction::SetKey {
                key: desired.key.to_option(),
            });
        }
        if self.name != desired.name {
            actions.push(ProductSelectionAction::ChangeName {
                name: desired.name.clone(),
            });
        }
        actions.extend(
            custom_field_actions(self.custom.as_ref(), desired.custom.as_ref(), ctx)?
                .into_iter()
                .map(ProductSelectionAction::from),
        );
        Ok(UpdatePlan::new(pinned_version(&self.identity.version)?, actions))
    }

    fn validate(&self) -> ModelResult<()> {
        validate_localized("name", &self.name)
    }

    fn custom_type_ids(&self) -> Vec<String> {
        custom_type_ids(self.custom.as_ref())
    }
}

impl Creatable for ProductSelection {
    type Draft = ProductSelectionDraft;

    fn draft(&self, ctx: &ActionContext) -> ModelResult<ProductSelectionDraft> {
        self.validate()?;
        Ok(ProductSelectionDraft {
            key: self.key.to_option(),
            name: self.name.clone(),
            mode: self.mode,
            custom: draft_custom(self.custom.as_ref(), ctx)?,
        })
    }
}

impl RemoteObject for ProductSelectionRemote {
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

impl RemoteModel for ProductSelectionRemote {
    type Action = ProductSelectionAction;

    fn apply_action(&mut self, action: &ProductSelectionAction) -> ModelResult<()> {
        match action {
            ProductSelectionAction::SetKey { key } => self.key = key.clone(),
            ProductSelectionAction::ChangeName { name } => self.name = name.clone(),
            ProductSelectionAction::SetCustomType(a) => {
                apply_custom_action(&mut self.custom, &CustomFieldAction::SetCustomType(a.clone()))?;
            }
            ProductSelectionAction::SetCustomField(a) => {
                apply_custom_action(&mut self.custom, &CustomFieldAction::SetCustomField(a.clone()))?;
            }
        }
        Ok(())
    }
}

impl Materialize for ProductSelectionRemote {
    type Draft = ProductSelectionDraft;

    fn materialize(draft: ProductSelectionDraft, id: String) -> ModelResult<Self> {
        Ok(Self {
            id,
            version: 1,
            key: draft.key,
            name: draft.name,
            mode: draft.mode,
            custom: materialize_custom(draft.custom)?,
        })
    }
}
