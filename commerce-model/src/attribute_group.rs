//! Attribute groups: named sets of product attribute keys.

use crate::support::{changed, ensure_unique_keys, pinned_version, validate_localized, validate_localized_opt};
use crate::{
    ActionContext, Creatable, Identity, Materialize, ModelError, ModelResult, RemoteModel,
    RemoteObject, Resource, UpdatePlan,
};
use commerce_diff::{diff_sets, sort_by_plan};
use commerce_types::{Attr, LocalizedString};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttributeGroup {
    #[serde(flatten)]
    pub identity: Identity,
    #[serde(default)]
    pub key: Attr<String>,
    pub name: LocalizedString,
    #[serde(default)]
    pub description: Option<LocalizedString>,
    /// Product attribute names in the group.
    #[serde(default)]
    pub attributes: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttributeReference {
    pub key: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttributeGroupRemote {
    pub id: String,
    pub version: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
    pub name: LocalizedString,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<LocalizedString>,
    #[serde(default)]
    pub attributes: Vec<AttributeReference>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttributeGroupDraft {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
    pub name: LocalizedString,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<LocalizedString>,
    #[serde(default)]
    pub attributes: Vec<AttributeReference>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "camelCase")]
pub enum AttributeGroupAction {
    ChangeName {
        name: LocalizedString,
    },
    SetKey {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        key: Option<String>,
    },
    SetDescription {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        description: Option<LocalizedString>,
    },
    AddAttribute {
        attribute: AttributeReference,
    },
    RemoveAttribute {
        attribute: AttributeReference,
    },
}

impl Resource for AttributeGroup {
    const TYPE_NAME: &'static str = "commerce_attribute_group";
    const ENDPOINT: &'static str = "attribute-groups";

    type Remote = AttributeGroupRemote;
    type Action = AttributeGroupAction;

    fn identity(&self) -> &Identity {
        &self.identity
    }

    fn identity_mut(&mut self) -> &mut Identity {
        &mut self.identity
    }

    fn from_remote(remote: &AttributeGroupRemote) -> ModelResult<Self> {
        Ok(Self {
            identity: Identity::new(&remote.id, remote.version),
            key: remote.key.clone().into(),
            name: remote.name.clone(),
            description: remote.description.clone(),
            attributes: remote.attributes.iter().map(|a| a.key.clone()).collect(),
        })
    }

    fn update_actions(
        &self,
        desired: &Self,
        _ctx: &ActionContext,
    ) -> ModelResult<UpdatePlan<AttributeGroupAction>> {
        desired.validate()?;
        let mut actions = Vec::new();

        if self.name != desired.name {
            actions.push(AttributeGroupAction::ChangeName {
                name: desired.name.clone(),
            });
        }
        if changed(&self.key, &desired.key) {
            actions.push(AttributeGroupAction::SetKey {
                key: desired.key.to_option(),
            });
        }
        if self.description != desired.description {
            actions.push(AttributeGroupAction::SetDescription {
                description: desired.description.clone(),
            });
        }

        let diff = diff_sets(&self.attributes, &desired.attributes);
        for key in diff.added {
            actions.push(AttributeGroupAction::AddAttribute {
                attribute: AttributeReference { key: key.to_string() },
            });
        }
        for key in diff.removed {
            actions.push(AttributeGroupAction::RemoveAttribute {
                attribute: AttributeReference { key: key.to_string() },
            });
        }

        Ok(UpdatePlan::new(pinned_version(&self.identity.version)?, actions))
    }

    fn validate(&self) -> ModelResult<()> {
        validate_localized("name", &self.name)?;
        validate_localized_opt("description", self.description.as_ref())?;
        ensure_unique_keys("attributes", "attribute", self.attributes.iter().map(String::as_str))
    }

    fn align_with_plan(&mut self, plan: &Self) {
        let actual = std::mem::take(&mut self.attributes);
        self.attributes = sort_by_plan(plan.attributes.iter().map(String::as_str), actual);
    }
}

impl Creatable for AttributeGroup {
    type Draft = AttributeGroupDraft;

    fn draft(&self, _ctx: &ActionContext) -> ModelResult<AttributeGroupDraft> {
        self.validate()?;
        Ok(AttributeGroupDraft {
            key: self.key.to_option(),
            name: self.name.clone(),
            description: self.description.clone(),
            attributes: self
                .attributes
                .iter()
                .map(|key| AttributeReference { key: key.clone() })
                .collect(),
        })
    }
}

impl RemoteObject for AttributeGroupRemote {
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

impl RemoteModel for AttributeGroupRemote {
    type Action = AttributeGroupAction;

    fn apply_action(&mut self, action: &AttributeGroupAction) -> ModelResult<()> {
        match action {
            AttributeGroupAction::ChangeName { name } => self.name = name.clone(),
            AttributeGroupAction::SetKey { key } => self.key = key.clone(),
            AttributeGroupAction::SetDescription { description } => {
                self.description = description.clone();
            }
            AttributeGroupAction::AddAttribute { attribute } => {
                if self.attributes.contains(attribute) {
                    return Err(ModelError::invalid_input(
                        "attributes",
                        format!("attribute '{}' is already in the group", attribute.key),
                    ));
                }
                self.attributes.push(attribute.clone());
            }
            AttributeGroupAction::RemoveAttribute { attribute } => {
                let before = self.attributes.len();
                self.attributes.retain(|a| a != attribute);
                if self.attributes.len() == before {
                    return Err(ModelError::invalid_input(
                        "attributes",
                        format!("attribute '{}' is not in the group", attribute.key),
                    ));
                }
            }
        }
        Ok(())
    }
}

impl Materialize for AttributeGroupRemote {
    type Draft = AttributeGroupDraft;

    fn materialize(draft: AttributeGroupDraft, id: String) -> ModelResult<Self> {
        Ok(Self {
            id,
            version: 1,
            key: draft.key,
            name: draft.name,
            description: draft.description,
            attributes: draft.attributes,
        })
    }
}
