//! Workflow states and the transitions between them.
//!
//! Transitions live on the state object but are managed by a separate kind,
//! [`StateTransitions`], so a state's version advances underneath the
//! [`State`] record whenever its transitions are written. Both kinds are
//! therefore locked and re-read their version before every write.
//!
//! `initial` is special: the remote always returns a boolean, but a record
//! configured without one stores null rather than `false`. Diffing treats
//! null as `false`.

use crate::custom_fields::reference_from_identifier;
use crate::support::{ensure_unchanged, ensure_unique_keys, pinned_version, validate_localized_opt};
use crate::{
    ActionContext, Attached, Creatable, Identity, Materialize, ModelResult, RemoteModel,
    RemoteObject, Resource, UpdatePlan,
};
use commerce_diff::{same_members, sort_by_plan, Keyed};
use commerce_types::{Attr, LocalizedString, Reference, ResourceIdentifier};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StateType {
    OrderState,
    LineItemState,
    ProductState,
    ReviewState,
    PaymentState,
    QuoteRequestState,
    StagedQuoteState,
    QuoteState,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StateRole {
    ReviewIncludedInStatistics,
    Return,
}

impl StateRole {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            StateRole::ReviewIncludedInStatistics => "ReviewIncludedInStatistics",
            StateRole::Return => "Return",
        }
    }
}

impl AsRef<str> for StateRole {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl Keyed for StateRole {
    fn key(&self) -> &str {
        self.as_str()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct State {
    #[serde(flatten)]
    pub identity: Identity,
    pub key: String,
    #[serde(rename = "type")]
    pub state_type: StateType,
    #[serde(default)]
    pub name: Option<LocalizedString>,
    #[serde(default)]
    pub description: Option<LocalizedString>,
    #[serde(default)]
    pub initial: Attr<bool>,
    #[serde(default)]
    pub roles: Vec<StateRole>,
}

impl State {
    pub fn new(key: impl Into<String>, state_type: StateType) -> Self {
        Self {
            identity: Identity::default(),
            key: key.into(),
            state_type,
            name: None,
            description: None,
            initial: Attr::Null,
            roles: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StateRemote {
    pub id: String,
    pub version: i64,
    pub key: String,
    #[serde(rename = "type")]
    pub state_type: StateType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<LocalizedString>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<LocalizedString>,
    pub initial: bool,
    #[serde(default)]
    pub roles: Vec<StateRole>,
    /// Absent allows every transition.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transitions: Option<Vec<Reference>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StateDraft {
    pub key: String,
    #[serde(rename = "type")]
    pub state_type: StateType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<LocalizedString>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<LocalizedString>,
    pub initial: bool,
    #[serde(default)]
    pub roles: Vec<StateRole>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "camelCase")]
pub enum StateAction {
    ChangeKey {
        key: String,
    },
    ChangeType {
        #[serde(rename = "type")]
        state_type: StateType,
    },
    SetName {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        name: Option<LocalizedString>,
    },
    SetDescription {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        description: Option<LocalizedString>,
    },
    ChangeInitial {
        initial: bool,
    },
    SetRoles {
        roles: Vec<StateRole>,
    },
    SetTransitions {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        transitions: Option<Vec<ResourceIdentifier>>,
    },
}

impl Resource for State {
    const TYPE_NAME: &'static str = "commerce_state";
    const ENDPOINT: &'static str = "states";
    const LOCKED: bool = true;

    type Remote = StateRemote;
    type Action = StateAction;

    fn identity(&self) -> &Identity {
        &self.identity
    }

    fn identity_mut(&mut self) -> &mut Identity {
        &mut self.identity
    }

    fn from_remote(remote: &StateRemote) -> ModelResult<Self> {
        Ok(Self {
            identity: Identity::new(&remote.id, remote.version),
            key: remote.key.clone(),
            state_type: remote.state_type,
            name: remote.name.clone(),
            description: remote.description.clone(),
            initial: Attr::known(remote.initial),
            roles: remote.roles.clone(),
        })
    }

    fn update_actions(&self, desired: &Self, _ctx: &ActionContext) -> ModelResult<UpdatePlan<StateAction>> {
        desired.validate()?;

        let mut actions = Vec::new();
        if self.key != desired.key {
            actions.push(StateAction::ChangeKey {
                key: desired.key.clone(),
            });
        }
        if self.state_type != desired.state_type {
            actions.push(StateAction::ChangeType {
                state_type: desired.state_type,
            });
        }
        if self.name != desired.name {
            actions.push(StateAction::SetName {
                name: desired.name.clone(),
            });
        }
        if self.description != desired.description {
            actions.push(StateAction::SetDescription {
                description: desired.description.clone(),
            });
        }
        let initial = desired.initial.get_or(false);
        if !desired.initial.is_unknown() && self.initial.get_or(false) != initial {
            actions.push(StateAction::ChangeInitial { initial });
        }
        if !same_members(&self.roles, &desired.roles) {
            actions.push(StateAction::SetRoles {
                roles: desired.roles.clone(),
            });
        }
        Ok(UpdatePlan::new(pinned_version(&self.identity.version)?, actions))
    }

    fn validate(&self) -> ModelResult<()> {
        validate_localized_opt("name", self.name.as_ref())?;
        validate_localized_opt("description", self.description.as_ref())?;
        ensure_unique_keys("roles", "role", self.roles.iter().map(StateRole::as_str))
    }

    fn align_with_plan(&mut self, plan: &Self) {
        if plan.initial.is_null() && self.initial == Attr::known(false) {
            self.initial = Attr::Null;
        }
        let roles = std::mem::take(&mut self.roles);
        self.roles = sort_by_plan(plan.roles.iter().map(StateRole::as_str), roles);
    }
}

impl Creatable for State {
    type Draft = StateDraft;

    fn draft(&self, _ctx: &ActionContext) -> ModelResult<StateDraft> {
        self.validate()?;
        Ok(StateDraft {
            key: self.key.clone(),
            state_type: self.state_type,
            name: self.name.clone(),
            description: self.description.clone(),
            initial: self.initial.get_or(false),
            roles: self.roles.clone(),
        })
    }
}

impl RemoteObject for StateRemote {
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

impl RemoteModel for StateRemote {
    type Action = StateAction;

    fn apply_action(&mut self, action: &StateAction) -> ModelResult<()> {
        match action {
            StateAction::ChangeKey { key } => self.key = key.clone(),
            StateAction::ChangeType { state_type } => self.state_type = *state_type,
            StateAction::SetName { name } => self.name = name.clone(),
            StateAction::SetDescription { description } => self.description = description.clone(),
            StateAction::ChangeInitial { initial } => self.initial = *initial,
            StateAction::SetRoles { roles } => self.roles = roles.clone(),
            StateAction::SetTransitions { transitions } => {
                self.transitions = transitions
                    .as_ref()
                    .map(|t| t.iter().map(reference_from_identifier).collect::<ModelResult<Vec<_>>>())
                    .transpose()?;
            }
        }
        Ok(())
    }
}

impl Materialize for StateRemote {
    type Draft = StateDraft;

    fn materialize(draft: StateDraft, id: String) -> ModelResult<Self> {
        Ok(Self {
            id,
            version: 1,
            key: draft.key,
            state_type: draft.state_type,
            name: draft.name,
            description: draft.description,
            initial: draft.initial,
            roles: draft.roles,
            transitions: None,
        })
    }
}

// ── Transitions ──────────────────────────────────────────────────

/// The allowed successors of one state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StateTransitions {
    #[serde(flatten)]
    pub identity: Identity,
    /// Id of the state the transitions start from.
    pub from: String,
    /// Ids of the states reachable from `from`.
    #[serde(default)]
    pub to: Vec<String>,
}

impl StateTransitions {
    pub fn new<I, S>(from: impl Into<String>, to: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            identity: Identity::default(),
            from: from.into(),
            to: to.into_iter().map(Into::into).collect(),
        }
    }

    fn identifiers(&self) -> Vec<ResourceIdentifier> {
        self.to
            .iter()
            .map(|id| ResourceIdentifier::by_id("state", id))
            .collect()
    }
}

impl Resource for StateTransitions {
    const TYPE_NAME: &'static str = "commerce_state_transitions";
    const ENDPOINT: &'static str = "states";
    const LOCKED: bool = true;

    type Remote = StateRemote;
    type Action = StateAction;

    fn identity(&self) -> &Identity {
        &self.identity
    }

    fn identity_mut(&mut self) -> &mut Identity {
        &mut self.identity
    }

    fn from_remote(remote: &StateRemote) -> ModelResult<Self> {
        Ok(Self {
            identity: Identity::new(&remote.id, remote.version),
            from: remote.id.clone(),
            to: remote
                .transitions
                .iter()
                .flatten()
                .map(|r| r.id.clone())
                .collect(),
        })
    }

    fn update_actions(&self, desired: &Self, _ctx: &ActionContext) -> ModelResult<UpdatePlan<StateAction>> {
        ensure_unchanged("from", &self.from, &desired.from)?;
        desired.validate()?;

        let mut actions = Vec::new();
        if !same_members(&self.to, &desired.to) {
            actions.push(StateAction::SetTransitions {
                transitions: Some(desired.identifiers()),
            });
        }
        Ok(UpdatePlan::new(pinned_version(&self.identity.version)?, actions))
    }

    fn validate(&self) -> ModelResult<()> {
        ensure_unique_keys("to", "state", self.to.iter().map(String::as_str))
    }

    fn align_with_plan(&mut self, plan: &Self) {
        let to = std::mem::take(&mut self.to);
        self.to = sort_by_plan(plan.to.iter().map(String::as_str), to);
    }
}

impl Attached for StateTransitions {
    fn target_id(&self) -> String {
        self.from.clone()
    }

    fn detach_actions(&self) -> Vec<StateAction> {
        vec![StateAction::SetTransitions { transitions: None }]
    }
}
