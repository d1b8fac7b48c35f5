//! The resource trait family.
//!
//! Every resource kind has three representations:
//! - the record (`Self`): configured and stored state, built from [`Attr`]
//!   scalars so that plan-time unknowns survive into diffing
//! - the remote object (`Self::Remote`): what the commerce API returns
//! - the draft (`Creatable::Draft`): what the commerce API accepts on create
//!
//! [`Resource::from_remote`] maps remote to record, [`Creatable::draft`] maps
//! record to draft and [`Resource::update_actions`] maps a pair of records to
//! an ordered list of update actions.

use crate::{ModelResult, TypeDefinition};
use commerce_types::Attr;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt::Debug;

/// Server-computed identity shared by every record.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Identity {
    #[serde(default)]
    pub id: Attr<String>,
    #[serde(default)]
    pub version: Attr<i64>,
}

impl Identity {
    #[must_use]
    pub fn new(id: impl Into<String>, version: i64) -> Self {
        Self {
            id: Attr::known(id.into()),
            version: Attr::known(version),
        }
    }

    /// Both fields unknown, as planned for a resource that does not exist yet.
    #[must_use]
    pub fn unknown() -> Self {
        Self {
            id: Attr::Unknown,
            version: Attr::Unknown,
        }
    }
}

/// Update actions pinned to the version they were built against.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpdatePlan<A> {
    pub version: i64,
    pub actions: Vec<A>,
}

impl<A> UpdatePlan<A> {
    #[must_use]
    pub fn new(version: i64, actions: Vec<A>) -> Self {
        Self { version, actions }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }
}

/// Lookup data needed while building drafts and actions.
///
/// Custom-field values are encoded according to their type definition, so
/// the engine fetches every type a record refers to before building.
#[derive(Debug, Clone, Default)]
pub struct ActionContext {
    types: HashMap<String, TypeDefinition>,
}

impl ActionContext {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a type definition, builder style.
    #[must_use]
    pub fn with_type(mut self, def: TypeDefinition) -> Self {
        self.insert_type(def);
        self
    }

    pub fn insert_type(&mut self, def: TypeDefinition) {
        self.types.insert(def.id.clone(), def);
    }

    #[must_use]
    pub fn type_definition(&self, id: &str) -> Option<&TypeDefinition> {
        self.types.get(id)
    }

    #[must_use]
    pub fn has_type(&self, id: &str) -> bool {
        self.types.contains_key(id)
    }
}

/// A remote object as returned by the commerce API.
pub trait RemoteObject: Debug + Clone + Serialize + DeserializeOwned + Send + Sync + 'static {
    fn id(&self) -> &str;
    fn version(&self) -> i64;
    fn set_version(&mut self, version: i64);
}

/// A resource kind managed by the provider.
pub trait Resource:
    Debug + Clone + PartialEq + Serialize + DeserializeOwned + Send + Sync + 'static
{
    /// Name the host uses for this kind.
    const TYPE_NAME: &'static str;
    /// Collection path on the commerce API.
    const ENDPOINT: &'static str;
    /// Version of the persisted state layout.
    const SCHEMA_VERSION: u64 = 0;
    /// Whether writes must hold the per-id lock and re-read the version first.
    ///
    /// Set for kinds whose remote object is also written by a sibling kind.
    const LOCKED: bool = false;

    type Remote: RemoteObject;
    type Action: Debug + Clone + PartialEq + Serialize + DeserializeOwned + Send + Sync;

    fn identity(&self) -> &Identity;
    fn identity_mut(&mut self) -> &mut Identity;

    /// Builds a record from a remote object.
    ///
    /// Fails only when the remote object has a shape this kind cannot hold.
    fn from_remote(remote: &Self::Remote) -> ModelResult<Self>;

    /// Builds the ordered action list that turns `self` into `desired`.
    fn update_actions(
        &self,
        desired: &Self,
        ctx: &ActionContext,
    ) -> ModelResult<UpdatePlan<Self::Action>>;

    /// Checks configured values that the remote would reject.
    fn validate(&self) -> ModelResult<()> {
        Ok(())
    }

    /// Custom-field types this record refers to.
    fn custom_type_ids(&self) -> Vec<String> {
        Vec::new()
    }

    /// Adjusts a freshly read record towards the planned one where the
    /// difference carries no meaning, e.g. collection order.
    fn align_with_plan(&mut self, _plan: &Self) {}

    /// Copies write-only values the remote masks from the prior record.
    fn carry_secrets(&mut self, _prior: &Self) {}

    /// Fills computed fields of a planned record from the prior state.
    fn modify_plan(&mut self, prior: Option<&Self>) {
        *self.identity_mut() = match prior {
            Some(p) => p.identity().clone(),
            None => Identity::unknown(),
        };
    }

    /// API path of a single object of this kind.
    fn resource_path(id: &str) -> String {
        format!("{}/{}", Self::ENDPOINT, id)
    }

    fn id(&self) -> Option<&str> {
        self.identity().id.as_deref()
    }

    fn version(&self) -> Option<i64> {
        self.identity().version.as_known().copied()
    }
}

/// A resource created with a draft.
pub trait Creatable: Resource {
    type Draft: Debug + Clone + Serialize + DeserializeOwned + Send + Sync;

    fn draft(&self, ctx: &ActionContext) -> ModelResult<Self::Draft>;
}

/// A resource that configures an existing remote object instead of creating one.
///
/// Create applies the diff against the object as read; delete sends
/// [`Attached::detach_actions`] and forgets the record.
pub trait Attached: Resource {
    /// Id of the remote object this record configures.
    fn target_id(&self) -> String;

    /// Actions that undo this record's effect on delete.
    fn detach_actions(&self) -> Vec<Self::Action> {
        Vec::new()
    }
}

/// Server-side semantics of update actions.
///
/// Used by the in-memory commerce API and by tests asserting that applying
/// the actions built for `(current, desired)` to `current` yields `desired`.
pub trait RemoteModel: RemoteObject {
    type Action: DeserializeOwned;

    fn apply_action(&mut self, action: &Self::Action) -> ModelResult<()>;

    /// Replaces write-only values with the placeholder the remote returns.
    fn mask_secrets(&mut self) {}
}

/// Server-side semantics of create.
pub trait Materialize: RemoteModel {
    type Draft: DeserializeOwned;

    fn materialize(draft: Self::Draft, id: String) -> ModelResult<Self>;
}

/// Placeholder the remote returns instead of write-only values.
pub const MASKED: &str = "****";
