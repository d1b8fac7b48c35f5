//! JSON-level dispatch of resource lifecycles.
//!
//! The host hands over configuration and stored state as JSON; every call
//! decodes into the kind's record type, runs the reconciler and encodes
//! the result. Stored state always leaves at the kind's current schema
//! version, and stored state that arrives at an older version is upgraded
//! before use.

use crate::kind::dispatch;
use crate::schema::ResourceSchema;
use crate::{ProviderConfig, ProviderError, ProviderResult, ResourceKind};
use commerce_client::{CommerceApi, HttpClient};
use commerce_engine::{CancellationToken, EngineConfig, EngineError, Reconciler};
use commerce_model::Resource;
use commerce_state::PersistedState;
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, info};

/// A configured provider.
#[derive(Clone)]
pub struct Provider {
    reconciler: Reconciler,
}

impl Provider {
    /// Connects to the configured project.
    pub fn configure(config: &ProviderConfig) -> ProviderResult<Self> {
        config
            .client
            .validate()
            .map_err(|e| ProviderError::Config(e.to_string()))?;
        let api = HttpClient::new(&config.client)?;
        info!(project = %config.client.project_key, "provider configured");
        Ok(Self::with_api(Arc::new(api), config.engine.clone()))
    }

    /// Uses `api` instead of the HTTP client.
    pub fn with_api(api: Arc<dyn CommerceApi>, engine: EngineConfig) -> Self {
        Self {
            reconciler: Reconciler::new(api, engine),
        }
    }

    pub fn reconciler(&self) -> &Reconciler {
        &self.reconciler
    }

    pub fn metadata(kind: ResourceKind) -> &'static str {
        kind.type_name()
    }

    pub fn schema(kind: ResourceKind) -> ResourceSchema {
        kind.schema()
    }

    pub fn schemas() -> Vec<ResourceSchema> {
        ResourceKind::ALL.into_iter().map(ResourceKind::schema).collect()
    }

    // ── Lifecycle ────────────────────────────────────────────────

    /// Validates `config` and fills its computed attributes from `prior`.
    pub fn plan(&self, kind: ResourceKind, config: Value, prior: Option<&PersistedState>) -> ProviderResult<Value> {
        dispatch!(kind, |R| self.plan_as::<R>(config, prior))
    }

    pub async fn create(
        &self,
        kind: ResourceKind,
        planned: Value,
        cancel: &CancellationToken,
    ) -> ProviderResult<PersistedState> {
        dispatch!(kind, |R|
            created => {
                let planned: R = decode(planned)?;
                store(&self.reconciler.create(&planned, cancel).await?)
            },
            attached => {
                let planned: R = decode(planned)?;
                store(&self.reconciler.attach(&planned, cancel).await?)
            },
        )
    }

    /// Refreshes stored state; `None` means the resource is gone.
    pub async fn read(
        &self,
        kind: ResourceKind,
        state: &PersistedState,
        cancel: &CancellationToken,
    ) -> ProviderResult<Option<PersistedState>> {
        dispatch!(kind, |R| {
            let prior: R = load(state)?;
            match self.reconciler.read(&prior, cancel).await? {
                Some(record) => Ok(Some(store(&record)?)),
                None => Ok(None),
            }
        })
    }

    pub async fn update(
        &self,
        kind: ResourceKind,
        prior: &PersistedState,
        planned: Value,
        cancel: &CancellationToken,
    ) -> ProviderResult<PersistedState> {
        dispatch!(kind, |R| {
            let prior: R = load(prior)?;
            let planned: R = decode(planned)?;
            store(&self.reconciler.update(&prior, &planned, cancel).await?)
        })
    }

    pub async fn delete(&self, kind: ResourceKind, prior: &PersistedState, cancel: &CancellationToken) -> ProviderResult<()> {
        dispatch!(kind, |R|
            created => {
                let prior: R = load(prior)?;
                Ok(self.reconciler.delete(&prior, cancel).await?)
            },
            attached => {
                let prior: R = load(prior)?;
                Ok(self.reconciler.detach(&prior, cancel).await?)
            },
        )
    }

    /// Creates stored state for an existing object.
    pub async fn import_state(
        &self,
        kind: ResourceKind,
        id: &str,
        cancel: &CancellationToken,
    ) -> ProviderResult<PersistedState> {
        dispatch!(kind, |R| {
            let record: R = self.reconciler.import(id, cancel).await?;
            store(&record)
        })
    }

    /// Rewrites stored state to the kind's current schema version.
    pub fn upgrade_state(&self, kind: ResourceKind, state: PersistedState) -> ProviderResult<PersistedState> {
        Ok(commerce_state::upgrade(kind.type_name(), state)?)
    }

    /// Creates the resource when there is no prior state, otherwise updates it.
    pub async fn apply(
        &self,
        kind: ResourceKind,
        config: Value,
        prior: Option<&PersistedState>,
        cancel: &CancellationToken,
    ) -> ProviderResult<PersistedState> {
        let prior = prior.filter(|p| !p.is_empty());
        let planned = self.plan(kind, config, prior)?;
        match prior {
            Some(prior) => self.update(kind, prior, planned, cancel).await,
            None => self.create(kind, planned, cancel).await,
        }
    }

    fn plan_as<R: Resource>(&self, config: Value, prior: Option<&PersistedState>) -> ProviderResult<Value> {
        let planned: R = decode(config)?;
        let prior: Option<R> = prior.map(load).transpose()?;
        let planned = self.reconciler.plan(planned, prior.as_ref())?;
        debug!(resource = R::TYPE_NAME, "planned");
        encode(&planned)
    }
}

/// Decodes stored state, upgrading it first when it is older.
fn load<R: Resource>(state: &PersistedState) -> ProviderResult<R> {
    let state = commerce_state::upgrade(R::TYPE_NAME, state.clone())?;
    Ok(state.to_record::<R>()?)
}

fn store<R: Resource>(record: &R) -> ProviderResult<PersistedState> {
    Ok(PersistedState::from_record(record)?)
}

fn decode<R: Resource>(value: Value) -> ProviderResult<R> {
    serde_json::from_value(value).map_err(|source| ProviderError::Decode {
        kind: R::TYPE_NAME,
        source,
    })
}

fn encode<R: Resource>(record: &R) -> ProviderResult<Value> {
    serde_json::to_value(record)
        .map_err(|e| ProviderError::Engine(EngineError::Internal(format!("cannot encode {}: {e}", R::TYPE_NAME))))
}

