//! Per-resource CRUD orchestration.
//!
//! Every operation follows the same template: build the request from the
//! records, send it under a time-bounded retry, decode the returned object
//! and post-process it against the record it came from. Post-processing is
//! [`Resource::align_with_plan`] followed by [`Resource::carry_secrets`].
//!
//! Kinds with [`Resource::LOCKED`] set hold the per-id mutex for the whole
//! read-modify-write window and rebuild their actions against a fresh read
//! on every attempt, so writes by a sibling kind never leave them pinned to
//! a stale version. Other kinds build the first attempt from stored state
//! and re-read the remote object before every retry.

use crate::locks::LockMap;
use crate::retry::RetryPolicy;
use crate::{EngineConfig, EngineError, EngineResult};
use commerce_client::CommerceApi;
use commerce_model::{ActionContext, Attached, Creatable, RemoteObject, Resource, TypeDefinition};
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeSet;
use std::sync::Arc;
use tokio::sync::OwnedMutexGuard;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

const TYPES_ENDPOINT: &str = "types";

/// Drives resource lifecycles against a [`CommerceApi`].
///
/// Cheap to clone; clones share the API handle and the lock map.
#[derive(Clone)]
pub struct Reconciler {
    api: Arc<dyn CommerceApi>,
    locks: Arc<LockMap>,
    config: EngineConfig,
}

impl Reconciler {
    pub fn new(api: Arc<dyn CommerceApi>, config: EngineConfig) -> Self {
        let locks = Arc::new(LockMap::new(config.lock_stripes));
        Self::with_locks(api, locks, config)
    }

    /// Creates a reconciler sharing an existing lock map.
    pub fn with_locks(api: Arc<dyn CommerceApi>, locks: Arc<LockMap>, config: EngineConfig) -> Self {
        Self { api, locks, config }
    }

    pub fn api(&self) -> &Arc<dyn CommerceApi> {
        &self.api
    }

    pub fn locks(&self) -> &Arc<LockMap> {
        &self.locks
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    // ── Plan ─────────────────────────────────────────────────────

    /// Validates a planned record and fills its computed fields from the
    /// prior state.
    pub fn plan<R: Resource>(&self, mut planned: R, prior: Option<&R>) -> EngineResult<R> {
        planned.validate()?;
        planned.modify_plan(prior);
        Ok(planned)
    }

    // ── Create ───────────────────────────────────────────────────

    /// Creates the remote object for `planned` and returns the stored record.
    pub async fn create<R: Creatable>(&self, planned: &R, cancel: &CancellationToken) -> EngineResult<R> {
        planned.validate()?;
        let ctx = self.context(&[planned], cancel).await?;
        let draft = encode(&planned.draft(&ctx)?)?;

        let api = self.api.as_ref();
        let policy = RetryPolicy::for_create(&self.config);
        let value = policy
            .run(R::TYPE_NAME, cancel, || {
                let draft = draft.clone();
                async move { api.create(R::ENDPOINT, draft).await.map_err(EngineError::from) }
            })
            .await?;

        let stored = settle(&decode::<R::Remote>(value)?, planned)?;
        info!(resource = R::TYPE_NAME, id = stored.id(), version = stored.version(), "created");
        Ok(stored)
    }

    /// Creates an attached record by applying its diff to the object it
    /// configures.
    pub async fn attach<R: Attached>(&self, planned: &R, cancel: &CancellationToken) -> EngineResult<R> {
        planned.validate()?;
        let target = planned.target_id();
        let ctx = self.context(&[planned], cancel).await?;
        let _guard = self.guard::<R>(&target).await;

        let (target, ctx) = (target.as_str(), &ctx);
        let policy = RetryPolicy::for_create(&self.config);
        let remote = policy
            .run(R::TYPE_NAME, cancel, || self.attach_once(target, planned, ctx))
            .await?;

        let stored = settle(&remote, planned)?;
        info!(resource = R::TYPE_NAME, id = target, version = stored.version(), "attached");
        Ok(stored)
    }

    async fn attach_once<R: Attached>(&self, target: &str, planned: &R, ctx: &ActionContext) -> EngineResult<R::Remote> {
        let remote = self.get_remote::<R>(target).await?;
        let mut current = R::from_remote(&remote)?;
        current.align_with_plan(planned);
        current.carry_secrets(planned);
        self.apply_diff(target, &current, planned, ctx, remote).await
    }

    // ── Read ─────────────────────────────────────────────────────

    /// Refreshes a stored record; `None` when the remote object is gone.
    pub async fn read<R: Resource>(&self, prior: &R, cancel: &CancellationToken) -> EngineResult<Option<R>> {
        let id = stored_id(prior)?;
        match self.fetch::<R>(&id, cancel).await {
            Ok(remote) => Ok(Some(settle(&remote, prior)?)),
            Err(e) if e.is_not_found() => {
                info!(resource = R::TYPE_NAME, id = %id, "remote object is gone, dropping it from state");
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    /// Reads an existing remote object into a new stored record.
    pub async fn import<R: Resource>(&self, id: &str, cancel: &CancellationToken) -> EngineResult<R> {
        let remote = self.fetch::<R>(id, cancel).await?;
        let record = R::from_remote(&remote)?;
        info!(resource = R::TYPE_NAME, id, version = record.version(), "imported");
        Ok(record)
    }

    // ── Update ───────────────────────────────────────────────────

    /// Sends the actions turning `prior` into `planned` and returns the
    /// stored record.
    pub async fn update<R: Resource>(&self, prior: &R, planned: &R, cancel: &CancellationToken) -> EngineResult<R> {
        planned.validate()?;
        let id = stored_id(prior)?;
        let ctx = self.context(&[prior, planned], cancel).await?;
        let _guard = self.guard::<R>(&id).await;

        let (id, ctx) = (id.as_str(), &ctx);
        let policy = RetryPolicy::for_update(&self.config);
        let mut retrying = false;
        let remote = policy
            .run(R::TYPE_NAME, cancel, || {
                let reread = std::mem::replace(&mut retrying, true);
                self.update_once(id, prior, planned, ctx, reread)
            })
            .await?;

        let stored = settle(&remote, planned)?;
        info!(resource = R::TYPE_NAME, id, version = stored.version(), "updated");
        Ok(stored)
    }

    async fn update_once<R: Resource>(
        &self,
        id: &str,
        prior: &R,
        planned: &R,
        ctx: &ActionContext,
        reread: bool,
    ) -> EngineResult<R::Remote> {
        if !R::LOCKED && !reread {
            let plan = prior.update_actions(planned, ctx)?;
            if plan.is_empty() {
                debug!(resource = R::TYPE_NAME, id, "no changes");
                return self.get_remote::<R>(id).await;
            }
            return self.send::<R>(id, plan.version, &plan.actions).await;
        }

        let remote = self.get_remote::<R>(id).await?;
        let mut current = R::from_remote(&remote)?;
        current.align_with_plan(prior);
        current.carry_secrets(prior);
        self.apply_diff(id, &current, planned, ctx, remote).await
    }

    // ── Delete ───────────────────────────────────────────────────

    /// Deletes the remote object; an object that is already gone counts as
    /// deleted.
    pub async fn delete<R: Creatable>(&self, prior: &R, cancel: &CancellationToken) -> EngineResult<()> {
        let id = stored_id(prior)?;
        let _guard = self.guard::<R>(&id).await;

        let id = id.as_str();
        let policy = RetryPolicy::for_delete(&self.config);
        let mut retrying = false;
        let result = policy
            .run(R::TYPE_NAME, cancel, || {
                let reread = std::mem::replace(&mut retrying, true);
                self.delete_once(id, prior, reread)
            })
            .await;
        match result {
            Ok(()) => {
                info!(resource = R::TYPE_NAME, id, "deleted");
                Ok(())
            }
            Err(e) if e.is_not_found() => {
                debug!(resource = R::TYPE_NAME, id, "already deleted");
                Ok(())
            }
            Err(e) => Err(e),
        }
    }

    async fn delete_once<R: Creatable>(&self, id: &str, prior: &R, reread: bool) -> EngineResult<()> {
        let version = if R::LOCKED || reread {
            self.get_remote::<R>(id).await?.version()
        } else {
            stored_version(prior)?
        };
        self.api.delete(&R::resource_path(id), version).await?;
        Ok(())
    }

    /// Undoes an attached record's effect and forgets it.
    pub async fn detach<R: Attached>(&self, prior: &R, cancel: &CancellationToken) -> EngineResult<()> {
        let actions = prior.detach_actions();
        if actions.is_empty() {
            debug!(resource = R::TYPE_NAME, "nothing to undo on the remote");
            return Ok(());
        }
        let target = prior.target_id();
        let _guard = self.guard::<R>(&target).await;

        let (target, actions) = (target.as_str(), actions.as_slice());
        let policy = RetryPolicy::for_delete(&self.config);
        let result = policy
            .run(R::TYPE_NAME, cancel, || self.detach_once::<R>(target, actions))
            .await;
        match result {
            Ok(_) => {
                info!(resource = R::TYPE_NAME, id = target, "detached");
                Ok(())
            }
            Err(e) if e.is_not_found() => Ok(()),
            Err(e) => Err(e),
        }
    }

    async fn detach_once<R: Attached>(&self, target: &str, actions: &[R::Action]) -> EngineResult<R::Remote> {
        let version = self.get_remote::<R>(target).await?.version();
        self.send::<R>(target, version, actions).await
    }

    // ── Helpers ──────────────────────────────────────────────────

    /// Diffs `current` against `planned` and sends the result, or returns
    /// `remote` unchanged when there is nothing to do.
    async fn apply_diff<R: Resource>(
        &self,
        id: &str,
        current: &R,
        planned: &R,
        ctx: &ActionContext,
        remote: R::Remote,
    ) -> EngineResult<R::Remote> {
        let plan = current.update_actions(planned, ctx)?;
        if plan.is_empty() {
            debug!(resource = R::TYPE_NAME, id, "no changes");
            return Ok(remote);
        }
        self.send::<R>(id, plan.version, &plan.actions).await
    }

    async fn send<R: Resource>(&self, id: &str, version: i64, actions: &[R::Action]) -> EngineResult<R::Remote> {
        debug!(resource = R::TYPE_NAME, id, version, actions = actions.len(), "sending update");
        let value = self.api.update(&R::resource_path(id), version, encode(actions)?).await?;
        decode(value)
    }

    async fn get_remote<R: Resource>(&self, id: &str) -> EngineResult<R::Remote> {
        decode(self.api.get(&R::resource_path(id)).await?)
    }

    async fn fetch<R: Resource>(&self, id: &str, cancel: &CancellationToken) -> EngineResult<R::Remote> {
        RetryPolicy::for_update(&self.config)
            .run(R::TYPE_NAME, cancel, || self.get_remote::<R>(id))
            .await
    }

    async fn guard<R: Resource>(&self, id: &str) -> Option<OwnedMutexGuard<()>> {
        if R::LOCKED {
            Some(self.locks.lock(id).await)
        } else {
            None
        }
    }

    /// Fetches the custom-field types the records refer to. Missing types
    /// are left out; building a draft or action against them then fails
    /// with an invalid reference.
    async fn context<R: Resource>(&self, records: &[&R], cancel: &CancellationToken) -> EngineResult<ActionContext> {
        let ids: BTreeSet<String> = records.iter().flat_map(|r| r.custom_type_ids()).collect();
        let mut ctx = ActionContext::new();
        let policy = RetryPolicy::for_update(&self.config);
        for id in ids {
            let path = format!("{TYPES_ENDPOINT}/{id}");
            let path = path.as_str();
            let api = self.api.as_ref();
            match policy.run("custom type", cancel, || async move {
                api.get(path).await.map_err(EngineError::from)
            }).await {
                Ok(value) => ctx.insert_type(decode::<TypeDefinition>(value)?),
                Err(e) if e.is_not_found() => debug!(type_id = %id, "custom type not found"),
                Err(e) => return Err(e),
            }
        }
        Ok(ctx)
    }
}

/// Builds the stored record from a remote object, post-processed against
/// the record that produced it.
fn settle<R: Resource>(remote: &R::Remote, reference: &R) -> EngineResult<R> {
    let mut record = R::from_remote(remote)?;
    record.align_with_plan(reference);
    record.carry_secrets(reference);
    Ok(record)
}

fn stored_id<R: Resource>(record: &R) -> EngineResult<String> {
    record
        .id()
        .map(str::to_string)
        .ok_or_else(|| EngineError::internal(format!("stored {} has no id", R::TYPE_NAME)))
}

fn stored_version<R: Resource>(record: &R) -> EngineResult<i64> {
    record
        .version()
        .ok_or_else(|| EngineError::internal(format!("stored {} has no version", R::TYPE_NAME)))
}

fn encode<T: Serialize + ?Sized>(value: &T) -> EngineResult<Value> {
    serde_json::to_value(value).map_err(|e| EngineError::internal(format!("cannot encode request: {e}")))
}

fn decode<T: serde::de::DeserializeOwned>(value: Value) -> EngineResult<T> {
    Ok(serde_json::from_value(value)?)
}
