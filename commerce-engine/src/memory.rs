//! An in-memory commerce API.
//!
//! Applies drafts and update actions with the same semantics as the remote,
//! so the reconciler can run without a project: for dry runs from the CLI
//! and for tests. Objects are stored unmasked; every response has its
//! write-only values masked the way the remote does.

use async_trait::async_trait;
use commerce_client::{ClientError, ClientResult, CommerceApi};
use commerce_model::{
    AssociateRoleRemote, AttributeGroupRemote, BusinessUnitRemote, Materialize, ModelError,
    ProductRemote, ProductSelectionRemote, ProjectRemote, RemoteModel, RemoteObject, StateRemote,
    SubscriptionRemote, TaxCategoryRemote, TypeDefinition,
};
use serde_json::Value;
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::{Mutex, RwLock};
use tracing::debug;
use uuid::Uuid;

const PROJECT_PATH: &str = "";
const TYPES_ENDPOINT: &str = "types";

/// Server-side handlers of one collection, erased over the remote type.
#[derive(Clone, Copy)]
struct Collection {
    materialize: fn(Value, String) -> ClientResult<Value>,
    apply: fn(&Value, &Value) -> ClientResult<Value>,
    mask: fn(&Value) -> ClientResult<Value>,
}

impl Collection {
    fn of<R: Materialize>() -> Self {
        Self {
            materialize: materialize::<R>,
            apply: apply::<R>,
            mask: mask::<R>,
        }
    }

    fn read_only<R: RemoteModel>() -> Self {
        Self {
            materialize: |_, _| Err(rejected("objects of this kind cannot be created")),
            apply: apply::<R>,
            mask: mask::<R>,
        }
    }

    fn fixed() -> Self {
        Self {
            materialize: |_, _| Err(rejected("objects of this kind cannot be created")),
            apply: |_, _| Err(rejected("objects of this kind cannot be updated")),
            mask: |object| Ok(object.clone()),
        }
    }
}

fn materialize<R: Materialize>(draft: Value, id: String) -> ClientResult<Value> {
    let draft: R::Draft = serde_json::from_value(draft).map_err(|e| rejected(format!("invalid draft: {e}")))?;
    let object = R::materialize(draft, id).map_err(model_rejected)?;
    Ok(serde_json::to_value(object)?)
}

fn apply<R: RemoteModel>(object: &Value, actions: &Value) -> ClientResult<Value> {
    let mut remote: R = serde_json::from_value(object.clone())?;
    let actions: Vec<R::Action> =
        serde_json::from_value(actions.clone()).map_err(|e| rejected(format!("invalid update action: {e}")))?;
    for action in &actions {
        remote.apply_action(action).map_err(model_rejected)?;
    }
    remote.set_version(remote.version() + 1);
    Ok(serde_json::to_value(remote)?)
}

fn mask<R: RemoteModel>(object: &Value) -> ClientResult<Value> {
    let mut remote: R = serde_json::from_value(object.clone())?;
    remote.mask_secrets();
    Ok(serde_json::to_value(remote)?)
}

fn rejected(message: impl Into<String>) -> ClientError {
    let message = message.into();
    ClientError::Api {
        status: 400,
        detailed: Some(message.clone()),
        message,
    }
}

fn model_rejected(err: ModelError) -> ClientError {
    rejected(err.to_string())
}

fn version_conflict(path: &str, expected: i64, actual: i64) -> ClientError {
    ClientError::Api {
        status: 409,
        message: format!("Object {path} has a different version than expected. Expected: {expected} - Actual: {actual}."),
        detailed: None,
    }
}

fn split_path(path: &str) -> (&str, &str) {
    path.split_once('/').unwrap_or((path, ""))
}

/// The in-memory commerce API.
pub struct MemoryApi {
    collections: HashMap<&'static str, Collection>,
    objects: RwLock<HashMap<String, Value>>,
    failures: Mutex<VecDeque<u16>>,
    requests: AtomicUsize,
}

impl MemoryApi {
    /// An empty project.
    pub fn new() -> Self {
        let mut collections = HashMap::new();
        collections.insert("associate-roles", Collection::of::<AssociateRoleRemote>());
        collections.insert("attribute-groups", Collection::of::<AttributeGroupRemote>());
        collections.insert("business-units", Collection::of::<BusinessUnitRemote>());
        collections.insert("products", Collection::of::<ProductRemote>());
        collections.insert("product-selections", Collection::of::<ProductSelectionRemote>());
        collections.insert("states", Collection::of::<StateRemote>());
        collections.insert("subscriptions", Collection::of::<SubscriptionRemote>());
        collections.insert("tax-categories", Collection::of::<TaxCategoryRemote>());
        collections.insert(PROJECT_PATH, Collection::read_only::<ProjectRemote>());
        collections.insert(TYPES_ENDPOINT, Collection::fixed());

        Self {
            collections,
            objects: RwLock::new(HashMap::new()),
            failures: Mutex::new(VecDeque::new()),
            requests: AtomicUsize::new(0),
        }
    }

    /// Seeds the project object.
    pub async fn with_project(self, project: ProjectRemote) -> ClientResult<Self> {
        let object = serde_json::to_value(project)?;
        self.objects.write().await.insert(PROJECT_PATH.to_string(), object);
        Ok(self)
    }

    /// Seeds a custom-field type.
    pub async fn with_type(self, def: TypeDefinition) -> ClientResult<Self> {
        let path = format!("{TYPES_ENDPOINT}/{}", def.id);
        let object = serde_json::to_value(def)?;
        self.objects.write().await.insert(path, object);
        Ok(self)
    }

    /// Makes the next calls fail with the given statuses, one per call.
    pub async fn fail_next(&self, statuses: impl IntoIterator<Item = u16>) {
        self.failures.lock().await.extend(statuses);
    }

    /// Applies actions directly, as another writer would.
    pub async fn apply_out_of_band(&self, path: &str, actions: Value) -> ClientResult<Value> {
        let collection = self.collection(path)?;
        let mut objects = self.objects.write().await;
        let current = objects.get(path).ok_or_else(|| ClientError::NotFound(path.to_string()))?;
        let next = (collection.apply)(current, &actions)?;
        objects.insert(path.to_string(), next.clone());
        Ok(next)
    }

    /// Number of calls served, including injected failures.
    pub fn request_count(&self) -> usize {
        self.requests.load(Ordering::SeqCst)
    }

    /// Stored object at `path`, unmasked.
    pub async fn object(&self, path: &str) -> Option<Value> {
        self.objects.read().await.get(path).cloned()
    }

    async fn begin(&self, method: &str, path: &str) -> ClientResult<()> {
        self.requests.fetch_add(1, Ordering::SeqCst);
        debug!(method, path, "in-memory request");
        match self.failures.lock().await.pop_front() {
            Some(status) => Err(ClientError::Api {
                status,
                message: format!("injected failure for {method} {path}"),
                detailed: None,
            }),
            None => Ok(()),
        }
    }

    fn collection(&self, path: &str) -> ClientResult<Collection> {
        let (endpoint, _) = split_path(path);
        self.collections
            .get(endpoint)
            .copied()
            .ok_or_else(|| ClientError::NotFound(path.to_string()))
    }
}

impl Default for MemoryApi {
    fn default() -> Self {
        Self::new()
    }
}

fn stored_version(object: &Value) -> i64 {
    object.get("version").and_then(Value::as_i64).unwrap_or_default()
}

#[async_trait]
impl CommerceApi for MemoryApi {
    async fn create(&self, endpoint: &str, draft: Value) -> ClientResult<Value> {
        self.begin("POST", endpoint).await?;
        let collection = self.collection(endpoint)?;
        let id = Uuid::new_v4().to_string();
        let object = (collection.materialize)(draft, id.clone())?;
        let response = (collection.mask)(&object)?;
        self.objects.write().await.insert(format!("{endpoint}/{id}"), object);
        Ok(response)
    }

    async fn get(&self, path: &str) -> ClientResult<Value> {
        self.begin("GET", path).await?;
        let collection = self.collection(path)?;
        let objects = self.objects.read().await;
        let object = objects.get(path).ok_or_else(|| ClientError::NotFound(path.to_string()))?;
        (collection.mask)(object)
    }

    async fn update(&self, path: &str, version: i64, actions: Value) -> ClientResult<Value> {
        self.begin("POST", path).await?;
        let collection = self.collection(path)?;
        let mut objects = self.objects.write().await;
        let current = objects.get(path).ok_or_else(|| ClientError::NotFound(path.to_string()))?;
        let actual = stored_version(current);
        if actual != version {
            return Err(version_conflict(path, version, actual));
        }
        let next = (collection.apply)(current, &actions)?;
        let response = (collection.mask)(&next)?;
        objects.insert(path.to_string(), next);
        Ok(response)
    }

    async fn delete(&self, path: &str, version: i64) -> ClientResult<Value> {
        self.begin("DELETE", path).await?;
        let collection = self.collection(path)?;
        if path == PROJECT_PATH {
            return Err(rejected("the project cannot be deleted"));
        }
        let mut objects = self.objects.write().await;
        let current = objects.get(path).ok_or_else(|| ClientError::NotFound(path.to_string()))?;
        let actual = stored_version(current);
        if actual != version {
            return Err(version_conflict(path, version, actual));
        }
        let response = (collection.mask)(current)?;
        objects.remove(path);
        Ok(response)
    }
}
