use crate::ClientResult;
use async_trait::async_trait;
use serde_json::Value;

/// The versioned commerce API.
///
/// Paths are relative to the project: `endpoint` is a collection such as
/// `states`, and `path` addresses one object such as `states/{id}`. The
/// empty path addresses the project itself.
#[async_trait]
pub trait CommerceApi: Send + Sync {
    /// `POST /{endpoint}` with a draft; returns the created object.
    async fn create(&self, endpoint: &str, draft: Value) -> ClientResult<Value>;

    /// `GET /{path}`.
    async fn get(&self, path: &str) -> ClientResult<Value>;

    /// `POST /{path}` with `{version, actions}`; returns the updated object.
    async fn update(&self, path: &str, version: i64, actions: Value) -> ClientResult<Value>;

    /// `DELETE /{path}?version={version}`; returns the deleted object.
    async fn delete(&self, path: &str, version: i64) -> ClientResult<Value>;
}
