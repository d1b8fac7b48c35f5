//! Reconciliation engine for the commerce provider.
//!
//! The [`Reconciler`] runs resource lifecycles (create, read, update,
//! delete, import, attach, detach) against any [`CommerceApi`]:
//!
//! - transient failures are retried with backoff within a per-operation
//!   time budget, see [`RetryPolicy`]
//! - every call and backoff races a [`CancellationToken`] from the host
//! - kinds whose remote object is co-written by a sibling kind serialize
//!   their writes through a striped per-id [`LockMap`]
//!
//! [`MemoryApi`] implements the commerce API in memory for dry runs and
//! tests.
//!
//! [`CommerceApi`]: commerce_client::CommerceApi
//! [`CancellationToken`]: tokio_util::sync::CancellationToken

mod config;
mod error;
mod locks;
mod memory;
mod reconciler;
mod retry;

pub use config::EngineConfig;
pub use error::{EngineError, EngineResult};
pub use locks::LockMap;
pub use memory::MemoryApi;
pub use reconciler::Reconciler;
pub use retry::RetryPolicy;
pub use tokio_util::sync::CancellationToken;
