//! Host-facing surface of the commerce provider.
//!
//! [`Provider`] accepts configuration and stored state as JSON, dispatches
//! on [`ResourceKind`] to the typed records in `commerce-model` and runs them
//! through the reconciler. Failures surface as [`Diagnostic`]s carrying the
//! offending attribute path where one is known.

mod config;
mod error;
mod kind;
mod provider;
pub mod schema;

pub use commerce_engine::CancellationToken;
pub use commerce_state::PersistedState;
pub use config::ProviderConfig;
pub use error::{Diagnostic, ProviderError, ProviderResult};
pub use kind::ResourceKind;
pub use provider::Provider;
pub use schema::{AttributeMode, AttributeSchema, AttributeType, ResourceSchema};
