//! Persisted resource state and its schema-version upgrades.
//!
//! Each resource is stored as an untyped attribute tree tagged with the
//! schema version it was written at. When a resource kind changes the shape
//! of its record, the stored tree is walked forward one version at a time by
//! an [`UpgradePipeline`] before the typed record is decoded from it.
//!
//! # Architecture
//!
//! - [`PersistedState`] pairs the tree with its schema version
//! - [`shape`] holds the reusable tree rewrites (list-of-one collapse and expansion)
//! - [`pipeline_for`] returns the pipeline registered for a resource kind

mod error;
mod kinds;
mod persisted;
mod pipeline;
pub mod shape;

pub use error::{StateError, StateResult};
pub use kinds::{pipeline_for, pipelines, upgrade};
pub use persisted::PersistedState;
pub use pipeline::{UpgradePipeline, UpgradeStep};
