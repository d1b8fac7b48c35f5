use crate::{PersistedState, StateError, StateResult};
use commerce_types::Dynamic;
use std::collections::BTreeMap;
use tracing::debug;

/// Rewrites a tree from one schema version to the next.
pub type UpgradeStep = fn(&mut Dynamic) -> StateResult<()>;

/// Version-indexed upgrade steps for one resource kind.
///
/// The step registered at version `n` turns a version `n` tree into a
/// version `n + 1` tree.
#[derive(Debug, Clone)]
pub struct UpgradePipeline {
    kind: &'static str,
    current: u64,
    steps: BTreeMap<u64, UpgradeStep>,
}

impl UpgradePipeline {
    pub fn new(kind: &'static str, current: u64) -> Self {
        Self {
            kind,
            current,
            steps: BTreeMap::new(),
        }
    }

    #[must_use]
    pub fn step(mut self, from: u64, step: UpgradeStep) -> Self {
        self.steps.insert(from, step);
        self
    }

    #[must_use]
    pub fn kind(&self) -> &'static str {
        self.kind
    }

    #[must_use]
    pub fn current_version(&self) -> u64 {
        self.current
    }

    /// Walks `state` forward to the current version.
    pub fn upgrade(&self, state: PersistedState) -> StateResult<PersistedState> {
        self.upgrade_to(state, self.current)
    }

    /// Walks `state` forward to `target`, which may not exceed the current version.
    pub fn upgrade_to(&self, mut state: PersistedState, target: u64) -> StateResult<PersistedState> {
        if state.schema_version > self.current {
            return Err(StateError::UnsupportedVersion {
                kind: self.kind.to_string(),
                found: state.schema_version,
                current: self.current,
            });
        }
        let target = target.min(self.current);
        while state.schema_version < target {
            let from = state.schema_version;
            let step = self.steps.get(&from).ok_or_else(|| StateError::MissingStep {
                kind: self.kind.to_string(),
                from,
            })?;
            if !state.attributes.is_null() {
                step(&mut state.attributes)?;
            }
            state.schema_version = from + 1;
            debug!(kind = self.kind, from, to = from + 1, "upgraded state");
        }
        Ok(state)
    }
}
