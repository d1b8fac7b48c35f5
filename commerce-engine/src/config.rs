//! Engine configuration.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Retry budgets and lock-map sizing for the reconciler.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Total time transient create failures are retried for (ms).
    pub create_timeout_ms: u64,
    /// Total time transient update failures are retried for (ms).
    pub update_timeout_ms: u64,
    /// Total time transient delete failures are retried for (ms).
    pub delete_timeout_ms: u64,
    /// First backoff delay (ms); doubles per attempt.
    pub initial_backoff_ms: u64,
    /// Backoff cap (ms).
    pub max_backoff_ms: u64,
    /// Number of stripes in the per-id lock map.
    pub lock_stripes: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            create_timeout_ms: 20_000,
            update_timeout_ms: 5_000,
            delete_timeout_ms: 5_000,
            initial_backoff_ms: 100,
            max_backoff_ms: 2_000,
            lock_stripes: 16,
        }
    }
}

impl EngineConfig {
    pub fn create_budget(&self) -> Duration {
        Duration::from_millis(self.create_timeout_ms)
    }

    pub fn update_budget(&self) -> Duration {
        Duration::from_millis(self.update_timeout_ms)
    }

    pub fn delete_budget(&self) -> Duration {
        Duration::from_millis(self.delete_timeout_ms)
    }

    pub fn initial_backoff(&self) -> Duration {
        Duration::from_millis(self.initial_backoff_ms)
    }

    pub fn max_backoff(&self) -> Duration {
        Duration::from_millis(self.max_backoff_ms)
    }
}
