//! Provider configuration.
//!
//! Loaded from a TOML file with a `[client]` and an `[engine]` table;
//! credentials can be supplied or overridden through the `CTP_*`
//! environment variables.
//!
//! ```toml
//! [client]
//! project_key = "acme"
//! client_id = "..."
//!
//! [engine]
//! update_timeout_ms = 10000
//! ```

use crate::{ProviderError, ProviderResult};
use commerce_client::ClientConfig;
use commerce_engine::EngineConfig;
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderConfig {
    pub client: ClientConfig,
    pub engine: EngineConfig,
}

impl ProviderConfig {
    /// Reads `path` (when given) and applies the environment overrides.
    pub fn load(path: Option<&Path>) -> ProviderResult<Self> {
        Self::load_with(path, |name| std::env::var(name).ok())
    }

    /// Like [`ProviderConfig::load`], with environment lookups through `lookup`.
    pub fn load_with(path: Option<&Path>, lookup: impl Fn(&str) -> Option<String>) -> ProviderResult<Self> {
        let mut config = match path {
            Some(path) => Self::from_toml(&std::fs::read_to_string(path)?)?,
            None => Self::default(),
        };
        config.client = config.client.with_overrides(lookup);
        config.validate()?;
        Ok(config)
    }

    /// Checks the engine settings; client credentials are checked on connect.
    pub fn validate(&self) -> ProviderResult<()> {
        let engine = &self.engine;
        if engine.initial_backoff_ms > engine.max_backoff_ms {
            return Err(ProviderError::Config(format!(
                "engine.initial_backoff_ms ({}) exceeds engine.max_backoff_ms ({})",
                engine.initial_backoff_ms, engine.max_backoff_ms
            )));
        }
        if engine.initial_backoff_ms == 0 {
            return Err(ProviderError::Config("engine.initial_backoff_ms must be positive".to_string()));
        }
        Ok(())
    }

    pub fn from_toml(text: &str) -> ProviderResult<Self> {
        Ok(toml::from_str(text)?)
    }
}
