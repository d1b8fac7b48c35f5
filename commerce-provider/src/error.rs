//! Provider errors and the diagnostics they become at the host boundary.

use commerce_client::ClientError;
use commerce_engine::EngineError;
use commerce_state::StateError;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type for provider operations.
pub type ProviderResult<T> = Result<T, ProviderError>;

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error(transparent)]
    Engine(#[from] EngineError),

    #[error(transparent)]
    State(#[from] StateError),

    #[error("unknown resource kind '{0}'")]
    UnknownKind(String),

    /// A payload from the host does not fit the kind's record.
    #[error("cannot decode {kind} payload: {source}")]
    Decode {
        kind: &'static str,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid provider configuration: {0}")]
    Config(String),

    #[error("TOML deserialization error: {0}")]
    TomlDeserialize(#[from] toml::de::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<ClientError> for ProviderError {
    fn from(err: ClientError) -> Self {
        ProviderError::Engine(err.into())
    }
}

/// An error as reported to the host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub summary: String,
    pub detail: String,
    /// Attribute the error is attached to; `None` means the resource root.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attribute_path: Option<String>,
}

impl From<&ProviderError> for Diagnostic {
    fn from(err: &ProviderError) -> Self {
        let summary = match err {
            ProviderError::Engine(EngineError::InvalidInput { .. }) => "Invalid configuration",
            ProviderError::Engine(EngineError::EncodeFailure { .. }) => "Invalid custom field value",
            ProviderError::Engine(EngineError::RemotePermanent { .. }) => "Request rejected by the commerce API",
            ProviderError::Engine(EngineError::TransientRemote(_)) => "Commerce API unavailable",
            ProviderError::Engine(EngineError::NotFound(_)) => "Resource not found",
            ProviderError::Engine(EngineError::Cancelled) => "Operation cancelled",
            ProviderError::Engine(EngineError::Internal(_)) | ProviderError::Decode { .. } => "Bug in provider",
            ProviderError::State(_) => "Cannot upgrade stored state",
            ProviderError::UnknownKind(_) => "Unknown resource kind",
            ProviderError::Config(_) | ProviderError::TomlDeserialize(_) | ProviderError::Io(_) => "Provider configuration error",
        };
        let attribute_path = match err {
            ProviderError::Engine(e) => e.attribute_path().map(str::to_string),
            ProviderError::State(StateError::Malformed { path, .. }) => Some(path.clone()),
            _ => None,
        };
        Diagnostic {
            summary: summary.to_string(),
            detail: err.to_string(),
            attribute_path,
        }
    }
}

impl From<ProviderError> for Diagnostic {
    fn from(err: ProviderError) -> Self {
        Diagnostic::from(&err)
    }
}
