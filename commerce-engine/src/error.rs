//! Error types for the reconciliation engine.

use commerce_client::ClientError;
use commerce_model::ModelError;
use thiserror::Error;

/// Result type for engine operations.
pub type EngineResult<T> = Result<T, EngineError>;

/// Errors surfaced by the reconciler.
///
/// Only [`EngineError::TransientRemote`] is retried; every other kind is
/// terminal and reaches the host as a diagnostic.
#[derive(Debug, Error)]
pub enum EngineError {
    /// Network failure, version conflict or server error without detail.
    #[error("transient remote error: {0}")]
    TransientRemote(String),

    /// The addressed remote object does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// The configuration was rejected before anything was sent.
    #[error("{}", invalid_input_message(.path.as_deref(), .message))]
    InvalidInput {
        path: Option<String>,
        message: String,
    },

    /// The remote rejected the request.
    #[error("{}", remote_message(*.status, .message, .detailed.as_deref()))]
    RemotePermanent {
        status: u16,
        message: String,
        detailed: Option<String>,
    },

    /// A custom-field value does not match its declared type.
    #[error("cannot encode custom field '{field}': {message}")]
    EncodeFailure { field: String, message: String },

    /// Bug in provider.
    #[error("bug in provider: {0}")]
    Internal(String),

    /// The host cancelled the operation.
    #[error("operation cancelled")]
    Cancelled,
}

fn invalid_input_message(path: Option<&str>, message: &str) -> String {
    match path {
        Some(path) if !path.is_empty() => format!("invalid value for {path}: {message}"),
        _ => format!("invalid input: {message}"),
    }
}

fn remote_message(status: u16, message: &str, detailed: Option<&str>) -> String {
    match detailed {
        Some(detailed) => format!("remote rejected the request ({status}): {message}: {detailed}"),
        None => format!("remote rejected the request ({status}): {message}"),
    }
}

impl EngineError {
    pub fn is_transient(&self) -> bool {
        matches!(self, EngineError::TransientRemote(_))
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, EngineError::NotFound(_))
    }

    /// Attribute path the error points at, when known.
    pub fn attribute_path(&self) -> Option<&str> {
        match self {
            EngineError::InvalidInput { path, .. } => path.as_deref().filter(|p| !p.is_empty()),
            _ => None,
        }
    }

    pub(crate) fn internal(message: impl Into<String>) -> Self {
        EngineError::Internal(message.into())
    }
}

impl From<ClientError> for EngineError {
    fn from(err: ClientError) -> Self {
        if err.is_transient() {
            return EngineError::TransientRemote(err.to_string());
        }
        match err {
            ClientError::NotFound(path) => EngineError::NotFound(path),
            ClientError::Api {
                status,
                message,
                detailed,
            } => EngineError::RemotePermanent {
                status,
                message,
                detailed,
            },
            ClientError::AuthFailed(message) => EngineError::RemotePermanent {
                status: 401,
                message,
                detailed: None,
            },
            ClientError::Config(message) => EngineError::InvalidInput {
                path: None,
                message,
            },
            ClientError::Http(e) => EngineError::Internal(format!("undecodable response: {e}")),
            ClientError::Serialization(e) => EngineError::Internal(e.to_string()),
        }
    }
}

impl From<ModelError> for EngineError {
    fn from(err: ModelError) -> Self {
        match err {
            ModelError::InvalidReference { path, message } | ModelError::InvalidInput { path, message } => {
                EngineError::InvalidInput {
                    path: Some(path),
                    message,
                }
            }
            ModelError::ImmutableFieldChanged { field } => EngineError::InvalidInput {
                message: format!("'{field}' cannot be changed after creation; the resource must be replaced"),
                path: Some(field),
            },
            ModelError::EncodeFailure { field, message } => EngineError::EncodeFailure { field, message },
            ModelError::Internal(message) => EngineError::Internal(message),
            ModelError::Serialization(e) => EngineError::Internal(e.to_string()),
        }
    }
}

impl From<serde_json::Error> for EngineError {
    fn from(err: serde_json::Error) -> Self {
        EngineError::Internal(format!("cannot decode remote object: {err}"))
    }
}
