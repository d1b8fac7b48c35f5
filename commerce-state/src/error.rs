//! Error types for persisted state.

use thiserror::Error;

/// Result type for state operations.
pub type StateResult<T> = Result<T, StateError>;

/// Errors raised while decoding or upgrading persisted state.
#[derive(Debug, Error)]
pub enum StateError {
    /// No pipeline is registered for the resource kind.
    #[error("unknown resource kind '{0}'")]
    UnknownKind(String),

    /// The stored schema is newer than this build understands.
    #[error("state of '{kind}' has schema version {found}, newer than the supported {current}")]
    UnsupportedVersion { kind: String, found: u64, current: u64 },

    /// A version in the supported range has no upgrade step.
    #[error("no upgrade step for '{kind}' from schema version {from}")]
    MissingStep { kind: String, from: u64 },

    /// The tree does not have the shape an upgrade step expects.
    #[error("malformed state at '{path}': {message}")]
    Malformed { path: String, message: String },

    /// Serialization/deserialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl StateError {
    pub(crate) fn malformed(path: impl Into<String>, message: impl Into<String>) -> Self {
        StateError::Malformed {
            path: path.into(),
            message: message.into(),
        }
    }
}
