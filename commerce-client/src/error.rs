//! Commerce API error types.

use thiserror::Error;

/// Result type for API calls.
pub type ClientResult<T> = Result<T, ClientError>;

/// Errors returned by a [`CommerceApi`](crate::CommerceApi).
#[derive(Debug, Error)]
pub enum ClientError {
    /// The request never produced a response.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The addressed object does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// The API answered with a non-success status.
    #[error("API request failed with status {status}: {message}")]
    Api {
        status: u16,
        message: String,
        /// Detailed message of the first error entry, when the body has one.
        detailed: Option<String>,
    },

    #[error("authentication failed: {0}")]
    AuthFailed(String),

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl ClientError {
    /// Returns true if the call may succeed when retried: network failures,
    /// version conflicts, and server errors without a detailed message.
    pub fn is_transient(&self) -> bool {
        match self {
            ClientError::Http(e) => !e.is_decode() && !e.is_builder(),
            ClientError::Api { status: 409, .. } => true,
            ClientError::Api {
                status, detailed, ..
            } => *status >= 500 && detailed.is_none(),
            _ => false,
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, ClientError::NotFound(_))
    }

    /// HTTP status of the failed call, if the API answered.
    pub fn status(&self) -> Option<u16> {
        match self {
            ClientError::Api { status, .. } => Some(*status),
            ClientError::NotFound(_) => Some(404),
            ClientError::Http(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}
