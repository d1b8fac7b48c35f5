//! Error types for the entity model.

use thiserror::Error;

/// Result type for model operations.
pub type ModelResult<T> = Result<T, ModelError>;

/// Errors raised while building drafts and update actions.
#[derive(Debug, Error)]
pub enum ModelError {
    /// A field refers to a collection element that does not exist.
    #[error("invalid reference at {path}: {message}")]
    InvalidReference { path: String, message: String },

    /// A field that cannot change after creation differs.
    #[error("field '{field}' cannot be changed after creation")]
    ImmutableFieldChanged { field: String },

    /// Client-side validation failed.
    #[error("invalid input at {path}: {message}")]
    InvalidInput { path: String, message: String },

    /// A custom-field value does not match its declared type.
    #[error("cannot encode custom field '{field}': {message}")]
    EncodeFailure { field: String, message: String },

    /// A bug in the provider, e.g. a remote object of an unexpected shape.
    #[error("internal error: {0}")]
    Internal(String),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl ModelError {
    pub(crate) fn invalid_input(path: impl Into<String>, message: impl Into<String>) -> Self {
        ModelError::InvalidInput {
            path: path.into(),
            message: message.into(),
        }
    }

    pub(crate) fn invalid_reference(path: impl Into<String>, message: impl Into<String>) -> Self {
        ModelError::InvalidReference {
            path: path.into(),
            message: message.into(),
        }
    }

    pub(crate) fn immutable(field: impl Into<String>) -> Self {
        ModelError::ImmutableFieldChanged {
            field: field.into(),
        }
    }

    /// Attribute path the error points at, when known.
    #[must_use]
    pub fn attribute_path(&self) -> Option<&str> {
        match self {
            ModelError::InvalidReference { path, .. } | ModelError::InvalidInput { path, .. } => {
                Some(path)
            }
            ModelError::ImmutableFieldChanged { field } => Some(field),
            ModelError::EncodeFailure { .. }
            | ModelError::Internal(_)
            | ModelError::Serialization(_) => None,
        }
    }
}

impl From<commerce_types::Error> for ModelError {
    fn from(err: commerce_types::Error) -> Self {
        match err {
            commerce_types::Error::InvalidLocale(locale) => ModelError::InvalidInput {
                path: String::new(),
                message: format!("invalid locale '{locale}'"),
            },
            commerce_types::Error::Serialization(e) => ModelError::Serialization(e),
        }
    }
}
