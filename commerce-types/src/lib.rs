//! Typed value layer for the commerce provider.
//!
//! This crate defines the value types shared by every other
//! layer of the provider:
//! - [`Attr`]: tri-state scalar (known / null / unknown) used in configured
//!   and stored representations
//! - [`LocalizedString`]: locale → text mapping with key validation
//! - [`Dynamic`]: untyped attribute tree used by the state-upgrade engine
//! - Remote reference and money types shared by several entities
//!
//! Entity-specific types belong in `commerce-model`, not here.

mod attr;
mod dynamic;
mod localized;
mod reference;

pub use attr::{is_unknown_marker, unknown_marker, Attr, UNKNOWN_MARKER};
pub use dynamic::Dynamic;
pub use localized::{is_valid_locale, LocalizedString};
pub use reference::{KeyReference, Money, Reference, ResourceIdentifier};

/// Result type alias using the crate's error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in value operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("invalid locale '{0}': expected a two-letter language code with optional region (e.g. en, de-DE)")]
    InvalidLocale(String),
}
