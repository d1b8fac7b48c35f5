//! Client for the commerce API.
//!
//! [`CommerceApi`] is the contract the reconciler talks to: create from a
//! draft, read, versioned update with a list of actions, and versioned
//! delete, all over JSON. [`HttpClient`] implements it with reqwest and an
//! OAuth client-credentials token.

mod api;
mod auth;
mod config;
mod error;
mod http;

pub use api::CommerceApi;
pub use auth::TokenSource;
pub use config::ClientConfig;
pub use error::{ClientError, ClientResult};
pub use http::HttpClient;
