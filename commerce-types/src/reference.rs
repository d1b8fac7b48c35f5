//! Remote reference and money types.
//!
//! These mirror the wire shapes of the commerce API and are shared by
//! several entities.

use serde::{Deserialize, Serialize};

/// A reference to another remote object by id.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Reference {
    pub type_id: String,
    pub id: String,
}

impl Reference {
    pub fn new(type_id: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            type_id: type_id.into(),
            id: id.into(),
        }
    }
}

/// A reference to another remote object by user-defined key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KeyReference {
    pub type_id: String,
    pub key: String,
}

impl KeyReference {
    pub fn new(type_id: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            type_id: type_id.into(),
            key: key.into(),
        }
    }
}

/// Identifies a remote object by id or key in drafts and update actions.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceIdentifier {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub type_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
}

impl ResourceIdentifier {
    pub fn by_id(type_id: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            type_id: Some(type_id.into()),
            id: Some(id.into()),
            key: None,
        }
    }

    pub fn by_key(type_id: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            type_id: Some(type_id.into()),
            id: None,
            key: Some(key.into()),
        }
    }
}

/// A monetary amount in the smallest currency unit.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Money {
    pub currency_code: String,
    pub cent_amount: i64,
}

impl Money {
    pub fn new(currency_code: impl Into<String>, cent_amount: i64) -> Self {
        Self {
            currency_code: currency_code.into(),
            cent_amount,
        }
    }
}
