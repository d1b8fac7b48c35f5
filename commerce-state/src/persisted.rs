use crate::StateResult;
use commerce_model::Resource;
use commerce_types::Dynamic;
use serde::{Deserialize, Serialize};

/// A stored resource: its attribute tree and the schema version it follows.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PersistedState {
    #[serde(default)]
    pub schema_version: u64,
    #[serde(default)]
    pub attributes: Dynamic,
}

impl PersistedState {
    pub fn new(schema_version: u64, attributes: Dynamic) -> Self {
        Self {
            schema_version,
            attributes,
        }
    }

    /// Encodes a record at its kind's current schema version.
    pub fn from_record<R: Resource>(record: &R) -> StateResult<Self> {
        let value = serde_json::to_value(record)?;
        Ok(Self::new(R::SCHEMA_VERSION, Dynamic::from(value)))
    }

    /// Decodes the typed record. The state must already be upgraded.
    pub fn to_record<R: Resource>(&self) -> StateResult<R> {
        let value = serde_json::Value::from(self.attributes.clone());
        Ok(serde_json::from_value(value)?)
    }

    /// True if nothing has been stored yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.attributes.is_null()
    }
}
