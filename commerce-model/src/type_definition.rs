//! Custom-field type definitions.
//!
//! Types are read-only to the provider. They are fetched so that custom-field
//! values can be encoded according to their declared field type.

use crate::RemoteObject;
use commerce_types::LocalizedString;
use serde::{Deserialize, Serialize};

/// A custom-field type as returned by the commerce API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TypeDefinition {
    pub id: String,
    pub version: i64,
    pub key: String,
    #[serde(default)]
    pub name: LocalizedString,
    #[serde(default)]
    pub resource_type_ids: Vec<String>,
    #[serde(default)]
    pub field_definitions: Vec<FieldDefinition>,
}

impl TypeDefinition {
    /// Creates a type with no fields.
    #[must_use]
    pub fn new(id: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            version: 1,
            key: key.into(),
            name: LocalizedString::new(),
            resource_type_ids: Vec::new(),
            field_definitions: Vec::new(),
        }
    }

    /// Adds a field definition, builder style.
    #[must_use]
    pub fn with_field(mut self, name: impl Into<String>, field_type: CustomFieldType) -> Self {
        self.field_definitions.push(FieldDefinition {
            name: name.into(),
            field_type,
            required: false,
            label: LocalizedString::new(),
        });
        self
    }

    #[must_use]
    pub fn field(&self, name: &str) -> Option<&FieldDefinition> {
        self.field_definitions.iter().find(|f| f.name == name)
    }
}

impl RemoteObject for TypeDefinition {
    fn id(&self) -> &str {
        &self.id
    }

    fn version(&self) -> i64 {
        self.version
    }

    fn set_version(&mut self, version: i64) {
        self.version = version;
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldDefinition {
    pub name: String,
    #[serde(rename = "type")]
    pub field_type: CustomFieldType,
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub label: LocalizedString,
}

/// Declared type of a custom field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "name")]
pub enum CustomFieldType {
    Boolean,
    String,
    LocalizedString,
    Number,
    Money,
    Date,
    Time,
    DateTime,
    Enum {
        #[serde(default)]
        values: Vec<EnumValue>,
    },
    LocalizedEnum {
        #[serde(default)]
        values: Vec<LocalizedEnumValue>,
    },
    Reference {
        #[serde(rename = "referenceTypeId")]
        reference_type_id: String,
    },
    Set {
        #[serde(rename = "elementType")]
        element_type: Box<CustomFieldType>,
    },
}

impl CustomFieldType {
    /// Enum keys a value may take, for the two enum kinds.
    pub(crate) fn enum_keys(&self) -> Option<Vec<&str>> {
        match self {
            CustomFieldType::Enum { values } => Some(values.iter().map(|v| v.key.as_str()).collect()),
            CustomFieldType::LocalizedEnum { values } => {
                Some(values.iter().map(|v| v.key.as_str()).collect())
            }
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnumValue {
    pub key: String,
    pub label: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocalizedEnumValue {
    pub key: String,
    pub label: LocalizedString,
}
