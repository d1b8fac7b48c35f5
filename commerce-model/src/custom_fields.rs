//! Custom fields.
//!
//! A custom-fields block binds a record to a type and holds one value per
//! field. Values are kept JSON-encoded in the record (`"true"`, `"42"`,
//! `"{\"en\":\"Hi\"}"`); plain strings are kept as-is. They are encoded to
//! typed JSON according to the field's declared type when a draft or an
//! action is built.

use crate::{ActionContext, CustomFieldType, ModelError, ModelResult, TypeDefinition};
use commerce_types::{LocalizedString, Money, Reference, ResourceIdentifier};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Configured and stored custom fields.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomFields {
    pub type_id: String,
    #[serde(default)]
    pub fields: BTreeMap<String, String>,
}

impl CustomFields {
    pub fn new(type_id: impl Into<String>) -> Self {
        Self {
            type_id: type_id.into(),
            fields: BTreeMap::new(),
        }
    }

    /// Adds a JSON-encoded value, builder style.
    #[must_use]
    pub fn with(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.fields.insert(name.into(), value.into());
        self
    }

    #[must_use]
    pub fn from_remote(remote: &RemoteCustomFields) -> Self {
        Self {
            type_id: remote.type_ref.id.clone(),
            fields: remote
                .fields
                .iter()
                .map(|(name, value)| (name.clone(), decode_value(value)))
                .collect(),
        }
    }
}

/// Custom fields as returned by the commerce API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemoteCustomFields {
    #[serde(rename = "type")]
    pub type_ref: Reference,
    #[serde(default)]
    pub fields: Map<String, Value>,
}

/// Custom fields as sent in a create payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomFieldsDraft {
    #[serde(rename = "type")]
    pub type_ref: ResourceIdentifier,
    #[serde(default)]
    pub fields: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SetCustomType {
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub type_ref: Option<ResourceIdentifier>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fields: Option<Map<String, Value>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SetCustomField {
    pub name: String,
    /// Absent removes the field.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,
}

/// The two custom-field actions every entity with custom fields supports.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "camelCase")]
pub enum CustomFieldAction {
    SetCustomType(SetCustomType),
    SetCustomField(SetCustomField),
}

/// Turns a remote value into its record form.
pub(crate) fn decode_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// True if two record values hold the same content.
///
/// JSON values compare structurally so that key order inside objects does
/// not matter.
pub(crate) fn same_value(a: &str, b: &str) -> bool {
    if a == b {
        return true;
    }
    match (
        serde_json::from_str::<Value>(a),
        serde_json::from_str::<Value>(b),
    ) {
        (Ok(x), Ok(y)) => x == y,
        _ => false,
    }
}

fn encode_failure(field: &str, message: impl Into<String>) -> ModelError {
    ModelError::EncodeFailure {
        field: field.to_string(),
        message: message.into(),
    }
}

/// Encodes one record value according to its declared type.
pub fn encode_value(field: &str, field_type: &CustomFieldType, raw: &str) -> ModelResult<Value> {
    match field_type {
        CustomFieldType::Boolean => raw
            .trim()
            .parse::<bool>()
            .map(Value::Bool)
            .map_err(|_| encode_failure(field, format!("expected a boolean, got '{raw}'"))),
        CustomFieldType::Number => serde_json::from_str::<serde_json::Number>(raw.trim())
            .map(Value::Number)
            .map_err(|_| encode_failure(field, format!("expected a number, got '{raw}'"))),
        CustomFieldType::String
        | CustomFieldType::Date
        | CustomFieldType::Time
        | CustomFieldType::DateTime => Ok(Value::String(raw.to_string())),
        CustomFieldType::Enum { .. } | CustomFieldType::LocalizedEnum { .. } => {
            let keys = field_type.enum_keys().unwrap_or_default();
            if !keys.is_empty() && !keys.contains(&raw) {
                return Err(encode_failure(
                    field,
                    format!("'{raw}' is not one of {}", keys.join(", ")),
                ));
            }
            Ok(Value::String(raw.to_string()))
        }
        CustomFieldType::LocalizedString => {
            let value: LocalizedString = serde_json::from_str(raw).map_err(|e| {
                encode_failure(field, format!("expected a locale to text object: {e}"))
            })?;
            value
                .validate()
                .map_err(|e| encode_failure(field, e.to_string()))?;
            Ok(serde_json::to_value(value)?)
        }
        CustomFieldType::Money => {
            let value: Money = serde_json::from_str(raw).map_err(|e| {
                encode_failure(field, format!("expected currencyCode and centAmount: {e}"))
            })?;
            Ok(serde_json::to_value(value)?)
        }
        CustomFieldType::Reference { reference_type_id } => {
            let id = match serde_json::from_str::<Value>(raw) {
                Ok(Value::Object(obj)) => obj
                    .get("id")
                    .and_then(Value::as_str)
                    .map(str::to_string)
                    .ok_or_else(|| encode_failure(field, "reference object has no id"))?,
                _ => raw.to_string(),
            };
            Ok(serde_json::to_value(Reference::new(reference_type_id.clone(), id))?)
        }
        CustomFieldType::Set { element_type } => {
            let items: Vec<Value> = serde_json::from_str(raw)
                .map_err(|e| encode_failure(field, format!("expected a JSON list: {e}")))?;
            let encoded = items
                .iter()
                .map(|item| encode_value(field, element_type, &decode_value(item)))
                .collect::<ModelResult<Vec<_>>>()?;
            Ok(Value::Array(encoded))
        }
    }
}

fn type_for<'a>(ctx: &'a ActionContext, type_id: &str) -> ModelResult<&'a TypeDefinition> {
    if type_id.is_empty() {
        return Err(ModelError::invalid_input("custom.type_id", "a type reference is required"));
    }
    ctx.type_definition(type_id).ok_or_else(|| {
        ModelError::invalid_reference("custom.type_id", format!("type '{type_id}' does not exist"))
    })
}

fn encode_field(def: &TypeDefinition, name: &str, raw: &str) -> ModelResult<Value> {
    let field = def
        .field(name)
        .ok_or_else(|| encode_failure(name, format!("not defined on type '{}'", def.key)))?;
    encode_value(name, &field.field_type, raw)
}

fn encode_fields(def: &TypeDefinition, custom: &CustomFields) -> ModelResult<Map<String, Value>> {
    custom
        .fields
        .iter()
        .map(|(name, raw)| Ok((name.clone(), encode_field(def, name, raw)?)))
        .collect()
}

/// Builds the create-side custom fields.
pub fn draft_custom(
    custom: Option<&CustomFields>,
    ctx: &ActionContext,
) -> ModelResult<Option<CustomFieldsDraft>> {
    let Some(custom) = custom else {
        return Ok(None);
    };
    let def = type_for(ctx, &custom.type_id)?;
    Ok(Some(CustomFieldsDraft {
        type_ref: ResourceIdentifier::by_id("type", &def.id),
        fields: encode_fields(def, custom)?,
    }))
}

/// Builds the actions that turn `current` custom fields into `desired`.
///
/// A type change replaces the whole block with one `SetCustomType`; only
/// when both sides share a type are individual fields set or cleared.
pub fn custom_field_actions(
    current: Option<&CustomFields>,
    desired: Option<&CustomFields>,
    ctx: &ActionContext,
) -> ModelResult<Vec<CustomFieldAction>> {
    let Some(desired) = desired else {
        if current.is_none() {
            return Ok(Vec::new());
        }
        return Ok(vec![CustomFieldAction::SetCustomType(SetCustomType {
            type_ref: None,
            fields: None,
        })]);
    };

    let current = match current {
        Some(c) if c.type_id == desired.type_id => c,
        _ => {
            let def = type_for(ctx, &desired.type_id)?;
            let fields = encode_fields(def, desired)?;
            return Ok(vec![CustomFieldAction::SetCustomType(SetCustomType {
                type_ref: Some(ResourceIdentifier::by_id("type", &def.id)),
                fields: (!fields.is_empty()).then_some(fields),
            })]);
        }
    };

    let changed: Vec<(&String, &String)> = desired
        .fields
        .iter()
        .filter(|(name, raw)| !current.fields.get(*name).is_some_and(|c| same_value(c, raw)))
        .collect();

    let mut actions = Vec::new();
    if !changed.is_empty() {
        let def = type_for(ctx, &desired.type_id)?;
        for (name, raw) in changed {
            actions.push(CustomFieldAction::SetCustomField(SetCustomField {
                name: name.clone(),
                value: Some(encode_field(def, name, raw)?),
            }));
        }
    }
    for name in current.fields.keys() {
        if !desired.fields.contains_key(name) {
            actions.push(CustomFieldAction::SetCustomField(SetCustomField {
                name: name.clone(),
                value: None,
            }));
        }
    }
    Ok(actions)
}

/// Type ids referenced by an optional custom-fields block.
#[must_use]
pub fn custom_type_ids(custom: Option<&CustomFields>) -> Vec<String> {
    custom
        .filter(|c| !c.type_id.is_empty())
        .map(|c| vec![c.type_id.clone()])
        .unwrap_or_default()
}

pub(crate) fn materialize_custom(
    draft: Option<CustomFieldsDraft>,
) -> ModelResult<Option<RemoteCustomFields>> {
    draft
        .map(|d| {
            Ok(RemoteCustomFields {
                type_ref: reference_from_identifier(&d.type_ref)?,
                fields: d.fields,
            })
        })
        .transpose()
}

pub(crate) fn reference_from_identifier(ident: &ResourceIdentifier) -> ModelResult<Reference> {
    match (&ident.type_id, &ident.id) {
        (Some(type_id), Some(id)) => Ok(Reference::new(type_id.clone(), id.clone())),
        _ => Err(ModelError::Internal(format!(
            "identifier {ident:?} has no type or id"
        ))),
    }
}

/// Server-side semantics of the custom-field actions.
pub(crate) fn apply_custom_action(
    custom: &mut Option<RemoteCustomFields>,
    action: &CustomFieldAction,
) -> ModelResult<()> {
    match action {
        CustomFieldAction::SetCustomType(set) => {
            *custom = match &set.type_ref {
                None => None,
                Some(ident) => Some(RemoteCustomFields {
                    type_ref: reference_from_identifier(ident)?,
                    fields: set.fields.clone().unwrap_or_default(),
                }),
            };
        }
        CustomFieldAction::SetCustomField(set) => {
            let block = custom.as_mut().ok_or_else(|| {
                ModelError::invalid_input("custom", "object has no custom type")
            })?;
            match &set.value {
                Some(value) => {
                    block.fields.insert(set.name.clone(), value.clone());
                }
                None => {
                    block.fields.remove(&set.name);
                }
            }
        }
    }
    Ok(())
}
