//! Product variants, prices and attribute values.

use crate::custom_fields::{decode_value, reference_from_identifier, same_value};
use crate::ModelResult;
use commerce_diff::{diff_keyed_with, Keyed};
use commerce_types::{Attr, Money, Reference, ResourceIdentifier};
use serde::{Deserialize, Serialize};
use serde_json::Value;

// ── Records ──────────────────────────────────────────────────────

/// A product variant, identified by SKU.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Variant {
    /// Server-assigned, unique within the product.
    #[serde(default)]
    pub id: Attr<i64>,
    pub sku: String,
    #[serde(default)]
    pub key: Attr<String>,
    #[serde(default)]
    pub attributes: Vec<AttributeValue>,
    #[serde(default)]
    pub prices: Vec<Price>,
}

impl Keyed for Variant {
    fn key(&self) -> &str {
        &self.sku
    }
}

impl Variant {
    pub fn new(sku: impl Into<String>) -> Self {
        Self {
            id: Attr::Null,
            sku: sku.into(),
            key: Attr::Null,
            attributes: Vec::new(),
            prices: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_price(mut self, price: Price) -> Self {
        self.prices.push(price);
        self
    }

    #[must_use]
    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.push(AttributeValue {
            name: name.into(),
            value: value.into(),
        });
        self
    }

    /// Equal apart from server-assigned ids.
    #[must_use]
    pub fn same_content(&self, other: &Self) -> bool {
        self.sku == other.sku
            && self.key == other.key
            && diff_keyed_with(&self.attributes, &other.attributes, AttributeValue::same_content)
                .is_empty()
            && self.attributes.len() == other.attributes.len()
            && diff_keyed_with(&self.prices, &other.prices, Price::same_content).is_empty()
    }

    pub(crate) fn to_draft(&self) -> VariantDraft {
        VariantDraft {
            sku: Some(self.sku.clone()),
            key: self.key.to_option(),
            attributes: self.attributes.iter().map(AttributeValue::to_remote).collect(),
            prices: self.prices.iter().map(Price::to_draft).collect(),
        }
    }

    pub(crate) fn from_remote(remote: &RemoteVariant) -> Self {
        Self {
            id: Attr::known(remote.id),
            sku: remote.sku.clone().unwrap_or_default(),
            key: remote.key.clone().into(),
            attributes: remote.attributes.iter().map(AttributeValue::from_remote).collect(),
            prices: remote.prices.iter().map(Price::from_remote).collect(),
        }
    }
}

/// A product attribute value, JSON-encoded like custom-field values.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttributeValue {
    pub name: String,
    pub value: String,
}

impl Keyed for AttributeValue {
    fn key(&self) -> &str {
        &self.name
    }
}

impl AttributeValue {
    fn same_content(&self, other: &Self) -> bool {
        self.name == other.name && same_value(&self.value, &other.value)
    }

    /// Remote value: parsed JSON, or the raw text when it is not JSON.
    pub(crate) fn encoded(&self) -> Value {
        serde_json::from_str(&self.value).unwrap_or_else(|_| Value::String(self.value.clone()))
    }

    fn to_remote(&self) -> RemoteAttribute {
        RemoteAttribute {
            name: self.name.clone(),
            value: self.encoded(),
        }
    }

    fn from_remote(remote: &RemoteAttribute) -> Self {
        Self {
            name: remote.name.clone(),
            value: decode_value(&remote.value),
        }
    }
}

/// An embedded price, identified by its key within the variant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Price {
    #[serde(default)]
    pub id: Attr<String>,
    pub key: String,
    pub value: Money,
    #[serde(default)]
    pub country: Attr<String>,
    #[serde(default)]
    pub customer_group_id: Attr<String>,
    #[serde(default)]
    pub channel_id: Attr<String>,
}

impl Keyed for Price {
    fn key(&self) -> &str {
        &self.key
    }
}

impl Price {
    pub fn new(key: impl Into<String>, value: Money) -> Self {
        Self {
            id: Attr::Null,
            key: key.into(),
            value,
            country: Attr::Null,
            customer_group_id: Attr::Null,
            channel_id: Attr::Null,
        }
    }

    /// Equal apart from the server-assigned id.
    #[must_use]
    pub fn same_content(&self, other: &Self) -> bool {
        self.key == other.key
            && self.value == other.value
            && self.country == other.country
            && self.customer_group_id == other.customer_group_id
            && self.channel_id == other.channel_id
    }

    pub(crate) fn to_draft(&self) -> PriceDraft {
        PriceDraft {
            key: Some(self.key.clone()),
            value: self.value.clone(),
            country: self.country.to_option(),
            customer_group: self
                .customer_group_id
                .as_deref()
                .map(|id| ResourceIdentifier::by_id("customer-group", id)),
            channel: self
                .channel_id
                .as_deref()
                .map(|id| ResourceIdentifier::by_id("channel", id)),
        }
    }

    fn from_remote(remote: &RemotePrice) -> Self {
        Self {
            id: Attr::known(remote.id.clone()),
            key: remote.key.clone().unwrap_or_default(),
            value: remote.value.clone(),
            country: remote.country.clone().into(),
            customer_group_id: remote.customer_group.as_ref().map(|r| r.id.clone()).into(),
            channel_id: remote.channel.as_ref().map(|r| r.id.clone()).into(),
        }
    }
}

// ── Remote shapes ────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemoteAttribute {
    pub name: String,
    pub value: Value,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemotePrice {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
    pub value: Money,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub customer_group: Option<Reference>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub channel: Option<Reference>,
}

impl RemotePrice {
    pub(crate) fn from_draft(draft: &PriceDraft, id: String) -> ModelResult<Self> {
        Ok(Self {
            id,
            key: draft.key.clone(),
            value: draft.value.clone(),
            country: draft.country.clone(),
            customer_group: draft.customer_group.as_ref().map(reference_from_identifier).transpose()?,
            channel: draft.channel.as_ref().map(reference_from_identifier).transpose()?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteVariant {
    pub id: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sku: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
    #[serde(default)]
    pub attributes: Vec<RemoteAttribute>,
    #[serde(default)]
    pub prices: Vec<RemotePrice>,
}

impl RemoteVariant {
    pub(crate) fn from_draft(draft: &VariantDraft, id: i64) -> ModelResult<Self> {
        let sku = draft.sku.clone().unwrap_or_default();
        Ok(Self {
            id,
            sku: draft.sku.clone(),
            key: draft.key.clone(),
            attributes: draft.attributes.clone(),
            prices: draft
                .prices
                .iter()
                .enumerate()
                .map(|(i, p)| RemotePrice::from_draft(p, price_id(&sku, p.key.as_deref(), i)))
                .collect::<ModelResult<Vec<_>>>()?,
        })
    }
}

/// Id the in-memory remote assigns to a price.
pub(crate) fn price_id(sku: &str, key: Option<&str>, index: usize) -> String {
    match key {
        Some(key) => format!("price-{sku}-{key}"),
        None => format!("price-{sku}-{index}"),
    }
}

// ── Drafts ───────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceDraft {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
    pub value: Money,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub customer_group: Option<ResourceIdentifier>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub channel: Option<ResourceIdentifier>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VariantDraft {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sku: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
    #[serde(default)]
    pub attributes: Vec<RemoteAttribute>,
    #[serde(default)]
    pub prices: Vec<PriceDraft>,
}
