//! Product update actions and their server-side semantics.

use super::variant::{price_id, PriceDraft, RemoteAttribute, RemotePrice, RemoteVariant, Variant};
use super::{Product, ProductRemote};
use crate::custom_fields::{reference_from_identifier, same_value};
use crate::support::{changed, Phases};
use crate::{ModelError, ModelResult};
use commerce_diff::{diff_keyed_with, diff_sets};
use commerce_types::{LocalizedString, ResourceIdentifier};
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "camelCase")]
pub enum ProductAction {
    ChangeName {
        name: LocalizedString,
    },
    ChangeSlug {
        slug: LocalizedString,
    },
    SetKey {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        key: Option<String>,
    },
    SetDescription {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        description: Option<LocalizedString>,
    },
    #[serde(rename_all = "camelCase")]
    SetMetaTitle {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        meta_title: Option<LocalizedString>,
    },
    #[serde(rename_all = "camelCase")]
    SetMetaDescription {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        meta_description: Option<LocalizedString>,
    },
    #[serde(rename_all = "camelCase")]
    SetMetaKeywords {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        meta_keywords: Option<LocalizedString>,
    },
    #[serde(rename_all = "camelCase")]
    SetTaxCategory {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        tax_category: Option<ResourceIdentifier>,
    },
    TransitionState {
        state: ResourceIdentifier,
        #[serde(default)]
        force: bool,
    },
    AddVariant {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        sku: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        key: Option<String>,
        #[serde(default)]
        attributes: Vec<RemoteAttribute>,
        #[serde(default)]
        prices: Vec<PriceDraft>,
    },
    SetProductVariantKey {
        sku: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        key: Option<String>,
    },
    SetAttribute {
        sku: String,
        name: String,
        /// Absent removes the attribute.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        value: Option<Value>,
    },
    AddPrice {
        sku: String,
        price: PriceDraft,
    },
    #[serde(rename_all = "camelCase")]
    ChangePrice {
        price_id: String,
        price: PriceDraft,
    },
    #[serde(rename_all = "camelCase")]
    RemovePrice {
        price_id: String,
    },
    AddToCategory {
        category: ResourceIdentifier,
    },
    RemoveFromCategory {
        category: ResourceIdentifier,
    },
    ChangeMasterVariant {
        sku: String,
    },
    RemoveVariant {
        sku: String,
    },
    Publish,
    Unpublish,
}

fn category(id: &str) -> ResourceIdentifier {
    ResourceIdentifier::by_id("category", id)
}

fn known_price_id(price: &super::Price, sku: &str) -> ModelResult<String> {
    price.id.as_known().cloned().ok_or_else(|| {
        ModelError::Internal(format!(
            "stored price '{}' of variant '{sku}' has no id",
            price.key
        ))
    })
}

/// Per-element mutations of a variant present on both sides.
fn variant_mutations(current: &Variant, desired: &Variant, out: &mut Vec<ProductAction>) -> ModelResult<()> {
    let sku = &desired.sku;
    if changed(&current.key, &desired.key) {
        out.push(ProductAction::SetProductVariantKey {
            sku: sku.clone(),
            key: desired.key.to_option(),
        });
    }

    let attributes = diff_keyed_with(&current.attributes, &desired.attributes, |a, b| {
        same_value(&a.value, &b.value)
    });
    for attr in attributes.added {
        out.push(ProductAction::SetAttribute {
            sku: sku.clone(),
            name: attr.name.clone(),
            value: Some(attr.encoded()),
        });
    }
    for m in attributes.modified {
        out.push(ProductAction::SetAttribute {
            sku: sku.clone(),
            name: m.desired.name.clone(),
            value: Some(m.desired.encoded()),
        });
    }
    for attr in attributes.removed {
        out.push(ProductAction::SetAttribute {
            sku: sku.clone(),
            name: attr.name.clone(),
            value: None,
        });
    }

    let prices = diff_keyed_with(&current.prices, &desired.prices, super::Price::same_content);
    for price in prices.added {
        out.push(ProductAction::AddPrice {
            sku: sku.clone(),
            price: price.to_draft(),
        });
    }
    for m in prices.modified {
        out.push(ProductAction::ChangePrice {
            price_id: known_price_id(m.current, sku)?,
            price: m.desired.to_draft(),
        });
    }
    for price in prices.removed {
        out.push(ProductAction::RemovePrice {
            price_id: known_price_id(price, sku)?,
        });
    }
    Ok(())
}

/// Builds the ordered product actions.
pub(super) fn product_actions(current: &Product, desired: &Product) -> ModelResult<Vec<ProductAction>> {
    let mut phases = Phases::default();

    if current.name != desired.name {
        phases.scalars.push(ProductAction::ChangeName {
            name: desired.name.clone(),
        });
    }
    if current.slug != desired.slug {
        phases.scalars.push(ProductAction::ChangeSlug {
            slug: desired.slug.clone(),
        });
    }
    if changed(&current.key, &desired.key) {
        phases.scalars.push(ProductAction::SetKey {
            key: desired.key.to_option(),
        });
    }
    if current.description != desired.description {
        phases.scalars.push(ProductAction::SetDescription {
            description: desired.description.clone(),
        });
    }
    if current.meta_title != desired.meta_title {
        phases.scalars.push(ProductAction::SetMetaTitle {
            meta_title: desired.meta_title.clone(),
        });
    }
    if current.meta_description != desired.meta_description {
        phases.scalars.push(ProductAction::SetMetaDescription {
            meta_description: desired.meta_description.clone(),
        });
    }
    if current.meta_keywords != desired.meta_keywords {
        phases.scalars.push(ProductAction::SetMetaKeywords {
            meta_keywords: desired.meta_keywords.clone(),
        });
    }
    if changed(&current.tax_category_id, &desired.tax_category_id) {
        phases.scalars.push(ProductAction::SetTaxCategory {
            tax_category: desired
                .tax_category_id
                .as_deref()
                .map(|id| ResourceIdentifier::by_id("tax-category", id)),
        });
    }
    if changed(&current.state_id, &desired.state_id) {
        let id = desired.state_id.as_deref().ok_or_else(|| {
            ModelError::invalid_input("state_id", "a product state cannot be removed once set")
        })?;
        phases.scalars.push(ProductAction::TransitionState {
            state: ResourceIdentifier::by_id("state", id),
            force: true,
        });
    }

    let current_all = current.all_variants();
    let desired_all = desired.all_variants();
    let variants = diff_keyed_with(&current_all, &desired_all, Variant::same_content);

    for added in &variants.added {
        let draft = added.to_draft();
        phases.additions.push(ProductAction::AddVariant {
            sku: draft.sku,
            key: draft.key,
            attributes: draft.attributes,
            prices: draft.prices,
        });
    }
    for m in &variants.modified {
        variant_mutations(m.current, m.desired, &mut phases.mutations)?;
    }

    let categories = diff_sets(&current.categories, &desired.categories);
    for id in categories.added {
        phases.references.push(ProductAction::AddToCategory { category: category(id) });
    }
    for id in categories.removed {
        phases.references.push(ProductAction::RemoveFromCategory { category: category(id) });
    }

    if current.master_variant.sku != desired.master_variant.sku {
        let sku = &desired.master_variant.sku;
        if !current_all.iter().any(|v| &v.sku == sku) {
            return Err(ModelError::invalid_input(
                "master_variant.sku",
                format!("new master variant '{sku}' must already exist; add it as a variant first"),
            ));
        }
        phases.pivot.push(ProductAction::ChangeMasterVariant { sku: sku.clone() });
    }

    for removed in &variants.removed {
        phases.removals.push(ProductAction::RemoveVariant {
            sku: removed.sku.clone(),
        });
    }

    if desired.publish && (!current.publish || !phases.is_empty()) {
        phases.trailing.push(ProductAction::Publish);
    } else if !desired.publish && current.publish {
        phases.trailing.push(ProductAction::Unpublish);
    }

    Ok(phases.into_actions())
}

// ── Server semantics ─────────────────────────────────────────────

impl ProductRemote {
    fn variant_mut(&mut self, sku: &str) -> ModelResult<&mut RemoteVariant> {
        if self.master_variant.sku.as_deref() == Some(sku) {
            return Ok(&mut self.master_variant);
        }
        self.variants
            .iter_mut()
            .find(|v| v.sku.as_deref() == Some(sku))
            .ok_or_else(|| ModelError::invalid_reference("variants", format!("no variant with sku '{sku}'")))
    }

    fn price_mut(&mut self, price_id: &str) -> ModelResult<&mut RemotePrice> {
        std::iter::once(&mut self.master_variant)
            .chain(self.variants.iter_mut())
            .flat_map(|v| v.prices.iter_mut())
            .find(|p| p.id == price_id)
            .ok_or_else(|| ModelError::invalid_reference("prices", format!("no price with id '{price_id}'")))
    }

    fn next_variant_id(&self) -> i64 {
        self.variants
            .iter()
            .map(|v| v.id)
            .chain(std::iter::once(self.master_variant.id))
            .max()
            .unwrap_or(0)
            + 1
    }

    pub(super) fn apply(&mut self, action: &ProductAction) -> ModelResult<()> {
        match action {
            ProductAction::ChangeName { name } => self.name = name.clone(),
            ProductAction::ChangeSlug { slug } => self.slug = slug.clone(),
            ProductAction::SetKey { key } => self.key = key.clone(),
            ProductAction::SetDescription { description } => self.description = description.clone(),
            ProductAction::SetMetaTitle { meta_title } => self.meta_title = meta_title.clone(),
            ProductAction::SetMetaDescription { meta_description } => {
                self.meta_description = meta_description.clone();
            }
            ProductAction::SetMetaKeywords { meta_keywords } => {
                self.meta_keywords = meta_keywords.clone();
            }
            ProductAction::SetTaxCategory { tax_category } => {
                self.tax_category = tax_category.as_ref().map(reference_from_identifier).transpose()?;
            }
            ProductAction::TransitionState { state, .. } => {
                self.state = Some(reference_from_identifier(state)?);
            }
            ProductAction::AddVariant {
                sku,
                key,
                attributes,
                prices,
            } => {
                if let Some(sku) = sku {
                    if self.variant_mut(sku).is_ok() {
                        return Err(ModelError::invalid_input(
                            "variants",
                            format!("a variant with sku '{sku}' already exists"),
                        ));
                    }
                }
                let draft = super::variant::VariantDraft {
                    sku: sku.clone(),
                    key: key.clone(),
                    attributes: attributes.clone(),
                    prices: prices.clone(),
                };
                let id = self.next_variant_id();
                self.variants.push(RemoteVariant::from_draft(&draft, id)?);
            }
            ProductAction::SetProductVariantKey { sku, key } => {
                self.variant_mut(sku)?.key = key.clone();
            }
            ProductAction::SetAttribute { sku, name, value } => {
                let variant = self.variant_mut(sku)?;
                match value {
                    Some(value) => match variant.attributes.iter_mut().find(|a| &a.name == name) {
                        Some(attr) => attr.value = value.clone(),
                        None => variant.attributes.push(RemoteAttribute {
                            name: name.clone(),
                            value: value.clone(),
                        }),
                    },
                    None => variant.attributes.retain(|a| &a.name != name),
                }
            }
            ProductAction::AddPrice { sku, price } => {
                let variant = self.variant_mut(sku)?;
                let id = price_id(sku, price.key.as_deref(), variant.prices.len());
                if variant.prices.iter().any(|p| p.id == id) {
                    return Err(ModelError::invalid_input(
                        "prices",
                        format!("variant '{sku}' already has a price with key {:?}", price.key),
                    ));
                }
                variant.prices.push(RemotePrice::from_draft(price, id)?);
            }
            ProductAction::ChangePrice { price_id, price } => {
                let slot = self.price_mut(price_id)?;
                *slot = RemotePrice::from_draft(price, price_id.clone())?;
            }
            ProductAction::RemovePrice { price_id } => {
                self.price_mut(price_id)?;
                for variant in std::iter::once(&mut self.master_variant).chain(self.variants.iter_mut()) {
                    variant.prices.retain(|p| &p.id != price_id);
                }
            }
            ProductAction::AddToCategory { category } => {
                let reference = reference_from_identifier(category)?;
                if !self.categories.contains(&reference) {
                    self.categories.push(reference);
                }
            }
            ProductAction::RemoveFromCategory { category } => {
                let reference = reference_from_identifier(category)?;
                self.categories.retain(|c| *c != reference);
            }
            ProductAction::ChangeMasterVariant { sku } => {
                if self.master_variant.sku.as_deref() == Some(sku.as_str()) {
                    return Ok(());
                }
                let pos = self
                    .variants
                    .iter()
                    .position(|v| v.sku.as_deref() == Some(sku.as_str()))
                    .ok_or_else(|| {
                        ModelError::invalid_reference("variants", format!("no variant with sku '{sku}'"))
                    })?;
                let new_master = self.variants.remove(pos);
                let old_master = std::mem::replace(&mut self.master_variant, new_master);
                self.variants.push(old_master);
            }
            ProductAction::RemoveVariant { sku } => {
                if self.master_variant.sku.as_deref() == Some(sku.as_str()) {
                    return Err(ModelError::invalid_input(
                        "variants",
                        format!("variant '{sku}' is the master variant and cannot be removed"),
                    ));
                }
                let before = self.variants.len();
                self.variants.retain(|v| v.sku.as_deref() != Some(sku.as_str()));
                if self.variants.len() == before {
                    return Err(ModelError::invalid_reference(
                        "variants",
                        format!("no variant with sku '{sku}'"),
                    ));
                }
            }
            ProductAction::Publish => self.published = true,
            ProductAction::Unpublish => self.published = false,
        }
        Ok(())
    }
}

