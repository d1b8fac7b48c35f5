//! Products.
//!
//! A product owns a master variant and further variants, each identified by
//! SKU, and each variant owns prices identified by key. Variant and price
//! ids are assigned by the remote; the planner copies them from the prior
//! state so that only genuinely new elements show up as unknown.
//!
//! Switching the master variant is expressed as `changeMasterVariant`, which
//! is always sent before the former master is removed.

mod actions;
mod variant;

pub use actions::ProductAction;
pub use variant::{
    AttributeValue, Price, PriceDraft, RemoteAttribute, RemotePrice, RemoteVariant, Variant,
    VariantDraft,
};

use crate::custom_fields::reference_from_identifier;
use crate::support::{
    ensure_unchanged, ensure_unique_keys, pinned_version, validate_localized,
    validate_localized_opt,
};
use crate::{
    ActionContext, Creatable, Identity, Materialize, ModelError, ModelResult, RemoteModel,
    RemoteObject, Resource, UpdatePlan,
};
use commerce_diff::sort_by_plan;
use commerce_types::{Attr, LocalizedString, Reference, ResourceIdentifier};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    #[serde(flatten)]
    pub identity: Identity,
    #[serde(default)]
    pub key: Attr<String>,
    pub product_type_id: String,
    pub name: LocalizedString,
    pub slug: LocalizedString,
    #[serde(default)]
    pub description: Option<LocalizedString>,
    #[serde(default)]
    pub meta_title: Option<LocalizedString>,
    #[serde(default)]
    pub meta_description: Option<LocalizedString>,
    #[serde(default)]
    pub meta_keywords: Option<LocalizedString>,
    /// Category ids.
    #[serde(default)]
    pub categories: Vec<String>,
    #[serde(default)]
    pub tax_category_id: Attr<String>,
    #[serde(default)]
    pub state_id: Attr<String>,
    #[serde(default)]
    pub publish: bool,
    pub master_variant: Variant,
    #[serde(default)]
    pub variants: Vec<Variant>,
}

impl Product {
    pub fn new(
        product_type_id: impl Into<String>,
        name: LocalizedString,
        slug: LocalizedString,
        master_variant: Variant,
    ) -> Self {
        Self {
            identity: Identity::default(),
            key: Attr::Null,
            product_type_id: product_type_id.into(),
            name,
            slug,
            description: None,
            meta_title: None,
            meta_description: None,
            meta_keywords: None,
            categories: Vec::new(),
            tax_category_id: Attr::Null,
            state_id: Attr::Null,
            publish: false,
            master_variant,
            variants: Vec::new(),
        }
    }

    /// Master variant followed by the other variants.
    #[must_use]
    pub fn all_variants(&self) -> Vec<Variant> {
        std::iter::once(&self.master_variant)
            .chain(&self.variants)
            .cloned()
            .collect()
    }

    fn all_variants_mut(&mut self) -> impl Iterator<Item = &mut Variant> {
        std::iter::once(&mut self.master_variant).chain(self.variants.iter_mut())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductRemote {
    pub id: String,
    pub version: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
    pub product_type: Reference,
    pub name: LocalizedString,
    pub slug: LocalizedString,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<LocalizedString>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta_title: Option<LocalizedString>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta_description: Option<LocalizedString>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta_keywords: Option<LocalizedString>,
    #[serde(default)]
    pub categories: Vec<Reference>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tax_category: Option<Reference>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<Reference>,
    #[serde(default)]
    pub published: bool,
    pub master_variant: RemoteVariant,
    #[serde(default)]
    pub variants: Vec<RemoteVariant>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductDraft {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
    pub product_type: ResourceIdentifier,
    pub name: LocalizedString,
    pub slug: LocalizedString,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<LocalizedString>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta_title: Option<LocalizedString>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta_description: Option<LocalizedString>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta_keywords: Option<LocalizedString>,
    #[serde(default)]
    pub categories: Vec<ResourceIdentifier>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tax_category: Option<ResourceIdentifier>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<ResourceIdentifier>,
    #[serde(default)]
    pub publish: bool,
    pub master_variant: VariantDraft,
    #[serde(default)]
    pub variants: Vec<VariantDraft>,
}

impl Resource for Product {
    const TYPE_NAME: &'static str = "commerce_product";
    const ENDPOINT: &'static str = "products";

    type Remote = ProductRemote;
    type Action = ProductAction;

    fn identity(&self) -> &Identity {
        &self.identity
    }

    fn identity_mut(&mut self) -> &mut Identity {
        &mut self.identity
    }

    fn from_remote(remote: &ProductRemote) -> ModelResult<Self> {
        Ok(Self {
            identity: Identity::new(&remote.id, remote.version),
            key: remote.key.clone().into(),
            product_type_id: remote.product_type.id.clone(),
            name: remote.name.clone(),
            slug: remote.slug.clone(),
            description: remote.description.clone(),
            meta_title: remote.meta_title.clone(),
            meta_description: remote.meta_description.clone(),
            meta_keywords: remote.meta_keywords.clone(),
            categories: remote.categories.iter().map(|c| c.id.clone()).collect(),
            tax_category_id: remote.tax_category.as_ref().map(|r| r.id.clone()).into(),
            state_id: remote.state.as_ref().map(|r| r.id.clone()).into(),
            publish: remote.published,
            master_variant: Variant::from_remote(&remote.master_variant),
            variants: remote.variants.iter().map(Variant::from_remote).collect(),
        })
    }

    fn update_actions(
        &self,
        desired: &Self,
        _ctx: &ActionContext,
    ) -> ModelResult<UpdatePlan<ProductAction>> {
        ensure_unchanged("product_type_id", &self.product_type_id, &desired.product_type_id)?;
        desired.validate()?;
        Ok(UpdatePlan::new(
            pinned_version(&self.identity.version)?,
            actions::product_actions(self, desired)?,
        ))
    }

    fn validate(&self) -> ModelResult<()> {
        validate_localized("name", &self.name)?;
        validate_localized("slug", &self.slug)?;
        validate_localized_opt("description", self.description.as_ref())?;
        validate_localized_opt("meta_title", self.meta_title.as_ref())?;
        validate_localized_opt("meta_description", self.meta_description.as_ref())?;
        validate_localized_opt("meta_keywords", self.meta_keywords.as_ref())?;
        ensure_unique_keys("categories", "category", self.categories.iter().map(String::as_str))?;

        let all = self.all_variants();
        if let Some(pos) = all.iter().position(|v| v.sku.is_empty()) {
            return Err(ModelError::invalid_input(
                format!("variants[{pos}].sku"),
                "every variant needs a SKU",
            ));
        }
        ensure_unique_keys("variants", "SKU", all.iter().map(|v| v.sku.as_str()))?;
        for variant in &all {
            let path = format!("variants[{}]", variant.sku);
            ensure_unique_keys(&path, "price key", variant.prices.iter().map(|p| p.key.as_str()))?;
            ensure_unique_keys(&path, "attribute", variant.attributes.iter().map(|a| a.name.as_str()))?;
            if variant.prices.iter().any(|p| p.key.is_empty()) {
                return Err(ModelError::invalid_input(path, "every price needs a key"));
            }
        }
        Ok(())
    }

    fn align_with_plan(&mut self, plan: &Self) {
        let categories = std::mem::take(&mut self.categories);
        self.categories = sort_by_plan(plan.categories.iter().map(String::as_str), categories);

        let variants = std::mem::take(&mut self.variants);
        self.variants = sort_by_plan(plan.variants.iter().map(|v| v.sku.as_str()), variants);

        let planned: HashMap<&str, &Variant> = std::iter::once(&plan.master_variant)
            .chain(&plan.variants)
            .map(|v| (v.sku.as_str(), v))
            .collect();
        for variant in self.all_variants_mut() {
            let Some(planned) = planned.get(variant.sku.as_str()) else {
                continue;
            };
            let prices = std::mem::take(&mut variant.prices);
            variant.prices = sort_by_plan(planned.prices.iter().map(|p| p.key.as_str()), prices);
            let attributes = std::mem::take(&mut variant.attributes);
            variant.attributes =
                sort_by_plan(planned.attributes.iter().map(|a| a.name.as_str()), attributes);
        }
    }

    /// Copies variant and price ids from the prior state, matched by SKU and
    /// price key. Everything new is planned as unknown.
    fn modify_plan(&mut self, prior: Option<&Self>) {
        self.identity = prior.map_or_else(Identity::unknown, |p| p.identity.clone());

        let prior_variants: HashMap<&str, &Variant> = prior
            .map(|p| {
                std::iter::once(&p.master_variant)
                    .chain(&p.variants)
                    .map(|v| (v.sku.as_str(), v))
                    .collect()
            })
            .unwrap_or_default();

        for variant in self.all_variants_mut() {
            match prior_variants.get(variant.sku.as_str()) {
                Some(prior) => {
                    variant.id = prior.id.clone();
                    for price in &mut variant.prices {
                        price.id = prior
                            .prices
                            .iter()
                            .find(|p| p.key == price.key)
                            .map_or(Attr::Unknown, |p| p.id.clone());
                    }
                }
                None => {
                    variant.id = Attr::Unknown;
                    for price in &mut variant.prices {
                        price.id = Attr::Unknown;
                    }
                }
            }
        }
    }
}

impl Creatable for Product {
    type Draft = ProductDraft;

    fn draft(&self, _ctx: &ActionContext) -> ModelResult<ProductDraft> {
        self.validate()?;
        Ok(ProductDraft {
            key: self.key.to_option(),
            product_type: ResourceIdentifier::by_id("product-type", &self.product_type_id),
            name: self.name.clone(),
            slug: self.slug.clone(),
            description: self.description.clone(),
            meta_title: self.meta_title.clone(),
            meta_description: self.meta_description.clone(),
            meta_keywords: self.meta_keywords.clone(),
            categories: self
                .categories
                .iter()
                .map(|id| ResourceIdentifier::by_id("category", id))
                .collect(),
            tax_category: self
                .tax_category_id
                .as_deref()
                .map(|id| ResourceIdentifier::by_id("tax-category", id)),
            state: self
                .state_id
                .as_deref()
                .map(|id| ResourceIdentifier::by_id("state", id)),
            publish: self.publish,
            master_variant: self.master_variant.to_draft(),
            variants: self.variants.iter().map(Variant::to_draft).collect(),
        })
    }
}

impl RemoteObject for ProductRemote {
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

impl RemoteModel for ProductRemote {
    type Action = ProductAction;

    fn apply_action(&mut self, action: &ProductAction) -> ModelResult<()> {
        self.apply(action)
    }
}

impl Materialize for ProductRemote {
    type Draft = ProductDraft;

    fn materialize(draft: ProductDraft, id: String) -> ModelResult<Self> {
        let variants = draft
            .variants
            .iter()
            .enumerate()
            .map(|(i, v)| RemoteVariant::from_draft(v, i as i64 + 2))
            .collect::<ModelResult<Vec<_>>>()?;
        Ok(Self {
            id,
            version: 1,
            key: draft.key,
            product_type: reference_from_identifier(&draft.product_type)?,
            name: draft.name,
            slug: draft.slug,
            description: draft.description,
            meta_title: draft.meta_title,
            meta_description: draft.meta_description,
            meta_keywords: draft.meta_keywords,
            categories: draft
                .categories
                .iter()
                .map(reference_from_identifier)
                .collect::<ModelResult<Vec<_>>>()?,
            tax_category: draft.tax_category.as_ref().map(reference_from_identifier).transpose()?,
            state: draft.state.as_ref().map(reference_from_identifier).transpose()?,
            published: draft.publish,
            master_variant: RemoteVariant::from_draft(&draft.master_variant, 1)?,
            variants,
        })
    }
}
