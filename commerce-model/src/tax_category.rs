//! Tax categories.
//!
//! Rates are identified by key. The remote assigns a new id whenever a rate
//! is added or replaced, so the planner only keeps the prior id of a rate
//! whose content stays the same.

use crate::support::{changed, ensure_unique_keys, pinned_version, Phases};
use crate::{
    ActionContext, Creatable, Identity, Materialize, ModelError, ModelResult, RemoteModel,
    RemoteObject, Resource, UpdatePlan,
};
use commerce_diff::{diff_keyed_with, sort_by_plan, Keyed};
use commerce_types::Attr;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubRate {
    pub name: String,
    pub amount: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaxRate {
    #[serde(default)]
    pub id: Attr<String>,
    pub key: String,
    pub name: String,
    /// Fraction between 0 and 1.
    pub amount: f64,
    #[serde(default)]
    pub included_in_price: bool,
    pub country: String,
    #[serde(default)]
    pub state: Attr<String>,
    #[serde(default)]
    pub sub_rates: Vec<SubRate>,
}

impl Keyed for TaxRate {
    fn key(&self) -> &str {
        &self.key
    }
}

impl TaxRate {
    pub fn new(key: impl Into<String>, name: impl Into<String>, amount: f64, country: impl Into<String>) -> Self {
        Self {
            id: Attr::Null,
            key: key.into(),
            name: name.into(),
            amount,
            included_in_price: false,
            country: country.into(),
            state: Attr::Null,
            sub_rates: Vec::new(),
        }
    }

    /// Equal apart from the server-assigned id.
    #[must_use]
    pub fn same_content(&self, other: &Self) -> bool {
        self.key == other.key
            && self.name == other.name
            && self.amount == other.amount
            && self.included_in_price == other.included_in_price
            && self.country == other.country
            && self.state == other.state
            && self.sub_rates == other.sub_rates
    }

    fn to_draft(&self) -> TaxRateDraft {
        TaxRateDraft {
            key: Some(self.key.clone()),
            name: self.name.clone(),
            amount: self.amount,
            included_in_price: self.included_in_price,
            country: self.country.clone(),
            state: self.state.to_option(),
            sub_rates: self.sub_rates.clone(),
        }
    }

    fn from_remote(remote: &RemoteTaxRate) -> Self {
        Self {
            id: Attr::known(remote.id.clone()),
            key: remote.key.clone().unwrap_or_default(),
            name: remote.name.clone(),
            amount: remote.amount,
            included_in_price: remote.included_in_price,
            country: remote.country.clone(),
            state: remote.state.clone().into(),
            sub_rates: remote.sub_rates.clone(),
        }
    }

    fn known_id(&self) -> ModelResult<String> {
        self.id
            .as_known()
            .cloned()
            .ok_or_else(|| ModelError::Internal(format!("stored tax rate '{}' has no id", self.key)))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaxCategory {
    #[serde(flatten)]
    pub identity: Identity,
    #[serde(default)]
    pub key: Attr<String>,
    pub name: String,
    #[serde(default)]
    pub description: Attr<String>,
    #[serde(default)]
    pub rates: Vec<TaxRate>,
}

impl TaxCategory {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            identity: Identity::default(),
            key: Attr::Null,
            name: name.into(),
            description: Attr::Null,
            rates: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_rate(mut self, rate: TaxRate) -> Self {
        self.rates.push(rate);
        self
    }
}

// ── Remote shapes ────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteTaxRate {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
    pub name: String,
    pub amount: f64,
    pub included_in_price: bool,
    pub country: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    #[serde(default)]
    pub sub_rates: Vec<SubRate>,
}

impl RemoteTaxRate {
    fn from_draft(draft: &TaxRateDraft, id: String) -> Self {
        Self {
            id,
            key: draft.key.clone(),
            name: draft.name.clone(),
            amount: draft.amount,
            included_in_price: draft.included_in_price,
            country: draft.country.clone(),
            state: draft.state.clone(),
            sub_rates: draft.sub_rates.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaxRateDraft {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
    pub name: String,
    pub amount: f64,
    pub included_in_price: bool,
    pub country: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    #[serde(default)]
    pub sub_rates: Vec<SubRate>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaxCategoryRemote {
    pub id: String,
    pub version: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub rates: Vec<RemoteTaxRate>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaxCategoryDraft {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub rates: Vec<TaxRateDraft>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "camelCase")]
pub enum TaxCategoryAction {
    ChangeName {
        name: String,
    },
    SetKey {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        key: Option<String>,
    },
    SetDescription {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        description: Option<String>,
    },
    #[serde(rename_all = "camelCase")]
    AddTaxRate { tax_rate: TaxRateDraft },
    #[serde(rename_all = "camelCase")]
    ReplaceTaxRate {
        tax_rate_id: String,
        tax_rate: TaxRateDraft,
    },
    #[serde(rename_all = "camelCase")]
    RemoveTaxRate { tax_rate_id: String },
}

impl Resource for TaxCategory {
    const TYPE_NAME: &'static str = "commerce_tax_category";
    const ENDPOINT: &'static str = "tax-categories";

    type Remote = TaxCategoryRemote;
    type Action = TaxCategoryAction;

    fn identity(&self) -> &Identity {
        &self.identity
    }

    fn identity_mut(&mut self) -> &mut Identity {
        &mut self.identity
    }

    fn from_remote(remote: &TaxCategoryRemote) -> ModelResult<Self> {
        Ok(Self {
            identity: Identity::new(&remote.id, remote.version),
            key: remote.key.clone().into(),
            name: remote.name.clone(),
            description: remote.description.clone().into(),
            rates: remote.rates.iter().map(TaxRate::from_remote).collect(),
        })
    }

    fn update_actions(
        &self,
        desired: &Self,
        _ctx: &ActionContext,
    ) -> ModelResult<UpdatePlan<TaxCategoryAction>> {
        desired.validate()?;

        let mut phases = Phases::default();
        if self.name != desired.name {
            phases.scalars.push(TaxCategoryAction::ChangeName {
                name: desired.name.clone(),
            });
        }
        if changed(&self.key, &desired.key) {
            phases.scalars.push(TaxCategoryAction::SetKey {
                key: desired.key.to_option(),
            });
        }
        if changed(&self.description, &desired.description) {
            phases.scalars.push(TaxCategoryAction::SetDescription {
                description: desired.description.to_option(),
            });
        }

        let rates = diff_keyed_with(&self.rates, &desired.rates, TaxRate::same_content);
        for rate in rates.added {
            phases.additions.push(TaxCategoryAction::AddTaxRate {
                tax_rate: rate.to_draft(),
            });
        }
        for m in rates.modified {
            phases.mutations.push(TaxCategoryAction::ReplaceTaxRate {
                tax_rate_id: m.current.known_id()?,
                tax_rate: m.desired.to_draft(),
            });
        }
        for rate in rates.removed {
            phases.removals.push(TaxCategoryAction::RemoveTaxRate {
                tax_rate_id: rate.known_id()?,
            });
        }

        Ok(UpdatePlan::new(
            pinned_version(&self.identity.version)?,
            phases.into_actions(),
        ))
    }

    fn validate(&self) -> ModelResult<()> {
        ensure_unique_keys("rates", "tax rate key", self.rates.iter().map(|r| r.key.as_str()))?;
        for rate in &self.rates {
            if rate.key.is_empty() {
                return Err(ModelError::invalid_input("rates", "every tax rate needs a key"));
            }
            if !(0.0..=1.0).contains(&rate.amount) {
                return Err(ModelError::invalid_input(
                    format!("rates[{}].amount", rate.key),
                    format!("amount {} is not between 0 and 1", rate.amount),
                ));
            }
        }
        Ok(())
    }

    fn align_with_plan(&mut self, plan: &Self) {
        let rates = std::mem::take(&mut self.rates);
        self.rates = sort_by_plan(plan.rates.iter().map(|r| r.key.as_str()), rates);
    }

    fn modify_plan(&mut self, prior: Option<&Self>) {
        self.identity = prior.map_or_else(Identity::unknown, |p| p.identity.clone());
        for rate in &mut self.rates {
            rate.id = prior
                .and_then(|p| p.rates.iter().find(|r| r.key == rate.key))
                .filter(|r| r.same_content(rate))
                .map_or(Attr::Unknown, |r| r.id.clone());
        }
    }
}

impl Creatable for TaxCategory {
    type Draft = TaxCategoryDraft;

    fn draft(&self, _ctx: &ActionContext) -> ModelResult<TaxCategoryDraft> {
        self.validate()?;
        Ok(TaxCategoryDraft {
            key: self.key.to_option(),
            name: self.name.clone(),
            description: self.description.to_option(),
            rates: self.rates.iter().map(TaxRate::to_draft).collect(),
        })
    }
}

impl RemoteObject for TaxCategoryRemote {
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

impl TaxCategoryRemote {
    /// Next id after the highest one in use.
    fn next_rate_id(&self) -> String {
        let next = self
            .rates
            .iter()
            .filter_map(|r| r.id.rsplit('-').next()?.parse::<u64>().ok())
            .max()
            .map_or(1, |n| n + 1);
        format!("{}-rate-{next}", self.id)
    }

    fn rate_position(&self, rate_id: &str) -> ModelResult<usize> {
        self.rates
            .iter()
            .position(|r| r.id == rate_id)
            .ok_or_else(|| ModelError::invalid_reference("rates", format!("no tax rate with id '{rate_id}'")))
    }
}

impl RemoteModel for TaxCategoryRemote {
    type Action = TaxCategoryAction;

    fn apply_action(&mut self, action: &TaxCategoryAction) -> ModelResult<()> {
        match action {
            TaxCategoryAction::ChangeName { name } => self.name = name.clone(),
            TaxCategoryAction::SetKey { key } => self.key = key.clone(),
            TaxCategoryAction::SetDescription { description } => self.description = description.clone(),
            TaxCategoryAction::AddTaxRate { tax_rate } => {
                let id = self.next_rate_id();
                self.rates.push(RemoteTaxRate::from_draft(tax_rate, id));
            }
            TaxCategoryAction::ReplaceTaxRate {
                tax_rate_id,
                tax_rate,
            } => {
                let pos = self.rate_position(tax_rate_id)?;
                let id = self.next_rate_id();
                self.rates[pos] = RemoteTaxRate::from_draft(tax_rate, id);
            }
            TaxCategoryAction::RemoveTaxRate { tax_rate_id } => {
                let pos = self.rate_position(tax_rate_id)?;
                self.rates.remove(pos);
            }
        }
        Ok(())
    }
}

impl Materialize for TaxCategoryRemote {
    type Draft = TaxCategoryDraft;

    fn materialize(draft: TaxCategoryDraft, id: String) -> ModelResult<Self> {
        let rates = draft
            .rates
            .iter()
            .enumerate()
            .map(|(i, r)| RemoteTaxRate::from_draft(r, format!("{id}-rate-{}", i + 1)))
            .collect();
        Ok(Self {
            id,
            version: 1,
            key: draft.key,
            name: draft.name,
            description: draft.description,
            rates,
        })
    }
}
