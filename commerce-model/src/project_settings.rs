//! Project-wide settings.
//!
//! The project always exists, so this kind attaches to it: create reads the
//! project and sends the difference, delete only forgets the record.
//! Settings left out of the configuration are not managed and are stored as
//! null. The two nullable remote blocks, external OAuth and the shipping
//! rate input type, are cleared when they disappear from a configuration
//! that used to set them: the stored record still holds them then, while a
//! project read for the first time is aligned with the plan before diffing.

use crate::support::{changed, ensure_unique_keys, pinned_version, Phases};
use crate::{
    ActionContext, Attached, BusinessUnitStatus, Identity, ModelError, ModelResult, RemoteModel,
    RemoteObject, Resource, UpdatePlan, MASKED,
};
use commerce_diff::{same_members, sort_by_plan};
use commerce_types::{Attr, KeyReference, LocalizedString};
use serde::{Deserialize, Serialize};

// ── Record ───────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessagesConfig {
    pub enabled: bool,
    #[serde(default)]
    pub delete_days_after_creation: Attr<i64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartsConfig {
    #[serde(default)]
    pub country_tax_rate_fallback_enabled: Attr<bool>,
    #[serde(default)]
    pub delete_days_after_last_modification: Attr<i64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShoppingListsConfig {
    #[serde(default)]
    pub delete_days_after_last_modification: Attr<i64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExternalOAuth {
    pub url: String,
    /// Write-only.
    pub authorization_header: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShippingRateTier {
    pub key: String,
    pub label: LocalizedString,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ShippingRateInputType {
    CartValue,
    CartClassification { values: Vec<ShippingRateTier> },
    CartScore,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BusinessUnitsConfig {
    #[serde(default)]
    pub my_business_unit_status_on_creation: Attr<BusinessUnitStatus>,
    /// Key of the associate role granted to a buyer creating a unit.
    #[serde(default)]
    pub my_business_unit_associate_role_key_on_creation: Attr<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectSettings {
    #[serde(flatten)]
    pub identity: Identity,
    #[serde(default)]
    pub name: Attr<String>,
    #[serde(default)]
    pub countries: Option<Vec<String>>,
    #[serde(default)]
    pub currencies: Option<Vec<String>>,
    #[serde(default)]
    pub languages: Option<Vec<String>>,
    #[serde(default)]
    pub enable_search_index_products: Attr<bool>,
    #[serde(default)]
    pub enable_search_index_orders: Attr<bool>,
    #[serde(default)]
    pub messages: Option<MessagesConfig>,
    #[serde(default)]
    pub carts: Option<CartsConfig>,
    #[serde(default)]
    pub shopping_lists: Option<ShoppingListsConfig>,
    #[serde(default)]
    pub external_oauth: Option<ExternalOAuth>,
    #[serde(default)]
    pub shipping_rate_input_type: Option<ShippingRateInputType>,
    #[serde(default)]
    pub business_units: Option<BusinessUnitsConfig>,
}

impl Default for ProjectSettings {
    fn default() -> Self {
        Self {
            identity: Identity::default(),
            name: Attr::Null,
            countries: None,
            currencies: None,
            languages: None,
            enable_search_index_products: Attr::Null,
            enable_search_index_orders: Attr::Null,
            messages: None,
            carts: None,
            shopping_lists: None,
            external_oauth: None,
            shipping_rate_input_type: None,
            business_units: None,
        }
    }
}

// ── Remote shapes ────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteMessagesConfig {
    pub enabled: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delete_days_after_creation: Option<i64>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteCartsConfig {
    #[serde(default)]
    pub country_tax_rate_fallback_enabled: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delete_days_after_last_modification: Option<i64>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteShoppingListsConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delete_days_after_last_modification: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteExternalOAuth {
    pub url: String,
    pub authorization_header: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteBusinessUnitsConfig {
    #[serde(default)]
    pub my_business_unit_status_on_creation: BusinessUnitStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub my_business_unit_associate_role_on_creation: Option<KeyReference>,
}

/// Status of a search index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SearchIndexStatus {
    Activated,
    Deactivated,
    Indexing,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchIndexConfig {
    pub status: SearchIndexStatus,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteSearchIndexing {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub products: Option<SearchIndexConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub orders: Option<SearchIndexConfig>,
}

fn index_enabled(config: Option<&SearchIndexConfig>) -> bool {
    config.is_some_and(|c| c.status != SearchIndexStatus::Deactivated)
}

fn index_config(enabled: bool) -> SearchIndexConfig {
    SearchIndexConfig {
        status: if enabled {
            SearchIndexStatus::Activated
        } else {
            SearchIndexStatus::Deactivated
        },
    }
}

/// The project object as returned by the commerce API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectRemote {
    pub key: String,
    pub version: i64,
    pub name: String,
    #[serde(default)]
    pub countries: Vec<String>,
    #[serde(default)]
    pub currencies: Vec<String>,
    #[serde(default)]
    pub languages: Vec<String>,
    pub messages: RemoteMessagesConfig,
    #[serde(default)]
    pub carts: RemoteCartsConfig,
    #[serde(default)]
    pub shopping_lists: RemoteShoppingListsConfig,
    #[serde(default, rename = "externalOAuth", skip_serializing_if = "Option::is_none")]
    pub external_oauth: Option<RemoteExternalOAuth>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shipping_rate_input_type: Option<ShippingRateInputType>,
    #[serde(default)]
    pub business_units: RemoteBusinessUnitsConfig,
    #[serde(default)]
    pub search_indexing: RemoteSearchIndexing,
}

impl ProjectRemote {
    /// A fresh project with every setting at its default.
    pub fn new(key: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            version: 1,
            name: name.into(),
            countries: Vec::new(),
            currencies: Vec::new(),
            languages: Vec::new(),
            messages: RemoteMessagesConfig {
                enabled: false,
                delete_days_after_creation: None,
            },
            carts: RemoteCartsConfig::default(),
            shopping_lists: RemoteShoppingListsConfig::default(),
            external_oauth: None,
            shipping_rate_input_type: None,
            business_units: RemoteBusinessUnitsConfig::default(),
            search_indexing: RemoteSearchIndexing::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "camelCase")]
pub enum ProjectAction {
    ChangeName {
        name: String,
    },
    ChangeCountries {
        countries: Vec<String>,
    },
    ChangeCurrencies {
        currencies: Vec<String>,
    },
    ChangeLanguages {
        languages: Vec<String>,
    },
    #[serde(rename_all = "camelCase")]
    ChangeMessagesConfiguration {
        messages_configuration: RemoteMessagesConfig,
    },
    #[serde(rename_all = "camelCase")]
    ChangeCountryTaxRateFallbackEnabled {
        country_tax_rate_fallback_enabled: bool,
    },
    #[serde(rename_all = "camelCase")]
    ChangeCartsConfiguration {
        carts_configuration: RemoteCartsConfig,
    },
    #[serde(rename_all = "camelCase")]
    ChangeShoppingListsConfiguration {
        shopping_lists_configuration: RemoteShoppingListsConfig,
    },
    #[serde(rename = "setExternalOAuth")]
    SetExternalOAuth {
        #[serde(rename = "externalOAuth", default, skip_serializing_if = "Option::is_none")]
        external_oauth: Option<RemoteExternalOAuth>,
    },
    #[serde(rename_all = "camelCase")]
    SetShippingRateInputType {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        shipping_rate_input_type: Option<ShippingRateInputType>,
    },
    ChangeProductSearchIndexingEnabled {
        enabled: bool,
    },
    ChangeOrderSearchStatus {
        status: SearchIndexStatus,
    },
    SetBusinessUnitStatusOnCreation {
        status: BusinessUnitStatus,
    },
    #[serde(rename_all = "camelCase")]
    SetBusinessUnitAssociateRoleOnCreation {
        associate_role: KeyReference,
    },
}

// ── Diffing ──────────────────────────────────────────────────────

fn list_changed(current: Option<&Vec<String>>, desired: Option<&Vec<String>>) -> Option<Vec<String>> {
    let desired = desired?;
    match current {
        Some(current) if same_members(current, desired) => None,
        _ => Some(desired.clone()),
    }
}

/// Desired value of a nested scalar, or the current one when unknown.
fn resolve<T: Clone>(desired: &Attr<T>, current: Option<&Attr<T>>) -> Option<T> {
    match desired {
        Attr::Known(v) => Some(v.clone()),
        Attr::Null => None,
        Attr::Unknown => current.and_then(|c| c.to_option()),
    }
}

fn messages_actions(current: Option<&MessagesConfig>, desired: &MessagesConfig, out: &mut Vec<ProjectAction>) {
    let differs = current.map_or(true, |c| {
        c.enabled != desired.enabled
            || changed(&c.delete_days_after_creation, &desired.delete_days_after_creation)
    });
    if differs {
        out.push(ProjectAction::ChangeMessagesConfiguration {
            messages_configuration: RemoteMessagesConfig {
                enabled: desired.enabled,
                delete_days_after_creation: resolve(
                    &desired.delete_days_after_creation,
                    current.map(|c| &c.delete_days_after_creation),
                ),
            },
        });
    }
}

fn carts_actions(current: Option<&CartsConfig>, desired: &CartsConfig, out: &mut Vec<ProjectAction>) {
    let fallback_changed = current.map_or(!desired.country_tax_rate_fallback_enabled.is_unknown(), |c| {
        !desired.country_tax_rate_fallback_enabled.is_unknown()
            && c.country_tax_rate_fallback_enabled.get_or(false)
                != desired.country_tax_rate_fallback_enabled.get_or(false)
    });
    let days_changed = current.map_or(!desired.delete_days_after_last_modification.is_unknown(), |c| {
        changed(
            &c.delete_days_after_last_modification,
            &desired.delete_days_after_last_modification,
        )
    });

    if days_changed {
        out.push(ProjectAction::ChangeCartsConfiguration {
            carts_configuration: RemoteCartsConfig {
                country_tax_rate_fallback_enabled: resolve(
                    &desired.country_tax_rate_fallback_enabled,
                    current.map(|c| &c.country_tax_rate_fallback_enabled),
                )
                .unwrap_or(false),
                delete_days_after_last_modification: resolve(
                    &desired.delete_days_after_last_modification,
                    current.map(|c| &c.delete_days_after_last_modification),
                ),
            },
        });
    } else if fallback_changed {
        out.push(ProjectAction::ChangeCountryTaxRateFallbackEnabled {
            country_tax_rate_fallback_enabled: desired.country_tax_rate_fallback_enabled.get_or(false),
        });
    }
}

fn business_units_actions(
    current: Option<&BusinessUnitsConfig>,
    desired: &BusinessUnitsConfig,
    out: &mut Vec<ProjectAction>,
) {
    let current_status = current.map_or(Attr::Null, |c| c.my_business_unit_status_on_creation.clone());
    if let Attr::Known(status) = &desired.my_business_unit_status_on_creation {
        if current_status != Attr::Known(*status) {
            out.push(ProjectAction::SetBusinessUnitStatusOnCreation { status: *status });
        }
    }
    let current_role = current.map_or(Attr::Null, |c| {
        c.my_business_unit_associate_role_key_on_creation.clone()
    });
    if let Attr::Known(key) = &desired.my_business_unit_associate_role_key_on_creation {
        if current_role.as_known() != Some(key) {
            out.push(ProjectAction::SetBusinessUnitAssociateRoleOnCreation {
                associate_role: KeyReference::new("associate-role", key),
            });
        }
    }
}

impl ProjectSettings {
    fn external_oauth_remote(&self) -> Option<RemoteExternalOAuth> {
        self.external_oauth.as_ref().map(|o| RemoteExternalOAuth {
            url: o.url.clone(),
            authorization_header: o.authorization_header.clone(),
        })
    }
}

impl Resource for ProjectSettings {
    const TYPE_NAME: &'static str = "commerce_project_settings";
    const ENDPOINT: &'static str = "";
    const SCHEMA_VERSION: u64 = 2;

    type Remote = ProjectRemote;
    type Action = ProjectAction;

    fn identity(&self) -> &Identity {
        &self.identity
    }

    fn identity_mut(&mut self) -> &mut Identity {
        &mut self.identity
    }

    fn from_remote(remote: &ProjectRemote) -> ModelResult<Self> {
        Ok(Self {
            identity: Identity::new(&remote.key, remote.version),
            name: Attr::known(remote.name.clone()),
            countries: Some(remote.countries.clone()),
            currencies: Some(remote.currencies.clone()),
            languages: Some(remote.languages.clone()),
            enable_search_index_products: Attr::known(index_enabled(
                remote.search_indexing.products.as_ref(),
            )),
            enable_search_index_orders: Attr::known(index_enabled(remote.search_indexing.orders.as_ref())),
            messages: Some(MessagesConfig {
                enabled: remote.messages.enabled,
                delete_days_after_creation: remote.messages.delete_days_after_creation.into(),
            }),
            carts: Some(CartsConfig {
                country_tax_rate_fallback_enabled: Attr::known(remote.carts.country_tax_rate_fallback_enabled),
                delete_days_after_last_modification: remote.carts.delete_days_after_last_modification.into(),
            }),
            shopping_lists: Some(ShoppingListsConfig {
                delete_days_after_last_modification: remote
                    .shopping_lists
                    .delete_days_after_last_modification
                    .into(),
            }),
            external_oauth: remote.external_oauth.as_ref().map(|o| ExternalOAuth {
                url: o.url.clone(),
                authorization_header: o.authorization_header.clone(),
            }),
            shipping_rate_input_type: remote.shipping_rate_input_type.clone(),
            business_units: Some(BusinessUnitsConfig {
                my_business_unit_status_on_creation: Attr::known(
                    remote.business_units.my_business_unit_status_on_creation,
                ),
                my_business_unit_associate_role_key_on_creation: remote
                    .business_units
                    .my_business_unit_associate_role_on_creation
                    .as_ref()
                    .map(|r| r.key.clone())
                    .into(),
            }),
        })
    }

    fn update_actions(&self, desired: &Self, _ctx: &ActionContext) -> ModelResult<UpdatePlan<ProjectAction>> {
        desired.validate()?;

        let mut phases = Phases::default();
        let scalars = &mut phases.scalars;

        if let Attr::Known(name) = &desired.name {
            if self.name.as_known() != Some(name) {
                scalars.push(ProjectAction::ChangeName { name: name.clone() });
            }
        }
        if let Some(countries) = list_changed(self.countries.as_ref(), desired.countries.as_ref()) {
            scalars.push(ProjectAction::ChangeCountries { countries });
        }
        if let Some(currencies) = list_changed(self.currencies.as_ref(), desired.currencies.as_ref()) {
            scalars.push(ProjectAction::ChangeCurrencies { currencies });
        }
        if let Some(languages) = list_changed(self.languages.as_ref(), desired.languages.as_ref()) {
            scalars.push(ProjectAction::ChangeLanguages { languages });
        }
        if let Some(messages) = &desired.messages {
            messages_actions(self.messages.as_ref(), messages, scalars);
        }
        if let Some(carts) = &desired.carts {
            carts_actions(self.carts.as_ref(), carts, scalars);
        }
        if let Some(lists) = &desired.shopping_lists {
            let current = self.shopping_lists.as_ref();
            let differs = current.map_or(!lists.delete_days_after_last_modification.is_unknown(), |c| {
                changed(
                    &c.delete_days_after_last_modification,
                    &lists.delete_days_after_last_modification,
                )
            });
            if differs {
                scalars.push(ProjectAction::ChangeShoppingListsConfiguration {
                    shopping_lists_configuration: RemoteShoppingListsConfig {
                        delete_days_after_last_modification: lists
                            .delete_days_after_last_modification
                            .to_option(),
                    },
                });
            }
        }
        if self.external_oauth != desired.external_oauth {
            scalars.push(ProjectAction::SetExternalOAuth {
                external_oauth: desired.external_oauth_remote(),
            });
        }
        if self.shipping_rate_input_type != desired.shipping_rate_input_type {
            scalars.push(ProjectAction::SetShippingRateInputType {
                shipping_rate_input_type: desired.shipping_rate_input_type.clone(),
            });
        }
        if let Attr::Known(enabled) = desired.enable_search_index_products {
            if self.enable_search_index_products.as_known() != Some(&enabled) {
                scalars.push(ProjectAction::ChangeProductSearchIndexingEnabled { enabled });
            }
        }
        if let Attr::Known(enabled) = desired.enable_search_index_orders {
            if self.enable_search_index_orders.as_known() != Some(&enabled) {
                scalars.push(ProjectAction::ChangeOrderSearchStatus {
                    status: index_config(enabled).status,
                });
            }
        }
        if let Some(units) = &desired.business_units {
            business_units_actions(self.business_units.as_ref(), units, scalars);
        }

        Ok(UpdatePlan::new(
            pinned_version(&self.identity.version)?,
            phases.into_actions(),
        ))
    }

    fn validate(&self) -> ModelResult<()> {
        for (path, list) in [
            ("countries", &self.countries),
            ("currencies", &self.currencies),
            ("languages", &self.languages),
        ] {
            if let Some(list) = list {
                ensure_unique_keys(path, "entry", list.iter().map(String::as_str))?;
            }
        }
        if let Some(ShippingRateInputType::CartClassification { values }) = &self.shipping_rate_input_type {
            ensure_unique_keys(
                "shipping_rate_input_type.values",
                "tier key",
                values.iter().map(|v| v.key.as_str()),
            )?;
        }
        if let Some(oauth) = &self.external_oauth {
            if oauth.url.is_empty() {
                return Err(ModelError::invalid_input("external_oauth.url", "must not be empty"));
            }
        }
        Ok(())
    }

    /// Drops whatever the plan leaves unmanaged and restores list order.
    fn align_with_plan(&mut self, plan: &Self) {
        if plan.name.is_null() {
            self.name = Attr::Null;
        }
        for (actual, planned) in [
            (&mut self.countries, &plan.countries),
            (&mut self.currencies, &plan.currencies),
            (&mut self.languages, &plan.languages),
        ] {
            match planned {
                None => *actual = None,
                Some(planned) => {
                    if let Some(list) = actual.take() {
                        *actual = Some(sort_by_plan(planned.iter().map(String::as_str), list));
                    }
                }
            }
        }
        if plan.enable_search_index_products.is_null() {
            self.enable_search_index_products = Attr::Null;
        }
        if plan.enable_search_index_orders.is_null() {
            self.enable_search_index_orders = Attr::Null;
        }
        if plan.messages.is_none() {
            self.messages = None;
        }
        if plan.carts.is_none() {
            self.carts = None;
        }
        if plan.shopping_lists.is_none() {
            self.shopping_lists = None;
        }
        if plan.business_units.is_none() {
            self.business_units = None;
        }
        if plan.external_oauth.is_none() {
            self.external_oauth = None;
        }
        if plan.shipping_rate_input_type.is_none() {
            self.shipping_rate_input_type = None;
        }
        if let (Some(carts), Some(planned)) = (&mut self.carts, &plan.carts) {
            if planned.country_tax_rate_fallback_enabled.is_null()
                && carts.country_tax_rate_fallback_enabled == Attr::known(false)
            {
                carts.country_tax_rate_fallback_enabled = Attr::Null;
            }
        }
        if let (Some(units), Some(planned)) = (&mut self.business_units, &plan.business_units) {
            if planned.my_business_unit_status_on_creation.is_null() {
                units.my_business_unit_status_on_creation = Attr::Null;
            }
        }
    }

    fn carry_secrets(&mut self, prior: &Self) {
        if let (Some(oauth), Some(prior)) = (&mut self.external_oauth, &prior.external_oauth) {
            if oauth.authorization_header == MASKED {
                oauth.authorization_header.clone_from(&prior.authorization_header);
            }
        }
    }

    fn resource_path(_id: &str) -> String {
        String::new()
    }
}

impl Attached for ProjectSettings {
    fn target_id(&self) -> String {
        self.identity.id.to_option().unwrap_or_default()
    }
}

impl RemoteObject for ProjectRemote {
    fn id(&self) -> &str {
        &self.key
    }

    fn version(&self) -> i64 {
        self.version
    }

    fn set_version(&mut self, version: i64) {
        self.version = version;
    }
}

impl RemoteModel for ProjectRemote {
    type Action = ProjectAction;

    fn apply_action(&mut self, action: &ProjectAction) -> ModelResult<()> {
        match action {
            ProjectAction::ChangeName { name } => self.name = name.clone(),
            ProjectAction::ChangeCountries { countries } => self.countries = countries.clone(),
            ProjectAction::ChangeCurrencies { currencies } => self.currencies = currencies.clone(),
            ProjectAction::ChangeLanguages { languages } => self.languages = languages.clone(),
            ProjectAction::ChangeMessagesConfiguration { messages_configuration } => {
                self.messages = messages_configuration.clone();
            }
            ProjectAction::ChangeCountryTaxRateFallbackEnabled {
                country_tax_rate_fallback_enabled,
            } => {
                self.carts.country_tax_rate_fallback_enabled = *country_tax_rate_fallback_enabled;
            }
            ProjectAction::ChangeCartsConfiguration { carts_configuration } => {
                self.carts = carts_configuration.clone();
            }
            ProjectAction::ChangeShoppingListsConfiguration {
                shopping_lists_configuration,
            } => {
                self.shopping_lists = shopping_lists_configuration.clone();
            }
            ProjectAction::SetExternalOAuth { external_oauth } => {
                self.external_oauth = external_oauth.clone();
            }
            ProjectAction::SetShippingRateInputType {
                shipping_rate_input_type,
            } => {
                self.shipping_rate_input_type = shipping_rate_input_type.clone();
            }
            ProjectAction::ChangeProductSearchIndexingEnabled { enabled } => {
                self.search_indexing.products = Some(index_config(*enabled));
            }
            ProjectAction::ChangeOrderSearchStatus { status } => {
                if *status == SearchIndexStatus::Indexing {
                    return Err(ModelError::invalid_input(
                        "enable_search_index_orders",
                        "order search can only be activated or deactivated",
                    ));
                }
                self.search_indexing.orders = Some(SearchIndexConfig { status: *status });
            }
            ProjectAction::SetBusinessUnitStatusOnCreation { status } => {
                self.business_units.my_business_unit_status_on_creation = *status;
            }
            ProjectAction::SetBusinessUnitAssociateRoleOnCreation { associate_role } => {
                self.business_units.my_business_unit_associate_role_on_creation = Some(associate_role.clone());
            }
        }
        Ok(())
    }

    fn mask_secrets(&mut self) {
        if let Some(oauth) = &mut self.external_oauth {
            oauth.authorization_header = MASKED.to_string();
        }
    }
}
