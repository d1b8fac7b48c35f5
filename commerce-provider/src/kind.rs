//! The resource kinds the provider registers.

use crate::schema::AttributeMode::{Optional, OptionalComputed, Required};
use crate::schema::AttributeType::{
    Bool, Float, Int, JsonMap, LocalizedString, String as Text, StringList,
};
use crate::schema::{AttributeSchema as A, ResourceSchema};
use crate::{ProviderError, ProviderResult};
use commerce_model::{PERMISSIONS, Resource};
use std::fmt;
use std::str::FromStr;

/// Expands `$body` once per kind with `$R` bound to the kind's record type.
///
/// The two-armed form separates kinds that create their remote object from
/// kinds that configure an existing one.
macro_rules! dispatch {
    ($kind:expr, |$R:ident| created => $created:expr, attached => $attached:expr $(,)?) => {
        match $kind {
            $crate::ResourceKind::AssociateRole => {
                type $R = commerce_model::AssociateRole;
                $created
            }
            $crate::ResourceKind::AttributeGroup => {
                type $R = commerce_model::AttributeGroup;
                $created
            }
            $crate::ResourceKind::BusinessUnitCompany => {
                type $R = commerce_model::Company;
                $created
            }
            $crate::ResourceKind::BusinessUnitDivision => {
                type $R = commerce_model::Division;
                $created
            }
            $crate::ResourceKind::Product => {
                type $R = commerce_model::Product;
                $created
            }
            $crate::ResourceKind::ProductSelection => {
                type $R = commerce_model::ProductSelection;
                $created
            }
            $crate::ResourceKind::State => {
                type $R = commerce_model::State;
                $created
            }
            $crate::ResourceKind::Subscription => {
                type $R = commerce_model::Subscription;
                $created
            }
            $crate::ResourceKind::TaxCategory => {
                type $R = commerce_model::TaxCategory;
                $created
            }
            $crate::ResourceKind::ProjectSettings => {
                type $R = commerce_model::ProjectSettings;
                $attached
            }
            $crate::ResourceKind::StateTransitions => {
                type $R = commerce_model::StateTransitions;
                $attached
            }
        }
    };
    ($kind:expr, |$R:ident| $body:expr) => {
        dispatch!($kind, |$R| created => $body, attached => $body)
    };
}

pub(crate) use dispatch;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ResourceKind {
    AssociateRole,
    AttributeGroup,
    BusinessUnitCompany,
    BusinessUnitDivision,
    Product,
    ProductSelection,
    ProjectSettings,
    State,
    StateTransitions,
    Subscription,
    TaxCategory,
}

impl ResourceKind {
    pub const ALL: [ResourceKind; 11] = [
        ResourceKind::AssociateRole,
        ResourceKind::AttributeGroup,
        ResourceKind::BusinessUnitCompany,
        ResourceKind::BusinessUnitDivision,
        ResourceKind::Product,
        ResourceKind::ProductSelection,
        ResourceKind::ProjectSettings,
        ResourceKind::State,
        ResourceKind::StateTransitions,
        ResourceKind::Subscription,
        ResourceKind::TaxCategory,
    ];

    /// Name the host uses for this kind.
    pub fn type_name(self) -> &'static str {
        dispatch!(self, |R| R::TYPE_NAME)
    }

    pub fn schema_version(self) -> u64 {
        dispatch!(self, |R| R::SCHEMA_VERSION)
    }

    /// True for kinds that configure an object they did not create.
    pub fn is_attached(self) -> bool {
        matches!(self, ResourceKind::ProjectSettings | ResourceKind::StateTransitions)
    }

    pub fn schema(self) -> ResourceSchema {
        ResourceSchema {
            type_name: self.type_name().to_string(),
            version: self.schema_version(),
            attributes: self.attributes(),
        }
    }

    fn attributes(self) -> Vec<A> {
        let mut attributes = vec![A::computed("id", Text), A::computed("version", Int)];
        attributes.extend(match self {
            ResourceKind::AssociateRole => vec![
                A::required("key", Text).requires_replace(),
                A::defaulted("buyer_assignable", Bool),
                A::optional("name", Text),
                A::enumeration("permissions", Optional, PERMISSIONS),
                custom(),
            ],
            ResourceKind::AttributeGroup => vec![
                A::optional("key", Text),
                A::required("name", LocalizedString),
                A::optional("description", LocalizedString),
                A::optional("attributes", StringList),
            ],
            ResourceKind::BusinessUnitCompany => unit_attributes(),
            ResourceKind::BusinessUnitDivision => {
                let mut attributes = unit_attributes();
                attributes.extend([
                    A::required("parent_unit_key", Text),
                    A::enumeration("store_mode", OptionalComputed, &["Explicit", "FromParent"]),
                    A::enumeration("associate_mode", OptionalComputed, &["Explicit", "ExplicitAndFromParent"]),
                    A::enumeration(
                        "approval_rule_mode",
                        OptionalComputed,
                        &["Explicit", "ExplicitAndFromParent"],
                    ),
                ]);
                attributes
            }
            ResourceKind::Product => vec![
                A::optional("key", Text),
                A::required("product_type_id", Text).requires_replace(),
                A::required("name", LocalizedString),
                A::required("slug", LocalizedString),
                A::optional("description", LocalizedString),
                A::optional("meta_title", LocalizedString),
                A::optional("meta_description", LocalizedString),
                A::optional("meta_keywords", LocalizedString),
                A::optional("categories", StringList),
                A::optional("tax_category_id", Text),
                A::optional("state_id", Text),
                A::defaulted("publish", Bool),
                A::block("master_variant", Required, variant_attributes()),
                A::block_list("variants", Optional, variant_attributes()),
            ],
            ResourceKind::ProductSelection => vec![
                A::optional("key", Text),
                A::required("name", LocalizedString),
                A::enumeration("mode", OptionalComputed, &["Individual", "IndividualExclusion"]).requires_replace(),
                custom(),
            ],
            ResourceKind::ProjectSettings => vec![
                A::optional("name", Text),
                A::optional("countries", StringList),
                A::optional("currencies", StringList),
                A::optional("languages", StringList),
                A::optional("enable_search_index_products", Bool),
                A::optional("enable_search_index_orders", Bool),
                A::block(
                    "messages",
                    Optional,
                    vec![A::required("enabled", Bool), A::optional("delete_days_after_creation", Int)],
                ),
                A::block(
                    "carts",
                    Optional,
                    vec![
                        A::optional("country_tax_rate_fallback_enabled", Bool),
                        A::optional("delete_days_after_last_modification", Int),
                    ],
                ),
                A::block(
                    "shopping_lists",
                    Optional,
                    vec![A::optional("delete_days_after_last_modification", Int)],
                ),
                A::block(
                    "external_oauth",
                    Optional,
                    vec![
                        A::required("url", Text),
                        A::required("authorization_header", Text).sensitive(),
                    ],
                ),
                A::block(
                    "shipping_rate_input_type",
                    Optional,
                    vec![
                        A::enumeration("type", Required, &["CartValue", "CartClassification", "CartScore"]),
                        A::block_list("values", Optional, vec![A::required("key", Text)]),
                    ],
                ),
                A::block(
                    "business_units",
                    Optional,
                    vec![
                        A::enumeration("my_business_unit_status_on_creation", Optional, &["Active", "Inactive"]),
                        A::optional("my_business_unit_associate_role_key_on_creation", Text),
                    ],
                ),
            ],
            ResourceKind::State => vec![
                A::required("key", Text),
                A::enumeration(
                    "type",
                    Required,
                    &[
                        "OrderState",
                        "LineItemState",
                        "ProductState",
                        "ReviewState",
                        "PaymentState",
                        "QuoteRequestState",
                        "StagedQuoteState",
                        "QuoteState",
                    ],
                ),
                A::optional("name", LocalizedString),
                A::optional("description", LocalizedString),
                A::optional("initial", Bool),
                A::enumeration("roles", Optional, &["ReviewIncludedInStatistics", "Return"]),
            ],
            ResourceKind::StateTransitions => vec![
                A::required("from", Text).requires_replace(),
                A::optional("to", StringList),
            ],
            ResourceKind::Subscription => vec![
                A::optional("key", Text),
                A::block(
                    "destination",
                    Required,
                    vec![
                        A::required("type", Text),
                        A::optional("queue_url", Text),
                        A::optional("topic_arn", Text),
                        A::optional("region", Text),
                        A::optional("access_key", Text),
                        A::optional("access_secret", Text).sensitive(),
                        A::optional("connection_string", Text).sensitive(),
                    ],
                ),
                A::block(
                    "format",
                    OptionalComputed,
                    vec![A::required("type", Text), A::optional("cloud_events_version", Text)],
                )
                .requires_replace(),
                A::block_list(
                    "messages",
                    Optional,
                    vec![A::required("resource_type_id", Text), A::optional("types", StringList)],
                ),
                A::optional("changes", StringList),
            ],
            ResourceKind::TaxCategory => vec![
                A::optional("key", Text),
                A::required("name", Text),
                A::optional("description", Text),
                A::block_list(
                    "rates",
                    Optional,
                    vec![
                        A::computed("id", Text),
                        A::required("key", Text),
                        A::required("name", Text),
                        A::required("amount", Float),
                        A::defaulted("included_in_price", Bool),
                        A::required("country", Text),
                        A::optional("state", Text),
                        A::block_list(
                            "sub_rates",
                            Optional,
                            vec![A::required("name", Text), A::required("amount", Float)],
                        ),
                    ],
                ),
            ],
        });
        attributes
    }
}

fn custom() -> A {
    A::block(
        "custom",
        Optional,
        vec![A::required("type_id", Text), A::optional("fields", JsonMap)],
    )
}

fn unit_attributes() -> Vec<A> {
    vec![
        A::required("key", Text).requires_replace(),
        A::required("name", Text),
        A::optional("contact_email", Text),
        A::enumeration("status", OptionalComputed, &["Active", "Inactive"]),
        A::optional("stores", StringList),
        A::block_list(
            "addresses",
            Optional,
            vec![
                A::required("key", Text),
                A::required("country", Text),
                A::optional("first_name", Text),
                A::optional("last_name", Text),
                A::optional("street_name", Text),
                A::optional("street_number", Text),
                A::optional("postal_code", Text),
                A::optional("city", Text),
                A::optional("region", Text),
                A::optional("company", Text),
                A::optional("phone", Text),
                A::optional("email", Text),
            ],
        ),
        A::optional("shipping_address_keys", StringList),
        A::optional("billing_address_keys", StringList),
        A::optional("default_shipping_address_key", Text),
        A::optional("default_billing_address_key", Text),
        A::block_list(
            "associates",
            Optional,
            vec![A::required("customer_id", Text), A::optional("role_keys", StringList)],
        ),
        custom(),
    ]
}

fn variant_attributes() -> Vec<A> {
    vec![
        A::computed("id", Int),
        A::required("sku", Text),
        A::optional("key", Text),
        A::block_list(
            "attributes",
            Optional,
            vec![A::required("name", Text), A::required("value", Text)],
        ),
        A::block_list(
            "prices",
            Optional,
            vec![
                A::computed("id", Text),
                A::required("key", Text),
                A::block(
                    "value",
                    Required,
                    vec![A::required("currencyCode", Text), A::required("centAmount", Int)],
                ),
                A::optional("country", Text),
                A::optional("customer_group_id", Text),
                A::optional("channel_id", Text),
            ],
        ),
    ]
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.type_name())
    }
}

impl FromStr for ResourceKind {
    type Err = ProviderError;

    /// Accepts the full type name or the name without the `commerce_` prefix.
    fn from_str(s: &str) -> ProviderResult<Self> {
        let wanted = s.strip_prefix("commerce_").unwrap_or(s);
        ResourceKind::ALL
            .into_iter()
            .find(|k| k.type_name().strip_prefix("commerce_") == Some(wanted))
            .ok_or_else(|| ProviderError::UnknownKind(s.to_string()))
    }
}
