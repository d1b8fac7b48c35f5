//! Upgrade pipelines of the resource kinds.

use crate::shape::{collapse_list, drop_null, expand_object, introduce_unknown};
use crate::{PersistedState, StateError, StateResult, UpgradePipeline};
use commerce_model::{
    AssociateRole, AttributeGroup, Company, Division, Product, ProductSelection, ProjectSettings,
    Resource, State, StateTransitions, Subscription, TaxCategory,
};
use commerce_types::Dynamic;

/// Project blocks that were single objects at v0, lists of one at v1, and
/// single objects again from v2 on.
const PROJECT_BLOCKS_V0: [&str; 4] = ["messages", "carts", "shopping_lists", "external_oauth"];
const PROJECT_BLOCKS_V1: [&str; 6] = [
    "messages",
    "carts",
    "shopping_lists",
    "external_oauth",
    "shipping_rate_input_type",
    "business_units",
];

fn project_v0_to_v1(tree: &mut Dynamic) -> StateResult<()> {
    for field in PROJECT_BLOCKS_V0 {
        expand_object(tree, field)?;
    }
    // Search indexing was not tracked before v1.
    introduce_unknown(tree, "enable_search_index_products")?;
    introduce_unknown(tree, "enable_search_index_orders")
}

fn project_v1_to_v2(tree: &mut Dynamic) -> StateResult<()> {
    for field in PROJECT_BLOCKS_V1 {
        collapse_list(tree, field)?;
    }
    Ok(())
}

fn subscription_v0_to_v1(tree: &mut Dynamic) -> StateResult<()> {
    collapse_list(tree, "destination")?;
    if tree.get("destination").is_none_or(Dynamic::is_null) {
        return Err(StateError::malformed("destination", "a subscription needs a destination"));
    }
    collapse_list(tree, "format")?;
    drop_null(tree, "format")
}

fn plain<R: Resource>() -> UpgradePipeline {
    UpgradePipeline::new(R::TYPE_NAME, R::SCHEMA_VERSION)
}

/// One pipeline per resource kind.
#[must_use]
pub fn pipelines() -> Vec<UpgradePipeline> {
    vec![
        plain::<AssociateRole>(),
        plain::<AttributeGroup>(),
        plain::<Company>(),
        plain::<Division>(),
        plain::<Product>(),
        plain::<ProductSelection>(),
        plain::<ProjectSettings>()
            .step(0, project_v0_to_v1)
            .step(1, project_v1_to_v2),
        plain::<State>(),
        plain::<StateTransitions>(),
        plain::<Subscription>().step(0, subscription_v0_to_v1),
        plain::<TaxCategory>(),
    ]
}

/// The pipeline registered for `kind`, a resource type name.
pub fn pipeline_for(kind: &str) -> StateResult<UpgradePipeline> {
    pipelines()
        .into_iter()
        .find(|p| p.kind() == kind)
        .ok_or_else(|| StateError::UnknownKind(kind.to_string()))
}

/// Upgrades `state` of `kind` to the kind's current schema version.
pub fn upgrade(kind: &str, state: PersistedState) -> StateResult<PersistedState> {
    pipeline_for(kind)?.upgrade(state)
}
