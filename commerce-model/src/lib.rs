//! Entity model for the commerce provider.
//!
//! Every resource kind is described by three shapes and the mappings
//! between them:
//! - the record: configured and stored state, see [`Resource`]
//! - the remote object returned by the commerce API
//! - the draft sent on create, see [`Creatable`]
//!
//! [`Resource::update_actions`] turns a pair of records into the ordered
//! update actions the remote applies in sequence. The remote side of each
//! action is implemented by [`RemoteModel`], which backs the in-memory
//! commerce API and the apply-then-read tests.
//!
//! Custom fields are shared by several kinds and live in [`custom_fields`].

mod address;
mod associate_role;
mod attribute_group;
mod business_unit;
pub mod custom_fields;
mod error;
mod product;
mod product_selection;
mod project_settings;
mod resource;
mod state;
mod subscription;
mod support;
mod tax_category;
mod type_definition;

pub use address::{Address, RemoteAddress};
pub use associate_role::{
    AssociateRole, AssociateRoleAction, AssociateRoleDraft, AssociateRoleRemote, PERMISSIONS,
};
pub use attribute_group::{
    AttributeGroup, AttributeGroupAction, AttributeGroupDraft, AttributeGroupRemote,
    AttributeReference,
};
pub use business_unit::{
    ApprovalRuleMode, Associate, AssociateMode, BusinessUnitAction, BusinessUnitDraft,
    BusinessUnitRemote, BusinessUnitStatus, Company, Division, DivisionDraft, DivisionRemote,
    RemoteAssociate, RoleAssignment, StoreMode, UnitDraft, UnitFields, UnitRemote,
};
pub use custom_fields::{
    CustomFieldAction, CustomFields, CustomFieldsDraft, RemoteCustomFields, SetCustomField,
    SetCustomType,
};
pub use error::{ModelError, ModelResult};
pub use product::{
    AttributeValue, Price, PriceDraft, Product, ProductAction, ProductDraft, ProductRemote,
    RemoteAttribute, RemotePrice, RemoteVariant, Variant, VariantDraft,
};
pub use product_selection::{
    ProductSelection, ProductSelectionAction, ProductSelectionDraft, ProductSelectionRemote,
    SelectionMode,
};
pub use project_settings::{
    BusinessUnitsConfig, CartsConfig, ExternalOAuth, MessagesConfig, ProjectAction,
    ProjectRemote, ProjectSettings, RemoteBusinessUnitsConfig, RemoteCartsConfig,
    RemoteExternalOAuth, RemoteMessagesConfig, RemoteSearchIndexing, RemoteShoppingListsConfig,
    SearchIndexConfig, SearchIndexStatus, ShippingRateInputType, ShippingRateTier,
    ShoppingListsConfig,
};
pub use resource::{
    ActionContext, Attached, Creatable, Identity, Materialize, RemoteModel, RemoteObject,
    Resource, UpdatePlan, MASKED,
};
pub use state::{State, StateAction, StateDraft, StateRemote, StateRole, StateTransitions, StateType};
pub use subscription::{
    AwsAuthenticationMode, ChangeSubscription, Destination, Format, MessageSubscription,
    RemoteDestination, Subscription, SubscriptionAction, SubscriptionDraft, SubscriptionRemote,
};
pub use tax_category::{
    RemoteTaxRate, SubRate, TaxCategory, TaxCategoryAction, TaxCategoryDraft, TaxCategoryRemote,
    TaxRate, TaxRateDraft,
};
pub use type_definition::{
    CustomFieldType, EnumValue, FieldDefinition, LocalizedEnumValue, TypeDefinition,
};
