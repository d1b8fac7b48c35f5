//! Attribute schemas the host validates configuration against.

use serde::{Deserialize, Serialize};

/// Describes one resource kind's attributes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceSchema {
    pub type_name: String,
    pub version: u64,
    pub attributes: Vec<AttributeSchema>,
}

impl ResourceSchema {
    pub fn attribute(&self, name: &str) -> Option<&AttributeSchema> {
        self.attributes.iter().find(|a| a.name == name)
    }
}

/// One attribute of a resource or nested block.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttributeSchema {
    pub name: String,
    pub attribute_type: AttributeType,
    pub mode: AttributeMode,
    #[serde(default, skip_serializing_if = "is_false")]
    pub sensitive: bool,
    /// Changing the value destroys and recreates the resource.
    #[serde(default, skip_serializing_if = "is_false")]
    pub requires_replace: bool,
    /// Computed values keep their prior state instead of showing as unknown.
    #[serde(default, skip_serializing_if = "is_false")]
    pub use_state_for_unknown: bool,
    /// Allowed values. Only meaningful for enumerations.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allowed: Option<Vec<String>>,
    /// Attributes of each element. Only meaningful for blocks.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub nested: Vec<AttributeSchema>,
}

fn is_false(value: &bool) -> bool {
    !value
}

/// The value type of an attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttributeType {
    String,
    Bool,
    Int,
    Float,
    /// Locale to text.
    LocalizedString,
    StringList,
    /// A single nested block.
    Block,
    /// An ordered list of nested blocks.
    BlockList,
    /// Field name to JSON-encoded value.
    JsonMap,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttributeMode {
    Required,
    Optional,
    Computed,
    OptionalComputed,
}

impl AttributeSchema {
    fn simple(name: &str, attribute_type: AttributeType, mode: AttributeMode) -> Self {
        Self {
            name: name.into(),
            attribute_type,
            mode,
            sensitive: false,
            requires_replace: false,
            use_state_for_unknown: false,
            allowed: None,
            nested: Vec::new(),
        }
    }

    pub fn required(name: &str, attribute_type: AttributeType) -> Self {
        Self::simple(name, attribute_type, AttributeMode::Required)
    }

    pub fn optional(name: &str, attribute_type: AttributeType) -> Self {
        Self::simple(name, attribute_type, AttributeMode::Optional)
    }

    /// Optional, with a server default when unset.
    pub fn defaulted(name: &str, attribute_type: AttributeType) -> Self {
        Self::simple(name, attribute_type, AttributeMode::OptionalComputed)
    }

    /// Server-computed, stable across plans.
    pub fn computed(name: &str, attribute_type: AttributeType) -> Self {
        Self::simple(name, attribute_type, AttributeMode::Computed).use_state_for_unknown()
    }

    /// Shorthand for an enumeration over `options`.
    pub fn enumeration(name: &str, mode: AttributeMode, options: &[&str]) -> Self {
        let mut attribute = Self::simple(name, AttributeType::String, mode);
        attribute.allowed = Some(options.iter().map(|o| (*o).to_string()).collect());
        attribute
    }

    /// Shorthand for a nested block.
    pub fn block(name: &str, mode: AttributeMode, nested: Vec<AttributeSchema>) -> Self {
        let mut attribute = Self::simple(name, AttributeType::Block, mode);
        attribute.nested = nested;
        attribute
    }

    /// Shorthand for a list of nested blocks.
    pub fn block_list(name: &str, mode: AttributeMode, nested: Vec<AttributeSchema>) -> Self {
        let mut attribute = Self::simple(name, AttributeType::BlockList, mode);
        attribute.nested = nested;
        attribute
    }

    #[must_use]
    pub fn sensitive(mut self) -> Self {
        self.sensitive = true;
        self
    }

    #[must_use]
    pub fn requires_replace(mut self) -> Self {
        self.requires_replace = true;
        self
    }

    #[must_use]
    pub fn use_state_for_unknown(mut self) -> Self {
        self.use_state_for_unknown = true;
        self
    }
}
