//! # Attribute Model
//!
//! The unified node of the compiled schema tree.
//!
//! Every attribute carries exactly one [`AttributeKind`]; nested kinds own a
//! child [`NestedAttributeObject`]. The `api_name` is the original wire name and
//! never changes after construction; renames only touch `schema_name` and
//! `model_name`.

use crate::model::discriminator::Discriminator;
use crate::model::Operation;
use serde::{Deserialize, Serialize};

/// Whether a caller may set a value, the server may set it, or both.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Mutability {
    /// Must be provided by the caller.
    Required,
    /// May be provided by the caller; no server fallback.
    Optional,
    /// Only ever set by the server.
    Computed,
    /// May be provided by the caller; the server fills it otherwise.
    ComputedOptional,
}

impl Mutability {
    /// True for `Computed` and `ComputedOptional`.
    pub fn is_computed(self) -> bool {
        matches!(self, Mutability::Computed | Mutability::ComputedOptional)
    }
}

/// Which request bodies an attribute is serialized into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestBodyUsage {
    /// Sent in every request body.
    #[default]
    AllBodies,
    /// Sent only in the creation request body.
    PostOnly,
    /// Never sent (path parameters, server-only fields).
    OmitAlways,
}

/// Element kind of a primitive collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ElemType {
    /// Boolean elements.
    Bool,
    /// 64-bit float elements.
    Float64,
    /// 64-bit integer elements.
    Int64,
    /// Arbitrary precision numbers.
    Number,
    /// String elements.
    String,
    /// The element kind could not be decided.
    Unknown,
}

/// The attribute set of a nested structure, with its optional discriminator.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct NestedAttributeObject {
    /// Child attributes.
    pub attributes: Attributes,
    /// Polymorphic variant metadata for this level.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub discriminator: Option<Discriminator>,
}

impl NestedAttributeObject {
    /// Nested object without a discriminator.
    pub fn new(attributes: Attributes) -> Self {
        Self {
            attributes,
            discriminator: None,
        }
    }
}

/// The kind of an attribute.
///
/// Scalar kinds carry their static default, when the API description declares one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AttributeKind {
    /// String value.
    String {
        /// Static default.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        default: Option<String>,
    },
    /// 64-bit integer.
    Int64 {
        /// Static default.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        default: Option<i64>,
    },
    /// 64-bit float.
    Float64 {
        /// Static default.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        default: Option<f64>,
    },
    /// Arbitrary precision number.
    Number,
    /// Boolean.
    Bool {
        /// Static default.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        default: Option<bool>,
    },
    /// Ordered collection of primitives.
    List {
        /// Element kind.
        element_type: ElemType,
    },
    /// Unordered unique collection of primitives.
    Set {
        /// Element kind.
        element_type: ElemType,
    },
    /// String-keyed map of primitives.
    Map {
        /// Value kind.
        element_type: ElemType,
    },
    /// Ordered collection of objects.
    ListNested {
        /// Element object.
        nested_object: NestedAttributeObject,
    },
    /// Unordered unique collection of objects.
    SetNested {
        /// Element object.
        nested_object: NestedAttributeObject,
    },
    /// String-keyed map of objects.
    MapNested {
        /// Value object.
        nested_object: NestedAttributeObject,
    },
    /// A single nested object.
    SingleNested {
        /// The object.
        nested_object: NestedAttributeObject,
    },
    /// Synthetic block of configurable operation timeouts.
    Timeouts {
        /// Operations whose timeout the caller may configure.
        configurable_timeouts: Vec<Operation>,
    },
}

impl AttributeKind {
    /// Child object of a nested kind.
    pub fn nested_object(&self) -> Option<&NestedAttributeObject> {
        match self {
            AttributeKind::ListNested { nested_object }
            | AttributeKind::SetNested { nested_object }
            | AttributeKind::MapNested { nested_object }
            | AttributeKind::SingleNested { nested_object } => Some(nested_object),
            AttributeKind::String { .. }
            | AttributeKind::Int64 { .. }
            | AttributeKind::Float64 { .. }
            | AttributeKind::Number
            | AttributeKind::Bool { .. }
            | AttributeKind::List { .. }
            | AttributeKind::Set { .. }
            | AttributeKind::Map { .. }
            | AttributeKind::Timeouts { .. } => None,
        }
    }

    /// Mutable child object of a nested kind.
    pub fn nested_object_mut(&mut self) -> Option<&mut NestedAttributeObject> {
        match self {
            AttributeKind::ListNested { nested_object }
            | AttributeKind::SetNested { nested_object }
            | AttributeKind::MapNested { nested_object }
            | AttributeKind::SingleNested { nested_object } => Some(nested_object),
            AttributeKind::String { .. }
            | AttributeKind::Int64 { .. }
            | AttributeKind::Float64 { .. }
            | AttributeKind::Number
            | AttributeKind::Bool { .. }
            | AttributeKind::List { .. }
            | AttributeKind::Set { .. }
            | AttributeKind::Map { .. }
            | AttributeKind::Timeouts { .. } => None,
        }
    }

    /// Whether a static default is present.
    pub fn has_default(&self) -> bool {
        match self {
            AttributeKind::String { default } => default.is_some(),
            AttributeKind::Int64 { default } => default.is_some(),
            AttributeKind::Float64 { default } => default.is_some(),
            AttributeKind::Bool { default } => default.is_some(),
            AttributeKind::Number
            | AttributeKind::List { .. }
            | AttributeKind::Set { .. }
            | AttributeKind::Map { .. }
            | AttributeKind::ListNested { .. }
            | AttributeKind::SetNested { .. }
            | AttributeKind::MapNested { .. }
            | AttributeKind::SingleNested { .. }
            | AttributeKind::Timeouts { .. } => false,
        }
    }

    /// Short lowercase label, used in log lines.
    pub fn label(&self) -> &'static str {
        match self {
            AttributeKind::String { .. } => "string",
            AttributeKind::Int64 { .. } => "int64",
            AttributeKind::Float64 { .. } => "float64",
            AttributeKind::Number => "number",
            AttributeKind::Bool { .. } => "bool",
            AttributeKind::List { .. } => "list",
            AttributeKind::Set { .. } => "set",
            AttributeKind::Map { .. } => "map",
            AttributeKind::ListNested { .. } => "list_nested",
            AttributeKind::SetNested { .. } => "set_nested",
            AttributeKind::MapNested { .. } => "map_nested",
            AttributeKind::SingleNested { .. } => "single_nested",
            AttributeKind::Timeouts { .. } => "timeouts",
        }
    }
}

/// One named field of the compiled resource schema.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Attribute {
    /// Wire name in stable snake casing; the key used by configuration paths.
    pub schema_name: String,
    /// Identifier-safe name for generated data models.
    pub model_name: String,
    /// Original wire name, preserved through renames.
    pub api_name: String,
    /// Kind, with the nested attribute tree for nested kinds.
    #[serde(flatten)]
    pub kind: AttributeKind,
    /// Who may set the value.
    pub mutability: Mutability,
    /// Which request bodies carry the value.
    #[serde(default)]
    pub req_body_usage: RequestBodyUsage,
    /// Set on creation, never resent on update.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub create_only: bool,
    /// Value must be masked in output.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub sensitive: bool,
    /// Human description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Present when the field is deprecated.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deprecation_message: Option<String>,
}

impl Attribute {
    /// New attribute named after a wire name, with default flags.
    pub fn new(api_name: &str, kind: AttributeKind, mutability: Mutability) -> Self {
        Self {
            schema_name: crate::naming::schema_name(api_name),
            model_name: crate::naming::model_name(api_name),
            api_name: api_name.to_string(),
            kind,
            mutability,
            req_body_usage: RequestBodyUsage::AllBodies,
            create_only: false,
            sensitive: false,
            description: None,
            deprecation_message: None,
        }
    }

    /// Child attributes of a nested attribute.
    pub fn children(&self) -> Option<&Attributes> {
        self.kind.nested_object().map(|n| &n.attributes)
    }

    /// Renames the schema and model names; the wire name is untouched.
    pub fn rename(&mut self, new_name: &str) {
        self.schema_name = crate::naming::schema_name(new_name);
        self.model_name = crate::naming::model_name(new_name);
    }
}

/// Attributes of one tree level, unique by `schema_name`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Attributes(Vec<Attribute>);

impl Attributes {
    /// Empty collection.
    pub fn new() -> Self {
        Self(Vec::new())
    }

    /// Number of attributes at this level.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// True when there are no attributes.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterates in order.
    pub fn iter(&self) -> std::slice::Iter<'_, Attribute> {
        self.0.iter()
    }

    /// Looks up an attribute by schema name.
    pub fn get(&self, schema_name: &str) -> Option<&Attribute> {
        self.0.iter().find(|a| a.schema_name == schema_name)
    }

    /// Appends `attr`, replacing any attribute already holding its schema name in place.
    pub fn push(&mut self, attr: Attribute) {
        match self.0.iter_mut().find(|a| a.schema_name == attr.schema_name) {
            Some(slot) => *slot = attr,
            None => self.0.push(attr),
        }
    }

    /// Appends `attr` unless its schema name is already taken.
    ///
    /// Returns false when the attribute was dropped.
    pub fn push_new(&mut self, attr: Attribute) -> bool {
        if self.get(&attr.schema_name).is_some() {
            return false;
        }
        self.0.push(attr);
        true
    }

    /// Sorts by schema name.
    pub fn sort_by_name(&mut self) {
        self.0.sort_by(|a, b| a.schema_name.cmp(&b.schema_name));
    }

    /// Schema names in order.
    pub fn names(&self) -> Vec<&str> {
        self.0.iter().map(|a| a.schema_name.as_str()).collect()
    }
}

impl FromIterator<Attribute> for Attributes {
    fn from_iter<T: IntoIterator<Item = Attribute>>(iter: T) -> Self {
        let mut attrs = Attributes::new();
        for attr in iter {
            attrs.push(attr);
        }
        attrs
    }
}

impl IntoIterator for Attributes {
    type Item = Attribute;
    type IntoIter = std::vec::IntoIter<Attribute>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a Attributes {
    type Item = &'a Attribute;
    type IntoIter = std::slice::Iter<'a, Attribute>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn string_attr(name: &str) -> Attribute {
        Attribute::new(name, AttributeKind::String { default: None }, Mutability::Optional)
    }

    #[test]
    fn test_new_attribute_names() {
        let attr = string_attr("createdAt");
        assert_eq!(attr.schema_name, "created_at");
        assert_eq!(attr.model_name, "CreatedAt");
        assert_eq!(attr.api_name, "createdAt");
    }

    #[test]
    fn test_rename_keeps_api_name() {
        let mut attr = string_attr("groupId");
        attr.rename("projectId");
        assert_eq!(attr.schema_name, "project_id");
        assert_eq!(attr.model_name, "ProjectId");
        assert_eq!(attr.api_name, "groupId");
    }

    #[test]
    fn test_attributes_unique_by_schema_name() {
        let mut attrs = Attributes::new();
        attrs.push(string_attr("name"));
        let mut replacement = string_attr("name");
        replacement.description = Some("second".into());
        attrs.push(replacement);
        assert_eq!(attrs.len(), 1);
        assert_eq!(attrs.get("name").unwrap().description.as_deref(), Some("second"));

        assert!(!attrs.push_new(string_attr("name")));
        assert!(attrs.push_new(string_attr("other")));
        assert_eq!(attrs.names(), vec!["name", "other"]);
    }

    #[test]
    fn test_kind_serializes_as_tagged_fields() {
        let attr = Attribute::new(
            "size",
            AttributeKind::Int64 { default: Some(10) },
            Mutability::ComputedOptional,
        );
        let yaml = serde_yaml::to_string(&attr).unwrap();
        assert!(yaml.contains("type: int64"));
        assert!(yaml.contains("default: 10"));
        assert!(yaml.contains("mutability: computed_optional"));
        assert!(!yaml.contains("create_only"));
    }
}
