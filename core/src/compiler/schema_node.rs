#![deny(missing_docs)]

//! # Schema Node Builder
//!
//! Single-level classification of a schema. A node is an immutable snapshot
//! borrowing from the document; nothing here recurses into children.
//!
//! Type inference: an explicit `type` tag wins. Without one, a non-empty
//! `properties` map implies `object`. Anything else is not inferable.

use crate::error::{AppError, AppResult};
use crate::oas::ApiDocument;
use serde_json::Value;

/// Classified kind of a schema node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    /// `string`
    String,
    /// `integer`
    Integer,
    /// `number`
    Number,
    /// `boolean`
    Boolean,
    /// `array`
    Array,
    /// `object`
    Object,
}

impl NodeKind {
    fn from_tag(tag: &str) -> AppResult<Self> {
        match tag {
            "string" => Ok(NodeKind::String),
            "integer" => Ok(NodeKind::Integer),
            "number" => Ok(NodeKind::Number),
            "boolean" => Ok(NodeKind::Boolean),
            "array" => Ok(NodeKind::Array),
            "object" => Ok(NodeKind::Object),
            other => Err(AppError::UnsupportedAttributeKind(other.to_string())),
        }
    }

    /// True for scalar kinds.
    pub fn is_primitive(self) -> bool {
        !matches!(self, NodeKind::Array | NodeKind::Object)
    }
}

/// One classified point of a schema tree.
#[derive(Debug, Clone)]
pub struct SchemaNode<'a> {
    /// Classified kind.
    pub kind: NodeKind,
    /// The resolved schema (never a `$ref`).
    pub raw: &'a Value,
    /// `format` keyword.
    pub format: Option<&'a str>,
    /// `description` keyword.
    pub description: Option<&'a str>,
    /// `deprecated` keyword.
    pub deprecated: bool,
    /// `readOnly` keyword.
    pub read_only: bool,
    /// `default` keyword.
    pub default: Option<&'a Value>,
    /// Names listed in `required`.
    pub required: Vec<&'a str>,
}

impl<'a> SchemaNode<'a> {
    /// Classifies `node`, following `$ref` hops first.
    ///
    /// Keywords written next to a `$ref` take precedence over the target's.
    pub fn build(doc: &'a ApiDocument, node: &'a Value) -> AppResult<Self> {
        let schema = doc.resolve_schema(node)?;
        let kind = infer_kind(schema)?;

        let keyword = |key: &str| node.get(key).or_else(|| schema.get(key));
        let flag = |key: &str| keyword(key).and_then(Value::as_bool).unwrap_or(false);

        Ok(Self {
            kind,
            raw: schema,
            format: keyword("format").and_then(Value::as_str),
            description: keyword("description").and_then(Value::as_str),
            deprecated: flag("deprecated"),
            read_only: flag("readOnly"),
            default: keyword("default").filter(|v| !v.is_null()),
            required: schema
                .get("required")
                .and_then(Value::as_array)
                .map(|names| names.iter().filter_map(Value::as_str).collect())
                .unwrap_or_default(),
        })
    }

    /// Declared properties, in document order.
    pub fn properties(&self) -> impl Iterator<Item = (&'a str, &'a Value)> {
        self.raw
            .get("properties")
            .and_then(Value::as_object)
            .into_iter()
            .flatten()
            .map(|(name, schema)| (name.as_str(), schema))
    }

    /// True when the node declares at least one property.
    pub fn has_properties(&self) -> bool {
        self.properties().next().is_some()
    }

    /// Whether `name` is listed in `required`.
    pub fn is_required(&self, name: &str) -> bool {
        self.required.contains(&name)
    }

    /// `items` schema of an array.
    pub fn items(&self) -> Option<&'a Value> {
        self.raw.get("items")
    }

    /// Array with set semantics: `uniqueItems: true` or `format: set`.
    pub fn is_set(&self) -> bool {
        self.format == Some("set")
            || self
                .raw
                .get("uniqueItems")
                .and_then(Value::as_bool)
                .unwrap_or(false)
    }

    /// Schema-valued `additionalProperties`; boolean forms yield `None`.
    pub fn additional_properties(&self) -> Option<&'a Value> {
        self.raw
            .get("additionalProperties")
            .filter(|v| v.is_object())
    }

    /// Values must be masked: `format: password` or `x-sensitive: true`.
    pub fn is_sensitive(&self) -> bool {
        self.format == Some("password")
            || self
                .extension("x-sensitive")
                .and_then(Value::as_bool)
                .unwrap_or(false)
    }

    /// A specification extension (`x-...`) of the node.
    pub fn extension(&self, key: &str) -> Option<&'a Value> {
        self.raw.get(key)
    }
}

fn infer_kind(schema: &Value) -> AppResult<NodeKind> {
    match schema.get("type") {
        Some(Value::String(tag)) => NodeKind::from_tag(tag),
        // OAS 3.1 type lists: the first non-null entry wins.
        Some(Value::Array(tags)) => match tags.iter().filter_map(Value::as_str).find(|t| *t != "null") {
            Some(tag) => NodeKind::from_tag(tag),
            None => infer_untyped(schema),
        },
        Some(other) => Err(AppError::UnsupportedAttributeKind(other.to_string())),
        None => infer_untyped(schema),
    }
}

fn infer_untyped(schema: &Value) -> AppResult<NodeKind> {
    let has_properties = schema
        .get("properties")
        .and_then(Value::as_object)
        .is_some_and(|props| !props.is_empty());
    if has_properties {
        Ok(NodeKind::Object)
    } else {
        Err(AppError::SchemaNotInferable(
            "no type tag and no properties".into(),
        ))
    }
}
