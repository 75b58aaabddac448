#![deny(missing_docs)]

//! # Attribute Builder
//!
//! Turns classified schema nodes into [`Attribute`] trees.
//!
//! Per-attribute failures are fatal and carry the dotted attribute path.
//! Shapes the model cannot express (free-form objects, undecidable array
//! elements, schemas that contain themselves) are logged and degraded
//! instead.

use crate::compiler::discriminator::extract_discriminator;
use crate::compiler::schema_node::{NodeKind, SchemaNode};
use crate::compiler::Source;
use crate::error::AppResult;
use crate::model::{
    Attribute, AttributeKind, Attributes, ElemType, Mutability, NestedAttributeObject,
};
use crate::oas::ApiDocument;
use serde_json::Value;

/// Deprecation message attached to deprecated fields.
pub const DEPRECATION_MESSAGE: &str =
    "This attribute is deprecated and will be removed in a future release.";

/// Builds one attribute named `name`.
///
/// Returns `Ok(None)` when the node produces no attribute; callers skip it.
/// A static default upgrades the mutability to `ComputedOptional`.
pub fn build_attribute<'a>(
    doc: &'a ApiDocument,
    node: &SchemaNode<'a>,
    name: &str,
    mutability: Mutability,
    source: Source,
) -> AppResult<Option<Attribute>> {
    AttributeBuilder::new(doc, source).attribute(node, name, mutability)
}

/// Builds the attributes of every property of an object node, sorted by name.
pub fn build_object_attributes<'a>(
    doc: &'a ApiDocument,
    node: &SchemaNode<'a>,
    source: Source,
) -> AppResult<Attributes> {
    let mut builder = AttributeBuilder::new(doc, source);
    builder.ancestors.push(node.raw);
    builder.object_attributes(node)
}

/// Recursive state of one tree construction.
///
/// `ancestors` holds the resolved schemas of the objects currently being
/// built, outermost first. A `$ref` cycle resolves to one of them again.
struct AttributeBuilder<'a> {
    doc: &'a ApiDocument,
    source: Source,
    ancestors: Vec<&'a Value>,
}

impl<'a> AttributeBuilder<'a> {
    fn new(doc: &'a ApiDocument, source: Source) -> Self {
        Self {
            doc,
            source,
            ancestors: Vec::new(),
        }
    }

    fn attribute(
        &mut self,
        node: &SchemaNode<'a>,
        name: &str,
        mutability: Mutability,
    ) -> AppResult<Option<Attribute>> {
        let Some(kind) = self.kind(node, name)? else {
            return Ok(None);
        };
        let mutability = if kind.has_default() {
            Mutability::ComputedOptional
        } else {
            mutability
        };

        let mut attr = Attribute::new(name, kind, mutability);
        attr.req_body_usage = self.source.req_body_usage();
        attr.sensitive = node.is_sensitive();
        attr.description = node
            .description
            .filter(|d| !d.trim().is_empty())
            .map(str::to_string);
        if node.deprecated {
            attr.deprecation_message = Some(DEPRECATION_MESSAGE.to_string());
        }
        Ok(Some(attr))
    }

    fn object_attributes(&mut self, node: &SchemaNode<'a>) -> AppResult<Attributes> {
        let mut attrs = Attributes::new();
        for (name, property) in node.properties() {
            let child = SchemaNode::build(self.doc, property).map_err(|e| e.at_attribute(name))?;
            if self.source == Source::CreateRequest && child.read_only {
                tracing::debug!(attribute = name, "skipping read-only request property");
                continue;
            }
            let mutability = self.source.property_mutability(node.is_required(name));
            let built = self
                .attribute(&child, name, mutability)
                .map_err(|e| e.at_attribute(name))?;
            if let Some(attr) = built {
                attrs.push(attr);
            }
        }
        attrs.sort_by_name();
        Ok(attrs)
    }

    /// Attributes plus discriminator of an object node; `None` when the node
    /// is already being built further up the tree.
    fn nested_object(
        &mut self,
        node: &SchemaNode<'a>,
        name: &str,
    ) -> AppResult<Option<NestedAttributeObject>> {
        if self.ancestors.iter().any(|a| std::ptr::eq(*a, node.raw)) {
            tracing::warn!(attribute = name, "recursive schema cannot be expanded");
            return Ok(None);
        }
        self.ancestors.push(node.raw);
        let attributes = self.object_attributes(node);
        self.ancestors.pop();
        Ok(Some(NestedAttributeObject {
            attributes: attributes?,
            discriminator: extract_discriminator(self.doc, node)?,
        }))
    }

    fn kind(&mut self, node: &SchemaNode<'a>, name: &str) -> AppResult<Option<AttributeKind>> {
        let default = node.default;
        let kind = match node.kind {
            NodeKind::String => AttributeKind::String {
                default: default.and_then(Value::as_str).map(str::to_string),
            },
            NodeKind::Integer => AttributeKind::Int64 {
                default: default.and_then(Value::as_i64),
            },
            NodeKind::Number if is_float_format(node.format) => AttributeKind::Float64 {
                default: default.and_then(Value::as_f64),
            },
            NodeKind::Number => AttributeKind::Number,
            NodeKind::Boolean => AttributeKind::Bool {
                default: default.and_then(Value::as_bool),
            },
            NodeKind::Array => return self.array(node, name).map(Some),
            NodeKind::Object => return self.object(node, name),
        };
        Ok(Some(kind))
    }

    fn array(&mut self, node: &SchemaNode<'a>, name: &str) -> AppResult<AttributeKind> {
        let unique = node.is_set();
        let Some(items) = node.items() else {
            tracing::warn!(attribute = name, "array has no items schema, element kind unknown");
            return Ok(collection(unique, ElemType::Unknown));
        };
        let element = match SchemaNode::build(self.doc, items) {
            Ok(element) => element,
            Err(e) => {
                tracing::warn!(attribute = name, error = %e, "array element kind unknown");
                return Ok(collection(unique, ElemType::Unknown));
            }
        };

        match element.kind {
            NodeKind::Object if element.has_properties() => {
                let Some(nested_object) = self.nested_object(&element, name)? else {
                    return Ok(collection(unique, ElemType::Unknown));
                };
                Ok(if unique {
                    AttributeKind::SetNested { nested_object }
                } else {
                    AttributeKind::ListNested { nested_object }
                })
            }
            NodeKind::Object | NodeKind::Array => {
                tracing::warn!(attribute = name, "unsupported array element, element kind unknown");
                Ok(collection(unique, ElemType::Unknown))
            }
            _ => Ok(collection(unique, element_type(&element))),
        }
    }

    fn object(&mut self, node: &SchemaNode<'a>, name: &str) -> AppResult<Option<AttributeKind>> {
        if node.has_properties() {
            return Ok(self
                .nested_object(node, name)?
                .map(|nested_object| AttributeKind::SingleNested { nested_object }));
        }
        let Some(values) = node.additional_properties() else {
            tracing::warn!(attribute = name, "free-form object produces no attribute");
            return Ok(None);
        };

        let unknown = AttributeKind::Map {
            element_type: ElemType::Unknown,
        };
        let kind = match SchemaNode::build(self.doc, values) {
            Ok(value) if value.kind == NodeKind::Object && value.has_properties() => self
                .nested_object(&value, name)?
                .map_or(unknown, |nested_object| AttributeKind::MapNested { nested_object }),
            Ok(value) if value.kind.is_primitive() => AttributeKind::Map {
                element_type: element_type(&value),
            },
            Ok(_) => {
                tracing::warn!(attribute = name, "unsupported map value, element kind unknown");
                unknown
            }
            Err(e) => {
                tracing::warn!(attribute = name, error = %e, "map value kind unknown");
                unknown
            }
        };
        Ok(Some(kind))
    }
}

fn collection(unique: bool, element_type: ElemType) -> AttributeKind {
    if unique {
        AttributeKind::Set { element_type }
    } else {
        AttributeKind::List { element_type }
    }
}

fn element_type(node: &SchemaNode<'_>) -> ElemType {
    match node.kind {
        NodeKind::String => ElemType::String,
        NodeKind::Integer => ElemType::Int64,
        NodeKind::Number if is_float_format(node.format) => ElemType::Float64,
        NodeKind::Number => ElemType::Number,
        NodeKind::Boolean => ElemType::Bool,
        NodeKind::Array | NodeKind::Object => ElemType::Unknown,
    }
}

fn is_float_format(format: Option<&str>) -> bool {
    matches!(format, Some("double") | Some("float"))
}
