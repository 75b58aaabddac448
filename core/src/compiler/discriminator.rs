//! # Discriminator Extractor
//!
//! Reads polymorphic variant metadata from the `x-discriminator` extension of
//! an object schema:
//!
//! ```yaml
//! x-discriminator:
//!   propertyName: type
//!   mapping:
//!     TENANT:
//!       properties: [tenantName, region]
//!       required: [tenantName]
//! ```

use crate::compiler::schema_node::SchemaNode;
use crate::error::{AppError, AppResult};
use crate::model::{Discriminator, DiscriminatorAttrName, DiscriminatorType};
use crate::naming;
use crate::oas::ApiDocument;
use serde::Deserialize;
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};

/// Schema extension holding discriminator metadata.
pub const DISCRIMINATOR_EXTENSION: &str = "x-discriminator";

#[derive(Deserialize)]
struct RawDiscriminator {
    #[serde(rename = "propertyName")]
    property_name: String,
    #[serde(default)]
    mapping: BTreeMap<String, RawVariant>,
}

#[derive(Deserialize)]
struct RawVariant {
    #[serde(default)]
    properties: Vec<String>,
    #[serde(default)]
    required: Vec<String>,
}

/// Extracts the discriminator of an object node, if it declares one.
///
/// The selector property is dropped from every variant, and read-only
/// properties are dropped from `required`.
pub fn extract_discriminator(
    doc: &ApiDocument,
    node: &SchemaNode<'_>,
) -> AppResult<Option<Discriminator>> {
    let Some(extension) = node.extension(DISCRIMINATOR_EXTENSION) else {
        return Ok(None);
    };
    let raw: RawDiscriminator = serde_json::from_value(extension.clone()).map_err(|e| {
        AppError::General(format!("malformed {}: {}", DISCRIMINATOR_EXTENSION, e))
    })?;

    let property_name = DiscriminatorAttrName::from_api_name(&raw.property_name);
    let read_only: BTreeSet<String> = node
        .properties()
        .filter(|(_, schema)| is_read_only(doc, schema))
        .map(|(name, _)| naming::schema_name(name))
        .collect();

    let mapping = raw
        .mapping
        .into_iter()
        .map(|(tag, variant)| {
            let mut variant_type = DiscriminatorType {
                allowed: variant_names(&variant.properties, &property_name),
                required: variant_names(&variant.required, &property_name)
                    .into_iter()
                    .filter(|n| !read_only.contains(&n.schema_name))
                    .collect(),
            };
            variant_type.normalize();
            (tag, variant_type)
        })
        .collect();

    Ok(Some(Discriminator {
        property_name,
        mapping,
    }))
}

fn variant_names(
    names: &[String],
    selector: &DiscriminatorAttrName,
) -> Vec<DiscriminatorAttrName> {
    names
        .iter()
        .map(|name| DiscriminatorAttrName::from_api_name(name))
        .filter(|name| name.schema_name != selector.schema_name)
        .collect()
}

fn is_read_only(doc: &ApiDocument, schema: &Value) -> bool {
    let flag = |v: &Value| v.get("readOnly").and_then(Value::as_bool).unwrap_or(false);
    flag(schema) || doc.resolve_schema(schema).map(flag).unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn names(list: &[DiscriminatorAttrName]) -> Vec<&str> {
        list.iter().map(|n| n.schema_name.as_str()).collect()
    }

    fn doc() -> ApiDocument {
        ApiDocument::from_yaml(
            r#"
openapi: 3.0.1
paths: {}
components:
  schemas:
    Id:
      type: string
      readOnly: true
"#,
        )
        .unwrap()
    }

    #[test]
    fn test_extract_filters_selector_and_read_only() {
        let doc = doc();
        let schema = json!({
            "type": "object",
            "properties": {
                "type": { "type": "string" },
                "tenantName": { "type": "string" },
                "region": { "type": "string" },
                "clusterId": { "$ref": "#/components/schemas/Id" }
            },
            "x-discriminator": {
                "propertyName": "type",
                "mapping": {
                    "TENANT": {
                        "properties": ["type", "tenantName", "region", "clusterId"],
                        "required": ["type", "tenantName", "clusterId"]
                    },
                    "EMPTY": {}
                }
            }
        });
        let node = SchemaNode::build(&doc, &schema).unwrap();
        let disc = extract_discriminator(&doc, &node).unwrap().unwrap();

        assert_eq!(disc.property_name.schema_name, "type");
        let tenant = &disc.mapping["TENANT"];
        assert_eq!(names(&tenant.allowed), vec!["cluster_id", "region", "tenant_name"]);
        assert_eq!(names(&tenant.required), vec!["tenant_name"]);
        assert_eq!(tenant.allowed[2].api_name, "tenantName");
        assert!(disc.mapping["EMPTY"].allowed.is_empty());
    }

    #[test]
    fn test_absent_and_malformed() {
        let doc = doc();
        let plain = json!({ "properties": { "a": { "type": "string" } } });
        let node = SchemaNode::build(&doc, &plain).unwrap();
        assert!(extract_discriminator(&doc, &node).unwrap().is_none());

        let broken = json!({
            "properties": { "a": { "type": "string" } },
            "x-discriminator": { "mapping": {} }
        });
        let node = SchemaNode::build(&doc, &broken).unwrap();
        assert!(extract_discriminator(&doc, &node).is_err());
    }
}
