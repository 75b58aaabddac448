//! # Document Shims
//!
//! Structures acting as an Intermediate Deserialization Layer for the parts
//! of an OpenAPI document the compiler reads: paths, operations, parameters,
//! request bodies and responses.
//!
//! Schemas are kept as raw `serde_json::Value`s. Their classification is the
//! job of the schema node builder, which tolerates omitted type tags.
//!
//! Note: Shims do not derive `Debug` because `utoipa::RefOr` does not
//! implement it without utoipa's `debug` feature.

use indexmap::IndexMap;
use serde::de::Error as DeError;
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use std::collections::BTreeMap;
use utoipa::openapi::RefOr;

/// Root of the document.
#[derive(Deserialize, Clone, Default)]
pub struct ShimOpenApi {
    /// OpenAPI version (e.g. "3.0.1").
    pub openapi: Option<String>,
    /// Path items.
    #[serde(default)]
    pub paths: ShimPaths,
}

/// The Paths Object. Specification extensions (`x-...`) are skipped.
#[derive(Clone, Default)]
pub struct ShimPaths {
    /// Parsed path items keyed by path template.
    pub items: BTreeMap<String, ShimPathItem>,
}

impl<'de> Deserialize<'de> for ShimPaths {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = BTreeMap::<String, Value>::deserialize(deserializer)?;
        let mut items = BTreeMap::new();

        for (key, value) in raw {
            if key.starts_with("x-") {
                continue;
            }
            let path_item = serde_json::from_value::<ShimPathItem>(value).map_err(|e| {
                DeError::custom(format!("Failed to parse path item '{}': {}", key, e))
            })?;
            items.insert(key, path_item);
        }

        Ok(Self { items })
    }
}

/// Operations available at one path, plus the parameters they all share.
#[derive(Deserialize, Clone, Default)]
pub struct ShimPathItem {
    /// Parameters shared by every operation at this path.
    #[serde(default)]
    pub parameters: Vec<RefOr<ShimParameter>>,
    /// GET operation.
    pub get: Option<ShimOperation>,
    /// PUT operation.
    pub put: Option<ShimOperation>,
    /// POST operation.
    pub post: Option<ShimOperation>,
    /// DELETE operation.
    pub delete: Option<ShimOperation>,
    /// PATCH operation.
    pub patch: Option<ShimOperation>,
}

impl ShimPathItem {
    /// Operation for an HTTP method (case-insensitive).
    ///
    /// Outer `None`: the method is not one the compiler understands.
    /// Inner `None`: the method is valid but not defined at this path.
    pub fn operation(&self, method: &str) -> Option<Option<&ShimOperation>> {
        let op = match method.to_ascii_lowercase().as_str() {
            "get" => &self.get,
            "put" => &self.put,
            "post" => &self.post,
            "delete" => &self.delete,
            "patch" => &self.patch,
            _ => return None,
        };
        Some(op.as_ref())
    }

    pub(crate) fn operations_mut(&mut self) -> impl Iterator<Item = &mut ShimOperation> {
        [
            self.get.as_mut(),
            self.put.as_mut(),
            self.post.as_mut(),
            self.delete.as_mut(),
            self.patch.as_mut(),
        ]
        .into_iter()
        .flatten()
    }
}

/// One API operation.
#[derive(Deserialize, Clone, Default)]
pub struct ShimOperation {
    /// Unique operation identifier.
    #[serde(rename = "operationId")]
    pub operation_id: Option<String>,
    /// Short summary.
    pub summary: Option<String>,
    /// Long description.
    pub description: Option<String>,
    /// Whether the operation is deprecated.
    #[serde(default)]
    pub deprecated: bool,
    /// Operation-level parameters.
    #[serde(default)]
    pub parameters: Vec<RefOr<ShimParameter>>,
    /// Request body.
    #[serde(rename = "requestBody")]
    pub request_body: Option<RefOr<ShimRequestBody>>,
    /// Responses keyed by status code.
    #[serde(default)]
    pub responses: BTreeMap<String, RefOr<ShimResponse>>,
}

impl ShimOperation {
    /// Identifier used in log lines.
    pub fn label(&self) -> &str {
        self.operation_id.as_deref().unwrap_or("<no operationId>")
    }
}

/// A parameter definition.
#[derive(Deserialize, Clone)]
pub struct ShimParameter {
    /// Name of the parameter.
    pub name: String,
    /// Location of the parameter (query, path, header, cookie).
    #[serde(rename = "in")]
    pub parameter_in: String,
    /// A brief description of the parameter.
    pub description: Option<String>,
    /// Whether the parameter is required.
    #[serde(default)]
    pub required: bool,
    /// Whether the parameter is deprecated.
    #[serde(default)]
    pub deprecated: bool,
    /// Schema definition.
    pub schema: Option<Value>,
}

impl ShimParameter {
    /// True for `in: path` parameters.
    pub fn is_path(&self) -> bool {
        self.parameter_in.eq_ignore_ascii_case("path")
    }
}

/// A request body definition.
#[derive(Deserialize, Clone, Default)]
pub struct ShimRequestBody {
    /// Description.
    pub description: Option<String>,
    /// Media types.
    #[serde(default)]
    pub content: IndexMap<String, ShimMediaType>,
    /// Whether the body is required.
    #[serde(default)]
    pub required: bool,
}

/// A response definition.
#[derive(Deserialize, Clone, Default)]
pub struct ShimResponse {
    /// Description.
    pub description: Option<String>,
    /// Media types.
    #[serde(default)]
    pub content: IndexMap<String, ShimMediaType>,
}

/// A media type entry of a body.
#[derive(Deserialize, Clone, Default)]
pub struct ShimMediaType {
    /// Body schema.
    pub schema: Option<Value>,
}

/// Picks the JSON media type of a content map: `application/json` or any
/// `+json` vendor type, falling back to the first entry that has a schema.
pub fn select_media(content: &IndexMap<String, ShimMediaType>) -> Option<(&str, &Value)> {
    let is_json = |k: &str| k == "application/json" || k.ends_with("+json");
    content
        .iter()
        .filter(|(k, _)| is_json(k))
        .chain(content.iter())
        .find_map(|(k, m)| m.schema.as_ref().map(|s| (k.as_str(), s)))
}
