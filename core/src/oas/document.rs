#![deny(missing_docs)]

//! # OpenAPI Document
//!
//! Loads an API description into a raw JSON tree (the target of `$ref`
//! pointers) plus the typed shims.
//!
//! Parameter, request body and response references are inlined once at load
//! time so the rest of the compiler borrows every node from the document
//! itself. Schema references are left in place: schemas may be recursive and
//! are resolved lazily, one node at a time.

use crate::error::{AppError, AppResult};
use crate::oas::ref_utils::{resolve_chain, resolve_pointer};
use crate::oas::shims::{
    select_media, ShimOpenApi, ShimOperation, ShimParameter, ShimPathItem, ShimResponse,
};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::path::Path;
use utoipa::openapi::RefOr;

/// Status codes tried, in order, before falling back to any other `2XX` response.
const SUCCESS_CODES: [&str; 3] = ["200", "201", "202"];

/// A request or response body schema with the media type it was found under.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BodySchema<'a> {
    /// Selected media type (e.g. `application/vnd.atlas.2023-01-01+json`).
    pub media_type: &'a str,
    /// Body schema node (possibly a `$ref`).
    pub schema: &'a Value,
}

/// A parsed API description.
pub struct ApiDocument {
    raw: Value,
    shim: ShimOpenApi,
}

impl ApiDocument {
    /// Parses a YAML (or JSON) document.
    pub fn from_yaml(content: &str) -> AppResult<Self> {
        let raw: Value = serde_yaml::from_str(content)
            .map_err(|e| AppError::General(format!("Failed to parse OpenAPI YAML: {}", e)))?;
        let mut shim: ShimOpenApi = serde_json::from_value(raw.clone())
            .map_err(|e| AppError::General(format!("Failed to parse OpenAPI document: {}", e)))?;
        inline_references(&raw, &mut shim);
        Ok(Self { raw, shim })
    }

    /// Reads and parses a document from disk.
    pub fn from_path(path: &Path) -> AppResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// The declared OpenAPI version.
    pub fn version(&self) -> Option<&str> {
        self.shim.openapi.as_deref()
    }

    /// The path item registered under an exact path template.
    pub fn path_item(&self, path: &str) -> Option<&ShimPathItem> {
        self.shim.paths.items.get(path)
    }

    /// Follows `$ref` hops from `node` to the schema it designates.
    pub fn resolve_schema<'a>(&'a self, node: &'a Value) -> AppResult<&'a Value> {
        resolve_chain(&self.raw, node)
    }

    /// The request body schema of an operation.
    ///
    /// Fails with `SchemaNotFound` when the operation declares no body or no
    /// media type with a schema.
    pub fn request_body<'a>(&'a self, op: &'a ShimOperation) -> AppResult<BodySchema<'a>> {
        let body = op.request_body.as_ref().ok_or_else(|| {
            AppError::SchemaNotFound(format!("operation '{}' has no request body", op.label()))
        })?;
        let body = inlined(body)?;
        select_media(&body.content)
            .map(|(media_type, schema)| BodySchema { media_type, schema })
            .ok_or_else(|| {
                AppError::SchemaNotFound(format!(
                    "request body of operation '{}' has no schema",
                    op.label()
                ))
            })
    }

    /// The body schema of an operation's success response.
    pub fn success_response<'a>(&'a self, op: &'a ShimOperation) -> AppResult<BodySchema<'a>> {
        let (code, response) = success_entry(op).ok_or_else(|| {
            AppError::SchemaNotFound(format!(
                "operation '{}' has no success response",
                op.label()
            ))
        })?;
        let response: &ShimResponse = inlined(response)?;
        select_media(&response.content)
            .map(|(media_type, schema)| BodySchema { media_type, schema })
            .ok_or_else(|| {
                AppError::SchemaNotFound(format!(
                    "response '{}' of operation '{}' has no schema",
                    code,
                    op.label()
                ))
            })
    }
}

/// Unwraps a member whose reference was inlined at load time.
pub(crate) fn inlined<T>(slot: &RefOr<T>) -> AppResult<&T> {
    match slot {
        RefOr::T(value) => Ok(value),
        RefOr::Ref(reference) => Err(AppError::SchemaNotInferable(format!(
            "unresolved reference '{}'",
            reference.ref_location
        ))),
    }
}

/// Resolved parameters of a list, skipping (and logging) dangling references.
pub(crate) fn inlined_parameters(
    params: &[RefOr<ShimParameter>],
) -> impl Iterator<Item = &ShimParameter> {
    params.iter().filter_map(|p| match inlined(p) {
        Ok(param) => Some(param),
        Err(e) => {
            tracing::warn!(error = %e, "skipping parameter");
            None
        }
    })
}

fn success_entry(op: &ShimOperation) -> Option<(&str, &RefOr<ShimResponse>)> {
    SUCCESS_CODES
        .iter()
        .find_map(|code| op.responses.get_key_value(*code))
        .or_else(|| op.responses.iter().find(|(code, _)| code.starts_with('2')))
        .map(|(code, response)| (code.as_str(), response))
}

fn inline_references(raw: &Value, shim: &mut ShimOpenApi) {
    for item in shim.paths.items.values_mut() {
        for param in item.parameters.iter_mut() {
            inline(raw, param);
        }
        for op in item.operations_mut() {
            for param in op.parameters.iter_mut() {
                inline(raw, param);
            }
            if let Some(body) = op.request_body.as_mut() {
                inline(raw, body);
            }
            for response in op.responses.values_mut() {
                inline(raw, response);
            }
        }
    }
}

fn inline<T: DeserializeOwned>(raw: &Value, slot: &mut RefOr<T>) {
    let location = match slot {
        RefOr::Ref(reference) => reference.ref_location.clone(),
        RefOr::T(_) => return,
    };
    let resolved = resolve_pointer(raw, &location)
        .and_then(|target| resolve_chain(raw, target))
        .and_then(|target| serde_json::from_value::<T>(target.clone()).map_err(AppError::from));
    match resolved {
        Ok(value) => *slot = RefOr::T(value),
        Err(e) => tracing::debug!(reference = %location, error = %e, "leaving reference unresolved"),
    }
}
