#![deny(missing_docs)]

//! # Reference Utilities
//!
//! Helpers for following local `$ref` JSON Pointers (e.g. `#/components/schemas/Thing`).
//!
//! External documents are never fetched: a reference without a local fragment
//! is reported as unresolvable.

use crate::error::{AppError, AppResult};
use percent_encoding::percent_decode_str;
use serde_json::Value;

/// Upper bound on chained `$ref` hops before a reference is considered cyclic.
pub(crate) const MAX_REF_DEPTH: usize = 32;

/// Decodes a JSON Pointer segment (handles `~1` and `~0`).
pub(crate) fn decode_pointer_segment(segment: &str) -> String {
    let decoded = segment.replace("~1", "/").replace("~0", "~");
    percent_decode_str(&decoded)
        .decode_utf8_lossy()
        .into_owned()
}

/// Returns the `$ref` target of a node, when the node is a reference.
pub(crate) fn ref_target(node: &Value) -> Option<&str> {
    node.get("$ref").and_then(Value::as_str)
}

/// Looks up the node a local reference points at.
pub(crate) fn resolve_pointer<'a>(root: &'a Value, reference: &str) -> AppResult<&'a Value> {
    let pointer = reference
        .strip_prefix('#')
        .ok_or_else(|| AppError::SchemaNotInferable(format!("external reference '{}'", reference)))?;

    let mut current = root;
    for raw in pointer.split('/').skip(1) {
        let segment = decode_pointer_segment(raw);
        let next = match current {
            Value::Object(map) => map.get(&segment),
            Value::Array(items) => segment.parse::<usize>().ok().and_then(|i| items.get(i)),
            _ => None,
        };
        current = next.ok_or_else(|| {
            AppError::SchemaNotInferable(format!("unresolved reference '{}'", reference))
        })?;
    }
    Ok(current)
}

/// Follows `$ref` chains starting at `node` until a non-reference node is reached.
pub(crate) fn resolve_chain<'a>(root: &'a Value, node: &'a Value) -> AppResult<&'a Value> {
    let mut current = node;
    for _ in 0..MAX_REF_DEPTH {
        match ref_target(current) {
            Some(target) => current = resolve_pointer(root, target)?,
            None => return Ok(current),
        }
    }
    Err(AppError::SchemaNotInferable(format!(
        "reference chain deeper than {} hops",
        MAX_REF_DEPTH
    )))
}
