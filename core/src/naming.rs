//! # Naming
//!
//! Conversions between wire names (as they appear in the API description)
//! and the identifiers used in the compiled model.
//!
//! - Schema names: lowercase words separated by `_`. A separator is inserted
//!   only where a lowercase letter is followed by an uppercase one, so
//!   `createdAt` becomes `created_at` while acronym runs stay together.
//! - Model names: `UpperCamelCase`, safe to use as an identifier.

use heck::{ToLowerCamelCase, ToUpperCamelCase};
use regex::Regex;
use std::sync::OnceLock;

fn unsupported_chars() -> &'static Regex {
    static UNSUPPORTED_RE: OnceLock<Regex> = OnceLock::new();
    UNSUPPORTED_RE.get_or_init(|| Regex::new(r"[^A-Za-z0-9_]").expect("Invalid regex"))
}

/// Canonical schema name for a wire name (e.g. `groupId` -> `group_id`).
pub fn schema_name(wire_name: &str) -> String {
    let stripped = unsupported_chars().replace_all(wire_name, "");

    let mut result = String::with_capacity(stripped.len() + 4);
    let mut prev_lower = false;
    for c in stripped.chars() {
        if c.is_ascii_uppercase() && prev_lower {
            result.push('_');
        }
        prev_lower = c.is_ascii_lowercase();
        result.push(c.to_ascii_lowercase());
    }
    result
}

/// Identifier-safe model name for a wire or schema name (e.g. `created_at` -> `CreatedAt`).
pub fn model_name(name: &str) -> String {
    unsupported_chars()
        .replace_all(name, "")
        .to_upper_camel_case()
}

/// Path-template form of a name (e.g. `project_id` -> `projectId`).
pub fn path_param_name(name: &str) -> String {
    schema_name(name).to_lower_camel_case()
}
