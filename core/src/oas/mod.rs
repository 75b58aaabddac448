#![deny(missing_docs)]

//! # OpenAPI Layer
//!
//! - **shims**: Intermediate deserialization structs for paths and operations.
//! - **ref_utils**: Local `$ref` JSON Pointer resolution.
//! - **document**: Document loading and body selection.
//! - **operations**: Mapping configured bindings onto operations.

pub mod document;
pub mod operations;
pub(crate) mod ref_utils;
pub mod shims;

pub use document::{ApiDocument, BodySchema};
pub use operations::{ResolvedOperation, ResolvedOperations};
