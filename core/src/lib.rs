#![deny(missing_docs)]

//! # Rescomp Core
//!
//! Compiles an OpenAPI description plus a hand-authored resource
//! configuration into a normalized, language-agnostic resource model.
//!
//! ```no_run
//! use rescomp_core::{compile_model, ApiDocument, GenConfig};
//! use std::path::Path;
//!
//! # fn main() -> rescomp_core::error::AppResult<()> {
//! let doc = ApiDocument::from_path(Path::new("openapi.yaml"))?;
//! let config = GenConfig::from_path(Path::new("config.yml"))?;
//! let model = compile_model(&doc, &config, None)?;
//! println!("{}", model.to_yaml()?);
//! # Ok(())
//! # }
//! ```

/// Shared error types.
pub mod error;

/// Wire name to identifier conversions.
pub mod naming;

/// The compiled resource model.
pub mod model;

/// Generator configuration.
pub mod config;

/// OpenAPI document access.
pub mod oas;

/// The compilation pipeline.
pub mod compiler;

pub use compiler::{compile_model, compile_resource};
pub use config::{GenConfig, ResourceConfig, SchemaOptions};
pub use error::{AppError, AppResult};
pub use model::{Attribute, AttributeKind, Attributes, Model, Mutability, Resource};
pub use oas::ApiDocument;
