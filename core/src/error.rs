//! # Error Handling
//!
//! Provides the unified `AppError` enum used across the workspace.
//!
//! Resolution failures for the operations of one resource are collected into
//! [`AppError::Aggregate`] so a single run reports every broken mapping.
//! Attribute build failures are wrapped in [`AppError::Attribute`] as they
//! bubble out of the recursive tree construction, so the final message names
//! the full dotted attribute path.

use derive_more::{Display, From};

/// The Global Error Enum.
///
/// We use `derive_more` for boilerplate.
/// Note: String errors default to `General`.
#[derive(Debug, Display, From)]
pub enum AppError {
    /// Wrapper for standard IO errors.
    #[display("IO Error: {_0}")]
    Io(std::io::Error),

    /// Wrapper for YAML (de)serialization errors.
    #[display("YAML Error: {_0}")]
    Yaml(serde_yaml::Error),

    /// Wrapper for JSON (de)serialization errors.
    #[display("JSON Error: {_0}")]
    Json(serde_json::Error),

    /// A schema node carries no usable type information.
    #[from(ignore)]
    #[display("schema type cannot be inferred: {_0}")]
    SchemaNotInferable(String),

    /// The configuration references a path absent from the API description.
    #[from(ignore)]
    #[display("path '{_0}' not found in OpenAPI spec")]
    PathNotFound(String),

    /// The configuration references a method not defined at an existing path.
    #[from(ignore)]
    #[display("method '{method}' not found at OpenAPI path '{path}'")]
    MethodNotFound {
        /// OpenAPI path template.
        path: String,
        /// Configured HTTP method.
        method: String,
    },

    /// An operation has no usable request or response body schema.
    #[from(ignore)]
    #[display("schema not found: {_0}")]
    SchemaNotFound(String),

    /// A schema type outside the supported primitive/array/object set.
    #[from(ignore)]
    #[display("unsupported attribute kind '{_0}'")]
    UnsupportedAttributeKind(String),

    /// Malformed generator configuration.
    #[from(ignore)]
    #[display("Configuration Error: {_0}")]
    Config(String),

    /// A failure while building the attribute at a dotted path.
    #[from(ignore)]
    #[display("attribute '{path}': {source}")]
    Attribute {
        /// Dotted wire-name path of the failing attribute.
        path: String,
        /// Underlying failure.
        source: Box<AppError>,
    },

    /// A failure while processing one operation of a resource.
    #[from(ignore)]
    #[display("operation '{operation}': {source}")]
    Operation {
        /// Operation label (e.g. `create`, `read.response`).
        operation: String,
        /// Underlying failure.
        source: Box<AppError>,
    },

    /// A failure while compiling one resource.
    #[from(ignore)]
    #[display("resource '{resource}': {source}")]
    Resource {
        /// Configured resource name.
        resource: String,
        /// Underlying failure.
        source: Box<AppError>,
    },

    /// Several independent failures, reported together one per line.
    #[from(ignore)]
    #[display("{}", render_aggregate(_0))]
    Aggregate(Vec<AppError>),

    /// Generic errors.
    #[display("General Error: {_0}")]
    General(String),
}

impl AppError {
    /// Prefixes the attribute path carried by this error with `name`,
    /// or starts a new attribute context.
    pub fn at_attribute(self, name: &str) -> Self {
        match self {
            AppError::Attribute { path, source } => AppError::Attribute {
                path: format!("{}.{}", name, path),
                source,
            },
            other => AppError::Attribute {
                path: name.to_string(),
                source: Box::new(other),
            },
        }
    }

    /// Wraps this error with the operation it occurred in.
    pub fn in_operation(self, operation: impl Into<String>) -> Self {
        AppError::Operation {
            operation: operation.into(),
            source: Box::new(self),
        }
    }

    /// Wraps this error with the resource it occurred in.
    pub fn in_resource(self, resource: impl Into<String>) -> Self {
        AppError::Resource {
            resource: resource.into(),
            source: Box::new(self),
        }
    }

    /// Collapses a list of failures into one error.
    ///
    /// Returns `None` for an empty list and the error itself for a single entry.
    pub fn join(mut errors: Vec<AppError>) -> Option<AppError> {
        match errors.len() {
            0 => None,
            1 => errors.pop(),
            _ => Some(AppError::Aggregate(errors)),
        }
    }

    /// Returns true when this error (or the error it wraps) is a missing body schema.
    pub fn is_schema_not_found(&self) -> bool {
        match self {
            AppError::SchemaNotFound(_) => true,
            AppError::Operation { source, .. } | AppError::Attribute { source, .. } => {
                source.is_schema_not_found()
            }
            _ => false,
        }
    }
}

fn render_aggregate(errors: &[AppError]) -> String {
    errors
        .iter()
        .map(|e| e.to_string())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Manual implementation of the standard Error trait.
impl std::error::Error for AppError {}

/// Helper type alias for Result using AppError.
pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Error, ErrorKind};

    #[test]
    fn test_io_conversion() {
        let io_err = Error::new(ErrorKind::Other, "test");
        let app_err: AppError = io_err.into();
        assert!(matches!(app_err, AppError::Io(_)));
    }

    #[test]
    fn test_string_conversion() {
        let msg = String::from("something wrong");
        let app_err: AppError = msg.into();
        match app_err {
            AppError::General(s) => assert_eq!(s, "something wrong"),
            _ => panic!("String should convert to AppError::General"),
        }
    }

    #[test]
    fn test_attribute_path_accumulates_outwards() {
        let err = AppError::SchemaNotInferable("empty schema".into())
            .at_attribute("inner")
            .at_attribute("outer");
        assert_eq!(
            err.to_string(),
            "attribute 'outer.inner': schema type cannot be inferred: empty schema"
        );
    }

    #[test]
    fn test_aggregate_is_one_line_per_error() {
        let err = AppError::join(vec![
            AppError::PathNotFound("/a".into()).in_operation("create"),
            AppError::MethodNotFound {
                path: "/b".into(),
                method: "PUT".into(),
            }
            .in_operation("update"),
        ])
        .unwrap();
        assert_eq!(
            err.to_string(),
            "operation 'create': path '/a' not found in OpenAPI spec\n\
             operation 'update': method 'PUT' not found at OpenAPI path '/b'"
        );
    }

    #[test]
    fn test_join_single_and_empty() {
        assert!(AppError::join(vec![]).is_none());
        let single = AppError::join(vec![AppError::General("x".into())]).unwrap();
        assert!(matches!(single, AppError::General(_)));
    }

    #[test]
    fn test_schema_not_found_detection_through_context() {
        let err = AppError::SchemaNotFound("no body".into()).in_operation("read");
        assert!(err.is_schema_not_found());
        assert!(!AppError::General("x".into()).is_schema_not_found());
    }
}
