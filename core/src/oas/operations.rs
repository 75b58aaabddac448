#![deny(missing_docs)]

//! # Operation Resolution
//!
//! Maps the path and method bindings of a resource configuration onto the
//! operations of the API description.
//!
//! Failures for the individual bindings of one resource are aggregated so a
//! single run reports every broken mapping.

use crate::config::ResourceConfig;
use crate::error::{AppError, AppResult};
use crate::model::ApiOperation;
use crate::oas::document::{inlined_parameters, ApiDocument};
use crate::oas::shims::{ShimOperation, ShimParameter};
use utoipa::openapi::RefOr;

/// A configured binding together with the operation it designates.
#[derive(Clone, Copy)]
pub struct ResolvedOperation<'a> {
    /// The configured path and method.
    pub binding: &'a ApiOperation,
    /// The operation definition.
    pub operation: &'a ShimOperation,
    /// Parameters declared at the path level.
    pub common_parameters: &'a [RefOr<ShimParameter>],
}

impl<'a> ResolvedOperation<'a> {
    /// Operation-level parameters followed by the path-level ones.
    pub fn parameters(&self) -> impl Iterator<Item = &'a ShimParameter> {
        let operation: &'a ShimOperation = self.operation;
        inlined_parameters(&operation.parameters).chain(inlined_parameters(self.common_parameters))
    }
}

/// Every resolved operation of one resource.
#[derive(Clone, Copy)]
pub struct ResolvedOperations<'a> {
    /// Creation.
    pub create: ResolvedOperation<'a>,
    /// Read.
    pub read: ResolvedOperation<'a>,
    /// Update.
    pub update: Option<ResolvedOperation<'a>>,
    /// Deletion.
    pub delete: Option<ResolvedOperation<'a>>,
    /// Listing.
    pub list: Option<ResolvedOperation<'a>>,
}

impl ApiDocument {
    /// The operation bound to `method` at `path`.
    pub fn operation(&self, path: &str, method: &str) -> AppResult<&ShimOperation> {
        let item = self
            .path_item(path)
            .ok_or_else(|| AppError::PathNotFound(path.to_string()))?;
        item.operation(method)
            .flatten()
            .ok_or_else(|| AppError::MethodNotFound {
                path: path.to_string(),
                method: method.to_string(),
            })
    }

    /// Parameters shared by every method at `path`.
    pub fn common_parameters(&self, path: &str) -> AppResult<&[RefOr<ShimParameter>]> {
        self.path_item(path)
            .map(|item| item.parameters.as_slice())
            .ok_or_else(|| AppError::PathNotFound(path.to_string()))
    }

    /// Resolves one binding.
    pub fn resolve_operation<'a>(
        &'a self,
        binding: &'a ApiOperation,
    ) -> AppResult<ResolvedOperation<'a>> {
        let operation = self.operation(&binding.path, &binding.http_method)?;
        let common_parameters = self.common_parameters(&binding.path)?;
        Ok(ResolvedOperation {
            binding,
            operation,
            common_parameters,
        })
    }

    /// Resolves every binding of a resource, aggregating the failures.
    pub fn resolve_operations<'a>(
        &'a self,
        config: &'a ResourceConfig,
    ) -> AppResult<ResolvedOperations<'a>> {
        let mut errors = Vec::new();
        let mut resolve = |label: &str, binding: &'a ApiOperation| {
            match self.resolve_operation(binding) {
                Ok(resolved) => Some(resolved),
                Err(e) => {
                    errors.push(e.in_operation(label));
                    None
                }
            }
        };

        let create = resolve("create", &config.create);
        let read = resolve("read", &config.read);
        let update = config.update.as_ref().and_then(|b| resolve("update", b));
        let delete = config.delete.as_ref().and_then(|b| resolve("delete", b));
        let list = config.list.as_ref().and_then(|b| resolve("list", b));

        if let Some(err) = AppError::join(errors) {
            return Err(err);
        }
        match (create, read) {
            (Some(create), Some(read)) => Ok(ResolvedOperations {
                create,
                read,
                update,
                delete,
                list,
            }),
            _ => Err(AppError::General(
                "create and read operations must resolve".into(),
            )),
        }
    }
}
