#![deny(missing_docs)]

//! # Resource Compiler
//!
//! Pipeline turning an API description plus a resource configuration into
//! the resource model:
//!
//! - **schema_node**: single-level schema classification.
//! - **attributes**: attribute tree construction.
//! - **discriminator**: `x-discriminator` extraction.
//! - **merge**: multi-source merge with mutability precedence.
//! - **transform**: configured ignores, aliases, overrides and synthetic attributes.
//!
//! Resources compile independently of each other; nothing is shared between
//! two `compile_resource` calls.

pub mod attributes;
pub mod discriminator;
pub mod merge;
pub mod schema_node;
pub mod transform;

use crate::compiler::attributes::{build_attribute, build_object_attributes};
use crate::compiler::discriminator::extract_discriminator;
use crate::compiler::merge::{merge_attributes, merge_root_discriminators};
use crate::compiler::schema_node::{NodeKind, SchemaNode};
use crate::compiler::transform::apply_schema_options;
use crate::config::{GenConfig, ResourceConfig};
use crate::error::{AppError, AppResult};
use crate::model::{
    ApiOperations, Attributes, Discriminator, Model, Mutability, RequestBodyUsage, Resource, Schema,
};
use crate::oas::shims::ShimParameter;
use crate::oas::{ApiDocument, BodySchema, ResolvedOperation, ResolvedOperations};

/// Deprecation message attached to a deprecated resource.
pub const RESOURCE_DEPRECATION_MESSAGE: &str =
    "This resource is deprecated and will be removed in a future release.";

/// Where an attribute definition comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Source {
    /// A path parameter of the create or read operation.
    PathParam,
    /// The creation request body.
    CreateRequest,
    /// The creation or read response body.
    Response,
}

impl Source {
    /// Mutability of an object property contributed by this source.
    pub fn property_mutability(self, required: bool) -> Mutability {
        match self {
            Source::PathParam => Mutability::Required,
            Source::CreateRequest if required => Mutability::Required,
            Source::CreateRequest => Mutability::Optional,
            Source::Response => Mutability::Computed,
        }
    }

    /// Request bodies an attribute from this source is sent in.
    pub fn req_body_usage(self) -> RequestBodyUsage {
        match self {
            Source::CreateRequest => RequestBodyUsage::AllBodies,
            Source::PathParam | Source::Response => RequestBodyUsage::OmitAlways,
        }
    }

    /// True for sources the caller controls.
    pub fn is_request(self) -> bool {
        !matches!(self, Source::Response)
    }
}

/// The attributes and root discriminator one body contributes.
#[derive(Debug, Default)]
struct BodyContribution {
    attributes: Attributes,
    discriminator: Option<Discriminator>,
}

/// Compiles one configured resource.
pub fn compile_resource(
    doc: &ApiDocument,
    name: &str,
    config: &ResourceConfig,
) -> AppResult<Resource> {
    compile_resource_inner(doc, name, config).map_err(|e| e.in_resource(name))
}

/// Compiles the resource named `only`, or every configured resource sorted by name.
pub fn compile_model(doc: &ApiDocument, config: &GenConfig, only: Option<&str>) -> AppResult<Model> {
    let resources = match only {
        Some(name) => {
            let resource = config.resources.get(name).ok_or_else(|| {
                AppError::Config(format!("resource '{}' not found in configuration", name))
            })?;
            vec![compile_resource(doc, name, resource)?]
        }
        None => config
            .resources
            .iter()
            .map(|(name, resource)| compile_resource(doc, name, resource))
            .collect::<AppResult<Vec<_>>>()?,
    };
    Ok(Model { resources })
}

fn compile_resource_inner(
    doc: &ApiDocument,
    name: &str,
    config: &ResourceConfig,
) -> AppResult<Resource> {
    tracing::debug!(resource = name, "compiling");
    let ops = doc.resolve_operations(config)?;

    let path_params = path_param_attributes(doc, &ops)?;

    let create_request = doc.request_body(ops.create.operation);
    let create_response = doc.success_response(ops.create.operation);
    let read_response = doc.success_response(ops.read.operation);
    let version_header = version_header(
        config,
        media_type(&create_request),
        media_type(&read_response),
    );

    let request = body_contribution(doc, create_request, Source::CreateRequest)
        .map_err(|e| e.in_operation("create.request"))?;
    let created = body_contribution(doc, create_response, Source::Response)
        .map_err(|e| e.in_operation("create.response"))?;
    let read = body_contribution(doc, read_response, Source::Response)
        .map_err(|e| e.in_operation("read.response"))?;

    let create = ops.create.operation;
    let schema = Schema {
        description: create
            .description
            .clone()
            .or_else(|| create.summary.clone())
            .filter(|d| !d.trim().is_empty()),
        deprecation_message: create
            .deprecated
            .then(|| RESOURCE_DEPRECATION_MESSAGE.to_string()),
        attributes: merge_attributes(
            &path_params,
            &request.attributes,
            &created.attributes,
            &read.attributes,
        ),
        discriminator: merge_root_discriminators(
            request.discriminator.as_ref(),
            created.discriminator.as_ref(),
            read.discriminator.as_ref(),
        ),
    };

    let operations = ApiOperations {
        create: config.create.clone(),
        read: config.read.clone(),
        update: config.update.clone(),
        delete: config.delete.clone(),
        list: config.list.clone(),
        version_header,
    };

    let resource = Resource {
        name: name.to_string(),
        schema,
        operations,
    };
    Ok(apply_schema_options(resource, &config.schema_options))
}

/// Builds the contribution of one body; a missing body contributes nothing.
fn body_contribution(
    doc: &ApiDocument,
    body: AppResult<BodySchema<'_>>,
    source: Source,
) -> AppResult<BodyContribution> {
    let body = match body {
        Ok(body) => body,
        Err(e) if e.is_schema_not_found() => {
            tracing::info!(error = %e, "no body schema, skipping");
            return Ok(BodyContribution::default());
        }
        Err(e) => return Err(e),
    };

    let node = SchemaNode::build(doc, body.schema)?;
    if node.kind != NodeKind::Object {
        tracing::warn!(
            media_type = body.media_type,
            "body schema is not an object, skipping"
        );
        return Ok(BodyContribution::default());
    }
    Ok(BodyContribution {
        attributes: build_object_attributes(doc, &node, source)?,
        discriminator: extract_discriminator(doc, &node)?,
    })
}

/// Attributes for the `in: path` parameters of the create and read operations.
fn path_param_attributes(doc: &ApiDocument, ops: &ResolvedOperations<'_>) -> AppResult<Attributes> {
    let mut attrs = Attributes::new();
    for param in path_parameters(ops.create).chain(path_parameters(ops.read)) {
        let Some(schema) = param.schema.as_ref() else {
            tracing::warn!(parameter = %param.name, "path parameter has no schema, skipping");
            continue;
        };
        let built = SchemaNode::build(doc, schema).and_then(|node| {
            build_attribute(doc, &node, &param.name, Mutability::Required, Source::PathParam)
        });
        match built {
            Ok(Some(mut attr)) => {
                if let Some(description) = param.description.as_ref().filter(|d| !d.trim().is_empty()) {
                    attr.description = Some(description.clone());
                }
                attr.mutability = Mutability::Required;
                attrs.push_new(attr);
            }
            Ok(None) => {
                tracing::warn!(parameter = %param.name, "path parameter could not be mapped, skipping");
            }
            Err(e) => {
                tracing::warn!(parameter = %param.name, error = %e, "path parameter could not be mapped, skipping");
            }
        }
    }
    Ok(attrs)
}

fn path_parameters<'a>(op: ResolvedOperation<'a>) -> impl Iterator<Item = &'a ShimParameter> {
    op.parameters().filter(|p| p.is_path())
}

fn media_type<'a>(body: &AppResult<BodySchema<'a>>) -> Option<&'a str> {
    body.as_ref().ok().map(|b| b.media_type)
}

/// Configured version, else a vendor request media type, else the read response media type.
fn version_header(
    config: &ResourceConfig,
    create_request: Option<&str>,
    read_response: Option<&str>,
) -> Option<String> {
    config
        .version_header
        .clone()
        .or_else(|| {
            create_request
                .filter(|m| m.starts_with("application/vnd."))
                .map(str::to_string)
        })
        .or_else(|| read_response.map(str::to_string))
}
