//! # Multi-Source Merger
//!
//! Combines the attribute trees contributed by path parameters, the creation
//! request body, the creation response body and the read response body.
//!
//! Every function here is pure: inputs are borrowed, a new tree is returned.
//! Sources are folded in precedence order, so the first source to define an
//! attribute fixes its mutability and kind. Later sources can only fill
//! gaps: a missing description, a static default, the sensitive flag and
//! discriminator variants.

use crate::compiler::Source;
use crate::model::{
    Attribute, AttributeKind, Attributes, Discriminator, Mutability, NestedAttributeObject,
    RequestBodyUsage,
};
use indexmap::IndexMap;
use std::mem::discriminant;

/// Merges the four sources of a resource into one attribute tree.
///
/// Every level of the result is sorted by schema name, and every attribute
/// below a `Computed` ancestor is itself `Computed`.
pub fn merge_attributes(
    path_params: &Attributes,
    create_request: &Attributes,
    create_response: &Attributes,
    read_response: &Attributes,
) -> Attributes {
    let sources = [
        (Source::PathParam, path_params),
        (Source::CreateRequest, create_request),
        (Source::Response, create_response),
        (Source::Response, read_response),
    ];
    let merged = sources
        .into_iter()
        .fold(Attributes::new(), |acc, (source, incoming)| {
            merge_level(&acc, incoming, source)
        });
    propagate_computed(merged, false)
}

/// Merges the root discriminators of the three body sources.
pub fn merge_root_discriminators(
    create_request: Option<&Discriminator>,
    create_response: Option<&Discriminator>,
    read_response: Option<&Discriminator>,
) -> Option<Discriminator> {
    [
        (Source::CreateRequest, create_request),
        (Source::Response, create_response),
        (Source::Response, read_response),
    ]
    .into_iter()
    .fold(None, |acc, (source, incoming)| {
        merge_optional_discriminator(acc.as_ref(), incoming, source)
    })
}

/// Merges an incoming discriminator into an existing one.
///
/// `allowed` is the union of both. `required` only grows from request
/// sources: response variants never make a field caller-mandatory.
pub fn merge_discriminators(
    existing: Option<&Discriminator>,
    incoming: &Discriminator,
    source: Source,
) -> Discriminator {
    let mut incoming = incoming.clone();
    if !source.is_request() {
        incoming.clear_required();
    }
    let Some(existing) = existing else {
        for variant in incoming.mapping.values_mut() {
            variant.normalize();
        }
        return incoming;
    };

    let mut merged = existing.clone();
    for (tag, variant) in incoming.mapping {
        let slot = merged.mapping.entry(tag).or_default();
        slot.allowed.extend(variant.allowed);
        slot.required.extend(variant.required);
        slot.normalize();
    }
    merged
}

fn merge_optional_discriminator(
    existing: Option<&Discriminator>,
    incoming: Option<&Discriminator>,
    source: Source,
) -> Option<Discriminator> {
    match incoming {
        Some(incoming) => Some(merge_discriminators(existing, incoming, source)),
        None => existing.cloned(),
    }
}

fn merge_level(existing: &Attributes, incoming: &Attributes, source: Source) -> Attributes {
    let mut by_name: IndexMap<String, Attribute> = existing
        .iter()
        .map(|attr| (attr.schema_name.clone(), attr.clone()))
        .collect();
    for attr in incoming {
        let merged = merge_attribute(by_name.get(&attr.schema_name), attr, source);
        by_name.insert(attr.schema_name.clone(), merged);
    }
    by_name.sort_keys();
    by_name.into_values().collect()
}

fn merge_attribute(existing: Option<&Attribute>, incoming: &Attribute, source: Source) -> Attribute {
    let Some(existing) = existing else {
        let mut attr = incoming.clone();
        attr.kind = merge_kind(None, &incoming.kind, source);
        return attr;
    };

    let mut attr = existing.clone();
    attr.kind = merge_kind(Some(&existing.kind), &incoming.kind, source);
    if attr.description.is_none() {
        attr.description = incoming.description.clone();
    }
    if attr.deprecation_message.is_none() {
        attr.deprecation_message = incoming.deprecation_message.clone();
    }
    attr.sensitive |= incoming.sensitive;

    // A path parameter that is also sent in the creation body.
    if source == Source::CreateRequest
        && existing.req_body_usage == RequestBodyUsage::OmitAlways
        && existing.mutability != Mutability::Computed
    {
        attr.req_body_usage = RequestBodyUsage::PostOnly;
    }
    if !existing.kind.has_default() && attr.kind.has_default() && attr.mutability == Mutability::Optional {
        attr.mutability = Mutability::ComputedOptional;
    }
    attr
}

fn merge_kind(existing: Option<&AttributeKind>, incoming: &AttributeKind, source: Source) -> AttributeKind {
    let Some(existing) = existing else {
        let mut kind = incoming.clone();
        if let Some(nested) = kind.nested_object_mut() {
            *nested = merge_nested(None, &*nested, source);
        }
        return kind;
    };

    if discriminant(existing) != discriminant(incoming) {
        tracing::debug!(
            existing = existing.label(),
            incoming = incoming.label(),
            "conflicting attribute kinds, keeping the first"
        );
        return existing.clone();
    }

    let mut kind = existing.clone();
    match (&mut kind, incoming) {
        (AttributeKind::String { default }, AttributeKind::String { default: other }) => {
            if default.is_none() {
                default.clone_from(other);
            }
        }
        (AttributeKind::Int64 { default }, AttributeKind::Int64 { default: other }) => {
            *default = default.or(*other);
        }
        (AttributeKind::Float64 { default }, AttributeKind::Float64 { default: other }) => {
            *default = default.or(*other);
        }
        (AttributeKind::Bool { default }, AttributeKind::Bool { default: other }) => {
            *default = default.or(*other);
        }
        (kind, incoming) => {
            if let (Some(nested), Some(other)) = (kind.nested_object_mut(), incoming.nested_object()) {
                *nested = merge_nested(Some(&*nested), other, source);
            }
        }
    }
    kind
}

fn merge_nested(
    existing: Option<&NestedAttributeObject>,
    incoming: &NestedAttributeObject,
    source: Source,
) -> NestedAttributeObject {
    let empty = Attributes::new();
    let existing_attrs = existing.map_or(&empty, |e| &e.attributes);
    NestedAttributeObject {
        attributes: merge_level(existing_attrs, &incoming.attributes, source),
        discriminator: merge_optional_discriminator(
            existing.and_then(|e| e.discriminator.as_ref()),
            incoming.discriminator.as_ref(),
            source,
        ),
    }
}

/// Forces every attribute below a `Computed` ancestor to `Computed`.
fn propagate_computed(attrs: Attributes, computed_ancestor: bool) -> Attributes {
    attrs
        .into_iter()
        .map(|mut attr| {
            if computed_ancestor {
                attr.mutability = Mutability::Computed;
            }
            let computed = attr.mutability == Mutability::Computed;
            if let Some(nested) = attr.kind.nested_object_mut() {
                let children = std::mem::take(&mut nested.attributes);
                nested.attributes = propagate_computed(children, computed);
            }
            attr
        })
        .collect()
}
