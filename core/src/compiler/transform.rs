//! # Configuration Transformer
//!
//! Applies the schema options of a resource to its merged tree, in order:
//!
//! 1. ignores
//! 2. aliases (also rewritten into operation path templates)
//! 3. overrides
//! 4. create-only derivation
//! 5. timeouts synthesis
//! 6. delete-on-create-timeout synthesis
//!
//! Every step walks the tree carrying the accumulated path as a list of
//! schema names, so a key only ever matches the exact level it names.
//! Levels stay sorted by schema name; synthetic attributes are appended last.

use crate::config::{ScopedOptions, SchemaOptions, TypeOverride};
use crate::model::{
    ApiOperations, Attribute, AttributeKind, Attributes, Discriminator, Mutability, Operation,
    RequestBodyUsage, Resource,
};
use crate::naming;

/// Schema name of the synthetic timeouts attribute.
pub const TIMEOUTS_ATTRIBUTE: &str = "timeouts";

/// Schema name of the synthetic cleanup flag.
pub const DELETE_ON_CREATE_TIMEOUT_ATTRIBUTE: &str = "delete_on_create_timeout";

const DELETE_ON_CREATE_TIMEOUT_DESCRIPTION: &str = "Flag that indicates whether to delete the resource if creation times out. Default is true.";

/// Applies every configured transformation to a compiled resource.
pub fn apply_schema_options(resource: Resource, options: &SchemaOptions) -> Resource {
    let scoped = ScopedOptions::new(options);
    let Resource {
        name,
        mut schema,
        mut operations,
    } = resource;

    let (attrs, disc) = ignore_attributes(schema.attributes, schema.discriminator, &scoped);
    let (attrs, disc) = alias_attributes(attrs, disc, &scoped);
    let attrs = override_attributes(attrs, &scoped);
    let mut attrs = mark_create_only(attrs);

    rewrite_path_aliases(&mut operations, &scoped);
    if let Some(timeouts) = timeouts_attribute(&operations, options) {
        push_synthetic(&mut attrs, timeouts);
    }
    if let Some(flag) = delete_on_create_timeout_attribute(&operations) {
        push_synthetic(&mut attrs, flag);
    }

    schema.attributes = attrs;
    schema.discriminator = disc;
    Resource {
        name,
        schema,
        operations,
    }
}

/// Drops ignored attributes, and their names from the discriminator of their level.
pub fn ignore_attributes(
    attrs: Attributes,
    disc: Option<Discriminator>,
    scoped: &ScopedOptions,
) -> (Attributes, Option<Discriminator>) {
    rewrite_level(attrs, disc, &mut Vec::new(), &mut |attr, path| {
        if scoped.is_ignored(path) {
            tracing::debug!(attribute = %path.join("."), "ignored");
            None
        } else {
            Some(attr)
        }
    })
}

/// Renames aliased attributes, keeping their wire names.
///
/// Keys are matched against the path of already-renamed ancestors plus the
/// attribute's own original name; a bare key only matches at the root.
pub fn alias_attributes(
    attrs: Attributes,
    disc: Option<Discriminator>,
    scoped: &ScopedOptions,
) -> (Attributes, Option<Discriminator>) {
    rewrite_level(attrs, disc, &mut Vec::new(), &mut |mut attr, path| {
        if let Some(alias) = scoped.alias(path) {
            attr.rename(alias);
        }
        Some(attr)
    })
}

/// Applies description, computability, sensitivity and container overrides.
pub fn override_attributes(attrs: Attributes, scoped: &ScopedOptions) -> Attributes {
    let (attrs, _) = rewrite_level(attrs, None, &mut Vec::new(), &mut |mut attr, path| {
        let Some(over) = scoped.override_for(path) else {
            return Some(attr);
        };
        if let Some(description) = &over.description {
            attr.description = Some(description.clone());
        }
        if let Some(computability) = over.computability {
            attr.mutability = computability.mutability();
        }
        if let Some(sensitive) = over.sensitive {
            attr.sensitive = sensitive;
        }
        if let Some(target) = over.type_override {
            attr.kind = swap_container(attr.kind, target, &path.join("."));
        }
        Some(attr)
    });
    attrs
}

/// Marks settable attributes that are never resent on update as create-only.
pub fn mark_create_only(attrs: Attributes) -> Attributes {
    let (attrs, _) = rewrite_level(attrs, None, &mut Vec::new(), &mut |mut attr, _| {
        if !attr.mutability.is_computed()
            && matches!(
                attr.req_body_usage,
                RequestBodyUsage::OmitAlways | RequestBodyUsage::PostOnly
            )
        {
            attr.create_only = true;
        }
        Some(attr)
    });
    attrs
}

/// Rewrites `{originalName}` path placeholders of root-level aliases.
pub fn rewrite_path_aliases(operations: &mut ApiOperations, scoped: &ScopedOptions) {
    for (original, alias) in scoped.root_aliases() {
        let from = format!("{{{}}}", naming::path_param_name(original));
        let to = format!("{{{}}}", naming::path_param_name(alias));
        for op in operations.iter_mut() {
            op.path = op.path.replace(&from, &to);
        }
    }
}

/// The synthetic timeouts block, when any operation has a configurable timeout.
pub fn timeouts_attribute(operations: &ApiOperations, options: &SchemaOptions) -> Option<Attribute> {
    let configurable: Vec<Operation> = [
        Operation::Create,
        Operation::Read,
        Operation::Update,
        Operation::Delete,
    ]
    .into_iter()
    .filter(|op| {
        let waits = operations.get(*op).is_some_and(|binding| binding.wait.is_some());
        waits || options.timeouts.contains(op)
    })
    .collect();
    if configurable.is_empty() {
        return None;
    }

    let mut attr = Attribute::new(
        TIMEOUTS_ATTRIBUTE,
        AttributeKind::Timeouts {
            configurable_timeouts: configurable,
        },
        Mutability::Optional,
    );
    attr.req_body_usage = RequestBodyUsage::OmitAlways;
    Some(attr)
}

/// The cleanup flag, when creation waits and the resource can be deleted.
pub fn delete_on_create_timeout_attribute(operations: &ApiOperations) -> Option<Attribute> {
    if operations.create.wait.is_none() || operations.delete.is_none() {
        return None;
    }
    let mut attr = Attribute::new(
        DELETE_ON_CREATE_TIMEOUT_ATTRIBUTE,
        AttributeKind::Bool {
            default: Some(true),
        },
        Mutability::ComputedOptional,
    );
    attr.req_body_usage = RequestBodyUsage::OmitAlways;
    attr.create_only = true;
    attr.description = Some(DELETE_ON_CREATE_TIMEOUT_DESCRIPTION.to_string());
    Some(attr)
}

fn push_synthetic(attrs: &mut Attributes, attr: Attribute) {
    let name = attr.schema_name.clone();
    if !attrs.push_new(attr) {
        tracing::warn!(attribute = %name, "schema already defines a synthetic attribute name, keeping the schema's");
    }
}

fn swap_container(kind: AttributeKind, target: TypeOverride, path: &str) -> AttributeKind {
    match (kind, target) {
        (AttributeKind::List { element_type }, TypeOverride::Set) => AttributeKind::Set { element_type },
        (AttributeKind::Set { element_type }, TypeOverride::List) => AttributeKind::List { element_type },
        (AttributeKind::ListNested { nested_object }, TypeOverride::Set) => {
            AttributeKind::SetNested { nested_object }
        }
        (AttributeKind::SetNested { nested_object }, TypeOverride::List) => {
            AttributeKind::ListNested { nested_object }
        }
        (kind @ (AttributeKind::List { .. } | AttributeKind::ListNested { .. }), TypeOverride::List)
        | (kind @ (AttributeKind::Set { .. } | AttributeKind::SetNested { .. }), TypeOverride::Set) => kind,
        (kind, target) => {
            tracing::warn!(
                attribute = path,
                kind = kind.label(),
                target = %target,
                "unsupported type override"
            );
            kind
        }
    }
}

/// Rebuilds one tree level.
///
/// `visit` sees each attribute with its path (ancestors' current names plus
/// its own name) and returns `None` to drop it. Renames and drops are
/// mirrored into the level's discriminator. Children are visited after their
/// parent, under the parent's new name. The rebuilt level is sorted by name.
fn rewrite_level<F>(
    attrs: Attributes,
    mut disc: Option<Discriminator>,
    path: &mut Vec<String>,
    visit: &mut F,
) -> (Attributes, Option<Discriminator>)
where
    F: FnMut(Attribute, &[String]) -> Option<Attribute>,
{
    let mut out = Attributes::new();
    for attr in attrs {
        let original = attr.schema_name.clone();
        path.push(original.clone());
        let visited = visit(attr, path.as_slice());
        path.pop();

        let Some(mut attr) = visited else {
            if let Some(d) = disc.as_mut() {
                d.remove_attribute(&original);
            }
            continue;
        };
        if attr.schema_name != original {
            if let Some(d) = disc.as_mut() {
                d.rename_attribute(&original, &attr.schema_name);
            }
        }

        path.push(attr.schema_name.clone());
        if let Some(nested) = attr.kind.nested_object_mut() {
            let children = std::mem::take(&mut nested.attributes);
            let (children, nested_disc) =
                rewrite_level(children, nested.discriminator.take(), path, visit);
            nested.attributes = children;
            nested.discriminator = nested_disc;
        }
        path.pop();

        let name = attr.schema_name.clone();
        if !out.push_new(attr) {
            tracing::warn!(attribute = %name, "duplicate attribute name after rename, dropping");
        }
    }
    out.sort_by_name();
    (out, disc)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GenConfig;
    use crate::model::{
        ApiOperation, DiscriminatorAttrName, DiscriminatorType, ElemType, NestedAttributeObject,
        Schema, Wait,
    };
    use std::collections::BTreeMap;

    fn string(name: &str) -> Attribute {
        Attribute::new(name, AttributeKind::String { default: None }, Mutability::Optional)
    }

    fn single(name: &str, children: Vec<Attribute>) -> Attribute {
        Attribute::new(
            name,
            AttributeKind::SingleNested {
                nested_object: NestedAttributeObject::new(children.into_iter().collect()),
            },
            Mutability::Optional,
        )
    }

    fn options(yaml: &str) -> SchemaOptions {
        serde_yaml::from_str(yaml).unwrap()
    }

    fn child<'a>(attrs: &'a Attributes, parent: &str, name: &str) -> Option<&'a Attribute> {
        attrs.get(parent).and_then(|p| p.children()).and_then(|c| c.get(name))
    }

    fn tree() -> Attributes {
        vec![
            string("child"),
            single("parent", vec![string("child"), string("keep")]),
            single("other", vec![string("child")]),
        ]
        .into_iter()
        .collect()
    }

    #[test]
    fn test_dotted_alias_is_scoped() {
        let scoped = ScopedOptions::new(&options("aliases:\n  parent.child: renamed\n"));
        let (attrs, _) = alias_attributes(tree(), None, &scoped);
        assert!(child(&attrs, "parent", "renamed").is_some());
        assert!(child(&attrs, "parent", "child").is_none());
        assert!(child(&attrs, "other", "child").is_some());
        assert!(attrs.get("child").is_some());
    }

    #[test]
    fn test_bare_alias_only_renames_root() {
        let scoped = ScopedOptions::new(&options("aliases:\n  child: renamed\n"));
        let (attrs, _) = alias_attributes(tree(), None, &scoped);
        let renamed = attrs.get("renamed").unwrap();
        assert_eq!(renamed.api_name, "child");
        assert_eq!(renamed.model_name, "Renamed");
        assert!(child(&attrs, "parent", "child").is_some());
        assert!(child(&attrs, "other", "child").is_some());
    }

    #[test]
    fn test_nested_alias_under_renamed_parent() {
        let scoped = ScopedOptions::new(&options(
            "aliases:\n  parent: settings\n  settings.keep: kept\n",
        ));
        let (attrs, _) = alias_attributes(tree(), None, &scoped);
        let kept = child(&attrs, "settings", "kept").unwrap();
        assert_eq!(kept.api_name, "keep");
        assert_eq!(attrs.get("settings").unwrap().api_name, "parent");
    }

    #[test]
    fn test_ignore_wins_over_alias_and_override() {
        let opts = options(
            r#"
ignores: [parent.child, other]
aliases:
  parent.child: renamed
overrides:
  parent.child:
    description: never applied
"#,
        );
        let resource = Resource {
            name: "thing".into(),
            schema: Schema {
                attributes: tree(),
                ..Schema::default()
            },
            operations: operations(None, false),
        };
        let out = apply_schema_options(resource, &opts);
        let attrs = &out.schema.attributes;
        assert!(attrs.get("other").is_none());
        assert!(child(attrs, "parent", "child").is_none());
        assert!(child(attrs, "parent", "renamed").is_none());
        assert!(child(attrs, "parent", "keep").is_some());
    }

    #[test]
    fn test_alias_and_ignore_follow_discriminator() {
        let name = |n: &str| DiscriminatorAttrName::from_api_name(n);
        let mut mapping = BTreeMap::new();
        mapping.insert(
            "A".to_string(),
            DiscriminatorType {
                allowed: vec![name("child"), name("keep")],
                required: vec![name("child")],
            },
        );
        let disc = Discriminator {
            property_name: name("kind"),
            mapping,
        };
        let attrs: Attributes = vec![string("kind"), string("child"), string("keep")]
            .into_iter()
            .collect();

        let scoped = ScopedOptions::new(&options(
            "ignores: [keep]\naliases:\n  child: renamed\n  kind: variant\n",
        ));
        let (attrs, disc) = ignore_attributes(attrs, Some(disc), &scoped);
        let (attrs, disc) = alias_attributes(attrs, disc, &scoped);
        let disc = disc.unwrap();

        assert_eq!(attrs.names(), vec!["renamed", "variant"]);
        assert_eq!(disc.property_name.schema_name, "variant");
        let variant = &disc.mapping["A"];
        assert_eq!(variant.allowed.len(), 1);
        assert_eq!(variant.allowed[0].schema_name, "renamed");
        assert_eq!(variant.allowed[0].api_name, "child");
        assert_eq!(variant.required[0].schema_name, "renamed");
    }

    #[test]
    fn test_overrides() {
        let list_nested = Attribute::new(
            "items",
            AttributeKind::ListNested {
                nested_object: NestedAttributeObject::new(vec![string("x")].into_iter().collect()),
            },
            Mutability::Optional,
        );
        let labels = Attribute::new(
            "labels",
            AttributeKind::List {
                element_type: ElemType::String,
            },
            Mutability::Optional,
        );
        let attrs: Attributes = vec![list_nested, labels, string("name")].into_iter().collect();
        let scoped = ScopedOptions::new(&options(
            r#"
overrides:
  items: { type: set }
  labels: { type: set }
  name:
    description: The name
    computability: { computed: true, optional: true }
    sensitive: true
"#,
        ));
        let attrs = override_attributes(attrs, &scoped);

        let items = attrs.get("items").unwrap();
        let AttributeKind::SetNested { nested_object } = &items.kind else {
            panic!("expected set_nested, got {}", items.kind.label());
        };
        assert_eq!(nested_object.attributes.names(), vec!["x"]);
        assert_eq!(
            attrs.get("labels").unwrap().kind,
            AttributeKind::Set {
                element_type: ElemType::String
            }
        );
        let name = attrs.get("name").unwrap();
        assert_eq!(name.description.as_deref(), Some("The name"));
        assert_eq!(name.mutability, Mutability::ComputedOptional);
        assert!(name.sensitive);
    }

    #[test]
    fn test_type_override_round_trips() {
        let nested = NestedAttributeObject::new(
            vec![string("x"), single("deep", vec![string("y")])]
                .into_iter()
                .collect(),
        );
        let original: Attributes = vec![
            Attribute::new(
                "items",
                AttributeKind::ListNested {
                    nested_object: nested.clone(),
                },
                Mutability::Optional,
            ),
            Attribute::new(
                "labels",
                AttributeKind::List {
                    element_type: ElemType::Int64,
                },
                Mutability::Required,
            ),
        ]
        .into_iter()
        .collect();

        let to_set = ScopedOptions::new(&options(
            "overrides:\n  items: { type: set }\n  labels: { type: set }\n",
        ));
        let sets = override_attributes(original.clone(), &to_set);
        assert_eq!(
            sets.get("items").unwrap().kind,
            AttributeKind::SetNested {
                nested_object: nested.clone()
            }
        );
        assert_eq!(
            sets.get("labels").unwrap().kind,
            AttributeKind::Set {
                element_type: ElemType::Int64
            }
        );

        let to_list = ScopedOptions::new(&options(
            "overrides:\n  items: { type: list }\n  labels: { type: list }\n",
        ));
        let lists = override_attributes(sets, &to_list);
        assert_eq!(
            lists.get("items").unwrap().kind,
            AttributeKind::ListNested {
                nested_object: nested
            }
        );
        assert_eq!(lists, original);
    }

    #[test]
    fn test_type_override_on_scalar_is_ignored() {
        let scoped = ScopedOptions::new(&options("overrides:\n  name: { type: set }\n"));
        let attrs = override_attributes(vec![string("name")].into_iter().collect(), &scoped);
        assert_eq!(attrs.get("name").unwrap().kind.label(), "string");
    }

    #[test]
    fn test_create_only_derivation() {
        let mut path_param = Attribute::new("group_id", AttributeKind::String { default: None }, Mutability::Required);
        path_param.req_body_usage = RequestBodyUsage::OmitAlways;
        let mut post_only = string("region");
        post_only.req_body_usage = RequestBodyUsage::PostOnly;
        let mut computed = Attribute::new("id", AttributeKind::String { default: None }, Mutability::Computed);
        computed.req_body_usage = RequestBodyUsage::OmitAlways;
        let mut nested_param = string("inner");
        nested_param.req_body_usage = RequestBodyUsage::OmitAlways;
        let mut defaulted = Attribute::new(
            "limit",
            AttributeKind::Int64 { default: Some(5) },
            Mutability::ComputedOptional,
        );
        defaulted.req_body_usage = RequestBodyUsage::OmitAlways;

        let attrs: Attributes = vec![
            path_param,
            post_only,
            computed,
            defaulted,
            string("name"),
            single("parent", vec![nested_param]),
        ]
        .into_iter()
        .collect();
        let attrs = mark_create_only(attrs);
        assert!(attrs.get("group_id").unwrap().create_only);
        assert!(attrs.get("region").unwrap().create_only);
        assert!(!attrs.get("id").unwrap().create_only);
        assert!(!attrs.get("limit").unwrap().create_only);
        assert!(!attrs.get("name").unwrap().create_only);
        assert!(child(&attrs, "parent", "inner").unwrap().create_only);
    }

    fn wait() -> Wait {
        Wait {
            state_property: "state".into(),
            pending_states: vec!["CREATING".into()],
            target_states: vec!["IDLE".into()],
            timeout_seconds: 300,
            min_timeout_seconds: 60,
            delay_seconds: 10,
        }
    }

    fn operations(delete_wait: Option<Wait>, create_wait: bool) -> ApiOperations {
        let op = |path: &str, method: &str, wait: Option<Wait>| ApiOperation {
            path: path.into(),
            http_method: method.into(),
            wait,
        };
        ApiOperations {
            create: op("/groups/{groupId}/things", "POST", create_wait.then(wait)),
            read: op("/groups/{groupId}/things/{name}", "GET", None),
            update: Some(op("/groups/{groupId}/things/{name}", "PATCH", None)),
            delete: Some(op("/groups/{groupId}/things/{name}", "DELETE", delete_wait)),
            list: None,
            version_header: None,
        }
    }

    #[test]
    fn test_timeouts_synthesis() {
        let ops = operations(Some(wait()), true);
        let timeouts = timeouts_attribute(&ops, &SchemaOptions::default()).unwrap();
        assert_eq!(timeouts.schema_name, "timeouts");
        assert_eq!(
            timeouts.kind,
            AttributeKind::Timeouts {
                configurable_timeouts: vec![Operation::Create, Operation::Delete]
            }
        );

        let flag = delete_on_create_timeout_attribute(&ops).unwrap();
        assert_eq!(flag.kind, AttributeKind::Bool { default: Some(true) });
        assert_eq!(flag.req_body_usage, RequestBodyUsage::OmitAlways);
        assert!(flag.create_only);
    }

    #[test]
    fn test_configured_timeouts_without_wait() {
        let ops = operations(None, false);
        assert!(timeouts_attribute(&ops, &SchemaOptions::default()).is_none());
        assert!(delete_on_create_timeout_attribute(&ops).is_none());

        let opts = options("timeouts: [update, read]\n");
        let timeouts = timeouts_attribute(&ops, &opts).unwrap();
        assert_eq!(
            timeouts.kind,
            AttributeKind::Timeouts {
                configurable_timeouts: vec![Operation::Read, Operation::Update]
            }
        );
    }

    #[test]
    fn test_delete_flag_requires_delete_operation() {
        let mut ops = operations(None, true);
        ops.delete = None;
        assert!(delete_on_create_timeout_attribute(&ops).is_none());
    }

    #[test]
    fn test_root_alias_rewrites_paths() {
        let config = GenConfig::from_yaml(
            r#"
resources:
  thing:
    create: { path: "/groups/{groupId}/things", method: POST }
    read: { path: "/groups/{groupId}/things/{name}", method: GET }
    schema:
      aliases:
        groupId: projectId
        nested.groupId: ignoredForPaths
"#,
        )
        .unwrap();
        let cfg = &config.resources["thing"];
        let scoped = ScopedOptions::new(&cfg.schema_options);
        let mut ops = operations(None, false);
        rewrite_path_aliases(&mut ops, &scoped);
        assert_eq!(ops.create.path, "/groups/{projectId}/things");
        assert_eq!(ops.read.path, "/groups/{projectId}/things/{name}");
        assert_eq!(ops.delete.unwrap().path, "/groups/{projectId}/things/{name}");
    }

    #[test]
    fn test_api_names_survive_every_transform() {
        let opts = options(
            r#"
aliases:
  child: a
  parent.keep: b
overrides:
  a: { description: x }
  parent.b: { sensitive: true }
"#,
        );
        let mut before: Vec<String> = tree().iter().map(|a| a.api_name.clone()).collect();
        before.sort();
        let resource = Resource {
            name: "thing".into(),
            schema: Schema {
                attributes: tree(),
                ..Schema::default()
            },
            operations: operations(None, false),
        };
        let out = apply_schema_options(resource, &opts);
        let mut after: Vec<String> = out.schema.attributes.iter().map(|a| a.api_name.clone()).collect();
        after.sort();
        assert_eq!(before, after);
        let b = child(&out.schema.attributes, "parent", "b").unwrap();
        assert_eq!(b.api_name, "keep");
        assert!(b.sensitive);
        assert_eq!(out.schema.attributes.get("a").unwrap().description.as_deref(), Some("x"));
    }
}
