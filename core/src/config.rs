//! # Generator Configuration
//!
//! Hand-authored YAML describing, per resource, which API operations back
//! its lifecycle and how the compiled schema should be adjusted.
//!
//! Dotted attribute paths in `ignores`, `aliases` and `overrides` are split
//! into segments when loaded. Each segment is canonicalized with the schema
//! naming rule, so `groupId` and `group_id` address the same attribute.

use crate::error::{AppError, AppResult};
use crate::model::{ApiOperation, Mutability, Operation};
use crate::naming;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::fmt;

/// Root of the configuration file.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct GenConfig {
    /// Resources keyed by name.
    #[serde(default)]
    pub resources: BTreeMap<String, ResourceConfig>,
}

impl GenConfig {
    /// Parses the YAML configuration.
    pub fn from_yaml(content: &str) -> AppResult<Self> {
        serde_yaml::from_str(content)
            .map_err(|e| AppError::Config(format!("failed to parse configuration: {}", e)))
    }

    /// Reads and parses a configuration file.
    pub fn from_path(path: &std::path::Path) -> AppResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }
}

/// Operation bindings and schema options of one resource.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceConfig {
    /// Creation operation.
    pub create: ApiOperation,
    /// Read operation.
    pub read: ApiOperation,
    /// Update operation.
    #[serde(default)]
    pub update: Option<ApiOperation>,
    /// Delete operation.
    #[serde(default)]
    pub delete: Option<ApiOperation>,
    /// List operation.
    #[serde(default)]
    pub list: Option<ApiOperation>,
    /// Explicit API version media type.
    #[serde(default)]
    pub version_header: Option<String>,
    /// Schema transformations.
    #[serde(default, rename = "schema")]
    pub schema_options: SchemaOptions,
}

/// Declarative transformations applied to a merged schema.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SchemaOptions {
    /// Attribute paths to drop.
    #[serde(default)]
    pub ignores: Vec<String>,
    /// Attribute path to new name.
    #[serde(default)]
    pub aliases: BTreeMap<String, String>,
    /// Attribute path to in-place adjustments.
    #[serde(default)]
    pub overrides: BTreeMap<String, Override>,
    /// Operations whose timeout is configurable regardless of wait blocks.
    #[serde(default)]
    pub timeouts: Vec<Operation>,
}

/// In-place adjustment of one attribute.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Override {
    /// Replacement description.
    #[serde(default)]
    pub description: Option<String>,
    /// Replacement mutability.
    #[serde(default)]
    pub computability: Option<Computability>,
    /// Collection container swap.
    #[serde(default, rename = "type")]
    pub type_override: Option<TypeOverride>,
    /// Replacement sensitivity.
    #[serde(default)]
    pub sensitive: Option<bool>,
}

/// Mutability as written in configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Computability {
    /// Caller may omit the value.
    #[serde(default)]
    pub optional: bool,
    /// Server may set the value.
    #[serde(default)]
    pub computed: bool,
}

impl Computability {
    /// The mutability these flags describe.
    pub fn mutability(self) -> Mutability {
        match (self.computed, self.optional) {
            (true, true) => Mutability::ComputedOptional,
            (true, false) => Mutability::Computed,
            (false, true) => Mutability::Optional,
            (false, false) => Mutability::Required,
        }
    }
}

/// Collection container requested by a type override.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TypeOverride {
    /// Ordered collection.
    List,
    /// Unordered unique collection.
    Set,
}

impl fmt::Display for TypeOverride {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeOverride::List => write!(f, "list"),
            TypeOverride::Set => write!(f, "set"),
        }
    }
}

/// A canonicalized attribute path, one schema name per segment.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AttrPath(Vec<String>);

impl AttrPath {
    /// Parses a dotted configuration key.
    pub fn parse(dotted: &str) -> AttrPath {
        AttrPath(dotted.split('.').map(naming::schema_name).collect())
    }

    /// Builds a path from schema-name segments.
    pub fn from_segments(segments: &[String]) -> AttrPath {
        AttrPath(segments.to_vec())
    }

    /// Number of segments.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// True for the empty path.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// `SchemaOptions` indexed by canonical attribute path.
#[derive(Debug, Clone, Default)]
pub struct ScopedOptions {
    ignores: HashSet<AttrPath>,
    aliases: HashMap<AttrPath, String>,
    overrides: HashMap<AttrPath, Override>,
}

impl ScopedOptions {
    /// Indexes the raw options.
    pub fn new(options: &SchemaOptions) -> Self {
        Self {
            ignores: options.ignores.iter().map(|k| AttrPath::parse(k)).collect(),
            aliases: options
                .aliases
                .iter()
                .map(|(k, v)| (AttrPath::parse(k), v.clone()))
                .collect(),
            overrides: options
                .overrides
                .iter()
                .map(|(k, v)| (AttrPath::parse(k), v.clone()))
                .collect(),
        }
    }

    /// Whether the attribute at `path` is ignored.
    pub fn is_ignored(&self, path: &[String]) -> bool {
        self.ignores.contains(&AttrPath::from_segments(path))
    }

    /// Alias configured for exactly `path`.
    pub fn alias(&self, path: &[String]) -> Option<&str> {
        self.aliases
            .get(&AttrPath::from_segments(path))
            .map(String::as_str)
    }

    /// Override configured for exactly `path`.
    pub fn override_for(&self, path: &[String]) -> Option<&Override> {
        self.overrides.get(&AttrPath::from_segments(path))
    }

    /// Root-level aliases as `(original schema name, alias)` pairs.
    pub fn root_aliases(&self) -> impl Iterator<Item = (&str, &str)> {
        self.aliases
            .iter()
            .filter(|(k, _)| k.len() == 1)
            .map(|(k, v)| (k.0[0].as_str(), v.as_str()))
    }
}
