//! # Resource Model
//!
//! The compiler's output: a serializable tree of
//! `Model -> Resource -> Schema -> Attributes (+ Discriminator)`.
//!
//! This model is the only contract with downstream renderers. It carries no
//! target-language syntax and round-trips through YAML or JSON unchanged.

pub mod attribute;
pub mod discriminator;

pub use attribute::{
    Attribute, AttributeKind, Attributes, ElemType, Mutability, NestedAttributeObject,
    RequestBodyUsage,
};
pub use discriminator::{Discriminator, DiscriminatorAttrName, DiscriminatorType};

use crate::error::AppResult;
use serde::{Deserialize, Serialize};

/// Lifecycle operation of a resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operation {
    /// Creation.
    Create,
    /// Read.
    Read,
    /// Update.
    Update,
    /// Deletion.
    Delete,
}

/// Polling behavior after an operation returns, until the resource settles.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Wait {
    /// Response property holding the lifecycle state.
    pub state_property: String,
    /// States meaning "keep polling".
    #[serde(default)]
    pub pending_states: Vec<String>,
    /// States meaning "done".
    #[serde(default)]
    pub target_states: Vec<String>,
    /// Overall timeout.
    pub timeout_seconds: u64,
    /// Minimum interval between polls.
    #[serde(default)]
    pub min_timeout_seconds: u64,
    /// Delay before the first poll.
    #[serde(default)]
    pub delay_seconds: u64,
}

/// Binding of one lifecycle operation to an API path and method.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiOperation {
    /// OpenAPI path template (e.g. `/groups/{groupId}/things`).
    pub path: String,
    /// HTTP method.
    #[serde(alias = "method")]
    pub http_method: String,
    /// Polling behavior, when the operation is asynchronous.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wait: Option<Wait>,
}

/// All operation bindings of a resource.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiOperations {
    /// Creation.
    pub create: ApiOperation,
    /// Read.
    pub read: ApiOperation,
    /// Update.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub update: Option<ApiOperation>,
    /// Deletion.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delete: Option<ApiOperation>,
    /// Listing.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub list: Option<ApiOperation>,
    /// Media type carrying the API version.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version_header: Option<String>,
}

impl ApiOperations {
    /// The binding for `op`, when configured.
    pub fn get(&self, op: Operation) -> Option<&ApiOperation> {
        match op {
            Operation::Create => Some(&self.create),
            Operation::Read => Some(&self.read),
            Operation::Update => self.update.as_ref(),
            Operation::Delete => self.delete.as_ref(),
        }
    }

    /// Mutable access to every configured binding.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut ApiOperation> {
        [Some(&mut self.create), Some(&mut self.read)]
            .into_iter()
            .chain([
                self.update.as_mut(),
                self.delete.as_mut(),
                self.list.as_mut(),
            ])
            .flatten()
    }
}

/// The merged attribute tree of a resource.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Schema {
    /// Resource description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Present when the resource is deprecated.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deprecation_message: Option<String>,
    /// Root attributes.
    pub attributes: Attributes,
    /// Root-level polymorphic variant metadata.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub discriminator: Option<Discriminator>,
}

/// The unit of compilation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Resource {
    /// Configured resource name.
    pub name: String,
    /// Compiled schema.
    pub schema: Schema,
    /// Operation bindings.
    pub operations: ApiOperations,
}

/// Output of one compiler run.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Model {
    /// Compiled resources, sorted by name.
    pub resources: Vec<Resource>,
}

impl Model {
    /// Serializes the model as YAML.
    pub fn to_yaml(&self) -> AppResult<String> {
        Ok(serde_yaml::to_string(self)?)
    }

    /// Parses a model previously written with [`Model::to_yaml`].
    pub fn from_yaml(content: &str) -> AppResult<Self> {
        Ok(serde_yaml::from_str(content)?)
    }

    /// Serializes the model as pretty-printed JSON.
    pub fn to_json(&self) -> AppResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
