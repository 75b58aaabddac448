//! # Discriminator Model
//!
//! A selector property plus, per variant tag, the attributes the variant
//! allows and requires. The selector property itself never appears inside a
//! variant's sets.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Attribute name carried by a discriminator: wire name plus schema name.
///
/// Ordered by schema name first so variant sets sort the same way as the
/// attributes they reference.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct DiscriminatorAttrName {
    /// Snake-case schema name.
    pub schema_name: String,
    /// Original wire name.
    pub api_name: String,
}

impl DiscriminatorAttrName {
    /// Builds the name pair from a wire name.
    pub fn from_api_name(api_name: &str) -> Self {
        Self {
            schema_name: crate::naming::schema_name(api_name),
            api_name: api_name.to_string(),
        }
    }
}

/// Allowed and required attributes of one variant. Both lists are kept sorted.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DiscriminatorType {
    /// Attributes the variant may carry.
    #[serde(default)]
    pub allowed: Vec<DiscriminatorAttrName>,
    /// Attributes the caller must provide for the variant.
    #[serde(default)]
    pub required: Vec<DiscriminatorAttrName>,
}

impl DiscriminatorType {
    /// Sorts and deduplicates both lists.
    pub fn normalize(&mut self) {
        self.allowed.sort();
        self.allowed.dedup();
        self.required.sort();
        self.required.dedup();
    }
}

/// Polymorphic variant metadata of one schema level.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Discriminator {
    /// The selector property.
    pub property_name: DiscriminatorAttrName,
    /// Variant tag to variant attributes.
    pub mapping: BTreeMap<String, DiscriminatorType>,
}

impl Discriminator {
    /// Renames every reference to `old_schema_name` (selector and variant lists).
    pub fn rename_attribute(&mut self, old_schema_name: &str, new_schema_name: &str) {
        if self.property_name.schema_name == old_schema_name {
            self.property_name.schema_name = new_schema_name.to_string();
        }
        for variant in self.mapping.values_mut() {
            for name in variant.allowed.iter_mut().chain(variant.required.iter_mut()) {
                if name.schema_name == old_schema_name {
                    name.schema_name = new_schema_name.to_string();
                }
            }
            variant.normalize();
        }
    }

    /// Drops `schema_name` from every variant list.
    pub fn remove_attribute(&mut self, schema_name: &str) {
        for variant in self.mapping.values_mut() {
            variant.allowed.retain(|n| n.schema_name != schema_name);
            variant.required.retain(|n| n.schema_name != schema_name);
        }
    }

    /// Clears every variant's required list.
    pub fn clear_required(&mut self) {
        for variant in self.mapping.values_mut() {
            variant.required.clear();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(list: &[DiscriminatorAttrName]) -> Vec<&str> {
        list.iter().map(|n| n.schema_name.as_str()).collect()
    }

    fn sample() -> Discriminator {
        let mut mapping = BTreeMap::new();
        mapping.insert(
            "Cluster".to_string(),
            DiscriminatorType {
                allowed: vec![
                    DiscriminatorAttrName::from_api_name("clusterName"),
                    DiscriminatorAttrName::from_api_name("dbRole"),
                ],
                required: vec![DiscriminatorAttrName::from_api_name("clusterName")],
            },
        );
        Discriminator {
            property_name: DiscriminatorAttrName::from_api_name("type"),
            mapping,
        }
    }

    #[test]
    fn test_rename_attribute_updates_variants_and_resorts() {
        let mut disc = sample();
        disc.rename_attribute("cluster_name", "z_cluster");
        let cluster = &disc.mapping["Cluster"];
        assert_eq!(names(&cluster.allowed), vec!["db_role", "z_cluster"]);
        assert_eq!(names(&cluster.required), vec!["z_cluster"]);
        assert_eq!(cluster.allowed[1].api_name, "clusterName");
    }

    #[test]
    fn test_rename_selector() {
        let mut disc = sample();
        disc.rename_attribute("type", "kind");
        assert_eq!(disc.property_name.schema_name, "kind");
        assert_eq!(disc.property_name.api_name, "type");
    }

    #[test]
    fn test_remove_and_clear() {
        let mut disc = sample();
        disc.remove_attribute("db_role");
        assert_eq!(names(&disc.mapping["Cluster"].allowed), vec!["cluster_name"]);
        disc.clear_required();
        assert!(disc.mapping["Cluster"].required.is_empty());
    }
}
