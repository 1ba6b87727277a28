use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::ConfigError;
use crate::scim::{PatchOperationParser, ResourceType, SchemaTree};

/// Mutable-attribute schemas per resource type.
///
/// Each table maps SCIM attribute names to the storage attribute that backs
/// them. Nested tables model complex attributes, arrays of tables model
/// multi-valued ones. Key order is significant: the resolver reports the first
/// match in document order.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SchemaConfig {
    #[serde(default)]
    pub user: SchemaTree,

    #[serde(default)]
    pub group: SchemaTree,
}

impl SchemaConfig {
    pub fn for_resource(&self, resource: ResourceType) -> &SchemaTree {
        match resource {
            ResourceType::User => &self.user,
            ResourceType::Group => &self.group,
        }
    }

    /// Build a parser bound to one resource's schema.
    pub fn parser(&self, resource: ResourceType) -> PatchOperationParser {
        PatchOperationParser::new(Arc::new(self.for_resource(resource).clone()))
    }

    pub(super) fn validate(&self) -> Result<(), ConfigError> {
        for resource in [ResourceType::User, ResourceType::Group] {
            if !self.for_resource(resource).is_mapping() {
                return Err(ConfigError::Validation(format!(
                    "schema.{} must be a table of attribute names",
                    resource.to_string().to_lowercase()
                )));
            }
        }
        Ok(())
    }
}
