//! SCIM protocol constants and resource kinds.

use std::fmt;

use serde::{Deserialize, Serialize};

// =============================================================================
// Schema URIs
// =============================================================================

/// SCIM Error schema URI
pub const SCHEMA_ERROR: &str = "urn:ietf:params:scim:api:messages:2.0:Error";

/// SCIM PatchOp schema URI
pub const SCHEMA_PATCH_OP: &str = "urn:ietf:params:scim:api:messages:2.0:PatchOp";

// =============================================================================
// Resource kinds
// =============================================================================

/// The SCIM resource a PATCH request targets.
///
/// Each resource kind carries its own mutable-attribute schema, so a parser is
/// always bound to exactly one of these.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
#[serde(rename_all = "lowercase")]
pub enum ResourceType {
    #[default]
    User,
    Group,
}

impl fmt::Display for ResourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResourceType::User => write!(f, "User"),
            ResourceType::Group => write!(f, "Group"),
        }
    }
}
