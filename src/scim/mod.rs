//! SCIM PATCH path resolution
//!
//! Turns the raw `(op, path, value)` triples of a SCIM PATCH request into
//! normalized operations that name where the targeted attribute lives in the
//! resource's storage schema.
//!
//! ## RFC References
//!
//! - RFC 7643: SCIM Core Schema
//! - RFC 7644: SCIM Protocol (Section 3.5.2, Modifying with PATCH)
//!
//! ## Module Structure
//!
//! - [`path`]: attribute path grammar and value filters
//! - [`schema`]: schema trees and the depth-first resolver
//! - [`patch`]: PATCH operation parser and request envelope
//! - [`error`]: SCIM error responses per RFC 7644
//! - [`types`]: protocol constants and resource kinds

pub mod error;
pub mod patch;
pub mod path;
pub mod schema;
pub mod types;

pub use error::{ScimErrorResponse, ScimErrorType};
pub use patch::{
    PatchError, PatchOp, PatchOpKind, PatchOperation, PatchOperationParser, PatchRequest,
    PatchValue,
};
pub use path::{FilterOperator, PathFilter, PathScim, parse_filter, parse_path_scim};
pub use schema::{
    AttributeTree, Match, PathSegment, SchemaTree, StoragePath, dig, find_value_for, locate,
    locate_by,
};
pub use types::{ResourceType, SCHEMA_ERROR, SCHEMA_PATCH_OP};
