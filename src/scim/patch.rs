//! SCIM 2.0 PATCH Operations
//!
//! Normalizes the single-value operations of a PATCH request per RFC 7644
//! Section 3.5.2 into [`PatchOperation`] records: the operation code, the
//! parsed SCIM path, the storage path it resolves to in the resource schema,
//! and the value.
//!
//! Complex values are expected to have been decomposed upstream, so a value is
//! a string, a list of strings, or absent.
//!
//! ## Example
//!
//! ```json
//! {
//!   "schemas": ["urn:ietf:params:scim:api:messages:2.0:PatchOp"],
//!   "Operations": [
//!     { "op": "replace", "path": "displayName", "value": "New Name" },
//!     { "op": "add", "path": "emails[type eq \"work\"].value", "value": "a@b.com" },
//!     { "op": "remove", "path": "name.givenName" }
//!   ]
//! }
//! ```

use std::{fmt, str::FromStr, sync::Arc};

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{
    path::{PathScim, parse_path_scim},
    schema::{AttributeTree, SchemaTree, StoragePath, dig},
    types::SCHEMA_PATCH_OP,
};

/// PATCH operation errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PatchError {
    /// Operation code, path or value shape the parser does not accept
    #[error("Unsupported PATCH request: {0}")]
    UnsupportedPatchRequest(String),

    /// Value filter that is not a single `attribute operator "value"` clause
    #[error("Malformed filter: {0}")]
    MalformedFilter(String),

    /// Request envelope lacks the PatchOp schema
    #[error("Request must include PatchOp schema")]
    InvalidSchema,

    #[error("Invalid operation at index {index}: {error}")]
    InvalidOperation {
        index: usize,
        error: Box<PatchError>,
    },
}

/// The three PATCH operation codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PatchOpKind {
    Add,
    Replace,
    Remove,
}

impl FromStr for PatchOpKind {
    type Err = PatchError;

    /// Operation codes are matched exactly, in lowercase.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "add" => Ok(PatchOpKind::Add),
            "replace" => Ok(PatchOpKind::Replace),
            "remove" => Ok(PatchOpKind::Remove),
            _ => Err(PatchError::UnsupportedPatchRequest(format!(
                "unknown operation '{s}'"
            ))),
        }
    }
}

impl fmt::Display for PatchOpKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PatchOpKind::Add => write!(f, "add"),
            PatchOpKind::Replace => write!(f, "replace"),
            PatchOpKind::Remove => write!(f, "remove"),
        }
    }
}

/// Value carried by a single-value operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PatchValue {
    Single(String),
    Multiple(Vec<String>),
}

impl PatchValue {
    /// Accept a JSON string or an array of strings. `null` counts as absent.
    pub fn from_json(value: &Value) -> Result<Option<Self>, PatchError> {
        match value {
            Value::Null => Ok(None),
            Value::String(s) => Ok(Some(PatchValue::Single(s.clone()))),
            Value::Array(items) => items
                .iter()
                .map(|item| {
                    item.as_str().map(str::to_string).ok_or_else(|| {
                        PatchError::UnsupportedPatchRequest(format!(
                            "multi-valued value must contain only strings, got {item}"
                        ))
                    })
                })
                .collect::<Result<Vec<_>, _>>()
                .map(|items| Some(PatchValue::Multiple(items))),
            Value::Object(_) => Err(PatchError::UnsupportedPatchRequest(
                "complex values must be decomposed into single-value operations".to_string(),
            )),
            other => Err(PatchError::UnsupportedPatchRequest(format!(
                "value must be a string or a list of strings, got {other}"
            ))),
        }
    }
}

/// A normalized PATCH operation. Immutable once built.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PatchOperation {
    op: PatchOpKind,
    path_scim: PathScim,
    path_sp: Option<StoragePath>,
    #[serde(skip_serializing_if = "Option::is_none")]
    storage_attribute: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    value: Option<PatchValue>,
}

impl PatchOperation {
    pub fn op(&self) -> PatchOpKind {
        self.op
    }

    pub fn path_scim(&self) -> &PathScim {
        &self.path_scim
    }

    /// Location of the targeted attribute inside the resource schema, `None`
    /// when the schema does not know the attribute.
    pub fn path_sp(&self) -> Option<&StoragePath> {
        self.path_sp.as_ref()
    }

    /// Name of the storage attribute at [`Self::path_sp`], when it ends at a leaf.
    pub fn storage_attribute(&self) -> Option<&str> {
        self.storage_attribute.as_deref()
    }

    pub fn value(&self) -> Option<&PatchValue> {
        self.value.as_ref()
    }
}

/// Parses raw `(op, path, value)` triples against one resource schema.
///
/// Holds the schema behind an `Arc`; clones are cheap and the parser has no
/// mutable state, so one instance serves concurrent requests.
#[derive(Debug, Clone)]
pub struct PatchOperationParser {
    schema: Arc<SchemaTree>,
}

impl PatchOperationParser {
    pub fn new(schema: Arc<SchemaTree>) -> Self {
        Self { schema }
    }

    /// Parse one operation.
    ///
    /// Fails with [`PatchError::UnsupportedPatchRequest`] for an unknown op
    /// code, a missing or blank path, a missing value on `add`/`replace`, or a
    /// value that is neither a string nor a list of strings. A malformed value
    /// filter fails with [`PatchError::MalformedFilter`]. An attribute the
    /// schema does not know is not an error: the operation is returned with no
    /// storage path.
    pub fn parse(
        &self,
        op: &str,
        path: Option<&str>,
        value: Option<&Value>,
    ) -> Result<PatchOperation, PatchError> {
        let op = op.parse::<PatchOpKind>().inspect_err(|_| {
            tracing::debug!(op, "Rejected PATCH operation with unknown op");
        })?;

        let Some(path) = path.filter(|p| !p.trim().is_empty()) else {
            return Err(PatchError::UnsupportedPatchRequest(format!(
                "'{op}' operation requires a path"
            )));
        };

        let value = match value {
            Some(v) => PatchValue::from_json(v)?,
            None => None,
        };
        if value.is_none() && op != PatchOpKind::Remove {
            return Err(PatchError::UnsupportedPatchRequest(format!(
                "'{op}' operation requires a value"
            )));
        }

        let path_scim = self.parse_path(path).inspect_err(|e| {
            tracing::debug!(path, error = %e, "Rejected PATCH path");
        })?;
        let path_sp = self.schema.resolve(&path_scim);
        let storage_attribute = path_sp
            .as_ref()
            .and_then(|sp| dig(self.schema.as_ref(), sp))
            .and_then(AttributeTree::leaf)
            .map(str::to_string);

        match &path_sp {
            Some(sp) => tracing::trace!(%op, path, path_sp = %sp, "Resolved PATCH path"),
            None => tracing::debug!(%op, path, "PATCH path does not resolve in schema"),
        }

        Ok(PatchOperation {
            op,
            path_scim,
            path_sp,
            storage_attribute,
            value,
        })
    }

    /// Parse a path against this parser's top-level attribute names.
    pub fn parse_path(&self, path: &str) -> Result<PathScim, PatchError> {
        parse_path_scim(path, self.schema.attribute_names())
    }
}

// =============================================================================
// Request envelope
// =============================================================================

/// One raw entry of the `Operations` array.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PatchOp {
    pub op: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,
}

impl PatchOp {
    pub fn new(op: impl Into<String>, path: impl Into<String>, value: Option<Value>) -> Self {
        Self {
            op: op.into(),
            path: Some(path.into()),
            value,
        }
    }
}

/// A SCIM PATCH request containing one or more operations.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PatchRequest {
    /// SCIM schema URIs (should contain PatchOp schema)
    pub schemas: Vec<String>,

    /// List of patch operations to apply
    #[serde(rename = "Operations")]
    pub operations: Vec<PatchOp>,
}

impl PatchRequest {
    /// Create a new patch request with operations
    pub fn new(operations: Vec<PatchOp>) -> Self {
        Self {
            schemas: vec![SCHEMA_PATCH_OP.to_string()],
            operations,
        }
    }

    pub fn validate(&self) -> Result<(), PatchError> {
        if !self.schemas.iter().any(|s| s == SCHEMA_PATCH_OP) {
            return Err(PatchError::InvalidSchema);
        }
        Ok(())
    }

    /// Validate the envelope and parse every operation, in order.
    ///
    /// Stops at the first failure; no partial result is returned.
    pub fn parse_operations(
        &self,
        parser: &PatchOperationParser,
    ) -> Result<Vec<PatchOperation>, PatchError> {
        self.validate()?;

        self.operations
            .iter()
            .enumerate()
            .map(|(index, raw)| {
                parser
                    .parse(&raw.op, raw.path.as_deref(), raw.value.as_ref())
                    .map_err(|e| PatchError::InvalidOperation {
                        index,
                        error: Box::new(e),
                    })
            })
            .collect()
    }
}

// =============================================================================
// Tests
// =============================================================================
