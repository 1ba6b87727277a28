//! SCIM 2.0 Error Types
//!
//! SCIM error bodies per RFC 7644 Section 3.12, and the mapping from PATCH
//! parsing and authorization failures onto them. Every failure becomes a 4xx
//! response except internal errors.

use axum::{
    Json,
    response::{IntoResponse, Response},
};
use http::StatusCode;
use serde::{Deserialize, Serialize};

use super::{patch::PatchError, types::SCHEMA_ERROR};
use crate::auth::AuthError;

/// SCIM error response per RFC 7644.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScimErrorResponse {
    /// SCIM schema URIs (always contains the Error schema)
    pub schemas: Vec<String>,

    /// HTTP status code as a string (e.g., "400", "401")
    pub status: String,

    /// SCIM-specific error type (optional, per RFC 7644)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scim_type: Option<ScimErrorType>,

    /// Human-readable error detail
    pub detail: String,
}

impl ScimErrorResponse {
    fn new(
        status: StatusCode,
        scim_type: Option<ScimErrorType>,
        detail: impl Into<String>,
    ) -> Self {
        Self {
            schemas: vec![SCHEMA_ERROR.to_string()],
            status: status.as_u16().to_string(),
            scim_type,
            detail: detail.into(),
        }
    }

    /// Invalid filter syntax error (400)
    pub fn invalid_filter(detail: impl Into<String>) -> Self {
        Self::new(
            StatusCode::BAD_REQUEST,
            Some(ScimErrorType::InvalidFilter),
            detail,
        )
    }

    /// Invalid request envelope (400)
    pub fn invalid_syntax(detail: impl Into<String>) -> Self {
        Self::new(
            StatusCode::BAD_REQUEST,
            Some(ScimErrorType::InvalidSyntax),
            detail,
        )
    }

    /// PATCH request the server cannot process (422)
    pub fn unsupported_patch(detail: impl Into<String>) -> Self {
        Self::new(StatusCode::UNPROCESSABLE_ENTITY, None, detail)
    }

    /// Authentication required or rejected (401)
    pub fn unauthorized(detail: impl Into<String>) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, None, detail)
    }

    /// Internal server error (500)
    pub fn internal(detail: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, None, detail)
    }

    /// Get the HTTP status code
    pub fn status_code(&self) -> StatusCode {
        self.status
            .parse::<u16>()
            .ok()
            .and_then(|code| StatusCode::from_u16(code).ok())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
    }
}

impl From<PatchError> for ScimErrorResponse {
    fn from(err: PatchError) -> Self {
        let detail = err.to_string();
        match err {
            PatchError::UnsupportedPatchRequest(_) => Self::unsupported_patch(detail),
            PatchError::MalformedFilter(_) => Self::invalid_filter(detail),
            PatchError::InvalidSchema => Self::invalid_syntax(detail),
            PatchError::InvalidOperation { error, .. } => Self {
                detail,
                ..Self::from(*error)
            },
        }
    }
}

impl From<AuthError> for ScimErrorResponse {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::Internal(_) => Self::internal("Authorization could not be completed"),
            // Never echo which part of the credentials failed.
            _ => Self::unauthorized("Authorization failed"),
        }
    }
}

impl IntoResponse for ScimErrorResponse {
    fn into_response(self) -> Response {
        let status = self.status_code();
        (status, Json(self)).into_response()
    }
}

/// SCIM error types per RFC 7644 Section 3.12.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ScimErrorType {
    /// Filter syntax is invalid or unsupported
    InvalidFilter,

    /// Request body is not a valid PatchOp message
    InvalidSyntax,
}

impl std::fmt::Display for ScimErrorType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ScimErrorType::InvalidFilter => write!(f, "invalidFilter"),
            ScimErrorType::InvalidSyntax => write!(f, "invalidSyntax"),
        }
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_malformed_filter_maps_to_invalid_filter() {
        let err = ScimErrorResponse::from(PatchError::MalformedFilter(
            "expected 'attribute operator \"value\"'".to_string(),
        ));

        assert_eq!(err.status, "400");
        assert_eq!(err.scim_type, Some(ScimErrorType::InvalidFilter));

        let json = serde_json::to_string_pretty(&err).unwrap();
        assert!(json.contains("\"scimType\": \"invalidFilter\""));
        assert!(json.contains(SCHEMA_ERROR));
    }

    #[test]
    fn test_unsupported_patch_maps_to_422() {
        let err = ScimErrorResponse::from(PatchError::UnsupportedPatchRequest(
            "unknown operation 'move'".to_string(),
        ));

        assert_eq!(err.status_code(), StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(err.scim_type, None);
        assert!(err.detail.contains("move"));

        let json = serde_json::to_string(&err).unwrap();
        assert!(!json.contains("scimType"));
    }

    #[test]
    fn test_invalid_operation_keeps_inner_status() {
        let err = ScimErrorResponse::from(PatchError::InvalidOperation {
            index: 2,
            error: Box::new(PatchError::MalformedFilter("bad".to_string())),
        });

        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(err.scim_type, Some(ScimErrorType::InvalidFilter));
        assert!(err.detail.contains("index 2"));
    }

    #[test]
    fn test_invalid_schema_maps_to_invalid_syntax() {
        let err = ScimErrorResponse::from(PatchError::InvalidSchema);
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(err.scim_type, Some(ScimErrorType::InvalidSyntax));
    }

    #[test]
    fn test_auth_errors_are_opaque_401() {
        for err in [
            AuthError::MissingCredentials,
            AuthError::InvalidCredentials,
            AuthError::InvalidToken("signature mismatch".to_string()),
        ] {
            let response = ScimErrorResponse::from(err);
            assert_eq!(response.status_code(), StatusCode::UNAUTHORIZED);
            assert_eq!(response.detail, "Authorization failed");
        }

        let response = ScimErrorResponse::from(AuthError::Internal("db down".to_string()));
        assert_eq!(response.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(!response.detail.contains("db down"));
    }

    #[test]
    fn test_into_response_status() {
        let response = ScimErrorResponse::unauthorized("nope").into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn test_scim_error_type_display() {
        assert_eq!(format!("{}", ScimErrorType::InvalidFilter), "invalidFilter");
        assert_eq!(format!("{}", ScimErrorType::InvalidSyntax), "invalidSyntax");
    }
}
