use axum::response::{IntoResponse, Response};

use crate::scim::ScimErrorResponse;

/// Request authorization failures.
///
/// All variants but [`AuthError::Internal`] render as the same opaque 401 so a
/// caller cannot tell which part of its credentials was rejected.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuthError {
    /// No `Authorization` header, or one in a scheme we do not accept
    #[error("Authentication credentials required")]
    MissingCredentials,

    /// Credentials were readable but resolved to no tenant
    #[error("Invalid authentication credentials")]
    InvalidCredentials,

    /// Bearer token failed verification or decoding
    #[error("Invalid bearer token: {0}")]
    InvalidToken(String),

    /// The tenant authorizer itself failed
    #[error("Internal authorization error: {0}")]
    Internal(String),
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        ScimErrorResponse::from(self).into_response()
    }
}
