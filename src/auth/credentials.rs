//! `Authorization` header parsing.

use base64::{Engine, engine::general_purpose::STANDARD};

use super::AuthError;

/// Which credential scheme a request is using.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthStrategy {
    Bearer,
    Basic,
}

impl AuthStrategy {
    /// Bearer when the header mentions `Bearer` anywhere, Basic otherwise
    /// (including when there is no header at all).
    pub fn for_header(header: Option<&str>) -> Self {
        match header {
            Some(value) if value.contains("Bearer") => AuthStrategy::Bearer,
            _ => AuthStrategy::Basic,
        }
    }
}

/// Credentials extracted from an `Authorization` header.
#[derive(Clone, PartialEq, Eq)]
pub enum Credentials {
    Bearer(String),
    Basic { username: String, password: String },
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Credentials::Bearer(_) => f.debug_tuple("Bearer").field(&"<redacted>").finish(),
            Credentials::Basic { username, .. } => f
                .debug_struct("Basic")
                .field("username", username)
                .field("password", &"<redacted>")
                .finish(),
        }
    }
}

impl Credentials {
    /// Extract credentials according to [`AuthStrategy::for_header`].
    ///
    /// For bearer the token is the last whitespace-separated token of the
    /// header. For Basic the header must carry the `Basic` scheme and a base64
    /// `username:password` pair.
    pub fn from_header(header: Option<&str>) -> Result<Self, AuthError> {
        match AuthStrategy::for_header(header) {
            AuthStrategy::Bearer => header
                .and_then(|value| value.split_whitespace().last())
                .filter(|token| *token != "Bearer")
                .map(|token| Credentials::Bearer(token.to_string()))
                .ok_or(AuthError::MissingCredentials),
            AuthStrategy::Basic => parse_basic(header.ok_or(AuthError::MissingCredentials)?),
        }
    }
}

fn parse_basic(header: &str) -> Result<Credentials, AuthError> {
    let (scheme, encoded) = header
        .trim()
        .split_once(' ')
        .ok_or(AuthError::MissingCredentials)?;
    if !scheme.eq_ignore_ascii_case("Basic") {
        return Err(AuthError::MissingCredentials);
    }

    let decoded = STANDARD
        .decode(encoded.trim())
        .map_err(|_| AuthError::InvalidCredentials)?;
    let decoded = String::from_utf8(decoded).map_err(|_| AuthError::InvalidCredentials)?;
    let (username, password) = decoded
        .split_once(':')
        .ok_or(AuthError::InvalidCredentials)?;

    Ok(Credentials::Basic {
        username: username.to_string(),
        password: password.to_string(),
    })
}
