//! Bearer token decoding.

use serde_json::Value;

use super::AuthError;

/// Turns a bearer token into its claims payload.
pub trait TokenDecoder: Send + Sync {
    fn decode(&self, token: &str) -> Result<Value, AuthError>;
}

/// HMAC-signed JWT decoder.
///
/// Only the signature is mandatory; `exp` and `nbf` are checked when present.
#[cfg(feature = "jwt")]
pub struct JwtDecoder {
    key: jsonwebtoken::DecodingKey,
    validation: jsonwebtoken::Validation,
}

#[cfg(feature = "jwt")]
impl JwtDecoder {
    pub fn new(secret: &[u8], algorithm: crate::config::TokenAlgorithm) -> Self {
        let mut validation = jsonwebtoken::Validation::new(algorithm.into());
        validation.required_spec_claims.clear();
        validation.validate_aud = false;

        Self {
            key: jsonwebtoken::DecodingKey::from_secret(secret),
            validation,
        }
    }

    /// Build a decoder from auth config; `None` when no signing secret is set.
    pub fn from_config(config: &crate::config::AuthConfig) -> Option<Self> {
        config
            .signing_secret
            .as_deref()
            .map(|secret| Self::new(secret.as_bytes(), config.signing_algorithm))
    }
}

#[cfg(feature = "jwt")]
impl TokenDecoder for JwtDecoder {
    fn decode(&self, token: &str) -> Result<Value, AuthError> {
        jsonwebtoken::decode::<Value>(token, &self.key, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| AuthError::InvalidToken(e.to_string()))
    }
}
