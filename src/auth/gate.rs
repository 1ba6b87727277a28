//! Request authorization gate.
//!
//! Picks a credential strategy from the `Authorization` header, derives the
//! `(searchable attribute value, authentication attribute value)` pair and
//! hands it to a [`TenantAuthorizer`]:
//!
//! - Bearer: the token is decoded and the configured searchable attribute is
//!   located anywhere inside its payload. The pair is `(that value, token)`.
//! - Basic: the pair is `(username, password)`.

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{AuthError, AuthStrategy, Credentials, TokenDecoder};
use crate::scim::{dig, locate};

/// The tenant (company) a request acts on behalf of.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tenant {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

/// Resolves authentication attributes to a tenant.
///
/// Implemented by the embedding application (typically a database lookup).
#[async_trait]
pub trait TenantAuthorizer: Send + Sync {
    /// `Ok(None)` means the attributes match no tenant.
    async fn authorize(
        &self,
        searchable_attribute: &str,
        authentication_attribute: &str,
    ) -> Result<Option<Tenant>, AuthError>;
}

pub struct RequestAuthorizationGate {
    searchable_attribute: String,
    decoder: Option<Arc<dyn TokenDecoder>>,
    authorizer: Arc<dyn TenantAuthorizer>,
}

impl RequestAuthorizationGate {
    /// Create a gate that accepts HTTP Basic only.
    pub fn new(
        searchable_attribute: impl Into<String>,
        authorizer: Arc<dyn TenantAuthorizer>,
    ) -> Self {
        Self {
            searchable_attribute: searchable_attribute.into(),
            decoder: None,
            authorizer,
        }
    }

    /// Also accept bearer tokens, decoded with `decoder`.
    pub fn with_token_decoder(mut self, decoder: Arc<dyn TokenDecoder>) -> Self {
        self.decoder = Some(decoder);
        self
    }

    /// Build a gate from auth config, enabling bearer tokens when a signing
    /// secret is configured.
    #[cfg(feature = "jwt")]
    pub fn from_config(
        config: &crate::config::AuthConfig,
        authorizer: Arc<dyn TenantAuthorizer>,
    ) -> Self {
        let gate = Self::new(config.searchable_attribute.clone(), authorizer);
        match super::JwtDecoder::from_config(config) {
            Some(decoder) => gate.with_token_decoder(Arc::new(decoder)),
            None => gate,
        }
    }

    pub fn searchable_attribute(&self) -> &str {
        &self.searchable_attribute
    }

    /// Derive the `(searchable, authentication)` attribute pair from a header.
    pub fn authentication_attributes(
        &self,
        header: Option<&str>,
    ) -> Result<(String, String), AuthError> {
        match Credentials::from_header(header)? {
            Credentials::Bearer(token) => {
                let Some(decoder) = &self.decoder else {
                    tracing::warn!("Bearer token presented but no token decoder is configured");
                    return Err(AuthError::InvalidCredentials);
                };
                let payload = decoder.decode(&token)?;
                let searchable = self.searchable_value(&payload).ok_or_else(|| {
                    tracing::debug!(
                        attribute = %self.searchable_attribute,
                        "Bearer token payload has no searchable attribute"
                    );
                    AuthError::InvalidCredentials
                })?;
                Ok((searchable, token))
            }
            Credentials::Basic { username, password } => Ok((username, password)),
        }
    }

    /// Authorize a request, failing with [`AuthError::InvalidCredentials`]
    /// when no tenant is resolved.
    pub async fn authorize(&self, header: Option<&str>) -> Result<Tenant, AuthError> {
        let strategy = AuthStrategy::for_header(header);
        let (searchable, authentication) = self.authentication_attributes(header)?;

        match self.authorizer.authorize(&searchable, &authentication).await? {
            Some(tenant) => {
                tracing::debug!(?strategy, tenant_id = %tenant.id, "Request authorized");
                Ok(tenant)
            }
            None => {
                tracing::info!(?strategy, "No tenant matches request credentials");
                Err(AuthError::InvalidCredentials)
            }
        }
    }

    fn searchable_value(&self, payload: &Value) -> Option<String> {
        let path = locate(&self.searchable_attribute, payload)?;
        match dig(payload, &path)? {
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        }
    }
}
