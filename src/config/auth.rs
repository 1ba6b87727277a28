use serde::{Deserialize, Serialize};

use super::ConfigError;

/// Request authorization configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AuthConfig {
    /// Identity field used to look up the tenant.
    ///
    /// For bearer tokens this key is searched for anywhere in the decoded
    /// token payload; for HTTP Basic the username carries its value.
    #[serde(default = "default_searchable_attribute")]
    pub searchable_attribute: String,

    /// Shared secret for verifying bearer tokens.
    /// Bearer authentication is rejected when unset.
    #[serde(default)]
    pub signing_secret: Option<String>,

    /// HMAC algorithm the tokens are signed with.
    #[serde(default)]
    pub signing_algorithm: TokenAlgorithm,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            searchable_attribute: default_searchable_attribute(),
            signing_secret: None,
            signing_algorithm: TokenAlgorithm::default(),
        }
    }
}

impl AuthConfig {
    /// Whether bearer tokens can be verified with this configuration.
    pub fn bearer_enabled(&self) -> bool {
        self.signing_secret.is_some()
    }

    pub(super) fn validate(&self) -> Result<(), ConfigError> {
        if self.searchable_attribute.trim().is_empty() {
            return Err(ConfigError::Validation(
                "auth.searchable_attribute must not be empty".into(),
            ));
        }
        if self.signing_secret.as_deref().is_some_and(str::is_empty) {
            return Err(ConfigError::Validation(
                "auth.signing_secret must not be empty; omit it to disable bearer tokens".into(),
            ));
        }
        Ok(())
    }
}

fn default_searchable_attribute() -> String {
    "email".to_string()
}

/// Signing algorithm for bearer tokens.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TokenAlgorithm {
    #[default]
    HS256,
    HS384,
    HS512,
}

#[cfg(feature = "jwt")]
impl From<TokenAlgorithm> for jsonwebtoken::Algorithm {
    fn from(algorithm: TokenAlgorithm) -> Self {
        match algorithm {
            TokenAlgorithm::HS256 => jsonwebtoken::Algorithm::HS256,
            TokenAlgorithm::HS384 => jsonwebtoken::Algorithm::HS384,
            TokenAlgorithm::HS512 => jsonwebtoken::Algorithm::HS512,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config: AuthConfig = toml::from_str("").unwrap();
        assert_eq!(config.searchable_attribute, "email");
        assert_eq!(config.signing_algorithm, TokenAlgorithm::HS256);
        assert!(!config.bearer_enabled());
    }

    #[test]
    fn test_algorithm_parsing() {
        let config: AuthConfig = toml::from_str(
            r#"
            signing_secret = "s3cret"
            signing_algorithm = "HS512"
            "#,
        )
        .unwrap();
        assert_eq!(config.signing_algorithm, TokenAlgorithm::HS512);
        assert!(config.bearer_enabled());

        let result: Result<AuthConfig, _> = toml::from_str("signing_algorithm = \"RS256\"");
        assert!(result.is_err());
    }

    #[test]
    fn test_validation() {
        let config = AuthConfig {
            searchable_attribute: " ".to_string(),
            ..Default::default()
        };
        assert!(config.validate().is_err());

        let config = AuthConfig {
            signing_secret: Some(String::new()),
            ..Default::default()
        };
        assert!(config.validate().is_err());

        assert!(AuthConfig::default().validate().is_ok());
    }
}
