//! Configuration module.
//!
//! patchgate is configured via a TOML file, with support for environment
//! variable interpolation using `${VAR_NAME}` syntax.
//!
//! # Example
//!
//! ```toml
//! [auth]
//! searchable_attribute = "email"
//! signing_secret = "${PATCHGATE_SIGNING_SECRET}"
//!
//! [schema.user]
//! userName = "email"
//! name = { givenName = "first_name", familyName = "last_name" }
//! emails = [ { type = "work", value = "email" } ]
//! ```

mod auth;
mod observability;
mod schema;

use std::{path::Path, sync::LazyLock};

pub use auth::*;
pub use observability::*;
use regex::Regex;
pub use schema::*;
use serde::{Deserialize, Serialize};

static ENV_VAR: LazyLock<Regex> = LazyLock::new(|| {
    #[allow(clippy::unwrap_used)] // literal pattern
    Regex::new(r"\$\{([^}]+)\}").unwrap()
});

/// Root configuration.
///
/// Every section is optional. An empty file yields an empty schema, which
/// still parses paths (by splitting on `.`) but resolves no storage paths.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PatchgateConfig {
    /// Observability configuration (logging).
    #[serde(default)]
    pub observability: ObservabilityConfig,

    /// Request authorization configuration.
    #[serde(default)]
    pub auth: AuthConfig,

    /// Mutable-attribute schemas, one per resource type.
    #[serde(default)]
    pub schema: SchemaConfig,
}

impl PatchgateConfig {
    /// Load configuration from a TOML file.
    ///
    /// Environment variables in the format `${VAR_NAME}` are expanded.
    /// Missing required variables will cause an error.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path.as_ref())
            .map_err(|e| ConfigError::Io(e, path.as_ref().to_path_buf()))?;

        Self::from_str(&contents)
    }

    /// Parse configuration from a TOML string.
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(contents: &str) -> Result<Self, ConfigError> {
        let expanded = expand_env_vars(contents)?;
        let config: PatchgateConfig = toml::from_str(&expanded)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        self.auth.validate()?;
        self.schema.validate()?;
        Ok(())
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {1}: {0}")]
    Io(std::io::Error, std::path::PathBuf),

    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Environment variable not found: {0}")]
    EnvVarNotFound(String),

    #[error("Configuration validation error: {0}")]
    Validation(String),
}

/// Expand `${VAR_NAME}` references line by line.
///
/// References that sit after a `#` on the same line are comments and are left
/// untouched, so commented-out examples never require their variables.
fn expand_env_vars(input: &str) -> Result<String, ConfigError> {
    let mut lines = Vec::new();

    for line in input.split('\n') {
        let code_end = line.find('#').unwrap_or(line.len());
        let (code, comment) = line.split_at(code_end);

        let mut expanded = String::with_capacity(line.len());
        let mut last_end = 0;
        for caps in ENV_VAR.captures_iter(code) {
            let Some(whole) = caps.get(0) else { continue };
            let name = &caps[1];
            let value =
                std::env::var(name).map_err(|_| ConfigError::EnvVarNotFound(name.to_string()))?;
            expanded.push_str(&code[last_end..whole.start()]);
            expanded.push_str(&value);
            last_end = whole.end();
        }
        expanded.push_str(&code[last_end..]);
        expanded.push_str(comment);
        lines.push(expanded);
    }

    Ok(lines.join("\n"))
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;
    use crate::scim::ResourceType;

    const EXAMPLE: &str = r#"
        [observability.logging]
        level = "debug"
        format = "json"

        [auth]
        searchable_attribute = "email"
        signing_secret = "s3cret"

        [schema.user]
        userName = "email"
        name = { givenName = "first_name", familyName = "last_name" }
        emails = [ { type = "work", value = "email" } ]

        [schema.group]
        displayName = "name"
        members = "member_ids"
    "#;

    #[test]
    fn test_empty_config() {
        let config = PatchgateConfig::from_str("").unwrap();
        assert_eq!(config.auth.searchable_attribute, "email");
        assert_eq!(config.schema.user.attribute_names().count(), 0);
    }

    #[test]
    fn test_full_config() {
        let config = PatchgateConfig::from_str(EXAMPLE).unwrap();

        assert_eq!(config.observability.logging.level, LogLevel::Debug);
        assert_eq!(config.observability.logging.format, LogFormat::Json);
        assert_eq!(config.auth.signing_secret.as_deref(), Some("s3cret"));

        let user: Vec<&str> = config
            .schema
            .for_resource(ResourceType::User)
            .attribute_names()
            .collect();
        assert_eq!(user, vec!["userName", "name", "emails"]);

        let group: Vec<&str> = config
            .schema
            .for_resource(ResourceType::Group)
            .attribute_names()
            .collect();
        assert_eq!(group, vec!["displayName", "members"]);
    }

    #[test]
    fn test_unknown_section_rejected() {
        let err = PatchgateConfig::from_str("[server]\nport = 8080").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(EXAMPLE.as_bytes()).unwrap();

        let config = PatchgateConfig::from_file(file.path()).unwrap();
        assert_eq!(config.schema.group.attribute_names().count(), 2);
    }

    #[test]
    fn test_from_missing_file() {
        let err = PatchgateConfig::from_file("/nonexistent/patchgate.toml").unwrap_err();
        assert!(matches!(err, ConfigError::Io(_, _)));
        assert!(err.to_string().contains("/nonexistent/patchgate.toml"));
    }

    #[test]
    fn test_env_var_expansion() {
        temp_env::with_var("PATCHGATE_TEST_SECRET", Some("from-env"), || {
            let config = PatchgateConfig::from_str(
                "[auth]\nsigning_secret = \"${PATCHGATE_TEST_SECRET}\"",
            )
            .unwrap();
            assert_eq!(config.auth.signing_secret.as_deref(), Some("from-env"));
        });
    }

    #[test]
    fn test_env_var_missing() {
        temp_env::with_var_unset("PATCHGATE_TEST_MISSING", || {
            let err = expand_env_vars("key = \"${PATCHGATE_TEST_MISSING}\"").unwrap_err();
            assert!(matches!(err, ConfigError::EnvVarNotFound(name) if name == "PATCHGATE_TEST_MISSING"));
        });
    }

    #[test]
    fn test_env_var_in_comment_ignored() {
        let result = expand_env_vars("# secret = \"${NONEXISTENT_VAR}\"").unwrap();
        assert_eq!(result, "# secret = \"${NONEXISTENT_VAR}\"");

        let result = expand_env_vars("key = \"value\" # ${NONEXISTENT_VAR}").unwrap();
        assert_eq!(result, "key = \"value\" # ${NONEXISTENT_VAR}");
    }

    #[test]
    fn test_env_var_multiline_preserves_layout() {
        temp_env::with_var("PATCHGATE_TEST_MULTI", Some("value1"), || {
            let input = "key1 = \"${PATCHGATE_TEST_MULTI}\"\n# key2 = \"${NONEXISTENT}\"\nkey3 = \"literal\"\n";
            let result = expand_env_vars(input).unwrap();
            assert_eq!(
                result,
                "key1 = \"value1\"\n# key2 = \"${NONEXISTENT}\"\nkey3 = \"literal\"\n"
            );
        });
    }
}
