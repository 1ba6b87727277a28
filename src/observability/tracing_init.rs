//! Tracing initialization with configurable logging formats.

use tracing_subscriber::{
    EnvFilter, Layer, Registry, layer::SubscriberExt, util::SubscriberInitExt,
};

use crate::config::{LogFormat, LoggingConfig, ObservabilityConfig};

type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync>;

/// Initialize the global tracing subscriber.
///
/// Installs a console layer in the configured format (pretty, compact, JSON)
/// behind an [`EnvFilter`]. `RUST_LOG` takes precedence over the configured
/// level and filter directives.
pub fn init_tracing(config: &ObservabilityConfig) -> Result<(), TracingError> {
    let logging = &config.logging;
    let filter = build_env_filter(logging, std::env::var("RUST_LOG").ok().as_deref());

    tracing_subscriber::registry()
        .with(build_fmt_layer(logging))
        .with(filter)
        .try_init()
        .map_err(|e| TracingError::Init(e.to_string()))
}

fn build_fmt_layer(config: &LoggingConfig) -> BoxedLayer {
    let base = tracing_subscriber::fmt::layer()
        .with_target(true)
        .with_file(config.file_line)
        .with_line_number(config.file_line);

    match (config.format, config.timestamps) {
        (LogFormat::Pretty, true) => base.pretty().boxed(),
        (LogFormat::Pretty, false) => base.pretty().without_time().boxed(),
        (LogFormat::Compact, true) => base.compact().boxed(),
        (LogFormat::Compact, false) => base.compact().without_time().boxed(),
        (LogFormat::Json, true) => base.json().boxed(),
        (LogFormat::Json, false) => base.json().without_time().boxed(),
    }
}

/// Build the log filter.
///
/// An unparsable `RUST_LOG` or filter directive falls back to the bare level.
fn build_env_filter(config: &LoggingConfig, rust_log: Option<&str>) -> EnvFilter {
    let base_level = config.level.to_tracing_level().as_str().to_lowercase();

    if let Some(directives) = rust_log {
        EnvFilter::try_new(directives).unwrap_or_else(|_| EnvFilter::new(&base_level))
    } else if let Some(filter) = &config.filter {
        EnvFilter::try_new(format!("{base_level},{filter}"))
            .unwrap_or_else(|_| EnvFilter::new(&base_level))
    } else {
        EnvFilter::new(&base_level)
    }
}

/// Tracing initialization errors.
#[derive(Debug, thiserror::Error)]
pub enum TracingError {
    #[error("Failed to initialize tracing: {0}")]
    Init(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LogLevel;

    #[test]
    fn test_filter_from_level() {
        let config = LoggingConfig {
            level: LogLevel::Warn,
            ..Default::default()
        };
        assert_eq!(build_env_filter(&config, None).to_string(), "warn");
    }

    #[test]
    fn test_filter_combines_directives() {
        let config = LoggingConfig {
            filter: Some("patchgate=trace".to_string()),
            ..Default::default()
        };
        let filter = build_env_filter(&config, None).to_string();
        assert!(filter.contains("patchgate=trace"), "{filter}");
        assert!(filter.contains("info"), "{filter}");
    }

    #[test]
    fn test_rust_log_overrides_config() {
        let config = LoggingConfig {
            filter: Some("patchgate=trace".to_string()),
            ..Default::default()
        };
        let filter = build_env_filter(&config, Some("error")).to_string();
        assert_eq!(filter, "error");
    }

    #[test]
    fn test_invalid_directive_falls_back_to_level() {
        let config = LoggingConfig {
            level: LogLevel::Debug,
            filter: Some("patchgate=notalevel".to_string()),
            ..Default::default()
        };
        assert_eq!(build_env_filter(&config, None).to_string(), "debug");
    }
}
