//! The root configuration type.

use serde::{Deserialize, Serialize};
use vigil_telemetry::LogConfig;

use crate::{ConfigError, DocsSection, ValidationConfig};

/// Complete Vigil configuration.
///
/// Use [`ConfigLoader`](crate::ConfigLoader) to load it from files and
/// environment variables.
///
/// # Example
///
/// ```
/// use vigil_config::VigilConfig;
///
/// let config = VigilConfig::default();
/// assert!(config.validation.validate_responses);
/// assert_eq!(config.docs.title, "API");
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(deny_unknown_fields)]
pub struct VigilConfig {
    /// Validation middleware switches.
    #[serde(default)]
    pub validation: ValidationConfig,

    /// OpenAPI document defaults.
    #[serde(default)]
    pub docs: DocsSection,

    /// Logging setup.
    #[serde(default)]
    pub logging: LogConfig,
}

impl VigilConfig {
    /// Checks values serde cannot check.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` if:
    /// - the log filter does not parse
    /// - `docs.openapi` is not a 3.x version
    /// - `docs.title` or `docs.version` is empty
    /// - a server URL is empty
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Err(e) = vigil_telemetry::create_env_filter(&self.logging.level) {
            return Err(ConfigError::invalid_value("logging.level", e.to_string()));
        }

        if !self.docs.openapi.starts_with("3.") {
            return Err(ConfigError::invalid_value(
                "docs.openapi",
                format!("unsupported OpenAPI version: {}", self.docs.openapi),
            ));
        }

        if self.docs.title.trim().is_empty() {
            return Err(ConfigError::invalid_value("docs.title", "must not be empty"));
        }

        if self.docs.version.trim().is_empty() {
            return Err(ConfigError::invalid_value("docs.version", "must not be empty"));
        }

        if self.docs.servers.iter().any(|url| url.trim().is_empty()) {
            return Err(ConfigError::invalid_value("docs.servers", "server URLs must not be empty"));
        }

        Ok(())
    }

    /// Development preset: pretty debug logs, every check on.
    ///
    /// ```
    /// use vigil_config::VigilConfig;
    ///
    /// let config = VigilConfig::development();
    /// assert_eq!(config.logging.level, "debug");
    /// ```
    #[must_use]
    pub fn development() -> Self {
        Self {
            logging: LogConfig::development(),
            ..Self::default()
        }
    }

    /// Production preset: JSON logs at `info`, rejection logging off.
    ///
    /// ```
    /// use vigil_config::VigilConfig;
    /// use vigil_telemetry::LogFormat;
    ///
    /// let config = VigilConfig::production();
    /// assert_eq!(config.logging.format, LogFormat::Json);
    /// ```
    #[must_use]
    pub fn production() -> Self {
        let mut config = Self::default();
        config.logging = LogConfig::production();
        config.validation.log_rejections = false;
        config
    }
}
