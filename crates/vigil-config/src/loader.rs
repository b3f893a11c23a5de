//! Layered configuration loading.
//!
//! Layers apply in call order, later ones overriding earlier ones:
//! 1. Defaults or a preset
//! 2. Files or strings (TOML or JSON), merged key by key
//! 3. Environment variables (`PREFIX__SECTION__KEY`), applied at [`ConfigLoader::load`]

use std::env;
use std::fs;
use std::path::Path;

use serde_json::Value;
use vigil_telemetry::LogFormat;

use crate::{ConfigError, VigilConfig};

/// Builds a [`VigilConfig`] from layered sources.
///
/// # Example
///
/// ```no_run
/// use vigil_config::ConfigLoader;
///
/// # fn main() -> Result<(), vigil_config::ConfigError> {
/// let config = ConfigLoader::new()
///     .with_production()
///     .with_optional_file("vigil.toml")?
///     .with_env_prefix("VIGIL")
///     .load()?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct ConfigLoader {
    config: VigilConfig,
    env_prefix: Option<String>,
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigLoader {
    /// Creates a loader starting from defaults.
    #[must_use]
    pub fn new() -> Self {
        Self {
            config: VigilConfig::default(),
            env_prefix: None,
        }
    }

    /// Resets to default values.
    #[must_use]
    pub fn with_defaults(mut self) -> Self {
        self.config = VigilConfig::default();
        self
    }

    /// Resets to the development preset.
    ///
    /// ```
    /// use vigil_config::ConfigLoader;
    ///
    /// let config = ConfigLoader::new().with_development().load().unwrap();
    /// assert_eq!(config.logging.level, "debug");
    /// ```
    #[must_use]
    pub fn with_development(mut self) -> Self {
        self.config = VigilConfig::development();
        self
    }

    /// Resets to the production preset.
    #[must_use]
    pub fn with_production(mut self) -> Self {
        self.config = VigilConfig::production();
        self
    }

    /// Merges a TOML or JSON file, chosen by extension.
    ///
    /// Keys absent from the file keep their current values. Unknown keys are
    /// rejected.
    pub fn with_file<P: AsRef<Path>>(self, path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ConfigError::file_not_found(path));
        }

        let content = fs::read_to_string(path).map_err(|e| ConfigError::read_error(path, e))?;
        let format = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_lowercase)
            .ok_or_else(|| ConfigError::UnsupportedFormat(path.display().to_string()))?;
        self.with_string(&content, &format)
    }

    /// Merges a file if it exists.
    pub fn with_optional_file<P: AsRef<Path>>(self, path: P) -> Result<Self, ConfigError> {
        if path.as_ref().exists() {
            self.with_file(path)
        } else {
            Ok(self)
        }
    }

    /// Merges configuration text in the named format (`"toml"` or `"json"`).
    ///
    /// ```
    /// use vigil_config::ConfigLoader;
    ///
    /// let config = ConfigLoader::new()
    ///     .with_string("[docs]\ntitle = \"Orders\"", "toml")
    ///     .unwrap()
    ///     .load()
    ///     .unwrap();
    /// assert_eq!(config.docs.title, "Orders");
    /// assert_eq!(config.docs.version, "1.0.0");
    /// ```
    pub fn with_string(mut self, content: &str, format: &str) -> Result<Self, ConfigError> {
        let layer: Value = match format.to_lowercase().as_str() {
            "toml" => toml::from_str(content)?,
            "json" => serde_json::from_str(content)?,
            other => return Err(ConfigError::UnsupportedFormat(other.to_string())),
        };

        // Strictness check on the layer alone, so unknown keys are reported.
        let _: VigilConfig = serde_json::from_value(layer.clone())?;

        let mut current = serde_json::to_value(&self.config)?;
        merge(&mut current, layer);
        self.config = serde_json::from_value(current)?;
        Ok(self)
    }

    /// Sets the prefix for environment overrides.
    ///
    /// With prefix `VIGIL`, `VIGIL__VALIDATION__VALIDATE_RESPONSES=false`
    /// turns response validation off.
    #[must_use]
    pub fn with_env_prefix(mut self, prefix: &str) -> Self {
        self.env_prefix = Some(prefix.to_uppercase());
        self
    }

    /// Loads `.env` from the current directory, if present.
    pub fn with_dotenv(self) -> Result<Self, ConfigError> {
        match dotenvy::dotenv() {
            Ok(_) => Ok(self),
            Err(e) if e.not_found() => Ok(self),
            Err(e) => Err(e.into()),
        }
    }

    /// Loads a specific environment file.
    pub fn with_dotenv_file<P: AsRef<Path>>(self, path: P) -> Result<Self, ConfigError> {
        dotenvy::from_path(path.as_ref())?;
        Ok(self)
    }

    /// Applies environment overrides and validates.
    pub fn load(mut self) -> Result<VigilConfig, ConfigError> {
        if let Some(prefix) = self.env_prefix.take() {
            self.apply_env_overrides(&prefix)?;
        }
        self.config.validate()?;
        Ok(self.config)
    }

    /// Returns the configuration without env overrides or validation.
    #[must_use]
    pub fn load_unvalidated(self) -> VigilConfig {
        self.config
    }

    fn apply_env_overrides(&mut self, prefix: &str) -> Result<(), ConfigError> {
        let marker = format!("{prefix}__");
        let mut vars: Vec<(String, String)> = env::vars()
            .filter(|(key, _)| key.starts_with(&marker))
            .collect();
        vars.sort();
        for (key, value) in vars {
            self.apply_env_var(&key, &value, prefix)?;
        }
        Ok(())
    }

    fn apply_env_var(&mut self, key: &str, value: &str, prefix: &str) -> Result<(), ConfigError> {
        let rest = key
            .strip_prefix(prefix)
            .and_then(|k| k.strip_prefix("__"))
            .ok_or_else(|| ConfigError::env_parse_error(key, "invalid key format"))?;
        let parts: Vec<&str> = rest.split("__").collect();
        let flag = || parse_bool(value).ok_or_else(|| ConfigError::env_parse_error(key, "expected boolean"));

        match parts.as_slice() {
            ["VALIDATION", "VALIDATE_REQUESTS"] => {
                self.config.validation.validate_requests = flag()?;
            }
            ["VALIDATION", "VALIDATE_RESPONSES"] => {
                self.config.validation.validate_responses = flag()?;
            }
            ["VALIDATION", "LOG_REJECTIONS"] => {
                self.config.validation.log_rejections = flag()?;
            }

            ["DOCS", "OPENAPI"] => self.config.docs.openapi = value.to_string(),
            ["DOCS", "TITLE"] => self.config.docs.title = value.to_string(),
            ["DOCS", "VERSION"] => self.config.docs.version = value.to_string(),
            ["DOCS", "DESCRIPTION"] => {
                self.config.docs.description = if value.is_empty() {
                    None
                } else {
                    Some(value.to_string())
                };
            }
            ["DOCS", "SERVERS"] => {
                self.config.docs.servers = value
                    .split(',')
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(str::to_string)
                    .collect();
            }

            ["LOGGING", "ENABLED"] => self.config.logging.enabled = flag()?,
            ["LOGGING", "LEVEL"] => self.config.logging.level = value.to_string(),
            ["LOGGING", "FORMAT"] => {
                self.config.logging.format = match value.to_lowercase().as_str() {
                    "json" => LogFormat::Json,
                    "pretty" => LogFormat::Pretty,
                    _ => return Err(ConfigError::env_parse_error(key, "expected 'json' or 'pretty'")),
                };
            }
            ["LOGGING", "SPAN_EVENTS"] => self.config.logging.span_events = flag()?,
            ["LOGGING", "INCLUDE_LOCATION"] => self.config.logging.include_location = flag()?,
            ["LOGGING", "INCLUDE_TARGET"] => self.config.logging.include_target = flag()?,
            ["LOGGING", "ANSI_ENABLED"] => self.config.logging.ansi_enabled = flag()?,

            _ => return Err(ConfigError::env_parse_error(key, "unknown configuration key")),
        }

        Ok(())
    }
}

fn merge(base: &mut Value, layer: Value) {
    match (base, layer) {
        (Value::Object(base), Value::Object(layer)) => {
            for (key, value) in layer {
                match base.get_mut(&key) {
                    Some(existing) => merge(existing, value),
                    None => {
                        base.insert(key, value);
                    }
                }
            }
        }
        (base, layer) => *base = layer,
    }
}

fn parse_bool(s: &str) -> Option<bool> {
    match s.to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_loader_defaults() {
        let config = ConfigLoader::new().load().unwrap();
        assert_eq!(config, VigilConfig::default());
    }

    #[test]
    fn test_file_layer_keeps_preset_values() {
        let config = ConfigLoader::new()
            .with_development()
            .with_string("[validation]\nvalidate_responses = false", "toml")
            .unwrap()
            .load()
            .unwrap();
        assert!(!config.validation.validate_responses);
        assert!(config.validation.validate_requests);
        assert_eq!(config.logging.level, "debug");
    }

    #[test]
    fn test_json_string() {
        let config = ConfigLoader::new()
            .with_string(r#"{"docs": {"servers": ["https://api.example.com"]}}"#, "json")
            .unwrap()
            .load()
            .unwrap();
        assert_eq!(config.docs.servers, vec!["https://api.example.com"]);
    }

    #[test]
    fn test_unknown_key_rejected() {
        let result = ConfigLoader::new().with_string("[docs]\nlogo = \"x.png\"", "toml");
        assert!(matches!(result, Err(ConfigError::JsonError(_))));
    }

    #[test]
    fn test_unsupported_format() {
        let result = ConfigLoader::new().with_string("a: 1", "yaml");
        assert!(matches!(result, Err(ConfigError::UnsupportedFormat(_))));
    }

    #[test]
    fn test_file_loading() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(file, "[docs]\ntitle = \"Inventory\"\nversion = \"2.1.0\"").unwrap();

        let config = ConfigLoader::new().with_file(file.path()).unwrap().load().unwrap();
        assert_eq!(config.docs.title, "Inventory");
        assert_eq!(config.docs.version, "2.1.0");
        assert_eq!(config.docs.openapi, "3.0.0");
    }

    #[test]
    fn test_missing_files() {
        assert!(matches!(
            ConfigLoader::new().with_file("/nonexistent/vigil.toml"),
            Err(ConfigError::FileNotFound { .. })
        ));
        let config = ConfigLoader::new()
            .with_optional_file("/nonexistent/vigil.toml")
            .unwrap()
            .load()
            .unwrap();
        assert_eq!(config, VigilConfig::default());
    }

    #[test]
    fn test_dotenv_file_feeds_env_overrides() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "VIGILDOTENVTEST__DOCS__TITLE=From Env").unwrap();
        writeln!(file, "VIGILDOTENVTEST__VALIDATION__LOG_REJECTIONS=off").unwrap();

        let config = ConfigLoader::new()
            .with_dotenv_file(file.path())
            .unwrap()
            .with_env_prefix("VIGILDOTENVTEST")
            .load()
            .unwrap();
        assert_eq!(config.docs.title, "From Env");
        assert!(!config.validation.log_rejections);
    }

    #[test]
    fn test_apply_env_vars() {
        let mut loader = ConfigLoader::new();
        loader
            .apply_env_var("T__VALIDATION__VALIDATE_RESPONSES", "false", "T")
            .unwrap();
        loader
            .apply_env_var("T__DOCS__SERVERS", "https://a.example, https://b.example", "T")
            .unwrap();
        loader.apply_env_var("T__LOGGING__FORMAT", "pretty", "T").unwrap();
        loader.apply_env_var("T__DOCS__DESCRIPTION", "", "T").unwrap();

        let config = loader.load_unvalidated();
        assert!(!config.validation.validate_responses);
        assert_eq!(config.docs.servers, vec!["https://a.example", "https://b.example"]);
        assert_eq!(config.logging.format, LogFormat::Pretty);
        assert!(config.docs.description.is_none());
    }

    #[test]
    fn test_apply_env_var_errors() {
        let mut loader = ConfigLoader::new();
        assert!(loader
            .apply_env_var("T__VALIDATION__VALIDATE_REQUESTS", "maybe", "T")
            .is_err());
        assert!(loader.apply_env_var("T__DOCS__LOGO", "x", "T").is_err());
        assert!(loader.apply_env_var("T__LOGGING__FORMAT", "xml", "T").is_err());
    }

    #[test]
    fn test_parse_bool() {
        assert_eq!(parse_bool("TRUE"), Some(true));
        assert_eq!(parse_bool("on"), Some(true));
        assert_eq!(parse_bool("0"), Some(false));
        assert_eq!(parse_bool("maybe"), None);
    }

    #[test]
    fn test_merge_nested() {
        let mut base = serde_json::json!({"a": {"b": 1, "c": 2}, "d": 3});
        merge(&mut base, serde_json::json!({"a": {"c": 20}, "e": 5}));
        assert_eq!(base, serde_json::json!({"a": {"b": 1, "c": 20}, "d": 3, "e": 5}));
    }
}
