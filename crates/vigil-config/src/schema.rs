//! Configuration section types.

use serde::{Deserialize, Serialize};

/// Switches for the validation middleware.
///
/// # Example
///
/// ```
/// use vigil_config::ValidationConfig;
///
/// let config = ValidationConfig::default();
/// assert!(config.validate_requests);
/// assert!(config.validate_responses);
/// ```
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct ValidationConfig {
    /// Validate headers, body, query, params and locals before the handler.
    #[serde(default = "default_true")]
    pub validate_requests: bool,

    /// Install the response interceptor on routes with response schemas.
    #[serde(default = "default_true")]
    pub validate_responses: bool,

    /// Log each rejected request at `debug`.
    #[serde(default = "default_true")]
    pub log_rejections: bool,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            validate_requests: true,
            validate_responses: true,
            log_rejections: true,
        }
    }
}

/// Defaults for the generated OpenAPI document.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct DocsSection {
    /// OpenAPI version string.
    #[serde(default = "default_openapi")]
    pub openapi: String,

    /// API title.
    #[serde(default = "default_title")]
    pub title: String,

    /// API version.
    #[serde(default = "default_version")]
    pub version: String,

    /// API description.
    #[serde(default = "default_description")]
    pub description: Option<String>,

    /// Server URLs.
    #[serde(default)]
    pub servers: Vec<String>,
}

impl Default for DocsSection {
    fn default() -> Self {
        Self {
            openapi: default_openapi(),
            title: default_title(),
            version: default_version(),
            description: default_description(),
            servers: Vec::new(),
        }
    }
}

fn default_openapi() -> String {
    "3.0.0".to_string()
}

fn default_title() -> String {
    "API".to_string()
}

fn default_version() -> String {
    "1.0.0".to_string()
}

#[allow(clippy::unnecessary_wraps)]
fn default_description() -> Option<String> {
    Some("Auto Generated API by vigil".to_string())
}

fn default_true() -> bool {
    true
}
