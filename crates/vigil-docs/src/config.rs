//! Document-level configuration.

use crate::error::{DocsError, DocsResult};
use crate::openapi::{Info, Server};
use serde::{Deserialize, Serialize};
use vigil_config::DocsSection;

/// Top-level fields merged into the generated document.
///
/// Every field has a default:
///
/// | Field | Default |
/// |---|---|
/// | `openapi` | `"3.0.0"` |
/// | `info.title` | `"API"` |
/// | `info.version` | `"1.0.0"` |
/// | `info.description` | `"Auto Generated API by vigil"` |
/// | `servers` | none |
///
/// ```
/// use vigil_docs::DocsConfig;
///
/// let config = DocsConfig::default().title("Orders").server("https://api.example.com");
/// assert_eq!(config.info.title, "Orders");
/// assert_eq!(config.info.version, "1.0.0");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocsConfig {
    /// OpenAPI version string.
    pub openapi: String,
    /// API metadata.
    pub info: Info,
    /// Servers.
    pub servers: Vec<Server>,
}

impl Default for DocsConfig {
    fn default() -> Self {
        Self::from(&DocsSection::default())
    }
}

impl From<&DocsSection> for DocsConfig {
    fn from(section: &DocsSection) -> Self {
        Self {
            openapi: section.openapi.clone(),
            info: Info {
                title: section.title.clone(),
                version: section.version.clone(),
                description: section.description.clone(),
            },
            servers: section.servers.iter().map(Server::new).collect(),
        }
    }
}

impl DocsConfig {
    /// Sets the API title.
    #[must_use]
    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.info.title = title.into();
        self
    }

    /// Sets the API version.
    #[must_use]
    pub fn version(mut self, version: impl Into<String>) -> Self {
        self.info.version = version.into();
        self
    }

    /// Sets the API description.
    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.info.description = Some(description.into());
        self
    }

    /// Adds a server URL.
    #[must_use]
    pub fn server(mut self, url: impl Into<String>) -> Self {
        self.servers.push(Server::new(url));
        self
    }

    pub(crate) fn check(&self) -> DocsResult<()> {
        if !self.openapi.starts_with("3.0") {
            return Err(DocsError::InvalidConfig {
                reason: format!("unsupported OpenAPI version '{}', expected 3.0.x", self.openapi),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = DocsConfig::default();
        assert_eq!(config.openapi, "3.0.0");
        assert_eq!(config.info.title, "API");
        assert_eq!(config.info.version, "1.0.0");
        assert_eq!(
            config.info.description.as_deref(),
            Some("Auto Generated API by vigil")
        );
        assert!(config.servers.is_empty());
        assert!(config.check().is_ok());
    }

    #[test]
    fn test_from_section() {
        let section = DocsSection {
            title: "Orders".to_string(),
            servers: vec!["https://a.example".to_string(), "https://b.example".to_string()],
            ..DocsSection::default()
        };
        let config = DocsConfig::from(&section);
        assert_eq!(config.info.title, "Orders");
        assert_eq!(config.servers.len(), 2);
        assert_eq!(config.servers[1].url, "https://b.example");
    }

    #[test]
    fn test_rejects_other_major_versions() {
        let config = DocsConfig {
            openapi: "3.1.0".to_string(),
            ..DocsConfig::default()
        };
        assert!(matches!(config.check(), Err(DocsError::InvalidConfig { .. })));
    }
}
