//! Typed configuration for Vigil.
//!
//! [`VigilConfig`] has three sections:
//!
//! - [`ValidationConfig`]: which checks the validation middleware runs
//! - [`DocsSection`]: defaults for the generated OpenAPI document
//! - [`LogConfig`](vigil_telemetry::LogConfig): subscriber setup
//!
//! Sections reject unknown fields. [`ConfigLoader`] layers defaults or a
//! preset, TOML/JSON files, and `PREFIX__SECTION__KEY` environment
//! variables.
//!
//! # Configuration File Format
//!
//! ```toml
//! [validation]
//! validate_requests = true
//! validate_responses = true
//! log_rejections = true
//!
//! [docs]
//! openapi = "3.0.0"
//! title = "Orders API"
//! version = "1.4.0"
//! servers = ["https://api.example.com"]
//!
//! [logging]
//! level = "info,vigil_middleware=debug"
//! format = "json"
//! ```
//!
//! # Environment Variable Overrides
//!
//! - `VIGIL__VALIDATION__VALIDATE_RESPONSES=false`
//! - `VIGIL__DOCS__SERVERS=https://a.example,https://b.example`
//! - `VIGIL__LOGGING__FORMAT=pretty`

#![doc(html_root_url = "https://docs.rs/vigil-config/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod config;
mod error;
mod loader;
mod schema;

pub use config::VigilConfig;
pub use error::ConfigError;
pub use loader::ConfigLoader;
pub use schema::{DocsSection, ValidationConfig};
pub use vigil_telemetry::{LogConfig, LogFormat};
