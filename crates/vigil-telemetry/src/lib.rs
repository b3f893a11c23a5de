//! # Vigil Telemetry
//!
//! Logging setup for services built on Vigil.
//!
//! The validation middleware logs through `tracing`: rejected requests at
//! `debug`, configuration and internal faults at `error`. This crate installs
//! a subscriber that renders those events as JSON (production) or pretty
//! text (development).
//!
//! ```rust,no_run
//! use vigil_telemetry::{init_logging, LogConfig};
//!
//! init_logging(&LogConfig::production()).expect("logging");
//! ```

#![doc(html_root_url = "https://docs.rs/vigil-telemetry/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod error;
pub mod logging;

pub use error::{TelemetryError, TelemetryResult};
pub use logging::{create_env_filter, fields, init_logging, LogConfig, LogFormat};
