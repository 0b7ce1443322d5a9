//! Layered configuration for Switchyard servers.
//!
//! # Layers
//!
//! 1. Defaults, or the `development` / `production` presets
//! 2. A TOML or JSON file (unknown keys rejected)
//! 3. Environment overrides: `SWITCHYARD__SERVER__PORT=9000`
//!
//! # Example
//!
//! ```toml
//! [server]
//! host = "0.0.0.0"
//! port = 8080
//! read_timeout_secs = 60
//! write_timeout_secs = 60
//! shutdown_timeout_secs = 30
//! max_header_bytes = 1048576
//!
//! [logging]
//! level = "info"
//! format = "json"
//!
//! [metrics]
//! enabled = true
//! addr = "0.0.0.0:9090"
//! ```

#![warn(missing_docs)]

mod config;
mod error;
mod loader;

pub use config::{LoggingSection, MetricsSection, ServerSection, SwitchyardConfig};
pub use error::ConfigError;
pub use loader::ConfigLoader;
