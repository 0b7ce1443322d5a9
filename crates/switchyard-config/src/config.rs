//! Configuration schema.
//!
//! Every section and field has a default, so a file only needs the keys it
//! changes. Unknown keys are rejected.

use std::net::SocketAddr;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use switchyard_server::{
    ServerConfig, DEFAULT_MAX_HEADER_BYTES, DEFAULT_READ_TIMEOUT_SECS,
    DEFAULT_SHUTDOWN_TIMEOUT_SECS, DEFAULT_WRITE_TIMEOUT_SECS, MIN_HEADER_BYTES,
};
use switchyard_telemetry::logging::create_env_filter;
use switchyard_telemetry::{LogConfig, LogFormat, MetricsConfig, TelemetryConfig};

use crate::ConfigError;

/// Root configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SwitchyardConfig {
    /// HTTP listener settings.
    pub server: ServerSection,

    /// Log output settings.
    pub logging: LoggingSection,

    /// Prometheus exporter settings.
    pub metrics: MetricsSection,
}

/// `[server]`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ServerSection {
    /// Interface to bind.
    pub host: String,

    /// Port to bind.
    pub port: u16,

    /// Header read and body collection limit.
    pub read_timeout_secs: u64,

    /// Dispatch limit per request.
    pub write_timeout_secs: u64,

    /// Grace period for open connections on shutdown.
    pub shutdown_timeout_secs: u64,

    /// Largest accepted request head.
    pub max_header_bytes: usize,
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            read_timeout_secs: DEFAULT_READ_TIMEOUT_SECS,
            write_timeout_secs: DEFAULT_WRITE_TIMEOUT_SECS,
            shutdown_timeout_secs: DEFAULT_SHUTDOWN_TIMEOUT_SECS,
            max_header_bytes: DEFAULT_MAX_HEADER_BYTES,
        }
    }
}

impl ServerSection {
    /// `host:port`, bracketing IPv6 hosts.
    #[must_use]
    pub fn addr(&self) -> String {
        if self.host.contains(':') && !self.host.starts_with('[') {
            format!("[{}]:{}", self.host, self.port)
        } else {
            format!("{}:{}", self.host, self.port)
        }
    }
}

/// `[logging]`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LoggingSection {
    /// Whether to install a subscriber at all.
    pub enabled: bool,

    /// `EnvFilter` directive.
    pub level: String,

    /// `json` or `pretty`.
    pub format: String,
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self {
            enabled: true,
            level: "info".to_string(),
            format: LogFormat::Json.to_string(),
        }
    }
}

/// `[metrics]`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MetricsSection {
    /// Whether to start the exporter.
    pub enabled: bool,

    /// Scrape endpoint address.
    pub addr: String,
}

impl Default for MetricsSection {
    fn default() -> Self {
        let defaults = MetricsConfig::default();
        Self {
            enabled: defaults.enabled,
            addr: defaults.addr,
        }
    }
}

impl SwitchyardConfig {
    /// Debug logging in pretty format.
    #[must_use]
    pub fn development() -> Self {
        Self {
            logging: LoggingSection {
                level: "debug".to_string(),
                format: LogFormat::Pretty.to_string(),
                ..LoggingSection::default()
            },
            ..Self::default()
        }
    }

    /// JSON logging with metrics exported.
    #[must_use]
    pub fn production() -> Self {
        Self {
            metrics: MetricsSection {
                enabled: true,
                ..MetricsSection::default()
            },
            ..Self::default()
        }
    }

    /// Checks every value that would otherwise fail at startup.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidValue`] for the first bad field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let addr = self.server.addr();
        if addr.parse::<SocketAddr>().is_err() {
            return Err(ConfigError::invalid_value(
                "server.host",
                format!("invalid socket address: {addr}"),
            ));
        }

        for (field, secs) in [
            ("server.read_timeout_secs", self.server.read_timeout_secs),
            ("server.write_timeout_secs", self.server.write_timeout_secs),
            ("server.shutdown_timeout_secs", self.server.shutdown_timeout_secs),
        ] {
            if secs == 0 {
                return Err(ConfigError::invalid_value(field, "must be greater than zero"));
            }
        }

        if self.server.max_header_bytes < MIN_HEADER_BYTES {
            return Err(ConfigError::invalid_value(
                "server.max_header_bytes",
                format!("must be at least {MIN_HEADER_BYTES}"),
            ));
        }

        if let Err(e) = create_env_filter(&self.logging.level) {
            return Err(ConfigError::invalid_value("logging.level", e.to_string()));
        }
        if let Err(e) = self.logging.format.parse::<LogFormat>() {
            return Err(ConfigError::invalid_value("logging.format", e.to_string()));
        }

        if self.metrics.enabled && self.metrics.addr.parse::<SocketAddr>().is_err() {
            return Err(ConfigError::invalid_value(
                "metrics.addr",
                format!("invalid socket address: {}", self.metrics.addr),
            ));
        }

        Ok(())
    }

    /// Transport settings for [`switchyard_server::Server::bind`].
    #[must_use]
    pub fn server_config(&self) -> ServerConfig {
        ServerConfig::builder()
            .http_addr(self.server.addr())
            .read_timeout(Duration::from_secs(self.server.read_timeout_secs))
            .write_timeout(Duration::from_secs(self.server.write_timeout_secs))
            .shutdown_timeout(Duration::from_secs(self.server.shutdown_timeout_secs))
            .max_header_bytes(self.server.max_header_bytes)
            .build()
    }

    /// Logging settings.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidValue`] if the format is unknown.
    pub fn log_config(&self) -> Result<LogConfig, ConfigError> {
        let format = self
            .logging
            .format
            .parse::<LogFormat>()
            .map_err(|e| ConfigError::invalid_value("logging.format", e.to_string()))?;

        Ok(LogConfig {
            enabled: self.logging.enabled,
            level: self.logging.level.clone(),
            format,
            file_line_info: format == LogFormat::Pretty,
            ..LogConfig::default()
        })
    }

    /// Metrics settings.
    #[must_use]
    pub fn metrics_config(&self) -> MetricsConfig {
        MetricsConfig {
            enabled: self.metrics.enabled,
            addr: self.metrics.addr.clone(),
            ..MetricsConfig::default()
        }
    }

    /// Logging and metrics together, for [`switchyard_telemetry::init_telemetry`].
    ///
    /// # Errors
    ///
    /// See [`SwitchyardConfig::log_config`].
    pub fn telemetry_config(&self) -> Result<TelemetryConfig, ConfigError> {
        Ok(TelemetryConfig {
            logging: self.log_config()?,
            metrics: self.metrics_config(),
        })
    }
}
