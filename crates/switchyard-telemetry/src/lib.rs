//! Structured logging and request metrics for Switchyard.
//!
//! - **Logging**: `tracing-subscriber` with an env filter and JSON or
//!   pretty output
//! - **Metrics**: Prometheus exposition via the `metrics` facade
//!
//! # Standard Metrics
//!
//! | Metric | Type | Labels | Description |
//! |--------|------|--------|-------------|
//! | `switchyard_requests_total` | Counter | `method`, `outcome` | Dispatched requests |
//! | `switchyard_request_duration_seconds` | Histogram | `outcome` | Dispatch latency |
//! | `switchyard_open_connections` | Gauge | - | Connections being served |
//!
//! # Example
//!
//! ```rust,ignore
//! use switchyard_telemetry::{init_telemetry, TelemetryConfig};
//!
//! #[tokio::main]
//! async fn main() {
//!     init_telemetry(&TelemetryConfig::default()).expect("telemetry");
//! }
//! ```

#![warn(missing_docs)]

pub mod error;
pub mod logging;
pub mod metrics;

pub use error::TelemetryError;
pub use logging::{init_logging, LogConfig, LogFormat};
pub use metrics::{init_metrics, record_request, ConnectionGauge, MetricsConfig};

/// Result type for telemetry operations.
pub type TelemetryResult<T> = Result<T, TelemetryError>;

/// Configuration for all telemetry subsystems.
#[derive(Debug, Clone, Default)]
pub struct TelemetryConfig {
    /// Logging configuration.
    pub logging: LogConfig,

    /// Metrics configuration.
    pub metrics: MetricsConfig,
}

/// Initializes logging, then metrics.
///
/// # Errors
///
/// Returns the first subsystem error.
pub fn init_telemetry(config: &TelemetryConfig) -> TelemetryResult<()> {
    init_logging(&config.logging)?;
    init_metrics(&config.metrics)?;
    Ok(())
}
