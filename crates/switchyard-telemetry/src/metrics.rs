//! Prometheus metrics for Switchyard.
//!
//! Recording goes through the `metrics` facade, so the functions here are
//! no-ops until a recorder is installed with [`init_metrics`].
//!
//! # Standard Metrics
//!
//! | Metric | Type | Labels | Description |
//! |--------|------|--------|-------------|
//! | `switchyard_requests_total` | Counter | `method`, `outcome` | Dispatched requests |
//! | `switchyard_request_duration_seconds` | Histogram | `outcome` | Dispatch latency |
//! | `switchyard_open_connections` | Gauge | - | Connections being served |

use std::net::SocketAddr;
use std::time::Duration;

use metrics::{counter, describe_counter, describe_gauge, describe_histogram, gauge, histogram};
use metrics_exporter_prometheus::{Matcher, PrometheusBuilder};
use tokio::runtime::Handle;

use crate::error::TelemetryError;
use crate::TelemetryResult;

/// Counter of dispatched requests.
pub const REQUESTS_TOTAL: &str = "switchyard_requests_total";

/// Histogram of dispatch latency in seconds.
pub const REQUEST_DURATION_SECONDS: &str = "switchyard_request_duration_seconds";

/// Gauge of connections currently being served.
pub const OPEN_CONNECTIONS: &str = "switchyard_open_connections";

/// Methods that get their own `method` label; anything else is `other`.
const KNOWN_METHODS: [&str; 9] = [
    "GET", "HEAD", "POST", "PUT", "DELETE", "CONNECT", "OPTIONS", "PATCH", "TRACE",
];

/// Metrics configuration.
#[derive(Debug, Clone)]
pub struct MetricsConfig {
    /// Whether metrics are enabled.
    pub enabled: bool,

    /// Address the Prometheus scrape endpoint listens on.
    pub addr: String,

    /// Histogram buckets for request duration, in seconds.
    pub duration_buckets: Vec<f64>,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            addr: "0.0.0.0:9090".to_string(),
            // 1ms .. 10s
            duration_buckets: vec![
                0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0,
            ],
        }
    }
}

/// Installs the Prometheus recorder and starts its HTTP scrape listener.
///
/// Does nothing when `config.enabled` is false. The listener is bound before
/// this returns and is served on the current Tokio runtime, alongside the
/// recorder's periodic upkeep.
///
/// # Errors
///
/// Returns [`TelemetryError::InvalidAddress`] for an unparsable address and
/// [`TelemetryError::MetricsInit`] when no Tokio runtime is running, the
/// address cannot be bound, or a global recorder is already installed.
pub fn init_metrics(config: &MetricsConfig) -> TelemetryResult<()> {
    if !config.enabled {
        return Ok(());
    }

    let addr: SocketAddr = config
        .addr
        .parse()
        .map_err(|e| TelemetryError::InvalidAddress(format!("{}: {e}", config.addr)))?;

    let runtime = Handle::try_current()
        .map_err(|e| TelemetryError::MetricsInit(format!("no Tokio runtime: {e}")))?;

    let (recorder, exporter) = {
        let _entered = runtime.enter();
        builder(config)?
            .with_http_listener(addr)
            .build()
            .map_err(|e| TelemetryError::MetricsInit(e.to_string()))?
    };

    metrics::set_global_recorder(recorder)
        .map_err(|e| TelemetryError::MetricsInit(e.to_string()))?;

    runtime.spawn(async move {
        if let Err(e) = exporter.await {
            tracing::error!(error = ?e, "metrics exporter stopped");
        }
    });

    describe_metrics();
    tracing::info!(%addr, "metrics endpoint listening");

    Ok(())
}

fn builder(config: &MetricsConfig) -> TelemetryResult<PrometheusBuilder> {
    let builder = PrometheusBuilder::new();
    if config.duration_buckets.is_empty() {
        return Ok(builder);
    }
    builder
        .set_buckets_for_metric(
            Matcher::Full(REQUEST_DURATION_SECONDS.to_string()),
            &config.duration_buckets,
        )
        .map_err(|e| TelemetryError::MetricsInit(e.to_string()))
}

fn describe_metrics() {
    describe_counter!(REQUESTS_TOTAL, "Total number of requests dispatched");
    describe_histogram!(
        REQUEST_DURATION_SECONDS,
        metrics::Unit::Seconds,
        "Time from dispatch start to handler return"
    );
    describe_gauge!(OPEN_CONNECTIONS, "Number of connections currently being served");
}

/// Records one dispatched request.
///
/// `outcome` is the dispatch state the request ended in (`handled`,
/// `not_found`, `aborted`). Extension methods are labelled `other`.
pub fn record_request(method: &str, outcome: &'static str, duration: Duration) {
    counter!(
        REQUESTS_TOTAL,
        "method" => method_label(method),
        "outcome" => outcome
    )
    .increment(1);

    histogram!(REQUEST_DURATION_SECONDS, "outcome" => outcome).record(duration.as_secs_f64());
}

fn method_label(method: &str) -> &'static str {
    KNOWN_METHODS
        .iter()
        .find(|&&known| known == method)
        .copied()
        .unwrap_or("other")
}

/// Keeps [`OPEN_CONNECTIONS`] raised while alive.
#[derive(Debug)]
pub struct ConnectionGauge {
    _private: (),
}

impl ConnectionGauge {
    /// Increments the gauge; dropping the value decrements it again.
    #[must_use]
    pub fn open() -> Self {
        gauge!(OPEN_CONNECTIONS).increment(1.0);
        Self { _private: () }
    }
}

impl Drop for ConnectionGauge {
    fn drop(&mut self) {
        gauge!(OPEN_CONNECTIONS).decrement(1.0);
    }
}

#[cfg(test)]
mod tests {
    use tokio::io::{AsyncReadExt, AsyncWriteExt};

    use super::*;

    #[test]
    fn test_default_config() {
        let config = MetricsConfig::default();
        assert!(!config.enabled);
        assert_eq!(config.addr, "0.0.0.0:9090");
        assert!(!config.duration_buckets.is_empty());
    }

    #[test]
    fn test_disabled_is_noop() {
        assert!(init_metrics(&MetricsConfig::default()).is_ok());
    }

    #[test]
    fn test_invalid_address() {
        let config = MetricsConfig {
            enabled: true,
            addr: "not an address".to_string(),
            ..MetricsConfig::default()
        };

        assert!(matches!(
            init_metrics(&config),
            Err(TelemetryError::InvalidAddress(_))
        ));
    }

    #[test]
    fn test_record_request_renders() {
        let recorder = builder(&MetricsConfig::default()).unwrap().build_recorder();
        let handle = recorder.handle();

        metrics::with_local_recorder(&recorder, || {
            record_request("GET", "handled", Duration::from_millis(3));
            record_request("GET", "not_found", Duration::from_millis(1));
            let _gauge = ConnectionGauge::open();
        });

        let rendered = handle.render();
        assert!(rendered.contains(r#"switchyard_requests_total{method="GET",outcome="handled"}"#));
        assert!(rendered.contains(r#"outcome="not_found""#));
        assert!(rendered.contains("switchyard_request_duration_seconds_bucket"));
        assert!(rendered.contains(OPEN_CONNECTIONS));
    }

    #[test]
    fn test_extension_methods_share_a_label() {
        assert_eq!(method_label("GET"), "GET");
        assert_eq!(method_label("PATCH"), "PATCH");
        assert_eq!(method_label("PURGE"), "other");
        assert_eq!(method_label("get"), "other");

        let recorder = builder(&MetricsConfig::default()).unwrap().build_recorder();
        let handle = recorder.handle();

        metrics::with_local_recorder(&recorder, || {
            record_request("PURGE", "handled", Duration::from_millis(1));
            record_request("X-RANDOM-1", "not_found", Duration::from_millis(1));
        });

        let rendered = handle.render();
        assert!(rendered.contains(r#"method="other""#));
        assert!(!rendered.contains("PURGE"));
        assert!(!rendered.contains("X-RANDOM-1"));
    }

    #[test]
    fn test_enabled_without_runtime_is_an_error() {
        let config = MetricsConfig {
            enabled: true,
            addr: "127.0.0.1:0".to_string(),
            ..MetricsConfig::default()
        };

        assert!(matches!(
            init_metrics(&config),
            Err(TelemetryError::MetricsInit(_))
        ));
    }

    #[tokio::test]
    async fn test_enabled_serves_scrape_endpoint() {
        let port = std::net::TcpListener::bind("127.0.0.1:0")
            .unwrap()
            .local_addr()
            .unwrap()
            .port();
        let config = MetricsConfig {
            enabled: true,
            addr: format!("127.0.0.1:{port}"),
            ..MetricsConfig::default()
        };

        init_metrics(&config).unwrap();
        record_request("GET", "handled", Duration::from_millis(2));

        let mut stream = tokio::net::TcpStream::connect(("127.0.0.1", port))
            .await
            .unwrap();
        stream
            .write_all(b"GET /metrics HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n")
            .await
            .unwrap();
        let mut response = String::new();
        stream.read_to_string(&mut response).await.unwrap();

        assert!(response.starts_with("HTTP/1.1 200"));
        assert!(response.contains(REQUESTS_TOTAL));
    }

    #[test]
    fn test_record_without_recorder_does_not_panic() {
        record_request("POST", "aborted", Duration::from_millis(10));
        drop(ConnectionGauge::open());
    }
}
