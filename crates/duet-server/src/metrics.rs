//! Metrics collection and export for Duet.
//!
//! Uses the `metrics` crate for instrumentation and exports
//! to Prometheus format.

use duet_core::SessionStats;
use metrics::{counter, gauge};
use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;
use tracing::info;

/// Metric names.
pub mod names {
    pub const CONNECTIONS_TOTAL: &str = "duet_connections_total";
    pub const CONNECTIONS_ACTIVE: &str = "duet_connections_active";
    pub const MATCH_REQUESTS_TOTAL: &str = "duet_match_requests_total";
    pub const SESSIONS_ACTIVE: &str = "duet_sessions_active";
    pub const WAITING_DEPTH: &str = "duet_waiting_depth";
    pub const RELAYED_TOTAL: &str = "duet_relayed_total";
    pub const RELAY_DROPPED_TOTAL: &str = "duet_relay_dropped_total";
    pub const ERRORS_TOTAL: &str = "duet_errors_total";
}

/// Initialize the metrics system.
pub fn init_metrics() {
    metrics::describe_counter!(
        names::CONNECTIONS_TOTAL,
        "Total number of connections since server start"
    );
    metrics::describe_gauge!(
        names::CONNECTIONS_ACTIVE,
        "Current number of active connections"
    );
    metrics::describe_counter!(names::MATCH_REQUESTS_TOTAL, "Total number of match requests");
    metrics::describe_gauge!(names::SESSIONS_ACTIVE, "Current number of active sessions");
    metrics::describe_gauge!(
        names::WAITING_DEPTH,
        "Current number of connections waiting for a partner"
    );
    metrics::describe_counter!(names::RELAYED_TOTAL, "Total number of relayed payloads");
    metrics::describe_counter!(
        names::RELAY_DROPPED_TOTAL,
        "Total number of payloads dropped by the relay precondition"
    );
    metrics::describe_counter!(names::ERRORS_TOTAL, "Total number of errors");

    info!("Metrics initialized");
}

/// Start the Prometheus metrics server.
///
/// # Errors
///
/// Returns an error if the server cannot be started.
pub fn start_metrics_server(port: u16) -> Result<(), Box<dyn std::error::Error>> {
    let addr: SocketAddr = format!("0.0.0.0:{}", port).parse()?;

    PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()?;

    info!("Metrics server listening on {}", addr);
    Ok(())
}

/// Record a new connection.
pub fn record_connection() {
    counter!(names::CONNECTIONS_TOTAL).increment(1);
    gauge!(names::CONNECTIONS_ACTIVE).increment(1.0);
}

/// Record a disconnection.
pub fn record_disconnection() {
    gauge!(names::CONNECTIONS_ACTIVE).decrement(1.0);
}

/// Record a match request.
pub fn record_match_request() {
    counter!(names::MATCH_REQUESTS_TOTAL).increment(1);
}

/// Record a relay attempt, labelled by payload kind.
pub fn record_relay(kind: &str, delivered: bool) {
    if delivered {
        counter!(names::RELAYED_TOTAL, "kind" => kind.to_string()).increment(1);
    } else {
        counter!(names::RELAY_DROPPED_TOTAL, "kind" => kind.to_string()).increment(1);
    }
}

/// Update the session and waiting-depth gauges from manager stats.
pub fn update_session_gauges(stats: &SessionStats) {
    gauge!(names::SESSIONS_ACTIVE).set(stats.sessions as f64);
    gauge!(names::WAITING_DEPTH).set(stats.waiting as f64);
}

/// Record an error.
pub fn record_error(error_type: &str) {
    counter!(names::ERRORS_TOTAL, "type" => error_type.to_string()).increment(1);
}

/// Metrics guard that records disconnection on drop.
pub struct ConnectionMetricsGuard;

impl ConnectionMetricsGuard {
    /// Create a new metrics guard, recording a connection.
    #[must_use]
    pub fn new() -> Self {
        record_connection();
        Self
    }
}

impl Default for ConnectionMetricsGuard {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for ConnectionMetricsGuard {
    fn drop(&mut self) {
        record_disconnection();
    }
}
