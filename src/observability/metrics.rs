//! Metrics collection and exposition.
//!
//! # Metrics
//! - `gateway_requests_total` (counter): inbound requests by method, route, status
//! - `gateway_request_duration_seconds` (histogram): inbound latency
//! - `gateway_upstream_requests_total` (counter): upstream calls by upstream, status
//! - `gateway_upstream_duration_seconds` (histogram): upstream latency
//! - `gateway_upstream_errors_total` (counter): transport failures by upstream
//!
//! Recording is a no-op until a recorder is installed, so tests and
//! deployments without `metrics_enabled` pay nothing.

use std::net::SocketAddr;
use std::time::Instant;

use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus recorder and its scrape endpoint.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

/// Record a served inbound request.
pub fn record_request(method: &str, status: u16, route: &str, start: Instant) {
    let elapsed = start.elapsed().as_secs_f64();
    ::metrics::counter!(
        "gateway_requests_total",
        "method" => method.to_string(),
        "route" => route.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
    ::metrics::histogram!(
        "gateway_request_duration_seconds",
        "method" => method.to_string(),
        "route" => route.to_string()
    )
    .record(elapsed);
}

/// Record a completed upstream call, whatever its status.
pub fn record_upstream(upstream: &'static str, status: u16, start: Instant) {
    let elapsed = start.elapsed().as_secs_f64();
    ::metrics::counter!(
        "gateway_upstream_requests_total",
        "upstream" => upstream,
        "status" => status.to_string()
    )
    .increment(1);
    ::metrics::histogram!("gateway_upstream_duration_seconds", "upstream" => upstream).record(elapsed);
}

/// Record a transport-level upstream failure.
pub fn record_upstream_error(upstream: &'static str) {
    ::metrics::counter!("gateway_upstream_errors_total", "upstream" => upstream).increment(1);
}
