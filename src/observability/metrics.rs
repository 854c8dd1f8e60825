//! Metrics collection and exposition.
//!
//! # Responsibilities
//! - Define gateway metrics (requests, latency, split decisions, upstream errors)
//! - Expose Prometheus-compatible metrics endpoint
//!
//! # Metrics
//! - `gateway_requests_total` (counter): requests by method, status, service
//! - `gateway_request_duration_seconds` (histogram): time to response headers, by service
//! - `gateway_split_decisions_total` (counter): split outcomes by rule and target
//! - `gateway_upstream_errors_total` (counter): forwarding failures by service and kind
//!
//! # Design Decisions
//! - Recording is a no-op until `init_metrics` installs the exporter
//! - Labels carry the service label, never the raw path (bounded cardinality)

use std::net::SocketAddr;
use std::time::Instant;

use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus recorder and its HTTP listener.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_request(method: &str, status: u16, service: &str, start: Instant) {
    metrics::counter!(
        "gateway_requests_total",
        "method" => method.to_string(),
        "status" => status.to_string(),
        "service" => service.to_string()
    )
    .increment(1);
    metrics::histogram!("gateway_request_duration_seconds", "service" => service.to_string())
        .record(start.elapsed().as_secs_f64());
}

pub fn record_split(rule: &str, target: &'static str) {
    metrics::counter!("gateway_split_decisions_total", "rule" => rule.to_string(), "target" => target)
        .increment(1);
}

pub fn record_upstream_error(service: &str, kind: &'static str) {
    metrics::counter!("gateway_upstream_errors_total", "service" => service.to_string(), "kind" => kind)
        .increment(1);
}
