//! Metrics collection and exposition.
//!
//! # Responsibilities
//! - Define router metrics (requests, latency, resolutions, store queries)
//! - Expose Prometheus-compatible metrics endpoint
//!
//! # Metrics
//! - `identity_router_requests_total` (counter): requests by status, outcome
//! - `identity_router_request_duration_seconds` (histogram): latency distribution
//! - `identity_router_resolutions_total` (counter): matched / unmatched / error
//! - `identity_router_store_queries_total` (counter): membership queries by table
//!
//! # Design Decisions
//! - Low-overhead metric updates through the `metrics` facade
//! - Without an installed exporter every call is a no-op

use std::net::SocketAddr;
use std::time::Instant;

use metrics::{counter, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus exporter with its own HTTP listener.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics exporter listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

/// Record a finished request.
pub fn record_request(status: u16, outcome: &'static str, start: Instant) {
    counter!(
        "identity_router_requests_total",
        "status" => status.to_string(),
        "outcome" => outcome
    )
    .increment(1);
    histogram!("identity_router_request_duration_seconds").record(start.elapsed().as_secs_f64());
}

/// Record a resolution outcome ("matched", "unmatched" or "error").
pub fn record_resolution(result: &'static str) {
    counter!("identity_router_resolutions_total", "result" => result).increment(1);
}

/// Record one membership query.
pub fn record_store_query(table: &str) {
    counter!("identity_router_store_queries_total", "table" => table.to_string()).increment(1);
}
