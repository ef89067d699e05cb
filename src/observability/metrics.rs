//! Metrics collection and exposition.
//!
//! # Metrics
//! - `vhost_index_builds_total` (counter): generation builds by result
//! - `vhost_index_generation` (gauge): number of the active generation
//! - `vhost_index_lookups_total` (counter): resolutions by match category
//!
//! # Design Decisions
//! - Recorded through the `metrics` facade; without an installed recorder
//!   every call is a no-op
//! - Prometheus exporter is optional and configured at startup

use std::net::SocketAddr;

use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus exporter listening on `addr`.
///
/// Must run inside a Tokio runtime.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics exporter listening"),
        Err(e) => tracing::error!(error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_build(result: &'static str) {
    metrics::counter!("vhost_index_builds_total", "result" => result).increment(1);
}

pub fn record_generation(number: u64) {
    metrics::gauge!("vhost_index_generation").set(number as f64);
}

pub fn record_lookup(matched: &'static str) {
    metrics::counter!("vhost_index_lookups_total", "match" => matched).increment(1);
}
