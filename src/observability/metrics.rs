//! Metrics collection and exposition.
//!
//! # Metrics
//! - `router_resolutions_total` (counter): route resolutions by outcome
//!   (`matched`, `empty`, `ambiguous`)
//! - `navigation_resolutions_total` (counter): navigation results by winning
//!   scope, or `none`
//! - `navigation_conflicts_total` (counter): conflicting navigation targets
//! - `catalog_builds_total` (counter): catalog builds by kind
//! - `registry_reloads_total` (counter): declaration reloads by result

use std::net::SocketAddr;

use metrics_exporter_prometheus::PrometheusBuilder;

/// Start the Prometheus exporter on `addr`.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics exporter listening"),
        Err(e) => tracing::error!(error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_route_resolution(outcome: &'static str) {
    ::metrics::counter!("router_resolutions_total", "outcome" => outcome).increment(1);
}

pub fn record_navigation(scope: &'static str) {
    ::metrics::counter!("navigation_resolutions_total", "scope" => scope).increment(1);
}

pub fn record_navigation_conflict() {
    ::metrics::counter!("navigation_conflicts_total").increment(1);
}

pub fn record_catalog_build(kind: &'static str) {
    ::metrics::counter!("catalog_builds_total", "kind" => kind).increment(1);
}

pub fn record_reload(result: &'static str) {
    ::metrics::counter!("registry_reloads_total", "result" => result).increment(1);
}
