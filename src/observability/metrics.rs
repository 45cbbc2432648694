//! Metrics collection and exposition.
//!
//! # Metrics
//! - `bracket_http_requests_total` (counter): requests by method, path, status
//! - `bracket_http_request_duration_seconds` (histogram): latency distribution
//! - `bracket_validations_total` (counter): outcomes by validation status
//! - `bracket_cluster_connected_nodes` (gauge): reachable cache nodes
//! - `bracket_cluster_quorum_met` (gauge): 1=quorum met, 0=not met
//! - `bracket_cluster_node_up` (gauge): per-node reachability
//! - `bracket_stats_events_total` (counter): stats writes by outcome
//!
//! # Design Decisions
//! - Path label uses the matched route template, never the raw URI
//! - Recording functions are free to call before `init_metrics`

use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;
use std::time::Instant;

use crate::brackets::ValidationStatus;
use crate::health::ClusterStatus;

/// Install the Prometheus recorder and its scrape listener.
pub fn init_metrics(addr: SocketAddr) {
    let builder = PrometheusBuilder::new().with_http_listener(addr);

    match builder.install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics exporter listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

/// Record one handled HTTP request.
pub fn record_request(method: &str, path: &str, status: u16, start: Instant) {
    let method = method.to_string();
    let path = path.to_string();
    let status = status.to_string();

    counter!(
        "bracket_http_requests_total",
        "method" => method.clone(),
        "path" => path.clone(),
        "status" => status.clone()
    )
    .increment(1);
    histogram!(
        "bracket_http_request_duration_seconds",
        "method" => method,
        "path" => path,
        "status" => status
    )
    .record(start.elapsed().as_secs_f64());
}

/// Record the outcome of one validation.
pub fn record_validation(status: ValidationStatus) {
    counter!("bracket_validations_total", "status" => status.as_str()).increment(1);
}

/// Publish the result of a cluster health check.
pub fn record_cluster_health(status: &ClusterStatus) {
    gauge!("bracket_cluster_connected_nodes").set(status.connected_count as f64);
    gauge!("bracket_cluster_quorum_met").set(if status.quorum_met { 1.0 } else { 0.0 });

    for node in &status.nodes {
        gauge!("bracket_cluster_node_up", "node" => node.node.clone())
            .set(if node.is_reachable() { 1.0 } else { 0.0 });
    }
}

/// Count a stats event: `recorded`, `failed` or `dropped`.
pub fn record_stats_event(outcome: &'static str) {
    counter!("bracket_stats_events_total", "outcome" => outcome).increment(1);
}
