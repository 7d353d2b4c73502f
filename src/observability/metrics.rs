//! Metrics collection and exposition.
//!
//! # Metrics
//! - `dispatch_requests_total` (counter): dispatched requests by route, status
//! - `dispatch_duration_seconds` (histogram): end-to-end pipeline latency by route
//! - `dispatch_resolutions_total` (counter): parameter resolutions by kind, outcome
//!
//! # Design Decisions
//! - Recording is a no-op until an exporter is installed
//! - Labels for route (`Controller.method`), never the raw path

use std::net::SocketAddr;
use std::time::Instant;

use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

/// Install the Prometheus exporter with its own HTTP listener.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!(address = %addr, "Metrics exporter listening");
    Ok(())
}

pub fn record_dispatch(route: &str, status: u16, start: Instant) {
    let route = route.to_string();
    metrics::counter!(
        "dispatch_requests_total",
        "route" => route.clone(),
        "status" => status.to_string()
    )
    .increment(1);
    metrics::histogram!("dispatch_duration_seconds", "route" => route)
        .record(start.elapsed().as_secs_f64());
}

pub fn record_resolution(kind: &'static str, outcome: &'static str) {
    metrics::counter!("dispatch_resolutions_total", "kind" => kind, "outcome" => outcome).increment(1);
}
