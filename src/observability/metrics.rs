//! Metrics collection and exposition.
//!
//! # Metrics
//! - `rpc_service_up` (gauge): 1 while listening, 0 once stopped
//! - `rpc_service_starts_total` (counter): successful starts, by tls
//! - `rpc_service_stops_total` (counter): completed stops, by outcome
//! - `rpc_service_drain_duration_seconds` (histogram): time spent draining
//!
//! # Design Decisions
//! - Recorded through the `metrics` facade; without an installed recorder
//!   every call is a no-op
//! - The Prometheus exporter is opt-in and installed by the binary

use std::net::SocketAddr;
use std::time::Duration;

use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

use crate::lifecycle::StopOutcome;

/// Install the Prometheus recorder with an HTTP scrape listener on `addr`.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!(address = %addr, "Metrics exporter listening");
    Ok(())
}

pub fn record_started(service: &str, tls: bool) {
    let service = service.to_string();
    gauge!("rpc_service_up", "service" => service.clone()).set(1.0);
    counter!(
        "rpc_service_starts_total",
        "service" => service,
        "tls" => if tls { "true" } else { "false" }
    )
    .increment(1);
}

pub fn record_stopped(service: &str, outcome: StopOutcome, drain: Duration) {
    let service = service.to_string();
    gauge!("rpc_service_up", "service" => service.clone()).set(0.0);
    counter!(
        "rpc_service_stops_total",
        "service" => service.clone(),
        "outcome" => outcome.as_label()
    )
    .increment(1);
    histogram!("rpc_service_drain_duration_seconds", "service" => service)
        .record(drain.as_secs_f64());
}
