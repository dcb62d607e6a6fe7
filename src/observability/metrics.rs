//! Metrics collection and exposition.
//!
//! # Metrics
//! - `connectivity_probes_total` (counter): probes by outcome
//! - `connectivity_status` (gauge): 0=offline, 1=online, 2=online_unconfirmed
//! - `connectivity_consecutive_errors` (gauge): current error streak
//! - `connectivity_notifications_total` (counter): callback invocations by result
//! - `connectivity_scheduler_paused_total` (counter): backoff pauses entered

use std::net::SocketAddr;
use metrics::{counter, gauge};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

use crate::status::{ConnectivityStatus, ProbeOutcome};

/// Install the Prometheus recorder and its scrape listener.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!(address = %addr, "Metrics exporter listening");
    Ok(())
}

pub fn record_probe(outcome: ProbeOutcome) {
    counter!("connectivity_probes_total", "outcome" => outcome.as_str()).increment(1);
}

pub fn record_status(status: ConnectivityStatus, consecutive_errors: u32) {
    gauge!("connectivity_status").set(status.as_gauge());
    gauge!("connectivity_consecutive_errors").set(f64::from(consecutive_errors));
}

pub fn record_notifications(delivered: usize, failed: usize) {
    counter!("connectivity_notifications_total", "result" => "delivered")
        .increment(delivered as u64);
    counter!("connectivity_notifications_total", "result" => "failed")
        .increment(failed as u64);
}

pub fn record_pause() {
    counter!("connectivity_scheduler_paused_total").increment(1);
}
