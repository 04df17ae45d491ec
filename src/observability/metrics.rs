//! Metrics collection and exposition.
//!
//! # Metrics
//! - `chcount_connections_accepted_total` (counter)
//! - `chcount_accept_errors_total` (counter): by `kind` = transient | fatal
//! - `chcount_active_channels` (gauge): open push channels
//! - `chcount_jobs_submitted_total` (counter)
//! - `chcount_jobs_completed_total` (counter)
//! - `chcount_jobs_failed_total` (counter): by `reason`
//! - `chcount_job_duration_seconds` (histogram): spawn to end of output
//! - `chcount_results_delivered_total` (counter): by `outcome`
//!
//! Without an installed recorder every call here is a no-op.

use std::net::SocketAddr;
use std::time::Instant;

use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

/// Install the Prometheus recorder and its scrape endpoint.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!(address = %addr, "Metrics endpoint listening");
    Ok(())
}

pub fn record_connection_accepted() {
    counter!("chcount_connections_accepted_total").increment(1);
}

pub fn record_accept_error(transient: bool) {
    let kind = if transient { "transient" } else { "fatal" };
    counter!("chcount_accept_errors_total", "kind" => kind).increment(1);
}

pub fn channel_opened() {
    gauge!("chcount_active_channels").increment(1.0);
}

pub fn channel_closed() {
    gauge!("chcount_active_channels").decrement(1.0);
}

pub fn record_job_submitted() {
    counter!("chcount_jobs_submitted_total").increment(1);
}

pub fn record_job_completed(started: Instant) {
    counter!("chcount_jobs_completed_total").increment(1);
    histogram!("chcount_job_duration_seconds").record(started.elapsed().as_secs_f64());
}

pub fn record_job_failed(reason: &'static str) {
    counter!("chcount_jobs_failed_total", "reason" => reason).increment(1);
}

pub fn record_delivery(outcome: &'static str) {
    counter!("chcount_results_delivered_total", "outcome" => outcome).increment(1);
}
