//! Metrics collection and exposition.
//!
//! # Metrics
//! - `mirror_notifications_total` (counter): notifications by outcome
//!   (`dispatched`, `delivered`, `failed`, `dropped`)
//! - `mirror_requests_skipped_total` (counter): exchanges or emissions not
//!   mirrored, by reason (`method`, `duplicate`, `non_text`)
//!
//! Without an installed recorder every call is a no-op.

use std::net::SocketAddr;

use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus exporter listening on `addr`.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics exporter listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_notification(outcome: &'static str) {
    metrics::counter!("mirror_notifications_total", "outcome" => outcome).increment(1);
}

pub fn record_skipped(reason: &'static str) {
    metrics::counter!("mirror_requests_skipped_total", "reason" => reason).increment(1);
}
