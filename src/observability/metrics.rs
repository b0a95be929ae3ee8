//! Metrics collection and exposition.
//!
//! # Metrics
//! - `capture_events_emitted_total` (counter): events accepted by the writer
//! - `capture_events_dropped_total` (counter): events lost, by reason
//! - `capture_chunk_mismatch_total` (counter): short/long body reads, by direction
//! - `capture_host_failures_total` (counter): failed host reads, by kind
//! - `capture_batches_published_total` (counter): batches, by outcome
//! - `capture_batch_events_total` (counter): events inside batches, by outcome

use std::net::SocketAddr;

use metrics::counter;
use metrics_exporter_prometheus::PrometheusBuilder;

/// Start the Prometheus scrape endpoint. Must run inside a Tokio runtime.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint listening"),
        Err(e) => {
            tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter")
        }
    }
}

pub fn record_event_emitted() {
    counter!("capture_events_emitted_total").increment(1);
}

pub fn record_event_dropped(reason: &'static str) {
    counter!("capture_events_dropped_total", "reason" => reason).increment(1);
}

pub fn record_chunk_mismatch(direction: &'static str) {
    counter!("capture_chunk_mismatch_total", "direction" => direction).increment(1);
}

pub fn record_host_failure(kind: &'static str) {
    counter!("capture_host_failures_total", "kind" => kind).increment(1);
}

pub fn record_batch_published(outcome: &'static str, events: usize) {
    counter!("capture_batches_published_total", "outcome" => outcome).increment(1);
    counter!("capture_batch_events_total", "outcome" => outcome).increment(events as u64);
}
