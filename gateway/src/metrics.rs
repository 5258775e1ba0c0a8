//! Prometheus metrics for the gateway

use crate::error::{GatewayError, Result};
use prometheus::{
    CounterVec, Encoder, IntGauge, TextEncoder, register_counter_vec, register_int_gauge,
};
use std::sync::OnceLock;

/// Global metrics instance
static METRICS: OnceLock<Metrics> = OnceLock::new();

/// All gateway metrics
pub struct Metrics {
    /// Events received from the watch layer (by kind, reason)
    pub events_observed: CounterVec,

    /// Events admitted and handed to emitters (by kind)
    pub events_forwarded: CounterVec,

    /// Events dropped by middleware (by kind)
    pub events_dropped: CounterVec,

    /// Failed emit calls (by emitter)
    pub emit_failures: CounterVec,

    /// Running watch streams
    pub active_watches: IntGauge,
}

impl Metrics {
    /// Initialize metrics (call once at startup)
    pub fn init() -> Result<&'static Metrics> {
        if let Some(metrics) = METRICS.get() {
            return Ok(metrics);
        }

        let metrics = Metrics {
            events_observed: register_counter_vec!(
                "kubewatch_events_observed_total",
                "Total change events received from watches",
                &["kind", "reason"]
            )
            .map_err(|e| GatewayError::Metrics(format!("events_observed: {e}")))?,

            events_forwarded: register_counter_vec!(
                "kubewatch_events_forwarded_total",
                "Total change events forwarded to emitters",
                &["kind"]
            )
            .map_err(|e| GatewayError::Metrics(format!("events_forwarded: {e}")))?,

            events_dropped: register_counter_vec!(
                "kubewatch_events_dropped_total",
                "Total change events dropped by the filter",
                &["kind"]
            )
            .map_err(|e| GatewayError::Metrics(format!("events_dropped: {e}")))?,

            emit_failures: register_counter_vec!(
                "kubewatch_emit_failures_total",
                "Total failed emit calls",
                &["emitter"]
            )
            .map_err(|e| GatewayError::Metrics(format!("emit_failures: {e}")))?,

            active_watches: register_int_gauge!(
                "kubewatch_active_watches",
                "Number of running watch streams"
            )
            .map_err(|e| GatewayError::Metrics(format!("active_watches: {e}")))?,
        };

        // Only succeeds once
        let _ = METRICS.set(metrics);

        METRICS
            .get()
            .ok_or_else(|| GatewayError::Metrics("Failed to initialize metrics".to_string()))
    }

    /// Get the global metrics instance
    ///
    /// Returns None if metrics haven't been initialized yet.
    pub fn get() -> Option<&'static Metrics> {
        METRICS.get()
    }

    pub fn record_observed(&self, kind: &str, reason: &str) {
        self.events_observed.with_label_values(&[kind, reason]).inc();
    }

    pub fn record_forwarded(&self, kind: &str) {
        self.events_forwarded.with_label_values(&[kind]).inc();
    }

    pub fn record_dropped(&self, kind: &str) {
        self.events_dropped.with_label_values(&[kind]).inc();
    }

    pub fn record_emit_failure(&self, emitter: &str) {
        self.emit_failures.with_label_values(&[emitter]).inc();
    }
}

/// Gather all metrics and encode as Prometheus text format
pub fn gather() -> String {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();
    if encoder.encode(&metric_families, &mut buffer).is_ok() {
        String::from_utf8(buffer).unwrap_or_default()
    } else {
        String::new()
    }
}

/// Record an observed event if metrics are initialized
pub fn try_record_observed(kind: &str, reason: &str) {
    if let Some(m) = Metrics::get() {
        m.record_observed(kind, reason);
    }
}

/// Record a forwarded event if metrics are initialized
pub fn try_record_forwarded(kind: &str) {
    if let Some(m) = Metrics::get() {
        m.record_forwarded(kind);
    }
}

/// Record a dropped event if metrics are initialized
pub fn try_record_dropped(kind: &str) {
    if let Some(m) = Metrics::get() {
        m.record_dropped(kind);
    }
}

/// Record a failed emit if metrics are initialized
pub fn try_record_emit_failure(emitter: &str) {
    if let Some(m) = Metrics::get() {
        m.record_emit_failure(emitter);
    }
}

/// Track a running watch stream if metrics are initialized
pub fn try_watch_started() {
    if let Some(m) = Metrics::get() {
        m.active_watches.inc();
    }
}

/// Track a finished watch stream if metrics are initialized
pub fn try_watch_stopped() {
    if let Some(m) = Metrics::get() {
        m.active_watches.dec();
    }
}
