//! Prometheus metrics of the probe loop.
//!
//! All metrics follow the naming convention: `probe_<metric>_<unit>`
//!
//! ## Metric Types
//!
//! - **Histogram**: per-phase latency (e.g., probe_replication_seconds)
//! - **Counter**: iterations, poll attempts and errors
//! - **Gauge**: running average of each phase

use lazy_static::lazy_static;
use prometheus::{
    exponential_buckets, Counter, CounterVec, Encoder, GaugeVec, Histogram, HistogramOpts, Opts,
    Registry, TextEncoder,
};

use crate::TelemetryError;

lazy_static! {
    /// Global metrics registry
    pub static ref REGISTRY: Registry = Registry::new();

    // =========================================================================
    // PHASE LATENCY
    // =========================================================================

    /// Time from upload request to gateway acknowledgement
    pub static ref GATEWAY_UPLOAD_SECONDS: Histogram = Histogram::with_opts(
        HistogramOpts::new("probe_gateway_upload_seconds", "Gateway upload latency")
            .buckets(exponential_buckets(0.1, 2.0, 12).unwrap())
    ).expect("metric creation failed");

    /// Time from gateway acknowledgement to namespace listing
    pub static ref REPLICATION_SECONDS: Histogram = Histogram::with_opts(
        HistogramOpts::new("probe_replication_seconds", "Replication confirmation latency")
            .buckets(exponential_buckets(1.0, 2.0, 12).unwrap())
    ).expect("metric creation failed");

    /// Time from the first missing storage order to its appearance
    pub static ref DEAL_SECONDS: Histogram = Histogram::with_opts(
        HistogramOpts::new("probe_deal_seconds", "Storage order discovery latency")
            .buckets(exponential_buckets(0.5, 2.0, 12).unwrap())
    ).expect("metric creation failed");

    /// Gateway download latency
    pub static ref DOWNLOAD_SECONDS: Histogram = Histogram::with_opts(
        HistogramOpts::new("probe_download_seconds", "Gateway download latency")
            .buckets(exponential_buckets(0.1, 2.0, 12).unwrap())
    ).expect("metric creation failed");

    /// Running average per phase
    pub static ref PHASE_AVERAGE_SECONDS: GaugeVec = GaugeVec::new(
        Opts::new("probe_phase_average_seconds", "Cumulative average latency per phase"),
        &["phase"]  // phase: gateway_upload/replication/deal/download
    ).expect("metric creation failed");

    // =========================================================================
    // LOOP COUNTERS
    // =========================================================================

    /// Completed iterations
    pub static ref ITERATIONS_TOTAL: Counter = Counter::new(
        "probe_iterations_total",
        "Total number of completed probe iterations"
    ).expect("metric creation failed");

    /// Poll attempts by loop
    pub static ref POLL_ATTEMPTS_TOTAL: CounterVec = CounterVec::new(
        Opts::new("probe_poll_attempts_total", "Poll attempts"),
        &["kind"]  // kind: replication/deal
    ).expect("metric creation failed");

    /// Failed iterations by phase and error class
    pub static ref ERRORS_TOTAL: CounterVec = CounterVec::new(
        Opts::new("probe_errors_total", "Failed iterations by phase and error class"),
        &["phase", "class"]
    ).expect("metric creation failed");
}

/// Register all metrics with the global registry.
///
/// Safe to call more than once; metrics already registered are skipped.
pub fn register_metrics() -> Result<(), TelemetryError> {
    let metrics: Vec<Box<dyn prometheus::core::Collector>> = vec![
        // Latency
        Box::new(GATEWAY_UPLOAD_SECONDS.clone()),
        Box::new(REPLICATION_SECONDS.clone()),
        Box::new(DEAL_SECONDS.clone()),
        Box::new(DOWNLOAD_SECONDS.clone()),
        Box::new(PHASE_AVERAGE_SECONDS.clone()),
        // Counters
        Box::new(ITERATIONS_TOTAL.clone()),
        Box::new(POLL_ATTEMPTS_TOTAL.clone()),
        Box::new(ERRORS_TOTAL.clone()),
    ];

    for metric in metrics {
        match REGISTRY.register(metric) {
            Ok(()) | Err(prometheus::Error::AlreadyReg) => {}
            Err(e) => return Err(TelemetryError::MetricsInit(e.to_string())),
        }
    }
    Ok(())
}

/// Encode all metrics as Prometheus text format.
pub fn encode_metrics() -> Result<String, TelemetryError> {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = Vec::new();
    encoder
        .encode(&metric_families, &mut buffer)
        .map_err(|e| TelemetryError::MetricsInit(e.to_string()))?;
    String::from_utf8(buffer).map_err(|e| TelemetryError::MetricsInit(e.to_string()))
}

/// Record a finished phase. Unknown phase labels only update the average.
pub fn observe_phase(phase: &str, elapsed_secs: f64, average_secs: f64) {
    let histogram = match phase {
        "gateway_upload" => Some(&*GATEWAY_UPLOAD_SECONDS),
        "replication" => Some(&*REPLICATION_SECONDS),
        "deal" => Some(&*DEAL_SECONDS),
        "download" => Some(&*DOWNLOAD_SECONDS),
        _ => None,
    };
    if let Some(histogram) = histogram {
        histogram.observe(elapsed_secs);
    }
    PHASE_AVERAGE_SECONDS
        .with_label_values(&[phase])
        .set(average_secs);
}

/// Record one poll attempt of `kind`.
pub fn record_poll(kind: &str) {
    POLL_ATTEMPTS_TOTAL.with_label_values(&[kind]).inc();
}

/// Record a failed iteration.
pub fn record_error(phase: &str, class: &str) {
    ERRORS_TOTAL.with_label_values(&[phase, class]).inc();
}

/// Record a completed iteration.
pub fn record_iteration() {
    ITERATIONS_TOTAL.inc();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_twice() {
        register_metrics().unwrap();
        register_metrics().unwrap();
    }

    #[test]
    fn test_observe_phase() {
        let before = REPLICATION_SECONDS.get_sample_count();
        observe_phase("replication", 20.0, 20.0);
        assert!(REPLICATION_SECONDS.get_sample_count() > before);
        assert_eq!(
            PHASE_AVERAGE_SECONDS.with_label_values(&["replication"]).get(),
            20.0
        );
    }

    #[test]
    fn test_counters() {
        let before = POLL_ATTEMPTS_TOTAL.with_label_values(&["deal"]).get();
        record_poll("deal");
        assert!(POLL_ATTEMPTS_TOTAL.with_label_values(&["deal"]).get() >= before + 1.0);

        record_error("generated", "transient");
        assert!(ERRORS_TOTAL.with_label_values(&["generated", "transient"]).get() >= 1.0);

        record_iteration();
        assert!(ITERATIONS_TOTAL.get() >= 1.0);
    }

    #[test]
    fn test_encode_contains_metric_names() {
        register_metrics().unwrap();
        record_iteration();
        record_poll("replication");
        let text = encode_metrics().unwrap();
        assert!(text.contains("probe_iterations_total"));
        assert!(text.contains("probe_poll_attempts_total"));
    }
}
