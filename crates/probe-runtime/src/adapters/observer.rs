//! Probe observer exporting to the Prometheus registry.

use std::time::Duration;

use probe_core::{IterationPhase, IterationReport, PollKind, ProbeError, ProbeObserver, SeriesKind};
use probe_telemetry::metrics;
use tracing::{debug, enabled, warn, Level};

/// Label of failures that carry no network classification.
const FATAL_CLASS: &str = "fatal";

/// Forwards probe events to `probe_telemetry::metrics`.
#[derive(Clone, Copy, Debug, Default)]
pub struct TelemetryObserver;

impl ProbeObserver for TelemetryObserver {
    fn phase_completed(&self, series: SeriesKind, elapsed: Duration, average_ms: u64) {
        metrics::observe_phase(
            series.as_str(),
            elapsed.as_secs_f64(),
            average_ms as f64 / 1000.0,
        );
    }

    fn poll_attempt(&self, kind: PollKind) {
        metrics::record_poll(kind.as_str());
    }

    fn iteration_completed(&self, report: &IterationReport) {
        metrics::record_iteration();
        if enabled!(Level::DEBUG) {
            match metrics::encode_metrics() {
                Ok(text) => debug!(iteration = report.number, "Metrics:\n{text}"),
                Err(e) => warn!(error = %e, "Failed to encode metrics"),
            }
        }
    }

    fn iteration_failed(&self, phase: IterationPhase, error: &ProbeError) {
        let class = error
            .network_class()
            .map(|c| c.as_str())
            .unwrap_or(FATAL_CLASS);
        metrics::record_error(phase.as_str(), class);
    }
}
