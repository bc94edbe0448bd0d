//! # Probe Telemetry
//!
//! Logging and metrics for the storage probe.
//!
//! ## Components
//!
//! - **Logging**: `tracing-subscriber` console output plus one log file per
//!   run, timestamps in a fixed UTC offset, optional JSON
//! - **Metrics**: Prometheus registry with per-phase latency histograms
//!
//! ## Usage
//!
//! ```rust,ignore
//! use probe_telemetry::{init_telemetry, TelemetryConfig};
//!
//! let guard = init_telemetry(&TelemetryConfig::from_env())?;
//! tracing::info!(log_file = ?guard.log_file(), "started");
//! ```
//!
//! ## Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `PROBE_LOG_LEVEL` / `RUST_LOG` | `info` | Log level filter |
//! | `PROBE_JSON_LOGS` | `false` | JSON log lines |
//! | `PROBE_LOG_DIR` | `./logs` | Per-run log file directory, empty disables |
//! | `PROBE_UTC_OFFSET_MINUTES` | `330` | Timestamp offset |

#![warn(clippy::all)]

mod config;
mod logging;
pub mod metrics;

pub use config::{TelemetryConfig, DEFAULT_LOG_DIR};
pub use logging::{fixed_offset, log_file_path, LoggingGuard, OffsetTimer, LOG_TIMESTAMP_FORMAT};
pub use metrics::{encode_metrics, record_error, record_iteration, record_poll, observe_phase, register_metrics};

use thiserror::Error;

/// Telemetry initialization errors
#[derive(Error, Debug)]
pub enum TelemetryError {
    #[error("Failed to install log subscriber: {0}")]
    Init(String),

    #[error("Failed to open log file: {0}")]
    LogFile(String),

    #[error("Failed to initialize Prometheus metrics: {0}")]
    MetricsInit(String),

    #[error("Invalid configuration: {0}")]
    Config(String),
}

/// Register metrics and install logging.
///
/// The returned guard names the log file of this run.
pub fn init_telemetry(config: &TelemetryConfig) -> Result<LoggingGuard, TelemetryError> {
    register_metrics()?;
    logging::init_logging(config)
}
