//! Telemetry configuration from environment variables.

use std::env;
use std::path::PathBuf;

/// Default directory of the per-run log files.
pub const DEFAULT_LOG_DIR: &str = "./logs";

/// Configuration of logging and metrics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TelemetryConfig {
    /// Log level filter (trace, debug, info, warn, error)
    pub log_level: String,

    /// Whether to log to the console
    pub console_output: bool,

    /// Whether to write JSON formatted logs
    pub json_logs: bool,

    /// Directory holding one log file per run. `None` disables file logging.
    pub log_dir: Option<PathBuf>,

    /// Offset of log timestamps, in minutes east of UTC
    pub utc_offset_minutes: i32,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            console_output: true,
            json_logs: false,
            log_dir: Some(PathBuf::from(DEFAULT_LOG_DIR)),
            utc_offset_minutes: 330,
        }
    }
}

impl TelemetryConfig {
    /// Create configuration from environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `PROBE_LOG_LEVEL` or `RUST_LOG`: Log level (default: info)
    /// - `PROBE_CONSOLE_OUTPUT`: Enable console output (default: true)
    /// - `PROBE_JSON_LOGS`: Enable JSON logs (default: false)
    /// - `PROBE_LOG_DIR`: Log file directory (default: ./logs)
    /// - `PROBE_UTC_OFFSET_MINUTES`: Timestamp offset (default: 330)
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Like [`from_env`](Self::from_env) over an arbitrary variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        Self {
            log_level: lookup("PROBE_LOG_LEVEL")
                .or_else(|| lookup("RUST_LOG"))
                .unwrap_or(defaults.log_level),

            console_output: lookup("PROBE_CONSOLE_OUTPUT")
                .map(|v| v.to_lowercase() != "false" && v != "0")
                .unwrap_or(defaults.console_output),

            json_logs: lookup("PROBE_JSON_LOGS")
                .map(|v| v.to_lowercase() == "true" || v == "1")
                .unwrap_or(defaults.json_logs),

            log_dir: match lookup("PROBE_LOG_DIR") {
                Some(dir) if dir.is_empty() => None,
                Some(dir) => Some(PathBuf::from(dir)),
                None => defaults.log_dir,
            },

            utc_offset_minutes: lookup("PROBE_UTC_OFFSET_MINUTES")
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.utc_offset_minutes),
        }
    }

    /// Console only, debug level, no log file.
    pub fn for_testing() -> Self {
        Self {
            log_level: "debug".to_string(),
            log_dir: None,
            ..Self::default()
        }
    }
}
