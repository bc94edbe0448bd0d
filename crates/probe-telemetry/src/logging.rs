//! Console and per-run file logging.
//!
//! Both outputs share one `EnvFilter` and one timestamp format rendered in a
//! fixed UTC offset. Each process run writes to a fresh file named after its
//! start time: `<log_dir>/<YYYY-MM-DD_HH-MM-SS>.log`.

use std::fmt;
use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{DateTime, FixedOffset, Utc};
use tracing_subscriber::fmt::format::Writer;
use tracing_subscriber::fmt::time::FormatTime;
use tracing_subscriber::layer::{Layer, Layered};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Registry};

type OutputLayer = Box<dyn Layer<Layered<EnvFilter, Registry>> + Send + Sync>;

use crate::{TelemetryConfig, TelemetryError};

/// Timestamp layout of log lines.
pub const LOG_TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.3f %z";

/// Log line timer in a fixed UTC offset.
#[derive(Clone, Copy, Debug)]
pub struct OffsetTimer {
    offset: FixedOffset,
}

impl OffsetTimer {
    pub fn new(offset: FixedOffset) -> Self {
        Self { offset }
    }

    fn render(&self, now: DateTime<Utc>) -> String {
        now.with_timezone(&self.offset)
            .format(LOG_TIMESTAMP_FORMAT)
            .to_string()
    }
}

impl FormatTime for OffsetTimer {
    fn format_time(&self, w: &mut Writer<'_>) -> fmt::Result {
        write!(w, "{}", self.render(Utc::now()))
    }
}

/// Path of the log file of a run started at `started`.
pub fn log_file_path(dir: &Path, started: DateTime<FixedOffset>) -> PathBuf {
    dir.join(format!("{}.log", started.format("%Y-%m-%d_%H-%M-%S")))
}

/// Offset from minutes east of UTC.
pub fn fixed_offset(minutes: i32) -> Result<FixedOffset, TelemetryError> {
    FixedOffset::east_opt(minutes.saturating_mul(60))
        .ok_or_else(|| TelemetryError::Config(format!("UTC offset of {minutes} minutes is out of range")))
}

/// Handle of the installed subscriber.
#[derive(Debug)]
pub struct LoggingGuard {
    log_file: Option<PathBuf>,
}

impl LoggingGuard {
    /// File this run logs to, if any.
    pub fn log_file(&self) -> Option<&Path> {
        self.log_file.as_deref()
    }
}

/// Open the log file of this run, creating `dir` if needed.
fn open_log_file(dir: &Path, offset: FixedOffset) -> Result<(PathBuf, File), TelemetryError> {
    std::fs::create_dir_all(dir)
        .map_err(|e| TelemetryError::LogFile(format!("{}: {e}", dir.display())))?;
    let path = log_file_path(dir, Utc::now().with_timezone(&offset));
    let file = File::options()
        .create(true)
        .append(true)
        .open(&path)
        .map_err(|e| TelemetryError::LogFile(format!("{}: {e}", path.display())))?;
    Ok((path, file))
}

/// Install the global subscriber.
pub fn init_logging(config: &TelemetryConfig) -> Result<LoggingGuard, TelemetryError> {
    let offset = fixed_offset(config.utc_offset_minutes)?;
    let timer = OffsetTimer::new(offset);

    let env_filter = EnvFilter::try_new(&config.log_level)
        .map_err(|e| TelemetryError::Config(e.to_string()))?;

    let (log_file, writer) = match &config.log_dir {
        Some(dir) => {
            let (path, file) = open_log_file(dir, offset)?;
            (Some(path), Some(Arc::new(file)))
        }
        None => (None, None),
    };

    let console = config.console_output.then(|| {
        tracing_subscriber::fmt::layer()
            .with_timer(timer)
            .with_target(false)
    });
    let (console_plain, console_json) = if config.json_logs {
        (None, console.map(|l| l.json()))
    } else {
        (console, None)
    };

    let file_plain = writer.clone().filter(|_| !config.json_logs).map(|w| {
        tracing_subscriber::fmt::layer()
            .with_timer(timer)
            .with_target(false)
            .with_ansi(false)
            .with_writer(w)
    });
    let file_json = writer.filter(|_| config.json_logs).map(|w| {
        tracing_subscriber::fmt::layer()
            .json()
            .with_timer(timer)
            .with_ansi(false)
            .with_writer(w)
    });

    let outputs: Vec<OutputLayer> = [
        console_plain.map(Layer::boxed),
        console_json.map(Layer::boxed),
        file_plain.map(Layer::boxed),
        file_json.map(Layer::boxed),
    ]
    .into_iter()
    .flatten()
    .collect();

    tracing_subscriber::registry()
        .with(env_filter)
        .with(outputs)
        .try_init()
        .map_err(|e| TelemetryError::Init(e.to_string()))?;

    if let Some(path) = &log_file {
        tracing::info!(log_file = %path.display(), "Logging to file");
    }

    Ok(LoggingGuard { log_file })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn ist() -> FixedOffset {
        fixed_offset(330).unwrap()
    }

    #[test]
    fn test_timer_renders_in_offset() {
        let timer = OffsetTimer::new(ist());
        let now = Utc.with_ymd_and_hms(2024, 3, 1, 6, 30, 0).unwrap();
        assert_eq!(timer.render(now), "2024-03-01 12:00:00.000 +0530");
    }

    #[test]
    fn test_log_file_path_uses_start_time() {
        let started = ist().with_ymd_and_hms(2024, 3, 1, 12, 0, 5).unwrap();
        assert_eq!(
            log_file_path(Path::new("logs"), started),
            PathBuf::from("logs/2024-03-01_12-00-05.log")
        );
    }

    #[test]
    fn test_offset_out_of_range() {
        assert!(fixed_offset(-330).is_ok());
        assert!(matches!(fixed_offset(24 * 60), Err(TelemetryError::Config(_))));
    }

    #[test]
    fn test_open_log_file_creates_directory() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("a").join("logs");
        let (path, _file) = open_log_file(&nested, ist()).unwrap();
        assert!(path.starts_with(&nested));
        assert!(path.exists());
        assert_eq!(path.extension().and_then(|e| e.to_str()), Some("log"));
    }
}
