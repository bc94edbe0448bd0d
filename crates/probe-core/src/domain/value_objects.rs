//! # Value Objects
//!
//! Immutable policy and tag types shared by the probe components.

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::errors::{ErrorClass, ProbeError};

/// Measured phase of an iteration. One timing series per variant.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SeriesKind {
    /// Wall-clock time of the gateway upload call.
    GatewayUpload,
    /// Time from the end of the upload until the object shows up in the namespace.
    Replication,
    /// Time spent waiting for a storage deal to appear.
    Deal,
    /// Wall-clock time of the gateway download call.
    Download,
}

impl SeriesKind {
    /// All series, in report order.
    pub const ALL: [SeriesKind; 4] = [
        SeriesKind::GatewayUpload,
        SeriesKind::Replication,
        SeriesKind::Deal,
        SeriesKind::Download,
    ];

    /// Stable label for logs and metrics.
    pub fn as_str(&self) -> &'static str {
        match self {
            SeriesKind::GatewayUpload => "gateway_upload",
            SeriesKind::Replication => "replication",
            SeriesKind::Deal => "deal",
            SeriesKind::Download => "download",
        }
    }
}

impl fmt::Display for SeriesKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Growth of the wait between poll attempts.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Backoff {
    /// Same interval every time.
    #[default]
    Fixed,
    /// `interval * factor^(attempt-1)`, clamped to `max_interval_ms`.
    Exponential {
        /// Multiplier applied per attempt.
        factor: f64,
        /// Upper bound on a single wait.
        max_interval_ms: u64,
    },
}

/// Retry policy of a polling loop.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct PollPolicy {
    /// Base wait between attempts.
    pub interval_ms: u64,
    /// Give up after this many attempts. `None` polls until success.
    #[serde(default)]
    pub max_attempts: Option<u32>,
    /// Interval growth.
    #[serde(default)]
    pub backoff: Backoff,
}

impl PollPolicy {
    /// Fixed interval, no attempt limit.
    pub fn fixed(interval: Duration) -> Self {
        Self {
            interval_ms: interval.as_millis() as u64,
            max_attempts: None,
            backoff: Backoff::Fixed,
        }
    }

    /// Limit the number of attempts.
    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = Some(max_attempts);
        self
    }

    /// Use exponential backoff.
    pub fn with_backoff(mut self, backoff: Backoff) -> Self {
        self.backoff = backoff;
        self
    }

    /// Wait before attempt `attempt + 1`, given `attempt` (1-based) has just failed.
    pub fn delay_after(&self, attempt: u32) -> Duration {
        match self.backoff {
            Backoff::Fixed => Duration::from_millis(self.interval_ms),
            Backoff::Exponential {
                factor,
                max_interval_ms,
            } => {
                let exponent = attempt.saturating_sub(1).min(i32::MAX as u32) as i32;
                let raw = (self.interval_ms as f64) * factor.powi(exponent);
                let max = max_interval_ms as f64;
                let clamped = if raw.is_nan() || raw < 0.0 {
                    0.0
                } else if raw > max {
                    max
                } else {
                    raw
                };
                Duration::from_millis(clamped as u64)
            }
        }
    }

    /// True once `attempts` reached the configured limit.
    pub fn exhausted(&self, attempts: u32) -> bool {
        self.max_attempts.is_some_and(|max| attempts >= max)
    }

    pub(crate) fn validate(&self, name: &str) -> Result<(), ProbeError> {
        if self.interval_ms == 0 {
            return Err(ProbeError::Config(format!("{name} interval must be non-zero")));
        }
        if self.max_attempts == Some(0) {
            return Err(ProbeError::Config(format!(
                "{name} max_attempts must be at least 1"
            )));
        }
        if let Backoff::Exponential { factor, .. } = self.backoff {
            if !(factor >= 1.0) {
                return Err(ProbeError::Config(format!(
                    "{name} backoff factor must be >= 1.0"
                )));
            }
        }
        Ok(())
    }
}

/// Which counter feeds the cumulative average of a series.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CounterMode {
    /// Each series counts its own samples.
    #[default]
    PerSeries,
    /// Every series uses the loop's iteration number, even when it skipped
    /// iterations. Reproduces the historical averages exactly.
    Global,
}

impl std::str::FromStr for CounterMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "per-series" => Ok(CounterMode::PerSeries),
            "global" => Ok(CounterMode::Global),
            other => Err(format!(
                "unknown counter mode {other:?} (expected per-series or global)"
            )),
        }
    }
}

/// Reaction of the loop to a failed upload or download.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FailurePolicy {
    /// Every failure aborts the run.
    #[default]
    FailFast,
    /// Retry transient failures up to `max_attempts` total attempts.
    RetryTransient {
        /// Attempts including the first one.
        max_attempts: u32,
    },
}

impl FailurePolicy {
    /// Should attempt `attempt` (1-based), which failed with `class`, be retried?
    pub fn should_retry(&self, class: ErrorClass, attempt: u32) -> bool {
        match self {
            FailurePolicy::FailFast => false,
            FailurePolicy::RetryTransient { max_attempts } => {
                class == ErrorClass::Transient && attempt < *max_attempts
            }
        }
    }
}

/// What the retrieval step checks and cleans up.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetrievalPolicy {
    /// Compare the downloaded bytes with the generated payload.
    pub verify_content: bool,
    /// Delete the downloaded copy afterwards.
    pub remove_downloaded: bool,
    /// Delete the generated payload afterwards.
    pub remove_generated: bool,
}

impl Default for RetrievalPolicy {
    fn default() -> Self {
        Self {
            verify_content: true,
            remove_downloaded: true,
            remove_generated: false,
        }
    }
}

/// Kind of gateway the probe talks to, recorded in the ledger.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum GatewayKind {
    /// The shared public gateway.
    Public,
    /// A gateway run by the probe operator.
    SelfHosted,
}

impl GatewayKind {
    /// Ledger tag.
    pub fn tag(&self) -> &'static str {
        match self {
            GatewayKind::Public => "pub",
            GatewayKind::SelfHosted => "slf",
        }
    }
}

/// Gateway endpoint and the account it stores under.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Gateway {
    /// Base URL of the gateway HTTP API.
    pub url: String,
    /// Account address of the gateway, authorised to use the probe's space.
    pub account: String,
}

impl Gateway {
    /// Classify against the known public gateway account.
    pub fn kind(&self, public_account: &str) -> GatewayKind {
        if self.account == public_account {
            GatewayKind::Public
        } else {
            GatewayKind::SelfHosted
        }
    }
}
