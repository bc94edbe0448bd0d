//! # Domain Entities
//!
//! - [`UploadRecord`]: one immutable ledger entry per successful upload
//! - [`ProbeIteration`]: the per-cycle state machine owned by the loop

use std::path::PathBuf;
use std::time::Duration;

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};

use super::errors::ProbeError;
use super::identifier::ContentIdentifier;
use super::value_objects::{GatewayKind, SeriesKind};

/// Layout of the ledger timestamp column.
pub const LEDGER_TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.f %:z";

/// Audit-trail entry written after an upload succeeds. Never mutated.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UploadRecord {
    /// Identifier issued by the network.
    pub cid: ContentIdentifier,
    /// Name of the uploaded payload file.
    pub display_name: String,
    /// Gateway kind that accepted the upload.
    pub origin: GatewayKind,
    /// When the record was created.
    pub timestamp: DateTime<FixedOffset>,
}

impl UploadRecord {
    /// Ledger line: `<identifier> <sourceTag> <label> <timestamp>\n`.
    pub fn ledger_line(&self) -> String {
        format!(
            "{} {} {} {}\n",
            self.cid,
            self.origin.tag(),
            self.display_name,
            self.timestamp.format(LEDGER_TIMESTAMP_FORMAT)
        )
    }
}

/// Phase of a single probe iteration.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum IterationPhase {
    /// Nothing done yet.
    #[default]
    Idle,
    /// Payload written to the workspace.
    Generated,
    /// Gateway accepted the payload and issued an identifier.
    UploadedToGateway,
    /// Polling the namespace listing.
    AwaitingReplication,
    /// Object visible in the namespace.
    Replicated,
    /// Payload fetched back from the gateway.
    Downloaded,
}

impl IterationPhase {
    /// Label for logs and metrics.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Generated => "generated",
            Self::UploadedToGateway => "uploaded_to_gateway",
            Self::AwaitingReplication => "awaiting_replication",
            Self::Replicated => "replicated",
            Self::Downloaded => "downloaded",
        }
    }

    /// Only the next phase in the cycle is reachable.
    pub fn can_transition_to(&self, next: IterationPhase) -> bool {
        matches!(
            (self, next),
            (Self::Idle, Self::Generated)
                | (Self::Generated, Self::UploadedToGateway)
                | (Self::UploadedToGateway, Self::AwaitingReplication)
                | (Self::AwaitingReplication, Self::Replicated)
                | (Self::Replicated, Self::Downloaded)
                | (Self::Downloaded, Self::Idle)
        )
    }
}

/// Per-phase elapsed times of one iteration.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct IterationTimings {
    /// Gateway upload call.
    pub gateway_upload: Option<Duration>,
    /// Last deal wait of the iteration, when one was needed.
    pub deal: Option<Duration>,
    /// Replication wait.
    pub replication: Option<Duration>,
    /// Gateway download call.
    pub download: Option<Duration>,
}

impl IterationTimings {
    /// Elapsed time recorded for `series`, if that phase ran.
    pub fn get(&self, series: SeriesKind) -> Option<Duration> {
        match series {
            SeriesKind::GatewayUpload => self.gateway_upload,
            SeriesKind::Replication => self.replication,
            SeriesKind::Deal => self.deal,
            SeriesKind::Download => self.download,
        }
    }
}

/// Transient state of one loop cycle.
#[derive(Debug)]
pub struct ProbeIteration {
    /// 1-based iteration number.
    pub number: u64,
    phase: IterationPhase,
    /// Generated payload path.
    pub payload_path: Option<PathBuf>,
    /// Generated payload size in bytes.
    pub payload_bytes: u64,
    /// Identifier, once the gateway issued it.
    pub cid: Option<ContentIdentifier>,
    /// Measured phase durations.
    pub timings: IterationTimings,
}

impl ProbeIteration {
    /// Start iteration `number` in [`IterationPhase::Idle`].
    pub fn new(number: u64) -> Self {
        Self {
            number,
            phase: IterationPhase::Idle,
            payload_path: None,
            payload_bytes: 0,
            cid: None,
            timings: IterationTimings::default(),
        }
    }

    /// Current phase.
    pub fn phase(&self) -> IterationPhase {
        self.phase
    }

    /// Move to `next`, rejecting out-of-order transitions.
    pub fn transition_to(&mut self, next: IterationPhase) -> Result<(), ProbeError> {
        if !self.phase.can_transition_to(next) {
            return Err(ProbeError::InvalidTransition {
                from: format!("{:?}", self.phase),
                to: format!("{:?}", next),
            });
        }
        self.phase = next;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_full_cycle() {
        let mut it = ProbeIteration::new(1);
        for next in [
            IterationPhase::Generated,
            IterationPhase::UploadedToGateway,
            IterationPhase::AwaitingReplication,
            IterationPhase::Replicated,
            IterationPhase::Downloaded,
            IterationPhase::Idle,
        ] {
            it.transition_to(next).unwrap();
        }
        assert_eq!(it.phase(), IterationPhase::Idle);
    }

    #[test]
    fn test_skip_rejected() {
        let mut it = ProbeIteration::new(1);
        let err = it.transition_to(IterationPhase::Replicated).unwrap_err();
        assert!(matches!(err, ProbeError::InvalidTransition { .. }));
        assert_eq!(it.phase(), IterationPhase::Idle);
    }

    #[test]
    fn test_ledger_line_layout() {
        let offset = FixedOffset::east_opt(330 * 60).unwrap();
        let record = UploadRecord {
            cid: ContentIdentifier::new("abc123"),
            display_name: "rand.txt".into(),
            origin: GatewayKind::Public,
            timestamp: offset.with_ymd_and_hms(2024, 3, 1, 12, 30, 0).unwrap(),
        };
        assert_eq!(
            record.ledger_line(),
            "abc123 pub rand.txt 2024-03-01 12:30:00 +05:30\n"
        );
    }

    #[test]
    fn test_timings_lookup() {
        let timings = IterationTimings {
            deal: Some(Duration::from_secs(3)),
            ..Default::default()
        };
        assert_eq!(timings.get(SeriesKind::Deal), Some(Duration::from_secs(3)));
        assert_eq!(timings.get(SeriesKind::Download), None);
    }
}
