//! # Probe Configuration
//!
//! Settings of the verification loop. Connection settings of the network
//! client live with the client (probe-network).

use std::path::PathBuf;
use std::time::Duration;

use chrono::FixedOffset;
use serde::{Deserialize, Serialize};

use crate::components::workload::max_payload_bytes;
use crate::components::MIB;
use crate::domain::{
    CounterMode, FailurePolicy, Gateway, IdentifierMatch, PollPolicy, ProbeError, RetrievalPolicy,
};

/// Public gateway endpoint.
pub const DEFAULT_GATEWAY_URL: &str = "http://139.224.19.104:8080";

/// Account of the public gateway.
pub const PUBLIC_GATEWAY_ACCOUNT: &str = "cXhwBytXqrZLr1qM5NHJhCzEMckSTzNKw17ci2aHft6ETSQm9";

/// Default namespace.
pub const DEFAULT_NAMESPACE: &str = "random";

/// Default payload file name, also the ledger label.
pub const DEFAULT_FILE_NAME: &str = "rand.txt";

/// Default workspace directory.
pub const DEFAULT_WORKSPACE: &str = "./CESS_STORAGE";

/// Default offset of ledger and log timestamps (+05:30).
pub const DEFAULT_UTC_OFFSET_MINUTES: i32 = 330;

/// Probe loop configuration.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProbeConfig {
    /// Directory holding the payload, downloads and the ledger.
    pub workspace_dir: PathBuf,

    /// Payload file name inside the workspace.
    pub file_name: String,

    /// Target namespace.
    pub namespace: String,

    /// Gateway used for upload and download.
    pub gateway: Gateway,

    /// Account of the public gateway, for the ledger source tag.
    pub public_gateway_account: String,

    /// Payload size unit in bytes.
    pub size_unit_bytes: u64,

    /// Smallest payload, in size units (inclusive).
    pub min_size_units: u32,

    /// Largest payload, in size units (inclusive).
    pub max_size_units: u32,

    /// Wait between namespace listings.
    pub replication_poll: PollPolicy,

    /// Wait between deal queries.
    pub deal_poll: PollPolicy,

    /// Identifier comparison used for replication checks.
    pub identifier_match: IdentifierMatch,

    /// Counter feeding the cumulative averages.
    pub counter_mode: CounterMode,

    /// Reaction to failed uploads and downloads.
    pub failure_policy: FailurePolicy,

    /// Verification and cleanup after download.
    pub retrieval: RetrievalPolicy,

    /// Stop after this many iterations. `None` runs forever.
    pub max_iterations: Option<u64>,

    /// Offset of ledger timestamps, in minutes east of UTC.
    pub utc_offset_minutes: i32,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            workspace_dir: PathBuf::from(DEFAULT_WORKSPACE),
            file_name: DEFAULT_FILE_NAME.to_string(),
            namespace: DEFAULT_NAMESPACE.to_string(),
            gateway: Gateway {
                url: DEFAULT_GATEWAY_URL.to_string(),
                account: PUBLIC_GATEWAY_ACCOUNT.to_string(),
            },
            public_gateway_account: PUBLIC_GATEWAY_ACCOUNT.to_string(),
            size_unit_bytes: MIB,
            min_size_units: 1,
            max_size_units: 1,
            replication_poll: PollPolicy::fixed(Duration::from_secs(10)),
            deal_poll: PollPolicy::fixed(Duration::from_secs(1)),
            identifier_match: IdentifierMatch::FixedWidth,
            counter_mode: CounterMode::PerSeries,
            failure_policy: FailurePolicy::FailFast,
            retrieval: RetrievalPolicy::default(),
            max_iterations: None,
            utc_offset_minutes: DEFAULT_UTC_OFFSET_MINUTES,
        }
    }
}

impl ProbeConfig {
    /// Small payloads and a bounded run, workspace under `dir`.
    pub fn for_testing(dir: impl Into<PathBuf>) -> Self {
        Self {
            workspace_dir: dir.into(),
            size_unit_bytes: 1024,
            max_iterations: Some(1),
            gateway: Gateway {
                url: "http://127.0.0.1:8080".to_string(),
                account: PUBLIC_GATEWAY_ACCOUNT.to_string(),
            },
            ..Self::default()
        }
    }

    /// Reject settings the loop cannot run with.
    pub fn validate(&self) -> Result<(), ProbeError> {
        if self.file_name.is_empty() {
            return Err(ProbeError::Config("file name must not be empty".into()));
        }
        if self.file_name.contains(['/', '\\']) {
            return Err(ProbeError::Config(format!(
                "file name {:?} must not contain a path separator",
                self.file_name
            )));
        }
        // The name is a space-separated ledger field.
        if self.file_name.contains(char::is_whitespace) {
            return Err(ProbeError::Config(format!(
                "file name {:?} must not contain whitespace",
                self.file_name
            )));
        }
        if self.size_unit_bytes == 0 {
            return Err(ProbeError::Config("size unit must be non-zero".into()));
        }
        if self.min_size_units == 0 {
            return Err(ProbeError::Config("minimum payload size must be at least 1 unit".into()));
        }
        if self.min_size_units > self.max_size_units {
            return Err(ProbeError::Config(format!(
                "minimum payload size {} exceeds maximum {}",
                self.min_size_units, self.max_size_units
            )));
        }
        if max_payload_bytes(self.size_unit_bytes, self.max_size_units).is_none() {
            return Err(ProbeError::Config(format!(
                "maximum payload of {} x {} bytes overflows",
                self.max_size_units, self.size_unit_bytes
            )));
        }
        if self.gateway.url.is_empty() {
            return Err(ProbeError::Config("gateway URL must not be empty".into()));
        }
        if let FailurePolicy::RetryTransient { max_attempts: 0 } = self.failure_policy {
            return Err(ProbeError::Config("retry attempts must be at least 1".into()));
        }
        self.replication_poll.validate("replication poll")?;
        self.deal_poll.validate("deal poll")?;
        self.utc_offset()?;
        Ok(())
    }

    /// Fixed offset of ledger timestamps.
    pub fn utc_offset(&self) -> Result<FixedOffset, ProbeError> {
        FixedOffset::east_opt(self.utc_offset_minutes.saturating_mul(60)).ok_or_else(|| {
            ProbeError::Config(format!(
                "UTC offset of {} minutes is out of range",
                self.utc_offset_minutes
            ))
        })
    }
}
