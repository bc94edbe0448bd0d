//! # Outbound Ports (Driven Ports)
//!
//! Capabilities the probe requires from its host: the storage network client
//! and an observer for metrics export.
//!
//! Production: `StorageNetworkClient` (probe-network) and
//! `TelemetryObserver` (probe-runtime).
//! Testing: [`MockStorageNetwork`](super::mock::MockStorageNetwork) and
//! [`NoopObserver`].

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::application::IterationReport;
use crate::domain::{
    AccountId, ContentIdentifier, Gateway, IterationPhase, NamespaceName, NetworkError,
    ProbeError, SeriesKind,
};

/// Storage order (deal) record for an uploaded payload.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageOrder {
    /// Identifier the order is for.
    pub cid: ContentIdentifier,
    /// Payload size in bytes, when reported.
    #[serde(default)]
    pub file_size: u64,
    /// Miners assigned so far, when reported.
    #[serde(default)]
    pub assigned_miners: Vec<String>,
}

/// Storage network client - outbound port.
///
/// Every call is a single attempt. Retry and polling belong to the probe.
/// Errors are classified through [`NetworkError`]; a missing item is
/// reported as [`NetworkError::NotFound`].
#[async_trait]
pub trait StorageNetwork: Send + Sync {
    /// Create namespace `name` owned by `owner`. Returns the transaction hash.
    async fn create_namespace(
        &self,
        owner: &AccountId,
        name: &NamespaceName,
    ) -> Result<String, NetworkError>;

    /// Names of all namespaces owned by `owner`.
    async fn list_namespaces(&self, owner: &AccountId) -> Result<Vec<String>, NetworkError>;

    /// Objects currently listed in the namespace.
    async fn namespace_contents(
        &self,
        owner: &AccountId,
        name: &NamespaceName,
    ) -> Result<Vec<ContentIdentifier>, NetworkError>;

    /// Storage order for `cid`. `NotFound` while no deal exists.
    async fn query_deal(&self, cid: &ContentIdentifier) -> Result<StorageOrder, NetworkError>;

    /// Upload the file at `payload` through the gateway into `namespace`.
    async fn upload(
        &self,
        gateway: &Gateway,
        payload: &Path,
        namespace: &NamespaceName,
    ) -> Result<ContentIdentifier, NetworkError>;

    /// Download `cid` through the gateway into `dest`.
    async fn download(
        &self,
        gateway: &Gateway,
        cid: &ContentIdentifier,
        dest: &Path,
    ) -> Result<(), NetworkError>;

    /// Let the gateway account use the probe's storage space.
    ///
    /// Returns the transaction hash, or `None` when nothing had to be done.
    /// Networks without delegated space keep the default no-op.
    async fn authorize_gateway(&self, _gateway: &Gateway) -> Result<Option<String>, NetworkError> {
        Ok(None)
    }
}

/// Polling loop that made an attempt.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PollKind {
    /// Namespace listing check.
    Replication,
    /// Storage order check.
    Deal,
}

impl PollKind {
    /// Label for logs and metrics.
    pub fn as_str(&self) -> &'static str {
        match self {
            PollKind::Replication => "replication",
            PollKind::Deal => "deal",
        }
    }
}

/// Receives probe events for export. All hooks default to no-ops.
pub trait ProbeObserver: Send + Sync {
    /// A phase finished; `average_ms` is the series average after the update.
    fn phase_completed(&self, _series: SeriesKind, _elapsed: Duration, _average_ms: u64) {}

    /// A poll attempt was made.
    fn poll_attempt(&self, _kind: PollKind) {}

    /// An iteration finished successfully.
    fn iteration_completed(&self, _report: &IterationReport) {}

    /// An iteration failed in `phase`.
    fn iteration_failed(&self, _phase: IterationPhase, _error: &ProbeError) {}
}

/// Observer that drops every event.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopObserver;

impl ProbeObserver for NoopObserver {}
