//! # Probe Core
//!
//! Upload-confirm-replicate-download verification loop for a decentralized
//! storage network.
//!
//! **Architecture:** Hexagonal (Domain + Ports/Adapters)
//!
//! ## Purpose
//!
//! Continuously exercise the network end to end and record latency:
//!
//! 1. Generate a random payload in the workspace
//! 2. Upload it through a gateway, record the issued identifier in the ledger
//! 3. Poll the namespace listing until the identifier shows up, timing the
//!    storage deal on the way
//! 4. Download it back, verify, clean up
//! 5. Fold every phase latency into its cumulative average, repeat
//!
//! ## Module Structure
//!
//! ```text
//! probe-core/
//! ├── domain/          # Identifiers, namespace names, records, policies, errors
//! ├── ports/           # ProbeApi (inbound), StorageNetwork + ProbeObserver (outbound), mock
//! ├── components/      # Workload, namespace, upload, confirmation, retrieval, metrics, ledger
//! ├── application/     # ProbeService (the loop) and ShutdownSignal
//! └── config.rs        # ProbeConfig
//! ```
//!
//! ## Failure handling
//!
//! | Condition | Outcome |
//! |-----------|---------|
//! | Identifier not listed / no deal yet | Keep polling |
//! | Invalid namespace, bad config | Fatal before any upload |
//! | Transient upload/download failure | Fatal, or retried under `RetryTransient` |
//! | Permanent failure, I/O failure | Fatal |

#![warn(clippy::all)]

pub mod application;
pub mod components;
pub mod config;
pub mod domain;
pub mod ports;

// Re-exports
pub use application::{IterationReport, ProbeService, RunSummary, ShutdownSignal, StopReason};
pub use components::{
    download_path, ConfirmationPoller, GeneratedPayload, MetricsAccumulator, MetricsSnapshot,
    NamespaceEnsured, NamespaceManager, RecordLedger, ReplicationOutcome, RetrievalCoordinator,
    TimingSeries, UploadCoordinator, UploadReceipt, WorkloadGenerator, LEDGER_FILE_NAME, MIB,
};
pub use config::{ProbeConfig, DEFAULT_GATEWAY_URL, PUBLIC_GATEWAY_ACCOUNT};
pub use domain::{
    AccountId, Backoff, ContentIdentifier, CounterMode, ErrorClass, FailurePolicy, FileHash,
    Gateway, GatewayKind, IdentifierMatch, IterationPhase, IterationTimings, NamespaceName,
    NetworkError, PollPolicy, ProbeError, RetrievalPolicy, SeriesKind, UploadRecord,
    LEDGER_TIMESTAMP_FORMAT,
};
pub use ports::{
    MockStorageNetwork, NoopObserver, PollKind, ProbeApi, ProbeObserver, StorageNetwork,
    StorageOrder,
};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
