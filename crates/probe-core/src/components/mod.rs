//! # Components
//!
//! Stateful building blocks driven by the probe loop.
//!
//! - `workload` - payload generation
//! - `namespace` - create-if-absent namespace setup
//! - `upload` - gateway upload with one-time space authorisation
//! - `confirmation` - replication and deal polling
//! - `retrieval` - download, verification and cleanup
//! - `metrics` - cumulative per-series averages
//! - `ledger` - append-only upload ledger

pub mod confirmation;
pub mod ledger;
pub mod metrics;
pub mod namespace;
pub mod retrieval;
pub mod upload;
pub mod workload;

pub use confirmation::{ConfirmationPoller, ReplicationOutcome};
pub use ledger::{RecordLedger, LEDGER_FILE_NAME};
pub use metrics::{MetricsAccumulator, MetricsSnapshot, TimingSeries};
pub use namespace::{NamespaceEnsured, NamespaceManager};
pub use retrieval::{download_path, RetrievalCoordinator};
pub use upload::{UploadCoordinator, UploadReceipt};
pub use workload::{GeneratedPayload, WorkloadGenerator, MIB, PAYLOAD_ALPHABET};
