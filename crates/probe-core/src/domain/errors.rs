//! # Domain Errors
//!
//! Error types for the probe.
//!
//! Two layers exist:
//!
//! - [`NetworkError`] is what a storage-network capability returns. It is
//!   classified so the loop can decide between retry and abort.
//! - [`ProbeError`] is what the probe surfaces to its caller. Every variant is
//!   fatal for the run; "not found yet" answers never become a `ProbeError`.

use std::path::PathBuf;

use thiserror::Error;

/// Retry classification of a capability failure.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ErrorClass {
    /// Worth retrying (timeouts, refused connections, 5xx answers).
    Transient,
    /// Retrying cannot help (bad request, rejected extrinsic, unsupported call).
    Permanent,
}

impl ErrorClass {
    /// Label used in logs and metrics.
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorClass::Transient => "transient",
            ErrorClass::Permanent => "permanent",
        }
    }
}

/// Failure reported by a storage-network capability.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum NetworkError {
    /// The queried item does not exist (yet). Drives polling, never fatal on its own.
    #[error("not found: {0}")]
    NotFound(String),

    /// Transport-level failure that may succeed on retry.
    #[error("transient network failure: {0}")]
    Transient(String),

    /// Failure that will not go away on retry.
    #[error("permanent network failure: {0}")]
    Permanent(String),
}

impl NetworkError {
    /// Retry classification. `NotFound` counts as transient: the answer may change.
    pub fn class(&self) -> ErrorClass {
        match self {
            NetworkError::NotFound(_) | NetworkError::Transient(_) => ErrorClass::Transient,
            NetworkError::Permanent(_) => ErrorClass::Permanent,
        }
    }

    /// True for the "not there yet" answer.
    pub fn is_not_found(&self) -> bool {
        matches!(self, NetworkError::NotFound(_))
    }
}

/// Fatal probe errors.
#[derive(Debug, Error)]
pub enum ProbeError {
    /// Missing or inconsistent configuration (seed phrase, sizes, intervals).
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// Namespace name rejected by the network naming rules.
    #[error("Invalid namespace name {name:?}: {reason}")]
    InvalidName {
        /// The rejected name.
        name: String,
        /// Which rule it broke.
        reason: &'static str,
    },

    /// Network client could not be constructed.
    #[error("Failed to connect to storage network: {0}")]
    Connect(String),

    /// Filesystem failure.
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        /// File or directory involved.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// Gateway upload failed.
    #[error("Upload failed: {0}")]
    Upload(#[source] NetworkError),

    /// Gateway download failed, or the downloaded content did not match.
    #[error("Download failed: {0}")]
    Download(#[source] NetworkError),

    /// Any other network query or transaction failed.
    #[error("Network call {operation} failed: {source}")]
    Network {
        /// Capability that failed.
        operation: &'static str,
        /// Underlying error.
        #[source]
        source: NetworkError,
    },

    /// Iteration state machine was driven out of order.
    #[error("Invalid iteration transition: {from} -> {to}")]
    InvalidTransition {
        /// Current phase.
        from: String,
        /// Requested phase.
        to: String,
    },

    /// A poll gave up after its configured attempt budget.
    #[error("{operation} gave up after {attempts} attempts")]
    RetriesExhausted {
        /// What was being polled or retried.
        operation: &'static str,
        /// Attempts made.
        attempts: u32,
    },

    /// Shutdown was requested while the loop was running.
    #[error("Probe cancelled by shutdown request")]
    Cancelled,
}

impl ProbeError {
    /// Wrap an I/O error with the path it concerns.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        ProbeError::Io {
            path: path.into(),
            source,
        }
    }

    /// Wrap a network error with the capability name.
    pub fn network(operation: &'static str, source: NetworkError) -> Self {
        ProbeError::Network { operation, source }
    }

    /// Classification of the underlying network failure, if any.
    pub fn network_class(&self) -> Option<ErrorClass> {
        match self {
            ProbeError::Upload(e) | ProbeError::Download(e) => Some(e.class()),
            ProbeError::Network { source, .. } => Some(source.class()),
            _ => None,
        }
    }
}
