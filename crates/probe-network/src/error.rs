//! Client-side errors and their retry classification.

use probe_core::{ErrorClass, NetworkError};
use thiserror::Error;

/// Errors raised while talking to an RPC node or a gateway.
#[derive(Debug, Error)]
pub enum RpcError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("HTTP status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("JSON-RPC error {code}: {message}")]
    Rpc { code: i64, message: String },

    #[error("Failed to parse response: {0}")]
    Parse(String),

    #[error("Connection failed: {0}")]
    Connection(String),

    #[error("Request timed out: {0}")]
    Timeout(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// JSON-RPC server error range reserved for implementation-defined errors.
const SERVER_ERROR_RANGE: std::ops::RangeInclusive<i64> = -32099..=-32000;

impl RpcError {
    /// Retry classification.
    ///
    /// Transport failures, timeouts, 5xx/429 answers and JSON-RPC server
    /// errors are transient. Everything else is permanent.
    pub fn class(&self) -> ErrorClass {
        match self {
            RpcError::Http(e) if e.is_timeout() || e.is_connect() || e.is_request() => {
                ErrorClass::Transient
            }
            RpcError::Http(e) => match e.status() {
                Some(s) if s.is_server_error() || s.as_u16() == 429 => ErrorClass::Transient,
                Some(_) => ErrorClass::Permanent,
                None => ErrorClass::Transient,
            },
            RpcError::Status { status, .. } if *status >= 500 || *status == 429 => {
                ErrorClass::Transient
            }
            RpcError::Rpc { code, .. } if SERVER_ERROR_RANGE.contains(code) || *code == -32603 => {
                ErrorClass::Transient
            }
            RpcError::Connection(_) | RpcError::Timeout(_) | RpcError::NotFound(_) => {
                ErrorClass::Transient
            }
            _ => ErrorClass::Permanent,
        }
    }
}

impl From<RpcError> for NetworkError {
    fn from(err: RpcError) -> Self {
        match err {
            RpcError::NotFound(what) => NetworkError::NotFound(what),
            other => match other.class() {
                ErrorClass::Transient => NetworkError::Transient(other.to_string()),
                ErrorClass::Permanent => NetworkError::Permanent(other.to_string()),
            },
        }
    }
}
