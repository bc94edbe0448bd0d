//! # Probe Network
//!
//! Production adapter of the probe's `StorageNetwork` port.
//!
//! ## Module Structure
//!
//! ```text
//! probe-network/
//! ├── client.rs   # StorageNetworkClient: the port implementation
//! ├── rpc.rs      # JSON-RPC 2.0 over HTTP with endpoint fail-over
//! ├── gateway.rs  # Gateway upload/download with signed headers
//! ├── keyring.rs  # ed25519 key derived from the seed phrase
//! └── error.rs    # RpcError and its transient/permanent classification
//! ```

#![warn(clippy::all)]

pub mod client;
pub mod error;
pub mod gateway;
pub mod keyring;
pub mod rpc;

#[cfg(test)]
mod test_server;

pub use client::{NetworkClientConfig, StorageNetworkClient, DEFAULT_BOOTSTRAP, DEFAULT_RPC_ENDPOINTS};
pub use error::RpcError;
pub use gateway::GatewayClient;
pub use keyring::{Keyring, KeyringError};
pub use rpc::RpcClient;

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
