//! # Ports Layer
//!
//! Hexagonal architecture ports.
//!
//! - `inbound` - API offered to the runtime (driving port)
//! - `outbound` - Storage network and observer capabilities (driven ports)
//! - `mock` - In-memory storage network for tests

pub mod inbound;
pub mod mock;
pub mod outbound;

pub use inbound::ProbeApi;
pub use mock::{MockCalls, MockStorageNetwork};
pub use outbound::{NoopObserver, PollKind, ProbeObserver, StorageNetwork, StorageOrder};
