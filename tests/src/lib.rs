//! # Storage Probe Test Suite
//!
//! End-to-end scenarios running the complete probe loop against the
//! in-memory storage network with a paused tokio clock, so 10-second polls
//! complete instantly and every measured duration is exact.
//!
//! ## Structure
//!
//! ```text
//! tests/src/
//! └── integration/
//!     ├── probe_loop.rs   # Full iterations, timings and averages
//!     ├── ledger.rs       # Ledger layout and ordering
//!     ├── namespace.rs    # Namespace creation across restarts
//!     └── failures.rs     # Fail-fast, retry and shutdown
//! ```
//!
//! ## Running Tests
//!
//! ```bash
//! cargo test -p probe-tests
//! cargo test -p probe-tests integration::ledger
//! ```

pub mod integration;
