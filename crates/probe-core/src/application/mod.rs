//! # Application Module
//!
//! The probe loop service and its shutdown signal.

pub mod service;
pub mod shutdown;

pub use service::{IterationReport, ProbeService, RunSummary, StopReason};
pub use shutdown::ShutdownSignal;
