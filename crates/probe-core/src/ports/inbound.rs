//! # Inbound Ports
//!
//! API the probe offers to its host runtime.

use async_trait::async_trait;

use crate::application::{IterationReport, RunSummary};
use crate::components::MetricsSnapshot;
use crate::domain::{NamespaceName, ProbeError};

/// Probe loop API - inbound port.
#[async_trait]
pub trait ProbeApi: Send {
    /// One-time startup: validate and create the namespace if it is missing.
    async fn prepare(&mut self) -> Result<NamespaceName, ProbeError>;

    /// Run one generate → upload → confirm → download cycle.
    async fn run_iteration(&mut self) -> Result<IterationReport, ProbeError>;

    /// Prepare, then iterate until the iteration limit, a shutdown request,
    /// or a fatal error.
    async fn run(&mut self) -> Result<RunSummary, ProbeError>;

    /// Completed iterations so far.
    fn completed_iterations(&self) -> u64;

    /// Current averages of every timing series.
    fn metrics_snapshot(&self) -> MetricsSnapshot;
}
