//! # Probe Service
//!
//! The probe loop: generate, upload, record, confirm, download, repeat.
//! Iterations run strictly one after another; the service owns every piece
//! of mutable state (averages, counters, the reused payload path).

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, FixedOffset, Utc};
use tracing::{debug, error, info, warn};

use super::shutdown::ShutdownSignal;
use crate::components::{
    download_path, ConfirmationPoller, MetricsAccumulator, MetricsSnapshot, NamespaceManager,
    RecordLedger, RetrievalCoordinator, UploadCoordinator, WorkloadGenerator, MIB,
};
use crate::config::ProbeConfig;
use crate::domain::{
    AccountId, Backoff, ContentIdentifier, CounterMode, GatewayKind, IterationPhase,
    IterationTimings, NamespaceName, PollPolicy, ProbeError, ProbeIteration, SeriesKind,
    UploadRecord,
};
use crate::ports::{NoopObserver, ProbeApi, ProbeObserver, StorageNetwork};

/// Wait before retrying a transient upload or download failure.
const RETRY_BACKOFF: PollPolicy = PollPolicy {
    interval_ms: 1_000,
    max_attempts: None,
    backoff: Backoff::Exponential {
        factor: 2.0,
        max_interval_ms: 30_000,
    },
};

/// Result of one completed iteration.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct IterationReport {
    /// 1-based iteration number.
    pub number: u64,
    /// Identifier issued for this iteration's payload.
    pub cid: ContentIdentifier,
    /// Payload size in bytes.
    pub payload_bytes: u64,
    /// Measured phase durations.
    pub timings: IterationTimings,
    /// Namespace listings until replication was confirmed.
    pub replication_polls: u32,
    /// Averages after this iteration.
    pub averages: MetricsSnapshot,
}

/// Why [`ProbeService::run`] returned.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StopReason {
    /// `max_iterations` reached.
    IterationLimit,
    /// Shutdown requested.
    Shutdown,
}

/// Result of a run that ended without a fatal error.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RunSummary {
    /// Iterations completed.
    pub iterations: u64,
    /// Why the run stopped.
    pub stopped_by: StopReason,
    /// Final averages.
    pub averages: MetricsSnapshot,
}

/// Probe loop service.
pub struct ProbeService<N: StorageNetwork, O: ProbeObserver = NoopObserver> {
    config: ProbeConfig,
    network: Arc<N>,
    owner: AccountId,
    observer: Arc<O>,
    shutdown: ShutdownSignal,
    offset: FixedOffset,
    origin: GatewayKind,
    generator: WorkloadGenerator,
    uploader: UploadCoordinator<N>,
    poller: ConfirmationPoller<N>,
    retriever: RetrievalCoordinator<N>,
    ledger: RecordLedger,
    metrics: MetricsAccumulator,
    namespace: Option<NamespaceName>,
    completed: u64,
}

impl<N: StorageNetwork> ProbeService<N> {
    /// Build the loop for `owner`'s namespace. Validates `config`.
    pub fn new(config: ProbeConfig, network: Arc<N>, owner: AccountId) -> Result<Self, ProbeError> {
        config.validate()?;
        let offset = config.utc_offset()?;
        let origin = config.gateway.kind(&config.public_gateway_account);
        let generator = WorkloadGenerator::new(
            &config.workspace_dir,
            &config.file_name,
            config.size_unit_bytes,
            config.min_size_units,
            config.max_size_units,
        )?;
        let uploader = UploadCoordinator::new(network.clone(), config.gateway.clone());
        let poller = ConfirmationPoller::new(
            network.clone(),
            owner,
            config.replication_poll,
            config.deal_poll,
            config.identifier_match,
        )
        .with_failure_policy(config.failure_policy);
        let retriever =
            RetrievalCoordinator::new(network.clone(), config.gateway.clone(), config.retrieval);
        let ledger = RecordLedger::in_workspace(&config.workspace_dir);

        Ok(Self {
            config,
            network,
            owner,
            observer: Arc::new(NoopObserver),
            shutdown: ShutdownSignal::never(),
            offset,
            origin,
            generator,
            uploader,
            poller,
            retriever,
            ledger,
            metrics: MetricsAccumulator::new(),
            namespace: None,
            completed: 0,
        })
    }
}

impl<N: StorageNetwork, O: ProbeObserver> ProbeService<N, O> {
    /// Replace the observer.
    pub fn with_observer<P: ProbeObserver>(self, observer: Arc<P>) -> ProbeService<N, P> {
        ProbeService {
            config: self.config,
            network: self.network,
            owner: self.owner,
            observer,
            shutdown: self.shutdown,
            offset: self.offset,
            origin: self.origin,
            generator: self.generator,
            uploader: self.uploader,
            poller: self.poller,
            retriever: self.retriever,
            ledger: self.ledger,
            metrics: self.metrics,
            namespace: self.namespace,
            completed: self.completed,
        }
    }

    /// Stop at the next iteration boundary or poll wait once `shutdown` fires.
    pub fn with_shutdown(mut self, shutdown: ShutdownSignal) -> Self {
        self.shutdown = shutdown;
        self
    }

    /// Fixed payload seed, for reproducible runs.
    pub fn with_payload_seed(mut self, seed: u64) -> Self {
        self.generator = self.generator.with_seed(seed);
        self
    }

    /// Loop configuration.
    pub fn config(&self) -> &ProbeConfig {
        &self.config
    }

    /// Upload ledger.
    pub fn ledger(&self) -> &RecordLedger {
        &self.ledger
    }

    /// Cumulative averages.
    pub fn metrics(&self) -> &MetricsAccumulator {
        &self.metrics
    }

    /// Namespace in use, once prepared.
    pub fn namespace(&self) -> Option<&NamespaceName> {
        self.namespace.as_ref()
    }

    fn now(&self) -> DateTime<FixedOffset> {
        Utc::now().with_timezone(&self.offset)
    }

    async fn prepare_inner(&mut self) -> Result<NamespaceName, ProbeError> {
        if let Some(name) = &self.namespace {
            return Ok(name.clone());
        }
        let workspace = &self.config.workspace_dir;
        tokio::fs::create_dir_all(workspace)
            .await
            .map_err(|e| ProbeError::io(workspace, e))?;

        let ensured = NamespaceManager::new(self.network.clone())
            .ensure(&self.config.namespace, &self.owner)
            .await?;
        info!(gateway = %self.config.gateway.url, "Gateway: {}", self.config.gateway.url);
        self.namespace = Some(ensured.name.clone());
        Ok(ensured.name)
    }

    /// Fold a phase sample into its series and log it.
    fn record(&mut self, series: SeriesKind, elapsed: Duration, iteration: u64) -> u64 {
        let n = match self.config.counter_mode {
            CounterMode::PerSeries => self.metrics.next_index(series),
            CounterMode::Global => iteration,
        };
        let sample_ms = elapsed.as_millis() as u64;
        let average_ms = self.metrics.update(series, sample_ms, n);
        self.observer.phase_completed(series, elapsed, average_ms);

        let avg = Duration::from_millis(average_ms);
        let label = match series {
            SeriesKind::GatewayUpload => "File uploaded to Gateway in",
            SeriesKind::Replication => "File uploaded to Miners in",
            SeriesKind::Deal => "Deal found in",
            SeriesKind::Download => "File downloaded in",
        };
        info!(
            series = series.as_str(),
            elapsed_ms = sample_ms,
            avg_ms = average_ms,
            iteration,
            "{label}: {elapsed:?} Avg.: {avg:?}"
        );
        average_ms
    }

    /// Drive `it` through one full cycle. Returns the issued identifier and
    /// the number of namespace listings replication took.
    async fn execute(
        &mut self,
        it: &mut ProbeIteration,
    ) -> Result<(ContentIdentifier, u32), ProbeError> {
        let namespace = self.prepare_inner().await?;

        info!(
            iteration = it.number,
            "--------Uploading File - #{} - {}--------",
            it.number,
            self.now()
        );

        let payload = self.generator.generate()?;
        it.payload_path = Some(payload.path.clone());
        it.payload_bytes = payload.size_bytes;
        it.transition_to(IterationPhase::Generated)?;
        info!(bytes = payload.size_bytes, "FileSize: {}MB", payload.size_bytes / MIB);

        let mut attempt = 0u32;
        let receipt = loop {
            attempt += 1;
            match self.uploader.upload(&payload.path, &namespace).await {
                Ok(receipt) => break receipt,
                Err(e) => self.retry_or_fail("upload", e, attempt).await?,
            }
        };
        it.cid = Some(receipt.cid.clone());
        it.timings.gateway_upload = Some(receipt.elapsed);
        it.transition_to(IterationPhase::UploadedToGateway)?;
        self.record(SeriesKind::GatewayUpload, receipt.elapsed, it.number);

        self.ledger.append(&UploadRecord {
            cid: receipt.cid.clone(),
            display_name: self.config.file_name.clone(),
            origin: self.origin,
            timestamp: self.now(),
        })?;

        it.transition_to(IterationPhase::AwaitingReplication)?;
        let outcome = self
            .poller
            .await_replication(&namespace, &receipt.cid, self.observer.as_ref(), &mut self.shutdown)
            .await?;
        for &deal in &outcome.deals {
            it.timings.deal = Some(deal);
            self.record(SeriesKind::Deal, deal, it.number);
        }
        it.timings.replication = Some(outcome.replication);
        it.transition_to(IterationPhase::Replicated)?;
        self.record(SeriesKind::Replication, outcome.replication, it.number);

        let dest = download_path(&self.config.workspace_dir, &receipt.cid, &self.config.file_name);
        let mut attempt = 0u32;
        let downloaded = loop {
            attempt += 1;
            match self.retriever.retrieve(&receipt.cid, &dest, &payload.path).await {
                Ok(elapsed) => break elapsed,
                Err(e) => self.retry_or_fail("download", e, attempt).await?,
            }
        };
        it.timings.download = Some(downloaded);
        it.transition_to(IterationPhase::Downloaded)?;
        self.record(SeriesKind::Download, downloaded, it.number);

        it.transition_to(IterationPhase::Idle)?;
        Ok((receipt.cid, outcome.attempts))
    }

    /// Sleep and return `Ok` if `err` may be retried, else return `err`.
    async fn retry_or_fail(
        &mut self,
        operation: &'static str,
        err: ProbeError,
        attempt: u32,
    ) -> Result<(), ProbeError> {
        let retry = err
            .network_class()
            .is_some_and(|class| self.config.failure_policy.should_retry(class, attempt));
        if !retry {
            return Err(err);
        }
        let delay = RETRY_BACKOFF.delay_after(attempt);
        warn!(operation, attempt, delay_ms = delay.as_millis() as u64, error = %err, "Transient failure, retrying");
        self.shutdown.sleep(delay).await
    }

    async fn run_iteration_inner(&mut self) -> Result<IterationReport, ProbeError> {
        if self.shutdown.is_triggered() {
            return Err(ProbeError::Cancelled);
        }
        let mut it = ProbeIteration::new(self.completed + 1);
        let (cid, replication_polls) = match self.execute(&mut it).await {
            Ok(done) => done,
            Err(e) => {
                if !matches!(e, ProbeError::Cancelled) {
                    error!(iteration = it.number, phase = ?it.phase(), error = %e, "Iteration failed");
                }
                self.observer.iteration_failed(it.phase(), &e);
                return Err(e);
            }
        };

        self.completed = it.number;
        let report = IterationReport {
            number: it.number,
            cid,
            payload_bytes: it.payload_bytes,
            timings: it.timings,
            replication_polls,
            averages: self.metrics.snapshot(),
        };
        self.observer.iteration_completed(&report);
        debug!(iteration = report.number, "Iteration complete");
        Ok(report)
    }
}

#[async_trait]
impl<N: StorageNetwork + 'static, O: ProbeObserver + 'static> ProbeApi for ProbeService<N, O> {
    async fn prepare(&mut self) -> Result<NamespaceName, ProbeError> {
        self.prepare_inner().await
    }

    async fn run_iteration(&mut self) -> Result<IterationReport, ProbeError> {
        self.run_iteration_inner().await
    }

    async fn run(&mut self) -> Result<RunSummary, ProbeError> {
        self.prepare_inner().await?;
        let stopped_by = loop {
            if self
                .config
                .max_iterations
                .is_some_and(|max| self.completed >= max)
            {
                break StopReason::IterationLimit;
            }
            match self.run_iteration_inner().await {
                Ok(_) => {}
                Err(ProbeError::Cancelled) => break StopReason::Shutdown,
                Err(e) => return Err(e),
            }
        };
        info!(iterations = self.completed, reason = ?stopped_by, "Probe stopped");
        Ok(RunSummary {
            iterations: self.completed,
            stopped_by,
            averages: self.metrics.snapshot(),
        })
    }

    fn completed_iterations(&self) -> u64 {
        self.completed
    }

    fn metrics_snapshot(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }
}
