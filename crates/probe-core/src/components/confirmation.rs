//! # Confirmation Poller
//!
//! Waits for an uploaded identifier to show up in the namespace listing.
//!
//! ```text
//! start ──► list namespace ──► contains cid? ──yes──► Replicated
//!                 ▲                  │ no
//!                 │                  ▼
//!                 │            query deal ──absent──► sleep(deal) + query, until found
//!                 │                  │ present                    │
//!                 │                  ▼                            │
//!                 └──── sleep(replication interval) ◄─────────────┘
//! ```
//!
//! The deal is queried on every pass that does not yet list the identifier.
//! Replication latency runs from the start of the first listing until the
//! listing that contains the identifier, deal waits included. Each deal wait
//! runs from a failed deal query until a query succeeds.
//!
//! Any failed deal query means "no deal yet" and never ends the poll. Both
//! loops are unbounded unless their [`PollPolicy`] sets `max_attempts`.

use std::sync::Arc;
use std::time::Duration;

use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::application::ShutdownSignal;
use crate::domain::{
    AccountId, ContentIdentifier, FailurePolicy, IdentifierMatch, NamespaceName,
    NetworkError, PollPolicy, ProbeError,
};
use crate::ports::{PollKind, ProbeObserver, StorageNetwork};

/// Outcome of a successful confirmation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReplicationOutcome {
    /// Time until the identifier was listed.
    pub replication: Duration,
    /// Deal waits, one per pass whose deal query found nothing.
    pub deals: Vec<Duration>,
    /// Namespace listings made.
    pub attempts: u32,
}

/// Replication and deal confirmation.
pub struct ConfirmationPoller<N: StorageNetwork> {
    network: Arc<N>,
    owner: AccountId,
    replication: PollPolicy,
    deal: PollPolicy,
    matcher: IdentifierMatch,
    failure_policy: FailurePolicy,
}

impl<N: StorageNetwork> ConfirmationPoller<N> {
    pub fn new(
        network: Arc<N>,
        owner: AccountId,
        replication: PollPolicy,
        deal: PollPolicy,
        matcher: IdentifierMatch,
    ) -> Self {
        Self {
            network,
            owner,
            replication,
            deal,
            matcher,
            failure_policy: FailurePolicy::FailFast,
        }
    }

    /// Policy for transient listing and deal-query failures.
    pub fn with_failure_policy(mut self, policy: FailurePolicy) -> Self {
        self.failure_policy = policy;
        self
    }

    /// One listing check: does `namespace` currently list `cid`?
    pub async fn is_replicated(
        &self,
        namespace: &NamespaceName,
        cid: &ContentIdentifier,
    ) -> Result<bool, NetworkError> {
        match self.network.namespace_contents(&self.owner, namespace).await {
            Ok(objects) => Ok(self.matcher.contains(&objects, cid)),
            Err(NetworkError::NotFound(_)) => Ok(false),
            Err(e) => Err(e),
        }
    }

    /// Poll until `cid` is listed in `namespace`.
    pub async fn await_replication<O: ProbeObserver + ?Sized>(
        &self,
        namespace: &NamespaceName,
        cid: &ContentIdentifier,
        observer: &O,
        shutdown: &mut ShutdownSignal,
    ) -> Result<ReplicationOutcome, ProbeError> {
        let start = Instant::now();
        let mut attempts = 0u32;
        let mut transient_failures = 0u32;
        let mut deals = Vec::new();

        loop {
            attempts += 1;
            observer.poll_attempt(PollKind::Replication);

            match self.is_replicated(namespace, cid).await {
                Ok(true) => {
                    let replication = start.elapsed();
                    debug!(fid = %cid, attempts, "Identifier listed in namespace");
                    return Ok(ReplicationOutcome {
                        replication,
                        deals,
                        attempts,
                    });
                }
                Ok(false) => {
                    if let DealStatus::Absent = self.query_deal(cid, observer).await {
                        let waited = self.await_deal(cid, observer, shutdown).await?;
                        info!(fid = %cid, elapsed_ms = waited.as_millis() as u64, "Deal found in: {waited:?}");
                        deals.push(waited);
                    }
                }
                Err(e) => {
                    transient_failures += 1;
                    if !self.failure_policy.should_retry(e.class(), transient_failures) {
                        return Err(ProbeError::network("namespace_contents", e));
                    }
                    warn!(fid = %cid, error = %e, "Namespace listing failed, retrying");
                }
            }

            if self.replication.exhausted(attempts) {
                return Err(ProbeError::RetriesExhausted {
                    operation: "replication poll",
                    attempts,
                });
            }
            shutdown.sleep(self.replication.delay_after(attempts)).await?;
        }
    }

    /// Inner loop: sleep, re-query, until the deal exists. Returns the wait.
    async fn await_deal<O: ProbeObserver + ?Sized>(
        &self,
        cid: &ContentIdentifier,
        observer: &O,
        shutdown: &mut ShutdownSignal,
    ) -> Result<Duration, ProbeError> {
        let start = Instant::now();
        let mut attempts = 0u32;
        loop {
            attempts += 1;
            shutdown.sleep(self.deal.delay_after(attempts)).await?;
            if let DealStatus::Present = self.query_deal(cid, observer).await {
                return Ok(start.elapsed());
            }
            if self.deal.exhausted(attempts) {
                return Err(ProbeError::RetriesExhausted {
                    operation: "deal poll",
                    attempts,
                });
            }
        }
    }

    async fn query_deal<O: ProbeObserver + ?Sized>(
        &self,
        cid: &ContentIdentifier,
        observer: &O,
    ) -> DealStatus {
        observer.poll_attempt(PollKind::Deal);
        match self.network.query_deal(cid).await {
            Ok(_) => DealStatus::Present,
            Err(e) => {
                if !e.is_not_found() {
                    debug!(fid = %cid, error = %e, "Deal query failed, treating as absent");
                }
                DealStatus::Absent
            }
        }
    }
}

enum DealStatus {
    Present,
    Absent,
}
