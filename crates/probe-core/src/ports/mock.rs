//! # Mock Storage Network
//!
//! Scriptable in-memory implementation of [`StorageNetwork`] for tests.
//!
//! Replication and deal discovery are delayed by a number of queries, not by
//! time, so a test controls exactly how many polls an upload needs. Gateway
//! latency uses `tokio::time::sleep` and therefore advances instantly under
//! a paused test clock.

use std::collections::{HashMap, VecDeque};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;

use super::outbound::{StorageNetwork, StorageOrder};
use crate::domain::{AccountId, ContentIdentifier, Gateway, NamespaceName, NetworkError};

/// Per-capability call counters.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MockCalls {
    pub create_namespace: u32,
    pub list_namespaces: u32,
    pub namespace_contents: u32,
    pub query_deal: u32,
    pub upload: u32,
    pub download: u32,
    pub authorize_gateway: u32,
}

#[derive(Default)]
struct MockState {
    namespaces: HashMap<AccountId, Vec<String>>,
    objects: HashMap<String, Vec<ContentIdentifier>>,
    stored: HashMap<ContentIdentifier, Vec<u8>>,
    pending_replication: HashMap<ContentIdentifier, (String, u32)>,
    pending_deals: HashMap<ContentIdentifier, u32>,
    issued: VecDeque<ContentIdentifier>,
    replication_after: u32,
    deal_after: u32,
    deal_schedule: VecDeque<u32>,
    upload_latency: Duration,
    download_latency: Duration,
    upload_failures: VecDeque<NetworkError>,
    download_failures: VecDeque<NetworkError>,
    contents_failures: VecDeque<NetworkError>,
    create_failures: VecDeque<NetworkError>,
    deal_failures: VecDeque<NetworkError>,
    authorize_failure: Option<NetworkError>,
    corrupt_downloads: bool,
    upload_seq: u64,
    tx_seq: u64,
    calls: MockCalls,
}

/// In-memory storage network.
#[derive(Clone, Default)]
pub struct MockStorageNetwork {
    state: Arc<Mutex<MockState>>,
}

impl MockStorageNetwork {
    /// Empty network: no namespaces, instant replication and deals.
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-create a namespace for `owner`.
    pub fn with_namespace(self, owner: AccountId, name: &str) -> Self {
        {
            let mut s = self.state.lock();
            s.namespaces.entry(owner).or_default().push(name.to_string());
            s.objects.entry(name.to_string()).or_default();
        }
        self
    }

    /// Identifiers handed out by the next uploads, in order.
    pub fn with_identifiers<I, S>(self, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.state
            .lock()
            .issued
            .extend(ids.into_iter().map(ContentIdentifier::new));
        self
    }

    /// Uploaded objects stay unlisted for `polls` namespace queries.
    pub fn with_replication_after(self, polls: u32) -> Self {
        self.state.lock().replication_after = polls;
        self
    }

    /// Storage orders answer `NotFound` for the first `queries` queries.
    pub fn with_deal_after(self, queries: u32) -> Self {
        self.state.lock().deal_after = queries;
        self
    }

    /// Per-upload deal delays for the next uploads, in order. Later uploads
    /// fall back to [`with_deal_after`](Self::with_deal_after).
    pub fn with_deal_schedule<I: IntoIterator<Item = u32>>(self, delays: I) -> Self {
        self.state.lock().deal_schedule.extend(delays);
        self
    }

    /// Simulated gateway upload time.
    pub fn with_upload_latency(self, latency: Duration) -> Self {
        self.state.lock().upload_latency = latency;
        self
    }

    /// Simulated gateway download time.
    pub fn with_download_latency(self, latency: Duration) -> Self {
        self.state.lock().download_latency = latency;
        self
    }

    /// Next upload fails with `err`.
    pub fn fail_next_upload(self, err: NetworkError) -> Self {
        self.state.lock().upload_failures.push_back(err);
        self
    }

    /// Next download fails with `err`.
    pub fn fail_next_download(self, err: NetworkError) -> Self {
        self.state.lock().download_failures.push_back(err);
        self
    }

    /// Next namespace listing fails with `err`.
    pub fn fail_next_listing(self, err: NetworkError) -> Self {
        self.state.lock().contents_failures.push_back(err);
        self
    }

    /// Next namespace creation fails with `err`.
    pub fn fail_next_create(self, err: NetworkError) -> Self {
        self.state.lock().create_failures.push_back(err);
        self
    }

    /// Next storage-order query fails with `err`.
    pub fn fail_next_deal_query(self, err: NetworkError) -> Self {
        self.state.lock().deal_failures.push_back(err);
        self
    }

    /// Every gateway authorisation fails with `err`.
    pub fn fail_authorization(self, err: NetworkError) -> Self {
        self.state.lock().authorize_failure = Some(err);
        self
    }

    /// Downloads return content that differs from the upload.
    pub fn with_corrupt_downloads(self) -> Self {
        self.state.lock().corrupt_downloads = true;
        self
    }

    /// Snapshot of the call counters.
    pub fn calls(&self) -> MockCalls {
        self.state.lock().calls.clone()
    }

    /// Objects currently listed in `name`.
    pub fn listed(&self, name: &str) -> Vec<ContentIdentifier> {
        self.state
            .lock()
            .objects
            .get(name)
            .cloned()
            .unwrap_or_default()
    }
}

#[async_trait]
impl StorageNetwork for MockStorageNetwork {
    async fn create_namespace(
        &self,
        owner: &AccountId,
        name: &NamespaceName,
    ) -> Result<String, NetworkError> {
        let mut s = self.state.lock();
        s.calls.create_namespace += 1;
        if let Some(err) = s.create_failures.pop_front() {
            return Err(err);
        }
        let owned = s.namespaces.entry(*owner).or_default();
        if owned.iter().any(|n| n == name.as_str()) {
            return Err(NetworkError::Permanent(format!(
                "namespace {name} already exists"
            )));
        }
        owned.push(name.to_string());
        s.objects.entry(name.to_string()).or_default();
        s.tx_seq += 1;
        Ok(format!("0xmock-tx-{:04}", s.tx_seq))
    }

    async fn list_namespaces(&self, owner: &AccountId) -> Result<Vec<String>, NetworkError> {
        let mut s = self.state.lock();
        s.calls.list_namespaces += 1;
        Ok(s.namespaces.get(owner).cloned().unwrap_or_default())
    }

    async fn namespace_contents(
        &self,
        _owner: &AccountId,
        name: &NamespaceName,
    ) -> Result<Vec<ContentIdentifier>, NetworkError> {
        let mut s = self.state.lock();
        s.calls.namespace_contents += 1;
        if let Some(err) = s.contents_failures.pop_front() {
            return Err(err);
        }

        let mut ready = Vec::new();
        for (cid, (ns, remaining)) in s.pending_replication.iter_mut() {
            if ns != name.as_str() {
                continue;
            }
            if *remaining == 0 {
                ready.push(cid.clone());
            } else {
                *remaining -= 1;
            }
        }
        for cid in ready {
            s.pending_replication.remove(&cid);
            s.objects.entry(name.to_string()).or_default().push(cid);
        }

        s.objects
            .get(name.as_str())
            .cloned()
            .ok_or_else(|| NetworkError::NotFound(format!("namespace {name}")))
    }

    async fn query_deal(&self, cid: &ContentIdentifier) -> Result<StorageOrder, NetworkError> {
        let mut s = self.state.lock();
        s.calls.query_deal += 1;
        if let Some(err) = s.deal_failures.pop_front() {
            return Err(err);
        }
        let size = match s.stored.get(cid) {
            Some(bytes) => bytes.len() as u64,
            None => return Err(NetworkError::NotFound(format!("storage order {cid}"))),
        };
        match s.pending_deals.get_mut(cid) {
            Some(remaining) if *remaining > 0 => {
                *remaining -= 1;
                Err(NetworkError::NotFound(format!("storage order {cid}")))
            }
            _ => Ok(StorageOrder {
                cid: cid.clone(),
                file_size: size,
                assigned_miners: Vec::new(),
            }),
        }
    }

    async fn upload(
        &self,
        _gateway: &Gateway,
        payload: &Path,
        namespace: &NamespaceName,
    ) -> Result<ContentIdentifier, NetworkError> {
        let latency = {
            let mut s = self.state.lock();
            s.calls.upload += 1;
            if let Some(err) = s.upload_failures.pop_front() {
                return Err(err);
            }
            s.upload_latency
        };

        let bytes = tokio::fs::read(payload)
            .await
            .map_err(|e| NetworkError::Permanent(format!("read {}: {e}", payload.display())))?;
        if !latency.is_zero() {
            tokio::time::sleep(latency).await;
        }

        let mut s = self.state.lock();
        s.upload_seq += 1;
        let seq = s.upload_seq;
        let cid = s
            .issued
            .pop_front()
            .unwrap_or_else(|| ContentIdentifier::new(format!("mock-fid-{seq:04}")));
        let replication_after = s.replication_after;
        let deal_after = s.deal_schedule.pop_front().unwrap_or(s.deal_after);
        s.stored.insert(cid.clone(), bytes);
        s.pending_replication
            .insert(cid.clone(), (namespace.to_string(), replication_after));
        s.pending_deals.insert(cid.clone(), deal_after);
        Ok(cid)
    }

    async fn download(
        &self,
        _gateway: &Gateway,
        cid: &ContentIdentifier,
        dest: &Path,
    ) -> Result<(), NetworkError> {
        let (latency, mut bytes, corrupt) = {
            let mut s = self.state.lock();
            s.calls.download += 1;
            if let Some(err) = s.download_failures.pop_front() {
                return Err(err);
            }
            let bytes = s
                .stored
                .get(cid)
                .cloned()
                .ok_or_else(|| NetworkError::NotFound(format!("object {cid}")))?;
            (s.download_latency, bytes, s.corrupt_downloads)
        };

        if !latency.is_zero() {
            tokio::time::sleep(latency).await;
        }
        if corrupt {
            match bytes.first_mut() {
                Some(b) => *b = b.wrapping_add(1),
                None => bytes.push(0),
            }
        }
        tokio::fs::write(dest, bytes)
            .await
            .map_err(|e| NetworkError::Permanent(format!("write {}: {e}", dest.display())))
    }

    async fn authorize_gateway(&self, _gateway: &Gateway) -> Result<Option<String>, NetworkError> {
        let mut s = self.state.lock();
        s.calls.authorize_gateway += 1;
        match &s.authorize_failure {
            Some(err) => Err(err.clone()),
            None => {
                s.tx_seq += 1;
                Ok(Some(format!("0xmock-tx-{:04}", s.tx_seq)))
            }
        }
    }
}
