//! # Storage Network Client
//!
//! [`StorageNetwork`] adapter combining the JSON-RPC chain client, the
//! gateway client and the seed keyring.
//!
//! ## RPC surface
//!
//! | Capability | Method | Params |
//! |------------|--------|--------|
//! | List namespaces | `fileBank_queryAllBucketName` | `[owner]` |
//! | Namespace contents | `fileBank_queryBucketInfo` | `[owner, name]` |
//! | Storage order | `fileBank_queryDealMap` | `[fid]` |
//! | Create namespace | `fileBank_createBucket` | `[owner, name, message, signature]` |
//! | Authorise gateway | `oss_authorize` | `[owner, gateway, message, signature]` |
//!
//! `owner` is the `0x`-prefixed hex public key. A `null` result means the
//! item does not exist.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use probe_core::{
    AccountId, ContentIdentifier, Gateway, NamespaceName, NetworkError, ProbeError,
    StorageNetwork, StorageOrder,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::RpcError;
use crate::gateway::GatewayClient;
use crate::keyring::Keyring;
use crate::rpc::RpcClient;

/// Default RPC nodes.
pub const DEFAULT_RPC_ENDPOINTS: [&str; 2] = [
    "wss://testnet-rpc0.cess.cloud/ws/",
    "wss://testnet-rpc1.cess.cloud/ws/",
];

/// Default bootstrap peer.
pub const DEFAULT_BOOTSTRAP: &str = "_dnsaddr.boot-kldr-testnet.cess.cloud";

/// Connection settings of the network client.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NetworkClientConfig {
    /// RPC nodes, tried in order.
    pub rpc_endpoints: Vec<String>,
    /// P2P listen port announced to the gateway.
    pub p2p_port: u16,
    /// Bootstrap peer addresses.
    pub bootstrap_peers: Vec<String>,
    /// Local working directory of the client.
    pub workspace_dir: PathBuf,
    /// Transaction timeout in seconds.
    pub tx_timeout_secs: u64,
    /// Query timeout in seconds.
    pub request_timeout_secs: u64,
    /// Gateway upload/download timeout in seconds.
    pub transfer_timeout_secs: u64,
}

impl Default for NetworkClientConfig {
    fn default() -> Self {
        Self {
            rpc_endpoints: DEFAULT_RPC_ENDPOINTS.iter().map(|s| s.to_string()).collect(),
            p2p_port: 4003,
            bootstrap_peers: vec![DEFAULT_BOOTSTRAP.to_string()],
            workspace_dir: PathBuf::from("./CESS_STORAGE"),
            tx_timeout_secs: 10,
            request_timeout_secs: 30,
            transfer_timeout_secs: 300,
        }
    }
}

impl NetworkClientConfig {
    /// Reject settings the client cannot start with.
    pub fn validate(&self) -> Result<(), ProbeError> {
        if self.rpc_endpoints.iter().all(|e| e.trim().is_empty()) {
            return Err(ProbeError::Config("at least one RPC endpoint is required".into()));
        }
        if self.tx_timeout_secs == 0 || self.request_timeout_secs == 0 {
            return Err(ProbeError::Config("RPC timeouts must be non-zero".into()));
        }
        Ok(())
    }
}

/// Namespace info as returned by `fileBank_queryBucketInfo`.
#[derive(Debug, Deserialize)]
struct BucketInfo {
    #[serde(default, alias = "objectsList")]
    objects_list: Vec<String>,
}

/// Storage order as returned by `fileBank_queryDealMap`.
#[derive(Debug, Deserialize)]
struct DealInfo {
    #[serde(default, alias = "fileSize")]
    file_size: u64,
    #[serde(default, alias = "assignedMiners")]
    assigned_miners: Vec<String>,
}

/// Network client used by the probe in production.
#[derive(Debug)]
pub struct StorageNetworkClient {
    config: NetworkClientConfig,
    rpc: RpcClient,
    gateway: GatewayClient,
    keyring: Arc<Keyring>,
    chain: String,
}

impl StorageNetworkClient {
    /// Build the client from `config` and the operator's seed phrase and
    /// connect to the first reachable RPC node.
    pub async fn connect(config: NetworkClientConfig, seed_phrase: &str) -> Result<Self, ProbeError> {
        config.validate()?;
        let keyring =
            Keyring::from_seed_phrase(seed_phrase).map_err(|e| ProbeError::Config(e.to_string()))?;

        tokio::fs::create_dir_all(&config.workspace_dir)
            .await
            .map_err(|e| ProbeError::io(&config.workspace_dir, e))?;

        let endpoints: Vec<String> = config
            .rpc_endpoints
            .iter()
            .filter(|e| !e.trim().is_empty())
            .cloned()
            .collect();
        let rpc = RpcClient::new(
            &endpoints,
            Duration::from_secs(config.request_timeout_secs),
            Duration::from_secs(config.tx_timeout_secs),
        )
        .map_err(connect_error)?;
        let chain = rpc.connect().await.map_err(connect_error)?;
        let gateway = GatewayClient::new(Duration::from_secs(config.transfer_timeout_secs))
            .map_err(connect_error)?;

        info!(
            account = %keyring.account_id(),
            chain = %chain,
            p2p_port = config.p2p_port,
            bootstrap = ?config.bootstrap_peers,
            "Storage network client ready"
        );

        Ok(Self {
            config,
            rpc,
            gateway,
            keyring: Arc::new(keyring),
            chain,
        })
    }

    /// Account the client signs as.
    pub fn account_id(&self) -> AccountId {
        self.keyring.account_id()
    }

    /// Chain name reported at connect time.
    pub fn chain(&self) -> &str {
        &self.chain
    }

    /// Connection settings.
    pub fn config(&self) -> &NetworkClientConfig {
        &self.config
    }

    /// Workspace directory of the client.
    pub fn workspace(&self) -> &Path {
        &self.config.workspace_dir
    }

    /// `[owner, arg, message, signature]` for a signed call.
    fn signed_params(&self, method: &str, arg: &str) -> Vec<String> {
        let owner = self.keyring.account_id().to_hex();
        let message = format!("{method}:{owner}:{arg}");
        let signature = self.keyring.sign(message.as_bytes());
        vec![owner, arg.to_string(), message, format!("0x{}", hex::encode(signature))]
    }
}

fn connect_error(e: RpcError) -> ProbeError {
    ProbeError::Connect(e.to_string())
}

#[async_trait]
impl StorageNetwork for StorageNetworkClient {
    async fn create_namespace(
        &self,
        _owner: &AccountId,
        name: &NamespaceName,
    ) -> Result<String, NetworkError> {
        let method = "fileBank_createBucket";
        let params = self.signed_params(method, name.as_str());
        let tx: String = self.rpc.submit(method, &params).await?;
        Ok(tx)
    }

    async fn list_namespaces(&self, owner: &AccountId) -> Result<Vec<String>, NetworkError> {
        let params = vec![owner.to_hex()];
        match self
            .rpc
            .call::<_, Vec<String>>("fileBank_queryAllBucketName", &params)
            .await
        {
            Ok(names) => Ok(names),
            Err(RpcError::NotFound(_)) => Ok(Vec::new()),
            Err(e) => Err(e.into()),
        }
    }

    async fn namespace_contents(
        &self,
        owner: &AccountId,
        name: &NamespaceName,
    ) -> Result<Vec<ContentIdentifier>, NetworkError> {
        let params = vec![owner.to_hex(), name.to_string()];
        let info: BucketInfo = self.rpc.call("fileBank_queryBucketInfo", &params).await?;
        Ok(info
            .objects_list
            .into_iter()
            .map(ContentIdentifier::new)
            .collect())
    }

    async fn query_deal(&self, cid: &ContentIdentifier) -> Result<StorageOrder, NetworkError> {
        let params = vec![cid.to_string()];
        let deal: DealInfo = self.rpc.call("fileBank_queryDealMap", &params).await?;
        Ok(StorageOrder {
            cid: cid.clone(),
            file_size: deal.file_size,
            assigned_miners: deal.assigned_miners,
        })
    }

    async fn upload(
        &self,
        gateway: &Gateway,
        payload: &Path,
        namespace: &NamespaceName,
    ) -> Result<ContentIdentifier, NetworkError> {
        Ok(self
            .gateway
            .upload(gateway, payload, namespace, &self.keyring)
            .await?)
    }

    async fn download(
        &self,
        gateway: &Gateway,
        cid: &ContentIdentifier,
        dest: &Path,
    ) -> Result<(), NetworkError> {
        let bytes = self
            .gateway
            .download(gateway, cid, dest, &self.keyring)
            .await?;
        debug!(fid = %cid, bytes, "Downloaded");
        Ok(())
    }

    async fn authorize_gateway(&self, gateway: &Gateway) -> Result<Option<String>, NetworkError> {
        let method = "oss_authorize";
        let params = self.signed_params(method, &gateway.account);
        let tx: String = self.rpc.submit(method, &params).await?;
        Ok(Some(tx))
    }
}
