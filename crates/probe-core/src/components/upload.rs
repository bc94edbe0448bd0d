//! # Upload Coordinator
//!
//! Pushes a payload through the gateway and times the call. The gateway's
//! space allowance is authorised once, before the first upload.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use tokio::time::Instant;
use tracing::{info, warn};

use crate::domain::{ContentIdentifier, Gateway, NamespaceName, NetworkError, ProbeError};
use crate::ports::StorageNetwork;

/// Successful upload.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UploadReceipt {
    /// Identifier issued by the network.
    pub cid: ContentIdentifier,
    /// Duration of the gateway upload call alone.
    pub elapsed: Duration,
}

/// Gateway upload driver.
pub struct UploadCoordinator<N: StorageNetwork> {
    network: Arc<N>,
    gateway: Gateway,
    authorized: bool,
}

impl<N: StorageNetwork> UploadCoordinator<N> {
    pub fn new(network: Arc<N>, gateway: Gateway) -> Self {
        Self {
            network,
            gateway,
            authorized: false,
        }
    }

    /// Gateway this coordinator uploads through.
    pub fn gateway(&self) -> &Gateway {
        &self.gateway
    }

    /// Authorise the gateway account, once per coordinator.
    ///
    /// A network answering that the account is already authorised counts as
    /// success.
    pub async fn authorize(&mut self) -> Result<(), ProbeError> {
        if self.authorized {
            return Ok(());
        }
        match self.network.authorize_gateway(&self.gateway).await {
            Ok(Some(tx)) => info!(gateway = %self.gateway.account, tx = %tx, "Authorized gateway space"),
            Ok(None) => {}
            Err(NetworkError::Permanent(msg)) if is_already_authorized(&msg) => {
                warn!(gateway = %self.gateway.account, "Gateway already authorized");
            }
            Err(e) => return Err(ProbeError::network("authorize_gateway", e)),
        }
        self.authorized = true;
        Ok(())
    }

    /// Upload `payload` into `namespace`. Authorises first if needed.
    pub async fn upload(
        &mut self,
        payload: &Path,
        namespace: &NamespaceName,
    ) -> Result<UploadReceipt, ProbeError> {
        self.authorize().await?;

        let start = Instant::now();
        let cid = self
            .network
            .upload(&self.gateway, payload, namespace)
            .await
            .map_err(ProbeError::Upload)?;
        let elapsed = start.elapsed();

        info!(fid = %cid, "FID: {cid}");
        Ok(UploadReceipt { cid, elapsed })
    }
}

fn is_already_authorized(msg: &str) -> bool {
    let msg = msg.to_ascii_lowercase();
    msg.contains("already") && (msg.contains("authoriz") || msg.contains("authoris"))
}
