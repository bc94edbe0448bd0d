//! # Retrieval Coordinator
//!
//! Downloads a payload back through the gateway, times the call, checks the
//! round trip and cleans up the workspace according to [`RetrievalPolicy`].

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use tokio::time::Instant;
use tracing::debug;

use crate::domain::{ContentIdentifier, Gateway, NetworkError, ProbeError, RetrievalPolicy};
use crate::ports::StorageNetwork;

/// Download destination for `cid`: `<workspace>/<cid>_<file_name>`.
pub fn download_path(workspace: &Path, cid: &ContentIdentifier, file_name: &str) -> PathBuf {
    workspace.join(format!("{}_{}", cid, file_name))
}

/// Gateway download driver.
pub struct RetrievalCoordinator<N: StorageNetwork> {
    network: Arc<N>,
    gateway: Gateway,
    policy: RetrievalPolicy,
}

impl<N: StorageNetwork> RetrievalCoordinator<N> {
    pub fn new(network: Arc<N>, gateway: Gateway, policy: RetrievalPolicy) -> Self {
        Self {
            network,
            gateway,
            policy,
        }
    }

    /// Download `cid` to `dest`, verify it against `generated` and clean up.
    ///
    /// Returns the duration of the download call alone.
    pub async fn retrieve(
        &self,
        cid: &ContentIdentifier,
        dest: &Path,
        generated: &Path,
    ) -> Result<Duration, ProbeError> {
        let start = Instant::now();
        self.network
            .download(&self.gateway, cid, dest)
            .await
            .map_err(ProbeError::Download)?;
        let elapsed = start.elapsed();

        if self.policy.verify_content {
            if let Err(e) = verify(dest, generated).await {
                if self.policy.remove_downloaded {
                    remove(dest).await?;
                }
                return Err(e);
            }
            debug!(fid = %cid, "Downloaded content matches payload");
        }
        if self.policy.remove_downloaded {
            remove(dest).await?;
        }
        if self.policy.remove_generated {
            remove(generated).await?;
        }
        Ok(elapsed)
    }
}

async fn verify(downloaded: &Path, generated: &Path) -> Result<(), ProbeError> {
    let got = tokio::fs::read(downloaded)
        .await
        .map_err(|e| ProbeError::io(downloaded, e))?;
    let want = tokio::fs::read(generated)
        .await
        .map_err(|e| ProbeError::io(generated, e))?;
    if got != want {
        return Err(ProbeError::Download(NetworkError::Permanent(format!(
            "content mismatch: downloaded {} bytes, uploaded {} bytes",
            got.len(),
            want.len()
        ))));
    }
    Ok(())
}

async fn remove(path: &Path) -> Result<(), ProbeError> {
    tokio::fs::remove_file(path)
        .await
        .map_err(|e| ProbeError::io(path, e))
}
