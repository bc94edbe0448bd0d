//! # Namespace Manager
//!
//! Create-if-absent for the probe's namespace. Runs once at startup; every
//! failure is fatal.

use std::sync::Arc;

use tracing::info;

use crate::domain::{AccountId, NamespaceName, ProbeError};
use crate::ports::StorageNetwork;

/// Result of [`NamespaceManager::ensure`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NamespaceEnsured {
    /// Validated namespace name.
    pub name: NamespaceName,
    /// Creation transaction hash, `None` when the namespace already existed.
    pub created: Option<String>,
}

/// Ensures the target namespace exists.
pub struct NamespaceManager<N: StorageNetwork> {
    network: Arc<N>,
}

impl<N: StorageNetwork> NamespaceManager<N> {
    pub fn new(network: Arc<N>) -> Self {
        Self { network }
    }

    /// Validate `name`, list the owner's namespaces and create `name` if missing.
    pub async fn ensure(&self, name: &str, owner: &AccountId) -> Result<NamespaceEnsured, ProbeError> {
        let name = NamespaceName::parse(name)?;

        let existing = self
            .network
            .list_namespaces(owner)
            .await
            .map_err(|e| ProbeError::network("list_namespaces", e))?;

        if existing.iter().any(|n| n == name.as_str()) {
            info!(namespace = %name, "Namespace already exists");
            return Ok(NamespaceEnsured { name, created: None });
        }

        info!("Creating bucket...");
        let tx = self
            .network
            .create_namespace(owner, &name)
            .await
            .map_err(|e| ProbeError::network("create_namespace", e))?;
        info!(namespace = %name, tx = %tx, "Bucket ID: {tx}");

        Ok(NamespaceEnsured {
            name,
            created: Some(tx),
        })
    }
}
