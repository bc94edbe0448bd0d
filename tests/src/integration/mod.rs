//! Cross-component scenarios.

pub mod failures;
pub mod ledger;
pub mod namespace;
pub mod probe_loop;

use std::path::Path;
use std::sync::Arc;

use probe_core::{AccountId, MockStorageNetwork, ProbeConfig, ProbeService};

/// Account the probe runs as in every scenario.
pub const OWNER: AccountId = AccountId([7; 32]);

/// Probe over `net` with its workspace under `dir`.
pub fn probe(
    dir: &Path,
    net: &Arc<MockStorageNetwork>,
    tweak: impl FnOnce(&mut ProbeConfig),
) -> ProbeService<MockStorageNetwork> {
    let mut config = ProbeConfig::for_testing(dir.join("CESS_STORAGE"));
    tweak(&mut config);
    ProbeService::new(config, Arc::clone(net), OWNER)
        .expect("valid test configuration")
        .with_payload_seed(7)
}
