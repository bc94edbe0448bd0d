//! # Storage Probe
//!
//! Long-running probe of a decentralized storage network: generate a random
//! payload, upload it through a gateway, wait until the network lists it,
//! download it back, and keep rolling averages of every phase.
//!
//! Exits non-zero on any fatal error.

use anyhow::Result;
use clap::Parser;
use tracing::error;

use probe_runtime::Args;

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    if let Err(e) = probe_runtime::run(args).await {
        error!("{e:#}");
        return Err(e);
    }
    Ok(())
}
