//! # Storage Probe Runtime
//!
//! Wires the probe loop to the real storage network.
//!
//! ## Startup Sequence
//!
//! 1. Load configuration (defaults, TOML file, environment, flags)
//! 2. Initialise logging and metrics
//! 3. Read the seed phrase; abort before any network I/O if it is missing
//! 4. Connect the network client (creates the workspace)
//! 5. Wire Ctrl-C to the shutdown signal
//! 6. Run the probe loop until the iteration limit, a stop request, or a
//!    fatal error

#![warn(clippy::all)]

pub mod adapters;
pub mod cli;
pub mod config;

use std::sync::Arc;

use anyhow::{Context, Result};
use probe_core::{ProbeApi, ProbeService, RunSummary, ShutdownSignal};
use probe_network::StorageNetworkClient;
use probe_telemetry::init_telemetry;
use tracing::{info, warn};

pub use adapters::TelemetryObserver;
pub use cli::{Args, DEFAULT_SEED_ENV};
pub use config::{read_seed, RuntimeConfig};

/// Run the probe with process environment variables.
pub async fn run(args: Args) -> Result<RunSummary> {
    let env = |key: &str| std::env::var(key).ok();

    let config = RuntimeConfig::load(&args, env).context("Failed to load configuration")?;
    let logging = init_telemetry(&config.telemetry(env)).context("Failed to initialise telemetry")?;

    info!("===========================================");
    info!("  Storage Probe v{}", env!("CARGO_PKG_VERSION"));
    info!("===========================================");
    if let Some(path) = logging.log_file() {
        info!("Log file: {}", path.display());
    }

    let seed = read_seed(env, &args.seed_env)?;
    let client = StorageNetworkClient::connect(config.network.clone(), &seed)
        .await
        .context("Failed to connect to the storage network")?;
    drop(seed);
    let owner = client.account_id();

    let (shutdown_tx, shutdown) = ShutdownSignal::new();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                info!("Stop requested, finishing current step...");
                let _ = shutdown_tx.send(true);
            }
            Err(e) => warn!(error = %e, "Cannot listen for Ctrl-C"),
        }
    });

    let mut service = ProbeService::new(config.probe, Arc::new(client), owner)?
        .with_observer(Arc::new(TelemetryObserver))
        .with_shutdown(shutdown);

    let summary = service.run().await?;
    info!(
        iterations = summary.iterations,
        stopped_by = ?summary.stopped_by,
        "Probe stopped"
    );
    Ok(summary)
}

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
