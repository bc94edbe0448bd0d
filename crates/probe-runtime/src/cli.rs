//! Command line of the `storage-probe` binary.

use std::path::PathBuf;

use clap::Parser;

/// Environment variable holding the seed phrase unless `--seed-env` says otherwise.
pub const DEFAULT_SEED_ENV: &str = "CESS_MNEMONIC";

#[derive(Parser, Debug, Default)]
#[command(name = "storage-probe")]
#[command(author, version, about = "End-to-end probe of a decentralized storage network", long_about = None)]
pub struct Args {
    /// TOML configuration file
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// RPC endpoint (repeat for fail-over order)
    #[arg(long = "rpc")]
    pub rpc: Vec<String>,

    /// Gateway base URL
    #[arg(long)]
    pub gateway_url: Option<String>,

    /// Account address of the gateway
    #[arg(long)]
    pub gateway_account: Option<String>,

    /// Workspace directory for payloads, downloads and the ledger
    #[arg(long)]
    pub workspace: Option<PathBuf>,

    /// Payload file name inside the workspace
    #[arg(long)]
    pub file_name: Option<String>,

    /// Target namespace
    #[arg(long)]
    pub namespace: Option<String>,

    /// Smallest payload in MiB
    #[arg(long)]
    pub min_size: Option<u32>,

    /// Largest payload in MiB
    #[arg(long)]
    pub max_size: Option<u32>,

    /// P2P port
    #[arg(long)]
    pub p2p_port: Option<u16>,

    /// Bootstrap peer (repeatable)
    #[arg(long = "bootstrap")]
    pub bootstrap: Vec<String>,

    /// Seconds between namespace listings
    #[arg(long)]
    pub replication_interval_secs: Option<u64>,

    /// Give up replication polling after this many listings
    #[arg(long)]
    pub replication_max_attempts: Option<u32>,

    /// Seconds between storage order queries
    #[arg(long)]
    pub deal_interval_secs: Option<u64>,

    /// Give up deal polling after this many queries
    #[arg(long)]
    pub deal_max_attempts: Option<u32>,

    /// Identifier comparison: fixed-width or full-length
    #[arg(long, value_parser = ["fixed-width", "full-length"])]
    pub identifier_match: Option<String>,

    /// Average counter: per-series or global
    #[arg(long, value_parser = ["per-series", "global"])]
    pub counter_mode: Option<String>,

    /// Retry transient upload/download failures, N attempts in total
    #[arg(long, value_name = "N")]
    pub retry_transient: Option<u32>,

    /// Keep downloaded copies in the workspace
    #[arg(long)]
    pub keep_downloads: bool,

    /// Delete the generated payload after each iteration
    #[arg(long)]
    pub remove_generated: bool,

    /// Stop after N iterations
    #[arg(long, value_name = "N")]
    pub iterations: Option<u64>,

    /// Directory of the per-run log files
    #[arg(long)]
    pub log_dir: Option<PathBuf>,

    /// Environment variable holding the seed phrase
    #[arg(long, default_value = DEFAULT_SEED_ENV)]
    pub seed_env: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_flags() {
        let args = Args::try_parse_from(["storage-probe"]).unwrap();
        assert!(args.rpc.is_empty());
        assert_eq!(args.seed_env, "CESS_MNEMONIC");
        assert!(!args.keep_downloads);
        assert_eq!(args.iterations, None);
    }

    #[test]
    fn test_repeated_and_valued_flags() {
        let args = Args::try_parse_from([
            "storage-probe",
            "--rpc",
            "ws://a:9944",
            "--rpc",
            "ws://b:9944",
            "--namespace",
            "probe",
            "--iterations",
            "3",
            "--retry-transient",
            "4",
            "--counter-mode",
            "global",
            "--keep-downloads",
        ])
        .unwrap();
        assert_eq!(args.rpc, vec!["ws://a:9944", "ws://b:9944"]);
        assert_eq!(args.namespace.as_deref(), Some("probe"));
        assert_eq!(args.iterations, Some(3));
        assert_eq!(args.retry_transient, Some(4));
        assert_eq!(args.counter_mode.as_deref(), Some("global"));
        assert!(args.keep_downloads);
    }

    #[test]
    fn test_unknown_identifier_match_rejected() {
        assert!(Args::try_parse_from(["storage-probe", "--identifier-match", "prefix"]).is_err());
    }
}
