//! # Runtime Configuration
//!
//! Layered in this order, later layers winning:
//!
//! 1. Built-in defaults
//! 2. TOML file (`--config`)
//! 3. Environment variables (`PROBE_*`)
//! 4. Command line flags
//!
//! ```toml
//! log_dir = "./logs"
//!
//! [probe]
//! namespace = "random"
//! max_iterations = 10
//!
//! [network]
//! rpc_endpoints = ["wss://testnet-rpc0.cess.cloud/ws/"]
//! ```

use std::path::PathBuf;
use std::time::Duration;

use probe_core::{CounterMode, FailurePolicy, IdentifierMatch, PollPolicy, ProbeConfig, ProbeError};
use probe_network::NetworkClientConfig;
use probe_telemetry::TelemetryConfig;
use serde::{Deserialize, Serialize};

use crate::cli::Args;

/// Complete runtime configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeConfig {
    /// Probe loop settings.
    pub probe: ProbeConfig,
    /// Network client settings.
    pub network: NetworkClientConfig,
    /// Log file directory. `None` keeps the telemetry default.
    pub log_dir: Option<PathBuf>,
}

impl RuntimeConfig {
    /// Parse a TOML configuration file body.
    pub fn from_toml_str(text: &str) -> Result<Self, ProbeError> {
        toml::from_str(text).map_err(|e| ProbeError::Config(format!("invalid config file: {e}")))
    }

    /// Build the configuration from every layer and validate it.
    pub fn load(args: &Args, env: impl Fn(&str) -> Option<String>) -> Result<Self, ProbeError> {
        let mut config = match &args.config {
            Some(path) => {
                let text = std::fs::read_to_string(path).map_err(|e| ProbeError::io(path, e))?;
                Self::from_toml_str(&text)?
            }
            None => Self::default(),
        };
        config.apply_env(&env)?;
        config.apply_args(args)?;
        config.network.workspace_dir = config.probe.workspace_dir.clone();
        config.validate()?;
        Ok(config)
    }

    fn apply_env(&mut self, env: &impl Fn(&str) -> Option<String>) -> Result<(), ProbeError> {
        if let Some(list) = env("PROBE_RPC_ENDPOINTS") {
            self.network.rpc_endpoints = list
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect();
        }
        if let Some(url) = env("PROBE_GATEWAY_URL") {
            self.probe.gateway.url = url;
        }
        if let Some(account) = env("PROBE_GATEWAY_ACCOUNT") {
            self.probe.gateway.account = account;
        }
        if let Some(dir) = env("PROBE_WORKSPACE") {
            self.probe.workspace_dir = PathBuf::from(dir);
        }
        if let Some(namespace) = env("PROBE_NAMESPACE") {
            self.probe.namespace = namespace;
        }
        if let Some(port) = env("PROBE_P2P_PORT") {
            self.network.p2p_port = parse_env("PROBE_P2P_PORT", &port)?;
        }
        if let Some(offset) = env("PROBE_UTC_OFFSET_MINUTES") {
            self.probe.utc_offset_minutes = parse_env("PROBE_UTC_OFFSET_MINUTES", &offset)?;
        }
        if let Some(dir) = env("PROBE_LOG_DIR") {
            self.log_dir = Some(PathBuf::from(dir));
        }
        Ok(())
    }

    fn apply_args(&mut self, args: &Args) -> Result<(), ProbeError> {
        let probe = &mut self.probe;
        let network = &mut self.network;

        if !args.rpc.is_empty() {
            network.rpc_endpoints = args.rpc.clone();
        }
        if let Some(url) = &args.gateway_url {
            probe.gateway.url = url.clone();
        }
        if let Some(account) = &args.gateway_account {
            probe.gateway.account = account.clone();
        }
        if let Some(dir) = &args.workspace {
            probe.workspace_dir = dir.clone();
        }
        if let Some(name) = &args.file_name {
            probe.file_name = name.clone();
        }
        if let Some(namespace) = &args.namespace {
            probe.namespace = namespace.clone();
        }
        if let Some(min) = args.min_size {
            probe.min_size_units = min;
        }
        if let Some(max) = args.max_size {
            probe.max_size_units = max;
        }
        if let Some(port) = args.p2p_port {
            network.p2p_port = port;
        }
        if !args.bootstrap.is_empty() {
            network.bootstrap_peers = args.bootstrap.clone();
        }

        if let Some(secs) = args.replication_interval_secs {
            probe.replication_poll = with_interval(probe.replication_poll, secs);
        }
        if let Some(max) = args.replication_max_attempts {
            probe.replication_poll = probe.replication_poll.with_max_attempts(max);
        }
        if let Some(secs) = args.deal_interval_secs {
            probe.deal_poll = with_interval(probe.deal_poll, secs);
        }
        if let Some(max) = args.deal_max_attempts {
            probe.deal_poll = probe.deal_poll.with_max_attempts(max);
        }

        if let Some(mode) = &args.identifier_match {
            probe.identifier_match = match mode.as_str() {
                "fixed-width" => IdentifierMatch::FixedWidth,
                "full-length" => IdentifierMatch::FullLength,
                other => {
                    return Err(ProbeError::Config(format!("unknown identifier match {other:?}")))
                }
            };
        }
        if let Some(mode) = &args.counter_mode {
            probe.counter_mode = mode.parse::<CounterMode>().map_err(ProbeError::Config)?;
        }
        if let Some(max_attempts) = args.retry_transient {
            probe.failure_policy = FailurePolicy::RetryTransient { max_attempts };
        }
        if args.keep_downloads {
            probe.retrieval.remove_downloaded = false;
        }
        if args.remove_generated {
            probe.retrieval.remove_generated = true;
        }
        if let Some(n) = args.iterations {
            probe.max_iterations = Some(n);
        }
        if let Some(dir) = &args.log_dir {
            self.log_dir = Some(dir.clone());
        }
        Ok(())
    }

    /// Reject settings the probe cannot start with.
    pub fn validate(&self) -> Result<(), ProbeError> {
        self.network.validate()?;
        self.probe.validate()
    }

    /// Telemetry settings: environment first, then this configuration.
    pub fn telemetry(&self, env: impl Fn(&str) -> Option<String>) -> TelemetryConfig {
        let mut telemetry = TelemetryConfig::from_lookup(env);
        if let Some(dir) = &self.log_dir {
            telemetry.log_dir = Some(dir.clone());
        }
        telemetry.utc_offset_minutes = self.probe.utc_offset_minutes;
        telemetry
    }
}

fn with_interval(policy: PollPolicy, secs: u64) -> PollPolicy {
    PollPolicy {
        interval_ms: Duration::from_secs(secs).as_millis() as u64,
        ..policy
    }
}

fn parse_env<T: std::str::FromStr>(name: &str, value: &str) -> Result<T, ProbeError> {
    value
        .trim()
        .parse()
        .map_err(|_| ProbeError::Config(format!("{name}={value:?} is not valid")))
}

/// Seed phrase from environment variable `var`.
///
/// Checked before any network I/O; a missing or blank value is a
/// configuration error.
pub fn read_seed(env: impl Fn(&str) -> Option<String>, var: &str) -> Result<String, ProbeError> {
    match env(var) {
        Some(seed) if !seed.trim().is_empty() => Ok(seed),
        _ => Err(ProbeError::Config(format!(
            "Please set your Mnemonic seed, export {var}=<YOUR_SEED>"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use std::collections::HashMap;

    fn env(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    fn args(flags: &[&str]) -> Args {
        Args::try_parse_from(std::iter::once("storage-probe").chain(flags.iter().copied())).unwrap()
    }

    #[test]
    fn test_defaults() {
        let config = RuntimeConfig::load(&args(&[]), env(&[])).unwrap();
        assert_eq!(config.network.rpc_endpoints.len(), 2);
        assert_eq!(config.network.p2p_port, 4003);
        assert_eq!(config.probe.namespace, "random");
        assert_eq!(config.probe.failure_policy, FailurePolicy::FailFast);
        assert_eq!(config.network.workspace_dir, config.probe.workspace_dir);
        assert_eq!(config.log_dir, None);
    }

    #[test]
    fn test_toml_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("probe.toml");
        std::fs::write(
            &path,
            r#"
log_dir = "/tmp/probe-logs"

[probe]
namespace = "from-file"
max_iterations = 7

[probe.replication_poll]
interval_ms = 5000
max_attempts = 30

[network]
rpc_endpoints = ["ws://file:9944"]
"#,
        )
        .unwrap();

        let config =
            RuntimeConfig::load(&args(&["--config", path.to_str().unwrap()]), env(&[])).unwrap();
        assert_eq!(config.probe.namespace, "from-file");
        assert_eq!(config.probe.max_iterations, Some(7));
        assert_eq!(config.probe.replication_poll.interval_ms, 5000);
        assert_eq!(config.probe.replication_poll.max_attempts, Some(30));
        assert_eq!(config.network.rpc_endpoints, vec!["ws://file:9944"]);
        assert_eq!(config.log_dir, Some(PathBuf::from("/tmp/probe-logs")));
    }

    #[test]
    fn test_env_over_defaults_and_flags_over_env() {
        let vars = env(&[
            ("PROBE_NAMESPACE", "from-env"),
            ("PROBE_RPC_ENDPOINTS", "ws://a:1, ws://b:2"),
            ("PROBE_P2P_PORT", "5000"),
            ("PROBE_GATEWAY_URL", "http://gw:8080"),
        ]);
        let config = RuntimeConfig::load(&args(&["--namespace", "from-flag"]), vars).unwrap();
        assert_eq!(config.probe.namespace, "from-flag");
        assert_eq!(config.network.rpc_endpoints, vec!["ws://a:1", "ws://b:2"]);
        assert_eq!(config.network.p2p_port, 5000);
        assert_eq!(config.probe.gateway.url, "http://gw:8080");
    }

    #[test]
    fn test_bad_env_value_rejected() {
        let err = RuntimeConfig::load(&args(&[]), env(&[("PROBE_P2P_PORT", "many")])).unwrap_err();
        assert!(matches!(err, ProbeError::Config(_)));
    }

    #[test]
    fn test_policy_flags() {
        let config = RuntimeConfig::load(
            &args(&[
                "--replication-interval-secs",
                "3",
                "--replication-max-attempts",
                "20",
                "--deal-interval-secs",
                "2",
                "--identifier-match",
                "full-length",
                "--counter-mode",
                "global",
                "--retry-transient",
                "3",
                "--keep-downloads",
                "--remove-generated",
                "--iterations",
                "5",
                "--min-size",
                "1",
                "--max-size",
                "4",
            ]),
            env(&[]),
        )
        .unwrap();
        let probe = &config.probe;
        assert_eq!(probe.replication_poll.interval_ms, 3000);
        assert_eq!(probe.replication_poll.max_attempts, Some(20));
        assert_eq!(probe.deal_poll.interval_ms, 2000);
        assert_eq!(probe.identifier_match, IdentifierMatch::FullLength);
        assert_eq!(probe.counter_mode, CounterMode::Global);
        assert_eq!(probe.failure_policy, FailurePolicy::RetryTransient { max_attempts: 3 });
        assert!(!probe.retrieval.remove_downloaded);
        assert!(probe.retrieval.remove_generated);
        assert_eq!(probe.max_iterations, Some(5));
        assert_eq!((probe.min_size_units, probe.max_size_units), (1, 4));
    }

    #[test]
    fn test_empty_rpc_list_rejected() {
        let err = RuntimeConfig::load(&args(&[]), env(&[("PROBE_RPC_ENDPOINTS", " , ")])).unwrap_err();
        assert!(matches!(err, ProbeError::Config(_)));
    }

    #[test]
    fn test_invalid_size_range_rejected() {
        let err =
            RuntimeConfig::load(&args(&["--min-size", "3", "--max-size", "2"]), env(&[])).unwrap_err();
        assert!(matches!(err, ProbeError::Config(_)));
    }

    #[test]
    fn test_telemetry_settings() {
        let config = RuntimeConfig::load(&args(&["--log-dir", "/tmp/l"]), env(&[])).unwrap();
        let telemetry = config.telemetry(env(&[("PROBE_LOG_LEVEL", "debug")]));
        assert_eq!(telemetry.log_dir, Some(PathBuf::from("/tmp/l")));
        assert_eq!(telemetry.log_level, "debug");
        assert_eq!(telemetry.utc_offset_minutes, 330);
    }

    #[test]
    fn test_missing_seed() {
        let err = read_seed(env(&[]), "CESS_MNEMONIC").unwrap_err();
        assert_eq!(
            err.to_string(),
            ProbeError::Config(
                "Please set your Mnemonic seed, export CESS_MNEMONIC=<YOUR_SEED>".into()
            )
            .to_string()
        );
        assert!(read_seed(env(&[("CESS_MNEMONIC", "  ")]), "CESS_MNEMONIC").is_err());
    }

    #[test]
    fn test_seed_from_named_variable() {
        let seed = read_seed(env(&[("MY_SEED", "word word word")]), "MY_SEED").unwrap();
        assert_eq!(seed, "word word word");
    }
}
