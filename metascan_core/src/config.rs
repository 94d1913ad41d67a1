//! TOML-based configuration with environment variable overrides.
//!
//! Every field has a serde default, so an empty file (or no file) yields a
//! working configuration. Environment variables use the `METASCAN_` prefix
//! with `_` as section separator:
//! - `METASCAN_FETCHER_MAX_IN_FLIGHT` → `fetcher.max_in_flight`
//! - `METASCAN_FETCHER_BATCH_TIMEOUT_SECS` → `fetcher.batch_timeout_secs`
//! - `METASCAN_RPC_ENDPOINT` → `rpc.endpoint`
//! - `METASCAN_RPC_REQUEST_TIMEOUT_SECS` → `rpc.request_timeout_secs`

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Top-level metascan configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MetascanConfig {
    /// Batch fetch settings.
    #[serde(default)]
    pub fetcher: FetcherConfig,
    /// JSON-RPC transport settings.
    #[serde(default)]
    pub rpc: RpcSettings,
}

/// Batch fetch settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FetcherConfig {
    /// Maximum number of accessor calls in flight at once (default: 8).
    #[serde(default = "default_max_in_flight")]
    pub max_in_flight: usize,
    /// Deadline for a whole batch in seconds; 0 disables the deadline
    /// (default: 0).
    #[serde(default)]
    pub batch_timeout_secs: u64,
}

impl Default for FetcherConfig {
    fn default() -> Self {
        Self {
            max_in_flight: default_max_in_flight(),
            batch_timeout_secs: 0,
        }
    }
}

impl FetcherConfig {
    /// The batch deadline as a `Duration`, or `None` when disabled.
    pub fn batch_timeout(&self) -> Option<Duration> {
        (self.batch_timeout_secs > 0).then(|| Duration::from_secs(self.batch_timeout_secs))
    }
}

/// JSON-RPC transport settings, consumed by source implementations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RpcSettings {
    /// Node endpoint URL (default: "http://localhost:8545").
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
    /// Per-request timeout in seconds (default: 30).
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

impl Default for RpcSettings {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            request_timeout_secs: default_request_timeout(),
        }
    }
}

fn default_max_in_flight() -> usize {
    8
}

fn default_endpoint() -> String {
    "http://localhost:8545".to_string()
}

fn default_request_timeout() -> u64 {
    30
}

impl MetascanConfig {
    /// Parse configuration from a TOML string, apply env overrides, then
    /// validate.
    pub fn parse_toml(toml_str: &str) -> anyhow::Result<Self> {
        let mut config: MetascanConfig = toml::from_str(toml_str)
            .map_err(|e| anyhow::anyhow!("Failed to parse TOML config: {}", e))?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Apply environment variable overrides to the configuration.
    pub fn apply_env_overrides(&mut self) {
        if let Ok(v) = std::env::var("METASCAN_FETCHER_MAX_IN_FLIGHT") {
            if let Ok(n) = v.parse::<usize>() {
                self.fetcher.max_in_flight = n;
            }
        }
        if let Ok(v) = std::env::var("METASCAN_FETCHER_BATCH_TIMEOUT_SECS") {
            if let Ok(n) = v.parse::<u64>() {
                self.fetcher.batch_timeout_secs = n;
            }
        }
        if let Ok(v) = std::env::var("METASCAN_RPC_ENDPOINT") {
            self.rpc.endpoint = v;
        }
        if let Ok(v) = std::env::var("METASCAN_RPC_REQUEST_TIMEOUT_SECS") {
            if let Ok(n) = v.parse::<u64>() {
                self.rpc.request_timeout_secs = n;
            }
        }
    }

    /// Validate configuration consistency.
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.fetcher.max_in_flight == 0 {
            anyhow::bail!("fetcher.max_in_flight must be at least 1");
        }
        if self.rpc.endpoint.is_empty() {
            anyhow::bail!("rpc.endpoint must not be empty");
        }
        Ok(())
    }
}
