//! Tunable parameters for submission and network selection.

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

pub const DEFAULT_BASE_URL: &str = "https://api.minepi.com";
pub const MAINNET_HOST: &str = "api.mainnet.minepi.com";
pub const TESTNET_HOST: &str = "api.testnet.minepi.com";
/// Network names with this prefix are routed to the mainnet host.
pub const MAINNET_PREFIX: &str = "Pi Network";

/// Source of the current unix time in seconds.
pub type TimeFn = Arc<dyn Fn() -> u64 + Send + Sync>;

pub fn system_time() -> TimeFn {
    Arc::new(|| {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or_default()
    })
}

/// Timing and fee parameters for one submission cycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmissionConfig {
    /// Width of the transaction validity window.
    #[serde(default = "default_submission_timeout_secs")]
    pub submission_timeout_secs: u64,

    /// Pause between resubmissions of the same envelope.
    #[serde(default = "default_retry_delay_millis")]
    pub retry_delay_millis: u64,

    /// Fixed base fee in stroops (0.01 Pi).
    #[serde(default = "default_base_fee")]
    pub base_fee: u32,
}

impl SubmissionConfig {
    pub fn submission_timeout(&self) -> Duration {
        Duration::from_secs(self.submission_timeout_secs)
    }

    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_millis)
    }
}

impl Default for SubmissionConfig {
    fn default() -> Self {
        Self {
            submission_timeout_secs: default_submission_timeout_secs(),
            retry_delay_millis: default_retry_delay_millis(),
            base_fee: default_base_fee(),
        }
    }
}

/// Endpoints of the platform API and the ledger environments.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_mainnet_host")]
    pub mainnet_host: String,
    #[serde(default = "default_testnet_host")]
    pub testnet_host: String,
}

impl NetworkConfig {
    /// Horizon URL serving the given network name.
    pub fn horizon_url(&self, network: &str) -> String {
        let host = if network.starts_with(MAINNET_PREFIX) {
            &self.mainnet_host
        } else {
            &self.testnet_host
        };
        if host.starts_with("http://") || host.starts_with("https://") {
            host.trim_end_matches('/').to_string()
        } else {
            format!("https://{host}")
        }
    }
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            mainnet_host: default_mainnet_host(),
            testnet_host: default_testnet_host(),
        }
    }
}

fn default_submission_timeout_secs() -> u64 {
    180
}

fn default_retry_delay_millis() -> u64 {
    5_000
}

fn default_base_fee() -> u32 {
    100_000
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_mainnet_host() -> String {
    MAINNET_HOST.to_string()
}

fn default_testnet_host() -> String {
    TESTNET_HOST.to_string()
}
