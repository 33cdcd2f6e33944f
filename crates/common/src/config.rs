use anyhow::{Context, Result};
use serde::Deserialize;
use std::str::FromStr;

use crate::types::ActivityOrder;

pub const DEFAULT_CONFIG_PATH: &str = "config/default.toml";

/// Upper bound on concurrent activity requests per scan.
pub const MAX_CONCURRENCY: usize = 1000;
pub const CONFIG_PATH_ENV: &str = "SCANNER_CONFIG";

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub general: General,
    pub polymarket: Polymarket,
    pub scan: Scan,
    #[serde(default)]
    pub observability: Observability,
}

#[derive(Debug, Clone, Deserialize)]
pub struct General {
    pub log_level: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Polymarket {
    pub data_api_url: String,
}

/// Thresholds and limits for one scan. Passed explicitly into the scan and
/// scoring code; CLI flags produce a modified copy per invocation.
#[derive(Debug, Clone, Deserialize)]
pub struct Scan {
    /// Minimum cash size of a trade (price × size, USDC) requested from `/trades`.
    pub min_spend_usd: f64,
    /// Number of recent trades requested.
    pub trade_limit: u32,
    /// Max wallets whose activity request may be in flight at once.
    pub concurrency: usize,
    /// Page size of the single `/activity` request per wallet.
    pub activity_limit: u32,
    #[serde(default)]
    pub activity_order: ActivityOrder,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    /// Case-insensitive market title filter; empty means no filter.
    #[serde(default)]
    pub keyword: Option<String>,
    #[serde(default = "default_refresh_interval_secs")]
    pub refresh_interval_secs: u64,
}

fn default_request_timeout_secs() -> u64 {
    10
}

fn default_refresh_interval_secs() -> u64 {
    300
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Observability {
    pub prometheus_port: Option<u16>,
}

impl Config {
    /// Load from `$SCANNER_CONFIG`, falling back to `config/default.toml`.
    pub fn load() -> Result<Self> {
        let path = std::env::var(CONFIG_PATH_ENV).unwrap_or_else(|_| DEFAULT_CONFIG_PATH.into());
        Self::load_from(&path)
    }

    pub fn load_from(path: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file: {path}"))?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(s: &str) -> Result<Self> {
        let config: Config = toml::from_str(s).context("failed to parse scanner config")?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        self.scan.validate()?;
        anyhow::ensure!(
            !self.polymarket.data_api_url.trim().is_empty(),
            "polymarket.data_api_url must be set"
        );
        Ok(())
    }
}

impl Scan {
    pub fn validate(&self) -> Result<()> {
        anyhow::ensure!(
            self.min_spend_usd >= 0.0,
            "scan.min_spend_usd must be >= 0"
        );
        anyhow::ensure!(self.trade_limit > 0, "scan.trade_limit must be > 0");
        anyhow::ensure!(
            (1..=MAX_CONCURRENCY).contains(&self.concurrency),
            "scan.concurrency must be in [1, {MAX_CONCURRENCY}]"
        );
        anyhow::ensure!(
            (1..=500).contains(&self.activity_limit),
            "scan.activity_limit must be in [1, 500]"
        );
        anyhow::ensure!(
            self.request_timeout_secs > 0,
            "scan.request_timeout_secs must be > 0"
        );
        anyhow::ensure!(
            self.refresh_interval_secs > 0,
            "scan.refresh_interval_secs must be > 0"
        );
        Ok(())
    }

    pub fn request_timeout(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.request_timeout_secs)
    }

    /// The keyword filter, ignoring blank values.
    pub fn keyword(&self) -> Option<&str> {
        self.keyword
            .as_deref()
            .map(str::trim)
            .filter(|k| !k.is_empty())
    }
}

impl FromStr for Config {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Self::from_toml_str(s)
    }
}
