use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::Deserialize;
use stockdash_client::ClientConfig;

use crate::app::state::Symbol;

pub const ENV_CONFIG_FILE: &str = "STOCKDASH_CONFIG";
pub const ENV_API_URL: &str = "STOCKDASH_API_URL";
pub const ENV_SENTIMENT_URL: &str = "STOCKDASH_SENTIMENT_URL";
pub const ENV_SENTIMENT_KEY: &str = "STOCKDASH_SENTIMENT_API_KEY";
pub const ENV_ENVIRONMENT: &str = "STOCKDASH_ENV";
pub const ENV_HISTORY_DAYS: &str = "STOCKDASH_HISTORY_DAYS";
pub const ENV_TIMEOUT_SECS: &str = "STOCKDASH_TIMEOUT_SECS";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    Development,
    Production,
}

impl Environment {
    fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "development" | "dev" => Some(Environment::Development),
            "production" | "prod" => Some(Environment::Production),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct DashboardConfig {
    pub client: ClientConfig,
    pub environment: Environment,
    /// Days of history requested for the chart panel.
    pub history_days: u32,
    /// Used when no selection has been persisted yet.
    pub default_symbol: Symbol,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            client: ClientConfig::default(),
            environment: Environment::Development,
            history_days: 30,
            default_symbol: Symbol::default(),
        }
    }
}

impl DashboardConfig {
    /// File named by `STOCKDASH_CONFIG` (if any), then environment overrides.
    pub fn load() -> Result<Self> {
        let mut cfg = match std::env::var_os(ENV_CONFIG_FILE) {
            Some(path) => Self::from_file(Path::new(&path))?,
            None => Self::default(),
        };
        cfg.apply_env()?;
        Ok(cfg)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("read config {}", path.display()))?;
        toml::from_str(&raw).with_context(|| format!("parse config {}", path.display()))
    }

    fn apply_env(&mut self) -> Result<()> {
        if let Ok(url) = std::env::var(ENV_API_URL) {
            self.client.api_url = url;
        }
        if let Ok(url) = std::env::var(ENV_SENTIMENT_URL) {
            self.client.sentiment_url = url;
        }
        if let Ok(key) = std::env::var(ENV_SENTIMENT_KEY) {
            self.client.sentiment_api_key = key;
        }
        if let Ok(raw) = std::env::var(ENV_ENVIRONMENT) {
            self.environment = Environment::parse(&raw)
                .with_context(|| format!("{ENV_ENVIRONMENT}={raw:?} is not development or production"))?;
        }
        if let Ok(raw) = std::env::var(ENV_HISTORY_DAYS) {
            self.history_days = raw
                .trim()
                .parse()
                .with_context(|| format!("{ENV_HISTORY_DAYS}={raw:?}"))?;
        }
        if let Ok(raw) = std::env::var(ENV_TIMEOUT_SECS) {
            let secs: u64 = raw
                .trim()
                .parse()
                .with_context(|| format!("{ENV_TIMEOUT_SECS}={raw:?}"))?;
            self.client.timeout = Duration::from_secs(secs.max(1));
        }
        Ok(())
    }

    pub fn dev_mode(&self) -> bool {
        self.environment == Environment::Development
    }
}
