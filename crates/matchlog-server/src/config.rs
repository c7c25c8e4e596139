//! Server configuration.

use anyhow::Result;
use matchlog_core::OPENDOTA_API_BASE;
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
    #[serde(default)]
    pub lookup: LookupConfig,
}

/// Match lookup (roster enrichment) settings.
#[derive(Debug, Clone, Deserialize)]
pub struct LookupConfig {
    #[serde(default = "default_lookup_enabled")]
    pub enabled: bool,
    #[serde(default = "default_lookup_base_url")]
    pub base_url: String,
    #[serde(default = "default_lookup_timeout_secs")]
    pub timeout_secs: u64,
}

impl LookupConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    3000
}

fn default_output_dir() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("matchlog")
        .join("matches")
}

fn default_lookup_enabled() -> bool {
    true
}

fn default_lookup_base_url() -> String {
    OPENDOTA_API_BASE.to_string()
}

fn default_lookup_timeout_secs() -> u64 {
    5
}

impl Default for LookupConfig {
    fn default() -> Self {
        Self {
            enabled: default_lookup_enabled(),
            base_url: default_lookup_base_url(),
            timeout_secs: default_lookup_timeout_secs(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            output_dir: default_output_dir(),
            lookup: LookupConfig::default(),
        }
    }
}

impl Config {
    /// Load config from a specific file path.
    pub fn load_from(path: &std::path::Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    /// Load config from default location (config/default.toml) or fall back to defaults.
    pub fn load() -> Result<Self> {
        let config_path = PathBuf::from("config/default.toml");
        if config_path.exists() {
            return Self::load_from(&config_path);
        }

        Ok(Config::default())
    }
}
