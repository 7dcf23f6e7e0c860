//! Client configuration with TOML file support.

use chief_governance::TallyConfig;
use chief_types::Address;
use chief_utils::LogFormat;
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Configuration for the `chief` client.
///
/// Loaded from a TOML file via [`ChiefConfig::from_toml_file`]; every field
/// has a default so a partial file is enough.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ChiefConfig {
    /// Ethereum JSON-RPC endpoint.
    #[serde(default = "default_rpc_url")]
    pub rpc_url: String,

    /// The DSChief contract.
    #[serde(default)]
    pub chief_address: Option<Address>,

    /// The vote-proxy factory, needed only for proxy commands.
    #[serde(default)]
    pub proxy_factory_address: Option<Address>,

    /// Node-managed account that signs write calls.
    #[serde(default)]
    pub from_account: Option<Address>,

    #[serde(default = "default_log_level")]
    pub log_level: String,

    #[serde(default)]
    pub log_format: LogFormat,

    #[serde(default)]
    pub tally: TallyConfig,
}

fn default_rpc_url() -> String {
    "http://127.0.0.1:8545".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

impl ChiefConfig {
    pub fn from_toml_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(s)?)
    }
}

impl Default for ChiefConfig {
    fn default() -> Self {
        Self {
            rpc_url: default_rpc_url(),
            chief_address: None,
            proxy_factory_address: None,
            from_account: None,
            log_level: default_log_level(),
            log_format: LogFormat::default(),
            tally: TallyConfig::default(),
        }
    }
}
