//! Configuration management for the sync agent.
//!
//! Loads configuration from a TOML file; missing fields fall back to
//! serde defaults.

use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub remote: RemoteConfig,
    pub storage: StorageConfig,
    pub secrets: SecretsConfig,
    #[serde(default)]
    pub log: LogConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// HTTP port for the trigger and health endpoints
    #[serde(default = "default_port")]
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoteConfig {
    /// Base URL of the drive API
    pub base_url: String,

    /// Parent folder whose files are synchronized
    pub folder_id: String,

    /// Only files of this content type are listed
    #[serde(default = "default_mime_type")]
    pub mime_type: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Base URL of the object store API
    pub base_url: String,

    /// Destination bucket
    pub bucket: String,

    /// Object key of the checkpoint document
    #[serde(default = "default_state_key")]
    pub state_key: String,

    /// Key prefix for landed files (destination key = prefix + filename)
    #[serde(default = "default_data_prefix")]
    pub data_prefix: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecretsConfig {
    /// Base URL of the secret store API
    pub base_url: String,

    /// Identifier of the drive credentials secret
    pub secret_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        LogConfig {
            level: default_log_level(),
        }
    }
}

// Default values
fn default_port() -> u16 {
    9970
}

fn default_mime_type() -> String {
    "text/csv".to_string()
}

fn default_state_key() -> String {
    "state/last_run_state.json".to_string()
}

fn default_data_prefix() -> String {
    "data/".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Config {
    /// Load configuration from a TOML file
    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }
}
