//! Configuration file management for memchat.
//!
//! Supports reading client settings from `~/.config/memchat/config.json`,
//! with environment variables as a fallback.
//! Priority: config file > environment variables > defaults.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use memchat_core::error::{MemchatError, Result};

/// Default backend service address (the reference server's bind).
pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:5000";

const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Settings shared by the remote chat backend and memory store.
#[derive(Debug, Clone, Deserialize)]
pub struct ClientConfig {
    /// Base URL of the backend service.
    pub base_url: String,
    /// Optional bearer token sent with every request.
    #[serde(default)]
    pub api_key: Option<String>,
    /// Per-request timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key: None,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

impl ClientConfig {
    /// Loads configuration from the default location.
    ///
    /// Priority:
    /// 1. ~/.config/memchat/config.json
    /// 2. Environment variables (MEMCHAT_BASE_URL, MEMCHAT_API_KEY)
    /// 3. Built-in defaults
    ///
    /// # Errors
    ///
    /// Returns an error only if a config file exists but cannot be read
    /// or parsed; an absent file falls through to the env/default tiers.
    pub fn load() -> Result<Self> {
        let config_path = default_config_path()?;

        if config_path.exists() {
            return Self::load_from_path(&config_path);
        }

        tracing::debug!(
            path = %config_path.display(),
            "no config file; falling back to environment variables"
        );
        Ok(Self::from_env())
    }

    /// Loads configuration from a specific file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load_from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| {
            MemchatError::config(format!(
                "failed to read config file at {}: {}",
                path.display(),
                e
            ))
        })?;

        serde_json::from_str(&content).map_err(|e| {
            MemchatError::config(format!(
                "failed to parse config file at {}: {}",
                path.display(),
                e
            ))
        })
    }

    /// Builds configuration from environment variables, with defaults for
    /// anything unset.
    pub fn from_env() -> Self {
        let base_url =
            env::var("MEMCHAT_BASE_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.to_string());
        let api_key = env::var("MEMCHAT_API_KEY").ok();

        Self {
            base_url,
            api_key,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }

    /// The per-request timeout.
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Returns the path to the configuration file: ~/.config/memchat/config.json
fn default_config_path() -> Result<PathBuf> {
    let home = dirs::home_dir()
        .ok_or_else(|| MemchatError::config("could not determine home directory"))?;
    Ok(home.join(".config").join("memchat").join("config.json"))
}
