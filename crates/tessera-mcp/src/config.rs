//! Server configuration

use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tessera_core::provider::DEFAULT_PROVIDER_URL;
use thiserror::Error;

/// Environment variable naming the startup provider
pub const PROVIDER_URL_ENV: &str = "PROVIDER_URL";

/// Environment variable holding the fallback signing key
pub const PRIVATE_KEY_ENV: &str = "PRIVATE_KEY";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid config file: {0}")]
    Parse(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, ConfigError>;

/// Server configuration
#[derive(Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default, rename_all = "camelCase")]
pub struct ServerConfig {
    /// JSON-RPC endpoint used when a tool call names no provider
    pub provider_url: String,

    /// Key used by wallet tools called without a `wallet` argument
    #[serde(skip_serializing_if = "Option::is_none")]
    pub private_key: Option<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            provider_url: DEFAULT_PROVIDER_URL.to_string(),
            private_key: None,
        }
    }
}

impl fmt::Debug for ServerConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServerConfig")
            .field("provider_url", &self.provider_url)
            .field(
                "private_key",
                &self.private_key.as_ref().map(|_| "<redacted>"),
            )
            .finish()
    }
}

impl ServerConfig {
    /// Load configuration from file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&content)?;
        Ok(config)
    }

    /// Save configuration to file
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Apply `PROVIDER_URL` and `PRIVATE_KEY` from the process environment
    pub fn with_env(self) -> Self {
        self.with_overrides(
            std::env::var(PROVIDER_URL_ENV).ok(),
            std::env::var(PRIVATE_KEY_ENV).ok(),
        )
    }

    /// Replace fields with any non-blank override
    pub fn with_overrides(mut self, provider_url: Option<String>, private_key: Option<String>) -> Self {
        if let Some(url) = non_blank(provider_url) {
            self.provider_url = url;
        }
        if let Some(key) = non_blank(private_key) {
            self.private_key = Some(key);
        }
        self
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
