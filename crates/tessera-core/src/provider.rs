//! JSON-RPC provider handles
//!
//! A [`ProviderRegistry`] holds the process-wide current provider. Tools may
//! pass their own endpoint URL, which is connected for that call only.

use std::fmt;

use alloy::providers::{DynProvider, Provider, ProviderBuilder};
use serde::Serialize;
use tokio::sync::RwLock;
use tracing::{info, warn};
use url::Url;

use crate::error::{Result, WalletError};

/// Endpoint used when no provider URL is configured
pub const DEFAULT_PROVIDER_URL: &str = "https://eth.llamarpc.com";

/// A connected endpoint
#[derive(Clone)]
pub struct ProviderHandle {
    url: String,
    provider: DynProvider,
}

impl fmt::Debug for ProviderHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderHandle")
            .field("url", &self.url)
            .finish_non_exhaustive()
    }
}

impl ProviderHandle {
    /// Connect to an http(s) JSON-RPC endpoint
    pub fn connect(url: &str) -> Result<Self> {
        let trimmed = url.trim();
        let parsed: Url = trimmed
            .parse()
            .map_err(|_| WalletError::InvalidProviderUrl(trimmed.to_string()))?;

        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(WalletError::InvalidProviderUrl(trimmed.to_string()));
        }

        let provider = ProviderBuilder::new().connect_http(parsed).erased();

        Ok(Self {
            url: trimmed.to_string(),
            provider,
        })
    }

    /// Wrap an already-built provider
    pub fn from_provider(url: impl Into<String>, provider: DynProvider) -> Self {
        Self {
            url: url.into(),
            provider,
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn provider(&self) -> &DynProvider {
        &self.provider
    }

    pub async fn chain_id(&self) -> Result<u64> {
        Ok(self.provider.get_chain_id().await?)
    }
}

#[derive(Debug, Clone)]
enum Slot {
    Ready(ProviderHandle),
    Invalid(String),
}

/// Snapshot of the registry for status reporting
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderStatus {
    pub url: String,
    pub valid: bool,
}

/// The current provider, shared across tool calls
#[derive(Debug)]
pub struct ProviderRegistry {
    slot: RwLock<Slot>,
}

impl ProviderRegistry {
    /// Connect the startup provider, defaulting to [`DEFAULT_PROVIDER_URL`]
    ///
    /// An unusable URL is kept and reported on every call that needs the
    /// current provider.
    pub fn new(url: Option<&str>) -> Self {
        let url = url
            .map(str::trim)
            .filter(|u| !u.is_empty())
            .unwrap_or(DEFAULT_PROVIDER_URL);

        let slot = match ProviderHandle::connect(url) {
            Ok(handle) => {
                info!(url = handle.url(), "Provider configured");
                Slot::Ready(handle)
            }
            Err(e) => {
                warn!(url, error = %e, "Startup provider is unusable");
                Slot::Invalid(url.to_string())
            }
        };

        Self {
            slot: RwLock::new(slot),
        }
    }

    pub fn with_handle(handle: ProviderHandle) -> Self {
        Self {
            slot: RwLock::new(Slot::Ready(handle)),
        }
    }

    pub async fn current(&self) -> Result<ProviderHandle> {
        match &*self.slot.read().await {
            Slot::Ready(handle) => Ok(handle.clone()),
            Slot::Invalid(url) => Err(WalletError::InvalidProviderUrl(url.clone())),
        }
    }

    /// Replace the current provider; the old one stays on failure
    pub async fn set(&self, url: &str) -> Result<ProviderHandle> {
        let handle = ProviderHandle::connect(url)?;
        *self.slot.write().await = Slot::Ready(handle.clone());
        info!(url = handle.url(), "Provider replaced");
        Ok(handle)
    }

    /// Per-call override when given, the current provider otherwise
    pub async fn resolve(&self, override_url: Option<&str>) -> Result<ProviderHandle> {
        match override_url.map(str::trim).filter(|u| !u.is_empty()) {
            Some(url) => ProviderHandle::connect(url),
            None => self.current().await,
        }
    }

    pub async fn status(&self) -> ProviderStatus {
        match &*self.slot.read().await {
            Slot::Ready(handle) => ProviderStatus {
                url: handle.url().to_string(),
                valid: true,
            },
            Slot::Invalid(url) => ProviderStatus {
                url: url.clone(),
                valid: false,
            },
        }
    }
}

impl Default for ProviderRegistry {
    fn default() -> Self {
        Self::new(None)
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use alloy::providers::{Provider, ProviderBuilder};
    use alloy::transports::mock::Asserter;

    use super::ProviderHandle;

    /// Handle backed by a scripted transport
    pub(crate) fn mocked() -> (ProviderHandle, Asserter) {
        let asserter = Asserter::new();
        let provider = ProviderBuilder::new()
            .connect_mocked_client(asserter.clone())
            .erased();
        (ProviderHandle::from_provider("mock://", provider), asserter)
    }
}
