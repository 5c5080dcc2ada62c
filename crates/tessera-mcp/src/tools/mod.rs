//! Tool catalogue
//!
//! Every tool follows the same shape: check the required arguments, build a
//! wallet or look up a provider, run one operation and wrap the outcome in
//! the [`ToolsCallResult`] envelope. Missing arguments are reported with
//! the tool's own message; any other failure reads
//! `Failed to <action>: <cause>`.

mod account;
mod ens;
mod network;
mod provider;
mod signing;
mod transaction;
mod wallet;

use std::future::Future;
use std::sync::Arc;

use serde_json::{json, Map, Value};
use tessera_core::{ProviderHandle, ProviderRegistry, Wallet, WalletError};
use thiserror::Error;
use tracing::{debug, warn};
use zeroize::Zeroizing;

use crate::protocol::{Tool, ToolAnnotations, ToolsCallResult};
use crate::validation::Args;

/// Shared state a tool call may use
#[derive(Clone)]
pub struct ToolContext {
    pub providers: Arc<ProviderRegistry>,
    /// Key used by wallet tools when no `wallet` argument is given
    pub fallback_private_key: Option<Arc<Zeroizing<String>>>,
}

impl std::fmt::Debug for ToolContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolContext")
            .field("providers", &self.providers)
            .field("fallback_private_key", &self.fallback_private_key.is_some())
            .finish()
    }
}

impl ToolContext {
    pub fn new(providers: Arc<ProviderRegistry>, fallback_private_key: Option<String>) -> Self {
        Self {
            providers,
            fallback_private_key: fallback_private_key.map(|k| Arc::new(Zeroizing::new(k))),
        }
    }

    /// Build the caller's wallet from `wallet` and `password`
    ///
    /// Keystore decryption is CPU-bound, so resolution runs on the blocking
    /// pool.
    pub async fn wallet(&self, args: &Args) -> Result<Wallet, ToolError> {
        let data = args.optional_str("wallet")?.map(str::to_owned);
        let password = args.optional_str("password")?.map(|p| Zeroizing::new(p.to_owned()));
        let fallback = self.fallback_private_key.clone();

        let wallet = tokio::task::spawn_blocking(move || {
            Wallet::resolve(
                data.as_deref(),
                password.as_ref().map(|p| p.as_str()),
                fallback.as_ref().map(|k| k.as_str()),
            )
        })
        .await
        .map_err(|e| ToolError::Failed(e.to_string()))??;

        debug!(address = %wallet.address(), "Resolved wallet");
        Ok(wallet)
    }

    /// The `provider` override when given, the current provider otherwise
    pub async fn provider(&self, args: &Args) -> Result<ProviderHandle, ToolError> {
        let override_url = args.optional_str("provider")?;
        Ok(self.providers.resolve(override_url).await?)
    }
}

/// Why a tool call did not succeed
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ToolError {
    /// Reported as-is, e.g. a missing required argument
    #[error("{0}")]
    Rejected(String),

    /// Reported behind the tool's `Failed to <action>:` prefix
    #[error("{0}")]
    Failed(String),
}

impl From<WalletError> for ToolError {
    fn from(err: WalletError) -> Self {
        ToolError::Failed(err.to_string())
    }
}

impl From<alloy::transports::TransportError> for ToolError {
    fn from(err: alloy::transports::TransportError) -> Self {
        ToolError::Failed(err.to_string())
    }
}

impl From<serde_json::Error> for ToolError {
    fn from(err: serde_json::Error) -> Self {
        ToolError::Failed(err.to_string())
    }
}

/// A successful tool outcome
#[derive(Debug, Clone, PartialEq)]
pub struct Reply {
    pub result: Value,
    pub message: String,
}

impl Reply {
    pub fn new(result: Value, message: impl Into<String>) -> Self {
        Self {
            result,
            message: message.into(),
        }
    }
}

/// Run a tool body and wrap its outcome in the envelope
pub(crate) async fn respond<F>(action: &str, body: F) -> ToolsCallResult
where
    F: Future<Output = Result<Reply, ToolError>>,
{
    match body.await {
        Ok(reply) => ToolsCallResult::success(reply.result, Some(&reply.message)),
        Err(ToolError::Rejected(message)) => {
            debug!(action, %message, "Tool call rejected");
            ToolsCallResult::error(message)
        }
        Err(ToolError::Failed(cause)) => {
            warn!(action, %cause, "Tool call failed");
            ToolsCallResult::error(format!("Failed to {}: {}", action, cause))
        }
    }
}

// ============================================================================
// Definitions
// ============================================================================

/// Pure computation; no node access, no side effects
pub(crate) const LOCAL: ToolAnnotations = ToolAnnotations {
    read_only_hint: Some(true),
    destructive_hint: Some(false),
    idempotent_hint: Some(true),
    open_world_hint: Some(false),
};

/// Fresh randomness on every call
pub(crate) const GENERATE: ToolAnnotations = ToolAnnotations {
    read_only_hint: Some(true),
    destructive_hint: Some(false),
    idempotent_hint: Some(false),
    open_world_hint: Some(false),
};

/// Reads from the node
pub(crate) const QUERY: ToolAnnotations = ToolAnnotations {
    read_only_hint: Some(true),
    destructive_hint: Some(false),
    idempotent_hint: Some(true),
    open_world_hint: Some(true),
};

/// Changes server state
pub(crate) const CONFIGURE: ToolAnnotations = ToolAnnotations {
    read_only_hint: Some(false),
    destructive_hint: Some(false),
    idempotent_hint: Some(true),
    open_world_hint: Some(false),
};

/// Irreversible on-chain effect
pub(crate) const BROADCAST: ToolAnnotations = ToolAnnotations {
    read_only_hint: Some(false),
    destructive_hint: Some(true),
    idempotent_hint: Some(false),
    open_world_hint: Some(true),
};

pub(crate) fn define(
    name: &str,
    title: &str,
    description: &str,
    input_schema: Value,
    annotations: ToolAnnotations,
) -> Tool {
    Tool {
        name: name.to_string(),
        title: Some(title.to_string()),
        description: description.to_string(),
        input_schema,
        annotations: Some(annotations),
    }
}

/// Reusable JSON schema fragments
pub(crate) mod schema {
    use super::*;

    pub const WALLET_DESCRIPTION: &str = "The wallet (private key, mnemonic, or JSON). \
        If not provided, uses PRIVATE_KEY environment variable if set.";

    pub fn object(properties: Value, required: &[&str]) -> Value {
        json!({
            "type": "object",
            "properties": properties,
            "required": required,
        })
    }

    /// Merge `extra` properties into `base`
    pub fn with(mut base: Value, extra: Value) -> Value {
        if let (Some(base), Value::Object(extra)) = (base.as_object_mut(), extra) {
            base.extend(extra);
        }
        base
    }

    pub fn wallet() -> Value {
        json!({
            "wallet": { "type": "string", "description": WALLET_DESCRIPTION },
            "password": {
                "type": "string",
                "description": "The password to decrypt the wallet if it's encrypted"
            },
        })
    }

    pub fn provider() -> Value {
        json!({
            "provider": {
                "type": "string",
                "description": "Optional provider RPC URL for this call; defaults to the current provider"
            }
        })
    }

    pub fn block_tag() -> Value {
        json!({
            "blockTag": {
                "type": "string",
                "description": "Optional block tag (latest, pending, etc.)"
            }
        })
    }

    /// Transaction object schema; `to` is required unless `to_optional`
    pub fn transaction(description: &str, to_optional: bool) -> Value {
        let mut properties = Map::new();
        for key in ["to", "from", "data", "value", "gasLimit", "gasPrice"] {
            properties.insert(key.to_string(), json!({ "type": "string" }));
        }
        for key in ["maxFeePerGas", "maxPriorityFeePerGas", "chainId"] {
            properties.insert(key.to_string(), json!({ "type": "string" }));
        }
        for key in ["nonce", "type"] {
            properties.insert(key.to_string(), json!({ "type": "number" }));
        }

        let mut tx = json!({
            "type": "object",
            "description": description,
            "properties": properties,
        });
        if !to_optional {
            tx["required"] = json!(["to"]);
        }
        tx
    }
}

/// Every tool this server exposes
pub fn get_all_tools() -> Vec<Tool> {
    let mut tools = Vec::new();
    tools.extend(wallet::definitions());
    tools.extend(account::definitions());
    tools.extend(transaction::definitions());
    tools.extend(signing::definitions());
    tools.extend(provider::definitions());
    tools.extend(ens::definitions());
    tools.extend(network::definitions());
    tools
}

/// Dispatch a `tools/call` by name
pub async fn execute_tool(ctx: &ToolContext, name: &str, arguments: Value) -> ToolsCallResult {
    let args = match Args::new(arguments) {
        Ok(args) => args,
        Err(e) => return ToolsCallResult::error(e.to_string()),
    };

    match name {
        // Wallet construction and management
        "wallet_provider_set" => wallet::provider_set(ctx, &args).await,
        "wallet_create_random" => wallet::create_random(&args).await,
        "wallet_from_private_key" => wallet::from_private_key(&args).await,
        "wallet_create_mnemonic_phrase" => wallet::create_mnemonic_phrase(&args).await,
        "wallet_from_mnemonic" => wallet::from_mnemonic(&args).await,
        "wallet_from_encrypted_json" => wallet::from_encrypted_json(&args).await,
        "wallet_encrypt" => wallet::encrypt(ctx, &args).await,
        "wallet_get_address" => wallet::get_address(ctx, &args).await,
        "wallet_get_public_key" => wallet::get_public_key(ctx, &args).await,
        "wallet_get_private_key" => wallet::get_private_key(ctx, &args).await,
        "wallet_get_mnemonic" => wallet::get_mnemonic(ctx, &args).await,

        // Account queries
        "wallet_get_balance" => account::get_balance(ctx, &args).await,
        "wallet_get_chain_id" => account::get_chain_id(ctx, &args).await,
        "wallet_get_gas_price" => account::get_gas_price(ctx, &args).await,
        "wallet_get_transaction_count" => account::get_transaction_count(ctx, &args).await,
        "wallet_call" => account::call(ctx, &args).await,

        // Transactions
        "wallet_send_transaction" => transaction::send(ctx, &args).await,
        "wallet_sign_transaction" => transaction::sign(ctx, &args).await,
        "wallet_populate_transaction" => transaction::populate(ctx, &args).await,

        // Signing
        "wallet_sign_message" => signing::sign_message(ctx, &args).await,
        "wallet_sign_typed_data" => signing::sign_typed_data(ctx, &args).await,
        "wallet_verify_message" => signing::verify_message(&args).await,
        "wallet_verify_typed_data" => signing::verify_typed_data(&args).await,

        // Provider queries
        "provider_get_block" => provider::get_block(ctx, &args).await,
        "provider_get_transaction" => provider::get_transaction(ctx, &args).await,
        "provider_get_transaction_receipt" => provider::get_transaction_receipt(ctx, &args).await,
        "provider_get_code" => provider::get_code(ctx, &args).await,
        "provider_get_storage_at" => provider::get_storage_at(ctx, &args).await,
        "provider_estimate_gas" => provider::estimate_gas(ctx, &args).await,
        "provider_get_logs" => provider::get_logs(ctx, &args).await,

        // ENS
        "provider_get_ens_resolver" => ens::get_resolver(ctx, &args).await,
        "provider_lookup_address" => ens::lookup_address(ctx, &args).await,
        "provider_resolve_name" => ens::resolve_name(ctx, &args).await,

        // Network
        "network_get_network" => network::get_network(ctx, &args).await,
        "network_get_block_number" => network::get_block_number(ctx, &args).await,
        "network_get_fee_data" => network::get_fee_data(ctx, &args).await,

        _ => ToolsCallResult::error(format!("Unknown tool: {}", name)),
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use alloy::providers::{Provider, ProviderBuilder};
    use alloy::transports::mock::Asserter;

    /// First anvil development key
    pub const ANVIL_KEY: &str =
        "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";
    pub const ANVIL_ADDRESS: &str = "0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266";
    pub const TEST_MNEMONIC: &str =
        "test test test test test test test test test test test junk";

    /// Context whose current provider answers from a scripted transport
    pub fn mocked_context(fallback: Option<&str>) -> (ToolContext, Asserter) {
        let asserter = Asserter::new();
        let provider = ProviderBuilder::new()
            .connect_mocked_client(asserter.clone())
            .erased();
        let registry = ProviderRegistry::with_handle(ProviderHandle::from_provider(
            "mock://",
            provider,
        ));
        (
            ToolContext::new(Arc::new(registry), fallback.map(str::to_string)),
            asserter,
        )
    }

    pub async fn call(ctx: &ToolContext, name: &str, arguments: Value) -> ToolsCallResult {
        execute_tool(ctx, name, arguments).await
    }

    pub fn structured(result: &ToolsCallResult) -> &Value {
        result
            .structured_content
            .as_ref()
            .expect("envelope carries structured content")
    }
}
