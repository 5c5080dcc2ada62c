//! MCP request handlers
//!
//! One handler per protocol method. Handlers return the `result` member on
//! success; tool failures are ordinary results with `isError` set.

use std::sync::Arc;

use serde_json::{json, Value};
use tessera_core::ProviderRegistry;
use tracing::{debug, info, warn};
use zeroize::Zeroizing;

use crate::prompts;
use crate::protocol::*;
use crate::resources;
use crate::tools::{self, ToolContext};
use crate::validation::{parse_params, require_params, validate_request, validate_resource_uri};

/// MCP server state
pub struct McpServerState {
    /// Protocol version the client asked for
    pub protocol_version: Option<String>,

    pub initialized: bool,

    pub client_capabilities: Option<ClientCapabilities>,

    pub client_info: Option<ClientInfo>,

    /// Current provider, shared with every tool call
    pub providers: Arc<ProviderRegistry>,

    /// Signing key used when a wallet tool gets no `wallet` argument
    pub fallback_private_key: Option<Arc<Zeroizing<String>>>,
}

impl McpServerState {
    pub fn new(providers: Arc<ProviderRegistry>, fallback_private_key: Option<String>) -> Self {
        Self {
            protocol_version: None,
            initialized: false,
            client_capabilities: None,
            client_info: None,
            providers,
            fallback_private_key: fallback_private_key.map(|k| Arc::new(Zeroizing::new(k))),
        }
    }

    pub fn tool_context(&self) -> ToolContext {
        ToolContext {
            providers: Arc::clone(&self.providers),
            fallback_private_key: self.fallback_private_key.clone(),
        }
    }
}

impl std::fmt::Debug for McpServerState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("McpServerState")
            .field("protocol_version", &self.protocol_version)
            .field("initialized", &self.initialized)
            .field("client_info", &self.client_info)
            .field("providers", &self.providers)
            .field("fallback_private_key", &self.fallback_private_key.is_some())
            .finish_non_exhaustive()
    }
}

/// Handle an incoming JSON-RPC request
pub async fn handle_request(
    state: &mut McpServerState,
    request: &JsonRpcRequest,
) -> JsonRpcResponse {
    debug!(method = %request.method, id = %request.id, "Handling request");

    if let Err(error) = validate_request(request) {
        return JsonRpcResponse::error(request.id.clone(), error);
    }

    if !state.initialized && request.method != "initialize" && request.method != "ping" {
        return JsonRpcResponse::error(request.id.clone(), JsonRpcError::not_initialized());
    }

    let result = match request.method.as_str() {
        // Lifecycle
        "initialize" => handle_initialize(state, request),
        "ping" => Ok(json!({})),

        // Tools
        "tools/list" => handle_tools_list(request),
        "tools/call" => handle_tools_call(state, request).await,

        // Resources
        "resources/list" => to_value(&ResourcesListResult {
            resources: resources::get_all_resources(),
            next_cursor: None,
        }),
        "resources/templates/list" => to_value(&ResourceTemplatesListResult {
            resource_templates: resources::get_all_templates(),
            next_cursor: None,
        }),
        "resources/read" => handle_resources_read(state, request).await,

        // Prompts
        "prompts/list" => to_value(&PromptsListResult {
            prompts: prompts::get_all_prompts(),
            next_cursor: None,
        }),
        "prompts/get" => handle_prompts_get(request),

        _ => Err(JsonRpcError::method_not_found(&request.method)),
    };

    match result {
        Ok(value) => JsonRpcResponse::success(request.id.clone(), value),
        Err(error) => JsonRpcResponse::error(request.id.clone(), error),
    }
}

/// Handle an incoming notification; notifications are never answered
pub async fn handle_notification(state: &mut McpServerState, notification: &JsonRpcNotification) {
    debug!(method = %notification.method, "Handling notification");

    match notification.method.as_str() {
        "notifications/initialized" => {
            info!("Client sent initialized notification");
            state.initialized = true;
        }
        "notifications/cancelled" => {
            let cancelled = notification
                .params
                .clone()
                .and_then(|p| serde_json::from_value::<CancelledNotification>(p).ok());
            match cancelled {
                // requests run to completion before the next line is read
                Some(c) => debug!(request_id = %c.request_id, reason = ?c.reason, "Cancellation arrived after completion"),
                None => warn!("Malformed cancellation notification"),
            }
        }
        _ => debug!(method = %notification.method, "Ignoring unknown notification"),
    }
}

fn to_value<T: serde::Serialize>(result: &T) -> Result<Value, JsonRpcError> {
    serde_json::to_value(result).map_err(|e| JsonRpcError::internal_error(e.to_string()))
}

// ============================================================================
// Lifecycle
// ============================================================================

fn handle_initialize(
    state: &mut McpServerState,
    request: &JsonRpcRequest,
) -> Result<Value, JsonRpcError> {
    let params: InitializeParams = require_params(request)?;

    info!(
        client = %params.client_info.name,
        version = %params.protocol_version,
        "Initialize request"
    );

    if params.protocol_version != MCP_PROTOCOL_VERSION {
        warn!(
            client = %params.protocol_version,
            server = MCP_PROTOCOL_VERSION,
            "Protocol version mismatch, answering with ours"
        );
    }

    state.protocol_version = Some(params.protocol_version);
    state.client_capabilities = Some(params.capabilities);
    state.client_info = Some(params.client_info);

    to_value(&InitializeResult::new(MCP_PROTOCOL_VERSION))
}

// ============================================================================
// Tools
// ============================================================================

fn handle_tools_list(request: &JsonRpcRequest) -> Result<Value, JsonRpcError> {
    // the catalogue fits in one page, so any cursor is ignored
    let _: Option<Value> = parse_params(request)?;

    to_value(&ToolsListResult {
        tools: tools::get_all_tools(),
        next_cursor: None,
    })
}

async fn handle_tools_call(
    state: &McpServerState,
    request: &JsonRpcRequest,
) -> Result<Value, JsonRpcError> {
    let params: ToolsCallParams = require_params(request)?;
    debug!(tool = %params.name, "Calling tool");

    let ctx = state.tool_context();
    let result = tools::execute_tool(&ctx, &params.name, params.arguments).await;

    to_value(&result)
}

// ============================================================================
// Resources
// ============================================================================

async fn handle_resources_read(
    state: &McpServerState,
    request: &JsonRpcRequest,
) -> Result<Value, JsonRpcError> {
    let params: ResourcesReadParams = require_params(request)?;
    validate_resource_uri(&params.uri)?;
    debug!(uri = %params.uri, "Reading resource");

    let ctx = state.tool_context();
    let result = resources::read_resource(&ctx, &params.uri)
        .await
        .map_err(|e| {
            debug!(uri = %params.uri, error = %e, "Resource read failed");
            JsonRpcError::resource_not_found(&params.uri).with_data(json!({ "reason": e }))
        })?;

    to_value(&result)
}

// ============================================================================
// Prompts
// ============================================================================

fn handle_prompts_get(request: &JsonRpcRequest) -> Result<Value, JsonRpcError> {
    let params: PromptsGetParams = require_params(request)?;
    debug!(prompt = %params.name, "Getting prompt");

    let result = prompts::get_prompt(&params.name, params.arguments.as_ref())
        .map_err(JsonRpcError::invalid_params)?;

    to_value(&result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::testing::mocked_context;

    fn state() -> McpServerState {
        let (ctx, _) = mocked_context(None);
        McpServerState::new(ctx.providers, None)
    }

    fn initialized() -> McpServerState {
        let mut state = state();
        state.initialized = true;
        state
    }

    fn initialize_request() -> JsonRpcRequest {
        JsonRpcRequest::new(1, "initialize").with_params(json!({
            "protocolVersion": "2025-11-25",
            "capabilities": {},
            "clientInfo": { "name": "test-client", "version": "1.0.0" }
        }))
    }

    #[tokio::test]
    async fn test_handle_initialize() {
        let mut state = state();
        let response = handle_request(&mut state, &initialize_request()).await;

        let result = response.result.unwrap();
        assert_eq!(result["protocolVersion"], MCP_PROTOCOL_VERSION);
        assert_eq!(result["serverInfo"]["name"], "tessera-mcp");
        assert_eq!(state.client_info.unwrap().name, "test-client");
    }

    #[tokio::test]
    async fn test_initialize_requires_params() {
        let mut state = state();
        let response = handle_request(&mut state, &JsonRpcRequest::new(1, "initialize")).await;
        assert_eq!(response.error.unwrap().code, codes::INVALID_PARAMS);
    }

    #[tokio::test]
    async fn test_gate_before_initialized() {
        let mut state = state();
        let response = handle_request(&mut state, &JsonRpcRequest::new(2, "tools/list")).await;
        assert_eq!(response.error.unwrap(), JsonRpcError::not_initialized());

        let ping = handle_request(&mut state, &JsonRpcRequest::new(3, "ping")).await;
        assert_eq!(ping.result, Some(json!({})));
    }

    #[tokio::test]
    async fn test_initialized_notification_opens_gate() {
        let mut state = state();
        handle_notification(&mut state, &JsonRpcNotification::new("notifications/initialized"))
            .await;
        assert!(state.initialized);
    }

    #[tokio::test]
    async fn test_handle_tools_list() {
        let mut state = initialized();
        let response = handle_request(&mut state, &JsonRpcRequest::new(1, "tools/list")).await;
        let tools = response.result.unwrap()["tools"].as_array().unwrap().len();
        assert_eq!(tools, 36);
    }

    #[tokio::test]
    async fn test_tool_failure_is_a_result() {
        let mut state = initialized();
        let request = JsonRpcRequest::new(1, "tools/call")
            .with_params(json!({ "name": "wallet_get_address", "arguments": {} }));

        let response = handle_request(&mut state, &request).await;
        assert!(response.error.is_none());
        let result = response.result.unwrap();
        assert_eq!(result["isError"], true);
        assert_eq!(
            result["content"][0]["text"],
            "Failed to get wallet address: Wallet data is required or set PRIVATE_KEY environment variable"
        );
    }

    #[tokio::test]
    async fn test_tools_call_with_fallback_key() {
        let (ctx, _) = mocked_context(None);
        let mut state = McpServerState::new(
            ctx.providers,
            Some(crate::tools::testing::ANVIL_KEY.to_string()),
        );
        state.initialized = true;

        let request = JsonRpcRequest::new(1, "tools/call")
            .with_params(json!({ "name": "wallet_get_address" }));
        let result = handle_request(&mut state, &request).await.result.unwrap();
        assert_eq!(
            result["structuredContent"]["address"],
            crate::tools::testing::ANVIL_ADDRESS
        );
    }

    #[tokio::test]
    async fn test_resources() {
        let mut state = initialized();
        let list = handle_request(&mut state, &JsonRpcRequest::new(1, "resources/list")).await;
        assert_eq!(list.result.unwrap()["resources"].as_array().unwrap().len(), 2);

        let read = JsonRpcRequest::new(2, "resources/read")
            .with_params(json!({ "uri": "tessera://provider" }));
        let response = handle_request(&mut state, &read).await;
        assert_eq!(
            response.result.unwrap()["contents"][0]["mimeType"],
            "application/json"
        );

        let unknown = JsonRpcRequest::new(3, "resources/read")
            .with_params(json!({ "uri": "tessera://nothing" }));
        let error = handle_request(&mut state, &unknown).await.error.unwrap();
        assert_eq!(error.code, codes::RESOURCE_NOT_FOUND);
    }

    #[tokio::test]
    async fn test_prompts_get_missing_argument() {
        let mut state = initialized();
        let request = JsonRpcRequest::new(1, "prompts/get")
            .with_params(json!({ "name": "inspect_transaction", "arguments": {} }));

        let error = handle_request(&mut state, &request).await.error.unwrap();
        assert_eq!(error.code, codes::INVALID_PARAMS);
        assert_eq!(error.message, "Missing required argument: transaction_hash");
    }

    #[tokio::test]
    async fn test_unknown_method() {
        let mut state = initialized();
        let response = handle_request(&mut state, &JsonRpcRequest::new(1, "wallet/explode")).await;
        assert_eq!(response.error.unwrap().code, codes::METHOD_NOT_FOUND);
    }
}
