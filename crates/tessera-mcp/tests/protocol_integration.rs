//! Integration tests for MCP protocol flow
//!
//! These tests drive the request handlers end to end: initialization,
//! tool calls against a scripted provider, resources and prompts.

use std::sync::Arc;

use alloy::providers::{Provider, ProviderBuilder};
use alloy::transports::mock::Asserter;
use serde_json::{json, Value};
use tessera_core::{ProviderHandle, ProviderRegistry};
use tessera_mcp::handlers::{handle_notification, handle_request, McpServerState};
use tessera_mcp::protocol::*;
use tessera_mcp::transport::LineTransport;
use tessera_mcp::McpServer;

const ANVIL_KEY: &str = "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";
const ANVIL_ADDRESS: &str = "0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266";

/// Provider registry backed by a scripted transport
fn mocked_registry() -> (Arc<ProviderRegistry>, Asserter) {
    let asserter = Asserter::new();
    let provider = ProviderBuilder::new()
        .connect_mocked_client(asserter.clone())
        .erased();
    let registry =
        ProviderRegistry::with_handle(ProviderHandle::from_provider("mock://", provider));
    (Arc::new(registry), asserter)
}

/// Helper to create a test server state
fn create_test_state(fallback_key: Option<&str>) -> (McpServerState, Asserter) {
    let (registry, asserter) = mocked_registry();
    let state = McpServerState::new(registry, fallback_key.map(str::to_string));
    (state, asserter)
}

/// Helper to create an initialized server state
fn create_initialized_state(fallback_key: Option<&str>) -> (McpServerState, Asserter) {
    let (mut state, asserter) = create_test_state(fallback_key);
    state.initialized = true;
    state.protocol_version = Some(MCP_PROTOCOL_VERSION.to_string());
    (state, asserter)
}

async fn call_tool(state: &mut McpServerState, id: i64, name: &str, arguments: Value) -> Value {
    let request = JsonRpcRequest::new(id, "tools/call")
        .with_params(json!({ "name": name, "arguments": arguments }));
    let response = handle_request(state, &request).await;
    assert!(response.error.is_none(), "tools/call never fails at the protocol level");
    response.result.expect("Should have result")
}

// ============================================================================
// Lifecycle Tests
// ============================================================================

#[tokio::test]
async fn test_full_initialization_flow() {
    let (mut state, _) = create_test_state(None);

    let init_request = JsonRpcRequest::new(1, "initialize").with_params(json!({
        "protocolVersion": "2025-11-25",
        "capabilities": {
            "roots": { "listChanged": true }
        },
        "clientInfo": {
            "name": "test-client",
            "version": "1.0.0"
        }
    }));

    let response = handle_request(&mut state, &init_request).await;
    assert!(response.error.is_none(), "Initialize should succeed");
    let result = response.result.expect("Should have result");

    assert_eq!(result["protocolVersion"], "2025-11-25");

    let capabilities = &result["capabilities"];
    assert!(capabilities["tools"].is_object());
    assert!(capabilities["resources"].is_object());
    assert!(capabilities["prompts"].is_object());

    assert_eq!(result["serverInfo"]["name"], "tessera-mcp");

    // Still gated until the client confirms
    let early = handle_request(&mut state, &JsonRpcRequest::new(2, "tools/list")).await;
    assert_eq!(early.error.unwrap().code, codes::NOT_INITIALIZED);

    handle_notification(
        &mut state,
        &JsonRpcNotification::new("notifications/initialized"),
    )
    .await;
    assert!(state.initialized);

    let response = handle_request(&mut state, &JsonRpcRequest::new(3, "tools/list")).await;
    assert!(response.error.is_none());
}

#[tokio::test]
async fn test_unknown_method() {
    let (mut state, _) = create_initialized_state(None);
    let response = handle_request(&mut state, &JsonRpcRequest::new(1, "wallet/list")).await;
    assert_eq!(response.error.unwrap().code, codes::METHOD_NOT_FOUND);
}

// ============================================================================
// Tool Tests
// ============================================================================

#[tokio::test]
async fn test_tools_list_catalogue() {
    let (mut state, _) = create_initialized_state(None);
    let response = handle_request(&mut state, &JsonRpcRequest::new(1, "tools/list")).await;
    let tools = response.result.unwrap()["tools"].as_array().unwrap().clone();

    assert_eq!(tools.len(), 36);
    for tool in &tools {
        let name = tool["name"].as_str().unwrap();
        assert!(
            name.starts_with("wallet_") || name.starts_with("provider_") || name.starts_with("network_"),
            "unexpected tool name {}",
            name
        );
        assert_eq!(tool["inputSchema"]["type"], "object");
    }

    let send = tools
        .iter()
        .find(|t| t["name"] == "wallet_send_transaction")
        .unwrap();
    assert_eq!(send["annotations"]["destructiveHint"], true);
}

#[tokio::test]
async fn test_wallet_roundtrip_through_handlers() {
    let (mut state, _) = create_initialized_state(None);

    let created = call_tool(&mut state, 1, "wallet_create_random", json!({})).await;
    assert_eq!(created["isError"], false);
    let wallet = &created["structuredContent"];
    let private_key = wallet["privateKey"].as_str().unwrap().to_string();
    let address = wallet["address"].as_str().unwrap().to_string();

    let imported = call_tool(
        &mut state,
        2,
        "wallet_get_address",
        json!({ "wallet": private_key }),
    )
    .await;
    assert_eq!(imported["structuredContent"]["address"], address.as_str());
}

#[tokio::test]
async fn test_fallback_private_key() {
    let (mut state, _) = create_initialized_state(Some(ANVIL_KEY));

    let result = call_tool(&mut state, 1, "wallet_get_address", json!({})).await;
    assert_eq!(result["isError"], false);
    assert_eq!(result["structuredContent"]["address"], ANVIL_ADDRESS);

    let (mut state, _) = create_initialized_state(None);
    let result = call_tool(&mut state, 2, "wallet_get_address", json!({})).await;
    assert_eq!(result["isError"], true);
    assert_eq!(
        result["structuredContent"]["error"],
        "Failed to get wallet address: Wallet data is required or set PRIVATE_KEY environment variable"
    );
}

#[tokio::test]
async fn test_provider_backed_tool() {
    let (mut state, asserter) = create_initialized_state(Some(ANVIL_KEY));
    asserter.push_success(&"0xde0b6b3a7640000");

    let result = call_tool(&mut state, 1, "wallet_get_balance", json!({})).await;
    assert_eq!(result["isError"], false);
    assert_eq!(result["structuredContent"]["balance"], "1000000000000000000");
    assert_eq!(result["structuredContent"]["balanceInEth"], "1.0");
}

#[tokio::test]
async fn test_provider_failure_is_an_envelope() {
    let (mut state, asserter) = create_initialized_state(None);
    asserter.push_failure_msg("header not found");

    let result = call_tool(&mut state, 1, "network_get_block_number", json!({})).await;
    assert_eq!(result["isError"], true);
    let message = result["content"][0]["text"].as_str().unwrap();
    assert!(message.starts_with("Failed to get block number: "));
}

#[tokio::test]
async fn test_provider_set_is_shared() {
    let (mut state, _) = create_initialized_state(None);

    let result = call_tool(
        &mut state,
        1,
        "wallet_provider_set",
        json!({ "providerURL": "http://127.0.0.1:8545" }),
    )
    .await;
    assert_eq!(result["isError"], false);

    let request = JsonRpcRequest::new(2, "resources/read")
        .with_params(json!({ "uri": "tessera://provider" }));
    let response = handle_request(&mut state, &request).await;
    let contents = &response.result.unwrap()["contents"][0];
    let body: Value = serde_json::from_str(contents["text"].as_str().unwrap()).unwrap();
    assert_eq!(body["url"], "http://127.0.0.1:8545");
}

// ============================================================================
// Resource Tests
// ============================================================================

#[tokio::test]
async fn test_resources_list_and_read() {
    let (mut state, _) = create_initialized_state(None);

    let response = handle_request(&mut state, &JsonRpcRequest::new(1, "resources/list")).await;
    let resources = response.result.unwrap()["resources"].as_array().unwrap().len();
    assert_eq!(resources, 2);

    let response = handle_request(
        &mut state,
        &JsonRpcRequest::new(2, "resources/templates/list"),
    )
    .await;
    assert_eq!(
        response.result.unwrap()["resourceTemplates"][0]["uriTemplate"],
        "tessera://networks/{chain_id}"
    );

    let request = JsonRpcRequest::new(3, "resources/read")
        .with_params(json!({ "uri": "tessera://networks/11155111" }));
    let response = handle_request(&mut state, &request).await;
    let text = response.result.unwrap()["contents"][0]["text"]
        .as_str()
        .unwrap()
        .to_string();
    assert!(text.contains("sepolia"));
}

#[tokio::test]
async fn test_unknown_resource() {
    let (mut state, _) = create_initialized_state(None);
    let request = JsonRpcRequest::new(1, "resources/read")
        .with_params(json!({ "uri": "tessera://wallets" }));
    let response = handle_request(&mut state, &request).await;
    assert_eq!(response.error.unwrap().code, codes::RESOURCE_NOT_FOUND);
}

// ============================================================================
// Prompt Tests
// ============================================================================

#[tokio::test]
async fn test_prompts_get() {
    let (mut state, _) = create_initialized_state(None);

    let response = handle_request(&mut state, &JsonRpcRequest::new(1, "prompts/list")).await;
    assert_eq!(response.result.unwrap()["prompts"].as_array().unwrap().len(), 3);

    let request = JsonRpcRequest::new(2, "prompts/get").with_params(json!({
        "name": "inspect_transaction",
        "arguments": {
            "transaction_hash": "0x88df016429689c079f3b2f6ad39fa052532c56795b733da78a91ebe6a713944b"
        }
    }));
    let response = handle_request(&mut state, &request).await;
    let result = response.result.unwrap();
    assert_eq!(result["messages"][0]["role"], "user");

    let request = JsonRpcRequest::new(3, "prompts/get")
        .with_params(json!({ "name": "inspect_transaction" }));
    let response = handle_request(&mut state, &request).await;
    assert_eq!(response.error.unwrap().code, codes::INVALID_PARAMS);
}

// ============================================================================
// Transport Tests
// ============================================================================

#[tokio::test]
async fn test_stdio_session() {
    let (registry, _) = mocked_registry();
    let server = McpServer::new(registry, None);

    let input = [
        json!({
            "jsonrpc": "2.0", "id": 1, "method": "initialize",
            "params": {
                "protocolVersion": "2025-11-25",
                "capabilities": {},
                "clientInfo": { "name": "pipe", "version": "0.0.1" }
            }
        }),
        json!({ "jsonrpc": "2.0", "method": "notifications/initialized" }),
        json!({
            "jsonrpc": "2.0", "id": 2, "method": "tools/call",
            "params": {
                "name": "wallet_from_private_key",
                "arguments": { "privateKey": ANVIL_KEY }
            }
        }),
    ]
    .iter()
    .map(|v| format!("{}\n", v))
    .collect::<String>();

    let transport = LineTransport::new(input.as_bytes(), Vec::new());
    let transport = server.serve(transport).await.unwrap();
    let (_, written) = transport.into_inner();

    let responses: Vec<Value> = String::from_utf8(written)
        .unwrap()
        .lines()
        .map(|l| serde_json::from_str(l).unwrap())
        .collect();

    assert_eq!(responses.len(), 2);
    assert_eq!(responses[0]["id"], 1);
    assert_eq!(responses[1]["id"], 2);
    assert_eq!(
        responses[1]["result"]["structuredContent"]["address"],
        ANVIL_ADDRESS
    );
}
