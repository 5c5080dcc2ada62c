//! Tessera MCP Server
//!
//! This crate implements a Model Context Protocol (MCP) server that lets any
//! MCP-compatible AI agent create and use EVM wallets and query an Ethereum
//! JSON-RPC provider.
//!
//! # Features
//!
//! - **Tools**: Wallet creation and key export, transaction signing and
//!   broadcast, message and EIP-712 signatures, chain queries and ENS
//! - **Resources**: The current provider and the known network table
//! - **Prompts**: Guided workflows for transfers, signature checks and
//!   transaction inspection
//!
//! # Transport Support
//!
//! - **stdio**: Newline-delimited JSON-RPC on standard input/output
//!
//! # Example Usage
//!
//! ```no_run
//! use tessera_mcp::{McpServer, ServerConfig};
//!
//! #[tokio::main]
//! async fn main() {
//!     let config = ServerConfig::default().with_env();
//!     let server = McpServer::from_config(&config);
//!     server.run_stdio().await.expect("Server failed");
//! }
//! ```
//!
//! # Protocol Version
//!
//! This implementation targets MCP version 2025-11-25.

pub mod config;
pub mod handlers;
pub mod prompts;
pub mod protocol;
pub mod resources;
pub mod server;
pub mod tools;
pub mod transport;
pub mod validation;

pub use config::{ConfigError, ServerConfig};
pub use protocol::{
    ClientCapabilities, ClientInfo, InitializeParams, InitializeResult, JsonRpcError,
    JsonRpcNotification, JsonRpcRequest, JsonRpcResponse, ServerCapabilities, ServerInfo, Tool,
    ToolContent, ToolsCallResult, MCP_PROTOCOL_VERSION,
};
pub use server::McpServer;
pub use tools::ToolContext;
