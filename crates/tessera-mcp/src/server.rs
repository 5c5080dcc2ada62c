//! MCP server loop
//!
//! Reads one JSON-RPC message per line, dispatches it and writes the
//! response. Messages are handled strictly in arrival order.

use std::io;
use std::sync::Arc;

use tessera_core::ProviderRegistry;
use tokio::io::{AsyncBufRead, AsyncWrite};
use tokio::sync::RwLock;
use tracing::{debug, error, info, warn};

use crate::config::ServerConfig;
use crate::handlers::{handle_notification, handle_request, McpServerState};
use crate::protocol::{IncomingMessage, JsonRpcError, JsonRpcResponse, RequestId};
use crate::transport::{LineTransport, StdioTransport};

/// MCP server
pub struct McpServer {
    state: Arc<RwLock<McpServerState>>,
}

impl McpServer {
    pub fn new(providers: Arc<ProviderRegistry>, fallback_private_key: Option<String>) -> Self {
        Self {
            state: Arc::new(RwLock::new(McpServerState::new(
                providers,
                fallback_private_key,
            ))),
        }
    }

    /// Server for a resolved configuration
    pub fn from_config(config: &ServerConfig) -> Self {
        let providers = ProviderRegistry::new(Some(&config.provider_url));
        Self::new(Arc::new(providers), config.private_key.clone())
    }

    pub fn state(&self) -> Arc<RwLock<McpServerState>> {
        Arc::clone(&self.state)
    }

    /// Serve over the process's stdin and stdout
    pub async fn run_stdio(&self) -> io::Result<()> {
        info!("Starting Tessera MCP server (stdio transport)");
        self.serve(StdioTransport::stdio()).await?;
        info!("Tessera MCP server stopped");
        Ok(())
    }

    /// Serve until the reader reaches end of input
    pub async fn serve<R, W>(&self, mut transport: LineTransport<R, W>) -> io::Result<LineTransport<R, W>>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        loop {
            let line = match transport.read_message().await {
                Ok(Some(line)) => line,
                Ok(None) => {
                    info!("EOF received, shutting down");
                    break;
                }
                Err(e) if e.kind() == io::ErrorKind::InvalidData => {
                    warn!(error = %e, "Unreadable input line");
                    let response = JsonRpcResponse::error(RequestId::Null, JsonRpcError::parse_error());
                    transport.write_json(&response).await?;
                    continue;
                }
                Err(e) => {
                    error!(error = %e, "Error reading message");
                    return Err(e);
                }
            };

            if let Some(response) = self.handle_line(&line).await {
                transport.write_json(&response).await?;
            }
        }

        Ok(transport)
    }

    /// Handle one line, returning the response to write if any
    pub async fn handle_line(&self, line: &str) -> Option<JsonRpcResponse> {
        let value: serde_json::Value = match serde_json::from_str(line) {
            Ok(value) => value,
            Err(e) => {
                warn!(error = %e, "Failed to parse JSON");
                return Some(JsonRpcResponse::error(
                    RequestId::Null,
                    JsonRpcError::parse_error(),
                ));
            }
        };

        match IncomingMessage::classify(value) {
            IncomingMessage::Request(request) => {
                let mut state = self.state.write().await;
                Some(handle_request(&mut state, &request).await)
            }
            IncomingMessage::Notification(notification) => {
                let mut state = self.state.write().await;
                handle_notification(&mut state, &notification).await;
                None
            }
            IncomingMessage::Response(_) => {
                debug!("Ignoring response from client");
                None
            }
            IncomingMessage::Invalid(id, reason) => {
                warn!(%id, %reason, "Invalid JSON-RPC message");
                Some(JsonRpcResponse::error(id, JsonRpcError::invalid_request(reason)))
            }
        }
    }
}
