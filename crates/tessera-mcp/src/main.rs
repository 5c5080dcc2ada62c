//! Tessera MCP Server
//!
//! A Model Context Protocol server that gives AI agents EVM wallets and an
//! Ethereum JSON-RPC provider.

use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, ValueEnum};
use tracing::{info, Level};
use tracing_subscriber::EnvFilter;

use tessera_mcp::{McpServer, ServerConfig};

/// Tessera MCP Server - EVM wallets for AI agents
#[derive(Parser, Debug)]
#[command(name = "tessera-mcp")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// JSON configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// JSON-RPC endpoint used when a tool call names no provider
    #[arg(long, env = "PROVIDER_URL")]
    provider_url: Option<String>,

    /// Enable verbose logging (to stderr)
    #[arg(short, long)]
    verbose: bool,

    /// Log level
    #[arg(long, value_enum, default_value = "info")]
    log_level: LogLevel,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl From<LogLevel> for Level {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Trace => Level::TRACE,
            LogLevel::Debug => Level::DEBUG,
            LogLevel::Info => Level::INFO,
            LogLevel::Warn => Level::WARN,
            LogLevel::Error => Level::ERROR,
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let level = if args.verbose {
        Level::DEBUG
    } else {
        Level::from(args.log_level)
    };

    // stdout carries the protocol
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level.as_str().to_lowercase()));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .init();

    info!("Tessera MCP Server v{} starting", env!("CARGO_PKG_VERSION"));

    let config = match &args.config {
        Some(path) => ServerConfig::load(path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?,
        None => ServerConfig::default(),
    };
    let config = config
        .with_env()
        .with_overrides(args.provider_url.clone(), None);
    info!(provider = %config.provider_url, signer = config.private_key.is_some(), "Configuration loaded");

    let server = McpServer::from_config(&config);
    server.run_stdio().await.context("MCP server failed")?;

    Ok(())
}
