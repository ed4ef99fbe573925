//! MCP transport layer
//!
//! Two ways to serve the same two operations: rmcp over stdio (one
//! process, one session) and the session-managed streamable HTTP
//! dispatcher.

use anyhow::Context;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

use crate::backend::SearxClient;
use crate::config::AppConfig;
use crate::session::{SessionRegistry, reaper};
use crate::tools::ToolContext;

pub mod http_server;
pub mod server;

pub use http_server::{HttpTransportState, build_router};
pub use server::SearxngMcpServer;

fn bound_tools(config: &AppConfig) -> Arc<ToolContext> {
    let cache_ttl = Duration::from_secs(config.config_cache_ttl_secs);
    let client = Arc::new(SearxClient::new(&config.searxng_url, cache_ttl));
    Arc::new(ToolContext::bound(client, cache_ttl))
}

/// Run the MCP server over stdio
pub async fn run_stdio_server(config: &AppConfig) -> anyhow::Result<()> {
    use rmcp::{ServiceExt, transport::stdio};

    info!(backend = %config.searxng_url, "starting MCP server with stdio transport");

    let server = SearxngMcpServer::new(bound_tools(config))
        .serve(stdio())
        .await
        .inspect_err(|e| {
            tracing::error!("MCP stdio server error: {}", e);
        })?;

    server.waiting().await?;
    Ok(())
}

/// Run the streamable HTTP transport
pub async fn run_http_server(config: &AppConfig) -> anyhow::Result<()> {
    let registry = Arc::new(SessionRegistry::new());

    // Best-effort background task; detached on purpose
    let _reaper = reaper::spawn_reaper(
        registry.clone(),
        Duration::from_secs(config.reaper_interval_secs),
        Duration::from_secs(config.session_timeout_secs),
    );

    let state = Arc::new(HttpTransportState {
        endpoint_path: config.endpoint_path.clone(),
        max_body_bytes: config.max_body_bytes,
        registry,
        tools: bound_tools(config),
    });
    let router = build_router(state);

    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    info!(
        %addr,
        endpoint = %config.endpoint_path,
        backend = %config.searxng_url,
        "MCP streamable HTTP server listening"
    );

    axum::serve(listener, router).await?;
    Ok(())
}
