//! MCP server implementation for stdio transport
//!
//! Exposes the `search` and `get_engines` tools through rmcp. Tool
//! failures come back as error result envelopes, not protocol errors.

use rmcp::{
    ServerHandler,
    handler::server::tool::Parameters,
    model::{
        CallToolResult, Content, ErrorData, Implementation, ProtocolVersion, ServerCapabilities,
        ServerInfo,
    },
    tool, tool_handler, tool_router,
};
use std::sync::Arc;

use crate::tools::{GetEnginesParams, SearchToolParams, ToolContext, ToolOutcome};

/// MCP server for the SearXNG bridge
#[derive(Clone)]
pub struct SearxngMcpServer {
    tools: Arc<ToolContext>,
    tool_router: rmcp::handler::server::tool::ToolRouter<Self>,
}

impl SearxngMcpServer {
    /// Create a new server over the given tool context
    pub fn new(tools: Arc<ToolContext>) -> Self {
        Self {
            tools,
            tool_router: Self::tool_router(),
        }
    }

    fn into_call_result(outcome: ToolOutcome) -> CallToolResult {
        let content = vec![Content::text(outcome.text)];
        if outcome.is_error {
            CallToolResult::error(content)
        } else {
            CallToolResult::success(content)
        }
    }
}

#[tool_router]
impl SearxngMcpServer {
    /// Web search forwarded to the SearXNG backend
    #[tool(description = "Search the web through a SearXNG metasearch instance")]
    async fn search(
        &self,
        params: Parameters<SearchToolParams>,
    ) -> Result<CallToolResult, ErrorData> {
        let args = params.0;
        if args.query.trim().is_empty() {
            return Err(ErrorData::invalid_params("query cannot be empty", None));
        }
        Ok(Self::into_call_result(self.tools.search(args).await))
    }

    /// Engine listing grouped by category
    #[tool(
        description = "List the search engines the SearXNG instance is configured with, grouped by category"
    )]
    async fn get_engines(
        &self,
        params: Parameters<GetEnginesParams>,
    ) -> Result<CallToolResult, ErrorData> {
        Ok(Self::into_call_result(self.tools.list_engines(params.0).await))
    }
}

#[tool_handler]
impl ServerHandler for SearxngMcpServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: ProtocolVersion::V_2024_11_05,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation {
                name: "searxng-mcp".into(),
                version: env!("CARGO_PKG_VERSION").into(),
                ..Default::default()
            },
            instructions: Some(
                "Bridge to a SearXNG metasearch instance. Use `search` for web queries and `get_engines` to inspect the configured engines.".to_string(),
            ),
        }
    }
}
