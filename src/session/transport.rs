//! Per-session transport binding
//!
//! One `McpSession` is the live channel for one client conversation: it
//! decodes JSON-RPC payloads delivered by the dispatcher and answers MCP
//! `initialize`, `ping`, `tools/list` and `tools/call`. A broadcast
//! channel carries server-initiated events for the session's GET stream.

use serde_json::{Value, json};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::broadcast;
use tracing::debug;

use crate::error::{AppError, Result};
use crate::tools::{GetEnginesParams, SearchToolParams, ToolContext};

/// Protocol version answered when the client does not request one
const DEFAULT_PROTOCOL_VERSION: &str = "2024-11-05";

/// Transport binding for one session
pub struct McpSession {
    tools: Arc<ToolContext>,
    initialized: AtomicBool,
    events: broadcast::Sender<String>,
}

impl McpSession {
    /// Create a binding that is not yet part of any registry index
    pub fn new(tools: Arc<ToolContext>) -> Self {
        let (events, _) = broadcast::channel(16);
        Self {
            tools,
            initialized: AtomicBool::new(false),
            events,
        }
    }

    /// Whether the protocol handshake has completed
    pub fn is_initialized(&self) -> bool {
        self.initialized.load(Ordering::SeqCst)
    }

    /// Subscribe to server-initiated events for this session
    pub fn subscribe(&self) -> broadcast::Receiver<String> {
        self.events.subscribe()
    }

    /// Establish the protocol connection with the initiating payload
    ///
    /// The first request of a session must be `initialize`; anything else
    /// fails establishment and the caller rolls the binding back.
    pub async fn establish(&self, payload: &Value) -> Result<Value> {
        let method = payload.get("method").and_then(|m| m.as_str()).unwrap_or("");
        if method != "initialize" {
            return Err(AppError::Establishment(format!(
                "expected initialize request, got '{method}'"
            )));
        }
        let id = payload.get("id").cloned().unwrap_or(json!(null));
        let response = self.handle_initialize(id, payload.get("params"));
        self.initialized.store(true, Ordering::SeqCst);
        Ok(response)
    }

    /// Deliver one decoded payload to this binding
    ///
    /// Returns `None` for notifications, which get no response body.
    pub async fn handle(&self, payload: Value) -> Option<Value> {
        let method = payload.get("method").and_then(|m| m.as_str()).unwrap_or("");

        // Notifications carry no id and expect no response
        if payload.get("id").is_none() {
            debug!(method, "notification received");
            return None;
        }
        let id = payload.get("id").cloned().unwrap_or(json!(null));

        let response = match method {
            "initialize" => self.handle_initialize(id, payload.get("params")),
            "ping" => json!({ "jsonrpc": "2.0", "id": id, "result": {} }),
            "tools/list" => json!({ "jsonrpc": "2.0", "id": id, "result": {
                "tools": tool_descriptors()
            }}),
            "tools/call" => {
                let params = payload.get("params").cloned().unwrap_or(json!({}));
                self.handle_tool_call(id, params).await
            }
            _ => json!({ "jsonrpc": "2.0", "id": id, "error": {
                "code": -32601,
                "message": format!("Unknown method: {method}")
            }}),
        };
        Some(response)
    }

    fn handle_initialize(&self, id: Value, params: Option<&Value>) -> Value {
        // Echo the client's requested protocol version
        let protocol_version = params
            .and_then(|p| p.get("protocolVersion"))
            .and_then(|v| v.as_str())
            .unwrap_or(DEFAULT_PROTOCOL_VERSION);

        json!({ "jsonrpc": "2.0", "id": id, "result": {
            "protocolVersion": protocol_version,
            "capabilities": { "tools": {} },
            "serverInfo": {
                "name": "searxng-mcp",
                "version": env!("CARGO_PKG_VERSION")
            }
        }})
    }

    async fn handle_tool_call(&self, id: Value, params: Value) -> Value {
        let tool_name = params.get("name").and_then(|v| v.as_str()).unwrap_or("");
        let arguments = params.get("arguments").cloned().unwrap_or(json!({}));

        let outcome = match tool_name {
            "search" => {
                let args: SearchToolParams = match serde_json::from_value(arguments) {
                    Ok(args) => args,
                    Err(e) => return invalid_params(id, &e.to_string()),
                };
                self.tools.search(args).await
            }
            "get_engines" => {
                let args: GetEnginesParams = match serde_json::from_value(arguments) {
                    Ok(args) => args,
                    Err(e) => return invalid_params(id, &e.to_string()),
                };
                self.tools.list_engines(args).await
            }
            "" => {
                return json!({ "jsonrpc": "2.0", "id": id, "error": {
                    "code": -32600, "message": "Missing tool name"
                }});
            }
            _ => {
                return json!({ "jsonrpc": "2.0", "id": id, "error": {
                    "code": -32601, "message": format!("Unknown tool: {tool_name}")
                }});
            }
        };

        json!({ "jsonrpc": "2.0", "id": id, "result": {
            "content": [{ "type": "text", "text": outcome.text }],
            "isError": outcome.is_error
        }})
    }
}

fn invalid_params(id: Value, detail: &str) -> Value {
    json!({ "jsonrpc": "2.0", "id": id, "error": {
        "code": -32602, "message": format!("Invalid params: {detail}")
    }})
}

/// Tool descriptors answered to `tools/list`
fn tool_descriptors() -> Vec<Value> {
    vec![
        json!({
            "name": "search",
            "description": "Search the web through a SearXNG metasearch instance",
            "inputSchema": schema_for::<SearchToolParams>(),
        }),
        json!({
            "name": "get_engines",
            "description": "List the search engines the SearXNG instance is configured with, grouped by category",
            "inputSchema": schema_for::<GetEnginesParams>(),
        }),
    ]
}

fn schema_for<T: schemars::JsonSchema>() -> Value {
    serde_json::to_value(schemars::schema_for!(T))
        .unwrap_or_else(|_| json!({ "type": "object" }))
}
