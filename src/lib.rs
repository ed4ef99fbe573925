//! searxng-mcp - MCP bridge to a SearXNG metasearch instance
//!
//! Exposes two remote-callable operations, `search` and `get_engines`,
//! over a session-managed streamable HTTP transport or plain stdio, and
//! implements them by forwarding to a SearXNG HTTP API.

pub mod backend;
pub mod config;
pub mod error;
pub mod mcp;
pub mod session;
pub mod tools;
