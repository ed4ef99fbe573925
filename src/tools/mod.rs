//! Operation handlers
//!
//! The two externally invocable operations (search, list engines) as pure
//! argument-to-result mappings over a [`SearchBackend`]. Backend failures
//! are converted into tool-result error envelopes here, never raised to
//! the transport.

use schemars::JsonSchema;
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error};

use crate::backend::types::{SearchParams, TimeRange};
use crate::backend::{SearchBackend, SearxClient};
use crate::error::{AppError, Result};

pub mod format;

/// Arguments of the `search` tool
#[derive(Debug, Clone, Default, Deserialize, JsonSchema)]
pub struct SearchToolParams {
    /// Search query string
    pub query: String,
    /// Category names to restrict the search to
    #[serde(default)]
    pub categories: Option<Vec<String>>,
    /// Engine names to restrict the search to
    #[serde(default)]
    pub engines: Option<Vec<String>>,
    /// Result language code
    #[serde(default)]
    pub language: Option<String>,
    /// Result page number, starting at 1
    #[serde(default)]
    pub pageno: Option<u32>,
    /// Restrict results to a recency window
    #[serde(default)]
    pub time_range: Option<TimeRange>,
    /// Safe-search level 0, 1 or 2
    #[serde(default)]
    pub safesearch: Option<u8>,
    /// SearXNG instance URL; required when the server holds no pre-bound
    /// backend (stateless multi-tenant deployment)
    #[serde(default)]
    pub engine_url: Option<String>,
}

/// Arguments of the `get_engines` tool
#[derive(Debug, Clone, Default, Deserialize, JsonSchema)]
pub struct GetEnginesParams {
    /// SearXNG instance URL; required when the server holds no pre-bound
    /// backend (stateless multi-tenant deployment)
    #[serde(default)]
    pub engine_url: Option<String>,
}

/// Result envelope for one tool invocation
#[derive(Debug, Clone)]
pub struct ToolOutcome {
    pub text: String,
    pub is_error: bool,
}

impl ToolOutcome {
    fn ok(text: String) -> Self {
        Self {
            text,
            is_error: false,
        }
    }

    fn err(text: String) -> Self {
        Self {
            text,
            is_error: true,
        }
    }
}

/// Shared context for tool execution
///
/// Holds the pre-bound backend in bound mode; in stateless mode the
/// backend is constructed per call from the `engine_url` argument and no
/// configuration cache is shared across URLs.
pub struct ToolContext {
    default_backend: Option<Arc<SearxClient>>,
    cache_ttl: Duration,
}

impl ToolContext {
    /// Context over a pre-bound backend client
    pub fn bound(backend: Arc<SearxClient>, cache_ttl: Duration) -> Self {
        Self {
            default_backend: Some(backend),
            cache_ttl,
        }
    }

    /// Context without a pre-bound backend; callers must supply `engine_url`
    pub fn stateless(cache_ttl: Duration) -> Self {
        Self {
            default_backend: None,
            cache_ttl,
        }
    }

    fn resolve(&self, engine_url: Option<&str>) -> Result<Arc<dyn SearchBackend>> {
        if let Some(url) = engine_url.filter(|u| !u.is_empty()) {
            return Ok(Arc::new(SearxClient::new(url, self.cache_ttl)));
        }
        match &self.default_backend {
            Some(backend) => Ok(backend.clone()),
            None => Err(AppError::Validation(
                "engine_url argument is required when no backend is configured".to_string(),
            )),
        }
    }

    /// Run the `search` operation
    pub async fn search(&self, params: SearchToolParams) -> ToolOutcome {
        match self.search_inner(params).await {
            Ok(text) => ToolOutcome::ok(text),
            Err(e) => {
                error!(error = %e, "search tool failed");
                ToolOutcome::err(format!("Search failed: {e}"))
            }
        }
    }

    async fn search_inner(&self, params: SearchToolParams) -> Result<String> {
        let backend = self.resolve(params.engine_url.as_deref())?;
        let search_params = SearchParams {
            query: params.query,
            categories: params.categories.unwrap_or_default(),
            engines: params.engines.unwrap_or_default(),
            language: params.language,
            pageno: params.pageno,
            time_range: params.time_range,
            // Coerce into the {0,1,2} domain
            safesearch: params.safesearch.map(|s| s.min(2)),
        };

        let results = backend.search(&search_params).await?;
        debug!(count = results.len(), "search completed");
        Ok(format::format_search_results(&results))
    }

    /// Run the `get_engines` operation
    pub async fn list_engines(&self, params: GetEnginesParams) -> ToolOutcome {
        match self.list_engines_inner(params).await {
            Ok(text) => ToolOutcome::ok(text),
            Err(e) => {
                error!(error = %e, "get_engines tool failed");
                ToolOutcome::err(format!("Failed to list engines: {e}"))
            }
        }
    }

    async fn list_engines_inner(&self, params: GetEnginesParams) -> Result<String> {
        let backend = self.resolve(params.engine_url.as_deref())?;
        let engines = backend.engines().await?;
        debug!(count = engines.len(), "engine listing completed");
        Ok(format::format_engines(&engines))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn bound_context(server: &MockServer) -> ToolContext {
        let client = Arc::new(SearxClient::new(&server.uri(), Duration::from_secs(300)));
        ToolContext::bound(client, Duration::from_secs(300))
    }

    #[tokio::test]
    async fn search_formats_single_result() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/search"))
            .and(query_param("q", "news"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "results": [{"title": "A", "url": "http://x", "engine": "e1"}]
            })))
            .mount(&server)
            .await;

        let outcome = bound_context(&server)
            .search(SearchToolParams {
                query: "news".to_string(),
                ..Default::default()
            })
            .await;

        assert!(!outcome.is_error);
        assert!(outcome.text.starts_with("Found 1 results:"));
        assert!(outcome.text.contains("1. A"));
        assert!(outcome.text.contains("URL: http://x"));
        assert!(outcome.text.contains("Engine: e1"));
    }

    #[tokio::test]
    async fn search_clamps_safesearch_to_two() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/search"))
            .and(query_param("safesearch", "2"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"results": []})))
            .expect(1)
            .mount(&server)
            .await;

        let outcome = bound_context(&server)
            .search(SearchToolParams {
                query: "x".to_string(),
                safesearch: Some(9),
                ..Default::default()
            })
            .await;
        assert!(!outcome.is_error);
    }

    #[tokio::test]
    async fn backend_failure_becomes_error_envelope() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/search"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let outcome = bound_context(&server)
            .search(SearchToolParams {
                query: "x".to_string(),
                ..Default::default()
            })
            .await;

        assert!(outcome.is_error);
        assert!(outcome.text.starts_with("Search failed:"));
    }

    #[tokio::test]
    async fn stateless_context_requires_engine_url() {
        let context = ToolContext::stateless(Duration::from_secs(300));
        let outcome = context
            .search(SearchToolParams {
                query: "x".to_string(),
                ..Default::default()
            })
            .await;
        assert!(outcome.is_error);
        assert!(outcome.text.contains("engine_url"));
    }

    #[tokio::test]
    async fn stateless_context_uses_supplied_engine_url() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/config"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "categories": ["general"],
                "engines": [{"name": "duckduckgo", "categories": ["general"], "enabled": true}]
            })))
            .mount(&server)
            .await;

        let context = ToolContext::stateless(Duration::from_secs(300));
        let outcome = context
            .list_engines(GetEnginesParams {
                engine_url: Some(server.uri()),
            })
            .await;

        assert!(!outcome.is_error);
        assert!(outcome.text.contains("duckduckgo [enabled]"));
    }

    #[tokio::test]
    async fn empty_engine_list_renders_literal() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/config"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"categories": [], "engines": []})),
            )
            .mount(&server)
            .await;

        let outcome = bound_context(&server)
            .list_engines(GetEnginesParams::default())
            .await;
        assert!(!outcome.is_error);
        assert_eq!(outcome.text, "No engines available.");
    }
}
