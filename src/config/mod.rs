//! Configuration module
//!
//! Loads application configuration from an optional `config.toml` merged
//! with `SEARXNG_MCP_*` environment variables. The bare `SEARXNG_URL`
//! variable is honored as an alias for the backend base URL.

use figment::{
    Figment,
    providers::{Env, Format, Toml},
};
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Backend base URL used when none is configured or the configured one is
/// rejected by validation.
pub const DEFAULT_SEARXNG_URL: &str = "http://localhost:8080";

/// Transport the process serves on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum TransportKind {
    /// Streamable HTTP endpoint with session management
    #[default]
    Http,
    /// Line-oriented stdio; one process, one session
    Stdio,
}

/// Application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// SearXNG instance base URL
    pub searxng_url: String,
    /// Transport selection
    pub transport: TransportKind,
    /// Listen address for HTTP mode
    pub host: String,
    /// Listen port for HTTP mode
    pub port: u16,
    /// Single MCP endpoint path
    pub endpoint_path: String,
    /// Inbound request body cap in bytes
    pub max_body_bytes: usize,
    /// Idle session lifetime in seconds
    pub session_timeout_secs: u64,
    /// Reaper sweep interval in seconds
    pub reaper_interval_secs: u64,
    /// Backend configuration cache TTL in seconds
    pub config_cache_ttl_secs: u64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            searxng_url: DEFAULT_SEARXNG_URL.to_string(),
            transport: TransportKind::Http,
            host: "0.0.0.0".to_string(),
            port: 3000,
            endpoint_path: "/mcp".to_string(),
            max_body_bytes: 1024 * 1024,
            session_timeout_secs: 30 * 60,
            reaper_interval_secs: 60,
            config_cache_ttl_secs: 5 * 60,
        }
    }
}

/// Configuration loader
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration from default sources
    ///
    /// Merge order (later wins):
    /// 1. Built-in defaults
    /// 2. ./config.toml
    /// 3. SEARXNG_URL
    /// 4. SEARXNG_MCP_* environment variables
    pub fn load() -> Result<AppConfig, figment::Error> {
        let config: AppConfig = Figment::from(figment::providers::Serialized::defaults(
            AppConfig::default(),
        ))
        .merge(Toml::file("config.toml"))
        .merge(Env::raw().only(&["SEARXNG_URL"]))
        .merge(Env::prefixed("SEARXNG_MCP_"))
        .extract()?;

        Ok(config.validated())
    }
}

impl AppConfig {
    /// Normalize the configuration, falling back on invalid values
    ///
    /// An invalid backend URL is not fatal: it is replaced by the default
    /// with a warning so the process still comes up.
    pub fn validated(mut self) -> Self {
        if !is_http_url(&self.searxng_url) {
            warn!(
                url = %self.searxng_url,
                fallback = DEFAULT_SEARXNG_URL,
                "configured SearXNG URL is not http/https, falling back to default"
            );
            self.searxng_url = DEFAULT_SEARXNG_URL.to_string();
        }
        if !self.endpoint_path.starts_with('/') {
            self.endpoint_path.insert(0, '/');
        }
        self
    }
}

fn is_http_url(url: &str) -> bool {
    url.starts_with("http://") || url.starts_with("https://")
}
