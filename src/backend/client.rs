//! Reqwest-backed SearXNG client
//!
//! Stateless HTTP wrapper plus a single-slot TTL cache for the instance
//! configuration. The cache performs a synchronous refetch on expiry;
//! concurrent observers of an expired slot may each refetch, which is
//! acceptable at a minutes-scale TTL.

use async_trait::async_trait;
use reqwest::header::{ACCEPT, HeaderMap, HeaderValue, USER_AGENT};
use std::time::{Duration, Instant};
use tokio::sync::RwLock;
use tracing::{debug, warn};

use crate::backend::SearchBackend;
use crate::backend::types::{EngineInfo, InstanceConfig, SearchParams, SearchResponse, SearchResult};
use crate::error::{AppError, Result};

/// Fixed client identifier sent with every request
const CLIENT_IDENT: &str = concat!("searxng-mcp/", env!("CARGO_PKG_VERSION"));

/// Cached `/config` snapshot with its fetch time
struct CachedConfig {
    fetched_at: Instant,
    config: InstanceConfig,
}

/// HTTP client for one SearXNG instance
pub struct SearxClient {
    http: reqwest::Client,
    base_url: String,
    cache_ttl: Duration,
    config_cache: RwLock<Option<CachedConfig>>,
}

impl SearxClient {
    /// Create a client for the given base URL
    ///
    /// Trailing slashes are stripped once here so endpoint paths can be
    /// appended blindly.
    pub fn new(base_url: &str, cache_ttl: Duration) -> Self {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        headers.insert(USER_AGENT, HeaderValue::from_static(CLIENT_IDENT));

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .build()
            .unwrap_or_default();

        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            cache_ttl,
            config_cache: RwLock::new(None),
        }
    }

    /// Base URL this client talks to
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn fetch_config(&self) -> Result<InstanceConfig> {
        let url = format!("{}/config", self.base_url);
        debug!(%url, "fetching instance configuration");

        let response = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(|e| AppError::BackendUnavailable(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(AppError::Backend {
                status: status.as_u16(),
                status_text: status.canonical_reason().unwrap_or("Unknown").to_string(),
            });
        }

        response
            .json::<InstanceConfig>()
            .await
            .map_err(|e| AppError::Decode(e.to_string()))
    }

    /// Return the instance configuration, refetching when the cached slot
    /// is absent or older than the TTL
    async fn config(&self) -> Result<InstanceConfig> {
        {
            let cache = self.config_cache.read().await;
            if let Some(cached) = cache.as_ref() {
                if cached.fetched_at.elapsed() <= self.cache_ttl {
                    return Ok(cached.config.clone());
                }
            }
        }

        let config = self.fetch_config().await?;
        let mut cache = self.config_cache.write().await;
        *cache = Some(CachedConfig {
            fetched_at: Instant::now(),
            config: config.clone(),
        });
        Ok(config)
    }
}

#[async_trait]
impl SearchBackend for SearxClient {
    async fn search(&self, params: &SearchParams) -> Result<Vec<SearchResult>> {
        let url = format!("{}/search", self.base_url);
        debug!(%url, query = %params.query, "forwarding search");

        let response = self
            .http
            .get(&url)
            .query(&params.query_pairs())
            .send()
            .await
            .map_err(|e| AppError::BackendUnavailable(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            warn!(status = status.as_u16(), "backend returned non-success status");
            return Err(AppError::Backend {
                status: status.as_u16(),
                status_text: status.canonical_reason().unwrap_or("Unknown").to_string(),
            });
        }

        let body = response
            .json::<SearchResponse>()
            .await
            .map_err(|e| AppError::Decode(e.to_string()))?;

        Ok(body.results)
    }

    async fn engines(&self) -> Result<Vec<EngineInfo>> {
        Ok(self.config().await?.engines)
    }

    async fn categories(&self) -> Result<Vec<String>> {
        Ok(self.config().await?.categories)
    }
}
