//! SearXNG backend access
//!
//! Trait-based abstraction over the remote metasearch HTTP API plus the
//! concrete reqwest-backed client. The backend owns all search-quality
//! logic; this module only forwards and decodes.

use async_trait::async_trait;

use crate::error::Result;

pub mod client;
pub mod types;

pub use client::SearxClient;
pub use types::{EngineInfo, SearchParams, SearchResult, TimeRange};

/// Contract the operation handlers consume
#[async_trait]
pub trait SearchBackend: Send + Sync {
    /// Run a search query, preserving backend result order verbatim
    async fn search(&self, params: &SearchParams) -> Result<Vec<SearchResult>>;

    /// List the engines the instance is configured with
    async fn engines(&self) -> Result<Vec<EngineInfo>>;

    /// List the categories the instance is configured with
    async fn categories(&self) -> Result<Vec<String>>;
}
