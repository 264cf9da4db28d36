pub mod duckduckgo;
pub mod serpapi;

use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};

pub use duckduckgo::DuckDuckGo;
pub use serpapi::SerpApi;

pub const DEFAULT_SEARCH_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchHit {
    pub title: String,
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub snippet: Option<String>,
}

#[async_trait]
pub trait WebSearch: Send + Sync {
    fn name(&self) -> &str;

    /// At most `max_results` hits in relevance order
    async fn search(&self, query: &str, max_results: usize) -> Result<Vec<SearchHit>>;

    /// Hits together with the name of the backend that produced them
    async fn search_attributed(
        &self,
        query: &str,
        max_results: usize,
    ) -> Result<(String, Vec<SearchHit>)> {
        let hits = self.search(query, max_results).await?;
        Ok((self.name().to_string(), hits))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum SearchBackend {
    DuckDuckGo,
    SerpApi,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Tried in this order
    pub backends: Vec<SearchBackend>,
    pub serpapi_key: Option<String>,
    pub duckduckgo_host: String,
    pub serpapi_host: String,
    pub timeout_secs: u64,
    pub max_results: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            backends: vec![SearchBackend::DuckDuckGo, SearchBackend::SerpApi],
            serpapi_key: None,
            duckduckgo_host: duckduckgo::DEFAULT_HOST.to_string(),
            serpapi_host: serpapi::DEFAULT_HOST.to_string(),
            timeout_secs: DEFAULT_SEARCH_TIMEOUT.as_secs(),
            max_results: 3,
        }
    }
}

/// Backends in priority order; the first one with any hits wins.
pub struct SearchChain {
    backends: Vec<Arc<dyn WebSearch>>,
    timeout: Duration,
}

impl SearchChain {
    pub fn new(backends: Vec<Arc<dyn WebSearch>>, timeout: Duration) -> Self {
        Self { backends, timeout }
    }

    /// Keyed backends without a key are left out of the chain.
    pub fn from_config(config: &SearchConfig) -> Result<Self> {
        let timeout = Duration::from_secs(config.timeout_secs);
        let mut backends: Vec<Arc<dyn WebSearch>> = Vec::new();
        for backend in &config.backends {
            match backend {
                SearchBackend::DuckDuckGo => {
                    backends.push(Arc::new(DuckDuckGo::new(&config.duckduckgo_host, timeout)?))
                }
                SearchBackend::SerpApi => match &config.serpapi_key {
                    Some(key) if !key.trim().is_empty() => backends.push(Arc::new(SerpApi::new(
                        &config.serpapi_host,
                        key,
                        timeout,
                    )?)),
                    _ => tracing::debug!("serpapi configured without a key, skipping"),
                },
            }
        }
        Ok(Self::new(backends, timeout))
    }

    pub fn is_empty(&self) -> bool {
        self.backends.is_empty()
    }

    pub fn backend_names(&self) -> Vec<String> {
        self.backends.iter().map(|b| b.name().to_string()).collect()
    }
}

#[async_trait]
impl WebSearch for SearchChain {
    fn name(&self) -> &str {
        "chain"
    }

    async fn search(&self, query: &str, max_results: usize) -> Result<Vec<SearchHit>> {
        Ok(self.search_attributed(query, max_results).await?.1)
    }

    /// Errors only when every backend failed; a chain where some backend answered
    /// with nothing yields an empty list.
    async fn search_attributed(
        &self,
        query: &str,
        max_results: usize,
    ) -> Result<(String, Vec<SearchHit>)> {
        let mut last_error = None;
        let mut any_answered = false;

        for backend in &self.backends {
            let outcome = tokio::time::timeout(self.timeout, backend.search(query, max_results))
                .await
                .unwrap_or_else(|_| Err(anyhow!("timed out after {:?}", self.timeout)));
            match outcome {
                Ok(hits) if !hits.is_empty() => {
                    tracing::debug!(backend = backend.name(), hits = hits.len(), "web search");
                    let hits = hits.into_iter().take(max_results).collect();
                    return Ok((backend.name().to_string(), hits));
                }
                Ok(_) => any_answered = true,
                Err(e) => {
                    tracing::warn!(backend = backend.name(), error = %e, "web search failed");
                    last_error = Some(e);
                }
            }
        }

        match last_error {
            Some(e) if !any_answered => Err(e),
            _ => Ok((self.name().to_string(), Vec::new())),
        }
    }
}

/// Prompt context lines, one per hit
pub fn render_context(hits: &[SearchHit]) -> String {
    hits.iter()
        .map(|hit| match &hit.snippet {
            Some(snippet) => format!("- {}: {} ({})", hit.title, snippet, hit.url),
            None => format!("- {} ({})", hit.title, hit.url),
        })
        .collect::<Vec<_>>()
        .join("\n")
}
