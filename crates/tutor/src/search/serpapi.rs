use std::time::Duration;

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;

use super::{SearchHit, WebSearch};

pub const DEFAULT_HOST: &str = "https://serpapi.com";

/// Google results through SerpAPI; needs its own key
pub struct SerpApi {
    client: Client,
    host: String,
    api_key: String,
}

impl SerpApi {
    pub fn new(host: &str, api_key: &str, timeout: Duration) -> Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            host: host.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
        })
    }
}

impl std::fmt::Debug for SerpApi {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SerpApi")
            .field("host", &self.host)
            .field("api_key", &"[redacted]")
            .finish()
    }
}

#[async_trait]
impl WebSearch for SerpApi {
    fn name(&self) -> &str {
        "serpapi"
    }

    async fn search(&self, query: &str, max_results: usize) -> Result<Vec<SearchHit>> {
        let num = max_results.to_string();
        let response = self
            .client
            .get(format!("{}/search.json", self.host))
            .query(&[
                ("engine", "google"),
                ("q", query.trim()),
                ("api_key", self.api_key.as_str()),
                ("num", num.as_str()),
            ])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(anyhow!("SerpAPI request failed: {}", status));
        }
        let data: Value = response.json().await?;
        if let Some(error) = data.get("error") {
            return Err(anyhow!("SerpAPI error: {}", error));
        }

        let hits = data
            .get("organic_results")
            .and_then(Value::as_array)
            .map(|results| {
                results
                    .iter()
                    .filter_map(|result| {
                        let title = result.get("title").and_then(Value::as_str)?;
                        let url = result.get("link").and_then(Value::as_str)?;
                        Some(SearchHit {
                            title: title.to_string(),
                            url: url.to_string(),
                            snippet: result
                                .get("snippet")
                                .and_then(Value::as_str)
                                .map(str::to_string),
                        })
                    })
                    .take(max_results)
                    .collect()
            })
            .unwrap_or_default();
        Ok(hits)
    }
}
