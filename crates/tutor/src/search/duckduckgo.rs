use std::time::Duration;

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;

use super::{SearchHit, WebSearch};

pub const DEFAULT_HOST: &str = "https://api.duckduckgo.com";

/// Leading phrasing the instant-answer API matches poorly
const QUESTION_LEADS: &[&str] = &[
    "what is",
    "what are",
    "tell me about",
    "explain",
    "describe",
    "latest",
    "current",
    "recent",
    "newest",
];

/// Keyless instant-answer lookups
pub struct DuckDuckGo {
    client: Client,
    host: String,
}

impl DuckDuckGo {
    pub fn new(host: &str, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("tutor/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            client,
            host: host.trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl WebSearch for DuckDuckGo {
    fn name(&self) -> &str {
        "duckduckgo"
    }

    async fn search(&self, query: &str, max_results: usize) -> Result<Vec<SearchHit>> {
        let query = simplify_query(query);
        let response = self
            .client
            .get(format!("{}/", self.host))
            .query(&[
                ("q", query.as_str()),
                ("format", "json"),
                ("no_html", "1"),
                ("no_redirect", "1"),
                ("skip_disambig", "1"),
            ])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(anyhow!("DuckDuckGo request failed: {}", status));
        }
        // the API answers with a javascript content type, so decode by hand
        let data: Value = serde_json::from_str(&response.text().await?)?;
        Ok(parse_hits(&data, max_results))
    }
}

fn simplify_query(query: &str) -> String {
    let trimmed = query.trim().trim_end_matches('?').trim();
    let lower = trimmed.to_lowercase();
    for lead in QUESTION_LEADS {
        if lower.starts_with(lead) && trimmed.is_char_boundary(lead.len()) {
            return trimmed[lead.len()..].trim().to_string();
        }
    }
    trimmed.to_string()
}

fn parse_hits(data: &Value, max_results: usize) -> Vec<SearchHit> {
    let mut hits = Vec::new();

    let text_field = |key: &str| {
        data.get(key)
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|s| !s.is_empty())
    };
    if let (Some(abstract_text), Some(url)) = (text_field("Abstract"), text_field("AbstractURL")) {
        hits.push(SearchHit {
            title: text_field("Heading").unwrap_or(url).to_string(),
            url: url.to_string(),
            snippet: Some(abstract_text.to_string()),
        });
    }

    let mut topics = Vec::new();
    for key in ["Results", "RelatedTopics"] {
        if let Some(items) = data.get(key).and_then(Value::as_array) {
            collect_topics(items, &mut topics);
        }
    }
    for topic in topics {
        if hits.len() >= max_results {
            break;
        }
        if !hits.iter().any(|hit| hit.url == topic.url) {
            hits.push(topic);
        }
    }

    hits.truncate(max_results);
    hits
}

/// Flattens topic lists, descending into the grouped `Topics` entries
fn collect_topics(items: &[Value], out: &mut Vec<SearchHit>) {
    for item in items {
        if let Some(nested) = item.get("Topics").and_then(Value::as_array) {
            collect_topics(nested, out);
            continue;
        }
        let text = item.get("Text").and_then(Value::as_str).unwrap_or_default().trim();
        let url = item.get("FirstURL").and_then(Value::as_str).unwrap_or_default().trim();
        if text.is_empty() || url.is_empty() {
            continue;
        }
        let (title, snippet) = match text.split_once(" - ") {
            Some((title, rest)) => (title.to_string(), Some(rest.to_string())),
            None => (text.to_string(), None),
        };
        out.push(SearchHit {
            title,
            url: url.to_string(),
            snippet,
        });
    }
}
