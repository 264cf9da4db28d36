use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use super::Agent;
use crate::errors::{AgentError, AgentResult};
use crate::models::response::Response;
use crate::providers::base::LlmClient;
use crate::search::{render_context, SearchHit, WebSearch};

pub const DEFAULT_LLM_TIMEOUT: Duration = Duration::from_secs(30);

const TUTOR_PROMPT: &str = "You are a helpful tutor and assistant. Answer the user's question \
                            clearly and concisely. User question: ";

/// Search results gathered for one question
#[derive(Debug, Clone, PartialEq)]
pub struct WebContext {
    /// Name of the backend that answered
    pub provider: String,
    pub hits: Vec<SearchHit>,
}

impl WebContext {
    pub fn urls(&self) -> Vec<String> {
        self.hits.iter().map(|hit| hit.url.clone()).collect()
    }

    /// Appended to a local answer when the model could not be reached
    pub fn supplement(&self) -> String {
        format!(
            "Web Search Supplement (via {}):\n{}",
            self.provider,
            render_context(&self.hits)
        )
    }
}

/// Forwards questions to a chat-completion backend, optionally with web-search context.
pub struct LlmAgent {
    client: Arc<dyn LlmClient>,
    search: Option<Arc<dyn WebSearch>>,
    timeout: Duration,
    max_search_results: usize,
}

impl LlmAgent {
    pub const NAME: &'static str = "LLM Agent";

    pub fn new(client: Arc<dyn LlmClient>) -> Self {
        Self {
            client,
            search: None,
            timeout: DEFAULT_LLM_TIMEOUT,
            max_search_results: 3,
        }
    }

    pub fn with_search(mut self, search: Arc<dyn WebSearch>) -> Self {
        self.search = Some(search);
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Binds the per-session key and web preference so the agent can be driven
    /// through the common [`Agent`] interface.
    pub fn session<'a>(&'a self, api_key: Option<&'a str>, use_web: bool) -> LlmSession<'a> {
        LlmSession {
            agent: self,
            api_key,
            use_web,
        }
    }

    /// Searches once for `query`; `None` when no search is configured, it fails,
    /// or nothing was found.
    pub async fn web_context(&self, query: &str) -> Option<WebContext> {
        let search = self.search.as_ref()?;
        match search
            .search_attributed(query, self.max_search_results)
            .await
        {
            Ok((provider, hits)) if !hits.is_empty() => Some(WebContext { provider, hits }),
            Ok(_) => None,
            Err(e) => {
                tracing::warn!(error = %e, "web search unavailable, asking without context");
                None
            }
        }
    }

    pub async fn answer(
        &self,
        query: &str,
        api_key: Option<&str>,
        use_web: bool,
    ) -> AgentResult<Response> {
        let q = query.trim();
        if q.is_empty() || require_key(api_key).is_err() {
            return self.answer_with_context(q, api_key, None).await;
        }
        let context = match use_web {
            true => self.web_context(q).await,
            false => None,
        };
        self.answer_with_context(q, api_key, context.as_ref()).await
    }

    /// Asks the model with search results fetched beforehand, so a caller that
    /// needs them again after a failure does not search twice.
    pub async fn answer_with_context(
        &self,
        query: &str,
        api_key: Option<&str>,
        context: Option<&WebContext>,
    ) -> AgentResult<Response> {
        let q = query.trim();
        if q.is_empty() {
            return Ok(Response::local(
                "Ask me anything; this agent forwards your question to the configured LLM backend.",
            )
            .mark_insufficient());
        }
        let api_key = require_key(api_key)?;

        let mut prompt = format!("{}{}", TUTOR_PROMPT, q);
        if let Some(context) = context {
            prompt.push_str("\n\nWeb context:\n");
            prompt.push_str(&render_context(&context.hits));
        }

        let request = self.client.complete(&prompt, api_key, self.timeout);
        let text = tokio::time::timeout(self.timeout, request)
            .await
            .map_err(|_| {
                AgentError::FallbackUnavailable(format!(
                    "LLM request timed out after {}s",
                    self.timeout.as_secs_f32()
                ))
            })?
            .map_err(|e| AgentError::FallbackUnavailable(format!("LLM request failed: {}", e)))?;

        if text.trim().is_empty() {
            return Err(AgentError::FallbackUnavailable(
                "LLM returned an empty answer".to_string(),
            ));
        }
        let urls = context.map(WebContext::urls).unwrap_or_default();
        Ok(Response::llm(text).with_urls(urls))
    }
}

fn require_key(api_key: Option<&str>) -> AgentResult<&str> {
    api_key
        .map(str::trim)
        .filter(|key| !key.is_empty())
        .ok_or_else(|| AgentError::FallbackUnavailable("no API key provided".to_string()))
}

pub struct LlmSession<'a> {
    agent: &'a LlmAgent,
    api_key: Option<&'a str>,
    use_web: bool,
}

#[async_trait]
impl<'a> Agent for LlmSession<'a> {
    fn name(&self) -> &str {
        LlmAgent::NAME
    }

    async fn handle(&self, query: &str) -> AgentResult<Response> {
        self.agent.answer(query, self.api_key, self.use_web).await
    }
}
