use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::agents::{Agent, AgentRegistry, LlmAgent, DEFAULT_AGENT};
use crate::errors::{AgentError, AgentResult};
use crate::models::response::Response;
use crate::policy::{FallbackInputs, FallbackPolicy, Route};
use crate::router::{Classification, Confidence, IntentRouter, Suggestion};

/// How the agent for a query is chosen
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum DispatchMode {
    Auto,
    Explicit(String),
}

impl DispatchMode {
    /// `auto` (any case) or an empty choice means routing; anything else names an agent.
    pub fn from_choice(choice: Option<&str>) -> Self {
        match choice.map(str::trim) {
            None | Some("") => DispatchMode::Auto,
            Some(name) if name.eq_ignore_ascii_case("auto") => DispatchMode::Auto,
            Some(name) => DispatchMode::Explicit(name.to_string()),
        }
    }
}

/// Per-session switches. The key only ever lives here, in memory.
#[derive(Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DispatchOptions {
    #[serde(skip_serializing)]
    pub api_key: Option<String>,
    pub fallback_enabled: bool,
    pub use_web: bool,
    pub disabled_fallbacks: BTreeSet<String>,
}

impl fmt::Debug for DispatchOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DispatchOptions")
            .field("api_key", &self.api_key.as_ref().map(|_| "[redacted]"))
            .field("fallback_enabled", &self.fallback_enabled)
            .field("use_web", &self.use_web)
            .field("disabled_fallbacks", &self.disabled_fallbacks)
            .finish()
    }
}

impl DispatchOptions {
    pub fn api_key(&self) -> Option<&str> {
        self.api_key
            .as_deref()
            .map(str::trim)
            .filter(|key| !key.is_empty())
    }

    pub fn fallback_disabled_for(&self, agent: &str) -> bool {
        self.disabled_fallbacks
            .iter()
            .any(|name| name.trim().eq_ignore_ascii_case(agent))
    }
}

/// Routes queries to agents and decides when the LLM answers instead.
/// Never fails: every problem becomes a flagged [`Response`].
pub struct AgentManager {
    registry: AgentRegistry,
    router: IntentRouter,
    llm: LlmAgent,
}

impl AgentManager {
    /// The built-in agents routed with their default keyword tables
    pub fn new(llm: LlmAgent) -> AgentResult<Self> {
        Ok(Self::with_registry(
            AgentRegistry::with_defaults()?,
            DEFAULT_AGENT,
            llm,
        ))
    }

    pub fn with_registry<S: Into<String>>(
        registry: AgentRegistry,
        default_agent: S,
        llm: LlmAgent,
    ) -> Self {
        let router = IntentRouter::new(registry.descriptors(), default_agent);
        Self {
            registry,
            router,
            llm,
        }
    }

    /// Local agents in routing priority order, then the LLM agent
    pub fn list_agents(&self) -> Vec<String> {
        let mut names = self.registry.names();
        names.push(LlmAgent::NAME.to_string());
        names
    }

    pub fn detect_intent(&self, query: &str) -> Classification {
        self.router.classify(query)
    }

    pub fn suggest(&self, query: &str, top_n: usize) -> Vec<Suggestion> {
        self.router.suggest(query, top_n)
    }

    /// Full names match case-insensitively; the name without its " Agent" suffix works too.
    fn resolve(&self, name: &str) -> Option<Arc<dyn Agent>> {
        let name = name.trim();
        self.registry.get(name).or_else(|| {
            self.registry
                .names()
                .into_iter()
                .find(|full| {
                    full.strip_suffix(" Agent")
                        .is_some_and(|short| short.eq_ignore_ascii_case(name))
                })
                .and_then(|full| self.registry.get(&full))
        })
    }

    fn is_llm_name(name: &str) -> bool {
        let name = name.trim();
        name.eq_ignore_ascii_case(LlmAgent::NAME) || name.eq_ignore_ascii_case("llm")
    }

    pub async fn dispatch(
        &self,
        query: &str,
        mode: &DispatchMode,
        options: &DispatchOptions,
    ) -> Response {
        let q = query.trim();
        if q.is_empty() {
            debug!("rejecting empty query");
            return Response::input_error(AgentError::EmptyQuery.to_string());
        }

        let response = match mode {
            DispatchMode::Explicit(name) if Self::is_llm_name(name) => {
                self.dispatch_llm(q, options).await
            }
            DispatchMode::Explicit(name) => match self.resolve(name) {
                Some(agent) => self.run_local(agent, q, None, options).await,
                None => Response::agent_error(AgentError::UnknownAgent(name.clone()).to_string()),
            },
            DispatchMode::Auto => {
                let classification = self.router.classify(q);
                match self.registry.get(&classification.agent) {
                    Some(agent) => {
                        self.run_local(agent, q, Some(classification.confidence), options)
                            .await
                    }
                    None => Response::agent_error(
                        AgentError::UnknownAgent(classification.agent).to_string(),
                    ),
                }
            }
        };

        info!(
            agent = response.agent.as_deref().unwrap_or("none"),
            provider = %response.provider,
            insufficient = response.insufficient,
            fallback_from = response.fallback_from.as_deref(),
            "dispatched query"
        );
        response
    }

    async fn run_local(
        &self,
        agent: Arc<dyn Agent>,
        query: &str,
        confidence: Option<Confidence>,
        options: &DispatchOptions,
    ) -> Response {
        let name = agent.name().to_string();
        let (local, agent_failed) = match agent.handle(query).await {
            Ok(response) => (response.with_agent(&name), false),
            Err(e) => {
                warn!(agent = %name, error = %e, "agent failed");
                (
                    Response::agent_error(format!("{} could not answer: {}", name, e))
                        .with_agent(&name),
                    true,
                )
            }
        };

        let inputs = FallbackInputs {
            fallback_enabled: options.fallback_enabled,
            has_api_key: options.api_key().is_some(),
            agent_opted_out: options.fallback_disabled_for(&name),
            agent_is_llm: Self::is_llm_name(&name),
            confidence,
            insufficient: local.is_insufficient(),
            agent_failed,
        };
        let route = FallbackPolicy::decide(&inputs);
        debug!(agent = %name, ?confidence, %route, "fallback decision");
        if route == Route::Local {
            return local;
        }

        match self
            .llm
            .answer(query, options.api_key(), options.use_web)
            .await
        {
            Ok(response) => response
                .with_agent(LlmAgent::NAME)
                .with_fallback_from(name),
            Err(e) => {
                warn!(agent = %name, error = %e, "LLM fallback unavailable, keeping local answer");
                local.with_fallback_reason(e.to_string())
            }
        }
    }

    /// The LLM was picked by name. When it cannot answer, the router's local pick
    /// answers instead, followed by the web results already fetched for the model.
    async fn dispatch_llm(&self, query: &str, options: &DispatchOptions) -> Response {
        let context = match options.use_web {
            true => self.llm.web_context(query).await,
            false => None,
        };
        let llm_error = match self
            .llm
            .answer_with_context(query, options.api_key(), context.as_ref())
            .await
        {
            Ok(response) => return response.with_agent(LlmAgent::NAME),
            Err(e) => e,
        };
        warn!(error = %llm_error, "LLM unavailable, answering locally");

        let classification = self.router.classify(query);
        let Some(agent) = self.registry.get(&classification.agent) else {
            return Response::agent_error(llm_error.to_string()).with_agent(LlmAgent::NAME);
        };
        match agent.handle(query).await {
            Ok(response) => {
                let mut response = response
                    .with_agent(agent.name())
                    .with_fallback_reason(llm_error.to_string());
                if let Some(context) = &context {
                    response.text = format!("{}\n\n{}", response.text, context.supplement());
                    for url in context.urls() {
                        if !response.urls.contains(&url) {
                            response.urls.push(url);
                        }
                    }
                }
                response
            }
            Err(e) => {
                warn!(agent = agent.name(), error = %e, "local fallback failed");
                Response::agent_error(llm_error.to_string()).with_agent(LlmAgent::NAME)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::response::{ResponseError, ResponseProvider};
    use crate::providers::mock::MockLlmClient;
    use crate::search::mock::StaticSearch;

    const LLM_ANSWER: &str = "Here is a detailed answer from the model.";

    fn manager_with(client: Arc<MockLlmClient>) -> AgentManager {
        AgentManager::new(LlmAgent::new(client)).unwrap()
    }

    fn with_key() -> DispatchOptions {
        DispatchOptions {
            api_key: Some("sk-test".to_string()),
            fallback_enabled: true,
            ..Default::default()
        }
    }

    fn explicit(name: &str) -> DispatchMode {
        DispatchMode::Explicit(name.to_string())
    }

    #[test]
    fn test_dispatch_mode_from_choice() {
        assert_eq!(DispatchMode::from_choice(None), DispatchMode::Auto);
        assert_eq!(DispatchMode::from_choice(Some(" AUTO ")), DispatchMode::Auto);
        assert_eq!(DispatchMode::from_choice(Some("Math Agent")), explicit("Math Agent"));
    }

    #[test]
    fn test_options_debug_redacts_key() {
        let rendered = format!("{:?}", with_key());
        assert!(!rendered.contains("sk-test"));
        assert!(rendered.contains("[redacted]"));
        let serialized = serde_json::to_string(&with_key()).unwrap();
        assert!(!serialized.contains("sk-test"));
    }

    #[test]
    fn test_list_agents_ends_with_llm() {
        let manager = manager_with(Arc::new(MockLlmClient::new(vec![LLM_ANSWER])));
        let agents = manager.list_agents();
        assert_eq!(agents.first().map(String::as_str), Some("Math Agent"));
        assert_eq!(agents.last().map(String::as_str), Some("LLM Agent"));
        assert_eq!(agents.len(), 8);
    }

    #[tokio::test]
    async fn test_empty_query_is_input_error() {
        let client = Arc::new(MockLlmClient::new(vec![LLM_ANSWER]));
        let manager = manager_with(client.clone());

        let response = manager.dispatch("   ", &DispatchMode::Auto, &with_key()).await;
        assert_eq!(response.error, Some(ResponseError::Input));
        assert_eq!(response.provider, ResponseProvider::None);
        assert_eq!(response.text, "Please enter a question");
        assert!(response.agent.is_none());
        assert_eq!(client.calls(), 0);
    }

    #[tokio::test]
    async fn test_explicit_math_with_good_answer_stays_local() {
        let client = Arc::new(MockLlmClient::new(vec![LLM_ANSWER]));
        let manager = manager_with(client.clone());

        let response = manager
            .dispatch("3x + 5 = 20", &explicit("Math Agent"), &with_key())
            .await;
        assert_eq!(response.provider, ResponseProvider::Local);
        assert_eq!(response.text, "Solution: x = 5");
        assert_eq!(response.agent.as_deref(), Some("Math Agent"));
        assert_eq!(client.calls(), 0);
    }

    #[tokio::test]
    async fn test_auto_mcq_picks_b() {
        let client = Arc::new(MockLlmClient::new(vec![LLM_ANSWER]));
        let manager = manager_with(client.clone());

        let response = manager
            .dispatch(
                "If 3x+5=20, what is x?\nA)3\nB)5\nC)10\nD)15",
                &DispatchMode::Auto,
                &with_key(),
            )
            .await;
        assert!(response.text.starts_with("I think the answer is B"));
        assert_eq!(client.calls(), 0);
    }

    #[tokio::test]
    async fn test_disabled_fallback_never_calls_llm() {
        let client = Arc::new(MockLlmClient::new(vec![LLM_ANSWER]));
        let manager = manager_with(client.clone());
        let options = DispatchOptions {
            fallback_enabled: false,
            ..with_key()
        };

        for query in ["hello there", "tell me something", "derivative of sin(x)"] {
            let response = manager.dispatch(query, &DispatchMode::Auto, &options).await;
            assert_eq!(response.provider, ResponseProvider::Local);
            assert!(!response.text.is_empty());
        }
        assert_eq!(client.calls(), 0);
    }

    #[tokio::test]
    async fn test_low_confidence_falls_back_to_llm() {
        let client = Arc::new(MockLlmClient::new(vec![LLM_ANSWER]));
        let manager = manager_with(client.clone());

        let response = manager
            .dispatch("hello there", &DispatchMode::Auto, &with_key())
            .await;
        assert_eq!(response.provider, ResponseProvider::Llm);
        assert_eq!(response.text, LLM_ANSWER);
        assert_eq!(response.agent.as_deref(), Some("LLM Agent"));
        assert_eq!(response.fallback_from.as_deref(), Some("High School Agent"));
        assert_eq!(client.calls(), 1);
    }

    #[tokio::test]
    async fn test_insufficient_answer_falls_back_even_when_confident() {
        let client = Arc::new(MockLlmClient::new(vec![LLM_ANSWER]));
        let manager = manager_with(client.clone());

        let response = manager
            .dispatch("derivative of sin(x)", &DispatchMode::Auto, &with_key())
            .await;
        assert_eq!(response.provider, ResponseProvider::Llm);
        assert_eq!(response.fallback_from.as_deref(), Some("AP STEM Agent"));
    }

    #[tokio::test]
    async fn test_no_key_keeps_local_answer() {
        let client = Arc::new(MockLlmClient::new(vec![LLM_ANSWER]));
        let manager = manager_with(client.clone());
        let options = DispatchOptions {
            api_key: Some("  ".to_string()),
            ..with_key()
        };

        let response = manager.dispatch("hello there", &DispatchMode::Auto, &options).await;
        assert_eq!(response.provider, ResponseProvider::Local);
        assert!(response.fallback_reason.is_none());
        assert_eq!(client.calls(), 0);
    }

    #[tokio::test]
    async fn test_opted_out_agent_keeps_local_answer() {
        let client = Arc::new(MockLlmClient::new(vec![LLM_ANSWER]));
        let manager = manager_with(client.clone());
        let options = DispatchOptions {
            disabled_fallbacks: ["high school agent".to_string()].into_iter().collect(),
            ..with_key()
        };

        let response = manager.dispatch("hello there", &DispatchMode::Auto, &options).await;
        assert_eq!(response.agent.as_deref(), Some("High School Agent"));
        assert_eq!(client.calls(), 0);
    }

    #[tokio::test]
    async fn test_llm_failure_keeps_local_with_reason() {
        let client = Arc::new(MockLlmClient::failing("Request failed: 401 Unauthorized"));
        let manager = manager_with(client.clone());

        let response = manager
            .dispatch("hello there", &DispatchMode::Auto, &with_key())
            .await;
        assert_eq!(response.provider, ResponseProvider::Local);
        assert_eq!(response.agent.as_deref(), Some("High School Agent"));
        assert!(response.is_insufficient());
        assert!(response
            .fallback_reason
            .as_deref()
            .unwrap()
            .contains("401 Unauthorized"));
        assert_eq!(client.calls(), 1);
    }

    #[tokio::test]
    async fn test_unknown_agent() {
        let manager = manager_with(Arc::new(MockLlmClient::new(vec![LLM_ANSWER])));
        let response = manager
            .dispatch("2+2", &explicit("Weather Agent"), &with_key())
            .await;
        assert_eq!(response.provider, ResponseProvider::None);
        assert_eq!(response.error, Some(ResponseError::Agent));
        assert_eq!(response.text, "Unknown agent: Weather Agent");
        assert!(response.urls.is_empty());
    }

    #[tokio::test]
    async fn test_short_agent_names_resolve() {
        let manager = manager_with(Arc::new(MockLlmClient::new(vec![LLM_ANSWER])));
        let response = manager
            .dispatch("2+3", &explicit("math"), &DispatchOptions::default())
            .await;
        assert_eq!(response.text, "Result: 5");
    }

    #[tokio::test]
    async fn test_agent_error_becomes_flagged_response() {
        let client = Arc::new(MockLlmClient::new(vec![LLM_ANSWER]));
        let manager = manager_with(client.clone());
        let query = "rank: Debate|lots|yes|no";

        let local = manager
            .dispatch(query, &explicit("College Admission Agent"), &DispatchOptions::default())
            .await;
        assert_eq!(local.provider, ResponseProvider::None);
        assert_eq!(local.error, Some(ResponseError::Agent));
        assert!(local.text.starts_with("College Admission Agent could not answer"));

        let rescued = manager
            .dispatch(query, &explicit("College Admission Agent"), &with_key())
            .await;
        assert_eq!(rescued.provider, ResponseProvider::Llm);
        assert_eq!(rescued.fallback_from.as_deref(), Some("College Admission Agent"));
        assert!(rescued.error.is_none());
    }

    #[tokio::test]
    async fn test_explicit_llm() {
        let client = Arc::new(MockLlmClient::new(vec![LLM_ANSWER]));
        let manager = manager_with(client.clone());

        let response = manager
            .dispatch("Why is the sky blue?", &explicit("LLM Agent"), &with_key())
            .await;
        assert_eq!(response.provider, ResponseProvider::Llm);
        assert!(response.fallback_from.is_none());
        assert_eq!(client.calls(), 1);
    }

    #[tokio::test]
    async fn test_explicit_llm_without_key_answers_locally() {
        let client = Arc::new(MockLlmClient::new(vec![LLM_ANSWER]));
        let manager = manager_with(client.clone());

        let response = manager
            .dispatch("what is photosynthesis", &explicit("llm"), &DispatchOptions::default())
            .await;
        assert_eq!(response.provider, ResponseProvider::Local);
        assert_eq!(response.agent.as_deref(), Some("High School Agent"));
        assert!(response.text.starts_with("Photosynthesis converts"));
        assert_eq!(
            response.fallback_reason.as_deref(),
            Some("LLM fallback unavailable: no API key provided")
        );
        assert_eq!(client.calls(), 0);
    }

    #[tokio::test]
    async fn test_explicit_llm_failure_attaches_web_supplement() {
        let client = Arc::new(MockLlmClient::failing("Server error: 503"));
        let search = Arc::new(StaticSearch::hits("static", &["https://example.org/derivatives"]));
        let manager =
            AgentManager::new(LlmAgent::new(client).with_search(search.clone())).unwrap();
        let options = DispatchOptions {
            use_web: true,
            ..with_key()
        };

        let response = manager
            .dispatch("derivative of x^2", &explicit("LLM Agent"), &options)
            .await;
        assert_eq!(response.provider, ResponseProvider::Local);
        assert_eq!(response.agent.as_deref(), Some("AP STEM Agent"));
        assert!(response.text.contains("f'(x) = 2x\n\nWeb Search Supplement (via static):"));
        assert!(response
            .text
            .ends_with("- About https://example.org/derivatives (https://example.org/derivatives)"));
        assert_eq!(response.urls, vec!["https://example.org/derivatives"]);
        assert!(response.fallback_reason.unwrap().contains("503"));
        // searched once for both the model and the local answer
        assert_eq!(search.calls.load(std::sync::atomic::Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_explicit_llm_failure_without_web_has_no_supplement() {
        let client = Arc::new(MockLlmClient::failing("Server error: 503"));
        let search = Arc::new(StaticSearch::hits("static", &["https://example.org/derivatives"]));
        let manager =
            AgentManager::new(LlmAgent::new(client).with_search(search.clone())).unwrap();

        let response = manager
            .dispatch("derivative of x^2", &explicit("LLM Agent"), &with_key())
            .await;
        assert!(response.text.ends_with("f'(x) = 2x"));
        assert!(response.urls.is_empty());
        assert_eq!(search.calls.load(std::sync::atomic::Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_hostile_math_input_is_answered() {
        let client = Arc::new(MockLlmClient::new(vec![LLM_ANSWER]));
        let manager = manager_with(client.clone());
        let queries = [
            "simplify (x^2)^9223372036854775808".to_string(),
            format!("1+{}1{}", "(".repeat(50_000), ")".repeat(50_000)),
            format!("{}1{}", "(".repeat(1_000), ")".repeat(1_000)),
            format!("solve {} = 1", vec!["x"; 500].join("*")),
        ];

        for query in &queries {
            let response = manager
                .dispatch(query, &explicit("Math Agent"), &DispatchOptions::default())
                .await;
            assert_eq!(response.provider, ResponseProvider::Local);
            assert!(!response.text.is_empty());
        }
        assert_eq!(client.calls(), 0);
    }
}
