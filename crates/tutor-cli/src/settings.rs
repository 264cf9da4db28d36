use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use tutor::agents::llm::DEFAULT_LLM_TIMEOUT;
use tutor::agents::LlmAgent;
use tutor::manager::{AgentManager, DispatchOptions};
use tutor::providers::configs::OpenAiProviderConfig;
use tutor::providers::openai::OpenAiClient;
use tutor::search::{SearchBackend, SearchChain, SearchConfig};

use crate::inputs::ask_for_api_key;
use crate::SettingsArgs;

/// Everything a command needs to build an [`AgentManager`] and dispatch with it
pub struct CliSettings {
    pub options: DispatchOptions,
    pub provider: OpenAiProviderConfig,
    pub search: SearchConfig,
    pub llm_timeout: Duration,
}

impl CliSettings {
    /// Flags first, then the environment. Interactive sessions may also ask for the key.
    pub fn resolve(args: &SettingsArgs, interactive: bool) -> Result<Self> {
        let api_key = args
            .api_key
            .clone()
            .or_else(|| std::env::var("OPENAI_API_KEY").ok())
            .filter(|key| !key.trim().is_empty());
        let api_key = match api_key {
            Some(key) => Some(key),
            None if interactive && !args.no_fallback => ask_for_api_key()?,
            None => None,
        };

        let mut settings = Self::from_args(args, api_key)?;
        settings.search.serpapi_key = std::env::var("SERPAPI_API_KEY").ok();
        Ok(settings)
    }

    fn from_args(args: &SettingsArgs, api_key: Option<String>) -> Result<Self> {
        let mut provider = OpenAiProviderConfig::default();
        if let Some(model) = &args.model {
            provider.model = model.clone();
        }
        if let Some(host) = &args.host {
            provider.host = host.clone();
        }

        let mut search = SearchConfig::default();
        if !args.search.is_empty() {
            search.backends = parse_backends(&args.search)?;
        }

        Ok(Self {
            options: DispatchOptions {
                api_key,
                fallback_enabled: !args.no_fallback,
                use_web: args.web,
                disabled_fallbacks: args.disabled_fallbacks.iter().cloned().collect(),
            },
            provider,
            search,
            llm_timeout: args
                .llm_timeout
                .map(Duration::from_secs)
                .unwrap_or(DEFAULT_LLM_TIMEOUT),
        })
    }

    pub fn build_manager(&self) -> Result<AgentManager> {
        let client = OpenAiClient::new(self.provider.clone())
            .context("Failed to create the LLM client")?;
        let mut llm = LlmAgent::new(Arc::new(client)).with_timeout(self.llm_timeout);
        if self.options.use_web {
            let chain = SearchChain::from_config(&self.search)?;
            if !chain.is_empty() {
                llm = llm.with_search(Arc::new(chain));
            }
        }
        Ok(AgentManager::new(llm)?)
    }
}

fn parse_backends(names: &[String]) -> Result<Vec<SearchBackend>> {
    names
        .iter()
        .map(|name| name.trim())
        .filter(|name| !name.is_empty())
        .map(|name| {
            SearchBackend::from_str(name).map_err(|_| {
                anyhow!(
                    "Unknown search backend '{}'. Expected duckduckgo or serpapi.",
                    name
                )
            })
        })
        .collect()
}
