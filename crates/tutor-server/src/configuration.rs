use crate::error::{to_env_var, ConfigError};
use config::{Config, Environment};
use serde::Deserialize;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tutor::agents::LlmAgent;
use tutor::manager::{AgentManager, DispatchOptions};
use tutor::providers::configs::{
    OpenAiProviderConfig, DEFAULT_MAX_TOKENS, DEFAULT_OPENAI_HOST, DEFAULT_OPENAI_MODEL,
};
use tutor::providers::openai::OpenAiClient;
use tutor::search::{SearchChain, SearchConfig};

#[derive(Debug, Default, Deserialize)]
pub struct ServerSettings {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl ServerSettings {
    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        Ok(format!("{}:{}", self.host, self.port).parse()?)
    }
}

#[derive(Debug, Deserialize)]
pub struct LlmSettings {
    #[serde(default = "default_openai_host")]
    pub host: String,
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default)]
    pub temperature: Option<f32>,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: Option<i32>,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Used when a request brings no key of its own
    #[serde(default)]
    pub api_key: Option<String>,
}

impl Default for LlmSettings {
    fn default() -> Self {
        Self {
            host: default_openai_host(),
            model: default_model(),
            temperature: None,
            max_tokens: default_max_tokens(),
            timeout_secs: default_timeout_secs(),
            api_key: None,
        }
    }
}

impl LlmSettings {
    pub fn provider_config(&self) -> OpenAiProviderConfig {
        OpenAiProviderConfig {
            host: self.host.clone(),
            model: self.model.clone(),
            temperature: self.temperature,
            max_tokens: self.max_tokens,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct DispatchSettings {
    #[serde(default = "default_true")]
    pub fallback_enabled: bool,
    #[serde(default)]
    pub use_web: bool,
    #[serde(default)]
    pub disabled_fallbacks: Vec<String>,
}

impl Default for DispatchSettings {
    fn default() -> Self {
        Self {
            fallback_enabled: true,
            use_web: false,
            disabled_fallbacks: Vec::new(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub server: ServerSettings,
    #[serde(default)]
    pub llm: LlmSettings,
    #[serde(default)]
    pub dispatch: DispatchSettings,
    #[serde(default)]
    pub search: SearchConfig,
}

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        Self::load_and_validate()
    }

    fn load_and_validate() -> Result<Self, ConfigError> {
        let config = Config::builder()
            .set_default("server.host", default_host())?
            .set_default("server.port", default_port())?
            .set_default("llm.host", default_openai_host())?
            .set_default("llm.model", default_model())?
            .add_source(
                Environment::with_prefix("TUTOR")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true)
                    .list_separator(",")
                    .with_list_parse_key("dispatch.disabled_fallbacks")
                    .with_list_parse_key("search.backends"),
            )
            .build()?;

        let result: Result<Self, config::ConfigError> = config.try_deserialize();

        match result {
            Ok(settings) => Ok(settings),
            Err(err) => {
                tracing::debug!("Configuration error: {:?}", &err);

                let error_str = err.to_string();
                if error_str.starts_with("missing field") {
                    let field = error_str
                        .trim_start_matches("missing field `")
                        .trim_end_matches('`');
                    Err(ConfigError::MissingEnvVar {
                        env_var: to_env_var(field),
                    })
                } else if let config::ConfigError::NotFound(field) = &err {
                    Err(ConfigError::MissingEnvVar {
                        env_var: to_env_var(field),
                    })
                } else {
                    Err(ConfigError::Other(err))
                }
            }
        }
    }

    /// Starting point for every request; request fields override these
    pub fn dispatch_defaults(&self) -> DispatchOptions {
        DispatchOptions {
            api_key: self.llm.api_key.clone(),
            fallback_enabled: self.dispatch.fallback_enabled,
            use_web: self.dispatch.use_web,
            disabled_fallbacks: self.dispatch.disabled_fallbacks.iter().cloned().collect(),
        }
    }

    pub fn build_manager(&self) -> anyhow::Result<AgentManager> {
        let client = OpenAiClient::new(self.llm.provider_config())?;
        let mut llm = LlmAgent::new(Arc::new(client))
            .with_timeout(Duration::from_secs(self.llm.timeout_secs));
        let chain = SearchChain::from_config(&self.search)?;
        if !chain.is_empty() {
            llm = llm.with_search(Arc::new(chain));
        }
        Ok(AgentManager::new(llm)?)
    }
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    3000
}

fn default_model() -> String {
    DEFAULT_OPENAI_MODEL.to_string()
}

fn default_openai_host() -> String {
    DEFAULT_OPENAI_HOST.to_string()
}

fn default_max_tokens() -> Option<i32> {
    Some(DEFAULT_MAX_TOKENS)
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_true() -> bool {
    true
}
