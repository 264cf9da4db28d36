use serde::{Deserialize, Serialize};

pub const DEFAULT_OPENAI_HOST: &str = "https://api.openai.com";
pub const DEFAULT_OPENAI_MODEL: &str = "gpt-3.5-turbo";
pub const DEFAULT_MAX_TOKENS: i32 = 400;

/// Everything about an OpenAI-compatible endpoint except the key, which callers pass per request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OpenAiProviderConfig {
    pub host: String,
    pub model: String,
    pub temperature: Option<f32>,
    pub max_tokens: Option<i32>,
}

impl Default for OpenAiProviderConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_OPENAI_HOST.to_string(),
            model: DEFAULT_OPENAI_MODEL.to_string(),
            temperature: None,
            max_tokens: Some(DEFAULT_MAX_TOKENS),
        }
    }
}
