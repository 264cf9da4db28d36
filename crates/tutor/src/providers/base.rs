use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Usage {
    pub input_tokens: Option<i32>,
    pub output_tokens: Option<i32>,
    pub total_tokens: Option<i32>,
}

impl Usage {
    pub fn new(
        input_tokens: Option<i32>,
        output_tokens: Option<i32>,
        total_tokens: Option<i32>,
    ) -> Self {
        Self {
            input_tokens,
            output_tokens,
            total_tokens,
        }
    }
}

/// A chat-completion backend. The key is supplied per call so it can stay in the
/// caller's session memory instead of the client's configuration.
#[async_trait]
pub trait LlmClient: Send + Sync {
    /// Answer a single-turn prompt. Any transport, status, or timeout problem is an error;
    /// an empty completion is returned as-is for the caller to judge.
    async fn complete(&self, prompt: &str, api_key: &str, timeout: Duration) -> Result<String>;
}
