use anyhow::{anyhow, Result};
use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::sync::Mutex;
use std::time::Duration;

use crate::providers::base::LlmClient;

/// A mock client that replays pre-configured completions and counts how often it was asked
pub struct MockLlmClient {
    responses: Arc<Mutex<Vec<Result<String, String>>>>,
    prompts: Arc<Mutex<Vec<String>>>,
    calls: AtomicUsize,
}

impl MockLlmClient {
    pub fn new(responses: Vec<&str>) -> Self {
        Self::with_results(responses.into_iter().map(|r| Ok(r.to_string())).collect())
    }

    /// Every call fails with `message`
    pub fn failing(message: &str) -> Self {
        Self::with_results(vec![Err(message.to_string())])
    }

    pub fn with_results(responses: Vec<Result<String, String>>) -> Self {
        Self {
            responses: Arc::new(Mutex::new(responses)),
            prompts: Arc::new(Mutex::new(Vec::new())),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl LlmClient for MockLlmClient {
    async fn complete(&self, prompt: &str, _api_key: &str, _timeout: Duration) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.prompts.lock().unwrap().push(prompt.to_string());

        let mut responses = self.responses.lock().unwrap();
        // the last configured result repeats once the queue runs dry
        let next = if responses.len() > 1 {
            responses.remove(0)
        } else {
            responses.first().cloned().unwrap_or_else(|| Ok(String::new()))
        };
        next.map_err(|e| anyhow!(e))
    }
}
