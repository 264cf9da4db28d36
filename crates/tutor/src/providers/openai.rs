use anyhow::{anyhow, Result};
use async_trait::async_trait;
use reqwest::Client;
use reqwest::StatusCode;
use serde_json::{json, Value};
use std::time::Duration;

use super::base::{LlmClient, Usage};
use super::configs::OpenAiProviderConfig;

pub struct OpenAiClient {
    client: Client,
    config: OpenAiProviderConfig,
}

impl OpenAiClient {
    pub fn new(config: OpenAiProviderConfig) -> Result<Self> {
        // per-request timeouts are set in `complete`
        let client = Client::builder().timeout(Duration::from_secs(600)).build()?;

        Ok(Self { client, config })
    }

    pub fn config(&self) -> &OpenAiProviderConfig {
        &self.config
    }

    fn get_usage(data: &Value) -> Usage {
        let Some(usage) = data.get("usage") else {
            return Usage::default();
        };

        let input_tokens = usage
            .get("prompt_tokens")
            .and_then(|v| v.as_i64())
            .map(|v| v as i32);

        let output_tokens = usage
            .get("completion_tokens")
            .and_then(|v| v.as_i64())
            .map(|v| v as i32);

        let total_tokens = usage
            .get("total_tokens")
            .and_then(|v| v.as_i64())
            .map(|v| v as i32)
            .or_else(|| match (input_tokens, output_tokens) {
                (Some(input), Some(output)) => Some(input + output),
                _ => None,
            });

        Usage::new(input_tokens, output_tokens, total_tokens)
    }

    async fn post(&self, payload: &Value, api_key: &str, timeout: Duration) -> Result<Value> {
        let url = format!(
            "{}/v1/chat/completions",
            self.config.host.trim_end_matches('/')
        );

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", api_key))
            .timeout(timeout)
            .json(payload)
            .send()
            .await?;

        match response.status() {
            StatusCode::OK => Ok(response.json().await?),
            status if status == StatusCode::TOO_MANY_REQUESTS || status.as_u16() >= 500 => {
                Err(anyhow!("Server error: {}", status))
            }
            status => Err(anyhow!("Request failed: {}", status)),
        }
    }
}

#[async_trait]
impl LlmClient for OpenAiClient {
    async fn complete(&self, prompt: &str, api_key: &str, timeout: Duration) -> Result<String> {
        let mut payload = json!({
            "model": self.config.model,
            "messages": [{"role": "user", "content": prompt}],
        });
        if let Some(object) = payload.as_object_mut() {
            if let Some(temp) = self.config.temperature {
                object.insert("temperature".to_string(), json!(temp));
            }
            if let Some(tokens) = self.config.max_tokens {
                object.insert("max_tokens".to_string(), json!(tokens));
            }
        }

        let response = self.post(&payload, api_key, timeout).await?;

        if let Some(error) = response.get("error") {
            return Err(anyhow!("OpenAI API error: {}", error));
        }

        let content = response
            .pointer("/choices/0/message/content")
            .and_then(Value::as_str)
            .ok_or_else(|| anyhow!("No message content in response"))?;

        let usage = Self::get_usage(&response);
        tracing::debug!(
            model = %self.config.model,
            input_tokens = ?usage.input_tokens,
            output_tokens = ?usage.output_tokens,
            "llm completion"
        );

        Ok(content.trim().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const TIMEOUT: Duration = Duration::from_secs(5);

    fn client_for(server: &MockServer) -> OpenAiClient {
        let config = OpenAiProviderConfig {
            host: server.uri(),
            ..Default::default()
        };
        OpenAiClient::new(config).unwrap()
    }

    async fn _setup_mock_server(status: u16, response_body: Value) -> (MockServer, OpenAiClient) {
        let mock_server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .respond_with(ResponseTemplate::new(status).set_body_json(response_body))
            .mount(&mock_server)
            .await;

        let client = client_for(&mock_server);
        (mock_server, client)
    }

    #[tokio::test]
    async fn test_complete_basic() -> Result<()> {
        let response_body = json!({
            "id": "chatcmpl-123",
            "object": "chat.completion",
            "choices": [{
                "index": 0,
                "message": {
                    "role": "assistant",
                    "content": "  Photosynthesis turns light into chemical energy.\n"
                },
                "finish_reason": "stop"
            }],
            "usage": {
                "prompt_tokens": 12,
                "completion_tokens": 15,
                "total_tokens": 27
            }
        });

        let (_, client) = _setup_mock_server(200, response_body).await;
        let text = client
            .complete("What is photosynthesis?", "test_api_key", TIMEOUT)
            .await?;

        assert_eq!(text, "Photosynthesis turns light into chemical energy.");
        Ok(())
    }

    #[tokio::test]
    async fn test_request_carries_key_and_defaults() -> Result<()> {
        let mock_server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .and(header("Authorization", "Bearer sk-session"))
            .and(body_partial_json(json!({
                "model": "gpt-3.5-turbo",
                "max_tokens": 400,
                "messages": [{"role": "user", "content": "hi"}],
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "choices": [{"message": {"role": "assistant", "content": "hello"}}]
            })))
            .expect(1)
            .mount(&mock_server)
            .await;

        let text = client_for(&mock_server)
            .complete("hi", "sk-session", TIMEOUT)
            .await?;
        assert_eq!(text, "hello");
        Ok(())
    }

    #[tokio::test]
    async fn test_unauthorized_is_an_error() {
        let (_, client) =
            _setup_mock_server(401, json!({"error": {"message": "Incorrect API key"}})).await;
        let err = client.complete("hi", "bad", TIMEOUT).await.unwrap_err();
        assert!(err.to_string().starts_with("Request failed: 401"));
    }

    #[tokio::test]
    async fn test_rate_limit_is_a_server_error() {
        let (_, client) = _setup_mock_server(429, json!({})).await;
        let err = client.complete("hi", "key", TIMEOUT).await.unwrap_err();
        assert!(err.to_string().starts_with("Server error: 429"));
    }

    #[tokio::test]
    async fn test_error_field_in_body() {
        let (_, client) =
            _setup_mock_server(200, json!({"error": {"message": "model overloaded"}})).await;
        let err = client.complete("hi", "key", TIMEOUT).await.unwrap_err();
        assert!(err.to_string().contains("model overloaded"));
    }

    #[tokio::test]
    async fn test_slow_server_times_out() {
        let mock_server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_delay(Duration::from_secs(2))
                    .set_body_json(json!({"choices": [{"message": {"content": "late"}}]})),
            )
            .mount(&mock_server)
            .await;

        let result = client_for(&mock_server)
            .complete("hi", "key", Duration::from_millis(100))
            .await;
        assert!(result.is_err());
    }
}
