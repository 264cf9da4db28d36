use std::sync::Arc;
use std::time::Duration;

use serde_json::json;
use tutor::agents::LlmAgent;
use tutor::manager::{AgentManager, DispatchMode, DispatchOptions};
use tutor::models::response::ResponseProvider;
use tutor::providers::configs::OpenAiProviderConfig;
use tutor::providers::openai::OpenAiClient;
use tutor::search::{DuckDuckGo, SearchChain};
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Manager wired to a mock OpenAI-compatible server
fn manager_for(server: &MockServer, timeout: Duration) -> AgentManager {
    let client = OpenAiClient::new(OpenAiProviderConfig {
        host: server.uri(),
        ..Default::default()
    })
    .unwrap();
    AgentManager::new(LlmAgent::new(Arc::new(client)).with_timeout(timeout)).unwrap()
}

fn completion(text: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({
        "choices": [{"index": 0, "message": {"role": "assistant", "content": text}}],
        "usage": {"prompt_tokens": 20, "completion_tokens": 10, "total_tokens": 30}
    }))
}

fn session(key: &str) -> DispatchOptions {
    DispatchOptions {
        api_key: Some(key.to_string()),
        fallback_enabled: true,
        ..Default::default()
    }
}

#[tokio::test]
async fn test_local_answers_never_reach_the_server() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(completion("unused"))
        .expect(0)
        .mount(&server)
        .await;
    let manager = manager_for(&server, Duration::from_secs(5));

    let response = manager
        .dispatch("Solve 3x + 5 = 20", &DispatchMode::Auto, &session("sk-test"))
        .await;
    assert_eq!(response.provider, ResponseProvider::Local);
    assert_eq!(response.text, "Solution: x = 5");
}

#[tokio::test]
async fn test_vague_question_is_answered_by_the_model() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .and(header("Authorization", "Bearer sk-test"))
        .respond_with(completion("The Renaissance began in Italy."))
        .expect(1)
        .mount(&server)
        .await;
    let manager = manager_for(&server, Duration::from_secs(5));

    let response = manager
        .dispatch("where did the renaissance start", &DispatchMode::Auto, &session("sk-test"))
        .await;
    assert_eq!(response.provider, ResponseProvider::Llm);
    assert_eq!(response.text, "The Renaissance began in Italy.");
    assert_eq!(response.fallback_from.as_deref(), Some("High School Agent"));
}

#[tokio::test]
async fn test_rejected_key_keeps_the_local_answer() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "error": {"message": "Incorrect API key provided"}
        })))
        .mount(&server)
        .await;
    let manager = manager_for(&server, Duration::from_secs(5));

    let response = manager
        .dispatch("where did the renaissance start", &DispatchMode::Auto, &session("sk-bad"))
        .await;
    assert_eq!(response.provider, ResponseProvider::Local);
    assert!(response.is_insufficient());
    assert!(response.fallback_reason.unwrap().contains("401"));
}

#[tokio::test]
async fn test_slow_model_times_out_to_local() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(completion("too late").set_delay(Duration::from_secs(3)))
        .mount(&server)
        .await;
    let manager = manager_for(&server, Duration::from_millis(200));

    let response = manager
        .dispatch("where did the renaissance start", &DispatchMode::Auto, &session("sk-test"))
        .await;
    assert_eq!(response.provider, ResponseProvider::Local);
    assert!(response.fallback_reason.is_some());
}

#[tokio::test]
async fn test_explicit_llm_with_web_context() {
    let llm_server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(completion("Black holes form when massive stars collapse."))
        .expect(1)
        .mount(&llm_server)
        .await;

    let search_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            json!({
                "Heading": "Black hole",
                "Abstract": "A black hole is a region of spacetime where gravity prevents escape.",
                "AbstractURL": "https://en.wikipedia.org/wiki/Black_hole",
                "RelatedTopics": []
            })
            .to_string(),
        ))
        .mount(&search_server)
        .await;

    let client = OpenAiClient::new(OpenAiProviderConfig {
        host: llm_server.uri(),
        ..Default::default()
    })
    .unwrap();
    let search = SearchChain::new(
        vec![Arc::new(
            DuckDuckGo::new(&search_server.uri(), Duration::from_secs(5)).unwrap(),
        )],
        Duration::from_secs(5),
    );
    let manager =
        AgentManager::new(LlmAgent::new(Arc::new(client)).with_search(Arc::new(search))).unwrap();
    let options = DispatchOptions {
        use_web: true,
        ..session("sk-test")
    };

    let response = manager
        .dispatch(
            "what is a black hole",
            &DispatchMode::from_choice(Some("LLM Agent")),
            &options,
        )
        .await;
    assert_eq!(response.provider, ResponseProvider::Llm);
    assert_eq!(response.urls, vec!["https://en.wikipedia.org/wiki/Black_hole"]);

    let requests = llm_server.received_requests().await.unwrap();
    let body: serde_json::Value = serde_json::from_slice(&requests[0].body).unwrap();
    let prompt = body["messages"][0]["content"].as_str().unwrap();
    assert!(prompt.contains("Web context:"));
    assert!(prompt.contains("gravity prevents escape"));
}
