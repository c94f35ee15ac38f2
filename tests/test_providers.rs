//! HTTP-level provider tests against a mock server
//!
//! Verifies the wire behavior of both backends: request shape, auth
//! headers, success parsing, and error mapping.

use serde_json::json;
use shopagent::llm::provider::{
    CompletionRequest, FinishReason, LlmError, LlmProvider, Message, MessageRole,
};
use shopagent::llm::providers::{GeminiConfig, GeminiProvider, OpenAiConfig, OpenAiProvider};
use std::collections::HashMap;
use std::time::Duration;
use wiremock::matchers::{body_partial_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn completion_request(model: &str) -> CompletionRequest {
    CompletionRequest {
        messages: vec![
            Message {
                role: MessageRole::System,
                content: "Be concise.".to_string(),
            },
            Message {
                role: MessageRole::User,
                content: "Classify into one of: product_assist, order_help, other".to_string(),
            },
        ],
        model: model.to_string(),
        max_tokens: Some(200),
        temperature: Some(0.1),
        top_p: None,
        stop_sequences: None,
        response_format: None,
        metadata: HashMap::new(),
    }
}

// ========== OpenAI ==========

async fn openai_provider(server: &MockServer) -> OpenAiProvider {
    OpenAiProvider::new(OpenAiConfig {
        api_key: "test-key".to_string(),
        base_url: server.uri(),
        timeout: Duration::from_secs(5),
    })
    .unwrap()
}

#[tokio::test]
async fn test_openai_complete_success() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .and(header("Authorization", "Bearer test-key"))
        .and(body_partial_json(json!({
            "model": "gpt-4o-mini",
            "temperature": 0.1
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "model": "gpt-4o-mini",
            "choices": [{
                "message": {"role": "assistant", "content": "order_help"},
                "finish_reason": "stop"
            }],
            "usage": {"prompt_tokens": 25, "completion_tokens": 3, "total_tokens": 28}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let provider = openai_provider(&server).await;
    let response = provider
        .complete(completion_request("gpt-4o-mini"))
        .await
        .unwrap();

    assert_eq!(response.content.as_deref(), Some("order_help"));
    assert_eq!(response.usage.total_tokens, 28);
    assert!(matches!(response.finish_reason, FinishReason::Stop));
}

#[tokio::test]
async fn test_openai_api_error_is_mapped() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(401).set_body_string("invalid api key"))
        .mount(&server)
        .await;

    let provider = openai_provider(&server).await;
    let result = provider.complete(completion_request("gpt-4o-mini")).await;

    match result {
        Err(LlmError::ApiError(message)) => {
            assert!(message.contains("401"));
            assert!(message.contains("invalid api key"));
        }
        other => panic!("Expected ApiError, got {other:?}"),
    }
}

#[tokio::test]
async fn test_openai_health_check() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/models"))
        .and(header("Authorization", "Bearer test-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"data": []})))
        .mount(&server)
        .await;

    let provider = openai_provider(&server).await;
    assert!(provider.health_check().await.is_ok());
}

// ========== Gemini ==========

async fn gemini_provider(server: &MockServer) -> GeminiProvider {
    GeminiProvider::new(GeminiConfig {
        api_key: "test-key".to_string(),
        base_url: server.uri(),
        timeout: Duration::from_secs(5),
    })
    .unwrap()
}

#[tokio::test]
async fn test_gemini_complete_success() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/models/gemini-1.5-flash:generateContent"))
        .and(query_param("key", "test-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "candidates": [{
                "content": {"role": "model", "parts": [{"text": "product_assist"}]},
                "finishReason": "STOP"
            }],
            "usageMetadata": {
                "promptTokenCount": 30,
                "candidatesTokenCount": 4,
                "totalTokenCount": 34
            }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let provider = gemini_provider(&server).await;
    let response = provider
        .complete(completion_request("gemini-1.5-flash"))
        .await
        .unwrap();

    assert_eq!(response.content.as_deref(), Some("product_assist"));
    assert_eq!(response.usage.total_tokens, 34);
}

#[tokio::test]
async fn test_gemini_prefixes_system_text_into_prompt() {
    let server = MockServer::start().await;

    // The single user content block must carry the system text up front
    Mock::given(method("POST"))
        .and(path("/models/gemini-1.5-flash:generateContent"))
        .and(body_partial_json(json!({
            "contents": [{"role": "user"}]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "candidates": [{
                "content": {"role": "model", "parts": [{"text": "other"}]},
                "finishReason": "STOP"
            }]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let provider = gemini_provider(&server).await;
    let response = provider
        .complete(completion_request("gemini-1.5-flash"))
        .await
        .unwrap();

    assert_eq!(response.content.as_deref(), Some("other"));
}

#[tokio::test]
async fn test_gemini_api_error_is_mapped() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(429).set_body_string("quota exceeded"))
        .mount(&server)
        .await;

    let provider = gemini_provider(&server).await;
    let result = provider.complete(completion_request("gemini-1.5-flash")).await;

    match result {
        Err(LlmError::ApiError(message)) => {
            assert!(message.contains("429"));
            assert!(message.contains("quota exceeded"));
        }
        other => panic!("Expected ApiError, got {other:?}"),
    }
}
