//! Integration tests for the conversation client against a mocked Cerebras API
//!
//! A wiremock server stands in for the chat-completions endpoint.

mod common;

use common::cerebras_config;
use palaver::error::{error_kind, ErrorKind};
use palaver::ConversationClient;
use serde_json::json;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn completion(content: &str, prompt_tokens: u64, completion_tokens: u64) -> serde_json::Value {
    json!({
        "id": "chatcmpl-1",
        "object": "chat.completion",
        "model": "llama3.1-8b",
        "choices": [{
            "index": 0,
            "message": {"role": "assistant", "content": content},
            "finish_reason": "stop"
        }],
        "usage": {
            "prompt_tokens": prompt_tokens,
            "completion_tokens": completion_tokens,
            "total_tokens": prompt_tokens + completion_tokens
        }
    })
}

#[tokio::test]
async fn test_send_charges_upstream_usage() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .and(header("authorization", "Bearer test-key"))
        .and(body_partial_json(json!({
            "model": "llama3.1-8b",
            "messages": [{"role": "user", "content": "Hello"}]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(completion("Hi there!", 12, 30)))
        .expect(1)
        .mount(&server)
        .await;

    let mut client = ConversationClient::from_config(&cerebras_config(&server.uri())).unwrap();
    let id = client.start_new_session("alice", Some("llama3.1-8b")).unwrap();

    let reply = client.send_message(&id, "Hello").await.unwrap();
    assert_eq!(reply.response, "Hi there!");

    let metrics = client.get_usage_metrics(&id).unwrap();
    assert_eq!(metrics.token_count, 42);
    assert_eq!(metrics.api_calls, 1);
    assert!((metrics.cost_estimate - 0.00042).abs() < 1e-12);
}

#[tokio::test]
async fn test_history_is_replayed_upstream() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .and(body_partial_json(json!({
            "messages": [
                {"role": "user", "content": "first"},
                {"role": "assistant", "content": "reply"},
                {"role": "user", "content": "second"}
            ]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(completion("again", 5, 5)))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(completion("reply", 5, 5)))
        .mount(&server)
        .await;

    let mut client = ConversationClient::from_config(&cerebras_config(&server.uri())).unwrap();
    let id = client.start_new_session("alice", None).unwrap();

    client.send_message(&id, "first").await.unwrap();
    let reply = client.send_message(&id, "second").await.unwrap();
    assert_eq!(reply.response, "again");
}

#[tokio::test]
async fn test_failed_send_leaves_session_unchanged() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(completion("ok", 3, 3)))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .mount(&server)
        .await;

    let mut client = ConversationClient::from_config(&cerebras_config(&server.uri())).unwrap();
    let id = client.start_new_session("alice", None).unwrap();
    client.send_message(&id, "works").await.unwrap();

    let before_history = client.get_chat_history(&id, None).unwrap();
    let before_metrics = client.get_usage_metrics(&id).unwrap();

    let err = client.send_message(&id, "fails").await.unwrap_err();
    assert_eq!(error_kind(&err), Some(ErrorKind::Upstream));
    assert!(err.to_string().contains("Cerebras server error"));

    assert_eq!(client.get_chat_history(&id, None).unwrap(), before_history);
    assert_eq!(client.get_usage_metrics(&id).unwrap(), before_metrics);
}

#[tokio::test]
async fn test_rejected_key_is_upstream_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(401).set_body_string("invalid api key"))
        .mount(&server)
        .await;

    let mut client = ConversationClient::from_config(&cerebras_config(&server.uri())).unwrap();
    let id = client.start_new_session("alice", None).unwrap();

    let err = client.send_message(&id, "Hello").await.unwrap_err();
    assert!(err.to_string().contains("Authentication failed"));
    assert!(client.get_chat_history(&id, None).unwrap().is_empty());
}

#[tokio::test]
async fn test_summary_uses_summary_budget() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .and(body_partial_json(json!({"max_tokens": 256})))
        .respond_with(ResponseTemplate::new(200).set_body_json(completion("A short chat.", 40, 4)))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .and(body_partial_json(json!({"max_tokens": 1024})))
        .respond_with(ResponseTemplate::new(200).set_body_json(completion("sure", 2, 2)))
        .mount(&server)
        .await;

    let mut client = ConversationClient::from_config(&cerebras_config(&server.uri())).unwrap();
    let id = client.start_new_session("alice", None).unwrap();
    client.send_message(&id, "hi").await.unwrap();

    let summary = client.summarize_conversation(&id).await.unwrap();
    assert_eq!(summary, "A short chat.");

    let metrics = client.get_usage_metrics(&id).unwrap();
    assert_eq!(metrics.api_calls, 2);
    assert_eq!(metrics.token_count, 48);
    assert_eq!(client.get_chat_history(&id, None).unwrap().len(), 2);
}

#[test]
fn test_start_session_requires_key() {
    let mut config = cerebras_config("http://127.0.0.1:9");
    config.provider.cerebras.api_key = None;
    config.provider.cerebras.api_key_env = "PALAVER_TEST_UNSET_KEY".to_string();

    let mut client = ConversationClient::from_config(&config).unwrap();
    let err = client.start_new_session("alice", None).unwrap_err();
    assert_eq!(error_kind(&err), Some(ErrorKind::Configuration));
    assert!(client.list_sessions().is_empty());

    assert!(!client.list_available_models().is_empty());
}
