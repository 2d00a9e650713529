//! Integration tests for the AI coach client and chat
//!
//! These tests run the Gemini advisor against a local wiremock server and verify:
//! - The request carries the system instruction, the single user turn and the key
//! - Replies, empty replies and HTTP failures surface in the chat as expected
//! - A missing credential never reaches the network

use amaxfit::Metrics;
use amaxfit::models::CoachSettings;
use amaxfit::services::coach::{EMPTY_REPLY_FALLBACK, ERROR_APOLOGY, GREETING};
use amaxfit::services::{AdviceProvider, ChatRole, CoachChat, CoachError, GeminiAdvisor};
use serde_json::json;
use std::sync::Arc;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const GENERATE_PATH: &str = "/models/gemini-2.5-flash:generateContent";

fn settings_for(server: &MockServer) -> CoachSettings {
    CoachSettings {
        base_url: format!("{}/models", server.uri()),
        timeout_secs: 5,
        ..CoachSettings::default()
    }
}

fn reply_body(text: &str) -> serde_json::Value {
    json!({
        "candidates": [{
            "content": { "role": "model", "parts": [{ "text": text }] },
            "finishReason": "STOP"
        }]
    })
}

#[tokio::test]
async fn test_advice_request_shape() {
    let server = MockServer::start().await;
    let settings = settings_for(&server);

    Mock::given(method("POST"))
        .and(path(GENERATE_PATH))
        .and(header("x-goog-api-key", "test-key"))
        .and(body_partial_json(json!({
            "systemInstruction": { "parts": [{ "text": settings.system_instruction.clone() }] },
            "contents": [{ "role": "user", "parts": [{ "text": "Suggest a workout" }] }]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(reply_body("Try 3 rounds of squats!")))
        .expect(1)
        .mount(&server)
        .await;

    let advisor = GeminiAdvisor::new(&settings).unwrap().with_api_key("test-key");
    let reply = advisor.advise("Suggest a workout").await.unwrap();
    assert_eq!(reply, "Try 3 rounds of squats!");
}

#[tokio::test]
async fn test_chat_turn_with_remote_reply() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(GENERATE_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(reply_body("Hydrate well.")))
        .mount(&server)
        .await;

    let advisor = GeminiAdvisor::new(&settings_for(&server))
        .unwrap()
        .with_api_key("test-key");
    let mut chat = CoachChat::new(Arc::new(advisor), Arc::new(Metrics::new()));

    let reply = chat.send("Nutrition for fat loss").await.unwrap();
    assert_eq!(reply.role, ChatRole::Model);
    assert_eq!(reply.text, "Hydrate well.");

    let texts: Vec<_> = chat.messages().iter().map(|m| m.text.as_str()).collect();
    assert_eq!(texts, vec![GREETING, "Nutrition for fat loss", "Hydrate well."]);
}

#[tokio::test]
async fn test_empty_candidates_use_fallback() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(GENERATE_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "candidates": [] })))
        .mount(&server)
        .await;

    let advisor = GeminiAdvisor::new(&settings_for(&server))
        .unwrap()
        .with_api_key("test-key");
    let mut chat = CoachChat::new(Arc::new(advisor), Arc::new(Metrics::new()));

    let reply = chat.send("How to squat?").await.unwrap();
    assert_eq!(reply.text, EMPTY_REPLY_FALLBACK);
}

#[tokio::test]
async fn test_server_error_becomes_apology() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(GENERATE_PATH))
        .respond_with(ResponseTemplate::new(500).set_body_string("backend unavailable"))
        .mount(&server)
        .await;

    let advisor = GeminiAdvisor::new(&settings_for(&server))
        .unwrap()
        .with_api_key("test-key");

    let err = advisor.advise("hello").await.unwrap_err();
    assert!(
        matches!(&err, CoachError::Status { status: 500, body } if body == "backend unavailable"),
        "Expected status error, got: {:?}",
        err
    );

    let metrics = Arc::new(Metrics::new());
    let mut chat = CoachChat::new(Arc::new(advisor), Arc::clone(&metrics));
    let reply = chat.send("hello").await.unwrap();
    assert_eq!(reply.text, ERROR_APOLOGY);
    assert!(!chat.is_typing());
    assert_eq!(metrics.coach_failure_rate(), 1.0);
}

#[tokio::test]
async fn test_missing_credential_skips_network() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(reply_body("unused")))
        .expect(0)
        .mount(&server)
        .await;

    let settings = CoachSettings {
        api_key_env: "AMAXFIT_INTEGRATION_UNSET_KEY".to_string(),
        ..settings_for(&server)
    };
    let advisor = GeminiAdvisor::new(&settings).unwrap();

    let err = advisor.advise("hello").await.unwrap_err();
    assert!(matches!(err, CoachError::MissingCredential(_)));

    let mut chat = CoachChat::new(Arc::new(advisor), Arc::new(Metrics::new()));
    let reply = chat.send("hello").await.unwrap();
    assert_eq!(reply.text, ERROR_APOLOGY);
}
