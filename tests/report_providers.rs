//! Provider tests against a scripted in-memory transport.
//!
//! Checks request shape (URL, auth header, body) and model fallback for the
//! hosted providers without touching the network.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use anyhow::{anyhow, Result};
use serde_json::{json, Value};

use crowd_monitor::report::{
    GeminiClient, HttpReply, OpenAiClient, TextGenerator, Transport,
};
use crowd_monitor::{FailureKind, ProviderError};

#[derive(Debug, Clone)]
struct SentRequest {
    url: String,
    headers: Vec<(String, String)>,
    body: Value,
}

enum Scripted {
    Reply(u16, String),
    Unreachable,
}

#[derive(Default)]
struct ScriptedTransport {
    replies: Mutex<VecDeque<Scripted>>,
    sent: Mutex<Vec<SentRequest>>,
}

impl ScriptedTransport {
    fn new(replies: Vec<Scripted>) -> Arc<Self> {
        Arc::new(Self {
            replies: Mutex::new(replies.into()),
            sent: Mutex::new(Vec::new()),
        })
    }

    fn sent(&self) -> Vec<SentRequest> {
        self.sent.lock().unwrap().clone()
    }
}

impl Transport for ScriptedTransport {
    fn post_json(&self, url: &str, headers: &[(&str, &str)], body: &Value) -> Result<HttpReply> {
        self.sent.lock().unwrap().push(SentRequest {
            url: url.to_string(),
            headers: headers
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
            body: body.clone(),
        });
        match self.replies.lock().unwrap().pop_front() {
            Some(Scripted::Reply(status, body)) => Ok(HttpReply { status, body }),
            Some(Scripted::Unreachable) => Err(anyhow!("connection refused")),
            None => panic!("unexpected request to {url}"),
        }
    }
}

fn models(names: &[&str]) -> Vec<String> {
    names.iter().map(|n| n.to_string()).collect()
}

fn gemini_ok(text: &str) -> Scripted {
    Scripted::Reply(
        200,
        json!({ "candidates": [ { "content": { "parts": [ { "text": text } ] } } ] }).to_string(),
    )
}

fn openai_ok(text: &str) -> Scripted {
    Scripted::Reply(
        200,
        json!({ "choices": [ { "message": { "role": "assistant", "content": text } } ] })
            .to_string(),
    )
}

fn provider_error(err: &anyhow::Error) -> &ProviderError {
    err.chain()
        .find_map(|cause| cause.downcast_ref::<ProviderError>())
        .expect("provider error in chain")
}

#[test]
fn gemini_sends_key_header_and_prompt() {
    let transport = ScriptedTransport::new(vec![gemini_ok("All calm. Nobody here. Have a nice day.")]);
    let client = GeminiClient::new(
        "g-key",
        "https://example.test/",
        models(&["gemini-2.0-flash"]),
        transport.clone(),
    );

    let generated = client.generate("Write a report").unwrap();
    assert_eq!(generated.text, "All calm. Nobody here. Have a nice day.");
    assert_eq!(generated.model, "gemini-2.0-flash");
    assert_eq!(generated.provider, "gemini");

    let sent = transport.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(
        sent[0].url,
        "https://example.test/v1beta/models/gemini-2.0-flash:generateContent"
    );
    assert!(!sent[0].url.contains("g-key"));
    assert!(sent[0]
        .headers
        .contains(&("x-goog-api-key".to_string(), "g-key".to_string())));
    assert_eq!(sent[0].body["contents"][0]["parts"][0]["text"], "Write a report");
}

#[test]
fn gemini_falls_back_through_models() {
    let transport = ScriptedTransport::new(vec![
        Scripted::Reply(404, r#"{"error":{"message":"model not found"}}"#.into()),
        Scripted::Reply(429, r#"{"error":{"status":"RESOURCE_EXHAUSTED"}}"#.into()),
        Scripted::Unreachable,
        gemini_ok("Third time lucky."),
    ]);
    let client = GeminiClient::new(
        "g-key",
        "https://example.test",
        models(&["a", "b", "c", "d"]),
        transport.clone(),
    );

    let generated = client.generate("prompt").unwrap();
    assert_eq!(generated.model, "d");
    let urls: Vec<String> = transport.sent().into_iter().map(|s| s.url).collect();
    assert_eq!(urls.len(), 4);
    assert!(urls[3].ends_with("/models/d:generateContent"));
}

#[test]
fn gemini_empty_candidates_is_a_failure() {
    let transport = ScriptedTransport::new(vec![Scripted::Reply(200, r#"{"candidates":[]}"#.into())]);
    let client = GeminiClient::new("k", "https://example.test", models(&["only"]), transport);
    let err = client.generate("prompt").unwrap_err();
    assert_eq!(provider_error(&err).kind, FailureKind::Other);
}

#[test]
fn openai_sends_chat_request() {
    let transport = ScriptedTransport::new(vec![openai_ok("Hello! Everything is fine. Stay safe.")]);
    let client = OpenAiClient::new(
        "sk-abc",
        "https://api.example.test",
        models(&["gpt-4"]),
        transport.clone(),
    );

    let generated = client.generate("Say hello!").unwrap();
    assert_eq!(generated.provider, "openai");
    assert_eq!(generated.model, "gpt-4");

    let sent = transport.sent();
    assert_eq!(sent[0].url, "https://api.example.test/v1/chat/completions");
    assert!(sent[0]
        .headers
        .contains(&("Authorization".to_string(), "Bearer sk-abc".to_string())));
    let body = &sent[0].body;
    assert_eq!(body["model"], "gpt-4");
    assert_eq!(body["messages"][0]["role"], "user");
    assert_eq!(body["messages"][0]["content"], "Say hello!");
    assert_eq!(body["max_tokens"], 200);
    assert!((body["temperature"].as_f64().unwrap() - 0.7).abs() < 1e-6);
}

#[test]
fn openai_reports_no_credits_after_all_models_fail() {
    let quota = r#"{"error":{"type":"insufficient_quota","message":"You exceeded your current quota"}}"#;
    let transport = ScriptedTransport::new(vec![
        Scripted::Reply(429, quota.into()),
        Scripted::Reply(429, quota.into()),
    ]);
    let client = OpenAiClient::new(
        "sk-abc",
        "https://api.example.test",
        models(&["gpt-4", "gpt-4o"]),
        transport.clone(),
    );

    let err = client.generate("prompt").unwrap_err();
    let cause = provider_error(&err);
    assert_eq!(cause.kind, FailureKind::NoCredits);
    assert_eq!(cause.model, "gpt-4o");
    assert_eq!(transport.sent().len(), 2);
}

#[test]
fn openai_bad_key_stops_after_first_model() {
    let transport = ScriptedTransport::new(vec![Scripted::Reply(
        401,
        r#"{"error":{"code":"invalid_api_key"}}"#.into(),
    )]);
    let client = OpenAiClient::new(
        "sk-wrong",
        "https://api.example.test",
        models(&["gpt-4", "gpt-4o", "gpt-3.5-turbo"]),
        transport.clone(),
    );

    let err = client.generate("prompt").unwrap_err();
    assert_eq!(provider_error(&err).kind, FailureKind::Unauthorized);
    assert_eq!(transport.sent().len(), 1);
}
