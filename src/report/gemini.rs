//! Google Gemini `generateContent` client.

use serde::{Deserialize, Serialize};
use std::sync::Arc;

use anyhow::Result;

use super::error::{FailureKind, ProviderError};
use super::transport::Transport;
use super::{first_success, Generated, TextGenerator};

pub const DEFAULT_GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com";

pub const DEFAULT_GEMINI_MODELS: [&str; 4] = [
    "gemini-2.0-flash",
    "gemini-1.5-flash",
    "gemini-1.5-pro",
    "gemini-pro",
];

#[derive(Debug, Serialize)]
struct GeminiRequest<'a> {
    contents: Vec<Content<'a>>,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    parts: Vec<Part<'a>>,
}

#[derive(Debug, Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Debug, Deserialize)]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<ResponseContent>,
}

#[derive(Debug, Deserialize)]
struct ResponseContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    #[serde(default)]
    text: String,
}

/// Gemini API client.
///
/// The key travels in the `x-goog-api-key` header so request URLs can be
/// logged as-is.
pub struct GeminiClient {
    api_key: String,
    base_url: String,
    models: Vec<String>,
    transport: Arc<dyn Transport>,
}

impl GeminiClient {
    pub fn new(
        api_key: impl Into<String>,
        base_url: &str,
        models: Vec<String>,
        transport: Arc<dyn Transport>,
    ) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: base_url.trim_end_matches('/').to_string(),
            models,
            transport,
        }
    }

    fn call(&self, model: &str, prompt: &str) -> std::result::Result<String, ProviderError> {
        let url = format!("{}/v1beta/models/{}:generateContent", self.base_url, model);
        log::debug!("gemini: POST {}", url);

        let request = GeminiRequest {
            contents: vec![Content {
                parts: vec![Part { text: prompt }],
            }],
        };
        let body = serde_json::to_value(&request)
            .map_err(|e| ProviderError::new(FailureKind::Other, model, e.to_string()))?;
        let reply = self
            .transport
            .post_json(&url, &[("x-goog-api-key", self.api_key.as_str())], &body)
            .map_err(|e| ProviderError::new(FailureKind::Network, model, format!("{:#}", e)))?;
        if !reply.is_success() {
            return Err(ProviderError::from_reply(model, reply.status, &reply.body));
        }

        let parsed: GeminiResponse = serde_json::from_str(&reply.body).map_err(|e| {
            ProviderError::new(
                FailureKind::Other,
                model,
                format!("failed to parse Gemini response: {}", e),
            )
        })?;
        let text: String = parsed
            .candidates
            .into_iter()
            .find_map(|c| c.content)
            .map(|content| {
                content
                    .parts
                    .into_iter()
                    .map(|p| p.text)
                    .collect::<Vec<_>>()
                    .join("")
            })
            .unwrap_or_default();
        if text.trim().is_empty() {
            return Err(ProviderError::new(
                FailureKind::Other,
                model,
                "no content in Gemini response",
            ));
        }
        Ok(text)
    }
}

impl TextGenerator for GeminiClient {
    fn name(&self) -> &'static str {
        "gemini"
    }

    fn generate(&self, prompt: &str) -> Result<Generated> {
        first_success(self.name(), &self.models, |model| self.call(model, prompt))
    }
}
