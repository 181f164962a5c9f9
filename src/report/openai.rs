//! OpenAI chat completions client.

use serde::{Deserialize, Serialize};
use std::sync::Arc;

use anyhow::Result;

use super::error::{FailureKind, ProviderError};
use super::transport::Transport;
use super::{first_success, Generated, TextGenerator};

pub const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com";

pub const DEFAULT_OPENAI_MODELS: [&str; 4] = ["gpt-4", "gpt-4-turbo", "gpt-4o", "gpt-3.5-turbo"];

const TEMPERATURE: f32 = 0.7;
const MAX_TOKENS: u32 = 200;

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<Message<'a>>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Debug, Serialize)]
struct Message<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

pub struct OpenAiClient {
    api_key: String,
    base_url: String,
    models: Vec<String>,
    transport: Arc<dyn Transport>,
}

impl OpenAiClient {
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
        let url = format!("{}/v1/chat/completions", self.base_url);
        let request = ChatRequest {
            model,
            messages: vec![Message {
                role: "user",
                content: prompt,
            }],
            temperature: TEMPERATURE,
            max_tokens: MAX_TOKENS,
        };
        let body = serde_json::to_value(&request)
            .map_err(|e| ProviderError::new(FailureKind::Other, model, e.to_string()))?;
        let auth = format!("Bearer {}", self.api_key);
        let reply = self
            .transport
            .post_json(&url, &[("Authorization", auth.as_str())], &body)
            .map_err(|e| ProviderError::new(FailureKind::Network, model, format!("{:#}", e)))?;
        if !reply.is_success() {
            return Err(ProviderError::from_reply(model, reply.status, &reply.body));
        }

        let parsed: ChatResponse = serde_json::from_str(&reply.body).map_err(|e| {
            ProviderError::new(
                FailureKind::Other,
                model,
                format!("failed to parse chat response: {}", e),
            )
        })?;
        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .filter(|text| !text.trim().is_empty())
            .ok_or_else(|| ProviderError::new(FailureKind::Other, model, "no content in chat response"))
    }
}

impl TextGenerator for OpenAiClient {
    fn name(&self) -> &'static str {
        "openai"
    }

    fn generate(&self, prompt: &str) -> Result<Generated> {
        first_success(self.name(), &self.models, |model| self.call(model, prompt))
    }
}
