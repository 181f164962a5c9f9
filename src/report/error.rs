use std::fmt;

/// Why a provider call failed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FailureKind {
    RateLimited,
    NoCredits,
    Unauthorized,
    ModelUnavailable,
    Network,
    Other,
}

impl FailureKind {
    /// Classify an HTTP error reply.
    pub fn from_reply(status: u16, body: &str) -> Self {
        let body = body.to_lowercase();
        if body.contains("insufficient_quota") {
            FailureKind::NoCredits
        } else if status == 429 || body.contains("rate_limit") || body.contains("quota") {
            FailureKind::RateLimited
        } else if status == 401
            || status == 403
            || body.contains("unauthorized")
            || body.contains("api key not valid")
            || body.contains("invalid_api_key")
        {
            FailureKind::Unauthorized
        } else if status == 404 || body.contains("not found") || body.contains("does not exist") {
            FailureKind::ModelUnavailable
        } else {
            FailureKind::Other
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            FailureKind::RateLimited => "rate limited",
            FailureKind::NoCredits => "no credits",
            FailureKind::Unauthorized => "unauthorized",
            FailureKind::ModelUnavailable => "model unavailable",
            FailureKind::Network => "network",
            FailureKind::Other => "error",
        }
    }
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A failed call to one model.
#[derive(Clone, Debug)]
pub struct ProviderError {
    pub kind: FailureKind,
    pub model: String,
    pub message: String,
}

impl ProviderError {
    pub fn new(kind: FailureKind, model: &str, message: impl Into<String>) -> Self {
        Self {
            kind,
            model: model.to_string(),
            message: message.into(),
        }
    }

    /// Build from a non-success HTTP reply. Long bodies are cut short.
    pub fn from_reply(model: &str, status: u16, body: &str) -> Self {
        let kind = FailureKind::from_reply(status, body);
        let snippet: String = body.trim().chars().take(200).collect();
        Self::new(kind, model, format!("HTTP {}: {}", status, snippet))
    }
}

impl fmt::Display for ProviderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({}): {}", self.model, self.kind, self.message)
    }
}

impl std::error::Error for ProviderError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_common_replies() {
        assert_eq!(FailureKind::from_reply(429, ""), FailureKind::RateLimited);
        assert_eq!(
            FailureKind::from_reply(429, r#"{"error":{"code":"insufficient_quota"}}"#),
            FailureKind::NoCredits
        );
        assert_eq!(FailureKind::from_reply(401, ""), FailureKind::Unauthorized);
        assert_eq!(
            FailureKind::from_reply(400, "API key not valid. Please pass a valid API key."),
            FailureKind::Unauthorized
        );
        assert_eq!(FailureKind::from_reply(404, ""), FailureKind::ModelUnavailable);
        assert_eq!(
            FailureKind::from_reply(400, "The model `gpt-5` does not exist"),
            FailureKind::ModelUnavailable
        );
        assert_eq!(FailureKind::from_reply(500, "boom"), FailureKind::Other);
    }

    #[test]
    fn reply_snippet_is_bounded() {
        let body = "x".repeat(1000);
        let err = ProviderError::from_reply("m", 500, &body);
        assert!(err.message.len() < 220);
    }
}
