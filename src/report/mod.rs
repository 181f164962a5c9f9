//! Report generation.
//!
//! A report is a short narrative written by a text-generation provider from
//! the facts of one classification. Providers sit behind `TextGenerator`, a
//! single prompt-in, text-out capability, so the classifier and pipeline never
//! depend on a particular vendor.
//!
//! Hosted providers try a list of models in order and return the first
//! success. Each failure is logged with its `FailureKind`; when every model
//! fails the returned error carries the last `ProviderError`.

mod error;
mod gemini;
mod offline;
mod openai;
pub mod prompt;
mod transport;

use anyhow::{anyhow, Result};
use serde::Serialize;

pub use error::{FailureKind, ProviderError};
pub use gemini::{GeminiClient, DEFAULT_GEMINI_BASE_URL, DEFAULT_GEMINI_MODELS};
pub use offline::OfflineGenerator;
pub use openai::{OpenAiClient, DEFAULT_OPENAI_BASE_URL, DEFAULT_OPENAI_MODELS};
pub use prompt::{build_prompt, ReportFacts};
pub use transport::{HttpReply, Transport, UreqTransport};

/// Text produced by a provider.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Generated {
    pub text: String,
    pub provider: String,
    pub model: String,
}

/// Prompt in, text out.
pub trait TextGenerator {
    /// Provider identifier.
    fn name(&self) -> &'static str;

    fn generate(&self, prompt: &str) -> Result<Generated>;
}

/// Call `attempt` for each model until one succeeds.
///
/// An `Unauthorized` failure stops the walk early: every model shares the
/// same key.
pub(crate) fn first_success<F>(provider: &'static str, models: &[String], mut attempt: F) -> Result<Generated>
where
    F: FnMut(&str) -> std::result::Result<String, ProviderError>,
{
    if models.is_empty() {
        return Err(anyhow!("no models configured for provider {}", provider));
    }

    let mut last_error: Option<ProviderError> = None;
    for model in models {
        log::info!("{}: trying model {}", provider, model);
        match attempt(model) {
            Ok(text) => {
                log::info!("{}: report generated with {}", provider, model);
                return Ok(Generated {
                    text: text.trim().to_string(),
                    provider: provider.to_string(),
                    model: model.clone(),
                });
            }
            Err(err) => {
                log::warn!("{}: {} failed ({}): {}", provider, model, err.kind, err.message);
                let stop = err.kind == FailureKind::Unauthorized;
                last_error = Some(err);
                if stop {
                    break;
                }
            }
        }
    }

    match last_error {
        Some(err) => Err(anyhow::Error::new(err)
            .context(format!("could not generate text with any {} model", provider))),
        None => Err(anyhow!("could not generate text with any {} model", provider)),
    }
}
