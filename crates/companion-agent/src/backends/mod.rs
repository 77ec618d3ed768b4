/// Anthropic messages API.
pub mod claude;
/// Google Gemini `generateContent`.
pub mod gemini;
/// OpenAI chat completions.
pub mod openai;

use crate::backends::claude::ClaudeBackend;
use crate::backends::gemini::GeminiBackend;
use crate::backends::openai::OpenAiBackend;
use crate::config::{LlmProvider, ModelConfig};
use async_trait::async_trait;
use companion_core::{CompanionError, CompanionResult};
use std::sync::Arc;
use tracing::warn;

/// Trait for text-generation backends.
///
/// A backend takes a fully assembled prompt and returns the generated text.
/// Transport and service failures surface as
/// [`CompanionError::GenerationUnavailable`]; implementations never retry.
/// A successful call with no usable text returns an empty string.
///
/// To add a new provider:
/// 1. Create a new module in `backends/`
/// 2. Implement `GenerationBackend` for your struct
/// 3. Add the variant to `LlmProvider` in `config.rs`
/// 4. Wire it up in [`build_backend`]
#[async_trait]
pub trait GenerationBackend: Send + Sync {
    /// Generates a completion for `prompt` with the model named by `model`.
    async fn generate(&self, prompt: &str, model: &str) -> CompanionResult<String>;
}

/// Builds the backend selected by `config.provider`.
///
/// Fails with [`CompanionError::Config`] if the API key is empty, so a
/// misconfigured service refuses to start instead of failing per request.
pub fn build_backend(config: &ModelConfig) -> CompanionResult<Arc<dyn GenerationBackend>> {
    let backend: Arc<dyn GenerationBackend> = match config.provider {
        LlmProvider::Gemini => Arc::new(GeminiBackend::new(config.clone())?),
        LlmProvider::OpenAi => Arc::new(OpenAiBackend::new(config.clone())?),
        LlmProvider::Claude => Arc::new(ClaudeBackend::new(config.clone())?),
    };
    Ok(backend)
}

fn require_api_key(config: &ModelConfig) -> CompanionResult<()> {
    if config.api_key.trim().is_empty() {
        return Err(CompanionError::Config(format!(
            "missing API key for {:?} backend",
            config.provider
        )));
    }
    Ok(())
}

/// Sends `request` and returns the parsed JSON body of a successful response.
///
/// Transport errors and non-2xx statuses become `GenerationUnavailable`.
/// A 2xx body that is not JSON yields `None`.
async fn send_json(
    provider: &str,
    request: reqwest::RequestBuilder,
) -> CompanionResult<Option<serde_json::Value>> {
    let resp = request
        .send()
        .await
        .map_err(|e| CompanionError::GenerationUnavailable(format!("{provider} request failed: {e}")))?;

    let status = resp.status();
    let body = resp
        .text()
        .await
        .map_err(|e| CompanionError::GenerationUnavailable(format!("{provider} read failed: {e}")))?;

    if !status.is_success() {
        return Err(CompanionError::GenerationUnavailable(format!(
            "{provider} API error {status}: {body}"
        )));
    }

    match serde_json::from_str(&body) {
        Ok(value) => Ok(Some(value)),
        Err(e) => {
            warn!(provider, error = %e, "Malformed generation response body");
            Ok(None)
        }
    }
}
