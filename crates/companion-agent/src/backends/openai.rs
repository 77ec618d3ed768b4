use super::{require_api_key, send_json, GenerationBackend};
use crate::config::ModelConfig;
use async_trait::async_trait;
use companion_core::CompanionResult;
use tracing::debug;

/// OpenAI-compatible chat completions backend.
///
/// Works with OpenAI, OpenRouter, Groq, Ollama, and any other provider
/// that implements the chat completions API.
pub struct OpenAiBackend {
    config: ModelConfig,
    http: reqwest::Client,
}

impl OpenAiBackend {
    /// Creates the backend. Fails if `config.api_key` is empty.
    pub fn new(config: ModelConfig) -> CompanionResult<Self> {
        require_api_key(&config)?;
        Ok(Self {
            config,
            http: reqwest::Client::new(),
        })
    }
}

#[async_trait]
impl GenerationBackend for OpenAiBackend {
    async fn generate(&self, prompt: &str, model: &str) -> CompanionResult<String> {
        let url = format!("{}/v1/chat/completions", self.config.base_url());

        // The prompt already carries the system rules; send it as one user turn.
        let body = serde_json::json!({
            "model": model,
            "max_tokens": self.config.max_tokens,
            "temperature": self.config.temperature,
            "messages": [{ "role": "user", "content": prompt }],
        });

        debug!(model, prompt_chars = prompt.len(), "OpenAI chat completion");

        let request = self
            .http
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.config.api_key))
            .json(&body);

        Ok(send_json("OpenAI", request)
            .await?
            .map(|v| parse_openai_response(&v))
            .unwrap_or_default())
    }
}

/// Text of the first choice, or "" if absent.
pub fn parse_openai_response(body: &serde_json::Value) -> String {
    body["choices"][0]["message"]["content"]
        .as_str()
        .unwrap_or_default()
        .to_string()
}
