use super::{require_api_key, send_json, GenerationBackend};
use crate::config::ModelConfig;
use async_trait::async_trait;
use companion_core::CompanionResult;
use tracing::debug;

/// Claude (Anthropic) messages backend.
pub struct ClaudeBackend {
    config: ModelConfig,
    http: reqwest::Client,
}

impl ClaudeBackend {
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
impl GenerationBackend for ClaudeBackend {
    async fn generate(&self, prompt: &str, model: &str) -> CompanionResult<String> {
        let url = format!("{}/v1/messages", self.config.base_url());

        let body = serde_json::json!({
            "model": model,
            "max_tokens": self.config.max_tokens,
            "temperature": self.config.temperature,
            "messages": [{ "role": "user", "content": prompt }],
        });

        debug!(model, prompt_chars = prompt.len(), "Claude messages");

        let request = self
            .http
            .post(&url)
            .header("x-api-key", &self.config.api_key)
            .header("anthropic-version", "2023-06-01")
            .json(&body);

        Ok(send_json("Claude", request)
            .await?
            .map(|v| parse_claude_response(&v))
            .unwrap_or_default())
    }
}

/// Joins the `text` content blocks of a messages response.
pub fn parse_claude_response(body: &serde_json::Value) -> String {
    body["content"]
        .as_array()
        .map(|blocks| {
            blocks
                .iter()
                .filter(|b| b["type"].as_str() == Some("text"))
                .filter_map(|b| b["text"].as_str())
                .collect::<Vec<_>>()
                .join("\n")
        })
        .unwrap_or_default()
}
