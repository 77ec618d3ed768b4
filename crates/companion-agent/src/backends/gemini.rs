use super::{require_api_key, send_json, GenerationBackend};
use crate::config::ModelConfig;
use async_trait::async_trait;
use companion_core::CompanionResult;
use tracing::debug;

/// Google Gemini `generateContent` backend.
pub struct GeminiBackend {
    config: ModelConfig,
    http: reqwest::Client,
}

impl GeminiBackend {
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
impl GenerationBackend for GeminiBackend {
    async fn generate(&self, prompt: &str, model: &str) -> CompanionResult<String> {
        let url = format!(
            "{}/v1beta/models/{}:generateContent",
            self.config.base_url(),
            model
        );

        let body = serde_json::json!({
            "contents": [{
                "role": "user",
                "parts": [{ "text": prompt }],
            }],
            "generationConfig": {
                "temperature": self.config.temperature,
                "maxOutputTokens": self.config.max_tokens,
            },
        });

        debug!(model, prompt_chars = prompt.len(), "Gemini generateContent");

        let request = self
            .http
            .post(&url)
            .header("x-goog-api-key", &self.config.api_key)
            .json(&body);

        Ok(send_json("Gemini", request)
            .await?
            .map(|v| parse_gemini_response(&v))
            .unwrap_or_default())
    }
}

/// Concatenates the text parts of the first candidate. Missing pieces give "".
pub fn parse_gemini_response(body: &serde_json::Value) -> String {
    body["candidates"][0]["content"]["parts"]
        .as_array()
        .map(|parts| {
            parts
                .iter()
                .filter_map(|p| p["text"].as_str())
                .collect::<String>()
        })
        .unwrap_or_default()
}
