use companion_core::{CompanionError, CompanionResult};
use serde::{Deserialize, Serialize};

/// Which hosted text-generation service answers prompts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LlmProvider {
    /// Google Gemini (`generateContent`).
    #[default]
    Gemini,
    /// OpenAI chat completions, or any compatible endpoint via `api_base_url`.
    OpenAi,
    /// Anthropic messages API.
    Claude,
}

impl LlmProvider {
    /// Environment variables consulted, in order, when no key is configured.
    pub fn api_key_env_vars(self) -> &'static [&'static str] {
        match self {
            LlmProvider::Gemini => &["GEMINI_API_KEY", "GOOGLE_API_KEY"],
            LlmProvider::OpenAi => &["OPENAI_API_KEY"],
            LlmProvider::Claude => &["ANTHROPIC_API_KEY"],
        }
    }
}

/// Which model to call and how.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelConfig {
    /// Hosted service to call.
    #[serde(default)]
    pub provider: LlmProvider,
    /// Model selector sent with every request.
    #[serde(default = "default_model_id")]
    pub model_id: String,
    /// API key; resolved from the environment when empty.
    #[serde(default)]
    pub api_key: String,
    /// Overrides the provider's default endpoint.
    #[serde(default)]
    pub api_base_url: Option<String>,
    /// Sampling temperature.
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    /// Upper bound on generated tokens.
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
}

fn default_model_id() -> String {
    "gemini-2.5-flash".to_string()
}

fn default_temperature() -> f32 {
    0.7
}

fn default_max_tokens() -> u32 {
    256
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            provider: LlmProvider::default(),
            model_id: default_model_id(),
            api_key: String::new(),
            api_base_url: None,
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
        }
    }
}

impl ModelConfig {
    /// Endpoint base without a trailing slash.
    pub fn base_url(&self) -> &str {
        if let Some(url) = &self.api_base_url {
            url.trim_end_matches('/')
        } else {
            match self.provider {
                LlmProvider::Gemini => "https://generativelanguage.googleapis.com",
                LlmProvider::OpenAi => "https://api.openai.com",
                LlmProvider::Claude => "https://api.anthropic.com",
            }
        }
    }

    /// Fills an empty `api_key` from the process environment.
    pub fn resolve_api_key(&mut self) -> CompanionResult<()> {
        self.resolve_api_key_with(|name| std::env::var(name).ok())
    }

    /// Fills an empty `api_key` using `lookup` for the provider's variables.
    ///
    /// Fails with [`CompanionError::Config`] when no non-empty key is found.
    pub fn resolve_api_key_with<F>(&mut self, lookup: F) -> CompanionResult<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if !self.api_key.trim().is_empty() {
            return Ok(());
        }
        let vars = self.provider.api_key_env_vars();
        match vars
            .iter()
            .filter_map(|v| lookup(v))
            .find(|k| !k.trim().is_empty())
        {
            Some(key) => {
                self.api_key = key;
                Ok(())
            }
            None => Err(CompanionError::Config(format!(
                "no API key configured for {:?}; set model.api_key or {}",
                self.provider,
                vars.join(" / ")
            ))),
        }
    }
}
