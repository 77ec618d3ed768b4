use companion_agent::agent::{DEFAULT_TASK, HISTORY_WINDOW};
use companion_agent::{AgentSettings, ModelConfig};
use companion_session::{EvictionPolicy, SessionKeyPolicy};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;
use tracing::info;

/// Contents of `companion.toml`.
#[derive(Debug, Default, Deserialize)]
pub struct CompanionConfig {
    /// Generation backend.
    #[serde(default)]
    pub model: ModelConfig,
    /// HTTP listener and auth.
    #[serde(default)]
    pub server: ServerConfig,
    /// Session lifetime.
    #[serde(default)]
    pub sessions: SessionsConfig,
    /// Prompting and generation limits.
    #[serde(default)]
    pub conversation: ConversationConfig,
}

/// `[server]` section.
#[derive(Debug, Deserialize)]
pub struct ServerConfig {
    /// Bind address.
    #[serde(default = "default_host")]
    pub host: String,
    /// Bind port.
    #[serde(default = "default_port")]
    pub port: u16,
    /// Accepted API keys; empty disables auth.
    #[serde(default)]
    pub api_keys: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            api_keys: vec![],
        }
    }
}

/// `0` disables the TTL or the capacity bound.
#[derive(Debug, Deserialize)]
pub struct SessionsConfig {
    /// Idle time before a session is dropped.
    #[serde(default = "default_ttl_secs")]
    pub ttl_secs: u64,
    /// Most sessions kept at once.
    #[serde(default = "default_max_sessions")]
    pub max_sessions: usize,
    /// How often expired sessions are swept.
    #[serde(default = "default_sweep_interval_secs")]
    pub sweep_interval_secs: u64,
    /// Reject requests that carry no session id.
    #[serde(default)]
    pub require_session_id: bool,
}

impl Default for SessionsConfig {
    fn default() -> Self {
        Self {
            ttl_secs: default_ttl_secs(),
            max_sessions: default_max_sessions(),
            sweep_interval_secs: default_sweep_interval_secs(),
            require_session_id: false,
        }
    }
}

impl SessionsConfig {
    /// Eviction policy for the registry.
    pub fn eviction(&self) -> EvictionPolicy {
        EvictionPolicy {
            ttl: (self.ttl_secs > 0).then(|| Duration::from_secs(self.ttl_secs)),
            max_sessions: (self.max_sessions > 0).then_some(self.max_sessions),
        }
    }

    /// Key policy for requests without a session id.
    pub fn key_policy(&self) -> SessionKeyPolicy {
        if self.require_session_id {
            SessionKeyPolicy::Reject
        } else {
            SessionKeyPolicy::default()
        }
    }

    /// Sweeper period, at least one second.
    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_secs.max(1))
    }
}

/// `[conversation]` section.
#[derive(Debug, Deserialize)]
pub struct ConversationConfig {
    /// Recent turns included in each prompt.
    #[serde(default = "default_history_window")]
    pub history_window: usize,
    /// Task title used until one is given.
    #[serde(default = "default_task")]
    pub default_task: String,
    /// Upper bound on one generation call.
    #[serde(default = "default_generation_timeout_secs")]
    pub generation_timeout_secs: u64,
}

impl Default for ConversationConfig {
    fn default() -> Self {
        Self {
            history_window: default_history_window(),
            default_task: default_task(),
            generation_timeout_secs: default_generation_timeout_secs(),
        }
    }
}

impl ConversationConfig {
    /// Generation bound, at least one second.
    pub fn generation_timeout(&self) -> Duration {
        Duration::from_secs(self.generation_timeout_secs.max(1))
    }
}

impl CompanionConfig {
    /// Reads `path`, falling back to defaults when the file does not exist.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        if !path.exists() {
            info!(path = %path.display(), "Config file not found, using defaults");
            return Ok(Self::default());
        }
        let raw = std::fs::read_to_string(path).map_err(|e| {
            anyhow::anyhow!("Failed to read config file '{}': {}", path.display(), e)
        })?;
        let config = toml::from_str(&raw)?;
        Ok(config)
    }

    /// Agent settings derived from `[model]` and `[conversation]`.
    pub fn agent_settings(&self) -> AgentSettings {
        AgentSettings {
            model_id: self.model.model_id.clone(),
            history_window: self.conversation.history_window,
            default_task: self.conversation.default_task.clone(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}
fn default_port() -> u16 {
    8000
}
fn default_ttl_secs() -> u64 {
    60 * 60
}
fn default_max_sessions() -> usize {
    10_000
}
fn default_sweep_interval_secs() -> u64 {
    60
}
fn default_history_window() -> usize {
    HISTORY_WINDOW
}
fn default_task() -> String {
    DEFAULT_TASK.to_string()
}
fn default_generation_timeout_secs() -> u64 {
    30
}
