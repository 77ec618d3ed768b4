//! The conversational response engine.
//!
//! Raw utterances are labelled by the keyword [`intent`] classifier, framed by
//! the [`prompt`] templates and answered by a [`ConversationalAgent`] that keeps
//! the per-session history and calls out to a [`GenerationBackend`].

/// The stateful per-session agent.
pub mod agent;
/// Generation backends (Gemini, OpenAI, Claude).
pub mod backends;
/// Model and provider configuration.
pub mod config;
/// The recent-turns view of a history.
pub mod context;
/// Rule-based intent classification.
pub mod intent;
/// Prompt templates and assembly.
pub mod prompt;

pub use agent::{AgentSettings, ConversationalAgent, TaskContext};
pub use backends::{build_backend, GenerationBackend};
pub use config::{LlmProvider, ModelConfig};
pub use context::ContextWindow;
pub use intent::{classify, IntentLabel};
pub use prompt::{ReplyMode, TaskHint};
