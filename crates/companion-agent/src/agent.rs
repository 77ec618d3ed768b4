use crate::backends::GenerationBackend;
use crate::context::ContextWindow;
use crate::intent::IntentLabel;
use crate::prompt::{build_prompt, ReplyMode, TaskHint, SYSTEM_PROMPT};
use companion_core::{CompanionResult, Turn};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Placeholder task used until a caller names one.
pub const DEFAULT_TASK: &str = "your task";

/// Returned for blank input, without calling the backend.
pub const CLARIFY_REPLY: &str = "I didn't catch that. Can you say it again?";

/// Returned when the backend answers with blank text.
pub const FALLBACK_REPLY: &str = "Sorry, I'm not sure. Can you say that again?";

/// User text recorded for a nudge, meaning "no user message".
pub const NUDGE_SENTINEL: &str = "(no user message)";

/// Number of most recent turns rendered into each prompt.
pub const HISTORY_WINDOW: usize = 10;

/// Settings shared by every agent of a registry.
#[derive(Debug, Clone)]
pub struct AgentSettings {
    /// Model selector passed to the backend on every call.
    pub model_id: String,
    /// How many recent turns each prompt includes.
    pub history_window: usize,
    /// Task title used when none was given.
    pub default_task: String,
}

impl Default for AgentSettings {
    fn default() -> Self {
        Self {
            model_id: "gemini-2.5-flash".to_string(),
            history_window: HISTORY_WINDOW,
            default_task: DEFAULT_TASK.to_string(),
        }
    }
}

/// Per-request task metadata supplied by the caller.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskContext {
    /// Overrides the stored task when non-empty.
    pub title: Option<String>,
    /// Current step of the task.
    pub action: Option<String>,
    /// How to address the person.
    pub user_name: Option<String>,
}

impl TaskContext {
    /// Empty context: stored task, unknown step, no name.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the task title override.
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Sets the current step.
    pub fn with_action(mut self, action: impl Into<String>) -> Self {
        self.action = Some(action.into());
        self
    }

    /// Sets the name to address the person by.
    pub fn with_user_name(mut self, name: impl Into<String>) -> Self {
        self.user_name = Some(name.into());
        self
    }

    fn title(&self) -> Option<&str> {
        self.title.as_deref().map(str::trim).filter(|t| !t.is_empty())
    }
}

/// Holds one session's task and history and produces replies.
///
/// History is append-only. Callers must serialize access per session; the
/// registry does this with a per-agent mutex.
pub struct ConversationalAgent {
    backend: Arc<dyn GenerationBackend>,
    settings: AgentSettings,
    current_task: String,
    history: Vec<Turn>,
}

impl ConversationalAgent {
    /// Creates an agent, seeded with `initial_task` if it is non-empty.
    pub fn new(
        backend: Arc<dyn GenerationBackend>,
        settings: AgentSettings,
        initial_task: Option<&str>,
    ) -> Self {
        let current_task = initial_task
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map_or_else(|| settings.default_task.clone(), str::to_string);
        Self {
            backend,
            settings,
            current_task,
            history: Vec::new(),
        }
    }

    /// The stored task title.
    pub fn current_task(&self) -> &str {
        &self.current_task
    }

    /// Every turn so far, oldest first.
    pub fn history(&self) -> &[Turn] {
        &self.history
    }

    /// Overwrites the stored task. Adds nothing to history.
    pub fn set_task(&mut self, title: impl Into<String>) {
        self.current_task = title.into();
    }

    /// Answers `user_text`.
    ///
    /// Blank input short-circuits with [`CLARIFY_REPLY`]. Otherwise the user
    /// turn is appended, a prompt is built from the latest window and sent to
    /// the backend, and the reply (or [`FALLBACK_REPLY`] if blank) is appended
    /// and returned. Backend failures propagate; the user turn stays recorded.
    pub async fn respond(
        &mut self,
        user_text: &str,
        task: &TaskContext,
        intent: IntentLabel,
        mode: ReplyMode,
    ) -> CompanionResult<String> {
        let user_text = user_text.trim();
        if user_text.is_empty() {
            debug!("Blank user text, asking again without generation");
            return Ok(CLARIFY_REPLY.to_string());
        }

        self.history.push(Turn::user(user_text));

        let prompt = self.build_prompt(task, intent, mode);
        info!(
            intent = %intent,
            mode = %mode,
            history_len = self.history.len(),
            prompt_chars = prompt.len(),
            "Requesting generation"
        );

        let generated = match self.backend.generate(&prompt, &self.settings.model_id).await {
            Ok(text) => text,
            Err(e) => {
                warn!(error = %e, "Generation backend failed");
                return Err(e);
            }
        };

        let reply = match generated.trim() {
            "" => {
                warn!("Blank generation output, using fallback reply");
                FALLBACK_REPLY.to_string()
            }
            text => text.to_string(),
        };

        self.history.push(Turn::assistant(reply.as_str()));
        Ok(reply)
    }

    /// Issues a proactive turn toward the task.
    ///
    /// Runs [`respond`](Self::respond) with [`NUDGE_SENTINEL`] as the user
    /// text and both intent and mode forced to nudge, so the nudge enters
    /// history like any other exchange. The sentinel is not classified.
    pub async fn nudge(&mut self, task: &TaskContext) -> CompanionResult<String> {
        self.respond(NUDGE_SENTINEL, task, IntentLabel::Nudge, ReplyMode::Nudge)
            .await
    }

    fn build_prompt(&self, task: &TaskContext, intent: IntentLabel, mode: ReplyMode) -> String {
        let hint = TaskHint {
            title: task.title().unwrap_or(&self.current_task),
            action: task.action.as_deref(),
            intent,
            mode,
            user_name: task.user_name.as_deref(),
        };
        let window = ContextWindow::latest(&self.history, self.settings.history_window);
        debug!(
            window_turns = window.len(),
            window_tokens = window.estimated_tokens(),
            "Context window"
        );
        build_prompt(SYSTEM_PROMPT, &hint, &window)
    }
}
