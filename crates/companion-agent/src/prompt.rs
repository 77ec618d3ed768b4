//! Prompt templates.
//!
//! Everything here is pure string assembly so the exact text sent to the
//! generation backend can be pinned down in tests.

use crate::context::ContextWindow;
use crate::intent::IntentLabel;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Fixed instruction block placed at the top of every prompt.
///
/// The nudge rules are a content contract: nudges must not ask questions and
/// must not repeat instructions already given.
pub const SYSTEM_PROMPT: &str = "\
You are a gentle task companion for a person with an intellectual disability.
Rules:
- Use simple, short sentences. Say at most two sentences.
- Give one instruction at a time.
- Be kind, calm and encouraging. Never scold.
- First acknowledge what the person said or how they feel, then guide them back to the current task.
- Avoid sarcasm, complex metaphors, or long paragraphs.
- If the person seems confused, say the current step again in simpler words.
Focus:
- Keep the conversation about the current task. If the person drifts, kindly bring them back.
Motivation:
- If the person is tired, stressed or resisting, comfort them first and offer one small, easy step.
- If the person says they are done, praise them warmly.
- If the person says stop, quit or goodbye, end politely.
Nudge mode (Mode: nudge):
- There is no new message from the person. Give one short, friendly push toward the current step.
- Do not ask a question.
- Do not repeat an instruction you already gave in the conversation.";

/// Marker that hands the turn to the model.
pub const ASSISTANT_MARKER: &str = "ASSISTANT:";

/// Literal used in the task hint when no action is known.
pub const UNKNOWN_ACTION: &str = "unknown";

/// Whether a turn answers the user or is a proactive nudge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReplyMode {
    /// Answer to a user utterance.
    Reply,
    /// Proactive push with no user message.
    Nudge,
}

impl ReplyMode {
    /// Wire name of the mode.
    pub fn as_str(self) -> &'static str {
        match self {
            ReplyMode::Reply => "reply",
            ReplyMode::Nudge => "nudge",
        }
    }
}

impl fmt::Display for ReplyMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-turn task context handed to the model.
#[derive(Debug, Clone, Copy)]
pub struct TaskHint<'a> {
    /// Effective task title.
    pub title: &'a str,
    /// Current step of the task, if known.
    pub action: Option<&'a str>,
    /// Intent of the latest user turn.
    pub intent: IntentLabel,
    /// Reply or nudge.
    pub mode: ReplyMode,
    /// How to address the person, if known.
    pub user_name: Option<&'a str>,
}

impl TaskHint<'_> {
    /// Renders the hint block, one `Key: value` line each.
    pub fn render(&self) -> String {
        let action = self
            .action
            .map(str::trim)
            .filter(|a| !a.is_empty())
            .unwrap_or(UNKNOWN_ACTION);
        let mut block = format!(
            "Current task: {}\nCurrent step: {}\nIntent: {}\nMode: {}",
            self.title, action, self.intent, self.mode
        );
        if let Some(name) = self.user_name.map(str::trim).filter(|n| !n.is_empty()) {
            block.push_str("\nUser name: ");
            block.push_str(name);
        }
        block
    }
}

/// Joins system rules, task hint and context window into the final prompt.
pub fn build_prompt(system_rules: &str, hint: &TaskHint<'_>, window: &ContextWindow<'_>) -> String {
    format!(
        "{system_rules}\n\n{}\n\nConversation so far:\n{}\n\n{ASSISTANT_MARKER}",
        hint.render(),
        window.render()
    )
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use companion_core::Turn;

    #[test]
    fn test_golden_prompt() {
        let history = vec![Turn::user("hello")];
        let hint = TaskHint {
            title: "Brush teeth",
            action: Some("Put toothpaste on the brush"),
            intent: IntentLabel::Greeting,
            mode: ReplyMode::Reply,
            user_name: None,
        };
        let prompt = build_prompt("RULES", &hint, &ContextWindow::latest(&history, 10));

        let expected = "RULES\n\n\
            Current task: Brush teeth\n\
            Current step: Put toothpaste on the brush\n\
            Intent: greeting\n\
            Mode: reply\n\n\
            Conversation so far:\n\
            USER: hello\n\n\
            ASSISTANT:";
        assert_eq!(prompt, expected);
    }

    #[test]
    fn test_missing_action_renders_unknown() {
        let hint = TaskHint {
            title: "Cook dinner",
            action: None,
            intent: IntentLabel::Nudge,
            mode: ReplyMode::Nudge,
            user_name: None,
        };
        let block = hint.render();
        assert!(block.contains("Current step: unknown"));
        assert!(block.contains("Intent: nudge"));
        assert!(block.contains("Mode: nudge"));

        let blank = TaskHint {
            action: Some("  "),
            ..hint
        };
        assert!(blank.render().contains("Current step: unknown"));
    }

    #[test]
    fn test_user_name_line_only_when_present() {
        let hint = TaskHint {
            title: "Tidy room",
            action: None,
            intent: IntentLabel::Unknown,
            mode: ReplyMode::Reply,
            user_name: Some("Sam"),
        };
        assert!(hint.render().ends_with("\nUser name: Sam"));

        let anonymous = TaskHint {
            user_name: Some(""),
            ..hint
        };
        assert!(!anonymous.render().contains("User name"));
    }

    #[test]
    fn test_system_prompt_constrains_nudges() {
        assert!(SYSTEM_PROMPT.contains("Do not ask a question."));
        assert!(SYSTEM_PROMPT.contains("Do not repeat an instruction"));
    }

    #[test]
    fn test_prompt_ends_with_assistant_marker() {
        let hint = TaskHint {
            title: "your task",
            action: None,
            intent: IntentLabel::Unknown,
            mode: ReplyMode::Reply,
            user_name: None,
        };
        let prompt = build_prompt(SYSTEM_PROMPT, &hint, &ContextWindow::latest(&[], 10));
        assert!(prompt.starts_with(SYSTEM_PROMPT));
        assert!(prompt.ends_with("\n\nASSISTANT:"));
    }
}
