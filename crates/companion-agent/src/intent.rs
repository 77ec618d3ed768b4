use serde::{Deserialize, Serialize};
use std::fmt;

/// The communicative purpose of an utterance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IntentLabel {
    /// "hi", "hello".
    Greeting,
    /// Sleepy or exhausted.
    Tired,
    /// Anxious or overwhelmed.
    Stressed,
    /// Does not know what to do.
    Confused,
    /// Asks for the next step.
    TaskHelp,
    /// Does not want to do the task now.
    Resistance,
    /// Wants to know they are doing it right.
    Reassurance,
    /// Finished the step.
    Done,
    /// Scared, upset or uncomfortable.
    Distress,
    /// Wants to end the conversation.
    Goodbye,
    /// Proactive turn with no user message. Never produced by [`classify`].
    Nudge,
    /// Nothing matched.
    Unknown,
}

impl IntentLabel {
    /// Wire name of the label, as used in prompts and JSON.
    pub fn as_str(self) -> &'static str {
        match self {
            IntentLabel::Greeting => "greeting",
            IntentLabel::Tired => "tired",
            IntentLabel::Stressed => "stressed",
            IntentLabel::Confused => "confused",
            IntentLabel::TaskHelp => "task_help",
            IntentLabel::Resistance => "resistance",
            IntentLabel::Reassurance => "reassurance",
            IntentLabel::Done => "done",
            IntentLabel::Distress => "distress",
            IntentLabel::Goodbye => "goodbye",
            IntentLabel::Nudge => "nudge",
            IntentLabel::Unknown => "unknown",
        }
    }
}

impl fmt::Display for IntentLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Trigger substrings per intent. Declaration order is the tie-break order:
/// the first intent with any hit wins.
pub const INTENT_KEYWORDS: &[(IntentLabel, &[&str])] = &[
    (IntentLabel::Greeting, &["hi", "hello", "hey"]),
    (IntentLabel::Tired, &["sleepy", "tired", "exhausted"]),
    (IntentLabel::Stressed, &["stressed", "anxious", "overwhelmed"]),
    (
        IntentLabel::Confused,
        &["i don't know", "dont know", "confused", "not sure", "huh"],
    ),
    (
        IntentLabel::TaskHelp,
        &["what next", "next task", "what do i do", "help me"],
    ),
    (
        IntentLabel::Resistance,
        &["don't want", "dont want", "no", "later", "not now"],
    ),
    (
        IntentLabel::Reassurance,
        &["is this okay", "am i doing right", "is it correct"],
    ),
    (IntentLabel::Done, &["done", "finished", "completed", "i did it"]),
    (
        IntentLabel::Distress,
        &["i don't like this", "uncomfortable", "scared", "upset"],
    ),
    (
        IntentLabel::Goodbye,
        &["bye", "goodbye", "see you", "quit", "stop"],
    ),
];

/// Labels `text` by plain substring containment against [`INTENT_KEYWORDS`].
///
/// Matching is case-insensitive but not word-bounded, so "this" counts as a
/// greeting because it contains "hi". Empty input is [`IntentLabel::Unknown`].
pub fn classify(text: &str) -> IntentLabel {
    let lowered = text.to_lowercase();
    if lowered.is_empty() {
        return IntentLabel::Unknown;
    }
    INTENT_KEYWORDS
        .iter()
        .find(|(_, triggers)| triggers.iter().any(|t| lowered.contains(t)))
        .map_or(IntentLabel::Unknown, |(intent, _)| *intent)
}
