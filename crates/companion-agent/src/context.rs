use companion_core::Turn;

/// The most recent slice of a history that is shown to the model.
///
/// A view, not a copy: the history itself keeps growing; only the last
/// `max_turns` entries are rendered into a prompt.
#[derive(Debug, Clone, Copy)]
pub struct ContextWindow<'a> {
    turns: &'a [Turn],
}

impl<'a> ContextWindow<'a> {
    /// The last `max_turns` entries of `history`, oldest first.
    pub fn latest(history: &'a [Turn], max_turns: usize) -> Self {
        let start = history.len().saturating_sub(max_turns);
        Self {
            turns: &history[start..],
        }
    }

    /// Turns in the window, oldest first.
    pub fn turns(&self) -> &'a [Turn] {
        self.turns
    }

    /// Number of turns in the window.
    pub fn len(&self) -> usize {
        self.turns.len()
    }

    /// Whether the window holds no turns.
    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    /// One `ROLE: text` line per turn, role upper-cased.
    pub fn render(&self) -> String {
        self.turns
            .iter()
            .map(|t| format!("{}: {}", t.role().as_str().to_uppercase(), t.text()))
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Rough token estimation (4 chars ≈ 1 token).
    pub fn estimated_tokens(&self) -> usize {
        self.turns.iter().map(|t| t.text().len() / 4).sum()
    }
}
