use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// The author of a [`Turn`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// The person being assisted.
    User,
    /// The companion.
    Assistant,
}

impl Role {
    /// Lower-case role name.
    pub fn as_str(self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One entry in a conversation history. Never mutated once appended.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Turn {
    role: Role,
    text: String,
    timestamp: DateTime<Utc>,
}

impl Turn {
    /// Creates a turn with the given role and text.
    pub fn new(role: Role, text: impl Into<String>) -> Self {
        Self {
            role,
            text: text.into(),
            timestamp: Utc::now(),
        }
    }

    /// Creates a turn with [`Role::User`].
    pub fn user(text: impl Into<String>) -> Self {
        Self::new(Role::User, text)
    }

    /// Creates a turn with [`Role::Assistant`].
    pub fn assistant(text: impl Into<String>) -> Self {
        Self::new(Role::Assistant, text)
    }

    /// Who authored the turn.
    pub fn role(&self) -> Role {
        self.role
    }

    /// The turn's text.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// When the turn was created.
    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }
}
