use companion_core::{CompanionError, CompanionResult};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Key shared by every caller that sends no session id.
pub const DEFAULT_SESSION_KEY: &str = "default";

/// What to do with requests that carry no session id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionKeyPolicy {
    /// Map missing ids to one shared key.
    ///
    /// All anonymous callers then share a single conversation, which is a
    /// multi-tenancy risk on any deployment with more than one user.
    SharedDefault(String),
    /// Refuse requests without an id.
    Reject,
}

impl Default for SessionKeyPolicy {
    fn default() -> Self {
        Self::SharedDefault(DEFAULT_SESSION_KEY.to_string())
    }
}

impl SessionKeyPolicy {
    /// Resolves the registry key for an optional, possibly blank, id.
    pub fn resolve(&self, session_id: Option<&str>) -> CompanionResult<String> {
        match session_id.filter(|id| !id.trim().is_empty()) {
            Some(id) => Ok(id.to_string()),
            None => match self {
                Self::SharedDefault(key) => Ok(key.clone()),
                Self::Reject => Err(CompanionError::Session("a session id is required".into())),
            },
        }
    }
}

/// When idle sessions are dropped from the registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EvictionPolicy {
    /// Sessions idle for longer than this are removed.
    pub ttl: Option<Duration>,
    /// Upper bound on live sessions; the least recently used is removed first.
    pub max_sessions: Option<usize>,
}

impl Default for EvictionPolicy {
    fn default() -> Self {
        Self {
            ttl: Some(Duration::from_secs(60 * 60)),
            max_sessions: Some(10_000),
        }
    }
}

impl EvictionPolicy {
    /// Keep every session for the life of the process.
    pub fn none() -> Self {
        Self {
            ttl: None,
            max_sessions: None,
        }
    }

    /// Whether a session idle for `idle` has outlived the TTL.
    pub fn is_expired(&self, idle: Duration) -> bool {
        self.ttl.is_some_and(|ttl| idle > ttl)
    }
}
