use crate::policy::{EvictionPolicy, SessionKeyPolicy};
use companion_agent::{
    AgentSettings, ConversationalAgent, GenerationBackend, IntentLabel, ReplyMode, TaskContext,
};
use companion_core::CompanionResult;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::{Arc, Weak};
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, info, warn};

/// Shared, exclusively locked access to one session's agent.
///
/// Holding the lock for a whole call makes append/read/append atomic per
/// session while other sessions proceed independently.
pub type AgentHandle = Arc<tokio::sync::Mutex<ConversationalAgent>>;

struct SessionEntry {
    agent: AgentHandle,
    last_access: Instant,
}

impl SessionEntry {
    /// A handle is out: a call is running or queued, or a caller holds the
    /// agent. Busy entries are never evicted or replaced.
    fn is_busy(&self) -> bool {
        Arc::strong_count(&self.agent) > 1
    }

    fn is_evictable(&self, policy: &EvictionPolicy, now: Instant) -> bool {
        !self.is_busy() && policy.is_expired(now.duration_since(self.last_access))
    }
}

/// Maps session keys to agents, creating them on first use.
pub struct SessionRegistry {
    backend: Arc<dyn GenerationBackend>,
    settings: AgentSettings,
    key_policy: SessionKeyPolicy,
    eviction: EvictionPolicy,
    // Never held across an await.
    sessions: Mutex<HashMap<String, SessionEntry>>,
}

impl SessionRegistry {
    /// Registry with the default key and eviction policies.
    pub fn new(backend: Arc<dyn GenerationBackend>, settings: AgentSettings) -> Self {
        Self {
            backend,
            settings,
            key_policy: SessionKeyPolicy::default(),
            eviction: EvictionPolicy::default(),
            sessions: Mutex::new(HashMap::new()),
        }
    }

    /// Sets how requests without an id are keyed.
    pub fn with_key_policy(mut self, policy: SessionKeyPolicy) -> Self {
        self.key_policy = policy;
        self
    }

    /// Sets when idle sessions are dropped.
    pub fn with_eviction(mut self, policy: EvictionPolicy) -> Self {
        self.eviction = policy;
        self
    }

    /// Returns the agent for `session_id`, creating it if needed.
    ///
    /// A new agent is seeded with `task_title`; an existing one has its task
    /// overwritten when `task_title` is non-empty (last write wins). The
    /// same handle is returned for a key until the session is evicted.
    pub async fn get_or_create(
        &self,
        session_id: Option<&str>,
        task_title: Option<&str>,
    ) -> CompanionResult<AgentHandle> {
        let title = non_empty(task_title);
        let (handle, created) = self.entry(session_id, title)?;
        if let (false, Some(title)) = (created, title) {
            handle.lock().await.set_task(title);
        }
        Ok(handle)
    }

    /// Answers `user_text` in the given session.
    ///
    /// `intent` is computed by the caller. A non-empty `task.title` also
    /// becomes the session's stored task.
    pub async fn respond(
        &self,
        session_id: Option<&str>,
        user_text: &str,
        task: &TaskContext,
        intent: IntentLabel,
        mode: ReplyMode,
    ) -> CompanionResult<String> {
        let title = non_empty(task.title.as_deref());
        let (handle, created) = self.entry(session_id, title)?;
        let mut agent = handle.lock().await;
        if let (false, Some(title)) = (created, title) {
            agent.set_task(title);
        }
        agent.respond(user_text, task, intent, mode).await
    }

    /// Issues a nudge in the given session.
    pub async fn nudge(
        &self,
        session_id: Option<&str>,
        task: &TaskContext,
    ) -> CompanionResult<String> {
        let title = non_empty(task.title.as_deref());
        let (handle, created) = self.entry(session_id, title)?;
        let mut agent = handle.lock().await;
        if let (false, Some(title)) = (created, title) {
            agent.set_task(title);
        }
        agent.nudge(task).await
    }

    /// Removes sessions idle for longer than the TTL, skipping any whose
    /// agent is still in use. Returns how many went.
    pub fn evict_expired(&self) -> usize {
        let now = Instant::now();
        let mut sessions = self.sessions.lock();
        let before = sessions.len();
        sessions.retain(|_, e| !e.is_evictable(&self.eviction, now));
        let evicted = before - sessions.len();
        if evicted > 0 {
            info!(evicted, remaining = sessions.len(), "Evicted idle sessions");
        }
        evicted
    }

    /// Runs [`evict_expired`](Self::evict_expired) every `period` until the
    /// registry is dropped.
    pub fn spawn_sweeper(self: &Arc<Self>, period: Duration) -> JoinHandle<()> {
        let registry: Weak<Self> = Arc::downgrade(self);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.tick().await;
            loop {
                ticker.tick().await;
                match registry.upgrade() {
                    Some(registry) => {
                        registry.evict_expired();
                    }
                    None => break,
                }
            }
        })
    }

    /// Number of live sessions.
    pub fn len(&self) -> usize {
        self.sessions.lock().len()
    }

    /// Whether no session is live.
    pub fn is_empty(&self) -> bool {
        self.sessions.lock().is_empty()
    }

    /// Whether a session exists under the exact key `key`.
    pub fn contains(&self, key: &str) -> bool {
        self.sessions.lock().contains_key(key)
    }

    /// Looks up or inserts the agent for a session in one critical section.
    /// Returns whether the agent was created by this call.
    fn entry(
        &self,
        session_id: Option<&str>,
        title: Option<&str>,
    ) -> CompanionResult<(AgentHandle, bool)> {
        let key = self.key_policy.resolve(session_id)?;
        let now = Instant::now();
        let mut sessions = self.sessions.lock();

        if let Some(entry) = sessions.get_mut(&key) {
            if !entry.is_evictable(&self.eviction, now) {
                entry.last_access = now;
                return Ok((entry.agent.clone(), false));
            }
            debug!(session = %key, "Session expired before sweep, recreating");
            sessions.remove(&key);
        }

        self.make_room(&mut sessions, now);
        let agent = ConversationalAgent::new(self.backend.clone(), self.settings.clone(), title);
        let handle: AgentHandle = Arc::new(tokio::sync::Mutex::new(agent));
        sessions.insert(
            key.clone(),
            SessionEntry {
                agent: handle.clone(),
                last_access: now,
            },
        );
        info!(session = %key, live = sessions.len(), "Created session");
        Ok((handle, true))
    }

    fn make_room(&self, sessions: &mut HashMap<String, SessionEntry>, now: Instant) {
        let Some(max) = self.eviction.max_sessions else {
            return;
        };
        sessions.retain(|_, e| !e.is_evictable(&self.eviction, now));
        while sessions.len() >= max.max(1) {
            let Some(oldest) = sessions
                .iter()
                .filter(|(_, e)| !e.is_busy())
                .min_by_key(|(_, e)| e.last_access)
                .map(|(k, _)| k.clone())
            else {
                warn!(live = sessions.len(), max, "Every session is busy, exceeding capacity");
                break;
            };
            sessions.remove(&oldest);
            info!(session = %oldest, "Evicted least recently used session");
        }
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}
