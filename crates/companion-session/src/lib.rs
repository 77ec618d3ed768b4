//! Session management for the task companion.
//!
//! A [`SessionRegistry`] owns one [`ConversationalAgent`] per session key,
//! creates agents lazily, serializes calls per session and evicts idle
//! sessions according to an [`EvictionPolicy`].
//!
//! [`ConversationalAgent`]: companion_agent::ConversationalAgent

/// Key and eviction policies.
pub mod policy;
/// The session-to-agent registry.
pub mod registry;

pub use policy::{EvictionPolicy, SessionKeyPolicy, DEFAULT_SESSION_KEY};
pub use registry::{AgentHandle, SessionRegistry};
