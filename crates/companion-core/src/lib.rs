//! Core types and error definitions for the task companion.
//!
//! This crate holds the types shared by every companion crate: the unified
//! error enum and the conversation turn representation.
//!
//! # Main types
//!
//! - [`CompanionError`] — Unified error enum for all companion subsystems.
//! - [`CompanionResult`] — Convenience alias for `Result<T, CompanionError>`.
//! - [`Role`] — Author of a turn (user or assistant).
//! - [`Turn`] — A single immutable entry in a conversation history.

/// Error types.
pub mod error;
/// Conversation turn types.
pub mod message;

pub use error::{CompanionError, CompanionResult};
pub use message::{Role, Turn};
