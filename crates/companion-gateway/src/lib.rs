//! HTTP surface of the task companion.
//!
//! Exposes `POST /api/ai_reply`, `POST /api/ai_nudge` and `GET /health` over
//! a shared [`SessionRegistry`](companion_session::SessionRegistry).

/// JSON error bodies and status mapping.
pub mod error;
/// Optional API-key authentication.
pub mod middleware;
/// Request handlers and wire types.
pub mod router;
/// Router assembly and shared state.
pub mod server;

pub use middleware::AuthConfig;
pub use server::{AppState, GatewayServer};
