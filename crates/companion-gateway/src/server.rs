use crate::middleware::{auth_middleware, AuthConfig};
use crate::router::{health_handler, nudge_handler, reply_handler};
use axum::{
    middleware as axum_mw,
    routing::{get, post},
    Router,
};
use companion_session::SessionRegistry;
use std::sync::Arc;
use std::time::Duration;

/// Default upper bound on one generation call.
pub const DEFAULT_GENERATION_TIMEOUT: Duration = Duration::from_secs(30);

/// Shared application state.
pub struct AppState {
    /// Conversations by session id.
    pub sessions: Arc<SessionRegistry>,
    /// Upper bound on one generation call.
    pub generation_timeout: Duration,
}

impl AppState {
    /// State with the default generation timeout.
    pub fn new(sessions: Arc<SessionRegistry>) -> Self {
        Self {
            sessions,
            generation_timeout: DEFAULT_GENERATION_TIMEOUT,
        }
    }

    /// Overrides the generation timeout.
    pub fn with_generation_timeout(mut self, timeout: Duration) -> Self {
        self.generation_timeout = timeout;
        self
    }
}

/// The HTTP gateway.
pub struct GatewayServer;

impl GatewayServer {
    /// Build the gateway without auth.
    pub fn build(state: AppState) -> Router {
        Self::build_with_auth(state, AuthConfig::default())
    }

    /// Build the gateway, guarding the API routes when `auth` has keys.
    /// `/health` stays open.
    pub fn build_with_auth(state: AppState, auth: AuthConfig) -> Router {
        let state = Arc::new(state);

        let mut api = Router::new()
            .route("/api/ai_reply", post(reply_handler))
            .route("/api/ai_nudge", post(nudge_handler))
            .with_state(state);

        if auth.is_enabled() {
            api = api.layer(axum_mw::from_fn_with_state(Arc::new(auth), auth_middleware));
        }

        Router::new().route("/health", get(health_handler)).merge(api)
    }
}
