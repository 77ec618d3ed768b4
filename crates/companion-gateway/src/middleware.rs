use crate::error::ApiError;
use axum::{
    extract::{Query, Request, State},
    http::{HeaderMap, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::sync::Arc;
use tracing::warn;

/// Auth configuration for the gateway.
#[derive(Debug, Clone, Default)]
pub struct AuthConfig {
    /// API keys accepted by the gateway. Empty = no auth required.
    pub api_keys: Vec<String>,
}

impl AuthConfig {
    /// Accepts exactly `api_keys`.
    pub fn new(api_keys: Vec<String>) -> Self {
        Self { api_keys }
    }

    /// Returns true if authentication is enabled (at least one key configured).
    pub fn is_enabled(&self) -> bool {
        !self.api_keys.is_empty()
    }

    fn accepts(&self, key: &str) -> bool {
        self.api_keys.iter().any(|k| k == key)
    }
}

/// Validates the API key from the `Authorization: Bearer` header or the
/// `?api_key=` query parameter, in that order.
pub async fn auth_middleware(
    State(auth): State<Arc<AuthConfig>>,
    headers: HeaderMap,
    query: Query<AuthQuery>,
    request: Request,
    next: Next,
) -> Response {
    if !auth.is_enabled() {
        return next.run(request).await;
    }

    let key_from_header = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(|s| s.to_string());

    let key = key_from_header.or_else(|| query.api_key.clone());

    match key {
        Some(k) if auth.accepts(&k) => next.run(request).await,
        Some(_) => {
            warn!(path = %request.uri().path(), "Rejected request: invalid API key");
            unauthorized("Invalid API key")
        }
        None => {
            warn!(path = %request.uri().path(), "Rejected request: missing API key");
            unauthorized("API key required")
        }
    }
}

fn unauthorized(message: &str) -> Response {
    ApiError {
        status: StatusCode::UNAUTHORIZED,
        message: message.to_string(),
    }
    .into_response()
}

/// Query string of a guarded request.
#[derive(serde::Deserialize, Default)]
pub struct AuthQuery {
    /// Key passed as `?api_key=`.
    pub api_key: Option<String>,
}
