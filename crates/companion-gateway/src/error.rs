//! JSON error responses for the HTTP API.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use companion_core::CompanionError;
use serde_json::json;
use tracing::{error, warn};

/// Shown when the generation backend fails or times out.
pub const UNREACHABLE_MESSAGE: &str = "The assistant is not reachable right now.";

/// API error with status code and message.
#[derive(Debug)]
pub struct ApiError {
    /// Response status.
    pub status: StatusCode,
    /// Sent as the `error` field.
    pub message: String,
}

impl ApiError {
    /// 400 with `msg`.
    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: msg.into(),
        }
    }

    /// 503 with the fixed unreachable message.
    pub fn unavailable() -> Self {
        Self {
            status: StatusCode::SERVICE_UNAVAILABLE,
            message: UNREACHABLE_MESSAGE.to_string(),
        }
    }

    /// 500 with `msg`.
    pub fn internal(msg: impl Into<String>) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: msg.into(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = json!({
            "ok": false,
            "error": self.message,
        });
        (self.status, Json(body)).into_response()
    }
}

impl From<CompanionError> for ApiError {
    fn from(err: CompanionError) -> Self {
        if err.is_unavailable() {
            warn!(error = %err, "Assistant unreachable");
            return ApiError::unavailable();
        }
        match err {
            CompanionError::Session(msg) => ApiError::bad_request(msg),
            other => {
                error!(error = %other, "Request failed");
                ApiError::internal("internal error")
            }
        }
    }
}
