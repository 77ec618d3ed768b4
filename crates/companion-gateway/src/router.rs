use crate::error::ApiError;
use crate::server::AppState;
use axum::{extract::rejection::JsonRejection, extract::State, Json};
use companion_agent::{classify, IntentLabel, ReplyMode, TaskContext};
use companion_core::{CompanionError, CompanionResult};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

/// Name used when the caller does not send one.
pub const DEFAULT_USER_NAME: &str = "Friend";

/// Task title for nudges that name no task.
pub const DEFAULT_NUDGE_TASK: &str = "Task";

/// Body of `POST /api/ai_reply`.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReplyRequest {
    /// The utterance; blank is rejected.
    #[serde(default)]
    pub text: Option<String>,
    /// Conversation key.
    #[serde(default)]
    pub session_id: Option<String>,
    /// Task title; also becomes the stored task.
    #[serde(default)]
    pub task_title: Option<String>,
    /// Current step of the task.
    #[serde(default)]
    pub task_action: Option<String>,
    /// Name to address; defaults to "Friend".
    #[serde(default)]
    pub user_name: Option<String>,
}

/// Body of `POST /api/ai_nudge`.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NudgeRequest {
    /// Conversation key.
    #[serde(default)]
    pub session_id: Option<String>,
    /// Task title; defaults to "Task".
    #[serde(default)]
    pub task_title: Option<String>,
    /// Current step of the task.
    #[serde(default)]
    pub task_action: Option<String>,
    /// Name to address; defaults to "Friend".
    #[serde(default)]
    pub user_name: Option<String>,
}

/// Body of a successful reply.
#[derive(Debug, Serialize)]
pub struct ReplyResponse {
    /// Always true.
    pub ok: bool,
    /// Generated reply.
    pub reply: String,
    /// Intent classified from the text.
    pub intent: IntentLabel,
    /// Echo of `taskTitle`.
    pub task: Option<String>,
    /// Echo of `taskAction`.
    pub action: Option<String>,
}

/// Body of a successful nudge.
#[derive(Debug, Serialize)]
pub struct NudgeResponse {
    /// Always true.
    pub ok: bool,
    /// Generated nudge.
    pub reply: String,
}

/// `POST /api/ai_reply`.
pub async fn reply_handler(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<ReplyRequest>, JsonRejection>,
) -> Result<Json<ReplyResponse>, ApiError> {
    let Json(req) = payload.map_err(reject_body)?;

    let text = req.text.as_deref().map(str::trim).unwrap_or_default();
    if text.is_empty() {
        return Err(ApiError::bad_request("Missing 'text'"));
    }

    let intent = classify(text);
    let task = task_context(
        req.task_title.clone(),
        req.task_action.clone(),
        req.user_name.as_deref(),
    );
    info!(
        session = req.session_id.as_deref().unwrap_or("-"),
        intent = %intent,
        text_len = text.len(),
        "Reply request"
    );

    let reply = with_timeout(
        state.generation_timeout,
        state.sessions.respond(
            req.session_id.as_deref(),
            text,
            &task,
            intent,
            ReplyMode::Reply,
        ),
    )
    .await?;

    Ok(Json(ReplyResponse {
        ok: true,
        reply,
        intent,
        task: req.task_title,
        action: req.task_action,
    }))
}

/// `POST /api/ai_nudge`.
pub async fn nudge_handler(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<NudgeRequest>, JsonRejection>,
) -> Result<Json<NudgeResponse>, ApiError> {
    let Json(req) = payload.map_err(reject_body)?;

    let title = req
        .task_title
        .filter(|t| !t.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_NUDGE_TASK.to_string());
    let task = task_context(Some(title), req.task_action, req.user_name.as_deref());
    info!(
        session = req.session_id.as_deref().unwrap_or("-"),
        "Nudge request"
    );

    let reply = with_timeout(
        state.generation_timeout,
        state.sessions.nudge(req.session_id.as_deref(), &task),
    )
    .await?;

    Ok(Json(NudgeResponse { ok: true, reply }))
}

/// `GET /health`.
pub async fn health_handler() -> Json<Value> {
    Json(json!({
        "service": "ai-service",
        "status": "running",
    }))
}

fn reject_body(rejection: JsonRejection) -> ApiError {
    warn!(reason = %rejection.body_text(), "Rejected request body");
    ApiError::bad_request("Expected JSON body")
}

fn task_context(
    title: Option<String>,
    action: Option<String>,
    user_name: Option<&str>,
) -> TaskContext {
    let user_name = user_name
        .map(str::trim)
        .filter(|n| !n.is_empty())
        .unwrap_or(DEFAULT_USER_NAME);
    TaskContext {
        title,
        action: action.filter(|a| !a.trim().is_empty()),
        user_name: Some(user_name.to_string()),
    }
}

/// Bounds a generation call. Elapsed time becomes [`CompanionError::Timeout`].
async fn with_timeout<F>(limit: Duration, call: F) -> CompanionResult<String>
where
    F: Future<Output = CompanionResult<String>>,
{
    match tokio::time::timeout(limit, call).await {
        Ok(result) => result,
        Err(_) => Err(CompanionError::timeout(limit)),
    }
}
