#![allow(clippy::unwrap_used, clippy::expect_used)]

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use companion_agent::{AgentSettings, GenerationBackend};
use companion_core::{CompanionError, CompanionResult};
use companion_gateway::{AppState, AuthConfig, GatewayServer};
use companion_session::{SessionKeyPolicy, SessionRegistry};
use parking_lot::Mutex;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceExt;

/// Answers every prompt with a fixed reply and records the prompts.
struct RecordingBackend {
    reply: CompanionResult<String>,
    delay: Duration,
    prompts: Mutex<Vec<String>>,
}

impl RecordingBackend {
    fn replying(reply: &str) -> Arc<Self> {
        Arc::new(Self {
            reply: Ok(reply.to_string()),
            delay: Duration::ZERO,
            prompts: Mutex::new(Vec::new()),
        })
    }

    fn failing() -> Arc<Self> {
        Arc::new(Self {
            reply: Err(CompanionError::GenerationUnavailable("503".into())),
            delay: Duration::ZERO,
            prompts: Mutex::new(Vec::new()),
        })
    }

    fn slow(delay: Duration) -> Arc<Self> {
        Arc::new(Self {
            reply: Ok("late".to_string()),
            delay,
            prompts: Mutex::new(Vec::new()),
        })
    }

    fn last_prompt(&self) -> String {
        self.prompts.lock().last().cloned().unwrap_or_default()
    }
}

#[async_trait]
impl GenerationBackend for RecordingBackend {
    async fn generate(&self, prompt: &str, _model: &str) -> CompanionResult<String> {
        self.prompts.lock().push(prompt.to_string());
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        match &self.reply {
            Ok(text) => Ok(text.clone()),
            Err(e) => Err(CompanionError::GenerationUnavailable(e.to_string())),
        }
    }
}

fn registry(backend: Arc<dyn GenerationBackend>) -> Arc<SessionRegistry> {
    Arc::new(SessionRegistry::new(backend, AgentSettings::default()))
}

fn app(backend: Arc<dyn GenerationBackend>) -> Router {
    GatewayServer::build(AppState::new(registry(backend)))
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn send(app: Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, body)
}

#[tokio::test]
async fn test_health() {
    let request = Request::builder().uri("/health").body(Body::empty()).unwrap();
    let (status, body) = send(app(RecordingBackend::replying("hi")), request).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"service": "ai-service", "status": "running"}));
}

#[tokio::test]
async fn test_reply_success() {
    let backend = RecordingBackend::replying("  Let's start with the toothpaste.  ");
    let request = post_json(
        "/api/ai_reply",
        json!({
            "text": "I'm so tired",
            "sessionId": "s1",
            "taskTitle": "Brush teeth",
            "taskAction": "Open the toothpaste"
        }),
    );
    let (status, body) = send(app(backend.clone()), request).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["ok"], true);
    assert_eq!(body["reply"], "Let's start with the toothpaste.");
    assert_eq!(body["intent"], "tired");
    assert_eq!(body["task"], "Brush teeth");
    assert_eq!(body["action"], "Open the toothpaste");

    let prompt = backend.last_prompt();
    assert!(prompt.contains("Current task: Brush teeth"));
    assert!(prompt.contains("Current step: Open the toothpaste"));
    assert!(prompt.contains("User name: Friend"));
    assert!(prompt.contains("USER: I'm so tired"));
}

#[tokio::test]
async fn test_reply_missing_title_echoes_null() {
    let request = post_json("/api/ai_reply", json!({"text": "I'm not sure", "userName": "Sam"}));
    let backend = RecordingBackend::replying("ok");
    let (status, body) = send(app(backend.clone()), request).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["intent"], "confused");
    assert!(body["task"].is_null());
    assert!(body["action"].is_null());
    let prompt = backend.last_prompt();
    assert!(prompt.contains("Current task: your task"));
    assert!(prompt.contains("Current step: unknown"));
    assert!(prompt.contains("User name: Sam"));
}

#[tokio::test]
async fn test_reply_blank_text_is_bad_request() {
    let backend = RecordingBackend::replying("unused");
    let request = post_json("/api/ai_reply", json!({"text": "   ", "sessionId": "s1"}));
    let (status, body) = send(app(backend.clone()), request).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({"ok": false, "error": "Missing 'text'"}));
    assert!(backend.prompts.lock().is_empty());
}

#[tokio::test]
async fn test_non_json_body_is_bad_request() {
    let request = Request::builder()
        .method("POST")
        .uri("/api/ai_reply")
        .header(header::CONTENT_TYPE, "text/plain")
        .body(Body::from("hello"))
        .unwrap();
    let (status, body) = send(app(RecordingBackend::replying("x")), request).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({"ok": false, "error": "Expected JSON body"}));

    let request = Request::builder()
        .method("POST")
        .uri("/api/ai_nudge")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{not json"))
        .unwrap();
    let (status, body) = send(app(RecordingBackend::replying("x")), request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Expected JSON body");
}

#[tokio::test]
async fn test_nudge_defaults_task_title() {
    let backend = RecordingBackend::replying("Pick up the brush.");
    let request = post_json("/api/ai_nudge", json!({"sessionId": "n1"}));
    let (status, body) = send(app(backend.clone()), request).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"ok": true, "reply": "Pick up the brush."}));
    let prompt = backend.last_prompt();
    assert!(prompt.contains("Current task: Task"));
    assert!(prompt.contains("Intent: nudge"));
    assert!(prompt.contains("Mode: nudge"));
}

#[tokio::test]
async fn test_session_history_spans_requests() {
    let backend = RecordingBackend::replying("Next, rinse.");
    let sessions = registry(backend.clone());
    let router = GatewayServer::build(AppState::new(sessions.clone()));

    let first = post_json(
        "/api/ai_reply",
        json!({"text": "hello", "sessionId": "s9", "taskTitle": "Wash hands"}),
    );
    send(router.clone(), first).await;
    let second = post_json("/api/ai_reply", json!({"text": "done", "sessionId": "s9"}));
    send(router, second).await;

    let prompt = backend.last_prompt();
    assert!(prompt.contains("Current task: Wash hands"));
    assert!(prompt.contains("USER: hello\nASSISTANT: Next, rinse.\nUSER: done"));

    let handle = sessions.get_or_create(Some("s9"), None).await.unwrap();
    assert_eq!(handle.lock().await.history().len(), 4);
}

#[tokio::test]
async fn test_backend_failure_is_service_unavailable() {
    let request = post_json("/api/ai_reply", json!({"text": "hello"}));
    let (status, body) = send(app(RecordingBackend::failing()), request).await;

    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(
        body,
        json!({"ok": false, "error": "The assistant is not reachable right now."})
    );
}

#[tokio::test(start_paused = true)]
async fn test_generation_timeout_is_service_unavailable() {
    let state = AppState::new(registry(RecordingBackend::slow(Duration::from_secs(60))))
        .with_generation_timeout(Duration::from_secs(5));
    let request = post_json("/api/ai_nudge", json!({"taskTitle": "Cook"}));
    let (status, body) = send(GatewayServer::build(state), request).await;

    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["ok"], false);
}

#[tokio::test]
async fn test_reject_policy_requires_session_id() {
    let sessions = Arc::new(
        SessionRegistry::new(RecordingBackend::replying("x"), AgentSettings::default())
            .with_key_policy(SessionKeyPolicy::Reject),
    );
    let router = GatewayServer::build(AppState::new(sessions));
    let request = post_json("/api/ai_reply", json!({"text": "hello"}));
    let (status, body) = send(router, request).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["ok"], false);
}

#[tokio::test]
async fn test_auth_guards_api_but_not_health() {
    let auth = AuthConfig::new(vec!["secret".to_string()]);
    let router = GatewayServer::build_with_auth(
        AppState::new(registry(RecordingBackend::replying("ok"))),
        auth,
    );

    let (status, body) = send(
        router.clone(),
        post_json("/api/ai_reply", json!({"text": "hello"})),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "API key required");

    let mut wrong = post_json("/api/ai_reply", json!({"text": "hello"}));
    wrong
        .headers_mut()
        .insert(header::AUTHORIZATION, "Bearer nope".parse().unwrap());
    let (status, body) = send(router.clone(), wrong).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "Invalid API key");

    let mut good = post_json("/api/ai_reply", json!({"text": "hello"}));
    good.headers_mut()
        .insert(header::AUTHORIZATION, "Bearer secret".parse().unwrap());
    let (status, _) = send(router.clone(), good).await;
    assert_eq!(status, StatusCode::OK);

    let via_query = post_json("/api/ai_nudge?api_key=secret", json!({}));
    let (status, _) = send(router.clone(), via_query).await;
    assert_eq!(status, StatusCode::OK);

    let health = Request::builder().uri("/health").body(Body::empty()).unwrap();
    let (status, _) = send(router, health).await;
    assert_eq!(status, StatusCode::OK);
}
