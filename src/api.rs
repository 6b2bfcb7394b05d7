//! REST API for the Money Commander wizard
//!
//! Exposes the session runtime over HTTP for the web frontend.

use axum::{
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{error, info};

use crate::gate::{self, GateCheck};
use crate::message_log::RECENT_WINDOW;
use crate::models::{AgentMessage, ModalContent, Screen, UserProfile};
use crate::report::BATTLE_PLAN_FILENAME;
use crate::runtime::{FieldInput, SessionRuntime};
use crate::state::record_digest;
use crate::wizard::WizardController;

/// =============================
/// Request Models
/// =============================

#[derive(Debug, Deserialize)]
pub struct SelectScreenRequest {
    pub screen: Screen,
}

#[derive(Debug, Deserialize)]
pub struct ResetRequest {
    #[serde(default)]
    pub confirm: bool,
}

/// =============================
/// Response Wrapper
/// =============================

#[derive(Debug, Serialize, Deserialize)]
pub struct ApiResponse {
    pub success: bool,
    pub data: Option<serde_json::Value>,
    pub error: Option<String>,
    pub timestamp: String,
}

impl ApiResponse {
    pub fn success<T: Serialize>(data: T) -> Self {
        Self {
            success: true,
            data: serde_json::to_value(data).ok(),
            error: None,
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }

    pub fn error(message: String) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message),
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}

/// =============================
/// Session View
/// =============================

#[derive(Debug, Serialize)]
pub struct SipBounds {
    pub min: u64,
    pub max: u64,
}

/// Everything the frontend renders for the current screen
#[derive(Debug, Serialize)]
pub struct SessionView {
    pub session_id: String,
    pub current_screen: Screen,
    pub screen_title: &'static str,
    pub power_level: u8,
    pub profile: UserProfile,
    pub surplus: i64,
    pub projected_value: i64,
    pub sip_bounds: SipBounds,
    pub can_continue: bool,
    pub gates: Vec<GateCheck>,
    pub loading: bool,
    pub modal: Option<ModalContent>,
    pub recent_messages: Vec<AgentMessage>,
    pub snapshot_hash: String,
}

impl SessionView {
    pub fn from_controller(controller: &WizardController, loading: bool) -> Self {
        let state = controller.state();
        let (min, max) = controller.sip_bounds();

        Self {
            session_id: state.session_id.clone(),
            current_screen: state.current_screen,
            screen_title: state.current_screen.title(),
            power_level: state.power_level,
            profile: state.profile.clone(),
            surplus: controller.surplus(),
            projected_value: controller.projected_value(),
            sip_bounds: SipBounds { min, max },
            can_continue: controller.can_continue(),
            gates: gate::evaluate_all(&state.profile),
            loading,
            modal: controller.modal().cloned(),
            recent_messages: controller.log().recent(RECENT_WINDOW).cloned().collect(),
            snapshot_hash: record_digest(state),
        }
    }
}

#[derive(Debug, Serialize)]
struct ActionResult {
    changed: bool,
    session: SessionView,
}

/// =============================
/// API State
/// =============================

#[derive(Clone)]
pub struct ApiState {
    pub runtime: Arc<SessionRuntime>,
}

impl ApiState {
    async fn snapshot(&self) -> SessionView {
        let loading = self.runtime.is_loading();
        self.runtime
            .view(|controller| SessionView::from_controller(controller, loading))
            .await
    }

    async fn respond(&self, outcome: crate::Result<bool>) -> (StatusCode, Json<ApiResponse>) {
        match outcome {
            Ok(changed) => {
                let session = self.snapshot().await;
                (
                    StatusCode::OK,
                    Json(ApiResponse::success(ActionResult { changed, session })),
                )
            }
            Err(e) => {
                error!("Session action failed: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(ApiResponse::error(format!("Session action failed: {}", e))),
                )
            }
        }
    }
}

/// =============================
/// Health Endpoint
/// =============================

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "healthy",
        "timestamp": chrono::Utc::now().to_rfc3339()
    }))
}

/// =============================
/// Session Endpoints
/// =============================

async fn get_session(State(state): State<ApiState>) -> (StatusCode, Json<ApiResponse>) {
    (StatusCode::OK, Json(ApiResponse::success(state.snapshot().await)))
}

async fn start(State(state): State<ApiState>) -> (StatusCode, Json<ApiResponse>) {
    let outcome = state.runtime.start().await;
    state.respond(outcome).await
}

async fn continue_screen(State(state): State<ApiState>) -> (StatusCode, Json<ApiResponse>) {
    let outcome = state
        .runtime
        .continue_screen()
        .await
        .map(|next| next.is_some());
    state.respond(outcome).await
}

async fn back(State(state): State<ApiState>) -> (StatusCode, Json<ApiResponse>) {
    let outcome = state.runtime.back().await;
    state.respond(outcome).await
}

async fn select_screen(
    State(state): State<ApiState>,
    Json(req): Json<SelectScreenRequest>,
) -> (StatusCode, Json<ApiResponse>) {
    let outcome = state.runtime.select_screen(req.screen).await;
    state.respond(outcome).await
}

async fn apply_input(
    State(state): State<ApiState>,
    Json(input): Json<FieldInput>,
) -> (StatusCode, Json<ApiResponse>) {
    let outcome = state.runtime.apply_input(input).await.map(|_| true);
    state.respond(outcome).await
}

async fn dismiss_modal(State(state): State<ApiState>) -> (StatusCode, Json<ApiResponse>) {
    state.runtime.dismiss_modal().await;
    state.respond(Ok(true)).await
}

async fn reset(
    State(state): State<ApiState>,
    Json(req): Json<ResetRequest>,
) -> (StatusCode, Json<ApiResponse>) {
    if !req.confirm {
        return (
            StatusCode::BAD_REQUEST,
            Json(ApiResponse::error(
                "Reset discards all progress; send confirm: true".into(),
            )),
        );
    }

    let outcome = state.runtime.reset(true).await;
    state.respond(outcome).await
}

async fn battle_plan(State(state): State<ApiState>) -> Response {
    let today = chrono::Local::now().date_naive();
    let plan = state.runtime.battle_plan(today).await;

    (
        [
            (header::CONTENT_TYPE, "text/plain; charset=utf-8".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", BATTLE_PLAN_FILENAME),
            ),
        ],
        plan,
    )
        .into_response()
}

/// =============================
/// Router
/// =============================

pub fn create_router(runtime: Arc<SessionRuntime>) -> Router {
    let state = ApiState { runtime };

    Router::new()
        .route("/health", get(health))
        .route("/api/session", get(get_session))
        .route("/api/session/start", post(start))
        .route("/api/session/continue", post(continue_screen))
        .route("/api/session/back", post(back))
        .route("/api/session/select", post(select_screen))
        .route("/api/session/input", post(apply_input))
        .route("/api/session/modal/dismiss", post(dismiss_modal))
        .route("/api/session/reset", post(reset))
        .route("/api/session/battle-plan", get(battle_plan))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

/// =============================
/// Server Startup
/// =============================

pub async fn start_server(
    runtime: Arc<SessionRuntime>,
    port: u16,
) -> std::result::Result<(), Box<dyn std::error::Error>> {
    let router = create_router(runtime);

    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", port)).await?;

    info!("API Server listening on http://0.0.0.0:{}", port);
    info!("Local: http://127.0.0.1:{}", port);

    axum::serve(listener, router).await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::MockAgentGateway;
    use crate::state::InMemorySessionStore;
    use crate::wizard::WizardConfig;
    use axum::body::Body;
    use axum::http::Request;
    use serde_json::{json, Value};
    use tower::ServiceExt;

    async fn app() -> Router {
        let runtime = SessionRuntime::open(
            Arc::new(InMemorySessionStore::new()),
            Arc::new(MockAgentGateway::new()),
            WizardConfig::default(),
        )
        .await
        .unwrap();
        create_router(Arc::new(runtime))
    }

    async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let request = Request::builder()
            .method(method)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(match body {
                Some(body) => Body::from(body.to_string()),
                None => Body::empty(),
            })
            .unwrap();

        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, json)
    }

    #[tokio::test]
    async fn test_health() {
        let app = app().await;
        let (status, body) = send(&app, "GET", "/health", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "healthy");
    }

    #[tokio::test]
    async fn test_session_round_trip() {
        let app = app().await;

        let (status, body) = send(&app, "GET", "/api/session", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], true);
        assert_eq!(body["data"]["current_screen"], 0);
        assert_eq!(body["data"]["power_level"], 0);
        let first_hash = body["data"]["snapshot_hash"].as_str().unwrap().to_string();

        let (_, body) = send(&app, "POST", "/api/session/start", None).await;
        assert_eq!(body["data"]["changed"], true);
        assert_eq!(body["data"]["session"]["current_screen"], 1);
        assert_ne!(body["data"]["session"]["snapshot_hash"], first_hash.as_str());

        // Gate blocks until income and bills are in
        let (_, body) = send(&app, "POST", "/api/session/continue", None).await;
        assert_eq!(body["data"]["changed"], false);

        send(
            &app,
            "POST",
            "/api/session/input",
            Some(json!({ "field": "income", "value": "80000" })),
        )
        .await;
        let (status, body) = send(
            &app,
            "POST",
            "/api/session/input",
            Some(json!({ "field": "fixed_bills", "value": 45000 })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["session"]["surplus"], 35000);
        assert_eq!(body["data"]["session"]["can_continue"], true);

        let (_, body) = send(&app, "POST", "/api/session/continue", None).await;
        assert_eq!(body["data"]["changed"], true);
        assert_eq!(body["data"]["session"]["current_screen"], 2);
        assert_eq!(body["data"]["session"]["power_level"], 25);

        let (_, body) = send(&app, "POST", "/api/session/back", None).await;
        assert_eq!(body["data"]["session"]["current_screen"], 1);

        let (_, body) = send(&app, "POST", "/api/session/select", Some(json!({ "screen": 2 }))).await;
        assert_eq!(body["data"]["changed"], true);
        assert_eq!(body["data"]["session"]["current_screen"], 2);
    }

    #[tokio::test]
    async fn test_reset_requires_confirmation() {
        let app = app().await;
        send(&app, "POST", "/api/session/start", None).await;

        let (status, body) = send(&app, "POST", "/api/session/reset", Some(json!({}))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["success"], false);

        let (status, body) = send(
            &app,
            "POST",
            "/api/session/reset",
            Some(json!({ "confirm": true })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["session"]["current_screen"], 0);
    }

    #[tokio::test]
    async fn test_unknown_input_field_is_rejected() {
        let app = app().await;
        let (status, _) = send(
            &app,
            "POST",
            "/api/session/input",
            Some(json!({ "field": "salary", "value": 1 })),
        )
        .await;
        assert!(status.is_client_error());
    }

    #[tokio::test]
    async fn test_battle_plan_download() {
        let app = app().await;
        let request = Request::builder()
            .uri("/api/session/battle-plan")
            .body(Body::empty())
            .unwrap();

        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let disposition = response
            .headers()
            .get(header::CONTENT_DISPOSITION)
            .unwrap()
            .to_str()
            .unwrap()
            .to_string();
        assert!(disposition.contains(BATTLE_PLAN_FILENAME));

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let text = String::from_utf8(bytes.to_vec()).unwrap();
        assert!(text.starts_with("MONEY COMMANDER - FINANCIAL BATTLE PLAN"));
    }
}
