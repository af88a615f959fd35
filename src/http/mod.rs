use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::json;

use crate::approval::ApprovalCoordinator;
use crate::decision::ApprovalOutcome;
use crate::error::{GatehookError, Result};

/// The remote-control surface an approver drives with curl or the
/// `gatehook pending`/`approve`/`deny` subcommands. Localhost only.
pub fn router(coordinator: Arc<ApprovalCoordinator>) -> Router {
    Router::new()
        .route("/pending", get(handle_pending))
        .route("/approve", post(handle_approve))
        .route("/deny", post(handle_deny))
        .route("/health", get(handle_health))
        .with_state(coordinator)
}

/// Bind `localhost:port` and serve until the task is dropped.
pub async fn serve(coordinator: Arc<ApprovalCoordinator>, port: u16) -> Result<()> {
    let listener = tokio::net::TcpListener::bind(("127.0.0.1", port))
        .await
        .map_err(|e| GatehookError::Http {
            reason: format!("failed to bind localhost:{port}: {e}"),
        })?;
    eprintln!("gatehook: control surface listening on http://localhost:{port}");
    serve_on(listener, coordinator).await
}

/// Serve on an already-bound listener (tests bind port 0).
pub async fn serve_on(
    listener: tokio::net::TcpListener,
    coordinator: Arc<ApprovalCoordinator>,
) -> Result<()> {
    axum::serve(listener, router(coordinator))
        .await
        .map_err(|e| GatehookError::Http {
            reason: format!("server error: {e}"),
        })
}

#[derive(Debug, Deserialize)]
struct DecisionBody {
    request_id: Option<String>,
    /// Optional replacement for the tool's arguments on approval.
    #[serde(default)]
    updated_input: Option<serde_json::Value>,
    /// Optional denial reason.
    #[serde(default)]
    message: Option<String>,
}

async fn handle_health() -> Json<serde_json::Value> {
    Json(json!({"status": "ok"}))
}

async fn handle_pending(
    State(coordinator): State<Arc<ApprovalCoordinator>>,
) -> Json<serde_json::Value> {
    Json(json!({"pending": coordinator.list_pending()}))
}

async fn handle_approve(
    State(coordinator): State<Arc<ApprovalCoordinator>>,
    Json(body): Json<DecisionBody>,
) -> Response {
    let Some(request_id) = body.request_id else {
        return missing_request_id();
    };
    match coordinator.approve(&request_id, body.updated_input) {
        Ok(outcome) => outcome_response(outcome),
        Err(e) => error_response(e),
    }
}

async fn handle_deny(
    State(coordinator): State<Arc<ApprovalCoordinator>>,
    Json(body): Json<DecisionBody>,
) -> Response {
    let Some(request_id) = body.request_id else {
        return missing_request_id();
    };
    match coordinator.deny(&request_id, body.message) {
        Ok(outcome) => outcome_response(outcome),
        Err(e) => error_response(e),
    }
}

fn missing_request_id() -> Response {
    (
        StatusCode::BAD_REQUEST,
        Json(json!({"error": "Missing request_id"})),
    )
        .into_response()
}

fn outcome_response(outcome: ApprovalOutcome) -> Response {
    (
        StatusCode::OK,
        Json(json!({"status": outcome.to_string()})),
    )
        .into_response()
}

fn error_response(error: GatehookError) -> Response {
    match error {
        GatehookError::NotFound { .. } => (
            StatusCode::NOT_FOUND,
            Json(json!({"error": "Request not found or already processed"})),
        )
            .into_response(),
        other => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({"error": other.to_string()})),
        )
            .into_response(),
    }
}
