//! REST endpoints for screening sessions.

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Path, State},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde::Deserialize;
use tower_http::cors::CorsLayer;
use tracing::warn;
use uuid::Uuid;

use super::session::ScreeningService;
use crate::error::{Error, ExportError, SessionError};

/// Shared state for screening routes.
#[derive(Clone)]
pub struct ScreeningRouteState {
    pub service: Arc<ScreeningService>,
}

/// Build the screening REST routes.
pub fn screening_routes(service: Arc<ScreeningService>) -> Router {
    let state = ScreeningRouteState { service };

    Router::new()
        .route("/health", get(health))
        .route("/api/sessions", post(open_session))
        .route("/api/sessions/{id}", get(get_session).delete(close_session))
        .route("/api/sessions/{id}/turns", post(submit_turn))
        .route("/api/sessions/{id}/summary", get(get_summary))
        .route("/api/sessions/{id}/report", get(get_report))
        .route("/api/sessions/{id}/restart", post(restart_session))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn health() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "service": "talentbot"
    }))
}

fn error_response(status: StatusCode, message: impl Into<String>) -> Response {
    (status, Json(serde_json::json!({"error": message.into()}))).into_response()
}

fn parse_session_id(raw: &str) -> Result<Uuid, Response> {
    Uuid::parse_str(raw).map_err(|_| error_response(StatusCode::BAD_REQUEST, "Invalid session ID"))
}

fn session_error(err: SessionError) -> Response {
    let status = match err {
        SessionError::NotFound { .. } => StatusCode::NOT_FOUND,
        SessionError::Incomplete { .. } => StatusCode::CONFLICT,
    };
    error_response(status, err.to_string())
}

async fn open_session(State(state): State<ScreeningRouteState>) -> impl IntoResponse {
    let opened = state.service.initialize_conversation().await;
    (StatusCode::CREATED, Json(opened))
}

async fn get_session(
    State(state): State<ScreeningRouteState>,
    Path(id): Path<String>,
) -> Response {
    let id = match parse_session_id(&id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };
    match state.service.snapshot(id).await {
        Ok(snapshot) => Json(snapshot).into_response(),
        Err(e) => session_error(e),
    }
}

#[derive(Deserialize)]
struct TurnRequest {
    message: String,
}

async fn submit_turn(
    State(state): State<ScreeningRouteState>,
    Path(id): Path<String>,
    Json(body): Json<TurnRequest>,
) -> Response {
    let id = match parse_session_id(&id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };
    match state.service.submit_turn(id, &body.message).await {
        Ok(outcome) => Json(outcome).into_response(),
        Err(e) => session_error(e),
    }
}

async fn get_summary(
    State(state): State<ScreeningRouteState>,
    Path(id): Path<String>,
) -> Response {
    let id = match parse_session_id(&id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };
    match state.service.summarize(id).await {
        Ok(summary) => Json(summary).into_response(),
        Err(e) => session_error(e),
    }
}

async fn get_report(
    State(state): State<ScreeningRouteState>,
    Path(id): Path<String>,
) -> Response {
    let id = match parse_session_id(&id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };
    match state.service.export_report(id).await {
        Ok(doc) => (
            [
                (header::CONTENT_TYPE, doc.format.mime_type().to_string()),
                (
                    header::CONTENT_DISPOSITION,
                    format!("attachment; filename=\"{}\"", doc.file_name()),
                ),
            ],
            doc.bytes,
        )
            .into_response(),
        Err(Error::Session(e)) => session_error(e),
        Err(Error::Export(ExportError::ServiceUnavailable(msg))) => {
            error_response(StatusCode::SERVICE_UNAVAILABLE, msg)
        }
        Err(e) => {
            warn!(session_id = %id, error = %e, "Report export failed");
            error_response(StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
        }
    }
}

async fn restart_session(
    State(state): State<ScreeningRouteState>,
    Path(id): Path<String>,
) -> Response {
    let id = match parse_session_id(&id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };
    match state.service.restart(id).await {
        Ok(opened) => Json(opened).into_response(),
        Err(e) => session_error(e),
    }
}

async fn close_session(
    State(state): State<ScreeningRouteState>,
    Path(id): Path<String>,
) -> Response {
    let id = match parse_session_id(&id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };
    match state.service.remove(id).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => session_error(e),
    }
}
