use crate::engine::AnalysisEngine;
use crate::error::EngineError;
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::CorsLayer;

/// Application state shared across HTTP handlers.
#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<AnalysisEngine>,
}

impl AppState {
    pub fn new(engine: Arc<AnalysisEngine>) -> Self {
        AppState { engine }
    }
}

#[derive(Debug, Deserialize)]
pub struct AnalyzeRequest {
    pub email: String,
    #[serde(default)]
    pub share_body: bool,
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: &'static str,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub module: String,
    pub version: String,
}

/// POST /analyze
async fn analyze(State(state): State<AppState>, Json(request): Json<AnalyzeRequest>) -> Response {
    match state.engine.analyze(&request.email, request.share_body).await {
        Ok(result) => (StatusCode::OK, Json(result)).into_response(),
        Err(EngineError::EmptyEmail) => (
            StatusCode::BAD_REQUEST,
            Json(ErrorBody {
                error: "empty_email",
            }),
        )
            .into_response(),
        Err(EngineError::Internal(detail)) => {
            // Log the detail; the caller only ever sees a generic marker
            log::error!("analysis failed: {detail}");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorBody { error: "internal" }),
            )
                .into_response()
        }
    }
}

/// GET /health — liveness for monitoring, no request body.
async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        module: "phishguard".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// Build the application router. CORS is permissive: the submitting UI is an
/// external collaborator served from elsewhere.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/analyze", post(analyze))
        .route("/health", get(health))
        .layer(CorsLayer::permissive())
        .with_state(state)
}
