//! Health check endpoint.

use axum::extract::State;
use axum::Json;
use serde::Serialize;

use crate::api::error::ApiError;
use crate::api::types::AppState;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub service: &'static str,
    pub version: &'static str,
    pub detector: String,
    pub workflow: &'static str,
}

/// `GET /health`: liveness plus the current workflow state.
pub async fn check(State(state): State<AppState>) -> Result<Json<HealthResponse>, ApiError> {
    let workflow = state.orchestrator.state()?.name();

    Ok(Json(HealthResponse {
        status: "ok",
        service: crate::config::APP_NAME,
        version: crate::config::APP_VERSION,
        detector: state.orchestrator.detector_name().to_string(),
        workflow,
    }))
}
