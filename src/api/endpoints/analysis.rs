//! Analysis trigger, status and reset.

use axum::extract::State;
use axum::Json;
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::api::error::ApiError;
use crate::api::types::AppState;
use crate::orchestrator::WorkflowSnapshot;
use crate::presentation::{render, ResultView};

#[derive(Serialize)]
pub struct AnalysisResponse {
    pub state: &'static str,
    pub completed_at: DateTime<Utc>,
    pub view: ResultView,
}

/// `POST /api/analysis`: run one analysis over the staged images.
///
/// The analysis runs on its own task, so a client that disconnects does not
/// cancel the detection call; the response waits for it to finish.
pub async fn start(State(state): State<AppState>) -> Result<Json<AnalysisResponse>, ApiError> {
    let orchestrator = state.orchestrator.clone();
    let completed = tokio::spawn(async move { orchestrator.start_analysis().await })
        .await
        .map_err(|e| ApiError::Internal(format!("analysis task failed: {e}")))??;

    Ok(Json(AnalysisResponse {
        state: "complete",
        completed_at: completed.completed_at,
        view: render(&completed.result),
    }))
}

/// `GET /api/analysis`: current workflow snapshot.
pub async fn status(State(state): State<AppState>) -> Result<Json<WorkflowSnapshot>, ApiError> {
    Ok(Json(state.orchestrator.snapshot()?))
}

/// `DELETE /api/analysis`: discard the result and every staged image.
pub async fn reset(State(state): State<AppState>) -> Result<Json<WorkflowSnapshot>, ApiError> {
    state.orchestrator.reset()?;
    Ok(Json(state.orchestrator.snapshot()?))
}
