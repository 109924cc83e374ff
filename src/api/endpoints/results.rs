//! Presented result of the completed analysis.

use axum::extract::State;
use axum::Json;

use crate::api::error::ApiError;
use crate::api::types::AppState;
use crate::presentation::{render, ResultView};

/// `GET /api/results`: 404 until an analysis completes.
pub async fn current(State(state): State<AppState>) -> Result<Json<ResultView>, ApiError> {
    let completed = state
        .orchestrator
        .current_result()?
        .ok_or_else(|| ApiError::NotFound("No completed analysis".into()))?;
    Ok(Json(render(&completed.result)))
}
