//! Report download.

use axum::extract::{Query, State};
use axum::http::header;
use axum::response::{IntoResponse, Response};
use serde::Deserialize;

use crate::api::error::ApiError;
use crate::api::types::AppState;
use crate::report::{assemble, export, ReportCase, ReportFormat};

#[derive(Debug, Deserialize)]
pub struct ReportQuery {
    pub format: Option<String>,
    pub patient_id: Option<String>,
}

/// `GET /api/report?format=docx|xml`: export the current result.
///
/// Format defaults to `docx`. The report case is derived from the
/// completion time; `patient_id` overrides the configured patient.
pub async fn download(
    State(state): State<AppState>,
    Query(query): Query<ReportQuery>,
) -> Result<Response, ApiError> {
    let format: ReportFormat = query.format.as_deref().unwrap_or("docx").parse()?;

    let completed = state
        .orchestrator
        .current_result()?
        .ok_or_else(|| ApiError::NotFound("No completed analysis to report".into()))?;

    let patient_id = query
        .patient_id
        .as_deref()
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .unwrap_or(&*state.patient_id);
    let case = ReportCase::for_completion(patient_id, completed.completed_at);
    let exported = export(&assemble(&case, &completed.result), format)?;

    let disposition = format!("attachment; filename=\"{}\"", exported.file_name);
    Ok((
        [
            (header::CONTENT_TYPE, exported.content_type.to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        exported.bytes,
    )
        .into_response())
}
