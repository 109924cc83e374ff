//! Image staging endpoints and preview serving.

use axum::extract::{Multipart, Path, State};
use axum::http::header;
use axum::response::{IntoResponse, Response};
use axum::Json;
use uuid::Uuid;

use crate::api::error::ApiError;
use crate::api::types::AppState;
use crate::intake::{CandidateFile, StageOutcome, StagedImageInfo, UnstageOutcome};

/// Multipart field carrying the selected images.
const FILES_FIELD: &str = "files";

/// `GET /api/images`: currently staged images in staging order.
pub async fn list(State(state): State<AppState>) -> Result<Json<Vec<StagedImageInfo>>, ApiError> {
    Ok(Json(state.orchestrator.staged()?))
}

/// `POST /api/images`: stage a batch. Per-file rejections come back in
/// the body; only a batch over the image limit fails the request.
///
/// Each file is streamed and kept only up to the size limit, so an
/// oversized file is still counted and reported without being buffered.
pub async fn upload(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<StageOutcome>, ApiError> {
    let max_file_size = state.orchestrator.policy()?.max_file_size;
    let mut candidates = Vec::new();

    loop {
        let mut field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(e) => {
                tracing::warn!("Failed to read multipart body: {e}");
                return Err(ApiError::BadRequest("Malformed multipart body".into()));
            }
        };
        if field.name() != Some(FILES_FIELD) {
            continue;
        }
        let file_name = field.file_name().unwrap_or("image").to_string();
        let declared = field.content_type().map(str::to_string);

        let mut bytes = Vec::new();
        let mut size_bytes: u64 = 0;
        loop {
            let chunk = match field.chunk().await {
                Ok(Some(chunk)) => chunk,
                Ok(None) => break,
                Err(e) => {
                    tracing::warn!(file = %file_name, "Failed to read upload bytes: {e}");
                    return Err(ApiError::BadRequest(format!(
                        "Failed to read file data for {file_name}"
                    )));
                }
            };
            size_bytes += chunk.len() as u64;
            let room = max_file_size.saturating_sub(bytes.len() as u64);
            let keep = usize::try_from(room).unwrap_or(usize::MAX).min(chunk.len());
            bytes.extend_from_slice(&chunk[..keep]);
        }

        let candidate = if size_bytes > bytes.len() as u64 {
            tracing::debug!(file = %file_name, size_bytes, "Upload exceeds size limit, content dropped");
            CandidateFile::truncated(file_name, declared.as_deref(), bytes, size_bytes)
        } else {
            CandidateFile::new(file_name, declared.as_deref(), bytes)
        };
        candidates.push(candidate);
    }

    if candidates.is_empty() {
        return Err(ApiError::BadRequest(format!(
            "No files provided (expected multipart field \"{FILES_FIELD}\")"
        )));
    }

    Ok(Json(state.orchestrator.stage(candidates)?))
}

/// `DELETE /api/images/:id`: unstage one image. Unknown ids are a no-op.
pub async fn remove(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<UnstageOutcome>, ApiError> {
    let id = parse_id(&id)?;
    Ok(Json(state.orchestrator.unstage(&id)?))
}

/// `GET /api/previews/:id`: image bytes for a live preview handle.
pub async fn preview(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Response, ApiError> {
    let id = parse_id(&id)?;
    let resource = state
        .previews
        .get(&id)
        .ok_or_else(|| ApiError::NotFound(format!("No preview for image {id}")))?;

    Ok((
        [(header::CONTENT_TYPE, resource.mime_type)],
        resource.bytes.to_vec(),
    )
        .into_response())
}

fn parse_id(raw: &str) -> Result<Uuid, ApiError> {
    Uuid::parse_str(raw).map_err(|_| ApiError::BadRequest(format!("Invalid image id: {raw}")))
}
