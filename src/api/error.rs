//! API error types with structured JSON responses.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use crate::orchestrator::OrchestratorError;
use crate::report::ReportError;

/// Structured error response body.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: ErrorDetail,
}

#[derive(Debug, Serialize)]
pub struct ErrorDetail {
    pub code: &'static str,
    pub message: String,
}

/// API-level errors with HTTP status mapping.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error(transparent)]
    Workflow(#[from] OrchestratorError),
    #[error(transparent)]
    Report(#[from] ReportError),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Invalid request: {0}")]
    BadRequest(String),
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ApiError {
    fn parts(&self) -> (StatusCode, &'static str, String) {
        match self {
            ApiError::Workflow(err) => {
                let status = match err {
                    OrchestratorError::EmptyInput => StatusCode::BAD_REQUEST,
                    OrchestratorError::AlreadyRunning | OrchestratorError::Superseded => {
                        StatusCode::CONFLICT
                    }
                    OrchestratorError::AnalysisFailed(_) => StatusCode::BAD_GATEWAY,
                    OrchestratorError::Intake(_) => StatusCode::UNPROCESSABLE_ENTITY,
                    OrchestratorError::LockPoisoned => {
                        return internal(err.to_string());
                    }
                };
                (status, err.code(), err.to_string())
            }
            ApiError::Report(err) => match err {
                ReportError::UnsupportedFormat(_) => {
                    (StatusCode::BAD_REQUEST, "UNSUPPORTED_FORMAT", err.to_string())
                }
                ReportError::Serialization(_) => internal(err.to_string()),
            },
            ApiError::NotFound(detail) => (StatusCode::NOT_FOUND, "NOT_FOUND", detail.clone()),
            ApiError::BadRequest(detail) => {
                (StatusCode::BAD_REQUEST, "BAD_REQUEST", detail.clone())
            }
            ApiError::Internal(detail) => internal(detail.clone()),
        }
    }
}

fn internal(detail: String) -> (StatusCode, &'static str, String) {
    tracing::error!(detail, "API internal error");
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        "INTERNAL",
        "An internal error occurred".to_string(),
    )
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code, message) = self.parts();
        let body = ErrorBody {
            error: ErrorDetail { code, message },
        };
        (status, Json(body)).into_response()
    }
}
