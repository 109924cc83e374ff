//! Detection collaborator boundary.
//!
//! The detection model lives outside this process. `DetectionClient` is the
//! single call the orchestrator makes per analysis; `MockDetectionClient`
//! stands in until a real endpoint is configured, `HttpDetectionClient`
//! talks to one.

pub mod http;
pub mod mock;

pub use http::*;
pub use mock::*;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;

use crate::models::AnalysisResult;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum DetectionError {
    #[error("Detection service timed out after {0:?}")]
    Timeout(Duration),

    #[error("Detection service unreachable: {0}")]
    Transport(String),

    #[error("Detection service returned error (status {status}): {body}")]
    Service { status: u16, body: String },

    #[error("Malformed detection payload: {0}")]
    MalformedPayload(String),
}

impl DetectionError {
    pub fn code(&self) -> &'static str {
        match self {
            Self::Timeout(_) => "DETECTION_TIMEOUT",
            Self::Transport(_) => "DETECTION_UNREACHABLE",
            Self::Service { .. } => "DETECTION_SERVICE_ERROR",
            Self::MalformedPayload(_) => "DETECTION_MALFORMED",
        }
    }
}

/// One image handed to the detection service.
#[derive(Debug, Clone)]
pub struct DetectionImage {
    pub file_name: String,
    pub mime_type: String,
    pub bytes: Arc<[u8]>,
}

/// Options forwarded with every request.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisOptions {
    /// Cell category the model should prioritise.
    pub focus: String,
    /// Minimum confidence (percent) for a detection to be counted.
    pub min_confidence: f64,
}

impl Default for AnalysisOptions {
    fn default() -> Self {
        Self {
            focus: "RBC".into(),
            min_confidence: 50.0,
        }
    }
}

/// Ordered batch of images plus analysis options.
#[derive(Debug, Clone)]
pub struct DetectionRequest {
    pub images: Vec<DetectionImage>,
    pub options: AnalysisOptions,
}

impl DetectionRequest {
    /// Label used for the result when the service does not provide one.
    pub fn primary_label(&self) -> &str {
        self.images
            .first()
            .map(|img| img.file_name.as_str())
            .unwrap_or_default()
    }
}

/// External detection service: one request in, one result (or failure) out.
#[async_trait]
pub trait DetectionClient: Send + Sync {
    /// Human-readable backend name for logs and status.
    fn name(&self) -> &str;

    async fn analyze(&self, request: DetectionRequest) -> Result<AnalysisResult, DetectionError>;
}
