use std::time::Duration;

use async_trait::async_trait;
use base64::Engine as _;
use serde::Serialize;

use super::{AnalysisOptions, DetectionClient, DetectionError, DetectionRequest};
use crate::models::AnalysisResult;

/// HTTP client for an external detection service.
///
/// `POST {base_url}/v1/analyze` with base64 images in a JSON body; the
/// response body is an `AnalysisResult`.
pub struct HttpDetectionClient {
    base_url: String,
    client: reqwest::Client,
    timeout: Duration,
}

impl HttpDetectionClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, DetectionError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| DetectionError::Transport(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
            timeout,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

/// Request body for /v1/analyze
#[derive(Serialize)]
struct AnalyzeRequestBody<'a> {
    images: Vec<AnalyzeImage<'a>>,
    options: &'a AnalysisOptions,
}

#[derive(Serialize)]
struct AnalyzeImage<'a> {
    file_name: &'a str,
    mime_type: &'a str,
    data: String,
}

#[async_trait]
impl DetectionClient for HttpDetectionClient {
    fn name(&self) -> &str {
        "http"
    }

    async fn analyze(&self, request: DetectionRequest) -> Result<AnalysisResult, DetectionError> {
        let url = format!("{}/v1/analyze", self.base_url);
        let body = AnalyzeRequestBody {
            images: request
                .images
                .iter()
                .map(|img| AnalyzeImage {
                    file_name: &img.file_name,
                    mime_type: &img.mime_type,
                    data: base64::engine::general_purpose::STANDARD.encode(&img.bytes),
                })
                .collect(),
            options: &request.options,
        };

        let response = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    DetectionError::Timeout(self.timeout)
                } else if e.is_connect() {
                    DetectionError::Transport(format!("cannot connect to {}", self.base_url))
                } else {
                    DetectionError::Transport(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(DetectionError::Service {
                status: status.as_u16(),
                body,
            });
        }

        let bytes = response.bytes().await.map_err(|e| {
            if e.is_timeout() {
                DetectionError::Timeout(self.timeout)
            } else {
                DetectionError::Transport(e.to_string())
            }
        })?;

        let mut result: AnalysisResult = serde_json::from_slice(&bytes)
            .map_err(|e| DetectionError::MalformedPayload(e.to_string()))?;
        result.validate().map_err(DetectionError::MalformedPayload)?;

        if result.source_image_label.is_empty() {
            result.source_image_label = request.primary_label().to_string();
        }

        tracing::debug!(
            findings = result.findings.len(),
            processing_time = result.processing_time_seconds,
            "Detection service responded"
        );
        Ok(result)
    }
}
