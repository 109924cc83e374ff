use std::time::Duration;

use async_trait::async_trait;

use super::{DetectionClient, DetectionError, DetectionRequest};
use crate::models::{AnalysisResult, CellFinding, CellType, Severity};

/// Stand-in detection backend: waits a fixed delay, then returns a fixed payload.
pub struct MockDetectionClient {
    delay: Duration,
    failure: Option<DetectionError>,
}

impl MockDetectionClient {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            failure: None,
        }
    }

    /// Make every call fail with `error` after the delay.
    pub fn failing(mut self, error: DetectionError) -> Self {
        self.failure = Some(error);
        self
    }
}

#[async_trait]
impl DetectionClient for MockDetectionClient {
    fn name(&self) -> &str {
        "mock"
    }

    async fn analyze(&self, request: DetectionRequest) -> Result<AnalysisResult, DetectionError> {
        tracing::debug!(
            images = request.images.len(),
            delay_ms = self.delay.as_millis() as u64,
            "Mock detection started"
        );
        tokio::time::sleep(self.delay).await;

        if let Some(error) = &self.failure {
            return Err(error.clone());
        }
        Ok(fixed_result(request.primary_label()))
    }
}

/// The canned urine sediment result returned by the mock backend.
pub fn fixed_result(source_image_label: &str) -> AnalysisResult {
    AnalysisResult {
        source_image_label: source_image_label.to_string(),
        findings: vec![
            CellFinding {
                cell_type: CellType::Rbc,
                count: 8,
                confidence: 94.5,
                reference_range: "0-2 per hpf".into(),
                severity: Severity::Elevated,
            },
            CellFinding {
                cell_type: CellType::Cast,
                count: 2,
                confidence: 91.2,
                reference_range: "0-1 per lpf".into(),
                severity: Severity::Elevated,
            },
            CellFinding {
                cell_type: CellType::Urothelial,
                count: 15,
                confidence: 88.7,
                reference_range: "0-5 per hpf".into(),
                severity: Severity::Critical,
            },
        ],
        processing_time_seconds: 2.3,
        overall_accuracy_percent: 91.5,
        anomaly_notes: vec![
            "Elevated RBC count suggests possible urinary tract infection or kidney stones".into(),
            "Increased urothelial cells may indicate inflammation or malignancy".into(),
            "Multiple cell types elevated - recommend immediate clinical review".into(),
        ],
        preliminary_findings: vec![
            "Possible urinary tract infection (UTI)".into(),
            "Suspected hematuria - requires clinical correlation".into(),
            "Recommend urology consultation for further evaluation".into(),
        ],
    }
}
