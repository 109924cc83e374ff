//! Shared state for the HTTP surface.

use std::sync::Arc;

use crate::intake::PreviewRegistry;
use crate::orchestrator::AnalysisOrchestrator;

/// Shared context for every route. Cheap to clone.
#[derive(Clone)]
pub struct AppState {
    pub orchestrator: Arc<AnalysisOrchestrator>,
    pub previews: Arc<PreviewRegistry>,
    /// Patient identifier used when a report request names none.
    pub patient_id: Arc<str>,
}

impl AppState {
    pub fn new(
        orchestrator: Arc<AnalysisOrchestrator>,
        previews: Arc<PreviewRegistry>,
        patient_id: &str,
    ) -> Self {
        Self {
            orchestrator,
            previews,
            patient_id: Arc::from(patient_id),
        }
    }
}
