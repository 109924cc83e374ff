//! Analysis workflow: `Idle -> Analyzing -> Complete`, `Complete -> Idle` on reset.
//!
//! The orchestrator owns the image intake and the single current result.
//! Exactly one detection call is issued per analysis; the lock is never held
//! across that call. A generation counter identifies the in-flight request so
//! a reset during analysis discards the late result.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

use crate::detection::{
    AnalysisOptions, DetectionClient, DetectionError, DetectionImage, DetectionRequest,
};
use crate::intake::{
    CandidateFile, ImageIntake, IntakeError, IntakePolicy, PreviewRegistry, StageOutcome,
    StagedImageInfo, UnstageOutcome,
};
use crate::models::AnalysisResult;

#[derive(Error, Debug)]
pub enum OrchestratorError {
    #[error("No images staged: upload at least one microscopy image to analyze")]
    EmptyInput,

    #[error("An analysis is already running")]
    AlreadyRunning,

    #[error("Analysis failed: {0}")]
    AnalysisFailed(#[from] DetectionError),

    #[error("Analysis was reset before the result arrived; result discarded")]
    Superseded,

    #[error(transparent)]
    Intake(#[from] IntakeError),

    #[error("Internal lock poisoned")]
    LockPoisoned,
}

impl OrchestratorError {
    pub fn code(&self) -> &'static str {
        match self {
            Self::EmptyInput => "EMPTY_INPUT",
            Self::AlreadyRunning => "ALREADY_RUNNING",
            Self::AnalysisFailed(_) => "ANALYSIS_FAILED",
            Self::Superseded => "SUPERSEDED",
            Self::Intake(e) => e.code(),
            Self::LockPoisoned => "INTERNAL",
        }
    }
}

/// A finished analysis. The result is immutable and shared.
#[derive(Debug, Clone)]
pub struct CompletedAnalysis {
    pub result: Arc<AnalysisResult>,
    pub completed_at: DateTime<Utc>,
}

/// The one workflow value. No separate flags, so no impossible combinations.
#[derive(Debug, Clone)]
pub enum WorkflowState {
    Idle,
    Analyzing {
        generation: u64,
        started_at: DateTime<Utc>,
    },
    Complete(CompletedAnalysis),
}

impl WorkflowState {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Analyzing { .. } => "analyzing",
            Self::Complete(_) => "complete",
        }
    }

    pub fn is_analyzing(&self) -> bool {
        matches!(self, Self::Analyzing { .. })
    }
}

/// Serializable status for the page.
#[derive(Debug, Clone, Serialize)]
pub struct WorkflowSnapshot {
    pub state: &'static str,
    pub generation: u64,
    pub detector: String,
    pub staged: Vec<StagedImageInfo>,
    pub max_images: usize,
    pub max_file_size: u64,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub result: Option<AnalysisResult>,
}

struct Inner {
    state: WorkflowState,
    generation: u64,
    intake: ImageIntake,
}

pub struct AnalysisOrchestrator {
    inner: Mutex<Inner>,
    detector: Arc<dyn DetectionClient>,
    timeout: Duration,
}

impl AnalysisOrchestrator {
    pub fn new(
        policy: IntakePolicy,
        previews: Arc<PreviewRegistry>,
        detector: Arc<dyn DetectionClient>,
        timeout: Duration,
    ) -> Self {
        Self {
            inner: Mutex::new(Inner {
                state: WorkflowState::Idle,
                generation: 0,
                intake: ImageIntake::new(policy, previews),
            }),
            detector,
            timeout,
        }
    }

    pub fn detector_name(&self) -> &str {
        self.detector.name()
    }

    fn lock(&self) -> Result<MutexGuard<'_, Inner>, OrchestratorError> {
        self.inner.lock().map_err(|_| OrchestratorError::LockPoisoned)
    }

    /// Lock even when poisoned. Used where an in-flight analysis must
    /// leave the Analyzing state no matter what.
    fn lock_recovering(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn policy(&self) -> Result<IntakePolicy, OrchestratorError> {
        Ok(self.lock()?.intake.policy().clone())
    }

    // ── Intake delegation ──────────────────────────────────

    /// Stage a batch of candidate files. Rejected while analyzing.
    pub fn stage(&self, candidates: Vec<CandidateFile>) -> Result<StageOutcome, OrchestratorError> {
        let mut inner = self.lock()?;
        if inner.state.is_analyzing() {
            return Err(OrchestratorError::AlreadyRunning);
        }
        Ok(inner.intake.stage(candidates)?)
    }

    /// Remove one staged image. Rejected while analyzing.
    ///
    /// Removing the last image of a completed analysis returns to Idle.
    pub fn unstage(&self, id: &Uuid) -> Result<UnstageOutcome, OrchestratorError> {
        let mut inner = self.lock()?;
        if inner.state.is_analyzing() {
            return Err(OrchestratorError::AlreadyRunning);
        }
        let outcome = inner.intake.unstage(id);
        if inner.intake.is_empty() && matches!(inner.state, WorkflowState::Complete(_)) {
            tracing::info!("Last staged image removed, result discarded");
            inner.state = WorkflowState::Idle;
        }
        Ok(outcome)
    }

    pub fn staged(&self) -> Result<Vec<StagedImageInfo>, OrchestratorError> {
        Ok(self.lock()?.intake.list())
    }

    // ── Workflow ───────────────────────────────────────────

    /// Run one analysis over the currently staged images.
    ///
    /// Any previous result is discarded when the call is issued. On failure
    /// the workflow returns to Idle with the staged images intact.
    pub async fn start_analysis(&self) -> Result<CompletedAnalysis, OrchestratorError> {
        let (generation, request) = {
            let mut inner = self.lock()?;
            if inner.state.is_analyzing() {
                tracing::debug!("Analysis trigger rejected: already running");
                return Err(OrchestratorError::AlreadyRunning);
            }
            if inner.intake.is_empty() {
                return Err(OrchestratorError::EmptyInput);
            }

            inner.generation += 1;
            let generation = inner.generation;
            inner.state = WorkflowState::Analyzing {
                generation,
                started_at: Utc::now(),
            };

            let images = inner
                .intake
                .images()
                .iter()
                .map(|img| DetectionImage {
                    file_name: img.file_name.clone(),
                    mime_type: img.mime_type.clone(),
                    bytes: Arc::clone(&img.bytes),
                })
                .collect();
            let request = DetectionRequest {
                images,
                options: AnalysisOptions::default(),
            };
            (generation, request)
        };

        tracing::info!(
            generation,
            images = request.images.len(),
            detector = self.detector.name(),
            "Analysis started"
        );

        // Reverts to Idle if this future is dropped mid-call.
        let mut guard = AnalyzingGuard {
            orchestrator: self,
            generation,
            armed: true,
        };

        let outcome = match tokio::time::timeout(self.timeout, self.detector.analyze(request)).await
        {
            Ok(outcome) => outcome,
            Err(_) => Err(DetectionError::Timeout(self.timeout)),
        };
        guard.armed = false;

        let mut inner = self.lock_recovering();
        let still_current = inner.generation == generation
            && matches!(inner.state, WorkflowState::Analyzing { generation: g, .. } if g == generation);
        if !still_current {
            tracing::warn!(
                generation,
                current = inner.generation,
                "Stale analysis response discarded"
            );
            return Err(OrchestratorError::Superseded);
        }

        match outcome {
            Ok(result) => {
                let completed = CompletedAnalysis {
                    result: Arc::new(result),
                    completed_at: Utc::now(),
                };
                inner.state = WorkflowState::Complete(completed.clone());
                tracing::info!(
                    generation,
                    findings = completed.result.findings.len(),
                    accuracy = completed.result.overall_accuracy_percent,
                    "Analysis complete"
                );
                Ok(completed)
            }
            Err(error) => {
                inner.state = WorkflowState::Idle;
                tracing::error!(generation, code = error.code(), "Analysis failed: {error}");
                Err(OrchestratorError::AnalysisFailed(error))
            }
        }
    }

    /// Discard the current result and every staged image.
    ///
    /// Valid from any state; an in-flight analysis keeps running but its
    /// result will be discarded.
    pub fn reset(&self) -> Result<(), OrchestratorError> {
        let mut inner = self.lock()?;
        let previous = inner.state.name();
        if inner.state.is_analyzing() {
            inner.generation += 1;
        }
        inner.state = WorkflowState::Idle;
        inner.intake.reset();
        tracing::info!(previous, "Workflow reset");
        Ok(())
    }

    pub fn state(&self) -> Result<WorkflowState, OrchestratorError> {
        Ok(self.lock()?.state.clone())
    }

    pub fn current_result(&self) -> Result<Option<CompletedAnalysis>, OrchestratorError> {
        Ok(match &self.lock()?.state {
            WorkflowState::Complete(completed) => Some(completed.clone()),
            _ => None,
        })
    }

    pub fn snapshot(&self) -> Result<WorkflowSnapshot, OrchestratorError> {
        let inner = self.lock()?;
        let policy = inner.intake.policy();
        let (started_at, completed_at, result) = match &inner.state {
            WorkflowState::Idle => (None, None, None),
            WorkflowState::Analyzing { started_at, .. } => (Some(*started_at), None, None),
            WorkflowState::Complete(c) => (None, Some(c.completed_at), Some((*c.result).clone())),
        };
        Ok(WorkflowSnapshot {
            state: inner.state.name(),
            generation: inner.generation,
            detector: self.detector.name().to_string(),
            staged: inner.intake.list(),
            max_images: policy.max_images,
            max_file_size: policy.max_file_size,
            started_at,
            completed_at,
            result,
        })
    }
}

struct AnalyzingGuard<'a> {
    orchestrator: &'a AnalysisOrchestrator,
    generation: u64,
    armed: bool,
}

impl Drop for AnalyzingGuard<'_> {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        let mut inner = self.orchestrator.lock_recovering();
        if matches!(inner.state, WorkflowState::Analyzing { generation, .. } if generation == self.generation)
        {
            tracing::warn!(generation = self.generation, "Analysis abandoned, returning to idle");
            inner.state = WorkflowState::Idle;
        }
    }
}
