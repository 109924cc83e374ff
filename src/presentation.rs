//! Display directives for an analysis result. Pure mapping, no state.

use serde::Serialize;

use crate::models::{AnalysisResult, CellType, Severity};

/// Shown with preliminary findings whenever there are any.
pub const CLINICAL_NOTICE: &str = "These AI-generated findings require validation by a qualified \
healthcare professional. Do not use for direct patient diagnosis without clinical review.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DisplayColor {
    Success,
    Warning,
    Destructive,
    Muted,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BadgeKind {
    Default,
    Secondary,
    Destructive,
    Outline,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum StatusIcon {
    CheckCircle,
    AlertTriangle,
    Activity,
}

/// Presentation for one severity level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SeverityStyle {
    pub color: DisplayColor,
    pub badge: BadgeKind,
    pub icon: StatusIcon,
}

/// Fixed severity → presentation table. Unknown severities render neutral.
pub fn style_for(severity: Severity) -> SeverityStyle {
    match severity {
        Severity::Normal => SeverityStyle {
            color: DisplayColor::Success,
            badge: BadgeKind::Default,
            icon: StatusIcon::CheckCircle,
        },
        Severity::Elevated => SeverityStyle {
            color: DisplayColor::Warning,
            badge: BadgeKind::Secondary,
            icon: StatusIcon::AlertTriangle,
        },
        Severity::Critical => SeverityStyle {
            color: DisplayColor::Destructive,
            badge: BadgeKind::Destructive,
            icon: StatusIcon::AlertTriangle,
        },
        Severity::Unknown => SeverityStyle {
            color: DisplayColor::Muted,
            badge: BadgeKind::Outline,
            icon: StatusIcon::Activity,
        },
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FindingPresentation {
    pub cell_type: CellType,
    pub count: u32,
    pub confidence: f64,
    pub reference_range: String,
    pub severity: Severity,
    /// Upper-cased severity shown on the badge.
    pub status_label: String,
    #[serde(flatten)]
    pub style: SeverityStyle,
}

/// Everything the results view needs, in display order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResultView {
    pub title: String,
    pub processing_time_display: String,
    pub overall_accuracy_percent: f64,
    pub findings: Vec<FindingPresentation>,
    /// Findings flagged elevated or critical.
    pub abnormal_count: usize,
    pub anomaly_notes: Vec<String>,
    pub preliminary_findings: Vec<String>,
    pub clinical_notice: Option<&'static str>,
}

/// Classify every finding of a result.
pub fn classify(result: &AnalysisResult) -> Vec<FindingPresentation> {
    result
        .findings
        .iter()
        .map(|finding| FindingPresentation {
            cell_type: finding.cell_type,
            count: finding.count,
            confidence: finding.confidence,
            reference_range: finding.reference_range.clone(),
            severity: finding.severity,
            status_label: finding.severity.as_str().to_uppercase(),
            style: style_for(finding.severity),
        })
        .collect()
}

pub fn render(result: &AnalysisResult) -> ResultView {
    ResultView {
        title: format!("Analysis Complete: {}", result.source_image_label),
        processing_time_display: format!("{:.1}s", result.processing_time_seconds),
        overall_accuracy_percent: result.overall_accuracy_percent,
        findings: classify(result),
        abnormal_count: result.abnormal_findings().count(),
        anomaly_notes: result.anomaly_notes.clone(),
        preliminary_findings: result.preliminary_findings.clone(),
        clinical_notice: (!result.preliminary_findings.is_empty()).then_some(CLINICAL_NOTICE),
    }
}
