//! Clinical report assembly and export.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::TECHNICIAN_LABEL;
use crate::models::{AnalysisResult, CellType, Severity};

#[derive(Error, Debug)]
pub enum ReportError {
    #[error("Report serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Unsupported report format: {0}")]
    UnsupportedFormat(String),
}

/// Case metadata, independent of any analysis result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportCase {
    pub patient_id: String,
    pub sample_id: String,
    pub analysis_date_display: String,
    pub technician_label: String,
}

impl ReportCase {
    /// Default case for an analysis completed at `completed_at`.
    ///
    /// Sample id is `US-` plus the last six digits of the completion
    /// timestamp in milliseconds.
    pub fn for_completion(patient_id: &str, completed_at: DateTime<Utc>) -> Self {
        let millis = completed_at.timestamp_millis().unsigned_abs();
        Self {
            patient_id: patient_id.to_string(),
            sample_id: format!("US-{:06}", millis % 1_000_000),
            analysis_date_display: completed_at.format("%Y-%m-%d").to_string(),
            technician_label: TECHNICIAN_LABEL.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportFinding {
    pub cell_type: CellType,
    pub count: u32,
    pub confidence: f64,
    pub status: Severity,
    pub reference: String,
}

/// The merged, exportable report payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportDocument {
    pub patient_id: String,
    pub sample_id: String,
    pub analysis_date: String,
    pub processing_time_seconds: f64,
    pub results: Vec<ReportFinding>,
    pub anomalies: Vec<String>,
    pub clinical_findings: Vec<String>,
    pub technician: String,
}

/// Merge case metadata with a result. Pure; never fails.
pub fn assemble(case: &ReportCase, result: &AnalysisResult) -> ReportDocument {
    ReportDocument {
        patient_id: case.patient_id.clone(),
        sample_id: case.sample_id.clone(),
        analysis_date: case.analysis_date_display.clone(),
        processing_time_seconds: result.processing_time_seconds,
        results: result
            .findings
            .iter()
            .map(|f| ReportFinding {
                cell_type: f.cell_type,
                count: f.count,
                confidence: f.confidence,
                status: f.severity,
                reference: f.reference_range.clone(),
            })
            .collect(),
        anomalies: result.anomaly_notes.clone(),
        clinical_findings: result.preliminary_findings.clone(),
        technician: case.technician_label.clone(),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportFormat {
    Docx,
    Xml,
}

impl ReportFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Docx => "docx",
            Self::Xml => "xml",
        }
    }

    pub fn content_type(&self) -> &'static str {
        match self {
            Self::Docx => {
                "application/vnd.openxmlformats-officedocument.wordprocessingml.document"
            }
            Self::Xml => "application/xml",
        }
    }
}

impl std::str::FromStr for ReportFormat {
    type Err = ReportError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "docx" => Ok(Self::Docx),
            "xml" => Ok(Self::Xml),
            other => Err(ReportError::UnsupportedFormat(other.to_string())),
        }
    }
}

/// A downloadable report.
#[derive(Debug, Clone)]
pub struct ExportedReport {
    pub bytes: Vec<u8>,
    pub file_name: String,
    pub content_type: &'static str,
}

/// Serialize a report for download.
///
/// The body is the pretty JSON encoding of the document for every format;
/// only the file name and content type follow the requested format.
pub fn export(document: &ReportDocument, format: ReportFormat) -> Result<ExportedReport, ReportError> {
    let bytes = serde_json::to_vec_pretty(document)?;
    let file_name = format!(
        "urine_analysis_report_{}.{}",
        document.sample_id,
        format.extension()
    );
    tracing::info!(file = %file_name, size = bytes.len(), "Report exported");
    Ok(ExportedReport {
        bytes,
        file_name,
        content_type: format.content_type(),
    })
}
