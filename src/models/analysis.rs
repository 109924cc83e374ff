use serde::{Deserialize, Serialize};

use super::enums::{CellType, Severity};

/// One categorized cell-count measurement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CellFinding {
    pub cell_type: CellType,
    pub count: u32,
    /// Detection confidence, percent in [0, 100].
    pub confidence: f64,
    /// Display string, e.g. `0-2 per hpf`.
    #[serde(default)]
    pub reference_range: String,
    #[serde(default = "unknown_severity")]
    pub severity: Severity,
}

fn unknown_severity() -> Severity {
    Severity::Unknown
}

/// Complete output of one detection pass over a batch of staged images.
///
/// Sequence fields are optional on the wire and default to empty.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    #[serde(default)]
    pub source_image_label: String,
    #[serde(default)]
    pub findings: Vec<CellFinding>,
    #[serde(default)]
    pub processing_time_seconds: f64,
    #[serde(default)]
    pub overall_accuracy_percent: f64,
    #[serde(default)]
    pub anomaly_notes: Vec<String>,
    #[serde(default)]
    pub preliminary_findings: Vec<String>,
}

impl AnalysisResult {
    /// Check numeric ranges. Returns a description of the first violation.
    pub fn validate(&self) -> Result<(), String> {
        if !is_percentage(self.overall_accuracy_percent) {
            return Err(format!(
                "overall accuracy {} outside [0, 100]",
                self.overall_accuracy_percent
            ));
        }
        if !self.processing_time_seconds.is_finite() || self.processing_time_seconds < 0.0 {
            return Err(format!(
                "processing time {} is negative or not finite",
                self.processing_time_seconds
            ));
        }
        for finding in &self.findings {
            if !is_percentage(finding.confidence) {
                return Err(format!(
                    "{} confidence {} outside [0, 100]",
                    finding.cell_type, finding.confidence
                ));
            }
        }
        Ok(())
    }

    /// Findings flagged elevated or critical.
    pub fn abnormal_findings(&self) -> impl Iterator<Item = &CellFinding> {
        self.findings.iter().filter(|f| f.severity.is_abnormal())
    }
}

fn is_percentage(value: f64) -> bool {
    value.is_finite() && (0.0..=100.0).contains(&value)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn finding(cell_type: CellType, confidence: f64, severity: Severity) -> CellFinding {
        CellFinding {
            cell_type,
            count: 3,
            confidence,
            reference_range: "0-2 per hpf".into(),
            severity,
        }
    }

    fn result_with(findings: Vec<CellFinding>) -> AnalysisResult {
        AnalysisResult {
            source_image_label: "sample.jpg".into(),
            findings,
            processing_time_seconds: 1.2,
            overall_accuracy_percent: 90.0,
            anomaly_notes: vec![],
            preliminary_findings: vec![],
        }
    }

    #[test]
    fn missing_sequences_default_to_empty() {
        let parsed: AnalysisResult = serde_json::from_str(
            r#"{"source_image_label":"a.png","processing_time_seconds":1.0,"overall_accuracy_percent":80}"#,
        )
        .unwrap();
        assert!(parsed.findings.is_empty());
        assert!(parsed.anomaly_notes.is_empty());
        assert!(parsed.preliminary_findings.is_empty());
    }

    #[test]
    fn finding_without_severity_is_unknown() {
        let parsed: CellFinding =
            serde_json::from_str(r#"{"cell_type":"Cast","count":1,"confidence":50}"#).unwrap();
        assert_eq!(parsed.severity, Severity::Unknown);
        assert_eq!(parsed.reference_range, "");
    }

    #[test]
    fn validate_accepts_in_range_values() {
        let result = result_with(vec![finding(CellType::Rbc, 100.0, Severity::Normal)]);
        assert!(result.validate().is_ok());
    }

    #[test]
    fn validate_rejects_out_of_range_confidence() {
        let result = result_with(vec![finding(CellType::Cast, 101.0, Severity::Normal)]);
        let err = result.validate().unwrap_err();
        assert!(err.contains("Cast"));
    }

    #[test]
    fn validate_rejects_negative_processing_time() {
        let mut result = result_with(vec![]);
        result.processing_time_seconds = -0.5;
        assert!(result.validate().is_err());
        result.processing_time_seconds = f64::NAN;
        assert!(result.validate().is_err());
    }

    #[test]
    fn abnormal_findings_filters_normal_and_unknown() {
        let result = result_with(vec![
            finding(CellType::Rbc, 90.0, Severity::Elevated),
            finding(CellType::Cast, 90.0, Severity::Normal),
            finding(CellType::Urothelial, 90.0, Severity::Critical),
            finding(CellType::Cast, 90.0, Severity::Unknown),
        ]);
        let abnormal: Vec<_> = result.abnormal_findings().map(|f| f.cell_type).collect();
        assert_eq!(abnormal, vec![CellType::Rbc, CellType::Urothelial]);
    }
}
