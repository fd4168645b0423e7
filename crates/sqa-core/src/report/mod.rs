//! Analysis report
//!
//! One [`AnalysisReport`] value carries everything a run produced. It is
//! rendered either as pretty JSON or as Markdown tables; both renderings
//! come from the same value, so they never disagree.

mod markdown;

use crate::config::ReportFormat;
use crate::coverage::CoverageMatrix;
use crate::dedup::CanonicalFinding;
use crate::error::ReportError;
use crate::finding::PassFailure;
use crate::remediation::{FileEdits, RemediationPlan};
use crate::severity::Severity;
use serde::{Deserialize, Serialize};
use sqa_graph::GraphWarnings;
use std::collections::BTreeMap;

pub use markdown::MarkdownReport;

/// Parse anomalies and graph warnings, aggregated
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WarningsSummary {
    /// Total observations
    pub total: usize,
    /// Count per kind
    pub counts: BTreeMap<String, usize>,
    /// One line per observation
    pub details: Vec<String>,
}

impl From<&GraphWarnings> for WarningsSummary {
    fn from(warnings: &GraphWarnings) -> Self {
        let mut counts = warnings.anomalies.clone();
        if warnings.rejected_edges > 0 {
            counts.insert("rejected-edge".to_string(), warnings.rejected_edges);
        }
        Self {
            total: warnings.total(),
            counts,
            details: warnings.details.clone(),
        }
    }
}

/// Complete result of one analysis run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisReport {
    /// Analyzer version
    pub version: String,
    /// Corpus directory as given
    pub corpus: String,
    /// Documents analyzed, in precedence order
    pub documents: Vec<String>,
    /// Passes that were run
    pub passes: Vec<String>,
    /// Remediation threshold
    pub threshold: Severity,
    /// Canonical findings in output order
    pub findings: Vec<CanonicalFinding>,
    /// Traceability matrix
    pub coverage: CoverageMatrix,
    /// Edits grouped by document
    pub remediation: Vec<FileEdits>,
    /// Edit ids in application order
    pub edit_order: Vec<String>,
    /// Passes that failed or timed out
    pub pass_failures: Vec<PassFailure>,
    /// Non-fatal observations
    pub warnings: WarningsSummary,
}

impl AnalysisReport {
    /// Attach a remediation plan
    #[must_use]
    pub fn with_plan(mut self, plan: &RemediationPlan) -> Self {
        self.remediation = plan.by_document();
        self.edit_order = plan.order();
        self
    }

    /// Number of edits across all documents
    #[must_use]
    pub fn edit_count(&self) -> usize {
        self.remediation.iter().map(|file| file.edits.len()).sum()
    }

    /// Count of findings at each severity
    #[must_use]
    pub fn severity_counts(&self) -> BTreeMap<Severity, usize> {
        let mut counts = BTreeMap::new();
        for finding in &self.findings {
            *counts.entry(finding.severity).or_default() += 1;
        }
        counts
    }

    /// Pretty-printed JSON
    ///
    /// # Errors
    ///
    /// Returns [`ReportError::Json`] if serialization fails.
    pub fn to_json(&self) -> Result<String, ReportError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Markdown rendering
    #[must_use]
    pub fn to_markdown(&self) -> String {
        MarkdownReport(self).to_string()
    }

    /// Render in `format`
    ///
    /// # Errors
    ///
    /// Returns [`ReportError::Json`] if JSON serialization fails.
    pub fn render(&self, format: ReportFormat) -> Result<String, ReportError> {
        match format {
            ReportFormat::Json => self.to_json(),
            ReportFormat::Markdown => Ok(self.to_markdown()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::finding::{FailureReason, Finding};
    use sqa_document::LineRange;

    pub(super) fn sample() -> AnalysisReport {
        let finding = Finding::new("GAP-001", "coverage", "coverage-gap", "FR-002 has no implementing task")
            .with_severity(Severity::High)
            .with_location("spec.md", LineRange::single(3))
            .with_recommendation("Add a task | implementing FR-002");
        AnalysisReport {
            version: "0.1.0".to_string(),
            corpus: "specs/001".to_string(),
            documents: vec!["spec.md".to_string()],
            passes: vec!["coverage".to_string()],
            threshold: Severity::Medium,
            findings: vec![CanonicalFinding::single(finding)],
            coverage: CoverageMatrix::default(),
            remediation: Vec::new(),
            edit_order: Vec::new(),
            pass_failures: vec![PassFailure {
                pass: "ambiguity".to_string(),
                reason: FailureReason::Timeout { after_ms: 50 },
            }],
            warnings: WarningsSummary::default(),
        }
    }

    #[test]
    fn json_round_trips() {
        let report = sample();
        let json = report.to_json().unwrap();
        let back: AnalysisReport = serde_json::from_str(&json).unwrap();
        assert_eq!(back, report);
        assert!(json.contains("\"severity\": \"HIGH\""));
        assert!(json.contains("\"kind\": \"timeout\""));
    }

    #[test]
    fn warnings_include_rejected_edges() {
        let mut warnings = GraphWarnings::default();
        warnings.record_rejected_edge("self loop on T001");
        let summary = WarningsSummary::from(&warnings);
        assert_eq!(summary.total, 1);
        assert_eq!(summary.counts.get("rejected-edge"), Some(&1));
    }

    #[test]
    fn render_dispatches_on_format() {
        let report = sample();
        assert!(report.render(ReportFormat::Markdown).unwrap().starts_with("# Specification Analysis Report"));
        assert!(report.render(ReportFormat::Json).unwrap().starts_with('{'));
        assert_eq!(report.severity_counts().get(&Severity::High), Some(&1));
    }
}
