//! Placeholder detection
//!
//! Flags prose lines carrying an unresolved placeholder (`TBD`, `TBC`,
//! `TODO`, `FIXME`, `???`, `[NEEDS CLARIFICATION ...]`). Impact 4 on
//! requirement and success-criterion lines, 3 elsewhere.

use super::{is_requirement_line, prose_lines};
use crate::detector::{Detector, FindingIds};
use crate::error::DetectorError;
use crate::finding::{Finding, FindingStatus};
use crate::severity::ImpactScore;
use once_cell::sync::Lazy;
use regex::Regex;
use sqa_document::{Document, LineRange};
use sqa_graph::CrossReferenceGraph;

/// Pass name
pub const UNDERSPECIFICATION_PASS: &str = "underspecification";

static PLACEHOLDER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\bTBD\b|\bTBC\b|\bTODO\b|\bFIXME\b|\?\?\?|\[NEEDS CLARIFICATION[^\]]*\]")
        .expect("placeholder pattern is valid")
});

/// First placeholder in `line`, if any
#[must_use]
pub fn placeholder(line: &str) -> Option<&str> {
    PLACEHOLDER.find(line).map(|m| m.as_str())
}

/// Heuristic underspecification pass
#[derive(Debug, Clone, Copy, Default)]
pub struct UnderspecificationPass;

impl UnderspecificationPass {
    /// Create the pass
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl Detector for UnderspecificationPass {
    fn name(&self) -> &str {
        UNDERSPECIFICATION_PASS
    }

    fn detect(
        &self,
        documents: &[Document],
        _graph: &CrossReferenceGraph,
    ) -> Result<Vec<Finding>, DetectorError> {
        let mut ids = FindingIds::new("U");
        let mut findings = Vec::new();

        for document in documents {
            for (line_no, line) in prose_lines(document) {
                let Some(marker) = placeholder(line) else {
                    continue;
                };
                let score = if is_requirement_line(document, line_no) { 4 } else { 3 };
                let impact = ImpactScore::new(score).map_err(|e| DetectorError::failed(e.to_string()))?;
                let context: String = line.trim().chars().take(80).collect();

                findings.push(
                    Finding::new(
                        ids.next_id(),
                        UNDERSPECIFICATION_PASS,
                        "underspecification",
                        format!("Unresolved placeholder {marker}: {context}"),
                    )
                    .with_status(FindingStatus::Partial)
                    .with_impact(impact)
                    .with_location(document.path(), LineRange::single(line_no))
                    .with_recommendation(format!("Resolve {marker} with a concrete decision")),
                );
            }
        }
        Ok(findings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::severity::Severity;

    #[test]
    fn placeholders_are_reported_with_impact() {
        let docs = vec![Document::parse(
            "spec.md",
            "# Spec\n- **FR-020**: Export format is TBD\nRetry policy: [NEEDS CLARIFICATION: backoff?]\nTodo lists are a feature.\n",
        )];
        let findings = UnderspecificationPass
            .detect(&docs, &CrossReferenceGraph::default())
            .unwrap();
        assert_eq!(findings.len(), 2);
        assert_eq!(findings[0].id, "U-001");
        assert_eq!(findings[0].severity(), Severity::High);
        assert_eq!(findings[1].severity(), Severity::Medium);
        assert_eq!(
            findings[1].recommendation,
            "Resolve [NEEDS CLARIFICATION: backoff?] with a concrete decision"
        );
    }

    #[test]
    fn placeholder_finds_first_marker() {
        assert_eq!(placeholder("size ??? or TBD"), Some("???"));
        assert_eq!(placeholder("no markers"), None);
    }
}
