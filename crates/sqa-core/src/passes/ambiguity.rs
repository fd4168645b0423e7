//! Vague-term detection
//!
//! Flags prose lines that use a qualitative adjective or hedge with no
//! number or named constant on the same line to anchor it. Reports an
//! impact score: 4 on requirement and success-criterion lines, 2 elsewhere.

use super::{is_heading, is_requirement_line, prose_lines};
use crate::detector::{Detector, FindingIds};
use crate::error::DetectorError;
use crate::finding::{Finding, FindingStatus};
use crate::severity::ImpactScore;
use once_cell::sync::Lazy;
use regex::Regex;
use sqa_document::{Document, LineRange};
use sqa_graph::CrossReferenceGraph;
use std::ops::Range;

/// Pass name
pub const AMBIGUITY_PASS: &str = "ambiguity";

static VAGUE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)\b(fast|quick(?:ly)?|slow(?:ly)?|responsive|intuitive|user[- ]friendly|easy|easily|simple|robust|scalable|efficient(?:ly)?|seamless(?:ly)?|smooth(?:ly)?|reasonable|appropriate(?:ly)?|sufficient|adequate|minimal|several|various|as needed|if possible|graceful(?:ly)?|instant(?:ly)?|near[- ]instant|real[- ]time|lightweight|flexible)\b",
    )
    .expect("vague term pattern is valid")
});

static ANCHOR: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?:^|[^\w\-])\d|`[A-Z][A-Z0-9_]{3,}`").expect("anchor pattern is valid")
});

/// Vague terms in `line` with their byte spans
#[must_use]
pub fn vague_terms(line: &str) -> Vec<(Range<usize>, &str)> {
    VAGUE
        .find_iter(line)
        .map(|m| (m.range(), m.as_str()))
        .collect()
}

/// Whether `line` carries a number or a backticked constant
#[must_use]
pub fn has_quantitative_anchor(line: &str) -> bool {
    ANCHOR.is_match(line)
}

/// Heuristic ambiguity pass
#[derive(Debug, Clone, Copy, Default)]
pub struct AmbiguityPass;

impl AmbiguityPass {
    /// Create the pass
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl Detector for AmbiguityPass {
    fn name(&self) -> &str {
        AMBIGUITY_PASS
    }

    fn detect(
        &self,
        documents: &[Document],
        _graph: &CrossReferenceGraph,
    ) -> Result<Vec<Finding>, DetectorError> {
        let mut ids = FindingIds::new("AMB");
        let mut findings = Vec::new();

        for document in documents {
            for (line_no, line) in prose_lines(document) {
                if is_heading(line) || has_quantitative_anchor(line) {
                    continue;
                }
                let terms = vague_terms(line);
                if terms.is_empty() {
                    continue;
                }
                let mut names: Vec<String> = Vec::new();
                for (_, term) in &terms {
                    let term = term.to_lowercase();
                    if !names.contains(&term) {
                        names.push(term);
                    }
                }
                let quoted = names
                    .iter()
                    .map(|t| format!("'{t}'"))
                    .collect::<Vec<_>>()
                    .join(", ");
                let score = if is_requirement_line(document, line_no) { 4 } else { 2 };
                let impact = ImpactScore::new(score).map_err(|e| DetectorError::failed(e.to_string()))?;

                findings.push(
                    Finding::new(
                        ids.next_id(),
                        AMBIGUITY_PASS,
                        "ambiguity",
                        format!("Vague term {quoted} has no measurable criterion"),
                    )
                    .with_status(FindingStatus::Partial)
                    .with_impact(impact)
                    .with_location(document.path(), LineRange::single(line_no))
                    .with_recommendation(format!(
                        "Replace {quoted} with a measurable threshold or a named constant"
                    )),
                );
            }
        }
        Ok(findings)
    }
}
