//! Near-duplicate prose detection
//!
//! Lines with at least [`MIN_TOKENS`] tokens are compared by token-set
//! Jaccard similarity. Lines at or above [`SIMILARITY`] are clustered with
//! union-find, and each cluster becomes one finding: MEDIUM when it spans
//! documents, LOW when it stays inside one.

use super::{is_heading, prose_lines};
use crate::detector::{Detector, FindingIds};
use crate::error::DetectorError;
use crate::finding::{Finding, FindingStatus, Location};
use crate::severity::Severity;
use crate::text::{jaccard, tokenize};
use crate::union_find::UnionFind;
use sqa_document::{Document, LineRange};
use sqa_graph::CrossReferenceGraph;
use std::collections::{BTreeMap, BTreeSet};

/// Pass name
pub const DUPLICATION_PASS: &str = "duplication";

/// Minimum tokens for a line to be compared
pub const MIN_TOKENS: usize = 6;

/// Minimum similarity for two lines to count as duplicates
pub const SIMILARITY: f64 = 0.8;

const SNIPPET_CHARS: usize = 60;

struct Candidate<'a> {
    location: Location,
    text: &'a str,
    tokens: BTreeSet<String>,
}

/// Heuristic duplication pass
#[derive(Debug, Clone, Copy, Default)]
pub struct DuplicationPass;

impl DuplicationPass {
    /// Create the pass
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

fn is_table_rule(line: &str) -> bool {
    let trimmed = line.trim();
    trimmed.starts_with('|') && trimmed.chars().all(|c| matches!(c, '|' | '-' | ':' | ' '))
}

fn candidates(documents: &[Document]) -> Vec<Candidate<'_>> {
    let mut out = Vec::new();
    for document in documents {
        for (line_no, line) in prose_lines(document) {
            if is_heading(line) || is_table_rule(line) {
                continue;
            }
            let tokens = tokenize(line);
            if tokens.len() >= MIN_TOKENS {
                out.push(Candidate {
                    location: Location::new(document.path(), LineRange::single(line_no)),
                    text: line.trim(),
                    tokens,
                });
            }
        }
    }
    out
}

#[allow(clippy::cast_precision_loss)]
fn clusters(lines: &[Candidate<'_>]) -> Vec<Vec<usize>> {
    // Similarity >= 0.8 needs the smaller set to be >= 0.8 of the larger,
    // so only nearby sizes are compared.
    let mut by_size: Vec<usize> = (0..lines.len()).collect();
    by_size.sort_by_key(|&i| (lines[i].tokens.len(), i));

    let mut sets = UnionFind::new(lines.len());
    for (pos, &i) in by_size.iter().enumerate() {
        let size = lines[i].tokens.len() as f64;
        for &j in &by_size[pos + 1..] {
            if (lines[j].tokens.len() as f64) * SIMILARITY > size {
                break;
            }
            if jaccard(&lines[i].tokens, &lines[j].tokens) >= SIMILARITY {
                sets.union(i, j);
            }
        }
    }

    let mut groups: BTreeMap<usize, Vec<usize>> = BTreeMap::new();
    for i in 0..lines.len() {
        groups.entry(sets.find(i)).or_default().push(i);
    }
    let mut out: Vec<Vec<usize>> = groups.into_values().filter(|g| g.len() > 1).collect();
    out.sort();
    out
}

impl Detector for DuplicationPass {
    fn name(&self) -> &str {
        DUPLICATION_PASS
    }

    fn detect(
        &self,
        documents: &[Document],
        _graph: &CrossReferenceGraph,
    ) -> Result<Vec<Finding>, DetectorError> {
        let lines = candidates(documents);
        let mut ids = FindingIds::new("DUP");

        let findings = clusters(&lines)
            .into_iter()
            .map(|members| {
                let first = &lines[members[0]];
                let documents: BTreeSet<&str> = members
                    .iter()
                    .map(|&i| lines[i].location.document.as_str())
                    .collect();
                let severity = if documents.len() > 1 {
                    Severity::Medium
                } else {
                    Severity::Low
                };
                let snippet: String = first.text.chars().take(SNIPPET_CHARS).collect();
                Finding::new(
                    ids.next_id(),
                    DUPLICATION_PASS,
                    "duplication",
                    format!("Near-duplicate text in {} places: \"{snippet}\"", members.len()),
                )
                .with_status(FindingStatus::Partial)
                .with_severity(severity)
                .with_locations(members.iter().map(|&i| lines[i].location.clone()))
                .with_recommendation(format!(
                    "Keep the text at {} and reference it from the other locations",
                    first.location
                ))
            })
            .collect();
        Ok(findings)
    }
}
