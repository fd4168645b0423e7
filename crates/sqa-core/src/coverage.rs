//! Coverage and consistency analysis
//!
//! Works from the graph alone:
//! - requirement/criterion coverage through `implements` edges
//! - orphan tasks (no outgoing `implements` or `references`)
//! - constant value drift, one finding per conflicting key
//! - identifiers defined more than once

use crate::detector::{Detector, FindingIds};
use crate::error::DetectorError;
use crate::finding::{Finding, FindingStatus, Location};
use crate::keys::{is_renumbered, renumberings};
use crate::severity::Severity;
use serde::{Deserialize, Serialize};
use sqa_document::{Document, DocumentKind, Identifier, IdentifierKind, Mention};
use sqa_graph::{CrossReferenceGraph, EdgeKind, ValueConflict};
use std::fmt;

/// Pass name of the built-in analyzer
pub const COVERAGE_PASS: &str = "coverage";

/// Whether a requirement has an implementing task
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum CoverageState {
    /// At least one task implements it
    Covered,
    /// No task implements it
    Missing,
}

impl fmt::Display for CoverageState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Covered => "COVERED",
            Self::Missing => "MISSING",
        })
    }
}

/// One row of the traceability matrix
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoverageRow {
    /// Requirement or success criterion
    pub identifier: Identifier,
    /// Coverage state
    pub state: CoverageState,
    /// Implementing tasks, sorted
    pub tasks: Vec<Identifier>,
    /// Number of incoming `references` edges
    pub references: usize,
    /// Where the identifier is defined (or first mentioned)
    pub location: Option<Location>,
}

/// Requirement to implementing-task traceability matrix
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoverageMatrix {
    /// One row per requirement and success criterion, in key order
    pub rows: Vec<CoverageRow>,
    /// Tasks with no outgoing `implements` or `references` edge
    pub orphan_tasks: Vec<Identifier>,
    /// Whether a tasks document was part of the corpus
    pub tasks_file_present: bool,
}

impl CoverageMatrix {
    /// Compute the matrix from the graph
    #[must_use]
    pub fn compute(graph: &CrossReferenceGraph) -> Self {
        let rows = graph
            .identifiers()
            .filter(|id| id.kind.is_implementable())
            .map(|id| {
                let tasks: Vec<Identifier> =
                    graph.implementing_tasks(id).into_iter().cloned().collect();
                CoverageRow {
                    identifier: id.clone(),
                    state: if tasks.is_empty() {
                        CoverageState::Missing
                    } else {
                        CoverageState::Covered
                    },
                    tasks,
                    references: graph.incoming(id, EdgeKind::References).len(),
                    location: primary_mention(graph, id).map(Location::of),
                }
            })
            .collect();

        let orphan_tasks = graph
            .identifiers_of(IdentifierKind::Task)
            .filter(|task| {
                graph.outgoing(task, EdgeKind::Implements).is_empty()
                    && graph.outgoing(task, EdgeKind::References).is_empty()
            })
            .cloned()
            .collect();

        Self {
            rows,
            orphan_tasks,
            tasks_file_present: graph.has_document_kind(DocumentKind::Tasks),
        }
    }

    /// Row for `id`
    #[must_use]
    pub fn row(&self, id: &Identifier) -> Option<&CoverageRow> {
        self.rows.iter().find(|row| &row.identifier == id)
    }

    /// Number of covered rows
    #[must_use]
    pub fn covered_count(&self) -> usize {
        self.rows
            .iter()
            .filter(|row| row.state == CoverageState::Covered)
            .count()
    }

    /// Covered share in percent, 100 when there are no rows
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn coverage_percent(&self) -> f64 {
        if self.rows.is_empty() {
            100.0
        } else {
            self.covered_count() as f64 * 100.0 / self.rows.len() as f64
        }
    }
}

/// First defining mention, falling back to the first mention
fn primary_mention<'a>(graph: &'a CrossReferenceGraph, id: &Identifier) -> Option<&'a Mention> {
    graph
        .definitions_of(id)
        .min_by_key(|m| mention_rank(*m))
        .or_else(|| graph.mentions_of(id).iter().min_by_key(|m| mention_rank(*m)))
}

fn mention_rank(m: &Mention) -> (u8, &str, usize) {
    (
        DocumentKind::from_path(&m.document).precedence(),
        m.document.as_str(),
        m.lines.start,
    )
}

fn locations<'a>(mentions: impl IntoIterator<Item = &'a Mention>) -> Vec<Location> {
    mentions.into_iter().map(Location::of).collect()
}

/// Built-in coverage and consistency pass
#[derive(Debug, Clone, Copy, Default)]
pub struct CoverageAnalyzer;

impl CoverageAnalyzer {
    /// Create the analyzer
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    fn coverage_gaps(graph: &CrossReferenceGraph, matrix: &CoverageMatrix) -> Vec<Finding> {
        let mut ids = FindingIds::new("GAP");
        let mut findings = Vec::new();

        for row in matrix.rows.iter().filter(|r| r.state == CoverageState::Missing) {
            let id = &row.identifier;
            let sites = primary_mention(graph, id).into_iter();
            let (severity, summary, recommendation) = if !matrix.tasks_file_present {
                (
                    Severity::Medium,
                    format!("{id} has no implementing task (no tasks file found)"),
                    format!("Create tasks.md with a task implementing {id}"),
                )
            } else if row.references == 0 {
                (
                    Severity::High,
                    format!("{id} has no implementing task and is never referenced"),
                    format!("Add a task implementing {id} to tasks.md"),
                )
            } else {
                (
                    Severity::Medium,
                    format!("{id} has no implementing task"),
                    format!("Add a task implementing {id} to tasks.md"),
                )
            };
            findings.push(
                Finding::new(ids.next_id(), COVERAGE_PASS, "coverage-gap", summary)
                    .with_status(FindingStatus::Missing)
                    .with_severity(severity)
                    .with_locations(locations(sites))
                    .with_recommendation(recommendation)
                    .with_subject(id.clone()),
            );
        }
        findings
    }

    fn orphan_tasks(graph: &CrossReferenceGraph, matrix: &CoverageMatrix) -> Vec<Finding> {
        let mut ids = FindingIds::new("ORP");
        matrix
            .orphan_tasks
            .iter()
            .map(|task| {
                Finding::new(
                    ids.next_id(),
                    COVERAGE_PASS,
                    "orphan-task",
                    format!("{task} does not reference any requirement"),
                )
                .with_status(FindingStatus::Clear)
                .with_severity(Severity::Low)
                .with_locations(locations(primary_mention(graph, task)))
                .with_recommendation(format!(
                    "Link {task} to the requirement it serves, or mark it as infrastructure"
                ))
                .with_subject(task.clone())
            })
            .collect()
    }

    fn drift(conflicts: &[ValueConflict]) -> Vec<Finding> {
        let mut ids = FindingIds::new("INC");
        conflicts
            .iter()
            .map(|conflict| {
                let values = conflict
                    .variants
                    .iter()
                    .map(|variant| {
                        let sites: Vec<String> = variant
                            .mentions
                            .iter()
                            .map(|m| Location::of(m).to_string())
                            .collect();
                        format!("{} ({})", variant.raw(), sites.join(", "))
                    })
                    .collect::<Vec<_>>()
                    .join("; ");
                let recommendation = conflict.canonical().map_or_else(
                    || format!("Pick one value for {}", conflict.constant),
                    |canonical| {
                        let source = canonical
                            .mentions
                            .iter()
                            .min_by_key(|m| mention_rank(*m))
                            .map_or("", |m| m.document.as_str());
                        format!(
                            "Use {} = {} from {source} everywhere",
                            conflict.constant,
                            canonical.raw()
                        )
                    },
                );
                Finding::new(
                    ids.next_id(),
                    COVERAGE_PASS,
                    "inconsistency",
                    format!(
                        "{} has {} conflicting values: {values}",
                        conflict.constant,
                        conflict.variants.len()
                    ),
                )
                .with_status(FindingStatus::Partial)
                .with_severity(Severity::High)
                .with_locations(locations(conflict.mentions()))
                .with_recommendation(recommendation)
                .with_subject(conflict.constant.clone())
            })
            .collect()
    }

    fn duplicate_definitions(graph: &CrossReferenceGraph) -> Vec<Finding> {
        let mut ids = FindingIds::new("DEF");
        let planned = renumberings(graph);
        let mut findings = Vec::new();

        for id in graph.identifiers().filter(|id| is_renumbered(id.kind)) {
            let mut definitions: Vec<&Mention> = graph.definitions_of(id).collect();
            if definitions.len() < 2 {
                continue;
            }
            definitions.sort_by_key(|m| mention_rank(*m));
            let renames: Vec<String> = planned
                .iter()
                .filter(|r| &r.from == id)
                .map(|r| format!("{} to {}", Location::of(&r.definition), r.to))
                .collect();
            findings.push(
                Finding::new(
                    ids.next_id(),
                    COVERAGE_PASS,
                    "duplicate-identifier",
                    format!("{id} is defined {} times", definitions.len()),
                )
                .with_status(FindingStatus::Partial)
                .with_severity(Severity::Medium)
                .with_locations(locations(definitions.iter().copied()))
                .with_recommendation(format!(
                    "Keep the first definition; renumber {}",
                    renames.join(", ")
                ))
                .with_subject(id.clone()),
            );
        }
        findings
    }
}

impl Detector for CoverageAnalyzer {
    fn name(&self) -> &str {
        COVERAGE_PASS
    }

    fn detect(
        &self,
        _documents: &[Document],
        graph: &CrossReferenceGraph,
    ) -> Result<Vec<Finding>, DetectorError> {
        let matrix = CoverageMatrix::compute(graph);
        let mut findings = Self::coverage_gaps(graph, &matrix);
        findings.extend(Self::orphan_tasks(graph, &matrix));
        findings.extend(Self::drift(graph.value_conflicts()));
        findings.extend(Self::duplicate_definitions(graph));

        tracing::debug!(
            rows = matrix.rows.len(),
            covered = matrix.covered_count(),
            orphans = matrix.orphan_tasks.len(),
            conflicts = graph.value_conflicts().len(),
            "coverage analyzed"
        );
        Ok(findings)
    }
}
