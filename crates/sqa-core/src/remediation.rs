//! Remediation plan generation
//!
//! Turns canonical findings at or above a severity threshold into concrete
//! before/after edits, one per affected location, using a template keyed by
//! finding category:
//!
//! - `inconsistency`: rewrite every non-canonical value to the canonical one
//! - `ambiguity`: replace the vague term with a same-document constant, or
//!   annotate it for clarification
//! - `coverage-gap`: append an implementing task to the tasks document
//! - `duplication`: replace secondary copies with a pointer to the copy in
//!   the highest-precedence document
//! - `underspecification`: turn bare placeholders into clarification markers
//! - `duplicate-identifier`: renumber later definitions to a free key, then
//!   re-point the references that follow them in the same section
//!
//! An edit whose lines overlap earlier edits is widened to cover them, takes
//! their output as its `before` text, and depends on them. An edit that
//! relies on a constant or a renamed key depends on the edits that settle
//! it. Line numbers always refer to the unedited document. Application order is
//! a topological sort over those dependencies, tie-broken by document
//! precedence, path, line, and id. A dependency cycle is fatal.

use crate::dedup::CanonicalFinding;
use crate::error::RemediationError;
use crate::keys::{renumberings, KeyAllocator, Renumbering};
use crate::passes::ambiguity::vague_terms;
use crate::passes::underspecification::placeholder;
use crate::severity::Severity;
use crate::text::tokenize;
use once_cell::sync::Lazy;
use petgraph::algo::tarjan_scc;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::Direction;
use regex::Regex;
use serde::{Deserialize, Serialize};
use sqa_document::value::normalize;
use sqa_document::{Document, DocumentKind, Identifier, IdentifierKind, LineRange, Mention};
use sqa_graph::CrossReferenceGraph;
use std::cmp::Reverse;
use std::collections::{BTreeMap, BTreeSet, BinaryHeap};

static LIST_PREFIX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*(?:[-*+]\s+(?:\[[ xX]\]\s*)?|\d+\.\s+)?").expect("list prefix pattern is valid")
});

/// One file-scoped text change
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemediationEdit {
    /// Edit id (`EDIT-001`)
    pub id: String,
    /// Document the edit applies to
    pub target_document: String,
    /// Lines replaced by `after_text`
    pub lines: LineRange,
    /// Text expected at `lines` before the edit
    pub before_text: String,
    /// Replacement text
    pub after_text: String,
    /// Edits that must be applied first
    pub depends_on: Vec<String>,
    /// Canonical finding the edit resolves
    pub finding: String,
}

/// Edits for one document, in application order
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileEdits {
    /// Target document
    pub document: String,
    /// Edits in application order
    pub edits: Vec<RemediationEdit>,
}

/// Ordered set of edits
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemediationPlan {
    /// Edits in application order
    pub edits: Vec<RemediationEdit>,
}

impl RemediationPlan {
    /// Number of edits
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.edits.len()
    }

    /// Whether the plan has no edits
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.edits.is_empty()
    }

    /// Edit by id
    #[must_use]
    pub fn get(&self, id: &str) -> Option<&RemediationEdit> {
        self.edits.iter().find(|edit| edit.id == id)
    }

    /// Edit ids in application order
    #[must_use]
    pub fn order(&self) -> Vec<String> {
        self.edits.iter().map(|edit| edit.id.clone()).collect()
    }

    /// Group by document in precedence order, keeping application order
    #[must_use]
    pub fn by_document(&self) -> Vec<FileEdits> {
        let mut groups: BTreeMap<(u8, &str), Vec<RemediationEdit>> = BTreeMap::new();
        for edit in &self.edits {
            let document = edit.target_document.as_str();
            groups
                .entry((DocumentKind::from_path(document).precedence(), document))
                .or_default()
                .push(edit.clone());
        }
        groups
            .into_iter()
            .map(|((_, document), edits)| FileEdits {
                document: document.to_string(),
                edits,
            })
            .collect()
    }
}

/// How a draft changes the text at its target lines
#[derive(Debug, Clone, PartialEq, Eq)]
enum Rewrite {
    /// First occurrence of `from` after the constant name, else anywhere
    Value { key: String, from: String, to: String },
    /// First occurrence of `from`
    Replace { from: String, to: String },
    /// First case-insensitive occurrence of an identifier key
    Rename { from: String, to: String },
    /// Suffix on the last line
    Append(String),
    /// New line after the target lines
    AppendLine(String),
    /// Whole text, keeping the leading list marker
    Whole(String),
}

impl Rewrite {
    fn apply(&self, text: &str) -> Option<String> {
        let after = match self {
            Self::Value { key, from, to } => {
                let start = text.find(key.as_str()).map_or(0, |at| at + key.len());
                let at = text[start..]
                    .find(from.as_str())
                    .map(|offset| start + offset)
                    .or_else(|| text.find(from.as_str()))?;
                splice(text, at, from.len(), to)
            }
            Self::Replace { from, to } => {
                let at = text.find(from.as_str())?;
                splice(text, at, from.len(), to)
            }
            Self::Rename { from, to } => {
                let at = text.to_ascii_uppercase().find(from.as_str())?;
                splice(text, at, from.len(), to)
            }
            Self::Append(suffix) => format!("{}{suffix}", text.trim_end()),
            Self::AppendLine(line) if text.is_empty() => line.clone(),
            Self::AppendLine(line) => format!("{text}\n{line}"),
            Self::Whole(body) => {
                let prefix = LIST_PREFIX.find(text).map_or("", |m| m.as_str());
                format!("{prefix}{body}")
            }
        };
        (after != text).then_some(after)
    }
}

fn splice(text: &str, at: usize, len: usize, with: &str) -> String {
    format!("{}{with}{}", &text[..at], &text[at + len..])
}

/// A pending edit before ids and chaining are assigned
#[derive(Debug, Clone)]
struct Draft {
    document: String,
    lines: LineRange,
    rewrite: Rewrite,
    finding: String,
    introduces: Option<Identifier>,
    references: Option<Identifier>,
}

impl Draft {
    fn new(document: impl Into<String>, lines: LineRange, rewrite: Rewrite, finding: &str) -> Self {
        Self {
            document: document.into(),
            lines,
            rewrite,
            finding: finding.to_string(),
            introduces: None,
            references: None,
        }
    }
}

/// Output of an earlier edit, in unedited line numbers
#[derive(Debug, Clone)]
struct Applied {
    lines: LineRange,
    text: String,
    id: String,
}

/// Generates remediation plans for one corpus
#[derive(Debug)]
pub struct RemediationPlanner<'a> {
    documents: BTreeMap<&'a str, &'a Document>,
    graph: &'a CrossReferenceGraph,
    renumberings: Vec<Renumbering>,
}

impl<'a> RemediationPlanner<'a> {
    /// Create a planner over the analyzed corpus
    #[must_use]
    pub fn new(documents: &'a [Document], graph: &'a CrossReferenceGraph) -> Self {
        Self {
            documents: documents.iter().map(|doc| (doc.path(), doc)).collect(),
            graph,
            renumberings: renumberings(graph),
        }
    }

    /// Edits for every finding at or above `threshold`, in application order
    ///
    /// # Errors
    ///
    /// Returns [`RemediationError::CyclicDependency`] if the edits cannot be
    /// ordered.
    pub fn generate(
        &self,
        findings: &[CanonicalFinding],
        threshold: Severity,
    ) -> Result<RemediationPlan, RemediationError> {
        let mut qualifying: Vec<&CanonicalFinding> =
            findings.iter().filter(|f| f.severity >= threshold).collect();
        // Value-settling edits first, so everything else can depend on them.
        qualifying.sort_by_key(|f| f.category != "inconsistency");

        let mut keys = KeyAllocator::from_graph(self.graph);
        for rename in &self.renumberings {
            keys.observe(&rename.to);
        }
        let mut drafts = Vec::new();
        for finding in qualifying {
            drafts.extend(self.drafts_for(finding, &mut keys));
        }

        let edits = self.assemble(drafts);
        let edits = order_edits(edits)?;
        tracing::info!(
            findings = findings.len(),
            threshold = %threshold,
            edits = edits.len(),
            "remediation plan generated"
        );
        Ok(RemediationPlan { edits })
    }

    fn drafts_for(&self, finding: &CanonicalFinding, keys: &mut KeyAllocator) -> Vec<Draft> {
        match finding.category.as_str() {
            "inconsistency" => self.settle_values(finding),
            "ambiguity" => self.quantify(finding),
            "coverage-gap" => self.add_tasks(finding, keys),
            "duplication" => Self::point_to_primary(finding),
            "underspecification" => self.mark_placeholders(finding),
            "duplicate-identifier" => self.renumber(finding),
            _ => Vec::new(),
        }
    }

    fn line(&self, document: &str, line_no: usize) -> Option<&str> {
        self.documents.get(document)?.line(line_no)
    }

    fn settle_values(&self, finding: &CanonicalFinding) -> Vec<Draft> {
        let mut drafts = Vec::new();
        for constant in finding.subjects.iter().filter(|s| s.kind == IdentifierKind::NamedConstant) {
            let Some(conflict) = self
                .graph
                .value_conflicts()
                .iter()
                .find(|c| &c.constant == constant)
            else {
                continue;
            };
            let Some(canonical) = conflict.canonical() else {
                continue;
            };
            for variant in &conflict.variants {
                if variant.normalized == canonical.normalized {
                    continue;
                }
                for mention in &variant.mentions {
                    let Some(value) = &mention.value else {
                        continue;
                    };
                    let to = replacement(&constant.key, &value.raw, canonical.raw(), &canonical.normalized);
                    let mut draft = Draft::new(
                        mention.document.as_str(),
                        LineRange::single(mention.lines.start),
                        Rewrite::Value {
                            key: constant.key.clone(),
                            from: value.raw.clone(),
                            to,
                        },
                        &finding.id,
                    );
                    draft.introduces = Some(constant.clone());
                    drafts.push(draft);
                }
            }
        }
        drafts
    }

    fn quantify(&self, finding: &CanonicalFinding) -> Vec<Draft> {
        finding
            .locations
            .iter()
            .filter_map(|location| {
                let text = self.line(&location.document, location.lines.start)?;
                let (_, term) = vague_terms(text).into_iter().next()?;
                let lines = LineRange::single(location.lines.start);
                let draft = match self.related_constant(&location.document, text) {
                    Some((constant, value)) => {
                        let mut draft = Draft::new(
                            location.document.as_str(),
                            lines,
                            Rewrite::Replace {
                                from: term.to_string(),
                                to: format!("`{}` ({value})", constant.key),
                            },
                            &finding.id,
                        );
                        draft.references = Some(constant);
                        draft
                    }
                    None => Draft::new(
                        location.document.as_str(),
                        lines,
                        Rewrite::Append(format!(" [NEEDS CLARIFICATION: quantify '{term}']")),
                        &finding.id,
                    ),
                };
                Some(draft)
            })
            .collect()
    }

    /// Constant in `document` whose name shares the most words with `text`
    fn related_constant(&self, document: &str, text: &str) -> Option<(Identifier, String)> {
        let words: BTreeSet<String> = tokenize(text).into_iter().filter(|w| w.len() >= 4).collect();
        let doc = self.documents.get(document)?;

        let mut best: Option<(usize, &Mention)> = None;
        for mention in doc.mentions() {
            if mention.identifier.kind != IdentifierKind::NamedConstant || mention.value.is_none() {
                continue;
            }
            let name = tokenize(&mention.identifier.key.replace('_', " "));
            let score = name.intersection(&words).count();
            let better = match best {
                None => score > 0,
                Some((top, current)) => {
                    score > top || (score == top && mention.identifier.key < current.identifier.key)
                }
            };
            if better {
                best = Some((score, mention));
            }
        }

        let (_, mention) = best?;
        let constant = mention.identifier.clone();
        let value = self
            .graph
            .value_conflicts()
            .iter()
            .find(|c| c.constant == constant)
            .and_then(|c| c.canonical())
            .map(|variant| variant.raw().to_string())
            .or_else(|| mention.value.as_ref().map(|v| v.raw.clone()))?;
        Some((constant, value))
    }

    fn add_tasks(&self, finding: &CanonicalFinding, keys: &mut KeyAllocator) -> Vec<Draft> {
        let tasks = self
            .documents
            .values()
            .find(|doc| doc.kind() == DocumentKind::Tasks);
        let like = self
            .graph
            .identifiers_of(IdentifierKind::Task)
            .next()
            .cloned()
            .unwrap_or_else(|| Identifier::task("T000"));

        finding
            .subjects
            .iter()
            .filter(|s| s.kind.is_implementable())
            .filter_map(|requirement| {
                let task = keys.next_after(&like)?;
                let line = format!("- [ ] {task} Implement {requirement}");
                let draft = match tasks {
                    Some(doc) => {
                        let last = last_content_line(doc);
                        Draft::new(doc.path(), LineRange::single(last), Rewrite::AppendLine(line), &finding.id)
                    }
                    None => Draft::new("tasks.md", LineRange::single(1), Rewrite::AppendLine(line), &finding.id),
                };
                Some(draft)
            })
            .collect()
    }

    fn point_to_primary(finding: &CanonicalFinding) -> Vec<Draft> {
        let Some(primary) = finding.locations.iter().min_by_key(|location| {
            (
                DocumentKind::from_path(&location.document).precedence(),
                location.document.as_str(),
                location.lines.start,
            )
        }) else {
            return Vec::new();
        };
        let pointer = format!("See {} line {}", primary.document, primary.lines.start);
        finding
            .locations
            .iter()
            .filter(|location| {
                location.document != primary.document
                    || location.lines.intersection_len(&primary.lines) == 0
            })
            .map(|location| {
                Draft::new(
                    location.document.as_str(),
                    location.lines,
                    Rewrite::Whole(pointer.clone()),
                    &finding.id,
                )
            })
            .collect()
    }

    fn mark_placeholders(&self, finding: &CanonicalFinding) -> Vec<Draft> {
        finding
            .locations
            .iter()
            .filter_map(|location| {
                let text = self.line(&location.document, location.lines.start)?;
                let marker = placeholder(text)?;
                if marker.starts_with("[NEEDS CLARIFICATION") {
                    return None;
                }
                Some(Draft::new(
                    location.document.as_str(),
                    LineRange::single(location.lines.start),
                    Rewrite::Replace {
                        from: marker.to_string(),
                        to: format!("[NEEDS CLARIFICATION: {marker} left unresolved]"),
                    },
                    &finding.id,
                ))
            })
            .collect()
    }

    fn renumber(&self, finding: &CanonicalFinding) -> Vec<Draft> {
        let mut drafts = Vec::new();
        for rename in self
            .renumberings
            .iter()
            .filter(|r| finding.subjects.contains(&r.from))
        {
            let rewrite = Rewrite::Rename {
                from: rename.from.key.clone(),
                to: rename.to.key.clone(),
            };
            let definition = &rename.definition;
            let mut draft = Draft::new(
                definition.document.as_str(),
                LineRange::single(definition.lines.start),
                rewrite.clone(),
                &finding.id,
            );
            draft.introduces = Some(rename.to.clone());
            drafts.push(draft);

            for mention in self.scoped_references(rename) {
                let mut draft = Draft::new(
                    mention.document.as_str(),
                    LineRange::single(mention.lines.start),
                    rewrite.clone(),
                    &finding.id,
                );
                draft.references = Some(rename.to.clone());
                drafts.push(draft);
            }
        }
        drafts
    }

    /// References after a renamed definition, within its section and before
    /// the next definition of the same key
    fn scoped_references(&self, rename: &Renumbering) -> Vec<&Mention> {
        let definition = &rename.definition;
        let line = definition.lines.start;
        let Some(section) = self
            .documents
            .get(definition.document.as_str())
            .and_then(|doc| doc.section_at(line))
        else {
            return Vec::new();
        };

        let mentions = self.graph.mentions_of(&rename.from);
        let same_document = |m: &&Mention| m.document == definition.document;
        let until = mentions
            .iter()
            .filter(same_document)
            .filter(|m| m.is_definition() && m.lines.start > line)
            .map(|m| m.lines.start)
            .min()
            .unwrap_or(usize::MAX);
        mentions
            .iter()
            .filter(same_document)
            .filter(|m| {
                !m.is_definition()
                    && m.lines.start > line
                    && m.lines.start < until
                    && section.lines.contains(m.lines.start)
            })
            .collect()
    }

    /// Assign ids, fold overlapping drafts onto earlier edits, and wire
    /// constant and rename dependencies
    fn assemble(&self, drafts: Vec<Draft>) -> Vec<RemediationEdit> {
        let mut edits: Vec<RemediationEdit> = Vec::new();
        let mut applied: BTreeMap<String, Vec<Applied>> = BTreeMap::new();
        let mut introduced: BTreeMap<Identifier, Vec<String>> = BTreeMap::new();

        for draft in drafts {
            let regions = applied.entry(draft.document.clone()).or_default();
            let mut lines = draft.lines;
            loop {
                let wider = regions
                    .iter()
                    .filter(|r| r.lines.intersection_len(&lines) > 0)
                    .fold(lines, |acc, r| acc.span(&r.lines));
                if wider == lines {
                    break;
                }
                lines = wider;
            }

            let earlier: Vec<&Applied> = regions
                .iter()
                .filter(|r| r.lines.intersection_len(&lines) > 0)
                .collect();
            let before = self.current_text(&draft.document, lines, &earlier);
            let Some(after) = draft.rewrite.apply(&before) else {
                tracing::debug!(document = %draft.document, lines = %lines, "template did not apply");
                continue;
            };

            let id = format!("EDIT-{:03}", edits.len() + 1);
            let mut depends_on: BTreeSet<String> = earlier.iter().map(|r| r.id.clone()).collect();
            if let Some(key) = &draft.references {
                depends_on.extend(introduced.get(key).into_iter().flatten().cloned());
            }
            if let Some(key) = &draft.introduces {
                introduced.entry(key.clone()).or_default().push(id.clone());
            }

            regions.retain(|r| r.lines.intersection_len(&lines) == 0);
            regions.push(Applied {
                lines,
                text: after.clone(),
                id: id.clone(),
            });
            edits.push(RemediationEdit {
                id,
                target_document: draft.document,
                lines,
                before_text: before,
                after_text: after,
                depends_on: depends_on.into_iter().collect(),
                finding: draft.finding,
            });
        }
        edits
    }

    /// Text at `lines` once the `earlier` edits inside it are applied
    fn current_text(&self, document: &str, lines: LineRange, earlier: &[&Applied]) -> String {
        let mut parts = Vec::new();
        let mut line = lines.start;
        while line <= lines.end {
            if let Some(region) = earlier.iter().find(|r| r.lines.contains(line)) {
                parts.push(region.text.clone());
                line = region.lines.end + 1;
            } else {
                parts.push(self.original_text(document, LineRange::single(line)));
                line += 1;
            }
        }
        parts.join("\n")
    }

    fn original_text(&self, document: &str, lines: LineRange) -> String {
        self.documents
            .get(document)
            .map(|doc| doc.text_of(lines))
            .unwrap_or_default()
    }
}

/// Last non-blank line of a document, 1 for an empty one
fn last_content_line(document: &Document) -> usize {
    document
        .raw_text()
        .lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .last()
        .map_or(1, |(idx, _)| idx + 1)
}

/// Replacement text for a drifted value
///
/// A bare number stays bare when the constant name already implies the
/// canonical unit (`DEBOUNCE_MS = 300` becomes `500`, not `500ms`).
fn replacement(key: &str, current: &str, canonical_raw: &str, canonical_normalized: &str) -> String {
    let current_is_bare = current.trim().parse::<f64>().is_ok();
    let number: String = canonical_raw
        .trim()
        .chars()
        .take_while(|c| c.is_ascii_digit() || *c == '.' || *c == '-')
        .collect();
    if current_is_bare && !number.is_empty() && normalize(key, &number) == canonical_normalized {
        number
    } else {
        canonical_raw.to_string()
    }
}

/// Order edits so every dependency comes first
///
/// Among edits whose dependencies are satisfied, the one with the
/// highest-precedence document, then path, line, and id goes next.
///
/// # Errors
///
/// Returns [`RemediationError::UnknownDependency`] for a dangling
/// `depends_on` id and [`RemediationError::CyclicDependency`] if the
/// dependencies form a cycle.
pub fn order_edits(edits: Vec<RemediationEdit>) -> Result<Vec<RemediationEdit>, RemediationError> {
    let mut graph: DiGraph<usize, ()> = DiGraph::new();
    let nodes: Vec<NodeIndex> = (0..edits.len()).map(|i| graph.add_node(i)).collect();
    let index: BTreeMap<&str, NodeIndex> = edits
        .iter()
        .zip(&nodes)
        .map(|(edit, node)| (edit.id.as_str(), *node))
        .collect();

    for (edit, node) in edits.iter().zip(&nodes) {
        for dependency in &edit.depends_on {
            let Some(&from) = index.get(dependency.as_str()) else {
                return Err(RemediationError::UnknownDependency {
                    edit: edit.id.clone(),
                    missing: dependency.clone(),
                });
            };
            graph.add_edge(from, *node, ());
        }
    }

    for component in tarjan_scc(&graph) {
        let cyclic = component.len() > 1
            || component
                .first()
                .is_some_and(|node| graph.contains_edge(*node, *node));
        if cyclic {
            let mut ids: Vec<String> = component.iter().map(|n| edits[graph[*n]].id.clone()).collect();
            ids.sort();
            return Err(RemediationError::CyclicDependency { edits: ids });
        }
    }

    let rank = |i: usize| {
        let edit = &edits[i];
        Reverse((
            DocumentKind::from_path(&edit.target_document).precedence(),
            edit.target_document.clone(),
            edit.lines.start,
            edit.id.clone(),
            i,
        ))
    };

    let mut pending: Vec<usize> = nodes
        .iter()
        .map(|n| graph.neighbors_directed(*n, Direction::Incoming).count())
        .collect();
    let mut ready: BinaryHeap<_> = (0..edits.len()).filter(|i| pending[*i] == 0).map(rank).collect();
    let mut order = Vec::with_capacity(edits.len());

    while let Some(Reverse((.., i))) = ready.pop() {
        order.push(i);
        for next in graph.neighbors_directed(nodes[i], Direction::Outgoing) {
            let j = graph[next];
            pending[j] -= 1;
            if pending[j] == 0 {
                ready.push(rank(j));
            }
        }
    }

    let mut slots: Vec<Option<RemediationEdit>> = edits.into_iter().map(Some).collect();
    Ok(order.into_iter().filter_map(|i| slots[i].take()).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coverage::CoverageAnalyzer;
    use crate::detector::Detector;
    use crate::finding::Finding;
    use crate::passes::{AmbiguityPass, UnderspecificationPass};
    use sqa_graph::build;

    fn corpus(files: &[(&str, &str)]) -> (Vec<Document>, CrossReferenceGraph) {
        let docs: Vec<Document> = files.iter().map(|(p, t)| Document::parse(*p, *t)).collect();
        let graph = build(&docs);
        (docs, graph)
    }

    fn canonical(findings: Vec<Finding>) -> Vec<CanonicalFinding> {
        findings.into_iter().map(CanonicalFinding::single).collect()
    }

    fn edit(id: &str, doc: &str, line: usize, deps: &[&str]) -> RemediationEdit {
        RemediationEdit {
            id: id.to_string(),
            target_document: doc.to_string(),
            lines: LineRange::single(line),
            before_text: String::new(),
            after_text: "x".to_string(),
            depends_on: deps.iter().map(|d| (*d).to_string()).collect(),
            finding: "F-1".to_string(),
        }
    }

    #[test]
    fn drifted_value_rewritten_to_spec_value() {
        let (docs, graph) = corpus(&[
            ("spec.md", "# Spec\nOutline refresh waits `OUTLINE_UPDATE_DEBOUNCE_MS` 500ms.\n"),
            ("data-model.md", "# Model\nOUTLINE_UPDATE_DEBOUNCE_MS = 300\n"),
        ]);
        let findings = canonical(CoverageAnalyzer.detect(&docs, &graph).unwrap());
        let plan = RemediationPlanner::new(&docs, &graph)
            .generate(&findings, Severity::Medium)
            .unwrap();

        assert_eq!(plan.len(), 1);
        let edit = &plan.edits[0];
        assert_eq!(edit.target_document, "data-model.md");
        assert_eq!(edit.before_text, "OUTLINE_UPDATE_DEBOUNCE_MS = 300");
        assert_eq!(edit.after_text, "OUTLINE_UPDATE_DEBOUNCE_MS = 500");
    }

    #[test]
    fn ambiguity_uses_related_constant_and_depends_on_its_value() {
        let (docs, graph) = corpus(&[
            (
                "spec.md",
                "# Spec\nAUTOSAVE_INTERVAL_MS = 2000\n- **FR-001**: Autosave must feel responsive\n",
            ),
            ("data-model.md", "# Model\nAUTOSAVE_INTERVAL_MS = 5000\n"),
        ]);
        let mut findings = CoverageAnalyzer.detect(&docs, &graph).unwrap();
        findings.extend(AmbiguityPass.detect(&docs, &graph).unwrap());
        let plan = RemediationPlanner::new(&docs, &graph)
            .generate(&canonical(findings), Severity::High)
            .unwrap();

        let quantify = plan
            .edits
            .iter()
            .find(|e| e.after_text.contains("`AUTOSAVE_INTERVAL_MS` (2000)"))
            .unwrap();
        assert_eq!(quantify.target_document, "spec.md");
        let settle = plan
            .edits
            .iter()
            .find(|e| e.target_document == "data-model.md")
            .unwrap();
        assert_eq!(quantify.depends_on, vec![settle.id.clone()]);

        let order = plan.order();
        let pos = |id: &str| order.iter().position(|o| o == id).unwrap();
        assert!(pos(&settle.id) < pos(&quantify.id));
    }

    #[test]
    fn coverage_gaps_chain_onto_tasks_file() {
        let (docs, graph) = corpus(&[
            ("spec.md", "# Spec\n- **FR-001**: a\n- **FR-002**: b\n- **FR-003**: c\n"),
            ("tasks.md", "# Tasks\n- [ ] T001 Build FR-001\n\n"),
        ]);
        let findings = canonical(CoverageAnalyzer.detect(&docs, &graph).unwrap());
        let plan = RemediationPlanner::new(&docs, &graph)
            .generate(&findings, Severity::Medium)
            .unwrap();

        assert_eq!(plan.len(), 2);
        assert_eq!(plan.edits[0].before_text, "- [ ] T001 Build FR-001");
        assert_eq!(
            plan.edits[1].after_text,
            "- [ ] T001 Build FR-001\n- [ ] T002 Implement FR-002\n- [ ] T003 Implement FR-003"
        );
        assert_eq!(plan.edits[1].before_text, plan.edits[0].after_text);
        assert_eq!(plan.edits[1].depends_on, vec![plan.edits[0].id.clone()]);
    }

    #[test]
    fn missing_tasks_file_is_created_by_edits() {
        let (docs, graph) = corpus(&[("spec.md", "# Spec\n- **FR-001**: a\n")]);
        let findings = canonical(CoverageAnalyzer.detect(&docs, &graph).unwrap());
        let plan = RemediationPlanner::new(&docs, &graph)
            .generate(&findings, Severity::Medium)
            .unwrap();
        assert_eq!(plan.edits[0].target_document, "tasks.md");
        assert_eq!(plan.edits[0].before_text, "");
        assert_eq!(plan.edits[0].after_text, "- [ ] T001 Implement FR-001");
    }

    #[test]
    fn duplicate_definition_renamed_explicitly() {
        let (docs, graph) = corpus(&[(
            "spec.md",
            "# Spec\n- **FR-017**: first\n- **FR-041**: other\n- **FR-017**: again\n",
        )]);
        let findings: Vec<Finding> = CoverageAnalyzer
            .detect(&docs, &graph)
            .unwrap()
            .into_iter()
            .filter(|f| f.category == "duplicate-identifier")
            .collect();
        let plan = RemediationPlanner::new(&docs, &graph)
            .generate(&canonical(findings), Severity::Low)
            .unwrap();
        assert_eq!(plan.len(), 1);
        assert_eq!(plan.edits[0].lines, LineRange::single(4));
        assert_eq!(plan.edits[0].after_text, "- **FR-042**: again");
    }

    #[test]
    fn renamed_definition_repoints_following_references() {
        let (docs, graph) = corpus(&[
            (
                "spec.md",
                "# Spec\n- **FR-001**: Autosave\n\n## Export\n- **FR-001**: Export drafts\nExport per FR-001 uses one format.\n",
            ),
            ("tasks.md", "# Tasks\n- [ ] T001 Autosave FR-001\n"),
        ]);
        let findings: Vec<Finding> = CoverageAnalyzer
            .detect(&docs, &graph)
            .unwrap()
            .into_iter()
            .filter(|f| f.category == "duplicate-identifier")
            .collect();
        let plan = RemediationPlanner::new(&docs, &graph)
            .generate(&canonical(findings), Severity::Low)
            .unwrap();

        assert_eq!(plan.len(), 2);
        let rename = &plan.edits[0];
        assert_eq!(rename.lines, LineRange::single(5));
        assert_eq!(rename.after_text, "- **FR-002**: Export drafts");
        let reference = &plan.edits[1];
        assert_eq!(reference.lines, LineRange::single(6));
        assert_eq!(reference.after_text, "Export per FR-002 uses one format.");
        assert_eq!(reference.depends_on, vec![rename.id.clone()]);
        assert!(plan.edits.iter().all(|e| e.target_document == "spec.md"));
    }

    #[test]
    fn rename_keys_match_recommendation() {
        let (docs, graph) = corpus(&[
            ("spec.md", "# Spec\n- **FR-001**: a\n- **FR-002**: b\n"),
            ("tasks.md", "# Tasks\n- [ ] T001 Build FR-001\n- [ ] T001 Build again FR-001\n"),
        ]);
        let findings = canonical(CoverageAnalyzer.detect(&docs, &graph).unwrap());
        let duplicate = findings
            .iter()
            .find(|f| f.category == "duplicate-identifier")
            .unwrap();
        assert!(duplicate.recommendation.contains("renumber tasks.md:3 to T002"));

        let plan = RemediationPlanner::new(&docs, &graph)
            .generate(&findings, Severity::Medium)
            .unwrap();
        let last = plan.edits.last().unwrap();
        assert_eq!(
            last.after_text,
            "- [ ] T002 Build again FR-001\n- [ ] T003 Implement FR-002"
        );
        assert_eq!(last.depends_on.len(), 1);
    }

    fn hand_finding(id: &str, category: &str, locations: &[(&str, usize, usize)]) -> CanonicalFinding {
        let finding = locations.iter().fold(
            Finding::new(id, category, category, "s").with_severity(Severity::Medium),
            |finding, (doc, start, end)| finding.with_location(*doc, LineRange::new(*start, *end)),
        );
        CanonicalFinding::single(finding)
    }

    const REPEATED_PLAN: &str =
        "# Plan\nStorage engine: TBD\nDrafts are saved to disk.\nStorage engine: TBD\nDrafts are saved to disk.\n";

    #[test]
    fn overlapping_edit_widens_and_rebases() {
        let (docs, graph) = corpus(&[("plan.md", REPEATED_PLAN)]);
        let findings = vec![
            hand_finding("U-001", "underspecification", &[("plan.md", 4, 4)]),
            hand_finding("DUP-001", "duplication", &[("plan.md", 2, 3), ("plan.md", 4, 5)]),
        ];
        let plan = RemediationPlanner::new(&docs, &graph)
            .generate(&findings, Severity::Medium)
            .unwrap();

        assert_eq!(plan.order(), vec!["EDIT-001", "EDIT-002"]);
        let marker = &plan.edits[0];
        assert_eq!(marker.lines, LineRange::single(4));
        let pointer = &plan.edits[1];
        assert_eq!(pointer.lines, LineRange::new(4, 5));
        assert_eq!(
            pointer.before_text,
            format!("{}\nDrafts are saved to disk.", marker.after_text)
        );
        assert_eq!(pointer.after_text, "See plan.md line 2");
        assert_eq!(pointer.depends_on, vec![marker.id.clone()]);
    }

    #[test]
    fn edit_inside_replaced_block_is_dropped() {
        let (docs, graph) = corpus(&[("plan.md", REPEATED_PLAN)]);
        let findings = vec![
            hand_finding("DUP-001", "duplication", &[("plan.md", 2, 3), ("plan.md", 4, 5)]),
            hand_finding("U-001", "underspecification", &[("plan.md", 4, 4)]),
        ];
        let plan = RemediationPlanner::new(&docs, &graph)
            .generate(&findings, Severity::Medium)
            .unwrap();

        assert_eq!(plan.len(), 1);
        assert_eq!(plan.edits[0].lines, LineRange::new(4, 5));
        assert_eq!(plan.edits[0].after_text, "See plan.md line 2");
    }

    #[test]
    fn duplicate_prose_points_at_spec_copy() {
        let (docs, graph) = corpus(&[
            ("spec.md", "# Spec\nDrafts are saved to disk.\n"),
            ("plan.md", "# Plan\nDrafts are saved to disk.\nEvery edit counts.\n"),
        ]);
        let findings = vec![hand_finding(
            "DUP-001",
            "duplication",
            &[("spec.md", 2, 2), ("plan.md", 2, 3)],
        )];
        let plan = RemediationPlanner::new(&docs, &graph)
            .generate(&findings, Severity::Medium)
            .unwrap();

        assert_eq!(plan.len(), 1);
        let edit = &plan.edits[0];
        assert_eq!(edit.target_document, "plan.md");
        assert_eq!(edit.before_text, "Drafts are saved to disk.\nEvery edit counts.");
        assert_eq!(edit.after_text, "See spec.md line 2");
    }

    #[test]
    fn placeholders_become_clarification_markers() {
        let (docs, graph) = corpus(&[("plan.md", "# Plan\nStorage engine: TBD\n")]);
        let findings = canonical(UnderspecificationPass.detect(&docs, &graph).unwrap());
        let plan = RemediationPlanner::new(&docs, &graph)
            .generate(&findings, Severity::Medium)
            .unwrap();
        assert_eq!(
            plan.edits[0].after_text,
            "Storage engine: [NEEDS CLARIFICATION: TBD left unresolved]"
        );
    }

    #[test]
    fn below_threshold_yields_no_edits() {
        let (docs, graph) = corpus(&[("plan.md", "# Plan\nStorage engine: TBD\n")]);
        let findings = canonical(UnderspecificationPass.detect(&docs, &graph).unwrap());
        let plan = RemediationPlanner::new(&docs, &graph)
            .generate(&findings, Severity::High)
            .unwrap();
        assert!(plan.is_empty());
    }

    #[test]
    fn order_follows_document_precedence() {
        let edits = vec![
            edit("EDIT-001", "contracts/api.md", 1, &[]),
            edit("EDIT-002", "plan.md", 5, &[]),
            edit("EDIT-003", "spec.md", 9, &[]),
            edit("EDIT-004", "tasks.md", 2, &[]),
            edit("EDIT-005", "spec.md", 3, &["EDIT-001"]),
        ];
        let ids: Vec<String> = order_edits(edits).unwrap().into_iter().map(|e| e.id).collect();
        assert_eq!(ids, vec!["EDIT-003", "EDIT-004", "EDIT-002", "EDIT-001", "EDIT-005"]);
    }

    #[test]
    fn cycles_are_fatal() {
        let edits = vec![
            edit("EDIT-001", "spec.md", 1, &["EDIT-002"]),
            edit("EDIT-002", "spec.md", 2, &["EDIT-001"]),
            edit("EDIT-003", "spec.md", 3, &[]),
        ];
        assert_eq!(
            order_edits(edits),
            Err(RemediationError::CyclicDependency {
                edits: vec!["EDIT-001".to_string(), "EDIT-002".to_string()]
            })
        );
    }

    #[test]
    fn unknown_dependency_is_reported() {
        let edits = vec![edit("EDIT-001", "spec.md", 1, &["EDIT-009"])];
        assert!(matches!(
            order_edits(edits),
            Err(RemediationError::UnknownDependency { ref missing, .. }) if missing == "EDIT-009"
        ));
    }

    #[test]
    fn plan_groups_by_document() {
        let plan = RemediationPlan {
            edits: vec![
                edit("EDIT-002", "spec.md", 1, &[]),
                edit("EDIT-001", "data-model.md", 4, &[]),
                edit("EDIT-003", "spec.md", 7, &[]),
            ],
        };
        let groups = plan.by_document();
        assert_eq!(groups[0].document, "spec.md");
        assert_eq!(groups[0].edits.len(), 2);
        assert_eq!(groups[1].document, "data-model.md");
    }
}
