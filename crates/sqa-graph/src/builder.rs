//! Graph construction
//!
//! Nodes are upserted per mention. Edges come from mentions that share a
//! line: the first mention on a line is its subject.
//!
//! - Task + Requirement/SuccessCriterion anywhere on the line: `implements`
//!   from the task.
//! - Subject task followed by another task: `depends-on`.
//! - Otherwise the subject `references` each later mention.
//!
//! Constants are linked only through `duplicates-value`, computed once all
//! documents are in.

use crate::drift;
use crate::error::{GraphError, GraphResult};
use crate::graph::{CrossReferenceGraph, Edge, EdgeKind};
use petgraph::graph::NodeIndex;
use sqa_document::{Document, Identifier, IdentifierKind, Mention};
use std::collections::BTreeMap;

/// Incremental builder for [`CrossReferenceGraph`]
#[derive(Debug, Default)]
pub struct GraphBuilder {
    inner: CrossReferenceGraph,
}

impl GraphBuilder {
    /// Create an empty builder
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold a parsed document into the graph
    pub fn add_document(&mut self, document: &Document) {
        self.inner
            .documents
            .push((document.path().to_string(), document.kind()));

        for anomaly in document.anomalies() {
            self.inner.warnings.record_anomaly(document.path(), anomaly);
        }

        for mention in document.mentions() {
            self.add_mention(mention.clone());
        }

        let mut by_line: BTreeMap<usize, Vec<&Mention>> = BTreeMap::new();
        for mention in document.mentions() {
            by_line.entry(mention.lines.start).or_default().push(mention);
        }

        for line in by_line.values() {
            for (i, a) in line.iter().enumerate() {
                for b in &line[i + 1..] {
                    let Some((from, to, kind)) = derive_edge(&a.identifier, &b.identifier, i == 0)
                    else {
                        continue;
                    };
                    if let Err(err) = self.add_edge(from, to, kind) {
                        tracing::debug!(error = %err, document = document.path(), "edge rejected");
                        self.inner.warnings.record_rejected_edge(err.to_string());
                    }
                }
            }
        }
    }

    /// Record one mention, creating its node if needed
    pub fn add_mention(&mut self, mention: Mention) {
        self.node(&mention.identifier);
        self.inner
            .mentions
            .entry(mention.identifier.clone())
            .or_default()
            .push(mention);
    }

    /// Insert an edge after checking graph invariants.
    ///
    /// Returns `Ok(false)` when the edge already exists.
    ///
    /// # Errors
    ///
    /// Returns an error for self loops, `implements` edges not running from
    /// a task to a requirement or success criterion, non-`duplicates-value`
    /// edges between constants, and `duplicates-value` edges touching
    /// anything but constants.
    pub fn add_edge(&mut self, from: Identifier, to: Identifier, kind: EdgeKind) -> GraphResult<bool> {
        if from == to {
            return Err(GraphError::SelfLoop(from));
        }

        let constants = (
            from.kind == IdentifierKind::NamedConstant,
            to.kind == IdentifierKind::NamedConstant,
        );
        let valid = match kind {
            EdgeKind::DuplicatesValue => constants == (true, true),
            EdgeKind::Implements => from.kind == IdentifierKind::Task && to.kind.is_implementable(),
            EdgeKind::DependsOn => from.kind == IdentifierKind::Task && to.kind == IdentifierKind::Task,
            EdgeKind::References => constants != (true, true),
        };
        if !valid {
            return Err(GraphError::invalid_edge(&from, &to, kind));
        }

        let edge = Edge { from, to, kind };
        if self.inner.edges.contains(&edge) {
            return Ok(false);
        }
        let a = self.node(&edge.from);
        let b = self.node(&edge.to);
        self.inner.graph.add_edge(a, b, kind);
        self.inner.edges.insert(edge);
        Ok(true)
    }

    fn node(&mut self, id: &Identifier) -> NodeIndex {
        if let Some(&idx) = self.inner.index.get(id) {
            return idx;
        }
        let idx = self.inner.graph.add_node(id.clone());
        self.inner.index.insert(id.clone(), idx);
        idx
    }

    /// Finish the graph: sort mentions and derive constant drift
    #[must_use]
    pub fn build(mut self) -> CrossReferenceGraph {
        for mentions in self.inner.mentions.values_mut() {
            mentions.sort_by(|a, b| {
                (&a.document, a.lines.start, a.column).cmp(&(&b.document, b.lines.start, b.column))
            });
        }

        let groups = drift::group_values(self.inner.mentions.values().flatten());
        for (a, b) in drift::shared_values(&groups) {
            if let Err(err) = self.add_edge(a, b, EdgeKind::DuplicatesValue) {
                self.inner.warnings.record_rejected_edge(err.to_string());
            }
        }
        self.inner.value_conflicts = drift::conflicts(&groups);

        tracing::info!(
            documents = self.inner.documents.len(),
            nodes = self.inner.node_count(),
            edges = self.inner.edge_count(),
            conflicts = self.inner.value_conflicts.len(),
            warnings = self.inner.warnings.total(),
            "built cross-reference graph"
        );

        self.inner
    }
}

/// Edge implied by two mentions on one line, `a` before `b`
fn derive_edge(
    a: &Identifier,
    b: &Identifier,
    a_is_subject: bool,
) -> Option<(Identifier, Identifier, EdgeKind)> {
    use IdentifierKind::{NamedConstant, Task};

    if a == b || (a.kind == NamedConstant && b.kind == NamedConstant) {
        return None;
    }
    if a.kind == Task && b.kind.is_implementable() {
        return Some((a.clone(), b.clone(), EdgeKind::Implements));
    }
    if b.kind == Task && a.kind.is_implementable() {
        return Some((b.clone(), a.clone(), EdgeKind::Implements));
    }
    if !a_is_subject {
        return None;
    }
    let kind = if a.kind == Task && b.kind == Task {
        EdgeKind::DependsOn
    } else {
        EdgeKind::References
    };
    Some((a.clone(), b.clone(), kind))
}

/// Build a graph from a set of parsed documents
#[must_use]
pub fn build(documents: &[Document]) -> CrossReferenceGraph {
    let mut builder = GraphBuilder::new();
    for document in documents {
        builder.add_document(document);
    }
    builder.build()
}
