//! Immutable cross-reference graph
//!
//! Nodes are distinct identifiers; edges are typed and deduplicated by
//! `(from, to, kind)`. The graph is produced once by the builder and only
//! read afterwards.

use crate::drift::ValueConflict;
use crate::warnings::GraphWarnings;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use petgraph::Direction;
use serde::{Deserialize, Serialize};
use sqa_document::{DocumentKind, Identifier, IdentifierKind, Mention};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// Relationship between two identifiers
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EdgeKind {
    /// Task implements a requirement or success criterion
    Implements,
    /// Generic co-occurrence reference
    References,
    /// Two named constants share a normalized value
    DuplicatesValue,
    /// Task depends on another task
    DependsOn,
}

impl EdgeKind {
    /// Stable lowercase name
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Implements => "implements",
            Self::References => "references",
            Self::DuplicatesValue => "duplicates-value",
            Self::DependsOn => "depends-on",
        }
    }
}

impl fmt::Display for EdgeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Typed, directed edge
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Edge {
    /// Source identifier
    pub from: Identifier,
    /// Target identifier
    pub to: Identifier,
    /// Relationship
    pub kind: EdgeKind,
}

/// Read-only traceability graph over every mention in a corpus
#[derive(Debug, Clone, Default)]
pub struct CrossReferenceGraph {
    pub(crate) graph: DiGraph<Identifier, EdgeKind>,
    pub(crate) index: BTreeMap<Identifier, NodeIndex>,
    pub(crate) mentions: BTreeMap<Identifier, Vec<Mention>>,
    pub(crate) edges: BTreeSet<Edge>,
    pub(crate) value_conflicts: Vec<ValueConflict>,
    pub(crate) warnings: GraphWarnings,
    pub(crate) documents: Vec<(String, DocumentKind)>,
}

impl CrossReferenceGraph {
    /// Number of distinct identifiers
    #[inline]
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    /// Number of distinct edges
    #[inline]
    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// Whether the identifier occurs anywhere in the corpus
    #[must_use]
    pub fn contains(&self, id: &Identifier) -> bool {
        self.index.contains_key(id)
    }

    /// All identifiers in `(kind, key)` order
    pub fn identifiers(&self) -> impl Iterator<Item = &Identifier> {
        self.index.keys()
    }

    /// Identifiers of one kind in key order
    pub fn identifiers_of(&self, kind: IdentifierKind) -> impl Iterator<Item = &Identifier> {
        self.index.keys().filter(move |id| id.kind == kind)
    }

    /// Every mention of `id`, in document then line order
    #[must_use]
    pub fn mentions_of(&self, id: &Identifier) -> &[Mention] {
        self.mentions.get(id).map_or(&[], Vec::as_slice)
    }

    /// Mentions of `id` that define it
    pub fn definitions_of<'a>(&'a self, id: &Identifier) -> impl Iterator<Item = &'a Mention> {
        self.mentions_of(id).iter().filter(|m| m.is_definition())
    }

    /// Every edge in `(from, to, kind)` order
    pub fn edges(&self) -> impl Iterator<Item = &Edge> {
        self.edges.iter()
    }

    /// Whether a specific edge exists
    #[must_use]
    pub fn has_edge(&self, from: &Identifier, to: &Identifier, kind: EdgeKind) -> bool {
        self.edges.contains(&Edge {
            from: from.clone(),
            to: to.clone(),
            kind,
        })
    }

    /// Sources of `kind` edges pointing at `id`, sorted
    #[must_use]
    pub fn incoming(&self, id: &Identifier, kind: EdgeKind) -> Vec<&Identifier> {
        self.neighbors(id, kind, Direction::Incoming)
    }

    /// Targets of `kind` edges leaving `id`, sorted
    #[must_use]
    pub fn outgoing(&self, id: &Identifier, kind: EdgeKind) -> Vec<&Identifier> {
        self.neighbors(id, kind, Direction::Outgoing)
    }

    fn neighbors(&self, id: &Identifier, kind: EdgeKind, direction: Direction) -> Vec<&Identifier> {
        let Some(&idx) = self.index.get(id) else {
            return Vec::new();
        };
        let mut out: Vec<&Identifier> = self
            .graph
            .edges_directed(idx, direction)
            .filter(|edge| *edge.weight() == kind)
            .map(|edge| match direction {
                Direction::Incoming => &self.graph[edge.source()],
                Direction::Outgoing => &self.graph[edge.target()],
            })
            .collect();
        out.sort();
        out.dedup();
        out
    }

    /// Tasks with an `implements` edge to `id`
    #[must_use]
    pub fn implementing_tasks(&self, id: &Identifier) -> Vec<&Identifier> {
        self.incoming(id, EdgeKind::Implements)
    }

    /// Per-key constant drift groups
    #[inline]
    #[must_use]
    pub fn value_conflicts(&self) -> &[ValueConflict] {
        &self.value_conflicts
    }

    /// Non-fatal observations collected during the build
    #[inline]
    #[must_use]
    pub fn warnings(&self) -> &GraphWarnings {
        &self.warnings
    }

    /// Paths of the documents the graph was built from
    pub fn documents(&self) -> impl Iterator<Item = &str> {
        self.documents.iter().map(|(path, _)| path.as_str())
    }

    /// Whether a document of `kind` was part of the corpus
    #[must_use]
    pub fn has_document_kind(&self, kind: DocumentKind) -> bool {
        self.documents.iter().any(|(_, k)| *k == kind)
    }
}
