//! Error types for graph construction

use crate::graph::EdgeKind;
use sqa_document::Identifier;

/// Errors raised when an edge would violate a graph invariant
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GraphError {
    /// Edge from an identifier to itself
    #[error("self loop on {0}")]
    SelfLoop(Identifier),

    /// Edge kind not allowed between these identifier kinds
    #[error("{kind} edge not allowed from {from} ({from_kind}) to {to} ({to_kind})", from_kind = .from.kind, to_kind = .to.kind)]
    InvalidEdge {
        /// Source identifier
        from: Identifier,
        /// Target identifier
        to: Identifier,
        /// Rejected edge kind
        kind: EdgeKind,
    },
}

impl GraphError {
    /// Create an invalid-edge error
    #[must_use]
    pub fn invalid_edge(from: &Identifier, to: &Identifier, kind: EdgeKind) -> Self {
        Self::InvalidEdge {
            from: from.clone(),
            to: to.clone(),
            kind,
        }
    }
}

/// Result type alias for graph operations
pub type GraphResult<T> = Result<T, GraphError>;
