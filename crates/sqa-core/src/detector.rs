//! Detector capability
//!
//! A detector is a pure function of the parsed documents and the graph.
//! It must not observe other passes, so the orchestrator may run detectors
//! in any order or concurrently with identical results.

use crate::error::DetectorError;
use crate::finding::Finding;
use sqa_document::Document;
use sqa_graph::CrossReferenceGraph;
use std::fmt;

/// One analysis pass
pub trait Detector: Send + Sync + 'static {
    /// Unique pass name, used for selection and in findings
    fn name(&self) -> &str;

    /// Inspect the corpus and report findings
    ///
    /// # Errors
    ///
    /// Any error is isolated to this pass and recorded as a pass failure.
    fn detect(
        &self,
        documents: &[Document],
        graph: &CrossReferenceGraph,
    ) -> Result<Vec<Finding>, DetectorError>;
}

impl fmt::Debug for dyn Detector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Detector").field("name", &self.name()).finish()
    }
}

/// Sequential id allocator for pass-scoped finding ids (`AMB-001`, ...)
#[derive(Debug, Clone)]
pub struct FindingIds {
    prefix: &'static str,
    next: usize,
}

impl FindingIds {
    /// Start numbering at 1
    #[inline]
    #[must_use]
    pub fn new(prefix: &'static str) -> Self {
        Self { prefix, next: 1 }
    }

    /// Next id
    pub fn next_id(&mut self) -> String {
        let id = format!("{}-{:03}", self.prefix, self.next);
        self.next += 1;
        id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_are_zero_padded_and_sequential() {
        let mut ids = FindingIds::new("AMB");
        assert_eq!(ids.next_id(), "AMB-001");
        assert_eq!(ids.next_id(), "AMB-002");
    }
}
