//! Built-in passes and the pass registry
//!
//! Heuristic stand-ins for the semantic detectors: each is a pure function
//! of the documents and graph, selectable by name.

pub mod ambiguity;
pub mod duplication;
pub mod underspecification;

pub use ambiguity::AmbiguityPass;
pub use duplication::DuplicationPass;
pub use underspecification::UnderspecificationPass;

use crate::coverage::CoverageAnalyzer;
use crate::detector::Detector;
use crate::error::ConfigError;
use sqa_document::{Document, IdentifierKind};
use std::collections::BTreeMap;
use std::sync::Arc;

/// Named set of available passes
#[derive(Debug, Clone, Default)]
pub struct PassRegistry {
    passes: BTreeMap<String, Arc<dyn Detector>>,
}

impl PassRegistry {
    /// Empty registry
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding every built-in pass
    #[must_use]
    pub fn with_builtin() -> Self {
        let mut registry = Self::new();
        registry.register(CoverageAnalyzer::new());
        registry.register(AmbiguityPass::new());
        registry.register(DuplicationPass::new());
        registry.register(UnderspecificationPass::new());
        registry
    }

    /// Add or replace a pass under its own name
    pub fn register(&mut self, pass: impl Detector) {
        self.register_arc(Arc::new(pass));
    }

    /// Add or replace a shared pass
    pub fn register_arc(&mut self, pass: Arc<dyn Detector>) {
        self.passes.insert(pass.name().to_string(), pass);
    }

    /// Registered names, sorted
    #[must_use]
    pub fn names(&self) -> Vec<String> {
        self.passes.keys().cloned().collect()
    }

    /// Number of registered passes
    #[must_use]
    pub fn len(&self) -> usize {
        self.passes.len()
    }

    /// Whether no pass is registered
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.passes.is_empty()
    }

    /// Resolve a selection; `None` selects every pass
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::UnknownPass`] for the first unregistered name.
    pub fn select(&self, names: Option<&[String]>) -> Result<Vec<Arc<dyn Detector>>, ConfigError> {
        let Some(names) = names else {
            return Ok(self.passes.values().cloned().collect());
        };
        let mut selected: BTreeMap<&str, Arc<dyn Detector>> = BTreeMap::new();
        for name in names {
            let name = name.trim();
            let pass = self.passes.get(name).ok_or_else(|| ConfigError::UnknownPass {
                name: name.to_string(),
                available: self.names(),
            })?;
            selected.insert(name, Arc::clone(pass));
        }
        Ok(selected.into_values().collect())
    }
}

/// Lines outside fenced code blocks, with 1-based numbers
pub(crate) fn prose_lines(document: &Document) -> Vec<(usize, &str)> {
    let mut in_fence = false;
    let mut out = Vec::new();
    for (idx, line) in document.raw_text().lines().enumerate() {
        let trimmed = line.trim_start();
        if trimmed.starts_with("```") || trimmed.starts_with("~~~") {
            in_fence = !in_fence;
            continue;
        }
        if !in_fence {
            out.push((idx + 1, line));
        }
    }
    out
}

/// Whether `line_no` defines a requirement or success criterion
pub(crate) fn is_requirement_line(document: &Document, line_no: usize) -> bool {
    document.mentions().iter().any(|m| {
        m.lines.start == line_no
            && m.is_definition()
            && matches!(
                m.identifier.kind,
                IdentifierKind::Requirement | IdentifierKind::SuccessCriterion
            )
    })
}

/// Whether a line is an ATX heading
pub(crate) fn is_heading(line: &str) -> bool {
    line.trim_start().starts_with('#')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_names() {
        let registry = PassRegistry::with_builtin();
        assert_eq!(
            registry.names(),
            vec!["ambiguity", "coverage", "duplication", "underspecification"]
        );
    }

    #[test]
    fn selection_rejects_unknown_names() {
        let registry = PassRegistry::with_builtin();
        let picked = registry
            .select(Some(&["coverage".to_string(), "ambiguity".to_string()]))
            .unwrap();
        let names: Vec<_> = picked.iter().map(|p| p.name().to_string()).collect();
        assert_eq!(names, vec!["ambiguity", "coverage"]);

        let err = registry.select(Some(&["grammar".to_string()])).unwrap_err();
        assert!(matches!(err, ConfigError::UnknownPass { ref name, .. } if name == "grammar"));
    }

    #[test]
    fn fenced_code_is_not_prose() {
        let doc = Document::parse("plan.md", "intro\n```\nTODO inside\n```\noutro\n");
        let lines: Vec<_> = prose_lines(&doc).into_iter().map(|(n, _)| n).collect();
        assert_eq!(lines, vec![1, 5]);
    }
}
