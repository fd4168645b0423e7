//! Identifier key arithmetic
//!
//! Keys look like `FR-017`, `T020`, or `FR-017A`. New keys continue the
//! family's numbering after the highest number in use, keeping its
//! separator and zero padding.

use once_cell::sync::Lazy;
use regex::Regex;
use sqa_document::{DocumentKind, Identifier, IdentifierKind, Mention};
use sqa_graph::CrossReferenceGraph;
use std::collections::BTreeMap;

static KEY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^([A-Z]+)(-?)(\d+)([A-Z]*)$").expect("key pattern is valid"));

/// Decomposed identifier key
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyParts {
    /// Family prefix (`FR`)
    pub prefix: String,
    /// Separator between prefix and number (`-` or empty)
    pub separator: String,
    /// Numeric part
    pub number: u32,
    /// Digits as written, for padding
    pub width: usize,
    /// Trailing letters (`A` in `FR-017A`)
    pub suffix: String,
}

impl KeyParts {
    /// Parse a normalized key
    #[must_use]
    pub fn parse(key: &str) -> Option<Self> {
        let caps = KEY.captures(key)?;
        let digits = caps.get(3)?.as_str();
        Some(Self {
            prefix: caps.get(1)?.as_str().to_string(),
            separator: caps.get(2)?.as_str().to_string(),
            number: digits.parse().ok()?,
            width: digits.len(),
            suffix: caps.get(4)?.as_str().to_string(),
        })
    }

    /// Render with a different number and no suffix
    #[must_use]
    pub fn with_number(&self, number: u32) -> String {
        format!(
            "{}{}{:0width$}",
            self.prefix,
            self.separator,
            number,
            width = self.width
        )
    }
}

/// Hands out unused keys per family, never the same one twice
#[derive(Debug, Clone, Default)]
pub struct KeyAllocator {
    highest: BTreeMap<(IdentifierKind, String), u32>,
}

impl KeyAllocator {
    /// Seed from every identifier in the graph
    #[must_use]
    pub fn from_graph(graph: &CrossReferenceGraph) -> Self {
        let mut allocator = Self::default();
        for id in graph.identifiers() {
            allocator.observe(id);
        }
        allocator
    }

    /// Record a key as used
    pub fn observe(&mut self, id: &Identifier) {
        if let Some(parts) = KeyParts::parse(&id.key) {
            let highest = self.highest.entry((id.kind, parts.prefix)).or_default();
            *highest = (*highest).max(parts.number);
        }
    }

    /// Next free key in the family of `like`
    pub fn next_after(&mut self, like: &Identifier) -> Option<Identifier> {
        self.observe(like);
        let parts = KeyParts::parse(&like.key)?;
        let highest = self
            .highest
            .entry((like.kind, parts.prefix.clone()))
            .or_default();
        *highest = highest.checked_add(1)?;
        Some(Identifier::new(like.kind, parts.with_number(*highest)))
    }
}

/// A later definition moved to a fresh key in its family
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Renumbering {
    /// Key defined more than once
    pub from: Identifier,
    /// Fresh key for this definition
    pub to: Identifier,
    /// Definition that takes the fresh key
    pub definition: Mention,
}

/// Whether duplicate definitions of `kind` are renumbered
///
/// Constants defined twice are value drift, and finding ids belong to
/// reports rather than to the documents.
#[must_use]
pub fn is_renumbered(kind: IdentifierKind) -> bool {
    !matches!(kind, IdentifierKind::NamedConstant | IdentifierKind::Finding)
}

/// Renames for every identifier defined more than once
///
/// The first definition by document precedence, path, and line keeps its
/// key. Identifiers are visited in graph order with one allocator, so every
/// caller sees the same assignment.
#[must_use]
pub fn renumberings(graph: &CrossReferenceGraph) -> Vec<Renumbering> {
    let mut keys = KeyAllocator::from_graph(graph);
    let mut out = Vec::new();
    for id in graph.identifiers().filter(|id| is_renumbered(id.kind)) {
        let mut definitions: Vec<&Mention> = graph.definitions_of(id).collect();
        definitions.sort_by_key(|m| {
            (
                DocumentKind::from_path(&m.document).precedence(),
                m.document.as_str(),
                m.lines.start,
            )
        });
        for mention in definitions.iter().skip(1) {
            if let Some(to) = keys.next_after(id) {
                out.push(Renumbering {
                    from: id.clone(),
                    to,
                    definition: (*mention).clone(),
                });
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqa_document::Document;

    #[test]
    fn parses_common_shapes() {
        let fr = KeyParts::parse("FR-017A").unwrap();
        assert_eq!((fr.prefix.as_str(), fr.separator.as_str(), fr.number, fr.width), ("FR", "-", 17, 3));
        assert_eq!(fr.suffix, "A");
        let task = KeyParts::parse("T020").unwrap();
        assert_eq!(task.with_number(43), "T043");
        assert!(KeyParts::parse("MAX_DEPTH").is_none());
    }

    #[test]
    fn allocation_continues_after_highest() {
        let mut keys = KeyAllocator::default();
        keys.observe(&Identifier::requirement("FR-041"));
        keys.observe(&Identifier::requirement("FR-017A"));
        let like = Identifier::requirement("FR-017");
        assert_eq!(keys.next_after(&like), Some(Identifier::requirement("FR-042")));
        assert_eq!(keys.next_after(&like), Some(Identifier::requirement("FR-043")));
        assert_eq!(
            keys.next_after(&Identifier::task("T001")),
            Some(Identifier::task("T002"))
        );
    }

    #[test]
    fn renumbering_is_shared_across_identifiers() {
        let docs = vec![
            Document::parse(
                "spec.md",
                "# Spec\n- **FR-001**: a\n- **FR-003**: b\n- **FR-001**: c\n- **FR-003**: d\n",
            ),
            Document::parse("plan.md", "# Plan\n- **FR-001**: e\n"),
        ];
        let graph = sqa_graph::build(&docs);
        let renames: Vec<(String, String, String)> = renumberings(&graph)
            .into_iter()
            .map(|r| (r.from.key, r.to.key, format!("{}:{}", r.definition.document, r.definition.lines)))
            .collect();
        assert_eq!(
            renames,
            vec![
                ("FR-001".to_string(), "FR-004".to_string(), "spec.md:4".to_string()),
                ("FR-001".to_string(), "FR-005".to_string(), "plan.md:2".to_string()),
                ("FR-003".to_string(), "FR-006".to_string(), "spec.md:5".to_string()),
            ]
        );
    }
}
