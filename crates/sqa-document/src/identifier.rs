//! Identifiers and their mentions
//!
//! An [`Identifier`] is the unit of traceability; a [`Mention`] is one
//! occurrence of it in one document. Two identifiers are the same entity
//! iff their kind and normalized key are equal.

use crate::document::LineRange;
use crate::value::ConstantValue;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier families recognized in design documents
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum IdentifierKind {
    /// Functional requirement (`FR-010`)
    Requirement,
    /// Success criterion (`SC-004`)
    SuccessCriterion,
    /// User story (`US-3`)
    UserStory,
    /// Task (`T020`)
    Task,
    /// Analysis finding or edit (`AMB-1`, `EDIT-007`, ...)
    Finding,
    /// Named constant (`OUTLINE_UPDATE_DEBOUNCE_MS`)
    NamedConstant,
}

impl IdentifierKind {
    /// Classify an identifier prefix; `None` for unknown families
    #[must_use]
    pub fn from_prefix(prefix: &str) -> Option<Self> {
        match prefix.to_ascii_uppercase().as_str() {
            "FR" => Some(Self::Requirement),
            "SC" => Some(Self::SuccessCriterion),
            "US" => Some(Self::UserStory),
            "T" => Some(Self::Task),
            "EDIT" | "AMB" | "DUP" | "U" | "GAP" | "INC" => Some(Self::Finding),
            _ => None,
        }
    }

    /// Whether tasks can implement identifiers of this kind
    #[inline]
    #[must_use]
    pub fn is_implementable(self) -> bool {
        matches!(self, Self::Requirement | Self::SuccessCriterion)
    }

    /// Stable lowercase name
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Requirement => "requirement",
            Self::SuccessCriterion => "success-criterion",
            Self::UserStory => "user-story",
            Self::Task => "task",
            Self::Finding => "finding",
            Self::NamedConstant => "named-constant",
        }
    }
}

impl fmt::Display for IdentifierKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Canonical cross-document reference token
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Identifier {
    /// Identifier family
    pub kind: IdentifierKind,
    /// Normalized key (whitespace removed, uppercase)
    pub key: String,
}

impl Identifier {
    /// Create an identifier, normalizing the key
    #[must_use]
    pub fn new(kind: IdentifierKind, key: impl AsRef<str>) -> Self {
        Self {
            kind,
            key: normalize_key(key.as_ref()),
        }
    }

    /// Requirement shorthand
    #[inline]
    #[must_use]
    pub fn requirement(key: impl AsRef<str>) -> Self {
        Self::new(IdentifierKind::Requirement, key)
    }

    /// Task shorthand
    #[inline]
    #[must_use]
    pub fn task(key: impl AsRef<str>) -> Self {
        Self::new(IdentifierKind::Task, key)
    }

    /// Named constant shorthand
    #[inline]
    #[must_use]
    pub fn constant(key: impl AsRef<str>) -> Self {
        Self::new(IdentifierKind::NamedConstant, key)
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.key)
    }
}

fn normalize_key(key: &str) -> String {
    key.chars()
        .filter(|c| !c.is_whitespace())
        .collect::<String>()
        .to_uppercase()
}

/// How an identifier occurs at a mention site
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MentionRole {
    /// Bold identifier at line start, task checklist item, or constant assignment
    Definition,
    /// Any other occurrence
    Reference,
}

/// One occurrence of an identifier in one document
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Mention {
    /// Identifier mentioned
    pub identifier: Identifier,
    /// Corpus-relative document path
    pub document: String,
    /// Lines the mention was found on
    pub lines: LineRange,
    /// Byte column of the match within its line
    pub column: usize,
    /// Definition or reference
    pub role: MentionRole,
    /// Literal value, for named constants
    pub value: Option<ConstantValue>,
    /// Trimmed source line
    pub snippet: String,
}

impl Mention {
    /// Whether this mention defines its identifier
    #[inline]
    #[must_use]
    pub fn is_definition(&self) -> bool {
        self.role == MentionRole::Definition
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prefixes_classify() {
        assert_eq!(IdentifierKind::from_prefix("FR"), Some(IdentifierKind::Requirement));
        assert_eq!(IdentifierKind::from_prefix("sc"), Some(IdentifierKind::SuccessCriterion));
        assert_eq!(IdentifierKind::from_prefix("EDIT"), Some(IdentifierKind::Finding));
        assert_eq!(IdentifierKind::from_prefix("NFR"), None);
    }

    #[test]
    fn identity_is_case_and_whitespace_normalized() {
        assert_eq!(Identifier::requirement("fr-010"), Identifier::requirement(" FR-010 "));
        assert_ne!(Identifier::requirement("FR-010"), Identifier::task("FR-010"));
    }

    #[test]
    fn identifiers_order_by_kind_then_key() {
        let mut ids = vec![
            Identifier::task("T002"),
            Identifier::requirement("FR-002"),
            Identifier::requirement("FR-001"),
        ];
        ids.sort();
        let keys: Vec<_> = ids.iter().map(ToString::to_string).collect();
        assert_eq!(keys, vec!["FR-001", "FR-002", "T002"]);
    }
}
