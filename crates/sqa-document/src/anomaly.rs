//! Parse anomalies
//!
//! Nothing in a document is a parse error; structure that cannot be
//! recognized degrades the document and is recorded here instead.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Non-fatal observation made while parsing a document
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum ParseAnomaly {
    /// Identifier-shaped token with an unknown prefix (dropped)
    UnclassifiedIdentifier {
        /// Line the token was found on
        line: usize,
        /// Token text
        token: String,
    },
    /// Document has text but no headings
    NoStructure,
    /// Document is empty or whitespace only
    EmptyDocument,
}

impl ParseAnomaly {
    /// Stable name used when aggregating warnings
    #[must_use]
    pub fn kind_name(&self) -> &'static str {
        match self {
            Self::UnclassifiedIdentifier { .. } => "unclassified-identifier",
            Self::NoStructure => "no-structure",
            Self::EmptyDocument => "empty-document",
        }
    }
}

impl fmt::Display for ParseAnomaly {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnclassifiedIdentifier { line, token } => {
                write!(f, "unclassified identifier '{token}' on line {line}")
            }
            Self::NoStructure => f.write_str("no headings found"),
            Self::EmptyDocument => f.write_str("document is empty"),
        }
    }
}
