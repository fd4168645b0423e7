//! SQA Document Model
//!
//! Parses raw design-document text into immutable [`Document`] values:
//! - Heading-delimited sections with 1-based line ranges
//! - Identifier mentions (`FR-010`, `SC-004`, `US-3`, `T020`, named constants)
//! - Parse anomalies, kept as data rather than errors
//!
//! # Example
//!
//! ```rust
//! use sqa_document::{Document, IdentifierKind};
//!
//! let doc = Document::parse("spec.md", "# Spec\n\n- **FR-010**: System MUST save drafts\n");
//! assert_eq!(doc.sections().len(), 1);
//! assert_eq!(doc.mentions()[0].identifier.kind, IdentifierKind::Requirement);
//! ```

#![warn(missing_docs)]
#![warn(unreachable_pub)]

pub mod anomaly;
pub mod document;
mod extract;
pub mod identifier;
pub mod value;

pub use anomaly::ParseAnomaly;
pub use document::{Document, DocumentKind, LineRange, Section};
pub use identifier::{Identifier, IdentifierKind, Mention, MentionRole};
pub use value::ConstantValue;

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Parse a document; shorthand for [`Document::parse`].
#[inline]
#[must_use]
pub fn parse(path: impl Into<String>, raw_text: impl Into<String>) -> Document {
    Document::parse(path, raw_text)
}

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for working with the document model
    pub use crate::{
        ConstantValue, Document, DocumentKind, Identifier, IdentifierKind, LineRange, Mention,
        MentionRole, ParseAnomaly, Section,
    };
}
