//! Document and section model
//!
//! Uses pulldown-cmark to locate headings; everything else is kept as raw
//! lines so that every extracted mention can point at exact 1-based lines.

use crate::anomaly::ParseAnomaly;
use crate::extract;
use crate::identifier::Mention;
use pulldown_cmark::{Event, Parser as MdParser, Tag, TagEnd};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Inclusive, 1-based line range
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct LineRange {
    /// First line (1-based)
    pub start: usize,
    /// Last line (inclusive)
    pub end: usize,
}

impl LineRange {
    /// Create a range; bounds are swapped if given in reverse
    #[inline]
    #[must_use]
    pub fn new(start: usize, end: usize) -> Self {
        if start <= end {
            Self { start, end }
        } else {
            Self {
                start: end,
                end: start,
            }
        }
    }

    /// Range covering a single line
    #[inline]
    #[must_use]
    pub fn single(line: usize) -> Self {
        Self {
            start: line,
            end: line,
        }
    }

    /// Number of lines covered
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.end - self.start + 1
    }

    /// Ranges are never empty; present for API symmetry with `len`
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        false
    }

    /// Check whether `line` falls inside this range
    #[inline]
    #[must_use]
    pub fn contains(&self, line: usize) -> bool {
        (self.start..=self.end).contains(&line)
    }

    /// Number of lines shared with `other`
    #[must_use]
    pub fn intersection_len(&self, other: &Self) -> usize {
        let start = self.start.max(other.start);
        let end = self.end.min(other.end);
        if start > end {
            0
        } else {
            end - start + 1
        }
    }

    /// Smallest range covering both
    #[inline]
    #[must_use]
    pub fn span(&self, other: &Self) -> Self {
        Self {
            start: self.start.min(other.start),
            end: self.end.max(other.end),
        }
    }

    /// Iterate the covered line numbers
    pub fn lines(&self) -> impl Iterator<Item = usize> {
        self.start..=self.end
    }
}

impl fmt::Display for LineRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.start == self.end {
            write!(f, "{}", self.start)
        } else {
            write!(f, "{}-{}", self.start, self.end)
        }
    }
}

/// Recognized document roles, in remediation precedence order
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DocumentKind {
    /// `spec.md`
    Spec,
    /// `tasks.md`
    Tasks,
    /// `plan.md`
    Plan,
    /// `data-model.md`
    DataModel,
    /// Anything under `contracts/`
    Contract,
    /// Unrecognized file
    Other,
}

impl DocumentKind {
    /// Classify a document by its corpus-relative path
    #[must_use]
    pub fn from_path(path: &str) -> Self {
        let normalized = path.replace('\\', "/");
        if normalized.starts_with("contracts/") || normalized.contains("/contracts/") {
            return Self::Contract;
        }
        match normalized.rsplit('/').next().unwrap_or_default() {
            "spec.md" => Self::Spec,
            "tasks.md" => Self::Tasks,
            "plan.md" => Self::Plan,
            "data-model.md" => Self::DataModel,
            _ => Self::Other,
        }
    }

    /// Precedence rank (lower wins) used for canonical values and edit order
    #[inline]
    #[must_use]
    pub fn precedence(self) -> u8 {
        match self {
            Self::Spec => 0,
            Self::Tasks => 1,
            Self::Plan => 2,
            Self::DataModel => 3,
            Self::Contract => 4,
            Self::Other => 5,
        }
    }
}

/// Heading-delimited section of a document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Section {
    /// Heading text (empty for preamble or unstructured documents)
    pub heading: String,
    /// Heading level (1-6), 0 when there is no heading
    pub level: u8,
    /// Lines spanned, heading line included
    pub lines: LineRange,
    /// Text below the heading
    pub body_text: String,
}

/// Parsed, immutable design document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    path: String,
    kind: DocumentKind,
    raw_text: String,
    sections: Vec<Section>,
    mentions: Vec<Mention>,
    anomalies: Vec<ParseAnomaly>,
}

impl Document {
    /// Parse raw text into a document.
    ///
    /// Never fails: text without headings becomes one section spanning the
    /// whole document, and unmatched text is simply not extracted.
    #[must_use]
    pub fn parse(path: impl Into<String>, raw_text: impl Into<String>) -> Self {
        let path = path.into().replace('\\', "/");
        let raw_text = raw_text.into();
        let mut anomalies = Vec::new();

        let lines: Vec<&str> = raw_text.lines().collect();
        let sections = build_sections(&raw_text, &lines, &mut anomalies);

        let mut mentions = Vec::new();
        for section in &sections {
            for line_no in section.lines.lines() {
                if let Some(line) = lines.get(line_no - 1) {
                    extract::scan_line(&path, line_no, line, &mut mentions, &mut anomalies);
                }
            }
        }

        tracing::debug!(
            path = %path,
            sections = sections.len(),
            mentions = mentions.len(),
            anomalies = anomalies.len(),
            "parsed document"
        );

        Self {
            kind: DocumentKind::from_path(&path),
            path,
            raw_text,
            sections,
            mentions,
            anomalies,
        }
    }

    /// Corpus-relative path (forward slashes)
    #[inline]
    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Document role derived from the path
    #[inline]
    #[must_use]
    pub fn kind(&self) -> DocumentKind {
        self.kind
    }

    /// Original text
    #[inline]
    #[must_use]
    pub fn raw_text(&self) -> &str {
        &self.raw_text
    }

    /// Sections in document order
    #[inline]
    #[must_use]
    pub fn sections(&self) -> &[Section] {
        &self.sections
    }

    /// Every extracted mention, in line order
    #[inline]
    #[must_use]
    pub fn mentions(&self) -> &[Mention] {
        &self.mentions
    }

    /// Non-fatal parse anomalies
    #[inline]
    #[must_use]
    pub fn anomalies(&self) -> &[ParseAnomaly] {
        &self.anomalies
    }

    /// Number of text lines
    #[must_use]
    pub fn line_count(&self) -> usize {
        self.raw_text.lines().count()
    }

    /// Text of a 1-based line
    #[must_use]
    pub fn line(&self, line_no: usize) -> Option<&str> {
        line_no
            .checked_sub(1)
            .and_then(|idx| self.raw_text.lines().nth(idx))
    }

    /// Text of a line range joined with `\n`
    #[must_use]
    pub fn text_of(&self, range: LineRange) -> String {
        self.raw_text
            .lines()
            .skip(range.start.saturating_sub(1))
            .take(range.len())
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Section containing `line_no`
    #[must_use]
    pub fn section_at(&self, line_no: usize) -> Option<&Section> {
        self.sections.iter().find(|s| s.lines.contains(line_no))
    }
}

/// Byte offset to line lookup
struct LineIndex {
    starts: Vec<usize>,
}

impl LineIndex {
    fn new(text: &str) -> Self {
        let mut starts = vec![0];
        starts.extend(text.match_indices('\n').map(|(i, _)| i + 1));
        Self { starts }
    }

    fn line_of(&self, offset: usize) -> usize {
        self.starts.partition_point(|&s| s <= offset).max(1)
    }
}

/// Collect `(level, title, line)` for every heading
fn collect_headings(text: &str) -> Vec<(u8, String, usize)> {
    let index = LineIndex::new(text);
    let mut headings = Vec::new();
    let mut current: Option<(u8, String, usize)> = None;

    for (event, range) in MdParser::new(text).into_offset_iter() {
        match event {
            Event::Start(Tag::Heading { level, .. }) => {
                current = Some((level as u8, String::new(), index.line_of(range.start)));
            }
            Event::Text(text) | Event::Code(text) => {
                if let Some((_, ref mut title, _)) = current {
                    title.push_str(&text);
                }
            }
            Event::End(TagEnd::Heading(_)) => {
                if let Some((level, title, line)) = current.take() {
                    headings.push((level, title.trim().to_string(), line));
                }
            }
            _ => {}
        }
    }

    headings
}

fn build_sections(text: &str, lines: &[&str], anomalies: &mut Vec<ParseAnomaly>) -> Vec<Section> {
    let total = lines.len().max(1);
    let headings = collect_headings(text);

    if headings.is_empty() {
        if text.trim().is_empty() {
            anomalies.push(ParseAnomaly::EmptyDocument);
        } else {
            anomalies.push(ParseAnomaly::NoStructure);
        }
        return vec![Section {
            heading: String::new(),
            level: 0,
            lines: LineRange::new(1, total),
            body_text: lines.join("\n"),
        }];
    }

    let body = |start: usize, end: usize| -> String {
        if start > end {
            String::new()
        } else {
            lines[start - 1..end].join("\n")
        }
    };

    let mut sections = Vec::with_capacity(headings.len() + 1);

    let first_line = headings[0].2;
    if first_line > 1 {
        sections.push(Section {
            heading: String::new(),
            level: 0,
            lines: LineRange::new(1, first_line - 1),
            body_text: body(1, first_line - 1),
        });
    }

    for (idx, (level, title, line)) in headings.iter().enumerate() {
        let end = headings
            .get(idx + 1)
            .map_or(total, |(_, _, next)| next.saturating_sub(1).max(*line));
        sections.push(Section {
            heading: title.clone(),
            level: *level,
            lines: LineRange::new(*line, end),
            body_text: body(line + 1, end.min(lines.len())),
        });
    }

    sections
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identifier::{IdentifierKind, MentionRole};

    #[test]
    fn empty_document_has_one_section() {
        let doc = Document::parse("spec.md", "");
        assert_eq!(doc.sections().len(), 1);
        assert_eq!(doc.sections()[0].lines, LineRange::single(1));
        assert!(doc.mentions().is_empty());
        assert_eq!(doc.anomalies(), &[ParseAnomaly::EmptyDocument]);
    }

    #[test]
    fn unstructured_text_spans_whole_document() {
        let doc = Document::parse("notes.md", "just some prose\nacross lines\nand more");
        assert_eq!(doc.sections().len(), 1);
        assert_eq!(doc.sections()[0].lines, LineRange::new(1, 3));
        assert_eq!(doc.sections()[0].heading, "");
        assert_eq!(doc.anomalies(), &[ParseAnomaly::NoStructure]);
    }

    #[test]
    fn sections_follow_headings() {
        let text = "intro line\n# Title\n\nbody\n## Requirements\n- **FR-001**: a\n- **FR-002**: b\n";
        let doc = Document::parse("spec.md", text);

        let sections = doc.sections();
        assert_eq!(sections.len(), 3);
        assert_eq!(sections[0].lines, LineRange::single(1));
        assert_eq!(sections[1].heading, "Title");
        assert_eq!(sections[1].level, 1);
        assert_eq!(sections[1].lines, LineRange::new(2, 4));
        assert_eq!(sections[2].heading, "Requirements");
        assert_eq!(sections[2].lines, LineRange::new(5, 7));
        assert_eq!(sections[2].body_text, "- **FR-001**: a\n- **FR-002**: b");
    }

    #[test]
    fn headings_inside_code_blocks_are_ignored() {
        let text = "# Real\n```\n# not a heading\n```\n";
        let doc = Document::parse("plan.md", text);
        assert_eq!(doc.sections().len(), 1);
        assert_eq!(doc.sections()[0].lines, LineRange::new(1, 4));
    }

    #[test]
    fn mentions_carry_line_numbers() {
        let text = "# Spec\n\n- **FR-010**: System MUST autosave\n- see US-3 and SC-004\n";
        let doc = Document::parse("spec.md", text);

        let fr = &doc.mentions()[0];
        assert_eq!(fr.identifier.kind, IdentifierKind::Requirement);
        assert_eq!(fr.identifier.key, "FR-010");
        assert_eq!(fr.lines, LineRange::single(3));
        assert_eq!(fr.role, MentionRole::Definition);

        let kinds: Vec<_> = doc.mentions()[1..]
            .iter()
            .map(|m| (m.identifier.kind, m.lines.start, m.role))
            .collect();
        assert_eq!(
            kinds,
            vec![
                (IdentifierKind::UserStory, 4, MentionRole::Reference),
                (IdentifierKind::SuccessCriterion, 4, MentionRole::Reference),
            ]
        );
    }

    #[test]
    fn renamed_definitions_are_not_merged() {
        let text = "- **FR-017a**: export outline\n- **FR-042**: export outline\n";
        let doc = Document::parse("spec.md", text);
        let keys: Vec<_> = doc.mentions().iter().map(|m| m.identifier.key.as_str()).collect();
        assert_eq!(keys, vec!["FR-017A", "FR-042"]);
    }

    #[test]
    fn document_kind_from_path() {
        assert_eq!(DocumentKind::from_path("spec.md"), DocumentKind::Spec);
        assert_eq!(DocumentKind::from_path("tasks.md"), DocumentKind::Tasks);
        assert_eq!(DocumentKind::from_path("contracts/api.md"), DocumentKind::Contract);
        assert_eq!(DocumentKind::from_path("README.md"), DocumentKind::Other);
        assert!(DocumentKind::Spec.precedence() < DocumentKind::DataModel.precedence());
    }

    #[test]
    fn line_range_overlap() {
        let a = LineRange::new(139, 155);
        let b = LineRange::new(150, 160);
        assert_eq!(a.intersection_len(&b), 6);
        assert_eq!(a.intersection_len(&LineRange::single(10)), 0);
        assert_eq!(LineRange::new(5, 2), LineRange::new(2, 5));
        assert_eq!(a.to_string(), "139-155");
        assert_eq!(a.span(&b), LineRange::new(139, 160));
        assert_eq!(LineRange::single(3).span(&LineRange::single(1)), LineRange::new(1, 3));
    }

    #[test]
    fn line_accessors() {
        let doc = Document::parse("spec.md", "a\nb\nc");
        assert_eq!(doc.line(2), Some("b"));
        assert_eq!(doc.line(0), None);
        assert_eq!(doc.text_of(LineRange::new(2, 3)), "b\nc");
        assert_eq!(doc.line_count(), 3);
    }
}
