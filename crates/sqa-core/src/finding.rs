//! Findings and pass failure records
//!
//! A [`Finding`] is created by exactly one pass and never mutated after the
//! pass returns it. Deduplication builds new records that reference findings
//! instead of changing them.

use crate::severity::{ImpactScore, ReportedSeverity, Severity};
use serde::{Deserialize, Serialize};
use sqa_document::{Identifier, LineRange, Mention};
use std::cmp::Ordering;
use std::fmt;

/// How complete the checked item is, ordered `Clear < Partial < Missing`
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "kebab-case")]
pub enum FindingStatus {
    /// Present and acceptable; informational
    Clear,
    /// Present but deficient
    #[default]
    Partial,
    /// Absent
    Missing,
}

impl fmt::Display for FindingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Clear => "Clear",
            Self::Partial => "Partial",
            Self::Missing => "Missing",
        })
    }
}

/// Line range in one document
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Location {
    /// Corpus-relative document path
    pub document: String,
    /// Lines cited
    pub lines: LineRange,
}

impl Location {
    /// Create a location
    #[inline]
    #[must_use]
    pub fn new(document: impl Into<String>, lines: LineRange) -> Self {
        Self {
            document: document.into(),
            lines,
        }
    }

    /// Location of a mention
    #[must_use]
    pub fn of(mention: &Mention) -> Self {
        Self::new(mention.document.clone(), mention.lines)
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.document, self.lines)
    }
}

/// One detected issue
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Finding {
    /// Pass-scoped identifier (`AMB-003`)
    pub id: String,
    /// Name of the producing pass
    pub pass: String,
    /// Issue category (`ambiguity`, `coverage-gap`, ...)
    pub category: String,
    /// Completeness status
    pub status: FindingStatus,
    /// Severity as reported by the pass
    pub severity: ReportedSeverity,
    /// Cited locations, sorted and distinct
    pub locations: Vec<Location>,
    /// One-line description
    pub summary: String,
    /// Suggested fix
    pub recommendation: String,
    /// Identifiers the finding is about
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub subjects: Vec<Identifier>,
}

impl Finding {
    /// Create a finding with `Partial` status and MEDIUM severity
    #[must_use]
    pub fn new(
        id: impl Into<String>,
        pass: impl Into<String>,
        category: impl Into<String>,
        summary: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            pass: pass.into(),
            category: category.into(),
            status: FindingStatus::default(),
            severity: ReportedSeverity::default(),
            locations: Vec::new(),
            summary: summary.into(),
            recommendation: String::new(),
            subjects: Vec::new(),
        }
    }

    /// With status
    #[inline]
    #[must_use]
    pub fn with_status(mut self, status: FindingStatus) -> Self {
        self.status = status;
        self
    }

    /// With a qualitative severity
    #[inline]
    #[must_use]
    pub fn with_severity(mut self, severity: Severity) -> Self {
        self.severity = ReportedSeverity::Level(severity);
        self
    }

    /// With an impact score
    #[inline]
    #[must_use]
    pub fn with_impact(mut self, score: ImpactScore) -> Self {
        self.severity = ReportedSeverity::Impact(score);
        self
    }

    /// With an additional location
    #[must_use]
    pub fn with_location(mut self, document: impl Into<String>, lines: LineRange) -> Self {
        self.locations.push(Location::new(document, lines));
        self.locations.sort();
        self.locations.dedup();
        self
    }

    /// With additional locations
    #[must_use]
    pub fn with_locations(mut self, locations: impl IntoIterator<Item = Location>) -> Self {
        self.locations.extend(locations);
        self.locations.sort();
        self.locations.dedup();
        self
    }

    /// With recommendation text
    #[inline]
    #[must_use]
    pub fn with_recommendation(mut self, recommendation: impl Into<String>) -> Self {
        self.recommendation = recommendation.into();
        self
    }

    /// With a subject identifier
    #[must_use]
    pub fn with_subject(mut self, subject: Identifier) -> Self {
        if !self.subjects.contains(&subject) {
            self.subjects.push(subject);
            self.subjects.sort();
        }
        self
    }

    /// Normalized severity
    #[inline]
    #[must_use]
    pub fn severity(&self) -> Severity {
        self.severity.normalize()
    }

    /// Smallest location, used for ordering
    #[inline]
    #[must_use]
    pub fn primary_location(&self) -> Option<&Location> {
        self.locations.first()
    }
}

/// Output order: `(document, start line, pass, id)` of the primary location.
///
/// Findings without a location sort first.
#[must_use]
pub fn output_order(
    a: (Option<&Location>, &str, &str),
    b: (Option<&Location>, &str, &str),
) -> Ordering {
    fn key<'a>(
        (loc, pass, id): (Option<&'a Location>, &'a str, &'a str),
    ) -> (&'a str, usize, &'a str, &'a str) {
        (
            loc.map_or("", |l| l.document.as_str()),
            loc.map_or(0, |l| l.lines.start),
            pass,
            id,
        )
    }
    key(a).cmp(&key(b))
}

/// Sort findings into output order
pub fn sort_findings(findings: &mut [Finding]) {
    findings.sort_by(|a, b| {
        output_order(
            (a.primary_location(), &a.pass, &a.id),
            (b.primary_location(), &b.pass, &b.id),
        )
        .then_with(|| a.locations.cmp(&b.locations))
    });
}

/// Why a pass produced no findings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum FailureReason {
    /// Pass returned an error
    Error {
        /// Error message
        message: String,
    },
    /// Pass panicked
    Panic {
        /// Panic payload, if it was a string
        message: String,
    },
    /// Pass did not return within the timeout; its worker was abandoned
    Timeout {
        /// Timeout that elapsed
        after_ms: u64,
    },
}

impl fmt::Display for FailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Error { message } => write!(f, "error: {message}"),
            Self::Panic { message } => write!(f, "panicked: {message}"),
            Self::Timeout { after_ms } => write!(f, "timed out after {after_ms}ms"),
        }
    }
}

/// Meta-record for a pass that failed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PassFailure {
    /// Pass name
    pub pass: String,
    /// What went wrong
    pub reason: FailureReason,
}

impl fmt::Display for PassFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "pass '{}' {}", self.pass, self.reason)
    }
}
