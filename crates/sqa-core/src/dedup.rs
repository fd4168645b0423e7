//! Finding deduplication
//!
//! Two findings are merge candidates when, for at least one shared
//! document, the overlap ratio of their cited line sets exceeds the overlap
//! threshold and the token-set Jaccard similarity of their summaries
//! exceeds the similarity threshold. Candidates form equivalence classes via
//! union-find, and each class becomes one [`CanonicalFinding`].
//!
//! Merging repeats over the canonical records until no candidates remain,
//! which makes `merge(dedup(F)) == dedup(F)`.
//!
//! Merging is transitive over unions. Candidates chain through union-find
//! within a round, and later rounds compare against each merged record's
//! combined locations and representative summary. Two findings that are not
//! candidates of each other can therefore end up in one record.

use crate::config::DedupPolicy;
use crate::finding::{output_order, Finding, FindingStatus, Location};
use crate::severity::Severity;
use crate::text::{jaccard, tokenize};
use crate::union_find::UnionFind;
use serde::{Deserialize, Serialize};
use sqa_document::Identifier;
use std::collections::{BTreeMap, BTreeSet};

/// One or more findings collapsed into a single record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CanonicalFinding {
    /// Lowest member id
    pub id: String,
    /// Distinct producing passes, sorted
    pub passes: Vec<String>,
    /// Category of the most severe member
    pub category: String,
    /// Worst member status
    pub status: FindingStatus,
    /// Maximum normalized member severity
    pub severity: Severity,
    /// Union of member locations, sorted
    pub locations: Vec<Location>,
    /// Summary of the most severe member
    pub summary: String,
    /// Distinct member recommendations in member id order, one per line
    pub recommendation: String,
    /// Union of member subjects
    pub subjects: Vec<Identifier>,
    /// Source findings, sorted by `(id, pass)`
    pub members: Vec<Finding>,
}

impl CanonicalFinding {
    /// Aggregate `members`; `None` if there are none
    #[must_use]
    pub fn from_members(mut members: Vec<Finding>) -> Option<Self> {
        members.sort_by(|a, b| (&a.id, &a.pass, &a.locations).cmp(&(&b.id, &b.pass, &b.locations)));
        members.dedup();

        let first = members.first()?;
        let representative = members
            .iter()
            .enumerate()
            .max_by(|(ia, a), (ib, b)| a.severity().cmp(&b.severity()).then(ib.cmp(ia)))
            .map_or(first, |(_, f)| f);

        let passes: BTreeSet<&str> = members.iter().map(|f| f.pass.as_str()).collect();
        let locations: BTreeSet<&Location> = members.iter().flat_map(|f| &f.locations).collect();
        let subjects: BTreeSet<&Identifier> = members.iter().flat_map(|f| &f.subjects).collect();
        let mut recommendations: Vec<&str> = Vec::new();
        for member in &members {
            let text = member.recommendation.trim();
            if !text.is_empty() && !recommendations.contains(&text) {
                recommendations.push(text);
            }
        }

        Some(Self {
            id: first.id.clone(),
            passes: passes.into_iter().map(str::to_string).collect(),
            category: representative.category.clone(),
            status: members.iter().map(|f| f.status).max().unwrap_or_default(),
            severity: members.iter().map(Finding::severity).max().unwrap_or_default(),
            locations: locations.into_iter().cloned().collect(),
            summary: representative.summary.clone(),
            recommendation: recommendations.join("\n"),
            subjects: subjects.into_iter().cloned().collect(),
            members,
        })
    }

    /// Wrap a single finding
    #[must_use]
    pub fn single(finding: Finding) -> Self {
        Self {
            id: finding.id.clone(),
            passes: vec![finding.pass.clone()],
            category: finding.category.clone(),
            status: finding.status,
            severity: finding.severity(),
            locations: finding.locations.clone(),
            summary: finding.summary.clone(),
            recommendation: finding.recommendation.trim().to_string(),
            subjects: finding.subjects.clone(),
            members: vec![finding],
        }
    }

    /// Ids of the source findings
    pub fn source_ids(&self) -> impl Iterator<Item = &str> {
        self.members.iter().map(|f| f.id.as_str())
    }

    /// Whether more than one finding was merged
    #[inline]
    #[must_use]
    pub fn is_merged(&self) -> bool {
        self.members.len() > 1
    }

    /// Smallest location
    #[inline]
    #[must_use]
    pub fn primary_location(&self) -> Option<&Location> {
        self.locations.first()
    }

    fn first_pass(&self) -> &str {
        self.passes.first().map_or("", String::as_str)
    }
}

/// Sort canonical findings into output order
pub fn sort_canonical(findings: &mut [CanonicalFinding]) {
    findings.sort_by(|a, b| {
        output_order(
            (a.primary_location(), a.first_pass(), &a.id),
            (b.primary_location(), b.first_pass(), &b.id),
        )
        .then_with(|| a.locations.cmp(&b.locations))
        .then_with(|| a.members.len().cmp(&b.members.len()))
    });
}

/// Union-find deduplicator
#[derive(Debug, Clone, Copy, Default)]
pub struct Deduplicator {
    policy: DedupPolicy,
}

impl Deduplicator {
    /// Create a deduplicator
    #[inline]
    #[must_use]
    pub fn new(policy: DedupPolicy) -> Self {
        Self { policy }
    }

    /// Collapse overlapping findings
    #[must_use]
    pub fn dedup(&self, findings: &[Finding]) -> Vec<CanonicalFinding> {
        let groups = findings.iter().map(|f| vec![f.clone()]).collect();
        let out = self.collapse(groups);
        tracing::info!(input = findings.len(), output = out.len(), "deduplicated findings");
        out
    }

    /// Merge already-canonical findings further; a fixpoint of `dedup`
    #[must_use]
    pub fn merge(&self, canonical: &[CanonicalFinding]) -> Vec<CanonicalFinding> {
        self.collapse(canonical.iter().map(|c| c.members.clone()).collect())
    }

    /// Whether two location/summary pairs would merge
    #[must_use]
    pub fn are_candidates(&self, a: (&[Location], &str), b: (&[Location], &str)) -> bool {
        self.overlaps(a.0, b.0) && jaccard(&tokenize(a.1), &tokenize(b.1)) > self.policy.similarity_threshold
    }

    #[allow(clippy::cast_precision_loss)]
    fn overlaps(&self, a: &[Location], b: &[Location]) -> bool {
        let a = line_sets(a);
        let b = line_sets(b);
        a.iter().any(|(document, lines_a)| {
            b.get(document).is_some_and(|lines_b| {
                let shared = lines_a.intersection(lines_b).count();
                let union = lines_a.len() + lines_b.len() - shared;
                union > 0 && (shared as f64 / union as f64) > self.policy.overlap_threshold
            })
        })
    }

    fn collapse(&self, groups: Vec<Vec<Finding>>) -> Vec<CanonicalFinding> {
        let mut current: Vec<CanonicalFinding> = groups
            .into_iter()
            .filter_map(CanonicalFinding::from_members)
            .collect();
        sort_canonical(&mut current);

        loop {
            let tokens: Vec<BTreeSet<String>> = current.iter().map(|c| tokenize(&c.summary)).collect();
            let mut sets = UnionFind::new(current.len());
            let mut merged = false;

            for i in 0..current.len() {
                for j in (i + 1)..current.len() {
                    if sets.find(i) == sets.find(j) {
                        continue;
                    }
                    if jaccard(&tokens[i], &tokens[j]) > self.policy.similarity_threshold
                        && self.overlaps(&current[i].locations, &current[j].locations)
                    {
                        sets.union(i, j);
                        merged = true;
                    }
                }
            }

            if !merged {
                break;
            }

            let mut classes: BTreeMap<usize, Vec<Finding>> = BTreeMap::new();
            for (i, canonical) in current.into_iter().enumerate() {
                classes.entry(sets.find(i)).or_default().extend(canonical.members);
            }
            current = classes
                .into_values()
                .filter_map(CanonicalFinding::from_members)
                .collect();
            sort_canonical(&mut current);
        }

        current
    }
}

fn line_sets(locations: &[Location]) -> BTreeMap<&str, BTreeSet<usize>> {
    let mut sets: BTreeMap<&str, BTreeSet<usize>> = BTreeMap::new();
    for location in locations {
        sets.entry(location.document.as_str())
            .or_default()
            .extend(location.lines.lines());
    }
    sets
}
