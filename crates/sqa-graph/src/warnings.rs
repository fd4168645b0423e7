//! Non-fatal graph build observations

use serde::{Deserialize, Serialize};
use sqa_document::ParseAnomaly;
use std::collections::BTreeMap;

/// Aggregated warning counters
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphWarnings {
    /// Parse anomalies by kind name
    pub anomalies: BTreeMap<String, usize>,
    /// Identifier-shaped tokens dropped for an unknown prefix
    pub unclassified_identifiers: usize,
    /// Candidate edges rejected by graph invariants
    pub rejected_edges: usize,
    /// Human-readable detail lines, one per observation
    pub details: Vec<String>,
}

impl GraphWarnings {
    /// Record a document's parse anomaly
    pub fn record_anomaly(&mut self, document: &str, anomaly: &ParseAnomaly) {
        *self.anomalies.entry(anomaly.kind_name().to_string()).or_default() += 1;
        if matches!(anomaly, ParseAnomaly::UnclassifiedIdentifier { .. }) {
            self.unclassified_identifiers += 1;
        }
        self.details.push(format!("{document}: {anomaly}"));
    }

    /// Record a rejected edge
    pub fn record_rejected_edge(&mut self, reason: impl Into<String>) {
        self.rejected_edges += 1;
        self.details.push(reason.into());
    }

    /// Total number of observations
    #[must_use]
    pub fn total(&self) -> usize {
        self.anomalies.values().sum::<usize>() + self.rejected_edges
    }

    /// Whether nothing was recorded
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.total() == 0
    }
}
