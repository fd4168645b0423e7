//! Named-constant value drift
//!
//! Constant mentions are grouped by key. A key whose mentions carry more
//! than one normalized value is `CONFLICTING`.

use serde::{Deserialize, Serialize};
use sqa_document::{DocumentKind, Identifier, Mention};
use std::collections::BTreeMap;

/// One distinct normalized value and the mentions asserting it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValueVariant {
    /// Normalized comparison form
    pub normalized: String,
    /// Mentions carrying this value
    pub mentions: Vec<Mention>,
}

impl ValueVariant {
    /// Raw spelling of the first mention
    #[must_use]
    pub fn raw(&self) -> &str {
        self.mentions
            .first()
            .and_then(|m| m.value.as_ref())
            .map_or(self.normalized.as_str(), |v| v.raw.as_str())
    }
}

/// A constant asserted with two or more distinct values
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValueConflict {
    /// Conflicting constant
    pub constant: Identifier,
    /// Distinct values, in normalized order
    pub variants: Vec<ValueVariant>,
}

impl ValueConflict {
    /// Every mention across all variants
    pub fn mentions(&self) -> impl Iterator<Item = &Mention> {
        self.variants.iter().flat_map(|v| v.mentions.iter())
    }

    /// Variant asserted by the highest-precedence document.
    ///
    /// Ties prefer definitions over references, then the earliest line.
    #[must_use]
    pub fn canonical(&self) -> Option<&ValueVariant> {
        self.variants.iter().min_by_key(|variant| {
            variant
                .mentions
                .iter()
                .map(|m| {
                    (
                        DocumentKind::from_path(&m.document).precedence(),
                        !m.is_definition(),
                        m.document.as_str(),
                        m.lines.start,
                    )
                })
                .min()
        })
    }
}

/// Group valued constant mentions by key, then by normalized value
pub(crate) fn group_values<'a>(
    mentions: impl IntoIterator<Item = &'a Mention>,
) -> BTreeMap<Identifier, BTreeMap<String, Vec<Mention>>> {
    let mut groups: BTreeMap<Identifier, BTreeMap<String, Vec<Mention>>> = BTreeMap::new();
    for mention in mentions {
        if let Some(value) = &mention.value {
            groups
                .entry(mention.identifier.clone())
                .or_default()
                .entry(value.normalized.clone())
                .or_default()
                .push(mention.clone());
        }
    }
    groups
}

/// Conflict records for every key with more than one value
pub(crate) fn conflicts(groups: &BTreeMap<Identifier, BTreeMap<String, Vec<Mention>>>) -> Vec<ValueConflict> {
    groups
        .iter()
        .filter(|(_, values)| values.len() > 1)
        .map(|(constant, values)| ValueConflict {
            constant: constant.clone(),
            variants: values
                .iter()
                .map(|(normalized, mentions)| ValueVariant {
                    normalized: normalized.clone(),
                    mentions: mentions.clone(),
                })
                .collect(),
        })
        .collect()
}

/// Pairs of distinct constants sharing a normalized value
pub(crate) fn shared_values(
    groups: &BTreeMap<Identifier, BTreeMap<String, Vec<Mention>>>,
) -> Vec<(Identifier, Identifier)> {
    let mut by_value: BTreeMap<&str, Vec<&Identifier>> = BTreeMap::new();
    for (constant, values) in groups {
        for normalized in values.keys() {
            by_value.entry(normalized.as_str()).or_default().push(constant);
        }
    }

    let mut pairs = Vec::new();
    for constants in by_value.values() {
        for (i, a) in constants.iter().enumerate() {
            for b in &constants[i + 1..] {
                pairs.push(((*a).clone(), (*b).clone()));
            }
        }
    }
    pairs.sort();
    pairs.dedup();
    pairs
}
