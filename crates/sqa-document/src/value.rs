//! Named-constant literal values
//!
//! Values are compared after normalization: whitespace and case are
//! dropped, durations collapse to milliseconds and sizes to bytes, and a
//! bare number inherits the unit implied by the constant's name
//! (`DEBOUNCE_MS = 300` reads as `300ms`).

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;

static NUMERIC: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(-?\d+(?:\.\d+)?)([a-z%]*)$").expect("numeric value pattern is valid")
});

/// Literal value attached to a named-constant mention
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ConstantValue {
    /// Text as written in the document
    pub raw: String,
    /// Comparison form
    pub normalized: String,
}

impl ConstantValue {
    /// Build a value for the constant named `key`
    #[must_use]
    pub fn new(key: &str, raw: impl Into<String>) -> Self {
        let raw = raw.into();
        let normalized = normalize(key, &raw);
        Self { raw, normalized }
    }
}

impl fmt::Display for ConstantValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

/// Normalize a literal for equality comparison
#[must_use]
pub fn normalize(key: &str, raw: &str) -> String {
    let cleaned: String = raw
        .trim()
        .trim_matches(|c| matches!(c, '"' | '\'' | '`'))
        .chars()
        .filter(|c| !c.is_whitespace() && *c != '_')
        .collect::<String>()
        .to_lowercase();

    let Some(caps) = NUMERIC.captures(&cleaned) else {
        return cleaned;
    };
    let Ok(number) = caps[1].parse::<f64>() else {
        return cleaned;
    };

    let written_unit = &caps[2];
    let unit = if written_unit.is_empty() {
        implied_unit(key)
    } else {
        written_unit
    };

    match canonical_unit(unit) {
        Some((canonical, factor)) => format!("{}{canonical}", format_number(number * factor)),
        None => format!("{}{unit}", format_number(number)),
    }
}

fn implied_unit(key: &str) -> &'static str {
    let key = key.to_ascii_uppercase();
    const SUFFIXES: &[(&str, &str)] = &[
        ("_MS", "ms"),
        ("_MILLIS", "ms"),
        ("_SECS", "s"),
        ("_SECONDS", "s"),
        ("_SEC", "s"),
        ("_S", "s"),
        ("_MINUTES", "min"),
        ("_MIN", "min"),
        ("_BYTES", "b"),
        ("_KB", "kb"),
        ("_MB", "mb"),
    ];
    SUFFIXES
        .iter()
        .find(|(suffix, _)| key.ends_with(suffix))
        .map_or("", |(_, unit)| unit)
}

fn canonical_unit(unit: &str) -> Option<(&'static str, f64)> {
    let mapped = match unit {
        "ms" | "msec" | "millis" | "millisecond" | "milliseconds" => ("ms", 1.0),
        "s" | "sec" | "secs" | "second" | "seconds" => ("ms", 1_000.0),
        "m" | "min" | "mins" | "minute" | "minutes" => ("ms", 60_000.0),
        "h" | "hr" | "hrs" | "hour" | "hours" => ("ms", 3_600_000.0),
        "b" | "byte" | "bytes" => ("b", 1.0),
        "kb" | "kib" => ("b", 1_024.0),
        "mb" | "mib" => ("b", 1_048_576.0),
        "gb" | "gib" => ("b", 1_073_741_824.0),
        "" => ("", 1.0),
        _ => return None,
    };
    Some(mapped)
}

/// Whether `unit` is a recognized quantity unit
pub(crate) fn is_known_unit(unit: &str) -> bool {
    let unit = unit.to_ascii_lowercase();
    !unit.is_empty()
        && (canonical_unit(&unit).is_some() || matches!(unit.as_str(), "%" | "px" | "fps"))
}

#[allow(clippy::cast_possible_truncation)]
fn format_number(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        format!("{value}")
    }
}
