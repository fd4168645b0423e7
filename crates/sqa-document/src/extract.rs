//! Line-oriented identifier extraction
//!
//! Every line is scanned against a fixed pattern set. Matches become
//! mentions; identifier-shaped definitions with an unknown prefix become
//! anomalies. Everything else is ignored.

use crate::anomaly::ParseAnomaly;
use crate::document::LineRange;
use crate::identifier::{Identifier, IdentifierKind, Mention, MentionRole};
use crate::value::{self, ConstantValue};
use once_cell::sync::Lazy;
use regex::Regex;
use std::ops::Range;

/// Window after a backticked constant name in which a literal may appear
const VALUE_WINDOW: usize = 40;
/// Maximum snippet length in characters
const SNIPPET_CHARS: usize = 160;

static DEFINITION: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*(?:[-*+]\s+|\d+\.\s+)?(?:\[[ xX]\]\s*)?\*\*([A-Z]{1,6})-?(\d+[A-Za-z]*)\*\*")
        .expect("definition pattern is valid")
});

static TASK_ITEM: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*[-*+]\s+\[[ xX]\]\s*(T-?\d+[A-Za-z]?)\b").expect("task item pattern is valid")
});

static REFERENCE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b(FR|SC|US|EDIT|AMB|DUP|GAP|INC|T|U)-?\d+[A-Za-z]?\b")
        .expect("reference pattern is valid")
});

static IDENTIFIER_TOKEN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(FR|SC|US|EDIT|AMB|DUP|GAP|INC|T|U)-?\d+[A-Za-z]?$")
        .expect("identifier token pattern is valid")
});

static ASSIGN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?:^|[^A-Za-z0-9_])`?([A-Z][A-Z0-9_]{3,})`?\s*(?::\s*[A-Za-z0-9_<>\[\]]+\s*)?=\s*([^=>\s][^\n]*)",
    )
    .expect("assignment pattern is valid")
});

static BACKTICK: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"`([A-Z][A-Z0-9_]{3,})`").expect("backtick pattern is valid"));

static QUANTITY: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?:^|[^\w.\-])(\d+(?:\.\d+)?)(\s?[A-Za-z%]+)?").expect("quantity pattern is valid")
});

/// Scan one line, appending mentions in column order
pub(crate) fn scan_line(
    path: &str,
    line_no: usize,
    line: &str,
    mentions: &mut Vec<Mention>,
    anomalies: &mut Vec<ParseAnomaly>,
) {
    let snippet: String = line.trim().chars().take(SNIPPET_CHARS).collect();
    let make = |identifier: Identifier, column: usize, role: MentionRole, value: Option<ConstantValue>| {
        Mention {
            identifier,
            document: path.to_string(),
            lines: LineRange::single(line_no),
            column,
            role,
            value,
            snippet: snippet.clone(),
        }
    };

    let mut found = Vec::new();
    let definition = definition_span(line, line_no, anomalies);

    for caps in REFERENCE.captures_iter(line) {
        let (Some(m), Some(prefix)) = (caps.get(0), caps.get(1)) else {
            continue;
        };
        let Some(kind) = IdentifierKind::from_prefix(prefix.as_str()) else {
            continue;
        };
        let role = if definition.as_ref().is_some_and(|span| span.contains(&m.start())) {
            MentionRole::Definition
        } else {
            MentionRole::Reference
        };
        found.push(make(Identifier::new(kind, m.as_str()), m.start(), role, None));
    }

    let mut assigned: Vec<Range<usize>> = Vec::new();
    for caps in ASSIGN.captures_iter(line) {
        let (Some(name), Some(rhs)) = (caps.get(1), caps.get(2)) else {
            continue;
        };
        if IDENTIFIER_TOKEN.is_match(name.as_str()) {
            continue;
        }
        let Some(raw) = clean_assigned(rhs.as_str()) else {
            continue;
        };
        assigned.push(name.start()..rhs.end());
        let value = ConstantValue::new(name.as_str(), raw);
        found.push(make(
            Identifier::constant(name.as_str()),
            name.start(),
            MentionRole::Definition,
            Some(value),
        ));
    }

    for caps in BACKTICK.captures_iter(line) {
        let (Some(whole), Some(name)) = (caps.get(0), caps.get(1)) else {
            continue;
        };
        if assigned.iter().any(|span| span.contains(&name.start()))
            || IDENTIFIER_TOKEN.is_match(name.as_str())
        {
            continue;
        }
        let Some(raw) = first_quantity(window_after(line, whole.end(), VALUE_WINDOW)) else {
            continue;
        };
        let value = ConstantValue::new(name.as_str(), raw);
        found.push(make(
            Identifier::constant(name.as_str()),
            name.start(),
            MentionRole::Reference,
            Some(value),
        ));
    }

    found.sort_by_key(|m| m.column);
    mentions.extend(found);
}

/// Byte span of the defining token, if the line defines an identifier
fn definition_span(
    line: &str,
    line_no: usize,
    anomalies: &mut Vec<ParseAnomaly>,
) -> Option<Range<usize>> {
    if let Some(caps) = DEFINITION.captures(line) {
        let (prefix, number) = (caps.get(1)?, caps.get(2)?);
        if IdentifierKind::from_prefix(prefix.as_str()).is_none() {
            let token = line[prefix.start()..number.end()].to_string();
            tracing::trace!(line = line_no, token = %token, "unclassified identifier");
            anomalies.push(ParseAnomaly::UnclassifiedIdentifier {
                line: line_no,
                token,
            });
            return None;
        }
        return Some(prefix.start()..number.end());
    }
    TASK_ITEM
        .captures(line)
        .and_then(|caps| caps.get(1))
        .map(|m| m.range())
}

/// Trim an assignment right-hand side down to the literal
fn clean_assigned(rhs: &str) -> Option<String> {
    let mut value = rhs;
    for stop in [",", ";", "//", " #", "|", "`", " (", " -- "] {
        if let Some(idx) = value.find(stop) {
            value = &value[..idx];
        }
    }
    let value = value
        .trim()
        .trim_end_matches('.')
        .trim_matches(|c| c == '"' || c == '\'')
        .trim();
    if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}

fn window_after(line: &str, start: usize, width: usize) -> &str {
    let mut end = start.saturating_add(width).min(line.len());
    while !line.is_char_boundary(end) {
        end -= 1;
    }
    &line[start..end]
}

/// First numeric literal (with a recognized unit, if any) in `window`
fn first_quantity(window: &str) -> Option<String> {
    let caps = QUANTITY.captures(window)?;
    let number = caps.get(1)?;
    let end = caps
        .get(2)
        .filter(|unit| value::is_known_unit(unit.as_str().trim()))
        .map_or(number.end(), |unit| unit.end());
    Some(window[number.start()..end].to_string())
}
