//! Testing utilities for the SQA workspace
//!
//! Shared fixtures: corpus directories, finding builders, and stub passes
//! that fail, panic, or stall on purpose.

#![allow(missing_docs)]
#![allow(clippy::missing_panics_doc)]

use sqa_core::{Detector, DetectorError, Finding, ImpactScore, Severity};
use sqa_document::{Document, LineRange};
use sqa_graph::CrossReferenceGraph;
use std::fs;
use std::time::Duration;
use tempfile::TempDir;

/// Small corpus that exercises every pass and every finding category
pub const EDITOR_SPEC: &str = "\
# Feature Specification: Draft Editor

## Requirements

- **FR-001**: System MUST autosave drafts
- **FR-002**: Outline MUST refresh within `OUTLINE_UPDATE_DEBOUNCE_MS` 500ms of an edit
- **FR-003**: Export format is TBD
- **FR-004**: Search must be fast

## Success Criteria

- **SC-001**: Editor opens a 10 MB file in under 2 seconds
";

pub const EDITOR_PLAN: &str = "\
# Implementation Plan

Outline refresh is driven by the parser. FR-002 is handled by the outline worker.
";

pub const EDITOR_TASKS: &str = "\
# Tasks

- [ ] T001 Set up project structure
- [ ] T002 Implement autosave for FR-001
- [ ] T003 Outline worker for FR-002
";

pub const EDITOR_DATA_MODEL: &str = "\
# Data Model

OUTLINE_UPDATE_DEBOUNCE_MS = 300
";

/// Temporary corpus directory holding `files` (`(relative path, text)`)
pub fn corpus_dir(files: &[(&str, &str)]) -> TempDir {
    let dir = TempDir::new().expect("create temp dir");
    for (path, text) in files {
        let target = dir.path().join(path);
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent).expect("create corpus subdir");
        }
        fs::write(target, text).expect("write corpus file");
    }
    dir
}

/// The draft editor corpus on disk
pub fn editor_corpus() -> TempDir {
    corpus_dir(&[
        ("spec.md", EDITOR_SPEC),
        ("plan.md", EDITOR_PLAN),
        ("tasks.md", EDITOR_TASKS),
        ("data-model.md", EDITOR_DATA_MODEL),
    ])
}

/// Parse `(path, text)` pairs
pub fn documents(files: &[(&str, &str)]) -> Vec<Document> {
    files
        .iter()
        .map(|(path, text)| Document::parse(*path, *text))
        .collect()
}

/// Finding on one line range of one document
pub fn finding_at(id: &str, pass: &str, document: &str, start: usize, end: usize, summary: &str) -> Finding {
    Finding::new(id, pass, "test", summary).with_location(document, LineRange::new(start, end))
}

/// Finding with an impact score instead of a severity level
pub fn scored_finding(id: &str, pass: &str, score: u8, summary: &str) -> Finding {
    let impact = ImpactScore::new(score).expect("impact score in 1..=5");
    Finding::new(id, pass, "test", summary).with_impact(impact)
}

/// Pass that returns a fixed set of findings
#[derive(Debug, Clone)]
pub struct StaticDetector {
    name: String,
    findings: Vec<Finding>,
}

impl StaticDetector {
    pub fn new(name: impl Into<String>, findings: Vec<Finding>) -> Self {
        Self {
            name: name.into(),
            findings,
        }
    }

    /// `count` LOW findings on consecutive lines of `spec.md`
    pub fn with_count(name: &str, count: usize) -> Self {
        let findings = (1..=count)
            .map(|i| {
                Finding::new(format!("{name}-{i:03}"), name, "test", format!("{name} finding {i}"))
                    .with_severity(Severity::Low)
                    .with_location("spec.md", LineRange::single(i * 10))
            })
            .collect();
        Self::new(name, findings)
    }
}

impl Detector for StaticDetector {
    fn name(&self) -> &str {
        &self.name
    }

    fn detect(&self, _: &[Document], _: &CrossReferenceGraph) -> Result<Vec<Finding>, DetectorError> {
        Ok(self.findings.clone())
    }
}

/// Pass that always returns an error
#[derive(Debug, Clone)]
pub struct FailingDetector(pub &'static str);

impl Detector for FailingDetector {
    fn name(&self) -> &str {
        self.0
    }

    fn detect(&self, _: &[Document], _: &CrossReferenceGraph) -> Result<Vec<Finding>, DetectorError> {
        Err(DetectorError::failed("backend unavailable"))
    }
}

/// Pass that always panics
#[derive(Debug, Clone)]
pub struct PanickingDetector(pub &'static str);

impl Detector for PanickingDetector {
    fn name(&self) -> &str {
        self.0
    }

    fn detect(&self, _: &[Document], _: &CrossReferenceGraph) -> Result<Vec<Finding>, DetectorError> {
        panic!("detector exploded")
    }
}

/// Pass that sleeps before returning nothing
#[derive(Debug, Clone)]
pub struct SlowDetector {
    pub name: &'static str,
    pub delay: Duration,
}

impl Detector for SlowDetector {
    fn name(&self) -> &str {
        self.name
    }

    fn detect(&self, _: &[Document], _: &CrossReferenceGraph) -> Result<Vec<Finding>, DetectorError> {
        std::thread::sleep(self.delay);
        Ok(Vec::new())
    }
}
