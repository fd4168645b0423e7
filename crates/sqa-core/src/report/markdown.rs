//! Markdown rendering

use super::AnalysisReport;
use std::fmt::{self, Write as _};

/// Markdown view of a report
#[derive(Debug, Clone, Copy)]
pub struct MarkdownReport<'a>(pub &'a AnalysisReport);

/// Escape a value for a single table cell
fn cell(text: &str) -> String {
    let escaped = text.trim().replace('|', "\\|").replace('\n', "<br>");
    if escaped.is_empty() {
        "-".to_string()
    } else {
        escaped
    }
}

fn join<T: fmt::Display>(items: &[T]) -> String {
    let mut out = String::new();
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            out.push_str(", ");
        }
        let _ = write!(out, "{item}");
    }
    out
}

/// Fence that does not occur in `text`
fn fence(text: &str) -> String {
    let mut fence = "```".to_string();
    while text.contains(&fence) {
        fence.push('`');
    }
    fence
}

impl fmt::Display for MarkdownReport<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let report = self.0;
        writeln!(f, "# Specification Analysis Report")?;
        writeln!(f)?;
        writeln!(f, "- Corpus: `{}`", report.corpus)?;
        writeln!(f, "- Documents: {}", join(&report.documents))?;
        writeln!(f, "- Passes: {}", join(&report.passes))?;
        writeln!(f, "- Remediation threshold: {}", report.threshold)?;
        writeln!(f)?;

        self.findings(f)?;
        self.coverage(f)?;
        self.remediation(f)?;

        if !report.pass_failures.is_empty() {
            writeln!(f, "## Pass Failures")?;
            writeln!(f)?;
            for failure in &report.pass_failures {
                writeln!(f, "- `{}`: {}", failure.pass, failure.reason)?;
            }
            writeln!(f)?;
        }

        if report.warnings.total > 0 {
            writeln!(f, "## Warnings")?;
            writeln!(f)?;
            for (kind, count) in &report.warnings.counts {
                writeln!(f, "- {kind}: {count}")?;
            }
            for detail in &report.warnings.details {
                writeln!(f, "  - {detail}")?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

impl MarkdownReport<'_> {
    fn findings(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let report = self.0;
        writeln!(f, "## Findings")?;
        writeln!(f)?;
        if report.findings.is_empty() {
            writeln!(f, "No findings.")?;
            writeln!(f)?;
            return Ok(());
        }
        writeln!(f, "| ID | Category | Severity | Status | Location(s) | Summary | Recommendation |")?;
        writeln!(f, "|----|----------|----------|--------|-------------|---------|----------------|")?;
        for finding in &report.findings {
            let id = if finding.is_merged() {
                format!(
                    "{} (merged {})",
                    finding.id,
                    finding.source_ids().collect::<Vec<_>>().join(", ")
                )
            } else {
                finding.id.clone()
            };
            writeln!(
                f,
                "| {} | {} | {} | {} | {} | {} | {} |",
                cell(&id),
                cell(&finding.category),
                finding.severity,
                finding.status,
                cell(&join(&finding.locations)),
                cell(&finding.summary),
                cell(&finding.recommendation),
            )?;
        }
        writeln!(f)?;

        let counts = report.severity_counts();
        let summary: Vec<String> = counts
            .iter()
            .rev()
            .map(|(severity, count)| format!("{severity}: {count}"))
            .collect();
        writeln!(f, "Totals: {}", summary.join(", "))?;
        writeln!(f)
    }

    fn coverage(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let matrix = &self.0.coverage;
        writeln!(f, "## Coverage")?;
        writeln!(f)?;
        if !matrix.tasks_file_present {
            if matrix.covered_count() == 0 {
                writeln!(f, "No tasks file found; every requirement is uncovered.")?;
            } else {
                writeln!(
                    f,
                    "No tasks file found; coverage comes from tasks cited in other documents."
                )?;
            }
            writeln!(f)?;
        }
        if !matrix.rows.is_empty() {
            writeln!(f, "| Requirement | State | Tasks | Defined at |")?;
            writeln!(f, "|-------------|-------|-------|------------|")?;
            for row in &matrix.rows {
                let location = row.location.as_ref().map(ToString::to_string).unwrap_or_default();
                writeln!(
                    f,
                    "| {} | {} | {} | {} |",
                    row.identifier,
                    row.state,
                    cell(&join(&row.tasks)),
                    cell(&location),
                )?;
            }
            writeln!(f)?;
        }
        writeln!(
            f,
            "Covered: {} of {} ({:.1}%)",
            matrix.covered_count(),
            matrix.rows.len(),
            matrix.coverage_percent()
        )?;
        if !matrix.orphan_tasks.is_empty() {
            writeln!(f, "Orphan tasks: {}", join(&matrix.orphan_tasks))?;
        }
        writeln!(f)
    }

    fn remediation(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let report = self.0;
        writeln!(f, "## Remediation")?;
        writeln!(f)?;
        if report.remediation.is_empty() {
            writeln!(f, "No edits at or above {}.", report.threshold)?;
            writeln!(f)?;
            return Ok(());
        }
        writeln!(f, "Apply in order: {}", join(&report.edit_order))?;
        writeln!(f)?;

        for file in &report.remediation {
            writeln!(f, "### {}", file.document)?;
            writeln!(f)?;
            for edit in &file.edits {
                write!(f, "#### {} (line {}, resolves {}", edit.id, edit.lines, edit.finding)?;
                if !edit.depends_on.is_empty() {
                    write!(f, ", after {}", join(&edit.depends_on))?;
                }
                writeln!(f, ")")?;
                writeln!(f)?;
                for (label, text) in [("Before", &edit.before_text), ("After", &edit.after_text)] {
                    let fence = fence(text);
                    writeln!(f, "{label}:")?;
                    writeln!(f)?;
                    writeln!(f, "{fence}markdown")?;
                    writeln!(f, "{text}")?;
                    writeln!(f, "{fence}")?;
                    writeln!(f)?;
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::super::tests::sample;
    use super::*;
    use crate::coverage::{CoverageMatrix, CoverageRow, CoverageState};
    use crate::remediation::{RemediationEdit, RemediationPlan};
    use sqa_document::{Identifier, LineRange};

    #[test]
    fn pipes_and_newlines_are_escaped() {
        assert_eq!(cell("a | b\nc"), "a \\| b<br>c");
        assert_eq!(cell("  "), "-");
    }

    #[test]
    fn fences_avoid_content() {
        assert_eq!(fence("plain"), "```");
        assert_eq!(fence("has ``` inside"), "````");
    }

    #[test]
    fn sections_rendered() {
        let plan = RemediationPlan {
            edits: vec![RemediationEdit {
                id: "EDIT-001".to_string(),
                target_document: "tasks.md".to_string(),
                lines: LineRange::single(2),
                before_text: "- [ ] T001 Setup".to_string(),
                after_text: "- [ ] T001 Setup\n- [ ] T002 Implement FR-002".to_string(),
                depends_on: Vec::new(),
                finding: "GAP-001".to_string(),
            }],
        };
        let markdown = sample().with_plan(&plan).to_markdown();

        assert!(markdown.contains("| GAP-001 | coverage-gap | HIGH | Partial | spec.md:3 |"));
        assert!(markdown.contains("Add a task \\| implementing FR-002"));
        assert!(markdown.contains("No tasks file found"));
        assert!(markdown.contains("Apply in order: EDIT-001"));
        assert!(markdown.contains("#### EDIT-001 (line 2, resolves GAP-001)"));
        assert!(markdown.contains("- `ambiguity`: timed out after 50ms"));
        assert!(!markdown.contains("## Warnings"));
    }

    #[test]
    fn missing_tasks_banner_follows_rows() {
        let row = |key: &str, state: CoverageState| CoverageRow {
            identifier: Identifier::requirement(key),
            state,
            tasks: match state {
                CoverageState::Covered => vec![Identifier::task("T001")],
                CoverageState::Missing => Vec::new(),
            },
            references: 1,
            location: None,
        };
        let mut report = sample();
        report.coverage = CoverageMatrix {
            rows: vec![row("FR-001", CoverageState::Covered), row("FR-002", CoverageState::Missing)],
            orphan_tasks: Vec::new(),
            tasks_file_present: false,
        };
        let markdown = report.to_markdown();
        assert!(markdown.contains("coverage comes from tasks cited in other documents"));
        assert!(!markdown.contains("every requirement is uncovered"));

        report.coverage.rows.remove(0);
        assert!(report.to_markdown().contains("every requirement is uncovered"));
    }
}
