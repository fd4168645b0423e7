use pretty_assertions::assert_eq;
use sqa_core::{
    AnalysisConfig, AnalysisError, Analyzer, CoverageState, Corpus, FailureReason, Finding, IngestError,
    PassRegistry, RemediationError, Severity,
};
use sqa_document::{Identifier, LineRange};
use sqa_test_utils::{
    corpus_dir, editor_corpus, FailingDetector, PanickingDetector, SlowDetector, StaticDetector,
};
use std::sync::Arc;
use std::time::Duration;

fn analyzer_with(passes: Vec<Arc<dyn sqa_core::Detector>>, config: AnalysisConfig) -> Analyzer {
    let mut registry = PassRegistry::new();
    for pass in passes {
        registry.register_arc(pass);
    }
    Analyzer::with_registry(config, registry).unwrap()
}

#[tokio::test]
async fn scenario_a_task_line_covers_requirement() {
    let spec = format!("# Spec\n{}- **FR-010**: System MUST save drafts\n", "\n".repeat(10));
    let tasks = format!("# Tasks\n{}- [ ] T020 implements FR-010\n", "\n".repeat(38));
    let dir = corpus_dir(&[("spec.md", &spec), ("tasks.md", &tasks)]);

    let report = Analyzer::new(AnalysisConfig::new())
        .unwrap()
        .analyze_dir(dir.path())
        .await
        .unwrap();

    let row = report.coverage.row(&Identifier::requirement("FR-010")).unwrap();
    assert_eq!(row.state, CoverageState::Covered);
    assert_eq!(row.tasks, vec![Identifier::task("T020")]);
    assert_eq!(row.location.as_ref().map(|l| l.lines), Some(LineRange::single(12)));
}

#[tokio::test]
async fn scenario_b_constant_drift_is_one_high_finding() {
    let dir = corpus_dir(&[
        (
            "spec.md",
            "# Spec\n\nThe outline refreshes after `OUTLINE_UPDATE_DEBOUNCE_MS` 500ms of idle time.\n",
        ),
        ("data-model.md", "# Data Model\n\nOUTLINE_UPDATE_DEBOUNCE_MS = 300\n"),
    ]);

    let report = Analyzer::new(AnalysisConfig::new())
        .unwrap()
        .analyze_dir(dir.path())
        .await
        .unwrap();

    let drift: Vec<_> = report
        .findings
        .iter()
        .filter(|f| f.category == "inconsistency")
        .collect();
    assert_eq!(drift.len(), 1);
    assert_eq!(drift[0].severity, Severity::High);
    let documents: Vec<&str> = drift[0].locations.iter().map(|l| l.document.as_str()).collect();
    assert_eq!(documents, vec!["data-model.md", "spec.md"]);
    assert!(drift[0].summary.contains("300"));
    assert!(drift[0].summary.contains("500ms"));

    let edit = report
        .remediation
        .iter()
        .flat_map(|file| &file.edits)
        .find(|e| e.target_document == "data-model.md")
        .unwrap();
    assert_eq!(edit.after_text, "OUTLINE_UPDATE_DEBOUNCE_MS = 500");
}

#[tokio::test]
async fn scenario_c_three_passes_merge_into_one() {
    let at = |id: &str, pass: &str, summary: &str| {
        Finding::new(id, pass, "duplication", summary).with_location("spec.md", LineRange::new(139, 155))
    };
    let passes: Vec<Arc<dyn sqa_core::Detector>> = vec![
        Arc::new(StaticDetector::new(
            "alpha",
            vec![at("A-001", "alpha", "500ms debounce value duplicated in spec section").with_severity(Severity::Low)],
        )),
        Arc::new(StaticDetector::new(
            "beta",
            vec![at("B-001", "beta", "500ms debounce value duplicated in spec section text")
                .with_impact(sqa_core::ImpactScore::new(3).unwrap())],
        )),
        Arc::new(StaticDetector::new(
            "gamma",
            vec![at("C-001", "gamma", "Duplicated 500ms debounce value in spec section").with_severity(Severity::High)],
        )),
    ];

    let report = analyzer_with(passes, AnalysisConfig::new())
        .analyze(Corpus::from_documents("mem", Vec::new()))
        .await
        .unwrap();

    assert_eq!(report.findings.len(), 1);
    let merged = &report.findings[0];
    assert_eq!(merged.severity, Severity::High);
    assert_eq!(merged.passes, vec!["alpha", "beta", "gamma"]);
    assert_eq!(merged.source_ids().collect::<Vec<_>>(), vec!["A-001", "B-001", "C-001"]);
    assert_eq!(merged.id, "A-001");
}

#[tokio::test]
async fn scenario_d_missing_tasks_file_degrades() {
    let dir = corpus_dir(&[
        ("spec.md", "# Spec\n- **FR-001**: System MUST save drafts\n- **FR-002**: System MUST export PDF\n"),
        ("plan.md", "# Plan\nStorage lives in the workspace folder.\n"),
    ]);

    let report = Analyzer::new(AnalysisConfig::new())
        .unwrap()
        .analyze_dir(dir.path())
        .await
        .unwrap();

    assert!(!report.coverage.tasks_file_present);
    assert_eq!(report.coverage.rows.len(), 2);
    assert!(report.coverage.rows.iter().all(|r| r.state == CoverageState::Missing));

    let gaps: Vec<_> = report
        .findings
        .iter()
        .filter(|f| f.category == "coverage-gap")
        .collect();
    assert_eq!(gaps.len(), 2);
    for gap in gaps {
        assert_eq!(gap.severity, Severity::Medium);
        assert!(gap.summary.contains("no tasks file found"));
    }
    assert!(report.pass_failures.is_empty());
    assert!(report.to_markdown().contains("No tasks file found"));
}

#[tokio::test]
async fn failing_passes_do_not_reduce_other_findings() {
    let healthy = || -> Arc<dyn sqa_core::Detector> { Arc::new(StaticDetector::with_count("alpha", 3)) };
    let corpus = || Corpus::from_documents("mem", Vec::new());

    let baseline = analyzer_with(vec![healthy()], AnalysisConfig::new())
        .analyze(corpus())
        .await
        .unwrap();
    let noisy = analyzer_with(
        vec![
            healthy(),
            Arc::new(FailingDetector("broken")),
            Arc::new(PanickingDetector("panicky")),
        ],
        AnalysisConfig::new(),
    )
    .analyze(corpus())
    .await
    .unwrap();

    assert_eq!(noisy.findings, baseline.findings);
    assert_eq!(noisy.findings.len(), 3);
    assert_eq!(noisy.pass_failures.len(), 2);
    assert_eq!(noisy.pass_failures[0].pass, "broken");
    assert!(matches!(noisy.pass_failures[0].reason, FailureReason::Error { .. }));
    assert_eq!(
        noisy.pass_failures[1].reason,
        FailureReason::Panic {
            message: "detector exploded".to_string()
        }
    );
}

#[tokio::test]
async fn slow_pass_times_out() {
    let passes: Vec<Arc<dyn sqa_core::Detector>> = vec![
        Arc::new(SlowDetector {
            name: "sluggish",
            delay: Duration::from_millis(400),
        }),
        Arc::new(StaticDetector::with_count("alpha", 1)),
    ];
    let config = AnalysisConfig::new().with_pass_timeout_ms(50);

    let report = analyzer_with(passes, config)
        .analyze(Corpus::from_documents("mem", Vec::new()))
        .await
        .unwrap();

    assert_eq!(report.findings.len(), 1);
    assert_eq!(report.pass_failures.len(), 1);
    assert_eq!(report.pass_failures[0].reason, FailureReason::Timeout { after_ms: 50 });
}

#[tokio::test]
async fn missing_directory_is_an_ingestion_error() {
    let dir = corpus_dir(&[]);
    let err = Analyzer::new(AnalysisConfig::new())
        .unwrap()
        .analyze_dir(dir.path().join("missing"))
        .await
        .unwrap_err();
    assert!(err.is_ingestion());
    assert!(matches!(err, AnalysisError::Ingest(IngestError::DirectoryNotFound(_))));
}

#[tokio::test]
async fn editor_corpus_end_to_end() {
    let dir = editor_corpus();
    let report = Analyzer::new(AnalysisConfig::new())
        .unwrap()
        .analyze_dir(dir.path())
        .await
        .unwrap();

    let mut categories: Vec<&str> = report.findings.iter().map(|f| f.category.as_str()).collect();
    categories.sort_unstable();
    assert_eq!(
        categories,
        vec![
            "ambiguity",
            "coverage-gap",
            "coverage-gap",
            "coverage-gap",
            "inconsistency",
            "orphan-task",
            "underspecification",
        ]
    );
    assert_eq!(report.coverage.covered_count(), 2);
    assert_eq!(report.coverage.orphan_tasks, vec![Identifier::task("T001")]);

    assert_eq!(
        report.edit_order,
        vec!["EDIT-003", "EDIT-004", "EDIT-002", "EDIT-005", "EDIT-006", "EDIT-001"]
    );
    let documents: Vec<&str> = report.remediation.iter().map(|f| f.document.as_str()).collect();
    assert_eq!(documents, vec!["spec.md", "tasks.md", "data-model.md"]);

    let tasks = &report.remediation[1].edits;
    assert_eq!(
        tasks.last().map(|e| e.after_text.as_str()),
        Some(
            "- [ ] T003 Outline worker for FR-002\n- [ ] T004 Implement FR-003\n- [ ] T005 Implement FR-004\n- [ ] T006 Implement SC-001"
        )
    );
}

#[tokio::test]
async fn repeated_runs_render_identically() {
    let dir = editor_corpus();
    let analyzer = Analyzer::new(AnalysisConfig::new()).unwrap();
    let first = analyzer.analyze_dir(dir.path()).await.unwrap();
    let second = analyzer.analyze_dir(dir.path()).await.unwrap();
    assert_eq!(first.to_json().unwrap(), second.to_json().unwrap());
    assert_eq!(first.to_markdown(), second.to_markdown());
}

#[test]
fn cyclic_plan_is_reported_as_remediation_error() {
    let err = AnalysisError::from(RemediationError::CyclicDependency {
        edits: vec!["EDIT-001".to_string(), "EDIT-002".to_string()],
    });
    assert!(!err.is_ingestion());
    assert!(err.to_string().contains("EDIT-001 -> EDIT-002"));
}
