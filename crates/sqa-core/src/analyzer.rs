//! Analysis pipeline
//!
//! Drives one run end to end:
//! - Ingest the corpus directory
//! - Build the cross-reference graph
//! - Run the selected passes under the orchestrator
//! - Deduplicate findings
//! - Compute the coverage matrix
//! - Generate the remediation plan
//!
//! Only ingestion, configuration, and cyclic remediation plans abort a run;
//! pass failures and parse anomalies end up in the report.

use crate::config::AnalysisConfig;
use crate::corpus::Corpus;
use crate::coverage::CoverageMatrix;
use crate::dedup::Deduplicator;
use crate::error::Result;
use crate::orchestrator::PassOrchestrator;
use crate::passes::PassRegistry;
use crate::remediation::RemediationPlanner;
use crate::report::{AnalysisReport, WarningsSummary};
use sqa_document::Document;
use std::path::Path;
use std::sync::Arc;

/// The analysis entry point
#[derive(Debug, Clone)]
pub struct Analyzer {
    /// Run configuration
    config: AnalysisConfig,
    /// Available passes
    registry: PassRegistry,
}

impl Analyzer {
    /// Analyzer with every built-in pass
    ///
    /// # Errors
    ///
    /// Returns [`crate::ConfigError`] if the configuration is invalid.
    pub fn new(config: AnalysisConfig) -> Result<Self> {
        Self::with_registry(config, PassRegistry::with_builtin())
    }

    /// Analyzer with a custom pass registry
    ///
    /// # Errors
    ///
    /// Returns [`crate::ConfigError`] if the configuration is invalid or
    /// names a pass the registry does not hold.
    pub fn with_registry(config: AnalysisConfig, registry: PassRegistry) -> Result<Self> {
        config.validate()?;
        registry.select(config.passes.as_deref())?;
        Ok(Self { config, registry })
    }

    /// Run configuration
    #[inline]
    #[must_use]
    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    /// Pass registry
    #[inline]
    #[must_use]
    pub fn registry(&self) -> &PassRegistry {
        &self.registry
    }

    /// Load `dir` and analyze it
    ///
    /// # Errors
    ///
    /// Returns [`crate::IngestError`] if the directory or a file cannot be
    /// read, and [`crate::RemediationError`] for a cyclic edit plan.
    pub async fn analyze_dir(&self, dir: impl AsRef<Path>) -> Result<AnalysisReport> {
        let corpus = Corpus::load(dir).await?;
        self.analyze(corpus).await
    }

    /// Analyze an ingested corpus
    ///
    /// # Errors
    ///
    /// Returns [`crate::RemediationError`] for a cyclic edit plan.
    pub async fn analyze(&self, corpus: Corpus) -> Result<AnalysisReport> {
        let passes = self.registry.select(self.config.passes.as_deref())?;
        let pass_names: Vec<String> = passes.iter().map(|p| p.name().to_string()).collect();
        let corpus_name = corpus.root().display().to_string();
        let documents: Arc<[Document]> = Arc::from(corpus.into_documents());

        // 1. Graph
        let graph = Arc::new(sqa_graph::build(&documents));

        // 2. Passes
        let orchestrator = PassOrchestrator::from_config(&self.config, passes.len());
        let outcome = orchestrator
            .run(Arc::clone(&documents), Arc::clone(&graph), &passes)
            .await;

        // 3. Deduplication
        let findings = Deduplicator::new(self.config.dedup).dedup(&outcome.findings);

        // 4. Coverage
        let coverage = CoverageMatrix::compute(&graph);

        // 5. Remediation
        let plan = RemediationPlanner::new(&documents, &graph).generate(&findings, self.config.threshold)?;

        let report = AnalysisReport {
            version: crate::VERSION.to_string(),
            corpus: corpus_name,
            documents: documents.iter().map(|d| d.path().to_string()).collect(),
            passes: pass_names,
            threshold: self.config.threshold,
            findings,
            coverage,
            remediation: Vec::new(),
            edit_order: Vec::new(),
            pass_failures: outcome.failures,
            warnings: WarningsSummary::from(graph.warnings()),
        }
        .with_plan(&plan);

        tracing::info!(
            findings = report.findings.len(),
            edits = report.edit_count(),
            failures = report.pass_failures.len(),
            warnings = report.warnings.total,
            "analysis complete"
        );
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{AnalysisError, ConfigError};

    #[test]
    fn unknown_pass_rejected_up_front() {
        let config = AnalysisConfig::new().with_passes(["coverage", "grammar"]);
        let err = Analyzer::new(config).unwrap_err();
        assert!(matches!(
            err,
            AnalysisError::Config(ConfigError::UnknownPass { ref name, .. }) if name == "grammar"
        ));
    }

    #[tokio::test]
    async fn in_memory_corpus() {
        let corpus = Corpus::from_documents(
            "mem",
            vec![
                Document::parse("tasks.md", "# Tasks\n- [ ] T020 Autosave FR-010\n"),
                Document::parse("spec.md", "# Spec\n- **FR-010**: Save drafts\n"),
            ],
        );
        let report = Analyzer::new(AnalysisConfig::new().with_passes(["coverage"]))
            .unwrap()
            .analyze(corpus)
            .await
            .unwrap();

        assert_eq!(report.documents, vec!["spec.md", "tasks.md"]);
        assert!(report.findings.is_empty());
        assert_eq!(report.coverage.covered_count(), 1);
        assert!(report.pass_failures.is_empty());
    }
}
