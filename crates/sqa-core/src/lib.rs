//! SQA Core - specification quality analysis
//!
//! Runs a set of detector passes over a parsed design-document corpus and
//! its cross-reference graph, then:
//! - Normalizes mixed severity scales and merges overlapping findings
//! - Computes requirement-to-task coverage
//! - Synthesizes an ordered, file-scoped remediation plan
//! - Renders everything as one JSON or Markdown report
//!
//! # Example
//!
//! ```rust,no_run
//! use sqa_core::{AnalysisConfig, Analyzer, Severity};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = AnalysisConfig::new().with_threshold(Severity::High);
//! let analyzer = Analyzer::new(config)?;
//!
//! let report = analyzer.analyze_dir("specs/001-editor").await?;
//! println!("{}", report.to_markdown());
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(unreachable_pub)]

// Core modules
pub mod analyzer;
pub mod config;
pub mod corpus;
pub mod coverage;
pub mod dedup;
pub mod detector;
pub mod error;
pub mod finding;
pub mod keys;
pub mod orchestrator;
pub mod passes;
pub mod remediation;
pub mod report;
pub mod severity;
pub mod text;
mod union_find;

// Re-exports for convenience
pub use analyzer::Analyzer;
pub use config::{AnalysisConfig, DedupPolicy, ReportFormat};
pub use corpus::Corpus;
pub use coverage::{CoverageAnalyzer, CoverageMatrix, CoverageRow, CoverageState};
pub use dedup::{CanonicalFinding, Deduplicator};
pub use detector::{Detector, FindingIds};
pub use error::{
    AnalysisError, ConfigError, DetectorError, IngestError, RemediationError, ReportError, Result,
    SeverityError,
};
pub use finding::{FailureReason, Finding, FindingStatus, Location, PassFailure};
pub use orchestrator::{PassOrchestrator, PassOutcome};
pub use passes::{AmbiguityPass, DuplicationPass, PassRegistry, UnderspecificationPass};
pub use remediation::{order_edits, FileEdits, RemediationEdit, RemediationPlan, RemediationPlanner};
pub use report::{AnalysisReport, MarkdownReport, WarningsSummary};
pub use severity::{ImpactScore, ReportedSeverity, Severity};

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for writing passes and driving analyses
    pub use crate::{
        AnalysisConfig, AnalysisReport, Analyzer, CanonicalFinding, Detector, DetectorError,
        Finding, FindingIds, FindingStatus, ImpactScore, Location, PassRegistry, Severity,
    };
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
