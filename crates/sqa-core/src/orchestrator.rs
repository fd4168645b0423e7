//! Pass orchestration
//!
//! Runs every selected detector on the blocking pool, bounded by a
//! semaphore. Each pass sees the same `Arc`-shared documents and graph and
//! gets its own timeout. The orchestrator waits for all passes before
//! returning anything.
//!
//! - A pass that errors or panics becomes a [`PassFailure`]; the others still
//!   contribute their findings.
//! - A pass that exceeds the timeout is abandoned and recorded as
//!   [`FailureReason::Timeout`].
//! - Findings are sorted by `(document, start line, pass, id)`, so output does
//!   not depend on completion order.

use crate::config::AnalysisConfig;
use crate::detector::Detector;
use crate::finding::{sort_findings, FailureReason, Finding, PassFailure};
use futures::future::join_all;
use sqa_document::Document;
use sqa_graph::CrossReferenceGraph;
use std::any::Any;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Semaphore;

/// Combined result of all passes
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PassOutcome {
    /// Findings from successful passes, in output order
    pub findings: Vec<Finding>,
    /// One record per failed pass, sorted by pass name
    pub failures: Vec<PassFailure>,
    /// Names of passes that completed, sorted
    pub completed: Vec<String>,
}

/// Bounded, failure-isolating pass runner
#[derive(Debug, Clone)]
pub struct PassOrchestrator {
    timeout: Duration,
    max_workers: usize,
}

impl PassOrchestrator {
    /// Create an orchestrator
    #[must_use]
    pub fn new(timeout: Duration, max_workers: usize) -> Self {
        Self {
            timeout,
            max_workers: max_workers.max(1),
        }
    }

    /// Orchestrator sized for `pass_count` passes under `config`
    #[must_use]
    pub fn from_config(config: &AnalysisConfig, pass_count: usize) -> Self {
        Self::new(config.pass_timeout(), config.workers_for(pass_count))
    }

    /// Per-pass timeout
    #[inline]
    #[must_use]
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Worker pool size
    #[inline]
    #[must_use]
    pub fn max_workers(&self) -> usize {
        self.max_workers
    }

    /// Run every pass to completion, failure, or timeout
    pub async fn run(
        &self,
        documents: Arc<[Document]>,
        graph: Arc<CrossReferenceGraph>,
        passes: &[Arc<dyn Detector>],
    ) -> PassOutcome {
        let pool = Arc::new(Semaphore::new(self.max_workers));
        tracing::info!(
            passes = passes.len(),
            workers = self.max_workers,
            timeout_ms = duration_ms(self.timeout),
            "running passes"
        );

        let runs = passes.iter().map(|pass| {
            let pass = Arc::clone(pass);
            let documents = Arc::clone(&documents);
            let graph = Arc::clone(&graph);
            let pool = Arc::clone(&pool);
            let timeout = self.timeout;
            async move {
                let name = pass.name().to_string();
                let result = match pool.acquire_owned().await {
                    Ok(_permit) => run_one(pass, documents, graph, timeout).await,
                    Err(_) => Err(FailureReason::Error {
                        message: "worker pool closed".to_string(),
                    }),
                };
                (name, result)
            }
        });

        // Barrier: nothing is exposed until every pass has settled.
        let results = join_all(runs).await;

        let mut outcome = PassOutcome::default();
        for (pass, result) in results {
            match result {
                Ok(findings) => {
                    outcome.findings.extend(findings);
                    outcome.completed.push(pass);
                }
                Err(reason) => {
                    tracing::warn!(pass = %pass, reason = %reason, "pass failed");
                    outcome.failures.push(PassFailure { pass, reason });
                }
            }
        }

        sort_findings(&mut outcome.findings);
        outcome.failures.sort_by(|a, b| a.pass.cmp(&b.pass));
        outcome.completed.sort();

        tracing::info!(
            findings = outcome.findings.len(),
            completed = outcome.completed.len(),
            failed = outcome.failures.len(),
            "passes settled"
        );
        outcome
    }
}

async fn run_one(
    pass: Arc<dyn Detector>,
    documents: Arc<[Document]>,
    graph: Arc<CrossReferenceGraph>,
    timeout: Duration,
) -> Result<Vec<Finding>, FailureReason> {
    let name = pass.name().to_string();
    let started = Instant::now();
    tracing::debug!(pass = %name, "pass started");

    let worker = tokio::task::spawn_blocking(move || pass.detect(&documents, &graph));

    // On timeout the join handle is dropped; the blocking worker keeps
    // running detached and its result is discarded.
    let result = match tokio::time::timeout(timeout, worker).await {
        Err(_) => Err(FailureReason::Timeout {
            after_ms: duration_ms(timeout),
        }),
        Ok(Err(join)) if join.is_panic() => Err(FailureReason::Panic {
            message: panic_message(join.into_panic().as_ref()),
        }),
        Ok(Err(join)) => Err(FailureReason::Error {
            message: join.to_string(),
        }),
        Ok(Ok(Err(err))) => Err(FailureReason::Error {
            message: err.to_string(),
        }),
        Ok(Ok(Ok(findings))) => Ok(findings),
    };

    if let Ok(findings) = &result {
        tracing::debug!(
            pass = %name,
            findings = findings.len(),
            elapsed_ms = duration_ms(started.elapsed()),
            "pass finished"
        );
    }
    result
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

fn duration_ms(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}
