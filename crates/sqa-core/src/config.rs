//! Analysis configuration
//!
//! Every field has a default, so a TOML file only needs the keys it
//! overrides:
//!
//! ```toml
//! passes = ["coverage", "ambiguity"]
//! threshold = "HIGH"
//! format = "json"
//! pass_timeout_ms = 5000
//!
//! [dedup]
//! similarity_threshold = 0.7
//! ```

use crate::error::ConfigError;
use crate::severity::Severity;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

/// Report output format
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportFormat {
    /// Pretty-printed JSON
    Json,
    /// Markdown tables
    #[default]
    Markdown,
}

impl FromStr for ReportFormat {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "json" => Ok(Self::Json),
            "markdown" | "md" => Ok(Self::Markdown),
            _ => Err(ConfigError::UnknownFormat(s.to_string())),
        }
    }
}

impl fmt::Display for ReportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Json => "json",
            Self::Markdown => "markdown",
        })
    }
}

/// Merge thresholds for the deduplicator; both comparisons are strict
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DedupPolicy {
    /// Minimum per-document line overlap ratio (exclusive)
    pub overlap_threshold: f64,
    /// Minimum summary token-set Jaccard similarity (exclusive)
    pub similarity_threshold: f64,
}

impl Default for DedupPolicy {
    fn default() -> Self {
        Self {
            overlap_threshold: 0.5,
            similarity_threshold: 0.6,
        }
    }
}

/// Configuration for one analysis run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Passes to run by name; `None` runs every registered pass
    pub passes: Option<Vec<String>>,
    /// Minimum severity that receives remediation edits
    pub threshold: Severity,
    /// Report format
    pub format: ReportFormat,
    /// Per-pass timeout in milliseconds
    pub pass_timeout_ms: u64,
    /// Worker pool size; `None` sizes the pool to the pass count
    pub max_workers: Option<usize>,
    /// Deduplication thresholds
    pub dedup: DedupPolicy,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            passes: None,
            threshold: Severity::Medium,
            format: ReportFormat::Markdown,
            pass_timeout_ms: 30_000,
            max_workers: None,
            dedup: DedupPolicy::default(),
        }
    }
}

impl AnalysisConfig {
    /// Create default configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse configuration from TOML text
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] for malformed TOML and
    /// [`ConfigError::InvalidValue`] for out-of-range values.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a TOML file
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Read`] if the file cannot be read, otherwise
    /// as [`AnalysisConfig::from_toml_str`].
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        tracing::debug!(path = %path.display(), "loaded config file");
        Self::from_toml_str(&text)
    }

    /// With selected passes
    #[must_use]
    pub fn with_passes<I, S>(mut self, passes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.passes = Some(passes.into_iter().map(Into::into).collect());
        self
    }

    /// With remediation threshold
    #[inline]
    #[must_use]
    pub fn with_threshold(mut self, threshold: Severity) -> Self {
        self.threshold = threshold;
        self
    }

    /// With report format
    #[inline]
    #[must_use]
    pub fn with_format(mut self, format: ReportFormat) -> Self {
        self.format = format;
        self
    }

    /// With per-pass timeout
    #[inline]
    #[must_use]
    pub fn with_pass_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.pass_timeout_ms = timeout_ms;
        self
    }

    /// With worker pool size
    #[inline]
    #[must_use]
    pub fn with_max_workers(mut self, workers: usize) -> Self {
        self.max_workers = Some(workers);
        self
    }

    /// With deduplication thresholds
    #[inline]
    #[must_use]
    pub fn with_dedup(mut self, dedup: DedupPolicy) -> Self {
        self.dedup = dedup;
        self
    }

    /// Per-pass timeout
    #[inline]
    #[must_use]
    pub fn pass_timeout(&self) -> Duration {
        Duration::from_millis(self.pass_timeout_ms)
    }

    /// Worker count for `pass_count` passes
    #[must_use]
    pub fn workers_for(&self, pass_count: usize) -> usize {
        let available = std::thread::available_parallelism().map_or(1, std::num::NonZeroUsize::get);
        match self.max_workers {
            Some(workers) => workers.max(1),
            None => pass_count.clamp(1, available.max(1)),
        }
    }

    /// Check value ranges
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidValue`] naming the first bad field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.pass_timeout_ms == 0 {
            return Err(ConfigError::invalid("pass_timeout_ms", "must be greater than 0"));
        }
        if self.max_workers == Some(0) {
            return Err(ConfigError::invalid("max_workers", "must be at least 1"));
        }
        for (field, value) in [
            ("dedup.overlap_threshold", self.dedup.overlap_threshold),
            ("dedup.similarity_threshold", self.dedup.similarity_threshold),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(ConfigError::invalid(field, format!("{value} is outside 0.0..=1.0")));
            }
        }
        if let Some(passes) = &self.passes {
            if passes.is_empty() {
                return Err(ConfigError::invalid("passes", "must name at least one pass"));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = AnalysisConfig::new();
        assert_eq!(config.threshold, Severity::Medium);
        assert_eq!(config.format, ReportFormat::Markdown);
        assert_eq!(config.pass_timeout(), Duration::from_secs(30));
        assert!((config.dedup.overlap_threshold - 0.5).abs() < f64::EPSILON);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn partial_toml_keeps_defaults() {
        let config = AnalysisConfig::from_toml_str(
            "threshold = \"high\"\nformat = \"json\"\n[dedup]\nsimilarity_threshold = 0.7\n",
        )
        .unwrap();
        assert_eq!(config.threshold, Severity::High);
        assert_eq!(config.format, ReportFormat::Json);
        assert!((config.dedup.similarity_threshold - 0.7).abs() < f64::EPSILON);
        assert!((config.dedup.overlap_threshold - 0.5).abs() < f64::EPSILON);
        assert_eq!(config.passes, None);
    }

    #[test]
    fn invalid_values_rejected() {
        assert!(matches!(
            AnalysisConfig::from_toml_str("pass_timeout_ms = 0"),
            Err(ConfigError::InvalidValue { field: "pass_timeout_ms", .. })
        ));
        assert!(matches!(
            AnalysisConfig::from_toml_str("[dedup]\noverlap_threshold = 1.5"),
            Err(ConfigError::InvalidValue { .. })
        ));
        assert!(matches!(
            AnalysisConfig::from_toml_str("threshold = \"urgent\""),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn worker_count() {
        let config = AnalysisConfig::new().with_max_workers(3);
        assert_eq!(config.workers_for(10), 3);
        assert_eq!(AnalysisConfig::new().workers_for(0), 1);
    }

    #[test]
    fn format_names() {
        assert_eq!("MD".parse::<ReportFormat>().unwrap(), ReportFormat::Markdown);
        assert!("yaml".parse::<ReportFormat>().is_err());
    }
}
