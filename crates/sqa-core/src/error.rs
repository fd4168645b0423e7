//! Error types for SQA Core
//!
//! Only ingestion, configuration, and remediation ordering are fatal.
//! Detector errors are isolated per pass and surface as
//! [`PassFailure`](crate::finding::PassFailure) records.

use std::path::{Path, PathBuf};

/// Main analysis error type
#[derive(Debug, thiserror::Error)]
pub enum AnalysisError {
    /// Input directory or file could not be read
    #[error("ingestion failed: {0}")]
    Ingest(#[from] IngestError),

    /// Invalid configuration
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Remediation plan could not be ordered
    #[error("remediation failed: {0}")]
    Remediation(#[from] RemediationError),

    /// Report could not be rendered
    #[error("report rendering failed: {0}")]
    Report(#[from] ReportError),
}

impl AnalysisError {
    /// Check if error comes from reading the input corpus
    #[inline]
    #[must_use]
    pub fn is_ingestion(&self) -> bool {
        matches!(self, Self::Ingest(_))
    }
}

/// Corpus ingestion errors
#[derive(Debug, thiserror::Error)]
pub enum IngestError {
    /// Input directory does not exist
    #[error("directory not found: {}", .0.display())]
    DirectoryNotFound(PathBuf),

    /// Input path is not a directory
    #[error("not a directory: {}", .0.display())]
    NotADirectory(PathBuf),

    /// I/O failure on a specific path
    #[error("cannot read {}: {source}", path.display())]
    Io {
        /// Path being read
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// File is not valid UTF-8
    #[error("{} is not valid UTF-8", path.display())]
    InvalidUtf8 {
        /// Offending file
        path: PathBuf,
    },
}

impl IngestError {
    /// Create an I/O error for `path`
    #[inline]
    pub fn io(path: impl AsRef<Path>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.as_ref().to_path_buf(),
            source,
        }
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Configuration file could not be read
    #[error("cannot read config {}: {source}", path.display())]
    Read {
        /// Config file path
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// Configuration file is not valid TOML for this schema
    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),

    /// Pass name not present in the registry
    #[error("unknown pass '{name}' (available: {})", available.join(", "))]
    UnknownPass {
        /// Requested name
        name: String,
        /// Registered names
        available: Vec<String>,
    },

    /// Severity name not recognized
    #[error(transparent)]
    Severity(#[from] SeverityError),

    /// Report format name not recognized
    #[error("unknown report format '{0}' (expected json or markdown)")]
    UnknownFormat(String),

    /// Field value out of range
    #[error("invalid value for {field}: {reason}")]
    InvalidValue {
        /// Field name
        field: &'static str,
        /// What is wrong
        reason: String,
    },
}

impl ConfigError {
    /// Create an invalid-value error
    #[inline]
    pub fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidValue {
            field,
            reason: reason.into(),
        }
    }
}

/// Severity parsing and impact-score errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SeverityError {
    /// Impact score outside 1..=5
    #[error("impact score {0} out of range 1..=5")]
    ImpactOutOfRange(u8),

    /// Unknown severity name
    #[error("unknown severity '{0}' (expected LOW, MEDIUM, or HIGH)")]
    UnknownLevel(String),
}

/// Errors a detector pass may return
#[derive(Debug, Clone, thiserror::Error)]
pub enum DetectorError {
    /// Pass could not complete
    #[error("{0}")]
    Failed(String),

    /// Pass needs input the corpus does not have
    #[error("missing input: {0}")]
    MissingInput(String),
}

impl DetectorError {
    /// Create a generic failure
    #[inline]
    pub fn failed(message: impl Into<String>) -> Self {
        Self::Failed(message.into())
    }
}

/// Remediation planning errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RemediationError {
    /// Edits depend on each other in a cycle
    #[error("cyclic dependency between edits: {}", edits.join(" -> "))]
    CyclicDependency {
        /// Edit ids forming the cycle
        edits: Vec<String>,
    },

    /// Edit depends on an id not in the plan
    #[error("edit {edit} depends on unknown edit {missing}")]
    UnknownDependency {
        /// Dependent edit
        edit: String,
        /// Missing dependency
        missing: String,
    },
}

/// Report rendering errors
#[derive(Debug, thiserror::Error)]
pub enum ReportError {
    /// JSON serialization failed
    #[error("json: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type alias for analysis operations
pub type Result<T, E = AnalysisError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ingest_errors_name_the_path() {
        let err = IngestError::DirectoryNotFound(PathBuf::from("/no/such/dir"));
        assert_eq!(err.to_string(), "directory not found: /no/such/dir");
        assert!(AnalysisError::from(err).is_ingestion());
    }

    #[test]
    fn unknown_pass_lists_available() {
        let err = ConfigError::UnknownPass {
            name: "grammar".to_string(),
            available: vec!["ambiguity".to_string(), "coverage".to_string()],
        };
        assert_eq!(
            err.to_string(),
            "unknown pass 'grammar' (available: ambiguity, coverage)"
        );
    }

    #[test]
    fn cycle_lists_edits() {
        let err = RemediationError::CyclicDependency {
            edits: vec!["EDIT-001".to_string(), "EDIT-002".to_string()],
        };
        assert_eq!(
            err.to_string(),
            "cyclic dependency between edits: EDIT-001 -> EDIT-002"
        );
    }
}
