//! Corpus ingestion
//!
//! A corpus is one feature directory holding any of `spec.md`, `plan.md`,
//! `tasks.md`, `data-model.md`, and files under `contracts/`. Missing files
//! are skipped; an unreadable directory or file is fatal.

use crate::error::IngestError;
use sqa_document::{Document, DocumentKind};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// Top-level documents recognized in a corpus directory
pub const CORPUS_FILES: [&str; 4] = ["spec.md", "plan.md", "tasks.md", "data-model.md"];

/// Subdirectory holding interface contracts
pub const CONTRACTS_DIR: &str = "contracts";

/// Parsed documents of one corpus directory
#[derive(Debug, Clone)]
pub struct Corpus {
    root: PathBuf,
    documents: Vec<Document>,
}

impl Corpus {
    /// Read and parse every recognized file under `root`
    ///
    /// # Errors
    ///
    /// Returns [`IngestError::DirectoryNotFound`] or
    /// [`IngestError::NotADirectory`] for a bad root, [`IngestError::Io`] for
    /// an unreadable file, and [`IngestError::InvalidUtf8`] for a file that is
    /// not text.
    pub async fn load(root: impl AsRef<Path>) -> Result<Self, IngestError> {
        let root = root.as_ref();
        let metadata = match tokio::fs::metadata(root).await {
            Ok(metadata) => metadata,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(IngestError::DirectoryNotFound(root.to_path_buf()));
            }
            Err(e) => return Err(IngestError::io(root, e)),
        };
        if !metadata.is_dir() {
            return Err(IngestError::NotADirectory(root.to_path_buf()));
        }

        let mut documents = Vec::new();
        for name in CORPUS_FILES {
            if let Some(document) = read_document(root, name).await? {
                documents.push(document);
            }
        }
        for name in contract_files(root).await? {
            if let Some(document) = read_document(root, &name).await? {
                documents.push(document);
            }
        }

        let corpus = Self::from_documents(root, documents);
        tracing::info!(
            root = %root.display(),
            documents = corpus.documents.len(),
            "corpus loaded"
        );
        Ok(corpus)
    }

    /// Wrap already-parsed documents
    #[must_use]
    pub fn from_documents(root: impl Into<PathBuf>, mut documents: Vec<Document>) -> Self {
        documents.sort_by(|a, b| {
            (a.kind().precedence(), a.path()).cmp(&(b.kind().precedence(), b.path()))
        });
        Self {
            root: root.into(),
            documents,
        }
    }

    /// Corpus directory
    #[inline]
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Documents in precedence order
    #[inline]
    #[must_use]
    pub fn documents(&self) -> &[Document] {
        &self.documents
    }

    /// Consume into the documents
    #[must_use]
    pub fn into_documents(self) -> Vec<Document> {
        self.documents
    }

    /// Corpus-relative paths, in precedence order
    #[must_use]
    pub fn paths(&self) -> Vec<String> {
        self.documents.iter().map(|d| d.path().to_string()).collect()
    }

    /// Whether a document of `kind` was found
    #[must_use]
    pub fn has(&self, kind: DocumentKind) -> bool {
        self.documents.iter().any(|d| d.kind() == kind)
    }
}

/// Read `relative` under `root`; `None` if it does not exist
async fn read_document(root: &Path, relative: &str) -> Result<Option<Document>, IngestError> {
    let path = root.join(relative);
    let bytes = match tokio::fs::read(&path).await {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            tracing::debug!(file = relative, "not present, skipped");
            return Ok(None);
        }
        Err(e) => return Err(IngestError::io(&path, e)),
    };
    let text = String::from_utf8(bytes).map_err(|_| IngestError::InvalidUtf8 { path: path.clone() })?;
    let document = Document::parse(relative, text);
    tracing::debug!(
        file = relative,
        lines = document.line_count(),
        mentions = document.mentions().len(),
        "parsed document"
    );
    Ok(Some(document))
}

/// Regular files directly under `contracts/`, as sorted relative paths
async fn contract_files(root: &Path) -> Result<Vec<String>, IngestError> {
    let dir = root.join(CONTRACTS_DIR);
    let mut entries = match tokio::fs::read_dir(&dir).await {
        Ok(entries) => entries,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(IngestError::io(&dir, e)),
    };

    let mut names = Vec::new();
    while let Some(entry) = entries.next_entry().await.map_err(|e| IngestError::io(&dir, e))? {
        let file_type = entry.file_type().await.map_err(|e| IngestError::io(entry.path(), e))?;
        if !file_type.is_file() {
            continue;
        }
        if let Some(name) = entry.file_name().to_str() {
            names.push(format!("{CONTRACTS_DIR}/{name}"));
        }
    }
    names.sort();
    Ok(names)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[tokio::test]
    async fn loads_recognized_files_in_precedence_order() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("plan.md"), "# Plan\n").unwrap();
        fs::write(dir.path().join("spec.md"), "# Spec\n").unwrap();
        fs::write(dir.path().join("notes.md"), "# Ignored\n").unwrap();
        fs::create_dir(dir.path().join("contracts")).unwrap();
        fs::write(dir.path().join("contracts/b.md"), "# B\n").unwrap();
        fs::write(dir.path().join("contracts/a.yaml"), "a: 1\n").unwrap();

        let corpus = Corpus::load(dir.path()).await.unwrap();
        assert_eq!(
            corpus.paths(),
            vec!["spec.md", "plan.md", "contracts/a.yaml", "contracts/b.md"]
        );
        assert!(!corpus.has(DocumentKind::Tasks));
    }

    #[tokio::test]
    async fn missing_directory_is_fatal() {
        let dir = TempDir::new().unwrap();
        let err = Corpus::load(dir.path().join("nope")).await.unwrap_err();
        assert!(matches!(err, IngestError::DirectoryNotFound(_)));

        let file = dir.path().join("spec.md");
        fs::write(&file, "# Spec\n").unwrap();
        let err = Corpus::load(&file).await.unwrap_err();
        assert!(matches!(err, IngestError::NotADirectory(_)));
    }

    #[tokio::test]
    async fn binary_file_is_rejected() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("spec.md"), [0xff, 0xfe, 0x00]).unwrap();
        let err = Corpus::load(dir.path()).await.unwrap_err();
        assert!(matches!(err, IngestError::InvalidUtf8 { .. }));
    }

    #[tokio::test]
    async fn empty_directory_is_an_empty_corpus() {
        let dir = TempDir::new().unwrap();
        let corpus = Corpus::load(dir.path()).await.unwrap();
        assert!(corpus.documents().is_empty());
    }
}
