//! The plain-text corpus backing the knowledge base.

use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use crate::error::{RagError, Result};
use crate::types::Document;

/// An append-only UTF-8 text file.
#[derive(Debug, Clone)]
pub struct Corpus {
    path: PathBuf,
}

impl Corpus {
    /// Creates a handle for the corpus at `path`. The file need not exist yet.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Returns the corpus path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns `true` if the corpus file exists.
    #[must_use]
    pub fn exists(&self) -> bool {
        self.path.is_file()
    }

    /// Reads the whole corpus.
    ///
    /// # Errors
    /// Returns [`RagError::CorpusMissing`] if the file does not exist.
    pub fn read(&self) -> Result<String> {
        fs::read_to_string(&self.path).map_err(|e| match e.kind() {
            ErrorKind::NotFound => RagError::CorpusMissing(self.path.clone()),
            _ => RagError::persistence(&self.path, e),
        })
    }

    /// Reads the corpus as a single [`Document`].
    ///
    /// # Errors
    /// See [`read`](Self::read).
    pub fn document(&self) -> Result<Document> {
        Ok(Document::from_file(&self.path, self.read()?))
    }

    /// Appends `text` followed by a newline, creating the file if needed.
    ///
    /// # Errors
    /// Returns [`RagError::Persistence`] on I/O failure.
    pub fn append(&self, text: &str) -> Result<()> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|e| RagError::persistence(&self.path, e))?;

        let mut line = String::with_capacity(text.len() + 1);
        line.push_str(text);
        line.push('\n');
        file.write_all(line.as_bytes())
            .map_err(|e| RagError::persistence(&self.path, e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn append_adds_trailing_newline() {
        let dir = tempdir().unwrap();
        let corpus = Corpus::new(dir.path().join("kb.txt"));

        corpus.append("first fact").unwrap();
        corpus.append("second fact").unwrap();

        assert_eq!(corpus.read().unwrap(), "first fact\nsecond fact\n");
    }

    #[test]
    fn append_preserves_existing_content() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("kb.txt");
        fs::write(&path, "seed").unwrap();

        Corpus::new(&path).append("more").unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), "seedmore\n");
    }

    #[test]
    fn missing_corpus() {
        let dir = tempdir().unwrap();
        let corpus = Corpus::new(dir.path().join("absent.txt"));

        assert!(!corpus.exists());
        assert!(matches!(corpus.read(), Err(RagError::CorpusMissing(_))));
    }
}
