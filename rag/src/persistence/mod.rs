//! On-disk snapshots of the vector index.
//!
//! A snapshot is a single JSON document holding the passages and their vectors
//! in parallel arrays. Writes go to a sibling temporary file that is renamed over
//! the target, so readers never observe a half-written snapshot.

use std::collections::HashSet;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{RagError, Result};
use crate::index::{Metric, VectorIndex};
use crate::types::{IndexEntry, Passage};

/// Current snapshot format version.
pub const SNAPSHOT_VERSION: u32 = 1;

/// Serialized form of a [`VectorIndex`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Snapshot {
    /// Format version.
    pub version: u32,
    /// Embedding dimension.
    pub dimension: usize,
    /// Metric the index ranks with.
    pub metric: Metric,
    /// Passages in index order.
    pub passages: Vec<Passage>,
    /// One vector per passage, same order as `passages`.
    pub vectors: Vec<Vec<f32>>,
}

impl Snapshot {
    /// Captures the contents of an index.
    #[must_use]
    pub fn from_index(index: &VectorIndex) -> Self {
        let (passages, vectors) = index
            .entries()
            .iter()
            .map(|entry| (entry.passage.clone(), entry.embedding.clone()))
            .unzip();

        Self {
            version: SNAPSHOT_VERSION,
            dimension: index.dimension(),
            metric: index.metric(),
            passages,
            vectors,
        }
    }

    /// Validates the snapshot and turns it back into an index.
    ///
    /// `path` is only used for error reporting.
    ///
    /// # Errors
    /// Returns [`RagError::CorruptIndex`] if the snapshot is inconsistent.
    pub fn into_index(self, path: &Path) -> Result<VectorIndex> {
        if self.version != SNAPSHOT_VERSION {
            return Err(RagError::corrupt(
                path,
                format!("unsupported snapshot version {}", self.version),
            ));
        }
        if self.dimension == 0 {
            return Err(RagError::corrupt(path, "dimension is zero"));
        }
        if self.passages.len() != self.vectors.len() {
            return Err(RagError::corrupt(
                path,
                format!(
                    "{} passages but {} vectors",
                    self.passages.len(),
                    self.vectors.len()
                ),
            ));
        }
        if let Some((passage, vector)) = self
            .passages
            .iter()
            .zip(&self.vectors)
            .find(|(_, v)| v.len() != self.dimension)
        {
            return Err(RagError::corrupt(
                path,
                format!(
                    "vector for {} has {} components, expected {}",
                    passage.id,
                    vector.len(),
                    self.dimension
                ),
            ));
        }

        let mut seen = HashSet::with_capacity(self.passages.len());
        if let Some(duplicate) = self.passages.iter().find(|p| !seen.insert(p.id.as_str())) {
            return Err(RagError::corrupt(
                path,
                format!("duplicate passage id {}", duplicate.id),
            ));
        }

        let entries = self
            .passages
            .into_iter()
            .zip(self.vectors)
            .map(|(passage, vector)| IndexEntry::new(passage, vector));

        VectorIndex::from_entries(self.dimension, self.metric, entries)
    }
}

/// Writes `snapshot` to `path`, replacing any existing file atomically.
///
/// # Errors
/// Returns [`RagError::Persistence`] on I/O failure and
/// [`RagError::Serialization`] if encoding fails.
pub fn save(path: &Path, snapshot: &Snapshot) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| RagError::persistence(parent, e))?;
    }

    let bytes =
        serde_json::to_vec(snapshot).map_err(|e| RagError::Serialization(e.to_string()))?;

    let tmp = temp_path(path);
    let write = || -> std::io::Result<()> {
        let mut file = File::create(&tmp)?;
        file.write_all(&bytes)?;
        file.sync_all()
    };
    if let Err(e) = write() {
        let _ = fs::remove_file(&tmp);
        return Err(RagError::persistence(&tmp, e));
    }

    fs::rename(&tmp, path).map_err(|e| {
        let _ = fs::remove_file(&tmp);
        RagError::persistence(path, e)
    })
}

/// Reads a snapshot from `path`.
///
/// # Errors
/// Returns [`RagError::Persistence`] if the file cannot be read and
/// [`RagError::CorruptIndex`] if it does not parse.
pub fn load(path: &Path) -> Result<Snapshot> {
    let bytes = fs::read(path).map_err(|e| RagError::persistence(path, e))?;
    serde_json::from_slice(&bytes).map_err(|e| RagError::corrupt(path, e.to_string()))
}

fn temp_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".tmp");
    path.with_file_name(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn snapshot() -> Snapshot {
        Snapshot {
            version: SNAPSHOT_VERSION,
            dimension: 2,
            metric: Metric::Cosine,
            passages: vec![
                Passage::new("kb#chunk_0", "kb", "first", 0),
                Passage::new("kb#chunk_1", "kb", "second", 1),
            ],
            vectors: vec![vec![1.0, 0.0], vec![0.0, 1.0]],
        }
    }

    fn assert_corrupt(snapshot: Snapshot) {
        let result = snapshot.into_index(Path::new("index.json"));
        assert!(
            matches!(result, Err(RagError::CorruptIndex { .. })),
            "expected CorruptIndex, got {result:?}"
        );
    }

    #[test]
    fn save_and_load() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("index.json");

        save(&path, &snapshot()).unwrap();
        assert!(path.exists());
        assert!(!temp_path(&path).exists());

        assert_eq!(load(&path).unwrap(), snapshot());
    }

    #[test]
    fn overwrite_replaces_whole_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("index.json");

        save(&path, &snapshot()).unwrap();
        let mut smaller = snapshot();
        smaller.passages.truncate(1);
        smaller.vectors.truncate(1);
        save(&path, &smaller).unwrap();

        assert_eq!(load(&path).unwrap(), smaller);
    }

    #[test]
    fn garbage_is_corrupt() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("index.json");
        fs::write(&path, b"{\"version\": 1, \"dimension\"").unwrap();

        assert!(matches!(load(&path), Err(RagError::CorruptIndex { .. })));
    }

    #[test]
    fn missing_field_is_corrupt() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("index.json");
        fs::write(&path, br#"{"version":1,"dimension":2,"metric":"cosine","passages":[]}"#)
            .unwrap();

        assert!(matches!(load(&path), Err(RagError::CorruptIndex { .. })));
    }

    #[test]
    fn missing_file_is_persistence_error() {
        let dir = tempdir().unwrap();
        assert!(matches!(
            load(&dir.path().join("absent.json")),
            Err(RagError::Persistence { .. })
        ));
    }

    #[test]
    fn inconsistent_snapshots_are_rejected() {
        let mut short = snapshot();
        short.vectors.pop();
        assert_corrupt(short);

        let mut wrong_dim = snapshot();
        wrong_dim.vectors[1] = vec![1.0, 2.0, 3.0];
        assert_corrupt(wrong_dim);

        let mut zero_dim = snapshot();
        zero_dim.dimension = 0;
        assert_corrupt(zero_dim);

        let mut duplicate = snapshot();
        duplicate.passages[1].id = "kb#chunk_0".into();
        assert_corrupt(duplicate);

        let mut future = snapshot();
        future.version = 99;
        assert_corrupt(future);
    }
}
