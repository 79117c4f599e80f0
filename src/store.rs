//! Artifact persistence and the live corpus snapshot.
//!
//! Two artifacts live side by side in the data directory: the binary vector
//! index and the document list as JSON. Both are written atomically via a
//! temp file and rename, so a crash mid-write never leaves a torn artifact.
//! The in-memory snapshot is swapped as one `Arc`, so searches always see
//! an index and document list from the same build.

use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::{info, warn};

use crate::corpus::Document;
use crate::error::{RetrievalError, RetrievalResult};
use crate::index::FlatIndex;

/// File name of the binary vector index artifact.
pub const INDEX_FILE: &str = "vectors.idx";
/// File name of the document list artifact.
pub const DOCUMENTS_FILE: &str = "documents.json";

/// One immutable build of the corpus: the index and its aligned documents.
#[derive(Debug)]
pub struct CorpusSnapshot {
    pub index: FlatIndex,
    pub documents: Vec<Document>,
}

impl CorpusSnapshot {
    /// Number of documents (equal to the number of indexed vectors).
    #[must_use]
    pub fn len(&self) -> usize {
        self.documents.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }
}

/// Owns the artifact paths and the currently installed snapshot.
pub struct IndexStore {
    index_path: PathBuf,
    documents_path: PathBuf,
    snapshot: RwLock<Option<Arc<CorpusSnapshot>>>,
}

impl IndexStore {
    /// Create a store rooted at the given data directory.
    #[must_use]
    pub fn new(data_dir: impl AsRef<Path>) -> Self {
        let data_dir = data_dir.as_ref();
        Self {
            index_path: data_dir.join(INDEX_FILE),
            documents_path: data_dir.join(DOCUMENTS_FILE),
            snapshot: RwLock::new(None),
        }
    }

    /// Path of the index artifact.
    #[must_use]
    pub fn index_path(&self) -> &Path {
        &self.index_path
    }

    /// Path of the document list artifact.
    #[must_use]
    pub fn documents_path(&self) -> &Path {
        &self.documents_path
    }

    /// True when both artifacts exist on disk.
    #[must_use]
    pub fn artifacts_exist(&self) -> bool {
        self.index_path.exists() && self.documents_path.exists()
    }

    /// Try to load the artifacts and install them as the live snapshot.
    ///
    /// Returns `false` without installing anything when either artifact is
    /// missing, unreadable, or the two disagree on corpus size. A failed
    /// load is recoverable by rebuilding, so it is logged, not propagated.
    pub fn load(&self) -> bool {
        if !self.artifacts_exist() {
            return false;
        }

        let index = match FlatIndex::read_from_path(&self.index_path) {
            Ok(index) => index,
            Err(e) => {
                warn!(path = %self.index_path.display(), error = %e, "failed to load index artifact");
                return false;
            }
        };

        let documents: Vec<Document> = match File::open(&self.documents_path)
            .map_err(|e| e.to_string())
            .and_then(|f| serde_json::from_reader(f).map_err(|e| e.to_string()))
        {
            Ok(documents) => documents,
            Err(e) => {
                warn!(path = %self.documents_path.display(), error = %e, "failed to load document artifact");
                return false;
            }
        };

        if index.len() != documents.len() {
            warn!(
                index_vectors = index.len(),
                documents = documents.len(),
                "artifact size mismatch, ignoring both"
            );
            return false;
        }

        info!(documents = documents.len(), "loaded corpus artifacts");
        self.install(CorpusSnapshot { index, documents });
        true
    }

    /// Write both artifacts atomically.
    ///
    /// Both payloads are fully staged in temp files before either rename,
    /// so a failure anywhere in the write phase leaves the previously
    /// persisted pair untouched. The documents artifact is renamed first:
    /// if its rename fails, the index on disk still matches the documents
    /// on disk.
    pub fn persist(&self, snapshot: &CorpusSnapshot) -> RetrievalResult<()> {
        let dir = self
            .index_path
            .parent()
            .ok_or_else(|| RetrievalError::General("data directory has no parent".to_string()))?;
        std::fs::create_dir_all(dir).map_err(|e| RetrievalError::FileWrite {
            path: dir.to_path_buf(),
            source: e,
        })?;

        let index_tmp =
            tempfile::NamedTempFile::new_in(dir).map_err(|e| RetrievalError::FileWrite {
                path: self.index_path.clone(),
                source: e,
            })?;
        {
            let mut writer = BufWriter::new(index_tmp.as_file());
            snapshot
                .index
                .write_to(&mut writer)
                .map_err(|e| RetrievalError::PersistenceError {
                    path: self.index_path.clone(),
                    source: Box::new(e),
                })?;
        }

        let documents_tmp =
            tempfile::NamedTempFile::new_in(dir).map_err(|e| RetrievalError::FileWrite {
                path: self.documents_path.clone(),
                source: e,
            })?;
        {
            let mut writer = BufWriter::new(documents_tmp.as_file());
            serde_json::to_writer(&mut writer, &snapshot.documents).map_err(|e| {
                RetrievalError::PersistenceError {
                    path: self.documents_path.clone(),
                    source: Box::new(e),
                }
            })?;
            std::io::Write::flush(&mut writer).map_err(|e| RetrievalError::FileWrite {
                path: self.documents_path.clone(),
                source: e,
            })?;
        }

        documents_tmp
            .persist(&self.documents_path)
            .map_err(|e| RetrievalError::PersistenceError {
                path: self.documents_path.clone(),
                source: Box::new(e),
            })?;
        index_tmp
            .persist(&self.index_path)
            .map_err(|e| RetrievalError::PersistenceError {
                path: self.index_path.clone(),
                source: Box::new(e),
            })?;

        info!(
            documents = snapshot.len(),
            index = %self.index_path.display(),
            "persisted corpus artifacts"
        );
        Ok(())
    }

    /// Install a snapshot as the live one, replacing any previous build.
    pub fn install(&self, snapshot: CorpusSnapshot) {
        *self.snapshot.write() = Some(Arc::new(snapshot));
    }

    /// The currently installed snapshot, if any.
    #[must_use]
    pub fn snapshot(&self) -> Option<Arc<CorpusSnapshot>> {
        self.snapshot.read().clone()
    }

    /// True when a non-empty snapshot is installed.
    #[must_use]
    pub fn is_ready(&self) -> bool {
        self.snapshot
            .read()
            .as_ref()
            .is_some_and(|s| !s.is_empty())
    }

    /// Delete both on-disk artifacts, used by forced rebuilds.
    pub fn clear_artifacts(&self) -> RetrievalResult<()> {
        for path in [&self.index_path, &self.documents_path] {
            if path.exists() {
                std::fs::remove_file(path).map_err(|e| RetrievalError::FileWrite {
                    path: path.clone(),
                    source: e,
                })?;
                info!(path = %path.display(), "removed corpus artifact");
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::corpus::DocumentMetadata;
    use crate::types::VectorDimension;
    use tempfile::TempDir;

    fn snapshot_of(contents: &[(&str, Vec<f32>)]) -> CorpusSnapshot {
        let dim = VectorDimension::new(contents[0].1.len()).unwrap();
        let vectors: Vec<Vec<f32>> = contents.iter().map(|(_, v)| v.clone()).collect();
        let index = FlatIndex::from_batch(dim, &vectors).unwrap();
        let documents = contents
            .iter()
            .enumerate()
            .map(|(i, (content, _))| Document {
                content: content.to_string(),
                metadata: DocumentMetadata {
                    artifact_name: format!("artifact-{i}"),
                    source_row_index: i,
                    ..DocumentMetadata::default()
                },
            })
            .collect();
        CorpusSnapshot { index, documents }
    }

    #[test]
    fn test_persist_and_load_round_trip() {
        let temp_dir = TempDir::new().unwrap();
        let store = IndexStore::new(temp_dir.path());
        assert!(!store.artifacts_exist());

        let snapshot = snapshot_of(&[
            ("文物名称：青铜鼎", vec![1.0, 0.0]),
            ("文物名称：玉璧", vec![0.0, 1.0]),
        ]);
        store.persist(&snapshot).unwrap();
        assert!(store.artifacts_exist());

        let fresh = IndexStore::new(temp_dir.path());
        assert!(!fresh.is_ready());
        assert!(fresh.load());
        assert!(fresh.is_ready());

        let loaded = fresh.snapshot().unwrap();
        assert_eq!(loaded.len(), 2);
        assert_eq!(loaded.documents[0].content, "文物名称：青铜鼎");
        assert_eq!(loaded.index.vector(1), Some([0.0, 1.0].as_slice()));
    }

    #[test]
    fn test_load_missing_artifacts_returns_false() {
        let temp_dir = TempDir::new().unwrap();
        let store = IndexStore::new(temp_dir.path());
        assert!(!store.load());
        assert!(store.snapshot().is_none());
    }

    #[test]
    fn test_load_rejects_misaligned_artifacts() {
        let temp_dir = TempDir::new().unwrap();
        let store = IndexStore::new(temp_dir.path());

        let snapshot = snapshot_of(&[("a", vec![1.0]), ("b", vec![2.0])]);
        store.persist(&snapshot).unwrap();

        // Drop one document from the JSON so counts disagree
        let one: Vec<Document> = vec![snapshot.documents[0].clone()];
        std::fs::write(
            store.documents_path(),
            serde_json::to_vec(&one).unwrap(),
        )
        .unwrap();

        let fresh = IndexStore::new(temp_dir.path());
        assert!(!fresh.load());
        assert!(fresh.snapshot().is_none());
    }

    #[test]
    fn test_load_rejects_corrupt_index() {
        let temp_dir = TempDir::new().unwrap();
        let store = IndexStore::new(temp_dir.path());

        let snapshot = snapshot_of(&[("a", vec![1.0])]);
        store.persist(&snapshot).unwrap();
        std::fs::write(store.index_path(), b"garbage").unwrap();

        let fresh = IndexStore::new(temp_dir.path());
        assert!(!fresh.load());
    }

    #[test]
    fn test_failed_persist_leaves_previous_pair_intact() {
        let temp_dir = TempDir::new().unwrap();
        let store = IndexStore::new(temp_dir.path());

        let good = snapshot_of(&[("甲", vec![1.0, 0.0]), ("乙", vec![0.0, 1.0])]);
        store.persist(&good).unwrap();
        let good_index = std::fs::read(store.index_path()).unwrap();
        let good_documents = std::fs::read(store.documents_path()).unwrap();

        // Block the documents rename by putting a non-empty directory at
        // its path, then persist a different same-count snapshot
        std::fs::remove_file(store.documents_path()).unwrap();
        std::fs::create_dir(store.documents_path()).unwrap();
        std::fs::write(store.documents_path().join("occupied"), b"x").unwrap();

        let bad = snapshot_of(&[("丙", vec![9.0, 9.0]), ("丁", vec![8.0, 8.0])]);
        assert!(store.persist(&bad).is_err());

        // The index artifact from the good build was not replaced
        assert_eq!(std::fs::read(store.index_path()).unwrap(), good_index);

        // Restoring the documents artifact restores a loadable, aligned pair
        std::fs::remove_dir_all(store.documents_path()).unwrap();
        std::fs::write(store.documents_path(), &good_documents).unwrap();
        let fresh = IndexStore::new(temp_dir.path());
        assert!(fresh.load());
        assert_eq!(fresh.snapshot().unwrap().documents[0].content, "甲");
    }

    #[test]
    fn test_clear_artifacts() {
        let temp_dir = TempDir::new().unwrap();
        let store = IndexStore::new(temp_dir.path());

        store.persist(&snapshot_of(&[("a", vec![1.0])])).unwrap();
        assert!(store.artifacts_exist());
        store.clear_artifacts().unwrap();
        assert!(!store.artifacts_exist());
        // Clearing again is a no-op
        store.clear_artifacts().unwrap();
    }

    #[test]
    fn test_empty_snapshot_is_not_ready() {
        let temp_dir = TempDir::new().unwrap();
        let store = IndexStore::new(temp_dir.path());
        store.install(CorpusSnapshot {
            index: FlatIndex::new(VectorDimension::new(2).unwrap()),
            documents: Vec::new(),
        });
        assert!(!store.is_ready());
    }
}
