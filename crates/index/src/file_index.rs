//! File-based vector index: a JSON manifest plus JSON-lines passages.
//!
//! Layout inside the index directory:
//!
//! ```text
//! manifest.json    {"model", "dimension", "passages", "built_at"}
//! passages.jsonl   one IndexedPassage per line
//! ```
//!
//! The manifest is written last, so an index without one is treated as
//! never built. Replacement writes both files to temporaries and renames
//! them into place.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use synaxarion_core::error::IndexError;
use synaxarion_core::{IndexManifest, IndexedPassage, ScoredPassage, VectorIndex};
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info, warn};

use crate::snapshot::Snapshot;

const MANIFEST_FILE: &str = "manifest.json";
const PASSAGES_FILE: &str = "passages.jsonl";

/// A persisted index, loaded into memory on open.
///
/// Searches take a read lock on the cached snapshot; `replace` writes the
/// new files first and holds the write lock only for the swap.
pub struct FileVectorIndex {
    dir: PathBuf,
    snapshot: Arc<RwLock<Snapshot>>,
    writer: Mutex<()>,
}

impl FileVectorIndex {
    /// Open the index stored in `dir`.
    ///
    /// A missing directory or manifest yields an empty index. Unreadable
    /// passage lines are skipped with a warning; an unparseable manifest
    /// is an error.
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self, IndexError> {
        let dir = dir.into();
        let snapshot = Self::load_from_disk(&dir)?;
        debug!(path = %dir.display(), count = snapshot.len(), "File index loaded");
        Ok(Self {
            dir,
            snapshot: Arc::new(RwLock::new(snapshot)),
            writer: Mutex::new(()),
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn load_from_disk(dir: &Path) -> Result<Snapshot, IndexError> {
        let manifest_path = dir.join(MANIFEST_FILE);
        let manifest_text = match std::fs::read_to_string(&manifest_path) {
            Ok(text) => text,
            Err(_) => {
                if dir.join(PASSAGES_FILE).exists() {
                    warn!(path = %dir.display(), "Passages without a manifest; treating index as empty");
                }
                return Ok(Snapshot::default());
            }
        };

        let manifest: IndexManifest =
            serde_json::from_str(&manifest_text).map_err(|e| IndexError::Corrupted {
                path: manifest_path.display().to_string(),
                reason: e.to_string(),
            })?;

        let content = std::fs::read_to_string(dir.join(PASSAGES_FILE)).unwrap_or_default();
        let entries: Vec<IndexedPassage> = content
            .lines()
            .filter(|line| !line.trim().is_empty())
            .filter_map(|line| match serde_json::from_str::<IndexedPassage>(line) {
                Ok(entry) if entry.embedding.len() == manifest.dimension => Some(entry),
                Ok(entry) => {
                    warn!(
                        id = %entry.passage.id,
                        expected = manifest.dimension,
                        actual = entry.embedding.len(),
                        "Skipping passage with wrong embedding dimension"
                    );
                    None
                }
                Err(e) => {
                    warn!(error = %e, "Skipping corrupted passage line");
                    None
                }
            })
            .collect();

        if entries.len() != manifest.passages {
            warn!(
                path = %dir.display(),
                manifest = manifest.passages,
                loaded = entries.len(),
                "Passage count differs from manifest"
            );
        }

        Ok(Snapshot {
            manifest: Some(manifest),
            entries,
        })
    }

    async fn write_atomically(&self, name: &str, content: &[u8]) -> Result<(), IndexError> {
        let target = self.dir.join(name);
        let tmp = self.dir.join(format!("{name}.tmp"));
        tokio::fs::write(&tmp, content)
            .await
            .map_err(|e| IndexError::Storage(format!("Failed to write {}: {e}", tmp.display())))?;
        tokio::fs::rename(&tmp, &target).await.map_err(|e| {
            IndexError::Storage(format!("Failed to move index file into place: {e}"))
        })
    }
}

#[async_trait]
impl VectorIndex for FileVectorIndex {
    fn name(&self) -> &str {
        "file"
    }

    async fn len(&self) -> Result<usize, IndexError> {
        Ok(self.snapshot.read().await.len())
    }

    async fn manifest(&self) -> Result<Option<IndexManifest>, IndexError> {
        Ok(self.snapshot.read().await.manifest.clone())
    }

    async fn search(&self, query: &[f32], limit: usize) -> Result<Vec<ScoredPassage>, IndexError> {
        self.snapshot.read().await.search(query, limit)
    }

    async fn replace(&self, model: &str, entries: Vec<IndexedPassage>) -> Result<usize, IndexError> {
        let _writer = self.writer.lock().await;
        let snapshot = Snapshot::build(model, entries)?;

        tokio::fs::create_dir_all(&self.dir).await.map_err(|e| {
            IndexError::Storage(format!("Failed to create index directory: {e}"))
        })?;

        let mut lines = String::new();
        for entry in &snapshot.entries {
            let line = serde_json::to_string(entry)
                .map_err(|e| IndexError::Storage(format!("Failed to serialize passage: {e}")))?;
            lines.push_str(&line);
            lines.push('\n');
        }
        let manifest = serde_json::to_vec_pretty(&snapshot.manifest)
            .map_err(|e| IndexError::Storage(format!("Failed to serialize manifest: {e}")))?;

        self.write_atomically(PASSAGES_FILE, lines.as_bytes()).await?;
        self.write_atomically(MANIFEST_FILE, &manifest).await?;

        let count = snapshot.len();
        *self.snapshot.write().await = snapshot;
        info!(path = %self.dir.display(), passages = count, "Index replaced");
        Ok(count)
    }
}
