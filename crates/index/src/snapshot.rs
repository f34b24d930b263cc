//! Immutable index contents shared by the file and in-memory backends.

use chrono::Utc;
use synaxarion_core::error::IndexError;
use synaxarion_core::{IndexManifest, IndexedPassage, ScoredPassage};

use crate::vector::vector_search;

#[derive(Debug, Default)]
pub(crate) struct Snapshot {
    pub manifest: Option<IndexManifest>,
    pub entries: Vec<IndexedPassage>,
}

impl Snapshot {
    /// Build a snapshot, rejecting entries whose dimension disagrees with
    /// the first entry.
    pub fn build(model: &str, entries: Vec<IndexedPassage>) -> Result<Self, IndexError> {
        let dimension = entries.first().map(|e| e.embedding.len()).unwrap_or(0);
        if let Some(bad) = entries.iter().find(|e| e.embedding.len() != dimension) {
            return Err(IndexError::DimensionMismatch {
                expected: dimension,
                actual: bad.embedding.len(),
            });
        }

        Ok(Self {
            manifest: Some(IndexManifest {
                model: model.to_string(),
                dimension,
                passages: entries.len(),
                built_at: Utc::now(),
            }),
            entries,
        })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn search(&self, query: &[f32], limit: usize) -> Result<Vec<ScoredPassage>, IndexError> {
        if self.entries.is_empty() {
            return Ok(Vec::new());
        }
        if let Some(manifest) = &self.manifest {
            if manifest.dimension != query.len() {
                return Err(IndexError::DimensionMismatch {
                    expected: manifest.dimension,
                    actual: query.len(),
                });
            }
        }
        Ok(vector_search(&self.entries, query, limit))
    }
}
