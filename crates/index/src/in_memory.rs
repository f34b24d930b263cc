//! In-memory vector index for testing and ephemeral use.

use async_trait::async_trait;
use std::sync::Arc;
use synaxarion_core::error::IndexError;
use synaxarion_core::{IndexManifest, IndexedPassage, ScoredPassage, VectorIndex};
use tokio::sync::RwLock;

use crate::snapshot::Snapshot;

pub struct InMemoryIndex {
    snapshot: Arc<RwLock<Snapshot>>,
}

impl InMemoryIndex {
    pub fn new() -> Self {
        Self {
            snapshot: Arc::new(RwLock::new(Snapshot::default())),
        }
    }
}

impl Default for InMemoryIndex {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl VectorIndex for InMemoryIndex {
    fn name(&self) -> &str {
        "in_memory"
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
        let snapshot = Snapshot::build(model, entries)?;
        let count = snapshot.len();
        *self.snapshot.write().await = snapshot;
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use synaxarion_core::{Passage, PassageMetadata};

    #[tokio::test]
    async fn replace_then_search() {
        let index = InMemoryIndex::new();
        assert_eq!(index.len().await.unwrap(), 0);

        let entries = vec![
            IndexedPassage {
                passage: Passage::new("Saint Sergius founded the Trinity Lavra.", PassageMetadata::default(), 0),
                embedding: vec![1.0, 0.0],
            },
            IndexedPassage {
                passage: Passage::new("Saint Seraphim lived in the forest.", PassageMetadata::default(), 1),
                embedding: vec![0.0, 1.0],
            },
        ];
        assert_eq!(index.replace("m", entries).await.unwrap(), 2);

        let hits = index.search(&[0.1, 0.9], 1).await.unwrap();
        assert_eq!(hits.len(), 1);
        assert!(hits[0].passage.text.contains("Seraphim"));
    }

    #[tokio::test]
    async fn replace_with_nothing_empties_index() {
        let index = InMemoryIndex::new();
        index
            .replace(
                "m",
                vec![IndexedPassage {
                    passage: Passage::new("x", PassageMetadata::default(), 0),
                    embedding: vec![1.0],
                }],
            )
            .await
            .unwrap();
        index.replace("m", Vec::new()).await.unwrap();
        assert_eq!(index.len().await.unwrap(), 0);
    }
}
