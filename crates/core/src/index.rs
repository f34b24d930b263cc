//! VectorIndex trait: persisted (vector, passage) storage with
//! nearest-neighbour search.
//!
//! An index is built once per ingestion run and replaced wholesale on the
//! next run; there are no partial updates.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::IndexError;
use crate::passage::{Passage, ScoredPassage};

/// A passage together with its embedding, the persisted unit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexedPassage {
    pub passage: Passage,
    pub embedding: Vec<f32>,
}

/// Describes the vectors an index was built from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexManifest {
    /// Embedding model that produced every stored vector
    pub model: String,
    pub dimension: usize,
    pub passages: usize,
    pub built_at: DateTime<Utc>,
}

#[async_trait]
pub trait VectorIndex: Send + Sync {
    /// The backend name (e.g., "file", "in_memory").
    fn name(&self) -> &str;

    /// Number of stored passages. Zero means "not initialized".
    async fn len(&self) -> Result<usize, IndexError>;

    /// Manifest of the current contents, if anything has been built.
    async fn manifest(&self) -> Result<Option<IndexManifest>, IndexError>;

    /// The `limit` passages most similar to `query`, best first.
    async fn search(&self, query: &[f32], limit: usize) -> Result<Vec<ScoredPassage>, IndexError>;

    /// Replace the entire contents with `entries`. Returns the stored count.
    async fn replace(&self, model: &str, entries: Vec<IndexedPassage>) -> Result<usize, IndexError>;
}
