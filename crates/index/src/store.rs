//! Retrieval store: one embedding provider bound to one index.
//!
//! This is the only component a domain expert talks to for retrieval. It
//! embeds the query, asks the index for the nearest passages, and renders
//! them as numbered grounding text.

use std::sync::Arc;

use synaxarion_core::error::IndexError;
use synaxarion_core::{EmbeddingProvider, Result, RetrievalResult, VectorIndex};
use tracing::debug;

/// Default number of passages returned per query.
pub const DEFAULT_TOP_K: usize = 5;

pub struct RetrievalStore {
    label: String,
    embedder: Arc<dyn EmbeddingProvider>,
    index: Arc<dyn VectorIndex>,
    top_k: usize,
}

impl RetrievalStore {
    /// `label` is the human name of the domain, used in the
    /// not-initialized message.
    pub fn new(
        label: impl Into<String>,
        embedder: Arc<dyn EmbeddingProvider>,
        index: Arc<dyn VectorIndex>,
    ) -> Self {
        Self {
            label: label.into(),
            embedder,
            index,
            top_k: DEFAULT_TOP_K,
        }
    }

    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = top_k.max(1);
        self
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn top_k(&self) -> usize {
        self.top_k
    }

    /// The reply given instead of retrieval output when nothing has been
    /// ingested yet.
    pub fn not_initialized_message(&self) -> String {
        format!("The {} database has not been initialized yet.", self.label)
    }

    pub async fn is_initialized(&self) -> Result<bool> {
        Ok(self.index.len().await? > 0)
    }

    /// Ranked passages for `text`. An empty index yields an empty result.
    ///
    /// `top_k` of zero is treated as one.
    pub async fn search(&self, text: &str, top_k: usize) -> Result<RetrievalResult> {
        if !self.is_initialized().await? {
            return Ok(RetrievalResult::default());
        }

        let limit = top_k.max(1);
        let embedding = self.embedder.embed(text).await?;

        if let Some(manifest) = self.index.manifest().await? {
            if manifest.dimension != embedding.len() {
                return Err(IndexError::DimensionMismatch {
                    expected: manifest.dimension,
                    actual: embedding.len(),
                }
                .into());
            }
            if manifest.model != self.embedder.model() {
                tracing::warn!(
                    index_model = %manifest.model,
                    query_model = %self.embedder.model(),
                    "Querying an index built with a different embedding model"
                );
            }
        }

        let matches = self.index.search(&embedding, limit).await?;
        let result = RetrievalResult::ranked(matches, limit);
        debug!(domain = %self.label, hits = result.len(), "Retrieved passages");
        Ok(result)
    }

    /// Grounding text for `text`: the top passages as
    /// `Source N:\n...` blocks, or the not-initialized message.
    pub async fn query(&self, text: &str, top_k: usize) -> Result<String> {
        if !self.is_initialized().await? {
            debug!(domain = %self.label, "Index empty, returning not-initialized message");
            return Ok(self.not_initialized_message());
        }
        Ok(self.search(text, top_k).await?.to_grounding_text())
    }
}
