//! Embedding provider trait.
//!
//! Abstracts over whatever turns text into a fixed-length vector. The
//! dimension is fixed by the model; an index built with one model must only
//! ever be queried with vectors from the same model.

use async_trait::async_trait;

use crate::error::ProviderError;

#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// The embedding model identifier, recorded in index manifests.
    fn model(&self) -> &str;

    /// Generate an embedding for a single text.
    async fn embed(&self, text: &str) -> Result<Vec<f32>, ProviderError>;

    /// Generate embeddings for a batch of texts, in input order.
    ///
    /// Default implementation calls `embed` for each text sequentially.
    /// Backends that support native batching should override this.
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, ProviderError> {
        let mut results = Vec::with_capacity(texts.len());
        for text in texts {
            results.push(self.embed(text).await?);
        }
        Ok(results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct LengthEmbedder;

    #[async_trait]
    impl EmbeddingProvider for LengthEmbedder {
        fn model(&self) -> &str {
            "length"
        }

        async fn embed(&self, text: &str) -> Result<Vec<f32>, ProviderError> {
            Ok(vec![text.len() as f32, 1.0])
        }
    }

    #[tokio::test]
    async fn default_batch_preserves_order() {
        let embedder = LengthEmbedder;
        let out = embedder
            .embed_batch(&["a".into(), "abc".into(), "ab".into()])
            .await
            .unwrap();
        assert_eq!(out, vec![vec![1.0, 1.0], vec![3.0, 1.0], vec![2.0, 1.0]]);
    }
}
