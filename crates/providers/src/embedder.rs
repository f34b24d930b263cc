//! Embedding adapter over a chat provider's embedding endpoint.

use std::sync::Arc;

use async_trait::async_trait;
use synaxarion_core::EmbeddingProvider;
use synaxarion_core::error::ProviderError;
use synaxarion_core::provider::{EmbeddingRequest, Provider};

/// Binds a [`Provider`] to a single embedding model.
///
/// Ingestion and query time must use the same model; holding the model name
/// here lets the index manifest record it.
pub struct ProviderEmbedder {
    provider: Arc<dyn Provider>,
    model: String,
}

impl ProviderEmbedder {
    pub fn new(provider: Arc<dyn Provider>, model: impl Into<String>) -> Self {
        Self {
            provider,
            model: model.into(),
        }
    }
}

#[async_trait]
impl EmbeddingProvider for ProviderEmbedder {
    fn model(&self) -> &str {
        &self.model
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>, ProviderError> {
        let mut vectors = self.embed_batch(&[text.to_string()]).await?;
        vectors.pop().ok_or_else(|| ProviderError::ApiError {
            status_code: 200,
            message: "Embedding response contained no vectors".into(),
        })
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, ProviderError> {
        let response = self
            .provider
            .embed(EmbeddingRequest {
                model: self.model.clone(),
                inputs: texts.to_vec(),
            })
            .await?;
        Ok(response.embeddings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use synaxarion_core::provider::{EmbeddingResponse, ProviderRequest, ProviderResponse};

    /// Embeds each text as `[len, index]`.
    struct CountingProvider;

    #[async_trait]
    impl Provider for CountingProvider {
        fn name(&self) -> &str {
            "counting"
        }

        async fn complete(&self, _req: ProviderRequest) -> Result<ProviderResponse, ProviderError> {
            Err(ProviderError::NotConfigured("chat".into()))
        }

        async fn embed(&self, req: EmbeddingRequest) -> Result<EmbeddingResponse, ProviderError> {
            assert_eq!(req.model, "text-embedding-3-small");
            Ok(EmbeddingResponse {
                embeddings: req
                    .inputs
                    .iter()
                    .enumerate()
                    .map(|(i, t)| vec![t.len() as f32, i as f32])
                    .collect(),
                model: req.model,
                usage: None,
            })
        }
    }

    #[tokio::test]
    async fn batch_passes_model_and_keeps_order() {
        let embedder = ProviderEmbedder::new(Arc::new(CountingProvider), "text-embedding-3-small");
        let out = embedder
            .embed_batch(&["abba".into(), "st".into()])
            .await
            .unwrap();
        assert_eq!(out, vec![vec![4.0, 0.0], vec![2.0, 1.0]]);
    }

    #[tokio::test]
    async fn single_embed_uses_batch_endpoint() {
        let embedder = ProviderEmbedder::new(Arc::new(CountingProvider), "text-embedding-3-small");
        assert_eq!(embedder.embed("abc").await.unwrap(), vec![3.0, 0.0]);
        assert_eq!(embedder.model(), "text-embedding-3-small");
    }
}
