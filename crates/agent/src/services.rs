//! Builds the running service graph from configuration.
//!
//! One provider serves both generation and embeddings. Each configured
//! domain gets a file index, a retrieval store, an expert, and an entry in
//! the router's tool registry. Everything is built once and shared.

use std::sync::Arc;
use std::time::Duration;

use synaxarion_config::{AppConfig, DomainConfig};
use synaxarion_core::provider::Provider;
use synaxarion_core::tool::ToolRegistry;
use synaxarion_core::{EmbeddingProvider, Result};
use synaxarion_index::{FileVectorIndex, RetrievalStore};
use synaxarion_ingest::{HttpFetcher, IngestReport, IngestionPipeline, SourceFetcher};
use synaxarion_providers::{ProviderEmbedder, build_from_config};
use tracing::info;

use crate::expert::{DomainExpert, ExpertTool};
use crate::router::Router;

/// A configured knowledge domain and its live components.
pub struct Domain {
    pub config: DomainConfig,
    pub index: Arc<FileVectorIndex>,
    pub store: Arc<RetrievalStore>,
    pub expert: Arc<DomainExpert>,
}

pub struct Services {
    config: AppConfig,
    provider: Arc<dyn Provider>,
    embedder: Arc<dyn EmbeddingProvider>,
    domains: Vec<Domain>,
    router: Arc<Router>,
}

impl Services {
    /// Build everything using the provider described by `config`.
    pub fn from_config(config: AppConfig) -> Result<Self> {
        let provider = build_from_config(&config);
        Self::with_provider(config, provider)
    }

    /// Build everything around an existing provider.
    pub fn with_provider(config: AppConfig, provider: Arc<dyn Provider>) -> Result<Self> {
        let embedder: Arc<dyn EmbeddingProvider> = Arc::new(ProviderEmbedder::new(
            provider.clone(),
            &config.embedding_model,
        ));

        let mut registry = ToolRegistry::new();
        let mut domains = Vec::with_capacity(config.domains.len());

        for domain in &config.domains {
            let index = Arc::new(FileVectorIndex::open(config.resolve(&domain.index_dir))?);
            let store = Arc::new(
                RetrievalStore::new(&domain.label, embedder.clone(), index.clone())
                    .with_top_k(config.retrieval.top_k),
            );
            let expert = Arc::new(
                DomainExpert::new(store.clone(), provider.clone(), &config.model)
                    .with_temperature(config.temperature)
                    .with_max_tokens(config.max_tokens),
            );
            registry.register(Box::new(ExpertTool::new(
                &domain.tool_name,
                &domain.description,
                expert.clone(),
            )));

            info!(domain = %domain.name, tool = %domain.tool_name, "Domain ready");
            domains.push(Domain {
                config: domain.clone(),
                index,
                store,
                expert,
            });
        }

        let router = Arc::new(
            Router::new(
                provider.clone(),
                &config.model,
                Arc::new(registry),
                &config.router.system_prompt,
            )
            .with_temperature(config.temperature)
            .with_max_tokens(config.max_tokens)
            .with_max_tool_rounds(config.router.max_tool_rounds),
        );

        Ok(Self {
            config,
            provider,
            embedder,
            domains,
            router,
        })
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn provider(&self) -> &Arc<dyn Provider> {
        &self.provider
    }

    pub fn embedder(&self) -> &Arc<dyn EmbeddingProvider> {
        &self.embedder
    }

    pub fn router(&self) -> &Arc<Router> {
        &self.router
    }

    pub fn domains(&self) -> &[Domain] {
        &self.domains
    }

    pub fn domain(&self, name: &str) -> Option<&Domain> {
        self.domains.iter().find(|d| d.config.name == name)
    }

    /// The named domain, or the configured default when `name` is `None`.
    pub fn domain_or_default(&self, name: Option<&str>) -> Option<&Domain> {
        self.domain(name.unwrap_or(&self.config.default_domain))
    }

    /// The HTTP fetcher ingestion uses outside of tests.
    pub fn http_fetcher(&self) -> Arc<dyn SourceFetcher> {
        Arc::new(HttpFetcher::new(Duration::from_secs(
            self.config.ingest.fetch_timeout_secs,
        )))
    }

    /// An ingestion pipeline that writes into `domain`'s live index.
    pub fn ingestion(&self, domain: &Domain, fetcher: Arc<dyn SourceFetcher>) -> IngestionPipeline {
        IngestionPipeline::for_domain(
            &self.config,
            &domain.config,
            fetcher,
            self.embedder.clone(),
            domain.index.clone(),
        )
    }

    /// Re-scrape and re-index one domain.
    pub async fn ingest(&self, domain: &Domain, fetcher: Arc<dyn SourceFetcher>) -> Result<IngestReport> {
        self.ingestion(domain, fetcher).run().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::SequentialMockProvider;

    fn config_in(dir: &std::path::Path) -> AppConfig {
        AppConfig {
            data_dir: dir.to_path_buf(),
            ..AppConfig::default()
        }
    }

    #[tokio::test]
    async fn default_config_registers_both_experts() {
        let tmp = tempfile::tempdir().unwrap();
        let services =
            Services::with_provider(config_in(tmp.path()), Arc::new(SequentialMockProvider::new(vec![])))
                .unwrap();

        assert_eq!(services.domains().len(), 2);
        assert_eq!(
            services.router().tools().names(),
            vec!["LivesOfTheSaintsExpert", "SaintsExpert"]
        );
        assert_eq!(
            services.domain_or_default(None).unwrap().config.name,
            "lives_of_the_saints"
        );
        assert!(services.domain("desert").is_none());
    }

    #[tokio::test]
    async fn fresh_domains_are_uninitialized() {
        let tmp = tempfile::tempdir().unwrap();
        let services =
            Services::with_provider(config_in(tmp.path()), Arc::new(SequentialMockProvider::new(vec![])))
                .unwrap();
        let saints = services.domain("saints").unwrap();
        assert_eq!(
            saints.store.query("Who was Saint Olga?", 5).await.unwrap(),
            "The saints database has not been initialized yet."
        );
        assert_eq!(saints.index.dir(), tmp.path().join("saints_vectordb"));
    }
}
