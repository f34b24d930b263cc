//! The ingestion pipeline for one knowledge domain.
//!
//! ```text
//! sources ──fetch──▶ raw archive ──extract──▶ RawDocument ──chunk──▶ Passage
//!                                                                  │
//!                                        index.replace ◀──embed────┘
//! ```
//!
//! Sources are fetched one at a time with a pause between requests. A source
//! that fails is logged and skipped; the run only fails if nothing at all
//! could be extracted, so a bad scrape never wipes a good index.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use synaxarion_config::{AppConfig, DomainConfig};
use synaxarion_core::error::IngestError;
use synaxarion_core::{EmbeddingProvider, IndexedPassage, Passage, PassageMetadata, Result, VectorIndex};
use tracing::{debug, info, warn};

use crate::chunker::TextSplitter;
use crate::extract::{RawDocument, extract_document, source_name};
use crate::fetcher::SourceFetcher;

/// Summary of one ingestion run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngestReport {
    pub domain: String,
    pub sources_attempted: usize,
    pub sources_failed: usize,
    pub documents: usize,
    pub passages: usize,
}

impl std::fmt::Display for IngestReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}: {} passages from {} documents ({} of {} sources failed)",
            self.domain, self.passages, self.documents, self.sources_failed, self.sources_attempted
        )
    }
}

pub struct IngestionPipeline {
    domain: String,
    sources: Vec<String>,
    raw_dir: Option<PathBuf>,
    fetcher: Arc<dyn SourceFetcher>,
    embedder: Arc<dyn EmbeddingProvider>,
    index: Arc<dyn VectorIndex>,
    splitter: TextSplitter,
    politeness_delay: Duration,
    batch_size: usize,
}

impl IngestionPipeline {
    pub fn new(
        domain: impl Into<String>,
        fetcher: Arc<dyn SourceFetcher>,
        embedder: Arc<dyn EmbeddingProvider>,
        index: Arc<dyn VectorIndex>,
    ) -> Self {
        Self {
            domain: domain.into(),
            sources: Vec::new(),
            raw_dir: None,
            fetcher,
            embedder,
            index,
            splitter: TextSplitter::default(),
            politeness_delay: Duration::from_millis(1000),
            batch_size: 64,
        }
    }

    /// A pipeline configured from a domain entry and the global ingest
    /// settings.
    pub fn for_domain(
        config: &AppConfig,
        domain: &DomainConfig,
        fetcher: Arc<dyn SourceFetcher>,
        embedder: Arc<dyn EmbeddingProvider>,
        index: Arc<dyn VectorIndex>,
    ) -> Self {
        Self::new(&domain.name, fetcher, embedder, index)
            .with_sources(domain.sources.clone())
            .with_raw_dir(config.resolve(&domain.raw_dir))
            .with_splitter(TextSplitter::new(
                config.ingest.chunk_size,
                config.ingest.chunk_overlap,
            ))
            .with_politeness_delay(Duration::from_millis(config.ingest.politeness_delay_ms))
            .with_batch_size(config.ingest.embed_batch_size)
    }

    pub fn with_sources(mut self, sources: Vec<String>) -> Self {
        self.sources = sources;
        self
    }

    /// Archive every fetched page under `dir`.
    pub fn with_raw_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.raw_dir = Some(dir.into());
        self
    }

    pub fn with_splitter(mut self, splitter: TextSplitter) -> Self {
        self.splitter = splitter;
        self
    }

    pub fn with_politeness_delay(mut self, delay: Duration) -> Self {
        self.politeness_delay = delay;
        self
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    pub fn domain(&self) -> &str {
        &self.domain
    }

    /// Fetch, archive and extract the configured sources, then replace the
    /// index with the result.
    pub async fn run(&self) -> Result<IngestReport> {
        info!(domain = %self.domain, sources = self.sources.len(), "Starting ingestion");
        let (documents, failed) = self.collect_counting(&self.sources).await?;
        let mut report = self.index(&documents).await?;
        report.sources_attempted = self.sources.len();
        report.sources_failed = failed;
        info!(%report, "Ingestion finished");
        Ok(report)
    }

    /// Fetch and extract `sources` in order. Failed sources are skipped.
    pub async fn collect(&self, sources: &[String]) -> Result<Vec<RawDocument>> {
        Ok(self.collect_counting(sources).await?.0)
    }

    async fn collect_counting(&self, sources: &[String]) -> Result<(Vec<RawDocument>, usize)> {
        let mut documents = Vec::new();
        let mut failed = 0;

        for (i, url) in sources.iter().enumerate() {
            if i > 0 && !self.politeness_delay.is_zero() {
                tokio::time::sleep(self.politeness_delay).await;
            }

            let html = match self.fetcher.fetch(url).await {
                Ok(html) => html,
                Err(e) => {
                    warn!(domain = %self.domain, error = %e, "Skipping source");
                    failed += 1;
                    continue;
                }
            };

            if let Err(e) = self.archive(url, &html).await {
                warn!(domain = %self.domain, error = %e, "Skipping source");
                failed += 1;
                continue;
            }

            match extract_document(&html, url) {
                Some(doc) => {
                    debug!(url = %url, name = %doc.name, chars = doc.text.len(), "Extracted document");
                    documents.push(doc);
                }
                None => warn!(url = %url, "Source contained no text"),
            }
        }

        Ok((documents, failed))
    }

    async fn archive(&self, url: &str, html: &str) -> std::result::Result<(), IngestError> {
        let Some(dir) = &self.raw_dir else {
            return Ok(());
        };
        let path = dir.join(format!("{}.html", source_name(url)));
        let archive_err = |e: std::io::Error| IngestError::Archive {
            path: path.display().to_string(),
            reason: e.to_string(),
        };

        tokio::fs::create_dir_all(dir).await.map_err(archive_err)?;
        tokio::fs::write(&path, html).await.map_err(archive_err)?;
        debug!(path = %path.display(), "Archived raw page");
        Ok(())
    }

    /// Chunk and embed `documents`, then replace the index with them.
    ///
    /// An empty document set is refused rather than emptying the index.
    pub async fn index(&self, documents: &[RawDocument]) -> Result<IngestReport> {
        if documents.is_empty() {
            return Err(IngestError::NoDocuments(self.domain.clone()).into());
        }

        let passages: Vec<Passage> = documents
            .iter()
            .flat_map(|doc| {
                let metadata = PassageMetadata {
                    name: doc.name.clone(),
                    feast_day: doc.feast_day.clone(),
                    source_url: doc.source_url.clone(),
                };
                self.splitter
                    .split(&doc.text)
                    .into_iter()
                    .enumerate()
                    .map(move |(i, chunk)| Passage::new(chunk, metadata.clone(), i))
            })
            .collect();

        info!(
            domain = %self.domain,
            documents = documents.len(),
            passages = passages.len(),
            "Embedding passages"
        );

        let mut entries = Vec::with_capacity(passages.len());
        for batch in passages.chunks(self.batch_size) {
            let texts: Vec<String> = batch.iter().map(|p| p.text.clone()).collect();
            let embeddings = self.embedder.embed_batch(&texts).await?;
            if embeddings.len() != batch.len() {
                return Err(synaxarion_core::Error::Internal(format!(
                    "embedder returned {} vectors for {} passages",
                    embeddings.len(),
                    batch.len()
                )));
            }
            entries.extend(
                batch
                    .iter()
                    .cloned()
                    .zip(embeddings)
                    .map(|(passage, embedding)| IndexedPassage { passage, embedding }),
            );
        }

        let stored = self.index.replace(self.embedder.model(), entries).await?;

        Ok(IngestReport {
            domain: self.domain.clone(),
            sources_attempted: 0,
            sources_failed: 0,
            documents: documents.len(),
            passages: stored,
        })
    }
}
