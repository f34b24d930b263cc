//! Ingestion for Synaxarion: fetch source pages, archive them, extract
//! documents, chunk, embed, and replace a domain's index.

pub mod chunker;
pub mod extract;
pub mod fetcher;
pub mod pipeline;

pub use chunker::TextSplitter;
pub use extract::{RawDocument, extract_document, source_name, strip_html};
pub use fetcher::{HttpFetcher, SourceFetcher};
pub use pipeline::{IngestReport, IngestionPipeline};
