//! Error types for the Synaxarion domain.
//!
//! Uses `thiserror` for ergonomic error definitions.
//! Each bounded context has its own error variant.

use thiserror::Error;

/// The top-level error type for all Synaxarion operations.
#[derive(Debug, Error)]
pub enum Error {
    // --- Provider errors (embedding and generation services) ---
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    // --- Vector index errors ---
    #[error("Index error: {0}")]
    Index(#[from] IndexError),

    // --- Ingestion errors ---
    #[error("Ingestion error: {0}")]
    Ingest(#[from] IngestError),

    // --- Tool errors ---
    #[error("Tool error: {0}")]
    Tool(#[from] ToolError),

    // --- Configuration errors ---
    #[error("Configuration error: {message}")]
    Config { message: String },

    // --- Serialization ---
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    // --- Generic ---
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type alias using our Error.
pub type Result<T> = std::result::Result<T, Error>;

// --- Bounded context errors ---

/// Failures talking to the embedding or generation service.
///
/// None of these are retried; callers surface them as-is.
#[derive(Debug, Clone, Error)]
pub enum ProviderError {
    #[error("API request failed: {message} (status: {status_code})")]
    ApiError { status_code: u16, message: String },

    #[error("Rate limited by provider, retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("Provider not configured: {0}")]
    NotConfigured(String),

    #[error("Request timed out: {0}")]
    Timeout(String),

    #[error("Network error: {0}")]
    Network(String),
}

#[derive(Debug, Error)]
pub enum IndexError {
    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Corrupted index at {path}: {reason}")]
    Corrupted { path: String, reason: String },

    #[error("Embedding dimension mismatch: index holds {expected}-d vectors, got {actual}-d")]
    DimensionMismatch { expected: usize, actual: usize },
}

#[derive(Debug, Error)]
pub enum IngestError {
    #[error("Failed to fetch source {source_id}: {reason}")]
    SourceFetchFailed { source_id: String, reason: String },

    #[error("Failed to archive {path}: {reason}")]
    Archive { path: String, reason: String },

    #[error("No documents to index for domain '{0}'")]
    NoDocuments(String),
}

#[derive(Debug, Error)]
pub enum ToolError {
    #[error("Tool not found: {0}")]
    NotFound(String),

    #[error("Tool execution failed: {tool_name}: {reason}")]
    ExecutionFailed { tool_name: String, reason: String },

    #[error("Invalid tool arguments: {0}")]
    InvalidArguments(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provider_error_displays_correctly() {
        let err = Error::Provider(ProviderError::ApiError {
            status_code: 429,
            message: "Too many requests".into(),
        });
        assert!(err.to_string().contains("429"));
        assert!(err.to_string().contains("Too many requests"));
    }

    #[test]
    fn dimension_mismatch_names_both_sizes() {
        let err = Error::Index(IndexError::DimensionMismatch {
            expected: 1536,
            actual: 3,
        });
        let text = err.to_string();
        assert!(text.contains("1536"));
        assert!(text.contains("3-d"));
    }

    #[test]
    fn source_fetch_failure_names_source() {
        let err = IngestError::SourceFetchFailed {
            source_id: "https://orthodoxwiki.org/Category:Saints".into(),
            reason: "connection reset".into(),
        };
        assert!(err.to_string().contains("orthodoxwiki.org"));
        assert!(err.to_string().contains("connection reset"));
    }
}
