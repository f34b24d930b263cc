//! # Synaxarion Core
//!
//! Domain types, traits, and error definitions for the Synaxarion
//! retrieval-augmented question-answering service. This crate has no
//! framework dependencies; every other crate implements against it.
//!
//! Each collaborator is a trait here (`Provider`, `EmbeddingProvider`,
//! `VectorIndex`, `Tool`), so implementations can be swapped via
//! configuration and stubbed in tests.

pub mod embedding;
pub mod error;
pub mod index;
pub mod message;
pub mod passage;
pub mod provider;
pub mod tool;

// Re-export key types at crate root for ergonomics
pub use embedding::EmbeddingProvider;
pub use error::{Error, Result};
pub use index::{IndexManifest, IndexedPassage, VectorIndex};
pub use message::{Conversation, ConversationId, Message, MessageToolCall, Role};
pub use passage::{Passage, PassageMetadata, RetrievalResult, ScoredPassage};
pub use provider::{Provider, ProviderRequest, ProviderResponse, ToolDecision, ToolDefinition};
pub use tool::{Tool, ToolCall, ToolRegistry, ToolResult};
