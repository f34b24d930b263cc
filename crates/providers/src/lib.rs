//! Generation and embedding service clients for Synaxarion.
//!
//! All chat backends implement `synaxarion_core::Provider`; the
//! [`ProviderEmbedder`] adapter exposes a provider's embedding endpoint as a
//! `synaxarion_core::EmbeddingProvider` bound to one model.

pub mod embedder;
pub mod factory;
pub mod openai_compat;

pub use embedder::ProviderEmbedder;
pub use factory::{build_from_config, default_base_url};
pub use openai_compat::OpenAiCompatProvider;
