//! Vector index implementations and the per-domain retrieval store.

pub mod file_index;
pub mod in_memory;
mod snapshot;
pub mod store;
pub mod vector;

pub use file_index::FileVectorIndex;
pub use in_memory::InMemoryIndex;
pub use store::RetrievalStore;
pub use vector::{cosine_similarity, vector_search};
