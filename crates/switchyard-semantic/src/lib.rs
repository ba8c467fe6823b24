//! Embedding-based semantic similarity: the classifier behind the router's
//! semantic stage and the FAQ retrieval store.

/// Embedding-similarity classifier
pub mod classifier;
/// Embedding providers
pub mod embedding;
/// FAQ knowledge base
pub mod faq;
/// In-memory vector store
pub mod store;

pub use classifier::EmbeddingClassifier;
pub use embedding::{Embedding, EmbeddingProvider, LexicalEmbedder, OllamaEmbeddingClient};
pub use faq::{FaqEntry, FaqMatch, FaqStore};
pub use store::{ScoredEntry, StoredEntry, VectorStore, cosine_similarity};
