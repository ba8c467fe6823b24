//! Embedding providers: Ollama for real sentence embeddings, and a hashed
//! bag-of-words embedder that works offline.

use ollama_rs::Ollama;
use ollama_rs::generation::embeddings::request::GenerateEmbeddingsRequest;
use std::fmt::Display;
use std::future::Future;
use switchyard_core::{Error, Result, SemanticConfig};

/// A single embedding vector
pub type Embedding = Vec<f32>;

/// Trait for generating embeddings from text
pub trait EmbeddingProvider: Send + Sync {
    /// Short backend name used in logs.
    fn name(&self) -> &'static str;

    /// Whether [`EmbeddingProvider::ensure_model_available`] has to reach a
    /// remote service; such providers cannot be initialized synchronously.
    fn requires_async_warmup(&self) -> bool;

    /// Ensure the embedding model is available
    ///
    /// # Errors
    /// Returns an error if the model is not available or cannot be loaded
    fn ensure_model_available(&self) -> impl Future<Output = Result<()>> + Send;

    /// Generate embedding for text
    ///
    /// # Errors
    /// Returns an error if embedding generation fails
    fn embed(&self, text: &str) -> impl Future<Output = Result<Embedding>> + Send;

    /// Embed multiple texts in one request
    ///
    /// # Errors
    /// Returns an error if any embedding generation fails
    fn embed_batch(
        &self,
        texts: Vec<String>,
    ) -> impl Future<Output = Result<Vec<Embedding>>> + Send;
}

/// Ollama embedding client
pub struct OllamaEmbeddingClient {
    ollama: Ollama,
    model: String,
}

impl OllamaEmbeddingClient {
    /// Client for the Ollama server at `host:port`.
    #[must_use]
    #[expect(
        deprecated,
        reason = "ollama-rs 0.3.6 deprecates Ollama::new in favor of a builder"
    )]
    pub fn new(host: String, port: u16, model: String) -> Self {
        Self {
            ollama: Ollama::new(host, port),
            model,
        }
    }

    /// Client for the host, port and model in `config`.
    #[must_use]
    pub fn from_config(config: &SemanticConfig) -> Self {
        Self::new(
            config.ollama_host.clone(),
            config.ollama_port,
            config.embedding_model.clone(),
        )
    }

    fn map_error(&self, error: &impl Display) -> Error {
        let message = error.to_string();
        if message.contains("model") && message.contains("not found") {
            Error::Provider(format!(
                "Embedding model '{}' not found. Run: ollama pull {}",
                self.model, self.model
            ))
        } else {
            Error::Provider(format!("Embedding generation failed: {message}"))
        }
    }
}

impl Default for OllamaEmbeddingClient {
    fn default() -> Self {
        Self::from_config(&SemanticConfig::default())
    }
}

impl EmbeddingProvider for OllamaEmbeddingClient {
    fn name(&self) -> &'static str {
        "ollama"
    }

    fn requires_async_warmup(&self) -> bool {
        true
    }

    async fn ensure_model_available(&self) -> Result<()> {
        let models = self.ollama.list_local_models().await.map_err(|error| {
            Error::Provider(format!(
                "Failed to connect to Ollama: {error}. Ensure Ollama is running (`ollama serve`)"
            ))
        })?;

        if models.iter().any(|model| model.name.contains(&self.model)) {
            tracing::debug!("Embedding model '{}' available", self.model);
            Ok(())
        } else {
            Err(Error::Provider(format!(
                "Embedding model '{}' not found. Run: ollama pull {}",
                self.model, self.model
            )))
        }
    }

    async fn embed(&self, text: &str) -> Result<Embedding> {
        let request = GenerateEmbeddingsRequest::new(self.model.clone(), text.to_owned().into());

        let response = self
            .ollama
            .generate_embeddings(request)
            .await
            .map_err(|error| self.map_error(&error))?;

        response
            .embeddings
            .into_iter()
            .next()
            .ok_or_else(|| Error::InvalidResponse("No embeddings returned".to_owned()))
    }

    async fn embed_batch(&self, texts: Vec<String>) -> Result<Vec<Embedding>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let expected = texts.len();
        let request = GenerateEmbeddingsRequest::new(self.model.clone(), texts.into());

        let response = self
            .ollama
            .generate_embeddings(request)
            .await
            .map_err(|error| self.map_error(&error))?;

        if response.embeddings.len() != expected {
            return Err(Error::InvalidResponse(format!(
                "Expected {expected} embeddings, got {}",
                response.embeddings.len()
            )));
        }
        Ok(response.embeddings)
    }
}

/// Default dimensionality of [`LexicalEmbedder`] vectors.
const LEXICAL_DIMENSIONS: usize = 256;

/// Deterministic hashed bag-of-words embedder.
///
/// Texts sharing words land close together, which is enough to exercise the
/// semantic stage without a model server.
#[derive(Debug, Clone)]
pub struct LexicalEmbedder {
    dimensions: usize,
}

impl LexicalEmbedder {
    /// Embedder producing `dimensions`-wide vectors.
    #[must_use]
    pub fn new(dimensions: usize) -> Self {
        Self {
            dimensions: dimensions.max(1),
        }
    }

    /// FNV-1a, stable across processes and platforms.
    fn bucket(&self, token: &str) -> usize {
        let mut hash: u64 = 0xcbf2_9ce4_8422_2325;
        for byte in token.bytes() {
            hash ^= u64::from(byte);
            hash = hash.wrapping_mul(0x0100_0000_01b3);
        }
        (hash % self.dimensions as u64) as usize
    }

    /// Embeds text synchronously.
    #[must_use]
    pub fn embed_text(&self, text: &str) -> Embedding {
        let mut vector = vec![0.0_f32; self.dimensions];
        let lowered = text.to_lowercase();
        for token in lowered
            .split(|ch: char| !(ch.is_alphanumeric() || ch == '\''))
            .filter(|token| !token.is_empty())
        {
            vector[self.bucket(token)] += 1.0;
        }

        let norm = vector.iter().map(|value| value * value).sum::<f32>().sqrt();
        if norm > 0.0 {
            for value in &mut vector {
                *value /= norm;
            }
        }
        vector
    }
}

impl Default for LexicalEmbedder {
    fn default() -> Self {
        Self::new(LEXICAL_DIMENSIONS)
    }
}

impl EmbeddingProvider for LexicalEmbedder {
    fn name(&self) -> &'static str {
        "lexical"
    }

    fn requires_async_warmup(&self) -> bool {
        false
    }

    async fn ensure_model_available(&self) -> Result<()> {
        Ok(())
    }

    async fn embed(&self, text: &str) -> Result<Embedding> {
        Ok(self.embed_text(text))
    }

    async fn embed_batch(&self, texts: Vec<String>) -> Result<Vec<Embedding>> {
        Ok(texts.iter().map(|text| self.embed_text(text)).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cosine_similarity;

    #[test]
    fn test_lexical_embedding_is_deterministic() {
        let embedder = LexicalEmbedder::default();
        assert_eq!(
            embedder.embed_text("How can I track my order?"),
            embedder.embed_text("how can i TRACK my order")
        );
    }

    #[test]
    fn test_lexical_embedding_is_normalized() {
        let embedder = LexicalEmbedder::new(64);
        let vector = embedder.embed_text("puma running shoes");
        assert_eq!(vector.len(), 64);
        let norm = vector.iter().map(|value| value * value).sum::<f32>().sqrt();
        assert!((norm - 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_lexical_empty_text_is_zero_vector() {
        let embedder = LexicalEmbedder::new(8);
        assert!(embedder.embed_text("?!").iter().all(|value| value.abs() < f32::EPSILON));
    }

    #[test]
    fn test_shared_words_are_closer() {
        let embedder = LexicalEmbedder::default();
        let base = embedder.embed_text("what payment methods are accepted");
        let near = embedder.embed_text("which payment methods do you accept");
        let far = embedder.embed_text("puma running shoes in size 9");
        assert!(cosine_similarity(&base, &near) > cosine_similarity(&base, &far));
    }

    #[tokio::test]
    async fn test_lexical_batch_matches_single() -> Result<()> {
        let embedder = LexicalEmbedder::default();
        let batch = embedder
            .embed_batch(vec!["refund".to_owned(), "nike".to_owned()])
            .await?;
        assert_eq!(batch.len(), 2);
        assert_eq!(batch[1], embedder.embed("nike").await?);
        Ok(())
    }

    #[test]
    fn test_ollama_client_defaults() {
        let client = OllamaEmbeddingClient::default();
        assert_eq!(client.model, "all-minilm");
        assert!(client.requires_async_warmup());
    }
}
