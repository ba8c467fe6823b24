//! Embedding-similarity classifier over category utterances.

use async_trait::async_trait;
use std::sync::Arc;
use switchyard_core::{
    Category, CategoryId, ClassifierError, ClassifierResult, Query, SemanticClassifier,
    SemanticConfig,
};
use tokio::sync::{OnceCell, RwLock};

use crate::{EmbeddingProvider, StoredEntry, VectorStore};

/// Index key of one utterance; re-registering the same utterance hits the
/// same key.
fn utterance_key(category: &CategoryId, utterance: &str) -> String {
    format!("{category}::{utterance}")
}

/// Classifies a query by comparing its embedding with every registered
/// utterance.
///
/// The `top_k` nearest utterances vote for their categories with their
/// similarity scores; the category with the highest total wins, provided
/// its single best utterance reaches `score_threshold`.
pub struct EmbeddingClassifier<E> {
    embedder: E,
    ready: OnceCell<()>,
    index: RwLock<VectorStore>,
    score_threshold: f32,
    top_k: usize,
}

impl<E: EmbeddingProvider> EmbeddingClassifier<E> {
    /// Classifier with the default threshold and vote size.
    #[must_use]
    pub fn new(embedder: E) -> Self {
        let defaults = SemanticConfig::default();
        Self {
            embedder,
            ready: OnceCell::new(),
            index: RwLock::new(VectorStore::default()),
            score_threshold: defaults.score_threshold,
            top_k: defaults.top_k,
        }
    }

    /// Classifier using the threshold and vote size from `config`.
    #[must_use]
    pub fn from_config(embedder: E, config: &SemanticConfig) -> Self {
        Self::new(embedder)
            .with_score_threshold(config.score_threshold)
            .with_top_k(config.top_k)
    }

    /// Minimum best-utterance similarity for the winning category.
    #[must_use]
    pub fn with_score_threshold(mut self, score_threshold: f32) -> Self {
        self.score_threshold = score_threshold;
        self
    }

    /// Number of nearest utterances that vote; at least one.
    #[must_use]
    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = top_k.max(1);
        self
    }

    /// Whether the embedding backend has been checked.
    pub fn is_initialized(&self) -> bool {
        self.ready.initialized()
    }

    /// Number of indexed utterances.
    pub async fn len(&self) -> usize {
        self.index.read().await.len()
    }

    /// Whether no utterances are indexed.
    pub async fn is_empty(&self) -> bool {
        self.index.read().await.is_empty()
    }

    fn ensure_ready(&self) -> ClassifierResult<()> {
        if self.is_initialized() {
            Ok(())
        } else {
            Err(ClassifierError::NotInitialized)
        }
    }
}

#[async_trait]
impl<E: EmbeddingProvider + 'static> SemanticClassifier for EmbeddingClassifier<E> {
    fn name(&self) -> &'static str {
        self.embedder.name()
    }

    fn initialize(&self) -> ClassifierResult<()> {
        if self.embedder.requires_async_warmup() {
            return Err(ClassifierError::SyncInitUnsupported(self.embedder.name()));
        }
        // Already set means already initialized, which is fine.
        if self.ready.set(()).is_ok() {
            tracing::debug!("Initialized {} classifier index", self.embedder.name());
        }
        Ok(())
    }

    async fn initialize_async(&self) -> ClassifierResult<()> {
        self.ready
            .get_or_try_init(|| async {
                self.embedder
                    .ensure_model_available()
                    .await
                    .map_err(|error| ClassifierError::Backend(error.to_string()))?;
                tracing::debug!("Initialized {} classifier index", self.embedder.name());
                Ok::<(), ClassifierError>(())
            })
            .await?;
        Ok(())
    }

    async fn register(&self, categories: &[Arc<Category>]) -> ClassifierResult<()> {
        self.ensure_ready()?;

        let missing: Vec<(String, &CategoryId, &String)> = {
            let index = self.index.read().await;
            categories
                .iter()
                .flat_map(|category| {
                    category
                        .utterances
                        .iter()
                        .map(move |utterance| (category, utterance))
                })
                .map(|(category, utterance)| {
                    (utterance_key(&category.id, utterance), &category.id, utterance)
                })
                .filter(|(key, _, _)| !index.contains(key))
                .collect()
        };

        if missing.is_empty() {
            tracing::debug!("All utterances already registered");
            return Ok(());
        }

        let embeddings = self
            .embedder
            .embed_batch(missing.iter().map(|(_, _, text)| (*text).clone()).collect())
            .await
            .map_err(|error| ClassifierError::Backend(error.to_string()))?;

        if embeddings.len() != missing.len() {
            return Err(ClassifierError::Backend(format!(
                "Expected {} embeddings, got {}",
                missing.len(),
                embeddings.len()
            )));
        }

        let mut index = self.index.write().await;
        for ((key, id, text), embedding) in missing.into_iter().zip(embeddings) {
            index.upsert(
                key,
                StoredEntry {
                    label: id.to_string(),
                    text: text.clone(),
                    embedding,
                },
            );
        }
        tracing::debug!("Classifier index holds {} utterances", index.len());
        Ok(())
    }

    async fn classify(&self, query: &Query) -> ClassifierResult<Option<CategoryId>> {
        self.ensure_ready()?;
        if self.index.read().await.is_empty() {
            return Err(ClassifierError::NotInitialized);
        }

        let embedding = self
            .embedder
            .embed(query.text())
            .await
            .map_err(|error| ClassifierError::Backend(error.to_string()))?;

        let hits = self.index.read().await.search(&embedding, self.top_k);

        // (label, total score, best single score), in first-hit order
        let mut totals: Vec<(String, f32, f32)> = Vec::new();
        for hit in hits {
            match totals.iter_mut().find(|(label, _, _)| *label == hit.label) {
                Some((_, total, best)) => {
                    *total += hit.score;
                    *best = best.max(hit.score);
                }
                None => totals.push((hit.label, hit.score, hit.score)),
            }
        }

        let mut winner: Option<(String, f32, f32)> = None;
        for candidate in totals {
            if winner.as_ref().is_none_or(|current| candidate.1 > current.1) {
                winner = Some(candidate);
            }
        }

        Ok(winner.and_then(|(label, total, best)| {
            tracing::debug!(
                "Semantic candidate `{label}` total={total:.3} best={best:.3} threshold={:.3}",
                self.score_threshold
            );
            (best >= self.score_threshold).then(|| CategoryId::new(label))
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::LexicalEmbedder;
    use anyhow::Result;
    use switchyard_core::Catalog;

    async fn seeded() -> Result<EmbeddingClassifier<LexicalEmbedder>> {
        let classifier = EmbeddingClassifier::new(LexicalEmbedder::default());
        classifier.initialize()?;
        let catalog = Catalog::builtin()?;
        classifier.register(catalog.categories()).await?;
        Ok(classifier)
    }

    #[tokio::test]
    async fn test_classify_before_initialize_fails() {
        let classifier = EmbeddingClassifier::new(LexicalEmbedder::default());
        let result = classifier.classify(&Query::new("track my order")).await;
        assert_eq!(result, Err(ClassifierError::NotInitialized));
    }

    #[tokio::test]
    async fn test_register_before_initialize_fails() -> Result<()> {
        let classifier = EmbeddingClassifier::new(LexicalEmbedder::default());
        let catalog = Catalog::builtin()?;
        let result = classifier.register(catalog.categories()).await;
        assert_eq!(result, Err(ClassifierError::NotInitialized));
        Ok(())
    }

    #[tokio::test]
    async fn test_classify_empty_index_fails() {
        let classifier = EmbeddingClassifier::new(LexicalEmbedder::default());
        assert_eq!(classifier.initialize(), Ok(()));
        let result = classifier.classify(&Query::new("track my order")).await;
        assert_eq!(result, Err(ClassifierError::NotInitialized));
    }

    #[tokio::test]
    async fn test_lexical_supports_sync_and_async_init() {
        let classifier = EmbeddingClassifier::new(LexicalEmbedder::default());
        assert_eq!(classifier.initialize(), Ok(()));
        assert_eq!(classifier.initialize(), Ok(()));
        assert_eq!(classifier.initialize_async().await, Ok(()));
        assert!(classifier.is_initialized());
    }

    #[tokio::test]
    async fn test_classify_close_utterance() -> Result<()> {
        let classifier = seeded().await?;
        let tracking = classifier
            .classify(&Query::new("How can I track my order?"))
            .await;
        assert_eq!(tracking, Ok(Some(CategoryId::from("faq"))));

        let shoes = classifier
            .classify(&Query::new("Do you have formal shoes in size 9?"))
            .await;
        assert_eq!(shoes, Ok(Some(CategoryId::from("sql"))));
        Ok(())
    }

    #[tokio::test]
    async fn test_below_threshold_is_none() -> Result<()> {
        let classifier = seeded().await?;
        let result = classifier
            .classify(&Query::new("asdjklqwe random text"))
            .await;
        assert_eq!(result, Ok(None));
        Ok(())
    }

    #[tokio::test]
    async fn test_register_is_idempotent() -> Result<()> {
        let classifier = seeded().await?;
        let catalog = Catalog::builtin()?;
        let before = classifier.len().await;
        let query = Query::new("What payment options do you support?");
        let first = classifier.classify(&query).await;

        for _ in 0..3 {
            classifier.register(catalog.categories()).await?;
        }

        assert_eq!(classifier.len().await, before);
        assert_eq!(before, 13);
        assert_eq!(classifier.classify(&query).await, first);
        Ok(())
    }
}
