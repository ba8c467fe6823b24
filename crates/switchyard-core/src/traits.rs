use async_trait::async_trait;
use std::sync::Arc;

use crate::{
    Category, CategoryId, ClassifierResult, Completion, CompletionRequest, Query, Result,
};

/// Embedding-similarity classifier consulted by the router's middle stage.
///
/// Implementations own their index. The router initializes and seeds it once
/// before routing starts; after that only [`SemanticClassifier::classify`] is
/// called, possibly from many tasks at once.
#[async_trait]
pub trait SemanticClassifier: Send + Sync {
    /// Returns the unique identifier for this classifier backend.
    fn name(&self) -> &'static str;

    /// Initializes the index synchronously.
    ///
    /// # Errors
    ///
    /// Returns [`crate::ClassifierError::SyncInitUnsupported`] when the
    /// backend can only be initialized through
    /// [`SemanticClassifier::initialize_async`], or another error if
    /// initialization fails.
    fn initialize(&self) -> ClassifierResult<()>;

    /// Initializes the index through the asynchronous path. Idempotent.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot be reached or prepared.
    async fn initialize_async(&self) -> ClassifierResult<()>;

    /// Upserts the utterances of every category into the index.
    ///
    /// Registering the same categories again must not duplicate entries.
    ///
    /// # Errors
    ///
    /// Returns an error if the index is not initialized or embedding fails.
    async fn register(&self, categories: &[Arc<Category>]) -> ClassifierResult<()>;

    /// Returns the best-matching category, or `None` below the backend's
    /// confidence threshold.
    ///
    /// # Errors
    ///
    /// Returns an error if the index is not ready or the backend call fails.
    async fn classify(&self, query: &Query) -> ClassifierResult<Option<CategoryId>>;
}

/// Hosted language model producing free-text completions.
#[async_trait]
pub trait CompletionProvider: Send + Sync {
    /// Returns the unique identifier for this provider.
    fn name(&self) -> &'static str;

    /// Checks whether this provider is configured and ready to process requests.
    async fn is_available(&self) -> bool;

    /// Generates a completion for the given prompt.
    ///
    /// # Errors
    ///
    /// Returns an error if the provider is unavailable, the request fails,
    /// or the response cannot be parsed.
    async fn complete(&self, request: &CompletionRequest) -> Result<Completion>;
}
