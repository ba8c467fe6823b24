//! Fail-soft adapter around the semantic classifier.

use std::sync::Arc;
use switchyard_core::{Catalog, Category, Query, SemanticClassifier};

/// Wraps a [`SemanticClassifier`] so that every backend failure, and every
/// answer naming a category outside the catalog, reads as "no match".
#[derive(Clone)]
pub struct FailSoftClassifier {
    inner: Arc<dyn SemanticClassifier>,
    catalog: Arc<Catalog>,
}

impl FailSoftClassifier {
    /// Wraps `inner`, resolving its answers against `catalog`.
    #[must_use]
    pub fn new(inner: Arc<dyn SemanticClassifier>, catalog: Arc<Catalog>) -> Self {
        Self { inner, catalog }
    }

    /// Name of the wrapped backend.
    #[must_use]
    pub fn backend(&self) -> &'static str {
        self.inner.name()
    }

    /// Classifies the query, absorbing any failure.
    pub async fn classify(&self, query: &Query) -> Option<Arc<Category>> {
        match self.inner.classify(query).await {
            Ok(Some(id)) => {
                let category = self.catalog.get(id.as_str()).cloned();
                if category.is_none() {
                    tracing::warn!(
                        "Classifier {} returned unknown category `{id}`, treating as no match",
                        self.inner.name()
                    );
                }
                category
            }
            Ok(None) => None,
            Err(error) => {
                tracing::warn!(
                    "Classifier {} unavailable, falling through: {error}",
                    self.inner.name()
                );
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use switchyard_core::{CategoryId, ClassifierError, Result};
    use switchyard_providers::MockClassifier;

    fn catalog() -> Result<Arc<Catalog>> {
        Ok(Arc::new(Catalog::builtin()?))
    }

    #[tokio::test]
    async fn test_known_category_passes_through() -> Result<()> {
        let classifier = Arc::new(MockClassifier::new().with_default(Some(CategoryId::from("faq"))));
        let adapter = FailSoftClassifier::new(classifier, catalog()?);
        let category = adapter.classify(&Query::new("how do refunds work")).await;
        assert_eq!(category.map(|category| category.id.to_string()).as_deref(), Some("faq"));
        Ok(())
    }

    #[tokio::test]
    async fn test_backend_error_is_no_match() -> Result<()> {
        let classifier = Arc::new(
            MockClassifier::new().failing_with(ClassifierError::Backend("connection refused".to_owned())),
        );
        let adapter = FailSoftClassifier::new(Arc::clone(&classifier) as Arc<dyn SemanticClassifier>, catalog()?);
        assert!(adapter.classify(&Query::new("anything")).await.is_none());
        assert_eq!(classifier.classify_count(), 1);
        Ok(())
    }

    #[tokio::test]
    async fn test_not_initialized_is_no_match() -> Result<()> {
        let classifier = Arc::new(MockClassifier::new().failing_with(ClassifierError::NotInitialized));
        let adapter = FailSoftClassifier::new(classifier, catalog()?);
        assert!(adapter.classify(&Query::new("anything")).await.is_none());
        Ok(())
    }

    #[tokio::test]
    async fn test_unknown_category_is_no_match() -> Result<()> {
        let classifier = Arc::new(MockClassifier::new().with_default(Some(CategoryId::from("chitchat"))));
        let adapter = FailSoftClassifier::new(classifier, catalog()?);
        assert!(adapter.classify(&Query::new("hello there")).await.is_none());
        Ok(())
    }
}
