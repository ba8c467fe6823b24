//! Cascade orchestration: exact keyword, then semantic, then fuzzy.

use std::sync::Arc;
use switchyard_core::{
    Catalog, Category, CategoryId, ClassifierError, Query, SemanticClassifier, SynonymScope,
};

use crate::stages::{ExactKeywordStage, FuzzyKeywordStage, MatchStage, SemanticStage, StageKind};
use crate::{FailSoftClassifier, Result, RoutingError};

/// Result of routing one query.
#[derive(Debug, Clone)]
pub enum RouteOutcome {
    /// A stage matched a catalog category.
    Resolved {
        /// The matched category.
        category: Arc<Category>,
        /// The stage that matched it.
        stage: StageKind,
    },
    /// No stage matched; the caller decides what to do (e.g. ask for
    /// clarification).
    Unresolved,
}

impl RouteOutcome {
    /// Whether a stage matched.
    #[must_use]
    pub fn is_resolved(&self) -> bool {
        matches!(self, Self::Resolved { .. })
    }

    /// The matched category, if any.
    #[must_use]
    pub fn category(&self) -> Option<&Arc<Category>> {
        match self {
            Self::Resolved { category, .. } => Some(category),
            Self::Unresolved => None,
        }
    }

    /// Id of the matched category, if any.
    #[must_use]
    pub fn category_id(&self) -> Option<&CategoryId> {
        self.category().map(|category| &category.id)
    }

    /// The stage that matched, if any.
    #[must_use]
    pub fn stage(&self) -> Option<StageKind> {
        match self {
            Self::Resolved { stage, .. } => Some(*stage),
            Self::Unresolved => None,
        }
    }
}

/// Routes queries through the stage cascade. Ready to use once built:
/// the semantic index, if any, is fully seeded before construction returns.
///
/// The router holds only read-only state, so one instance can be shared
/// across tasks behind an `Arc` and routed concurrently.
pub struct IntentRouter {
    catalog: Arc<Catalog>,
    stages: Vec<Box<dyn MatchStage>>,
}

impl IntentRouter {
    /// Starts building a router over `catalog`.
    #[must_use]
    pub fn builder(catalog: Catalog) -> RouterBuilder {
        RouterBuilder::new(catalog)
    }

    /// Tries each stage once, in order, returning the first match.
    pub async fn route(&self, query: &Query) -> RouteOutcome {
        for stage in &self.stages {
            if let Some(category) = stage.evaluate(query).await {
                tracing::debug!(
                    "Routed {:?} to `{}` via {} stage",
                    query.text(),
                    category.id,
                    stage.kind()
                );
                return RouteOutcome::Resolved {
                    category,
                    stage: stage.kind(),
                };
            }
        }

        tracing::info!("No category matched {:?}", query.text());
        RouteOutcome::Unresolved
    }

    /// Convenience wrapper around [`IntentRouter::route`].
    pub async fn route_text(&self, text: &str) -> RouteOutcome {
        self.route(&Query::new(text)).await
    }

    /// The catalog the stages were built from.
    #[must_use]
    pub fn catalog(&self) -> &Arc<Catalog> {
        &self.catalog
    }

    /// Stages in evaluation order.
    pub fn stages(&self) -> impl Iterator<Item = StageKind> + '_ {
        self.stages.iter().map(|stage| stage.kind())
    }
}

/// One-shot setup of an [`IntentRouter`].
pub struct RouterBuilder {
    catalog: Arc<Catalog>,
    classifier: Option<Arc<dyn SemanticClassifier>>,
    synonym_scope: SynonymScope,
}

impl RouterBuilder {
    /// Builder with no semantic stage and the default synonym scope.
    #[must_use]
    pub fn new(catalog: Catalog) -> Self {
        Self {
            catalog: Arc::new(catalog),
            classifier: None,
            synonym_scope: SynonymScope::default(),
        }
    }

    /// Adds the semantic stage backed by this classifier.
    #[must_use]
    pub fn with_classifier(mut self, classifier: Arc<dyn SemanticClassifier>) -> Self {
        self.classifier = Some(classifier);
        self
    }

    /// How the fuzzy stage credits synonym hits.
    #[must_use]
    pub fn with_synonym_scope(mut self, scope: SynonymScope) -> Self {
        self.synonym_scope = scope;
        self
    }

    /// Initializes and seeds the classifier, then assembles the cascade.
    ///
    /// # Errors
    /// Returns [`RoutingError::ClassifierSetup`] if the classifier cannot be
    /// initialized or seeded, or [`RoutingError::InvalidPattern`] if a
    /// keyword pattern fails to compile. Either way no router is produced.
    pub async fn build(self) -> Result<IntentRouter> {
        let mut stages: Vec<Box<dyn MatchStage>> =
            vec![Box::new(ExactKeywordStage::new(Arc::clone(&self.catalog)))];

        if let Some(classifier) = self.classifier {
            prepare_classifier(classifier.as_ref(), &self.catalog).await?;
            stages.push(Box::new(SemanticStage::new(FailSoftClassifier::new(
                classifier,
                Arc::clone(&self.catalog),
            ))));
        }

        stages.push(Box::new(FuzzyKeywordStage::new(
            &self.catalog,
            self.synonym_scope,
        )?));

        tracing::info!(
            "Intent router ready: {} categories, stages [{}]",
            self.catalog.len(),
            stages
                .iter()
                .map(|stage| stage.kind().to_string())
                .collect::<Vec<_>>()
                .join(" -> ")
        );

        Ok(IntentRouter {
            catalog: self.catalog,
            stages,
        })
    }
}

/// Initializes the classifier (sync path first, async when the backend
/// requires it) and registers every category.
async fn prepare_classifier(classifier: &dyn SemanticClassifier, catalog: &Catalog) -> Result<()> {
    match classifier.initialize() {
        Ok(()) => {}
        Err(ClassifierError::SyncInitUnsupported(backend)) => {
            tracing::debug!("{backend} requires async initialization");
            classifier
                .initialize_async()
                .await
                .map_err(RoutingError::ClassifierSetup)?;
        }
        Err(error) => return Err(RoutingError::ClassifierSetup(error)),
    }

    classifier
        .register(catalog.categories())
        .await
        .map_err(RoutingError::ClassifierSetup)?;

    tracing::debug!(
        "Registered {} categories with {}",
        catalog.len(),
        classifier.name()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use switchyard_providers::MockClassifier;

    fn builtin() -> Catalog {
        match Catalog::builtin() {
            Ok(catalog) => catalog,
            Err(error) => panic!("builtin catalog invalid: {error}"),
        }
    }

    #[tokio::test]
    async fn test_stage_order_with_classifier() -> Result<()> {
        let router = IntentRouter::builder(builtin())
            .with_classifier(Arc::new(MockClassifier::new()))
            .build()
            .await?;
        let stages: Vec<StageKind> = router.stages().collect();
        assert_eq!(
            stages,
            vec![StageKind::ExactKeyword, StageKind::Semantic, StageKind::FuzzyKeyword]
        );
        Ok(())
    }

    #[tokio::test]
    async fn test_stage_order_without_classifier() -> Result<()> {
        let router = IntentRouter::builder(builtin()).build().await?;
        let stages: Vec<StageKind> = router.stages().collect();
        assert_eq!(stages, vec![StageKind::ExactKeyword, StageKind::FuzzyKeyword]);
        Ok(())
    }

    #[tokio::test]
    async fn test_exact_stage_short_circuits() -> Result<()> {
        let classifier = Arc::new(MockClassifier::new().with_default(Some(CategoryId::from("sql"))));
        let router = IntentRouter::builder(builtin())
            .with_classifier(Arc::clone(&classifier) as Arc<dyn SemanticClassifier>)
            .build()
            .await?;

        let outcome = router.route_text("How do I get a refund?").await;
        assert_eq!(outcome.category_id().map(CategoryId::as_str), Some("faq"));
        assert_eq!(outcome.stage(), Some(StageKind::ExactKeyword));
        assert_eq!(classifier.classify_count(), 0);
        Ok(())
    }

    #[tokio::test]
    async fn test_semantic_stage_before_fuzzy() -> Result<()> {
        let classifier = Arc::new(MockClassifier::new().with_default(Some(CategoryId::from("sql"))));
        let router = IntentRouter::builder(builtin())
            .with_classifier(classifier)
            .build()
            .await?;

        // "where's" would let the fuzzy stage fire, but semantic answers first.
        let outcome = router.route_text("Where's my package?").await;
        assert_eq!(outcome.stage(), Some(StageKind::Semantic));
        assert_eq!(outcome.category_id().map(CategoryId::as_str), Some("sql"));
        Ok(())
    }

    #[tokio::test]
    async fn test_sync_init_preferred() -> Result<()> {
        let classifier = Arc::new(MockClassifier::new());
        IntentRouter::builder(builtin())
            .with_classifier(Arc::clone(&classifier) as Arc<dyn SemanticClassifier>)
            .build()
            .await?;
        assert_eq!(classifier.sync_init_count(), 1);
        assert_eq!(classifier.async_init_count(), 0);
        assert_eq!(classifier.register_count(), 1);
        Ok(())
    }

    #[tokio::test]
    async fn test_async_init_fallback() -> Result<()> {
        let classifier = Arc::new(MockClassifier::new().async_init_only());
        IntentRouter::builder(builtin())
            .with_classifier(Arc::clone(&classifier) as Arc<dyn SemanticClassifier>)
            .build()
            .await?;
        assert_eq!(classifier.sync_init_count(), 1);
        assert_eq!(classifier.async_init_count(), 1);
        assert_eq!(classifier.register_count(), 1);
        Ok(())
    }

    #[tokio::test]
    async fn test_setup_failure_is_fatal() {
        let classifier = Arc::new(
            MockClassifier::new().failing_init_with(ClassifierError::Backend("no index".to_owned())),
        );
        let result = IntentRouter::builder(builtin())
            .with_classifier(classifier)
            .build()
            .await;
        assert!(matches!(result, Err(RoutingError::ClassifierSetup(_))));
    }

    #[tokio::test]
    async fn test_unresolved_outcome_accessors() -> Result<()> {
        let router = IntentRouter::builder(builtin()).build().await?;
        let outcome = router.route_text("asdjklqwe random text").await;
        assert!(!outcome.is_resolved());
        assert!(outcome.category().is_none());
        assert!(outcome.stage().is_none());
        Ok(())
    }
}
