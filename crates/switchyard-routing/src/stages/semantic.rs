use async_trait::async_trait;
use std::sync::Arc;
use switchyard_core::{Category, Query};

use super::{MatchStage, StageKind};
use crate::FailSoftClassifier;

/// Embedding-similarity stage; never fails, see [`FailSoftClassifier`].
pub struct SemanticStage {
    classifier: FailSoftClassifier,
}

impl SemanticStage {
    /// Stage delegating to `classifier`.
    #[must_use]
    pub fn new(classifier: FailSoftClassifier) -> Self {
        Self { classifier }
    }
}

#[async_trait]
impl MatchStage for SemanticStage {
    fn kind(&self) -> StageKind {
        StageKind::Semantic
    }

    async fn evaluate(&self, query: &Query) -> Option<Arc<Category>> {
        self.classifier.classify(query).await
    }
}
