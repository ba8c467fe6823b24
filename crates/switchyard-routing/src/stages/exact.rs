use async_trait::async_trait;
use std::sync::Arc;
use switchyard_core::{Catalog, Category, Query};

use super::{MatchStage, StageKind};
use crate::KeywordIndex;

/// Routes on substring keyword hits.
pub struct ExactKeywordStage {
    index: KeywordIndex,
}

impl ExactKeywordStage {
    /// Stage over the keywords of `catalog`.
    #[must_use]
    pub fn new(catalog: Arc<Catalog>) -> Self {
        Self {
            index: KeywordIndex::new(catalog),
        }
    }
}

#[async_trait]
impl MatchStage for ExactKeywordStage {
    fn kind(&self) -> StageKind {
        StageKind::ExactKeyword
    }

    async fn evaluate(&self, query: &Query) -> Option<Arc<Category>> {
        self.index.match_query(query).cloned()
    }
}
