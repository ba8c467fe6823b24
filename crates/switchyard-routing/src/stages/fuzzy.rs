use async_trait::async_trait;
use std::sync::Arc;
use switchyard_core::{Catalog, Category, Query, SynonymScope};

use super::{MatchStage, StageKind};
use crate::{FuzzyMatcher, Result};

/// Last-resort stage scoring whole-word keywords and synonyms.
pub struct FuzzyKeywordStage {
    matcher: FuzzyMatcher,
}

impl FuzzyKeywordStage {
    /// Compiles the patterns for `catalog`.
    ///
    /// # Errors
    /// Returns an error if a keyword or synonym pattern fails to compile.
    pub fn new(catalog: &Catalog, scope: SynonymScope) -> Result<Self> {
        Ok(Self {
            matcher: FuzzyMatcher::new(catalog, scope)?,
        })
    }
}

#[async_trait]
impl MatchStage for FuzzyKeywordStage {
    fn kind(&self) -> StageKind {
        StageKind::FuzzyKeyword
    }

    async fn evaluate(&self, query: &Query) -> Option<Arc<Category>> {
        self.matcher.match_query(query).cloned()
    }
}
