//! The three matching stages of the cascade.

/// Exact-keyword stage
pub mod exact;
/// Fuzzy keyword and synonym stage
pub mod fuzzy;
/// Semantic classifier stage
pub mod semantic;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter, Result as FmtResult};
use std::sync::Arc;
use switchyard_core::{Category, Query};

pub use exact::ExactKeywordStage;
pub use fuzzy::FuzzyKeywordStage;
pub use semantic::SemanticStage;

/// Which stage resolved a query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StageKind {
    /// Substring keyword counts.
    ExactKeyword,
    /// Embedding similarity.
    Semantic,
    /// Whole-word keywords plus synonyms.
    FuzzyKeyword,
}

impl Display for StageKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(match self {
            Self::ExactKeyword => "exact-keyword",
            Self::Semantic => "semantic",
            Self::FuzzyKeyword => "fuzzy-keyword",
        })
    }
}

/// One strategy of the cascade: a pure function of the query and the
/// static catalog.
#[async_trait]
pub trait MatchStage: Send + Sync {
    /// Which stage this is, reported in [`crate::RouteOutcome`].
    fn kind(&self) -> StageKind;

    /// Returns the matched category, or `None` to let the next stage try.
    async fn evaluate(&self, query: &Query) -> Option<Arc<Category>>;
}
