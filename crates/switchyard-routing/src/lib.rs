//! Multi-stage intent routing.
//!
//! A query is matched against a fixed [`switchyard_core::Catalog`] by a
//! cascade of independent strategies, first success wins:
//!
//! 1. [`KeywordIndex`]: substring keyword counts
//! 2. [`FailSoftClassifier`]: embedding similarity, failures read as no match
//! 3. [`FuzzyMatcher`]: whole-word keywords plus synonyms
//!
//! When every stage declines the router reports
//! [`RouteOutcome::Unresolved`]; routing itself never errors.

/// Error types for router setup
pub mod error;
/// Fail-soft semantic classifier adapter
pub mod fail_soft;
/// Fuzzy keyword and synonym matching
pub mod fuzzy;
/// Exact keyword matching
pub mod keyword;
/// Cascade orchestration
pub mod router;
/// Stage trait and stage implementations
pub mod stages;

pub use error::{Result, RoutingError};
pub use fail_soft::FailSoftClassifier;
pub use fuzzy::FuzzyMatcher;
pub use keyword::KeywordIndex;
pub use router::{IntentRouter, RouteOutcome, RouterBuilder};
pub use stages::{ExactKeywordStage, FuzzyKeywordStage, MatchStage, SemanticStage, StageKind};
