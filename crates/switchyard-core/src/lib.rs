//! Core types and traits for the switchyard intent router.
//!
//! This crate provides the category/keyword/synonym data model, error handling,
//! configuration, and the trait definitions for the external collaborators
//! (semantic classifier and text completion service).

/// Built-in storefront catalog.
pub mod builtin;
/// Configuration loading and persistence.
pub mod config;
/// Error types and result definitions.
pub mod error;
/// Synchronization helpers.
pub mod sync;
/// Trait definitions for external collaborators.
pub mod traits;
/// Core data types for queries, categories, and synonyms.
pub mod types;

pub use config::{AnswerConfig, ApiKeys, EmbeddingBackend, FuzzyConfig, SemanticConfig, SwitchyardConfig};
pub use error::{ClassifierError, ClassifierResult, Error, Result};
pub use sync::IgnoreLock;
pub use traits::{CompletionProvider, SemanticClassifier};
pub use types::{
    Catalog, Category, CategoryId, Completion, CompletionRequest, Query, SynonymGroup,
    SynonymScope, SynonymTable, TokenUsage,
};
