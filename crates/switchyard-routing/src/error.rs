use regex::Error as RegexError;
use std::result::Result as StdResult;
use switchyard_core::{ClassifierError, Error as CoreError};
use thiserror::Error;

/// Result type for router setup.
pub type Result<T> = StdResult<T, RoutingError>;

/// Errors that keep a router from becoming ready.
///
/// Routing itself never fails: classifier failures during `route` are
/// absorbed and an exhausted cascade is reported as unresolved.
#[derive(Debug, Error)]
pub enum RoutingError {
    /// Catalog or configuration error from the core crate.
    #[error("Core error: {0}")]
    Core(#[from] CoreError),

    /// The semantic classifier could not be initialized or seeded.
    #[error("Semantic classifier setup failed: {0}")]
    ClassifierSetup(#[source] ClassifierError),

    /// A keyword or synonym did not compile into a pattern.
    #[error("Invalid keyword pattern: {0}")]
    InvalidPattern(#[from] RegexError),
}

impl RoutingError {
    /// Whether the failure comes from the catalog rather than a backend.
    #[must_use]
    pub fn is_configuration(&self) -> bool {
        matches!(self, Self::Core(CoreError::Config(_)) | Self::InvalidPattern(_))
    }
}
