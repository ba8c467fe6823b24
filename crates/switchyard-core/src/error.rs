use core::result::Result as CoreResult;
use std::io::Error as IoError;

use csv::Error as CsvError;
use reqwest::Error as ReqwestError;
use serde_json::Error as SerdeJsonError;
use thiserror::Error;
use toml::de::Error as TomlError;

/// Result type for core operations.
pub type Result<T> = CoreResult<T, Error>;

/// Result type for semantic classifier operations.
pub type ClassifierResult<T> = CoreResult<T, ClassifierError>;

/// Errors that can occur in the core library.
#[derive(Debug, Error)]
pub enum Error {
    /// An I/O operation failed.
    #[error("IO error: {0}")]
    Io(#[from] IoError),

    /// An HTTP request failed.
    #[error("HTTP request failed: {0}")]
    Request(#[from] ReqwestError),

    /// JSON serialization or deserialization failed.
    #[error("JSON serialization error: {0}")]
    Json(#[from] SerdeJsonError),

    /// TOML deserialization failed.
    #[error("TOML deserialization error: {0}")]
    Toml(#[from] TomlError),

    /// CSV reading or record decoding failed.
    #[error("CSV error: {0}")]
    Csv(#[from] CsvError),

    /// Configuration is invalid or missing. Fatal at startup.
    #[error("Configuration error: {0}")]
    Config(String),

    /// A completion provider encountered an error.
    #[error("Provider error: {0}")]
    Provider(String),

    /// Required API key was not found.
    #[error("API key not found: {0}")]
    MissingApiKey(String),

    /// Completion provider returned an invalid response.
    #[error("Invalid response from provider: {0}")]
    InvalidResponse(String),

    /// A general error not covered by other variants.
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Determines whether this error may succeed if retried.
    ///
    /// Returns `true` for transient errors like network failures or provider errors.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Request(_) | Self::Provider(_))
    }
}

/// Failures raised by a semantic classifier backend.
///
/// The router never surfaces these to its callers; they are absorbed into
/// "no match" by the fail-soft adapter.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClassifierError {
    /// The index has not been initialized or holds no entries.
    #[error("Classifier index not initialized")]
    NotInitialized,

    /// The backend can only be initialized through the async path.
    #[error("Synchronous initialization not supported by {0}")]
    SyncInitUnsupported(&'static str),

    /// The backend call failed.
    #[error("Classifier backend error: {0}")]
    Backend(String),
}
