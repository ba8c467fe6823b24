//! Configuration types for the router, semantic stage, and answer pipeline.

use crate::{Catalog, Error, Result, SynonymScope};
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

/// Env var consulted when no Groq key is configured.
const ENV_GROQ_API_KEY: &str = "GROQ_API_KEY";
/// Env var consulted when no Groq model is configured.
const ENV_GROQ_MODEL: &str = "GROQ_MODEL";

/// Complete switchyard configuration.
#[derive(Default, Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SwitchyardConfig {
    /// Catalog file; the built-in catalog is used when absent
    pub catalog_path: Option<PathBuf>,
    /// Semantic classifier configuration
    pub semantic: SemanticConfig,
    /// Fuzzy stage configuration
    pub fuzzy: FuzzyConfig,
    /// FAQ answering configuration
    pub answer: AnswerConfig,
    /// API keys for completion providers
    pub api_keys: ApiKeys,
}

/// API keys for completion providers.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ApiKeys {
    /// Groq API key
    pub groq_api_key: Option<String>,
}

/// Embedding backend behind the semantic classifier.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmbeddingBackend {
    /// Ollama embedding model
    #[default]
    Ollama,
    /// Offline hashed bag-of-words vectors
    Lexical,
}

/// Semantic classifier configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SemanticConfig {
    /// Whether the semantic stage takes part in the cascade
    pub enabled: bool,
    /// Embedding backend
    pub backend: EmbeddingBackend,
    /// Ollama host URL
    pub ollama_host: String,
    /// Ollama port
    pub ollama_port: u16,
    /// Embedding model name
    pub embedding_model: String,
    /// Minimum cosine similarity of the best utterance (0.0-1.0)
    pub score_threshold: f32,
    /// Number of nearest utterances considered per query
    pub top_k: usize,
}

impl Default for SemanticConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            backend: EmbeddingBackend::Ollama,
            ollama_host: "http://localhost".to_owned(),
            ollama_port: 11434,
            embedding_model: "all-minilm".to_owned(),
            score_threshold: 0.5,
            top_k: 5,
        }
    }
}

/// Fuzzy stage configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FuzzyConfig {
    /// Which synonym groups count towards a keyword miss
    pub synonym_scope: SynonymScope,
}

/// FAQ answering configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AnswerConfig {
    /// Groq model; `GROQ_MODEL` is used when unset
    pub groq_model: Option<String>,
    /// FAQ knowledge base: `.csv` with a `question,answer` header, otherwise TOML `[[faq]]` entries
    pub faq_path: Option<PathBuf>,
    /// Number of FAQ answers retrieved as context
    pub n_results: usize,
    /// Sampling temperature
    pub temperature: f32,
    /// Maximum completion tokens
    pub max_tokens: usize,
}

impl Default for AnswerConfig {
    fn default() -> Self {
        Self {
            groq_model: None,
            faq_path: None,
            n_results: 2,
            temperature: 0.2,
            max_tokens: 1024,
        }
    }
}

impl SwitchyardConfig {
    /// Get the default config directory path (`~/.switchyard`)
    ///
    /// # Errors
    /// Returns an error if the home directory cannot be determined
    pub fn config_dir() -> Result<PathBuf> {
        let home = dirs::home_dir()
            .ok_or_else(|| Error::Config("Could not determine home directory".to_owned()))?;
        Ok(home.join(".switchyard"))
    }

    /// Get the default config file path (`~/.switchyard/config.toml`)
    ///
    /// # Errors
    /// Returns an error if the home directory cannot be determined
    pub fn config_path() -> Result<PathBuf> {
        Ok(Self::config_dir()?.join("config.toml"))
    }

    /// Load config from the default location, creating it with default
    /// values when missing.
    ///
    /// # Errors
    /// Returns an error if the config cannot be read or created
    pub fn load_or_create() -> Result<Self> {
        let config_path = Self::config_path()?;

        if config_path.exists() {
            Self::load_from_file(&config_path)
        } else {
            let config = Self::default();
            config.save_to_file(&config_path)?;
            Ok(config)
        }
    }

    /// Load config from a specific file
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or parsed
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .map_err(|error| Error::Config(format!("Failed to read config: {error}")))?;
        let config: Self = toml::from_str(&contents)
            .map_err(|error| Error::Config(format!("Failed to parse config: {error}")))?;

        tracing::debug!(
            "Loaded config from {}: semantic={}, synonym_scope={:?}, groq_api_key={}",
            path.display(),
            config.semantic.enabled,
            config.fuzzy.synonym_scope,
            if config.api_keys.groq_api_key.is_some() {
                "present"
            } else {
                "missing"
            }
        );

        Ok(config)
    }

    /// Save config to a specific file
    ///
    /// # Errors
    /// Returns an error if the file cannot be written
    pub fn save_to_file(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|error| {
                Error::Config(format!("Failed to create config directory: {error}"))
            })?;
        }

        let contents = toml::to_string_pretty(self)
            .map_err(|error| Error::Config(format!("Failed to serialize config: {error}")))?;

        let header = "# Switchyard Configuration File\n\
                      # This file is automatically generated on first run\n\
                      # Edit this file to customize your settings\n\n";

        fs::write(path, format!("{header}{contents}"))
            .map_err(|error| Error::Config(format!("Failed to write config: {error}")))?;

        Ok(())
    }

    /// Load the configured catalog, or the built-in one.
    ///
    /// # Errors
    /// Returns an error if the catalog file cannot be loaded or is invalid
    pub fn load_catalog(&self) -> Result<Catalog> {
        match &self.catalog_path {
            Some(path) => Catalog::load_from_file(path),
            None => Catalog::builtin(),
        }
    }

    /// Get API key for a provider, checking config first, then environment variables
    pub fn get_api_key(&self, provider: &str) -> Option<String> {
        match provider {
            "groq" => self
                .api_keys
                .groq_api_key
                .clone()
                .or_else(|| env::var(ENV_GROQ_API_KEY).ok()),
            _ => None,
        }
    }

    /// Groq model for FAQ answers, checking config first, then `GROQ_MODEL`
    pub fn groq_model(&self) -> Option<String> {
        self.answer
            .groq_model
            .clone()
            .or_else(|| env::var(ENV_GROQ_MODEL).ok())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result as AnyResult;
    use std::io::Write as _;
    use tempfile::{NamedTempFile, TempDir};

    #[test]
    fn test_default_config() {
        let config = SwitchyardConfig::default();
        assert!(config.semantic.enabled);
        assert_eq!(config.semantic.backend, EmbeddingBackend::Ollama);
        assert_eq!(config.semantic.top_k, 5);
        assert_eq!(config.fuzzy.synonym_scope, SynonymScope::Global);
        assert_eq!(config.answer.n_results, 2);
        assert!(config.catalog_path.is_none());
    }

    #[test]
    fn test_partial_toml_uses_defaults() -> AnyResult<()> {
        let mut file = NamedTempFile::new()?;
        write!(
            file,
            r#"
[semantic]
backend = "lexical"
score_threshold = 0.3

[fuzzy]
synonym_scope = "keyword_bound"

[api_keys]
groq_api_key = "test_groq_key_123"
"#
        )?;

        let config = SwitchyardConfig::load_from_file(file.path())?;
        assert_eq!(config.semantic.backend, EmbeddingBackend::Lexical);
        assert!((config.semantic.score_threshold - 0.3).abs() < f32::EPSILON);
        assert_eq!(config.semantic.top_k, 5);
        assert_eq!(config.fuzzy.synonym_scope, SynonymScope::KeywordBound);
        assert_eq!(
            config.get_api_key("groq").as_deref(),
            Some("test_groq_key_123")
        );
        assert!(config.get_api_key("unknown").is_none());
        Ok(())
    }

    #[test]
    fn test_save_and_reload() -> AnyResult<()> {
        let dir = TempDir::new()?;
        let path = dir.path().join("nested").join("config.toml");

        let mut config = SwitchyardConfig::default();
        config.semantic.enabled = false;
        config.answer.n_results = 4;
        config.save_to_file(&path)?;

        let contents = fs::read_to_string(&path)?;
        assert!(contents.starts_with("# Switchyard Configuration File"));

        let reloaded = SwitchyardConfig::load_from_file(&path)?;
        assert!(!reloaded.semantic.enabled);
        assert_eq!(reloaded.answer.n_results, 4);
        Ok(())
    }

    #[test]
    fn test_invalid_toml_is_config_error() -> AnyResult<()> {
        let mut file = NamedTempFile::new()?;
        write!(file, "semantic = [not toml")?;
        let result = SwitchyardConfig::load_from_file(file.path());
        assert!(matches!(result, Err(Error::Config(_))));
        Ok(())
    }

    #[test]
    fn test_load_catalog_defaults_to_builtin() -> AnyResult<()> {
        let catalog = SwitchyardConfig::default().load_catalog()?;
        assert!(catalog.get("faq").is_some());
        assert!(catalog.get("sql").is_some());
        Ok(())
    }
}
