//! Command handlers for CLI operations

use anyhow::{Context as _, Result, bail};
use std::io::Write;
use std::path::Path;
use std::sync::Arc;
use switchyard_core::builtin::FAQ;
use switchyard_core::{Catalog, EmbeddingBackend, SemanticClassifier, SwitchyardConfig};
use switchyard_providers::{FaqPipeline, GroqProvider};
use switchyard_routing::{IntentRouter, RouteOutcome};
use switchyard_semantic::{
    EmbeddingClassifier, EmbeddingProvider, FaqEntry, FaqStore, LexicalEmbedder,
    OllamaEmbeddingClient,
};

use crate::cli::{Cli, Commands};

/// Reply for queries no stage could place.
const CLARIFICATION: &str =
    "Sorry, I couldn't tell what you're asking. Could you rephrase your question?";

/// Placeholder printed instead of secrets.
const REDACTED: &str = "<redacted>";

/// Dispatch a parsed command line.
///
/// # Errors
/// Returns an error if configuration, router setup, or the command fails
pub async fn run(cli: Cli, out: &mut impl Write) -> Result<()> {
    let config = load_config(&cli)?;

    match cli.command {
        Commands::Route { query } => handle_route(&config, &query, out).await,
        Commands::Ask { query, faq } => {
            let mut config = config;
            if faq.is_some() {
                config.answer.faq_path = faq;
            }
            handle_ask(&config, &query, out).await
        }
        Commands::Catalog => handle_catalog(&config, out),
        Commands::Config { full } => handle_config(&config, full, out),
    }
}

/// Load configuration and apply command-line overrides.
///
/// # Errors
/// Returns an error if the config file cannot be read or parsed
pub fn load_config(cli: &Cli) -> Result<SwitchyardConfig> {
    let mut config = match &cli.config {
        Some(path) => SwitchyardConfig::load_from_file(path)?,
        None => SwitchyardConfig::load_or_create().unwrap_or_else(|error| {
            tracing::warn!("Failed to load config from ~/.switchyard/config.toml: {error}");
            tracing::warn!("Using default configuration");
            SwitchyardConfig::default()
        }),
    };

    if let Some(catalog) = &cli.catalog {
        config.catalog_path = Some(catalog.clone());
    }
    if cli.offline {
        config.semantic.backend = EmbeddingBackend::Lexical;
    }
    if cli.no_semantic {
        config.semantic.enabled = false;
    }
    Ok(config)
}

/// Build a ready router from configuration.
///
/// # Errors
/// Returns an error if the catalog is invalid or the semantic classifier
/// cannot be set up
pub async fn build_router(config: &SwitchyardConfig) -> Result<IntentRouter> {
    let catalog = config.load_catalog()?;
    let mut builder =
        IntentRouter::builder(catalog).with_synonym_scope(config.fuzzy.synonym_scope);

    if config.semantic.enabled {
        let classifier: Arc<dyn SemanticClassifier> = match config.semantic.backend {
            EmbeddingBackend::Ollama => Arc::new(EmbeddingClassifier::from_config(
                OllamaEmbeddingClient::from_config(&config.semantic),
                &config.semantic,
            )),
            EmbeddingBackend::Lexical => Arc::new(EmbeddingClassifier::from_config(
                LexicalEmbedder::default(),
                &config.semantic,
            )),
        };
        builder = builder.with_classifier(classifier);
    }

    builder
        .build()
        .await
        .context("Failed to set up the intent router (try --offline or --no-semantic)")
}

fn describe(outcome: &RouteOutcome) -> String {
    match outcome {
        RouteOutcome::Resolved { category, stage } => {
            format!("{} (via {stage} stage)", category.id)
        }
        RouteOutcome::Unresolved => "unresolved".to_owned(),
    }
}

/// Print the routing decision for a query.
///
/// # Errors
/// Returns an error if the router cannot be built or output fails
pub async fn handle_route(config: &SwitchyardConfig, query: &str, out: &mut impl Write) -> Result<()> {
    let router = build_router(config).await?;
    let outcome = router.route_text(query).await;
    writeln!(out, "{}", describe(&outcome))?;
    Ok(())
}

/// Route a query; answer FAQ questions, report other categories for the
/// caller to dispatch, and ask for clarification otherwise.
///
/// # Errors
/// Returns an error if routing setup, FAQ loading, or answering fails
pub async fn handle_ask(config: &SwitchyardConfig, query: &str, out: &mut impl Write) -> Result<()> {
    let router = build_router(config).await?;
    let outcome = router.route_text(query).await;

    match outcome.category_id() {
        Some(id) if id.as_str() == FAQ => {
            let answer = match config.semantic.backend {
                EmbeddingBackend::Ollama => {
                    answer_faq(OllamaEmbeddingClient::from_config(&config.semantic), config, query)
                        .await?
                }
                EmbeddingBackend::Lexical => {
                    answer_faq(LexicalEmbedder::default(), config, query).await?
                }
            };
            writeln!(out, "{answer}")?;
        }
        Some(id) => {
            writeln!(
                out,
                "Routed to `{id}`; this category is handled by its own service."
            )?;
        }
        None => writeln!(out, "{CLARIFICATION}")?,
    }
    Ok(())
}

async fn answer_faq<E: EmbeddingProvider>(
    embedder: E,
    config: &SwitchyardConfig,
    query: &str,
) -> Result<String> {
    let Some(faq_path) = &config.answer.faq_path else {
        bail!("No FAQ file configured (set answer.faq_path or pass --faq)");
    };
    let entries = load_faq(faq_path)?;

    embedder.ensure_model_available().await?;
    let store = FaqStore::new(embedder);
    store.ingest(&entries).await?;

    let provider = GroqProvider::from_config(config)?;
    let pipeline = FaqPipeline::new(store, Arc::new(provider))
        .with_n_results(config.answer.n_results);
    Ok(pipeline.answer(query).await?.text)
}

fn load_faq(path: &Path) -> Result<Vec<FaqEntry>> {
    let entries = FaqEntry::load(path)
        .with_context(|| format!("Failed to load FAQ file {}", path.display()))?;
    if entries.is_empty() {
        bail!("FAQ file {} has no entries", path.display());
    }
    Ok(entries)
}

/// List categories and synonym groups.
///
/// # Errors
/// Returns an error if the catalog is invalid or output fails
pub fn handle_catalog(config: &SwitchyardConfig, out: &mut impl Write) -> Result<()> {
    let catalog: Catalog = config.load_catalog()?;

    for category in catalog.categories() {
        writeln!(
            out,
            "{}: {} utterances, keywords [{}]",
            category.id,
            category.utterances.len(),
            category.keywords.join(", ")
        )?;
    }
    for group in catalog.synonyms().groups() {
        writeln!(out, "synonym {}: {}", group.term, group.phrases.join(", "))?;
    }
    Ok(())
}

/// Output current configuration. If `full` is true, prints full TOML with
/// API keys redacted.
///
/// # Errors
/// Returns an error if serialization or output fails
pub fn handle_config(config: &SwitchyardConfig, full: bool, out: &mut impl Write) -> Result<()> {
    if full {
        let mut shown = config.clone();
        if shown.api_keys.groq_api_key.is_some() {
            shown.api_keys.groq_api_key = Some(REDACTED.to_owned());
        }
        writeln!(out, "{}", toml::to_string_pretty(&shown)?)?;
        return Ok(());
    }

    let semantic = &config.semantic;
    writeln!(out, "Configuration:")?;
    writeln!(
        out,
        "  Catalog: {}",
        config
            .catalog_path
            .as_ref()
            .map_or_else(|| "built-in".to_owned(), |path| path.display().to_string())
    )?;
    writeln!(
        out,
        "  Semantic stage: {}",
        if semantic.enabled { "enabled" } else { "disabled" }
    )?;
    writeln!(out, "  Embedding backend: {:?}", semantic.backend)?;
    writeln!(out, "  Embedding model: {}", semantic.embedding_model)?;
    writeln!(out, "  Score threshold: {}", semantic.score_threshold)?;
    writeln!(out, "  Synonym scope: {:?}", config.fuzzy.synonym_scope)?;
    writeln!(
        out,
        "  Groq API Key: {}",
        if config.get_api_key("groq").is_some() { "Set" } else { "Not set" }
    )?;
    Ok(())
}

#[cfg(test)]
#[allow(
    clippy::assertions_on_result_states,
    reason = "Tests only care that these calls fail"
)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn offline() -> SwitchyardConfig {
        let mut config = SwitchyardConfig::default();
        config.semantic.backend = EmbeddingBackend::Lexical;
        config
    }

    fn output(buffer: Vec<u8>) -> String {
        String::from_utf8_lossy(&buffer).into_owned()
    }

    #[test]
    fn test_load_config_applies_overrides() -> Result<()> {
        let temp = TempDir::new()?;
        let path = temp.path().join("config.toml");
        SwitchyardConfig::default().save_to_file(&path)?;

        let cli = Cli {
            config: Some(path),
            catalog: Some(temp.path().join("catalog.toml")),
            offline: true,
            no_semantic: true,
            command: Commands::Catalog,
        };
        let config = load_config(&cli)?;
        assert_eq!(config.semantic.backend, EmbeddingBackend::Lexical);
        assert!(!config.semantic.enabled);
        assert_eq!(config.catalog_path, Some(temp.path().join("catalog.toml")));
        Ok(())
    }

    #[tokio::test]
    async fn test_route_offline() -> Result<()> {
        let mut buffer = Vec::new();
        handle_route(&offline(), "Where can I get a refund?", &mut buffer).await?;
        assert_eq!(output(buffer).trim(), "faq (via exact-keyword stage)");
        Ok(())
    }

    #[tokio::test]
    async fn test_ask_unresolved_requests_clarification() -> Result<()> {
        let mut config = offline();
        config.semantic.enabled = false;
        let mut buffer = Vec::new();
        handle_ask(&config, "asdjklqwe random text", &mut buffer).await?;
        assert_eq!(output(buffer).trim(), CLARIFICATION);
        Ok(())
    }

    #[tokio::test]
    async fn test_ask_reports_non_faq_category() -> Result<()> {
        let mut buffer = Vec::new();
        handle_ask(&offline(), "Show me puma shoes on sale", &mut buffer).await?;
        assert!(output(buffer).starts_with("Routed to `sql`"));
        Ok(())
    }

    #[tokio::test]
    async fn test_ask_faq_without_faq_file_fails() {
        let mut buffer = Vec::new();
        let result = handle_ask(&offline(), "What is your refund policy?", &mut buffer).await;
        assert!(result.is_err());
    }

    #[test]
    fn test_catalog_lists_categories() -> Result<()> {
        let mut buffer = Vec::new();
        handle_catalog(&SwitchyardConfig::default(), &mut buffer)?;
        let text = output(buffer);
        assert!(text.contains("faq: 7 utterances"));
        assert!(text.contains("synonym refund:"));
        Ok(())
    }

    #[test]
    fn test_catalog_file_override() -> Result<()> {
        let temp = TempDir::new()?;
        let path = temp.path().join("catalog.toml");
        fs::write(
            &path,
            r#"
[[categories]]
id = "billing"
utterances = ["Why was I charged twice?"]
keywords = ["invoice", "charge"]
"#,
        )?;
        let mut config = SwitchyardConfig::default();
        config.catalog_path = Some(path);

        let mut buffer = Vec::new();
        handle_catalog(&config, &mut buffer)?;
        assert!(output(buffer).starts_with("billing: 1 utterances, keywords [invoice, charge]"));
        Ok(())
    }

    #[test]
    fn test_config_summary_and_full() -> Result<()> {
        let mut summary_buffer = Vec::new();
        handle_config(&offline(), false, &mut summary_buffer)?;
        let summary = output(summary_buffer);
        assert!(summary.contains("Catalog: built-in"));
        assert!(summary.contains("Embedding backend: Lexical"));

        let mut full_buffer = Vec::new();
        handle_config(&offline(), true, &mut full_buffer)?;
        assert!(output(full_buffer).contains("backend = \"lexical\""));
        Ok(())
    }

    #[test]
    fn test_config_full_redacts_api_key() -> Result<()> {
        let mut config = offline();
        config.api_keys.groq_api_key = Some("gsk_live_secret".to_owned());

        let mut buffer = Vec::new();
        handle_config(&config, true, &mut buffer)?;
        let text = output(buffer);
        assert!(!text.contains("gsk_live_secret"));
        assert!(text.contains(&format!("groq_api_key = \"{REDACTED}\"")));
        assert_eq!(config.api_keys.groq_api_key.as_deref(), Some("gsk_live_secret"));
        Ok(())
    }

    #[test]
    fn test_load_faq_picks_format_by_extension() -> Result<()> {
        let temp = TempDir::new()?;
        let csv_path = temp.path().join("faqs.csv");
        fs::write(
            &csv_path,
            "question,answer\n\"Do you accept cash?\",\"Yes, cash on delivery is available.\"\n",
        )?;
        let toml_path = temp.path().join("faqs.toml");
        fs::write(
            &toml_path,
            "[[faq]]\nquestion = \"Do you ship abroad?\"\nanswer = \"No.\"\n",
        )?;

        let from_csv = load_faq(&csv_path)?;
        assert_eq!(from_csv.len(), 1);
        assert_eq!(from_csv[0].answer, "Yes, cash on delivery is available.");

        let from_toml = load_faq(&toml_path)?;
        assert_eq!(from_toml[0].question, "Do you ship abroad?");

        let empty = temp.path().join("empty.csv");
        fs::write(&empty, "question,answer\n")?;
        assert!(load_faq(&empty).is_err());
        Ok(())
    }
}
