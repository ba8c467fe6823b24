//! Command-line argument definitions.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Command-line arguments for the switchyard CLI
#[derive(Debug, Parser)]
#[command(name = "switchyard")]
#[command(about = "Route customer queries to FAQ answers or product search", long_about = None)]
pub struct Cli {
    /// Config file [default: ~/.switchyard/config.toml]
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Catalog TOML file (overrides config)
    #[arg(long, global = true)]
    pub catalog: Option<PathBuf>,

    /// Use the offline lexical embedder instead of Ollama
    #[arg(long, global = true)]
    pub offline: bool,

    /// Skip the semantic stage. With the built-in catalog, queries that only
    /// hit synonyms then fall to the fuzzy stage's default global scope, so
    /// "Where's my package?" routes to `sql`; set
    /// `fuzzy.synonym_scope = "keyword_bound"` to route it to `faq`
    #[arg(long, global = true)]
    pub no_semantic: bool,

    /// Command to run
    #[command(subcommand)]
    pub command: Commands,
}

/// Subcommands
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Show which category a query routes to, and through which stage
    Route {
        /// The customer query
        query: String,
    },

    /// Route a query and answer it when it is an FAQ question
    Ask {
        /// The customer query
        query: String,

        /// FAQ file, `.toml` with `[[faq]]` entries or `.csv` with
        /// `question,answer` columns (overrides config)
        #[arg(long)]
        faq: Option<PathBuf>,
    },

    /// List catalog categories and synonym groups
    Catalog,

    /// Show configuration
    Config {
        /// Show full configuration as TOML, with API keys redacted
        #[arg(long)]
        full: bool,
    },
}

#[cfg(test)]
#[allow(
    clippy::assertions_on_result_states,
    reason = "Tests only care that these calls fail"
)]
mod tests {
    use super::*;
    use clap::CommandFactory as _;

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from(["switchyard", "route", "Where's my package?", "--offline"]);
        let Ok(cli) = cli else {
            panic!("arguments should parse");
        };
        assert!(cli.offline);
        assert!(!cli.no_semantic);
        assert!(matches!(cli.command, Commands::Route { query } if query == "Where's my package?"));
    }

    #[test]
    fn test_missing_query_rejected() {
        assert!(Cli::try_parse_from(["switchyard", "ask"]).is_err());
    }

    #[test]
    fn test_no_semantic_help_warns_about_synonym_routing() {
        let mut command = Cli::command();
        let help = command.render_long_help().to_string();
        assert!(help.contains("--no-semantic"));
        assert!(help.contains("\"Where's my package?\" routes to `sql`"));
        assert!(help.contains("keyword_bound"));
    }

    #[test]
    fn test_faq_help_names_both_formats() {
        let mut command = Cli::command();
        let Some(ask) = command.find_subcommand_mut("ask") else {
            panic!("ask subcommand should exist");
        };
        let help = ask.render_long_help().to_string();
        assert!(help.contains(".toml"));
        assert!(help.contains(".csv"));
    }
}
