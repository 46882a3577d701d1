//! CLI command definitions and handlers

mod init;
mod modules;
mod scan;
mod watch;

use crate::config::{AdvisorConfig, UserConfig};
use crate::parsers::supported_language;
use crate::session::TextDocument;
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};

/// advisor-lens - package health badges for npm dependencies
#[derive(Parser, Debug)]
#[command(name = "advisor-lens")]
#[command(
    version,
    about = "Annotate npm dependencies with their advisor health score",
    after_help = "\
Examples:
  advisor-lens modules src/index.ts           List the packages a file references
  advisor-lens scan package.json              Score a manifest and show low scores
  advisor-lens scan package.json -f json      JSON output for scripting
  advisor-lens watch package.json             Re-score on every save
  advisor-lens init                           Write an example user config"
)]
pub struct Cli {
    /// Log level (error, warn, info, debug, trace)
    #[arg(long, global = true, default_value = "warn", value_parser = ["error", "warn", "info", "debug", "trace"])]
    pub log_level: String,

    /// Scores API base URL (overrides SNYK_API and the user config)
    #[arg(long, global = true)]
    pub api_url: Option<String>,

    /// API token (overrides SNYK_TOKEN and the user config)
    #[arg(long, global = true)]
    pub token: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List the npm packages a document references (no network)
    Modules {
        /// Document to read
        file: PathBuf,

        /// Editor language id (typescript, javascript, html, json); defaults to the file extension
        #[arg(long)]
        language: Option<String>,

        /// Output format: text, json
        #[arg(long, short = 'f', default_value = "text", value_parser = ["text", "json"])]
        format: String,
    },

    /// Score a document's packages and show the lines that would be badged
    Scan {
        /// Document to score
        file: PathBuf,

        /// Editor language id; defaults to the file extension
        #[arg(long)]
        language: Option<String>,

        /// Output format: text, json
        #[arg(long, short = 'f', default_value = "text", value_parser = ["text", "json"])]
        format: String,
    },

    /// Keep a package.json scored while it is edited
    Watch {
        /// Manifest to follow
        file: PathBuf,

        /// Editor language id; defaults to the file extension
        #[arg(long)]
        language: Option<String>,
    },

    /// Create ~/.config/advisor-lens/config.toml with example settings
    Init,
}

/// Run the CLI with parsed arguments
pub fn run(cli: Cli) -> Result<()> {
    let overrides = Overrides {
        api_url: cli.api_url,
        token: cli.token,
    };

    match cli.command {
        Commands::Modules {
            file,
            language,
            format,
        } => modules::run(&file, language.as_deref(), &format),
        Commands::Scan {
            file,
            language,
            format,
        } => scan::run(&file, language.as_deref(), &format, &overrides),
        Commands::Watch { file, language } => watch::run(&file, language.as_deref(), &overrides),
        Commands::Init => init::run(),
    }
}

/// Settings given on the command line; they beat env vars and the config file
#[derive(Debug, Clone, Default)]
pub(crate) struct Overrides {
    pub api_url: Option<String>,
    pub token: Option<String>,
}

impl Overrides {
    fn apply(&self, config: &mut UserConfig) {
        if let Some(url) = &self.api_url {
            config.advisor.base_api_url = Some(url.clone());
        }
        if let Some(token) = &self.token {
            config.advisor.token = Some(token.clone());
        }
    }
}

/// User config + env + command-line overrides
pub(crate) fn load_config(overrides: &Overrides) -> Result<AdvisorConfig> {
    let mut config = UserConfig::load()?;
    overrides.apply(&mut config);
    if !config.has_token() {
        tracing::warn!(
            "No API token configured; set {} or run `advisor-lens init`",
            crate::config::TOKEN_ENV
        );
    }
    Ok(config.resolve())
}

/// Read a document from disk the way an editor would present it
pub(crate) fn load_document(path: &Path, language: Option<&str>) -> Result<TextDocument> {
    let text = std::fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))?;
    let file_name = path.to_string_lossy().to_string();
    Ok(TextDocument::new(file_name, language.unwrap_or_default(), text))
}

/// Bail out early for documents no parser understands
pub(crate) fn require_supported(document: &TextDocument) -> Result<crate::models::Language> {
    supported_language(&document.file_name, &document.language_id).with_context(|| {
        format!(
            "Unsupported document: {} (expected a package.json, script or HTML file)",
            document.file_name
        )
    })
}
