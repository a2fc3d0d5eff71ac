//! CLI command definitions and argument parsing.

use crate::config::OutputFormat;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// GraphGen CLI - Build knowledge graphs from text with an LLM.
#[derive(Debug, Parser)]
#[command(name = "graphgen")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Output format
    #[arg(short, long, value_enum, global = true)]
    pub format: Option<CliFormat>,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Configuration file path (defaults to ~/.graphgen/config.toml)
    #[arg(short, long, global = true, env = "GRAPHGEN_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

/// Output format options.
#[derive(Debug, Clone, Copy, clap::ValueEnum)]
pub enum CliFormat {
    /// Table format (default)
    Table,
    /// JSON format
    Json,
    /// Quiet format (counts only)
    Quiet,
}

impl From<CliFormat> for OutputFormat {
    fn from(format: CliFormat) -> Self {
        match format {
            CliFormat::Table => OutputFormat::Table,
            CliFormat::Json => OutputFormat::Json,
            CliFormat::Quiet => OutputFormat::Quiet,
        }
    }
}

/// CLI commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Extract a knowledge graph from a JSONL file of chunks
    Extract(ExtractArgs),

    /// Show the nodes and edges of a graph database
    Show(ShowArgs),

    /// Manage the configuration file
    Config(ConfigArgs),
}

/// Arguments for the extract command.
#[derive(Debug, Parser)]
pub struct ExtractArgs {
    /// JSONL file with one {"id", "content"} object per line ("-" for stdin)
    pub input: PathBuf,

    /// Graph database to write into
    #[arg(short, long)]
    pub db: Option<PathBuf>,

    /// Ollama model name
    #[arg(short, long, env = "GRAPHGEN_MODEL")]
    pub model: Option<String>,

    /// Ollama endpoint URL
    #[arg(short, long, env = "GRAPHGEN_ENDPOINT")]
    pub endpoint: Option<String>,

    /// Maximum glean rounds per chunk
    #[arg(long)]
    pub max_loop: Option<usize>,

    /// Maximum chunks extracted concurrently
    #[arg(long)]
    pub concurrency: Option<usize>,

    /// Disable LLM summarisation of long descriptions
    #[arg(long)]
    pub no_summary: bool,

    /// Extraction preset
    #[arg(long, value_enum)]
    pub preset: Option<PresetArg>,
}

/// Extraction presets.
#[derive(Debug, Clone, Copy, clap::ValueEnum)]
pub enum PresetArg {
    /// Fewer glean rounds, more parallelism
    Aggressive,
    /// Balanced defaults
    Default,
    /// More glean rounds, longer timeouts
    Lenient,
}

/// Arguments for the show command.
#[derive(Debug, Parser)]
pub struct ShowArgs {
    /// Graph database to read
    #[arg(short, long)]
    pub db: Option<PathBuf>,

    /// Show only nodes
    #[arg(long, conflicts_with = "edges")]
    pub nodes: bool,

    /// Show only edges
    #[arg(long)]
    pub edges: bool,

    /// Maximum rows per table
    #[arg(short, long, default_value = "50")]
    pub limit: usize,
}

/// Arguments for the config command.
#[derive(Debug, Parser)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub action: ConfigAction,
}

/// Config subcommands.
#[derive(Debug, Subcommand)]
pub enum ConfigAction {
    /// Print the effective configuration
    Show,

    /// Write a default configuration file
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },

    /// Print the configuration file path
    Path,
}
