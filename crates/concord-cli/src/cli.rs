//! CLI command definitions and argument parsing.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Concord - Relationship feature pipeline for couple questionnaires.
#[derive(Debug, Parser)]
#[command(name = "concord")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Output format
    #[arg(short, long, value_enum, global = true)]
    pub format: Option<CliFormat>,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Configuration file path
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// SQLite database path
    #[arg(long, global = true, env = "CONCORD_DB")]
    pub db: Option<PathBuf>,

    /// Classifier service endpoint
    #[arg(long, global = true, env = "CONCORD_ENDPOINT")]
    pub endpoint: Option<String>,

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
}

/// CLI commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Classify one couple and store the verdict
    Analyze(AnalyzeArgs),

    /// Classify many couples
    Batch(BatchArgs),

    /// Print the feature vector of one couple without classifying
    Features(FeaturesArgs),

    /// Load couple records from a JSON file
    Import(ImportArgs),

    /// Probe the classifier and show stored verdicts
    Status(StatusArgs),

    /// Show or initialize configuration
    Config(ConfigArgs),
}

/// Arguments for the analyze command.
#[derive(Debug, Parser)]
pub struct AnalyzeArgs {
    /// Access id of the couple
    pub access_id: String,
}

/// Arguments for the batch command.
#[derive(Debug, Parser)]
pub struct BatchArgs {
    /// Access ids to classify
    pub ids: Vec<String>,

    /// Read access ids from file (one per line)
    #[arg(short = 'F', long)]
    pub file: Option<PathBuf>,

    /// Classify every couple in the database
    #[arg(long, conflicts_with = "pending")]
    pub all: bool,

    /// Classify couples without a stored verdict
    #[arg(long)]
    pub pending: bool,

    /// Keep classifying pending couples until Ctrl+C
    #[arg(short, long, conflicts_with_all = ["all", "file"])]
    pub watch: bool,

    /// Couples classified at once (overrides config)
    #[arg(short = 'j', long)]
    pub concurrency: Option<usize>,
}

/// Arguments for the features command.
#[derive(Debug, Parser)]
pub struct FeaturesArgs {
    /// Access id of the couple
    pub access_id: String,

    /// Print the full classifier request instead of the vector
    #[arg(long)]
    pub request: bool,
}

/// Arguments for the import command.
#[derive(Debug, Parser)]
pub struct ImportArgs {
    /// JSON file holding an array of couple records
    pub file: PathBuf,
}

/// Arguments for the status command.
#[derive(Debug, Parser)]
pub struct StatusArgs {
    /// Show the stored verdict for this couple
    pub access_id: Option<String>,
}

/// Arguments for configuration management.
#[derive(Debug, Parser)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub action: ConfigAction,
}

/// Configuration actions.
#[derive(Debug, Subcommand)]
pub enum ConfigAction {
    /// Print the effective configuration
    Show,

    /// Print the configuration file path
    Path,

    /// Write the default configuration file
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

impl From<CliFormat> for crate::config::OutputFormat {
    fn from(format: CliFormat) -> Self {
        match format {
            CliFormat::Table => crate::config::OutputFormat::Table,
            CliFormat::Json => crate::config::OutputFormat::Json,
        }
    }
}
