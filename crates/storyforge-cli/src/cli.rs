//! CLI command definitions and argument parsing.

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use storyforge_domain::RecordKind;

/// Storyforge CLI - Turn requirement documents into user stories and test cases.
#[derive(Debug, Parser)]
#[command(name = "storyforge")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Output format
    #[arg(short, long, value_enum, global = true)]
    pub format: Option<CliFormat>,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Configuration file path
    #[arg(short, long, global = true, env = "STORYFORGE_CONFIG")]
    pub config: Option<PathBuf>,

    /// Log per-chunk progress
    #[arg(short, long, global = true)]
    pub verbose: bool,

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
    /// Quiet format (record IDs only)
    Quiet,
}

/// CLI commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Extract records from a requirement document
    Extract(ExtractArgs),

    /// Generate test cases for a stored user story
    TestCases(TestCasesArgs),

    /// Manage the configuration file
    Config(ConfigArgs),
}

/// Arguments for the extract command.
#[derive(Debug, Parser)]
pub struct ExtractArgs {
    /// Plain-text requirement document
    #[arg(long, conflicts_with = "stdin")]
    pub file: Option<PathBuf>,

    /// Read the document from stdin
    #[arg(long)]
    pub stdin: bool,

    /// Kind of record to extract
    #[arg(short, long, value_enum, default_value = "story")]
    pub kind: KindArg,

    /// Project the records are filed under
    #[arg(short, long)]
    pub project: String,

    /// User the records are attributed to
    #[arg(short, long)]
    pub user: String,

    /// Source identifier (defaults to the file name)
    #[arg(long)]
    pub source_id: Option<String>,
}

/// Arguments for the test-cases command.
#[derive(Debug, Parser)]
pub struct TestCasesArgs {
    /// ID of the stored user story
    #[arg(short, long)]
    pub story: String,

    /// Project the test cases are filed under
    #[arg(short, long)]
    pub project: String,

    /// User the test cases are attributed to
    #[arg(short, long)]
    pub user: String,
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
    /// Write a default configuration file
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },

    /// Print the effective configuration
    Show,
}

/// Record kind argument.
#[derive(Debug, Clone, Copy, clap::ValueEnum)]
pub enum KindArg {
    /// User stories
    Story,
    /// Test cases
    TestCase,
}

impl From<CliFormat> for crate::config::OutputFormat {
    fn from(format: CliFormat) -> Self {
        match format {
            CliFormat::Table => crate::config::OutputFormat::Table,
            CliFormat::Json => crate::config::OutputFormat::Json,
            CliFormat::Quiet => crate::config::OutputFormat::Quiet,
        }
    }
}

impl From<KindArg> for RecordKind {
    fn from(kind: KindArg) -> Self {
        match kind {
            KindArg::Story => RecordKind::Story,
            KindArg::TestCase => RecordKind::TestCase,
        }
    }
}
