//! CLI argument definitions using clap derive

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::cli::commands::{
    catalog::CatalogCommands, completions::CompletionsArgs, history::HistoryArgs,
    import::ImportArgs, init::InitArgs, issues::IssuesArgs,
};

#[derive(Parser)]
#[command(name = "trackport")]
#[command(author, version, about = "Bulk issue import for project trackers")]
#[command(long_about = "Bulk-create tracker issues from CSV files. Each row is validated against the project's members, trackers, statuses, priorities, versions and custom fields; valid rows are saved and every problem is reported by line.")]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    #[command(flatten)]
    pub global: GlobalOpts,
}

#[derive(clap::Args, Clone, Debug)]
pub struct GlobalOpts {
    /// Output format
    #[arg(long, short = 'f', global = true, default_value = "auto")]
    pub format: OutputFormat,

    /// Suppress non-essential output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Enable verbose output (debug logging on stderr)
    #[arg(long, short = 'v', global = true)]
    pub verbose: bool,

    /// Workspace root (default: auto-detect by finding .trackport/)
    #[arg(long, global = true)]
    pub workspace: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize a new Trackport workspace
    Init(InitArgs),

    /// Import issues from a CSV file
    Import(ImportArgs),

    /// Manage projects, users, trackers and other catalogs
    #[command(subcommand)]
    Catalog(CatalogCommands),

    /// List the issues of a project
    Issues(IssuesArgs),

    /// Show past imports of a project
    History(HistoryArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum OutputFormat {
    /// Human-readable text and tables
    #[default]
    Auto,
    /// JSON format (for programming)
    Json,
    /// Tab-separated values (for piping)
    Tsv,
    /// Markdown tables
    Md,
}
