//! CLI argument definitions using clap derive

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::cli::commands::{
    action::ActionCommands,
    audit::AuditCommands,
    category::CategoryCommands,
    checklist::ChecklistCommands,
    completions::CompletionsArgs,
    finding::FindingCommands,
    import::ImportArgs,
    init::InitArgs,
};

#[derive(Parser)]
#[command(name = "sat")]
#[command(author, version, about = "Supplier Audit Toolkit")]
#[command(long_about = "A Unix-style toolkit for managing supplier quality audits as plain text files under git version control.")]
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
    #[arg(long, global = true)]
    pub quiet: bool,

    /// Enable verbose output
    #[arg(long, short = 'v', global = true)]
    pub verbose: bool,

    /// Project root (default: auto-detect by finding .sat/)
    #[arg(long, global = true)]
    pub project: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize a new SAT project
    Init(InitArgs),

    /// Question category management
    #[command(subcommand)]
    Category(CategoryCommands),

    /// Checklist template management
    #[command(subcommand)]
    Checklist(ChecklistCommands),

    /// Supplier audit management
    #[command(subcommand)]
    Audit(AuditCommands),

    /// Audit finding management
    #[command(subcommand)]
    Finding(FindingCommands),

    /// Corrective action management
    #[command(subcommand)]
    Action(ActionCommands),

    /// Import checklist questions from CSV
    Import(ImportArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum OutputFormat {
    /// Automatically detect based on context (yaml for show, tsv for list)
    #[default]
    Auto,
    /// YAML format (full fidelity)
    Yaml,
    /// Tab-separated values (for piping)
    Tsv,
    /// JSON format (for programming)
    Json,
    /// CSV format (for spreadsheets)
    Csv,
    /// Just IDs, one per line
    Id,
}
