//! CLI argument definitions using clap derive

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::cli::commands::{
    import::ImportArgs, init::InitArgs, legacy::LegacyArgs, status::StatusArgs,
};

#[derive(Parser)]
#[command(name = "tsi")]
#[command(author, version, about = "Timesheet importer")]
#[command(long_about = "Imports timesheets, customers and projects from CSV/JSON exports and complete legacy installations into a time-tracking store.")]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    #[command(flatten)]
    pub global: GlobalOpts,
}

#[derive(clap::Args, Clone, Debug)]
pub struct GlobalOpts {
    /// Suppress non-essential output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Enable verbose output (debug logging, every row in previews)
    #[arg(long, short = 'v', global = true)]
    pub verbose: bool,

    /// Workspace root (default: auto-detect by finding .tsi/)
    #[arg(long, global = true, env = "TSI_WORKSPACE")]
    pub workspace: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize a new workspace with configuration and store
    Init(InitArgs),

    /// Import a CSV or JSON file
    Import(ImportArgs),

    /// Import a complete legacy installation from its database
    Legacy(LegacyArgs),

    /// Show the number of records in the store
    Status(StatusArgs),
}
