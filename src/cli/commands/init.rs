//! `tsi init` command - Initialize a new workspace

use console::style;
use miette::{IntoDiagnostic, Result};

use crate::core::{SqliteStore, Workspace, WorkspaceError};

#[derive(clap::Args, Debug)]
pub struct InitArgs {
    /// Directory to initialize (default: current directory)
    #[arg(default_value = ".")]
    pub path: std::path::PathBuf,

    /// Rewrite the configuration even if .tsi/ already exists; the store is kept
    #[arg(long)]
    pub force: bool,
}

pub fn run(args: InitArgs) -> Result<()> {
    let path = if args.path.as_os_str() == "." {
        std::env::current_dir().into_diagnostic()?
    } else {
        args.path.clone()
    };

    if !path.exists() {
        std::fs::create_dir_all(&path).into_diagnostic()?;
        println!(
            "{} Created directory {}",
            style("✓").green(),
            style(path.display()).cyan()
        );
    }

    let workspace = if args.force {
        Workspace::init_force(&path)
    } else {
        Workspace::init(&path)
    };

    match workspace {
        Ok(workspace) => {
            SqliteStore::open(&workspace.store_path())?;
            println!(
                "{} Initialized workspace at {}",
                style("✓").green(),
                style(workspace.root().display()).cyan()
            );
            println!();
            println!("Created:");
            println!("  {}", style(".tsi/config.yaml").dim());
            println!("  {}", style(".tsi/store.db").dim());
            println!();
            println!("Next steps:");
            println!(
                "  {} Write an example timesheet file",
                style("tsi import --template timesheet > timesheets.csv").yellow()
            );
            println!(
                "  {} Import it",
                style("tsi import timesheets.csv").yellow()
            );
            Ok(())
        }
        Err(WorkspaceError::AlreadyExists(path)) => {
            println!(
                "{} Workspace already exists at {}",
                style("!").yellow(),
                style(path.display()).cyan()
            );
            println!();
            println!("Use {} to reinitialize", style("tsi init --force").yellow());
            Ok(())
        }
        Err(e) => Err(e.into()),
    }
}
