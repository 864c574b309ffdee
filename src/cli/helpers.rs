//! Shared helper functions for CLI commands

use miette::Result;
use std::time::Duration;

use crate::cli::GlobalOpts;
use crate::core::{Config, SqliteStore, Workspace};

/// Workspace, its configuration and its store
pub struct Session {
    pub workspace: Workspace,
    pub config: Config,
    pub store: SqliteStore,
}

/// Find the workspace (`--workspace` or the nearest `.tsi/`) and open its store
pub fn open_session(global: &GlobalOpts) -> Result<Session> {
    let workspace = match &global.workspace {
        Some(path) => Workspace::discover_from(path)?,
        None => Workspace::discover()?,
    };
    let config = Config::load_for(Some(&workspace));
    let store = SqliteStore::open(&workspace.store_path())?;
    tracing::debug!(root = %workspace.root().display(), "opened workspace");
    Ok(Session {
        workspace,
        config,
        store,
    })
}

/// Truncate a string to `max_len` characters, adding "..." if truncated
pub fn truncate_str(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}

/// `1.25s`, `2m 5s`
pub fn format_runtime(runtime: Duration) -> String {
    let secs = runtime.as_secs();
    if secs >= 60 {
        format!("{}m {}s", secs / 60, secs % 60)
    } else {
        format!("{:.2}s", runtime.as_secs_f64())
    }
}
