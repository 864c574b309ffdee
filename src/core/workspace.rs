//! Workspace discovery and structure
//!
//! A workspace is a directory containing `.tsi/`, which holds the
//! configuration and the destination store.

use miette::Diagnostic;
use std::path::{Path, PathBuf};
use thiserror::Error;

const WORKSPACE_DIR: &str = ".tsi";
const CONFIG_FILE: &str = "config.yaml";
const STORE_FILE: &str = "store.db";

#[derive(Debug)]
pub struct Workspace {
    /// Directory containing `.tsi/`
    root: PathBuf,
}

impl Workspace {
    /// Find the workspace by walking up from the current directory
    pub fn discover() -> Result<Self, WorkspaceError> {
        let current =
            std::env::current_dir().map_err(|e| WorkspaceError::IoError(e.to_string()))?;
        Self::discover_from(&current)
    }

    /// Find the workspace by walking up from the given directory
    pub fn discover_from(start: &Path) -> Result<Self, WorkspaceError> {
        let mut current = start
            .canonicalize()
            .map_err(|e| WorkspaceError::IoError(e.to_string()))?;

        loop {
            if current.join(WORKSPACE_DIR).is_dir() {
                return Ok(Self { root: current });
            }

            if !current.pop() {
                return Err(WorkspaceError::NotFound {
                    searched_from: start.to_path_buf(),
                });
            }
        }
    }

    /// Create a new workspace at the given path
    pub fn init(path: &Path) -> Result<Self, WorkspaceError> {
        let root = path.canonicalize().unwrap_or_else(|_| path.to_path_buf());
        if root.join(WORKSPACE_DIR).exists() {
            return Err(WorkspaceError::AlreadyExists(root));
        }
        Self::create(root)
    }

    /// Initialize even if `.tsi/` already exists; an existing store is kept
    pub fn init_force(path: &Path) -> Result<Self, WorkspaceError> {
        let root = path.canonicalize().unwrap_or_else(|_| path.to_path_buf());
        Self::create(root)
    }

    fn create(root: PathBuf) -> Result<Self, WorkspaceError> {
        let dir = root.join(WORKSPACE_DIR);
        std::fs::create_dir_all(&dir).map_err(|e| WorkspaceError::IoError(e.to_string()))?;
        std::fs::write(dir.join(CONFIG_FILE), Self::default_config())
            .map_err(|e| WorkspaceError::IoError(e.to_string()))?;
        Ok(Self { root })
    }

    fn default_config() -> &'static str {
        r#"# Timesheet import configuration

# CSV delimiter (";" or ",")
# delimiter: ";"

# Timezone for dates without offset and for created customers/users
# timezone: UTC

# Defaults for created customers
# country: DE
# currency: EUR

# Maximum number of rows per import file
# max_rows: 1000

# Create activities without a project
# global_activities: true
"#
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn dir(&self) -> PathBuf {
        self.root.join(WORKSPACE_DIR)
    }

    pub fn config_path(&self) -> PathBuf {
        self.dir().join(CONFIG_FILE)
    }

    pub fn store_path(&self) -> PathBuf {
        self.dir().join(STORE_FILE)
    }
}

#[derive(Debug, Error, Diagnostic)]
pub enum WorkspaceError {
    #[error("Not in a tsi workspace (searched from {searched_from})")]
    #[diagnostic(code(tsi::workspace::not_found), help("Run 'tsi init' to create a workspace"))]
    NotFound { searched_from: PathBuf },

    #[error("Workspace already exists at {0}")]
    #[diagnostic(code(tsi::workspace::exists), help("Use --force to reinitialize"))]
    AlreadyExists(PathBuf),

    #[error("IO error: {0}")]
    #[diagnostic(code(tsi::workspace::io))]
    IoError(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_init_creates_structure() {
        let tmp = tempdir().unwrap();
        let workspace = Workspace::init(tmp.path()).unwrap();
        assert!(workspace.dir().is_dir());
        assert!(workspace.config_path().is_file());
        assert_eq!(workspace.store_path().file_name().unwrap(), "store.db");
    }

    #[test]
    fn test_init_twice_fails() {
        let tmp = tempdir().unwrap();
        Workspace::init(tmp.path()).unwrap();
        let result = Workspace::init(tmp.path());
        assert!(matches!(result, Err(WorkspaceError::AlreadyExists(_))));
        assert!(Workspace::init_force(tmp.path()).is_ok());
    }

    #[test]
    fn test_discover_from_subdirectory() {
        let tmp = tempdir().unwrap();
        Workspace::init(tmp.path()).unwrap();
        let nested = tmp.path().join("exports").join("2024");
        std::fs::create_dir_all(&nested).unwrap();

        let workspace = Workspace::discover_from(&nested).unwrap();
        assert_eq!(workspace.root(), tmp.path().canonicalize().unwrap());
    }

    #[test]
    fn test_discover_outside_workspace() {
        let tmp = tempdir().unwrap();
        let result = Workspace::discover_from(tmp.path());
        assert!(matches!(result, Err(WorkspaceError::NotFound { .. })));
    }
}
