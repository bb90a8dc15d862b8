//! Helpers shared by the commands.

use std::path::{Path, PathBuf};

use crate::error::{CliError, Result};

/// Project root from `--cwd`, or the current directory.
pub fn resolve_project_root(explicit_cwd: Option<&Path>) -> Result<PathBuf> {
    let current = std::env::current_dir()?;
    let root = match explicit_cwd {
        Some(path) if path.is_absolute() => path.to_path_buf(),
        Some(path) => current.join(path),
        None => current,
    };

    if !root.is_dir() {
        return Err(CliError::DirectoryNotFound(root));
    }
    // watcher events carry canonical paths
    Ok(std::fs::canonicalize(&root)?)
}
