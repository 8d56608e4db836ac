//! Target directory reset.

use crate::error::{Result, StageError};
use std::fs;
use std::path::Path;

/// Remove `path` entirely (if present) and recreate it as an empty directory.
pub fn reset_dir(path: &Path) -> Result<()> {
    // symlink_metadata so a dangling link or stray file at the path is also cleared
    if let Ok(meta) = fs::symlink_metadata(path) {
        tracing::info!("Cleaning existing directory {:?}", path);
        let removed = if meta.is_dir() {
            fs::remove_dir_all(path)
        } else {
            fs::remove_file(path)
        };
        removed.map_err(|source| StageError::Clean {
            path: path.to_path_buf(),
            source,
        })?;
    }

    fs::create_dir_all(path).map_err(|source| StageError::CreateDir {
        path: path.to_path_buf(),
        source,
    })?;

    Ok(())
}
