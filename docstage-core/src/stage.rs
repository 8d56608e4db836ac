//! One complete staging run: reset, scan, manifest, materialize.

use crate::error::{Result, StageError};
use crate::manifest::Manifest;
use crate::materialize::{Linker, MaterializeReport, Materializer, SymlinkLinker};
use crate::mode::RunMode;
use crate::scan::scan_documents;
use crate::sync::reset_dir;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone)]
pub struct StageOptions {
    pub source: PathBuf,
    pub target: PathBuf,
    pub mode: RunMode,
}

#[derive(Debug, Clone)]
pub struct StageReport {
    pub manifest_path: PathBuf,
    pub manifest: Manifest,
    pub materialized: MaterializeReport,
}

/// Run a full clean rebuild of the target directory.
pub fn stage(options: &StageOptions) -> Result<StageReport> {
    stage_with_linker(options, SymlinkLinker)
}

/// [`stage`] with a custom link implementation
pub fn stage_with_linker(
    options: &StageOptions,
    linker: impl Linker + 'static,
) -> Result<StageReport> {
    let StageOptions {
        source,
        target,
        mode,
    } = options;

    tracing::info!("Run mode: {}", mode.describe());

    guard_source(source, target)?;
    reset_dir(target)?;

    let files = scan_documents(source)?;

    let manifest = Manifest::new(files, *mode);
    let manifest_path = manifest.write_to(target)?;

    let materialized = Materializer::new(source, target, manifest.mode)
        .with_linker(linker)
        .materialize_all(&manifest.files)?;

    Ok(StageReport {
        manifest_path,
        manifest,
        materialized,
    })
}

/// Refuse a target that is, or contains, the source directory.
fn guard_source(source: &Path, target: &Path) -> Result<()> {
    // A source that does not exist cannot be destroyed; scanning reports it later
    let Ok(source_abs) = fs::canonicalize(source) else {
        return Ok(());
    };
    let target_abs = resolve_lenient(target)?;

    if source_abs.starts_with(&target_abs) {
        return Err(StageError::TargetContainsSource {
            target: target.to_path_buf(),
            source_dir: source.to_path_buf(),
        });
    }
    Ok(())
}

/// Canonicalize the deepest existing ancestor and re-append the missing tail.
fn resolve_lenient(path: &Path) -> Result<PathBuf> {
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .map_err(|source| StageError::Resolve {
                path: path.to_path_buf(),
                source,
            })?
            .join(path)
    };

    let mut missing = Vec::new();
    let mut cursor = absolute.as_path();
    loop {
        match fs::canonicalize(cursor) {
            Ok(mut resolved) => {
                for part in missing.iter().rev() {
                    resolved.push(part);
                }
                return Ok(resolved);
            }
            Err(source) => match (cursor.parent(), cursor.file_name()) {
                (Some(parent), Some(name)) => {
                    missing.push(name.to_os_string());
                    cursor = parent;
                }
                _ => {
                    return Err(StageError::Resolve {
                        path: path.to_path_buf(),
                        source,
                    })
                }
            },
        }
    }
}
