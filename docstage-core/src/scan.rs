//! Markdown document discovery.

use crate::error::{Result, StageError};
use icu_collator::{Collator, CollatorOptions};
use serde::{Deserialize, Serialize};
use std::path::Path;
use walkdir::WalkDir;

const MARKDOWN_SUFFIX: &str = ".md";

/// A staged document: its filename and the display title derived from it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentEntry {
    pub name: String,
    pub title: String,
}

impl DocumentEntry {
    /// Build an entry for `name`, or `None` if it is not a Markdown filename.
    pub fn from_file_name(name: &str) -> Option<Self> {
        if !name.ends_with(MARKDOWN_SUFFIX) {
            return None;
        }
        Some(Self {
            name: name.to_string(),
            title: derive_title(name),
        })
    }
}

/// Strip a trailing `.md` and turn every underscore into a space.
///
/// ```
/// use docstage_core::derive_title;
///
/// assert_eq!(derive_title("Writing_Style.md"), "Writing Style");
/// assert_eq!(derive_title("api.md"), "api");
/// ```
pub fn derive_title(name: &str) -> String {
    name.strip_suffix(MARKDOWN_SUFFIX)
        .unwrap_or(name)
        .replace('_', " ")
}

/// Sort by filename, descending, using root-locale collation.
///
/// Punctuation sorts below digits and letters, and case only matters once the
/// letters agree, so `B.md`, `apple.md`, `A.md`, `_Intro.md` is descending.
/// Names that collate equal fall back to byte order, so no two entries tie.
pub fn sort_descending(entries: &mut [DocumentEntry]) -> Result<()> {
    let collator = Collator::try_new(&Default::default(), CollatorOptions::new())
        .map_err(|e| StageError::Collator(e.to_string()))?;
    entries.sort_by(|a, b| {
        collator
            .compare(&b.name, &a.name)
            .then_with(|| b.name.cmp(&a.name))
    });
    Ok(())
}

/// List the Markdown files directly inside `source`, sorted by filename descending.
///
/// Directories, symlinks and other files are skipped. The source is never modified.
pub fn scan_documents(source: &Path) -> Result<Vec<DocumentEntry>> {
    let scan_err = |source_err: std::io::Error| StageError::Scan {
        path: source.to_path_buf(),
        source: source_err,
    };

    let meta = std::fs::metadata(source).map_err(scan_err)?;
    if !meta.is_dir() {
        return Err(scan_err(std::io::Error::other("not a directory")));
    }

    let mut entries = Vec::new();
    for entry in WalkDir::new(source)
        .min_depth(1)
        .max_depth(1)
        .follow_links(false)
    {
        let entry = entry.map_err(|e| scan_err(e.into()))?;
        if !entry.file_type().is_file() {
            tracing::debug!("Skipping non-file entry {:?}", entry.path());
            continue;
        }

        let Some(name) = entry.file_name().to_str() else {
            tracing::debug!("Skipping non UTF-8 filename {:?}", entry.file_name());
            continue;
        };

        if let Some(doc) = DocumentEntry::from_file_name(name) {
            entries.push(doc);
        }
    }

    sort_descending(&mut entries)?;

    tracing::info!("Found {} markdown files", entries.len());

    Ok(entries)
}
