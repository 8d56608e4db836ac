//! # docstage-core
//!
//! Core library for the docstage asset staging utility.
//!
//! A run discovers the Markdown documents in a source folder, writes a
//! `list.json` manifest describing them into a freshly wiped target folder,
//! and then makes every document available there, either as a copy or as a
//! relative symlink back to the source.

pub mod config;
pub mod error;
pub mod manifest;
pub mod materialize;
pub mod mode;
pub mod scan;
pub mod stage;
pub mod sync;

pub use config::{Config, ConfigError, DEFAULT_CONFIG_FILE};
pub use error::{Result, StageError};
pub use manifest::{Manifest, MANIFEST_FILE_NAME};
pub use materialize::{
    relative_link_target, Linker, MaterializeReport, Materializer, Outcome, SymlinkLinker,
};
pub use mode::{ModeSignals, RunMode, DEVELOPMENT_ENV};
pub use scan::{derive_title, scan_documents, sort_descending, DocumentEntry};
pub use stage::{stage, stage_with_linker, StageOptions, StageReport};
pub use sync::reset_dir;
