//! Run mode resolution.

use serde::{Deserialize, Serialize};
use std::fmt;

/// `NODE_ENV` value that switches a run into link mode
pub const DEVELOPMENT_ENV: &str = "development";

/// How documents are materialized under the target directory.
///
/// Resolved once per run and passed by value to everything that needs it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RunMode {
    #[serde(rename = "symlink")]
    Link,
    #[serde(rename = "copy")]
    Copy,
}

/// Raw inputs the mode is derived from.
#[derive(Debug, Clone, Default)]
pub struct ModeSignals {
    /// `--symlink` was passed
    pub symlink_flag: bool,
    /// `--dev` was passed
    pub dev_flag: bool,
    /// Value of the development environment indicator, if set
    pub environment: Option<String>,
}

impl ModeSignals {
    fn is_development(&self) -> bool {
        self.dev_flag || self.environment.as_deref() == Some(DEVELOPMENT_ENV)
    }
}

impl RunMode {
    /// Link when explicitly requested or when running in development, Copy otherwise.
    pub fn resolve(signals: &ModeSignals) -> Self {
        if signals.symlink_flag || signals.is_development() {
            RunMode::Link
        } else {
            RunMode::Copy
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RunMode::Link => "symlink",
            RunMode::Copy => "copy",
        }
    }

    /// Human-readable label for status output
    pub fn describe(&self) -> &'static str {
        match self {
            RunMode::Link => "symlink mode (development)",
            RunMode::Copy => "copy mode (build)",
        }
    }
}

impl fmt::Display for RunMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
