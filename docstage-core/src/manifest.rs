//! The `list.json` manifest written into the target directory.

use crate::error::{Result, StageError};
use crate::mode::RunMode;
use crate::scan::DocumentEntry;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

pub const MANIFEST_FILE_NAME: &str = "list.json";

/// Description of one staging run.
///
/// Field order here is the key order of the serialized file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Manifest {
    pub files: Vec<DocumentEntry>,
    #[serde(with = "iso_millis")]
    pub generated: DateTime<Utc>,
    pub mode: RunMode,
}

impl Manifest {
    /// Capture the current time as the generation timestamp
    pub fn new(files: Vec<DocumentEntry>, mode: RunMode) -> Self {
        Self::with_timestamp(files, mode, Utc::now())
    }

    pub fn with_timestamp(
        files: Vec<DocumentEntry>,
        mode: RunMode,
        generated: DateTime<Utc>,
    ) -> Self {
        Self {
            files,
            generated,
            mode,
        }
    }

    /// Pretty JSON, two-space indent, no trailing newline
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Write `list.json` into `target_dir`, replacing any previous file.
    pub fn write_to(&self, target_dir: &Path) -> Result<PathBuf> {
        let path = target_dir.join(MANIFEST_FILE_NAME);
        let json = self.to_json()?;
        fs::write(&path, json).map_err(|source| StageError::WriteManifest {
            path: path.clone(),
            source,
        })?;

        tracing::info!(
            "Generated {} with {} entries",
            MANIFEST_FILE_NAME,
            self.files.len()
        );

        Ok(path)
    }

    pub fn read_from(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path).map_err(|source| StageError::ReadManifest {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(serde_json::from_str(&contents)?)
    }
}

/// ISO-8601 in UTC with millisecond precision, e.g. `2024-05-01T12:00:00.000Z`
mod iso_millis {
    use chrono::{DateTime, SecondsFormat, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(
        value: &DateTime<Utc>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&value.to_rfc3339_opts(SecondsFormat::Millis, true))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<DateTime<Utc>, D::Error> {
        let raw = String::deserialize(deserializer)?;
        DateTime::parse_from_rfc3339(&raw)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(serde::de::Error::custom)
    }
}
