//! Result types returned by a batch export.

use crate::error::{ExportError, FileError};
use crate::format::ConversionRoute;
use crate::pipeline::command::Dialect;
use crate::settings::Settings;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// What happened to one input file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileOutcome {
    pub stem: String,
    pub input: PathBuf,
    /// `<out_dir>/<stem>.<format>`. Only written when `error` is `None`.
    pub output: PathBuf,
    /// `None` only when resolution itself failed.
    pub settings: Option<Settings>,
    pub route: Option<ConversionRoute>,
    pub duration_ms: u64,
    pub error: Option<FileError>,
}

impl FileOutcome {
    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }
}

/// Aggregate counts for a batch.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchStats {
    pub total_files: usize,
    pub converted: usize,
    pub failed: usize,
    pub total_duration_ms: u64,
}

impl BatchStats {
    pub fn from_outcomes(files: &[FileOutcome], total_duration_ms: u64) -> Self {
        let converted = files.iter().filter(|f| f.is_success()).count();
        Self {
            total_files: files.len(),
            converted,
            failed: files.len() - converted,
            total_duration_ms,
        }
    }
}

/// Complete result of a batch that got past its pre-flight checks.
///
/// A returned report does not mean every file converted: check
/// [`BatchReport::is_success`] or call [`BatchReport::into_result`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchReport {
    pub renderer: PathBuf,
    pub dialect: Dialect,
    /// One entry per input file, sorted by stem.
    pub files: Vec<FileOutcome>,
    pub stats: BatchStats,
}

impl BatchReport {
    pub fn is_success(&self) -> bool {
        self.stats.failed == 0
    }

    pub fn failures(&self) -> impl Iterator<Item = &FileOutcome> {
        self.files.iter().filter(|f| !f.is_success())
    }

    /// `Ok(self)` when every file converted, else [`ExportError::PartialFailure`].
    pub fn into_result(self) -> Result<Self, ExportError> {
        if self.is_success() {
            Ok(self)
        } else {
            Err(ExportError::PartialFailure {
                converted: self.stats.converted,
                failed: self.stats.failed,
                total: self.stats.total_files,
            })
        }
    }
}
