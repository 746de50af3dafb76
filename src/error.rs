//! Error types for the svg-batch-export library.
//!
//! Two distinct error types reflect two distinct failure modes:
//!
//! * [`ExportError`] — **Fatal**: the batch cannot start at all (missing
//!   directory, unreadable rules file, no Inkscape, nothing to convert).
//!   Returned as `Err(ExportError)` from the top-level `run_batch*` functions
//!   before any file is touched.
//!
//! * [`FileError`] — **Non-fatal**: a single drawing failed (unsupported
//!   format, renderer crash, relay I/O) but every other file is still
//!   attempted. Stored inside [`crate::output::FileOutcome`] so callers can
//!   inspect partial success rather than losing the whole batch to one file.

use crate::rules::RuleError;
use inkscape_locate::LocateError;
use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors returned by the svg-batch-export library.
///
/// Per-file failures use [`FileError`] and are stored in
/// [`crate::output::FileOutcome`] rather than propagated here.
#[derive(Debug, Error)]
pub enum ExportError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// A source or output directory does not exist.
    #[error("'{path}' is not a valid directory")]
    DirectoryNotFound { path: PathBuf },

    /// The source directory could not be listed.
    #[error("Failed to read directory '{path}': {source}")]
    ReadDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The source directory holds no file with the input extension.
    #[error("No .{extension} file found in '{dir}'")]
    NoInputFiles { dir: PathBuf, extension: String },

    // ── Rules errors ──────────────────────────────────────────────────────
    /// A rules path was given but no file exists there.
    #[error("Rules file '{path}' is not a valid file path")]
    RulesNotFound { path: PathBuf },

    /// The rules file exists but could not be read.
    #[error("Failed to read rules file '{path}': {source}")]
    RulesUnreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The rules file exists but is not a valid rules document.
    #[error("Rules file '{path}' is invalid: {source}")]
    InvalidRules {
        path: PathBuf,
        #[source]
        source: RuleError,
    },

    // ── Renderer errors ───────────────────────────────────────────────────
    /// An explicit renderer path was given but nothing executable is there.
    #[error("Inkscape executable '{path}' not found")]
    RendererMissing { path: PathBuf },

    /// Auto-detection found no Inkscape installation.
    #[error("{0}\nInstall Inkscape or pass --inkscape <PATH>.")]
    RendererNotInstalled(#[from] LocateError),

    // ── Batch errors ──────────────────────────────────────────────────────
    /// Some files converted but at least one failed.
    ///
    /// Returned by [`crate::output::BatchReport::into_result`] when the
    /// caller wants to treat any file failure as an error.
    #[error("{failed}/{total} files failed to export")]
    PartialFailure {
        converted: usize,
        failed: usize,
        total: usize,
    },

    /// The per-batch scratch directory could not be created.
    #[error("Failed to create scratch directory: {0}")]
    ScratchDir(#[source] std::io::Error),

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// A non-fatal error for a single input file.
///
/// Stored alongside [`crate::output::FileOutcome`] when a conversion fails.
/// The batch continues with the next file regardless.
#[derive(Debug, Clone, PartialEq, Eq, Error, serde::Serialize, serde::Deserialize)]
pub enum FileError {
    /// Neither Inkscape nor the relay image library can produce the format.
    #[error("Unsupported file format to export: {format}")]
    UnsupportedFormat { format: String },

    /// The relay image library was built without an encoder for the format.
    #[error("Image library has no encoder for '{format}' in this build")]
    RelayLibraryMissing { format: String },

    /// Opening the intermediate raster or saving the output failed.
    #[error("Relay I/O failed for '{path}': {detail}")]
    RelayIo { path: PathBuf, detail: String },

    /// A stale output file from an earlier run could not be removed.
    #[error("Cannot replace existing output '{path}': {detail}")]
    OutputIo { path: PathBuf, detail: String },

    /// Inkscape exited unsuccessfully or produced no output.
    #[error("Inkscape failed (exit {}): {stderr}", code.map_or_else(|| "signal".to_string(), |c| c.to_string()))]
    RendererFailed { code: Option<i32>, stderr: String },

    /// Inkscape did not finish within the configured timeout.
    #[error("Inkscape timed out after {secs}s")]
    RendererTimeout { secs: u64 },

    /// The Inkscape process could not be started.
    #[error("Failed to run Inkscape: {detail}")]
    RendererSpawn { detail: String },

    /// No override layer defined a settings field.
    #[error("No value for '{field}' in any rule layer")]
    Unresolved { field: String },
}
