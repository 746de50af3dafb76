//! # svg-batch-export
//!
//! Export a directory of SVG drawings to PNG, PDF, PS, EPS, or any raster
//! format the `image` crate can encode, by driving Inkscape as a subprocess.
//!
//! ## Rules
//!
//! Output settings (format, pixel size, drawing-vs-page crop) are resolved per
//! file from four layers, first match wins for each field independently:
//!
//! 1. the file's own entry in the rules document (keyed by file stem)
//! 2. overrides supplied by the caller (the CLI flags)
//! 3. the `_globalrule_` entry in the rules document
//! 4. built-in defaults: `png`, natural size, drawing only
//!
//! ```json
//! {
//!   "_globalrule_": { "size": [300, 300] },
//!   "gauge":        { "format": "gif" },
//!   "ink":          { "size": "default", "drawing_only": false }
//! }
//! ```
//!
//! ## Pipeline Overview
//!
//! ```text
//! src_dir/*.svg
//!  │
//!  ├─ 1. Preflight  directories, rules file, locate Inkscape, probe version
//!  ├─ 2. Resolve    merge rule layers into per-file Settings
//!  ├─ 3. Route      png/pdf/ps/eps  → Inkscape writes the output directly
//!  │                everything else → Inkscape PNG → image re-encode
//!  └─ 4. Report     per-file outcome + stats; failures never stop the batch
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use svg_batch_export::{run_batch, BatchRequest, ExportConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let request = BatchRequest::new("drawings", "exported").rules("rules.json");
//!     let report = run_batch(&request, &ExportConfig::default()).await?;
//!     for failed in report.failures() {
//!         if let Some(ref e) = failed.error {
//!             eprintln!("{}: {}", failed.stem, e);
//!         }
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `svg-batch-export` binary (clap + anyhow + indicatif + tracing-subscriber) |
//!
//! Disable `cli` when using only the library:
//! ```toml
//! svg-batch-export = { version = "0.4", default-features = false }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod batch;
pub mod config;
pub mod error;
pub mod format;
pub mod output;
pub mod pipeline;
pub mod progress;
pub mod rules;
pub mod runner;
pub mod settings;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use batch::{run_batch, run_batch_sync, run_batch_with, BatchRequest};
pub use config::{ExportConfig, ExportConfigBuilder};
pub use error::{ExportError, FileError};
pub use format::{classify, supported_formats, ConversionRoute, FormatClass, NativeFormat, RelayFormat};
pub use output::{BatchReport, BatchStats, FileOutcome};
pub use pipeline::command::Dialect;
pub use progress::{BatchProgressCallback, NoopProgressCallback, ProgressCallback};
pub use rules::{RuleError, RuleStore, GLOBAL_RULE_KEY};
pub use runner::{ProcessOutput, ProcessRunner, TokioProcessRunner};
pub use settings::{OverrideBlock, Settings, Size, SizeOverride};
