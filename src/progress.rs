//! Progress-callback trait for per-file export events.
//!
//! Inject an [`Arc<dyn BatchProgressCallback>`] via
//! [`crate::config::ExportConfigBuilder::progress_callback`] to receive events
//! as the batch converts each drawing. The CLI uses this to drive its progress
//! bar; library callers can forward events anywhere.
//!
//! # Example
//!
//! ```rust
//! use svg_batch_export::{BatchProgressCallback, ExportConfig};
//! use std::path::Path;
//! use std::sync::{Arc, atomic::{AtomicUsize, Ordering}};
//!
//! struct CountingCallback {
//!     completed: AtomicUsize,
//! }
//!
//! impl BatchProgressCallback for CountingCallback {
//!     fn on_file_complete(&self, stem: &str, output: &Path, total: usize) {
//!         let done = self.completed.fetch_add(1, Ordering::SeqCst) + 1;
//!         eprintln!("{done}/{total} {stem} -> {}", output.display());
//!     }
//! }
//!
//! let counter = Arc::new(CountingCallback {
//!     completed: AtomicUsize::new(0),
//! });
//!
//! let config = ExportConfig::builder()
//!     .progress_callback(counter as Arc<dyn BatchProgressCallback>)
//!     .build()
//!     .unwrap();
//! ```

use std::path::Path;
use std::sync::Arc;

/// Called by the batch orchestrator as it processes each file.
///
/// All methods have default no-op implementations so callers only override
/// what they care about.
///
/// # Thread safety
///
/// With `concurrency > 1`, `on_file_start`, `on_file_complete`, and
/// `on_file_error` may be called concurrently. Implementations must protect
/// shared mutable state (e.g. `Mutex`, `AtomicUsize`).
pub trait BatchProgressCallback: Send + Sync {
    /// Called once, after every pre-batch check has passed.
    fn on_batch_start(&self, total_files: usize) {
        let _ = total_files;
    }

    /// Called before a file is resolved and converted.
    ///
    /// # Arguments
    /// * `stem`  — file name without extension
    /// * `index` — 1-based position in stem order
    /// * `total` — number of files in the batch
    fn on_file_start(&self, stem: &str, index: usize, total: usize) {
        let _ = (stem, index, total);
    }

    /// Called when a file was written to `output`.
    fn on_file_complete(&self, stem: &str, output: &Path, total: usize) {
        let _ = (stem, output, total);
    }

    /// Called when a file failed; `error` is the human-readable message.
    fn on_file_error(&self, stem: &str, total: usize, error: &str) {
        let _ = (stem, total, error);
    }

    /// Called once after every file has been attempted.
    fn on_batch_complete(&self, total_files: usize, converted: usize) {
        let _ = (total_files, converted);
    }
}

/// A no-op implementation for callers that don't need progress events.
pub struct NoopProgressCallback;

impl BatchProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in [`crate::config::ExportConfig`].
pub type ProgressCallback = Arc<dyn BatchProgressCallback>;
