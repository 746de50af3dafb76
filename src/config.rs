//! Run-wide configuration for a batch export.
//!
//! Per-run inputs (directories, rules file, command-line overrides) live in
//! [`crate::batch::BatchRequest`]. Everything here is about *how* to run:
//! which renderer, which command dialect, how many workers, how long to wait.

use crate::error::ExportError;
use crate::pipeline::command::Dialect;
use crate::progress::ProgressCallback;
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

/// Configuration for a batch export.
///
/// Built via [`ExportConfig::builder()`] or using [`ExportConfig::default()`].
///
/// # Example
/// ```rust
/// use svg_batch_export::ExportConfig;
///
/// let config = ExportConfig::builder()
///     .renderer_path("/usr/bin/inkscape")
///     .concurrency(4)
///     .renderer_timeout_secs(60)
///     .build()
///     .unwrap();
/// assert_eq!(config.concurrency, 4);
/// ```
#[derive(Clone)]
pub struct ExportConfig {
    /// Explicit Inkscape executable. `None` means auto-detect.
    pub renderer_path: Option<PathBuf>,

    /// Inkscape command-line dialect. `None` means probe with `--version`.
    pub dialect: Option<Dialect>,

    /// Number of files converted at once. Default: 1.
    ///
    /// Each worker runs its own Inkscape process, and Inkscape is heavy on
    /// memory. With 1 the batch is strictly sequential in stem order.
    pub concurrency: usize,

    /// Per-subprocess timeout in seconds. Default: 120.
    pub renderer_timeout_secs: u64,

    /// Extension of the files to pick up from the source directory,
    /// without the dot. Default: `svg`.
    pub input_extension: String,

    /// Optional per-file progress events.
    pub progress_callback: Option<ProgressCallback>,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            renderer_path: None,
            dialect: None,
            concurrency: 1,
            renderer_timeout_secs: 120,
            input_extension: "svg".to_string(),
            progress_callback: None,
        }
    }
}

impl fmt::Debug for ExportConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExportConfig")
            .field("renderer_path", &self.renderer_path)
            .field("dialect", &self.dialect)
            .field("concurrency", &self.concurrency)
            .field("renderer_timeout_secs", &self.renderer_timeout_secs)
            .field("input_extension", &self.input_extension)
            .field(
                "progress_callback",
                &self
                    .progress_callback
                    .as_ref()
                    .map(|_| "<dyn BatchProgressCallback>"),
            )
            .finish()
    }
}

impl ExportConfig {
    /// Create a new builder for `ExportConfig`.
    pub fn builder() -> ExportConfigBuilder {
        ExportConfigBuilder {
            config: Self::default(),
        }
    }

    pub fn renderer_timeout(&self) -> Duration {
        Duration::from_secs(self.renderer_timeout_secs)
    }
}

/// Builder for [`ExportConfig`].
#[derive(Debug)]
pub struct ExportConfigBuilder {
    config: ExportConfig,
}

impl ExportConfigBuilder {
    pub fn renderer_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.renderer_path = Some(path.into());
        self
    }

    pub fn dialect(mut self, dialect: Dialect) -> Self {
        self.config.dialect = Some(dialect);
        self
    }

    pub fn concurrency(mut self, n: usize) -> Self {
        self.config.concurrency = n;
        self
    }

    pub fn renderer_timeout_secs(mut self, secs: u64) -> Self {
        self.config.renderer_timeout_secs = secs;
        self
    }

    /// Leading dots are stripped: `.svg` and `svg` are the same.
    pub fn input_extension(mut self, ext: impl Into<String>) -> Self {
        let ext: String = ext.into();
        self.config.input_extension = ext.trim_start_matches('.').to_string();
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<ExportConfig, ExportError> {
        let c = &self.config;
        if c.concurrency == 0 {
            return Err(ExportError::InvalidConfig(
                "Concurrency must be ≥ 1".into(),
            ));
        }
        if c.renderer_timeout_secs == 0 {
            return Err(ExportError::InvalidConfig(
                "Renderer timeout must be ≥ 1 second".into(),
            ));
        }
        if c.input_extension.is_empty() {
            return Err(ExportError::InvalidConfig(
                "Input extension must not be empty".into(),
            ));
        }
        Ok(self.config)
    }
}
