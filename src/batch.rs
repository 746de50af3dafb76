//! Batch export entry points.
//!
//! A batch runs in two phases. The pre-flight phase validates everything that
//! would make the whole run pointless (directories, rules file, renderer,
//! inputs) and fails with an [`ExportError`] before any file is written. The
//! conversion phase then attempts every input and records each result in a
//! [`FileOutcome`]; one file's failure never stops another.

use crate::config::ExportConfig;
use crate::error::ExportError;
use crate::output::{BatchReport, BatchStats, FileOutcome};
use crate::pipeline::command::{Dialect, RendererCommand};
use crate::pipeline::input::{self, InputFile};
use crate::pipeline::resolve::resolve;
use crate::pipeline::route::Router;
use crate::progress::ProgressCallback;
use crate::rules::RuleStore;
use crate::runner::{ProcessRunner, TokioProcessRunner};
use crate::settings::{OverrideBlock, Settings};
use futures::stream::{self, StreamExt};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Per-run inputs for a batch export.
///
/// # Example
/// ```rust
/// use svg_batch_export::{BatchRequest, OverrideBlock, Size};
///
/// let request = BatchRequest::new("drawings", "exported")
///     .rules("rules.json")
///     .supplied(OverrideBlock::default().with_size(Size::new(400, 400).unwrap()));
/// assert!(request.rules.is_some());
/// ```
#[derive(Debug, Clone)]
pub struct BatchRequest {
    pub src_dir: PathBuf,
    pub out_dir: PathBuf,
    /// Rules document path. `None` means no per-file or global rules.
    pub rules: Option<PathBuf>,
    /// Overrides given on the command line; ranks below per-file rules.
    pub supplied: OverrideBlock,
}

impl BatchRequest {
    pub fn new(src_dir: impl Into<PathBuf>, out_dir: impl Into<PathBuf>) -> Self {
        Self {
            src_dir: src_dir.into(),
            out_dir: out_dir.into(),
            rules: None,
            supplied: OverrideBlock::default(),
        }
    }

    pub fn rules(mut self, path: impl Into<PathBuf>) -> Self {
        self.rules = Some(path.into());
        self
    }

    pub fn supplied(mut self, block: OverrideBlock) -> Self {
        self.supplied = block;
        self
    }
}

/// Export every drawing in `request.src_dir` with the real Inkscape.
///
/// # Returns
/// `Ok(BatchReport)` once the pre-flight checks pass, even if some files
/// failed (check `report.stats.failed` or call
/// [`BatchReport::into_result`]).
///
/// # Errors
/// Returns `Err(ExportError)` only for pre-flight failures:
/// - source or output directory missing
/// - rules file missing or invalid
/// - Inkscape not found
/// - no input files
pub async fn run_batch(
    request: &BatchRequest,
    config: &ExportConfig,
) -> Result<BatchReport, ExportError> {
    run_batch_with(&TokioProcessRunner, request, config).await
}

/// [`run_batch`] with a caller-supplied [`ProcessRunner`].
pub async fn run_batch_with<R: ProcessRunner>(
    runner: &R,
    request: &BatchRequest,
    config: &ExportConfig,
) -> Result<BatchReport, ExportError> {
    let batch_start = Instant::now();
    info!(
        "Starting batch export: {} → {}",
        request.src_dir.display(),
        request.out_dir.display()
    );

    // ── Step 1: Directories ──────────────────────────────────────────────
    input::check_dir(&request.src_dir)?;
    input::check_dir(&request.out_dir)?;

    // ── Step 2: Rules ────────────────────────────────────────────────────
    let rules = match &request.rules {
        Some(path) => input::read_rules(path)?,
        None => RuleStore::default(),
    };

    // ── Step 3: Renderer ─────────────────────────────────────────────────
    let renderer = resolve_renderer(config)?;
    let dialect = match config.dialect {
        Some(dialect) => dialect,
        None => probe_dialect(runner, &renderer, config.renderer_timeout()).await,
    };
    info!("Using {} ({} dialect)", renderer.display(), dialect);

    // ── Step 4: Inputs ───────────────────────────────────────────────────
    let inputs = input::discover_inputs(&request.src_dir, &config.input_extension)?;
    let unmatched = rules.unmatched_keys(inputs.iter().map(|i| i.stem.as_str()));
    if !unmatched.is_empty() {
        debug!("Rules for unknown files ignored: {}", unmatched.join(", "));
    }

    // ── Step 5: Scratch space for relay intermediates ────────────────────
    let scratch = tempfile::Builder::new()
        .prefix("svg-batch-export-")
        .tempdir()
        .map_err(ExportError::ScratchDir)?;

    // ── Step 6: Convert ──────────────────────────────────────────────────
    let total = inputs.len();
    if let Some(ref cb) = config.progress_callback {
        cb.on_batch_start(total);
    }

    let defaults = OverrideBlock::builtin_defaults();
    let job = BatchJob {
        router: Router {
            runner,
            renderer: &renderer,
            dialect,
            timeout: config.renderer_timeout(),
            scratch_dir: scratch.path(),
        },
        rules: &rules,
        supplied: &request.supplied,
        defaults: &defaults,
        out_dir: &request.out_dir,
        total,
        progress: config.progress_callback.as_ref(),
    };

    let mut files: Vec<FileOutcome> = stream::iter(
        inputs
            .iter()
            .enumerate()
            .map(|(i, file)| job.export_one(file, i + 1)),
    )
    .buffer_unordered(config.concurrency)
    .collect()
    .await;
    files.sort_by(|a, b| a.stem.cmp(&b.stem));

    let scratch_path = scratch.path().to_path_buf();
    if let Err(e) = scratch.close() {
        warn!("Failed to remove scratch directory {}: {}", scratch_path.display(), e);
    }

    // ── Step 7: Report ───────────────────────────────────────────────────
    let stats = BatchStats::from_outcomes(&files, batch_start.elapsed().as_millis() as u64);
    info!(
        "Batch complete: {}/{} files exported, {}ms total",
        stats.converted, stats.total_files, stats.total_duration_ms
    );

    if let Some(ref cb) = config.progress_callback {
        cb.on_batch_complete(stats.total_files, stats.converted);
    }

    Ok(BatchReport {
        renderer,
        dialect,
        files,
        stats,
    })
}

/// Synchronous wrapper around [`run_batch`].
///
/// Creates a temporary tokio runtime internally.
pub fn run_batch_sync(
    request: &BatchRequest,
    config: &ExportConfig,
) -> Result<BatchReport, ExportError> {
    tokio::runtime::Runtime::new()
        .map_err(|e| ExportError::Internal(format!("Failed to create tokio runtime: {}", e)))?
        .block_on(run_batch(request, config))
}

/// Explicit path from the config, else auto-detection.
fn resolve_renderer(config: &ExportConfig) -> Result<PathBuf, ExportError> {
    match &config.renderer_path {
        Some(path) => inkscape_locate::verify_executable(path)
            .map_err(|_| ExportError::RendererMissing { path: path.clone() }),
        None => Ok(inkscape_locate::locate_inkscape()?),
    }
}

/// Ask the renderer for its version and pick the matching dialect.
///
/// Falls back to [`Dialect::Modern`] when the probe fails or its output is
/// unrecognised; current Inkscape releases all speak it.
async fn probe_dialect<R: ProcessRunner>(runner: &R, renderer: &Path, timeout: Duration) -> Dialect {
    let detected = match runner.run(&RendererCommand::version(renderer), timeout).await {
        Ok(out) => Dialect::from_version_output(&out.stdout)
            .or_else(|| Dialect::from_version_output(&out.stderr)),
        Err(e) => {
            warn!("Inkscape version probe failed: {}", e);
            None
        }
    };

    detected.unwrap_or_else(|| {
        warn!("Could not determine Inkscape version; assuming 1.x command line");
        Dialect::Modern
    })
}

/// Shared, borrowed state for every conversion in one batch.
struct BatchJob<'a, R: ProcessRunner> {
    router: Router<'a, R>,
    rules: &'a RuleStore,
    supplied: &'a OverrideBlock,
    defaults: &'a OverrideBlock,
    out_dir: &'a Path,
    total: usize,
    progress: Option<&'a ProgressCallback>,
}

impl<R: ProcessRunner> BatchJob<'_, R> {
    async fn export_one(&self, file: &InputFile, index: usize) -> FileOutcome {
        let start = Instant::now();
        let stem = file.stem.as_str();
        if let Some(cb) = self.progress {
            cb.on_file_start(stem, index, self.total);
        }

        let resolved = resolve(
            stem,
            self.rules.block_for(stem),
            self.supplied,
            self.rules.global_block(),
            self.defaults,
        );

        let (output, settings, result) = match resolved {
            Ok(settings) => {
                let output = self.output_path(stem, &settings);
                let result = self.router.convert(&file.path, &output, &settings).await;
                (output, Some(settings), result)
            }
            Err(e) => (self.out_dir.join(stem), None, Err(e)),
        };

        let duration_ms = start.elapsed().as_millis() as u64;
        let (route, error) = match result {
            Ok(route) => {
                debug!("{} → {} via {} in {}ms", stem, output.display(), route, duration_ms);
                if let Some(cb) = self.progress {
                    cb.on_file_complete(stem, &output, self.total);
                }
                (Some(route), None)
            }
            Err(e) => {
                warn!("{}: {}", stem, e);
                if let Some(cb) = self.progress {
                    cb.on_file_error(stem, self.total, &e.to_string());
                }
                (None, Some(e))
            }
        };

        FileOutcome {
            stem: file.stem.clone(),
            input: file.path.clone(),
            output,
            settings,
            route,
            duration_ms,
            error,
        }
    }

    fn output_path(&self, stem: &str, settings: &Settings) -> PathBuf {
        self.out_dir.join(format!("{}.{}", stem, settings.format))
    }
}
