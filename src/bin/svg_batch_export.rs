//! CLI binary for svg-batch-export.
//!
//! A thin shim over the library crate that maps CLI flags to a
//! `BatchRequest` + `ExportConfig` and prints the report.
//!
//! Exit codes: 0 all files exported, 1 fatal error before the batch,
//! 2 bad arguments (clap), 3 at least one file failed.

use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use svg_batch_export::runner::stderr_excerpt;
use svg_batch_export::{
    run_batch, BatchProgressCallback, BatchReport, BatchRequest, Dialect, ExportConfig,
    OverrideBlock, ProgressCallback, Size,
};
use tracing_subscriber::EnvFilter;

/// Exit status when the batch ran but some files failed.
const EXIT_PARTIAL_FAILURE: i32 = 3;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}
fn cyan(s: &str) -> String {
    format!("\x1b[36m{s}\x1b[0m")
}

// ── CLI progress callback using indicatif ────────────────────────────────────

const TICKS: &[&str] = &["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"];

/// Live progress bar plus one log line per file. Files may finish out of
/// order when `--concurrency` is above 1.
struct CliProgressCallback {
    bar: ProgressBar,
    /// Per-file start times, keyed by stem.
    start_times: Mutex<HashMap<String, Instant>>,
}

impl CliProgressCallback {
    /// Spinner until `on_batch_start` reports the file count.
    fn new_dynamic() -> Arc<Self> {
        let bar = ProgressBar::new(0);

        let spinner_style = ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(TICKS);

        bar.set_style(spinner_style);
        bar.set_prefix("Preparing");
        bar.set_message("Looking for Inkscape…");
        bar.enable_steady_tick(Duration::from_millis(80));

        Arc::new(Self {
            bar,
            start_times: Mutex::new(HashMap::new()),
        })
    }

    fn activate_bar(&self, total: usize) {
        let progress_style = ProgressStyle::with_template(
            "{spinner:.cyan} {prefix:.bold}  \
             [{bar:42.green/238}] {pos:>3}/{len} files  \
             ⏱ {elapsed_precise}  {msg}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▉▊▋▌▍▎▏  ")
        .tick_strings(TICKS);

        self.bar.set_length(total as u64);
        self.bar.set_style(progress_style);
        self.bar.set_prefix("Exporting");
        self.bar.reset_eta();
    }

    fn elapsed_secs(&self, stem: &str) -> f64 {
        self.start_times
            .lock()
            .ok()
            .and_then(|mut times| times.remove(stem))
            .map_or(0.0, |t| t.elapsed().as_secs_f64())
    }
}

impl BatchProgressCallback for CliProgressCallback {
    fn on_batch_start(&self, total_files: usize) {
        self.activate_bar(total_files);
        self.bar.println(format!(
            "{} {}",
            cyan("◆"),
            bold(&format!("Exporting {total_files} drawings…"))
        ));
    }

    fn on_file_start(&self, stem: &str, _index: usize, _total: usize) {
        if let Ok(mut times) = self.start_times.lock() {
            times.insert(stem.to_string(), Instant::now());
        }
        self.bar.set_message(stem.to_string());
    }

    fn on_file_complete(&self, stem: &str, output: &Path, _total: usize) {
        let secs = self.elapsed_secs(stem);
        let name = output
            .file_name()
            .map_or_else(|| output.display().to_string(), |n| n.to_string_lossy().into_owned());

        self.bar.println(format!(
            "  {} {:<24} {}  {}",
            green("✓"),
            stem,
            dim(&format!("→ {name}")),
            dim(&format!("{secs:.1}s")),
        ));
        self.bar.inc(1);
    }

    fn on_file_error(&self, stem: &str, _total: usize, error: &str) {
        let secs = self.elapsed_secs(stem);

        self.bar.println(format!(
            "  {} {:<24} {}  {}",
            red("✗"),
            stem,
            red(&stderr_excerpt(error, 80)),
            dim(&format!("{secs:.1}s")),
        ));
        self.bar.inc(1);
    }

    fn on_batch_complete(&self, total_files: usize, converted: usize) {
        let failed = total_files.saturating_sub(converted);
        self.bar.finish_and_clear();

        if failed == 0 {
            eprintln!(
                "{} {} drawings exported successfully",
                green("✔"),
                bold(&converted.to_string())
            );
        } else {
            eprintln!(
                "{} {}/{} drawings exported  ({} failed)",
                if failed == total_files {
                    red("✘")
                } else {
                    cyan("⚠")
                },
                bold(&converted.to_string()),
                total_files,
                red(&failed.to_string()),
            );
        }
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Export every drawing as a PNG at its natural size
  svg-batch-export drawings/ exported/

  # Apply a rules file
  svg-batch-export drawings/ exported/ --rules rules.json

  # 400x400 BMPs unless a rule says otherwise
  svg-batch-export drawings/ exported/ --format bmp --size 400,400

  # Export the whole page instead of the drawing's bounding box
  svg-batch-export drawings/ exported/ --drawing_only no

  # Machine-readable report
  svg-batch-export drawings/ exported/ --json > report.json

RULES FILE:
  {
    "_globalrule_": { "size": [300, 300] },
    "gauge":        { "format": "gif" },
    "ink":          { "size": "default", "drawing_only": false }
  }

  Keys are file names without extension. For each of format, size and
  drawing_only the first of these that defines it wins:
    1. the file's own rule
    2. --format / --size / --drawing_only
    3. _globalrule_
    4. png, natural size, drawing only
  "size": "default" means the drawing's natural size.

FORMATS:
  Written by Inkscape:   png, pdf, ps, eps   (size applies to png only)
  Re-encoded from PNG:   jpeg, jpg, bmp, gif, tiff, tif, webp, tga, ico

ENVIRONMENT VARIABLES:
  INKSCAPE_PATH           Inkscape executable used by auto-detection
  RUST_LOG                Override the log filter (e.g. debug)
"#;

/// Batch-export SVG drawings with Inkscape.
#[derive(Parser, Debug)]
#[command(
    name = "svg-batch-export",
    version,
    about = "Batch-export SVG drawings to PNG, PDF, GIF, JPEG and more with Inkscape",
    long_about = "Export every SVG in a directory with Inkscape. Per-file rules choose the \
output format, pixel size and crop. Formats Inkscape cannot write are rendered to PNG \
first and re-encoded.",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Directory containing the SVG files.
    src_dir: PathBuf,

    /// Directory the exported files are written to.
    out_dir: PathBuf,

    /// JSON rules file.
    #[arg(long, env = "SVG_EXPORT_RULES")]
    rules: Option<PathBuf>,

    /// Output size in pixels as W,H (e.g. 300,300).
    #[arg(long, env = "SVG_EXPORT_SIZE", value_parser = parse_size)]
    size: Option<Size>,

    /// Output format (png, pdf, ps, eps, jpg, gif, bmp, tiff, webp, …).
    #[arg(long, env = "SVG_EXPORT_FORMAT", value_parser = parse_format)]
    format: Option<String>,

    /// Crop to the drawing (yes) or export the whole page (no).
    #[arg(
        long = "drawing_only",
        visible_alias = "drawing-only",
        env = "SVG_EXPORT_DRAWING_ONLY",
        value_name = "yes|y|no|n",
        value_parser = parse_yes_no
    )]
    drawing_only: Option<bool>,

    /// Inkscape executable. Auto-detected when not given.
    #[arg(long, env = "SVG_EXPORT_INKSCAPE")]
    inkscape: Option<PathBuf>,

    /// Inkscape command-line flavour.
    #[arg(long, env = "SVG_EXPORT_DIALECT", value_enum, default_value = "auto")]
    dialect: DialectArg,

    /// Number of drawings exported at once.
    #[arg(short = 'j', long, env = "SVG_EXPORT_CONCURRENCY", default_value_t = 1,
          value_parser = clap::value_parser!(u64).range(1..))]
    concurrency: u64,

    /// Seconds to wait for each Inkscape run.
    #[arg(long, env = "SVG_EXPORT_TIMEOUT", default_value_t = 120,
          value_parser = clap::value_parser!(u64).range(1..))]
    timeout: u64,

    /// Print the batch report as JSON on stdout.
    #[arg(long, env = "SVG_EXPORT_JSON")]
    json: bool,

    /// Disable progress bar.
    #[arg(long, env = "SVG_EXPORT_NO_PROGRESS")]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "SVG_EXPORT_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, env = "SVG_EXPORT_QUIET")]
    quiet: bool,
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
enum DialectArg {
    /// Probe `inkscape --version`.
    Auto,
    /// Inkscape 0.92 and earlier.
    Legacy,
    /// Inkscape 1.x.
    Modern,
}

impl DialectArg {
    fn dialect(self) -> Option<Dialect> {
        match self {
            DialectArg::Auto => None,
            DialectArg::Legacy => Some(Dialect::Legacy),
            DialectArg::Modern => Some(Dialect::Modern),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // The progress bar replaces INFO-level library logs.
    let show_progress = !cli.quiet && !cli.no_progress && !cli.json;
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || show_progress {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    // ── Build request and config ─────────────────────────────────────────
    let progress_cb: Option<ProgressCallback> = if show_progress {
        let cb = CliProgressCallback::new_dynamic();
        Some(cb as Arc<dyn BatchProgressCallback>)
    } else {
        None
    };

    let request = build_request(&cli);
    let config = build_config(&cli, progress_cb)?;

    // ── Run batch ────────────────────────────────────────────────────────
    let report = run_batch(&request, &config)
        .await
        .context("Batch export failed")?;

    if cli.json {
        let json = serde_json::to_string_pretty(&report).context("Failed to serialise report")?;
        println!("{json}");
    } else if !cli.quiet && !show_progress {
        print_summary(&report);
    }

    if !report.is_success() {
        std::process::exit(EXIT_PARTIAL_FAILURE);
    }
    Ok(())
}

/// Map CLI args to a `BatchRequest`. Flags not given stay out of the
/// supplied layer so lower layers can still apply.
fn build_request(cli: &Cli) -> BatchRequest {
    let supplied = OverrideBlock {
        size: cli.size.map(svg_batch_export::SizeOverride::Fixed),
        format: cli.format.clone(),
        drawing_only: cli.drawing_only,
    };

    let mut request = BatchRequest::new(&cli.src_dir, &cli.out_dir).supplied(supplied);
    if let Some(ref rules) = cli.rules {
        request = request.rules(rules);
    }
    request
}

/// Map CLI args to `ExportConfig`.
fn build_config(cli: &Cli, progress: Option<ProgressCallback>) -> Result<ExportConfig> {
    let mut builder = ExportConfig::builder()
        .concurrency(usize::try_from(cli.concurrency).context("--concurrency is too large")?)
        .renderer_timeout_secs(cli.timeout);

    if let Some(ref path) = cli.inkscape {
        builder = builder.renderer_path(path);
    }
    if let Some(dialect) = cli.dialect.dialect() {
        builder = builder.dialect(dialect);
    }
    if let Some(cb) = progress {
        builder = builder.progress_callback(cb);
    }

    builder.build().context("Invalid configuration")
}

/// Plain-text report used when the progress bar is off.
fn print_summary(report: &BatchReport) {
    for file in &report.files {
        match &file.error {
            None => eprintln!("{} → {}", file.stem, file.output.display()),
            Some(e) => eprintln!("{}: {}", file.stem, e),
        }
    }
    eprintln!(
        "Exported {}/{} drawings in {}ms",
        report.stats.converted, report.stats.total_files, report.stats.total_duration_ms
    );
    if report.stats.failed > 0 {
        eprintln!("  {} drawings failed", report.stats.failed);
    }
}

/// `--size`: exactly two comma-separated positive integers.
fn parse_size(s: &str) -> std::result::Result<Size, String> {
    s.parse::<Size>()
        .map_err(|e| format!("{e} (expected W,H such as 300,300)"))
}

/// `--format`: surrounding whitespace trimmed, must not be empty.
fn parse_format(s: &str) -> std::result::Result<String, String> {
    let format = s.trim();
    if format.is_empty() {
        return Err("format must not be empty".to_string());
    }
    Ok(format.to_string())
}

/// `--drawing_only`: yes, y, no or n in any case.
fn parse_yes_no(s: &str) -> std::result::Result<bool, String> {
    match s.to_ascii_lowercase().as_str() {
        "yes" | "y" => Ok(true),
        "no" | "n" => Ok(false),
        _ => Err(format!("expected yes, y, no or n, got '{s}'")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_yes_no_accepts_four_tokens_any_case() {
        for (s, expected) in [("yes", true), ("Y", true), ("NO", false), ("n", false)] {
            assert_eq!(parse_yes_no(s), Ok(expected), "{s}");
        }
        assert!(parse_yes_no("true").is_err());
        assert!(parse_yes_no("").is_err());
    }

    #[test]
    fn parse_size_is_strict() {
        assert_eq!(parse_size("400,300").unwrap(), Size::new(400, 300).unwrap());
        for bad in ["400", "400,300,2", "400, 300", "0,10", "a,b"] {
            assert!(parse_size(bad).is_err(), "{bad}");
        }
    }

    #[test]
    fn parse_format_trims_and_rejects_blank() {
        assert_eq!(parse_format(" png ").unwrap(), "png");
        assert_eq!(parse_format("GIF").unwrap(), "GIF");
        assert!(parse_format("").is_err());
        assert!(parse_format("   ").is_err());
    }

    #[test]
    fn malformed_flags_are_argument_errors() {
        let err = Cli::try_parse_from(["svg-batch-export", "in", "out", "--size", "300"]).unwrap_err();
        assert_eq!(err.exit_code(), 2);
        let err = Cli::try_parse_from(["svg-batch-export", "in", "out", "--drawing_only", "maybe"])
            .unwrap_err();
        assert_eq!(err.exit_code(), 2);
        let err = Cli::try_parse_from(["svg-batch-export", "in", "out", "--format", ""]).unwrap_err();
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn absent_flags_leave_supplied_layer_empty() {
        let cli = Cli::try_parse_from(["svg-batch-export", "in", "out"]).unwrap();
        let request = build_request(&cli);
        assert!(request.supplied.is_empty());
        assert!(request.rules.is_none());
    }

    #[test]
    fn flags_fill_supplied_layer() {
        let cli = Cli::try_parse_from([
            "svg-batch-export",
            "in",
            "out",
            "--format",
            " bmp",
            "--size",
            "400,400",
            "--drawing-only",
            "n",
            "--rules",
            "rules.json",
        ])
        .unwrap();
        let request = build_request(&cli);
        assert_eq!(request.supplied.format.as_deref(), Some("bmp"));
        assert_eq!(request.supplied.drawing_only, Some(false));
        assert_eq!(
            request.supplied.size,
            Some(svg_batch_export::SizeOverride::Fixed(Size::new(400, 400).unwrap()))
        );
        assert_eq!(request.rules, Some(PathBuf::from("rules.json")));
    }
}
