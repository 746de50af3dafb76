//! Batch-level integration tests.
//!
//! A scripted [`ProcessRunner`] stands in for Inkscape: it parses the export
//! command, writes a real PNG (or a stub vector file) where Inkscape would,
//! and records every command it saw. Everything else (rules loading,
//! resolution, routing, relay transcoding, cleanup) is the real code.

use image::{Rgba, RgbaImage};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use svg_batch_export::pipeline::command::RendererCommand;
use svg_batch_export::{
    run_batch_with, BatchProgressCallback, BatchReport, BatchRequest, ConversionRoute, Dialect,
    ExportConfig, ExportError, FileError, FileOutcome, OverrideBlock, ProcessOutput,
    ProcessRunner, Settings, Size,
};

// ── Fake renderer ────────────────────────────────────────────────────────────

/// Natural size of every fake drawing.
const NATURAL: (u32, u32) = (20, 10);

struct FakeInkscape {
    version: &'static str,
    calls: Mutex<Vec<Vec<String>>>,
}

impl FakeInkscape {
    fn new() -> Self {
        Self::with_version("Inkscape 1.3.2 (091e20e, 2023-11-25)")
    }

    fn with_version(version: &'static str) -> Self {
        Self {
            version,
            calls: Mutex::new(Vec::new()),
        }
    }

    fn export_calls(&self) -> Vec<Vec<String>> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|args| args.as_slice() != ["--version"])
            .cloned()
            .collect()
    }

    /// The export command whose input file has this stem.
    fn call_for(&self, stem: &str) -> Vec<String> {
        self.export_calls()
            .into_iter()
            .find(|args| input_stem(args) == stem)
            .unwrap_or_else(|| panic!("no export call for {stem}"))
    }
}

fn input_stem(args: &[String]) -> String {
    let input = match args.iter().position(|a| a == "-f") {
        Some(i) => &args[i + 1],
        None => &args[0],
    };
    Path::new(input).file_stem().unwrap().to_string_lossy().into_owned()
}

fn export_target(args: &[String]) -> PathBuf {
    const PREFIXES: [&str; 5] = [
        "--export-filename=",
        "--export-png=",
        "--export-pdf=",
        "--export-ps=",
        "--export-eps=",
    ];
    args.iter()
        .find_map(|a| PREFIXES.iter().find_map(|p| a.strip_prefix(p)))
        .map(PathBuf::from)
        .expect("export target flag")
}

fn size_flags(args: &[String]) -> Option<(u32, u32)> {
    let w = args.iter().position(|a| a == "-w")?;
    let h = args.iter().position(|a| a == "-h")?;
    Some((args[w + 1].parse().unwrap(), args[h + 1].parse().unwrap()))
}

impl ProcessRunner for FakeInkscape {
    async fn run(
        &self,
        command: &RendererCommand,
        _timeout: Duration,
    ) -> Result<ProcessOutput, FileError> {
        let args = command.args_lossy();
        self.calls.lock().unwrap().push(args.clone());

        if args == ["--version"] {
            return Ok(ProcessOutput {
                success: true,
                code: Some(0),
                stdout: format!("{}\n", self.version),
                stderr: String::new(),
            });
        }

        if input_stem(&args) == "broken" {
            return Ok(ProcessOutput {
                success: false,
                code: Some(1),
                stdout: String::new(),
                stderr: "** (inkscape): CRITICAL **: Can't parse broken.svg\n".into(),
            });
        }

        let target = export_target(&args);
        if target.extension().is_some_and(|e| e == "png") {
            let (w, h) = size_flags(&args).unwrap_or(NATURAL);
            RgbaImage::from_pixel(w, h, Rgba([0, 0, 0, 0]))
                .save_with_format(&target, image::ImageFormat::Png)
                .unwrap();
        } else {
            std::fs::write(&target, b"%!PS-Adobe-3.0 fake").unwrap();
        }

        Ok(ProcessOutput {
            success: true,
            code: Some(0),
            ..Default::default()
        })
    }
}

// ── Fixtures ─────────────────────────────────────────────────────────────────

struct Workspace {
    root: tempfile::TempDir,
}

impl Workspace {
    fn new(stems: &[&str]) -> Self {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();

        let root = tempfile::tempdir().unwrap();
        std::fs::create_dir(root.path().join("src")).unwrap();
        std::fs::create_dir(root.path().join("out")).unwrap();
        std::fs::write(root.path().join("inkscape"), b"").unwrap();
        for stem in stems {
            std::fs::write(root.path().join("src").join(format!("{stem}.svg")), b"<svg/>").unwrap();
        }
        Self { root }
    }

    fn src(&self) -> PathBuf {
        self.root.path().join("src")
    }

    fn out(&self) -> PathBuf {
        self.root.path().join("out")
    }

    fn rules(&self, json: &str) -> PathBuf {
        let path = self.root.path().join("rules.json");
        std::fs::write(&path, json).unwrap();
        path
    }

    fn request(&self) -> BatchRequest {
        BatchRequest::new(self.src(), self.out())
    }

    fn config(&self) -> ExportConfig {
        ExportConfig::builder()
            .renderer_path(self.root.path().join("inkscape"))
            .dialect(Dialect::Modern)
            .build()
            .unwrap()
    }

    fn out_files(&self) -> Vec<String> {
        let mut names: Vec<String> = std::fs::read_dir(self.out())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }
}

fn outcome<'a>(report: &'a BatchReport, stem: &str) -> &'a FileOutcome {
    report
        .files
        .iter()
        .find(|f| f.stem == stem)
        .unwrap_or_else(|| panic!("no outcome for {stem}"))
}

fn settings(format: &str, size: Option<(u32, u32)>, drawing_only: bool) -> Settings {
    Settings {
        size: size.and_then(|(w, h)| Size::new(w, h)),
        format: format.into(),
        drawing_only,
    }
}

// ── Resolution examples ──────────────────────────────────────────────────────

#[tokio::test]
async fn global_size_with_per_file_format() {
    let ws = Workspace::new(&["gauge", "ink"]);
    let rules = ws.rules(r#"{"_globalrule_": {"size": [300, 300]}, "gauge": {"format": "gif"}}"#);
    let runner = FakeInkscape::new();

    let report = run_batch_with(&runner, &ws.request().rules(rules), &ws.config())
        .await
        .unwrap();

    assert!(report.is_success());
    assert_eq!(
        outcome(&report, "gauge").settings,
        Some(settings("gif", Some((300, 300)), true))
    );
    assert_eq!(
        outcome(&report, "ink").settings,
        Some(settings("png", Some((300, 300)), true))
    );

    assert_eq!(ws.out_files(), ["gauge.gif", "ink.png"]);
    assert_eq!(image::image_dimensions(ws.out().join("gauge.gif")).unwrap(), (300, 300));
    assert_eq!(image::image_dimensions(ws.out().join("ink.png")).unwrap(), (300, 300));
    assert_eq!(outcome(&report, "gauge").route, Some(ConversionRoute::Relay));
    assert_eq!(outcome(&report, "ink").route, Some(ConversionRoute::Native));
}

#[tokio::test]
async fn per_file_format_beats_cli_but_size_falls_through() {
    let ws = Workspace::new(&["gauge", "ink"]);
    let rules = ws.rules(r#"{"gauge": {"format": "jpg"}}"#);
    let supplied = OverrideBlock::default()
        .with_format("bmp")
        .with_size(Size::new(400, 400).unwrap());
    let runner = FakeInkscape::new();

    let request = ws.request().rules(rules).supplied(supplied);
    let report = run_batch_with(&runner, &request, &ws.config()).await.unwrap();

    assert_eq!(
        outcome(&report, "gauge").settings,
        Some(settings("jpg", Some((400, 400)), true))
    );
    assert_eq!(
        outcome(&report, "ink").settings,
        Some(settings("bmp", Some((400, 400)), true))
    );
    assert_eq!(ws.out_files(), ["gauge.jpg", "ink.bmp"]);
    assert_eq!(image::image_dimensions(ws.out().join("gauge.jpg")).unwrap(), (400, 400));
}

#[tokio::test]
async fn default_size_keyword_means_natural_size() {
    let ws = Workspace::new(&["gauge", "ink"]);
    let rules = ws.rules(
        r#"{"_globalrule_": {"size": [300, 300]}, "ink": {"size": "default", "drawing_only": false}}"#,
    );
    let runner = FakeInkscape::new();

    let report = run_batch_with(&runner, &ws.request().rules(rules), &ws.config())
        .await
        .unwrap();

    assert_eq!(outcome(&report, "ink").settings, Some(settings("png", None, false)));
    let ink_call = runner.call_for("ink");
    assert!(size_flags(&ink_call).is_none(), "{ink_call:?}");
    assert!(ink_call.contains(&"--export-area-page".to_string()));
    assert_eq!(image::image_dimensions(ws.out().join("ink.png")).unwrap(), NATURAL);

    // The global size still applies to files without their own rule.
    assert_eq!(size_flags(&runner.call_for("gauge")), Some((300, 300)));
}

#[tokio::test]
async fn no_rules_file_uses_builtin_defaults() {
    let ws = Workspace::new(&["gauge"]);
    let runner = FakeInkscape::new();

    let report = run_batch_with(&runner, &ws.request(), &ws.config()).await.unwrap();

    assert_eq!(outcome(&report, "gauge").settings, Some(settings("png", None, true)));
    assert!(runner.call_for("gauge").contains(&"--export-area-drawing".to_string()));
}

#[tokio::test]
async fn size_is_not_passed_for_vector_formats() {
    let ws = Workspace::new(&["gauge"]);
    let rules = ws.rules(r#"{"gauge": {"format": "PDF", "size": [50, 50]}}"#);
    let runner = FakeInkscape::new();

    let report = run_batch_with(&runner, &ws.request().rules(rules), &ws.config())
        .await
        .unwrap();

    assert!(report.is_success());
    assert_eq!(ws.out_files(), ["gauge.pdf"]);
    let call = runner.call_for("gauge");
    assert!(size_flags(&call).is_none());
    assert!(call.contains(&"--export-type=pdf".to_string()));
}

// ── Failure isolation ────────────────────────────────────────────────────────

#[tokio::test]
async fn unsupported_format_does_not_stop_the_batch() {
    let ws = Workspace::new(&["gauge", "ink", "logo"]);
    let rules = ws.rules(r#"{"ink": {"format": "xcf"}}"#);
    let runner = FakeInkscape::new();

    let report = run_batch_with(&runner, &ws.request().rules(rules), &ws.config())
        .await
        .unwrap();

    assert_eq!(
        outcome(&report, "ink").error,
        Some(FileError::UnsupportedFormat { format: "xcf".into() })
    );
    assert_eq!(ws.out_files(), ["gauge.png", "logo.png"]);
    assert_eq!((report.stats.converted, report.stats.failed), (2, 1));

    let err = report.into_result().unwrap_err();
    assert!(matches!(
        err,
        ExportError::PartialFailure { converted: 2, failed: 1, total: 3 }
    ));
}

#[tokio::test]
async fn renderer_failure_is_recorded_per_file() {
    let ws = Workspace::new(&["broken", "gauge"]);
    let rules = ws.rules(r#"{"_globalrule_": {"format": "gif"}}"#);
    let runner = FakeInkscape::new();

    let report = run_batch_with(&runner, &ws.request().rules(rules), &ws.config())
        .await
        .unwrap();

    match &outcome(&report, "broken").error {
        Some(FileError::RendererFailed { code, stderr }) => {
            assert_eq!(*code, Some(1));
            assert!(stderr.contains("Can't parse"), "{stderr}");
        }
        other => panic!("expected RendererFailed, got {other:?}"),
    }
    assert!(outcome(&report, "gauge").is_success());
    assert_eq!(ws.out_files(), ["gauge.gif"]);
}

#[tokio::test]
async fn relay_intermediates_are_removed() {
    let ws = Workspace::new(&["broken", "gauge", "ink", "logo"]);
    let rules = ws.rules(
        r#"{"_globalrule_": {"format": "jpeg"}, "ink": {"format": "tiff"}, "logo": {"format": "webp"}}"#,
    );
    let runner = FakeInkscape::new();

    let report = run_batch_with(&runner, &ws.request().rules(rules), &ws.config())
        .await
        .unwrap();
    assert_eq!(report.stats.converted, 3);

    for call in runner.export_calls() {
        let intermediate = export_target(&call);
        assert!(!intermediate.starts_with(ws.out()), "renderer wrote into out_dir");
        assert!(!intermediate.exists(), "left behind: {}", intermediate.display());
    }
    assert_eq!(ws.out_files(), ["gauge.jpeg", "ink.tiff", "logo.webp"]);
}

// ── Fatal pre-flight errors ──────────────────────────────────────────────────

#[tokio::test]
async fn missing_source_directory_is_fatal() {
    let ws = Workspace::new(&["gauge"]);
    let runner = FakeInkscape::new();
    let request = BatchRequest::new(ws.root.path().join("nope"), ws.out());

    let err = run_batch_with(&runner, &request, &ws.config()).await.unwrap_err();
    assert!(matches!(err, ExportError::DirectoryNotFound { .. }), "{err}");
    assert!(runner.calls.lock().unwrap().is_empty());
}

#[tokio::test]
async fn missing_output_directory_is_fatal() {
    let ws = Workspace::new(&["gauge"]);
    let request = BatchRequest::new(ws.src(), ws.root.path().join("nope"));

    let err = run_batch_with(&FakeInkscape::new(), &request, &ws.config())
        .await
        .unwrap_err();
    assert!(matches!(err, ExportError::DirectoryNotFound { .. }), "{err}");
}

#[tokio::test]
async fn bad_rules_files_are_fatal() {
    let ws = Workspace::new(&["gauge"]);
    let runner = FakeInkscape::new();

    let missing = ws.request().rules(ws.root.path().join("missing.json"));
    let err = run_batch_with(&runner, &missing, &ws.config()).await.unwrap_err();
    assert!(matches!(err, ExportError::RulesNotFound { .. }), "{err}");

    let invalid = ws.request().rules(ws.rules(r#"{"gauge": {"size": [0, 10]}}"#));
    let err = run_batch_with(&runner, &invalid, &ws.config()).await.unwrap_err();
    assert!(matches!(err, ExportError::InvalidRules { .. }), "{err}");

    assert!(runner.export_calls().is_empty());
    assert!(ws.out_files().is_empty());
}

#[tokio::test]
async fn missing_renderer_is_fatal() {
    let ws = Workspace::new(&["gauge"]);
    let config = ExportConfig::builder()
        .renderer_path(ws.root.path().join("no-inkscape"))
        .build()
        .unwrap();

    let err = run_batch_with(&FakeInkscape::new(), &ws.request(), &config)
        .await
        .unwrap_err();
    assert!(matches!(err, ExportError::RendererMissing { .. }), "{err}");
}

#[tokio::test]
async fn empty_source_directory_is_fatal() {
    let ws = Workspace::new(&[]);
    std::fs::write(ws.src().join("notes.txt"), b"").unwrap();

    let err = run_batch_with(&FakeInkscape::new(), &ws.request(), &ws.config())
        .await
        .unwrap_err();
    assert!(matches!(err, ExportError::NoInputFiles { .. }), "{err}");
}

// ── Dialect, concurrency, progress ───────────────────────────────────────────

#[tokio::test]
async fn probed_legacy_dialect_uses_legacy_flags() {
    let ws = Workspace::new(&["gauge"]);
    let runner = FakeInkscape::with_version("Inkscape 0.92.4 (5da689c313, 2019-01-14)");
    let config = ExportConfig::builder()
        .renderer_path(ws.root.path().join("inkscape"))
        .build()
        .unwrap();

    let report = run_batch_with(&runner, &ws.request(), &config).await.unwrap();

    assert_eq!(report.dialect, Dialect::Legacy);
    let call = runner.call_for("gauge");
    assert_eq!(call[0], "-f");
    assert!(call.iter().any(|a| a.starts_with("--export-png=")));
    assert_eq!(ws.out_files(), ["gauge.png"]);
}

#[tokio::test]
async fn concurrent_batch_reports_in_stem_order() {
    let stems = ["f", "e", "d", "c", "b", "a"];
    let ws = Workspace::new(&stems);
    let rules = ws.rules(r#"{"_globalrule_": {"format": "bmp"}}"#);
    let config = ExportConfig::builder()
        .renderer_path(ws.root.path().join("inkscape"))
        .dialect(Dialect::Modern)
        .concurrency(4)
        .build()
        .unwrap();

    let report = run_batch_with(&FakeInkscape::new(), &ws.request().rules(rules), &config)
        .await
        .unwrap();

    let order: Vec<&str> = report.files.iter().map(|f| f.stem.as_str()).collect();
    assert_eq!(order, ["a", "b", "c", "d", "e", "f"]);
    assert_eq!(report.stats.converted, 6);
    assert_eq!(ws.out_files().len(), 6);
}

#[derive(Default)]
struct Events {
    started_with: AtomicUsize,
    file_starts: AtomicUsize,
    completed: Mutex<Vec<String>>,
    failed: Mutex<Vec<String>>,
    finished: Mutex<Option<(usize, usize)>>,
}

impl BatchProgressCallback for Events {
    fn on_batch_start(&self, total_files: usize) {
        self.started_with.store(total_files, Ordering::SeqCst);
    }

    fn on_file_start(&self, _stem: &str, _index: usize, _total: usize) {
        self.file_starts.fetch_add(1, Ordering::SeqCst);
    }

    fn on_file_complete(&self, stem: &str, _output: &Path, _total: usize) {
        self.completed.lock().unwrap().push(stem.to_string());
    }

    fn on_file_error(&self, stem: &str, _total: usize, _error: &str) {
        self.failed.lock().unwrap().push(stem.to_string());
    }

    fn on_batch_complete(&self, total_files: usize, converted: usize) {
        *self.finished.lock().unwrap() = Some((total_files, converted));
    }
}

#[tokio::test]
async fn progress_callback_sees_every_file() {
    let ws = Workspace::new(&["broken", "gauge", "ink"]);
    let events = Arc::new(Events::default());
    let config = ExportConfig::builder()
        .renderer_path(ws.root.path().join("inkscape"))
        .dialect(Dialect::Modern)
        .progress_callback(events.clone())
        .build()
        .unwrap();

    run_batch_with(&FakeInkscape::new(), &ws.request(), &config)
        .await
        .unwrap();

    assert_eq!(events.started_with.load(Ordering::SeqCst), 3);
    assert_eq!(events.file_starts.load(Ordering::SeqCst), 3);
    assert_eq!(*events.completed.lock().unwrap(), ["gauge", "ink"]);
    assert_eq!(*events.failed.lock().unwrap(), ["broken"]);
    assert_eq!(*events.finished.lock().unwrap(), Some((3, 2)));
}
