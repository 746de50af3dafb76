//! # inkscape-locate
//!
//! Find a usable [Inkscape](https://inkscape.org/) executable without asking
//! the user for a path.
//!
//! ## How it works
//!
//! On first call to [`locate_inkscape`]:
//!
//! 1. Checks `INKSCAPE_PATH`; if it points at an existing file, that wins.
//! 2. Walks the well-known install locations for the current OS.
//! 3. Falls back to every `inkscape` (or `inkscape.exe`) on `PATH`.
//!
//! The result is cached for the rest of the process.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use inkscape_locate::{locate_inkscape, verify_executable};
//!
//! // Option A: auto-detect
//! let path = locate_inkscape().expect("Inkscape not installed");
//!
//! // Option B: check a user-supplied path
//! let path = verify_executable("/opt/inkscape/bin/inkscape").expect("bad path");
//! ```
//!
//! ## Search locations
//!
//! | OS      | Candidates |
//! |---------|------------|
//! | Windows | `%ProgramFiles%\Inkscape\bin\inkscape.exe`, `%ProgramFiles%\Inkscape\inkscape.exe`, and the `(x86)` variants |
//! | macOS   | `/Applications/Inkscape.app/Contents/MacOS/inkscape`, `…/Contents/Resources/bin/inkscape-bin`, and the same under `~/Applications` |
//! | Linux   | `/usr/bin/inkscape`, `/usr/local/bin/inkscape`, `/snap/bin/inkscape` |
//!
//! ## Environment variable overrides
//!
//! - `INKSCAPE_PATH` — path to an Inkscape executable; skips the search.

use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use thiserror::Error;

// ── Public constants ─────────────────────────────────────────────────────────

/// Environment variable consulted before any platform search.
pub const INKSCAPE_PATH_ENV: &str = "INKSCAPE_PATH";

// ── Error type ───────────────────────────────────────────────────────────────

/// Errors returned by inkscape-locate operations.
#[derive(Error, Debug)]
pub enum LocateError {
    /// No candidate location held an Inkscape executable.
    #[error("No Inkscape installation found (searched {} locations)", searched.len())]
    NotFound { searched: Vec<PathBuf> },

    /// An explicitly supplied path does not point at a file.
    #[error("'{path}' is not a valid Inkscape executable path")]
    NotAFile { path: PathBuf },
}

// ── Candidate locations ──────────────────────────────────────────────────────

/// Builds the ordered list of candidate executables for `os`.
///
/// `os` takes the values of [`std::env::consts::OS`]. `home` is the user's
/// home directory and `path_var` the raw `PATH` value; both are optional so
/// the list can be computed in tests without touching the real environment.
pub fn candidate_paths(os: &str, home: Option<&Path>, path_var: Option<&OsStr>) -> Vec<PathBuf> {
    let mut candidates = Vec::new();

    match os {
        "windows" => {
            for root in [r"C:\Program Files", r"C:\Program Files (x86)"] {
                let base = Path::new(root).join("Inkscape");
                candidates.push(base.join("bin").join("inkscape.exe"));
                candidates.push(base.join("inkscape.exe"));
            }
        }
        "macos" => {
            let app = Path::new("/Applications/Inkscape.app/Contents");
            candidates.push(app.join("MacOS/inkscape"));
            candidates.push(app.join("Resources/bin/inkscape-bin"));
            if let Some(home) = home {
                let user_app = home.join("Applications/Inkscape.app/Contents");
                candidates.push(user_app.join("MacOS/inkscape"));
                candidates.push(user_app.join("Resources/bin/inkscape-bin"));
            }
        }
        _ => {
            candidates.push(PathBuf::from("/usr/bin/inkscape"));
            candidates.push(PathBuf::from("/usr/local/bin/inkscape"));
            candidates.push(PathBuf::from("/snap/bin/inkscape"));
        }
    }

    if let Some(path_var) = path_var {
        let exe = if os == "windows" {
            "inkscape.exe"
        } else {
            "inkscape"
        };
        for dir in std::env::split_paths(path_var) {
            let candidate = dir.join(exe);
            if !candidates.contains(&candidate) {
                candidates.push(candidate);
            }
        }
    }

    candidates
}

// ── Thread-safe singleton path cache ─────────────────────────────────────────

static RESOLVED_PATH: OnceLock<PathBuf> = OnceLock::new();

// ── Public API ───────────────────────────────────────────────────────────────

/// Returns the path to an Inkscape executable for the current platform.
///
/// - If `INKSCAPE_PATH` is set (and the file exists), that path is used.
/// - Otherwise the platform locations from [`candidate_paths`] are checked
///   in order, followed by `PATH`.
///
/// # Thread safety
///
/// Safe to call from multiple threads simultaneously; the search happens at
/// most a handful of times per process and the first result is kept.
pub fn locate_inkscape() -> Result<PathBuf, LocateError> {
    // Fast path: already resolved in this process.
    if let Some(path) = RESOLVED_PATH.get() {
        return Ok(path.clone());
    }

    let path = search()?;

    // Best-effort cache in the OnceLock (ignore race; both will succeed).
    let _ = RESOLVED_PATH.set(path.clone());

    Ok(path)
}

/// Checks that `path` points at an existing file and returns it.
///
/// Does not interact with the search or the cache.
pub fn verify_executable(path: impl AsRef<Path>) -> Result<PathBuf, LocateError> {
    let path = path.as_ref();
    if path.is_file() {
        Ok(path.to_path_buf())
    } else {
        Err(LocateError::NotAFile {
            path: path.to_path_buf(),
        })
    }
}

// ── Internal helpers ─────────────────────────────────────────────────────────

fn search() -> Result<PathBuf, LocateError> {
    // 1. Environment variable override.
    if let Some(env_path) = std::env::var_os(INKSCAPE_PATH_ENV) {
        let p = PathBuf::from(env_path);
        if p.is_file() {
            return Ok(p);
        }
        // Fall through: env var set but file missing → still search.
        eprintln!(
            "inkscape-locate: {} '{}' not found; searching default locations …",
            INKSCAPE_PATH_ENV,
            p.display()
        );
    }

    // 2. Platform locations, then PATH.
    let home = dirs::home_dir();
    let path_var = std::env::var_os("PATH");
    let candidates = candidate_paths(
        std::env::consts::OS,
        home.as_deref(),
        path_var.as_deref(),
    );

    first_existing(&candidates).ok_or(LocateError::NotFound {
        searched: candidates,
    })
}

fn first_existing(candidates: &[PathBuf]) -> Option<PathBuf> {
    candidates.iter().find(|p| p.is_file()).cloned()
}

// ── Tests ─────────────────────────────────────────────────────────────────────
