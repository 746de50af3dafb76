//! Input discovery: find the drawings to export and load the rules file.
//!
//! Everything here runs before the first conversion. Any failure is fatal to
//! the batch and surfaces as an [`ExportError`], so a typo in a directory name
//! never produces a half-finished output folder.

use crate::error::ExportError;
use crate::rules::RuleStore;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// One discovered drawing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputFile {
    /// File name without extension; the join key into the rules document.
    pub stem: String,
    pub path: PathBuf,
}

/// Fail with [`ExportError::DirectoryNotFound`] unless `path` is a directory.
pub fn check_dir(path: &Path) -> Result<(), ExportError> {
    if path.is_dir() {
        Ok(())
    } else {
        Err(ExportError::DirectoryNotFound {
            path: path.to_path_buf(),
        })
    }
}

/// List the regular files in `dir` whose extension is `extension`.
///
/// The extension match ignores ASCII case (`.svg` and `.SVG` both count).
/// Results are sorted by stem so runs are reproducible, and stems are unique:
/// of `gauge.svg` and `gauge.SVG` only the exact-case match is kept. An empty
/// result is an error: there is nothing to do.
pub fn discover_inputs(dir: &Path, extension: &str) -> Result<Vec<InputFile>, ExportError> {
    let read_err = |source| ExportError::ReadDir {
        path: dir.to_path_buf(),
        source,
    };

    let mut inputs = Vec::new();
    for entry in std::fs::read_dir(dir).map_err(read_err)? {
        let path = entry.map_err(read_err)?.path();
        if !path.is_file() {
            continue;
        }
        let matches = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case(extension));
        if !matches {
            continue;
        }
        let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
            debug!("Skipping non-UTF-8 file name: {}", path.display());
            continue;
        };
        inputs.push(InputFile {
            stem: stem.to_string(),
            path,
        });
    }

    if inputs.is_empty() {
        return Err(ExportError::NoInputFiles {
            dir: dir.to_path_buf(),
            extension: extension.to_string(),
        });
    }

    // Inputs sharing a stem would write the same output file. Keep one,
    // preferring the exact-case extension.
    let exact = |f: &InputFile| f.path.extension().is_some_and(|e| e == extension);
    inputs.sort_by(|a, b| {
        a.stem
            .cmp(&b.stem)
            .then_with(|| exact(b).cmp(&exact(a)))
            .then_with(|| a.path.cmp(&b.path))
    });
    inputs.dedup_by(|dup, kept| {
        let same = dup.stem == kept.stem;
        if same {
            warn!(
                "Skipping {}: same stem as {}",
                dup.path.display(),
                kept.path.display()
            );
        }
        same
    });
    info!("{} .{} files found in {}", inputs.len(), extension, dir.display());
    Ok(inputs)
}

/// Read and validate the rules file at `path`.
pub fn read_rules(path: &Path) -> Result<RuleStore, ExportError> {
    if !path.is_file() {
        return Err(ExportError::RulesNotFound {
            path: path.to_path_buf(),
        });
    }

    let text = std::fs::read_to_string(path).map_err(|source| ExportError::RulesUnreadable {
        path: path.to_path_buf(),
        source,
    })?;

    let store = RuleStore::from_json_str(&text).map_err(|source| ExportError::InvalidRules {
        path: path.to_path_buf(),
        source,
    })?;

    debug!(
        "Loaded {} file rules from {} (global rule: {})",
        store.len(),
        path.display(),
        !store.global_block().is_empty()
    );
    Ok(store)
}
