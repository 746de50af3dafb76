//! Layered settings resolution.
//!
//! Four override layers, highest precedence first:
//!
//! 1. the file's own block in the rules document
//! 2. the block supplied on the command line (same for every file)
//! 3. the rules document's `_globalrule_` block
//! 4. the built-in defaults
//!
//! Each field is taken from the first layer that defines it, independently of
//! the others, so a file can get its format from (1), its size from (2) and
//! its crop mode from (4).

use crate::error::FileError;
use crate::settings::{OverrideBlock, Settings};
use tracing::debug;

/// Merge the four layers into the settings `stem` is exported with.
///
/// Pure: borrows every block immutably and performs no I/O. Fails only when a
/// field is missing from all four layers, which cannot happen when `defaults`
/// is [`OverrideBlock::builtin_defaults`].
pub fn resolve(
    stem: &str,
    per_file: &OverrideBlock,
    supplied: &OverrideBlock,
    global: &OverrideBlock,
    defaults: &OverrideBlock,
) -> Result<Settings, FileError> {
    let layers = [per_file, supplied, global, defaults];

    let size = first_defined(&layers, |b| b.size).ok_or_else(|| unresolved("size"))?;
    let format = first_defined(&layers, |b| b.format.as_deref())
        .ok_or_else(|| unresolved("format"))?;
    let drawing_only =
        first_defined(&layers, |b| b.drawing_only).ok_or_else(|| unresolved("drawing_only"))?;

    let settings = Settings {
        size: size.as_size(),
        format: format.to_ascii_lowercase(),
        drawing_only,
    };
    debug!("{stem}: resolved {settings}");
    Ok(settings)
}

fn first_defined<'a, T>(
    layers: &[&'a OverrideBlock],
    field: impl Fn(&'a OverrideBlock) -> Option<T>,
) -> Option<T> {
    layers.iter().find_map(|&block| field(block))
}

fn unresolved(field: &str) -> FileError {
    FileError::Unresolved {
        field: field.to_string(),
    }
}
