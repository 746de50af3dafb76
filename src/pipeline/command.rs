//! Inkscape command lines.
//!
//! Inkscape changed its command-line interface in 1.0. Both shapes are built
//! from the same table; only the input and export switches differ:
//!
//! ```text
//! Legacy (0.9x):  inkscape -f in.svg --export-area-drawing --export-png=out.png -w 64 -h 64
//! Modern (1.x):   inkscape in.svg --export-area-drawing --export-type=png --export-filename=out.png -w 64 -h 64
//! ```

use crate::format::NativeFormat;
use crate::settings::Size;
use serde::{Deserialize, Serialize};
use std::ffi::{OsStr, OsString};
use std::fmt;
use std::path::{Path, PathBuf};

/// Which Inkscape command-line interface to speak.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Dialect {
    /// Inkscape 0.92 and earlier: `-f` input, `--export-png=…` style switches.
    Legacy,
    /// Inkscape 1.x: positional input, `--export-type` + `--export-filename`.
    Modern,
}

impl Dialect {
    /// Pick the dialect from `inkscape --version` output.
    ///
    /// Expects a line such as `Inkscape 1.3.2 (091e20e, 2023-11-25)`.
    /// Returns `None` when no version number can be found.
    pub fn from_version_output(output: &str) -> Option<Dialect> {
        let rest = output
            .lines()
            .find_map(|line| line.trim().strip_prefix("Inkscape "))?;
        let major: u32 = rest
            .split(|c: char| c == '.' || c.is_whitespace())
            .next()?
            .parse()
            .ok()?;
        Some(if major >= 1 {
            Dialect::Modern
        } else {
            Dialect::Legacy
        })
    }
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Dialect::Legacy => f.write_str("legacy"),
            Dialect::Modern => f.write_str("modern"),
        }
    }
}

/// A fully built renderer invocation: program plus arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RendererCommand {
    program: PathBuf,
    args: Vec<OsString>,
}

impl RendererCommand {
    pub fn program(&self) -> &Path {
        &self.program
    }

    pub fn args(&self) -> &[OsString] {
        &self.args
    }

    /// Arguments as UTF-8 (lossy), for logs and assertions.
    pub fn args_lossy(&self) -> Vec<String> {
        self.args
            .iter()
            .map(|a| a.to_string_lossy().into_owned())
            .collect()
    }

    /// `inkscape --version`, used to probe the dialect.
    pub fn version(program: &Path) -> Self {
        Self {
            program: program.to_path_buf(),
            args: vec![OsString::from("--version")],
        }
    }

    /// Export `input` to `output` as `format`.
    ///
    /// `size` is emitted only when `format` accepts one; callers may pass it
    /// unconditionally.
    pub fn export(
        program: &Path,
        dialect: Dialect,
        input: &Path,
        output: &Path,
        format: NativeFormat,
        drawing_only: bool,
        size: Option<Size>,
    ) -> Self {
        let mut args: Vec<OsString> = Vec::new();

        match dialect {
            Dialect::Legacy => {
                args.push("-f".into());
                args.push(input.into());
            }
            Dialect::Modern => args.push(input.into()),
        }

        args.push(crop_flag(drawing_only).into());

        match dialect {
            Dialect::Legacy => args.push(joined(format.legacy_flag(), output.as_os_str())),
            Dialect::Modern => {
                args.push(format!("--export-type={}", format.extension()).into());
                args.push(joined("--export-filename", output.as_os_str()));
            }
        }

        if let Some(size) = size.filter(|_| format.accepts_size()) {
            args.push("-w".into());
            args.push(size.width.to_string().into());
            args.push("-h".into());
            args.push(size.height.to_string().into());
        }

        Self {
            program: program.to_path_buf(),
            args,
        }
    }
}

impl fmt::Display for RendererCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program.display())?;
        for arg in &self.args {
            write!(f, " {}", arg.to_string_lossy())?;
        }
        Ok(())
    }
}

fn crop_flag(drawing_only: bool) -> &'static str {
    if drawing_only {
        "--export-area-drawing"
    } else {
        "--export-area-page"
    }
}

/// `--flag=value` without forcing `value` through UTF-8.
fn joined(flag: &str, value: &OsStr) -> OsString {
    let mut arg = OsString::from(flag);
    arg.push("=");
    arg.push(value);
    arg
}
