//! Conversion routing: one drawing, one output file.
//!
//! ## Native vs. relay
//!
//! Inkscape writes PNG, PDF, PS and EPS itself, so those formats are a single
//! subprocess call straight to the output path. Everything else the `image`
//! crate can encode goes through a relay: Inkscape renders a PNG into the
//! batch scratch directory, the PNG is decoded and re-encoded to the output,
//! and the PNG is deleted.
//!
//! ## Intermediate files
//!
//! Each relay conversion gets its own uniquely named PNG from
//! [`tempfile::Builder`], so concurrent conversions never overwrite each
//! other's intermediates. The file is held as a [`tempfile::TempPath`], which
//! deletes it on drop: every exit path, including `?` and panics, cleans up.

use crate::error::FileError;
use crate::format::{classify, ConversionRoute, FormatClass, NativeFormat, RelayFormat};
use crate::pipeline::command::{Dialect, RendererCommand};
use crate::pipeline::relay;
use crate::runner::{stderr_excerpt, ProcessOutput, ProcessRunner};
use crate::settings::Settings;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, warn};

/// Longest stderr excerpt kept in a [`FileError::RendererFailed`].
const STDERR_EXCERPT_CHARS: usize = 400;

/// Everything needed to convert files with one renderer.
///
/// Cheap to construct; borrowed state only. Shared by reference across every
/// conversion of a batch.
pub struct Router<'a, R: ProcessRunner> {
    pub runner: &'a R,
    pub renderer: &'a Path,
    pub dialect: Dialect,
    pub timeout: Duration,
    /// Where relay intermediates are created.
    pub scratch_dir: &'a Path,
}

impl<R: ProcessRunner> Router<'_, R> {
    /// Convert `input` to `output` with `settings`.
    ///
    /// Returns the route taken. Never touches `output` for an unsupported
    /// format.
    pub async fn convert(
        &self,
        input: &Path,
        output: &Path,
        settings: &Settings,
    ) -> Result<ConversionRoute, FileError> {
        match classify(&settings.format) {
            FormatClass::Unsupported => Err(FileError::UnsupportedFormat {
                format: settings.format.clone(),
            }),
            FormatClass::Native(format) => {
                self.convert_native(input, output, format, settings).await?;
                Ok(ConversionRoute::Native)
            }
            FormatClass::Relay(format) => {
                self.convert_relay(input, output, format, settings).await?;
                Ok(ConversionRoute::Relay)
            }
        }
    }

    async fn convert_native(
        &self,
        input: &Path,
        output: &Path,
        format: NativeFormat,
        settings: &Settings,
    ) -> Result<(), FileError> {
        let command = RendererCommand::export(
            self.renderer,
            self.dialect,
            input,
            output,
            format,
            settings.drawing_only,
            settings.size,
        );
        remove_stale(output)?;
        self.render(&command, output).await
    }

    async fn convert_relay(
        &self,
        input: &Path,
        output: &Path,
        format: RelayFormat,
        settings: &Settings,
    ) -> Result<(), FileError> {
        let intermediate = tempfile::Builder::new()
            .prefix("intermediate-")
            .suffix(".png")
            .tempfile_in(self.scratch_dir)
            .map_err(|e| FileError::RelayIo {
                path: self.scratch_dir.to_path_buf(),
                detail: format!("cannot create intermediate file: {e}"),
            })?
            .into_temp_path();

        let command = RendererCommand::export(
            self.renderer,
            self.dialect,
            input,
            &intermediate,
            NativeFormat::Png,
            settings.drawing_only,
            settings.size,
        );

        let result = match self.render(&command, &intermediate).await {
            Ok(()) => transcode_blocking(intermediate.to_path_buf(), output.to_path_buf(), format).await,
            Err(e) => Err(e),
        };

        let leftover = intermediate.to_path_buf();
        if let Err(e) = intermediate.close() {
            warn!("Failed to remove intermediate {}: {}", leftover.display(), e);
        }

        result
    }

    /// Run `command` and require both a zero exit and a file at `expected`.
    async fn render(&self, command: &RendererCommand, expected: &Path) -> Result<(), FileError> {
        let output: ProcessOutput = self.runner.run(command, self.timeout).await?;

        if !output.success {
            return Err(FileError::RendererFailed {
                code: output.code,
                stderr: stderr_excerpt(&output.stderr, STDERR_EXCERPT_CHARS),
            });
        }

        // The intermediate exists (empty) before Inkscape runs, so a length
        // check is the only way to see whether anything was written.
        let written = std::fs::metadata(expected).is_ok_and(|m| m.len() > 0);
        if !written {
            let mut stderr = stderr_excerpt(&output.stderr, STDERR_EXCERPT_CHARS);
            if stderr.is_empty() {
                stderr = format!("no output written to {}", expected.display());
            }
            return Err(FileError::RendererFailed {
                code: output.code,
                stderr,
            });
        }

        debug!("Rendered {}", expected.display());
        Ok(())
    }
}

/// Delete a leftover `output` so the post-render check only sees fresh bytes.
fn remove_stale(output: &Path) -> Result<(), FileError> {
    match std::fs::remove_file(output) {
        Ok(()) => {
            debug!("Removed previous {}", output.display());
            Ok(())
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(FileError::OutputIo {
            path: output.to_path_buf(),
            detail: e.to_string(),
        }),
    }
}

/// Run [`relay::transcode`] on the blocking pool.
async fn transcode_blocking(
    intermediate: PathBuf,
    output: PathBuf,
    format: RelayFormat,
) -> Result<(), FileError> {
    let target = output.clone();
    tokio::task::spawn_blocking(move || relay::transcode(&intermediate, &output, format))
        .await
        .map_err(|e| FileError::RelayIo {
            path: target,
            detail: format!("transcode task panicked: {e}"),
        })?
}
