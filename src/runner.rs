//! Subprocess execution for the renderer.
//!
//! [`ProcessRunner`] is the seam between conversion logic and the operating
//! system: the router only ever hands it a [`RendererCommand`] and reads back
//! a [`ProcessOutput`]. [`TokioProcessRunner`] is the real implementation;
//! tests substitute a scripted runner that writes images itself.

use crate::error::FileError;
use crate::pipeline::command::RendererCommand;
use std::future::Future;
use std::process::Stdio;
use std::time::Duration;
use tracing::debug;

/// What a finished renderer process reported.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProcessOutput {
    pub success: bool,
    /// Exit code; `None` when the process was terminated by a signal.
    pub code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl From<std::process::Output> for ProcessOutput {
    fn from(output: std::process::Output) -> Self {
        Self {
            success: output.status.success(),
            code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        }
    }
}

/// Runs a renderer command to completion.
///
/// Implementations must be `Send + Sync`: one runner is shared by every
/// conversion in a batch, including concurrent ones.
pub trait ProcessRunner: Send + Sync {
    /// Run `command`, giving up after `timeout`.
    ///
    /// A non-zero exit is *not* an error here; it is reported through
    /// [`ProcessOutput::success`]. Errors are reserved for a process that
    /// could not be started ([`FileError::RendererSpawn`]) or did not finish
    /// in time ([`FileError::RendererTimeout`]).
    fn run(
        &self,
        command: &RendererCommand,
        timeout: Duration,
    ) -> impl Future<Output = Result<ProcessOutput, FileError>> + Send;
}

/// Runs commands with [`tokio::process::Command`].
///
/// stdin is closed, stdout and stderr are captured. A process that outlives
/// its timeout is killed.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioProcessRunner;

impl ProcessRunner for TokioProcessRunner {
    async fn run(
        &self,
        command: &RendererCommand,
        timeout: Duration,
    ) -> Result<ProcessOutput, FileError> {
        debug!("Running: {}", command);

        let child = tokio::process::Command::new(command.program())
            .args(command.args())
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| FileError::RendererSpawn {
                detail: format!("{}: {e}", command.program().display()),
            })?;

        // Dropping the wait future on timeout drops the child, which kills it.
        match tokio::time::timeout(timeout, child.wait_with_output()).await {
            Ok(Ok(output)) => Ok(ProcessOutput::from(output)),
            Ok(Err(e)) => Err(FileError::RendererSpawn {
                detail: format!("waiting for {}: {e}", command.program().display()),
            }),
            Err(_) => Err(FileError::RendererTimeout {
                secs: timeout.as_secs(),
            }),
        }
    }
}

/// First `max_chars` characters of `stderr`, trimmed, with an ellipsis when cut.
pub fn stderr_excerpt(stderr: &str, max_chars: usize) -> String {
    let trimmed = stderr.trim();
    if trimmed.chars().count() <= max_chars {
        return trimmed.to_string();
    }
    let mut excerpt: String = trimmed.chars().take(max_chars).collect();
    excerpt.push('\u{2026}');
    excerpt
}
