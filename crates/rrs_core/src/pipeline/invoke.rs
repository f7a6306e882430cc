//! External collaborator invocation.
//!
//! Stages run as `<stage-executable> <positional-args...>` with a fixed
//! per-stage argument order plus the run-correlation tag. Each child is
//! spawned into its own process group so cancellation can terminate its
//! full tree. Stdout is the collaborator's result channel (one line of
//! plain text or a JSON mapping); stderr is diagnostic-only.

use std::process::{Command, Stdio};

use crate::logging::SessionLogger;

use super::cancel::CancelToken;
use super::errors::{StageError, StageResult};

/// The cooperative-cancellation signal value.
#[cfg(unix)]
const CANCEL_SIGNAL: i32 = libc::SIGTERM;
#[cfg(not(unix))]
const CANCEL_SIGNAL: i32 = 15;

/// One collaborator invocation.
#[derive(Debug, Clone)]
pub struct StageCommand {
    program: String,
    args: Vec<String>,
}

impl StageCommand {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    /// Append a positional argument.
    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    /// Full command line for logging.
    pub fn display(&self) -> String {
        if self.args.is_empty() {
            self.program.clone()
        } else {
            format!("{} {}", self.program, self.args.join(" "))
        }
    }
}

/// Result of one collaborator invocation.
#[derive(Debug, Clone)]
pub struct StageOutput {
    /// Exit code, or -1 when the process died without one.
    pub exit_code: i32,
    /// Signal that terminated the process, when one did.
    pub term_signal: Option<i32>,
    /// Captured stdout (result channel).
    pub stdout: String,
    /// Captured stderr (diagnostics).
    pub stderr: String,
}

impl StageOutput {
    /// Whether the collaborator exited cleanly.
    pub fn success(&self) -> bool {
        self.exit_code == 0 && self.term_signal.is_none()
    }

    /// Whether the result carries the recognized cooperative-
    /// cancellation signal value, positive or negated.
    pub fn cancelled(&self) -> bool {
        self.term_signal == Some(CANCEL_SIGNAL)
            || self.exit_code == CANCEL_SIGNAL
            || self.exit_code == -CANCEL_SIGNAL
    }

    /// Parse the stdout result line as a structured JSON payload.
    pub fn payload(&self) -> Option<serde_json::Value> {
        serde_json::from_str(self.stdout.trim()).ok()
    }
}

/// Run a collaborator to completion, blocking the control thread.
///
/// The child joins a fresh process group registered with the token for
/// the duration of the call. A cancellation result is returned to the
/// caller as data; classifying it is the stage's job.
pub fn run_collaborator(
    cmd: &StageCommand,
    token: &CancelToken,
    logger: &SessionLogger,
) -> StageResult<StageOutput> {
    logger.command(&cmd.display());

    let mut command = Command::new(cmd.program());
    command
        .args(&cmd.args)
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());
    #[cfg(unix)]
    {
        use std::os::unix::process::CommandExt;
        command.process_group(0);
    }

    let child = command
        .spawn()
        .map_err(|e| StageError::io_error(format!("spawning {}", cmd.program()), e))?;
    let pgid = child.id() as i32;
    token.register_group(pgid);

    let waited = child.wait_with_output();
    token.clear_group(pgid);
    let output =
        waited.map_err(|e| StageError::io_error(format!("waiting on {}", cmd.program()), e))?;

    let exit_code = output.status.code().unwrap_or(-1);
    #[cfg(unix)]
    let term_signal = {
        use std::os::unix::process::ExitStatusExt;
        output.status.signal()
    };
    #[cfg(not(unix))]
    let term_signal = None;

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    for line in stdout.lines() {
        logger.output_line(line, false);
    }
    for line in stderr.lines() {
        logger.output_line(line, true);
    }

    Ok(StageOutput {
        exit_code,
        term_signal,
        stdout,
        stderr,
    })
}

/// Classify a collaborator result for a stage that requires success.
///
/// Cancellation becomes the sentinel error; any other non-zero exit
/// becomes a command failure with the stderr diagnostics attached.
pub fn require_success(cmd: &StageCommand, output: &StageOutput) -> StageResult<()> {
    if output.cancelled() {
        return Err(StageError::cancelled(cmd.program()));
    }
    if !output.success() {
        return Err(StageError::command_failed(
            cmd.program(),
            output.exit_code,
            output.stderr.trim().to_string(),
        ));
    }
    Ok(())
}
