//! Replays a captured command inside the live shell session.
//!
//! An alias must behave exactly like typing its command again: variable
//! assignments and directory changes have to land in the user's session,
//! not in a child process, and the replay must not show up in history.
//! The host exposes that capability as a [`LiveContext`]; this module only
//! builds the source line and decides which failures are fatal.

use std::io::Write;
use thiserror::Error;
use tracing::{debug, error, info};

/// Why the host could not run a line.
#[derive(Debug, Error)]
pub enum ExecError {
    /// The parser wants more input; retried once with a trailing newline.
    #[error("incomplete input")]
    Incomplete,

    /// An error the host already knows how to describe.
    #[error("{0}")]
    Runtime(String),

    #[error("interrupted")]
    Interrupted,

    #[error("exit requested with status {0}")]
    Exit(i32),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Failures that must reach the host instead of being reported here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum Fatal {
    #[error("interrupted")]
    Interrupted,

    #[error("exit requested with status {0}")]
    Exit(i32),
}

/// Trait for the host's live execution context.
///
/// This abstraction enables testing without a real shell behind it.
pub trait LiveContext {
    /// The host's normalization of a typed command line.
    fn transform(&self, line: &str) -> String;

    /// Runs `source` against the session's current bindings and working
    /// directory without adding it to history.
    fn execute(&mut self, source: &str) -> Result<(), ExecError>;

    /// Brings the shell's idea of the working directory back in line with
    /// the process's.
    fn fix_cwd(&mut self);
}

/// Builds the line an alias replays: the captured command, then the
/// invocation arguments, normalized by the host.
pub fn build_line(context: &dyn LiveContext, command: &str, args: &[String]) -> String {
    let mut line = command.trim().to_string();
    if !args.is_empty() {
        line.push(' ');
        line.push_str(args.join(" ").trim());
    }
    context.transform(&format!("{line}\n")).trim().to_string()
}

/// Replays `command` with `args` in `context`.
///
/// Errors from the replayed command are written to `stderr` and swallowed,
/// like any command typed at the prompt. The working directory is resynced
/// afterwards whatever happened.
///
/// # Errors
///
/// Returns [`Fatal`] only for interrupts and exit requests, which belong to
/// the host.
pub fn invoke(
    context: &mut dyn LiveContext,
    command: &str,
    args: &[String],
    stderr: &mut dyn Write,
) -> Result<(), Fatal> {
    let line = build_line(context, command, args);
    info!("Replaying: {}", line);

    let outcome = execute_line(context, &line);
    context.fix_cwd();

    match outcome {
        Ok(()) => Ok(()),
        Err(ExecError::Interrupted) => Err(Fatal::Interrupted),
        Err(ExecError::Exit(code)) => Err(Fatal::Exit(code)),
        Err(ExecError::Runtime(message)) => {
            let _ = writeln!(stderr, "{}", message);
            Ok(())
        }
        Err(ExecError::Incomplete) => {
            let _ = writeln!(stderr, "{}: incomplete input", line);
            Ok(())
        }
        Err(ExecError::Other(e)) => {
            error!("Replay of '{}' failed: {:#}", line, e);
            let _ = writeln!(stderr, "Error: {:?}", e);
            Ok(())
        }
    }
}

fn execute_line(context: &mut dyn LiveContext, line: &str) -> Result<(), ExecError> {
    match context.execute(line) {
        Err(ExecError::Incomplete) => {
            debug!("Incomplete input, retrying with a trailing newline");
            context.execute(&format!("{line}\n"))
        }
        other => other,
    }
}
