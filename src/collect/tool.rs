//! External build-tool invocation
//!
//! Collectors never spawn processes directly; they go through
//! [`CommandRunner`] so tests can substitute canned output.

use crate::error::CollectError;
#[cfg(test)]
use mockall::automock;
use std::path::Path;
use std::process::Command;
use tracing::debug;

/// Captured output of one build-tool run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    pub success: bool,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    pub fn success(stdout: impl Into<String>) -> Self {
        Self {
            success: true,
            stdout: stdout.into(),
            stderr: String::new(),
        }
    }

    pub fn failure(stderr: impl Into<String>) -> Self {
        Self {
            success: false,
            stdout: String::new(),
            stderr: stderr.into(),
        }
    }
}

/// Runs a build tool inside a project directory
#[cfg_attr(test, automock)]
pub trait CommandRunner: Send + Sync {
    /// Run `program args...` in `working_dir`
    ///
    /// Returns `Err` only when the program could not be started at all;
    /// a non-zero exit is reported through [`CommandOutput::success`].
    fn run(
        &self,
        program: &str,
        args: &[String],
        working_dir: &Path,
    ) -> Result<CommandOutput, CollectError>;
}

/// Runner that executes real commands
#[derive(Debug, Default)]
pub struct SystemCommandRunner;

impl SystemCommandRunner {
    pub fn new() -> Self {
        Self
    }
}

impl CommandRunner for SystemCommandRunner {
    fn run(
        &self,
        program: &str,
        args: &[String],
        working_dir: &Path,
    ) -> Result<CommandOutput, CollectError> {
        let command_line = display_command(program, args);
        debug!("Running `{}` in {}", command_line, working_dir.display());

        let output = Command::new(program)
            .args(args)
            .current_dir(working_dir)
            .output()
            .map_err(|e| CollectError::CommandFailed {
                command: command_line.clone(),
                message: e.to_string(),
            })?;

        Ok(CommandOutput {
            success: output.status.success(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}

/// `program arg1 arg2` for log and error messages
pub fn display_command(program: &str, args: &[String]) -> String {
    std::iter::once(program)
        .chain(args.iter().map(String::as_str))
        .collect::<Vec<_>>()
        .join(" ")
}

/// First non-empty stderr line, for concise failure messages
pub(crate) fn first_error_line(output: &CommandOutput) -> String {
    output
        .stderr
        .lines()
        .map(str::trim)
        .find(|line| !line.is_empty())
        .unwrap_or("exited with a non-zero status")
        .to_string()
}
