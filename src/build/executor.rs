//! Command execution capability.
//!
//! The image pipeline only needs "run this program with these arguments";
//! where it runs (locally, over SSH) is up to the [`Executor`] implementation.

use async_trait::async_trait;
use std::process::Stdio;
use tokio::process::Command;
use tracing::debug;

use crate::error::{BuildError, Result};

/// Captured output of a finished command.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    /// Standard output.
    pub stdout: String,
    /// Standard error.
    pub stderr: String,
    /// Exit code, if the process exited normally.
    pub exit_code: Option<i32>,
}

/// Runs external commands.
///
/// Dropping the returned future cancels the command.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Executor: Send + Sync {
    /// Runs `program` with `args`, failing if it cannot start or exits non-zero.
    async fn run_command(&self, program: &str, args: &[String]) -> Result<CommandOutput>;
}

/// Runs commands on the local machine.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalExecutor;

impl LocalExecutor {
    /// Creates a new local executor.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Executor for LocalExecutor {
    async fn run_command(&self, program: &str, args: &[String]) -> Result<CommandOutput> {
        let command_line = render_command(program, args);
        debug!("Running: {command_line}");

        let output = Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| BuildError::Spawn {
                command: program.to_string(),
                message: e.to_string(),
            })?;

        let result = CommandOutput {
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            exit_code: output.status.code(),
        };

        if output.status.success() {
            Ok(result)
        } else {
            Err(BuildError::CommandFailed {
                command: command_line,
                status: output.status.to_string(),
                stderr: result.stderr.trim().to_string(),
            }
            .into())
        }
    }
}

/// Renders a command line for logs and error messages.
#[must_use]
pub fn render_command(program: &str, args: &[String]) -> String {
    std::iter::once(program)
        .chain(args.iter().map(String::as_str))
        .collect::<Vec<_>>()
        .join(" ")
}
