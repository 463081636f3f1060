//! Executing external commands for the `run` builtin.
//!
//! Scripts never spawn processes themselves; `run(...)` forwards a [`CommandRequest`] to a [`CommandRunner`]. The
//! host implementation is [`HostRunner`]; tests substitute scripted runners.

mod host;

use std::path::PathBuf;

pub use host::HostRunner;

/// Whether a command may write to the filesystem.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Isolation {
    ReadOnly,
    ReadWrite,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandRequest {
    /// Program followed by its arguments.
    pub args: Vec<String>,
    /// Working directory; empty means `/`.
    pub dir: PathBuf,
    pub isolation: Isolation,
}

/// Captured result of a finished command. A non-zero `exit_code` is a result, not an error.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CommandOutput {
    pub stdout: String,
    pub stderr: String,
    pub exit_code: i32,
}

#[derive(Debug, thiserror::Error)]
pub enum RunError {
    #[error("run: no command given")]
    EmptyCommand,

    #[error("run: cannot start {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("run: {program} did not finish within {secs}s")]
    Timeout { program: String, secs: u64 },

    #[error("run: cannot start the process runtime: {0}")]
    Runtime(#[source] std::io::Error),

    #[error("run: {0}")]
    Io(#[from] std::io::Error),
}

/// Executes commands on behalf of scripts.
///
/// One runner serves a single evaluation; [`close`](CommandRunner::close) is called when the evaluation ends,
/// whether it succeeded or not.
pub trait CommandRunner {
    fn run(&mut self, request: &CommandRequest) -> Result<CommandOutput, RunError>;

    /// Release whatever the runner holds. Runners may be reused after closing.
    fn close(&mut self) -> Result<(), RunError> {
        Ok(())
    }
}

impl<R: CommandRunner + ?Sized> CommandRunner for &mut R {
    fn run(&mut self, request: &CommandRequest) -> Result<CommandOutput, RunError> {
        (**self).run(request)
    }

    fn close(&mut self) -> Result<(), RunError> {
        (**self).close()
    }
}
