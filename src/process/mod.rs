// ABOUTME: Scoped execution of external programs (git, docker, podman).
// ABOUTME: Each invocation returns a structured result; long runs stream lines to a sink.

mod error;
mod stream;
mod system;

pub use error::{ProcessError, ProcessErrorKind};
pub use stream::{OutputLine, OutputSink, OutputStream, StreamedOutput, TailBuffer};
pub use system::SystemRunner;

use async_trait::async_trait;
use std::fmt;
use std::path::{Path, PathBuf};

/// One external program invocation: program, arguments, and working directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    program: String,
    args: Vec<String>,
    cwd: Option<PathBuf>,
}

impl CommandSpec {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            cwd: None,
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn current_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.cwd = Some(dir.into());
        self
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    pub fn arguments(&self) -> &[String] {
        &self.args
    }

    pub fn cwd(&self) -> Option<&Path> {
        self.cwd.as_deref()
    }
}

impl fmt::Display for CommandSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.program)?;
        for arg in &self.args {
            write!(f, " {arg}")?;
        }
        Ok(())
    }
}

/// Output from a buffered command execution.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    /// Exit code, or -1 if the process was killed by a signal.
    pub exit_code: i32,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }

    /// stderr followed by stdout.
    pub fn combined_output(&self) -> String {
        match (self.stderr.trim().is_empty(), self.stdout.trim().is_empty()) {
            (false, false) => format!("{}\n{}", self.stderr.trim_end(), self.stdout.trim_end()),
            (false, true) => self.stderr.trim_end().to_string(),
            (true, _) => self.stdout.trim_end().to_string(),
        }
    }

    /// The text worth showing when the command failed.
    pub fn diagnostic(&self) -> String {
        let stderr = self.stderr.trim();
        if stderr.is_empty() {
            self.stdout.trim().to_string()
        } else {
            stderr.to_string()
        }
    }
}

/// Runs external programs.
///
/// Implementations never retry and never cancel: a call returns only once the
/// process has exited.
#[async_trait]
pub trait CommandRunner: Send + Sync {
    /// Run to completion, buffering stdout and stderr.
    async fn run(&self, command: &CommandSpec) -> Result<CommandOutput, ProcessError>;

    /// Run to completion, handing every output line to `sink` as it arrives and
    /// keeping only the last `tail_lines` lines.
    async fn run_streaming(
        &self,
        command: &CommandSpec,
        sink: &dyn OutputSink,
        tail_lines: usize,
    ) -> Result<StreamedOutput, ProcessError>;
}
