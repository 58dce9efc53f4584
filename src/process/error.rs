// ABOUTME: Process execution error types with SNAFU pattern.
// ABOUTME: Separates failure to launch a program from failure to read its output.

use snafu::Snafu;

/// Failure to execute a program at all. A non-zero exit is not an error here.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum ProcessError {
    #[snafu(display("failed to start {program}: {source}"))]
    Spawn {
        program: String,
        source: std::io::Error,
    },

    #[snafu(display("failed to read output of {program}: {source}"))]
    Io {
        program: String,
        source: std::io::Error,
    },
}

/// Error kind for programmatic handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessErrorKind {
    /// The executable could not be launched (missing binary, bad cwd).
    Spawn,
    /// The process started but its pipes or exit status could not be read.
    Io,
}

impl ProcessError {
    pub fn kind(&self) -> ProcessErrorKind {
        match self {
            ProcessError::Spawn { .. } => ProcessErrorKind::Spawn,
            ProcessError::Io { .. } => ProcessErrorKind::Io,
        }
    }

    pub fn program(&self) -> &str {
        match self {
            ProcessError::Spawn { program, .. } | ProcessError::Io { program, .. } => program,
        }
    }
}
