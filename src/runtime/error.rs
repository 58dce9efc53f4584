// ABOUTME: Error types for container engine invocations.
// ABOUTME: Distinguishes an engine that could not be launched from one that refused.

use crate::process::ProcessError;

/// Errors from running a container engine command.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// The engine executable could not be run.
    #[error(transparent)]
    Process(#[from] ProcessError),

    /// The engine ran and exited non-zero.
    #[error("`{command}` exited with code {exit_code}: {diagnostic}")]
    CommandFailed {
        command: String,
        exit_code: i32,
        diagnostic: String,
    },
}

/// Error kind for programmatic handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineErrorKind {
    Unavailable,
    CommandFailed,
}

impl EngineError {
    pub fn kind(&self) -> EngineErrorKind {
        match self {
            EngineError::Process(_) => EngineErrorKind::Unavailable,
            EngineError::CommandFailed { .. } => EngineErrorKind::CommandFailed,
        }
    }

    /// Engine-provided text explaining the failure.
    pub fn diagnostic(&self) -> String {
        match self {
            EngineError::Process(e) => e.to_string(),
            EngineError::CommandFailed { diagnostic, .. } => diagnostic.clone(),
        }
    }
}
