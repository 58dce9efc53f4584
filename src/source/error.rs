// ABOUTME: Error types for repository validation and synchronization.
// ABOUTME: Each variant maps to one user-visible failure kind of the sync stage.

use crate::types::RepoRefError;

/// Errors from validating or synchronizing a repository.
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    /// URL is malformed or not hosted on GitHub.
    #[error("invalid repository reference: {0}")]
    InvalidReference(#[from] RepoRefError),

    /// The provider reports no such repository.
    #[error("repository {0} does not exist")]
    NotFound(String),

    /// The repository exists but is private.
    #[error("repository {0} is private; only public repositories are supported")]
    AccessDenied(String),

    /// Metadata could not be fetched (network, timeout, unexpected status).
    #[error("repository metadata unavailable: {0}")]
    UpstreamUnavailable(String),

    /// `git clone` or `git pull` failed.
    #[error("repository sync failed: {diagnostic}")]
    SyncFailed { diagnostic: String },
}

/// Error kind for programmatic handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceErrorKind {
    InvalidReference,
    NotFound,
    AccessDenied,
    UpstreamUnavailable,
    SyncFailed,
}

impl SourceError {
    pub fn kind(&self) -> SourceErrorKind {
        match self {
            SourceError::InvalidReference(_) => SourceErrorKind::InvalidReference,
            SourceError::NotFound(_) => SourceErrorKind::NotFound,
            SourceError::AccessDenied(_) => SourceErrorKind::AccessDenied,
            SourceError::UpstreamUnavailable(_) => SourceErrorKind::UpstreamUnavailable,
            SourceError::SyncFailed { .. } => SourceErrorKind::SyncFailed,
        }
    }

    pub(crate) fn sync_failed(diagnostic: impl Into<String>) -> Self {
        SourceError::SyncFailed {
            diagnostic: diagnostic.into(),
        }
    }
}
