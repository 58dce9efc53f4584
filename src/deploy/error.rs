// ABOUTME: Error types for the build, run, and orchestration stages.
// ABOUTME: DeployError reports the failing stage, the failure kind, and diagnostic text.

use chrono::{DateTime, Utc};
use std::fmt;
use std::path::PathBuf;

use crate::source::{SourceError, SourceErrorKind};
use crate::store::StoreError;
use crate::types::{ApplicationId, ImageName};

/// Errors from `ImageBuilder::build`.
#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    /// The working tree has no build descriptor at its root.
    #[error("{descriptor} not found in {}", .path.display())]
    BuildDescriptorMissing { descriptor: String, path: PathBuf },

    /// A previous image or a container using it could not be removed.
    #[error("could not clear previous image: {0}")]
    ConflictCleanupFailed(String),

    /// The build ran and failed.
    #[error("image build failed: {0}")]
    BuildFailed(String),
}

/// Errors from `ContainerRunner::run`.
#[derive(Debug, thiserror::Error)]
pub enum RunError {
    #[error("image {0} does not exist")]
    ImageMissing(ImageName),

    #[error("container failed to start: {0}")]
    RunFailed(String),
}

/// Pipeline stage in which a deployment failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Sync,
    Build,
    Run,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Stage::Sync => "sync",
            Stage::Build => "build",
            Stage::Run => "run",
        })
    }
}

/// Who holds the deploy lock for an application.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LockHolderInfo {
    pub holder: String,
    pub pid: u32,
    pub started_at: DateTime<Utc>,
}

impl fmt::Display for LockHolderInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} (pid {}) since {}",
            self.holder, self.pid, self.started_at
        )
    }
}

/// Errors that end a deployment attempt.
#[derive(Debug, thiserror::Error)]
pub enum DeployError {
    /// Another attempt for the same application is in flight.
    #[error("application {id} is already being deployed by {holder}")]
    ConcurrentDeployment {
        id: ApplicationId,
        holder: LockHolderInfo,
    },

    #[error("sync failed: {0}")]
    Sync(#[from] SourceError),

    #[error("build failed: {0}")]
    Build(#[from] BuildError),

    #[error("run failed: {0}")]
    Run(#[from] RunError),

    #[error(transparent)]
    Store(#[from] StoreError),

    /// The lock file could not be created or inspected.
    #[error("deploy lock error: {0}")]
    Lock(String),
}

/// Errors from registering a new application.
#[derive(Debug, thiserror::Error)]
pub enum RegisterError {
    #[error(transparent)]
    Source(#[from] SourceError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Error kind for programmatic handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeployErrorKind {
    InvalidReference,
    NotFound,
    AccessDenied,
    UpstreamUnavailable,
    SyncFailed,
    BuildDescriptorMissing,
    ConflictCleanupFailed,
    BuildFailed,
    ImageMissing,
    RunFailed,
    ConcurrentDeploymentRejected,
    UnknownApplication,
    Store,
    Lock,
}

impl DeployError {
    pub(crate) fn lock_error(message: impl Into<String>) -> Self {
        DeployError::Lock(message.into())
    }

    /// Returns the error kind for programmatic handling.
    pub fn kind(&self) -> DeployErrorKind {
        match self {
            DeployError::ConcurrentDeployment { .. } => {
                DeployErrorKind::ConcurrentDeploymentRejected
            }
            DeployError::Sync(e) => match e.kind() {
                SourceErrorKind::InvalidReference => DeployErrorKind::InvalidReference,
                SourceErrorKind::NotFound => DeployErrorKind::NotFound,
                SourceErrorKind::AccessDenied => DeployErrorKind::AccessDenied,
                SourceErrorKind::UpstreamUnavailable => DeployErrorKind::UpstreamUnavailable,
                SourceErrorKind::SyncFailed => DeployErrorKind::SyncFailed,
            },
            DeployError::Build(e) => match e {
                BuildError::BuildDescriptorMissing { .. } => {
                    DeployErrorKind::BuildDescriptorMissing
                }
                BuildError::ConflictCleanupFailed(_) => DeployErrorKind::ConflictCleanupFailed,
                BuildError::BuildFailed(_) => DeployErrorKind::BuildFailed,
            },
            DeployError::Run(e) => match e {
                RunError::ImageMissing(_) => DeployErrorKind::ImageMissing,
                RunError::RunFailed(_) => DeployErrorKind::RunFailed,
            },
            DeployError::Store(StoreError::NotFound(_)) => DeployErrorKind::UnknownApplication,
            DeployError::Store(_) => DeployErrorKind::Store,
            DeployError::Lock(_) => DeployErrorKind::Lock,
        }
    }

    /// The pipeline stage that failed, if the failure belongs to one.
    pub fn stage(&self) -> Option<Stage> {
        match self {
            DeployError::Sync(_) => Some(Stage::Sync),
            DeployError::Build(_) => Some(Stage::Build),
            DeployError::Run(_) => Some(Stage::Run),
            _ => None,
        }
    }

    /// Raw text from git, the engine, or the provider explaining the failure.
    pub fn diagnostic(&self) -> Option<&str> {
        match self {
            DeployError::Sync(SourceError::SyncFailed { diagnostic })
            | DeployError::Sync(SourceError::UpstreamUnavailable(diagnostic))
            | DeployError::Build(BuildError::ConflictCleanupFailed(diagnostic))
            | DeployError::Build(BuildError::BuildFailed(diagnostic))
            | DeployError::Run(RunError::RunFailed(diagnostic)) => Some(diagnostic.as_str()),
            _ => None,
        }
    }

    /// Returns lock holder info if this is a rejected concurrent deployment.
    pub fn lock_holder_info(&self) -> Option<&LockHolderInfo> {
        match self {
            DeployError::ConcurrentDeployment { holder, .. } => Some(holder),
            _ => None,
        }
    }
}
