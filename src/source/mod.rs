// ABOUTME: Repository validation and working tree synchronization.
// ABOUTME: Validates against provider metadata, then clones or pulls with git.

mod error;
mod metadata;

pub use error::{SourceError, SourceErrorKind};
pub use metadata::{GithubMetadata, MetadataError, MetadataOracle, RepoMetadata};

use std::path::PathBuf;
use std::sync::Arc;

use crate::process::{CommandRunner, CommandSpec};
use crate::types::{ApplicationId, RepoRef, WorkingTree};

/// Owns every application's working tree under `apps_dir`.
#[derive(Clone)]
pub struct RepositorySource {
    runner: Arc<dyn CommandRunner>,
    oracle: Arc<dyn MetadataOracle>,
    apps_dir: PathBuf,
    git_binary: String,
}

impl std::fmt::Debug for RepositorySource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RepositorySource")
            .field("apps_dir", &self.apps_dir)
            .field("git_binary", &self.git_binary)
            .finish()
    }
}

impl RepositorySource {
    pub fn new(
        runner: Arc<dyn CommandRunner>,
        oracle: Arc<dyn MetadataOracle>,
        apps_dir: impl Into<PathBuf>,
        git_binary: impl Into<String>,
    ) -> Self {
        Self {
            runner,
            oracle,
            apps_dir: apps_dir.into(),
            git_binary: git_binary.into(),
        }
    }

    /// Working tree location for an application. Nothing is created.
    pub fn working_tree(&self, id: ApplicationId) -> WorkingTree {
        WorkingTree::for_application(&self.apps_dir, id)
    }

    /// Check that `url` names an existing, public GitHub repository.
    ///
    /// This is the only place repository URLs are interpreted.
    pub async fn validate(&self, url: &str) -> Result<RepoRef, SourceError> {
        let repo = RepoRef::parse(url)?;

        let metadata = self.oracle.fetch(&repo).await.map_err(|e| match e {
            MetadataError::NotFound => SourceError::NotFound(repo.to_string()),
            MetadataError::Unavailable(reason) => SourceError::UpstreamUnavailable(reason),
        })?;

        if metadata.private {
            return Err(SourceError::AccessDenied(repo.to_string()));
        }

        Ok(repo)
    }

    /// Bring the application's working tree up to date with `url`.
    ///
    /// Validation runs on every call; nothing on disk is touched until it passes.
    /// A tree whose HEAD does not resolve is discarded and cloned afresh, and a
    /// failed clone leaves no directory behind.
    pub async fn sync(&self, id: ApplicationId, url: &str) -> Result<WorkingTree, SourceError> {
        let repo = self.validate(url).await?;
        let tree = self.working_tree(id);

        if self.has_usable_checkout(&tree).await? {
            tracing::info!(app = %id, repo = %repo, "pulling latest changes");
            self.pull(&tree).await?;
        } else {
            tracing::info!(app = %id, repo = %repo, "cloning repository");
            self.clone_fresh(&repo, &tree).await?;
        }

        Ok(tree)
    }

    /// A `.git` directory alone is not enough: a clone killed midway leaves one
    /// behind with no commit checked out.
    async fn has_usable_checkout(&self, tree: &WorkingTree) -> Result<bool, SourceError> {
        if !tree.is_checked_out() {
            return Ok(false);
        }

        let spec = CommandSpec::new(&self.git_binary)
            .args(["rev-parse", "--verify", "--quiet", "HEAD"])
            .current_dir(tree.path());
        let output = self
            .runner
            .run(&spec)
            .await
            .map_err(|e| SourceError::sync_failed(e.to_string()))?;

        if !output.success() {
            tracing::warn!(
                path = %tree.path().display(),
                exit_code = output.exit_code,
                "working tree has no resolvable HEAD, cloning again"
            );
        }
        Ok(output.success())
    }

    async fn pull(&self, tree: &WorkingTree) -> Result<(), SourceError> {
        let spec = CommandSpec::new(&self.git_binary)
            .arg("pull")
            .current_dir(tree.path());
        self.git(spec).await
    }

    async fn clone_fresh(&self, repo: &RepoRef, tree: &WorkingTree) -> Result<(), SourceError> {
        remove_partial_tree(tree).await?;
        tokio::fs::create_dir_all(&self.apps_dir)
            .await
            .map_err(|e| {
                SourceError::sync_failed(format!(
                    "cannot create {}: {e}",
                    self.apps_dir.display()
                ))
            })?;

        let spec = CommandSpec::new(&self.git_binary).args([
            "clone".to_string(),
            repo.clone_url(),
            tree.path().display().to_string(),
        ]);

        if let Err(e) = self.git(spec).await {
            if let Err(cleanup) = remove_partial_tree(tree).await {
                tracing::warn!(error = %cleanup, "failed to remove partial clone");
            }
            return Err(e);
        }
        Ok(())
    }

    async fn git(&self, spec: CommandSpec) -> Result<(), SourceError> {
        let output = self
            .runner
            .run(&spec)
            .await
            .map_err(|e| SourceError::sync_failed(e.to_string()))?;

        if !output.success() {
            return Err(SourceError::sync_failed(output.diagnostic()));
        }
        Ok(())
    }
}

async fn remove_partial_tree(tree: &WorkingTree) -> Result<(), SourceError> {
    match tokio::fs::remove_dir_all(tree.path()).await {
        Ok(()) => {
            tracing::debug!(path = %tree.path().display(), "removed incomplete working tree");
            Ok(())
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(SourceError::sync_failed(format!(
            "cannot clear {}: {e}",
            tree.path().display()
        ))),
    }
}
