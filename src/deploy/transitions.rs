// ABOUTME: State transition methods for deployment orchestration.
// ABOUTME: Each method consumes self and returns the next state on success.

use crate::diagnostics::Diagnostics;
use crate::process::OutputSink;
use crate::source::RepositorySource;

use super::Deployment;
use super::builder::ImageBuilder;
use super::error::DeployError;
use super::runner::ContainerRunner;
use super::state::{Built, Loaded, Prepared, Running};

// =============================================================================
// Loaded -> Prepared
// =============================================================================

impl Deployment<Loaded> {
    /// Validate the repository and clone or pull its working tree.
    ///
    /// # Errors
    ///
    /// Returns `DeployError::Sync` with the source failure kind.
    #[must_use = "deployment state must be used"]
    pub async fn sync(
        self,
        source: &RepositorySource,
    ) -> Result<Deployment<Prepared>, DeployError> {
        let tree = source.sync(self.app.id, &self.app.repo_url).await?;
        Ok(Deployment {
            app: self.app,
            state: Prepared { tree },
        })
    }
}

// =============================================================================
// Prepared -> Built
// =============================================================================

impl Deployment<Prepared> {
    /// Build the application's image, streaming output to `sink`.
    ///
    /// # Errors
    ///
    /// Returns `DeployError::Build` with the build failure kind.
    #[must_use = "deployment state must be used"]
    pub async fn build(
        self,
        builder: &ImageBuilder,
        sink: &dyn OutputSink,
    ) -> Result<Deployment<Built>, DeployError> {
        let image = builder.build(self.app.id, &self.state.tree, sink).await?;
        Ok(Deployment {
            app: self.app,
            state: Built {
                tree: self.state.tree,
                image,
            },
        })
    }
}

// =============================================================================
// Built -> Running
// =============================================================================

impl Deployment<Built> {
    /// Start the container on the application's port pair.
    ///
    /// # Errors
    ///
    /// Returns `DeployError::Run` with the run failure kind.
    #[must_use = "deployment state must be used"]
    pub async fn run(
        self,
        runner: &ContainerRunner,
        diagnostics: &mut Diagnostics,
    ) -> Result<Deployment<Running>, DeployError> {
        let container = runner
            .run(&self.app, &self.state.image, diagnostics)
            .await?;
        Ok(Deployment {
            app: self.app,
            state: Running {
                image: self.state.image,
                container,
            },
        })
    }
}
