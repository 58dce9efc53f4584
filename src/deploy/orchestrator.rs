// ABOUTME: Drives one application through sync, build, and run.
// ABOUTME: Serializes attempts per application and records status at each checkpoint.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use tracing::Instrument;

use crate::config::Config;
use crate::diagnostics::{Diagnostics, Warning};
use crate::process::{CommandRunner, OutputSink};
use crate::runtime::{Engine, RuntimeType};
use crate::source::{MetadataOracle, RepositorySource};
use crate::store::{ApplicationRecord, ApplicationStatus, ApplicationStore};
use crate::types::{ApplicationId, ContainerPort};

use super::builder::ImageBuilder;
use super::deployment::Deployment;
use super::error::{DeployError, RegisterError};
use super::lock::DeployLock;
use super::runner::ContainerRunner;

/// Where per-application lock files live and when an abandoned one may be broken.
#[derive(Debug, Clone)]
pub struct LockSettings {
    pub dir: PathBuf,
    pub stale_after: Duration,
}

/// Sequences `RepositorySource`, `ImageBuilder` and `ContainerRunner`.
pub struct Orchestrator {
    store: Arc<dyn ApplicationStore>,
    source: RepositorySource,
    builder: ImageBuilder,
    runner: ContainerRunner,
    locks: LockSettings,
}

impl std::fmt::Debug for Orchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Orchestrator")
            .field("source", &self.source)
            .field("builder", &self.builder)
            .field("runner", &self.runner)
            .field("locks", &self.locks)
            .finish()
    }
}

impl Orchestrator {
    pub fn new(
        store: Arc<dyn ApplicationStore>,
        source: RepositorySource,
        builder: ImageBuilder,
        runner: ContainerRunner,
        locks: LockSettings,
    ) -> Self {
        Self {
            store,
            source,
            builder,
            runner,
            locks,
        }
    }

    /// Wire every component from configuration.
    pub fn from_config(
        config: &Config,
        runtime: RuntimeType,
        store: Arc<dyn ApplicationStore>,
        commands: Arc<dyn CommandRunner>,
        oracle: Arc<dyn MetadataOracle>,
    ) -> Self {
        let engine = Engine::for_runtime(
            Arc::clone(&commands),
            runtime,
            config.runtime.binary.as_deref(),
        );
        let source = RepositorySource::new(
            commands,
            oracle,
            config.apps_dir.clone(),
            config.git_binary.clone(),
        );
        let builder = ImageBuilder::new(
            engine.clone(),
            config.build.descriptor.clone(),
            config.build.diagnostic_tail,
        );

        Self::new(
            store,
            source,
            builder,
            ContainerRunner::new(engine),
            LockSettings {
                dir: config.locks_dir(),
                stale_after: config.lock_stale_after,
            },
        )
    }

    pub fn store(&self) -> &dyn ApplicationStore {
        self.store.as_ref()
    }

    pub fn source(&self) -> &RepositorySource {
        &self.source
    }

    /// Validate the repository and create an application record for it.
    pub async fn register(
        &self,
        repo_url: &str,
        container_port: ContainerPort,
    ) -> Result<ApplicationRecord, RegisterError> {
        let repo = self.source.validate(repo_url).await?;
        let record = self.store.create(repo_url, container_port).await?;
        tracing::info!(
            app = %record.id,
            repo = %repo,
            internal_port = %record.internal_port,
            "application registered"
        );
        Ok(record)
    }

    /// Run one deployment attempt to completion.
    ///
    /// Returns `Running` on success. On a stage failure the record is set to
    /// `Error` before the error is returned. A second attempt for the same
    /// application while one is in flight is rejected without touching the record.
    pub async fn deploy(
        &self,
        id: ApplicationId,
        sink: &dyn OutputSink,
        diagnostics: &mut Diagnostics,
    ) -> Result<ApplicationStatus, DeployError> {
        let lock = DeployLock::acquire(&self.locks.dir, id, self.locks.stale_after).await?;

        let span = tracing::info_span!("deploy", app = %id);
        let result = self
            .run_pipeline(id, sink, diagnostics)
            .instrument(span)
            .await;

        if let Err(e) = lock.release().await {
            tracing::warn!(app = %id, error = %e, "failed to release deploy lock");
            diagnostics.warn(Warning::lock_release(e.to_string()));
        }
        result
    }

    async fn run_pipeline(
        &self,
        id: ApplicationId,
        sink: &dyn OutputSink,
        diagnostics: &mut Diagnostics,
    ) -> Result<ApplicationStatus, DeployError> {
        let record = self.store.load(id).await?;
        tracing::info!(status = %record.status, repo = %record.repo_url, "deployment started");

        let deployment = Deployment::new(record.identity());

        let prepared = match deployment.sync(&self.source).await {
            Ok(d) => d,
            Err(e) => return Err(self.fail(id, e, diagnostics).await),
        };
        if let Err(e) = self.store.save_status(id, ApplicationStatus::Prepared).await {
            return Err(self.fail(id, e.into(), diagnostics).await);
        }
        tracing::info!(tree = %prepared.working_tree().path().display(), "repository synchronized");

        let built = match prepared.build(&self.builder, sink).await {
            Ok(d) => d,
            Err(e) => return Err(self.fail(id, e, diagnostics).await),
        };

        let running = match built.run(&self.runner, diagnostics).await {
            Ok(d) => d,
            Err(e) => return Err(self.fail(id, e, diagnostics).await),
        };

        let record = match self.store.save_status(id, ApplicationStatus::Running).await {
            Ok(record) => record,
            Err(e) => return Err(self.fail(id, e.into(), diagnostics).await),
        };

        let container = running.finish();
        tracing::info!(
            container = %container,
            port = %record.internal_port,
            "deployment succeeded"
        );
        Ok(record.status)
    }

    /// Record `Error` durably, then hand back the stage failure.
    async fn fail(
        &self,
        id: ApplicationId,
        error: DeployError,
        diagnostics: &mut Diagnostics,
    ) -> DeployError {
        tracing::error!(
            stage = ?error.stage(),
            kind = ?error.kind(),
            "deployment failed: {error}"
        );
        if let Err(store_err) = self.store.save_status(id, ApplicationStatus::Error).await {
            tracing::warn!(error = %store_err, "could not record error status");
            diagnostics.warn(Warning::status_write(format!(
                "could not record error status for app {id}: {store_err}"
            )));
        }
        error
    }
}
