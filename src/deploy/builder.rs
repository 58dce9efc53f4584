// ABOUTME: Builds an application's image from its working tree.
// ABOUTME: Clears any previous image and its containers first, then streams the build.

use crate::process::{OutputLine, OutputSink, OutputStream};
use crate::runtime::{ContainerFilter, Engine};
use crate::types::{ApplicationId, ContainerId, ContainerName, ImageName, WorkingTree};

use super::error::BuildError;

/// Default file that must sit at the working tree root.
pub const DEFAULT_BUILD_DESCRIPTOR: &str = "Dockerfile";

/// Default number of build output lines kept for failure reports.
pub const DEFAULT_DIAGNOSTIC_TAIL: usize = 40;

/// Produces `app-{id}-image` from a working tree.
///
/// Repeating a build is always safe: a previous image under the same name is
/// removed, along with every container using it, before the new build starts.
#[derive(Debug, Clone)]
pub struct ImageBuilder {
    engine: Engine,
    descriptor: String,
    tail_lines: usize,
}

impl ImageBuilder {
    pub fn new(engine: Engine, descriptor: impl Into<String>, tail_lines: usize) -> Self {
        Self {
            engine,
            descriptor: descriptor.into(),
            tail_lines,
        }
    }

    pub async fn build(
        &self,
        id: ApplicationId,
        tree: &WorkingTree,
        sink: &dyn OutputSink,
    ) -> Result<ImageName, BuildError> {
        let image = ImageName::for_application(id);

        self.check_descriptor(tree).await?;
        self.clear_previous(id, &image).await?;

        tracing::info!(app = %id, image = %image, "building image");
        let logged = LoggedSink { app: id, inner: sink };
        let output = self
            .engine
            .build(&image, tree.path(), &logged, self.tail_lines)
            .await
            .map_err(|e| BuildError::BuildFailed(e.diagnostic()))?;

        tracing::info!(app = %id, image = %image, lines = output.tail.len(), "image built");
        Ok(image)
    }

    async fn check_descriptor(&self, tree: &WorkingTree) -> Result<(), BuildError> {
        let path = tree.file(&self.descriptor);
        let is_file = tokio::fs::metadata(&path)
            .await
            .map(|meta| meta.is_file())
            .unwrap_or(false);

        if !is_file {
            return Err(BuildError::BuildDescriptorMissing {
                descriptor: self.descriptor.clone(),
                path: tree.path().to_path_buf(),
            });
        }
        Ok(())
    }

    /// Remove the old image and everything referencing it. Any failure aborts
    /// the build: building over a still-referenced image is never attempted.
    async fn clear_previous(&self, id: ApplicationId, image: &ImageName) -> Result<(), BuildError> {
        let cleanup = |e: crate::runtime::EngineError| BuildError::ConflictCleanupFailed(e.diagnostic());

        if !self.engine.image_exists(image).await.map_err(cleanup)? {
            return Ok(());
        }

        let container = ContainerName::for_application(id);
        let mut containers: Vec<ContainerId> = Vec::new();
        for filter in [
            ContainerFilter::Ancestor(image),
            ContainerFilter::Name(&container),
        ] {
            for found in self
                .engine
                .find_containers(filter, true)
                .await
                .map_err(cleanup)?
            {
                if !containers.contains(&found) {
                    containers.push(found);
                }
            }
        }

        for container_id in &containers {
            tracing::info!(app = %id, container = %container_id, "removing container using previous image");
            self.engine
                .remove_container(container_id)
                .await
                .map_err(cleanup)?;
        }

        tracing::info!(app = %id, image = %image, "removing previous image");
        self.engine.remove_image(image).await.map_err(cleanup)
    }
}

/// Mirrors build output into the log while forwarding it to the caller.
struct LoggedSink<'a> {
    app: ApplicationId,
    inner: &'a dyn OutputSink,
}

impl OutputSink for LoggedSink<'_> {
    fn line(&self, line: &OutputLine) {
        match line.stream {
            OutputStream::Stdout => tracing::debug!(app = %self.app, "build: {}", line.content),
            OutputStream::Stderr => tracing::debug!(app = %self.app, "build(stderr): {}", line.content),
        }
        self.inner.line(line);
    }
}
