// ABOUTME: Typed wrapper over the container engine CLI.
// ABOUTME: Issues images, ps, rm, rmi, build, and run with fixed argument shapes.

use std::path::Path;
use std::sync::Arc;

use crate::process::{CommandOutput, CommandRunner, CommandSpec, OutputSink, StreamedOutput};
use crate::types::{ContainerId, ContainerName, ContainerPort, ImageName, InternalPort};

use super::error::EngineError;
use super::types::RuntimeType;

/// Selects containers for `ps -f`.
#[derive(Debug, Clone, Copy)]
pub enum ContainerFilter<'a> {
    /// Exactly this container name.
    Name(&'a ContainerName),
    /// Containers created from this image.
    Ancestor(&'a ImageName),
}

impl ContainerFilter<'_> {
    fn as_arg(&self) -> String {
        match self {
            ContainerFilter::Name(name) => name.exact_filter(),
            ContainerFilter::Ancestor(image) => format!("ancestor={image}"),
        }
    }
}

/// A docker-compatible engine reached through its executable.
#[derive(Clone)]
pub struct Engine {
    runner: Arc<dyn CommandRunner>,
    binary: String,
}

impl std::fmt::Debug for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine")
            .field("binary", &self.binary)
            .finish()
    }
}

impl Engine {
    pub fn new(runner: Arc<dyn CommandRunner>, binary: impl Into<String>) -> Self {
        Self {
            runner,
            binary: binary.into(),
        }
    }

    /// Engine for `runtime`, using `binary` instead of the default executable if given.
    pub fn for_runtime(
        runner: Arc<dyn CommandRunner>,
        runtime: RuntimeType,
        binary: Option<&str>,
    ) -> Self {
        Self::new(runner, binary.unwrap_or(runtime.default_binary()))
    }

    pub fn binary(&self) -> &str {
        &self.binary
    }

    fn command(&self) -> CommandSpec {
        CommandSpec::new(&self.binary)
    }

    /// Run a buffered command, turning a non-zero exit into an error.
    async fn exec(&self, spec: CommandSpec) -> Result<CommandOutput, EngineError> {
        let output = self.runner.run(&spec).await?;
        if !output.success() {
            return Err(EngineError::CommandFailed {
                command: spec.to_string(),
                exit_code: output.exit_code,
                diagnostic: output.diagnostic(),
            });
        }
        Ok(output)
    }

    /// `images -q <name>`: true if the engine knows an image by this tag.
    pub async fn image_exists(&self, image: &ImageName) -> Result<bool, EngineError> {
        let output = self
            .exec(self.command().args(["images", "-q", image.as_str()]))
            .await?;
        Ok(!output.stdout.trim().is_empty())
    }

    /// `ps -q [-a] -f <filter>`: ids of matching containers.
    pub async fn find_containers(
        &self,
        filter: ContainerFilter<'_>,
        include_stopped: bool,
    ) -> Result<Vec<ContainerId>, EngineError> {
        let mut spec = self.command().args(["ps", "-q"]);
        if include_stopped {
            spec = spec.arg("-a");
        }
        spec = spec.args(["-f".to_string(), filter.as_arg()]);

        let output = self.exec(spec).await?;
        Ok(output
            .stdout
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(ContainerId::new)
            .collect())
    }

    /// `rm -f <id>`: stop and remove in one step.
    pub async fn remove_container(&self, id: &ContainerId) -> Result<(), EngineError> {
        self.exec(self.command().args(["rm", "-f", id.as_str()]))
            .await
            .map(|_| ())
    }

    /// `rmi <name>`.
    pub async fn remove_image(&self, image: &ImageName) -> Result<(), EngineError> {
        self.exec(self.command().args(["rmi", image.as_str()]))
            .await
            .map(|_| ())
    }

    /// `build -t <name> <dir>`, streaming output to `sink`.
    ///
    /// On a non-zero exit the error carries the last `tail_lines` lines.
    pub async fn build(
        &self,
        image: &ImageName,
        context_dir: &Path,
        sink: &dyn OutputSink,
        tail_lines: usize,
    ) -> Result<StreamedOutput, EngineError> {
        let spec = self.command().args([
            "build".to_string(),
            "-t".to_string(),
            image.to_string(),
            context_dir.display().to_string(),
        ]);

        let output = self.runner.run_streaming(&spec, sink, tail_lines).await?;
        if !output.success() {
            return Err(EngineError::CommandFailed {
                command: spec.to_string(),
                exit_code: output.exit_code,
                diagnostic: output.tail_text(),
            });
        }
        Ok(output)
    }

    /// `run -d --name <name> -p <host>:<container> <image>`.
    pub async fn run_detached(
        &self,
        name: &ContainerName,
        host_port: InternalPort,
        container_port: ContainerPort,
        image: &ImageName,
    ) -> Result<ContainerId, EngineError> {
        let spec = self.command().args([
            "run".to_string(),
            "-d".to_string(),
            "--name".to_string(),
            name.to_string(),
            "-p".to_string(),
            format!("{host_port}:{container_port}"),
            image.to_string(),
        ]);

        let output = self.exec(spec).await?;
        // Engines may print pull progress before the id; the id is the last line.
        let id = output
            .stdout
            .lines()
            .map(str::trim)
            .rfind(|line| !line.is_empty())
            .unwrap_or_default();
        Ok(ContainerId::new(id))
    }
}
