// ABOUTME: Starts an application's container from its built image.
// ABOUTME: Replaces any container holding the deterministic name, then runs detached.

use crate::diagnostics::{Diagnostics, Warning};
use crate::runtime::{ContainerFilter, Engine};
use crate::types::{ApplicationIdentity, ContainerId, ImageName};

use super::error::RunError;

/// Runs `app-{id}-container` bound to `internal_port:container_port`.
#[derive(Debug, Clone)]
pub struct ContainerRunner {
    engine: Engine,
}

impl ContainerRunner {
    pub fn new(engine: Engine) -> Self {
        Self { engine }
    }

    /// Start exactly one container for `app` from `image`.
    ///
    /// A previous container that cannot be removed is recorded in `diagnostics`
    /// and the run goes ahead; if the name is still taken the engine refuses
    /// and the error is `RunFailed`.
    pub async fn run(
        &self,
        app: &ApplicationIdentity,
        image: &ImageName,
        diagnostics: &mut Diagnostics,
    ) -> Result<ContainerId, RunError> {
        let exists = self
            .engine
            .image_exists(image)
            .await
            .map_err(|e| RunError::RunFailed(e.diagnostic()))?;
        if !exists {
            return Err(RunError::ImageMissing(image.clone()));
        }

        self.clear_previous(app, diagnostics).await;

        let name = app.container_name();
        tracing::info!(
            app = %app.id,
            container = %name,
            ports = %format!("{}:{}", app.internal_port, app.container_port),
            "starting container"
        );

        let container_id = self
            .engine
            .run_detached(&name, app.internal_port, app.container_port, image)
            .await
            .map_err(|e| RunError::RunFailed(e.diagnostic()))?;

        tracing::info!(app = %app.id, container = %container_id, "container started");
        Ok(container_id)
    }

    async fn clear_previous(&self, app: &ApplicationIdentity, diagnostics: &mut Diagnostics) {
        let name = app.container_name();
        let existing = match self
            .engine
            .find_containers(ContainerFilter::Name(&name), true)
            .await
        {
            Ok(ids) => ids,
            Err(e) => {
                tracing::warn!(app = %app.id, error = %e, "could not list previous containers");
                diagnostics.warn(Warning::container_cleanup(format!(
                    "could not list containers named {name}: {}",
                    e.diagnostic()
                )));
                return;
            }
        };

        for id in existing {
            tracing::info!(app = %app.id, container = %id, "removing previous container");
            if let Err(e) = self.engine.remove_container(&id).await {
                tracing::warn!(app = %app.id, container = %id, error = %e, "could not remove previous container");
                diagnostics.warn(Warning::container_cleanup(format!(
                    "could not remove container {id} ({name}): {}",
                    e.diagnostic()
                )));
            }
        }
    }
}
