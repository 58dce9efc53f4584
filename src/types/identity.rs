// ABOUTME: Immutable facts about an application that a deployment works from.
// ABOUTME: Carries the repository URL and the fixed host/container port pair.

use super::{ApplicationId, ContainerName, ContainerPort, ImageName, InternalPort};

/// Identity of one application for the duration of a deployment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApplicationIdentity {
    pub id: ApplicationId,
    pub repo_url: String,
    pub internal_port: InternalPort,
    pub container_port: ContainerPort,
}

impl ApplicationIdentity {
    pub fn image_name(&self) -> ImageName {
        ImageName::for_application(self.id)
    }

    pub fn container_name(&self) -> ContainerName {
        ContainerName::for_application(self.id)
    }
}
