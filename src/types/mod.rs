// ABOUTME: Type-safe identifiers and validated domain types.
// ABOUTME: Application ids, port pairs, deterministic resource names, and repository references.

mod application_id;
mod id;
mod identity;
mod names;
mod port;
mod repo_ref;

pub use application_id::{ApplicationId, ApplicationIdError};
pub use id::ContainerId;
pub use identity::ApplicationIdentity;
pub use names::{ContainerName, ImageName, WorkingTree};
pub use port::{ContainerPort, InternalPort, PortError};
pub use repo_ref::{RepoRef, RepoRefError};
