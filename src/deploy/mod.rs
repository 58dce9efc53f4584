// ABOUTME: Deployment orchestration using the type state pattern.
// ABOUTME: Image builder, container runner, per-application lock, and the orchestrator.

mod builder;
mod deployment;
mod error;
mod lock;
mod orchestrator;
mod runner;
mod state;
mod transitions;

pub use builder::{DEFAULT_BUILD_DESCRIPTOR, DEFAULT_DIAGNOSTIC_TAIL, ImageBuilder};
pub use deployment::Deployment;
pub use error::{
    BuildError, DeployError, DeployErrorKind, LockHolderInfo, RegisterError, RunError, Stage,
};
pub use lock::{DeployLock, LockInfo};
pub use orchestrator::{LockSettings, Orchestrator};
pub use runner::ContainerRunner;
pub use state::{Built, Loaded, Prepared, Running};
