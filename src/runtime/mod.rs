// ABOUTME: Container runtime access through the docker or podman executable.
// ABOUTME: Wraps the fixed set of CLI invocations the deployment pipeline needs.

mod detection;
mod engine;
mod error;
mod types;

pub use detection::{DetectionError, detect_local};
pub use engine::{ContainerFilter, Engine};
pub use error::{EngineError, EngineErrorKind};
pub use types::{RuntimeConfig, RuntimeType};
