// ABOUTME: Deployment state marker types for the type state pattern.
// ABOUTME: Each state carries the artifacts earlier stages produced.

use crate::types::{ContainerId, ImageName, WorkingTree};

/// Initial state: application record loaded.
/// Available actions: `sync()`
#[derive(Debug, Clone, Copy, Default)]
pub struct Loaded;

/// Working tree synchronized.
/// Available actions: `build()`
#[derive(Debug, Clone)]
pub struct Prepared {
    pub(crate) tree: WorkingTree,
}

/// Image built from the working tree.
/// Available actions: `run()`
#[derive(Debug, Clone)]
pub struct Built {
    pub(crate) tree: WorkingTree,
    pub(crate) image: ImageName,
}

/// Container started.
/// Available actions: `finish()`
#[derive(Debug, Clone)]
pub struct Running {
    pub(crate) image: ImageName,
    pub(crate) container: ContainerId,
}
