// ABOUTME: Generic deployment struct parameterized by state marker.
// ABOUTME: State types carry their own data for compile-time guarantees.

use crate::types::{ApplicationId, ApplicationIdentity, ContainerId, ImageName, WorkingTree};

use super::state::{Built, Loaded, Prepared, Running};

/// A deployment attempt in progress, parameterized by its current state.
///
/// Stages can only run in order: there is no way to call `run()` without the
/// `Built` state, which only `build()` produces.
#[derive(Debug)]
pub struct Deployment<S> {
    pub(crate) app: ApplicationIdentity,
    pub(crate) state: S,
}

impl Deployment<Loaded> {
    pub fn new(app: ApplicationIdentity) -> Self {
        Deployment { app, state: Loaded }
    }
}

impl<S> Deployment<S> {
    pub fn id(&self) -> ApplicationId {
        self.app.id
    }

    pub fn application(&self) -> &ApplicationIdentity {
        &self.app
    }
}

impl Deployment<Prepared> {
    pub fn working_tree(&self) -> &WorkingTree {
        &self.state.tree
    }
}

impl Deployment<Built> {
    pub fn working_tree(&self) -> &WorkingTree {
        &self.state.tree
    }

    pub fn image(&self) -> &ImageName {
        &self.state.image
    }
}

impl Deployment<Running> {
    pub fn image(&self) -> &ImageName {
        &self.state.image
    }

    pub fn container(&self) -> &ContainerId {
        &self.state.container
    }

    /// End the attempt, keeping the id of the started container.
    pub fn finish(self) -> ContainerId {
        self.state.container
    }
}
