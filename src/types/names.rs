// ABOUTME: Deterministic resource names derived from an application id.
// ABOUTME: Image, container, and working tree locations need no lookup index.

use std::fmt;
use std::path::{Path, PathBuf};

use super::ApplicationId;

/// Tag used for the application's image: `app-{id}-image`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ImageName(String);

impl ImageName {
    pub fn for_application(id: ApplicationId) -> Self {
        Self(format!("{}-image", id.slug()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ImageName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Name given to the application's container: `app-{id}-container`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ContainerName(String);

impl ContainerName {
    pub fn for_application(id: ApplicationId) -> Self {
        Self(format!("{}-container", id.slug()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Engine filter matching exactly this name and nothing that merely contains it.
    pub fn exact_filter(&self) -> String {
        format!("name=^{}$", self.0)
    }
}

impl fmt::Display for ContainerName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Checked-out copy of an application's repository: `<apps_dir>/app-{id}`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkingTree {
    path: PathBuf,
}

impl WorkingTree {
    pub fn for_application(apps_dir: &Path, id: ApplicationId) -> Self {
        Self {
            path: apps_dir.join(id.slug()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn git_dir(&self) -> PathBuf {
        self.path.join(".git")
    }

    /// Whether a git directory exists here. Says nothing about its contents.
    pub fn is_checked_out(&self) -> bool {
        self.git_dir().is_dir()
    }

    pub fn file(&self, name: &str) -> PathBuf {
        self.path.join(name)
    }
}
