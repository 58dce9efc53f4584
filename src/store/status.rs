// ABOUTME: Application lifecycle status as a closed enum.
// ABOUTME: Unknown strings are rejected at the boundary, never coerced.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown application status: {0:?}")]
pub struct UnknownStatus(pub String);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ApplicationStatus {
    /// Record exists; no deployment attempted yet.
    Created,
    /// Working tree synchronized; image not built yet.
    Prepared,
    /// Container started.
    Running,
    /// The last deployment attempt failed.
    Error,
}

impl ApplicationStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            ApplicationStatus::Created => "CREATED",
            ApplicationStatus::Prepared => "PREPARED",
            ApplicationStatus::Running => "RUNNING",
            ApplicationStatus::Error => "ERROR",
        }
    }

    /// Whether a deployment may move a record from `self` to `next`.
    ///
    /// Every attempt passes through `Prepared` before `Running`, and any state
    /// may fail into `Error`. A new attempt may start from any state, including
    /// `Prepared` left behind by an interrupted one. Nothing returns to `Created`.
    pub fn can_transition_to(self, next: ApplicationStatus) -> bool {
        use ApplicationStatus::*;
        match (self, next) {
            (_, Error) | (_, Prepared) => true,
            (Prepared, Running) => true,
            _ => false,
        }
    }
}

impl fmt::Display for ApplicationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ApplicationStatus {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "CREATED" => Ok(ApplicationStatus::Created),
            "PREPARED" => Ok(ApplicationStatus::Prepared),
            "RUNNING" => Ok(ApplicationStatus::Running),
            "ERROR" => Ok(ApplicationStatus::Error),
            other => Err(UnknownStatus(other.to_string())),
        }
    }
}
