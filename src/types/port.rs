// ABOUTME: Host and container port types for an application's port pair.
// ABOUTME: Container ports are user-declared; internal ports derive from the application id.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use super::ApplicationId;

/// Lowest port a user may declare (registered/private range).
pub const MIN_CONTAINER_PORT: u16 = 1024;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PortError {
    #[error("container port {0} is outside the allowed range 1024-65535")]
    OutOfRange(u32),

    #[error("no internal port left for application {id}: base {base} + id exceeds 65535")]
    RangeExhausted { id: ApplicationId, base: u16 },
}

/// Port the application listens on inside its container.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u16")]
pub struct ContainerPort(u16);

impl ContainerPort {
    pub fn new(value: u32) -> Result<Self, PortError> {
        match u16::try_from(value) {
            Ok(port) if port >= MIN_CONTAINER_PORT => Ok(Self(port)),
            _ => Err(PortError::OutOfRange(value)),
        }
    }

    pub fn get(self) -> u16 {
        self.0
    }
}

impl TryFrom<u32> for ContainerPort {
    type Error = PortError;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<ContainerPort> for u16 {
    fn from(port: ContainerPort) -> Self {
        port.0
    }
}

impl fmt::Display for ContainerPort {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Host-side port published for an application.
///
/// Always `base + id`, so two applications can never share one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InternalPort(u16);

impl InternalPort {
    pub fn derive(base: u16, id: ApplicationId) -> Result<Self, PortError> {
        let port = u32::from(base) + id.get();
        u16::try_from(port)
            .map(Self)
            .map_err(|_| PortError::RangeExhausted { id, base })
    }

    pub fn get(self) -> u16 {
        self.0
    }
}

impl fmt::Display for InternalPort {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
