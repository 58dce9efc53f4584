// ABOUTME: Error types for the application record store.
// ABOUTME: Covers missing records, illegal transitions, port exhaustion, and persistence.

use crate::types::{ApplicationId, InternalPort, PortError};

use super::ApplicationStatus;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("application {0} not found")]
    NotFound(ApplicationId),

    #[error("application {id}: illegal status change {from} -> {to}")]
    InvalidTransition {
        id: ApplicationId,
        from: ApplicationStatus,
        to: ApplicationStatus,
    },

    #[error(transparent)]
    Port(#[from] PortError),

    #[error("internal port {port} already belongs to application {owner}")]
    PortInUse {
        port: InternalPort,
        owner: ApplicationId,
    },

    #[error("application store is corrupt: {0}")]
    Corrupt(String),

    #[error("application store is locked by another process: {0}")]
    Locked(std::path::PathBuf),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
