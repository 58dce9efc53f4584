// ABOUTME: Durable application records and their lifecycle status.
// ABOUTME: Store trait with in-memory and JSON file implementations.

mod error;
mod json;
mod memory;
mod registry;
mod status;

pub use error::StoreError;
pub use json::JsonFileStore;
pub use memory::MemoryStore;
pub use registry::DEFAULT_INTERNAL_PORT_BASE;
pub use status::{ApplicationStatus, UnknownStatus};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::{ApplicationId, ApplicationIdentity, ContainerPort, InternalPort};

/// One deployable application.
///
/// Everything except `status` and `updated_at` is fixed at creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApplicationRecord {
    pub id: ApplicationId,
    pub repo_url: String,
    pub subdomain: String,
    pub internal_port: InternalPort,
    pub container_port: ContainerPort,
    pub status: ApplicationStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ApplicationRecord {
    pub fn identity(&self) -> ApplicationIdentity {
        ApplicationIdentity {
            id: self.id,
            repo_url: self.repo_url.clone(),
            internal_port: self.internal_port,
            container_port: self.container_port,
        }
    }
}

/// Persistence for application records.
///
/// Reads observe every write made earlier through the same store.
#[async_trait]
pub trait ApplicationStore: Send + Sync {
    /// Register a new application in `Created` status with the next unused id.
    async fn create(
        &self,
        repo_url: &str,
        container_port: ContainerPort,
    ) -> Result<ApplicationRecord, StoreError>;

    async fn load(&self, id: ApplicationId) -> Result<ApplicationRecord, StoreError>;

    /// Durably record a status change. Illegal transitions are rejected.
    async fn save_status(
        &self,
        id: ApplicationId,
        status: ApplicationStatus,
    ) -> Result<ApplicationRecord, StoreError>;

    /// All applications ordered by id.
    async fn list(&self) -> Result<Vec<ApplicationRecord>, StoreError>;
}
