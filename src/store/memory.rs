// ABOUTME: Volatile application store.
// ABOUTME: Used by tests and by embedders that persist records elsewhere.

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::Mutex;

use crate::types::{ApplicationId, ContainerPort};

use super::registry::{DEFAULT_INTERNAL_PORT_BASE, Registry};
use super::{ApplicationRecord, ApplicationStatus, ApplicationStore, StoreError};

#[derive(Debug)]
pub struct MemoryStore {
    registry: Mutex<Registry>,
    port_base: u16,
}

impl MemoryStore {
    pub fn new(port_base: u16) -> Self {
        Self {
            registry: Mutex::new(Registry::default()),
            port_base,
        }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new(DEFAULT_INTERNAL_PORT_BASE)
    }
}

#[async_trait]
impl ApplicationStore for MemoryStore {
    async fn create(
        &self,
        repo_url: &str,
        container_port: ContainerPort,
    ) -> Result<ApplicationRecord, StoreError> {
        self.registry
            .lock()
            .create(repo_url, container_port, self.port_base, Utc::now())
    }

    async fn load(&self, id: ApplicationId) -> Result<ApplicationRecord, StoreError> {
        self.registry.lock().get(id).cloned()
    }

    async fn save_status(
        &self,
        id: ApplicationId,
        status: ApplicationStatus,
    ) -> Result<ApplicationRecord, StoreError> {
        self.registry.lock().set_status(id, status, Utc::now())
    }

    async fn list(&self) -> Result<Vec<ApplicationRecord>, StoreError> {
        Ok(self.registry.lock().list())
    }
}
