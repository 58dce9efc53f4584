// ABOUTME: In-memory application registry shared by the store implementations.
// ABOUTME: Assigns ids, derives ports, and enforces status transitions.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::{ApplicationId, ContainerPort, InternalPort};

use super::{ApplicationRecord, ApplicationStatus, StoreError};

/// Default host port base; application `n` publishes on `base + n`.
pub const DEFAULT_INTERNAL_PORT_BASE: u16 = 10000;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub(crate) struct Registry {
    /// Highest id ever assigned. Ids are never reused.
    last_id: u32,
    applications: Vec<ApplicationRecord>,
}

impl Registry {
    pub(crate) fn create(
        &mut self,
        repo_url: &str,
        container_port: ContainerPort,
        port_base: u16,
        now: DateTime<Utc>,
    ) -> Result<ApplicationRecord, StoreError> {
        let next = self
            .last_id
            .checked_add(1)
            .ok_or_else(|| StoreError::Corrupt("application id space exhausted".to_string()))?;
        let id = ApplicationId::new(next)
            .map_err(|e| StoreError::Corrupt(e.to_string()))?;
        let internal_port = InternalPort::derive(port_base, id)?;

        if let Some(owner) = self
            .applications
            .iter()
            .find(|app| app.internal_port == internal_port)
        {
            return Err(StoreError::PortInUse {
                port: internal_port,
                owner: owner.id,
            });
        }

        let record = ApplicationRecord {
            id,
            repo_url: repo_url.to_string(),
            subdomain: id.slug(),
            internal_port,
            container_port,
            status: ApplicationStatus::Created,
            created_at: now,
            updated_at: now,
        };

        self.last_id = next;
        self.applications.push(record.clone());
        Ok(record)
    }

    pub(crate) fn get(&self, id: ApplicationId) -> Result<&ApplicationRecord, StoreError> {
        self.applications
            .iter()
            .find(|app| app.id == id)
            .ok_or(StoreError::NotFound(id))
    }

    pub(crate) fn set_status(
        &mut self,
        id: ApplicationId,
        status: ApplicationStatus,
        now: DateTime<Utc>,
    ) -> Result<ApplicationRecord, StoreError> {
        let record = self
            .applications
            .iter_mut()
            .find(|app| app.id == id)
            .ok_or(StoreError::NotFound(id))?;

        if !record.status.can_transition_to(status) {
            return Err(StoreError::InvalidTransition {
                id,
                from: record.status,
                to: status,
            });
        }

        record.status = status;
        record.updated_at = now;
        Ok(record.clone())
    }

    pub(crate) fn list(&self) -> Vec<ApplicationRecord> {
        let mut apps = self.applications.clone();
        apps.sort_by_key(|app| app.id);
        apps
    }

    /// Reject documents that break the id or port invariants.
    pub(crate) fn check(&self) -> Result<(), StoreError> {
        let mut ports = std::collections::HashSet::new();
        let mut ids = std::collections::HashSet::new();
        for app in &self.applications {
            if app.id.get() > self.last_id {
                return Err(StoreError::Corrupt(format!(
                    "application {} is above the last assigned id {}",
                    app.id, self.last_id
                )));
            }
            if !ids.insert(app.id) {
                return Err(StoreError::Corrupt(format!("duplicate application {}", app.id)));
            }
            if !ports.insert(app.internal_port) {
                return Err(StoreError::Corrupt(format!(
                    "internal port {} assigned twice",
                    app.internal_port
                )));
            }
        }
        Ok(())
    }
}
