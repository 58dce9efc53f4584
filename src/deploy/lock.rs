// ABOUTME: Deploy lock to prevent concurrent deployments of the same application.
// ABOUTME: Lock files are published atomically via hard link under <state_dir>/locks/.

use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use crate::types::ApplicationId;

use super::error::{DeployError, LockHolderInfo};

/// Distinguishes temp files written by concurrent acquirers in one process.
static TMP_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Information about who holds a deploy lock.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LockInfo {
    /// Hostname of the machine that holds the lock.
    pub holder: String,
    /// Process ID of the lock holder.
    pub pid: u32,
    /// When the lock was acquired.
    pub started_at: DateTime<Utc>,
    /// Application being deployed.
    pub application: ApplicationId,
}

impl LockInfo {
    /// Create new lock info for the current process.
    pub fn new(application: ApplicationId) -> Self {
        Self {
            holder: gethostname::gethostname().to_string_lossy().into_owned(),
            pid: std::process::id(),
            started_at: Utc::now(),
            application,
        }
    }

    /// Check if this lock is older than `stale_after`.
    pub fn is_stale(&self, stale_after: Duration) -> bool {
        let age = Utc::now() - self.started_at;
        TimeDelta::from_std(stale_after)
            .map(|limit| age >= limit)
            .unwrap_or(false)
    }

    /// Path to the lock file for an application.
    pub fn lock_path(locks_dir: &Path, application: ApplicationId) -> PathBuf {
        locks_dir.join(format!("{}.lock", application.slug()))
    }

    fn holder_info(&self) -> LockHolderInfo {
        LockHolderInfo {
            holder: self.holder.clone(),
            pid: self.pid,
            started_at: self.started_at,
        }
    }
}

/// A held deploy lock that releases on drop.
#[derive(Debug)]
pub struct DeployLock {
    path: PathBuf,
    application: ApplicationId,
    released: bool,
}

impl DeployLock {
    /// Acquire the deploy lock for `application`, never waiting.
    ///
    /// Returns `DeployError::ConcurrentDeployment` if a live lock is held.
    /// Auto-breaks locks older than `stale_after`, and unreadable ones, with a warning.
    pub async fn acquire(
        locks_dir: &Path,
        application: ApplicationId,
        stale_after: Duration,
    ) -> Result<Self, DeployError> {
        tokio::fs::create_dir_all(locks_dir).await.map_err(|e| {
            DeployError::lock_error(format!(
                "failed to create lock directory {}: {e}",
                locks_dir.display()
            ))
        })?;

        let path = LockInfo::lock_path(locks_dir, application);
        let info = LockInfo::new(application);

        if try_publish(&path, &info).await? {
            return Ok(Self::held(path, application));
        }

        match read_lock(&path).await {
            // Released between our attempt and the read.
            LockRead::Missing => {}
            LockRead::Valid(existing) if !existing.is_stale(stale_after) => {
                return Err(DeployError::ConcurrentDeployment {
                    id: application,
                    holder: existing.holder_info(),
                });
            }
            LockRead::Valid(existing) => {
                tracing::warn!(
                    "Auto-breaking stale lock for app {} held by {} (pid {}) since {}",
                    application,
                    existing.holder,
                    existing.pid,
                    existing.started_at
                );
                remove_lock_file(&path).await?;
            }
            LockRead::Corrupt => {
                tracing::warn!("Lock info for app {} corrupted, breaking lock", application);
                remove_lock_file(&path).await?;
            }
        }

        if try_publish(&path, &info).await? {
            return Ok(Self::held(path, application));
        }

        match read_lock(&path).await {
            LockRead::Valid(existing) => Err(DeployError::ConcurrentDeployment {
                id: application,
                holder: existing.holder_info(),
            }),
            _ => Err(DeployError::lock_error(
                "lock acquired by another process during break",
            )),
        }
    }

    fn held(path: PathBuf, application: ApplicationId) -> Self {
        tracing::debug!(app = %application, path = %path.display(), "deploy lock acquired");
        Self {
            path,
            application,
            released: false,
        }
    }

    pub fn application(&self) -> ApplicationId {
        self.application
    }

    /// Release the lock, reporting a failure to remove the lock file.
    pub async fn release(mut self) -> Result<(), DeployError> {
        self.released = true;
        match tokio::fs::remove_file(&self.path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(DeployError::lock_error(format!(
                "failed to remove {}: {e}",
                self.path.display()
            ))),
        }
    }
}

impl Drop for DeployLock {
    fn drop(&mut self) {
        if !self.released {
            let _ = std::fs::remove_file(&self.path);
        }
    }
}

enum LockRead {
    Missing,
    Valid(LockInfo),
    Corrupt,
}

async fn read_lock(path: &Path) -> LockRead {
    match tokio::fs::read_to_string(path).await {
        Ok(content) => match serde_json::from_str::<LockInfo>(&content) {
            Ok(info) => LockRead::Valid(info),
            Err(_) => LockRead::Corrupt,
        },
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => LockRead::Missing,
        Err(_) => LockRead::Corrupt,
    }
}

/// Write `info` to a private temp file and hard-link it into place.
///
/// Linking fails if the lock already exists, so readers never observe a
/// half-written lock. Returns false if someone else holds it.
async fn try_publish(path: &Path, info: &LockInfo) -> Result<bool, DeployError> {
    let json = serde_json::to_string(info)
        .map_err(|e| DeployError::lock_error(format!("failed to serialize lock: {e}")))?;

    let tmp = path.with_extension(format!(
        "lock.{}.{}",
        std::process::id(),
        TMP_COUNTER.fetch_add(1, Ordering::Relaxed)
    ));
    tokio::fs::write(&tmp, json)
        .await
        .map_err(|e| DeployError::lock_error(format!("failed to write lock: {e}")))?;

    let linked = tokio::fs::hard_link(&tmp, path).await;
    let _ = tokio::fs::remove_file(&tmp).await;

    match linked {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => Ok(false),
        Err(e) => Err(DeployError::lock_error(format!(
            "failed to acquire lock {}: {e}",
            path.display()
        ))),
    }
}

async fn remove_lock_file(path: &Path) -> Result<(), DeployError> {
    match tokio::fs::remove_file(path).await {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(DeployError::lock_error(format!(
            "failed to break lock {}: {e}",
            path.display()
        ))),
    }
}
