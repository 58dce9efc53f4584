// ABOUTME: Application store persisted as a JSON document.
// ABOUTME: Mutations re-read the file under a lock file and rewrite it via temp file and rename.

use async_trait::async_trait;
use chrono::Utc;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};
use tokio::sync::Mutex;

use crate::types::{ApplicationId, ContainerPort};

use super::registry::Registry;
use super::{ApplicationRecord, ApplicationStatus, ApplicationStore, StoreError};

/// How long a writer waits for another process to finish its update.
const DEFAULT_LOCK_TIMEOUT: Duration = Duration::from_secs(10);
const LOCK_RETRY: Duration = Duration::from_millis(20);
/// A store update takes milliseconds; a lock file this old outlived its writer.
const LOCK_STALE_AFTER: Duration = Duration::from_secs(30);

/// JSON file store safe to share between processes.
///
/// The file is the only source of truth. Reads load it afresh, and every
/// mutation is a read-modify-write under `<file>.lock`, so concurrent
/// `dockyard` invocations never overwrite each other's records.
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    port_base: u16,
    lock_timeout: Duration,
    /// Serializes writers within this process before they contend for the file lock.
    writer: Mutex<()>,
}

impl JsonFileStore {
    /// Open the store at `path`. A missing file is an empty store; an existing
    /// one must parse and pass the registry checks.
    pub async fn open(path: impl Into<PathBuf>, port_base: u16) -> Result<Self, StoreError> {
        let store = Self {
            path: path.into(),
            port_base,
            lock_timeout: DEFAULT_LOCK_TIMEOUT,
            writer: Mutex::new(()),
        };
        store.read().await?;
        Ok(store)
    }

    /// Give up on a contended store lock after `timeout`.
    pub fn with_lock_timeout(mut self, timeout: Duration) -> Self {
        self.lock_timeout = timeout;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn lock_path(&self) -> PathBuf {
        self.path.with_extension("json.lock")
    }

    async fn read(&self) -> Result<Registry, StoreError> {
        match tokio::fs::read_to_string(&self.path).await {
            Ok(content) => {
                let registry: Registry = serde_json::from_str(&content)
                    .map_err(|e| StoreError::Corrupt(format!("{}: {e}", self.path.display())))?;
                registry.check()?;
                Ok(registry)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Registry::default()),
            Err(e) => Err(e.into()),
        }
    }

    /// Re-read the document under the store lock, apply `change`, and persist.
    /// The file is left untouched when `change` fails.
    async fn mutate<T>(
        &self,
        change: impl FnOnce(&mut Registry) -> Result<T, StoreError>,
    ) -> Result<T, StoreError> {
        let _writer = self.writer.lock().await;
        let lock = StoreLock::acquire(self.lock_path(), self.lock_timeout).await?;

        let outcome = async {
            let mut registry = self.read().await?;
            let result = change(&mut registry)?;
            persist(&self.path, &registry).await?;
            Ok::<_, StoreError>(result)
        }
        .await;

        lock.release().await;
        outcome
    }
}

async fn persist(path: &Path, registry: &Registry) -> Result<(), StoreError> {
    let json = serde_json::to_string_pretty(registry)
        .map_err(|e| StoreError::Corrupt(format!("failed to serialize store: {e}")))?;

    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        tokio::fs::create_dir_all(parent).await?;
    }

    let tmp = path.with_extension("json.tmp");
    tokio::fs::write(&tmp, json).await?;
    tokio::fs::rename(&tmp, path).await?;
    Ok(())
}

/// Exclusive claim on the store file, held as `<file>.lock` for one update.
#[derive(Debug)]
struct StoreLock {
    path: PathBuf,
    released: bool,
}

impl StoreLock {
    async fn acquire(path: PathBuf, timeout: Duration) -> Result<Self, StoreError> {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            tokio::fs::create_dir_all(parent).await?;
        }

        let started = tokio::time::Instant::now();
        loop {
            let created = tokio::fs::OpenOptions::new()
                .write(true)
                .create_new(true)
                .open(&path)
                .await;
            match created {
                Ok(_) => {
                    return Ok(Self {
                        path,
                        released: false,
                    });
                }
                Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {}
                Err(e) => return Err(e.into()),
            }

            if is_stale(&path).await {
                tracing::warn!(path = %path.display(), "breaking stale store lock");
                match tokio::fs::remove_file(&path).await {
                    Ok(()) => continue,
                    Err(e) if e.kind() == std::io::ErrorKind::NotFound => continue,
                    Err(e) => return Err(e.into()),
                }
            }

            if started.elapsed() >= timeout {
                return Err(StoreError::Locked(path));
            }
            tokio::time::sleep(LOCK_RETRY).await;
        }
    }

    async fn release(mut self) {
        self.released = true;
        match tokio::fs::remove_file(&self.path).await {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => {
                tracing::warn!(path = %self.path.display(), error = %e, "failed to remove store lock");
            }
        }
    }
}

impl Drop for StoreLock {
    fn drop(&mut self) {
        if !self.released {
            let _ = std::fs::remove_file(&self.path);
        }
    }
}

async fn is_stale(path: &Path) -> bool {
    let Ok(metadata) = tokio::fs::metadata(path).await else {
        return false;
    };
    metadata
        .modified()
        .ok()
        .and_then(|modified| SystemTime::now().duration_since(modified).ok())
        .is_some_and(|age| age >= LOCK_STALE_AFTER)
}

#[async_trait]
impl ApplicationStore for JsonFileStore {
    async fn create(
        &self,
        repo_url: &str,
        container_port: ContainerPort,
    ) -> Result<ApplicationRecord, StoreError> {
        let port_base = self.port_base;
        self.mutate(|reg| reg.create(repo_url, container_port, port_base, Utc::now()))
            .await
    }

    async fn load(&self, id: ApplicationId) -> Result<ApplicationRecord, StoreError> {
        self.read().await?.get(id).cloned()
    }

    async fn save_status(
        &self,
        id: ApplicationId,
        status: ApplicationStatus,
    ) -> Result<ApplicationRecord, StoreError> {
        self.mutate(|reg| reg.set_status(id, status, Utc::now()))
            .await
    }

    async fn list(&self) -> Result<Vec<ApplicationRecord>, StoreError> {
        Ok(self.read().await?.list())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn records_survive_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state").join("apps.json");

        let store = JsonFileStore::open(&path, 10000).await.unwrap();
        let app = store
            .create("https://github.com/o/r", ContainerPort::new(8000).unwrap())
            .await
            .unwrap();
        store
            .save_status(app.id, ApplicationStatus::Prepared)
            .await
            .unwrap();
        drop(store);

        let reopened = JsonFileStore::open(&path, 10000).await.unwrap();
        let loaded = reopened.load(app.id).await.unwrap();
        assert_eq!(loaded.status, ApplicationStatus::Prepared);
        assert_eq!(loaded.internal_port.get(), 10001);
        assert!(!path.with_extension("json.tmp").exists());
        assert!(!path.with_extension("json.lock").exists());
    }

    #[tokio::test]
    async fn unknown_status_in_file_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("apps.json");
        let doc = r#"{
  "last_id": 1,
  "applications": [{
    "id": 1,
    "repo_url": "https://github.com/o/r",
    "subdomain": "app-1",
    "internal_port": 10001,
    "container_port": 8000,
    "status": "DEPLOYING",
    "created_at": "2024-01-01T00:00:00Z",
    "updated_at": "2024-01-01T00:00:00Z"
  }]
}"#;
        std::fs::write(&path, doc).unwrap();

        let err = JsonFileStore::open(&path, 10000).await.unwrap_err();
        assert!(matches!(err, StoreError::Corrupt(_)));
    }

    #[tokio::test]
    async fn failed_mutation_leaves_file_untouched() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("apps.json");
        let store = JsonFileStore::open(&path, 10000).await.unwrap();
        let app = store
            .create("https://github.com/o/r", ContainerPort::new(8000).unwrap())
            .await
            .unwrap();
        let before = std::fs::read_to_string(&path).unwrap();

        assert!(
            store
                .save_status(app.id, ApplicationStatus::Running)
                .await
                .is_err()
        );
        assert_eq!(std::fs::read_to_string(&path).unwrap(), before);
    }

    #[tokio::test]
    async fn stale_lock_file_is_broken() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("apps.json");
        let store = JsonFileStore::open(&path, 10000).await.unwrap();

        let lock = std::fs::File::create(path.with_extension("json.lock")).unwrap();
        lock.set_modified(SystemTime::now() - Duration::from_secs(120))
            .unwrap();
        drop(lock);

        let app = store
            .create("https://github.com/o/r", ContainerPort::new(8000).unwrap())
            .await
            .unwrap();
        assert_eq!(app.id.get(), 1);
        assert!(!path.with_extension("json.lock").exists());
    }

    #[tokio::test]
    async fn live_lock_file_times_out() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("apps.json");
        let store = JsonFileStore::open(&path, 10000)
            .await
            .unwrap()
            .with_lock_timeout(Duration::from_millis(100));
        std::fs::write(path.with_extension("json.lock"), "").unwrap();

        let err = store
            .create("https://github.com/o/r", ContainerPort::new(8000).unwrap())
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Locked(_)));
        assert!(!path.exists());
    }
}
