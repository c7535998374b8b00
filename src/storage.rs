//! Key/value persistence layer
//!
//! Auth and preferences keep their records here as JSON strings.
//! `InMemoryStore` lives for the process (session scope); `JsonFileStore`
//! survives restarts. Either can be swapped for a real backend.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;

use crate::error::FinGenieError;
use crate::Result;

/// Trait for key/value persistence
#[async_trait::async_trait]
pub trait KeyValueStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>>;
    async fn set(&self, key: &str, value: String) -> Result<()>;
    async fn remove(&self, key: &str) -> Result<()>;
    async fn clear(&self) -> Result<()>;
}

/// Read a JSON value stored under `key`.
pub async fn get_json<T: serde::de::DeserializeOwned>(
    store: &dyn KeyValueStore,
    key: &str,
) -> Result<Option<T>> {
    match store.get(key).await? {
        Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
        None => Ok(None),
    }
}

/// Store `value` as JSON under `key`.
pub async fn set_json<T: serde::Serialize + ?Sized>(
    store: &dyn KeyValueStore,
    key: &str,
    value: &T,
) -> Result<()> {
    store.set(key, serde_json::to_string(value)?).await
}

/// In-memory store for a single process
#[derive(Clone, Default)]
pub struct InMemoryStore {
    entries: Arc<RwLock<HashMap<String, String>>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait::async_trait]
impl KeyValueStore for InMemoryStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.entries.read().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: String) -> Result<()> {
        self.entries.write().await.insert(key.to_string(), value);
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<()> {
        self.entries.write().await.remove(key);
        Ok(())
    }

    async fn clear(&self) -> Result<()> {
        self.entries.write().await.clear();
        Ok(())
    }
}

/// Store backed by a single JSON object file.
///
/// The whole file is rewritten on every change.
pub struct JsonFileStore {
    path: PathBuf,
    // Serializes read-modify-write cycles.
    lock: RwLock<()>,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: RwLock::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn staging_path(&self) -> PathBuf {
        let name = self
            .path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "store".to_string());
        self.path.with_file_name(format!("{}.tmp", name))
    }

    async fn load(&self) -> Result<HashMap<String, String>> {
        match tokio::fs::read_to_string(&self.path).await {
            Ok(raw) if raw.trim().is_empty() => Ok(HashMap::new()),
            Ok(raw) => serde_json::from_str(&raw).map_err(|e| {
                FinGenieError::StorageError(format!(
                    "Corrupt store file {}: {}",
                    self.path.display(),
                    e
                ))
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(HashMap::new()),
            Err(e) => Err(e.into()),
        }
    }

    async fn save(&self, entries: &HashMap<String, String>) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }
        let raw = serde_json::to_string_pretty(entries)?;

        // Write beside the target and rename over it so a torn write never replaces the store.
        let staging = self.staging_path();
        tokio::fs::write(&staging, raw).await?;
        tokio::fs::rename(&staging, &self.path).await?;
        debug!(path = %self.path.display(), "Store file written");
        Ok(())
    }
}

#[async_trait::async_trait]
impl KeyValueStore for JsonFileStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let _guard = self.lock.read().await;
        Ok(self.load().await?.remove(key))
    }

    async fn set(&self, key: &str, value: String) -> Result<()> {
        let _guard = self.lock.write().await;
        let mut entries = self.load().await?;
        entries.insert(key.to_string(), value);
        self.save(&entries).await
    }

    async fn remove(&self, key: &str) -> Result<()> {
        let _guard = self.lock.write().await;
        let mut entries = self.load().await?;
        if entries.remove(key).is_some() {
            self.save(&entries).await?;
        }
        Ok(())
    }

    async fn clear(&self) -> Result<()> {
        let _guard = self.lock.write().await;
        self.save(&HashMap::new()).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_store_path(name: &str) -> PathBuf {
        std::env::temp_dir()
            .join(format!("fingenie-test-{}", uuid::Uuid::new_v4()))
            .join(name)
    }

    #[test]
    fn test_in_memory_store() {
        tokio_test::block_on(async {
            let store = InMemoryStore::new();
            assert_eq!(store.get("theme").await.unwrap(), None);

            store.set("theme", "\"light\"".to_string()).await.unwrap();
            assert_eq!(store.get("theme").await.unwrap().as_deref(), Some("\"light\""));

            store.remove("theme").await.unwrap();
            assert_eq!(store.get("theme").await.unwrap(), None);

            store.set("a", "1".into()).await.unwrap();
            store.clear().await.unwrap();
            assert_eq!(store.get("a").await.unwrap(), None);
        });
    }

    #[tokio::test]
    async fn test_json_helpers() {
        let store = InMemoryStore::new();
        set_json(&store, "numbers", &vec![1, 2, 3]).await.unwrap();
        let numbers: Option<Vec<i32>> = get_json(&store, "numbers").await.unwrap();
        assert_eq!(numbers, Some(vec![1, 2, 3]));

        let missing: Option<Vec<i32>> = get_json(&store, "other").await.unwrap();
        assert!(missing.is_none());
    }

    #[tokio::test]
    async fn test_file_store_survives_reopen() {
        let path = temp_store_path("local.json");

        let store = JsonFileStore::new(&path);
        assert_eq!(store.get("users").await.unwrap(), None);
        store.set("users", "[]".to_string()).await.unwrap();
        store.set("theme", "\"dark\"".to_string()).await.unwrap();
        store.remove("theme").await.unwrap();

        let reopened = JsonFileStore::new(&path);
        assert_eq!(reopened.get("users").await.unwrap().as_deref(), Some("[]"));
        assert_eq!(reopened.get("theme").await.unwrap(), None);

        reopened.clear().await.unwrap();
        assert_eq!(reopened.get("users").await.unwrap(), None);

        let _ = std::fs::remove_dir_all(path.parent().unwrap());
    }

    #[tokio::test]
    async fn test_corrupt_file_is_storage_error() {
        let path = temp_store_path("corrupt.json");
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, "not json").unwrap();

        let store = JsonFileStore::new(&path);
        assert!(matches!(
            store.get("users").await,
            Err(FinGenieError::StorageError(_))
        ));

        let _ = std::fs::remove_dir_all(path.parent().unwrap());
    }

    #[tokio::test]
    async fn test_file_store_replaces_file_atomically() {
        let path = temp_store_path("local.json");
        let store = JsonFileStore::new(&path);
        store.set("theme", "\"light\"".to_string()).await.unwrap();

        let staging = store.staging_path();
        assert!(!staging.exists());

        // A half-written staging file left by a crash does not affect the store.
        std::fs::write(&staging, "{\"theme\": \"da").unwrap();
        assert_eq!(store.get("theme").await.unwrap().as_deref(), Some("\"light\""));

        store.set("theme", "\"dark\"".to_string()).await.unwrap();
        assert!(!staging.exists());
        assert_eq!(store.get("theme").await.unwrap().as_deref(), Some("\"dark\""));

        let _ = std::fs::remove_dir_all(path.parent().unwrap());
    }
}
