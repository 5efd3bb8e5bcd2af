use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::Context;
use async_trait::async_trait;
use dashmap::DashMap;
use directories::ProjectDirs;
use tokio::sync::Mutex;

/// Durable string key-value store backing the session.
///
/// Multi-key writes and deletes land together: after `put` or `delete`
/// returns, either every entry changed or none did.
#[async_trait]
pub trait KeyValueStore: Send + Sync + 'static {
    async fn get(&self, key: &str) -> Result<Option<String>, anyhow::Error>;

    async fn put(&self, entries: &[(&str, &str)]) -> Result<(), anyhow::Error>;

    async fn delete(&self, keys: &[&str]) -> Result<(), anyhow::Error>;
}

/// A JSON object on disk, rewritten through a temporary file on every change.
pub struct FileStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    /// `session.json` under the platform data directory.
    pub fn default_path() -> Result<PathBuf, anyhow::Error> {
        let dirs = ProjectDirs::from("br", "PIAC", "piac-portal")
            .context("Could not determine a home directory.")?;

        Ok(dirs.data_dir().join("session.json"))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn load(&self) -> Result<BTreeMap<String, String>, anyhow::Error> {
        match tokio::fs::read_to_string(&self.path).await {
            Ok(raw) if raw.trim().is_empty() => Ok(BTreeMap::new()),
            Ok(raw) => serde_json::from_str(&raw)
                .with_context(|| format!("Malformed store file {}", self.path.display())),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(BTreeMap::new()),
            Err(e) => Err(e.into()),
        }
    }

    async fn save(&self, entries: &BTreeMap<String, String>) -> Result<(), anyhow::Error> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let tmp = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp, serde_json::to_vec_pretty(entries)?).await?;
        tokio::fs::rename(&tmp, &self.path).await?;

        Ok(())
    }
}

#[async_trait]
impl KeyValueStore for FileStore {
    async fn get(&self, key: &str) -> Result<Option<String>, anyhow::Error> {
        let _guard = self.lock.lock().await;
        let entries = self.load().await?;

        Ok(entries.get(key).cloned())
    }

    async fn put(&self, entries: &[(&str, &str)]) -> Result<(), anyhow::Error> {
        let _guard = self.lock.lock().await;
        let mut stored = self.load().await.unwrap_or_else(|e| {
            log::warn!("Discarding unreadable store file: {}", e);
            BTreeMap::new()
        });

        for (key, value) in entries {
            stored.insert(key.to_string(), value.to_string());
        }

        self.save(&stored).await
    }

    async fn delete(&self, keys: &[&str]) -> Result<(), anyhow::Error> {
        let _guard = self.lock.lock().await;
        let mut stored = match self.load().await {
            Ok(stored) => stored,
            Err(e) => {
                log::warn!("Discarding unreadable store file: {}", e);
                BTreeMap::new()
            }
        };

        for key in keys {
            stored.remove(*key);
        }

        self.save(&stored).await
    }
}

#[derive(Default)]
pub struct MemoryStore {
    entries: DashMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<String>, anyhow::Error> {
        Ok(self.entries.get(key).map(|v| v.value().clone()))
    }

    async fn put(&self, entries: &[(&str, &str)]) -> Result<(), anyhow::Error> {
        for (key, value) in entries {
            self.entries.insert(key.to_string(), value.to_string());
        }

        Ok(())
    }

    async fn delete(&self, keys: &[&str]) -> Result<(), anyhow::Error> {
        for key in keys {
            self.entries.remove(*key);
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn file_store_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("session.json");

        let store = FileStore::new(&path);
        store.put(&[("token", "abc"), ("user", "{}")]).await.unwrap();

        let reopened = FileStore::new(&path);
        assert_eq!(reopened.get("token").await.unwrap().as_deref(), Some("abc"));
        assert_eq!(reopened.get("user").await.unwrap().as_deref(), Some("{}"));

        reopened.delete(&["token", "user"]).await.unwrap();
        assert_eq!(store.get("token").await.unwrap(), None);
        assert_eq!(store.get("user").await.unwrap(), None);
    }

    #[tokio::test]
    async fn missing_file_reads_as_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path().join("absent.json"));

        assert_eq!(store.get("token").await.unwrap(), None);
    }

    #[tokio::test]
    async fn garbage_file_is_an_error_until_rewritten() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");
        tokio::fs::write(&path, "not json").await.unwrap();

        let store = FileStore::new(&path);
        assert!(store.get("token").await.is_err());

        store.delete(&["token"]).await.unwrap();
        assert_eq!(store.get("token").await.unwrap(), None);
    }

    #[tokio::test]
    async fn memory_store_roundtrip() {
        let store = MemoryStore::new();
        store.put(&[("token", "t")]).await.unwrap();
        assert_eq!(store.get("token").await.unwrap().as_deref(), Some("t"));

        store.delete(&["token", "never-set"]).await.unwrap();
        assert_eq!(store.get("token").await.unwrap(), None);
    }
}
