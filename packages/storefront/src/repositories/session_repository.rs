use async_trait::async_trait;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tokio::sync::{Mutex, RwLock};
use tracing::warn;

use crate::repositories::errors::session_repository_errors::SessionRepositoryError;

#[cfg(test)]
use mockall::automock;

/// Durable string key-value storage holding the session between runs.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait SessionRepository: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>, SessionRepositoryError>;
    async fn set(&self, key: &str, value: &str) -> Result<(), SessionRepositoryError>;
    async fn remove(&self, key: &str) -> Result<(), SessionRepositoryError>;
}

#[derive(Default)]
pub struct InMemorySessionRepository {
    entries: RwLock<HashMap<String, String>>,
}

impl InMemorySessionRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_entries<I, K, V>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        InMemorySessionRepository {
            entries: RwLock::new(
                entries
                    .into_iter()
                    .map(|(key, value)| (key.into(), value.into()))
                    .collect(),
            ),
        }
    }

    pub async fn snapshot(&self) -> HashMap<String, String> {
        self.entries.read().await.clone()
    }
}

#[async_trait]
impl SessionRepository for InMemorySessionRepository {
    async fn get(&self, key: &str) -> Result<Option<String>, SessionRepositoryError> {
        Ok(self.entries.read().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), SessionRepositoryError> {
        self.entries
            .write()
            .await
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), SessionRepositoryError> {
        self.entries.write().await.remove(key);
        Ok(())
    }
}

/// Stores all keys as one JSON object in a single file.
///
/// Every write replaces the file through a temporary sibling and a rename, so
/// a crash never leaves a half-written session behind.
pub struct FileSessionRepository {
    path: PathBuf,
    lock: Mutex<()>,
}

impl FileSessionRepository {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        FileSessionRepository {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads every entry. Unparseable contents count as an empty session and
    /// are flagged so the caller rewrites the file.
    async fn load(&self) -> Result<(HashMap<String, String>, bool), SessionRepositoryError> {
        match tokio::fs::read(&self.path).await {
            Ok(bytes) if bytes.is_empty() => Ok((HashMap::new(), false)),
            Ok(bytes) => match serde_json::from_slice(&bytes) {
                Ok(entries) => Ok((entries, false)),
                Err(e) => {
                    warn!(
                        "Discarding unreadable session file {}: {}",
                        self.path.display(),
                        e
                    );
                    Ok((HashMap::new(), true))
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok((HashMap::new(), false)),
            Err(e) => Err(e.into()),
        }
    }

    async fn store(&self, entries: &HashMap<String, String>) -> Result<(), SessionRepositoryError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }
        let tmp = self.path.with_extension("tmp");
        tokio::fs::write(&tmp, serde_json::to_vec_pretty(entries)?).await?;
        tokio::fs::rename(&tmp, &self.path).await?;
        Ok(())
    }
}

#[async_trait]
impl SessionRepository for FileSessionRepository {
    async fn get(&self, key: &str) -> Result<Option<String>, SessionRepositoryError> {
        let _guard = self.lock.lock().await;
        let (mut entries, _) = self.load().await?;
        Ok(entries.remove(key))
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), SessionRepositoryError> {
        let _guard = self.lock.lock().await;
        let (mut entries, _) = self.load().await?;
        entries.insert(key.to_string(), value.to_string());
        self.store(&entries).await
    }

    async fn remove(&self, key: &str) -> Result<(), SessionRepositoryError> {
        let _guard = self.lock.lock().await;
        let (mut entries, corrupt) = self.load().await?;
        if entries.remove(key).is_some() || corrupt {
            self.store(&entries).await?;
        }
        Ok(())
    }
}
