//! File-backed session store
//!
//! One pretty-printed JSON file per session. Writes go to a temp file in the
//! same directory and are renamed into place while holding an exclusive lock
//! on `.lock`, so concurrent `wp` processes never observe a torn session.

use async_trait::async_trait;
use fs2::FileExt;
use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use super::{SessionStore, StoreError, validate_id};
use crate::domain::Session;

const LOCK_FILE: &str = ".lock";
const EXTENSION: &str = "json";

pub struct FileSessionStore {
    dir: PathBuf,
}

impl FileSessionStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        let dir = dir.into();
        debug!(?dir, "FileSessionStore::new: called");
        Self { dir }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, id: &str) -> Result<PathBuf, StoreError> {
        validate_id(id)?;
        Ok(self.dir.join(format!("{}.{}", id, EXTENSION)))
    }

    /// Run `f` under the directory lock on a blocking thread
    async fn locked<T, F>(&self, f: F) -> Result<T, StoreError>
    where
        T: Send + 'static,
        F: FnOnce(&Path) -> Result<T, StoreError> + Send + 'static,
    {
        let dir = self.dir.clone();
        tokio::task::spawn_blocking(move || {
            fs::create_dir_all(&dir)?;
            let lock = OpenOptions::new()
                .create(true)
                .truncate(false)
                .write(true)
                .open(dir.join(LOCK_FILE))?;
            FileExt::lock_exclusive(&lock)?;
            let result = f(&dir);
            drop(lock);
            result
        })
        .await
        .map_err(|e| StoreError::Task(e.to_string()))?
    }
}

fn write_atomic(dir: &Path, path: &Path, contents: &[u8]) -> Result<(), StoreError> {
    let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
    tmp.write_all(contents)?;
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|e| StoreError::Io(e.error))?;
    Ok(())
}

#[async_trait]
impl SessionStore for FileSessionStore {
    fn is_persistent(&self) -> bool {
        true
    }

    async fn load(&self, id: &str) -> Result<Option<Session>, StoreError> {
        debug!(%id, "FileSessionStore::load: called");
        let path = self.path_for(id)?;
        match tokio::fs::read_to_string(&path).await {
            Ok(content) => Ok(Some(serde_json::from_str(&content)?)),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!(?path, "FileSessionStore::load: no such session");
                Ok(None)
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn save(&self, session: &Session) -> Result<(), StoreError> {
        debug!(id = %session.id, turns = session.turns.len(), "FileSessionStore::save: called");
        let path = self.path_for(&session.id)?;
        let json = serde_json::to_vec_pretty(session)?;
        self.locked(move |dir| write_atomic(dir, &path, &json)).await
    }

    async fn reset(&self, id: &str) -> Result<bool, StoreError> {
        debug!(%id, "FileSessionStore::reset: called");
        let path = self.path_for(id)?;
        let removed = self
            .locked(move |_| match fs::remove_file(&path) {
                Ok(()) => Ok(true),
                Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
                Err(e) => Err(e.into()),
            })
            .await?;
        if removed {
            info!("Reset session {}", id);
        }
        Ok(removed)
    }

    async fn list(&self) -> Result<Vec<String>, StoreError> {
        debug!(dir = ?self.dir, "FileSessionStore::list: called");
        if !self.dir.exists() {
            return Ok(Vec::new());
        }
        let mut ids = Vec::new();
        let mut entries = tokio::fs::read_dir(&self.dir).await?;
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some(EXTENSION) {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|s| s.to_str())
                && validate_id(stem).is_ok()
            {
                ids.push(stem.to_string());
            }
        }
        ids.sort();
        Ok(ids)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn store() -> (TempDir, FileSessionStore) {
        let dir = TempDir::new().unwrap();
        let store = FileSessionStore::new(dir.path().join("sessions"));
        (dir, store)
    }

    #[test]
    fn test_is_persistent() {
        let (_dir, store) = store();
        assert!(store.is_persistent());
    }

    #[tokio::test]
    async fn test_missing_session_loads_none() {
        let (_dir, store) = store();
        assert!(store.load("nobody").await.unwrap().is_none());
        assert!(store.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_save_and_reload() {
        let (_dir, store) = store();
        let mut session = Session::new("s1");
        session.push_exchange("I want to get stronger", "How much time do you have?");
        store.save(&session).await.unwrap();

        let loaded = store.load("s1").await.unwrap().unwrap();
        assert_eq!(loaded, session);
        assert!(store.dir().join("s1.json").exists());
    }

    #[tokio::test]
    async fn test_save_overwrites() {
        let (_dir, store) = store();
        let mut session = Session::new("s1");
        store.save(&session).await.unwrap();
        session.push_exchange("a", "b");
        store.save(&session).await.unwrap();

        assert_eq!(store.load("s1").await.unwrap().unwrap().turns.len(), 2);
        assert_eq!(store.list().await.unwrap(), vec!["s1".to_string()]);
    }

    #[tokio::test]
    async fn test_reset_removes_file() {
        let (_dir, store) = store();
        store.save(&Session::new("s1")).await.unwrap();
        store.save(&Session::new("s2")).await.unwrap();

        assert!(store.reset("s1").await.unwrap());
        assert!(!store.reset("s1").await.unwrap());
        assert_eq!(store.list().await.unwrap(), vec!["s2".to_string()]);
    }

    #[tokio::test]
    async fn test_rejects_path_like_ids() {
        let (_dir, store) = store();
        assert!(matches!(store.load("../x").await, Err(StoreError::InvalidId(_))));
        assert!(matches!(store.save(&Session::new("a/b")).await, Err(StoreError::InvalidId(_))));
    }

    #[tokio::test]
    async fn test_corrupt_file_is_an_error() {
        let (_dir, store) = store();
        fs::create_dir_all(store.dir()).unwrap();
        fs::write(store.dir().join("bad.json"), "{not json").unwrap();
        assert!(matches!(store.load("bad").await, Err(StoreError::Serde(_))));
    }
}
