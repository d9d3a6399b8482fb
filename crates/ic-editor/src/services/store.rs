//! Project persistence keyed by project id.

use super::{ServiceError, ServiceResult};
use async_trait::async_trait;
use ic_core::SceneData;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;

#[async_trait]
pub trait ProjectStore: Send + Sync {
    async fn save(&self, key: &str, data: &SceneData) -> ServiceResult<()>;

    /// `None` when nothing was saved under `key`.
    async fn load(&self, key: &str) -> ServiceResult<Option<SceneData>>;
}

/// In-process store, for tests and hosts without storage.
#[derive(Default)]
pub struct MemoryStore {
    projects: Mutex<HashMap<String, SceneData>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ProjectStore for MemoryStore {
    async fn save(&self, key: &str, data: &SceneData) -> ServiceResult<()> {
        self.projects.lock().await.insert(key.to_string(), data.clone());
        Ok(())
    }

    async fn load(&self, key: &str) -> ServiceResult<Option<SceneData>> {
        Ok(self.projects.lock().await.get(key).cloned())
    }
}

/// One `project-<key>.json` file per project inside `dir`.
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path_for(&self, key: &str) -> ServiceResult<PathBuf> {
        let valid = !key.is_empty() && key.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
        if !valid {
            return Err(ServiceError::InvalidKey(key.to_string()));
        }
        Ok(self.dir.join(format!("project-{key}.json")))
    }
}

#[async_trait]
impl ProjectStore for FileStore {
    async fn save(&self, key: &str, data: &SceneData) -> ServiceResult<()> {
        let path = self.path_for(key)?;
        tokio::fs::create_dir_all(&self.dir).await?;
        let json = serde_json::to_vec_pretty(data)?;
        tokio::fs::write(&path, json).await?;
        log::debug!("saved project {key} to {}", path.display());
        Ok(())
    }

    async fn load(&self, key: &str) -> ServiceResult<Option<SceneData>> {
        let path = self.path_for(key)?;
        match tokio::fs::read(&path).await {
            Ok(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn data() -> SceneData {
        SceneData {
            width: 10,
            height: 10,
            objects: vec![],
            ink: None,
        }
    }

    #[tokio::test]
    async fn memory_store_roundtrip() {
        let store = MemoryStore::new();
        assert_eq!(store.load("a").await.unwrap(), None);
        store.save("a", &data()).await.unwrap();
        assert_eq!(store.load("a").await.unwrap(), Some(data()));
    }

    #[tokio::test]
    async fn file_store_roundtrip() {
        let dir = std::env::temp_dir().join(format!("ic-store-test-{}", std::process::id()));
        let store = FileStore::new(&dir);
        assert_eq!(store.load("p1").await.unwrap(), None);
        store.save("p1", &data()).await.unwrap();
        assert!(dir.join("project-p1.json").exists());
        assert_eq!(store.load("p1").await.unwrap(), Some(data()));
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn keys_cannot_escape_the_directory() {
        let store = FileStore::new("/tmp/projects");
        assert!(matches!(store.path_for("../etc"), Err(ServiceError::InvalidKey(_))));
        assert!(matches!(store.path_for(""), Err(ServiceError::InvalidKey(_))));
        assert_eq!(
            store.path_for("abc-1").unwrap(),
            PathBuf::from("/tmp/projects/project-abc-1.json")
        );
    }
}
