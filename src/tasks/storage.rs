use super::helpers::normalize_loaded;
use super::types::Task;
use crate::shared::errors::{Outcome, StorageError};
use crate::shared::paths::ensure_dir;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

/// Key holding the JSON array of tasks, in display order.
pub const TASKS_KEY: &str = "todoTasks";

/// Durable string key-value store.
pub trait KeyValueStore: Send + Sync {
    /// Returns `None` when nothing was ever stored under `key`.
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;
    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;
}

/// Stores each key as `{dir}/{key}.json`.
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", key))
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let path = self.path_for(key);
        if !path.exists() {
            return Ok(None);
        }

        std::fs::read_to_string(&path)
            .map(Some)
            .map_err(StorageError::ReadError)
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        ensure_dir(&self.dir).map_err(|e| StorageError::directory(e.to_string()))?;

        let path = self.path_for(key);
        std::fs::write(&path, value).map_err(StorageError::WriteError)?;
        tracing::trace!(
            target: "tasks::storage",
            path = %path.display(),
            bytes = value.len(),
            "Wrote key"
        );
        Ok(())
    }
}

/// Non-durable store for tests and embedding.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        Ok(entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// Serialization boundary between the task collection and a [`KeyValueStore`].
#[derive(Clone)]
pub struct TaskRepository {
    backend: Arc<dyn KeyValueStore>,
}

impl TaskRepository {
    pub fn new(backend: Arc<dyn KeyValueStore>) -> Self {
        Self { backend }
    }

    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryStore::new()))
    }

    /// Loads the saved collection. Never fails: unreadable or corrupt data
    /// yields an empty collection together with the error.
    pub fn load(&self) -> Outcome<Vec<Task>> {
        let raw = match self.backend.get(TASKS_KEY) {
            Ok(Some(raw)) => raw,
            Ok(None) => return Outcome::clean(Vec::new()),
            Err(e) => {
                tracing::error!(target: "tasks::storage", "Error loading tasks: {}", e);
                return Outcome::with_error(Vec::new(), e);
            }
        };

        match serde_json::from_str::<Vec<Task>>(&raw) {
            Ok(mut tasks) => {
                let repaired = normalize_loaded(&mut tasks);
                if repaired > 0 {
                    tracing::warn!(
                        target: "tasks::storage",
                        repaired = repaired,
                        "Repaired inconsistent tasks while loading"
                    );
                }
                tracing::debug!(target: "tasks::storage", "Loaded {} tasks", tasks.len());
                Outcome::clean(tasks)
            }
            Err(e) => {
                tracing::error!(target: "tasks::storage", "Error parsing saved tasks: {}", e);
                Outcome::with_error(Vec::new(), StorageError::ParseError(e))
            }
        }
    }

    /// Overwrites the saved collection with `tasks`.
    pub fn save(&self, tasks: &[Task]) -> Result<(), StorageError> {
        let content = serde_json::to_string(tasks).map_err(StorageError::SerializeError)?;
        self.backend.set(TASKS_KEY, &content)?;
        tracing::debug!(target: "tasks::storage", "Saved {} tasks", tasks.len());
        Ok(())
    }
}
