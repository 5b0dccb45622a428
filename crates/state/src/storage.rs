//! Durable key-value mirror for client state

use parking_lot::Mutex;
use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{debug, error};

use crate::error::StateError;

/// String key-value storage that survives process restarts
pub trait DurableStorage: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, StateError>;
    fn set(&self, key: &str, value: &str) -> Result<(), StateError>;
    fn remove(&self, key: &str) -> Result<(), StateError>;
}

fn validate_key(key: &str) -> Result<(), StateError> {
    let valid = !key.is_empty()
        && key
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
    if valid {
        Ok(())
    } else {
        Err(StateError::Storage(format!("Invalid storage key: {:?}", key)))
    }
}

/// One `<key>.json` file per key inside a directory
///
/// Writes go to a temporary file that is renamed over the target, so a
/// reader never observes a half-written record.
#[derive(Debug, Clone)]
pub struct FileStorage {
    dir: PathBuf,
}

impl FileStorage {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> Result<PathBuf, StateError> {
        validate_key(key)?;
        Ok(self.dir.join(format!("{}.json", key)))
    }
}

impl DurableStorage for FileStorage {
    fn get(&self, key: &str) -> Result<Option<String>, StateError> {
        let path = self.path_for(key)?;
        match std::fs::read_to_string(&path) {
            Ok(contents) => Ok(Some(contents)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(StateError::Io(e)),
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StateError> {
        let path = self.path_for(key)?;
        std::fs::create_dir_all(&self.dir)?;

        let temp_path = path.with_extension("json.tmp");
        std::fs::write(&temp_path, value.as_bytes()).map_err(|e| {
            error!(path = %temp_path.display(), error = %e, "Failed to write temp file");
            StateError::Io(e)
        })?;

        std::fs::rename(&temp_path, &path).map_err(|e| {
            let _ = std::fs::remove_file(&temp_path);
            error!(
                from = %temp_path.display(),
                to = %path.display(),
                error = %e,
                "Failed to rename temp file to target"
            );
            StateError::Io(e)
        })?;

        debug!(key, bytes = value.len(), "Persisted state record");
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StateError> {
        let path = self.path_for(key)?;
        match std::fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(StateError::Io(e)),
        }
    }
}

/// Process-local storage, for tests and throwaway sessions
#[derive(Debug, Default)]
pub struct MemoryStorage {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl DurableStorage for MemoryStorage {
    fn get(&self, key: &str) -> Result<Option<String>, StateError> {
        Ok(self.entries.lock().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StateError> {
        self.entries.lock().insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StateError> {
        self.entries.lock().remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_file_storage_round_trip() -> Result<(), StateError> {
        let temp_dir = TempDir::new()?;
        let storage = FileStorage::new(temp_dir.path().join("nested"));

        assert_eq!(storage.get("projectState")?, None);

        storage.set("projectState", r#"{"work_dir":"/tmp/work"}"#)?;
        assert_eq!(
            storage.get("projectState")?.as_deref(),
            Some(r#"{"work_dir":"/tmp/work"}"#)
        );
        assert!(!temp_dir.path().join("nested/projectState.json.tmp").exists());

        storage.remove("projectState")?;
        assert_eq!(storage.get("projectState")?, None);

        // Removing twice is fine
        storage.remove("projectState")?;
        Ok(())
    }

    #[test]
    fn test_file_storage_rejects_path_like_keys() {
        let storage = FileStorage::new("unused");
        assert!(matches!(storage.get("../escape"), Err(StateError::Storage(_))));
        assert!(matches!(storage.set("", "x"), Err(StateError::Storage(_))));
    }

    #[test]
    fn test_memory_storage() {
        let storage = MemoryStorage::new();
        storage.set("k", "v").unwrap();
        assert_eq!(storage.get("k").unwrap().as_deref(), Some("v"));
        storage.remove("k").unwrap();
        assert_eq!(storage.get("k").unwrap(), None);
    }
}
