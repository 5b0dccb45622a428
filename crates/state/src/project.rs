//! Project configuration, mirrored to durable storage

use cv_types::ProjectState;
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::error::StateError;
use crate::storage::DurableStorage;
use crate::store::{Store, Subscription};

/// Storage key holding the JSON-encoded [`ProjectState`]
pub const PROJECT_STATE_KEY: &str = "projectState";

/// The single current [`ProjectState`], kept identical in memory and storage
///
/// Each mutation is persisted before the new value is published; when the
/// write fails the store keeps its previous value and the error is returned.
#[derive(Clone)]
pub struct ProjectStateStore {
    state: Store<ProjectState>,
    storage: Arc<dyn DurableStorage>,
}

impl ProjectStateStore {
    /// Hydrate from `storage`, falling back to the compiled defaults
    pub fn new(storage: Arc<dyn DurableStorage>) -> Self {
        let initial = Self::hydrate(storage.as_ref());
        Self {
            state: Store::new(initial),
            storage,
        }
    }

    /// Read the persisted record and shallow-merge it over the defaults
    ///
    /// Fields added since the record was written, and stored fields that no
    /// longer parse, keep their default value. A record that is not a JSON
    /// object is ignored.
    pub fn hydrate(storage: &dyn DurableStorage) -> ProjectState {
        let raw = match storage.get(PROJECT_STATE_KEY) {
            Ok(Some(raw)) => raw,
            Ok(None) => {
                debug!("No persisted project state, using defaults");
                return ProjectState::default();
            }
            Err(e) => {
                warn!("Failed to read persisted project state: {}", e);
                return ProjectState::default();
            }
        };

        match merge_over_defaults(&raw) {
            Ok(state) => {
                info!(
                    "Restored project state: work_dir={:?}, entity_set_name={:?}",
                    state.work_dir, state.entity_set_name
                );
                state
            }
            Err(e) => {
                warn!("Ignoring invalid persisted project state: {}", e);
                ProjectState::default()
            }
        }
    }

    pub fn get(&self) -> ProjectState {
        self.state.get()
    }

    /// Replace the whole record
    pub fn set(&self, value: ProjectState) -> Result<(), StateError> {
        self.state.try_update(|_| {
            self.persist(&value)?;
            Ok(value)
        })
    }

    /// Apply `updater` to the full current record
    pub fn update(
        &self,
        updater: impl FnOnce(ProjectState) -> ProjectState,
    ) -> Result<(), StateError> {
        self.state.try_update(|current| {
            let next = updater(current.clone());
            self.persist(&next)?;
            Ok(next)
        })
    }

    /// Restore the defaults and drop the persisted copy
    pub fn reset(&self) -> Result<(), StateError> {
        self.state.try_update(|_| {
            self.storage.remove(PROJECT_STATE_KEY)?;
            info!("Project state reset to defaults");
            Ok(ProjectState::default())
        })
    }

    pub fn subscribe(
        &self,
        callback: impl Fn(&ProjectState) + Send + Sync + 'static,
    ) -> Subscription {
        self.state.subscribe(callback)
    }

    fn persist(&self, value: &ProjectState) -> Result<(), StateError> {
        let json = serde_json::to_string(value)?;
        self.storage.set(PROJECT_STATE_KEY, &json)
    }
}

/// Lay the stored fields over the defaults one by one
///
/// A stored field that is null or no longer fits its type (a model this
/// build does not know, say) is dropped with a warning; the rest are kept.
fn merge_over_defaults(raw: &str) -> Result<ProjectState, StateError> {
    let stored: Value = serde_json::from_str(raw)?;
    let Value::Object(stored) = stored else {
        return Err(StateError::Storage(
            "persisted project state is not a JSON object".to_string(),
        ));
    };

    let mut merged = match serde_json::to_value(ProjectState::default())? {
        Value::Object(map) => map,
        _ => return Err(StateError::Storage("default project state is not an object".to_string())),
    };

    for (key, value) in stored {
        if value.is_null() {
            warn!("Dropping null persisted project field {:?}", key);
            continue;
        }

        let mut candidate = merged.clone();
        candidate.insert(key.clone(), value);
        match serde_json::from_value::<ProjectState>(Value::Object(candidate.clone())) {
            Ok(_) => merged = candidate,
            Err(e) => warn!("Dropping persisted project field {:?}: {}", key, e),
        }
    }

    Ok(serde_json::from_value(Value::Object(merged))?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStorage;
    use cv_types::TextModel;

    #[test]
    fn test_hydrate_merges_old_records_over_defaults() {
        let storage = MemoryStorage::new();
        storage
            .set(PROJECT_STATE_KEY, r#"{"work_dir":"/data/work","default_text_model":"gpt-5"}"#)
            .unwrap();

        let state = ProjectStateStore::hydrate(&storage);
        assert_eq!(state.work_dir, "/data/work");
        assert_eq!(state.default_text_model, TextModel::Gpt5);
        assert_eq!(state.default_image_size, ProjectState::default().default_image_size);
    }

    #[test]
    fn test_hydrate_ignores_garbage() {
        let storage = MemoryStorage::new();
        storage.set(PROJECT_STATE_KEY, "not json").unwrap();
        assert_eq!(ProjectStateStore::hydrate(&storage), ProjectState::default());

        storage.set(PROJECT_STATE_KEY, "[1,2,3]").unwrap();
        assert_eq!(ProjectStateStore::hydrate(&storage), ProjectState::default());
    }

    #[test]
    fn test_bad_field_does_not_discard_the_rest() {
        let storage = MemoryStorage::new();
        storage
            .set(
                PROJECT_STATE_KEY,
                r#"{"work_dir":"/data/work","entity_set_name":"harbor","default_video_model":"veo-4-preview"}"#,
            )
            .unwrap();
        let state = ProjectStateStore::hydrate(&storage);
        assert_eq!(state.work_dir, "/data/work");
        assert_eq!(state.entity_set_name, "harbor");
        assert_eq!(state.default_video_model, ProjectState::default().default_video_model);

        storage
            .set(
                PROJECT_STATE_KEY,
                r#"{"entity_set_name":"harbor","default_image_size":null,"default_text_model":"gpt-2"}"#,
            )
            .unwrap();
        let state = ProjectStateStore::hydrate(&storage);
        assert_eq!(state.entity_set_name, "harbor");
        assert_eq!(state.default_image_size, ProjectState::default().default_image_size);
        assert_eq!(state.default_text_model, ProjectState::default().default_text_model);
    }

    #[test]
    fn test_extra_persisted_fields_are_tolerated() {
        let storage = MemoryStorage::new();
        storage
            .set(PROJECT_STATE_KEY, r#"{"entity_set_name":"pilot","legacy_flag":true}"#)
            .unwrap();
        assert_eq!(ProjectStateStore::hydrate(&storage).entity_set_name, "pilot");
    }
}
