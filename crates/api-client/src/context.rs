//! Explicitly wired application context

use cv_state::{DurableStorage, FileStorage, LogStore, MemoryStorage, ProjectStateStore, UiState};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

use crate::client::ApiClient;
use crate::config::ClientConfig;
use crate::error::Result;

/// Every long-lived component of a studio session
///
/// Built in dependency order: storage, project state, request ledger, UI
/// cells, then the API client writing into the ledger.
#[derive(Clone)]
pub struct StudioContext {
    pub storage: Arc<dyn DurableStorage>,
    pub project: ProjectStateStore,
    pub logs: LogStore,
    pub ui: UiState,
    pub api: ApiClient,
}

impl StudioContext {
    pub fn new(storage: Arc<dyn DurableStorage>, config: ClientConfig) -> Result<Self> {
        let project = ProjectStateStore::new(Arc::clone(&storage));
        let logs = LogStore::new();
        let ui = UiState::new();
        let api = ApiClient::new(config, logs.clone())?;

        Ok(Self {
            storage,
            project,
            logs,
            ui,
            api,
        })
    }

    /// Context persisting project state under `state_dir`
    pub fn file_backed(state_dir: impl Into<PathBuf>, config: ClientConfig) -> Result<Self> {
        Self::new(Arc::new(FileStorage::new(state_dir)), config)
    }

    /// Context whose project state is lost on exit
    pub fn in_memory(config: ClientConfig) -> Result<Self> {
        Self::new(Arc::new(MemoryStorage::new()), config)
    }

    /// Fill the UI cells with everything the backend has for the current project
    pub async fn load_project(&self) {
        let state = self.project.get();
        let (work_dir, set) = (state.work_dir.as_str(), state.entity_set_name.as_str());

        self.ui.set_loading(true, "Loading project...");

        let (entities, scenes, cuts, images, videos) = tokio::join!(
            self.api.load_entity_list(work_dir, set),
            self.api.load_scenes(work_dir, set),
            self.api.load_cuts(work_dir, set),
            self.api.load_cut_images(work_dir, set),
            self.api.load_cut_videos(work_dir, set),
        );

        info!(
            "Loaded project {:?}: {} entities, {} scenes, {} cut groups, {} images, {} clips",
            set,
            entities.len(),
            scenes.len(),
            cuts.len(),
            images.len(),
            videos.len()
        );

        self.ui.entity_list.set(entities);
        self.ui.scenes.set(scenes);
        self.ui.cuts.set(cuts);
        self.ui.set_cut_images(&images);
        self.ui.set_cut_videos(&videos);
        self.ui.set_loading(false, "");
    }
}
