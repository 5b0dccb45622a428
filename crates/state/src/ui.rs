//! Independent cells backing the pipeline views
//!
//! None of these cells validate or cross-check each other; callers write
//! whatever the backend returned.

use cv_types::{Cut, CutMedia, CutSelection, EntityTuple, Scene, cut_id, parse_cut_id};
use std::collections::{HashMap, HashSet};
use std::time::Duration;
use tracing::warn;

use crate::store::Store;

/// How long an error banner stays up
pub const ERROR_DISPLAY: Duration = Duration::from_secs(5);

/// How long a success banner stays up
pub const SUCCESS_DISPLAY: Duration = Duration::from_secs(3);

#[derive(Clone, Debug, Default)]
pub struct UiState {
    pub entity_list: Store<Vec<EntityTuple>>,
    pub scenes: Store<Vec<Scene>>,
    /// Cuts grouped by scene, in scene order
    pub cuts: Store<Vec<Vec<Cut>>>,
    /// Cut id -> generated image path
    pub cut_images: Store<HashMap<String, String>>,
    /// Cut id -> generated clip path
    pub cut_videos: Store<HashMap<String, String>>,
    pub final_video_path: Store<String>,
    pub is_loading: Store<bool>,
    pub loading_message: Store<String>,
    pub show_api_logs: Store<bool>,
    pub selected_cuts: Store<HashSet<String>>,
    pub current_step: Store<u32>,
    pub error_message: Store<String>,
    pub success_message: Store<String>,
}

impl UiState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_loading(&self, loading: bool, message: impl Into<String>) {
        self.is_loading.set(loading);
        self.loading_message.set(message.into());
    }

    /// Show an error, cleared after [`ERROR_DISPLAY`]
    pub fn show_error(&self, message: impl Into<String>) {
        show_for(&self.error_message, message.into(), ERROR_DISPLAY);
    }

    /// Show a success notice, cleared after [`SUCCESS_DISPLAY`]
    pub fn show_success(&self, message: impl Into<String>) {
        show_for(&self.success_message, message.into(), SUCCESS_DISPLAY);
    }

    pub fn toggle_cut(&self, scene_num: u32, cut_num: u32) {
        let id = cut_id(scene_num, cut_num);
        self.selected_cuts.modify(|selected| {
            if !selected.remove(&id) {
                selected.insert(id);
            }
        });
    }

    /// Current selection as a request payload, sorted by scene then cut
    pub fn selected_cut_list(&self) -> Vec<CutSelection> {
        let mut selection: Vec<CutSelection> = self.selected_cuts.with(|selected| {
            selected
                .iter()
                .filter_map(|id| match parse_cut_id(id) {
                    Ok((scene_num, cut_num)) => Some(CutSelection { scene_num, cut_num }),
                    Err(e) => {
                        warn!("Skipping selected cut: {}", e);
                        None
                    }
                })
                .collect()
        });
        selection.sort_by_key(|cut| (cut.scene_num, cut.cut_num));
        selection
    }

    /// Replace the image map with what the backend listed
    pub fn set_cut_images(&self, images: &[CutMedia]) {
        self.cut_images.set(media_map(images));
    }

    /// Replace the clip map with what the backend listed
    pub fn set_cut_videos(&self, videos: &[CutMedia]) {
        self.cut_videos.set(media_map(videos));
    }
}

fn media_map(media: &[CutMedia]) -> HashMap<String, String> {
    media
        .iter()
        .map(|item| (cut_id(item.scene_num, item.cut_num), item.path.clone()))
        .collect()
}

/// Set `cell` to `message` and clear it again after `delay`
///
/// Needs a tokio runtime for the timer; without one the message stays until
/// overwritten.
fn show_for(cell: &Store<String>, message: String, delay: Duration) {
    cell.set(message);

    match tokio::runtime::Handle::try_current() {
        Ok(handle) => {
            let cell = cell.clone();
            handle.spawn(async move {
                tokio::time::sleep(delay).await;
                cell.set(String::new());
            });
        }
        Err(_) => warn!("No tokio runtime, message will not auto-clear"),
    }
}
