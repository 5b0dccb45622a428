use serde::{Deserialize, Serialize};

use crate::models::{ImageModel, ImageQuality, ImageSize, ImageStyle, TextModel, VideoModel};

/// Current project configuration
///
/// One instance per process, persisted by the state crate under the
/// `projectState` key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectState {
    pub work_dir: String,
    pub entity_set_name: String,
    pub default_text_model: TextModel,
    pub default_image_model: ImageModel,
    pub default_video_model: VideoModel,
    pub default_image_style: ImageStyle,
    pub default_image_quality: ImageQuality,
    pub default_image_size: ImageSize,
}

impl Default for ProjectState {
    fn default() -> Self {
        Self {
            work_dir: String::new(),
            entity_set_name: String::new(),
            default_text_model: TextModel::Gpt41,
            default_image_model: ImageModel::GptImage1,
            default_video_model: VideoModel::Veo31FastPreview,
            default_image_style: ImageStyle::Realistic,
            default_image_quality: ImageQuality::Low,
            default_image_size: ImageSize::Landscape1536,
        }
    }
}
