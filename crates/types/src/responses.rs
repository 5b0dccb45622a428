//! Response bodies returned by the backend

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::entity::EntityTuple;
use crate::story::{Cut, Scene};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SynopsisAnalyzeResponse {
    #[serde(default)]
    pub entity_dict_draft_list: Vec<Value>,
    #[serde(default)]
    pub saved_txt_path: String,
    #[serde(default)]
    pub saved_json_path: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CreateEntitiesResponse {
    #[serde(default)]
    pub entity_list: Vec<EntityTuple>,
    #[serde(default)]
    pub entity_list_output_path: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MultimodalEditResponse {
    #[serde(default)]
    pub entity_list: Vec<EntityTuple>,
    #[serde(default)]
    pub entity_list_path: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GenerateScenesResponse {
    #[serde(default)]
    pub scenes: Vec<Scene>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_scene_txt_path: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GenerateCutsResponse {
    /// Cuts grouped by scene, in scene order
    #[serde(default)]
    pub cut_list: Vec<Vec<Cut>>,
    #[serde(default)]
    pub cuts_output_path: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerateCutImagesResponse {
    #[serde(default)]
    pub cut_image_paths: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerateCutVideosResponse {
    #[serde(default)]
    pub video_clip_paths: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConcatVideosResponse {
    #[serde(default)]
    pub final_output_path: String,
}

/// Story text with the file it was read from
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoryText {
    #[serde(default)]
    pub text: String,
    #[serde(default = "StoryText::no_source")]
    pub source: String,
}

impl StoryText {
    fn no_source() -> String {
        "none".to_string()
    }
}

impl Default for StoryText {
    fn default() -> Self {
        Self {
            text: String::new(),
            source: Self::no_source(),
        }
    }
}

/// Generated image or clip for one cut, as listed by the load endpoints
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CutMedia {
    pub scene_num: u32,
    pub cut_num: u32,
    pub filename: String,
    pub path: String,
}

/// `GET /server-info`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerInfo {
    #[serde(default)]
    pub api_url: Option<String>,
}
