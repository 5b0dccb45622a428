//! Request bodies for the multipart pipeline endpoints
//!
//! Every field maps one-to-one to a multipart form field of the same name.
//! Optional fields left as `None` are not sent at all. File uploads are kept
//! out of the serde representation and exposed through
//! [`MultipartRequest::files`] so the client can attach them as binary parts.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::Path;

use crate::entity::EntityType;
use crate::models::{ImageModel, ImageQuality, ImageSize, ImageStyle, TextModel, VideoModel};
use crate::story::Scene;

/// In-memory file attached to a request as a binary form part
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileUpload {
    pub file_name: String,
    pub mime: Option<String>,
    pub bytes: Vec<u8>,
}

impl FileUpload {
    pub fn new(file_name: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            file_name: file_name.into(),
            mime: None,
            bytes: bytes.into(),
        }
    }

    pub fn with_mime(mut self, mime: impl Into<String>) -> Self {
        self.mime = Some(mime.into());
        self
    }

    /// Read a file from disk, using its file name as the part name
    pub fn from_path(path: impl AsRef<Path>) -> std::io::Result<Self> {
        let path = path.as_ref();
        let bytes = std::fs::read(path)?;
        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| "upload".to_string());
        Ok(Self::new(file_name, bytes))
    }
}

/// A request that is sent as a multipart form
pub trait MultipartRequest: Serialize {
    /// File parts keyed by form field name
    fn files(&self) -> Vec<(&'static str, &FileUpload)> {
        Vec::new()
    }
}

fn collect_files<'a>(
    slots: impl IntoIterator<Item = (&'static str, &'a Option<FileUpload>)>,
) -> Vec<(&'static str, &'a FileUpload)> {
    slots
        .into_iter()
        .filter_map(|(name, file)| file.as_ref().map(|file| (name, file)))
        .collect()
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct SynopsisAnalyzeRequest {
    pub entity_set_name: Option<String>,
    pub work_dir: Option<String>,
    pub synopsis_text: Option<String>,
    pub synopsis_text_path: Option<String>,
    #[serde(skip)]
    pub synopsis_text_file: Option<FileUpload>,
    pub analyzer_save_dir: Option<String>,
    pub text_model: TextModel,
}

impl MultipartRequest for SynopsisAnalyzeRequest {
    fn files(&self) -> Vec<(&'static str, &FileUpload)> {
        collect_files([("synopsis_text_file", &self.synopsis_text_file)])
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct CreateEntitiesRequest {
    pub entity_set_name: Option<String>,
    pub work_dir: Option<String>,
    /// Drafts as returned by synopsis analysis, sent as one JSON field
    pub entity_dict_draft_list: Option<Vec<Value>>,
    pub entity_draft_json_path: Option<String>,
    #[serde(skip)]
    pub entity_draft_json_file: Option<FileUpload>,
    pub reference_image_dir: Option<String>,
    pub entity_list_output_path: Option<String>,
    pub image_model: ImageModel,
    pub image_style: ImageStyle,
    pub image_quality: ImageQuality,
    pub image_size: ImageSize,
}

impl MultipartRequest for CreateEntitiesRequest {
    fn files(&self) -> Vec<(&'static str, &FileUpload)> {
        collect_files([("entity_draft_json_file", &self.entity_draft_json_file)])
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MultimodalOperation {
    #[default]
    Edit,
    Add,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct MultimodalEditRequest {
    pub operation: MultimodalOperation,
    pub entity_set_name: Option<String>,
    pub work_dir: Option<String>,
    pub entity_list_path: Option<String>,
    pub reference_image_dir: Option<String>,
    /// Position in the entity list for `edit`
    pub index: Option<u32>,
    #[serde(rename = "type_")]
    pub entity_type: Option<EntityType>,
    pub name: Option<String>,
    pub description: Option<String>,
    pub extra_prompt: Option<String>,
    pub text_model: TextModel,
    pub image_model: ImageModel,
    pub image_style: ImageStyle,
    pub image_quality: ImageQuality,
    pub image_size: ImageSize,
    #[serde(skip)]
    pub image: Option<FileUpload>,
}

impl MultipartRequest for MultimodalEditRequest {
    fn files(&self) -> Vec<(&'static str, &FileUpload)> {
        collect_files([("image", &self.image)])
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct GenerateScenesRequest {
    pub entity_set_name: Option<String>,
    pub work_dir: Option<String>,
    pub story_text: Option<String>,
    pub story_text_path: Option<String>,
    #[serde(skip)]
    pub story_text_file: Option<FileUpload>,
    pub output_scene_txt_path: Option<String>,
    pub text_model: TextModel,
}

impl MultipartRequest for GenerateScenesRequest {
    fn files(&self) -> Vec<(&'static str, &FileUpload)> {
        collect_files([("story_text_file", &self.story_text_file)])
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct GenerateCutsRequest {
    pub entity_set_name: Option<String>,
    pub work_dir: Option<String>,
    pub scenes: Option<Vec<Scene>>,
    pub scenes_txt_path: Option<String>,
    #[serde(skip)]
    pub scenes_txt_file: Option<FileUpload>,
    pub entity_list_path: Option<String>,
    #[serde(skip)]
    pub entity_list_file: Option<FileUpload>,
    pub story_text: Option<String>,
    pub story_text_path: Option<String>,
    #[serde(skip)]
    pub story_text_file: Option<FileUpload>,
    pub cuts_output_path: Option<String>,
    pub text_model: TextModel,
}

impl MultipartRequest for GenerateCutsRequest {
    fn files(&self) -> Vec<(&'static str, &FileUpload)> {
        collect_files([
            ("scenes_txt_file", &self.scenes_txt_file),
            ("entity_list_file", &self.entity_list_file),
            ("story_text_file", &self.story_text_file),
        ])
    }
}

/// One (scene, cut) pair in a `selected_cuts` payload
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CutSelection {
    pub scene_num: u32,
    pub cut_num: u32,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct GenerateCutImagesRequest {
    pub entity_set_name: Option<String>,
    pub work_dir: Option<String>,
    pub entity_list_path: Option<String>,
    #[serde(skip)]
    pub entity_list_file: Option<FileUpload>,
    pub cut_list_path: Option<String>,
    #[serde(skip)]
    pub cut_list_file: Option<FileUpload>,
    pub cut_image_output_dir: Option<String>,
    pub entity_image_dir: Option<String>,
    pub image_model: ImageModel,
    pub image_style: ImageStyle,
    pub image_quality: ImageQuality,
    pub image_size: ImageSize,
    pub scene_num: Option<u32>,
    pub cut_num: Option<u32>,
    pub selected_cuts: Option<Vec<CutSelection>>,
}

impl MultipartRequest for GenerateCutImagesRequest {
    fn files(&self) -> Vec<(&'static str, &FileUpload)> {
        collect_files([
            ("entity_list_file", &self.entity_list_file),
            ("cut_list_file", &self.cut_list_file),
        ])
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct GenerateCutVideosRequest {
    pub entity_set_name: Option<String>,
    pub work_dir: Option<String>,
    pub cut_image_dir: Option<String>,
    pub cut_image_paths: Option<Vec<String>>,
    pub cut_list_path: Option<String>,
    #[serde(skip)]
    pub cut_list_file: Option<FileUpload>,
    pub video_output_dir: Option<String>,
    pub video_model: VideoModel,
    pub scene_num: Option<u32>,
    pub cut_num: Option<u32>,
}

impl MultipartRequest for GenerateCutVideosRequest {
    fn files(&self) -> Vec<(&'static str, &FileUpload)> {
        collect_files([("cut_list_file", &self.cut_list_file)])
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ConcatVideosRequest {
    pub entity_set_name: Option<String>,
    pub work_dir: Option<String>,
    pub video_clip_paths: Option<Vec<String>>,
    pub video_output_dir: Option<String>,
    pub clip_list_path: Option<String>,
    pub final_output_path: Option<String>,
}

impl MultipartRequest for ConcatVideosRequest {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_fields_are_not_serialized() {
        let request = SynopsisAnalyzeRequest {
            synopsis_text_file: Some(FileUpload::new("synopsis.txt", b"Once upon".to_vec())),
            ..Default::default()
        };

        let value = serde_json::to_value(&request).unwrap();
        assert!(value.get("synopsis_text_file").is_none());

        let files = request.files();
        assert_eq!(files.len(), 1);
        assert_eq!(files[0].0, "synopsis_text_file");
        assert_eq!(files[0].1.file_name, "synopsis.txt");
    }

    #[test]
    fn test_multimodal_type_field_keeps_wire_name() {
        let request = MultimodalEditRequest {
            operation: MultimodalOperation::Add,
            entity_type: Some(EntityType::Location),
            ..Default::default()
        };
        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value["type_"], "location");
        assert_eq!(value["operation"], "add");
    }

    #[test]
    fn test_only_present_files_are_listed() {
        let request = GenerateCutsRequest {
            entity_list_file: Some(FileUpload::new("entities.json", b"[]".to_vec())),
            ..Default::default()
        };
        let names: Vec<_> = request.files().into_iter().map(|(name, _)| name).collect();
        assert_eq!(names, vec!["entity_list_file"]);
    }
}
