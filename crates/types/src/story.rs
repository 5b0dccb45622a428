//! Scenes, cuts and the composite cut id

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::TypesError;

/// A narrative unit produced from story text
///
/// The backend passes model output through, so every known field is
/// optional. Anything beyond them is kept in `extra` so a load-edit-save
/// cycle does not drop it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scene {
    /// Scene generators emit `scene_id`; the studio writes `scene_number`
    #[serde(default, alias = "scene_id")]
    pub scene_number: u32,
    #[serde(default)]
    pub description: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A shot-level unit within a scene
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cut {
    #[serde(default)]
    pub cut_id: u32,
    #[serde(default)]
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entities: Option<Vec<String>>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Composite key for a (scene, cut) pair: `S0003-C0012`
pub fn cut_id(scene_num: u32, cut_num: u32) -> String {
    format!("S{:04}-C{:04}", scene_num, cut_num)
}

/// Inverse of [`cut_id`]
pub fn parse_cut_id(id: &str) -> Result<(u32, u32), TypesError> {
    let malformed = || TypesError::MalformedCutId(id.to_string());

    let (scene, cut) = id.split_once('-').ok_or_else(malformed)?;
    let scene = scene.strip_prefix('S').ok_or_else(malformed)?;
    let cut = cut.strip_prefix('C').ok_or_else(malformed)?;

    let scene_num = scene.parse::<u32>().map_err(|_| malformed())?;
    let cut_num = cut.parse::<u32>().map_err(|_| malformed())?;
    Ok((scene_num, cut_num))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cut_id_is_zero_padded() {
        assert_eq!(cut_id(3, 12), "S0003-C0012");
        assert_eq!(cut_id(0, 0), "S0000-C0000");
        // Wider numbers are not truncated
        assert_eq!(cut_id(12345, 1), "S12345-C0001");
    }

    #[test]
    fn test_parse_cut_id() {
        assert_eq!(parse_cut_id("S0003-C0012").unwrap(), (3, 12));
        assert!(parse_cut_id("S3C12").is_err());
        assert!(parse_cut_id("X0003-C0012").is_err());
        assert!(parse_cut_id("S00a3-C0012").is_err());
    }

    #[test]
    fn test_scene_keeps_unknown_fields() {
        let json = r#"{"scene_number":2,"description":"Night market","mood":"tense"}"#;
        let scene: Scene = serde_json::from_str(json).unwrap();
        assert_eq!(scene.scene_number, 2);
        assert_eq!(scene.extra.get("mood"), Some(&Value::from("tense")));
    }

    #[test]
    fn test_generated_scene_shape() {
        let json = r#"{"scene_id":1,"title":"Dawn","description":"Harbor at dawn"}"#;
        let scene: Scene = serde_json::from_str(json).unwrap();
        assert_eq!(scene.scene_number, 1);
        assert_eq!(scene.description, "Harbor at dawn");
        assert_eq!(scene.extra.get("title"), Some(&Value::from("Dawn")));
        assert!(!scene.extra.contains_key("scene_id"));

        let scene: Scene = serde_json::from_str(r#"{"title":"Untitled"}"#).unwrap();
        assert_eq!(scene.scene_number, 0);
        assert_eq!(scene.description, "");
    }

    #[test]
    fn test_cut_fields_are_optional() {
        let cut: Cut =
            serde_json::from_str(r#"{"characters":[],"background":"Quiet street"}"#).unwrap();
        assert_eq!(cut.cut_id, 0);
        assert_eq!(cut.description, "");
        assert_eq!(cut.extra.get("background"), Some(&Value::from("Quiet street")));
    }

    #[test]
    fn test_cut_entities_are_optional() {
        let cut: Cut = serde_json::from_str(r#"{"cut_id":1,"description":"Wide shot"}"#).unwrap();
        assert!(cut.entities.is_none());

        let cut: Cut =
            serde_json::from_str(r#"{"cut_id":2,"description":"Close up","entities":["Mina"]}"#)
                .unwrap();
        assert_eq!(cut.entities.as_deref(), Some(&["Mina".to_string()][..]));
    }
}
