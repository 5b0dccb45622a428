//! Pipeline stage commands
//!
//! Each command fills its request from the flags, falling back to the saved
//! project for locations and model choices, then writes the response into
//! the UI cells.

use anyhow::{Context, Result};
use cv_api_client::StudioContext;
use cv_types::{
    ConcatVideosRequest, CreateEntitiesRequest, FileUpload, GenerateCutImagesRequest,
    GenerateCutVideosRequest, GenerateCutsRequest, GenerateScenesRequest, MultimodalEditRequest,
    MultimodalOperation, SynopsisAnalyzeRequest, parse_cut_id,
};
use serde_json::Value;
use std::future::Future;
use std::path::Path;
use tracing::{debug, info};

use crate::cli::output::print_json;
use crate::cli::{
    ConcatArgs, CreateEntitiesArgs, CutImagesArgs, CutVideosArgs, CutsArgs, EditEntityArgs,
    ScenesArgs, SynopsisArgs,
};

/// `Some` unless empty, so unset project fields are not sent
fn non_empty(value: String) -> Option<String> {
    if value.is_empty() { None } else { Some(value) }
}

fn upload(path: Option<&Path>) -> Result<Option<FileUpload>> {
    path.map(|path| {
        FileUpload::from_path(path).with_context(|| format!("Failed to read {}", path.display()))
    })
    .transpose()
}

/// Run one backend call with the loading indicator up, reporting failures
async fn run_stage<T>(
    ctx: &StudioContext,
    loading: &str,
    call: impl Future<Output = cv_api_client::Result<T>>,
) -> Result<T> {
    ctx.ui.set_loading(true, loading);
    let result = call.await;
    ctx.ui.set_loading(false, "");

    result.map_err(|e| {
        ctx.ui.show_error(e.to_string());
        e.into()
    })
}

pub async fn analyze_synopsis(ctx: &StudioContext, args: SynopsisArgs) -> Result<()> {
    let state = ctx.project.get();
    let (work_dir, set) = args.project.resolve(&state);

    let request = SynopsisAnalyzeRequest {
        entity_set_name: non_empty(set),
        work_dir: non_empty(work_dir),
        synopsis_text: args.text,
        synopsis_text_path: args.text_path,
        synopsis_text_file: upload(args.file.as_deref())?,
        analyzer_save_dir: args.save_dir,
        text_model: args.text_model.unwrap_or(state.default_text_model),
    };

    ctx.api.ready().await;
    let response = run_stage(ctx, "Analyzing synopsis...", ctx.api.analyze_synopsis(&request)).await?;

    ctx.ui.current_step.set(1);
    ctx.ui.show_success(format!(
        "Found {} entity drafts",
        response.entity_dict_draft_list.len()
    ));
    print_json(&response)
}

pub async fn create_entities(ctx: &StudioContext, args: CreateEntitiesArgs) -> Result<()> {
    let state = ctx.project.get();
    let (work_dir, set) = args.project.resolve(&state);
    let (image_model, image_style, image_quality, image_size) = args.image.resolve(&state);

    let drafts = match &args.drafts {
        Some(path) => {
            let raw = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read {}", path.display()))?;
            Some(parse_drafts(&raw).with_context(|| format!("Invalid drafts in {}", path.display()))?)
        }
        None => None,
    };

    let request = CreateEntitiesRequest {
        entity_set_name: non_empty(set),
        work_dir: non_empty(work_dir),
        entity_dict_draft_list: drafts,
        entity_draft_json_path: args.draft_json_path,
        entity_draft_json_file: None,
        reference_image_dir: args.reference_image_dir,
        entity_list_output_path: args.output_path,
        image_model,
        image_style,
        image_quality,
        image_size,
    };

    ctx.api.ready().await;
    let response = run_stage(ctx, "Creating entities...", ctx.api.create_entities(&request)).await?;

    ctx.ui.entity_list.set(response.entity_list.clone());
    ctx.ui.current_step.set(2);
    ctx.ui
        .show_success(format!("Created {} entities", response.entity_list.len()));
    print_json(&response)
}

/// Accept either a bare draft array or a full analyze-synopsis response
fn parse_drafts(raw: &str) -> Result<Vec<Value>> {
    match serde_json::from_str::<Value>(raw)? {
        Value::Array(drafts) => Ok(drafts),
        Value::Object(mut body) => match body.remove("entity_dict_draft_list") {
            Some(Value::Array(drafts)) => Ok(drafts),
            _ => anyhow::bail!("expected an entity_dict_draft_list array"),
        },
        _ => anyhow::bail!("expected a JSON array of drafts"),
    }
}

pub async fn edit_entity(ctx: &StudioContext, args: EditEntityArgs) -> Result<()> {
    let state = ctx.project.get();
    let (work_dir, set) = args.project.resolve(&state);
    let (image_model, image_style, image_quality, image_size) = args.image.resolve(&state);
    let operation = if args.add {
        MultimodalOperation::Add
    } else {
        MultimodalOperation::Edit
    };

    let request = MultimodalEditRequest {
        operation,
        entity_set_name: non_empty(set),
        work_dir: non_empty(work_dir),
        entity_list_path: args.entity_list_path,
        reference_image_dir: args.reference_image_dir,
        index: args.index,
        entity_type: args.entity_type,
        name: args.name,
        description: args.description,
        extra_prompt: args.extra_prompt,
        text_model: args.text_model.unwrap_or(state.default_text_model),
        image_model,
        image_style,
        image_quality,
        image_size,
        image: upload(args.image_file.as_deref())?,
    };

    ctx.api.ready().await;
    let response = run_stage(ctx, "Updating entity...", ctx.api.multimodal_edit(&request)).await?;

    ctx.ui.entity_list.set(response.entity_list.clone());
    ctx.ui.show_success(match operation {
        MultimodalOperation::Edit => "Entity updated",
        MultimodalOperation::Add => "Entity added",
    });
    print_json(&response)
}

pub async fn generate_scenes(ctx: &StudioContext, args: ScenesArgs) -> Result<()> {
    let state = ctx.project.get();
    let (work_dir, set) = args.project.resolve(&state);

    let request = GenerateScenesRequest {
        entity_set_name: non_empty(set),
        work_dir: non_empty(work_dir),
        story_text: args.story_text,
        story_text_path: args.story_text_path,
        story_text_file: upload(args.story_file.as_deref())?,
        output_scene_txt_path: args.output_path,
        text_model: args.text_model.unwrap_or(state.default_text_model),
    };

    ctx.api.ready().await;
    let response = run_stage(ctx, "Generating scenes...", ctx.api.generate_scenes(&request)).await?;

    ctx.ui.scenes.set(response.scenes.clone());
    ctx.ui.current_step.set(3);
    ctx.ui
        .show_success(format!("Generated {} scenes", response.scenes.len()));
    print_json(&response)
}

pub async fn generate_cuts(ctx: &StudioContext, args: CutsArgs) -> Result<()> {
    let state = ctx.project.get();
    let (work_dir, set) = args.project.resolve(&state);
    ctx.api.ready().await;

    // Without an explicit scene file, send the scenes the backend already has
    let scenes = match &args.scenes_txt_path {
        Some(_) => None,
        None => {
            let scenes = ctx.api.load_scenes(&work_dir, &set).await;
            debug!("Sending {} loaded scenes", scenes.len());
            ctx.ui.scenes.set(scenes.clone());
            non_empty_vec(scenes)
        }
    };

    let request = GenerateCutsRequest {
        entity_set_name: non_empty(set),
        work_dir: non_empty(work_dir),
        scenes,
        scenes_txt_path: args.scenes_txt_path,
        entity_list_path: args.entity_list_path,
        story_text_path: args.story_text_path,
        cuts_output_path: args.output_path,
        text_model: args.text_model.unwrap_or(state.default_text_model),
        ..Default::default()
    };

    let response = run_stage(ctx, "Generating cuts...", ctx.api.generate_cuts(&request)).await?;

    let total: usize = response.cut_list.iter().map(Vec::len).sum();
    ctx.ui.cuts.set(response.cut_list.clone());
    ctx.ui.current_step.set(4);
    ctx.ui.show_success(format!(
        "Generated {} cuts across {} scenes",
        total,
        response.cut_list.len()
    ));
    print_json(&response)
}

fn non_empty_vec<T>(items: Vec<T>) -> Option<Vec<T>> {
    if items.is_empty() { None } else { Some(items) }
}

pub async fn generate_cut_images(ctx: &StudioContext, args: CutImagesArgs) -> Result<()> {
    let state = ctx.project.get();
    let (work_dir, set) = args.project.resolve(&state);
    let (image_model, image_style, image_quality, image_size) = args.image.resolve(&state);

    for id in &args.selected {
        let (scene_num, cut_num) =
            parse_cut_id(id).with_context(|| format!("Invalid --select value {:?}", id))?;
        ctx.ui.toggle_cut(scene_num, cut_num);
    }
    let selected = non_empty_vec(ctx.ui.selected_cut_list());

    let request = GenerateCutImagesRequest {
        entity_set_name: non_empty(set.clone()),
        work_dir: non_empty(work_dir.clone()),
        entity_list_path: args.entity_list_path,
        cut_list_path: args.cut_list_path,
        cut_image_output_dir: args.output_dir,
        entity_image_dir: args.entity_image_dir,
        image_model,
        image_style,
        image_quality,
        image_size,
        scene_num: args.scene,
        cut_num: args.cut,
        selected_cuts: selected,
        ..Default::default()
    };

    ctx.api.ready().await;
    let response = run_stage(
        ctx,
        "Generating cut images...",
        ctx.api.generate_cut_images(&request),
    )
    .await?;

    // Refresh the id -> path map from the backend listing
    let images = ctx.api.load_cut_images(&work_dir, &set).await;
    ctx.ui.set_cut_images(&images);
    ctx.ui.current_step.set(5);
    ctx.ui.show_success(format!(
        "Generated {} cut images",
        response.cut_image_paths.len()
    ));
    print_json(&response)
}

pub async fn generate_cut_videos(ctx: &StudioContext, args: CutVideosArgs) -> Result<()> {
    let state = ctx.project.get();
    let (work_dir, set) = args.project.resolve(&state);

    let request = GenerateCutVideosRequest {
        entity_set_name: non_empty(set.clone()),
        work_dir: non_empty(work_dir.clone()),
        cut_image_dir: args.cut_image_dir,
        cut_image_paths: non_empty_vec(args.image_paths),
        cut_list_path: args.cut_list_path,
        cut_list_file: None,
        video_output_dir: args.output_dir,
        video_model: args.video_model.unwrap_or(state.default_video_model),
        scene_num: args.scene,
        cut_num: args.cut,
    };

    ctx.api.ready().await;
    let response = run_stage(
        ctx,
        "Generating cut videos...",
        ctx.api.generate_cut_videos(&request),
    )
    .await?;

    let videos = ctx.api.load_cut_videos(&work_dir, &set).await;
    ctx.ui.set_cut_videos(&videos);
    ctx.ui.current_step.set(6);
    ctx.ui.show_success(format!(
        "Generated {} clips",
        response.video_clip_paths.len()
    ));
    print_json(&response)
}

pub async fn concat_videos(ctx: &StudioContext, args: ConcatArgs) -> Result<()> {
    let state = ctx.project.get();
    let (work_dir, set) = args.project.resolve(&state);

    let request = ConcatVideosRequest {
        entity_set_name: non_empty(set.clone()),
        work_dir: non_empty(work_dir.clone()),
        video_clip_paths: non_empty_vec(args.clips),
        video_output_dir: args.output_dir,
        clip_list_path: args.clip_list_path,
        final_output_path: args.final_output_path,
    };

    ctx.api.ready().await;
    let response = run_stage(ctx, "Concatenating videos...", ctx.api.concat_videos(&request)).await?;

    ctx.ui.final_video_path.set(response.final_output_path.clone());
    ctx.ui.current_step.set(7);
    ctx.ui.show_success("Final video ready");
    info!("Final video: {}", ctx.api.final_video_url(&work_dir, &set));
    print_json(&response)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_drafts_accepts_both_shapes() {
        let bare = parse_drafts(r#"[{"name":"Mara"},{"name":"Lighthouse"}]"#).unwrap();
        assert_eq!(bare.len(), 2);

        let wrapped =
            parse_drafts(r#"{"entity_dict_draft_list":[{"name":"Mara"}],"saved_txt_path":"a"}"#)
                .unwrap();
        assert_eq!(wrapped.len(), 1);

        assert!(parse_drafts(r#"{"drafts":[]}"#).is_err());
        assert!(parse_drafts("42").is_err());
    }

    #[test]
    fn test_upload_reads_local_files() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let path = temp_dir.path().join("story.txt");
        std::fs::write(&path, "Storm over the harbor").unwrap();

        let file = upload(Some(path.as_path())).unwrap().unwrap();
        assert_eq!(file.file_name, "story.txt");
        assert_eq!(file.bytes, b"Storm over the harbor");

        assert!(upload(None).unwrap().is_none());
        assert!(upload(Some(temp_dir.path().join("missing.txt").as_path())).is_err());
    }

    #[test]
    fn test_empty_values_are_not_sent() {
        assert_eq!(non_empty(String::new()), None);
        assert_eq!(non_empty("/w".to_string()), Some("/w".to_string()));
        assert_eq!(non_empty_vec::<u8>(Vec::new()), None);
    }
}
