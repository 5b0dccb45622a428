use anyhow::{Result, anyhow};
use cv_api_client::StudioContext;
use tracing::info;

use crate::cli::output::print_json;
use crate::cli::{LoadTarget, ProjectArgs, UrlCommands};

pub async fn handle_health(ctx: &StudioContext) -> Result<()> {
    ctx.api.ready().await;
    let url = ctx.api.base_url();

    if ctx.api.check_health().await {
        println!("Backend at {} is healthy", url);
        Ok(())
    } else {
        Err(anyhow!("Backend at {} is not reachable", url))
    }
}

pub async fn handle_info(ctx: &StudioContext) -> Result<()> {
    ctx.api.ready().await;
    print_json(&ctx.api.debug_info())
}

pub async fn handle_projects(ctx: &StudioContext, work_dir: Option<String>) -> Result<()> {
    let work_dir = work_dir.unwrap_or_else(|| ctx.project.get().work_dir);
    ctx.api.ready().await;

    let projects = ctx.api.list_projects(&work_dir).await;
    if projects.is_empty() {
        println!("No projects under {:?}", work_dir);
    }
    for name in projects {
        println!("{}", name);
    }
    Ok(())
}

pub async fn handle_status(ctx: &StudioContext) -> Result<()> {
    let state = ctx.project.get();
    if state.work_dir.is_empty() || state.entity_set_name.is_empty() {
        return Err(anyhow!(
            "No project selected, run `cv project set --work-dir <dir> --entity-set-name <name>`"
        ));
    }

    ctx.api.ready().await;
    ctx.load_project().await;

    let cuts: usize = ctx.ui.cuts.with(|groups| groups.iter().map(Vec::len).sum());
    println!("Project {} in {}", state.entity_set_name, state.work_dir);
    println!("  entities: {}", ctx.ui.entity_list.with(Vec::len));
    println!("  scenes:   {}", ctx.ui.scenes.with(Vec::len));
    println!("  cuts:     {}", cuts);
    println!("  images:   {}", ctx.ui.cut_images.with(|images| images.len()));
    println!("  clips:    {}", ctx.ui.cut_videos.with(|videos| videos.len()));
    Ok(())
}

/// Fetch one kind of artifact, store it in the UI cells and print it
pub async fn handle_load(ctx: &StudioContext, what: LoadTarget, project: ProjectArgs) -> Result<()> {
    let (work_dir, set) = project.resolve(&ctx.project.get());
    ctx.api.ready().await;
    info!("Loading {:?} for {:?} in {:?}", what, set, work_dir);

    match what {
        LoadTarget::Entities => {
            let entities = ctx.api.load_entity_list(&work_dir, &set).await;
            ctx.ui.entity_list.set(entities);
            ctx.ui.entity_list.with(print_json)
        }
        LoadTarget::Scenes => {
            let scenes = ctx.api.load_scenes(&work_dir, &set).await;
            ctx.ui.scenes.set(scenes);
            ctx.ui.scenes.with(print_json)
        }
        LoadTarget::Cuts => {
            let cuts = ctx.api.load_cuts(&work_dir, &set).await;
            ctx.ui.cuts.set(cuts);
            ctx.ui.cuts.with(print_json)
        }
        LoadTarget::Synopsis => {
            println!("{}", ctx.api.load_synopsis_text(&work_dir, &set).await);
            Ok(())
        }
        LoadTarget::Story => print_json(&ctx.api.load_story_text(&work_dir, &set).await),
        LoadTarget::Images => {
            let images = ctx.api.load_cut_images(&work_dir, &set).await;
            ctx.ui.set_cut_images(&images);
            for image in &images {
                println!(
                    "{}\t{}",
                    cv_types::cut_id(image.scene_num, image.cut_num),
                    ctx.api.image_url(&work_dir, &set, &image.path)
                );
            }
            Ok(())
        }
        LoadTarget::Videos => {
            let videos = ctx.api.load_cut_videos(&work_dir, &set).await;
            ctx.ui.set_cut_videos(&videos);
            for video in &videos {
                println!(
                    "{}\t{}",
                    cv_types::cut_id(video.scene_num, video.cut_num),
                    ctx.api.video_url(&work_dir, &set, &video.path)
                );
            }
            Ok(())
        }
    }
}

pub async fn handle_url(ctx: &StudioContext, subcommand: UrlCommands) -> Result<()> {
    let state = ctx.project.get();
    let url = match subcommand {
        UrlCommands::Image {
            relative_path,
            project,
        } => {
            let (work_dir, set) = project.resolve(&state);
            ctx.api.image_url_async(&work_dir, &set, &relative_path).await
        }
        UrlCommands::Video {
            relative_path,
            project,
        } => {
            let (work_dir, set) = project.resolve(&state);
            ctx.api.video_url_async(&work_dir, &set, &relative_path).await
        }
        UrlCommands::Final { project } => {
            let (work_dir, set) = project.resolve(&state);
            ctx.api.final_video_url_async(&work_dir, &set).await
        }
    };
    println!("{}", url);
    Ok(())
}
