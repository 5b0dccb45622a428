use anyhow::{Context, Result};
use cv_state::ProjectStateStore;
use cv_types::{ProjectState, TextModel, VideoModel};
use tracing::info;

use crate::cli::output::print_json;
use crate::cli::{ImageArgs, ProjectCommands};

pub fn handle_project_command(project: &ProjectStateStore, subcommand: ProjectCommands) -> Result<()> {
    match subcommand {
        ProjectCommands::Show => print_json(&project.get()),
        ProjectCommands::Set {
            work_dir,
            entity_set_name,
            text_model,
            video_model,
            image,
        } => {
            let changes = ProjectChanges {
                work_dir,
                entity_set_name,
                text_model,
                video_model,
                image,
            };
            project
                .update(|state| changes.apply(state))
                .context("Failed to save project state")?;
            info!("Project state saved");
            print_json(&project.get())
        }
        ProjectCommands::Reset => {
            project.reset().context("Failed to reset project state")?;
            println!("Project state reset to defaults");
            Ok(())
        }
    }
}

/// Fields given on the command line; everything else is kept
struct ProjectChanges {
    work_dir: Option<String>,
    entity_set_name: Option<String>,
    text_model: Option<TextModel>,
    video_model: Option<VideoModel>,
    image: ImageArgs,
}

impl ProjectChanges {
    fn apply(self, state: ProjectState) -> ProjectState {
        let (image_model, image_style, image_quality, image_size) = self.image.resolve(&state);
        ProjectState {
            work_dir: self.work_dir.unwrap_or(state.work_dir),
            entity_set_name: self.entity_set_name.unwrap_or(state.entity_set_name),
            default_text_model: self.text_model.unwrap_or(state.default_text_model),
            default_video_model: self.video_model.unwrap_or(state.default_video_model),
            default_image_model: image_model,
            default_image_style: image_style,
            default_image_quality: image_quality,
            default_image_size: image_size,
        }
    }
}
