use clap::{Args, Parser, Subcommand, ValueEnum};
use cv_types::{ImageModel, ImageQuality, ImageSize, ImageStyle, ProjectState, TextModel, VideoModel};
use std::path::PathBuf;

pub mod load;
pub mod output;
pub mod pipeline;
pub mod project;

#[derive(Parser)]
#[command(name = "cv")]
#[command(about = "ConsistentVideo studio client", long_about = None)]
#[command(version = env!("CARGO_PKG_VERSION"))]
pub struct Cli {
    /// Backend address (falls back to studio.toml, then http://localhost:8000)
    #[arg(long, global = true, env = "PUBLIC_API_URL")]
    pub api_url: Option<String>,

    /// Host the studio is served from; probed for a backend on the LAN
    #[arg(long, global = true, env = "PAGE_HOST")]
    pub page_host: Option<String>,

    /// Always use --api-url, skip endpoint discovery
    #[arg(long, global = true)]
    pub no_discovery: bool,

    /// Directory holding the persisted project state
    #[arg(long, global = true, env = "CV_STATE_DIR", default_value = ".cv-state")]
    pub state_dir: PathBuf,

    /// Print the API request log after the command
    #[arg(long, global = true)]
    pub show_logs: bool,

    #[arg(long, global = true, env = "LOG_LEVEL", default_value = "info")]
    pub log_level: String,

    #[command(subcommand)]
    pub command: Commands,
}

/// Work directory and entity set, defaulting to the saved project
#[derive(Args, Debug, Clone, Default)]
pub struct ProjectArgs {
    #[arg(long)]
    pub work_dir: Option<String>,

    #[arg(long)]
    pub entity_set_name: Option<String>,
}

impl ProjectArgs {
    pub fn resolve(&self, state: &ProjectState) -> (String, String) {
        (
            self.work_dir.clone().unwrap_or_else(|| state.work_dir.clone()),
            self.entity_set_name
                .clone()
                .unwrap_or_else(|| state.entity_set_name.clone()),
        )
    }
}

/// Image rendering options, defaulting to the saved project
#[derive(Args, Debug, Clone, Default)]
pub struct ImageArgs {
    #[arg(long)]
    pub image_model: Option<ImageModel>,

    #[arg(long)]
    pub image_style: Option<ImageStyle>,

    #[arg(long)]
    pub image_quality: Option<ImageQuality>,

    #[arg(long)]
    pub image_size: Option<ImageSize>,
}

impl ImageArgs {
    pub fn resolve(&self, state: &ProjectState) -> (ImageModel, ImageStyle, ImageQuality, ImageSize) {
        (
            self.image_model.unwrap_or(state.default_image_model),
            self.image_style.unwrap_or(state.default_image_style),
            self.image_quality.unwrap_or(state.default_image_quality),
            self.image_size.unwrap_or(state.default_image_size),
        )
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Check that the backend answers
    Health,

    /// Show which backend address is in use
    Info,

    /// List entity sets under a work directory
    Projects {
        #[arg(long)]
        work_dir: Option<String>,
    },

    /// Load every artifact of the saved project and summarize it
    Status,

    /// Fetch existing artifacts of the current project
    Load {
        #[arg(value_enum)]
        what: LoadTarget,

        #[command(flatten)]
        project: ProjectArgs,
    },

    /// Extract entity drafts from a synopsis
    AnalyzeSynopsis(SynopsisArgs),

    /// Render reference images for entity drafts
    CreateEntities(CreateEntitiesArgs),

    /// Edit an existing entity, or add a new one with --add
    EditEntity(EditEntityArgs),

    /// Split story text into scenes
    GenerateScenes(ScenesArgs),

    /// Break scenes into cuts; uses the project's scenes unless a path is given
    GenerateCuts(CutsArgs),

    /// Render one image per cut
    GenerateCutImages(CutImagesArgs),

    /// Animate cut images into clips
    GenerateCutVideos(CutVideosArgs),

    /// Join clips into the final video
    ConcatVideos(ConcatArgs),

    /// Print media URLs
    Url {
        #[command(subcommand)]
        subcommand: UrlCommands,
    },

    /// Show or change the saved project
    Project {
        #[command(subcommand)]
        subcommand: ProjectCommands,
    },
}

#[derive(Args, Debug, Clone)]
pub struct SynopsisArgs {
    #[command(flatten)]
    pub project: ProjectArgs,

    /// Synopsis text
    #[arg(long, conflicts_with = "file")]
    pub text: Option<String>,

    /// Local synopsis file to upload
    #[arg(long)]
    pub file: Option<PathBuf>,

    /// Synopsis file already on the backend
    #[arg(long)]
    pub text_path: Option<String>,

    #[arg(long)]
    pub save_dir: Option<String>,

    #[arg(long)]
    pub text_model: Option<TextModel>,
}

#[derive(Args, Debug, Clone)]
pub struct CreateEntitiesArgs {
    #[command(flatten)]
    pub project: ProjectArgs,

    /// Local JSON file with the drafts from analyze-synopsis
    #[arg(long)]
    pub drafts: Option<PathBuf>,

    /// Draft JSON already on the backend
    #[arg(long)]
    pub draft_json_path: Option<String>,

    #[arg(long)]
    pub reference_image_dir: Option<String>,

    #[arg(long)]
    pub output_path: Option<String>,

    #[command(flatten)]
    pub image: ImageArgs,
}

#[derive(Args, Debug, Clone)]
pub struct EditEntityArgs {
    #[command(flatten)]
    pub project: ProjectArgs,

    #[arg(long)]
    pub add: bool,

    /// Position in the entity list (edit only)
    #[arg(long, required_unless_present = "add")]
    pub index: Option<u32>,

    #[arg(long = "type")]
    pub entity_type: Option<cv_types::EntityType>,

    #[arg(long)]
    pub name: Option<String>,

    #[arg(long)]
    pub description: Option<String>,

    #[arg(long)]
    pub extra_prompt: Option<String>,

    /// Local reference image to upload
    #[arg(long)]
    pub image_file: Option<PathBuf>,

    #[arg(long)]
    pub entity_list_path: Option<String>,

    #[arg(long)]
    pub reference_image_dir: Option<String>,

    #[arg(long)]
    pub text_model: Option<TextModel>,

    #[command(flatten)]
    pub image: ImageArgs,
}

#[derive(Args, Debug, Clone)]
pub struct ScenesArgs {
    #[command(flatten)]
    pub project: ProjectArgs,

    #[arg(long, conflicts_with = "story_file")]
    pub story_text: Option<String>,

    /// Local story file to upload
    #[arg(long)]
    pub story_file: Option<PathBuf>,

    #[arg(long)]
    pub story_text_path: Option<String>,

    #[arg(long)]
    pub output_path: Option<String>,

    #[arg(long)]
    pub text_model: Option<TextModel>,
}

#[derive(Args, Debug, Clone)]
pub struct CutsArgs {
    #[command(flatten)]
    pub project: ProjectArgs,

    #[arg(long)]
    pub scenes_txt_path: Option<String>,

    #[arg(long)]
    pub entity_list_path: Option<String>,

    #[arg(long)]
    pub story_text_path: Option<String>,

    #[arg(long)]
    pub output_path: Option<String>,

    #[arg(long)]
    pub text_model: Option<TextModel>,
}

#[derive(Args, Debug, Clone)]
pub struct CutImagesArgs {
    #[command(flatten)]
    pub project: ProjectArgs,

    /// Only this scene
    #[arg(long)]
    pub scene: Option<u32>,

    /// Only this cut (with --scene)
    #[arg(long, requires = "scene")]
    pub cut: Option<u32>,

    /// Cut ids such as S0001-C0002; repeatable
    #[arg(long = "select")]
    pub selected: Vec<String>,

    #[arg(long)]
    pub entity_list_path: Option<String>,

    #[arg(long)]
    pub cut_list_path: Option<String>,

    #[arg(long)]
    pub output_dir: Option<String>,

    #[arg(long)]
    pub entity_image_dir: Option<String>,

    #[command(flatten)]
    pub image: ImageArgs,
}

#[derive(Args, Debug, Clone)]
pub struct CutVideosArgs {
    #[command(flatten)]
    pub project: ProjectArgs,

    #[arg(long)]
    pub scene: Option<u32>,

    #[arg(long, requires = "scene")]
    pub cut: Option<u32>,

    /// Cut image to animate; repeatable
    #[arg(long = "image-path")]
    pub image_paths: Vec<String>,

    #[arg(long)]
    pub cut_image_dir: Option<String>,

    #[arg(long)]
    pub cut_list_path: Option<String>,

    #[arg(long)]
    pub output_dir: Option<String>,

    #[arg(long)]
    pub video_model: Option<VideoModel>,
}

#[derive(Args, Debug, Clone)]
pub struct ConcatArgs {
    #[command(flatten)]
    pub project: ProjectArgs,

    /// Clip to include, in order; repeatable
    #[arg(long = "clip")]
    pub clips: Vec<String>,

    #[arg(long)]
    pub clip_list_path: Option<String>,

    #[arg(long)]
    pub output_dir: Option<String>,

    #[arg(long)]
    pub final_output_path: Option<String>,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadTarget {
    Entities,
    Scenes,
    Cuts,
    Synopsis,
    Story,
    Images,
    Videos,
}

#[derive(Subcommand)]
pub enum UrlCommands {
    Image {
        relative_path: String,

        #[command(flatten)]
        project: ProjectArgs,
    },
    Video {
        relative_path: String,

        #[command(flatten)]
        project: ProjectArgs,
    },
    Final {
        #[command(flatten)]
        project: ProjectArgs,
    },
}

#[derive(Subcommand)]
pub enum ProjectCommands {
    Show,

    /// Update the given fields and keep the rest
    Set {
        #[arg(long)]
        work_dir: Option<String>,

        #[arg(long)]
        entity_set_name: Option<String>,

        #[arg(long)]
        text_model: Option<TextModel>,

        #[arg(long)]
        video_model: Option<VideoModel>,

        #[command(flatten)]
        image: ImageArgs,
    },

    /// Forget the saved project
    Reset,
}
