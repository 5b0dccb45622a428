//! `cv` - command line front end for the ConsistentVideo pipeline
//!
//! ## Usage
//!
//! ```bash
//! # Pick the project once; later commands default to it
//! cv project set --work-dir /data/work --entity-set-name harbor
//!
//! cv analyze-synopsis --file synopsis.txt
//! cv generate-scenes --story-file story.txt
//! cv generate-cuts
//! cv generate-cut-images --select S0001-C0001 --select S0001-C0002
//! cv load images --show-logs
//!
//! # Verbose client logs
//! RUST_LOG=debug cv health
//! ```
//!
//! ## Environment Variables
//!
//! - `PUBLIC_API_URL`: backend address (default: http://localhost:8000)
//! - `PAGE_HOST`: host probed for a LAN backend during discovery
//! - `CV_DISCOVERY_PORT`: port probed on `PAGE_HOST` (default: 8000)
//! - `CV_STATE_DIR`: where the project state is kept (default: .cv-state)
//! - `RUST_LOG`: log filter, overrides `--log-level`

mod cli;

use anyhow::{Result, anyhow};
use clap::Parser;
use cv_api_client::{ClientConfig, StudioContext, StudioToml};
use dotenvy::dotenv;
use tracing::debug;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::cli::{Cli, Commands, load, output, pipeline, project};

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (ignore if not found)
    dotenv().ok();

    let cli = Cli::parse();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                format!(
                    "cv={level},cv_api_client={level},cv_state={level},reqwest=warn",
                    level = cli.log_level
                )
                .into()
            }),
        )
        .with(tracing_subscriber::fmt::layer().with_target(true).with_writer(std::io::stderr))
        .init();

    // studio.toml, then the environment, then flags
    let config = StudioToml::try_load()
        .apply(ClientConfig::default())
        .with_env_overrides();
    let config = apply_flags(config, &cli);
    config
        .validate()
        .map_err(|e| anyhow!("Invalid client configuration: {}", e))?;
    debug!("Client configuration: {:?}", config);

    let ctx = StudioContext::file_backed(&cli.state_dir, config)?;
    let _banners = output::attach(&ctx.ui);
    ctx.ui.show_api_logs.set(cli.show_logs);

    let result = run(&ctx, cli.command).await;

    if ctx.ui.show_api_logs.get() {
        output::print_logs(&ctx.logs);
    }
    result
}

fn apply_flags(mut config: ClientConfig, cli: &Cli) -> ClientConfig {
    if let Some(api_url) = &cli.api_url {
        config = config.with_api_url(api_url.clone());
    }
    if let Some(page_host) = &cli.page_host {
        config = config.with_page_host(page_host.clone());
    }
    if cli.no_discovery {
        config = config.with_discovery(false);
    }
    config
}

async fn run(ctx: &StudioContext, command: Commands) -> Result<()> {
    match command {
        Commands::Health => load::handle_health(ctx).await,
        Commands::Info => load::handle_info(ctx).await,
        Commands::Projects { work_dir } => load::handle_projects(ctx, work_dir).await,
        Commands::Status => load::handle_status(ctx).await,
        Commands::Load { what, project } => load::handle_load(ctx, what, project).await,
        Commands::AnalyzeSynopsis(args) => pipeline::analyze_synopsis(ctx, args).await,
        Commands::CreateEntities(args) => pipeline::create_entities(ctx, args).await,
        Commands::EditEntity(args) => pipeline::edit_entity(ctx, args).await,
        Commands::GenerateScenes(args) => pipeline::generate_scenes(ctx, args).await,
        Commands::GenerateCuts(args) => pipeline::generate_cuts(ctx, args).await,
        Commands::GenerateCutImages(args) => pipeline::generate_cut_images(ctx, args).await,
        Commands::GenerateCutVideos(args) => pipeline::generate_cut_videos(ctx, args).await,
        Commands::ConcatVideos(args) => pipeline::concat_videos(ctx, args).await,
        Commands::Url { subcommand } => load::handle_url(ctx, subcommand).await,
        Commands::Project { subcommand } => project::handle_project_command(&ctx.project, subcommand),
    }
}
