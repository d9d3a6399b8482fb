use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::{Args, Parser, Subcommand};
use ic_core::format::{from_json, to_json};
use ic_core::{CanvasConfig, ConfigError, FormatError, Scene};
use ic_editor::services::{LocalSuggester, MemoryStore, ServiceError, Suggester};
use ic_editor::{Notice, Services, Session};
use ic_render::{ExportMode, default_filename};
use tokio::runtime::Handle;

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error("io error on {path}: {source}")]
    Io { path: PathBuf, source: std::io::Error },
    #[error("config: {0}")]
    Config(#[from] ConfigError),
    #[error("project file: {0}")]
    Format(#[from] FormatError),
    #[error(transparent)]
    Service(#[from] ServiceError),
    #[error("image generation is not configured; set IC_OPENAI_API_KEY")]
    GeneratorUnavailable,
    #[error("image generation failed: {0}")]
    GenerationFailed(String),
}

#[derive(Parser, Debug)]
#[command(name = "ic", about = "Inspect, export and extend Infinite Canvas projects")]
struct Cli {
    /// JSON canvas config; `IC_*` variables override it.
    #[arg(long, env = "IC_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print object counts for a project.
    Info { project: PathBuf },
    /// Render a project to PNG.
    Export(ExportCommand),
    /// Print design suggestions for a project.
    Suggest {
        project: PathBuf,
        #[arg(long, default_value = "")]
        prompt: String,
    },
    /// Generate an image and append it to a project.
    Generate(GenerateCommand),
}

#[derive(Args, Debug)]
struct ExportCommand {
    project: PathBuf,
    /// Output path; defaults to `<project name>_drawing.png`.
    #[arg(short, long)]
    output: Option<PathBuf>,
    /// Crop to content plus the configured padding.
    #[arg(long)]
    cropped: bool,
    /// Keep the background transparent.
    #[arg(long)]
    transparent: bool,
}

#[derive(Args, Debug)]
struct GenerateCommand {
    project: PathBuf,
    /// Defaults to a description of the project's shapes.
    #[arg(long)]
    prompt: Option<String>,
    /// Where to write the updated project; defaults to overwriting it.
    #[arg(short, long)]
    output: Option<PathBuf>,
}

#[tokio::main]
async fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();
    if let Err(e) = run(cli).await {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), CliError> {
    let config = load_config(cli.config.as_deref())?;
    match cli.command {
        Command::Info { project } => info(&project),
        Command::Export(cmd) => export(config, cmd).await,
        Command::Suggest { project, prompt } => suggest(&project, &prompt).await,
        Command::Generate(cmd) => generate(config, cmd).await,
    }
}

fn load_config(path: Option<&Path>) -> Result<CanvasConfig, CliError> {
    match path {
        Some(path) => Ok(CanvasConfig::load(path)?),
        None => Ok(CanvasConfig::from_env()?),
    }
}

fn read_project(path: &Path) -> Result<Scene, CliError> {
    let text = std::fs::read_to_string(path).map_err(|source| CliError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(from_json(&text)?)
}

fn project_name(path: &Path) -> String {
    path.file_stem().map(|s| s.to_string_lossy().into_owned()).unwrap_or_default()
}

/// A session holding `scene`, with every image asset loaded.
async fn open_session(config: CanvasConfig, services: Services, scene: Scene, name: String) -> Session {
    let mut session = Session::new(config, services, Handle::current());
    session.set_project("cli", name);
    session.controller_mut().load_scene(scene);
    session.settle().await;
    for notice in session.take_notices() {
        if let Notice::AssetFailed { url, reason } = notice {
            log::warn!("image {url} will be skipped: {reason}");
        }
    }
    session
}

fn info(project: &Path) -> Result<(), CliError> {
    let scene = read_project(project)?;
    let summary = scene.summary();
    println!("{}", project.display());
    println!("  canvas:     {}x{}", scene.ink().width(), scene.ink().height());
    println!("  rectangles: {}", summary.rectangles);
    println!("  circles:    {}", summary.circles);
    println!("  lines:      {}", summary.lines);
    println!("  texts:      {}", summary.texts);
    println!("  images:     {}", summary.images);
    println!("  ink:        {}", if summary.has_ink { "yes" } else { "no" });
    Ok(())
}

async fn export(config: CanvasConfig, cmd: ExportCommand) -> Result<(), CliError> {
    let scene = read_project(&cmd.project)?;
    let name = project_name(&cmd.project);
    let services = Services::local(Arc::new(MemoryStore::new()))?;
    let mut session = open_session(config, services, scene, name).await;
    if cmd.transparent {
        session.controller_mut().set_transparent_background(true);
    }

    let mode = if cmd.cropped {
        ExportMode::CroppedToContent
    } else {
        ExportMode::FullCanvas
    };
    let png = session.export_png(mode)?;
    let output = cmd
        .output
        .unwrap_or_else(|| PathBuf::from(default_filename(session.project_name())));
    std::fs::write(&output, &png).map_err(|source| CliError::Io {
        path: output.clone(),
        source,
    })?;
    log::info!("wrote {} ({} bytes)", output.display(), png.len());
    Ok(())
}

async fn suggest(project: &Path, prompt: &str) -> Result<(), CliError> {
    let scene = read_project(project)?;
    let text = LocalSuggester::new().suggest(prompt, &scene.summary()).await?;
    println!("{text}");
    Ok(())
}

async fn generate(config: CanvasConfig, cmd: GenerateCommand) -> Result<(), CliError> {
    let scene = read_project(&cmd.project)?;
    let name = project_name(&cmd.project);
    let services = Services::from_env(Arc::new(MemoryStore::new()))?;
    let mut session = open_session(config, services, scene, name).await;

    if session.request_generation(cmd.prompt.as_deref()).is_none() {
        return Err(CliError::GeneratorUnavailable);
    }
    session.settle().await;
    for notice in session.take_notices() {
        match notice {
            Notice::GenerationFailed(reason) => return Err(CliError::GenerationFailed(reason)),
            Notice::AssetFailed { url, reason } => log::warn!("generated image {url} did not load: {reason}"),
            _ => {}
        }
    }

    let output = cmd.output.unwrap_or(cmd.project);
    let json = to_json(session.scene())?;
    std::fs::write(&output, json).map_err(|source| CliError::Io {
        path: output.clone(),
        source,
    })?;
    log::info!("wrote {} with {} objects", output.display(), session.scene().len());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn config_file_loads_the_same_as_the_library() {
        let path = std::env::temp_dir().join(format!("ic-cli-config-{}.json", std::process::id()));
        std::fs::write(&path, r#"{"width": 640, "height": 480}"#).unwrap();
        let loaded = load_config(Some(&path)).unwrap();
        let direct = CanvasConfig::load(&path).unwrap();
        std::fs::remove_file(&path).unwrap();
        assert_eq!(loaded, direct);
        if std::env::var_os("IC_CANVAS_WIDTH").is_none() {
            assert_eq!(loaded.width, 640);
        }
    }

    #[test]
    fn missing_config_file_is_an_error() {
        let err = load_config(Some(Path::new("/nonexistent/ic-config.json"))).unwrap_err();
        assert!(matches!(err, CliError::Config(_)), "got {err}");
    }
}
