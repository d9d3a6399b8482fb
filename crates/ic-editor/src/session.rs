//! Editor session: controller + renderer + asset cache + background jobs.
//!
//! The session is what a host embeds. It forwards input to the controller,
//! keeps image assets loading, and applies collaborator results in
//! [`Session::pump`], between events, so the controller never observes a
//! half-finished async operation.

use crate::controller::{Action, Actions, Controller};
use crate::input::InputEvent;
use crate::jobs::{JobId, JobOutput, JobResult, Jobs};
use crate::services::{
    AssetLoader, DefaultAssetLoader, ImageGenerator, LocalSuggester, OpenAiImageGenerator, ProjectStore,
    ServiceError, ServiceResult, Suggester, describe_scene,
};
use crate::tools::ToolKind;
use ic_core::{CanvasConfig, Scene, deserialize_scene, serialize_scene};
use ic_render::{AssetCache, ExportMode, ExportOptions, FontBook, Renderer, default_filename};
use image::RgbaImage;
use kurbo::Rect;
use std::sync::Arc;
use tokio::runtime::Handle;

/// Where a generated image lands on the canvas.
pub const GENERATED_IMAGE_RECT: Rect = Rect::new(50.0, 50.0, 350.0, 350.0);

const DEFAULT_PROJECT_KEY: &str = "default";

/// The collaborators a session talks to.
#[derive(Clone)]
pub struct Services {
    pub store: Arc<dyn ProjectStore>,
    /// `None` when no generation backend is configured.
    pub generator: Option<Arc<dyn ImageGenerator>>,
    pub suggester: Arc<dyn Suggester>,
    pub loader: Arc<dyn AssetLoader>,
}

impl Services {
    /// Local suggestions, the default asset loader, no generator.
    pub fn local(store: Arc<dyn ProjectStore>) -> ServiceResult<Self> {
        Ok(Self {
            store,
            generator: None,
            suggester: Arc::new(LocalSuggester::new()),
            loader: Arc::new(DefaultAssetLoader::new()?),
        })
    }

    /// Like [`Services::local`], plus the OpenAI generator when
    /// `IC_OPENAI_API_KEY` is set.
    pub fn from_env(store: Arc<dyn ProjectStore>) -> ServiceResult<Self> {
        let mut services = Self::local(store)?;
        match OpenAiImageGenerator::from_env() {
            Ok(generator) => services.generator = Some(Arc::new(generator)),
            Err(ServiceError::MissingConfig(key)) => log::info!("image generation disabled: {key} not set"),
            Err(e) => return Err(e),
        }
        Ok(services)
    }

    pub fn with_generator(mut self, generator: Arc<dyn ImageGenerator>) -> Self {
        self.generator = Some(generator);
        self
    }
}

/// User-facing messages produced outside the event loop.
#[derive(Debug, Clone, PartialEq)]
pub enum Notice {
    Suggestion(String),
    GenerationFailed(String),
    GenerationUnavailable,
    SuggestionFailed(String),
    AssetFailed { url: String, reason: String },
}

pub struct Session {
    config: CanvasConfig,
    controller: Controller,
    renderer: Renderer,
    assets: AssetCache,
    jobs: Jobs,
    services: Services,
    notices: Vec<Notice>,
    project_key: String,
    project_name: String,
}

impl Session {
    pub fn new(config: CanvasConfig, services: Services, runtime: Handle) -> Self {
        let fonts = FontBook::load_or_fallback(config.font_path.as_deref());
        Self {
            controller: Controller::new(&config),
            renderer: Renderer::new(fonts),
            assets: AssetCache::new(),
            jobs: Jobs::new(runtime),
            services,
            notices: Vec::new(),
            project_key: DEFAULT_PROJECT_KEY.to_string(),
            project_name: String::new(),
            config,
        }
    }

    // ─── Accessors ───────────────────────────────────────────────────────

    pub fn config(&self) -> &CanvasConfig {
        &self.config
    }

    pub fn controller(&self) -> &Controller {
        &self.controller
    }

    /// Direct controller access. Call [`Session::pump`] afterwards if the
    /// change could bring new images into the scene.
    pub fn controller_mut(&mut self) -> &mut Controller {
        &mut self.controller
    }

    pub fn scene(&self) -> &Scene {
        self.controller.scene()
    }

    pub fn renderer(&self) -> &Renderer {
        &self.renderer
    }

    pub fn assets(&self) -> &AssetCache {
        &self.assets
    }

    pub fn jobs(&self) -> &Jobs {
        &self.jobs
    }

    pub fn project_key(&self) -> &str {
        &self.project_key
    }

    pub fn project_name(&self) -> &str {
        &self.project_name
    }

    pub fn set_project(&mut self, key: impl Into<String>, name: impl Into<String>) {
        self.project_key = key.into();
        self.project_name = name.into();
    }

    // ─── Input and editing ───────────────────────────────────────────────

    pub fn attach_surface(&mut self, width: u32, height: u32) -> Actions {
        self.controller.attach_surface(width, height)
    }

    pub fn handle(&mut self, event: &InputEvent) -> Actions {
        let out = self.controller.handle(event, self.renderer.fonts());
        self.sync_assets();
        out
    }

    pub fn set_tool(&mut self, tool: ToolKind) -> Actions {
        self.controller.set_tool(tool)
    }

    pub fn insert_image(&mut self, url: &str, rect: Rect) -> Actions {
        let out = self.controller.insert_image(url, rect);
        self.sync_assets();
        out
    }

    pub fn undo(&mut self) -> Actions {
        let out = self.controller.undo();
        self.sync_assets();
        out
    }

    pub fn redo(&mut self) -> Actions {
        let out = self.controller.redo();
        self.sync_assets();
        out
    }

    pub fn clear_scene(&mut self) -> Actions {
        self.controller.clear_scene()
    }

    // ─── Rendering and export ────────────────────────────────────────────

    pub fn render(&self) -> RgbaImage {
        self.renderer.render(
            self.controller.scene(),
            &self.assets,
            self.controller.background(),
            &self.controller.frame_state(),
        )
    }

    /// PNG bytes of the committed scene. In-progress previews and the
    /// selection highlight are never exported.
    pub fn export_png(&self, mode: ExportMode) -> ServiceResult<Vec<u8>> {
        let options = ExportOptions {
            mode,
            background: self.controller.background(),
            padding: self.config.export_padding,
        };
        Ok(ic_render::export_png(
            &self.renderer,
            self.controller.scene(),
            &self.assets,
            &options,
        )?)
    }

    pub fn export_filename(&self) -> String {
        default_filename(&self.project_name)
    }

    // ─── Persistence ─────────────────────────────────────────────────────

    pub async fn save(&self) -> ServiceResult<()> {
        let data = serialize_scene(self.controller.scene())?;
        self.services.store.save(&self.project_key, &data).await?;
        log::debug!("saved project {} ({} objects)", self.project_key, data.objects.len());
        Ok(())
    }

    /// Replace the scene with the stored project. Returns false, leaving the
    /// scene untouched, when nothing is stored under the current key.
    pub async fn load(&mut self) -> ServiceResult<bool> {
        let store = self.services.store.clone();
        let Some(data) = store.load(&self.project_key).await? else {
            log::debug!("no stored project under {}", self.project_key);
            return Ok(false);
        };
        let scene = deserialize_scene(data)?;
        self.controller.load_scene(scene);
        self.sync_assets();
        Ok(true)
    }

    // ─── Collaborators ───────────────────────────────────────────────────

    /// Start generating an image. Without a prompt, one is derived from the
    /// committed shapes.
    pub fn request_generation(&mut self, prompt: Option<&str>) -> Option<JobId> {
        let Some(generator) = self.services.generator.clone() else {
            self.notices.push(Notice::GenerationUnavailable);
            return None;
        };
        let prompt = match prompt.map(str::trim) {
            Some(p) if !p.is_empty() => p.to_string(),
            _ => describe_scene(self.controller.scene()),
        };
        log::debug!("generation prompt: {prompt}");
        Some(self.jobs.spawn(
            "generate",
            async move {
                match generator.generate(&prompt).await {
                    Ok(url) => JobOutput::ImageGenerated { url },
                    Err(e) => JobOutput::GenerationFailed { reason: e.to_string() },
                }
            },
            |reason| JobOutput::GenerationFailed { reason },
        ))
    }

    pub fn request_suggestion(&mut self, prompt: &str) -> JobId {
        let suggester = self.services.suggester.clone();
        let prompt = prompt.to_string();
        let summary = self.controller.scene().summary();
        self.jobs.spawn(
            "suggest",
            async move {
                match suggester.suggest(&prompt, &summary).await {
                    Ok(text) => JobOutput::Suggestion { text },
                    Err(e) => JobOutput::SuggestionFailed { reason: e.to_string() },
                }
            },
            |reason| JobOutput::SuggestionFailed { reason },
        )
    }

    pub fn cancel(&mut self, id: JobId) -> bool {
        self.jobs.cancel(id)
    }

    /// Apply every result that has arrived. Never blocks.
    pub fn pump(&mut self) -> Actions {
        let mut out = Actions::new();
        for result in self.jobs.drain() {
            out.extend(self.apply(result));
        }
        self.sync_assets();
        out
    }

    /// Wait until no job is pending, applying results as they arrive.
    pub async fn settle(&mut self) -> Actions {
        let mut out = Actions::new();
        self.sync_assets();
        while let Some(result) = self.jobs.next().await {
            out.extend(self.apply(result));
            self.sync_assets();
        }
        out
    }

    pub fn take_notices(&mut self) -> Vec<Notice> {
        std::mem::take(&mut self.notices)
    }

    fn apply(&mut self, result: JobResult) -> Actions {
        log::debug!("{} finished", result.id);
        match result.output {
            JobOutput::ImageGenerated { url } => self.controller.insert_image(&url, GENERATED_IMAGE_RECT),
            JobOutput::GenerationFailed { reason } => {
                log::warn!("image generation failed: {reason}");
                self.notices.push(Notice::GenerationFailed(reason));
                Actions::new()
            }
            JobOutput::Suggestion { text } => {
                self.notices.push(Notice::Suggestion(text));
                Actions::new()
            }
            JobOutput::SuggestionFailed { reason } => {
                log::warn!("suggestion failed: {reason}");
                self.notices.push(Notice::SuggestionFailed(reason));
                Actions::new()
            }
            JobOutput::AssetLoaded { url, bytes } => {
                if self.assets.complete(&url, &bytes) {
                    let mut out = Actions::new();
                    out.push(Action::RenderNeeded);
                    out
                } else {
                    log::warn!("could not decode image {url}");
                    self.notices.push(Notice::AssetFailed {
                        url,
                        reason: "undecodable image data".into(),
                    });
                    Actions::new()
                }
            }
            JobOutput::AssetFailed { url, reason } => {
                log::warn!("could not load image {url}: {reason}");
                self.assets.fail(&url, reason.clone());
                self.notices.push(Notice::AssetFailed { url, reason });
                Actions::new()
            }
        }
    }

    /// Start loads for image URLs the cache has not seen yet.
    fn sync_assets(&mut self) {
        for url in self.assets.request_missing(self.controller.scene()) {
            let loader = self.services.loader.clone();
            let failed_url = url.clone();
            self.jobs.spawn(
                "asset",
                async move {
                    match loader.fetch(&url).await {
                        Ok(bytes) => JobOutput::AssetLoaded { url, bytes },
                        Err(e) => JobOutput::AssetFailed {
                            url,
                            reason: e.to_string(),
                        },
                    }
                },
                move |reason| JobOutput::AssetFailed { url: failed_url, reason },
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::MemoryStore;
    use pretty_assertions::assert_eq;

    fn session() -> Session {
        let services = Services::local(Arc::new(MemoryStore::new())).unwrap();
        let config = CanvasConfig {
            width: 400,
            height: 400,
            ..Default::default()
        };
        Session::new(config, services, Handle::current())
    }

    #[tokio::test]
    async fn generation_without_backend_is_a_notice() {
        let mut s = session();
        assert_eq!(s.request_generation(Some("a cat")), None);
        assert_eq!(s.take_notices(), vec![Notice::GenerationUnavailable]);
        assert!(s.take_notices().is_empty());
    }

    #[tokio::test]
    async fn suggestion_arrives_as_notice() {
        let mut s = session();
        s.request_suggestion("");
        let out = s.settle().await;
        assert!(out.is_empty());
        match s.take_notices().as_slice() {
            [Notice::Suggestion(text)] => assert!(text.starts_with("Start by drawing")),
            other => panic!("expected one suggestion, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn export_filename_follows_project_name() {
        let mut s = session();
        assert_eq!(s.export_filename(), "infinite_canvas_drawing.png");
        s.set_project("p1", "Team Board");
        assert_eq!(s.export_filename(), "team_board_drawing.png");
    }

    #[tokio::test]
    async fn load_without_saved_project_keeps_scene() {
        let mut s = session();
        assert!(!s.load().await.unwrap());
        s.save().await.unwrap();
        assert!(s.load().await.unwrap());
    }
}
