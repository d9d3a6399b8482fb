//! Text-to-image generation.
//!
//! The generator hands back an image URL and nothing else; placing the
//! result in the scene is the session's job.

use super::{ServiceError, ServiceResult};
use async_trait::async_trait;
use ic_core::{Drawable, Scene, ShapeKind};
use serde::{Deserialize, Serialize};
use std::time::Duration;

const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
const DEFAULT_IMAGE_MODEL: &str = "dall-e-3";
const DEFAULT_IMAGE_SIZE: &str = "1024x1024";
const REQUEST_TIMEOUT_SECS: u64 = 120;
const CONNECT_TIMEOUT_SECS: u64 = 10;

#[async_trait]
pub trait ImageGenerator: Send + Sync {
    /// Generate an image for `prompt` and return its URL.
    async fn generate(&self, prompt: &str) -> ServiceResult<String>;
}

#[derive(Debug, Clone, PartialEq)]
pub struct GeneratorConfig {
    pub api_key: String,
    pub base_url: String,
    pub model: String,
    pub size: String,
}

impl GeneratorConfig {
    /// Build from environment variables.
    ///
    /// - `IC_OPENAI_API_KEY`: required
    /// - `IC_OPENAI_BASE_URL`: OpenAI-compatible endpoint (default `https://api.openai.com/v1`)
    /// - `IC_IMAGE_MODEL`: model name (default `dall-e-3`)
    pub fn from_env() -> ServiceResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> ServiceResult<Self> {
        let api_key = lookup("IC_OPENAI_API_KEY")
            .filter(|k| !k.trim().is_empty())
            .ok_or(ServiceError::MissingConfig("IC_OPENAI_API_KEY"))?;
        let base_url = lookup("IC_OPENAI_BASE_URL")
            .unwrap_or_else(|| DEFAULT_OPENAI_BASE_URL.to_string())
            .trim_end_matches('/')
            .to_string();
        let model = lookup("IC_IMAGE_MODEL").unwrap_or_else(|| DEFAULT_IMAGE_MODEL.to_string());
        Ok(Self {
            api_key,
            base_url,
            model,
            size: DEFAULT_IMAGE_SIZE.to_string(),
        })
    }
}

pub struct OpenAiImageGenerator {
    http: reqwest::Client,
    config: GeneratorConfig,
}

impl OpenAiImageGenerator {
    pub fn new(config: GeneratorConfig) -> ServiceResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .connect_timeout(Duration::from_secs(CONNECT_TIMEOUT_SECS))
            .build()?;
        Ok(Self { http, config })
    }

    pub fn from_env() -> ServiceResult<Self> {
        Self::new(GeneratorConfig::from_env()?)
    }
}

#[derive(Serialize)]
struct GenerationRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    n: u32,
    size: &'a str,
}

#[derive(Deserialize)]
struct GenerationResponse {
    #[serde(default)]
    data: Vec<GeneratedImage>,
}

#[derive(Deserialize)]
struct GeneratedImage {
    url: Option<String>,
    b64_json: Option<String>,
}

#[async_trait]
impl ImageGenerator for OpenAiImageGenerator {
    async fn generate(&self, prompt: &str) -> ServiceResult<String> {
        let body = GenerationRequest {
            model: &self.config.model,
            prompt,
            n: 1,
            size: &self.config.size,
        };
        let url = format!("{}/images/generations", self.config.base_url);
        log::debug!("image generation request to {url} ({} chars)", prompt.len());

        let response = self
            .http
            .post(url)
            .bearer_auth(&self.config.api_key)
            .json(&body)
            .send()
            .await?;
        let status = response.status().as_u16();
        let text = response.text().await?;
        if status != 200 {
            return Err(ServiceError::Api { status, body: text });
        }
        parse_generation_response(&text)
    }
}

fn parse_generation_response(text: &str) -> ServiceResult<String> {
    let parsed: GenerationResponse =
        serde_json::from_str(text).map_err(|_| ServiceError::UnexpectedResponse(text.to_string()))?;
    let first = parsed
        .data
        .into_iter()
        .next()
        .ok_or_else(|| ServiceError::UnexpectedResponse("no images returned".into()))?;
    match (first.url, first.b64_json) {
        (Some(url), _) => Ok(url),
        (None, Some(b64)) => Ok(format!("data:image/png;base64,{b64}")),
        (None, None) => Err(ServiceError::UnexpectedResponse("image has neither url nor data".into())),
    }
}

/// Build a generation prompt from the committed shapes. The framing comes
/// from the first shape's kind.
pub fn describe_scene(scene: &Scene) -> String {
    let shapes: Vec<_> = scene
        .draw_order()
        .filter_map(|obj| match obj {
            Drawable::Shape(s) => Some(s),
            Drawable::Text(_) | Drawable::Image(_) => None,
        })
        .collect();
    let Some(first) = shapes.first() else {
        return "A blank canvas".to_string();
    };

    let descriptions: Vec<String> = shapes
        .iter()
        .map(|s| match s.kind {
            ShapeKind::Rectangle => format!("A rectangle at ({}, {}) with width {} and height {}", s.x, s.y, s.w, s.h),
            ShapeKind::Circle => {
                let c = s.circle_center();
                format!("A circle at ({}, {}) with radius {:.1}", c.x, c.y, s.circle_radius())
            }
            ShapeKind::Line => {
                let end = s.end();
                format!("A line from ({}, {}) to ({}, {})", s.x, s.y, end.x, end.y)
            }
        })
        .collect();

    let framing = match first.kind {
        ShapeKind::Rectangle => "Architectural blueprint",
        ShapeKind::Circle => "Minimalist design",
        ShapeKind::Line => "Abstract geometric composition",
    };
    format!(
        "{framing} interpretation with {}. Artistic in high resolution.",
        descriptions.join(", ")
    )
}
