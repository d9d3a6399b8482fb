//! Canvas configuration.
//!
//! Every field has a default, so an empty JSON object is a valid config.
//! Environment variables (`IC_*`) override whatever the file says:
//!
//! - `IC_CANVAS_WIDTH`, `IC_CANVAS_HEIGHT`: surface size in pixels
//! - `IC_BACKGROUND`: hex background color
//! - `IC_TRANSPARENT`: `true`/`false`, export and render without a background
//! - `IC_HISTORY_DEPTH`: max undo entries
//! - `IC_EXPORT_PADDING`: margin around cropped exports
//! - `IC_SELECTION_MARGIN`: gap between an object and its selection box
//! - `IC_FONT_FAMILY`, `IC_FONT_SIZE`: defaults for new text
//! - `IC_FONT_PATH`: TTF/OTF file used for text rendering and measurement

use crate::error::ConfigError;
use crate::model::{Color, DEFAULT_FONT_FAMILY, DEFAULT_FONT_SIZE};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::str::FromStr;

pub const DEFAULT_CANVAS_WIDTH: u32 = 1600;
pub const DEFAULT_CANVAS_HEIGHT: u32 = 900;
pub const DEFAULT_HISTORY_DEPTH: usize = 100;
pub const DEFAULT_EXPORT_PADDING: f64 = 40.0;
pub const DEFAULT_SELECTION_MARGIN: f64 = 4.0;
/// Largest accepted canvas side in pixels.
pub const MAX_CANVAS_SIDE: u32 = 8192;

/// Whether a `width`×`height` canvas can be allocated: both sides in
/// `1..=MAX_CANVAS_SIDE`.
pub fn canvas_size_valid(width: u32, height: u32) -> bool {
    let side = 1..=MAX_CANVAS_SIDE;
    side.contains(&width) && side.contains(&height)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CanvasConfig {
    pub width: u32,
    pub height: u32,
    pub background: Color,
    pub transparent_background: bool,
    pub history_depth: usize,
    pub export_padding: f64,
    pub selection_margin: f64,
    pub font_family: String,
    pub font_size: f64,
    pub font_path: Option<PathBuf>,
}

impl Default for CanvasConfig {
    fn default() -> Self {
        Self {
            width: DEFAULT_CANVAS_WIDTH,
            height: DEFAULT_CANVAS_HEIGHT,
            background: Color::WHITE,
            transparent_background: false,
            history_depth: DEFAULT_HISTORY_DEPTH,
            export_padding: DEFAULT_EXPORT_PADDING,
            selection_margin: DEFAULT_SELECTION_MARGIN,
            font_family: DEFAULT_FONT_FAMILY.to_string(),
            font_size: DEFAULT_FONT_SIZE,
            font_path: None,
        }
    }
}

impl CanvasConfig {
    /// Defaults plus environment overrides.
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::default();
        config.apply_env()?;
        Ok(config)
    }

    /// Read a JSON config file, then apply environment overrides.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        let mut config: CanvasConfig = serde_json::from_str(&text)?;
        config.apply_env()?;
        log::debug!("loaded canvas config from {}", path.display());
        Ok(config)
    }

    pub fn apply_env(&mut self) -> Result<(), ConfigError> {
        self.apply_overrides(|key| std::env::var(key).ok())
    }

    /// Apply overrides from any key/value source. Unset keys are skipped;
    /// a value that doesn't parse is an error.
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<(), ConfigError> {
        if let Some(v) = parse_var(&lookup, "IC_CANVAS_WIDTH")? {
            self.width = v;
        }
        if let Some(v) = parse_var(&lookup, "IC_CANVAS_HEIGHT")? {
            self.height = v;
        }
        if let Some(v) = lookup("IC_BACKGROUND") {
            self.background = Color::from_hex(&v).ok_or(ConfigError::InvalidEnv {
                key: "IC_BACKGROUND",
                value: v,
            })?;
        }
        if let Some(v) = parse_var(&lookup, "IC_TRANSPARENT")? {
            self.transparent_background = v;
        }
        if let Some(v) = parse_var(&lookup, "IC_HISTORY_DEPTH")? {
            self.history_depth = v;
        }
        if let Some(v) = parse_var(&lookup, "IC_EXPORT_PADDING")? {
            self.export_padding = v;
        }
        if let Some(v) = parse_var(&lookup, "IC_SELECTION_MARGIN")? {
            self.selection_margin = v;
        }
        if let Some(v) = lookup("IC_FONT_FAMILY") {
            self.font_family = v;
        }
        if let Some(v) = parse_var(&lookup, "IC_FONT_SIZE")? {
            self.font_size = v;
        }
        if let Some(v) = lookup("IC_FONT_PATH") {
            self.font_path = Some(PathBuf::from(v));
        }
        if !canvas_size_valid(self.width, self.height) {
            return Err(ConfigError::InvalidEnv {
                key: "IC_CANVAS_WIDTH/IC_CANVAS_HEIGHT",
                value: format!("{}x{}", self.width, self.height),
            });
        }
        Ok(())
    }
}

fn parse_var<T: FromStr>(lookup: &impl Fn(&str) -> Option<String>, key: &'static str) -> Result<Option<T>, ConfigError> {
    match lookup(key) {
        None => Ok(None),
        Some(value) => value
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|_| ConfigError::InvalidEnv { key, value }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn empty_json_is_default() {
        let config: CanvasConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config, CanvasConfig::default());
        assert_eq!((config.width, config.height), (1600, 900));
    }

    #[test]
    fn overrides_apply() {
        let mut config = CanvasConfig::default();
        config
            .apply_overrides(env(&[
                ("IC_CANVAS_WIDTH", "800"),
                ("IC_BACKGROUND", "#000"),
                ("IC_TRANSPARENT", "true"),
                ("IC_FONT_PATH", "/fonts/a.ttf"),
            ]))
            .unwrap();
        assert_eq!(config.width, 800);
        assert_eq!(config.height, 900);
        assert_eq!(config.background, Color::BLACK);
        assert!(config.transparent_background);
        assert_eq!(config.font_path, Some(PathBuf::from("/fonts/a.ttf")));
    }

    #[test]
    fn bad_override_is_an_error() {
        let mut config = CanvasConfig::default();
        let err = config.apply_overrides(env(&[("IC_HISTORY_DEPTH", "lots")])).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidEnv { key: "IC_HISTORY_DEPTH", .. }));

        let err = config.apply_overrides(env(&[("IC_CANVAS_HEIGHT", "0")])).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidEnv { .. }));
    }

    #[test]
    fn oversized_canvas_is_rejected() {
        let mut config = CanvasConfig::default();
        let err = config
            .apply_overrides(env(&[("IC_CANVAS_WIDTH", "4294967295")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidEnv { .. }));
        assert!(canvas_size_valid(MAX_CANVAS_SIDE, 1));
        assert!(!canvas_size_valid(MAX_CANVAS_SIDE + 1, 1));
    }
}
