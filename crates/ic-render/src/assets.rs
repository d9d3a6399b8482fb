//! Decoded bitmaps for image objects, keyed by URL.
//!
//! Loading is driven from outside: the cache only tracks state. A URL is
//! `Pending` from the moment a load is requested until its bytes arrive, and
//! the renderer skips anything that isn't `Ready`.

use ic_core::{Drawable, Scene};
use image::RgbaImage;
use std::collections::HashMap;
use std::sync::Arc;

#[derive(Debug, Clone)]
pub enum AssetState {
    Pending,
    Ready(Arc<RgbaImage>),
    Failed(String),
}

#[derive(Debug, Default)]
pub struct AssetCache {
    entries: HashMap<String, AssetState>,
}

impl AssetCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark `url` as pending. Returns true when the caller should start a
    /// load, false if one was already requested or finished.
    pub fn request(&mut self, url: &str) -> bool {
        if self.entries.contains_key(url) {
            return false;
        }
        self.entries.insert(url.to_string(), AssetState::Pending);
        true
    }

    /// Request every image URL in `scene` not seen before, in draw order.
    pub fn request_missing(&mut self, scene: &Scene) -> Vec<String> {
        let mut started = Vec::new();
        for obj in scene.draw_order() {
            if let Drawable::Image(img) = obj
                && self.request(&img.image_url)
            {
                started.push(img.image_url.clone());
            }
        }
        started
    }

    /// Decode fetched bytes. Returns true if the asset is now ready to draw.
    pub fn complete(&mut self, url: &str, bytes: &[u8]) -> bool {
        match image::load_from_memory(bytes) {
            Ok(decoded) => {
                self.insert_ready(url, decoded.to_rgba8());
                true
            }
            Err(e) => {
                self.fail(url, e.to_string());
                false
            }
        }
    }

    pub fn insert_ready(&mut self, url: &str, image: RgbaImage) {
        log::debug!("asset ready: {url} ({}x{})", image.width(), image.height());
        self.entries.insert(url.to_string(), AssetState::Ready(Arc::new(image)));
    }

    pub fn fail(&mut self, url: &str, reason: impl Into<String>) {
        let reason = reason.into();
        log::warn!("asset failed: {url}: {reason}");
        self.entries.insert(url.to_string(), AssetState::Failed(reason));
    }

    pub fn state(&self, url: &str) -> Option<&AssetState> {
        self.entries.get(url)
    }

    /// The decoded bitmap, if loaded.
    pub fn get(&self, url: &str) -> Option<&RgbaImage> {
        match self.entries.get(url) {
            Some(AssetState::Ready(img)) => Some(img.as_ref()),
            _ => None,
        }
    }

    /// Forget a URL so a later `request` starts a fresh load.
    pub fn forget(&mut self, url: &str) {
        self.entries.remove(url);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ic_core::ImageObject;
    use image::{ImageFormat, Rgba};
    use std::io::Cursor;

    fn png_bytes() -> Vec<u8> {
        let img = RgbaImage::from_pixel(3, 2, Rgba([1, 2, 3, 255]));
        let mut buf = Vec::new();
        img.write_to(&mut Cursor::new(&mut buf), ImageFormat::Png).unwrap();
        buf
    }

    #[test]
    fn request_once() {
        let mut cache = AssetCache::new();
        assert!(cache.request("a"));
        assert!(!cache.request("a"));
        assert!(matches!(cache.state("a"), Some(AssetState::Pending)));
        assert!(cache.get("a").is_none());
    }

    #[test]
    fn complete_decodes_or_fails() {
        let mut cache = AssetCache::new();
        cache.request("good");
        cache.request("bad");
        assert!(cache.complete("good", &png_bytes()));
        assert!(!cache.complete("bad", b"garbage"));
        assert_eq!(cache.get("good").map(|i| i.dimensions()), Some((3, 2)));
        assert!(matches!(cache.state("bad"), Some(AssetState::Failed(_))));
        assert!(!cache.request("bad"), "failed assets are not retried implicitly");
        cache.forget("bad");
        assert!(cache.request("bad"));
    }

    #[test]
    fn request_missing_walks_scene() {
        let mut scene = Scene::new(10, 10);
        scene.add_object(Drawable::Image(ImageObject::new("u1", 0.0, 0.0, 1.0, 1.0)));
        scene.add_object(Drawable::Image(ImageObject::new("u2", 0.0, 0.0, 1.0, 1.0)));
        scene.add_object(Drawable::Image(ImageObject::new("u1", 5.0, 5.0, 1.0, 1.0)));
        let mut cache = AssetCache::new();
        assert_eq!(cache.request_missing(&scene), vec!["u1".to_string(), "u2".to_string()]);
        assert!(cache.request_missing(&scene).is_empty());
    }
}
