//! Undo/redo history of whole-scene snapshots.
//!
//! Every commit pushes the scene as it was *before* the commit onto `past`,
//! so undoing `n` commits walks back exactly to the starting scene. Snapshots
//! are plain clones: objects are small and the ink raster is shared
//! copy-on-write, so an entry only owns pixels once a later stroke changes
//! them.

use ic_core::Scene;
use std::collections::VecDeque;

pub struct History {
    past: VecDeque<Scene>,
    future: Vec<Scene>,
    /// Maximum number of undo entries; the oldest is dropped beyond this.
    max_depth: usize,
}

impl History {
    pub fn new(max_depth: usize) -> Self {
        Self {
            past: VecDeque::new(),
            future: Vec::new(),
            max_depth,
        }
    }

    /// Record `scene` as the state to return to on the next undo. Any redo
    /// entries are invalidated.
    pub fn snapshot(&mut self, scene: &Scene) {
        self.past.push_back(scene.clone());
        while self.past.len() > self.max_depth {
            self.past.pop_front();
        }
        self.future.clear();
    }

    /// Step back. With nothing to undo, `current` is returned unchanged.
    pub fn undo(&mut self, current: Scene) -> Scene {
        match self.past.pop_back() {
            Some(previous) => {
                self.future.push(current);
                previous
            }
            None => current,
        }
    }

    /// Step forward. With nothing to redo, `current` is returned unchanged.
    pub fn redo(&mut self, current: Scene) -> Scene {
        match self.future.pop() {
            Some(next) => {
                self.past.push_back(current);
                next
            }
            None => current,
        }
    }

    pub fn can_undo(&self) -> bool {
        !self.past.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.future.is_empty()
    }

    pub fn undo_depth(&self) -> usize {
        self.past.len()
    }

    pub fn redo_depth(&self) -> usize {
        self.future.len()
    }

    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    pub fn clear(&mut self) {
        self.past.clear();
        self.future.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ic_core::{Drawable, ImageObject};
    use pretty_assertions::assert_eq;

    fn scene_with(n: usize) -> Scene {
        let mut scene = Scene::new(4, 4);
        for i in 0..n {
            scene.add_object(Drawable::Image(ImageObject::new(format!("u{i}"), 0.0, 0.0, 1.0, 1.0)));
        }
        scene
    }

    #[test]
    fn undo_on_empty_returns_current() {
        let mut history = History::new(10);
        let scene = scene_with(1);
        assert_eq!(history.undo(scene.clone()), scene);
        assert_eq!(history.redo(scene.clone()), scene);
        assert!(!history.can_undo());
        assert!(!history.can_redo());
    }

    #[test]
    fn undo_then_redo_restores() {
        let mut history = History::new(10);
        let s0 = scene_with(0);
        let s1 = scene_with(1);
        history.snapshot(&s0);

        let back = history.undo(s1.clone());
        assert_eq!(back, s0);
        assert!(history.can_redo());

        let forward = history.redo(back);
        assert_eq!(forward, s1);
        assert!(history.can_undo());
        assert!(!history.can_redo());
    }

    #[test]
    fn snapshot_clears_redo() {
        let mut history = History::new(10);
        history.snapshot(&scene_with(0));
        let _ = history.undo(scene_with(1));
        assert!(history.can_redo());
        history.snapshot(&scene_with(2));
        assert!(!history.can_redo());
    }

    #[test]
    fn depth_bound_drops_oldest() {
        let mut history = History::new(2);
        history.snapshot(&scene_with(0));
        history.snapshot(&scene_with(1));
        history.snapshot(&scene_with(2));
        assert_eq!(history.undo_depth(), 2);

        let a = history.undo(scene_with(3));
        assert_eq!(a.len(), 2);
        let b = history.undo(a);
        assert_eq!(b.len(), 1);
        // Scene 0 was dropped.
        let c = history.undo(b.clone());
        assert_eq!(c, b);
    }

    #[test]
    fn long_sessions_keep_the_newest_snapshots() {
        let mut history = History::new(3);
        for n in 0..500 {
            history.snapshot(&scene_with(n));
        }
        assert_eq!(history.undo_depth(), 3);

        let mut scene = scene_with(500);
        for expected in [499, 498, 497] {
            scene = history.undo(scene);
            assert_eq!(scene.len(), expected);
        }
        assert!(!history.can_undo());
        assert_eq!(history.redo_depth(), 3);
    }
}
