//! Hit testing: point → object lookup.
//!
//! Walks the scene topmost-first so that the object painted last wins where
//! outlines overlap. Ink is not hit-testable.

use ic_core::geometry::{Outline, TextMeasure};
use ic_core::{ObjectId, Scene};
use kurbo::Point;

/// Find the topmost object at `p`. Returns `None` on empty canvas.
pub fn hit_test(scene: &Scene, p: Point, measure: &dyn TextMeasure) -> Option<ObjectId> {
    scene
        .hit_order()
        .find(|obj| Outline::of(obj, measure).contains(p))
        .map(|obj| obj.id())
}
