//! Interaction controller: the pointer/keyboard state machine.
//!
//! The controller owns the triple that defines editor state: the committed
//! [`Scene`], its [`History`] and the current [`InteractionState`]. Every
//! tool is a set of transitions over that triple; the renderer only ever
//! reads it. A gesture commits exactly once, when it ends: pointer-up,
//! pointer-leave, Enter/blur for text, or when something else (undo, a tool
//! switch, a load) forces the gesture to finish first.

use crate::history::History;
use crate::input::{InputEvent, Modifiers};
use crate::shortcuts::{ShortcutAction, ShortcutMap};
use crate::tools::{ToolKind, ToolSettings};
use ic_core::geometry::TextMeasure;
use ic_core::{CanvasConfig, Color, Drawable, ImageObject, ObjectId, ObjectPatch, Scene, Shape, TextObject};
use ic_render::raster::{Composite, Painter, StrokeStyle};
use ic_render::{Background, FrameState, hit_test};
use kurbo::{Point, Rect, Vec2};
use smallvec::SmallVec;

/// Something the host should react to after an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// The frame is stale.
    RenderNeeded,
    /// A history entry was recorded. The label names what was committed.
    Committed(&'static str),
    SelectionChanged(Option<ObjectId>),
    /// Focus a text field bound to this object.
    TextEditStarted(ObjectId),
    TextEditEnded(ObjectId),
}

pub type Actions = SmallVec<[Action; 4]>;

/// Transient gesture state. At most one gesture is ever in progress.
#[derive(Debug, Clone, Default)]
pub enum InteractionState {
    #[default]
    Idle,
    /// A shape tool is dragging out `shape`, not yet part of the scene.
    Creating { shape: Drawable },
    /// Pen/eraser ink is being laid down. `before` is the scene at stroke start.
    Stroking { last: Point, before: Scene },
    /// The move tool is dragging `id`.
    Moving {
        id: ObjectId,
        grab_offset: Vec2,
        before: Scene,
        moved: bool,
    },
    /// `id` is a text object receiving keystrokes.
    EditingText { id: ObjectId, before: Scene },
}

impl InteractionState {
    pub fn is_idle(&self) -> bool {
        matches!(self, InteractionState::Idle)
    }

    fn name(&self) -> &'static str {
        match self {
            InteractionState::Idle => "idle",
            InteractionState::Creating { .. } => "creating",
            InteractionState::Stroking { .. } => "stroking",
            InteractionState::Moving { .. } => "moving",
            InteractionState::EditingText { .. } => "editing-text",
        }
    }
}

pub struct Controller {
    scene: Scene,
    history: History,
    state: InteractionState,
    selection: Option<ObjectId>,
    settings: ToolSettings,
    background_color: Color,
    transparent: bool,
    selection_margin: f64,
    /// Pixel size of the attached surface. Pointer input is ignored until set.
    surface: Option<(u32, u32)>,
    /// Images that arrived mid-gesture, appended once it ends.
    deferred_images: Vec<ImageObject>,
}

impl Controller {
    pub fn new(config: &CanvasConfig) -> Self {
        Self {
            scene: Scene::new(config.width, config.height),
            history: History::new(config.history_depth),
            state: InteractionState::Idle,
            selection: None,
            settings: ToolSettings::from_config(config),
            background_color: config.background,
            transparent: config.transparent_background,
            selection_margin: config.selection_margin,
            surface: None,
            deferred_images: Vec::new(),
        }
    }

    // ─── Accessors ───────────────────────────────────────────────────────

    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    pub fn state(&self) -> &InteractionState {
        &self.state
    }

    pub fn selection(&self) -> Option<ObjectId> {
        self.selection
    }

    pub fn tool(&self) -> ToolKind {
        self.settings.tool
    }

    pub fn settings(&self) -> &ToolSettings {
        &self.settings
    }

    /// Brush color, widths and font for new content. Changing these never
    /// touches existing objects.
    pub fn settings_mut(&mut self) -> &mut ToolSettings {
        &mut self.settings
    }

    pub fn background(&self) -> Background {
        Background::from_config(self.background_color, self.transparent)
    }

    pub fn in_progress(&self) -> Option<&Drawable> {
        match &self.state {
            InteractionState::Creating { shape } => Some(shape),
            _ => None,
        }
    }

    pub fn editing_text(&self) -> Option<ObjectId> {
        match self.state {
            InteractionState::EditingText { id, .. } => Some(id),
            _ => None,
        }
    }

    pub fn frame_state(&self) -> FrameState<'_> {
        FrameState {
            in_progress: self.in_progress(),
            selected: self.selection,
            selection_margin: self.selection_margin,
        }
    }

    pub fn has_surface(&self) -> bool {
        self.surface.is_some()
    }

    // ─── Host-driven operations ──────────────────────────────────────────

    /// Bind the pixel surface. Until this happens pointer input is a no-op.
    pub fn attach_surface(&mut self, width: u32, height: u32) -> Actions {
        log::debug!("surface attached: {width}x{height}");
        self.surface = Some((width, height));
        actions([Action::RenderNeeded])
    }

    pub fn detach_surface(&mut self) -> Actions {
        let out = self.finish_gesture();
        self.surface = None;
        out
    }

    pub fn set_tool(&mut self, tool: ToolKind) -> Actions {
        if tool == self.settings.tool {
            return Actions::new();
        }
        let mut out = self.finish_gesture();
        log::debug!("tool: {} -> {}", self.settings.tool.name(), tool.name());
        self.settings.tool = tool;
        if tool != ToolKind::Move {
            out.extend(self.set_selection(None));
        }
        out
    }

    pub fn set_transparent_background(&mut self, transparent: bool) -> Actions {
        if self.transparent == transparent {
            return Actions::new();
        }
        self.transparent = transparent;
        actions([Action::RenderNeeded])
    }

    pub fn set_background_color(&mut self, color: Color) -> Actions {
        self.background_color = color;
        actions([Action::RenderNeeded])
    }

    /// Append an image on top of the scene as its own history entry. While
    /// a gesture is in progress the image waits until that gesture commits.
    pub fn insert_image(&mut self, url: &str, rect: Rect) -> Actions {
        let rect = rect.abs();
        let image = ImageObject::new(url, rect.x0, rect.y0, rect.width(), rect.height());
        if !self.state.is_idle() {
            log::debug!("deferring image {} until the current gesture ends", image.id);
            self.deferred_images.push(image);
            return Actions::new();
        }
        self.append_image(image)
    }

    fn append_image(&mut self, image: ImageObject) -> Actions {
        let before = self.scene.clone();
        if !self.scene.add_object(Drawable::Image(image)) {
            return Actions::new();
        }
        self.history.snapshot(&before);
        actions([Action::Committed("image"), Action::RenderNeeded])
    }

    /// Remove every object and all ink. Undoable.
    pub fn clear_scene(&mut self) -> Actions {
        let mut out = self.finish_gesture();
        if self.scene.is_empty() {
            return out;
        }
        self.history.snapshot(&self.scene);
        self.scene.clear();
        out.extend(self.set_selection(None));
        out.extend([Action::Committed("clear"), Action::RenderNeeded]);
        out
    }

    /// Replace the scene wholesale (e.g. a loaded project). History restarts.
    pub fn load_scene(&mut self, scene: Scene) -> Actions {
        let mut out = self.finish_gesture();
        self.scene = scene;
        self.history.clear();
        out.extend(self.set_selection(None));
        out.push(Action::RenderNeeded);
        log::debug!("scene loaded: {} objects", self.scene.len());
        out
    }

    pub fn undo(&mut self) -> Actions {
        let mut out = self.finish_gesture();
        if !self.history.can_undo() {
            return out;
        }
        let current = std::mem::replace(&mut self.scene, Scene::new(1, 1));
        self.scene = self.history.undo(current);
        out.extend(self.set_selection(None));
        out.push(Action::RenderNeeded);
        out
    }

    pub fn redo(&mut self) -> Actions {
        let mut out = self.finish_gesture();
        if !self.history.can_redo() {
            return out;
        }
        let current = std::mem::replace(&mut self.scene, Scene::new(1, 1));
        self.scene = self.history.redo(current);
        out.extend(self.set_selection(None));
        out.push(Action::RenderNeeded);
        out
    }

    /// Remove the selected object. No-op without a selection or while text
    /// is being edited.
    pub fn delete_selected(&mut self) -> Actions {
        if self.editing_text().is_some() {
            return Actions::new();
        }
        let Some(id) = self.selection else {
            return Actions::new();
        };
        let mut out = self.finish_gesture();
        let before = self.scene.clone();
        if self.scene.remove_object(id).is_none() {
            out.extend(self.set_selection(None));
            return out;
        }
        self.history.snapshot(&before);
        out.extend(self.set_selection(None));
        out.extend([Action::Committed("delete"), Action::RenderNeeded]);
        out
    }

    // ─── Event dispatch ──────────────────────────────────────────────────

    /// Run one event to completion.
    pub fn handle(&mut self, event: &InputEvent, measure: &dyn TextMeasure) -> Actions {
        if event.is_pointer() && self.surface.is_none() {
            log::debug!("no surface attached, ignoring {event:?}");
            return Actions::new();
        }
        match event {
            InputEvent::PointerDown { x, y } => self.pointer_down(Point::new(*x, *y), measure),
            InputEvent::PointerMove { x, y } => self.pointer_move(Point::new(*x, *y)),
            InputEvent::PointerUp { x, y } => {
                let mut out = self.pointer_move(Point::new(*x, *y));
                out.extend(self.pointer_release());
                out
            }
            InputEvent::PointerLeave => self.pointer_release(),
            InputEvent::Key { key, modifiers } => self.key(key, *modifiers),
            InputEvent::TextInput { text } => self.text_input(text),
            InputEvent::TextBlur => self.finish_text(),
        }
    }

    fn pointer_down(&mut self, p: Point, measure: &dyn TextMeasure) -> Actions {
        // A dangling gesture (e.g. an up that never arrived) commits first.
        let mut out = self.finish_gesture();
        let tool = self.settings.tool;
        match tool {
            ToolKind::Pen | ToolKind::Eraser => {
                let before = self.scene.clone();
                self.paint_dot(p);
                self.state = InteractionState::Stroking { last: p, before };
                out.push(Action::RenderNeeded);
            }
            ToolKind::Rectangle | ToolKind::Circle | ToolKind::Line => {
                if let Some(kind) = tool.shape_kind() {
                    let shape = Shape::anchored(kind, p, self.settings.color, self.settings.stroke_width);
                    self.state = InteractionState::Creating {
                        shape: Drawable::Shape(shape),
                    };
                    out.push(Action::RenderNeeded);
                }
            }
            ToolKind::Text => out.extend(self.start_text(p)),
            ToolKind::Move => match hit_test(&self.scene, p, measure) {
                Some(id) => {
                    let origin = self.scene.get(id).map(Drawable::origin).unwrap_or(p);
                    self.state = InteractionState::Moving {
                        id,
                        grab_offset: p - origin,
                        before: self.scene.clone(),
                        moved: false,
                    };
                    out.extend(self.set_selection(Some(id)));
                    out.push(Action::RenderNeeded);
                }
                None => {
                    out.extend(self.set_selection(None));
                }
            },
        }
        log::debug!("{} down at ({:.1}, {:.1}) -> {}", tool.name(), p.x, p.y, self.state.name());
        out
    }

    fn pointer_move(&mut self, p: Point) -> Actions {
        match &mut self.state {
            InteractionState::Idle | InteractionState::EditingText { .. } => Actions::new(),
            InteractionState::Creating { shape } => {
                if let Drawable::Shape(s) = shape {
                    s.w = p.x - s.x;
                    s.h = p.y - s.y;
                }
                actions([Action::RenderNeeded])
            }
            InteractionState::Stroking { last, .. } => {
                let from = *last;
                *last = p;
                self.paint_segment(from, p);
                actions([Action::RenderNeeded])
            }
            InteractionState::Moving {
                id, grab_offset, moved, ..
            } => {
                let (id, target) = (*id, p - *grab_offset);
                if self.scene.update_object(id, &ObjectPatch::position(target)) {
                    *moved = true;
                    actions([Action::RenderNeeded])
                } else {
                    Actions::new()
                }
            }
        }
    }

    /// Pointer-up or pointer-leave: commit whatever the gesture produced.
    fn pointer_release(&mut self) -> Actions {
        match self.state {
            InteractionState::EditingText { .. } => Actions::new(),
            _ => self.finish_gesture(),
        }
    }

    fn key(&mut self, key: &str, m: Modifiers) -> Actions {
        if self.editing_text().is_some() {
            // The text field owns the keyboard; only these end the edit.
            return match key {
                "Enter" | "Escape" => self.finish_text(),
                _ => Actions::new(),
            };
        }
        let Some(action) = ShortcutMap::resolve(key, m.ctrl, m.shift, m.alt, m.meta) else {
            return Actions::new();
        };
        log::debug!("shortcut {key:?} -> {action:?}");
        match action {
            ShortcutAction::Tool(tool) => self.set_tool(tool),
            ShortcutAction::Undo => self.undo(),
            ShortcutAction::Redo => self.redo(),
            ShortcutAction::Delete => self.delete_selected(),
            ShortcutAction::Deselect => self.set_selection(None),
            ShortcutAction::ToggleBackground => self.set_transparent_background(!self.transparent),
        }
    }

    // ─── Gesture completion ──────────────────────────────────────────────

    /// Commit and leave whatever gesture is in progress, then append any
    /// images that arrived during it.
    pub fn finish_gesture(&mut self) -> Actions {
        let mut out = match std::mem::take(&mut self.state) {
            InteractionState::Idle => Actions::new(),
            InteractionState::Creating { shape } => {
                let before = self.scene.clone();
                if self.scene.add_object(shape) {
                    self.history.snapshot(&before);
                    actions([Action::Committed("shape"), Action::RenderNeeded])
                } else {
                    Actions::new()
                }
            }
            InteractionState::Stroking { before, .. } => {
                self.history.snapshot(&before);
                actions([Action::Committed("stroke"), Action::RenderNeeded])
            }
            InteractionState::Moving { before, moved, .. } => {
                if moved {
                    self.history.snapshot(&before);
                    actions([Action::Committed("move"), Action::RenderNeeded])
                } else {
                    Actions::new()
                }
            }
            InteractionState::EditingText { id, before } => {
                self.history.snapshot(&before);
                actions([Action::TextEditEnded(id), Action::Committed("text"), Action::RenderNeeded])
            }
        };
        for image in std::mem::take(&mut self.deferred_images) {
            out.extend(self.append_image(image));
        }
        out
    }

    // ─── Text ────────────────────────────────────────────────────────────

    fn start_text(&mut self, p: Point) -> Actions {
        let before = self.scene.clone();
        let s = &self.settings;
        let text = TextObject::empty_at(p, s.color, s.font_size, &s.font_family, s.font_weight);
        let id = text.id;
        if !self.scene.add_object(Drawable::Text(text)) {
            return Actions::new();
        }
        self.state = InteractionState::EditingText { id, before };
        actions([Action::TextEditStarted(id), Action::RenderNeeded])
    }

    fn text_input(&mut self, text: &str) -> Actions {
        let Some(id) = self.editing_text() else {
            return Actions::new();
        };
        if self.scene.update_object(id, &ObjectPatch::text(text)) {
            actions([Action::RenderNeeded])
        } else {
            Actions::new()
        }
    }

    fn finish_text(&mut self) -> Actions {
        if self.editing_text().is_some() {
            self.finish_gesture()
        } else {
            Actions::new()
        }
    }

    // ─── Ink ─────────────────────────────────────────────────────────────

    fn ink_style(&self) -> StrokeStyle {
        match self.settings.tool {
            ToolKind::Eraser if self.transparent => StrokeStyle {
                color: Color::BLACK,
                width: self.settings.eraser_width,
                dash: None,
                composite: Composite::DestinationOut,
            },
            ToolKind::Eraser => StrokeStyle::solid(self.background_color, self.settings.eraser_width),
            _ => StrokeStyle::solid(self.settings.color, self.settings.stroke_width),
        }
    }

    fn paint_dot(&mut self, p: Point) {
        let style = self.ink_style();
        let mut painter = Painter::new(self.scene.ink_mut().pixels_mut());
        painter.fill_circle(p, style.width / 2.0, style.color, style.composite);
    }

    fn paint_segment(&mut self, from: Point, to: Point) {
        let style = self.ink_style();
        let mut painter = Painter::new(self.scene.ink_mut().pixels_mut());
        painter.stroke_segment(from, to, &style);
    }

    // ─── Selection ───────────────────────────────────────────────────────

    fn set_selection(&mut self, id: Option<ObjectId>) -> Actions {
        if self.selection == id {
            return Actions::new();
        }
        self.selection = id;
        actions([Action::SelectionChanged(id), Action::RenderNeeded])
    }
}

fn actions<const N: usize>(list: [Action; N]) -> Actions {
    list.into_iter().collect()
}
