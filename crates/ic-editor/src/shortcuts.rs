//! Keyboard shortcut mapping.
//!
//! Maps key + modifier combos to semantic `ShortcutAction`s. On macOS `meta`
//! is ⌘; elsewhere `ctrl` plays the same role, so both are accepted.

use crate::tools::ToolKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShortcutAction {
    // ── Tool switching ──
    Tool(ToolKind),

    // ── Edit ──
    Undo,
    Redo,
    Delete,
    Deselect,

    // ── Canvas ──
    ToggleBackground,
}

pub struct ShortcutMap;

impl ShortcutMap {
    /// Resolve a key event to an action.
    ///
    /// `key` is the `KeyboardEvent.key` value (e.g. `"z"`, `"Delete"`).
    /// Returns `None` if the key combo has no binding.
    pub fn resolve(key: &str, ctrl: bool, shift: bool, _alt: bool, meta: bool) -> Option<ShortcutAction> {
        let cmd = ctrl || meta;

        if cmd && shift {
            return match key {
                "z" | "Z" => Some(ShortcutAction::Redo),
                _ => None,
            };
        }

        if cmd {
            return match key {
                "z" | "Z" => Some(ShortcutAction::Undo),
                "y" | "Y" => Some(ShortcutAction::Redo),
                "b" | "B" => Some(ShortcutAction::ToggleBackground),
                _ => None,
            };
        }

        if shift {
            return None;
        }

        match key {
            "p" | "P" => Some(ShortcutAction::Tool(ToolKind::Pen)),
            "e" | "E" => Some(ShortcutAction::Tool(ToolKind::Eraser)),
            "r" | "R" => Some(ShortcutAction::Tool(ToolKind::Rectangle)),
            "c" | "C" => Some(ShortcutAction::Tool(ToolKind::Circle)),
            "l" | "L" => Some(ShortcutAction::Tool(ToolKind::Line)),
            "t" | "T" => Some(ShortcutAction::Tool(ToolKind::Text)),
            "v" | "V" => Some(ShortcutAction::Tool(ToolKind::Move)),
            "Delete" | "Backspace" => Some(ShortcutAction::Delete),
            "Escape" => Some(ShortcutAction::Deselect),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolve_tool_shortcuts() {
        assert_eq!(
            ShortcutMap::resolve("p", false, false, false, false),
            Some(ShortcutAction::Tool(ToolKind::Pen))
        );
        assert_eq!(
            ShortcutMap::resolve("E", false, false, false, false),
            Some(ShortcutAction::Tool(ToolKind::Eraser))
        );
        assert_eq!(
            ShortcutMap::resolve("c", false, false, false, false),
            Some(ShortcutAction::Tool(ToolKind::Circle))
        );
        assert_eq!(
            ShortcutMap::resolve("v", false, false, false, false),
            Some(ShortcutAction::Tool(ToolKind::Move))
        );
    }

    #[test]
    fn resolve_undo_redo() {
        // Cmd+Z → Undo
        assert_eq!(
            ShortcutMap::resolve("z", false, false, false, true),
            Some(ShortcutAction::Undo)
        );
        // Ctrl+Z → Undo
        assert_eq!(
            ShortcutMap::resolve("z", true, false, false, false),
            Some(ShortcutAction::Undo)
        );
        // Ctrl+Shift+Z → Redo
        assert_eq!(
            ShortcutMap::resolve("Z", true, true, false, false),
            Some(ShortcutAction::Redo)
        );
        // Ctrl+Y → Redo
        assert_eq!(
            ShortcutMap::resolve("y", true, false, false, false),
            Some(ShortcutAction::Redo)
        );
    }

    #[test]
    fn resolve_delete_and_escape() {
        assert_eq!(
            ShortcutMap::resolve("Delete", false, false, false, false),
            Some(ShortcutAction::Delete)
        );
        assert_eq!(
            ShortcutMap::resolve("Backspace", false, false, false, false),
            Some(ShortcutAction::Delete)
        );
        assert_eq!(
            ShortcutMap::resolve("Escape", false, false, false, false),
            Some(ShortcutAction::Deselect)
        );
    }

    #[test]
    fn modified_letters_do_not_switch_tools() {
        assert_eq!(ShortcutMap::resolve("c", true, false, false, false), None);
        assert_eq!(ShortcutMap::resolve("P", false, true, false, false), None);
        assert_eq!(
            ShortcutMap::resolve("b", false, false, false, true),
            Some(ShortcutAction::ToggleBackground)
        );
    }
}
