//! Keyboard shortcut registry and documentation.

use canvas3d_core::Mode;

/// Shell commands reachable from the keyboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    New,
    Open,
    Save,
    Undo,
    Redo,
    Copy,
    Paste,
    SelectAll,
    Delete,
    Cancel,
    SetMode(Mode),
    CycleRenderingMode,
    AddLayer,
    InsertLayer,
    DeleteLayer,
    PreviousLayer,
    NextLayer,
    ToggleSubtype,
}

/// A keyboard shortcut definition.
#[derive(Debug, Clone)]
pub struct Shortcut {
    pub key: &'static str,
    pub ctrl: bool,
    pub shift: bool,
    pub command: Command,
    pub description: &'static str,
}

impl Shortcut {
    pub const fn new(
        key: &'static str,
        ctrl: bool,
        shift: bool,
        command: Command,
        description: &'static str,
    ) -> Self {
        Self {
            key,
            ctrl,
            shift,
            command,
            description,
        }
    }

    /// Format the shortcut for display (e.g., "Ctrl+S").
    pub fn format(&self) -> String {
        let mut parts = Vec::new();
        if self.ctrl {
            parts.push("Ctrl");
        }
        if self.shift {
            parts.push("Shift");
        }
        parts.push(self.key);
        parts.join("+")
    }

    fn matches(&self, key: &str, ctrl: bool, shift: bool) -> bool {
        self.ctrl == ctrl && self.shift == shift && self.key.eq_ignore_ascii_case(key)
    }
}

/// Registry of all keyboard shortcuts.
pub struct ShortcutRegistry;

impl ShortcutRegistry {
    /// Get all registered shortcuts.
    pub fn all() -> Vec<Shortcut> {
        vec![
            Shortcut::new("N", true, false, Command::New, "New design"),
            Shortcut::new("O", true, false, Command::Open, "Open..."),
            Shortcut::new("S", true, false, Command::Save, "Save..."),
            Shortcut::new("Z", true, false, Command::Undo, "Undo"),
            Shortcut::new("Z", true, true, Command::Redo, "Redo"),
            Shortcut::new("Y", true, false, Command::Redo, "Redo"),
            Shortcut::new("C", true, false, Command::Copy, "Copy shapes"),
            Shortcut::new("V", true, false, Command::Paste, "Paste shapes"),
            Shortcut::new("A", true, false, Command::SelectAll, "Select all shapes"),
            Shortcut::new("Delete", false, false, Command::Delete, "Delete selected shapes"),
            Shortcut::new("Backspace", false, false, Command::Delete, "Delete selected shapes"),
            Shortcut::new("Escape", false, false, Command::Cancel, "Cancel and return to select"),
            Shortcut::new("S", false, false, Command::SetMode(Mode::Select), "Select mode"),
            Shortcut::new("R", false, false, Command::SetMode(Mode::DrawRectangle), "Draw rectangles"),
            Shortcut::new("C", false, false, Command::SetMode(Mode::DrawCircle), "Draw circles"),
            Shortcut::new("P", false, false, Command::SetMode(Mode::DrawPolygon), "Draw polygons"),
            Shortcut::new("X", false, false, Command::ToggleSubtype, "Toggle body/auxiliary shapes"),
            Shortcut::new("M", false, false, Command::CycleRenderingMode, "Next rendering mode"),
            Shortcut::new("L", true, false, Command::AddLayer, "Add layer on top"),
            Shortcut::new("I", true, false, Command::InsertLayer, "Insert layer above current"),
            Shortcut::new("D", true, false, Command::DeleteLayer, "Delete current layer"),
            Shortcut::new("PageUp", false, false, Command::NextLayer, "Next layer"),
            Shortcut::new("PageDown", false, false, Command::PreviousLayer, "Previous layer"),
        ]
    }

    /// Find the command bound to a key name with the given modifiers.
    pub fn lookup(key: &str, ctrl: bool, shift: bool) -> Option<Command> {
        Self::all()
            .into_iter()
            .find(|s| s.matches(key, ctrl, shift))
            .map(|s| s.command)
    }

    /// Print all shortcuts to console.
    pub fn print_all() {
        println!("\n=== Keyboard Shortcuts ===");
        for shortcut in Self::all() {
            println!("  {:20} {}", shortcut.format(), shortcut.description);
        }
        println!("  {:20} Orbit the camera", "Right-Drag");
        println!("  {:20} Fine orbit", "Shift+Right-Drag");
        println!("  {:20} Reset orbit", "Right-Click");
        println!("  {:20} Zoom", "Wheel");
        println!();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format() {
        let shortcut = Shortcut::new("Z", true, true, Command::Redo, "Redo");
        assert_eq!(shortcut.format(), "Ctrl+Shift+Z");
    }

    #[test]
    fn test_lookup_respects_modifiers() {
        assert_eq!(ShortcutRegistry::lookup("s", true, false), Some(Command::Save));
        assert_eq!(
            ShortcutRegistry::lookup("s", false, false),
            Some(Command::SetMode(Mode::Select))
        );
        assert_eq!(ShortcutRegistry::lookup("Z", true, true), Some(Command::Redo));
        assert_eq!(ShortcutRegistry::lookup("z", false, false), None);
    }

    #[test]
    fn test_no_conflicting_bindings() {
        let all = ShortcutRegistry::all();
        for (i, a) in all.iter().enumerate() {
            for b in &all[i + 1..] {
                assert!(
                    !(a.matches(b.key, b.ctrl, b.shift)),
                    "{} is bound twice",
                    a.format()
                );
            }
        }
    }
}
