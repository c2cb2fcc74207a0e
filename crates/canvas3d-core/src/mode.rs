//! Editor modes.

use crate::shapes::ShapeKind;
use serde::{Deserialize, Serialize};

/// Editing mode of the canvas.
///
/// `Move`, `Rotate` and `Resize` are entered by the select gesture and only
/// last until the pointer is released.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum Mode {
    #[default]
    Select,
    Move,
    Rotate,
    Resize,
    DrawRectangle,
    DrawCircle,
    DrawPolygon,
}

impl Mode {
    /// Shape kind created by a draw mode.
    pub fn shape_kind(&self) -> Option<ShapeKind> {
        match self {
            Mode::DrawRectangle => Some(ShapeKind::Rectangle),
            Mode::DrawCircle => Some(ShapeKind::Circle),
            Mode::DrawPolygon => Some(ShapeKind::Polygon),
            _ => None,
        }
    }

    pub fn is_drawing(&self) -> bool {
        self.shape_kind().is_some()
    }

    /// Whether the mode belongs to an ongoing select gesture.
    pub fn is_transforming(&self) -> bool {
        matches!(self, Mode::Move | Mode::Rotate | Mode::Resize)
    }

    pub fn name(&self) -> &'static str {
        match self {
            Mode::Select => "Select",
            Mode::Move => "Move",
            Mode::Rotate => "Rotate",
            Mode::Resize => "Resize",
            Mode::DrawRectangle => "Rectangle",
            Mode::DrawCircle => "Circle",
            Mode::DrawPolygon => "Polygon",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_draw_modes_map_to_kinds() {
        assert_eq!(Mode::DrawCircle.shape_kind(), Some(ShapeKind::Circle));
        assert!(Mode::DrawPolygon.is_drawing());
        assert!(!Mode::Select.is_drawing());
        assert!(Mode::Resize.is_transforming());
        assert!(!Mode::DrawRectangle.is_transforming());
    }
}
