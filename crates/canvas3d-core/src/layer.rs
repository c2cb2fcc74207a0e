//! Layers of index-aligned shapes.

use crate::shapes::{PASTE_OFFSET, Shape, ShapeTrait};
use serde::{Deserialize, Serialize};

/// An ordered list of shapes.
///
/// The editor keeps every layer the same length, so index `i` refers to the
/// same logical shape in all of them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Layer {
    pub shapes: Vec<Shape>,
}

impl Layer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.shapes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.shapes.is_empty()
    }

    pub fn select_all(&mut self) {
        for shape in &mut self.shapes {
            shape.set_selected(true);
        }
    }

    pub fn unselect_all(&mut self) {
        for shape in &mut self.shapes {
            shape.set_selected(false);
        }
    }

    /// Indices of the selected shapes, in order.
    pub fn selected_indices(&self) -> Vec<usize> {
        self.shapes
            .iter()
            .enumerate()
            .filter(|(_, s)| s.is_selected())
            .map(|(i, _)| i)
            .collect()
    }

    pub fn has_selection(&self) -> bool {
        self.shapes.iter().any(|s| s.is_selected())
    }

    /// Replace `buffer` with copies of the selected shapes.
    pub fn copy_selected_shapes(&self, buffer: &mut Vec<Shape>) {
        buffer.clear();
        buffer.extend(self.shapes.iter().filter(|s| s.is_selected()).cloned());
    }

    /// Append offset copies of `copied` with fresh ids, leaving only them selected.
    ///
    /// Returns the range of new indices.
    pub fn paste_copied_shapes(&mut self, copied: &[Shape]) -> std::ops::Range<usize> {
        self.unselect_all();
        let start = self.shapes.len();
        for shape in copied {
            let mut pasted = shape.with_new_id();
            pasted.translate(PASTE_OFFSET);
            pasted.set_selected(true);
            self.shapes.push(pasted);
        }
        start..self.shapes.len()
    }
}
