//! Selection handles for rotating and resizing shapes.

use crate::shapes::{Shape, ShapeTrait};
use kurbo::{Point, Rect};
use serde::{Deserialize, Serialize};

/// Handle hit radius in screen pixels.
pub const HANDLE_PIXEL_RADIUS: f64 = 10.0;

/// Type of selection handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HandleKind {
    /// Corner of the local bounding box.
    Corner(Corner),
    /// Rotation marker above the shape.
    Rotate,
}

/// Corners of a local bounding box. The local frame is y-up, so `Top` is max y.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Corner {
    BottomLeft,
    BottomRight,
    TopLeft,
    TopRight,
}

impl Corner {
    pub const ALL: [Corner; 4] = [
        Corner::BottomLeft,
        Corner::BottomRight,
        Corner::TopLeft,
        Corner::TopRight,
    ];

    /// Diagonally opposite corner, used as the fixed point of a resize.
    pub fn opposite(self) -> Corner {
        match self {
            Corner::BottomLeft => Corner::TopRight,
            Corner::BottomRight => Corner::TopLeft,
            Corner::TopLeft => Corner::BottomRight,
            Corner::TopRight => Corner::BottomLeft,
        }
    }

    /// Position of this corner on `bbox`.
    pub fn of(self, bbox: Rect) -> Point {
        match self {
            Corner::BottomLeft => Point::new(bbox.x0, bbox.y0),
            Corner::BottomRight => Point::new(bbox.x1, bbox.y0),
            Corner::TopLeft => Point::new(bbox.x0, bbox.y1),
            Corner::TopRight => Point::new(bbox.x1, bbox.y1),
        }
    }
}

/// A selection handle with its position and type.
#[derive(Debug, Clone, Copy)]
pub struct Handle {
    /// Position in world coordinates.
    pub position: Point,
    pub kind: HandleKind,
}

impl Handle {
    pub fn new(position: Point, kind: HandleKind) -> Self {
        Self { position, kind }
    }

    /// Check if a world point hits this handle.
    /// `tolerance` is in world units and should follow the view scale.
    pub fn hit_test(&self, point: Point, tolerance: f64) -> bool {
        let dx = point.x - self.position.x;
        let dy = point.y - self.position.y;
        dx * dx + dy * dy <= tolerance * tolerance
    }
}

/// World-space tolerance for a view `scale` in pixels per unit.
pub fn tolerance(scale: f64) -> f64 {
    HANDLE_PIXEL_RADIUS / scale
}

/// Handles of a shape in world coordinates: the rotation marker, then the corners.
pub fn get_handles(shape: &Shape, scale: f64) -> Vec<Handle> {
    let bbox = shape.bounding_box();
    let mut handles = Vec::with_capacity(5);
    handles.push(Handle::new(
        shape.rotation_marker_position(scale),
        HandleKind::Rotate,
    ));
    handles.extend(
        Corner::ALL
            .iter()
            .map(|c| Handle::new(shape.world_coordinate(c.of(bbox)), HandleKind::Corner(*c))),
    );
    handles
}

pub fn hit_rotation_handle(shape: &Shape, point: Point, scale: f64) -> bool {
    Handle::new(shape.rotation_marker_position(scale), HandleKind::Rotate)
        .hit_test(point, tolerance(scale))
}

/// Corner of the shape's box under a world point.
pub fn hit_corner(shape: &Shape, point: Point, scale: f64) -> Option<Corner> {
    get_handles(shape, scale)
        .into_iter()
        .find_map(|h| match h.kind {
            HandleKind::Corner(c) if h.hit_test(point, tolerance(scale)) => Some(c),
            _ => None,
        })
}

/// World position of the corner that stays fixed while `grabbed` is dragged.
pub fn resize_center(shape: &Shape, grabbed: Corner) -> Point {
    shape.world_coordinate(grabbed.opposite().of(shape.bounding_box()))
}
