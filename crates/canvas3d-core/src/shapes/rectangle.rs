//! Rectangle shape.

use super::{ShapeBase, ShapeError, ShapeTrait, SubType, check_corners, snap_to_square};
use kurbo::{Point, Rect};
use serde::{Deserialize, Serialize};

/// Axis-aligned (in its local frame) rectangle spanned by two corner points.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rectangle {
    pub base: ShapeBase,
    /// The anchor corner, then the dragged corner once it exists.
    pub points: Vec<Point>,
}

impl Rectangle {
    /// Start a rectangle whose first corner is at `origin` in world space.
    pub fn new(subtype: SubType, origin: Point) -> Self {
        Self {
            base: ShapeBase::new(subtype, origin),
            points: vec![Point::ZERO],
        }
    }

    /// Create a completed rectangle from two world corners.
    pub fn from_corners(subtype: SubType, p1: Point, p2: Point) -> Self {
        Self {
            base: ShapeBase::new(subtype, p1),
            points: vec![Point::ZERO, Point::ZERO + (p2 - p1)],
        }
    }

    /// Local footprint.
    pub fn as_rect(&self) -> Rect {
        match self.points.as_slice() {
            [a, b, ..] => Rect::from_points(*a, *b),
            [a] => Rect::from_points(*a, *a),
            [] => Rect::ZERO,
        }
    }
}

impl ShapeTrait for Rectangle {
    fn base(&self) -> &ShapeBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut ShapeBase {
        &mut self.base
    }

    fn points(&self) -> &[Point] {
        &self.points
    }

    fn points_mut(&mut self) -> &mut Vec<Point> {
        &mut self.points
    }

    fn contains_local(&self, local: Point) -> bool {
        let rect = self.as_rect();
        local.x >= rect.x0 && local.x <= rect.x1 && local.y >= rect.y0 && local.y <= rect.y1
    }

    fn outline(&self) -> Vec<Point> {
        let r = self.as_rect();
        vec![
            Point::new(r.x0, r.y0),
            Point::new(r.x1, r.y0),
            Point::new(r.x1, r.y1),
            Point::new(r.x0, r.y1),
        ]
    }

    fn update_by_new_point(&mut self, local: Point, snap_to_axis: bool) {
        let anchor = self.points[0];
        let corner = if snap_to_axis {
            snap_to_square(anchor, local)
        } else {
            local
        };
        if self.points.len() < 2 {
            self.points.push(corner);
        } else {
            self.points[1] = corner;
        }
    }

    fn complete_drawing(&mut self) -> Result<(), ShapeError> {
        if !self.base.drawing {
            return Err(ShapeError::NotDrawing);
        }
        check_corners(&self.points)?;
        self.points.truncate(2);
        self.base.drawing = false;
        Ok(())
    }
}
