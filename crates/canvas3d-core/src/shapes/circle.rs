//! Circle shape.

use super::{
    CIRCLE_SEGMENTS, ShapeBase, ShapeError, ShapeTrait, SubType, check_corners, snap_to_square,
};
use kurbo::{Point, Rect};
use serde::{Deserialize, Serialize};
use std::f64::consts::TAU;

/// Ellipse inscribed in the box spanned by two local corner points.
///
/// Drawn as a circle when snapping; a non-uniform resize turns it into an ellipse.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Circle {
    pub base: ShapeBase,
    pub points: Vec<Point>,
}

impl Circle {
    pub fn new(subtype: SubType, origin: Point) -> Self {
        Self {
            base: ShapeBase::new(subtype, origin),
            points: vec![Point::ZERO],
        }
    }

    /// Create a completed circle from its world centre and radius.
    pub fn from_center(subtype: SubType, center: Point, radius: f64) -> Self {
        let origin = Point::new(center.x - radius, center.y - radius);
        Self {
            base: ShapeBase::new(subtype, origin),
            points: vec![Point::ZERO, Point::new(2.0 * radius, 2.0 * radius)],
        }
    }

    fn frame(&self) -> Rect {
        match self.points.as_slice() {
            [a, b, ..] => Rect::from_points(*a, *b),
            [a] => Rect::from_points(*a, *a),
            [] => Rect::ZERO,
        }
    }

    /// Local centre and radii.
    pub fn ellipse(&self) -> (Point, f64, f64) {
        let frame = self.frame();
        (frame.center(), frame.width() / 2.0, frame.height() / 2.0)
    }
}

impl ShapeTrait for Circle {
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
        let (center, rx, ry) = self.ellipse();
        if rx <= 0.0 || ry <= 0.0 {
            return false;
        }
        let dx = (local.x - center.x) / rx;
        let dy = (local.y - center.y) / ry;
        dx * dx + dy * dy <= 1.0
    }

    fn outline(&self) -> Vec<Point> {
        let (center, rx, ry) = self.ellipse();
        (0..CIRCLE_SEGMENTS)
            .map(|i| {
                let theta = TAU * i as f64 / CIRCLE_SEGMENTS as f64;
                Point::new(center.x + rx * theta.cos(), center.y + ry * theta.sin())
            })
            .collect()
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
