//! Polygon shape.

use super::{DEGENERATE_EPSILON, ShapeBase, ShapeError, ShapeTrait, SubType, snap_to_axis};
use kurbo::Point;
use serde::{Deserialize, Serialize};

/// Simple polygon built vertex by vertex.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Polygon {
    pub base: ShapeBase,
    pub points: Vec<Point>,
    /// Preview of the next vertex while drawing.
    #[serde(skip)]
    pub current_point: Option<Point>,
}

impl Polygon {
    /// Start a polygon whose first vertex is at `origin` in world space.
    pub fn new(subtype: SubType, origin: Point) -> Self {
        Self {
            base: ShapeBase::new(subtype, origin),
            points: vec![Point::ZERO],
            current_point: None,
        }
    }

    /// Create a completed polygon from world vertices.
    pub fn from_points(subtype: SubType, points: &[Point]) -> Self {
        let origin = points.first().copied().unwrap_or(Point::ZERO);
        Self {
            base: ShapeBase::new(subtype, origin),
            points: points.iter().map(|p| Point::ZERO + (*p - origin)).collect(),
            current_point: None,
        }
    }

    /// Twice the signed area of the local vertices.
    fn signed_area2(&self) -> f64 {
        let n = self.points.len();
        (0..n)
            .map(|i| {
                let a = self.points[i];
                let b = self.points[(i + 1) % n];
                a.x * b.y - b.x * a.y
            })
            .sum()
    }
}

impl ShapeTrait for Polygon {
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

    /// Crossing-number test.
    fn contains_local(&self, local: Point) -> bool {
        let n = self.points.len();
        if n < 3 {
            return false;
        }
        let mut inside = false;
        let mut j = n - 1;
        for i in 0..n {
            let a = self.points[i];
            let b = self.points[j];
            if (a.y > local.y) != (b.y > local.y) {
                let x = a.x + (local.y - a.y) * (b.x - a.x) / (b.y - a.y);
                if local.x < x {
                    inside = !inside;
                }
            }
            j = i;
        }
        inside
    }

    fn outline(&self) -> Vec<Point> {
        let mut outline = self.points.clone();
        if self.signed_area2() < 0.0 {
            outline.reverse();
        }
        outline
    }

    /// While drawing, the placed vertices followed by the pending one.
    fn preview_outline(&self) -> (Vec<Point>, bool) {
        if !self.base.drawing {
            return (self.outline(), true);
        }
        let mut points = self.points.clone();
        points.extend(self.current_point);
        (points, false)
    }

    fn update_by_new_point(&mut self, local: Point, snap: bool) {
        let preview = match (snap, self.points.last()) {
            (true, Some(last)) => snap_to_axis(*last, local),
            _ => local,
        };
        self.current_point = Some(preview);
    }

    fn add_point(&mut self, local: Point) {
        if self.base.drawing {
            self.points.push(local);
        }
    }

    fn complete_drawing(&mut self) -> Result<(), ShapeError> {
        if !self.base.drawing {
            return Err(ShapeError::NotDrawing);
        }
        self.points
            .dedup_by(|a, b| (*a - *b).hypot() < DEGENERATE_EPSILON);
        // closing click on the first vertex
        if self.points.len() > 1
            && (self.points[0] - self.points[self.points.len() - 1]).hypot() < DEGENERATE_EPSILON
        {
            self.points.pop();
        }
        if self.points.len() < 3 {
            return Err(ShapeError::TooFewPoints {
                required: 3,
                actual: self.points.len(),
            });
        }
        if self.signed_area2().abs() < DEGENERATE_EPSILON {
            return Err(ShapeError::Degenerate);
        }
        self.current_point = None;
        self.base.drawing = false;
        Ok(())
    }
}
