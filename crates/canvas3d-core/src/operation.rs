//! Per-gesture transform state.

use kurbo::{Point, Vec2};

/// The transform in progress between pointer-down and pointer-up.
///
/// All points are in world coordinates. `pivot` is the pointer position at
/// the previous event and is advanced after every incremental update.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Operation {
    Move {
        pivot: Point,
    },
    Rotate {
        pivot: Point,
        rotation_center: Point,
    },
    Resize {
        pivot: Point,
        resize_center: Point,
    },
}

impl Operation {
    pub fn pivot(&self) -> Point {
        match self {
            Operation::Move { pivot }
            | Operation::Rotate { pivot, .. }
            | Operation::Resize { pivot, .. } => *pivot,
        }
    }

    pub fn set_pivot(&mut self, point: Point) {
        match self {
            Operation::Move { pivot }
            | Operation::Rotate { pivot, .. }
            | Operation::Resize { pivot, .. } => *pivot = point,
        }
    }
}

/// Angle swept from `from` to `to` around `center`, in radians.
pub fn swept_angle(center: Point, from: Point, to: Point) -> f64 {
    let a = from - center;
    let b = to - center;
    b.y.atan2(b.x) - a.y.atan2(a.x)
}

/// Per-axis ratio of `to` over `from`, leaving an axis at 1 when either side is degenerate.
pub fn scale_ratio(from: Vec2, to: Vec2) -> Vec2 {
    const MIN: f64 = 1e-9;
    let axis = |a: f64, b: f64| {
        if a.abs() < MIN || b.abs() < MIN {
            1.0
        } else {
            b / a
        }
    };
    Vec2::new(axis(from.x, to.x), axis(from.y, to.y))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::FRAC_PI_2;

    #[test]
    fn test_set_pivot_keeps_variant() {
        let mut op = Operation::Rotate {
            pivot: Point::ZERO,
            rotation_center: Point::new(1.0, 1.0),
        };
        op.set_pivot(Point::new(4.0, 5.0));
        assert_eq!(op.pivot(), Point::new(4.0, 5.0));
        assert!(matches!(op, Operation::Rotate { rotation_center, .. } if rotation_center == Point::new(1.0, 1.0)));
    }

    #[test]
    fn test_swept_angle_quarter_turn() {
        let angle = swept_angle(Point::ZERO, Point::new(1.0, 0.0), Point::new(0.0, 3.0));
        assert!((angle - FRAC_PI_2).abs() < 1e-12);
    }

    #[test]
    fn test_scale_ratio_guards_zero() {
        let s = scale_ratio(Vec2::new(2.0, 0.0), Vec2::new(4.0, 3.0));
        assert_eq!(s, Vec2::new(2.0, 1.0));
        let s = scale_ratio(Vec2::new(2.0, 2.0), Vec2::new(0.0, -2.0));
        assert_eq!(s, Vec2::new(1.0, -1.0));
    }
}
