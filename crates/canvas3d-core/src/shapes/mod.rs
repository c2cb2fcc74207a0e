//! Extrudable 2D shapes.
//!
//! Every shape stores its points in a local frame. The local frame is placed
//! in the world by a translation followed by a rotation, so hit-testing and
//! resizing happen in local space and only the frame moves when a shape is
//! translated or rotated.

mod circle;
mod polygon;
mod rectangle;

pub use circle::Circle;
pub use polygon::Polygon;
pub use rectangle::Rectangle;

use crate::mesh::{self, Vertex};
use kurbo::{Affine, Point, Rect, Vec2};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Unique identifier for shapes.
///
/// Copies of one shape across layers share the same id.
pub type ShapeId = Uuid;

/// Screen distance in pixels between a shape's top edge and its rotation marker.
pub const ROTATION_MARKER_DISTANCE: f64 = 20.0;

/// Height of the prism generated for body shapes, in world units.
pub const EXTRUSION_HEIGHT: f64 = 5.0;

/// Number of segments used to tessellate circle outlines.
pub const CIRCLE_SEGMENTS: usize = 48;

/// Offset applied to pasted shapes, in world units.
pub const PASTE_OFFSET: Vec2 = Vec2::new(2.0, -2.0);

/// Extents below this are treated as zero.
pub(crate) const DEGENERATE_EPSILON: f64 = 1e-6;

/// Errors raised when a drawing gesture tries to finish a shape.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ShapeError {
    #[error("shape needs at least {required} points, has {actual}")]
    TooFewPoints { required: usize, actual: usize },

    #[error("shape has a degenerate extent")]
    Degenerate,

    #[error("shape is not being drawn")]
    NotDrawing,
}

/// Whether a shape becomes a solid or only guides construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SubType {
    /// Extruded into the 3D scene.
    #[default]
    Body,
    /// Kept in 2D only.
    Auxiliary,
}

impl SubType {
    /// Name used in design files.
    pub fn name(&self) -> &'static str {
        match self {
            SubType::Body => "body",
            SubType::Auxiliary => "auxiliary",
        }
    }

    /// Parse the name used in design files.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "body" => Some(SubType::Body),
            "auxiliary" => Some(SubType::Auxiliary),
            _ => None,
        }
    }
}

/// State shared by every shape kind: identity, subtype and the local frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShapeBase {
    pub(crate) id: ShapeId,
    pub subtype: SubType,
    /// World position of the local origin.
    pub position: Point,
    /// Rotation of the local frame in radians, counter-clockwise.
    pub rotation: f64,
    #[serde(skip)]
    pub(crate) selected: bool,
    #[serde(skip)]
    pub(crate) drawing: bool,
}

impl ShapeBase {
    /// Create a frame whose origin sits at `origin` in world space.
    pub fn new(subtype: SubType, origin: Point) -> Self {
        Self {
            id: Uuid::new_v4(),
            subtype,
            position: origin,
            rotation: 0.0,
            selected: false,
            drawing: false,
        }
    }

    /// Local-to-world transform.
    pub fn transform(&self) -> Affine {
        Affine::translate(self.position.to_vec2()) * Affine::rotate(self.rotation)
    }
}

/// Common behaviour of all shapes.
///
/// Implementors provide their points and the shape-specific geometry; the
/// frame handling is shared.
pub trait ShapeTrait {
    fn base(&self) -> &ShapeBase;

    fn base_mut(&mut self) -> &mut ShapeBase;

    /// Local-space points defining the shape.
    fn points(&self) -> &[Point];

    fn points_mut(&mut self) -> &mut Vec<Point>;

    /// Inside test for a point already in local space.
    fn contains_local(&self, local: Point) -> bool;

    /// Closed outline in local space, counter-clockwise, without repeating the first point.
    fn outline(&self) -> Vec<Point>;

    /// Local outline as drawn in the overlay, and whether it is closed.
    fn preview_outline(&self) -> (Vec<Point>, bool) {
        (self.outline(), true)
    }

    /// Live feedback while drawing. With `snap_to_axis` rectangles become
    /// squares, circles stay round and a polygon's pending edge is forced
    /// horizontal or vertical.
    fn update_by_new_point(&mut self, local: Point, snap_to_axis: bool);

    /// Finish the drawing gesture.
    fn complete_drawing(&mut self) -> Result<(), ShapeError>;

    /// Append a vertex while drawing. Only polygons accept extra points.
    fn add_point(&mut self, _local: Point) {}

    fn id(&self) -> ShapeId {
        self.base().id
    }

    fn subtype(&self) -> SubType {
        self.base().subtype
    }

    fn is_selected(&self) -> bool {
        self.base().selected
    }

    fn set_selected(&mut self, selected: bool) {
        self.base_mut().selected = selected;
    }

    fn is_drawing(&self) -> bool {
        self.base().drawing
    }

    fn start_drawing(&mut self) {
        self.base_mut().drawing = true;
    }

    fn local_coordinate(&self, world: Point) -> Point {
        self.base().transform().inverse() * world
    }

    fn world_coordinate(&self, local: Point) -> Point {
        self.base().transform() * local
    }

    /// Whether a world-space point lies inside the filled area.
    fn hit(&self, world: Point) -> bool {
        self.contains_local(self.local_coordinate(world))
    }

    /// Bounding box of the points in local space.
    fn bounding_box(&self) -> Rect {
        let mut points = self.points().iter();
        let Some(first) = points.next() else {
            return Rect::ZERO;
        };
        points.fold(Rect::from_points(*first, *first), |rect, p| {
            rect.union_pt(*p)
        })
    }

    /// Local centre of the bounding box.
    fn center(&self) -> Point {
        self.bounding_box().center()
    }

    /// World position of the rotation marker for a view `scale` in pixels per unit.
    fn rotation_marker_position(&self, scale: f64) -> Point {
        let bbox = self.bounding_box();
        let top = Point::new(bbox.center().x, bbox.y1 + ROTATION_MARKER_DISTANCE / scale);
        self.world_coordinate(top)
    }

    fn translate(&mut self, delta: Vec2) {
        self.base_mut().position += delta;
    }

    /// Rotate about the shape's own centre, keeping that centre fixed in the world.
    fn rotate(&mut self, angle: f64) {
        let center = self.center();
        let world_center = self.world_coordinate(center);
        let base = self.base_mut();
        base.rotation += angle;
        let rotated = Affine::rotate(base.rotation) * center;
        base.position = world_center - rotated.to_vec2();
    }

    /// Scale every local point about a pivot given in local space.
    fn resize_local(&mut self, scale: Vec2, pivot: Point) {
        for p in self.points_mut().iter_mut() {
            p.x = pivot.x + (p.x - pivot.x) * scale.x;
            p.y = pivot.y + (p.y - pivot.y) * scale.y;
        }
    }

    /// Scale every local point about a pivot given in world space.
    fn resize(&mut self, scale: Vec2, pivot: Point) {
        let local = self.local_coordinate(pivot);
        self.resize_local(scale, local);
    }

    /// Triangle list of the extruded prism in world space.
    fn vertices(&self) -> Vec<Vertex> {
        let transform = self.base().transform();
        let outline: Vec<Point> = self.outline().into_iter().map(|p| transform * p).collect();
        mesh::extrude(&outline, EXTRUSION_HEIGHT, mesh::BODY_COLOR)
    }
}

/// Enum wrapper for all shape kinds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Shape {
    Rectangle(Rectangle),
    Circle(Circle),
    Polygon(Polygon),
}

impl Shape {
    /// Start drawing a shape of the given kind at a world point.
    pub fn begin(kind: ShapeKind, subtype: SubType, origin: Point) -> Self {
        let mut shape = match kind {
            ShapeKind::Rectangle => Shape::Rectangle(Rectangle::new(subtype, origin)),
            ShapeKind::Circle => Shape::Circle(Circle::new(subtype, origin)),
            ShapeKind::Polygon => Shape::Polygon(Polygon::new(subtype, origin)),
        };
        shape.start_drawing();
        shape
    }

    pub fn kind(&self) -> ShapeKind {
        match self {
            Shape::Rectangle(_) => ShapeKind::Rectangle,
            Shape::Circle(_) => ShapeKind::Circle,
            Shape::Polygon(_) => ShapeKind::Polygon,
        }
    }

    /// Copy with a fresh identity.
    pub fn with_new_id(&self) -> Self {
        let mut shape = self.clone();
        shape.base_mut().id = Uuid::new_v4();
        shape
    }

    fn inner(&self) -> &dyn ShapeTrait {
        match self {
            Shape::Rectangle(s) => s,
            Shape::Circle(s) => s,
            Shape::Polygon(s) => s,
        }
    }

    fn inner_mut(&mut self) -> &mut dyn ShapeTrait {
        match self {
            Shape::Rectangle(s) => s,
            Shape::Circle(s) => s,
            Shape::Polygon(s) => s,
        }
    }
}

impl ShapeTrait for Shape {
    fn base(&self) -> &ShapeBase {
        self.inner().base()
    }

    fn base_mut(&mut self) -> &mut ShapeBase {
        self.inner_mut().base_mut()
    }

    fn points(&self) -> &[Point] {
        self.inner().points()
    }

    fn points_mut(&mut self) -> &mut Vec<Point> {
        self.inner_mut().points_mut()
    }

    fn contains_local(&self, local: Point) -> bool {
        self.inner().contains_local(local)
    }

    fn outline(&self) -> Vec<Point> {
        self.inner().outline()
    }

    fn preview_outline(&self) -> (Vec<Point>, bool) {
        self.inner().preview_outline()
    }

    fn update_by_new_point(&mut self, local: Point, snap_to_axis: bool) {
        self.inner_mut().update_by_new_point(local, snap_to_axis);
    }

    fn complete_drawing(&mut self) -> Result<(), ShapeError> {
        self.inner_mut().complete_drawing()
    }

    fn add_point(&mut self, local: Point) {
        self.inner_mut().add_point(local);
    }
}

/// Kind of shape, as named in design files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ShapeKind {
    Rectangle,
    Circle,
    Polygon,
}

impl ShapeKind {
    pub fn name(&self) -> &'static str {
        match self {
            ShapeKind::Rectangle => "rectangle",
            ShapeKind::Circle => "circle",
            ShapeKind::Polygon => "polygon",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "rectangle" => Some(ShapeKind::Rectangle),
            "circle" => Some(ShapeKind::Circle),
            "polygon" => Some(ShapeKind::Polygon),
            _ => None,
        }
    }
}

/// Rebuild a completed shape from stored data.
pub fn reconstruct(
    kind: ShapeKind,
    subtype: SubType,
    position: Point,
    rotation: f64,
    points: Vec<Point>,
) -> Result<Shape, ShapeError> {
    let mut base = ShapeBase::new(subtype, position);
    base.rotation = rotation;
    let mut shape = match kind {
        ShapeKind::Rectangle => Shape::Rectangle(Rectangle { base, points }),
        ShapeKind::Circle => Shape::Circle(Circle { base, points }),
        ShapeKind::Polygon => Shape::Polygon(Polygon {
            base,
            points,
            current_point: None,
        }),
    };
    shape.start_drawing();
    shape.complete_drawing()?;
    Ok(shape)
}

/// Snap `p` so the segment from `anchor` is horizontal or vertical.
pub(crate) fn snap_to_axis(anchor: Point, p: Point) -> Point {
    let d = p - anchor;
    if d.x.abs() >= d.y.abs() {
        Point::new(p.x, anchor.y)
    } else {
        Point::new(anchor.x, p.y)
    }
}

/// Make the box from `anchor` to `p` square, keeping the drag direction.
pub(crate) fn snap_to_square(anchor: Point, p: Point) -> Point {
    let d = p - anchor;
    let side = d.x.abs().max(d.y.abs());
    Point::new(
        anchor.x + side.copysign(d.x),
        anchor.y + side.copysign(d.y),
    )
}

/// Check the two-corner shapes share: both corners present and a non-empty box.
pub(crate) fn check_corners(points: &[Point]) -> Result<(), ShapeError> {
    if points.len() < 2 {
        return Err(ShapeError::TooFewPoints {
            required: 2,
            actual: points.len(),
        });
    }
    let d = points[1] - points[0];
    if d.x.abs() < DEGENERATE_EPSILON || d.y.abs() < DEGENERATE_EPSILON {
        return Err(ShapeError::Degenerate);
    }
    Ok(())
}
