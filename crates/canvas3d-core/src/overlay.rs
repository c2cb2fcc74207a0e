//! Flat line overlay drawn over the 3D view while it faces the drawing plane.
//!
//! The overlay is a line list on `z = 0` in world space: the grid, the body
//! outlines of inactive layers washed towards white, every outline of the
//! active layer, the shape being drawn and the handles of selected shapes.

use crate::camera::Camera;
use crate::layer::Layer;
use crate::mesh::Vertex;
use crate::selection::{self, HandleKind};
use crate::shapes::{Shape, ShapeTrait, SubType};
use kurbo::Point;
use std::f64::consts::TAU;

/// Distance between grid lines, in world units.
pub const GRID_SPACING: f64 = 5.0;
/// Grid lines drawn on each side of the origin.
pub const GRID_HALF_COUNT: i32 = 200;
/// Largest orbit angle, in degrees, at which the overlay is shown.
pub const MAX_TILT: f32 = 10.0;
/// Opacity of the white wash over inactive layers.
pub const FADE_ALPHA: f32 = 160.0 / 255.0;

pub const GRID_COLOR: [f32; 4] = rgb(224, 224, 224);
pub const BODY_LINE_COLOR: [f32; 4] = rgb(0, 0, 0);
pub const AUXILIARY_LINE_COLOR: [f32; 4] = rgb(0, 128, 255);
pub const HANDLE_COLOR: [f32; 4] = rgb(0, 0, 255);

const MARKER_SEGMENTS: usize = 16;

const fn rgb(r: u8, g: u8, b: u8) -> [f32; 4] {
    [r as f32 / 255.0, g as f32 / 255.0, b as f32 / 255.0, 1.0]
}

/// `color` seen through the white wash.
pub fn faded(color: [f32; 4]) -> [f32; 4] {
    let [r, g, b, _] = color.map(|c| c * (1.0 - FADE_ALPHA) + FADE_ALPHA);
    [r, g, b, 1.0]
}

/// Whether the camera looks at the drawing plane closely enough for the overlay.
pub fn visible(camera: &Camera) -> bool {
    camera.xrot.abs() < MAX_TILT && camera.yrot.abs() < MAX_TILT
}

fn outline_color(shape: &Shape) -> [f32; 4] {
    match shape.subtype() {
        SubType::Body => BODY_LINE_COLOR,
        SubType::Auxiliary => AUXILIARY_LINE_COLOR,
    }
}

/// Accumulates line segments.
#[derive(Debug, Default)]
pub struct OverlayBuilder {
    vertices: Vec<Vertex>,
}

impl OverlayBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn line(&mut self, a: Point, b: Point, color: [f32; 4]) {
        for p in [a, b] {
            self.vertices
                .push(Vertex::new([p.x as f32, p.y as f32, 0.0], [0.0, 0.0, 1.0], color));
        }
    }

    pub fn polyline(&mut self, points: &[Point], closed: bool, color: [f32; 4]) {
        for pair in points.windows(2) {
            self.line(pair[0], pair[1], color);
        }
        if closed && points.len() > 2 {
            self.line(points[points.len() - 1], points[0], color);
        }
    }

    pub fn grid(&mut self, color: [f32; 4]) {
        let extent = GRID_SPACING * GRID_HALF_COUNT as f64;
        for i in -GRID_HALF_COUNT..=GRID_HALF_COUNT {
            let t = i as f64 * GRID_SPACING;
            self.line(Point::new(t, -extent), Point::new(t, extent), color);
            self.line(Point::new(-extent, t), Point::new(extent, t), color);
        }
    }

    /// Outline of a shape, open while a polygon is still being drawn.
    pub fn shape(&mut self, shape: &Shape, color: [f32; 4]) {
        let (local, closed) = shape.preview_outline();
        let world: Vec<Point> = local.into_iter().map(|p| shape.world_coordinate(p)).collect();
        self.polyline(&world, closed, color);
    }

    /// Corner squares and the rotation marker with its stem.
    pub fn handles(&mut self, shape: &Shape, scale: f64) {
        let half = selection::tolerance(scale) * 0.5;
        let bbox = shape.bounding_box();
        let stem = shape.world_coordinate(Point::new(bbox.center().x, bbox.y1));
        for handle in selection::get_handles(shape, scale) {
            let c = handle.position;
            match handle.kind {
                HandleKind::Corner(_) => {
                    let square = [
                        Point::new(c.x - half, c.y - half),
                        Point::new(c.x + half, c.y - half),
                        Point::new(c.x + half, c.y + half),
                        Point::new(c.x - half, c.y + half),
                    ];
                    self.polyline(&square, true, HANDLE_COLOR);
                }
                HandleKind::Rotate => {
                    let ring: Vec<Point> = (0..MARKER_SEGMENTS)
                        .map(|k| {
                            let a = TAU * k as f64 / MARKER_SEGMENTS as f64;
                            Point::new(c.x + half * a.cos(), c.y + half * a.sin())
                        })
                        .collect();
                    self.polyline(&ring, true, HANDLE_COLOR);
                    self.line(stem, c, HANDLE_COLOR);
                }
            }
        }
    }

    pub fn len(&self) -> usize {
        self.vertices.len() / 2
    }

    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    pub fn finish(self) -> Vec<Vertex> {
        self.vertices
    }
}

/// Overlay of the whole editing state, back to front.
pub fn build(layers: &[Layer], layer_id: usize, current: Option<&Shape>, scale: f64) -> Vec<Vertex> {
    let mut overlay = OverlayBuilder::new();
    overlay.grid(faded(GRID_COLOR));
    for (l, layer) in layers.iter().enumerate() {
        if l == layer_id {
            continue;
        }
        for shape in layer.shapes.iter().filter(|s| s.subtype() == SubType::Body) {
            overlay.shape(shape, faded(BODY_LINE_COLOR));
        }
    }
    if let Some(layer) = layers.get(layer_id) {
        for shape in &layer.shapes {
            overlay.shape(shape, outline_color(shape));
        }
        for shape in layer.shapes.iter().filter(|s| s.is_selected()) {
            overlay.handles(shape, scale);
        }
    }
    if let Some(shape) = current {
        overlay.shape(shape, outline_color(shape));
    }
    overlay.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shapes::{Polygon, Rectangle};

    const GRID_SEGMENTS: usize = 2 * (2 * GRID_HALF_COUNT as usize + 1);

    fn segments(vertices: &[Vertex], color: [f32; 4]) -> usize {
        vertices
            .chunks(2)
            .filter(|pair| pair[0].color == color)
            .count()
    }

    fn square(subtype: SubType) -> Shape {
        let mut rect = Rectangle::new(subtype, Point::ZERO);
        rect.start_drawing();
        rect.update_by_new_point(Point::new(10.0, 10.0), false);
        rect.complete_drawing().expect("valid rectangle");
        Shape::Rectangle(rect)
    }

    #[test]
    fn test_grid_only_for_empty_document() {
        let layers = vec![Layer::new(); 2];
        let overlay = build(&layers, 0, None, 10.0);
        assert_eq!(overlay.len(), GRID_SEGMENTS * 2);
        assert!(overlay.iter().all(|v| v.position[2] == 0.0));
        assert_eq!(segments(&overlay, faded(GRID_COLOR)), GRID_SEGMENTS);
    }

    #[test]
    fn test_inactive_layers_show_faded_bodies_only() {
        let mut layers = vec![Layer::new(); 2];
        for layer in &mut layers {
            layer.shapes.push(square(SubType::Body));
            layer.shapes.push(square(SubType::Auxiliary));
        }
        let overlay = build(&layers, 0, None, 10.0);
        assert_eq!(segments(&overlay, BODY_LINE_COLOR), 4);
        assert_eq!(segments(&overlay, AUXILIARY_LINE_COLOR), 4);
        assert_eq!(segments(&overlay, faded(BODY_LINE_COLOR)), 4);
        assert_eq!(segments(&overlay, HANDLE_COLOR), 0);
    }

    #[test]
    fn test_selected_shape_shows_handles() {
        let mut layers = vec![Layer::new(); 2];
        layers[0].shapes.push(square(SubType::Body));
        layers[0].shapes[0].set_selected(true);
        let overlay = build(&layers, 0, None, 10.0);
        // four squares, the marker ring and its stem
        assert_eq!(
            segments(&overlay, HANDLE_COLOR),
            4 * 4 + MARKER_SEGMENTS + 1
        );
    }

    #[test]
    fn test_polygon_in_progress_is_open_and_follows_pointer() {
        let mut poly = Polygon::new(SubType::Body, Point::ZERO);
        poly.start_drawing();
        poly.add_point(Point::new(10.0, 0.0));
        poly.update_by_new_point(Point::new(10.0, 7.0), false);
        let shape = Shape::Polygon(poly);

        let mut overlay = OverlayBuilder::new();
        overlay.shape(&shape, BODY_LINE_COLOR);
        let vertices = overlay.finish();
        assert_eq!(vertices.len(), 4);
        assert_eq!(vertices[3].position, [10.0, 7.0, 0.0]);
    }

    #[test]
    fn test_faded_mixes_towards_white() {
        let [r, g, b, a] = faded(BODY_LINE_COLOR);
        assert!((r - FADE_ALPHA).abs() < 1e-6);
        assert_eq!(r, g);
        assert_eq!(g, b);
        assert_eq!(a, 1.0);
    }

    #[test]
    fn test_hidden_when_orbited() {
        let mut camera = Camera::new();
        assert!(visible(&camera));
        camera.xrot = 30.0;
        assert!(!visible(&camera));
    }
}
