//! Prism extrusion of 2D outlines.

use bytemuck::{Pod, Zeroable};
use kurbo::Point;
use lyon_tessellation::math::point;
use lyon_tessellation::path::Path;
use lyon_tessellation::{
    BuffersBuilder, FillOptions, FillTessellator, FillVertex, TessellationError, VertexBuffers,
};
use peniko::Color;

/// Base colour of extruded solids.
pub const BODY_COLOR: Color = Color::new([0.9, 0.9, 0.9, 1.0]);

/// A vertex as uploaded to the GPU.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct Vertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub color: [f32; 4],
}

impl Vertex {
    pub fn new(position: [f32; 3], normal: [f32; 3], color: [f32; 4]) -> Self {
        Self {
            position,
            normal,
            color,
        }
    }
}

/// Build the triangle list of a closed prism over a counter-clockwise outline.
///
/// The bottom cap lies on `z = 0`, the top cap on `z = height`.
pub fn extrude(outline: &[Point], height: f64, color: Color) -> Vec<Vertex> {
    if outline.len() < 3 {
        return Vec::new();
    }
    let color = color.components;
    let top = height as f32;
    let cap = match fill_outline(outline) {
        Ok(cap) => cap,
        Err(e) => {
            log::warn!("Failed to tessellate outline of {} points: {e}", outline.len());
            return Vec::new();
        }
    };
    let n = outline.len();
    let mut vertices = Vec::with_capacity(cap.len() * 6 + n * 6);

    let at = |p: Point, z: f32| [p.x as f32, p.y as f32, z];

    for [a, b, c] in &cap {
        for p in [a, b, c] {
            vertices.push(Vertex::new([p[0], p[1], top], [0.0, 0.0, 1.0], color));
        }
        for p in [a, c, b] {
            vertices.push(Vertex::new([p[0], p[1], 0.0], [0.0, 0.0, -1.0], color));
        }
    }

    for i in 0..n {
        let a = outline[i];
        let b = outline[(i + 1) % n];
        let d = b - a;
        let len = d.hypot();
        if len <= f64::EPSILON {
            continue;
        }
        let normal = [(d.y / len) as f32, (-d.x / len) as f32, 0.0];
        let quad = [at(a, 0.0), at(b, 0.0), at(b, top), at(a, top)];
        for k in [0, 1, 2, 0, 2, 3] {
            vertices.push(Vertex::new(quad[k], normal, color));
        }
    }

    vertices
}

/// Fill the interior of a closed outline.
///
/// Every returned triangle is counter-clockwise and has a non-zero area.
fn fill_outline(outline: &[Point]) -> Result<Vec<[[f32; 2]; 3]>, TessellationError> {
    let mut builder = Path::builder();
    builder.begin(point(outline[0].x as f32, outline[0].y as f32));
    for p in &outline[1..] {
        builder.line_to(point(p.x as f32, p.y as f32));
    }
    builder.close();
    let path = builder.build();

    let mut buffers: VertexBuffers<[f32; 2], u32> = VertexBuffers::new();
    FillTessellator::new().tessellate_path(
        &path,
        &FillOptions::non_zero(),
        &mut BuffersBuilder::new(&mut buffers, |v: FillVertex| v.position().to_array()),
    )?;

    Ok(buffers
        .indices
        .chunks_exact(3)
        .filter_map(|tri| {
            let [a, b, c] = [0, 1, 2].map(|k| buffers.vertices[tri[k] as usize]);
            let area = (b[0] - a[0]) * (c[1] - a[1]) - (b[1] - a[1]) * (c[0] - a[0]);
            if area > 0.0 {
                Some([a, b, c])
            } else if area < 0.0 {
                Some([a, c, b])
            } else {
                None
            }
        })
        .collect())
}
