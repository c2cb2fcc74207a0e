//! Renderer configuration, errors and the GPU backend abstraction.

use crate::passes::PassDescriptor;
use crate::uniforms::FrameUniforms;
use canvas3d_core::Vertex;
use peniko::Color;
use thiserror::Error;

/// Renderer errors.
#[derive(Debug, Error)]
pub enum RendererError {
    #[error("Initialization failed: {0}")]
    InitFailed(String),
    #[error("Incomplete framebuffer: {0}")]
    IncompleteFramebuffer(String),
    #[error("Surface error: {0}")]
    Surface(String),
    #[error("Render failed: {0}")]
    RenderFailed(String),
}

/// Result type for renderer operations.
pub type RenderResult<T> = Result<T, RendererError>;

/// Screen-space style applied after the geometry pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum RenderingMode {
    /// Shaded solids with shadows.
    #[default]
    Basic,
    /// Shaded solids darkened by ambient occlusion.
    Ssao,
    /// Ink outlines from depth and normal discontinuities.
    Line,
    /// Outlines over tone-mapped hatching strokes.
    Hatching,
    /// Jittered hand-drawn outlines.
    Sketchy,
    /// Silhouette lines from depth only.
    Contour,
}

impl RenderingMode {
    pub const ALL: [RenderingMode; 6] = [
        RenderingMode::Basic,
        RenderingMode::Ssao,
        RenderingMode::Line,
        RenderingMode::Hatching,
        RenderingMode::Sketchy,
        RenderingMode::Contour,
    ];

    /// Cycle to the next mode.
    pub fn next(self) -> Self {
        match self {
            RenderingMode::Basic => RenderingMode::Ssao,
            RenderingMode::Ssao => RenderingMode::Line,
            RenderingMode::Line => RenderingMode::Hatching,
            RenderingMode::Hatching => RenderingMode::Sketchy,
            RenderingMode::Sketchy => RenderingMode::Contour,
            RenderingMode::Contour => RenderingMode::Basic,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            RenderingMode::Basic => "basic",
            RenderingMode::Ssao => "ssao",
            RenderingMode::Line => "line",
            RenderingMode::Hatching => "hatching",
            RenderingMode::Sketchy => "sketchy",
            RenderingMode::Contour => "contour",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|m| m.name().eq_ignore_ascii_case(name))
    }
}

/// Renderer-facing settings.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderConfig {
    /// Edge length of the square shadow map in texels.
    pub shadow_map_size: u32,
    /// Number of hemisphere samples, at most [`crate::MAX_KERNEL_SIZE`].
    pub ssao_kernel_size: usize,
    /// Sampling radius in view-space units.
    pub ssao_radius: f32,
    /// Exponent applied to the occlusion term.
    pub ssao_power: f32,
    pub background: Color,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            shadow_map_size: 4096,
            ssao_kernel_size: 32,
            ssao_radius: 1.0,
            ssao_power: 2.0,
            background: Color::new([1.0, 1.0, 1.0, 1.0]),
        }
    }
}

/// What a frame did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrameStats {
    pub passes: usize,
    pub triangles: usize,
    /// Overlay line segments.
    pub lines: usize,
    pub shadow_updated: bool,
}

/// GPU side of the renderer.
///
/// The [`crate::RenderManager`] decides which passes run and in what order;
/// a backend owns the textures, pipelines and vertex buffers and executes one
/// [`PassDescriptor`] at a time between `begin_frame` and `end_frame`.
pub trait GpuBackend {
    /// Reallocate size-dependent targets. A zero size releases them.
    fn resize(&mut self, width: u32, height: u32) -> RenderResult<()>;

    /// Add or replace a named triangle list.
    fn upload_geometry(&mut self, name: &str, vertices: &[Vertex]);

    fn remove_geometry(&mut self, name: &str);

    fn clear_geometry(&mut self);

    /// Replace the overlay line list.
    fn upload_overlay(&mut self, vertices: &[Vertex]);

    fn begin_frame(&mut self, uniforms: &FrameUniforms) -> RenderResult<()>;

    /// Run one pass and return the number of primitives it drew: triangles,
    /// or line segments for the overlay.
    fn execute_pass(&mut self, pass: &PassDescriptor) -> RenderResult<usize>;

    fn end_frame(&mut self) -> RenderResult<()>;
}
