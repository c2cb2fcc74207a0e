//! Frame orchestration on top of a [`GpuBackend`].

use crate::passes::{frame_passes, overlay_pass, shadow_pass};
use crate::renderer::{FrameStats, GpuBackend, RenderConfig, RenderResult, RenderingMode};
use crate::rng::SimpleRng;
use crate::ssao;
use crate::uniforms::{FrameUniforms, MAX_KERNEL_SIZE};
use canvas3d_core::{Camera, Light, SceneSink, Vertex};
use std::collections::BTreeMap;

/// Seed of the SSAO sample set, fixed so frames are reproducible.
const KERNEL_SEED: u32 = 0x5A0C_1E55;

/// Owns the backend and decides which passes each frame runs.
///
/// Geometry arrives through [`SceneSink`]. A shadow refresh requested by the
/// editor is deferred to the start of the next frame, so a burst of edits
/// costs one shadow pass. The overlay pass runs only while there are lines.
pub struct RenderManager<B: GpuBackend> {
    backend: B,
    config: RenderConfig,
    mode: RenderingMode,
    /// Triangle count per uploaded object.
    objects: BTreeMap<String, usize>,
    overlay_lines: usize,
    light: Light,
    shadow_dirty: bool,
    kernel: Vec<[f32; 4]>,
}

impl<B: GpuBackend> RenderManager<B> {
    pub fn new(backend: B, config: RenderConfig) -> Self {
        let size = config.ssao_kernel_size.min(MAX_KERNEL_SIZE);
        if size < config.ssao_kernel_size {
            log::warn!(
                "SSAO kernel size {} exceeds {MAX_KERNEL_SIZE}, clamping",
                config.ssao_kernel_size
            );
        }
        let kernel = ssao::kernel(size, &mut SimpleRng::new(KERNEL_SEED));
        Self {
            backend,
            config,
            mode: RenderingMode::default(),
            objects: BTreeMap::new(),
            overlay_lines: 0,
            light: Light::default(),
            shadow_dirty: true,
            kernel,
        }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    pub fn config(&self) -> &RenderConfig {
        &self.config
    }

    pub fn rendering_mode(&self) -> RenderingMode {
        self.mode
    }

    pub fn set_rendering_mode(&mut self, mode: RenderingMode) {
        if self.mode != mode {
            log::info!("Rendering mode: {}", mode.name());
            self.mode = mode;
        }
    }

    pub fn resize(&mut self, width: u32, height: u32) -> RenderResult<()> {
        self.backend.resize(width, height)
    }

    pub fn object_count(&self) -> usize {
        self.objects.len()
    }

    pub fn triangle_count(&self) -> usize {
        self.objects.values().sum()
    }

    pub fn overlay_line_count(&self) -> usize {
        self.overlay_lines
    }

    /// Render one frame from `camera`.
    pub fn render_frame(&mut self, camera: &Camera) -> RenderResult<FrameStats> {
        let uniforms = FrameUniforms::new(camera, &self.light, &self.config, &self.kernel);
        self.backend.begin_frame(&uniforms)?;

        let mut stats = FrameStats::default();
        if self.shadow_dirty {
            stats.triangles += self.backend.execute_pass(&shadow_pass())?;
            stats.passes += 1;
            stats.shadow_updated = true;
            self.shadow_dirty = false;
        }
        for pass in frame_passes(self.mode) {
            stats.triangles += self.backend.execute_pass(&pass)?;
            stats.passes += 1;
        }
        if self.overlay_lines > 0 {
            stats.lines += self.backend.execute_pass(&overlay_pass())?;
            stats.passes += 1;
        }

        self.backend.end_frame()?;
        Ok(stats)
    }
}

impl<B: GpuBackend> SceneSink for RenderManager<B> {
    fn add_geometry(&mut self, name: &str, vertices: Vec<Vertex>) {
        self.backend.upload_geometry(name, &vertices);
        self.objects.insert(name.to_string(), vertices.len() / 3);
    }

    fn remove_geometry(&mut self, name: &str) {
        self.backend.remove_geometry(name);
        self.objects.remove(name);
    }

    fn clear_geometry(&mut self) {
        self.backend.clear_geometry();
        self.objects.clear();
    }

    fn update_shadow_map(&mut self, light: &Light) {
        self.light = *light;
        self.shadow_dirty = true;
    }

    fn set_overlay(&mut self, lines: Vec<Vertex>) {
        self.backend.upload_overlay(&lines);
        self.overlay_lines = lines.len() / 2;
    }
}
