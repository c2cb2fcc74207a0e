//! Uniform blocks shared with the shaders.

use crate::passes::PassDescriptor;
use crate::renderer::RenderConfig;
use bytemuck::{Pod, Zeroable};
use canvas3d_core::{Camera, Light};

/// Largest SSAO kernel the frame block can carry.
pub const MAX_KERNEL_SIZE: usize = 64;

/// Per-frame block at binding 0. Layout matches `Frame` in `common.wgsl`.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct FrameUniforms {
    pub mvp: [[f32; 4]; 4],
    pub mv: [[f32; 4]; 4],
    pub proj: [[f32; 4]; 4],
    pub light_mvp: [[f32; 4]; 4],
    /// Direction the light travels in, `w = 0`.
    pub light_dir: [f32; 4],
    /// Width, height and their reciprocals.
    pub viewport: [f32; 4],
    /// Kernel size, radius, power.
    pub ssao: [f32; 4],
    pub background: [f32; 4],
    pub kernel: [[f32; 4]; MAX_KERNEL_SIZE],
}

impl FrameUniforms {
    pub fn new(camera: &Camera, light: &Light, config: &RenderConfig, kernel: &[[f32; 4]]) -> Self {
        let (width, height) = camera.viewport();
        let count = kernel.len().min(MAX_KERNEL_SIZE);
        let mut samples = [[0.0; 4]; MAX_KERNEL_SIZE];
        samples[..count].copy_from_slice(&kernel[..count]);
        Self {
            mvp: camera.mvp_matrix.to_cols_array_2d(),
            mv: camera.mv_matrix.to_cols_array_2d(),
            proj: camera.p_matrix.to_cols_array_2d(),
            light_mvp: light.view_projection.to_cols_array_2d(),
            light_dir: light.direction.extend(0.0).to_array(),
            viewport: [width, height, 1.0 / width, 1.0 / height],
            ssao: [count as f32, config.ssao_radius, config.ssao_power, 0.0],
            background: config.background.components,
            kernel: samples,
        }
    }
}

/// Per-pass block at binding 9. Layout matches `PassParams` in `common.wgsl`.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct PassUniforms {
    /// Sampling step in texture coordinates.
    pub texel: [f32; 2],
    pub use_hatching: u32,
    pub sketchy: u32,
    pub ssao_used: u32,
    pub _pad: [u32; 3],
}

impl PassUniforms {
    pub fn new(pass: &PassDescriptor, width: u32, height: u32) -> Self {
        let step = pass.options.texel_step;
        Self {
            texel: [step / width.max(1) as f32, step / height.max(1) as f32],
            use_hatching: pass.options.use_hatching as u32,
            sketchy: pass.options.sketchy as u32,
            ssao_used: pass.options.ssao_used as u32,
            _pad: [0; 3],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::passes::frame_passes;
    use crate::renderer::RenderingMode;

    #[test]
    fn test_block_sizes_match_shader_layout() {
        assert_eq!(std::mem::size_of::<FrameUniforms>(), 4 * 64 + 4 * 16 + MAX_KERNEL_SIZE * 16);
        assert_eq!(std::mem::size_of::<PassUniforms>(), 32);
    }

    #[test]
    fn test_kernel_truncated_and_counted() {
        let mut camera = Camera::new();
        camera.update_p_matrix(640, 480);
        let kernel = vec![[0.1, 0.2, 0.3, 0.0]; MAX_KERNEL_SIZE + 10];
        let frame = FrameUniforms::new(&camera, &Light::default(), &RenderConfig::default(), &kernel);
        assert_eq!(frame.ssao[0], MAX_KERNEL_SIZE as f32);
        assert_eq!(frame.viewport[..2], [640.0, 480.0]);
        assert_eq!(frame.light_dir[3], 0.0);
    }

    #[test]
    fn test_pass_flags() {
        let passes = frame_passes(RenderingMode::Ssao);
        let ssao = PassUniforms::new(&passes[1], 400, 200);
        assert_eq!(ssao.ssao_used, 1);
        assert_eq!(ssao.texel, [2.0 / 400.0, 2.0 / 200.0]);
    }
}
