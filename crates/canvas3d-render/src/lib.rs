//! Canvas3D Render Library
//!
//! Pass orchestration for the extruded scene: a geometry pass into a
//! G-buffer, an optional shadow-map refresh, one screen-space effect chosen
//! by [`RenderingMode`], a final composite and the flat line overlay. The GPU work is delegated to
//! a [`GpuBackend`]; the default backend uses wgpu.

pub mod hatching;
mod manager;
pub mod passes;
mod renderer;
mod rng;
pub mod ssao;
mod uniforms;

#[cfg(feature = "wgpu-backend")]
mod wgpu_impl;

pub use manager::RenderManager;
pub use passes::{Binding, DrawCall, PassDescriptor, Program, Resource, Target};
pub use renderer::{FrameStats, GpuBackend, RenderConfig, RenderResult, RendererError, RenderingMode};
pub use rng::SimpleRng;
pub use uniforms::{FrameUniforms, MAX_KERNEL_SIZE, PassUniforms};

#[cfg(feature = "wgpu-backend")]
pub use wgpu_impl::WgpuBackend;
