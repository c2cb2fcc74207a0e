//! wgpu implementation of [`GpuBackend`].

use crate::hatching::{HATCHING_LEVELS, HATCHING_SIZE, hatching_volume};
use crate::passes::{
    DepthCompare, DrawCall, FRAME_UNIFORM_BINDING, HATCHING_SAMPLER_BINDING, PASS_UNIFORM_BINDING,
    PassDescriptor, Program, Resource, SHADOW_SAMPLER_BINDING, Target,
};
use crate::renderer::{GpuBackend, RenderConfig, RenderResult, RendererError};
use crate::rng::SimpleRng;
use crate::ssao::{self, NOISE_SIZE};
use crate::uniforms::{FrameUniforms, PassUniforms};
use canvas3d_core::Vertex;
use std::collections::{BTreeMap, HashMap};
use wgpu::util::DeviceExt;

const COLOR_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8Unorm;
const NORMAL_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba16Float;
const POSITION_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba16Float;
const AUX_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8Unorm;
const AO_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8Unorm;
const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;
const NOISE_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba32Float;
const HATCHING_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::R8Unorm;

const NOISE_SEED: u32 = 0x0B5E_ED01;
/// View-space depth written where nothing was drawn, far behind any geometry.
const EMPTY_POSITION_Z: f64 = -10_000.0;

const VERTEX_ATTRIBUTES: [wgpu::VertexAttribute; 3] =
    wgpu::vertex_attr_array![0 => Float32x3, 1 => Float32x3, 2 => Float32x4];

fn shader_source(program: Program) -> String {
    let common = include_str!("shaders/common.wgsl");
    let fullscreen = include_str!("shaders/fullscreen.wgsl");
    match program {
        Program::Pass1 => format!("{common}\n{}", include_str!("shaders/pass1.wgsl")),
        Program::Shadow => format!("{common}\n{}", include_str!("shaders/shadow.wgsl")),
        Program::Ssao => format!("{common}\n{fullscreen}\n{}", include_str!("shaders/ssao.wgsl")),
        Program::Line => format!("{common}\n{fullscreen}\n{}", include_str!("shaders/line.wgsl")),
        Program::Contour => {
            format!("{common}\n{fullscreen}\n{}", include_str!("shaders/contour.wgsl"))
        }
        Program::Blur => format!("{common}\n{fullscreen}\n{}", include_str!("shaders/blur.wgsl")),
        Program::Overlay => format!("{common}\n{}", include_str!("shaders/overlay.wgsl")),
    }
}

/// A texture and its default view.
struct Attachment {
    texture: wgpu::Texture,
    view: wgpu::TextureView,
}

impl Attachment {
    fn new(
        device: &wgpu::Device,
        label: &str,
        size: wgpu::Extent3d,
        dimension: wgpu::TextureDimension,
        format: wgpu::TextureFormat,
        usage: wgpu::TextureUsages,
    ) -> Self {
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some(label),
            size,
            mip_level_count: 1,
            sample_count: 1,
            dimension,
            format,
            usage,
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        Self { texture, view }
    }

    fn upload(&self, queue: &wgpu::Queue, data: &[u8], bytes_per_row: u32) {
        let size = self.texture.size();
        queue.write_texture(
            wgpu::TexelCopyTextureInfo {
                texture: &self.texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            data,
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(bytes_per_row),
                rows_per_image: Some(size.height),
            },
            size,
        );
    }
}

/// Size-dependent render targets.
struct RenderTargets {
    color: Attachment,
    normal: Attachment,
    position: Attachment,
    aux: Attachment,
    depth: Attachment,
    ao: Attachment,
}

impl RenderTargets {
    fn new(device: &wgpu::Device, width: u32, height: u32) -> Self {
        let size = wgpu::Extent3d {
            width,
            height,
            depth_or_array_layers: 1,
        };
        let usage = wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::TEXTURE_BINDING;
        let d2 = wgpu::TextureDimension::D2;
        Self {
            color: Attachment::new(device, "gbuffer color", size, d2, COLOR_FORMAT, usage),
            normal: Attachment::new(device, "gbuffer normal", size, d2, NORMAL_FORMAT, usage),
            position: Attachment::new(device, "gbuffer position", size, d2, POSITION_FORMAT, usage),
            aux: Attachment::new(device, "gbuffer aux", size, d2, AUX_FORMAT, usage),
            depth: Attachment::new(device, "gbuffer depth", size, d2, DEPTH_FORMAT, usage),
            ao: Attachment::new(device, "ao buffer", size, d2, AO_FORMAT, usage),
        }
    }
}

struct GpuMesh {
    buffer: wgpu::Buffer,
    vertex_count: u32,
}

struct Pipeline {
    pipeline: wgpu::RenderPipeline,
    layout: wgpu::BindGroupLayout,
}

/// State of the frame being recorded.
struct Frame {
    encoder: wgpu::CommandEncoder,
    surface_texture: wgpu::SurfaceTexture,
    view: wgpu::TextureView,
}

/// Renders into a window surface with wgpu.
pub struct WgpuBackend {
    device: wgpu::Device,
    queue: wgpu::Queue,
    surface: wgpu::Surface<'static>,
    surface_config: wgpu::SurfaceConfiguration,
    targets: Option<RenderTargets>,
    shadow_map: Attachment,
    noise: Attachment,
    hatching: Attachment,
    frame_buffer: wgpu::Buffer,
    pass_buffers: HashMap<Program, wgpu::Buffer>,
    shadow_sampler: wgpu::Sampler,
    hatching_sampler: wgpu::Sampler,
    pipelines: HashMap<Program, Pipeline>,
    meshes: BTreeMap<String, GpuMesh>,
    overlay: Option<GpuMesh>,
    frame: Option<Frame>,
    background: wgpu::Color,
}

impl WgpuBackend {
    /// Pick an adapter for `surface`, open a device and allocate the
    /// size-independent resources.
    pub async fn new(
        instance: &wgpu::Instance,
        surface: wgpu::Surface<'static>,
        width: u32,
        height: u32,
        config: &RenderConfig,
    ) -> RenderResult<Self> {
        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .map_err(|e| RendererError::InitFailed(format!("No suitable GPU adapter: {e}")))?;
        let info = adapter.get_info();
        log::info!("Using adapter {} ({:?})", info.name, info.backend);

        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: Some("Canvas3D Device"),
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::default(),
                ..Default::default()
            })
            .await
            .map_err(|e| RendererError::InitFailed(format!("Device request failed: {e}")))?;

        let caps = surface.get_capabilities(&adapter);
        // Shading happens in display space, so avoid a second sRGB encode.
        let format = caps
            .formats
            .iter()
            .copied()
            .find(|f| !f.is_srgb())
            .or_else(|| caps.formats.first().copied())
            .ok_or_else(|| RendererError::InitFailed("Surface reports no formats".to_string()))?;
        let surface_config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format,
            width: width.max(1),
            height: height.max(1),
            present_mode: wgpu::PresentMode::AutoVsync,
            alpha_mode: caps
                .alpha_modes
                .first()
                .copied()
                .unwrap_or(wgpu::CompositeAlphaMode::Auto),
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &surface_config);
        log::info!("Surface format {format:?}");

        let max_size = device.limits().max_texture_dimension_2d;
        let shadow_size = config.shadow_map_size.clamp(1, max_size);
        if shadow_size != config.shadow_map_size {
            log::warn!(
                "Shadow map size {} unsupported, using {shadow_size}",
                config.shadow_map_size
            );
        }
        let shadow_map = Attachment::new(
            &device,
            "shadow map",
            wgpu::Extent3d {
                width: shadow_size,
                height: shadow_size,
                depth_or_array_layers: 1,
            },
            wgpu::TextureDimension::D2,
            DEPTH_FORMAT,
            wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::TEXTURE_BINDING,
        );

        let sampled = wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST;
        let noise = Attachment::new(
            &device,
            "ssao noise",
            wgpu::Extent3d {
                width: NOISE_SIZE,
                height: NOISE_SIZE,
                depth_or_array_layers: 1,
            },
            wgpu::TextureDimension::D2,
            NOISE_FORMAT,
            sampled,
        );
        let noise_data = ssao::noise(&mut SimpleRng::new(NOISE_SEED));
        noise.upload(&queue, bytemuck::cast_slice(&noise_data), NOISE_SIZE * 16);

        let hatching = Attachment::new(
            &device,
            "hatching volume",
            wgpu::Extent3d {
                width: HATCHING_SIZE,
                height: HATCHING_SIZE,
                depth_or_array_layers: HATCHING_LEVELS,
            },
            wgpu::TextureDimension::D3,
            HATCHING_FORMAT,
            sampled,
        );
        hatching.upload(
            &queue,
            &hatching_volume(HATCHING_SIZE, HATCHING_LEVELS),
            HATCHING_SIZE,
        );

        let shadow_sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("shadow sampler"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            compare: Some(wgpu::CompareFunction::LessEqual),
            ..Default::default()
        });
        let hatching_sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("hatching sampler"),
            address_mode_u: wgpu::AddressMode::Repeat,
            address_mode_v: wgpu::AddressMode::Repeat,
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            ..Default::default()
        });

        let frame_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("frame uniforms"),
            size: std::mem::size_of::<FrameUniforms>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let targets = (width > 0 && height > 0).then(|| RenderTargets::new(&device, width, height));

        Ok(Self {
            device,
            queue,
            surface,
            surface_config,
            targets,
            shadow_map,
            noise,
            hatching,
            frame_buffer,
            pass_buffers: HashMap::new(),
            shadow_sampler,
            hatching_sampler,
            pipelines: HashMap::new(),
            meshes: BTreeMap::new(),
            overlay: None,
            frame: None,
            background: wgpu::Color::WHITE,
        })
    }

    fn acquire(&mut self) -> RenderResult<wgpu::SurfaceTexture> {
        match self.surface.get_current_texture() {
            Ok(texture) => Ok(texture),
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                log::warn!("Surface lost, reconfiguring");
                self.surface.configure(&self.device, &self.surface_config);
                self.surface
                    .get_current_texture()
                    .map_err(|e| RendererError::Surface(e.to_string()))
            }
            Err(e) => Err(RendererError::Surface(e.to_string())),
        }
    }

    fn view<'a>(&'a self, targets: &'a RenderTargets, resource: Resource) -> &'a wgpu::TextureView {
        match resource {
            Resource::Color => &targets.color.view,
            Resource::Normal => &targets.normal.view,
            Resource::Position => &targets.position.view,
            Resource::Aux => &targets.aux.view,
            Resource::Depth => &targets.depth.view,
            Resource::Ao => &targets.ao.view,
            Resource::ShadowMap => &self.shadow_map.view,
            Resource::Noise => &self.noise.view,
            Resource::Hatching => &self.hatching.view,
        }
    }
}

fn color_formats(target: Target, screen: wgpu::TextureFormat) -> Vec<wgpu::TextureFormat> {
    match target {
        Target::GBuffer => vec![COLOR_FORMAT, NORMAL_FORMAT, POSITION_FORMAT, AUX_FORMAT],
        Target::AoBuffer => vec![AO_FORMAT],
        Target::ShadowMap => Vec::new(),
        Target::Screen => vec![screen],
    }
}

fn depth_format(target: Target) -> Option<wgpu::TextureFormat> {
    match target {
        Target::GBuffer | Target::ShadowMap => Some(DEPTH_FORMAT),
        Target::AoBuffer | Target::Screen => None,
    }
}

/// Clear value of colour attachment `index` of `target`.
fn clear_color(target: Target, index: usize, background: wgpu::Color) -> wgpu::Color {
    match (target, index) {
        (Target::GBuffer, 0) | (Target::Screen, _) => background,
        (Target::GBuffer, 2) => wgpu::Color {
            r: 0.0,
            g: 0.0,
            b: EMPTY_POSITION_Z,
            a: 0.0,
        },
        (Target::AoBuffer, _) => wgpu::Color::WHITE,
        _ => wgpu::Color::TRANSPARENT,
    }
}

fn topology(draw: DrawCall) -> wgpu::PrimitiveTopology {
    match draw {
        DrawCall::Scene | DrawCall::FullscreenQuad => wgpu::PrimitiveTopology::TriangleList,
        DrawCall::Overlay => wgpu::PrimitiveTopology::LineList,
    }
}

fn layout_entries(pass: &PassDescriptor) -> Vec<wgpu::BindGroupLayoutEntry> {
    let uniform = |binding| wgpu::BindGroupLayoutEntry {
        binding,
        visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
        ty: wgpu::BindingType::Buffer {
            ty: wgpu::BufferBindingType::Uniform,
            has_dynamic_offset: false,
            min_binding_size: None,
        },
        count: None,
    };
    let sampler = |binding, ty| wgpu::BindGroupLayoutEntry {
        binding,
        visibility: wgpu::ShaderStages::FRAGMENT,
        ty: wgpu::BindingType::Sampler(ty),
        count: None,
    };

    let mut entries = vec![uniform(FRAME_UNIFORM_BINDING), uniform(PASS_UNIFORM_BINDING)];
    for binding in &pass.bindings {
        let (sample_type, view_dimension) = match binding.resource {
            Resource::Depth | Resource::ShadowMap => {
                (wgpu::TextureSampleType::Depth, wgpu::TextureViewDimension::D2)
            }
            Resource::Hatching => (
                wgpu::TextureSampleType::Float { filterable: true },
                wgpu::TextureViewDimension::D3,
            ),
            _ => (
                wgpu::TextureSampleType::Float { filterable: false },
                wgpu::TextureViewDimension::D2,
            ),
        };
        entries.push(wgpu::BindGroupLayoutEntry {
            binding: binding.unit,
            visibility: wgpu::ShaderStages::FRAGMENT,
            ty: wgpu::BindingType::Texture {
                sample_type,
                view_dimension,
                multisampled: false,
            },
            count: None,
        });
    }
    if pass.binds(Resource::ShadowMap) {
        entries.push(sampler(SHADOW_SAMPLER_BINDING, wgpu::SamplerBindingType::Comparison));
    }
    if pass.binds(Resource::Hatching) {
        entries.push(sampler(HATCHING_SAMPLER_BINDING, wgpu::SamplerBindingType::Filtering));
    }
    entries
}

fn create_pipeline(
    device: &wgpu::Device,
    screen_format: wgpu::TextureFormat,
    pass: &PassDescriptor,
) -> Pipeline {
    let name = pass.program.name();
    log::debug!("Building {name} pipeline");
    let module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some(name),
        source: wgpu::ShaderSource::Wgsl(shader_source(pass.program).into()),
    });
    let layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        label: Some(name),
        entries: &layout_entries(pass),
    });
    let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
        label: Some(name),
        bind_group_layouts: &[&layout],
        push_constant_ranges: &[],
    });

    let vertex_layout = wgpu::VertexBufferLayout {
        array_stride: std::mem::size_of::<Vertex>() as u64,
        step_mode: wgpu::VertexStepMode::Vertex,
        attributes: &VERTEX_ATTRIBUTES,
    };
    let buffers: &[wgpu::VertexBufferLayout] = match pass.draw {
        DrawCall::Scene | DrawCall::Overlay => std::slice::from_ref(&vertex_layout),
        DrawCall::FullscreenQuad => &[],
    };
    let targets: Vec<Option<wgpu::ColorTargetState>> = color_formats(pass.target, screen_format)
        .into_iter()
        .map(|format| {
            Some(wgpu::ColorTargetState {
                format,
                blend: (pass.draw == DrawCall::Overlay).then_some(wgpu::BlendState::ALPHA_BLENDING),
                write_mask: wgpu::ColorWrites::ALL,
            })
        })
        .collect();
    let depth_stencil = depth_format(pass.target).map(|format| wgpu::DepthStencilState {
        format,
        depth_write_enabled: pass.depth.write,
        depth_compare: match pass.depth.compare {
            DepthCompare::LessEqual => wgpu::CompareFunction::LessEqual,
            DepthCompare::Always => wgpu::CompareFunction::Always,
        },
        stencil: wgpu::StencilState::default(),
        bias: if pass.program == Program::Shadow {
            wgpu::DepthBiasState {
                constant: 2,
                slope_scale: 2.0,
                clamp: 0.0,
            }
        } else {
            wgpu::DepthBiasState::default()
        },
    });

    let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some(name),
        layout: Some(&pipeline_layout),
        vertex: wgpu::VertexState {
            module: &module,
            entry_point: Some("vs_main"),
            buffers,
            compilation_options: Default::default(),
        },
        fragment: (!targets.is_empty()).then(|| wgpu::FragmentState {
            module: &module,
            entry_point: Some("fs_main"),
            targets: &targets,
            compilation_options: Default::default(),
        }),
        primitive: wgpu::PrimitiveState {
            topology: topology(pass.draw),
            ..Default::default()
        },
        depth_stencil,
        multisample: wgpu::MultisampleState::default(),
        multiview: None,
        cache: None,
    });
    Pipeline { pipeline, layout }
}

impl GpuBackend for WgpuBackend {
    fn resize(&mut self, width: u32, height: u32) -> RenderResult<()> {
        if width == 0 || height == 0 {
            self.targets = None;
            return Ok(());
        }
        self.surface_config.width = width;
        self.surface_config.height = height;
        self.surface.configure(&self.device, &self.surface_config);
        self.targets = Some(RenderTargets::new(&self.device, width, height));
        log::debug!("Render targets resized to {width}x{height}");
        Ok(())
    }

    fn upload_geometry(&mut self, name: &str, vertices: &[Vertex]) {
        if vertices.is_empty() {
            self.meshes.remove(name);
            return;
        }
        let buffer = self
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some(name),
                contents: bytemuck::cast_slice(vertices),
                usage: wgpu::BufferUsages::VERTEX,
            });
        self.meshes.insert(
            name.to_string(),
            GpuMesh {
                buffer,
                vertex_count: vertices.len() as u32,
            },
        );
    }

    fn remove_geometry(&mut self, name: &str) {
        self.meshes.remove(name);
    }

    fn clear_geometry(&mut self) {
        self.meshes.clear();
    }

    fn upload_overlay(&mut self, vertices: &[Vertex]) {
        self.overlay = (!vertices.is_empty()).then(|| GpuMesh {
            buffer: self
                .device
                .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                    label: Some("overlay"),
                    contents: bytemuck::cast_slice(vertices),
                    usage: wgpu::BufferUsages::VERTEX,
                }),
            vertex_count: vertices.len() as u32,
        });
    }

    fn begin_frame(&mut self, uniforms: &FrameUniforms) -> RenderResult<()> {
        if self.targets.is_none() {
            return Err(RendererError::IncompleteFramebuffer(
                "render targets are not allocated".to_string(),
            ));
        }
        if self.frame.take().is_some() {
            log::warn!("Previous frame was never finished, dropping it");
        }
        self.queue
            .write_buffer(&self.frame_buffer, 0, bytemuck::bytes_of(uniforms));
        let [r, g, b, a] = uniforms.background.map(f64::from);
        self.background = wgpu::Color { r, g, b, a };

        let surface_texture = self.acquire()?;
        let view = surface_texture
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());
        let encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Canvas3D Frame"),
            });
        self.frame = Some(Frame {
            encoder,
            surface_texture,
            view,
        });
        Ok(())
    }

    fn execute_pass(&mut self, pass: &PassDescriptor) -> RenderResult<usize> {
        if self.frame.is_none() {
            return Err(RendererError::RenderFailed(format!(
                "{} pass outside a frame",
                pass.label
            )));
        }
        if !self.pipelines.contains_key(&pass.program) {
            let pipeline = create_pipeline(&self.device, self.surface_config.format, pass);
            self.pipelines.insert(pass.program, pipeline);
        }

        let params = PassUniforms::new(pass, self.surface_config.width, self.surface_config.height);
        let device = &self.device;
        let buffer = self.pass_buffers.entry(pass.program).or_insert_with(|| {
            device.create_buffer(&wgpu::BufferDescriptor {
                label: Some(pass.program.name()),
                size: std::mem::size_of::<PassUniforms>() as u64,
                usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
                mapped_at_creation: false,
            })
        });
        self.queue.write_buffer(buffer, 0, bytemuck::bytes_of(&params));

        let Some(targets) = self.targets.as_ref() else {
            return Err(RendererError::IncompleteFramebuffer(format!(
                "{} pass has no render targets",
                pass.label
            )));
        };
        let Some(pipeline) = self.pipelines.get(&pass.program) else {
            return Err(RendererError::RenderFailed(format!(
                "no pipeline for {}",
                pass.program.name()
            )));
        };
        let Some(pass_buffer) = self.pass_buffers.get(&pass.program) else {
            return Err(RendererError::RenderFailed(format!(
                "no uniform buffer for {}",
                pass.program.name()
            )));
        };

        let mut entries = vec![
            wgpu::BindGroupEntry {
                binding: FRAME_UNIFORM_BINDING,
                resource: self.frame_buffer.as_entire_binding(),
            },
            wgpu::BindGroupEntry {
                binding: PASS_UNIFORM_BINDING,
                resource: pass_buffer.as_entire_binding(),
            },
        ];
        for binding in &pass.bindings {
            entries.push(wgpu::BindGroupEntry {
                binding: binding.unit,
                resource: wgpu::BindingResource::TextureView(self.view(targets, binding.resource)),
            });
        }
        if pass.binds(Resource::ShadowMap) {
            entries.push(wgpu::BindGroupEntry {
                binding: SHADOW_SAMPLER_BINDING,
                resource: wgpu::BindingResource::Sampler(&self.shadow_sampler),
            });
        }
        if pass.binds(Resource::Hatching) {
            entries.push(wgpu::BindGroupEntry {
                binding: HATCHING_SAMPLER_BINDING,
                resource: wgpu::BindingResource::Sampler(&self.hatching_sampler),
            });
        }
        let bind_group = self.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some(pass.label),
            layout: &pipeline.layout,
            entries: &entries,
        });

        let background = self.background;
        let depth_view = match pass.target {
            Target::GBuffer => Some(&targets.depth.view),
            Target::ShadowMap => Some(&self.shadow_map.view),
            Target::AoBuffer | Target::Screen => None,
        };
        let Some(frame) = self.frame.as_mut() else {
            return Err(RendererError::RenderFailed(format!(
                "{} pass outside a frame",
                pass.label
            )));
        };
        let color_views: Vec<&wgpu::TextureView> = match pass.target {
            Target::GBuffer => vec![
                &targets.color.view,
                &targets.normal.view,
                &targets.position.view,
                &targets.aux.view,
            ],
            Target::AoBuffer => vec![&targets.ao.view],
            Target::ShadowMap => Vec::new(),
            Target::Screen => vec![&frame.view],
        };
        let color_attachments: Vec<Option<wgpu::RenderPassColorAttachment>> = color_views
            .into_iter()
            .enumerate()
            .map(|(i, view)| {
                Some(wgpu::RenderPassColorAttachment {
                    view,
                    depth_slice: None,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: if pass.clear {
                            wgpu::LoadOp::Clear(clear_color(pass.target, i, background))
                        } else {
                            wgpu::LoadOp::Load
                        },
                        store: wgpu::StoreOp::Store,
                    },
                })
            })
            .collect();
        let depth_stencil_attachment =
            depth_view.map(|view| wgpu::RenderPassDepthStencilAttachment {
                view,
                depth_ops: Some(wgpu::Operations {
                    load: if pass.clear {
                        wgpu::LoadOp::Clear(1.0)
                    } else {
                        wgpu::LoadOp::Load
                    },
                    store: wgpu::StoreOp::Store,
                }),
                stencil_ops: None,
            });

        let mut primitives = 0;
        let mut render_pass = frame.encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some(pass.label),
            color_attachments: &color_attachments,
            depth_stencil_attachment,
            ..Default::default()
        });
        render_pass.set_pipeline(&pipeline.pipeline);
        render_pass.set_bind_group(0, &bind_group, &[]);
        match pass.draw {
            DrawCall::Scene => {
                for mesh in self.meshes.values() {
                    render_pass.set_vertex_buffer(0, mesh.buffer.slice(..));
                    render_pass.draw(0..mesh.vertex_count, 0..1);
                    primitives += mesh.vertex_count as usize / 3;
                }
            }
            DrawCall::FullscreenQuad => {
                render_pass.draw(0..3, 0..1);
                primitives = 1;
            }
            DrawCall::Overlay => {
                if let Some(overlay) = &self.overlay {
                    render_pass.set_vertex_buffer(0, overlay.buffer.slice(..));
                    render_pass.draw(0..overlay.vertex_count, 0..1);
                    primitives = overlay.vertex_count as usize / 2;
                }
            }
        }
        drop(render_pass);
        Ok(primitives)
    }

    fn end_frame(&mut self) -> RenderResult<()> {
        let Some(frame) = self.frame.take() else {
            return Err(RendererError::RenderFailed(
                "end_frame without begin_frame".to_string(),
            ));
        };
        self.queue.submit(std::iter::once(frame.encoder.finish()));
        frame.surface_texture.present();
        Ok(())
    }
}
