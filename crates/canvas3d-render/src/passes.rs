//! Per-frame pass descriptors.
//!
//! Every pass is a plain value naming its program, its render target, the
//! textures it reads (with the unit each is bound to), its depth state and
//! what it draws. Backends turn these into pipelines and bind groups.

use crate::renderer::RenderingMode;

/// Binding slot of the per-frame uniform block.
pub const FRAME_UNIFORM_BINDING: u32 = 0;
/// Texture units by convention.
pub const UNIT_TEX0: u32 = 1;
pub const UNIT_TEX1: u32 = 2;
pub const UNIT_TEX2: u32 = 3;
pub const UNIT_TEX3: u32 = 4;
pub const UNIT_HATCHING: u32 = 5;
pub const UNIT_SHADOW_MAP: u32 = 6;
pub const UNIT_NOISE: u32 = 7;
pub const UNIT_DEPTH: u32 = 8;
/// Binding slot of the per-pass uniform block.
pub const PASS_UNIFORM_BINDING: u32 = 9;
/// Comparison sampler used with the shadow map.
pub const SHADOW_SAMPLER_BINDING: u32 = 10;
/// Filtering sampler used with the hatching volume.
pub const HATCHING_SAMPLER_BINDING: u32 = 11;

/// Shader programs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Program {
    /// Geometry pass into the G-buffer.
    Pass1,
    Shadow,
    Ssao,
    Line,
    Contour,
    Blur,
    /// Flat lines over the finished frame.
    Overlay,
}

impl Program {
    pub fn name(self) -> &'static str {
        match self {
            Program::Pass1 => "pass1",
            Program::Shadow => "shadow",
            Program::Ssao => "ssao",
            Program::Line => "line",
            Program::Contour => "contour",
            Program::Blur => "blur",
            Program::Overlay => "overlay",
        }
    }
}

/// Where a pass renders.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Target {
    /// Colour, normal, position and auxiliary attachments plus depth.
    GBuffer,
    /// Single ambient-occlusion attachment.
    AoBuffer,
    /// Depth-only map seen from the light.
    ShadowMap,
    /// The presented surface.
    Screen,
}

/// Textures a pass can read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Resource {
    Color,
    Normal,
    Position,
    Aux,
    Depth,
    Ao,
    ShadowMap,
    Noise,
    Hatching,
}

/// A texture bound to a unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Binding {
    pub unit: u32,
    /// Uniform name in the shader.
    pub name: &'static str,
    pub resource: Resource,
}

impl Binding {
    pub const fn new(unit: u32, name: &'static str, resource: Resource) -> Self {
        Self {
            unit,
            name,
            resource,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DepthCompare {
    LessEqual,
    Always,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DepthState {
    pub compare: DepthCompare,
    pub write: bool,
}

impl DepthState {
    /// Regular depth testing for scene geometry.
    pub const SCENE: DepthState = DepthState {
        compare: DepthCompare::LessEqual,
        write: true,
    };
    /// No depth testing for full-screen passes.
    pub const DISABLED: DepthState = DepthState {
        compare: DepthCompare::Always,
        write: false,
    };
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrawCall {
    /// Every uploaded object.
    Scene,
    /// One triangle covering the viewport.
    FullscreenQuad,
    /// The overlay line list.
    Overlay,
}

/// Shader switches uploaded per pass.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PassOptions {
    /// Sampling step in pixels for neighbourhood filters.
    pub texel_step: f32,
    pub use_hatching: bool,
    pub sketchy: bool,
    pub ssao_used: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PassDescriptor {
    pub label: &'static str,
    pub program: Program,
    pub target: Target,
    pub bindings: Vec<Binding>,
    pub depth: DepthState,
    /// Clear the target before drawing.
    pub clear: bool,
    pub draw: DrawCall,
    pub options: PassOptions,
}

impl PassDescriptor {
    pub fn binds(&self, resource: Resource) -> bool {
        self.bindings.iter().any(|b| b.resource == resource)
    }

    pub fn unit_of(&self, resource: Resource) -> Option<u32> {
        self.bindings
            .iter()
            .find(|b| b.resource == resource)
            .map(|b| b.unit)
    }
}

/// Depth from the light's view. Runs only when the shadow map is stale.
pub fn shadow_pass() -> PassDescriptor {
    PassDescriptor {
        label: "shadow map",
        program: Program::Shadow,
        target: Target::ShadowMap,
        bindings: Vec::new(),
        depth: DepthState::SCENE,
        clear: true,
        draw: DrawCall::Scene,
        options: PassOptions::default(),
    }
}

fn geometry_pass() -> PassDescriptor {
    PassDescriptor {
        label: "geometry",
        program: Program::Pass1,
        target: Target::GBuffer,
        bindings: vec![Binding::new(UNIT_SHADOW_MAP, "shadowMap", Resource::ShadowMap)],
        depth: DepthState::SCENE,
        clear: true,
        draw: DrawCall::Scene,
        options: PassOptions::default(),
    }
}

fn ssao_pass() -> PassDescriptor {
    PassDescriptor {
        label: "ssao",
        program: Program::Ssao,
        target: Target::AoBuffer,
        bindings: vec![
            Binding::new(UNIT_TEX1, "tex1", Resource::Normal),
            Binding::new(UNIT_TEX2, "tex2", Resource::Position),
            Binding::new(UNIT_NOISE, "noiseTex", Resource::Noise),
            Binding::new(UNIT_DEPTH, "depthTex", Resource::Depth),
        ],
        depth: DepthState::DISABLED,
        clear: true,
        draw: DrawCall::FullscreenQuad,
        options: PassOptions {
            texel_step: 2.0,
            ssao_used: true,
            ..PassOptions::default()
        },
    }
}

fn line_pass(use_hatching: bool, sketchy: bool) -> PassDescriptor {
    PassDescriptor {
        label: "line",
        program: Program::Line,
        target: Target::Screen,
        bindings: vec![
            Binding::new(UNIT_TEX0, "tex0", Resource::Color),
            Binding::new(UNIT_TEX1, "tex1", Resource::Normal),
            Binding::new(UNIT_TEX3, "tex3", Resource::Aux),
            Binding::new(UNIT_HATCHING, "hatchingTexture", Resource::Hatching),
            Binding::new(UNIT_DEPTH, "depthTex", Resource::Depth),
        ],
        depth: DepthState::DISABLED,
        clear: true,
        draw: DrawCall::FullscreenQuad,
        options: PassOptions {
            texel_step: 1.0,
            use_hatching,
            sketchy,
            ssao_used: false,
        },
    }
}

fn contour_pass() -> PassDescriptor {
    PassDescriptor {
        label: "contour",
        program: Program::Contour,
        target: Target::Screen,
        bindings: vec![Binding::new(UNIT_DEPTH, "depthTex", Resource::Depth)],
        depth: DepthState::DISABLED,
        clear: true,
        draw: DrawCall::FullscreenQuad,
        options: PassOptions {
            texel_step: 1.0,
            ..PassOptions::default()
        },
    }
}

fn blur_pass(ssao_used: bool) -> PassDescriptor {
    // Unit 4 carries the AO buffer when SSAO ran, the auxiliary attachment otherwise.
    let tex3 = if ssao_used { Resource::Ao } else { Resource::Aux };
    PassDescriptor {
        label: "composite",
        program: Program::Blur,
        target: Target::Screen,
        bindings: vec![
            Binding::new(UNIT_TEX0, "tex0", Resource::Color),
            Binding::new(UNIT_TEX1, "tex1", Resource::Normal),
            Binding::new(UNIT_TEX3, "tex3", tex3),
            Binding::new(UNIT_DEPTH, "depthTex", Resource::Depth),
        ],
        depth: DepthState::DISABLED,
        clear: true,
        draw: DrawCall::FullscreenQuad,
        options: PassOptions {
            texel_step: 2.0,
            ssao_used,
            ..PassOptions::default()
        },
    }
}

/// Overlay lines drawn on top of whatever the effect pass left on screen.
pub fn overlay_pass() -> PassDescriptor {
    PassDescriptor {
        label: "overlay",
        program: Program::Overlay,
        target: Target::Screen,
        bindings: Vec::new(),
        depth: DepthState::DISABLED,
        clear: false,
        draw: DrawCall::Overlay,
        options: PassOptions::default(),
    }
}

/// Passes of one frame, excluding the shadow refresh and the overlay.
pub fn frame_passes(mode: RenderingMode) -> Vec<PassDescriptor> {
    let mut passes = vec![geometry_pass()];
    match mode {
        RenderingMode::Basic => {}
        RenderingMode::Ssao => passes.push(ssao_pass()),
        RenderingMode::Line => passes.push(line_pass(false, false)),
        RenderingMode::Hatching => passes.push(line_pass(true, false)),
        RenderingMode::Sketchy => passes.push(line_pass(false, true)),
        RenderingMode::Contour => passes.push(contour_pass()),
    }
    if matches!(mode, RenderingMode::Basic | RenderingMode::Ssao) {
        passes.push(blur_pass(mode == RenderingMode::Ssao));
    }
    passes
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn programs(mode: RenderingMode) -> Vec<Program> {
        frame_passes(mode).iter().map(|p| p.program).collect()
    }

    #[test]
    fn test_pass_sequence_per_mode() {
        use Program::*;
        assert_eq!(programs(RenderingMode::Basic), vec![Pass1, Blur]);
        assert_eq!(programs(RenderingMode::Ssao), vec![Pass1, Ssao, Blur]);
        assert_eq!(programs(RenderingMode::Line), vec![Pass1, Line]);
        assert_eq!(programs(RenderingMode::Hatching), vec![Pass1, Line]);
        assert_eq!(programs(RenderingMode::Sketchy), vec![Pass1, Line]);
        assert_eq!(programs(RenderingMode::Contour), vec![Pass1, Contour]);
    }

    #[test]
    fn test_units_unique_within_pass() {
        let mut all = vec![shadow_pass()];
        for mode in RenderingMode::ALL {
            all.extend(frame_passes(mode));
        }
        for pass in &all {
            let mut units = HashSet::new();
            for b in &pass.bindings {
                assert!(units.insert(b.unit), "{} binds unit {} twice", pass.label, b.unit);
                assert_ne!(b.unit, FRAME_UNIFORM_BINDING);
                assert_ne!(b.unit, PASS_UNIFORM_BINDING);
            }
        }
    }

    #[test]
    fn test_fullscreen_passes_skip_depth_test() {
        for mode in RenderingMode::ALL {
            for pass in frame_passes(mode) {
                match pass.draw {
                    DrawCall::FullscreenQuad | DrawCall::Overlay => {
                        assert_eq!(pass.depth, DepthState::DISABLED)
                    }
                    DrawCall::Scene => assert_eq!(pass.depth.compare, DepthCompare::LessEqual),
                }
            }
        }
    }

    #[test]
    fn test_overlay_loads_the_screen() {
        let pass = overlay_pass();
        assert_eq!(pass.target, Target::Screen);
        assert!(!pass.clear);
        assert!(pass.bindings.is_empty());
        for mode in RenderingMode::ALL {
            assert!(frame_passes(mode).iter().all(|p| p.program != Program::Overlay));
        }
    }

    #[test]
    fn test_geometry_pass_reads_shadow_map() {
        let pass = &frame_passes(RenderingMode::Basic)[0];
        assert_eq!(pass.target, Target::GBuffer);
        assert_eq!(pass.unit_of(Resource::ShadowMap), Some(UNIT_SHADOW_MAP));
    }

    #[test]
    fn test_blur_multiplies_ao_only_after_ssao() {
        let basic = frame_passes(RenderingMode::Basic).pop().expect("blur");
        let ssao = frame_passes(RenderingMode::Ssao).pop().expect("blur");
        assert!(!basic.options.ssao_used && basic.binds(Resource::Aux));
        assert!(ssao.options.ssao_used && ssao.binds(Resource::Ao));
        assert_eq!(ssao.unit_of(Resource::Ao), Some(UNIT_TEX3));
    }

    #[test]
    fn test_line_variants() {
        let hatching = frame_passes(RenderingMode::Hatching).pop().expect("line");
        let sketchy = frame_passes(RenderingMode::Sketchy).pop().expect("line");
        assert!(hatching.options.use_hatching && !hatching.options.sketchy);
        assert!(sketchy.options.sketchy && !sketchy.options.use_hatching);
        assert_eq!(hatching.unit_of(Resource::Hatching), Some(UNIT_HATCHING));
    }
}
