//! Interface between the editor and whatever draws the 3D scene.

use crate::light::Light;
use crate::mesh::Vertex;
use std::collections::BTreeMap;

/// Receiver of the extruded geometry.
///
/// The editor pushes named triangle lists and asks for the shadow map to be
/// refreshed after the geometry changes. The flat overlay is replaced whole
/// whenever the view changes.
pub trait SceneSink {
    /// Add or replace the object called `name`.
    fn add_geometry(&mut self, name: &str, vertices: Vec<Vertex>);

    fn remove_geometry(&mut self, name: &str);

    fn clear_geometry(&mut self);

    fn update_shadow_map(&mut self, light: &Light);

    /// Replace the 2D overlay, a line list on `z = 0` in world space.
    fn set_overlay(&mut self, lines: Vec<Vertex>);
}

/// Name of the scene object generated for the shape at `index`.
pub fn object_name(index: usize) -> String {
    format!("object_{index}")
}

/// In-memory scene that records what it receives.
#[derive(Debug, Clone, Default)]
pub struct SceneBuffer {
    pub objects: BTreeMap<String, Vec<Vertex>>,
    pub light: Option<Light>,
    pub shadow_updates: usize,
    pub clears: usize,
    pub overlay: Vec<Vertex>,
}

impl SceneBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn object(&self, name: &str) -> Option<&[Vertex]> {
        self.objects.get(name).map(Vec::as_slice)
    }

    pub fn triangle_count(&self) -> usize {
        self.objects.values().map(|v| v.len() / 3).sum()
    }
}

impl SceneSink for SceneBuffer {
    fn add_geometry(&mut self, name: &str, vertices: Vec<Vertex>) {
        self.objects.insert(name.to_string(), vertices);
    }

    fn remove_geometry(&mut self, name: &str) {
        self.objects.remove(name);
    }

    fn clear_geometry(&mut self) {
        self.objects.clear();
        self.clears += 1;
    }

    fn update_shadow_map(&mut self, light: &Light) {
        self.light = Some(*light);
        self.shadow_updates += 1;
    }

    fn set_overlay(&mut self, lines: Vec<Vertex>) {
        self.overlay = lines;
    }
}
