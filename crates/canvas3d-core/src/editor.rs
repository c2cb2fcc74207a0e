//! The editing state machine.
//!
//! The editor owns the layers, the in-progress shape, the current gesture and
//! the camera. Every mutation that changes geometry is mirrored to a
//! [`SceneSink`] as named triangle lists, one `object_<index>` per body shape
//! of the active layer. Every redraw request also rebuilds the flat overlay.

use crate::camera::Camera;
use crate::history::{DEFAULT_HISTORY_CAPACITY, History};
use crate::input::{Modifiers, MouseButton, PointerEvent};
use crate::layer::Layer;
use crate::light::Light;
use crate::mode::Mode;
use crate::operation::{Operation, scale_ratio, swept_angle};
use crate::overlay;
use crate::scene::{SceneSink, object_name};
use crate::selection;
use crate::shapes::{Shape, ShapeKind, ShapeTrait, SubType};
use crate::storage::{self, Design, DesignMetadata, StorageResult};
use kurbo::Point;
use std::path::Path;

/// Number of layers a new editor starts with, and the minimum kept.
pub const MIN_LAYERS: usize = 2;

/// Camera distance change per wheel notch, in world units.
pub const WHEEL_ZOOM_STEP: f64 = 12.0;

/// Orbit sensitivity while ctrl is held.
const FINE_ORBIT_SENSITIVITY: f32 = 0.1;

/// Multi-layer shape editor driving a 3D scene.
pub struct Editor<S: SceneSink> {
    mode: Mode,
    layers: Vec<Layer>,
    layer_id: usize,
    current_shape: Option<Shape>,
    operation: Option<Operation>,
    /// Index of the shape whose handle started a rotate or resize gesture.
    selected_shape: Option<usize>,
    copied_shapes: Vec<Shape>,
    history: History,
    camera: Camera,
    light: Light,
    scene: S,
    /// Subtype given to newly drawn shapes.
    shape_subtype: SubType,
    author: String,
    camera_drag: bool,
    /// The last left press created `current_shape`.
    press_started_shape: bool,
    redraw_requested: bool,
}

impl<S: SceneSink> Editor<S> {
    pub fn new(scene: S) -> Self {
        Self::with_history_capacity(scene, DEFAULT_HISTORY_CAPACITY)
    }

    pub fn with_history_capacity(scene: S, capacity: usize) -> Self {
        let mut editor = Self {
            mode: Mode::Select,
            layers: vec![Layer::new(); MIN_LAYERS],
            layer_id: 0,
            current_shape: None,
            operation: None,
            selected_shape: None,
            copied_shapes: Vec::new(),
            history: History::new(capacity),
            camera: Camera::new(),
            light: Light::default(),
            scene,
            shape_subtype: SubType::Body,
            author: String::from("Canvas3D"),
            camera_drag: false,
            press_started_shape: false,
            redraw_requested: true,
        };
        editor.history.push(editor.layers.clone());
        editor.update_3d_geometry();
        editor.refresh_overlay();
        editor
    }

    // --- accessors ---

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn layers(&self) -> &[Layer] {
        &self.layers
    }

    pub fn layer_id(&self) -> usize {
        self.layer_id
    }

    pub fn active_layer(&self) -> &Layer {
        &self.layers[self.layer_id]
    }

    pub fn current_shape(&self) -> Option<&Shape> {
        self.current_shape.as_ref()
    }

    pub fn operation(&self) -> Option<&Operation> {
        self.operation.as_ref()
    }

    pub fn copied_shapes(&self) -> &[Shape] {
        &self.copied_shapes
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    pub fn light(&self) -> &Light {
        &self.light
    }

    pub fn scene(&self) -> &S {
        &self.scene
    }

    pub fn scene_mut(&mut self) -> &mut S {
        &mut self.scene
    }

    pub fn shape_subtype(&self) -> SubType {
        self.shape_subtype
    }

    pub fn set_shape_subtype(&mut self, subtype: SubType) {
        self.shape_subtype = subtype;
    }

    pub fn set_author(&mut self, author: impl Into<String>) {
        self.author = author.into();
    }

    /// Whether anything changed since the last call.
    pub fn take_redraw_request(&mut self) -> bool {
        std::mem::take(&mut self.redraw_requested)
    }

    fn request_redraw(&mut self) {
        self.refresh_overlay();
        self.redraw_requested = true;
    }

    /// Rebuild the overlay, empty while the camera is orbited away.
    fn refresh_overlay(&mut self) {
        let lines = if overlay::visible(&self.camera) {
            overlay::build(
                &self.layers,
                self.layer_id,
                self.current_shape.as_ref(),
                self.scale(),
            )
        } else {
            Vec::new()
        };
        self.scene.set_overlay(lines);
    }

    // --- coordinates ---

    /// Pixels per world unit on the drawing plane.
    pub fn scale(&self) -> f64 {
        self.camera.scale()
    }

    pub fn screen_to_world(&self, screen: Point) -> Point {
        self.camera.screen_to_world(screen)
    }

    pub fn world_to_screen(&self, world: Point) -> Point {
        self.camera.world_to_screen(world)
    }

    pub fn resize_viewport(&mut self, width: u32, height: u32) {
        self.camera.update_p_matrix(width, height);
        self.request_redraw();
    }

    // --- scene ---

    /// Rebuild every object of the active layer and refresh the shadow map.
    pub fn update_3d_geometry(&mut self) {
        self.scene.clear_geometry();
        for (i, shape) in self.layers[self.layer_id].shapes.iter().enumerate() {
            if shape.subtype() == SubType::Body {
                self.scene.add_geometry(&object_name(i), shape.vertices());
            }
        }
        self.scene.update_shadow_map(&self.light);
    }

    /// Re-push the geometry of the given active-layer shapes.
    fn refresh_geometry(&mut self, indices: &[usize]) {
        let mut changed = false;
        for &i in indices {
            let shape = &self.layers[self.layer_id].shapes[i];
            if shape.subtype() == SubType::Body {
                let name = object_name(i);
                self.scene.remove_geometry(&name);
                self.scene.add_geometry(&name, shape.vertices());
                changed = true;
            }
        }
        if changed {
            self.scene.update_shadow_map(&self.light);
        }
    }

    fn push_history(&mut self) {
        self.history.push(self.layers.clone());
    }

    // --- shell commands ---

    /// Remove every shape from every layer.
    pub fn clear(&mut self) {
        for layer in &mut self.layers {
            layer.shapes.clear();
        }
        self.selected_shape = None;
        self.current_shape = None;
        self.operation = None;
        self.mode = Mode::Select;
        self.history.clear();
        self.push_history();
        self.update_3d_geometry();
        self.request_redraw();
        log::info!("Cleared canvas");
    }

    /// Select every shape of the active layer.
    ///
    /// A transform in progress is committed first, a shape being drawn is
    /// discarded.
    pub fn select_all(&mut self) {
        if self.mode.is_transforming() {
            self.end_gesture();
        } else {
            self.set_mode(Mode::Select);
        }
        self.layers[self.layer_id].select_all();
        self.request_redraw();
    }

    pub fn unselect_all(&mut self) {
        self.layers[self.layer_id].unselect_all();
        self.current_shape = None;
        self.request_redraw();
    }

    /// Delete the shapes selected in the active layer from every layer.
    pub fn delete_selected_shapes(&mut self) {
        let selected = self.layers[self.layer_id].selected_indices();
        if selected.is_empty() {
            log::debug!("Nothing selected to delete");
            return;
        }
        for &i in selected.iter().rev() {
            for layer in &mut self.layers {
                layer.shapes.remove(i);
            }
        }
        self.selected_shape = None;
        self.current_shape = None;
        self.update_3d_geometry();
        self.push_history();
        self.request_redraw();
    }

    pub fn undo(&mut self) {
        match self.history.undo() {
            Ok(layers) => self.restore(layers),
            Err(e) => log::debug!("Undo ignored: {e}"),
        }
    }

    pub fn redo(&mut self) {
        match self.history.redo() {
            Ok(layers) => self.restore(layers),
            Err(e) => log::debug!("Redo ignored: {e}"),
        }
    }

    fn restore(&mut self, layers: Vec<Layer>) {
        self.layers = layers;
        if self.layer_id >= self.layers.len() {
            self.layer_id = self.layers.len().saturating_sub(1);
        }
        self.current_shape = None;
        self.operation = None;
        self.selected_shape = None;
        self.mode = Mode::Select;
        self.update_3d_geometry();
        self.request_redraw();
    }

    pub fn copy_selected_shapes(&mut self) {
        self.layers[self.layer_id].copy_selected_shapes(&mut self.copied_shapes);
        log::debug!("Copied {} shapes", self.copied_shapes.len());
    }

    /// Paste the copy buffer into the active layer and mirror it to the others.
    pub fn paste_copied_shapes(&mut self) {
        if self.copied_shapes.is_empty() {
            log::debug!("Nothing to paste");
            return;
        }
        let range = self.layers[self.layer_id].paste_copied_shapes(&self.copied_shapes);
        let pasted: Vec<Shape> = self.layers[self.layer_id].shapes[range]
            .iter()
            .map(|s| {
                let mut s = s.clone();
                s.set_selected(false);
                s
            })
            .collect();
        for (l, layer) in self.layers.iter_mut().enumerate() {
            if l != self.layer_id {
                layer.shapes.extend(pasted.iter().cloned());
            }
        }
        self.current_shape = None;
        self.mode = Mode::Select;
        self.update_3d_geometry();
        self.push_history();
        self.request_redraw();
    }

    /// Switch mode, discarding any shape still being drawn.
    pub fn set_mode(&mut self, mode: Mode) {
        if self.mode == mode {
            return;
        }
        if self.current_shape.take().is_some() {
            log::debug!("Discarded unfinished shape when leaving {}", self.mode.name());
        }
        self.operation = None;
        self.selected_shape = None;
        self.press_started_shape = false;
        log::debug!("Mode {} -> {}", self.mode.name(), mode.name());
        self.mode = mode;
        self.request_redraw();
    }

    /// Append a copy of the last layer and make it active.
    pub fn add_layer(&mut self) {
        let copy = self.layers[self.layers.len() - 1].clone();
        self.layers.push(copy);
        log::info!("Added layer {}", self.layers.len() - 1);
        self.set_layer(self.layers.len() - 1);
    }

    /// Insert a copy of the active layer at the active position.
    pub fn insert_layer(&mut self) {
        let copy = self.layers[self.layer_id].clone();
        self.layers.insert(self.layer_id, copy);
        log::info!("Inserted layer at {}", self.layer_id);
        self.set_layer(self.layer_id);
    }

    /// Delete the active layer, keeping at least [`MIN_LAYERS`].
    pub fn delete_layer(&mut self) {
        if self.layers.len() <= MIN_LAYERS {
            log::debug!("Keeping the last {MIN_LAYERS} layers");
            return;
        }
        self.layers.remove(self.layer_id);
        log::info!("Deleted layer {}", self.layer_id);
        let id = self.layer_id.min(self.layers.len() - 1);
        // The old index may be gone, so switch without touching it.
        self.layer_id = id;
        self.activate_layer();
    }

    /// Make `index` the active layer.
    pub fn set_layer(&mut self, index: usize) {
        if index >= self.layers.len() {
            log::debug!("No layer {index}");
            return;
        }
        self.layers[self.layer_id].unselect_all();
        self.layer_id = index;
        self.activate_layer();
    }

    fn activate_layer(&mut self) {
        self.current_shape = None;
        self.operation = None;
        self.selected_shape = None;
        self.update_3d_geometry();
        self.mode = Mode::Select;
        self.request_redraw();
    }

    /// Replace the document with the design stored at `path`.
    ///
    /// The editor is left untouched unless the whole file parses.
    pub fn open(&mut self, path: &Path) -> StorageResult<()> {
        let design = storage::load_design(path)?;
        let mut layers = design.layers;
        while layers.len() < MIN_LAYERS {
            log::warn!("Design has {} layers, duplicating the last", layers.len());
            let copy = layers[layers.len() - 1].clone();
            layers.push(copy);
        }
        align_ids(&mut layers);

        self.layers = layers;
        self.layer_id = 0;
        self.mode = Mode::Select;
        self.current_shape = None;
        self.operation = None;
        self.selected_shape = None;
        self.history.clear();
        self.push_history();
        self.update_3d_geometry();
        self.request_redraw();
        Ok(())
    }

    /// Write the document to `path`.
    pub fn save(&self, path: &Path) -> StorageResult<()> {
        let design = Design {
            metadata: DesignMetadata::now(&self.author),
            layers: self.layers.clone(),
        };
        storage::save_design(path, &design)
    }

    // --- pointer input ---

    pub fn handle_pointer_event(&mut self, event: PointerEvent) {
        match event {
            PointerEvent::Down {
                position,
                button,
                modifiers,
            } => self.pointer_down(position, button, modifiers),
            PointerEvent::Move {
                position,
                modifiers,
            } => self.pointer_move(position, modifiers),
            PointerEvent::Up {
                position,
                button,
                modifiers,
            } => self.pointer_up(position, button, modifiers),
            PointerEvent::DoubleClick {
                position,
                button,
                modifiers,
            } => self.double_click(position, button, modifiers),
            PointerEvent::Wheel { delta } => self.wheel(delta),
        }
    }

    pub fn pointer_down(&mut self, position: Point, button: MouseButton, modifiers: Modifiers) {
        match button {
            MouseButton::Left => {
                let world = self.screen_to_world(position);
                match self.mode {
                    Mode::Select => self.begin_gesture(world, modifiers.ctrl),
                    mode => {
                        if let Some(kind) = mode.shape_kind() {
                            self.draw_press(kind, world);
                        }
                    }
                }
            }
            MouseButton::Right => {
                self.camera.mouse_press(position.x as f32, position.y as f32);
                self.camera_drag = true;
            }
            MouseButton::Middle => {}
        }
    }

    /// Hit-test in priority order and start the matching gesture.
    fn begin_gesture(&mut self, world: Point, additive: bool) {
        let scale = self.scale();
        let layer = &self.layers[self.layer_id];

        if let Some(i) = layer
            .shapes
            .iter()
            .position(|s| selection::hit_rotation_handle(s, world, scale))
        {
            let shape = &layer.shapes[i];
            let rotation_center = shape.world_coordinate(shape.center());
            self.start_handle_gesture(
                i,
                Mode::Rotate,
                Operation::Rotate {
                    pivot: world,
                    rotation_center,
                },
            );
            return;
        }

        let corner_hit = layer.shapes.iter().enumerate().find_map(|(i, s)| {
            selection::hit_corner(s, world, scale).map(|c| (i, selection::resize_center(s, c)))
        });
        if let Some((i, resize_center)) = corner_hit {
            self.start_handle_gesture(
                i,
                Mode::Resize,
                Operation::Resize {
                    pivot: world,
                    resize_center,
                },
            );
            return;
        }

        if layer.shapes.iter().any(|s| s.is_selected() && s.hit(world)) {
            self.start_move(world);
            return;
        }

        if let Some(i) = layer
            .shapes
            .iter()
            .position(|s| s.subtype() == SubType::Body && s.hit(world))
        {
            let layer = &mut self.layers[self.layer_id];
            if !additive {
                layer.unselect_all();
            }
            layer.shapes[i].set_selected(true);
            self.start_move(world);
            return;
        }

        self.unselect_all();
    }

    fn start_handle_gesture(&mut self, index: usize, mode: Mode, operation: Operation) {
        let layer = &mut self.layers[self.layer_id];
        if !layer.shapes[index].is_selected() {
            layer.unselect_all();
            layer.shapes[index].set_selected(true);
        }
        self.selected_shape = Some(index);
        self.operation = Some(operation);
        log::debug!("Mode {} -> {}", self.mode.name(), mode.name());
        self.mode = mode;
        self.request_redraw();
    }

    fn start_move(&mut self, world: Point) {
        self.operation = Some(Operation::Move { pivot: world });
        self.mode = Mode::Move;
        self.request_redraw();
    }

    fn draw_press(&mut self, kind: ShapeKind, world: Point) {
        if let Some(shape) = &mut self.current_shape {
            if kind == ShapeKind::Polygon {
                let local = shape.local_coordinate(world);
                shape.add_point(local);
                self.request_redraw();
            }
            return;
        }
        self.layers[self.layer_id].unselect_all();
        self.current_shape = Some(Shape::begin(kind, self.shape_subtype, world));
        self.press_started_shape = true;
        self.request_redraw();
    }

    pub fn pointer_move(&mut self, position: Point, modifiers: Modifiers) {
        let world = self.screen_to_world(position);
        match (self.mode, self.operation) {
            (Mode::Move, Some(op)) => {
                let delta = world - op.pivot();
                let selected = self.layers[self.layer_id].selected_indices();
                for &i in &selected {
                    self.layers[self.layer_id].shapes[i].translate(delta);
                }
                self.refresh_geometry(&selected);
                self.advance_pivot(world);
            }
            (
                Mode::Rotate,
                Some(Operation::Rotate {
                    pivot,
                    rotation_center,
                }),
            ) => {
                let theta = swept_angle(rotation_center, pivot, world);
                let selected = self.layers[self.layer_id].selected_indices();
                for &i in &selected {
                    self.layers[self.layer_id].shapes[i].rotate(theta);
                }
                self.refresh_geometry(&selected);
                self.advance_pivot(world);
            }
            (
                Mode::Resize,
                Some(Operation::Resize {
                    pivot,
                    resize_center,
                }),
            ) => {
                self.resize_selected(pivot, resize_center, world);
                self.advance_pivot(world);
            }
            (mode, _) if mode.is_drawing() && self.current_shape.is_some() => {
                if let Some(shape) = &mut self.current_shape {
                    let local = shape.local_coordinate(world);
                    shape.update_by_new_point(local, modifiers.shift);
                }
                self.request_redraw();
            }
            _ if self.camera_drag => {
                let (x, y) = (position.x as f32, position.y as f32);
                if modifiers.shift {
                    self.camera.move_by(x, y);
                } else {
                    let sensitivity = if modifiers.ctrl {
                        FINE_ORBIT_SENSITIVITY
                    } else {
                        1.0
                    };
                    self.camera.rotate(x, y, sensitivity);
                }
                self.request_redraw();
            }
            _ => {}
        }
    }

    fn advance_pivot(&mut self, world: Point) {
        if let Some(op) = &mut self.operation {
            op.set_pivot(world);
        }
        self.request_redraw();
    }

    /// Scale every selected shape, in every layer, by the pointer motion
    /// measured in the grabbed shape's local frame.
    fn resize_selected(&mut self, pivot: Point, resize_center: Point, world: Point) {
        let Some(grabbed) = self.selected_shape else {
            return;
        };
        let active = &self.layers[self.layer_id];
        let Some(reference) = active.shapes.get(grabbed) else {
            return;
        };
        let center = reference.local_coordinate(resize_center);
        let from = reference.local_coordinate(pivot) - center;
        let to = reference.local_coordinate(world) - center;
        let scale = scale_ratio(from, to);

        let selected = active.selected_indices();
        for &i in &selected {
            let local_pivot = self.layers[self.layer_id].shapes[i].local_coordinate(resize_center);
            for layer in &mut self.layers {
                layer.shapes[i].resize_local(scale, local_pivot);
            }
        }
        self.refresh_geometry(&selected);
    }

    pub fn pointer_up(&mut self, position: Point, button: MouseButton, modifiers: Modifiers) {
        match button {
            MouseButton::Left => {
                if self.mode.is_transforming() {
                    self.end_gesture();
                } else if std::mem::take(&mut self.press_started_shape)
                    && matches!(
                        self.mode.shape_kind(),
                        Some(ShapeKind::Rectangle | ShapeKind::Circle)
                    )
                {
                    let world = self.screen_to_world(position);
                    if let Some(shape) = &mut self.current_shape {
                        let local = shape.local_coordinate(world);
                        shape.update_by_new_point(local, modifiers.shift);
                    }
                    self.finish_drawing();
                }
            }
            MouseButton::Right => {
                self.camera_drag = false;
                if !self.mode.is_transforming() {
                    self.camera.reset_orbit();
                    self.request_redraw();
                }
            }
            MouseButton::Middle => {}
        }
    }

    /// Finish a move, rotate or resize and record it as one undo step.
    fn end_gesture(&mut self) {
        self.operation = None;
        self.selected_shape = None;
        self.push_history();
        log::debug!("Mode {} -> {}", self.mode.name(), Mode::Select.name());
        self.mode = Mode::Select;
        self.request_redraw();
    }

    pub fn double_click(&mut self, _position: Point, button: MouseButton, _modifiers: Modifiers) {
        if button == MouseButton::Left && self.mode.is_drawing() {
            self.finish_drawing();
        }
    }

    /// Complete the in-progress shape and copy it into every layer.
    fn finish_drawing(&mut self) -> bool {
        let Some(mut shape) = self.current_shape.take() else {
            return false;
        };
        if let Err(e) = shape.complete_drawing() {
            log::debug!("Cannot complete {}: {e}", shape.kind().name());
            self.current_shape = Some(shape);
            return false;
        }
        shape.set_selected(false);
        for layer in &mut self.layers {
            layer.shapes.push(shape.clone());
        }
        if let Some(last) = self.layers[self.layer_id].shapes.last_mut() {
            last.set_selected(true);
        }
        self.update_3d_geometry();
        self.operation = None;
        self.press_started_shape = false;
        self.mode = Mode::Select;
        self.push_history();
        self.request_redraw();
        log::debug!("Completed {}", shape.kind().name());
        true
    }

    /// Zoom by `delta` wheel notches.
    pub fn wheel(&mut self, delta: f64) {
        self.camera.zoom((delta * WHEEL_ZOOM_STEP) as f32);
        self.request_redraw();
    }
}

/// Give the shapes at each index the id of the first layer's shape.
fn align_ids(layers: &mut [Layer]) {
    let Some((first, rest)) = layers.split_first_mut() else {
        return;
    };
    for layer in rest {
        for (shape, reference) in layer.shapes.iter_mut().zip(&first.shapes) {
            shape.base_mut().id = reference.id();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::SceneBuffer;
    use crate::selection::Corner;
    use kurbo::Vec2;
    use std::f64::consts::{FRAC_PI_2, TAU};

    fn editor() -> Editor<SceneBuffer> {
        let mut editor = Editor::new(SceneBuffer::new());
        editor.resize_viewport(800, 600);
        editor
    }

    fn screen(editor: &Editor<SceneBuffer>, x: f64, y: f64) -> Point {
        editor.world_to_screen(Point::new(x, y))
    }

    fn down(editor: &mut Editor<SceneBuffer>, world: Point, modifiers: Modifiers) {
        let p = editor.world_to_screen(world);
        editor.handle_pointer_event(PointerEvent::Down {
            position: p,
            button: MouseButton::Left,
            modifiers,
        });
    }

    fn drag_to(editor: &mut Editor<SceneBuffer>, world: Point) {
        let p = editor.world_to_screen(world);
        editor.handle_pointer_event(PointerEvent::Move {
            position: p,
            modifiers: Modifiers::NONE,
        });
    }

    fn up(editor: &mut Editor<SceneBuffer>, world: Point) {
        let p = editor.world_to_screen(world);
        editor.handle_pointer_event(PointerEvent::Up {
            position: p,
            button: MouseButton::Left,
            modifiers: Modifiers::NONE,
        });
    }

    fn double_click(editor: &mut Editor<SceneBuffer>, world: Point) {
        let p = editor.world_to_screen(world);
        editor.handle_pointer_event(PointerEvent::DoubleClick {
            position: p,
            button: MouseButton::Left,
            modifiers: Modifiers::NONE,
        });
    }

    /// Draw a rectangle from (0,0) to (10,10) with press, move and double-click.
    fn draw_square(editor: &mut Editor<SceneBuffer>) {
        editor.set_mode(Mode::DrawRectangle);
        down(editor, Point::new(0.0, 0.0), Modifiers::NONE);
        drag_to(editor, Point::new(10.0, 10.0));
        double_click(editor, Point::new(10.0, 10.0));
    }

    fn bbox_size(shape: &Shape) -> Vec2 {
        let bbox = shape.bounding_box();
        Vec2::new(bbox.width(), bbox.height())
    }

    fn close(a: Point, b: Point) -> bool {
        (a - b).hypot() < 1e-6
    }

    #[test]
    fn test_starts_with_two_empty_layers() {
        let editor = editor();
        assert_eq!(editor.layers().len(), MIN_LAYERS);
        assert!(editor.layers().iter().all(Layer::is_empty));
        assert_eq!(editor.history().len(), 1);
        assert_eq!(editor.mode(), Mode::Select);
    }

    #[test]
    fn test_draw_rectangle_creates_prism_in_every_layer() {
        let mut editor = editor();
        draw_square(&mut editor);

        assert_eq!(editor.mode(), Mode::Select);
        assert!(editor.current_shape().is_none());
        for layer in editor.layers() {
            assert_eq!(layer.len(), 1);
        }
        assert!(editor.active_layer().shapes[0].is_selected());
        assert!(!editor.layers()[1].shapes[0].is_selected());
        assert_eq!(editor.history().len(), 2);

        let vertices = editor.scene().object("object_0").expect("geometry");
        assert_eq!(vertices.len(), 36);
        let (mut min, mut max) = ([f32::MAX; 2], [f32::MIN; 2]);
        for v in vertices {
            for k in 0..2 {
                min[k] = min[k].min(v.position[k]);
                max[k] = max[k].max(v.position[k]);
            }
        }
        for k in 0..2 {
            assert!(min[k].abs() < 1e-4);
            assert!((max[k] - 10.0).abs() < 1e-4);
        }
    }

    #[test]
    fn test_drag_release_completes_rectangle() {
        let mut editor = editor();
        editor.set_mode(Mode::DrawCircle);
        down(&mut editor, Point::new(0.0, 0.0), Modifiers::NONE);
        drag_to(&mut editor, Point::new(6.0, 4.0));
        up(&mut editor, Point::new(6.0, 6.0));
        assert_eq!(editor.active_layer().len(), 1);
        assert_eq!(editor.mode(), Mode::Select);
    }

    #[test]
    fn test_click_without_drag_keeps_drawing() {
        let mut editor = editor();
        editor.set_mode(Mode::DrawRectangle);
        down(&mut editor, Point::new(0.0, 0.0), Modifiers::NONE);
        up(&mut editor, Point::new(0.0, 0.0));
        assert!(editor.current_shape().is_some());
        drag_to(&mut editor, Point::new(5.0, 5.0));
        // A second single click does not finish; the double-click does.
        down(&mut editor, Point::new(5.0, 5.0), Modifiers::NONE);
        up(&mut editor, Point::new(5.0, 5.0));
        assert!(editor.current_shape().is_some());
        double_click(&mut editor, Point::new(5.0, 5.0));
        assert_eq!(editor.active_layer().len(), 1);
    }

    #[test]
    fn test_degenerate_double_click_is_ignored() {
        let mut editor = editor();
        editor.set_mode(Mode::DrawRectangle);
        down(&mut editor, Point::new(1.0, 1.0), Modifiers::NONE);
        double_click(&mut editor, Point::new(1.0, 1.0));
        assert!(editor.current_shape().is_some());
        assert_eq!(editor.mode(), Mode::DrawRectangle);
        assert!(editor.active_layer().is_empty());
    }

    #[test]
    fn test_polygon_needs_three_vertices() {
        let mut editor = editor();
        editor.set_mode(Mode::DrawPolygon);
        down(&mut editor, Point::new(0.0, 0.0), Modifiers::NONE);
        down(&mut editor, Point::new(10.0, 0.0), Modifiers::NONE);
        double_click(&mut editor, Point::new(10.0, 0.0));
        assert!(editor.active_layer().is_empty());

        down(&mut editor, Point::new(5.0, 8.0), Modifiers::NONE);
        double_click(&mut editor, Point::new(5.0, 8.0));
        assert_eq!(editor.active_layer().len(), 1);
        let shape = &editor.active_layer().shapes[0];
        assert_eq!(shape.points().len(), 3);
        assert!(shape.hit(Point::new(5.0, 2.0)));
        assert!(!shape.hit(Point::new(0.0, 8.0)));
    }

    #[test]
    fn test_mode_switch_discards_unfinished_shape() {
        let mut editor = editor();
        editor.set_mode(Mode::DrawPolygon);
        down(&mut editor, Point::new(0.0, 0.0), Modifiers::NONE);
        assert!(editor.current_shape().is_some());
        editor.set_mode(Mode::Select);
        assert!(editor.current_shape().is_none());
        assert!(editor.active_layer().is_empty());
    }

    #[test]
    fn test_select_click_and_ctrl_additive() {
        let mut editor = editor();
        draw_square(&mut editor);
        editor.set_mode(Mode::DrawRectangle);
        down(&mut editor, Point::new(20.0, 0.0), Modifiers::NONE);
        drag_to(&mut editor, Point::new(30.0, 10.0));
        double_click(&mut editor, Point::new(30.0, 10.0));

        down(&mut editor, Point::new(5.0, 5.0), Modifiers::NONE);
        up(&mut editor, Point::new(5.0, 5.0));
        assert_eq!(editor.active_layer().selected_indices(), vec![0]);

        down(&mut editor, Point::new(25.0, 5.0), Modifiers::ctrl());
        up(&mut editor, Point::new(25.0, 5.0));
        assert_eq!(editor.active_layer().selected_indices(), vec![0, 1]);

        down(&mut editor, Point::new(-30.0, -30.0), Modifiers::NONE);
        assert!(!editor.active_layer().has_selection());
        assert_eq!(editor.mode(), Mode::Select);
    }

    #[test]
    fn test_move_only_active_layer() {
        let mut editor = editor();
        draw_square(&mut editor);
        let shadows_before = editor.scene().shadow_updates;

        down(&mut editor, Point::new(5.0, 5.0), Modifiers::NONE);
        assert_eq!(editor.mode(), Mode::Move);
        drag_to(&mut editor, Point::new(8.0, 1.0));
        up(&mut editor, Point::new(8.0, 1.0));

        let moved = &editor.layers()[0].shapes[0];
        let other = &editor.layers()[1].shapes[0];
        assert!(close(moved.base().position, Point::new(3.0, -4.0)));
        assert!(close(other.base().position, Point::ZERO));
        assert!(editor.scene().shadow_updates > shadows_before);
        assert_eq!(editor.history().len(), 3);
        assert_eq!(editor.mode(), Mode::Select);
    }

    #[test]
    fn test_rotate_handle_quarter_turn_and_undo() {
        let mut editor = editor();
        draw_square(&mut editor);
        let history_len = editor.history().len();

        let shape = editor.active_layer().shapes[0].clone();
        let marker = shape.rotation_marker_position(editor.scale());
        let center = shape.world_coordinate(shape.center());
        let v = marker - center;
        let target = center + Vec2::new(-v.y, v.x);

        down(&mut editor, marker, Modifiers::NONE);
        assert_eq!(editor.mode(), Mode::Rotate);
        drag_to(&mut editor, target);
        up(&mut editor, target);

        let rotation = editor.active_layer().shapes[0].base().rotation.rem_euclid(TAU);
        assert!((rotation - FRAC_PI_2).abs() < 1e-6);
        assert_eq!(editor.history().len(), history_len + 1);

        editor.undo();
        let rotation = editor.active_layer().shapes[0].base().rotation;
        assert!(rotation.abs() < 1e-12);
    }

    #[test]
    fn test_resize_keeps_layers_aligned() {
        let mut editor = editor();
        draw_square(&mut editor);
        // Make the layers differ in position first.
        down(&mut editor, Point::new(5.0, 5.0), Modifiers::NONE);
        drag_to(&mut editor, Point::new(7.0, 7.0));
        up(&mut editor, Point::new(7.0, 7.0));

        down(&mut editor, Point::new(12.0, 12.0), Modifiers::NONE);
        assert_eq!(editor.mode(), Mode::Resize);
        drag_to(&mut editor, Point::new(22.0, 17.0));
        up(&mut editor, Point::new(22.0, 17.0));

        let a = bbox_size(&editor.layers()[0].shapes[0]);
        let b = bbox_size(&editor.layers()[1].shapes[0]);
        assert!((a - Vec2::new(20.0, 15.0)).hypot() < 1e-6);
        assert!((a - b).hypot() < 1e-9);
        // The opposite corner stayed put.
        let shape = &editor.layers()[0].shapes[0];
        let fixed = shape.world_coordinate(Corner::BottomLeft.of(shape.bounding_box()));
        assert!(close(fixed, Point::new(2.0, 2.0)));
    }

    #[test]
    fn test_resize_handle_of_rotated_shape() {
        let mut editor = editor();
        draw_square(&mut editor);
        let shape = editor.active_layer().shapes[0].clone();
        let marker = shape.rotation_marker_position(editor.scale());
        let center = shape.world_coordinate(shape.center());
        let v = marker - center;
        let target = center + Vec2::new(-v.y, v.x);
        down(&mut editor, marker, Modifiers::NONE);
        drag_to(&mut editor, target);
        up(&mut editor, target);

        // Local (10, 10) now sits at world (0, 10).
        let shape = editor.active_layer().shapes[0].clone();
        let corner = shape.world_coordinate(Corner::TopRight.of(shape.bounding_box()));
        assert!(close(corner, Point::new(0.0, 10.0)));

        down(&mut editor, corner, Modifiers::NONE);
        assert_eq!(editor.mode(), Mode::Resize);
        // Local +x points along world +y after the turn.
        drag_to(&mut editor, Point::new(0.0, 20.0));
        up(&mut editor, Point::new(0.0, 20.0));

        let size = bbox_size(&editor.active_layer().shapes[0]);
        assert!((size - Vec2::new(20.0, 10.0)).hypot() < 1e-6);
        assert!((size - bbox_size(&editor.layers()[1].shapes[0])).hypot() < 1e-9);
    }

    #[test]
    fn test_add_then_delete_layer_restores() {
        let mut editor = editor();
        draw_square(&mut editor);
        editor.unselect_all();
        let before = editor.layers().to_vec();

        editor.add_layer();
        assert_eq!(editor.layers().len(), 3);
        assert_eq!(editor.layer_id(), 2);
        editor.delete_layer();
        assert_eq!(editor.layers(), before.as_slice());
        assert_eq!(editor.layer_id(), 1);

        editor.delete_layer();
        assert_eq!(editor.layers().len(), MIN_LAYERS);
    }

    #[test]
    fn test_insert_and_set_layer() {
        let mut editor = editor();
        draw_square(&mut editor);
        editor.set_layer(1);
        assert_eq!(editor.layer_id(), 1);
        assert!(!editor.layers()[0].has_selection());

        editor.insert_layer();
        assert_eq!(editor.layers().len(), 3);
        assert_eq!(editor.layer_id(), 1);
        assert!(editor.layers().iter().all(|l| l.len() == 1));

        editor.set_layer(7);
        assert_eq!(editor.layer_id(), 1);
    }

    #[test]
    fn test_set_layer_swaps_scene_geometry() {
        let mut editor = editor();
        draw_square(&mut editor);
        down(&mut editor, Point::new(5.0, 5.0), Modifiers::NONE);
        drag_to(&mut editor, Point::new(25.0, 5.0));
        up(&mut editor, Point::new(25.0, 5.0));
        let min_x = |e: &Editor<SceneBuffer>| {
            e.scene().object("object_0").expect("geometry").iter().map(|v| v.position[0]).fold(f32::MAX, f32::min)
        };
        assert!((min_x(&editor) - 20.0).abs() < 1e-4);
        editor.set_layer(1);
        assert!(min_x(&editor).abs() < 1e-4);
    }

    #[test]
    fn test_copy_paste_mirrors_to_all_layers() {
        let mut editor = editor();
        draw_square(&mut editor);
        editor.copy_selected_shapes();
        assert_eq!(editor.copied_shapes().len(), 1);
        editor.paste_copied_shapes();

        for layer in editor.layers() {
            assert_eq!(layer.len(), 2);
            assert_eq!(layer.shapes[1].id(), editor.active_layer().shapes[1].id());
        }
        assert_eq!(editor.active_layer().selected_indices(), vec![1]);
        assert!(editor.scene().object("object_1").is_some());
    }

    #[test]
    fn test_delete_selected_from_every_layer() {
        let mut editor = editor();
        draw_square(&mut editor);
        editor.copy_selected_shapes();
        editor.paste_copied_shapes();
        editor.delete_selected_shapes();
        for layer in editor.layers() {
            assert_eq!(layer.len(), 1);
        }
        assert!(editor.scene().object("object_1").is_none());
        editor.undo();
        assert_eq!(editor.active_layer().len(), 2);
    }

    #[test]
    fn test_undo_redo_boundaries() {
        let mut editor = editor();
        editor.undo();
        assert_eq!(editor.history().cursor(), 0);
        draw_square(&mut editor);
        editor.undo();
        assert!(editor.active_layer().is_empty());
        editor.redo();
        assert_eq!(editor.active_layer().len(), 1);
        editor.redo();
        assert_eq!(editor.history().cursor(), 1);
    }

    #[test]
    fn test_auxiliary_shapes_are_not_extruded() {
        let mut editor = editor();
        editor.set_shape_subtype(SubType::Auxiliary);
        draw_square(&mut editor);
        assert_eq!(editor.active_layer().len(), 1);
        assert!(editor.scene().objects.is_empty());
    }

    #[test]
    fn test_clear_resets_history() {
        let mut editor = editor();
        draw_square(&mut editor);
        editor.clear();
        assert!(editor.layers().iter().all(Layer::is_empty));
        assert_eq!(editor.history().len(), 1);
        assert!(!editor.history().can_undo());
    }

    #[test]
    fn test_save_and_open_roundtrip() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("design.xml");
        let mut editor = editor();
        draw_square(&mut editor);
        editor.add_layer();
        editor.save(&path).expect("save");

        let mut other = Editor::new(SceneBuffer::new());
        other.open(&path).expect("open");
        assert_eq!(other.layers().len(), 3);
        assert_eq!(other.layer_id(), 0);
        let ids: Vec<_> = other.layers().iter().map(|l| l.shapes[0].id()).collect();
        assert!(ids.windows(2).all(|w| w[0] == w[1]));
        assert_eq!(other.history().len(), 1);
        assert!(other.scene().object("object_0").is_some());
    }

    #[test]
    fn test_open_failure_leaves_editor_untouched() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("bad.xml");
        std::fs::write(&path, "<drawing/>").expect("write");

        let mut editor = editor();
        draw_square(&mut editor);
        let before = editor.layers().to_vec();
        assert!(editor.open(&path).is_err());
        assert_eq!(editor.layers(), before.as_slice());
        assert_eq!(editor.history().len(), 2);
    }

    #[test]
    fn test_right_drag_orbits_and_release_resets() {
        let mut editor = editor();
        let start = screen(&editor, 0.0, 0.0);
        editor.handle_pointer_event(PointerEvent::Down {
            position: start,
            button: MouseButton::Right,
            modifiers: Modifiers::NONE,
        });
        editor.handle_pointer_event(PointerEvent::Move {
            position: start + Vec2::new(30.0, 0.0),
            modifiers: Modifiers::NONE,
        });
        assert!((editor.camera().yrot - 30.0).abs() < 1e-4);
        editor.handle_pointer_event(PointerEvent::Up {
            position: start,
            button: MouseButton::Right,
            modifiers: Modifiers::NONE,
        });
        assert_eq!(editor.camera().yrot, 0.0);
        assert_eq!(editor.camera().xrot, 0.0);
    }

    #[test]
    fn test_wheel_zooms_and_requests_redraw() {
        let mut editor = editor();
        editor.take_redraw_request();
        let z = editor.camera().pos.z;
        editor.handle_pointer_event(PointerEvent::Wheel { delta: 1.0 });
        assert!(editor.camera().pos.z < z);
        assert!(editor.take_redraw_request());
        assert!(!editor.take_redraw_request());
    }

    /// Draw a rectangle between two world corners.
    fn draw_rect(editor: &mut Editor<SceneBuffer>, from: Point, to: Point) {
        editor.set_mode(Mode::DrawRectangle);
        down(editor, from, Modifiers::NONE);
        drag_to(editor, to);
        double_click(editor, to);
    }

    #[test]
    fn test_press_on_selected_shape_keeps_selection_over_earlier_body() {
        let mut editor = editor();
        draw_square(&mut editor);
        draw_rect(&mut editor, Point::new(4.0, 4.0), Point::new(16.0, 16.0));
        assert_eq!(editor.active_layer().selected_indices(), vec![1]);
        assert!(editor.active_layer().shapes[0].hit(Point::new(7.0, 7.0)));

        down(&mut editor, Point::new(7.0, 7.0), Modifiers::NONE);
        assert_eq!(editor.mode(), Mode::Move);
        assert_eq!(editor.active_layer().selected_indices(), vec![1]);
        drag_to(&mut editor, Point::new(9.0, 7.0));
        up(&mut editor, Point::new(9.0, 7.0));
        assert!(close(editor.active_layer().shapes[0].base().position, Point::ZERO));
        assert!(close(
            editor.active_layer().shapes[1].base().position,
            Point::new(6.0, 4.0)
        ));
    }

    #[test]
    fn test_selected_auxiliary_shape_can_be_dragged() {
        let mut editor = editor();
        editor.set_shape_subtype(SubType::Auxiliary);
        draw_square(&mut editor);
        assert_eq!(editor.active_layer().selected_indices(), vec![0]);

        down(&mut editor, Point::new(5.0, 5.0), Modifiers::NONE);
        assert_eq!(editor.mode(), Mode::Move);
        drag_to(&mut editor, Point::new(8.0, 1.0));
        up(&mut editor, Point::new(8.0, 1.0));
        let shape = &editor.active_layer().shapes[0];
        assert!(close(shape.base().position, Point::new(3.0, -4.0)));

        // Once unselected, a click on its interior no longer picks it.
        editor.unselect_all();
        down(&mut editor, Point::new(8.0, 1.0), Modifiers::NONE);
        assert_eq!(editor.mode(), Mode::Select);
        assert!(!editor.active_layer().has_selection());
    }

    #[test]
    fn test_rotation_marker_wins_over_body_below_it() {
        let mut editor = editor();
        draw_square(&mut editor);
        draw_rect(&mut editor, Point::new(0.0, 12.0), Point::new(10.0, 30.0));
        let marker = editor.active_layer().shapes[0].rotation_marker_position(editor.scale());
        assert!(editor.active_layer().shapes[1].hit(marker));

        down(&mut editor, marker, Modifiers::NONE);
        assert_eq!(editor.mode(), Mode::Rotate);
        assert_eq!(editor.active_layer().selected_indices(), vec![0]);
    }

    #[test]
    fn test_select_all_during_move_commits_the_move() {
        let mut editor = editor();
        draw_square(&mut editor);
        draw_rect(&mut editor, Point::new(20.0, 0.0), Point::new(30.0, 10.0));
        assert_eq!(editor.history().len(), 3);

        down(&mut editor, Point::new(25.0, 5.0), Modifiers::NONE);
        drag_to(&mut editor, Point::new(25.0, 8.0));
        editor.select_all();
        assert_eq!(editor.mode(), Mode::Select);
        assert!(editor.operation().is_none());
        assert_eq!(editor.history().len(), 4);
        assert_eq!(editor.active_layer().selected_indices(), vec![0, 1]);

        // The rest of the drag does nothing.
        drag_to(&mut editor, Point::new(25.0, 20.0));
        up(&mut editor, Point::new(25.0, 20.0));
        assert_eq!(editor.history().len(), 4);
        assert!(close(editor.active_layer().shapes[0].base().position, Point::ZERO));
        assert!(close(
            editor.active_layer().shapes[1].base().position,
            Point::new(20.0, 3.0)
        ));

        editor.undo();
        assert_eq!(editor.active_layer().len(), 2);
        assert!(close(
            editor.active_layer().shapes[1].base().position,
            Point::new(20.0, 0.0)
        ));
    }

    #[test]
    fn test_select_all_while_drawing_discards_shape() {
        let mut editor = editor();
        draw_square(&mut editor);
        editor.set_mode(Mode::DrawPolygon);
        down(&mut editor, Point::new(40.0, 40.0), Modifiers::NONE);
        down(&mut editor, Point::new(50.0, 40.0), Modifiers::NONE);
        assert!(editor.current_shape().is_some());

        editor.select_all();
        assert!(editor.current_shape().is_none());
        assert_eq!(editor.mode(), Mode::Select);
        assert_eq!(editor.active_layer().selected_indices(), vec![0]);

        double_click(&mut editor, Point::new(50.0, 50.0));
        assert_eq!(editor.active_layer().len(), 1);
        assert_eq!(editor.history().len(), 2);
    }

    #[test]
    fn test_overlay_follows_drawing_and_orbit() {
        let mut editor = editor();
        let grid = editor.scene().overlay.len();
        assert!(grid > 0);

        editor.set_mode(Mode::DrawPolygon);
        down(&mut editor, Point::new(0.0, 0.0), Modifiers::NONE);
        down(&mut editor, Point::new(10.0, 0.0), Modifiers::NONE);
        drag_to(&mut editor, Point::new(10.0, 5.0));
        let overlay = &editor.scene().overlay;
        assert_eq!(overlay.len(), grid + 4);
        let last = overlay[overlay.len() - 1].position;
        assert!((last[0] - 10.0).abs() < 1e-3 && (last[1] - 5.0).abs() < 1e-3);

        editor.set_mode(Mode::Select);
        let start = screen(&editor, 0.0, 0.0);
        editor.handle_pointer_event(PointerEvent::Down {
            position: start,
            button: MouseButton::Right,
            modifiers: Modifiers::NONE,
        });
        editor.handle_pointer_event(PointerEvent::Move {
            position: start + Vec2::new(30.0, 0.0),
            modifiers: Modifiers::NONE,
        });
        assert!(editor.scene().overlay.is_empty());
        editor.handle_pointer_event(PointerEvent::Up {
            position: start,
            button: MouseButton::Right,
            modifiers: Modifiers::NONE,
        });
        assert_eq!(editor.scene().overlay.len(), grid);
    }
}
