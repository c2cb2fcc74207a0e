//! Core application state and lifecycle.

use crate::config::AppConfig;
use crate::shortcuts::{Command, ShortcutRegistry};
use canvas3d_core::{ClickTracker, Editor, Modifiers, MouseButton, PointerEvent, SubType};
use canvas3d_render::{RenderManager, RendererError, WgpuBackend};
use kurbo::Point;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use thiserror::Error;
use winit::application::ApplicationHandler;
use winit::dpi::LogicalSize;
use winit::event::{ElementState, MouseScrollDelta, WindowEvent};
use winit::event_loop::{ActiveEventLoop, EventLoop};
use winit::keyboard::{Key, NamedKey};
use winit::window::{Window, WindowId};

/// Pixel scroll distance of one wheel notch.
const PIXELS_PER_NOTCH: f64 = 120.0;

mod file_ops {
    use std::path::PathBuf;

    /// Ask for a design file to open.
    pub fn pick_design() -> Option<PathBuf> {
        rfd::FileDialog::new()
            .set_title("Open design file...")
            .add_filter("Design files", &["xml"])
            .pick_file()
    }

    /// Ask where to save the design.
    pub fn pick_save_path() -> Option<PathBuf> {
        rfd::FileDialog::new()
            .set_title("Save design file...")
            .set_file_name("design.xml")
            .add_filter("Design files", &["xml"])
            .save_file()
    }
}

/// Errors that end the application.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Event loop error: {0}")]
    EventLoop(#[from] winit::error::EventLoopError),
    #[error("Window creation failed: {0}")]
    Window(#[from] winit::error::OsError),
    #[error(transparent)]
    Renderer(#[from] RendererError),
}

type CanvasEditor = Editor<RenderManager<WgpuBackend>>;

/// Runtime state for the application.
struct AppState {
    window: Arc<Window>,
    editor: CanvasEditor,
    modifiers: Modifiers,
    cursor: Point,
    clicks: ClickTracker,
    current_file: Option<PathBuf>,
}

impl AppState {
    fn update_title(&self, base: &str) {
        let file = self
            .current_file
            .as_deref()
            .and_then(Path::file_name)
            .map(|name| format!(" - {}", name.to_string_lossy()))
            .unwrap_or_default();
        let title = format!(
            "{base}{file} [{} | layer {}/{} | {}]",
            self.editor.mode().name(),
            self.editor.layer_id() + 1,
            self.editor.layers().len(),
            self.editor.scene().rendering_mode().name(),
        );
        self.window.set_title(&title);
    }

    fn open(&mut self, path: &Path) {
        match self.editor.open(path) {
            Ok(()) => {
                log::info!("Opened {}", path.display());
                self.current_file = Some(path.to_path_buf());
            }
            Err(e) => log::error!("Failed to open {}: {e}", path.display()),
        }
    }

    fn save(&mut self, path: &Path) {
        match self.editor.save(path) {
            Ok(()) => {
                log::info!("Saved {}", path.display());
                self.current_file = Some(path.to_path_buf());
            }
            Err(e) => log::error!("Failed to save {}: {e}", path.display()),
        }
    }

    fn execute(&mut self, command: Command) {
        log::debug!("Command {command:?}");
        let editor = &mut self.editor;
        match command {
            Command::New => {
                editor.clear();
                self.current_file = None;
            }
            Command::Open => {
                if let Some(path) = file_ops::pick_design() {
                    self.open(&path);
                }
            }
            Command::Save => {
                if let Some(path) = file_ops::pick_save_path() {
                    self.save(&path);
                }
            }
            Command::Undo => editor.undo(),
            Command::Redo => editor.redo(),
            Command::Copy => editor.copy_selected_shapes(),
            Command::Paste => editor.paste_copied_shapes(),
            Command::SelectAll => editor.select_all(),
            Command::Delete => editor.delete_selected_shapes(),
            Command::Cancel => {
                editor.set_mode(canvas3d_core::Mode::Select);
                editor.unselect_all();
            }
            Command::SetMode(mode) => editor.set_mode(mode),
            Command::CycleRenderingMode => {
                let next = editor.scene().rendering_mode().next();
                editor.scene_mut().set_rendering_mode(next);
            }
            Command::AddLayer => editor.add_layer(),
            Command::InsertLayer => editor.insert_layer(),
            Command::DeleteLayer => editor.delete_layer(),
            Command::PreviousLayer => {
                if let Some(index) = editor.layer_id().checked_sub(1) {
                    editor.set_layer(index);
                }
            }
            Command::NextLayer => {
                let index = editor.layer_id() + 1;
                editor.set_layer(index);
            }
            Command::ToggleSubtype => {
                let subtype = match editor.shape_subtype() {
                    SubType::Body => SubType::Auxiliary,
                    SubType::Auxiliary => SubType::Body,
                };
                log::info!("New shapes are {}", subtype.name());
                editor.set_shape_subtype(subtype);
            }
        }
    }
}

fn map_button(button: winit::event::MouseButton) -> Option<MouseButton> {
    match button {
        winit::event::MouseButton::Left => Some(MouseButton::Left),
        winit::event::MouseButton::Right => Some(MouseButton::Right),
        winit::event::MouseButton::Middle => Some(MouseButton::Middle),
        _ => None,
    }
}

/// Wheel motion in notches, positive away from the user.
fn wheel_notches(delta: MouseScrollDelta) -> f64 {
    match delta {
        MouseScrollDelta::LineDelta(_, y) => y as f64,
        MouseScrollDelta::PixelDelta(pos) => pos.y / PIXELS_PER_NOTCH,
    }
}

fn key_name(key: &Key) -> Option<&str> {
    match key {
        Key::Named(named) => match named {
            NamedKey::Escape => Some("Escape"),
            NamedKey::Delete => Some("Delete"),
            NamedKey::Backspace => Some("Backspace"),
            NamedKey::PageUp => Some("PageUp"),
            NamedKey::PageDown => Some("PageDown"),
            _ => None,
        },
        Key::Character(c) => Some(c.as_str()),
        _ => None,
    }
}

/// Main application struct.
pub struct App {
    config: AppConfig,
    initial_design: Option<PathBuf>,
    state: Option<AppState>,
    error: Option<AppError>,
}

impl App {
    pub fn new(config: AppConfig, initial_design: Option<PathBuf>) -> Self {
        Self {
            config,
            initial_design,
            state: None,
            error: None,
        }
    }

    /// Run the event loop until the window closes or the renderer fails.
    pub fn run(config: AppConfig, initial_design: Option<PathBuf>) -> Result<(), AppError> {
        let event_loop = EventLoop::new()?;
        let mut app = App::new(config, initial_design);
        event_loop.run_app(&mut app)?;
        match app.error.take() {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }

    fn fail(&mut self, event_loop: &ActiveEventLoop, error: AppError) {
        log::error!("{error}");
        self.error = Some(error);
        event_loop.exit();
    }

    fn init(&self, event_loop: &ActiveEventLoop) -> Result<AppState, AppError> {
        log::info!("Creating window...");
        let attributes = Window::default_attributes()
            .with_title(&self.config.title)
            .with_inner_size(LogicalSize::new(self.config.width, self.config.height));
        let window = Arc::new(event_loop.create_window(attributes)?);
        let size = window.inner_size();

        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });
        let surface = instance
            .create_surface(window.clone())
            .map_err(|e| RendererError::InitFailed(format!("Surface creation failed: {e}")))?;
        let render_config = self.config.render_config();
        let backend = pollster::block_on(WgpuBackend::new(
            &instance,
            surface,
            size.width,
            size.height,
            &render_config,
        ))?;

        let mut manager = RenderManager::new(backend, render_config);
        manager.set_rendering_mode(self.config.rendering_mode());
        let mut editor = Editor::with_history_capacity(manager, self.config.history_capacity);
        if size.width > 0 && size.height > 0 {
            editor.resize_viewport(size.width, size.height);
        }

        let mut state = AppState {
            window,
            editor,
            modifiers: Modifiers::NONE,
            cursor: Point::ZERO,
            clicks: ClickTracker::new(),
            current_file: None,
        };
        if let Some(path) = &self.initial_design {
            state.open(path);
        }
        state.update_title(&self.config.title);
        state.window.request_redraw();
        Ok(state)
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.state.is_some() {
            return;
        }
        match self.init(event_loop) {
            Ok(state) => {
                ShortcutRegistry::print_all();
                self.state = Some(state);
            }
            Err(e) => self.fail(event_loop, e),
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        let Some(state) = &mut self.state else {
            return;
        };

        match event {
            WindowEvent::CloseRequested => {
                event_loop.exit();
            }

            WindowEvent::Resized(size) => {
                if size.width > 0 && size.height > 0 {
                    state.editor.resize_viewport(size.width, size.height);
                }
                if let Err(e) = state.editor.scene_mut().resize(size.width, size.height) {
                    self.fail(event_loop, e.into());
                    return;
                }
                state.window.request_redraw();
            }

            WindowEvent::RedrawRequested => {
                let size = state.window.inner_size();
                if size.width == 0 || size.height == 0 {
                    return;
                }
                let camera = state.editor.camera().clone();
                match state.editor.scene_mut().render_frame(&camera) {
                    Ok(stats) => log::trace!("{stats:?}"),
                    Err(e) => self.fail(event_loop, e.into()),
                }
            }

            WindowEvent::ModifiersChanged(modifiers) => {
                let m = modifiers.state();
                state.modifiers = Modifiers {
                    shift: m.shift_key(),
                    ctrl: m.control_key() || m.super_key(),
                    alt: m.alt_key(),
                    meta: m.super_key(),
                };
            }

            WindowEvent::CursorMoved { position, .. } => {
                state.cursor = Point::new(position.x, position.y);
                state.editor.handle_pointer_event(PointerEvent::Move {
                    position: state.cursor,
                    modifiers: state.modifiers,
                });
            }

            WindowEvent::MouseInput {
                state: button_state,
                button,
                ..
            } => {
                let Some(button) = map_button(button) else {
                    return;
                };
                let position = state.cursor;
                let modifiers = state.modifiers;
                let event = match button_state {
                    ElementState::Pressed => {
                        if state.clicks.register_press(position, button, Instant::now()) {
                            PointerEvent::DoubleClick {
                                position,
                                button,
                                modifiers,
                            }
                        } else {
                            PointerEvent::Down {
                                position,
                                button,
                                modifiers,
                            }
                        }
                    }
                    ElementState::Released => PointerEvent::Up {
                        position,
                        button,
                        modifiers,
                    },
                };
                state.editor.handle_pointer_event(event);
                state.update_title(&self.config.title);
            }

            WindowEvent::MouseWheel { delta, .. } => {
                state.editor.handle_pointer_event(PointerEvent::Wheel {
                    delta: wheel_notches(delta),
                });
            }

            WindowEvent::KeyboardInput { event, .. } => {
                if event.state != ElementState::Pressed || event.repeat {
                    return;
                }
                let Some(key) = key_name(&event.logical_key) else {
                    return;
                };
                let Some(command) =
                    ShortcutRegistry::lookup(key, state.modifiers.ctrl, state.modifiers.shift)
                else {
                    return;
                };
                state.execute(command);
                state.update_title(&self.config.title);
                state.window.request_redraw();
            }

            _ => {}
        }
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(state) = &mut self.state {
            if state.editor.take_redraw_request() {
                state.window.request_redraw();
            }
        }
    }
}
