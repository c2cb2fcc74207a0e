//! Canvas3D Core Library
//!
//! Platform-agnostic shape, layer and history model plus the editing state
//! machine that drives the extruded 3D scene.

pub mod camera;
pub mod editor;
pub mod history;
pub mod input;
pub mod layer;
pub mod light;
pub mod mesh;
pub mod mode;
pub mod operation;
pub mod overlay;
pub mod scene;
pub mod selection;
pub mod shapes;
pub mod storage;

pub use camera::Camera;
pub use editor::Editor;
pub use history::{History, HistoryError};
pub use input::{ClickTracker, Modifiers, MouseButton, PointerEvent};
pub use layer::Layer;
pub use light::Light;
pub use mesh::Vertex;
pub use mode::Mode;
pub use operation::Operation;
pub use scene::{SceneBuffer, SceneSink};
pub use selection::{Corner, Handle, HandleKind};
pub use shapes::{Circle, Polygon, Rectangle, Shape, ShapeError, ShapeId, ShapeTrait, SubType};
pub use storage::{DesignMetadata, StorageError, StorageResult};
