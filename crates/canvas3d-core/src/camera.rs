//! Orbit camera for the extruded scene.

use glam::{Mat4, Vec2, Vec3, Vec4};
use kurbo::Point;

/// Closest the camera may get to the drawing plane.
pub const MIN_DISTANCE: f32 = 1.0;
/// Farthest the camera may zoom out.
pub const MAX_DISTANCE: f32 = 1000.0;

/// Camera looking down the -Z axis at the drawing plane `z = 0`.
///
/// `xrot`/`yrot`/`zrot` orbit the scene (in degrees), `pos.xy` pans and
/// `pos.z` is the distance to the drawing plane. With zero orbit the plane
/// maps to the screen with a uniform scale of [`Camera::scale`] pixels per
/// world unit.
#[derive(Debug, Clone)]
pub struct Camera {
    pub xrot: f32,
    pub yrot: f32,
    pub zrot: f32,
    pub pos: Vec3,
    /// Vertical field of view in degrees.
    pub fovy: f32,
    pub near: f32,
    pub far: f32,
    width: f32,
    height: f32,
    mouse_pos: Vec2,
    pub mv_matrix: Mat4,
    pub p_matrix: Mat4,
    pub mvp_matrix: Mat4,
}

impl Default for Camera {
    fn default() -> Self {
        let mut camera = Self {
            xrot: 0.0,
            yrot: 0.0,
            zrot: 0.0,
            pos: Vec3::new(0.0, 0.0, 100.0),
            fovy: 60.0,
            near: 0.1,
            far: 2000.0,
            width: 1.0,
            height: 1.0,
            mouse_pos: Vec2::ZERO,
            mv_matrix: Mat4::IDENTITY,
            p_matrix: Mat4::IDENTITY,
            mvp_matrix: Mat4::IDENTITY,
        };
        camera.update_p_matrix(1, 1);
        camera
    }
}

impl Camera {
    pub fn new() -> Self {
        Self::default()
    }

    /// Focal factor `1 / tan(fovy / 2)`.
    pub fn f(&self) -> f32 {
        1.0 / (self.fovy.to_radians() / 2.0).tan()
    }

    pub fn viewport(&self) -> (f32, f32) {
        (self.width, self.height)
    }

    /// Pixels per world unit on the drawing plane.
    pub fn scale(&self) -> f64 {
        (self.f() / self.pos.z * self.height * 0.5) as f64
    }

    /// Rebuild the projection for a new viewport size.
    pub fn update_p_matrix(&mut self, width: u32, height: u32) {
        self.width = width.max(1) as f32;
        self.height = height.max(1) as f32;
        let aspect = self.width / self.height;
        self.p_matrix = Mat4::perspective_rh(self.fovy.to_radians(), aspect, self.near, self.far);
        self.update_mvp_matrix();
    }

    pub fn update_mvp_matrix(&mut self) {
        self.mv_matrix = Mat4::from_translation(-self.pos)
            * Mat4::from_rotation_x(self.xrot.to_radians())
            * Mat4::from_rotation_y(self.yrot.to_radians())
            * Mat4::from_rotation_z(self.zrot.to_radians());
        self.mvp_matrix = self.p_matrix * self.mv_matrix;
    }

    /// Remember where a camera drag started.
    pub fn mouse_press(&mut self, x: f32, y: f32) {
        self.mouse_pos = Vec2::new(x, y);
    }

    /// Orbit by the pointer motion since the last event.
    pub fn rotate(&mut self, x: f32, y: f32, sensitivity: f32) {
        self.xrot += (y - self.mouse_pos.y) * sensitivity;
        self.yrot += (x - self.mouse_pos.x) * sensitivity;
        self.mouse_pos = Vec2::new(x, y);
        self.update_mvp_matrix();
    }

    /// Pan so the drawing plane follows the pointer.
    pub fn move_by(&mut self, x: f32, y: f32) {
        let scale = self.scale() as f32;
        self.pos.x -= (x - self.mouse_pos.x) / scale;
        self.pos.y += (y - self.mouse_pos.y) / scale;
        self.mouse_pos = Vec2::new(x, y);
        self.update_mvp_matrix();
    }

    /// Move toward (positive) or away from (negative) the drawing plane.
    pub fn zoom(&mut self, delta: f32) {
        self.pos.z = (self.pos.z - delta).clamp(MIN_DISTANCE, MAX_DISTANCE);
        self.update_mvp_matrix();
    }

    /// Return to the front-facing view, keeping pan and zoom.
    pub fn reset_orbit(&mut self) {
        self.xrot = 0.0;
        self.yrot = 0.0;
        self.update_mvp_matrix();
    }

    /// Convert a screen pixel to a point on the drawing plane.
    pub fn screen_to_world(&self, screen: Point) -> Point {
        let scale = self.scale();
        Point::new(
            self.pos.x as f64 + (screen.x - self.width as f64 * 0.5) / scale,
            self.pos.y as f64 - (screen.y - self.height as f64 * 0.5) / scale,
        )
    }

    /// Convert a point on the drawing plane to a screen pixel.
    pub fn world_to_screen(&self, world: Point) -> Point {
        let scale = self.scale();
        Point::new(
            self.width as f64 * 0.5 + (world.x - self.pos.x as f64) * scale,
            self.height as f64 * 0.5 - (world.y - self.pos.y as f64) * scale,
        )
    }

    /// Project a world point through the full camera transform.
    pub fn project(&self, world: Vec3) -> Option<Point> {
        let clip = self.mvp_matrix * Vec4::new(world.x, world.y, world.z, 1.0);
        if clip.w <= f32::EPSILON {
            return None;
        }
        let ndc = clip.truncate() / clip.w;
        Some(Point::new(
            ((ndc.x + 1.0) * 0.5 * self.width) as f64,
            ((1.0 - ndc.y) * 0.5 * self.height) as f64,
        ))
    }
}
