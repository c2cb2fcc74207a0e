//! Directional light used for shading and shadow mapping.

use glam::{Mat4, Vec3};

/// Half extent of the light's orthographic frustum.
pub const LIGHT_FRUSTUM_HALF_SIZE: f32 = 50.0;
/// Distance from the origin at which the light camera is placed.
pub const LIGHT_DISTANCE: f32 = 50.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Light {
    /// Normalized direction the light travels in.
    pub direction: Vec3,
    /// View-projection of the shadow camera.
    pub view_projection: Mat4,
}

impl Default for Light {
    fn default() -> Self {
        Self::new(Vec3::new(-4.0, -5.0, -8.0))
    }
}

impl Light {
    pub fn new(direction: Vec3) -> Self {
        let direction = direction.try_normalize().unwrap_or(Vec3::NEG_Z);
        let half = LIGHT_FRUSTUM_HALF_SIZE;
        let projection = Mat4::orthographic_rh(-half, half, -half, half, 0.1, 200.0);
        let view = Mat4::look_at_rh(-direction * LIGHT_DISTANCE, Vec3::ZERO, Vec3::Y);
        Self {
            direction,
            view_projection: projection * view,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_direction_is_normalized() {
        let light = Light::default();
        assert!((light.direction.length() - 1.0).abs() < 1e-6);
        assert!(light.direction.z < 0.0);
    }

    #[test]
    fn test_origin_projects_inside_frustum() {
        let light = Light::default();
        let p = light.view_projection.project_point3(Vec3::ZERO);
        assert!(p.x.abs() < 1e-5 && p.y.abs() < 1e-5);
        assert!(p.z > 0.0 && p.z < 1.0);
    }

    #[test]
    fn test_degenerate_direction_falls_back() {
        let light = Light::new(Vec3::ZERO);
        assert_eq!(light.direction, Vec3::NEG_Z);
    }
}
