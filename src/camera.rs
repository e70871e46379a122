//! Fixed viewing camera with an optional slow orbit.

use glam::{Mat4, Vec3};

use crate::params::RenderConfig;

/// Distance from the origin on the +Z axis
const EYE_DISTANCE: f32 = 2.5;

/// Camera system: a stationary eye looking at the particle origin, or a
/// slow circular orbit when enabled. Group rotation happens per-group in
/// the model matrix, so the camera itself stays deliberately plain.
pub struct CameraSystem {
    auto_orbit: bool,
    orbit_speed_rad_per_s: f32,
}

impl CameraSystem {
    pub fn new(auto_orbit: bool) -> Self {
        Self {
            auto_orbit,
            orbit_speed_rad_per_s: 0.05,
        }
    }

    /// Compute the eye position for a given time
    pub fn eye_position(&self, time_s: f32) -> Vec3 {
        if self.auto_orbit {
            let angle = time_s * self.orbit_speed_rad_per_s;
            Vec3::new(
                EYE_DISTANCE * angle.sin(),
                0.0,
                EYE_DISTANCE * angle.cos(),
            )
        } else {
            Vec3::new(0.0, 0.0, EYE_DISTANCE)
        }
    }

    /// Create view-projection matrix for rendering
    pub fn view_proj_matrix(&self, time_s: f32, render_config: &RenderConfig) -> Mat4 {
        let eye = self.eye_position(time_s);
        let view = Mat4::look_at_rh(eye, Vec3::ZERO, Vec3::Y);
        let proj = Mat4::perspective_rh(
            render_config.fov_degrees.to_radians(),
            render_config.aspect_ratio(),
            render_config.near_plane,
            render_config.far_plane,
        );
        proj * view
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_static_eye_position() {
        let camera = CameraSystem::new(false);
        assert_eq!(camera.eye_position(0.0), Vec3::new(0.0, 0.0, EYE_DISTANCE));
        assert_eq!(camera.eye_position(60.0), Vec3::new(0.0, 0.0, EYE_DISTANCE));
    }

    #[test]
    fn test_orbit_keeps_distance() {
        let camera = CameraSystem::new(true);
        for t in 0..100 {
            let eye = camera.eye_position(t as f32);
            assert!((eye.length() - EYE_DISTANCE).abs() < 1e-4);
            assert_eq!(eye.y, 0.0);
        }
    }

    #[test]
    fn test_view_proj_matrix_generation() {
        let camera = CameraSystem::new(false);
        let render_config = RenderConfig::default();

        let view_proj = camera.view_proj_matrix(0.0, &render_config);
        assert_ne!(view_proj, Mat4::IDENTITY);
        assert_ne!(view_proj, Mat4::ZERO);

        // The origin projects in front of the camera
        let origin = view_proj * glam::Vec4::new(0.0, 0.0, 0.0, 1.0);
        assert!(origin.w > 0.0);
    }
}
