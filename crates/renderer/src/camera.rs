//! Third-person camera for rendering.

use glam::{Mat4, Vec3};

/// Third-person camera state, fed from the game's camera rig each frame.
#[derive(Debug, Clone)]
pub struct ThirdPersonCamera {
    /// Eye position in world space.
    pub position: Vec3,

    /// Point the camera looks at.
    pub target: Vec3,

    /// Field of view in degrees.
    pub fov: f32,

    /// Near clipping plane.
    pub near: f32,

    /// Far clipping plane.
    pub far: f32,

    /// Aspect ratio (width / height).
    pub aspect: f32,
}

impl Default for ThirdPersonCamera {
    fn default() -> Self {
        Self {
            position: Vec3::new(0.0, 2.0, 5.0),
            target: Vec3::ZERO,
            fov: 75.0,
            near: 0.1,
            far: 1000.0,
            aspect: 16.0 / 9.0,
        }
    }
}

impl ThirdPersonCamera {
    /// Create a camera at the given position looking at the target.
    pub fn new(position: Vec3, target: Vec3) -> Self {
        Self {
            position,
            target,
            ..Default::default()
        }
    }

    /// Update the pose from the rig output.
    pub fn set_view(&mut self, position: Vec3, target: Vec3) {
        self.position = position;
        self.target = target;
    }

    /// Get the forward direction vector.
    pub fn forward(&self) -> Vec3 {
        (self.target - self.position).normalize_or_zero()
    }

    /// Get the view matrix for rendering.
    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.position, self.target, Vec3::Y)
    }

    /// Get the projection matrix for rendering.
    pub fn projection_matrix(&self) -> Mat4 {
        Mat4::perspective_rh(self.fov.to_radians(), self.aspect, self.near, self.far)
    }

    /// Get the combined view-projection matrix.
    pub fn view_projection_matrix(&self) -> Mat4 {
        self.projection_matrix() * self.view_matrix()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_camera_creation() {
        let camera = ThirdPersonCamera::new(Vec3::new(0.0, 2.0, 5.0), Vec3::ZERO);
        assert_eq!(camera.position.y, 2.0);
        assert_eq!(camera.target, Vec3::ZERO);
    }

    #[test]
    fn test_view_matrix() {
        let camera = ThirdPersonCamera::default();
        let view = camera.view_matrix();

        // View matrix should be valid (non-zero determinant)
        assert!(view.determinant().abs() > 0.0001);
    }

    #[test]
    fn test_forward_points_at_target() {
        let camera = ThirdPersonCamera::new(Vec3::new(0.0, 0.0, 5.0), Vec3::ZERO);
        let forward = camera.forward();
        assert!((forward.z + 1.0).abs() < 0.01);
    }

    #[test]
    fn test_view_centers_the_target() {
        let camera = ThirdPersonCamera::new(Vec3::new(3.0, 2.0, 5.0), Vec3::new(1.0, 1.0, 0.0));
        let viewed = camera.view_matrix().transform_point3(camera.target);
        // The target sits on the view axis: no horizontal or vertical offset.
        assert!(viewed.x.abs() < 1e-4);
        assert!(viewed.y.abs() < 1e-4);
        assert!(viewed.z < 0.0);
    }
}
