//! Camera utilities

use glam::{Mat4, Vec3};

use crate::ray::Ray;

/// Camera data for one frame.
#[derive(Copy, Clone, Debug)]
pub struct Camera {
    /// Combined view-projection matrix
    pub view_proj: Mat4,
    /// Inverse view-projection, used to unproject pixel rays
    pub inv_view_proj: Mat4,
    /// Camera position in world space
    pub position: Vec3,
}

impl Camera {
    pub fn new(view_proj: Mat4, position: Vec3) -> Self {
        Self {
            view_proj,
            inv_view_proj: view_proj.inverse(),
            position,
        }
    }

    /// Create a perspective camera
    pub fn perspective(
        position: Vec3,
        target: Vec3,
        up: Vec3,
        fov_y: f32,
        aspect: f32,
        near: f32,
        far: f32,
    ) -> Self {
        let view = Mat4::look_at_rh(position, target, up);
        let proj = Mat4::perspective_rh(fov_y, aspect, near, far);
        Self::new(proj * view, position)
    }

    /// Generate the world-space ray through the center of pixel `(x, y)`.
    pub fn ray_for_pixel(&self, x: u32, y: u32, width: u32, height: u32) -> Ray {
        let ndc_x = (x as f32 + 0.5) / width as f32 * 2.0 - 1.0;
        let ndc_y = 1.0 - (y as f32 + 0.5) / height as f32 * 2.0;
        let far_point = self
            .inv_view_proj
            .project_point3(Vec3::new(ndc_x, ndc_y, 1.0));
        Ray::new(self.position, far_point - self.position)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn center_pixel_ray_points_at_target() {
        let camera = Camera::perspective(
            Vec3::new(0.0, 0.0, -5.0),
            Vec3::ZERO,
            Vec3::Y,
            std::f32::consts::FRAC_PI_3,
            1.0,
            0.1,
            100.0,
        );
        let ray = camera.ray_for_pixel(32, 32, 64, 64);
        assert_eq!(ray.origin, camera.position);
        assert!(ray.direction.dot(Vec3::Z) > 0.999);
    }

    #[test]
    fn corner_rays_diverge() {
        let camera = Camera::perspective(
            Vec3::ZERO,
            Vec3::NEG_Z,
            Vec3::Y,
            std::f32::consts::FRAC_PI_2,
            1.0,
            0.1,
            100.0,
        );
        let a = camera.ray_for_pixel(0, 0, 64, 64);
        let b = camera.ray_for_pixel(63, 63, 64, 64);
        assert!(a.direction.dot(b.direction) < 0.999);
        // Looking down -Z, screen right is +X and screen up is +Y.
        assert!(a.direction.x < 0.0 && a.direction.y > 0.0);
        assert!(b.direction.x > 0.0 && b.direction.y < 0.0);
    }
}
