use glam::{Mat3, Mat4, Quat, Vec2, Vec3};
use std::f32::consts::{PI, TAU};

use crate::math::Ray;
use crate::types::CameraUniform;

const POLAR_EPSILON: f32 = 1e-6;

/// Perspective camera looking down its local -Z axis
#[derive(Debug, Clone, PartialEq)]
pub struct PerspectiveCamera {
    pub position: Vec3,
    pub rotation: Quat,
    pub fov_y_degrees: f32,
    pub aspect: f32,
    pub near: f32,
    pub far: f32,
}

impl PerspectiveCamera {
    pub fn new(fov_y_degrees: f32, aspect: f32, near: f32, far: f32) -> Self {
        Self {
            position: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            fov_y_degrees,
            aspect,
            near,
            far,
        }
    }

    pub fn forward(&self) -> Vec3 {
        self.rotation * Vec3::NEG_Z
    }

    pub fn up(&self) -> Vec3 {
        self.rotation * Vec3::Y
    }

    /// Orient the camera toward `target`, keeping world +Y up
    pub fn look_at(&mut self, target: Vec3) {
        let forward = (target - self.position).normalize_or_zero();
        let right = forward.cross(Vec3::Y);
        if forward == Vec3::ZERO || right.length_squared() < 1e-12 {
            return;
        }
        let right = right.normalize();
        let up = right.cross(forward);
        self.rotation = Quat::from_mat3(&Mat3::from_cols(right, up, -forward)).normalize();
    }

    /// Track a new viewport size; ignored while either side is zero
    pub fn set_viewport(&mut self, width: u32, height: u32) {
        if width > 0 && height > 0 {
            self.aspect = width as f32 / height as f32;
        }
    }

    pub fn world_matrix(&self) -> Mat4 {
        Mat4::from_rotation_translation(self.rotation, self.position)
    }

    pub fn view_matrix(&self) -> Mat4 {
        self.world_matrix().inverse()
    }

    pub fn projection_matrix(&self) -> Mat4 {
        Mat4::perspective_rh(
            self.fov_y_degrees.to_radians(),
            self.aspect.max(1e-4),
            self.near,
            self.far,
        )
    }

    pub fn view_projection(&self) -> Mat4 {
        self.projection_matrix() * self.view_matrix()
    }

    /// Ray from the camera through a point in normalized device coordinates
    pub fn ray_through_ndc(&self, ndc: Vec2) -> Ray {
        let inverse = self.view_projection().inverse();
        let through = inverse.project_point3(ndc.extend(0.5));
        Ray::new(self.position, through - self.position)
    }

    pub fn to_uniform(&self) -> CameraUniform {
        CameraUniform {
            view_proj: self.view_projection().to_cols_array_2d(),
            position: self.position.to_array(),
            _pad: 0.0,
        }
    }
}

/// Spherical coordinates around +Y: `theta` about Y from +Z, `phi` from +Y
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Spherical {
    pub radius: f32,
    pub theta: f32,
    pub phi: f32,
}

impl Spherical {
    pub fn from_offset(offset: Vec3) -> Self {
        let radius = offset.length();
        if radius == 0.0 {
            return Self {
                radius,
                theta: 0.0,
                phi: 0.0,
            };
        }
        Self {
            radius,
            theta: offset.x.atan2(offset.z),
            phi: (offset.y / radius).clamp(-1.0, 1.0).acos(),
        }
    }

    pub fn to_offset(self) -> Vec3 {
        let sin_phi = self.phi.sin();
        Vec3::new(
            self.radius * sin_phi * self.theta.sin(),
            self.radius * self.phi.cos(),
            self.radius * sin_phi * self.theta.cos(),
        )
    }
}

/// Orbit camera controller with optional damping
///
/// Pointer drags queue rotation that [`OrbitControls::update`] applies to
/// the camera; with damping on, a fraction of the queue is consumed per
/// update and the rest decays.
#[derive(Debug, Clone)]
pub struct OrbitControls {
    pub target: Vec3,
    pub enable_damping: bool,
    pub damping_factor: f32,
    pub rotate_speed: f32,
    pub zoom_speed: f32,
    pub min_distance: f32,
    pub max_distance: f32,
    pub min_polar_angle: f32,
    pub max_polar_angle: f32,
    pending: Vec2,
    scale: f32,
}

impl OrbitControls {
    pub fn new(target: Vec3) -> Self {
        Self {
            target,
            enable_damping: false,
            damping_factor: 0.05,
            rotate_speed: 1.0,
            zoom_speed: 1.0,
            min_distance: 0.0,
            max_distance: f32::INFINITY,
            min_polar_angle: 0.0,
            max_polar_angle: PI,
            pending: Vec2::ZERO,
            scale: 1.0,
        }
    }

    pub fn with_damping(mut self, damping_factor: f32) -> Self {
        self.enable_damping = true;
        self.damping_factor = damping_factor.clamp(0.0, 1.0);
        self
    }

    /// Queue rotation for a pointer drag of `delta` pixels
    pub fn rotate_by_pixels(&mut self, delta: Vec2, viewport_height: u32) {
        if viewport_height == 0 {
            return;
        }
        let height = viewport_height as f32;
        self.pending.x -= TAU * delta.x / height * self.rotate_speed;
        self.pending.y -= TAU * delta.y / height * self.rotate_speed;
    }

    /// Zoom by wheel steps; positive steps move toward the target
    pub fn zoom(&mut self, steps: f32) {
        self.scale *= 0.95_f32.powf(steps * self.zoom_speed);
    }

    /// Pending rotation as (theta, phi)
    pub fn pending_rotation(&self) -> Vec2 {
        self.pending
    }

    /// Move the camera; returns whether its position changed
    pub fn update(&mut self, camera: &mut PerspectiveCamera) -> bool {
        let mut spherical = Spherical::from_offset(camera.position - self.target);

        if self.enable_damping {
            spherical.theta += self.pending.x * self.damping_factor;
            spherical.phi += self.pending.y * self.damping_factor;
        } else {
            spherical.theta += self.pending.x;
            spherical.phi += self.pending.y;
        }

        let min_phi = self.min_polar_angle.max(POLAR_EPSILON);
        let max_phi = self.max_polar_angle.min(PI - POLAR_EPSILON);
        spherical.phi = spherical.phi.clamp(min_phi, max_phi.max(min_phi));
        spherical.radius = (spherical.radius * self.scale).clamp(self.min_distance, self.max_distance);

        let previous = camera.position;
        camera.position = self.target + spherical.to_offset();
        camera.look_at(self.target);

        if self.enable_damping {
            self.pending *= 1.0 - self.damping_factor;
        } else {
            self.pending = Vec2::ZERO;
        }
        self.scale = 1.0;

        previous.distance_squared(camera.position) > 1e-12
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn camera_at(z: f32) -> PerspectiveCamera {
        let mut camera = PerspectiveCamera::new(75.0, 16.0 / 9.0, 0.1, 500.0);
        camera.position = Vec3::new(0.0, 0.0, z);
        camera
    }

    #[test]
    fn default_camera_looks_down_negative_z() {
        let camera = camera_at(3.0);
        assert!((camera.forward() - Vec3::NEG_Z).length() < 1e-6);
    }

    #[test]
    fn center_ray_points_forward() {
        let camera = camera_at(5.0);
        let ray = camera.ray_through_ndc(Vec2::ZERO);
        assert_eq!(ray.origin, camera.position);
        assert!((ray.direction - Vec3::NEG_Z).length() < 1e-4);
    }

    #[test]
    fn top_edge_ray_matches_half_fov() {
        let camera = camera_at(5.0);
        let ray = camera.ray_through_ndc(Vec2::new(0.0, 1.0));
        let angle = ray.direction.angle_between(Vec3::NEG_Z).to_degrees();
        assert!((angle - 37.5).abs() < 0.05, "got {angle}");
        assert!(ray.direction.y > 0.0);
    }

    #[test]
    fn look_at_faces_target() {
        let mut camera = camera_at(0.0);
        camera.position = Vec3::new(4.0, 3.0, 0.0);
        camera.look_at(Vec3::ZERO);
        let expected = (Vec3::ZERO - camera.position).normalize();
        assert!((camera.forward() - expected).length() < 1e-5);
    }

    #[test]
    fn viewport_updates_aspect() {
        let mut camera = camera_at(0.0);
        camera.set_viewport(800, 400);
        assert_eq!(camera.aspect, 2.0);
        camera.set_viewport(0, 400);
        assert_eq!(camera.aspect, 2.0);
    }

    #[test]
    fn spherical_round_trip_preserves_offset() {
        let offset = Vec3::new(1.0, 2.0, -3.0);
        let back = Spherical::from_offset(offset).to_offset();
        assert!((back - offset).length() < 1e-5);
    }

    #[test]
    fn orbit_keeps_distance_and_faces_target() {
        let mut camera = camera_at(3.0);
        let mut controls = OrbitControls::new(Vec3::ZERO);
        controls.rotate_by_pixels(Vec2::new(100.0, 0.0), 600);
        assert!(controls.update(&mut camera));
        assert!((camera.position.length() - 3.0).abs() < 1e-4);
        let expected = (-camera.position).normalize();
        assert!((camera.forward() - expected).length() < 1e-4);
    }

    #[test]
    fn damping_decays_pending_rotation() {
        let mut camera = camera_at(3.0);
        let mut controls = OrbitControls::new(Vec3::ZERO).with_damping(0.05);
        controls.rotate_by_pixels(Vec2::new(60.0, 0.0), 600);
        let initial = controls.pending_rotation().x;

        controls.update(&mut camera);
        let after = controls.pending_rotation().x;
        assert!((after - initial * 0.95).abs() < 1e-6);

        for _ in 0..500 {
            controls.update(&mut camera);
        }
        assert!(controls.pending_rotation().x.abs() < 1e-8);
    }

    #[test]
    fn polar_angle_is_clamped() {
        let mut camera = camera_at(3.0);
        let mut controls = OrbitControls::new(Vec3::ZERO);
        controls.max_polar_angle = PI * 0.75;
        controls.rotate_by_pixels(Vec2::new(0.0, -10_000.0), 600);
        controls.update(&mut camera);
        let phi = Spherical::from_offset(camera.position).phi;
        assert!((phi - PI * 0.75).abs() < 1e-4, "got {phi}");
    }

    #[test]
    fn zoom_moves_toward_target() {
        let mut camera = camera_at(10.0);
        let mut controls = OrbitControls::new(Vec3::ZERO);
        controls.zoom(1.0);
        controls.update(&mut camera);
        assert!((camera.position.length() - 9.5).abs() < 1e-4);
    }
}
